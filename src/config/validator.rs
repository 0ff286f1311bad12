//! Configuration validation

use super::*;
use crate::store::RunTag;
use anyhow::{Context, Result};

/// Upper bound on the worker pool size
pub const MAX_WORKERS: usize = 1024;

/// Upper bound on the planning horizon
pub const MAX_WEEKS_AHEAD: u32 = 10;

/// Validate complete configuration
pub fn validate_config(config: &SearchConfig) -> Result<()> {
    validate_search(&config.search)?;
    validate_evaluation(&config.evaluation)?;
    validate_output(&config.output)?;
    Ok(())
}

/// Validate strategy space parameters
pub fn validate_search(search: &SearchParams) -> Result<()> {
    if search.weeks_ahead == 0 || search.weeks_ahead > MAX_WEEKS_AHEAD {
        anyhow::bail!(
            "weeks_ahead must be between 1 and {}, got {}",
            MAX_WEEKS_AHEAD,
            search.weeks_ahead
        );
    }

    if search.num_free_transfers == 0 {
        anyhow::bail!("num_free_transfers must be at least 1");
    }

    Ok(())
}

/// Validate worker pool and scoring configuration
pub fn validate_evaluation(evaluation: &EvaluationConfig) -> Result<()> {
    if evaluation.workers == 0 || evaluation.workers > MAX_WORKERS {
        anyhow::bail!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS,
            evaluation.workers
        );
    }

    if evaluation.num_iterations == 0 {
        anyhow::bail!("num_iterations must be at least 1");
    }

    if let Some(ref tag) = evaluation.tag {
        RunTag::new(tag).with_context(|| format!("Invalid tag '{}'", tag))?;
    }

    if evaluation.output_dir.as_os_str().is_empty() {
        anyhow::bail!("output_dir must not be empty");
    }

    Ok(())
}

/// Validate output configuration
pub fn validate_output(output: &OutputConfig) -> Result<()> {
    if output.show_progress && output.progress_interval_ms == 0 {
        anyhow::bail!("progress_interval_ms must be greater than 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SearchConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = SearchConfig::default();
        config.evaluation.workers = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let mut config = SearchConfig::default();
        config.evaluation.num_iterations = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_horizon_bounds() {
        let mut config = SearchConfig::default();
        config.search.weeks_ahead = 0;
        assert!(validate_config(&config).is_err());
        config.search.weeks_ahead = MAX_WEEKS_AHEAD + 1;
        assert!(validate_config(&config).is_err());
        config.search.weeks_ahead = MAX_WEEKS_AHEAD;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_tag_with_underscore_rejected() {
        let mut config = SearchConfig::default();
        config.evaluation.tag = Some("bad_tag".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("bad_tag"));
    }

    #[test]
    fn test_zero_progress_interval_rejected() {
        let mut config = SearchConfig::default();
        config.output.progress_interval_ms = 0;
        assert!(validate_config(&config).is_err());

        config.output.show_progress = false;
        assert!(validate_config(&config).is_ok());
    }
}
