//! Reference strategy generator
//!
//! Enumerates every transfer plan over the horizon that stays within the
//! allowed points hit. Free transfers roll over (capped at two), each extra
//! transfer costs [`POINTS_PER_HIT`] points, and at most one wildcard may be
//! played, which costs nothing and resets the next period's allowance to one.

use super::{Action, Strategy};
use crate::Result;

/// Points deducted per transfer beyond the free allowance
pub const POINTS_PER_HIT: u32 = 4;

/// Maximum number of banked free transfers
pub const MAX_FREE_TRANSFERS: u32 = 2;

/// Inputs to the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorParams {
    /// First period of the plan
    pub start_period: u32,
    /// Number of periods to plan
    pub horizon: u32,
    /// Free transfers available in the first period
    pub free_transfers: u32,
    /// Largest total points hit a strategy may take
    pub max_points_hit: u32,
    /// Allow one wildcard somewhere in the plan
    pub allow_wildcard: bool,
}

/// Generate all admissible strategies in deterministic order
pub fn generate_strategies(params: &GeneratorParams) -> Result<Vec<Strategy>> {
    if params.horizon == 0 {
        anyhow::bail!("horizon must be at least 1 period");
    }
    if params.free_transfers == 0 {
        anyhow::bail!("free_transfers must be at least 1");
    }

    let mut strategies = Vec::new();
    let mut actions = Vec::with_capacity(params.horizon as usize);
    extend(
        params,
        &mut actions,
        params.free_transfers.min(MAX_FREE_TRANSFERS),
        0,
        false,
        &mut strategies,
    );

    tracing::debug!(
        horizon = params.horizon,
        count = strategies.len(),
        "generated transfer strategies"
    );
    Ok(strategies)
}

fn extend(
    params: &GeneratorParams,
    actions: &mut Vec<Action>,
    free: u32,
    points_hit: u32,
    wildcard_used: bool,
    out: &mut Vec<Strategy>,
) {
    if actions.len() == params.horizon as usize {
        out.push(Strategy::new(params.start_period, actions.clone(), points_hit));
        return;
    }

    let mut options = vec![Action::Hold, Action::Single, Action::Double];
    if params.allow_wildcard && !wildcard_used {
        options.push(Action::Wildcard);
    }

    for action in options {
        let (hit, next_free) = match action {
            Action::Wildcard => (0, 1),
            other => {
                let n = u32::from(other.transfers());
                let hit = n.saturating_sub(free) * POINTS_PER_HIT;
                let next_free = (free + 1).saturating_sub(n).clamp(1, MAX_FREE_TRANSFERS);
                (hit, next_free)
            }
        };
        let total_hit = points_hit + hit;
        if total_hit > params.max_points_hit {
            continue;
        }

        actions.push(action);
        extend(
            params,
            actions,
            next_free,
            total_hit,
            wildcard_used || action == Action::Wildcard,
            out,
        );
        actions.pop();
    }
}
