//! Worker thread implementation
//!
//! A worker pulls strategies off the task queue until it consumes its
//! termination marker. For each strategy it:
//!
//! 1. Derives the strategy id
//! 2. Resets its progress counter to `count_increments(id)`
//! 3. Calls the scorer with the iteration count chosen by the iteration policy
//! 4. Stores the result under `(run tag, strategy id)`
//! 5. Reports the completion to the progress tracker
//!
//! # Failure isolation
//!
//! A scorer error, a scorer panic, or a failed store write loses only that one
//! strategy: it is logged, counted as failed, and the worker moves on to the
//! next task. Sibling workers are never affected.
//!
//! # Thread Safety
//!
//! Workers share nothing mutable except the task queue and the result store.
//! Each writes only the result entries it uniquely names.

use crate::config::EvaluationConfig;
use crate::coordinator::queue::Task;
use crate::progress::{count_increments, ProgressEvent, ProgressReporter};
use crate::scoring::{EvaluationRequest, Scorer, StrategyResult};
use crate::stats::WorkerReport;
use crate::store::{ResultStore, RunTag};
use crate::strategy::Strategy;
use crate::Result;
use crossbeam::channel::Receiver;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// One member of the worker pool
pub struct Worker<S: Scorer> {
    index: usize,
    tasks: Receiver<Task>,
    config: Arc<EvaluationConfig>,
    run_tag: RunTag,
    baseline: Arc<S::Detail>,
    scorer: Arc<S>,
    store: Arc<dyn ResultStore>,
    progress: ProgressReporter,
}

impl<S: Scorer> Worker<S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: usize,
        tasks: Receiver<Task>,
        config: Arc<EvaluationConfig>,
        run_tag: RunTag,
        baseline: Arc<S::Detail>,
        scorer: Arc<S>,
        store: Arc<dyn ResultStore>,
        progress: ProgressReporter,
    ) -> Self {
        Self {
            index,
            tasks,
            config,
            run_tag,
            baseline,
            scorer,
            store,
            progress,
        }
    }

    /// Process tasks until the termination marker
    pub fn run(self) -> WorkerReport {
        let mut report = WorkerReport::new(self.index);

        loop {
            match self.tasks.recv() {
                Ok(Task::Evaluate(strategy)) => self.process(&strategy, &mut report),
                Ok(Task::Done) => break,
                Err(_) => {
                    tracing::warn!(worker = self.index, "task queue closed before termination marker");
                    break;
                }
            }
        }

        self.progress.send(ProgressEvent::Exited { worker: self.index });
        tracing::debug!(
            worker = self.index,
            evaluated = report.evaluated,
            failed = report.failed,
            "worker exiting"
        );
        report
    }

    fn process(&self, strategy: &Strategy, report: &mut WorkerReport) {
        let strategy_id = strategy.id();
        let exhaustive = self.config.exhaustive_double_transfer;

        self.progress.send(ProgressEvent::Started {
            worker: self.index,
            label: strategy_id.clone(),
            units_total: count_increments(&strategy_id, self.config.num_iterations, exhaustive),
        });

        let request = EvaluationRequest {
            exhaustive_double_transfer: exhaustive,
            run_tag: self.run_tag.clone(),
            iterations: self
                .config
                .iteration_policy
                .iterations_for(strategy, self.config.num_iterations, exhaustive),
            budget: self.config.bank,
        };

        let started = Instant::now();
        let outcome = self
            .evaluate(strategy, &request)
            .and_then(|result| self.store.put(&self.run_tag, &strategy_id, &result));

        match outcome {
            Ok(()) => {
                report.record_success(started.elapsed());
                self.progress.send(ProgressEvent::Completed { worker: self.index });
            }
            Err(e) => {
                tracing::error!(
                    worker = self.index,
                    strategy = %strategy_id,
                    "strategy lost, no result stored: {:#}",
                    e
                );
                report.record_failure();
                self.progress.send(ProgressEvent::Failed {
                    worker: self.index,
                    label: strategy_id,
                });
            }
        }
    }

    fn evaluate(&self, strategy: &Strategy, request: &EvaluationRequest) -> Result<StrategyResult> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.scorer
                .evaluate(strategy, request, &self.baseline, &self.progress)
        }));

        match outcome {
            Ok(result) => result,
            Err(payload) => Err(anyhow::anyhow!("scorer panicked: {}", panic_message(payload.as_ref()))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::queue::TaskQueue;
    use crate::store::memory::MemoryResultStore;
    use crate::strategy::StrategyId;
    use crossbeam::channel;

    /// Scorer that fails on configured ids and otherwise scores by id length
    struct PickyScorer {
        fail_on: Vec<&'static str>,
        panic_on: Vec<&'static str>,
    }

    impl Scorer for PickyScorer {
        type Detail = f64;

        fn evaluate(
            &self,
            strategy: &Strategy,
            request: &EvaluationRequest,
            baseline: &f64,
            progress: &ProgressReporter,
        ) -> Result<StrategyResult> {
            let id = strategy.id();
            if self.panic_on.contains(&id.as_str()) {
                panic!("boom on {}", id);
            }
            if self.fail_on.contains(&id.as_str()) {
                anyhow::bail!("cannot score {}", id);
            }
            progress.advance(request.iterations);
            Ok(StrategyResult::with_total(*baseline + id.as_str().len() as f64))
        }
    }

    fn run_worker(ids: &[&str], scorer: PickyScorer) -> (WorkerReport, Arc<MemoryResultStore>, Vec<ProgressEvent>) {
        let strategies: Vec<Strategy> = ids.iter().map(|s| Strategy::parse(1, s).unwrap()).collect();
        let queue = TaskQueue::load(strategies, 1);
        let store = Arc::new(MemoryResultStore::new());
        let (tx, rx) = channel::unbounded();

        let worker = Worker::new(
            0,
            queue.receiver(),
            Arc::new(EvaluationConfig::default()),
            RunTag::new("test").unwrap(),
            Arc::new(1.0),
            Arc::new(scorer),
            store.clone(),
            ProgressReporter::new(0, tx),
        );
        let report = worker.run();
        assert!(queue.is_empty());
        (report, store, rx.try_iter().collect())
    }

    #[test]
    fn test_worker_stores_every_result() {
        let (report, store, events) = run_worker(
            &["0-1", "1-1", "W-0"],
            PickyScorer { fail_on: vec![], panic_on: vec![] },
        );

        assert_eq!(report.evaluated, 3);
        assert_eq!(report.failed, 0);
        let tag = RunTag::new("test").unwrap();
        assert_eq!(store.count(&tag).unwrap(), 3);
        assert_eq!(
            store.load(&tag, &StrategyId::parse("W-0").unwrap()).unwrap().total_score,
            4.0
        );
        assert_eq!(events.last(), Some(&ProgressEvent::Exited { worker: 0 }));
    }

    #[test]
    fn test_started_event_carries_increments() {
        let (_, _, events) = run_worker(&["1-1"], PickyScorer { fail_on: vec![], panic_on: vec![] });
        assert_eq!(
            events[0],
            ProgressEvent::Started {
                worker: 0,
                label: StrategyId::parse("1-1").unwrap(),
                units_total: 30,
            }
        );
        assert_eq!(events[1], ProgressEvent::Advanced { worker: 0, delta: 100 });
        assert_eq!(events[2], ProgressEvent::Completed { worker: 0 });
    }

    #[test]
    fn test_failures_are_isolated() {
        let (report, store, events) = run_worker(
            &["0", "1", "2", "W"],
            PickyScorer { fail_on: vec!["1"], panic_on: vec!["2"] },
        );

        assert_eq!(report.evaluated, 2);
        assert_eq!(report.failed, 2);
        let tag = RunTag::new("test").unwrap();
        assert_eq!(
            store.keys(&tag).unwrap(),
            vec![StrategyId::parse("0").unwrap(), StrategyId::parse("W").unwrap()]
        );
        let failed = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Failed { .. }))
            .count();
        assert_eq!(failed, 2);
    }

    #[test]
    fn test_worker_with_only_marker() {
        let (report, store, events) = run_worker(&[], PickyScorer { fail_on: vec![], panic_on: vec![] });
        assert_eq!(report.evaluated, 0);
        assert!(store.is_empty());
        assert_eq!(events, vec![ProgressEvent::Exited { worker: 0 }]);
    }

    /// Scorer recording the budget of every request
    struct BudgetScorer {
        budgets: std::sync::Mutex<Vec<u32>>,
    }

    impl Scorer for BudgetScorer {
        type Detail = ();

        fn evaluate(
            &self,
            _strategy: &Strategy,
            request: &EvaluationRequest,
            _baseline: &(),
            _progress: &ProgressReporter,
        ) -> Result<StrategyResult> {
            self.budgets.lock().unwrap().push(request.budget);
            Ok(StrategyResult::with_total(1.0))
        }
    }

    #[test]
    fn test_request_carries_bank() {
        let strategies = vec![Strategy::parse(1, "1").unwrap(), Strategy::parse(1, "2").unwrap()];
        let queue = TaskQueue::load(strategies, 1);
        let config = EvaluationConfig {
            bank: 37,
            ..Default::default()
        };
        let scorer = Arc::new(BudgetScorer {
            budgets: std::sync::Mutex::new(Vec::new()),
        });

        let worker = Worker::new(
            0,
            queue.receiver(),
            Arc::new(config),
            RunTag::new("test").unwrap(),
            Arc::new(()),
            scorer.clone(),
            Arc::new(MemoryResultStore::new()),
            ProgressReporter::detached(),
        );
        worker.run();

        assert_eq!(*scorer.budgets.lock().unwrap(), vec![37, 37]);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
    }
}
