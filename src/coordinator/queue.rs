//! Task queue and termination protocol
//!
//! The coordinator enqueues every strategy once and then exactly one
//! [`Task::Done`] marker per worker. Each worker stops after consuming one
//! marker, so the pool always drains the queue and every worker exits. With
//! more workers than strategies some workers only ever see their marker.

use crate::strategy::Strategy;
use crossbeam::channel::{self, Receiver, Sender};

/// One item on the queue
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Evaluate(Strategy),
    /// Termination marker
    Done,
}

/// Multi-producer, multi-consumer queue of tasks
#[derive(Debug, Clone)]
pub struct TaskQueue {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

impl TaskQueue {
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self { sender, receiver }
    }

    /// Queue holding `strategies` followed by `workers` termination markers
    pub fn load(strategies: impl IntoIterator<Item = Strategy>, workers: usize) -> Self {
        let queue = Self::new();
        for strategy in strategies {
            queue.push(Task::Evaluate(strategy));
        }
        for _ in 0..workers {
            queue.push(Task::Done);
        }
        queue
    }

    pub fn push(&self, task: Task) {
        // Cannot fail: the queue holds its own receiver
        let _ = self.sender.send(task);
    }

    /// Handle a worker pulls from
    pub fn receiver(&self) -> Receiver<Task> {
        self.receiver.clone()
    }

    /// Items currently queued
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
