use tracing::debug;

use super::Task;
use crate::common::errors::{BenchError, Result};
use crate::common::types::Score;

/// Ordered, abort-on-first-failure chain of tasks with a fixed capacity
#[derive(Debug)]
pub struct SerialTask {
    tasks: Vec<Task>,
    capacity: usize,
}

/// What happened when a [`SerialTask`] ran
///
/// `score` only counts tasks that completed before the failing one; the
/// failing task and everything after it contribute nothing.
#[derive(Debug)]
pub struct SerialOutcome {
    pub score: Score,
    pub completed: usize,
    pub failed_task: Option<&'static str>,
    pub error: Option<BenchError>,
}

impl SerialOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Collapse into the total score or the surfaced error
    pub fn into_result(self) -> Result<Score> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.score),
        }
    }
}

impl SerialTask {
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a task; fails once `capacity` tasks were added
    pub fn add(&mut self, task: Task) -> Result<()> {
        if self.tasks.len() >= self.capacity {
            return Err(BenchError::TaskCapacity {
                capacity: self.capacity,
            });
        }
        self.tasks.push(task);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(Task::name).collect()
    }

    pub async fn run(self) -> SerialOutcome {
        let mut score: Score = 0;
        let mut completed = 0;

        for task in self.tasks {
            let name = task.name();
            match task.run().await {
                Ok(s) => {
                    score += s;
                    completed += 1;
                }
                Err(err) => {
                    debug!(task = name, completed, error = %err, "serial task aborted");
                    return SerialOutcome {
                        score,
                        completed,
                        failed_task: Some(name),
                        error: Some(err),
                    };
                }
            }
        }

        SerialOutcome {
            score,
            completed,
            failed_task: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use parking_lot::Mutex;

    fn recording(log: &Arc<Mutex<Vec<usize>>>, idx: usize, fail: bool) -> Task {
        let log = Arc::clone(log);
        Task::exec("step", 1, move || async move {
            log.lock().push(idx);
            if fail {
                Err(BenchError::Internal(format!("step {} failed", idx)))
            } else {
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn test_runs_in_insertion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut serial = SerialTask::new(4);
        for idx in 0..4 {
            serial.add(recording(&log, idx, false)).unwrap();
        }

        let outcome = serial.run().await;
        assert!(outcome.is_success());
        assert_eq!(outcome.score, 4);
        assert_eq!(*log.lock(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut serial = SerialTask::new(5);
        for idx in 0..5 {
            serial.add(recording(&log, idx, idx == 2)).unwrap();
        }

        let outcome = serial.run().await;
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        assert_eq!(outcome.completed, 2);
        assert_eq!(outcome.score, 2);
        assert_eq!(outcome.failed_task, Some("step"));
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut serial = SerialTask::new(1);
        serial.add(Task::exec("a", 0, || async { Ok(()) })).unwrap();
        let err = serial.add(Task::exec("b", 0, || async { Ok(()) }));
        assert!(matches!(err, Err(BenchError::TaskCapacity { capacity: 1 })));
        assert_eq!(serial.len(), 1);
        assert_eq!(serial.task_names(), vec!["a"]);
    }
}
