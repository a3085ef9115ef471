//! Scored units of work
//!
//! A [`Task`] wraps one fallible action and the rule that turns its success
//! into a score. A [`SerialTask`] runs tasks in insertion order and abandons
//! the rest of the chain at the first failure.

mod serial;

pub use serial::{SerialOutcome, SerialTask};

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::common::errors::Result;
use crate::common::types::Score;

type TaskFuture = Pin<Box<dyn Future<Output = Result<Score>> + Send>>;
type TaskAction = Box<dyn FnOnce() -> TaskFuture + Send>;

/// A single scored action
///
/// Building a task does nothing; the action only starts in [`Task::run`],
/// which consumes the task.
pub struct Task {
    name: &'static str,
    action: TaskAction,
}

impl Task {
    /// Task awarding a fixed `score` when `action` succeeds
    pub fn exec<F, Fut>(name: &'static str, score: Score, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            name,
            action: Box::new(move || {
                Box::pin(async move {
                    action().await?;
                    Ok(score)
                })
            }),
        }
    }

    /// Task whose action computes its own score
    pub fn scored<F, Fut>(name: &'static str, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Score>> + Send + 'static,
    {
        Self {
            name,
            action: Box::new(move || Box::pin(action())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn run(self) -> Result<Score> {
        (self.action)().await
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::BenchError;

    #[tokio::test]
    async fn test_exec_task_awards_fixed_score() {
        let task = Task::exec("fixed", 7, || async { Ok(()) });
        assert_eq!(task.name(), "fixed");
        assert_eq!(task.run().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_exec_task_failure_has_no_score() {
        let task = Task::exec("failing", 7, || async {
            Err(BenchError::Internal("boom".into()))
        });
        assert!(task.run().await.is_err());
    }

    #[tokio::test]
    async fn test_scored_task_computes_score() {
        let skipped = true;
        let task = Task::scored("maybe", move || async move {
            Ok(if skipped { 0 } else { 3 })
        });
        assert_eq!(task.run().await.unwrap(), 0);
    }
}
