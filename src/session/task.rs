// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Observable, cancellable handles for session tasks.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Why a task produced no value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("Task was cancelled")]
    Cancelled,

    #[error("Task panicked")]
    Panicked,
}

/// A spawned task plus the token that cancels it.
///
/// The token is a child of the session token, so tearing down the session
/// cancels every outstanding task. Cancellation discards the task's result.
#[derive(Debug)]
pub struct TaskHandle<T> {
    handle: JoinHandle<Option<T>>,
    cancel: CancellationToken,
}

impl<T: Send + 'static> TaskHandle<T> {
    /// Spawn `fut` under a child of `parent`.
    pub fn spawn<F>(parent: &CancellationToken, fut: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let cancel = parent.child_token();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                value = fut => Some(value),
                _ = token.cancelled() => None,
            }
        });
        Self { handle, cancel }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task.
    pub async fn join(self) -> Result<T, TaskError> {
        match self.handle.await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(TaskError::Cancelled),
            Err(e) if e.is_cancelled() => Err(TaskError::Cancelled),
            Err(_) => Err(TaskError::Panicked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn join_returns_value() {
        let parent = CancellationToken::new();
        let task = TaskHandle::spawn(&parent, async { 21 * 2 });
        assert_eq!(task.join().await, Ok(42));
    }

    #[tokio::test]
    async fn cancel_discards_result() {
        let parent = CancellationToken::new();
        let task = TaskHandle::spawn(&parent, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            1
        });
        task.cancel();
        assert_eq!(task.join().await, Err(TaskError::Cancelled));
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn parent_cancellation_reaches_task() {
        let parent = CancellationToken::new();
        let task = TaskHandle::spawn(&parent, std::future::pending::<()>());
        parent.cancel();
        assert_eq!(task.join().await, Err(TaskError::Cancelled));
    }

    #[tokio::test]
    async fn panic_is_reported() {
        let parent = CancellationToken::new();
        let task = TaskHandle::spawn(&parent, async { panic!("boom") });
        assert_eq!(task.join().await, Err::<(), _>(TaskError::Panicked));
    }
}
