//! Structured concurrent join primitive used by the project and the build
//! orchestrator.
//!
//! A [`TaskGroup`] collects tokio task handles and joins them with
//! first-error-wins semantics. The join drains the handle list in a loop
//! until it stays empty, so tasks spawned *by* already-joined tasks are
//! themselves awaited: a parent task's completion includes everything it
//! transitively spawned into the same group.
//!
//! Errors after the first are discarded; sibling tasks are never cancelled
//! and run to completion.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::task::{JoinError, JoinHandle};

/// A named collection of concurrently scheduled units of work joined
/// together, yielding the first error.
#[derive(Debug)]
pub struct TaskGroup<E> {
    handles: Arc<Mutex<Vec<JoinHandle<Result<(), E>>>>>,
}

impl<E> Clone for TaskGroup<E> {
    fn clone(&self) -> Self {
        Self {
            handles: Arc::clone(&self.handles),
        }
    }
}

impl<E> Default for TaskGroup<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TaskGroup<E> {
    pub fn new() -> Self {
        Self {
            handles: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<E> TaskGroup<E>
where
    E: From<JoinError> + Send + 'static,
{
    /// Schedule a unit of work on the group.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
    {
        let handle = tokio::spawn(fut);
        self.handles.lock().unwrap().push(handle);
    }

    /// Block until every task in the group, including tasks spawned while
    /// waiting, has completed. Returns the first error encountered.
    pub async fn wait(&self) -> Result<(), E> {
        let mut first: Option<E> = None;
        loop {
            let batch: Vec<_> = {
                let mut handles = self.handles.lock().unwrap();
                handles.drain(..).collect()
            };
            if batch.is_empty() {
                break;
            }
            for handle in batch {
                match handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        if first.is_none() {
                            first = Some(err);
                        }
                    }
                    Err(join_err) => {
                        if first.is_none() {
                            first = Some(join_err.into());
                        }
                    }
                }
            }
        }
        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn empty_group_waits_ok() {
        let group: TaskGroup<anyhow::Error> = TaskGroup::new();
        assert!(group.wait().await.is_ok());
    }

    #[tokio::test]
    async fn first_error_wins_and_siblings_finish() {
        let group: TaskGroup<anyhow::Error> = TaskGroup::new();
        let completed = Arc::new(AtomicUsize::new(0));

        group.spawn(async { Err(anyhow::anyhow!("boom")) });
        for _ in 0..4 {
            let completed = Arc::clone(&completed);
            group.spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                completed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        let err = group.wait().await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(completed.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn join_covers_transitively_spawned_tasks() {
        let group: TaskGroup<anyhow::Error> = TaskGroup::new();
        let nested_ran = Arc::new(AtomicUsize::new(0));

        let inner_group = group.clone();
        let nested = Arc::clone(&nested_ran);
        group.spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            inner_group.spawn(async move {
                nested.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        });

        group.wait().await.unwrap();
        assert_eq!(nested_ran.load(Ordering::SeqCst), 1);
    }
}
