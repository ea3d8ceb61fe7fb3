//! Per-request context: the request clock and a handle for background work

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::task::JoinHandle;

/// Tracker for fire-and-forget work started on behalf of requests
///
/// Cloning shares the same set of tasks. Spawned tasks keep running when the
/// tracker is dropped; `wait_idle` lets a shutdown path drain them first.
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        // A panic while holding the lock cannot leave the vec inconsistent
        self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `task` on the current tokio runtime without awaiting it
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut handles = self.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of tasks that have not finished yet
    pub fn pending(&self) -> usize {
        self.lock().iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait until every spawned task, including ones spawned meanwhile, has finished
    pub async fn wait_idle(&self) {
        loop {
            let drained = std::mem::take(&mut *self.lock());
            if drained.is_empty() {
                break;
            }

            for handle in drained {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, event = "background_task_failed", "Background task did not complete");
                }
            }
        }
    }
}

/// Context of one issuance or consumption call
#[derive(Debug, Clone)]
pub struct RequestContext {
    now: i64,
    tasks: BackgroundTasks,
}

impl RequestContext {
    /// Context stamped with the current wall clock
    pub fn new() -> Self {
        Self::at(Utc::now().timestamp())
    }

    /// Context with an explicit request time (unix seconds)
    pub fn at(now: i64) -> Self {
        Self {
            now,
            tasks: BackgroundTasks::new(),
        }
    }

    /// Share an existing background task tracker
    pub fn with_tasks(mut self, tasks: BackgroundTasks) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
