//! Supervised task spawning.
//!
//! Every background task an app spawns is registered here so shutdown
//! can abort and join the whole set, leaving no leaked tasks across
//! repeated start/stop cycles.

use std::future::Future;
use std::sync::Mutex;

use tokio::task::JoinHandle;

#[derive(Default)]
pub struct TaskManager {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task and keep its handle for shutdown.
    pub fn spawn(&self, future: impl Future<Output = ()> + Send + 'static) {
        self.handles.lock().unwrap().push(tokio::spawn(future));
    }

    /// Abort every registered task. Handles stay registered so
    /// `join_all` can still await their completion.
    pub async fn abort_all(&self) {
        for handle in self.handles.lock().unwrap().iter() {
            handle.abort();
        }
    }

    /// Await every registered task, draining the registry. Cancelled
    /// tasks resolve with a join error, which is expected here.
    pub async fn join_all(&self) {
        let handles: Vec<JoinHandle<()>> = self.handles.lock().unwrap().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }
}
