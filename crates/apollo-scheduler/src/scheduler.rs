use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cron::parse_spec;
use crate::error::Result;

/// Boxed future produced by a job callback on every firing.
pub type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Factory invoked once per tick. Each firing runs on its own detached
/// task with no caller attached, so callbacks must tolerate overlap with a
/// previous firing that has not finished yet.
pub type JobFn = Arc<dyn Fn() -> JobFuture + Send + Sync>;

/// Name → live trigger map with atomic replacement.
pub struct Scheduler {
    entries: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Install (or replace) the trigger for `name`.
    ///
    /// The spec is parsed before any state is touched: a parse failure
    /// returns an error and leaves the scheduler exactly as it was,
    /// including any previously installed trigger for `name`. On success
    /// the old trigger (if any) is removed and the new one installed under
    /// a single lock.
    pub fn schedule(&self, name: &str, spec: &str, job: JobFn) -> Result<()> {
        let schedule = parse_spec(spec)?;

        let task_name = name.to_string();
        let handle = tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(Utc).next() else {
                    break;
                };
                let wait = (next - Utc::now()).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;

                debug!(job = %task_name, "schedule fired");
                tokio::spawn(job());
            }
        });

        let mut entries = self.entries.lock().unwrap();
        if let Some(old) = entries.insert(name.to_string(), handle) {
            old.abort();
        }
        info!(job = %name, %spec, "schedule installed");
        Ok(())
    }

    /// Remove the trigger for `name`. Silent when absent.
    pub fn delete(&self, name: &str) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(handle) = entries.remove(name) {
            handle.abort();
            info!(job = %name, "schedule removed");
        }
    }

    /// Snapshot of currently registered job names.
    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap();
        let mut names: Vec<String> = entries.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let entries = self.entries.lock().unwrap();
        for handle in entries.values() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_job(counter: Arc<AtomicUsize>) -> JobFn {
        Arc::new(move || {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    fn noop_job() -> JobFn {
        Arc::new(|| Box::pin(async {}))
    }

    #[tokio::test]
    async fn schedule_then_delete() {
        let sched = Scheduler::new();
        sched.schedule("nightly", "0 0 2 * * *", noop_job()).unwrap();
        assert_eq!(sched.names(), vec!["nightly"]);

        sched.delete("nightly");
        assert!(sched.names().is_empty());

        // Deleting an absent name is not an error.
        sched.delete("nightly");
    }

    #[tokio::test]
    async fn replacing_a_name_keeps_a_single_entry() {
        let sched = Scheduler::new();
        sched.schedule("job", "0 0 2 * * *", noop_job()).unwrap();
        sched.schedule("job", "0 0 3 * * *", noop_job()).unwrap();
        assert_eq!(sched.names().len(), 1);
    }

    #[tokio::test]
    async fn parse_failure_leaves_state_unchanged() {
        let sched = Scheduler::new();
        sched.schedule("job", "0 0 2 * * *", noop_job()).unwrap();

        let err = sched.schedule("job", "definitely not cron", noop_job());
        assert!(err.is_err());
        assert_eq!(sched.names(), vec!["job"]);

        let err = sched.schedule("other", "bad", noop_job());
        assert!(err.is_err());
        assert_eq!(sched.names(), vec!["job"]);
    }

    #[tokio::test]
    async fn five_field_spec_is_accepted() {
        let sched = Scheduler::new();
        sched.schedule("minutely", "* * * * *", noop_job()).unwrap();
        assert_eq!(sched.names(), vec!["minutely"]);
    }

    #[tokio::test]
    async fn every_second_spec_fires() {
        let sched = Scheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        sched
            .schedule("tick", "* * * * * *", counting_job(Arc::clone(&counter)))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(2200)).await;
        assert!(counter.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn deleted_schedule_stops_firing() {
        let sched = Scheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        sched
            .schedule("tick", "* * * * * *", counting_job(Arc::clone(&counter)))
            .unwrap();
        sched.delete("tick");

        // Let any firing spawned just before the delete drain.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let baseline = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), baseline);
    }
}
