use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashSet;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::error::InstallFailure;

/// State shared by every task of one install invocation.
#[derive(Debug)]
pub struct InstallRun {
    id: Uuid,
    processed: DashSet<String>,
    installed: Mutex<Vec<String>>,
    failures: Mutex<Vec<InstallFailure>>,
    progress: AtomicUsize,
    total_steps: AtomicUsize,
}

impl Default for InstallRun {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallRun {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            processed: DashSet::new(),
            installed: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            progress: AtomicUsize::new(1),
            total_steps: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Marks `name` as processed; `false` if another task got there first.
    pub fn try_claim(&self, name: &str) -> bool {
        self.processed.insert(name.to_string())
    }

    pub fn is_processed(&self, name: &str) -> bool {
        self.processed.contains(name)
    }

    pub async fn record_installed(&self, name: &str) {
        self.installed.lock().await.push(name.to_string());
    }

    pub async fn record_failure(&self, failure: InstallFailure) {
        self.failures.lock().await.push(failure);
    }

    pub async fn failure_count(&self) -> usize {
        self.failures.lock().await.len()
    }

    /// Returns the progress value before the increment.
    pub fn advance(&self) -> usize {
        self.progress.fetch_add(1, Ordering::Relaxed)
    }

    pub fn progress(&self) -> usize {
        self.progress.load(Ordering::Relaxed)
    }

    pub fn set_total_steps(&self, total: usize) {
        self.total_steps.store(total, Ordering::Relaxed);
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps.load(Ordering::Relaxed)
    }

    pub fn into_report(self) -> InstallReport {
        InstallReport {
            run_id: self.id,
            installed: self.installed.into_inner(),
            failures: self.failures.into_inner(),
        }
    }
}

/// Outcome of one install invocation.
#[derive(Debug)]
pub struct InstallReport {
    pub run_id: Uuid,
    /// Tentacles installed successfully, in completion order.
    pub installed: Vec<String>,
    pub failures: Vec<InstallFailure>,
}

impl InstallReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.failures.iter().map(ToString::to_string).collect()
    }
}
