//! Common test utilities: a recording row owner and a small sample grid

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use zqlz_grid_filter::{
    CellValue, ColumnKey, CombinedPredicate, FilterConfig, FilterCoordinator, FilterDiagnostic,
    FilterHandle, RowCollectionOwner,
};

pub type Row = HashMap<ColumnKey, CellValue>;

/// A predicate handed to the owner, with the (paused) clock time it arrived
#[derive(Clone, Debug)]
pub struct Publish {
    pub at: Duration,
    pub predicate: CombinedPredicate,
}

/// Row owner that records every predicate and diagnostic it receives.
pub struct RecordingOwner {
    started: Instant,
    publishes: Mutex<Vec<Publish>>,
    diagnostics: Mutex<Vec<FilterDiagnostic>>,
}

impl RecordingOwner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Instant::now(),
            publishes: Mutex::new(Vec::new()),
            diagnostics: Mutex::new(Vec::new()),
        })
    }

    pub fn publishes(&self) -> Vec<Publish> {
        self.publishes.lock().clone()
    }

    pub fn publish_count(&self) -> usize {
        self.publishes.lock().len()
    }

    pub fn last(&self) -> Publish {
        self.publishes
            .lock()
            .last()
            .cloned()
            .expect("owner should have received a predicate")
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.publishes.lock().clear();
        self.diagnostics.lock().clear();
    }

    pub fn diagnostics(&self) -> Vec<FilterDiagnostic> {
        self.diagnostics.lock().clone()
    }
}

impl RowCollectionOwner for RecordingOwner {
    fn set_filter_predicate(&self, predicate: CombinedPredicate) {
        self.publishes.lock().push(Publish {
            at: self.started.elapsed(),
            predicate,
        });
    }

    fn report_diagnostic(&self, diagnostic: FilterDiagnostic) {
        self.diagnostics.lock().push(diagnostic);
    }
}

/// Two-column people grid: Name (text) and Active (checkbox)
pub struct People {
    pub name: ColumnKey,
    pub active: ColumnKey,
}

impl People {
    pub fn new() -> Self {
        Self {
            name: ColumnKey::new(),
            active: ColumnKey::new(),
        }
    }

    pub fn row(&self, name: &str, active: bool) -> Row {
        HashMap::from([(self.name, name.into()), (self.active, active.into())])
    }

    pub fn rows(&self) -> Vec<Row> {
        vec![
            self.row("John", true),
            self.row("Joanna", false),
            self.row("Mike", true),
        ]
    }

    /// Names of the sample rows the predicate keeps
    pub fn kept_names(&self, predicate: &CombinedPredicate) -> Vec<String> {
        self.rows()
            .iter()
            .filter(|row| predicate.matches(*row))
            .map(|row| row[&self.name].to_string())
            .collect()
    }
}

pub fn spawn(config: FilterConfig, owner: &Arc<RecordingOwner>) -> (FilterCoordinator, FilterHandle) {
    let coordinator =
        FilterCoordinator::spawn(config, owner.clone()).expect("coordinator should start");
    let handle = coordinator.handle();
    (coordinator, handle)
}

/// Wait until the coordinator has applied every event sent so far
pub async fn settle(handle: &FilterHandle) {
    handle.status().await.expect("coordinator should be running");
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Assert a publish happened at `expected`, allowing for timer granularity
pub fn assert_at(publish: &Publish, expected: Duration) {
    assert!(
        publish.at >= expected && publish.at < expected + ms(5),
        "expected publish at {:?}, got {:?}",
        expected,
        publish.at
    );
}
