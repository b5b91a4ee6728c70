//! Filter coordinator
//!
//! One coordinator per grid. It runs as a task on the Tokio runtime that
//! exclusively owns every [`ColumnFilter`] and the debounce deadline, so all
//! mutation and all publishing happen on a single execution context. The
//! grid talks to it through a cloneable [`FilterHandle`] that queues
//! [`FilterEvent`]s.
//!
//! Edits use a trailing-edge debounce: each edit that changes a value pushes
//! the deadline to `now + evaluation_delay`, and only when the deadline
//! passes with no further edits is a fresh [`CombinedPredicate`] built and
//! handed to the [`RowCollectionOwner`].
//!
//! ```rust,ignore
//! let rows = Arc::new(FilteredRows::new(rows));
//! let coordinator = FilterCoordinator::spawn(FilterConfig::default(), rows.clone())?;
//! let filters = coordinator.handle();
//!
//! filters.register_column(name_column, None)?;
//! filters.register_column(active_column, Some(Arc::new(BooleanFilterFactory)))?;
//! filters.set_filter_value(name_column, "jo")?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::column_filter::{ColumnFilter, FilterUpdate};
use crate::config::{validate_delay, FilterConfig, MAX_EVALUATION_DELAY};
use crate::content_filter::SharedFactory;
use crate::error::{GridFilterError, Result};
use crate::evaluator::{CombinedPredicate, FilterEvaluator};
use crate::events::{ColumnStatus, CoordinatorState, CoordinatorStatus, FilterEvent};
use crate::owner::{FilterDiagnostic, RowCollectionOwner};
use crate::types::{ColumnKey, FilterValue};

enum Command {
    Event(FilterEvent),
    Status(oneshot::Sender<CoordinatorStatus>),
    Shutdown(oneshot::Sender<()>),
}

/// Sends grid notifications to a running [`FilterCoordinator`].
///
/// Every method only enqueues; effects are applied on the coordinator's task
/// in call order. Calls fail with [`GridFilterError::CoordinatorClosed`] once
/// the coordinator is gone.
#[derive(Clone)]
pub struct FilterHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl FilterHandle {
    pub fn send(&self, event: FilterEvent) -> Result<()> {
        self.commands
            .send(Command::Event(event))
            .map_err(|_| GridFilterError::CoordinatorClosed)
    }

    /// Register a column, or swap the factory of an already registered one.
    /// `None` uses the coordinator's default factory.
    pub fn register_column(&self, column: ColumnKey, factory: Option<SharedFactory>) -> Result<()> {
        self.send(FilterEvent::ColumnAdded { column, factory })
    }

    pub fn unregister_column(&self, column: ColumnKey) -> Result<()> {
        self.send(FilterEvent::ColumnRemoved { column })
    }

    pub fn set_filter_value(&self, column: ColumnKey, value: impl Into<FilterValue>) -> Result<()> {
        self.send(FilterEvent::FilterValueEdited {
            column,
            value: value.into(),
        })
    }

    pub fn set_column_enabled(&self, column: ColumnKey, enabled: bool) -> Result<()> {
        self.send(FilterEvent::ColumnEnabled { column, enabled })
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.send(FilterEvent::FilteringEnabled(enabled))
    }

    pub fn set_evaluation_delay(&self, delay: Duration) -> Result<()> {
        validate_delay(delay)?;
        self.send(FilterEvent::EvaluationDelayChanged(delay))
    }

    pub fn clear_filters(&self) -> Result<()> {
        self.send(FilterEvent::ClearFilters)
    }

    pub fn refresh(&self) -> Result<()> {
        self.send(FilterEvent::Refresh)
    }

    /// Snapshot of the coordinator's state after every previously sent event
    /// has been applied
    pub async fn status(&self) -> Result<CoordinatorStatus> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Status(reply))
            .map_err(|_| GridFilterError::CoordinatorClosed)?;
        response.await.map_err(|_| GridFilterError::CoordinatorClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

impl std::fmt::Debug for FilterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Owns the coordinator task for one grid.
///
/// Dropping it aborts the task: a pending evaluation is discarded and
/// nothing is published afterwards.
pub struct FilterCoordinator {
    handle: FilterHandle,
    task: Option<JoinHandle<()>>,
}

impl FilterCoordinator {
    /// Start coordinating filters for a grid.
    ///
    /// Must be called from within a Tokio runtime. When `config.enabled` is
    /// set, the owner receives an initial predicate right away.
    pub fn spawn(config: FilterConfig, owner: Arc<dyn RowCollectionOwner>) -> Result<Self> {
        config.validate()?;

        let (commands, receiver) = mpsc::unbounded_channel();
        let worker = CoordinatorTask::new(config, owner);
        let task = tokio::spawn(worker.run(receiver));

        Ok(Self {
            handle: FilterHandle { commands },
            task: Some(task),
        })
    }

    pub fn handle(&self) -> FilterHandle {
        self.handle.clone()
    }

    /// Stop the coordinator and wait for its task to finish. A pending
    /// evaluation is dropped without publishing.
    pub async fn shutdown(mut self) -> Result<()> {
        let (ack, acked) = oneshot::channel();
        if self.handle.commands.send(Command::Shutdown(ack)).is_ok() {
            let _ = acked.await;
        }

        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!("Filter coordinator task ended abnormally: {}", err);
            }
        }
        Ok(())
    }
}

impl Drop for FilterCoordinator {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for FilterCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterCoordinator")
            .field("running", &self.task.as_ref().is_some_and(|task| !task.is_finished()))
            .finish()
    }
}

/// State living on the coordinator task
struct CoordinatorTask {
    columns: IndexMap<ColumnKey, ColumnFilter>,
    owner: Arc<dyn RowCollectionOwner>,
    default_factory: SharedFactory,
    enabled: bool,
    evaluation_delay: Duration,
    deadline: Option<Instant>,
}

impl CoordinatorTask {
    fn new(config: FilterConfig, owner: Arc<dyn RowCollectionOwner>) -> Self {
        Self {
            columns: IndexMap::new(),
            owner,
            default_factory: config.default_factory,
            enabled: config.enabled,
            evaluation_delay: config.evaluation_delay,
            deadline: None,
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        tracing::debug!(enabled = self.enabled, "Filter coordinator attached");
        if self.enabled {
            self.publish_now("attached");
        }

        loop {
            let deadline = self.deadline;

            tokio::select! {
                // Queued edits win over an expiring deadline so they can still extend it
                biased;

                command = commands.recv() => match command {
                    Some(Command::Event(event)) => self.handle_event(event),
                    Some(Command::Status(reply)) => {
                        let _ = reply.send(self.status());
                    }
                    Some(Command::Shutdown(ack)) => {
                        self.detach();
                        let _ = ack.send(());
                        break;
                    }
                    None => {
                        self.detach();
                        break;
                    }
                },

                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.publish_now("debounce elapsed");
                }
            }
        }

        tracing::debug!("Filter coordinator stopped");
    }

    fn handle_event(&mut self, event: FilterEvent) {
        tracing::trace!(?event, "Filter event");

        match event {
            FilterEvent::ColumnAdded { column, factory } => self.register_column(column, factory),
            FilterEvent::ColumnRemoved { column } => self.unregister_column(column),
            FilterEvent::FilterValueEdited { column, value } => self.set_value(column, value),
            FilterEvent::ColumnEnabled { column, enabled } => {
                self.set_column_enabled(column, enabled)
            }
            FilterEvent::FilteringEnabled(enabled) => self.set_enabled(enabled),
            FilterEvent::EvaluationDelayChanged(delay) => self.set_evaluation_delay(delay),
            FilterEvent::ClearFilters => self.clear_filters(),
            FilterEvent::Refresh => {
                if self.enabled {
                    self.publish_now("refresh");
                }
            }
        }
    }

    fn register_column(&mut self, column: ColumnKey, factory: Option<SharedFactory>) {
        let factory = factory.unwrap_or_else(|| self.default_factory.clone());

        let (update, was_active, is_active, diagnostic) = match self.columns.get_mut(&column) {
            Some(existing) => {
                let was_active = existing.is_active();
                let update = existing.set_factory(factory);
                let diagnostic = factory_failure(existing, &update);
                (update, was_active, existing.is_active(), diagnostic)
            }
            None => {
                let mut filter = ColumnFilter::new(column, factory);
                // Some factories constrain even an empty value (e.g. "is null")
                let update = filter.rebuild();
                let diagnostic = factory_failure(&filter, &update);
                let is_active = filter.is_active();
                self.columns.insert(column, filter);
                (update, false, is_active, diagnostic)
            }
        };

        tracing::debug!(column = %column, ?update, "Filter column registered");
        if let Some(diagnostic) = diagnostic {
            self.report(diagnostic);
        }
        if was_active || is_active {
            self.schedule();
        }
    }

    fn unregister_column(&mut self, column: ColumnKey) {
        match self.columns.shift_remove(&column) {
            Some(removed) => {
                tracing::debug!(column = %column, active = removed.is_active(), "Filter column removed");
                if removed.is_active() {
                    self.schedule();
                }
            }
            None => tracing::debug!(column = %column, "Ignoring removal of unregistered column"),
        }
    }

    fn set_value(&mut self, column: ColumnKey, value: FilterValue) {
        let Some(filter) = self.columns.get_mut(&column) else {
            self.report(FilterDiagnostic::UnknownColumn { column });
            return;
        };

        let update = filter.set_value(value);
        let diagnostic = factory_failure(filter, &update);

        if let Some(diagnostic) = diagnostic {
            self.report(diagnostic);
        }
        if update.is_changed() {
            self.schedule();
        }
    }

    fn set_column_enabled(&mut self, column: ColumnKey, enabled: bool) {
        let Some(filter) = self.columns.get_mut(&column) else {
            self.report(FilterDiagnostic::UnknownColumn { column });
            return;
        };

        if filter.set_enabled(enabled) && filter.content_filter().is_some() {
            self.schedule();
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;

        if enabled {
            self.publish_now("enabled");
        } else {
            self.detach();
            self.owner
                .set_filter_predicate(CombinedPredicate::accept_all());
            tracing::debug!("Filtering disabled, published accept-all predicate");
        }
    }

    /// Only affects deadlines armed from now on
    fn set_evaluation_delay(&mut self, delay: Duration) {
        if validate_delay(delay).is_err() {
            self.report(FilterDiagnostic::InvalidEvaluationDelay {
                requested: delay,
                maximum: MAX_EVALUATION_DELAY,
            });
            return;
        }
        tracing::debug!(?delay, "Filter evaluation delay changed");
        self.evaluation_delay = delay;
    }

    fn clear_filters(&mut self) {
        let mut changed = false;
        let mut diagnostics = Vec::new();
        for filter in self.columns.values_mut() {
            let update = filter.set_value(FilterValue::Empty);
            diagnostics.extend(factory_failure(filter, &update));
            changed |= update.is_changed();
        }

        for diagnostic in diagnostics {
            self.report(diagnostic);
        }
        if changed && self.enabled {
            self.publish_now("filters cleared");
        }
    }

    /// Arm (or push back) the debounce deadline
    fn schedule(&mut self) {
        if !self.enabled {
            return;
        }
        match Instant::now().checked_add(self.evaluation_delay) {
            Some(deadline) => {
                tracing::trace!(delay = ?self.evaluation_delay, "Filter evaluation scheduled");
                self.deadline = Some(deadline);
            }
            None => {
                tracing::warn!(delay = ?self.evaluation_delay, "Evaluation delay overflows the clock");
                self.publish_now("delay overflow");
            }
        }
    }

    /// Drop any pending evaluation
    fn detach(&mut self) {
        if self.deadline.take().is_some() {
            tracing::debug!("Cancelled pending filter evaluation");
        }
    }

    fn publish_now(&mut self, reason: &'static str) {
        self.deadline = None;
        let predicate = FilterEvaluator::snapshot(self.columns.values());
        tracing::debug!(
            reason,
            active_columns = predicate.active_columns().count(),
            "Publishing filter predicate"
        );
        self.owner.set_filter_predicate(predicate);
    }

    fn report(&self, diagnostic: FilterDiagnostic) {
        tracing::debug!(%diagnostic, "Reporting filter diagnostic");
        self.owner.report_diagnostic(diagnostic);
    }

    fn state(&self) -> CoordinatorState {
        if !self.enabled {
            CoordinatorState::Disabled
        } else if self.deadline.is_some() {
            CoordinatorState::PendingEvaluation
        } else {
            CoordinatorState::Idle
        }
    }

    fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            state: self.state(),
            evaluation_delay: self.evaluation_delay,
            columns: self
                .columns
                .values()
                .map(|filter| ColumnStatus {
                    column: filter.key(),
                    value: filter.value().clone(),
                    factory: filter.factory().name().to_string(),
                    enabled: filter.is_enabled(),
                    active: filter.is_active(),
                })
                .collect(),
        }
    }
}

fn factory_failure(filter: &ColumnFilter, update: &FilterUpdate) -> Option<FilterDiagnostic> {
    match update {
        FilterUpdate::FailedOpen(err) => Some(FilterDiagnostic::FactoryFailed {
            column: filter.key(),
            factory: filter.factory().name().to_string(),
            value: filter.value().clone(),
            message: err.to_string(),
        }),
        _ => None,
    }
}
