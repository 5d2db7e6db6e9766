pub mod entities;
pub mod tracker;
pub mod view_index;

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};

use crate::models::{ActiveStatus, AssetRecord, UsageLocation};
use crate::table::conflicts::ConflictSet;
use crate::table::sort_filter::ViewQuery;

pub use entities::EntityStore;
pub use tracker::{OperationKind, OperationSnapshot, OperationState, OperationTracker, RequestStatus};
pub use view_index::{FetchTicket, ViewIndex};

/// Everything the table renders from.
#[derive(Clone, Debug, Default)]
pub struct AssetState {
    pub entities: EntityStore,
    pub view: ViewIndex,
    pub operations: OperationTracker,
    pub conflicts: ConflictSet,
    pub new_asset_ids: Vec<String>,
    pub selected_ids: Vec<String>,
}

impl AssetState {
    pub fn rows(&self) -> Vec<AssetRecord> {
        self.view
            .ordered_ids
            .iter()
            .filter_map(|id| self.entities.get(id).cloned())
            .collect()
    }

    pub fn selected_rows(&self) -> Vec<AssetRecord> {
        self.selected_ids
            .iter()
            .filter_map(|id| self.entities.get(id).cloned())
            .collect()
    }

    pub(crate) fn begin(&mut self, kind: OperationKind) {
        self.operations.set_status(kind, RequestStatus::Pending);
    }

    pub(crate) fn finish(&mut self, kind: OperationKind, status: RequestStatus) {
        self.operations.set_status(kind, status);
    }

    pub(crate) fn fail(&mut self, kind: OperationKind, status: RequestStatus, message: String) {
        self.operations.push_error(kind, message);
        self.operations.set_status(kind, status);
    }

    pub(crate) fn begin_first_page(&mut self, query: ViewQuery) -> FetchTicket {
        let ticket = self.view.reset(query);
        self.begin(OperationKind::Loading);
        ticket
    }

    /// Returns false when a newer fetch has replaced the view since `ticket`.
    pub(crate) fn apply_first_page(
        &mut self,
        ticket: &FetchTicket,
        records: Vec<AssetRecord>,
        total_count: usize,
    ) -> bool {
        if !self.view.is_current(ticket) {
            return false;
        }
        let ids = records.iter().map(|record| record.id.clone()).collect();
        self.entities.upsert_many(records);
        self.view.replace(ids, total_count);
        self.reconcile_selection();
        true
    }

    pub(crate) fn apply_next_page(
        &mut self,
        ticket: &FetchTicket,
        page_number: usize,
        records: Vec<AssetRecord>,
    ) -> bool {
        if !self.view.is_current(ticket) {
            return false;
        }
        let ids: Vec<String> = records.iter().map(|record| record.id.clone()).collect();
        self.entities.upsert_many(records);
        self.view.append(page_number, ids);
        true
    }

    /// Sets the row order, dropping ids the entity store does not know.
    pub(crate) fn apply_order(&mut self, ids: Vec<String>) -> usize {
        let requested = ids.len();
        let known: Vec<String> = ids
            .into_iter()
            .filter(|id| self.entities.contains(id))
            .collect();
        let dropped = requested - known.len();
        self.view.set_order(known);
        dropped
    }

    pub(crate) fn apply_added(&mut self, record: AssetRecord, is_overwrite: bool) {
        let id = record.id.clone();
        self.entities.upsert(record);
        if !is_overwrite {
            self.view.prepend(id.clone());
            if !self.new_asset_ids.contains(&id) {
                self.new_asset_ids.push(id);
            }
        }
    }

    pub(crate) fn apply_deleted(&mut self, id: &str) {
        self.entities.remove(id);
        self.view.remove(id);
        self.new_asset_ids.retain(|existing| existing != id);
        self.reconcile_selection();
    }

    pub(crate) fn apply_lock(&mut self, id: &str, locked: bool) -> bool {
        self.entities
            .update(id, |record| record.lock_status = locked)
    }

    pub(crate) fn apply_usage(&mut self, id: &str, locations: Vec<UsageLocation>) -> bool {
        self.entities.update(id, |record| {
            record.active_status = Some(ActiveStatus::from_locations(&locations));
            record.usage_locations = Some(locations);
        })
    }

    pub(crate) fn reconcile_selection(&mut self) {
        let entities = &self.entities;
        self.selected_ids.retain(|id| entities.contains(id));
        let entities = &self.entities;
        self.view.retain(|id| entities.contains(id));
    }
}

/// Shared handle to the asset state.
///
/// Readers get clones. Writes go through the orchestrator, which applies the
/// whole effect of an operation in a single `mutate` call.
#[derive(Clone, Default)]
pub struct AssetStore {
    state: Arc<RwLock<AssetState>>,
    subscribers: Arc<Mutex<Vec<UnboundedSender<OperationSnapshot>>>>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> AssetState {
        self.read(Clone::clone)
    }

    pub fn record(&self, id: &str) -> Option<AssetRecord> {
        self.read(|state| state.entities.get(id).cloned())
    }

    pub fn view(&self) -> ViewIndex {
        self.read(|state| state.view.clone())
    }

    pub fn rows(&self) -> Vec<AssetRecord> {
        self.read(AssetState::rows)
    }

    pub fn operation(&self, kind: OperationKind) -> OperationSnapshot {
        self.read(|state| state.operations.snapshot(kind))
    }

    pub fn status(&self, kind: OperationKind) -> RequestStatus {
        self.read(|state| state.operations.status(kind))
    }

    pub fn errors(&self, kind: OperationKind) -> Vec<String> {
        self.read(|state| state.operations.errors(kind).to_vec())
    }

    pub fn conflicts(&self) -> ConflictSet {
        self.read(|state| state.conflicts.clone())
    }

    pub fn new_asset_ids(&self) -> Vec<String> {
        self.read(|state| state.new_asset_ids.clone())
    }

    pub fn selected_rows(&self) -> Vec<AssetRecord> {
        self.read(AssetState::selected_rows)
    }

    /// Selection is table state, so the UI may set it. Unknown ids are ignored.
    pub fn select<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        self.mutate(|state| {
            state.selected_ids.clear();
            for id in ids {
                if state.entities.contains(&id) && !state.selected_ids.contains(&id) {
                    state.selected_ids.push(id);
                }
            }
        });
    }

    /// Receives a snapshot every time a kind's status or errors change.
    pub fn subscribe(&self) -> UnboundedReceiver<OperationSnapshot> {
        let (tx, rx) = unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    fn read<R>(&self, f: impl FnOnce(&AssetState) -> R) -> R {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut AssetState) -> R) -> R {
        let (result, changed) = {
            let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let result = f(&mut guard);
            (result, guard.operations.take_dirty())
        };
        self.notify(changed);
        result
    }

    fn notify(&self, changed: Vec<OperationSnapshot>) {
        if changed.is_empty() {
            return;
        }
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| {
            changed
                .iter()
                .all(|snapshot| tx.unbounded_send(snapshot.clone()).is_ok())
        });
    }
}
