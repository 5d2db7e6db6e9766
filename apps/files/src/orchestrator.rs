//! Table intents. This is the only place that calls the remote API.
//!
//! Every operation follows the same shape: mark its kind pending, await the
//! remote call, then apply the store, view and status changes in a single
//! `mutate` step. Failures are folded into the kind's error list and never
//! returned to the caller.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::api::AssetApi;
use crate::config::{AppConfig, CollectionKind};
use crate::error::FailureKind;
use crate::models::{normalize_asset, AssetRecord, UploadFile};
use crate::state::{AssetStore, OperationKind, RequestStatus};
use crate::table::client_sort::sort_files;
use crate::table::conflicts::{partition_uploads, ConflictSet};
use crate::table::sort_filter::{SortBy, TableFilter, ViewQuery};

/// What the user chose in the duplicate-file prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictDecision {
    Overwrite,
    Skip,
}

pub struct AssetOrchestrator<A: AssetApi> {
    api: Arc<A>,
    store: AssetStore,
    page_size: usize,
    studio_base_url: String,
    collection: CollectionKind,
}

impl<A: AssetApi> AssetOrchestrator<A> {
    pub fn new(api: A, config: &AppConfig) -> Self {
        Self::with_store(Arc::new(api), AssetStore::new(), config)
    }

    pub fn with_store(api: Arc<A>, store: AssetStore, config: &AppConfig) -> Self {
        Self {
            api,
            store,
            page_size: config.page_size.max(1),
            studio_base_url: config.studio_base_url.clone(),
            collection: config.collection,
        }
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn collection(&self) -> CollectionKind {
        self.collection
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn normalize(&self, records: Vec<AssetRecord>) -> Vec<AssetRecord> {
        records
            .into_iter()
            .map(|record| normalize_asset(record, &self.studio_base_url))
            .collect()
    }

    /// Replaces the view with page 0 under new filters and sort.
    ///
    /// A response is only applied if no newer fetch has reset the view while it
    /// was in flight, even one for the same query. Superseded responses are
    /// dropped without touching status.
    pub async fn fetch_first_page(&self, course_id: &str, filters: &[TableFilter], sort_key: &str) {
        let query = ViewQuery::new(sort_key, filters);
        let request = query.to_api(0, self.page_size);
        let ticket = self
            .store
            .mutate(|state| state.begin_first_page(query.clone()));
        info!(%course_id, sort = %query.sort, "fetching first asset page");

        match self.api.list_assets(course_id, &request).await {
            Ok(page) => {
                let total_count = page.total_count;
                let records = self.normalize(page.assets);
                let applied = self.store.mutate(|state| {
                    let applied = state.apply_first_page(&ticket, records, total_count);
                    if applied {
                        state.finish(OperationKind::Loading, RequestStatus::Successful);
                    }
                    applied
                });
                if applied {
                    info!(%course_id, total_count, "asset page loaded");
                } else {
                    debug!(%course_id, sort = %query.sort, "dropping superseded asset page");
                }
            }
            Err(err) => {
                let kind = err.failure_kind();
                let applied = self.store.mutate(|state| {
                    if !state.view.is_current(&ticket) {
                        return false;
                    }
                    if kind.is_denied() {
                        state.finish(OperationKind::Loading, RequestStatus::Denied);
                    } else {
                        state.fail(
                            OperationKind::Loading,
                            RequestStatus::Failed,
                            "Failed to load all files.".to_string(),
                        );
                    }
                    true
                });
                if applied {
                    warn!(%course_id, %kind, "asset list failed: {err}");
                } else {
                    debug!(%course_id, "ignoring failure of superseded asset fetch: {err}");
                }
            }
        }
    }

    /// Appends one more page under the current filters and sort.
    pub async fn fetch_next_page(
        &self,
        course_id: &str,
        page_number: usize,
        filters: &[TableFilter],
        sort_key: &str,
    ) {
        let query = ViewQuery::new(sort_key, filters);
        let ticket = self.store.mutate(|state| {
            if !state.view.has_query(&query) {
                return None;
            }
            state.begin(OperationKind::Loading);
            Some(state.view.ticket())
        });
        let Some(ticket) = ticket else {
            debug!(%course_id, page_number, "next page requested for a replaced view");
            return;
        };

        let request = query.to_api(page_number, self.page_size);
        match self.api.list_assets(course_id, &request).await {
            Ok(page) => {
                let records = self.normalize(page.assets);
                let applied = self.store.mutate(|state| {
                    let applied = state.apply_next_page(&ticket, page_number, records);
                    if applied {
                        state.finish(OperationKind::Loading, RequestStatus::Successful);
                    }
                    applied
                });
                if !applied {
                    debug!(%course_id, page_number, "dropping superseded asset page");
                }
            }
            Err(err) => {
                let applied = self.store.mutate(|state| {
                    if !state.view.is_current(&ticket) {
                        return false;
                    }
                    state.fail(
                        OperationKind::Loading,
                        RequestStatus::PartialFailure,
                        "Failed to load remaining files.".to_string(),
                    );
                    true
                });
                if applied {
                    warn!(%course_id, page_number, kind = %FailureKind::PartialFailure, "asset page failed: {err}");
                }
            }
        }
    }

    /// Pagination footer entry point. Only the file collection pages remotely,
    /// and a page is requested once per view.
    pub async fn go_to_page(
        &self,
        course_id: &str,
        page_number: usize,
        filters: &[TableFilter],
        sort_key: &str,
    ) {
        if !self.collection.loads_pages_remotely() {
            return;
        }
        let view = self.store.view();
        if view.has_query(&ViewQuery::new(sort_key, filters)) && view.has_page(page_number) {
            debug!(%course_id, page_number, "page already loaded");
            return;
        }
        self.fetch_next_page(course_id, page_number, filters, sort_key)
            .await;
    }

    /// Client-side reorder; no remote validation.
    ///
    /// A fetch that is still pending keeps ownership of the loading status.
    pub fn reorder(&self, course_id: &str, ids: Vec<String>) {
        let dropped = self.store.mutate(|state| {
            let fetch_pending =
                state.operations.status(OperationKind::Loading) == RequestStatus::Pending;
            if !fetch_pending {
                state.begin(OperationKind::Loading);
            }
            let dropped = state.apply_order(ids);
            if !fetch_pending {
                state.finish(OperationKind::Loading, RequestStatus::Successful);
            }
            dropped
        });
        if dropped > 0 {
            warn!(%course_id, dropped, "reorder referenced unknown assets");
        }
    }

    /// Sorts the loaded rows locally, for the collection that is not paginated.
    pub fn sort_loaded(&self, course_id: &str, sort: &SortBy) {
        let rows = self.store.rows();
        let ids = sort_files(&rows, sort);
        self.reorder(course_id, ids);
    }

    pub async fn add_asset(&self, course_id: &str, file: UploadFile, is_overwrite: bool) {
        self.store.mutate(|state| state.begin(OperationKind::Add));
        info!(%course_id, file = %file.name, is_overwrite, "uploading asset");

        match self.api.create_asset(course_id, &file).await {
            Ok(payload) => {
                let record = normalize_asset(payload.asset, &self.studio_base_url);
                self.store.mutate(|state| {
                    state.apply_added(record, is_overwrite);
                    state.finish(OperationKind::Add, RequestStatus::Successful);
                });
            }
            Err(err) => {
                let kind = err.failure_kind();
                let message = match &kind {
                    FailureKind::PayloadTooLarge { message } => message.clone(),
                    _ => format!("Failed to add {}.", file.name),
                };
                warn!(%course_id, file = %file.name, %kind, "upload failed: {err}");
                self.store.mutate(|state| {
                    state.fail(OperationKind::Add, RequestStatus::Failed, message)
                });
            }
        }
    }

    pub async fn delete_asset(&self, course_id: &str, id: &str) {
        self.store.mutate(|state| state.begin(OperationKind::Delete));

        match self.api.delete_asset(course_id, id).await {
            Ok(()) => {
                self.store.mutate(|state| {
                    state.apply_deleted(id);
                    state.finish(OperationKind::Delete, RequestStatus::Successful);
                });
                info!(%course_id, %id, "asset deleted");
            }
            Err(err) => {
                warn!(%course_id, %id, "delete failed: {err}");
                self.store.mutate(|state| {
                    state.fail(
                        OperationKind::Delete,
                        RequestStatus::Failed,
                        format!("Failed to delete file id {id}."),
                    )
                });
            }
        }
    }

    /// Deletes every selected row, clearing earlier delete errors first.
    pub async fn delete_selected(&self, course_id: &str) {
        self.reset_errors(OperationKind::Delete);
        let ids = self.store.snapshot().selected_ids;
        join_all(ids.iter().map(|id| self.delete_asset(course_id, id))).await;
    }

    pub async fn set_lock(&self, course_id: &str, id: &str, locked: bool) {
        self.store.mutate(|state| state.begin(OperationKind::Lock));

        match self.api.set_lock_status(course_id, id, locked).await {
            Ok(()) => {
                self.store.mutate(|state| {
                    state.apply_lock(id, locked);
                    state.finish(OperationKind::Lock, RequestStatus::Successful);
                });
            }
            Err(err) => {
                let target = if locked { "lock" } else { "unlock" };
                warn!(%course_id, %id, target, "lock update failed: {err}");
                self.store.mutate(|state| {
                    state.fail(
                        OperationKind::Lock,
                        RequestStatus::Failed,
                        format!("Failed to {target} file id {id}."),
                    )
                });
            }
        }
    }

    /// Loads where an asset is used. Skipped for assets no longer in the store.
    pub async fn fetch_usage_locations(&self, course_id: &str, asset: &AssetRecord) {
        let started = self.store.mutate(|state| {
            if !state.entities.contains(&asset.id) {
                return false;
            }
            state.begin(OperationKind::UsageMetrics);
            true
        });
        if !started {
            debug!(%course_id, id = %asset.id, "skipping usage lookup for removed asset");
            return;
        }

        match self.api.get_usage_paths(course_id, &asset.id).await {
            Ok(mut payload) => {
                let locations = payload
                    .usage_locations
                    .remove(&asset.id)
                    .unwrap_or_default();
                self.store.mutate(|state| {
                    state.apply_usage(&asset.id, locations);
                    state.finish(OperationKind::UsageMetrics, RequestStatus::Successful);
                });
            }
            Err(err) => {
                warn!(%course_id, id = %asset.id, "usage lookup failed: {err}");
                self.store.mutate(|state| {
                    state.fail(
                        OperationKind::UsageMetrics,
                        RequestStatus::Failed,
                        format!("Failed to get usage metrics for {}.", asset.display_name),
                    )
                });
            }
        }
    }

    /// Downloads each row. One failed row fails the operation; rows that
    /// already downloaded stay downloaded.
    pub async fn bulk_download(&self, rows: &[AssetRecord], course_id: &str) {
        self.store
            .mutate(|state| state.begin(OperationKind::Download));

        let errors = self.api.download_rows(rows, course_id).await;
        if !errors.is_empty() {
            warn!(%course_id, failed = errors.len(), total = rows.len(), "bulk download incomplete");
        }

        self.store.mutate(|state| {
            if errors.is_empty() {
                state.finish(OperationKind::Download, RequestStatus::Successful);
            } else {
                for message in errors {
                    state.operations.push_error(OperationKind::Download, message);
                }
                state.finish(OperationKind::Download, RequestStatus::Failed);
            }
        });
    }

    /// Uploads the files whose names are free and holds back the rest for an
    /// overwrite decision.
    pub async fn validate_upload_batch(&self, course_id: &str, files: Vec<UploadFile>) {
        self.store.mutate(|state| {
            state.begin(OperationKind::Add);
            state.conflicts = ConflictSet::default();
        });

        let filenames: Vec<String> = files.iter().map(|file| file.name.clone()).collect();
        let existing = match self
            .api
            .get_asset_names_for_files(course_id, &filenames)
            .await
        {
            Ok(payload) => payload.assets,
            Err(err) => {
                warn!(%course_id, kind = %FailureKind::Validation, files = filenames.len(), "upload validation failed: {err}");
                self.store.mutate(|state| {
                    for name in &filenames {
                        state
                            .operations
                            .push_error(OperationKind::Add, format!("Failed to validate {name}."));
                    }
                    state.finish(OperationKind::Add, RequestStatus::Failed);
                });
                return;
            }
        };

        let partition = partition_uploads(
            files,
            existing.iter().map(|asset| asset.display_name.as_str()),
        );
        info!(
            %course_id,
            clean = partition.clean.len(),
            conflicts = partition.conflicts.len(),
            "upload batch validated"
        );

        let awaiting_decision = !partition.conflicts.is_empty();
        let nothing_to_upload = partition.clean.is_empty();
        self.store.mutate(|state| {
            state.conflicts = partition.conflicts;
            if nothing_to_upload && !awaiting_decision {
                state.finish(OperationKind::Add, RequestStatus::Successful);
            }
        });

        join_all(
            partition
                .clean
                .into_iter()
                .map(|file| self.add_asset(course_id, file, false)),
        )
        .await;
    }

    /// Applies the user's answer to the duplicate-file prompt and clears it.
    pub async fn resolve_conflicts(&self, course_id: &str, decision: ConflictDecision) {
        let conflicts = self
            .store
            .mutate(|state| std::mem::take(&mut state.conflicts));

        match decision {
            ConflictDecision::Overwrite => {
                join_all(
                    conflicts
                        .into_files()
                        .into_iter()
                        .map(|file| self.add_asset(course_id, file, true)),
                )
                .await;
            }
            ConflictDecision::Skip => {
                debug!(%course_id, skipped = conflicts.len(), "keeping existing files");
                self.store.mutate(|state| {
                    if state.operations.status(OperationKind::Add) == RequestStatus::Pending {
                        state.finish(OperationKind::Add, RequestStatus::Successful);
                    }
                });
            }
        }
    }

    pub fn reset_errors(&self, kind: OperationKind) {
        self.store
            .mutate(|state| state.operations.clear_errors(kind));
    }
}
