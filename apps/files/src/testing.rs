//! In-memory `AssetApi` used by the orchestrator tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::channel::oneshot;
use reqwest::StatusCode;

use crate::api::{ApiErrorBody, AssetApi, ClientError, ClientResult};
use crate::models::{
    AssetNamesPayload, AssetPage, AssetRecord, CreatedAssetPayload, UploadFile, UsageLocation,
    UsagePathsPayload,
};
use crate::table::sort_filter::AssetQuery;

pub(crate) fn page(ids: &[&str], total_count: usize) -> AssetPage {
    AssetPage {
        assets: ids
            .iter()
            .map(|id| AssetRecord::new(*id, format!("{id}.pdf")))
            .collect(),
        total_count,
    }
}

enum ListResponse {
    Ready(ClientResult<AssetPage>),
    Gated(oneshot::Receiver<ClientResult<AssetPage>>),
}

#[derive(Default)]
pub(crate) struct MockAssetApi {
    list_responses: Mutex<VecDeque<ListResponse>>,
    list_calls: Mutex<Vec<AssetQuery>>,
    existing_names: Mutex<Vec<String>>,
    name_probe_fails: Mutex<bool>,
    probed_names: Mutex<Vec<Vec<String>>>,
    create_failures: Mutex<HashMap<String, StatusCode>>,
    create_calls: Mutex<Vec<String>>,
    delete_failures: Mutex<HashSet<String>>,
    lock_failures: Mutex<HashSet<String>>,
    usage: Mutex<HashMap<String, Vec<UsageLocation>>>,
    usage_failures: Mutex<HashSet<String>>,
    usage_calls: Mutex<Vec<String>>,
    download_failures: Mutex<HashSet<String>>,
    downloaded: Mutex<Vec<String>>,
}

impl MockAssetApi {
    pub(crate) fn queue_page(&self, response: ClientResult<AssetPage>) {
        self.list_responses
            .lock()
            .unwrap()
            .push_back(ListResponse::Ready(response));
    }

    /// Queues a list response that resolves only when the sender fires.
    pub(crate) fn gate_page(&self) -> oneshot::Sender<ClientResult<AssetPage>> {
        let (tx, rx) = oneshot::channel();
        self.list_responses
            .lock()
            .unwrap()
            .push_back(ListResponse::Gated(rx));
        tx
    }

    pub(crate) fn set_existing_names(&self, names: &[&str]) {
        *self.existing_names.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
    }

    pub(crate) fn fail_name_probe(&self) {
        *self.name_probe_fails.lock().unwrap() = true;
    }

    pub(crate) fn fail_create(&self, name: &str, status: StatusCode) {
        self.create_failures
            .lock()
            .unwrap()
            .insert(name.to_string(), status);
    }

    pub(crate) fn fail_delete(&self, id: &str) {
        self.delete_failures.lock().unwrap().insert(id.to_string());
    }

    pub(crate) fn fail_lock(&self, id: &str) {
        self.lock_failures.lock().unwrap().insert(id.to_string());
    }

    pub(crate) fn set_usage(&self, id: &str, locations: Vec<UsageLocation>) {
        self.usage.lock().unwrap().insert(id.to_string(), locations);
    }

    pub(crate) fn fail_usage(&self, id: &str) {
        self.usage_failures.lock().unwrap().insert(id.to_string());
    }

    pub(crate) fn fail_download(&self, name: &str) {
        self.download_failures
            .lock()
            .unwrap()
            .insert(name.to_string());
    }

    pub(crate) fn list_calls(&self) -> Vec<AssetQuery> {
        self.list_calls.lock().unwrap().clone()
    }

    pub(crate) fn probed_names(&self) -> Vec<Vec<String>> {
        self.probed_names.lock().unwrap().clone()
    }

    pub(crate) fn create_calls(&self) -> Vec<String> {
        self.create_calls.lock().unwrap().clone()
    }

    pub(crate) fn usage_calls(&self) -> Vec<String> {
        self.usage_calls.lock().unwrap().clone()
    }

    pub(crate) fn downloaded(&self) -> Vec<String> {
        self.downloaded.lock().unwrap().clone()
    }
}

fn server_error() -> ClientError {
    ClientError::EmptyResponse(StatusCode::INTERNAL_SERVER_ERROR)
}

#[async_trait]
impl AssetApi for MockAssetApi {
    async fn list_assets(&self, _course_id: &str, query: &AssetQuery) -> ClientResult<AssetPage> {
        self.list_calls.lock().unwrap().push(query.clone());
        let next = self.list_responses.lock().unwrap().pop_front();
        match next {
            Some(ListResponse::Ready(response)) => response,
            Some(ListResponse::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(ClientError::EmptyResponse(StatusCode::GATEWAY_TIMEOUT))),
            None => Ok(AssetPage::default()),
        }
    }

    async fn get_asset_names_for_files(
        &self,
        _course_id: &str,
        filenames: &[String],
    ) -> ClientResult<AssetNamesPayload> {
        self.probed_names.lock().unwrap().push(filenames.to_vec());
        if *self.name_probe_fails.lock().unwrap() {
            return Err(server_error());
        }
        let existing = self.existing_names.lock().unwrap().clone();
        let assets = filenames
            .iter()
            .filter(|name| existing.contains(name))
            .map(|name| AssetRecord::new(format!("existing-{name}"), name.clone()))
            .collect();
        Ok(AssetNamesPayload { assets })
    }

    async fn create_asset(
        &self,
        _course_id: &str,
        file: &UploadFile,
    ) -> ClientResult<CreatedAssetPayload> {
        self.create_calls.lock().unwrap().push(file.name.clone());
        let failure = self.create_failures.lock().unwrap().get(&file.name).copied();
        if let Some(status) = failure {
            return Err(ClientError::Api(ApiErrorBody::new(
                status,
                format!("{} exceeds the maximum upload size.", file.name),
            )));
        }
        Ok(CreatedAssetPayload {
            asset: AssetRecord::new(format!("asset-{}", file.name), file.name.clone()),
        })
    }

    async fn delete_asset(&self, _course_id: &str, asset_id: &str) -> ClientResult<()> {
        if self.delete_failures.lock().unwrap().contains(asset_id) {
            return Err(server_error());
        }
        Ok(())
    }

    async fn set_lock_status(
        &self,
        _course_id: &str,
        asset_id: &str,
        _locked: bool,
    ) -> ClientResult<()> {
        if self.lock_failures.lock().unwrap().contains(asset_id) {
            return Err(server_error());
        }
        Ok(())
    }

    async fn get_usage_paths(
        &self,
        _course_id: &str,
        asset_id: &str,
    ) -> ClientResult<UsagePathsPayload> {
        self.usage_calls.lock().unwrap().push(asset_id.to_string());
        if self.usage_failures.lock().unwrap().contains(asset_id) {
            return Err(server_error());
        }
        let locations = self
            .usage
            .lock()
            .unwrap()
            .get(asset_id)
            .cloned()
            .unwrap_or_default();
        Ok(UsagePathsPayload {
            usage_locations: HashMap::from([(asset_id.to_string(), locations)]),
        })
    }

    async fn download_rows(&self, rows: &[AssetRecord], _course_id: &str) -> Vec<String> {
        let failures = self.download_failures.lock().unwrap().clone();
        let mut errors = Vec::new();
        for row in rows {
            if failures.contains(&row.display_name) {
                errors.push(format!("Failed to download {}.", row.display_name));
            } else {
                self.downloaded
                    .lock()
                    .unwrap()
                    .push(row.display_name.clone());
            }
        }
        errors
    }
}
