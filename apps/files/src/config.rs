use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_API_BASE_URL: &str = "http://localhost:18010/api/contentstore/v1";
const DEFAULT_STUDIO_BASE_URL: &str = "http://localhost:18010";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppProfile {
    Dev,
    Prod,
}

impl AppProfile {
    pub fn from_env(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("prod") | Some("production") => Self::Prod,
            _ => Self::Dev,
        }
    }
}

/// Which collection the table is bound to. Files are paginated server-side,
/// videos are loaded in full and sorted locally.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    #[default]
    Files,
    Videos,
}

impl CollectionKind {
    pub fn from_env(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            Some("videos") | Some("video") => Self::Videos,
            _ => Self::Files,
        }
    }

    pub fn loads_pages_remotely(self) -> bool {
        matches!(self, Self::Files)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub studio_base_url: String,
    pub auth_token: Option<String>,
    pub default_course_id: Option<String>,
    pub profile: AppProfile,
    pub collection: CollectionKind,
    pub request_timeout: Duration,
    pub page_size: usize,
    pub download_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            studio_base_url: DEFAULT_STUDIO_BASE_URL.to_string(),
            auth_token: None,
            default_course_id: None,
            profile: AppProfile::Dev,
            collection: CollectionKind::Files,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        load_dotenv();

        let mut config = Self::default();

        if let Some(url) = read_env("STUDIO_API_BASE_URL") {
            config.api_base_url = url;
        }

        if let Some(url) = read_env("STUDIO_BASE_URL") {
            config.studio_base_url = url;
        }

        if let Some(token) = read_env("STUDIO_AUTH_TOKEN") {
            config.auth_token = Some(token);
        }

        if let Some(course) = read_env("STUDIO_DEFAULT_COURSE") {
            config.default_course_id = Some(course);
        }

        config.profile = AppProfile::from_env(read_env("STUDIO_PROFILE"));
        config.collection = CollectionKind::from_env(read_env("STUDIO_COLLECTION"));

        if let Some(secs) =
            read_env("STUDIO_REQUEST_TIMEOUT_SECS").and_then(|value| value.parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_secs(secs.max(1));
        }

        if let Some(size) =
            read_env("STUDIO_PAGE_SIZE").and_then(|value| value.parse::<usize>().ok())
        {
            config.page_size = size.max(1);
        }

        if let Some(dir) = read_env("STUDIO_DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(dir);
        }

        config
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.auth_token
            .as_ref()
            .map(|token| format!("Bearer {}", token.trim()))
    }

    pub fn course_or_default<'a>(&'a self, override_course: Option<&'a str>) -> Option<String> {
        override_course
            .or(self.default_course_id.as_deref())
            .map(|value| value.to_string())
    }
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .or_else(|| option_env_from_build(key).map(|s| s.to_string()))
        .filter(|value| !value.trim().is_empty())
}

fn option_env_from_build(key: &str) -> Option<&'static str> {
    match key {
        "STUDIO_API_BASE_URL" => option_env!("STUDIO_API_BASE_URL"),
        "STUDIO_BASE_URL" => option_env!("STUDIO_BASE_URL"),
        "STUDIO_AUTH_TOKEN" => option_env!("STUDIO_AUTH_TOKEN"),
        "STUDIO_DEFAULT_COURSE" => option_env!("STUDIO_DEFAULT_COURSE"),
        "STUDIO_PROFILE" => option_env!("STUDIO_PROFILE"),
        "STUDIO_COLLECTION" => option_env!("STUDIO_COLLECTION"),
        "STUDIO_REQUEST_TIMEOUT_SECS" => option_env!("STUDIO_REQUEST_TIMEOUT_SECS"),
        "STUDIO_PAGE_SIZE" => option_env!("STUDIO_PAGE_SIZE"),
        "STUDIO_DOWNLOAD_DIR" => option_env!("STUDIO_DOWNLOAD_DIR"),
        _ => None,
    }
}

pub fn load_dotenv() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!("failed to load .env: {err}");
        }
    }
}
