use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "Shopfloor";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum size of one uploaded PDF (50 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Maximum number of files accepted by one upload request.
pub const DEFAULT_MAX_FILES: usize = 20;

/// Slack for multipart boundaries and text fields.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:8787/files";

/// Open batches older than this are dropped from memory (24 h).
pub const DEFAULT_BATCH_TTL_SECS: u32 = 24 * 60 * 60;

/// Route that serves stored segments when the public base URL has no path.
pub const FILES_ROUTE: &str = "/files";

/// Default `tracing` filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "shopfloor_lib=debug,shopfloor=debug,tower_http=info"
    } else {
        "shopfloor_lib=info,shopfloor=info"
    }
}

/// Get the application data directory
/// ~/Shopfloor/ on all platforms, overridable with `SHOPFLOOR_DATA_DIR`.
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SHOPFLOOR_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// SQLite database holding the directory tables and repair orders.
pub fn database_path() -> PathBuf {
    app_data_dir().join("shopfloor.db")
}

/// Root directory of the filesystem object store (one folder per shop).
pub fn storage_dir() -> PathBuf {
    app_data_dir().join("storage")
}

/// Runtime settings for the intake server.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub storage_dir: PathBuf,
    /// Prefix of the public URLs handed out for stored segments.
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub max_files: usize,
    /// Split uploads into per-order segments when the caller doesn't say.
    pub auto_segmentation: bool,
    /// Lifetime of an in-memory operator batch, counted from creation.
    pub batch_ttl_secs: u32,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8787))),
            database_path: database_path(),
            storage_dir: storage_dir(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_files: DEFAULT_MAX_FILES,
            auto_segmentation: true,
            batch_ttl_secs: DEFAULT_BATCH_TTL_SECS,
        }
    }
}

impl IntakeConfig {
    /// Defaults overridden by `SHOPFLOOR_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(addr) = env_parsed::<SocketAddr>("SHOPFLOOR_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(path) = std::env::var("SHOPFLOOR_DATABASE") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("SHOPFLOOR_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("SHOPFLOOR_PUBLIC_BASE_URL") {
            config.public_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(bytes) = env_parsed::<usize>("SHOPFLOOR_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = bytes;
        }
        if let Some(files) = env_parsed::<usize>("SHOPFLOOR_MAX_FILES") {
            config.max_files = files;
        }
        if let Some(auto) = env_parsed::<bool>("SHOPFLOOR_AUTO_SEGMENTATION") {
            config.auto_segmentation = auto;
        }
        if let Some(ttl) = env_parsed::<u32>("SHOPFLOOR_BATCH_TTL_SECS") {
            config.batch_ttl_secs = ttl;
        }

        config
    }

    /// Request body limit: every file at its maximum plus form overhead.
    pub fn max_request_bytes(&self) -> usize {
        self.max_upload_bytes
            .saturating_mul(self.max_files)
            .saturating_add(MULTIPART_OVERHEAD_BYTES)
    }

    /// Batches created before this instant have expired.
    pub fn batch_cutoff(&self) -> chrono::NaiveDateTime {
        chrono::Local::now().naive_local() - chrono::Duration::seconds(self.batch_ttl_secs as i64)
    }

    /// Route the object store is served under: the path of
    /// `public_base_url`, or [`FILES_ROUTE`] when it has none.
    pub fn files_route(&self) -> String {
        let url = self.public_base_url.as_str();
        let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
        match rest.find('/').map(|i| rest[i..].trim_end_matches('/')) {
            Some(path) if !path.is_empty() => path.to_string(),
            _ => FILES_ROUTE.to_string(),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable configuration value");
            None
        }
    }
}
