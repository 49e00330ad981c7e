use std::time::Duration;

use floodwatch_shared::{HEADER_ACCEPT, HEADER_APP_PLATFORM, HEADER_APP_VERSION, HEADER_CONTENT_TYPE};

// =========================================================
// Defaults
// =========================================================

/// Empty base URL means same-origin requests through the dev-server proxy.
const DEFAULT_BASE_URL: &str = "";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_APP_VERSION: &str = "1.0.0";
const DEFAULT_PLATFORM: &str = "web";
const DEFAULT_UPLOAD_PUBLIC_BASE: &str = "https://storage.googleapis.com/ens_images";

const JSON_MIME: &str = "application/json";

/// Build-time overrides, read with `option_env!`.
const ENV_BASE_URL: Option<&str> = option_env!("FLOODWATCH_API_BASE_URL");
const ENV_BUILD_MODE: Option<&str> = option_env!("FLOODWATCH_BUILD_MODE");

// =========================================================
// Build mode
// =========================================================

/// Selects development conveniences (diagnostic dumps, placeholder sessions)
/// once, at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// `FLOODWATCH_BUILD_MODE` if set, else debug builds are development.
    pub fn from_build_env() -> Self {
        ENV_BUILD_MODE
            .and_then(Self::parse)
            .unwrap_or(if cfg!(debug_assertions) {
                Self::Development
            } else {
                Self::Production
            })
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

// =========================================================
// Client configuration
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub app_version: String,
    pub platform: String,
    pub mode: BuildMode,
    /// Prefix of the public URL returned for uploaded objects.
    pub upload_public_base: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            app_version: DEFAULT_APP_VERSION.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            mode: BuildMode::Production,
            upload_public_base: DEFAULT_UPLOAD_PUBLIC_BASE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Configuration baked in at compile time.
    pub fn from_build_env() -> Self {
        Self::default()
            .with_base_url(ENV_BASE_URL.unwrap_or(DEFAULT_BASE_URL))
            .with_mode(BuildMode::from_build_env())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    pub fn with_upload_public_base(mut self, base: impl Into<String>) -> Self {
        self.upload_public_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Joins the base URL and an endpoint path.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Headers stamped on every request. Content-Type is skipped for
    /// multipart bodies, where the transport supplies the boundary.
    pub fn default_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            (HEADER_CONTENT_TYPE, JSON_MIME.to_string()),
            (HEADER_ACCEPT, JSON_MIME.to_string()),
            (HEADER_APP_VERSION, self.app_version.clone()),
            (HEADER_APP_PLATFORM, self.platform.clone()),
        ]
    }
}
