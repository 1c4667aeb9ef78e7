use std::env;
use std::path::PathBuf;

/// Provider credentials and locations loaded from environment variables.
/// Discovery tunables live in the TOML file config, not here.
#[derive(Debug, Clone, Default)]
pub struct Config {
    // USGS M2M
    pub usgs_username: Option<String>,
    pub usgs_application_token: Option<String>,
    pub usgs_dataset: String,

    // NOAA NGS
    pub ngs_api_url: Option<String>,
    pub ngs_archive_path: Option<PathBuf>,
}

/// Dataset searched on USGS when `USGS_DATASET` is unset.
pub const DEFAULT_USGS_DATASET: &str = "NAIP";

impl Config {
    /// Load from the environment, reading `.env` first when present.
    /// Every value is optional: sources report missing credentials themselves.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let config = Self {
            usgs_username: optional_env("USGS_USERNAME"),
            usgs_application_token: optional_env("USGS_APPLICATION_TOKEN"),
            usgs_dataset: optional_env("USGS_DATASET")
                .unwrap_or_else(|| DEFAULT_USGS_DATASET.to_string()),
            ngs_api_url: optional_env("NGS_API_URL"),
            ngs_archive_path: optional_env("NGS_ARCHIVE_PATH").map(PathBuf::from),
        };

        config.log_redacted();
        config
    }

    /// True when both USGS credentials are present.
    pub fn has_usgs_credentials(&self) -> bool {
        self.usgs_username.is_some() && self.usgs_application_token.is_some()
    }

    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let head: String = val.chars().take(5).collect();
            format!("{}...({} chars)", head, val.chars().count())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => preview(v),
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!(
            "  USGS_USERNAME: {}",
            self.usgs_username.as_deref().unwrap_or("<not set>")
        );
        tracing::info!(
            "  USGS_APPLICATION_TOKEN: {}",
            preview_opt(&self.usgs_application_token)
        );
        tracing::info!("  USGS_DATASET: {}", self.usgs_dataset);
        tracing::info!(
            "  NGS_API_URL: {}",
            self.ngs_api_url.as_deref().unwrap_or("<default>")
        );
        tracing::info!(
            "  NGS_ARCHIVE_PATH: {}",
            self.ngs_archive_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<not set>".to_string())
        );
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
