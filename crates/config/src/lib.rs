use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

// ── Catalog config ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Two-column delimited file used as the offline mirror of the catalog.
    pub local_path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            local_path: "connectors.csv".to_string(),
        }
    }
}

// ── Remote spreadsheet config ────────────────────────────────────────────────

/// Where the editable copy of the catalog lives.
///
/// | Field             | Effect                                                   |
/// |-------------------|----------------------------------------------------------|
/// | `enabled`         | Deployment switch.  `false` skips the remote entirely.   |
/// | `spreadsheet_id`  | Document id.  Empty disables the remote as well.         |
/// | `worksheet`       | Named tab holding the two catalog columns.               |
/// | `access_token`    | Bearer token for writes.  Empty means read-only.         |
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub enabled: bool,
    /// Overridden at runtime by `CABLECALC_SPREADSHEET_ID` when set.
    pub spreadsheet_id: String,
    pub worksheet: String,
    /// OAuth bearer token used for the clear/rewrite calls.  Overridden at
    /// runtime by `CABLECALC_SHEETS_TOKEN` when set.
    pub access_token: String,
    /// Upper bound for every remote request.  Exceeding it counts as an
    /// unreachable remote.
    pub timeout_secs: u64,
    /// Host serving the public CSV export.
    pub export_base_url: String,
    /// Host serving the authenticated values API.
    pub api_base_url: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spreadsheet_id: String::new(),
            worksheet: "Каталог".to_string(),
            access_token: String::new(),
            timeout_secs: 10,
            export_base_url: "https://docs.google.com".to_string(),
            api_base_url: "https://sheets.googleapis.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub remote: RemoteConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        if let Ok(id) = env::var("CABLECALC_SPREADSHEET_ID") {
            if !id.trim().is_empty() {
                config.remote.spreadsheet_id = id.trim().to_string();
            }
        }

        if let Ok(token) = env::var("CABLECALC_SHEETS_TOKEN") {
            if !token.trim().is_empty() {
                config.remote.access_token = token.trim().to_string();
            }
        }

        // Hosted public deployments never talk to the spreadsheet.
        if env::var_os("SPACE_ID").is_some() {
            config.remote.enabled = false;
        }

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    pub fn remote_active(&self) -> bool {
        self.remote.enabled && !self.remote.spreadsheet_id.trim().is_empty()
    }

    pub fn remote_writable(&self) -> bool {
        self.remote_active() && !self.remote.access_token.trim().is_empty()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
