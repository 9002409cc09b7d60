//! The spreadsheet holding the editable copy of the catalog.
//!
//! Reads go through the public CSV export of a named worksheet and locate
//! the two catalog columns by header synonyms, so renaming a header does not
//! break the reader.  Writes use the authenticated values API: the worksheet
//! is cleared, then rewritten with a fixed header row and one row per entry.

use std::time::Duration;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::json;

use cablecalc_config::RemoteConfig;

use crate::delimited::parse_records;
use crate::error::{CatalogError, Result};
use crate::record::Catalog;

/// Header substrings identifying the connector-name column.
pub const NAME_SYNONYMS: &[&str] = &["connector", "type", "коннектор", "вид"];
/// Header substrings identifying the shrink-size column.
pub const SIZE_SYNONYMS: &[&str] = &["size", "mm", "размер", "мм"];
/// Header row written on every full rewrite.
pub const HEADER: [&str; 2] = ["Вид коннектора", "Размер (мм)"];

/// A remote holder of the canonical catalog.
///
/// Implementations must not panic and must never report a write as
/// successful when it was not performed.
pub trait RemoteCatalogSource {
    /// Human-readable location, used in logs and status output.
    fn describe(&self) -> String;

    /// Fetch the catalog, reporting why it could not be read.
    fn probe(&self) -> Result<Catalog>;

    /// Clear the remote and write `catalog` in iteration order.
    fn replace_all(&self, catalog: &Catalog) -> Result<()>;

    /// Fetch with every failure folded into an empty catalog.  Callers must
    /// read empty as "no usable data", not as "no connectors exist".
    fn fetch(&self) -> Catalog {
        match self.probe() {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::warn!(
                    source = %self.describe(),
                    error = %err,
                    "remote catalog unavailable"
                );
                Catalog::new()
            }
        }
    }
}

/// Google Sheets worksheet addressed by document id and tab name.
pub struct SheetsSource {
    client: Client,
    spreadsheet_id: String,
    worksheet: String,
    access_token: Option<String>,
    export_base_url: String,
    api_base_url: String,
}

impl SheetsSource {
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(concat!("cablecalc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| CatalogError::unreachable(format!("http client: {err}")))?;

        let token = config.access_token.trim();
        Ok(Self {
            client,
            spreadsheet_id: config.spreadsheet_id.trim().to_string(),
            worksheet: config.worksheet.clone(),
            access_token: (!token.is_empty()).then(|| token.to_string()),
            export_base_url: config.export_base_url.trim_end_matches('/').to_string(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn can_write(&self) -> bool {
        self.access_token.is_some()
    }

    fn export_url(&self) -> String {
        format!(
            "{}/spreadsheets/d/{}/gviz/tq",
            self.export_base_url,
            encode_segment(&self.spreadsheet_id)
        )
    }

    fn values_url(&self, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}{}",
            self.api_base_url,
            encode_segment(&self.spreadsheet_id),
            encode_segment(&self.worksheet),
            suffix
        )
    }

    fn check_write_status(&self, status: StatusCode, step: &str) -> Result<()> {
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CatalogError::denied(format!("{step} returned {status}")));
        }
        Err(CatalogError::unreachable(format!("{step} returned {status}")))
    }
}

impl RemoteCatalogSource for SheetsSource {
    fn describe(&self) -> String {
        format!("sheets:{}/{}", self.spreadsheet_id, self.worksheet)
    }

    fn probe(&self) -> Result<Catalog> {
        let response = self
            .client
            .get(self.export_url())
            .query(&[("tqx", "out:csv"), ("sheet", self.worksheet.as_str())])
            .send()
            .map_err(|err| CatalogError::unreachable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::unreachable(format!("export returned {status}")));
        }

        let body = response
            .text()
            .map_err(|err| CatalogError::unreachable(err.to_string()))?;
        Ok(parse_export(&body))
    }

    fn replace_all(&self, catalog: &Catalog) -> Result<()> {
        let Some(token) = self.access_token.as_deref() else {
            return Err(CatalogError::denied("no access token configured"));
        };

        let response = self
            .client
            .post(self.values_url(":clear"))
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .map_err(|err| CatalogError::unreachable(err.to_string()))?;
        self.check_write_status(response.status(), "clear")?;

        let mut values = vec![json!(HEADER)];
        values.extend(catalog.iter().map(|(name, size)| json!([name, size])));

        let response = self
            .client
            .put(self.values_url(""))
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(token)
            .json(&json!({
                "range": self.worksheet,
                "majorDimension": "ROWS",
                "values": values,
            }))
            .send()
            .map_err(|err| CatalogError::unreachable(err.to_string()))?;
        self.check_write_status(response.status(), "update")?;

        tracing::info!(
            source = %self.describe(),
            entries = catalog.len(),
            "remote catalog rewritten"
        );
        Ok(())
    }
}

fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// Index of the first header containing any of `synonyms`, skipping `exclude`.
fn match_column(headers: &[String], synonyms: &[&str], exclude: Option<usize>) -> Option<usize> {
    headers.iter().enumerate().position(|(idx, header)| {
        if Some(idx) == exclude {
            return false;
        }
        let header = header.to_lowercase();
        synonyms.iter().any(|s| header.contains(s))
    })
}

/// Spreadsheets in comma-decimal locales export `3,5` for 3.5.
fn parse_remote_size(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    let size: f64 = cell
        .parse()
        .ok()
        .or_else(|| cell.replace(',', ".").parse().ok())?;
    (size.is_finite() && size >= 0.0).then_some(size)
}

/// Extract the catalog from a delimited export with a header row.
///
/// Missing columns yield an empty catalog; rows with a blank name or an
/// unusable size are skipped.
pub fn parse_export(text: &str) -> Catalog {
    let mut records = parse_records(text).into_iter();
    let Some(headers) = records.next() else {
        return Catalog::new();
    };

    let Some(name_col) = match_column(&headers, NAME_SYNONYMS, None) else {
        tracing::debug!(?headers, "export has no connector-name column");
        return Catalog::new();
    };
    let Some(size_col) = match_column(&headers, SIZE_SYNONYMS, Some(name_col)) else {
        tracing::debug!(?headers, "export has no size column");
        return Catalog::new();
    };

    let mut catalog = Catalog::new();
    for (row_idx, row) in records.enumerate() {
        let name = row.get(name_col).map(|s| s.trim()).unwrap_or_default();
        let size = row.get(size_col).and_then(|cell| parse_remote_size(cell));
        match (name.is_empty(), size) {
            (false, Some(size)) => {
                catalog.insert(name, size);
            }
            _ => tracing::debug!(row = row_idx + 2, "skipping unusable export row"),
        }
    }
    catalog
}
