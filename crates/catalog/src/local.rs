use std::borrow::Cow;
use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::delimited::{format_record, parse_records};
use crate::error::Result;
use crate::record::Catalog;

/// Headerless `name,size` file on local disk.
#[derive(Debug, Clone)]
pub struct LocalCatalogStore {
    path: PathBuf,
}

impl LocalCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Best-effort read.  A missing or unreadable file yields an empty
    /// catalog; malformed rows are skipped.
    pub fn load(&self) -> Catalog {
        match self.try_load() {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "local catalog unreadable, treating as empty"
                );
                Catalog::new()
            }
        }
    }

    pub fn try_load(&self) -> Result<Catalog> {
        if !self.path.exists() {
            return Ok(Catalog::new());
        }

        let raw = fs::read(&self.path)?;
        let (text, undecodable) = decode_lines(&raw);
        let mut catalog = Catalog::new();
        let mut skipped = undecodable;
        if undecodable > 0 {
            tracing::debug!(
                lines = undecodable,
                path = %self.path.display(),
                "skipping lines that are not valid UTF-8"
            );
        }

        for (row_idx, row) in parse_records(&text).into_iter().enumerate() {
            match parse_row(&row) {
                Some((name, size)) => {
                    catalog.insert(name, size);
                }
                None => {
                    skipped += 1;
                    tracing::debug!(
                        row = row_idx + 1,
                        fields = row.len(),
                        path = %self.path.display(),
                        "skipping malformed catalog row"
                    );
                }
            }
        }

        if skipped > 0 {
            tracing::warn!(
                skipped,
                loaded = catalog.len(),
                path = %self.path.display(),
                "local catalog loaded with skipped rows"
            );
        }

        Ok(catalog)
    }

    /// Replace the whole file with `catalog`.
    ///
    /// Content goes to a `.tmp` sibling first and is renamed over the
    /// original, so a failed write leaves the previous file intact.
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = {
            let filename = self
                .path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "connectors.csv".to_string());
            self.path.with_file_name(format!("{filename}.tmp"))
        };

        let write_result: Result<()> = (|| {
            let mut file = fs::File::create(&tmp_path)?;
            for (name, size) in catalog.iter() {
                file.write_all(render_row(name, size).as_bytes())?;
            }
            file.flush()?;
            file.sync_all()?;
            Ok(())
        })();

        if let Err(err) = write_result {
            let _ = fs::remove_file(&tmp_path);
            return Err(err);
        }

        if let Err(err) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }

        tracing::debug!(
            entries = catalog.len(),
            path = %self.path.display(),
            "local catalog rewritten"
        );
        Ok(())
    }

    /// Add one row at the end of the file without touching existing rows.
    ///
    /// A file whose last row lacks a line terminator gets one first, so the
    /// new row never fuses with it.
    pub fn append(&self, name: &str, size: f64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                file.write_all(b"\n")?;
            }
        }
        file.write_all(render_row(name, size).as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Text of `raw` with every line that is not valid UTF-8 removed, plus the
/// number of removed lines.  Names are never rewritten with replacement
/// characters.
fn decode_lines(raw: &[u8]) -> (Cow<'_, str>, usize) {
    if let Ok(text) = std::str::from_utf8(raw) {
        return (Cow::Borrowed(text), 0);
    }

    let mut text = String::with_capacity(raw.len());
    let mut dropped = 0usize;
    for line in raw.split_inclusive(|b| *b == b'\n') {
        match std::str::from_utf8(line) {
            Ok(line) => text.push_str(line),
            Err(_) => dropped += 1,
        }
    }
    (Cow::Owned(text), dropped)
}

fn parse_row(row: &[String]) -> Option<(String, f64)> {
    let [name, size] = row else {
        return None;
    };
    if name.trim().is_empty() {
        return None;
    }
    let size: f64 = size.trim().parse().ok()?;
    if !size.is_finite() || size < 0.0 {
        return None;
    }
    Some((name.clone(), size))
}

/// `{:?}` keeps the trailing `.0` on whole numbers (`3.0`, not `3`).
fn render_row(name: &str, size: f64) -> String {
    format_record(&[name.to_string(), format!("{size:?}")])
}
