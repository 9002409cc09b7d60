//! Mutations of the session catalog and their propagation to both stores.
//!
//! Every operation validates first and only then touches the session
//! catalog and the stores.  The two stores are written independently: a
//! failure on one side is reported in [`WriteOutcome`] and does not undo the
//! other side.

use crate::error::{CatalogError, Result};
use crate::record::{Catalog, validate_name, validate_size};
use crate::resolver::CatalogSources;

/// Result of writing to one persistence target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    Written,
    /// Target is switched off for this deployment.
    Disabled,
    /// Target refused the write (no credentials, or permission denied).
    Denied(String),
    Failed(String),
}

impl TargetStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written)
    }

    fn from_result(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::Written,
            Err(CatalogError::WriteDenied { message }) => Self::Denied(message),
            Err(err) => Self::Failed(err.to_string()),
        }
    }
}

/// Per-target outcome of a mutation.
///
/// `reload_required` is set when at least one store now holds the change,
/// telling the session to resolve again instead of reusing its copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub remote: TargetStatus,
    pub local: TargetStatus,
    pub reload_required: bool,
}

impl WriteOutcome {
    fn new(remote: TargetStatus, local: TargetStatus) -> Self {
        let reload_required = remote.is_written() || local.is_written();
        Self {
            remote,
            local,
            reload_required,
        }
    }

    pub fn remote_ok(&self) -> bool {
        self.remote.is_written()
    }

    pub fn local_ok(&self) -> bool {
        self.local.is_written()
    }

    pub fn persisted_anywhere(&self) -> bool {
        self.remote_ok() || self.local_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub write: WriteOutcome,
    /// Entries in the merged catalog.
    pub merged: usize,
    /// Local-only entries carried into the remote.
    pub added_from_local: usize,
    /// Local entries dropped because the remote holds the same name.
    pub overridden_local: usize,
}

pub struct CatalogWriter<'a> {
    sources: &'a CatalogSources,
}

impl<'a> CatalogWriter<'a> {
    pub fn new(sources: &'a CatalogSources) -> Self {
        Self { sources }
    }

    /// Add a connector under its normalized name.
    ///
    /// The name must be new to the session catalog and to both live stores,
    /// since either store may have been edited elsewhere.  The remote gets
    /// its current contents plus the new row; the local file gets a single
    /// appended row, or a full write when it is still empty.
    pub fn insert(&self, catalog: &mut Catalog, name: &str, size: f64) -> Result<WriteOutcome> {
        let name = validate_name(name)?;
        let size = validate_size(size)?;

        if catalog.contains_normalized(&name) {
            return Err(duplicate(name, "the current catalog"));
        }
        let remote_snapshot = self.sources.remote().map(|remote| remote.fetch());
        if remote_snapshot
            .as_ref()
            .is_some_and(|remote| remote.contains_normalized(&name))
        {
            return Err(duplicate(name, "the remote catalog"));
        }
        let local_snapshot = self.sources.local.load();
        if local_snapshot.contains_normalized(&name) {
            return Err(duplicate(name, "the local file"));
        }

        catalog.insert(name.clone(), size);

        let remote = match (self.sources.remote(), remote_snapshot) {
            (None, _) => TargetStatus::Disabled,
            (Some(remote), Some(mut current)) if !current.is_empty() => {
                current.insert(name.clone(), size);
                TargetStatus::from_result(remote.replace_all(&current))
            }
            (Some(remote), _) => TargetStatus::from_result(remote.replace_all(catalog)),
        };

        let local = if local_snapshot.is_empty() {
            TargetStatus::from_result(self.sources.local.save(catalog))
        } else {
            TargetStatus::from_result(self.sources.local.append(&name, size))
        };

        let outcome = WriteOutcome::new(remote, local);
        log_outcome("insert", &name, &outcome);
        Ok(outcome)
    }

    /// Replace `old_name` with `new_name` carrying `size`.
    pub fn rename(
        &self,
        catalog: &mut Catalog,
        old_name: &str,
        new_name: &str,
        size: f64,
    ) -> Result<WriteOutcome> {
        let old_key = existing_key(catalog, old_name)?;
        let new_name = validate_name(new_name)?;
        let size = validate_size(size)?;

        if let Some(existing) = catalog.find(&new_name) {
            if existing != old_key {
                return Err(duplicate(new_name, "the current catalog"));
            }
        }

        catalog.remove(&old_key);
        catalog.insert(new_name.clone(), size);

        let outcome = self.rewrite_all(catalog);
        log_outcome("rename", &new_name, &outcome);
        Ok(outcome)
    }

    pub fn update_size(&self, catalog: &mut Catalog, name: &str, size: f64) -> Result<WriteOutcome> {
        let key = existing_key(catalog, name)?;
        let size = validate_size(size)?;

        catalog.insert(key.clone(), size);

        let outcome = self.rewrite_all(catalog);
        log_outcome("update_size", &key, &outcome);
        Ok(outcome)
    }

    pub fn delete(&self, catalog: &mut Catalog, name: &str) -> Result<WriteOutcome> {
        let key = existing_key(catalog, name)?;

        catalog.remove(&key);

        let outcome = self.rewrite_all(catalog);
        log_outcome("delete", &key, &outcome);
        Ok(outcome)
    }

    /// Merge remote and local (remote wins on equal names, disjoint names
    /// are united) and write the result to both stores.
    ///
    /// Fails without writing anything when the remote is disabled,
    /// unreachable or empty.
    pub fn sync(&self, catalog: &mut Catalog) -> Result<SyncOutcome> {
        let Some(remote) = self.sources.remote() else {
            return Err(CatalogError::RemoteDisabled);
        };

        let remote_catalog = remote.probe()?;
        if remote_catalog.is_empty() {
            return Err(CatalogError::unreachable("remote catalog has no entries"));
        }
        let local_catalog = self.sources.local.load();

        let merged = remote_catalog.merged_with(&local_catalog);
        let added_from_local = merged.len() - remote_catalog.len();
        let overridden_local = local_catalog.len() - added_from_local;

        let remote_status = TargetStatus::from_result(remote.replace_all(&merged));
        let local_status = TargetStatus::from_result(self.sources.local.save(&merged));
        *catalog = merged;

        let write = WriteOutcome::new(remote_status, local_status);
        tracing::info!(
            merged = catalog.len(),
            added_from_local,
            overridden_local,
            remote = ?write.remote,
            local = ?write.local,
            "catalog sync finished"
        );
        Ok(SyncOutcome {
            write,
            merged: catalog.len(),
            added_from_local,
            overridden_local,
        })
    }

    fn rewrite_all(&self, catalog: &Catalog) -> WriteOutcome {
        let remote = match self.sources.remote() {
            Some(remote) => TargetStatus::from_result(remote.replace_all(catalog)),
            None => TargetStatus::Disabled,
        };
        let local = TargetStatus::from_result(self.sources.local.save(catalog));
        WriteOutcome::new(remote, local)
    }
}

fn existing_key(catalog: &Catalog, name: &str) -> Result<String> {
    catalog
        .find(name)
        .map(str::to_string)
        .ok_or_else(|| CatalogError::NotFound {
            name: name.trim().to_string(),
        })
}

fn duplicate(name: String, location: &'static str) -> CatalogError {
    CatalogError::DuplicateKey { name, location }
}

fn log_outcome(op: &str, name: &str, outcome: &WriteOutcome) {
    if outcome.persisted_anywhere() {
        tracing::info!(op, name, remote = ?outcome.remote, local = ?outcome.local, "catalog updated");
    } else {
        tracing::warn!(op, name, remote = ?outcome.remote, local = ?outcome.local, "catalog change was not persisted");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::local::LocalCatalogStore;
    use crate::resolver::testing::FakeRemote;

    fn local_in(dir: &TempDir) -> LocalCatalogStore {
        LocalCatalogStore::new(dir.path().join("connectors.csv"))
    }

    // ── insert ─────────────────────────────────────────────────────────────

    #[test]
    fn insert_normalizes_and_writes_both_targets() {
        let dir = TempDir::new().unwrap();
        let local = local_in(&dir);
        local.save(&Catalog::from([("BNC", 2.8)])).unwrap();
        let remote = FakeRemote::with(Catalog::from([("BNC", 2.8), ("N", 4.0)]));
        let sources = CatalogSources::new(remote.boxed(), local.clone());
        let mut catalog = Catalog::from([("BNC", 2.8), ("N", 4.0)]);

        let outcome = CatalogWriter::new(&sources)
            .insert(&mut catalog, "  sma-50 ", 2.5)
            .unwrap();

        assert!(outcome.remote_ok());
        assert!(outcome.local_ok());
        assert!(outcome.reload_required);
        assert_eq!(catalog.get("SMA-50"), Some(2.5));
        assert_eq!(
            remote.snapshot(),
            Catalog::from([("BNC", 2.8), ("N", 4.0), ("SMA-50", 2.5)])
        );
        assert_eq!(fs::read_to_string(local.path()).unwrap(), "BNC,2.8\nSMA-50,2.5\n");
    }

    #[test]
    fn insert_rejects_case_folded_duplicate() {
        let dir = TempDir::new().unwrap();
        let sources = CatalogSources::local_only(local_in(&dir));
        let mut catalog = Catalog::from([("SMA-50", 2.5)]);

        let err = CatalogWriter::new(&sources)
            .insert(&mut catalog, "sma-50", 1.0)
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey { ref name, .. } if name == "SMA-50"));
        assert_eq!(catalog.get("SMA-50"), Some(2.5));
        assert!(!sources.local.exists());
    }

    #[test]
    fn insert_rejects_name_known_only_to_remote() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::with(Catalog::from([("TNC", 3.5)]));
        let sources = CatalogSources::new(remote.boxed(), local_in(&dir));
        let mut catalog = Catalog::new();

        let err = CatalogWriter::new(&sources)
            .insert(&mut catalog, "tnc", 3.0)
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DuplicateKey { location: "the remote catalog", .. }
        ));
        assert!(catalog.is_empty());
        assert_eq!(remote.inner.writes.get(), 0);
    }

    #[test]
    fn insert_rejects_name_known_only_to_local_file() {
        let dir = TempDir::new().unwrap();
        let local = local_in(&dir);
        local.save(&Catalog::from([("MCX", 3.2)])).unwrap();
        let sources = CatalogSources::local_only(local);
        let mut catalog = Catalog::new();

        let err = CatalogWriter::new(&sources)
            .insert(&mut catalog, "Mcx", 3.0)
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DuplicateKey { location: "the local file", .. }
        ));
    }

    #[test]
    fn insert_validates_input() {
        let dir = TempDir::new().unwrap();
        let sources = CatalogSources::local_only(local_in(&dir));
        let writer = CatalogWriter::new(&sources);
        let mut catalog = Catalog::new();

        assert!(matches!(
            writer.insert(&mut catalog, "  ", 1.0),
            Err(CatalogError::InvalidName)
        ));
        assert!(matches!(
            writer.insert(&mut catalog, "X", -1.0),
            Err(CatalogError::InvalidSize { .. })
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn insert_reports_divergent_targets() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::with(Catalog::from([("BNC", 2.8)])).read_only();
        let local = local_in(&dir);
        let sources = CatalogSources::new(remote.boxed(), local.clone());
        let mut catalog = Catalog::from([("BNC", 2.8)]);

        let outcome = CatalogWriter::new(&sources)
            .insert(&mut catalog, "n-50", 4.0)
            .unwrap();

        assert!(matches!(outcome.remote, TargetStatus::Denied(_)));
        assert!(outcome.local_ok());
        assert!(outcome.reload_required);
        assert_eq!(remote.snapshot(), Catalog::from([("BNC", 2.8)]));
        // Empty local file gets the full session catalog, not a lone row.
        assert_eq!(local.load(), Catalog::from([("BNC", 2.8), ("N-50", 4.0)]));
    }

    #[test]
    fn insert_with_nothing_persisted_needs_no_reload() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes every local write fail.
        let blocked = dir.path().join("connectors.csv");
        fs::create_dir(&blocked).unwrap();
        let remote = FakeRemote::unreachable();
        let sources = CatalogSources::new(remote.boxed(), LocalCatalogStore::new(&blocked));
        let mut catalog = Catalog::new();

        let outcome = CatalogWriter::new(&sources)
            .insert(&mut catalog, "x", 1.0)
            .unwrap();
        assert!(matches!(outcome.remote, TargetStatus::Failed(_)));
        assert!(matches!(outcome.local, TargetStatus::Failed(_)));
        assert!(!outcome.reload_required);
        assert_eq!(catalog.get("X"), Some(1.0));
    }

    #[test]
    fn insert_with_remote_disabled_reports_disabled() {
        let dir = TempDir::new().unwrap();
        let sources = CatalogSources::local_only(local_in(&dir));
        let mut catalog = Catalog::new();

        let outcome = CatalogWriter::new(&sources)
            .insert(&mut catalog, "bnc", 2.8)
            .unwrap();
        assert_eq!(outcome.remote, TargetStatus::Disabled);
        assert!(outcome.local_ok());
    }

    // ── rename / update / delete ───────────────────────────────────────────

    #[test]
    fn rename_replaces_entry_and_rewrites_both() {
        let dir = TempDir::new().unwrap();
        let local = local_in(&dir);
        let remote = FakeRemote::with(Catalog::from([("OLD", 1.0), ("KEEP", 2.0)]));
        let sources = CatalogSources::new(remote.boxed(), local.clone());
        let mut catalog = Catalog::from([("OLD", 1.0), ("KEEP", 2.0)]);

        let outcome = CatalogWriter::new(&sources)
            .rename(&mut catalog, "old", "new-name", 1.5)
            .unwrap();

        let expected = Catalog::from([("NEW-NAME", 1.5), ("KEEP", 2.0)]);
        assert!(outcome.remote_ok() && outcome.local_ok());
        assert_eq!(catalog, expected);
        assert_eq!(remote.snapshot(), expected);
        assert_eq!(local.load(), expected);
    }

    #[test]
    fn rename_to_same_name_with_new_case_is_allowed() {
        let dir = TempDir::new().unwrap();
        let sources = CatalogSources::local_only(local_in(&dir));
        let mut catalog = Catalog::from([("sma", 2.5)]);

        CatalogWriter::new(&sources)
            .rename(&mut catalog, "sma", "SMA", 2.6)
            .unwrap();
        assert_eq!(catalog, Catalog::from([("SMA", 2.6)]));
    }

    #[test]
    fn rename_onto_other_entry_is_duplicate() {
        let dir = TempDir::new().unwrap();
        let sources = CatalogSources::local_only(local_in(&dir));
        let mut catalog = Catalog::from([("A", 1.0), ("B", 2.0)]);

        let err = CatalogWriter::new(&sources)
            .rename(&mut catalog, "A", "b", 1.0)
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey { .. }));
        assert_eq!(catalog, Catalog::from([("A", 1.0), ("B", 2.0)]));
    }

    #[test]
    fn rename_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let sources = CatalogSources::local_only(local_in(&dir));
        let mut catalog = Catalog::from([("A", 1.0)]);

        assert!(matches!(
            CatalogWriter::new(&sources).rename(&mut catalog, "Z", "Y", 1.0),
            Err(CatalogError::NotFound { .. })
        ));
    }

    #[test]
    fn update_size_rewrites_both() {
        let dir = TempDir::new().unwrap();
        let local = local_in(&dir);
        let remote = FakeRemote::with(Catalog::from([("A", 1.0)]));
        let sources = CatalogSources::new(remote.boxed(), local.clone());
        let mut catalog = Catalog::from([("A", 1.0), ("B", 2.0)]);

        let outcome = CatalogWriter::new(&sources)
            .update_size(&mut catalog, "b", 2.25)
            .unwrap();

        let expected = Catalog::from([("A", 1.0), ("B", 2.25)]);
        assert!(outcome.reload_required);
        assert_eq!(catalog, expected);
        assert_eq!(remote.snapshot(), expected);
        assert_eq!(local.load(), expected);
    }

    #[test]
    fn update_size_rejects_bad_size_before_touching_anything() {
        let dir = TempDir::new().unwrap();
        let sources = CatalogSources::local_only(local_in(&dir));
        let mut catalog = Catalog::from([("A", 1.0)]);

        assert!(CatalogWriter::new(&sources)
            .update_size(&mut catalog, "A", f64::NAN)
            .is_err());
        assert_eq!(catalog.get("A"), Some(1.0));
        assert!(!sources.local.exists());
    }

    #[test]
    fn delete_removes_and_rewrites() {
        let dir = TempDir::new().unwrap();
        let local = local_in(&dir);
        let remote = FakeRemote::with(Catalog::from([("A", 1.0), ("B", 2.0)]));
        let sources = CatalogSources::new(remote.boxed(), local.clone());
        let mut catalog = Catalog::from([("A", 1.0), ("B", 2.0)]);

        CatalogWriter::new(&sources).delete(&mut catalog, "a").unwrap();

        assert_eq!(catalog, Catalog::from([("B", 2.0)]));
        assert_eq!(remote.snapshot(), Catalog::from([("B", 2.0)]));
        assert_eq!(local.load(), Catalog::from([("B", 2.0)]));
    }

    #[test]
    fn delete_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let sources = CatalogSources::local_only(local_in(&dir));
        let mut catalog = Catalog::new();
        assert!(matches!(
            CatalogWriter::new(&sources).delete(&mut catalog, "ghost"),
            Err(CatalogError::NotFound { ref name }) if name == "ghost"
        ));
    }

    // ── sync ───────────────────────────────────────────────────────────────

    #[test]
    fn sync_remote_wins_and_unions_disjoint() {
        let dir = TempDir::new().unwrap();
        let local = local_in(&dir);
        local.save(&Catalog::from([("A", 2.0), ("B", 3.0)])).unwrap();
        let remote = FakeRemote::with(Catalog::from([("A", 1.0)]));
        let sources = CatalogSources::new(remote.boxed(), local.clone());
        let mut catalog = Catalog::new();

        let outcome = CatalogWriter::new(&sources).sync(&mut catalog).unwrap();

        let expected = Catalog::from([("A", 1.0), ("B", 3.0)]);
        assert_eq!(catalog, expected);
        assert_eq!(remote.snapshot(), expected);
        assert_eq!(local.load(), expected);
        assert_eq!(outcome.merged, 2);
        assert_eq!(outcome.added_from_local, 1);
        assert_eq!(outcome.overridden_local, 1);
        assert!(outcome.write.reload_required);
    }

    #[test]
    fn sync_treats_case_variants_as_one_connector() {
        let dir = TempDir::new().unwrap();
        let local = local_in(&dir);
        local.save(&Catalog::from([("sma-50", 2.0)])).unwrap();
        let remote = FakeRemote::with(Catalog::from([("SMA-50", 1.0)]));
        let sources = CatalogSources::new(remote.boxed(), local.clone());
        let mut catalog = Catalog::new();

        let outcome = CatalogWriter::new(&sources).sync(&mut catalog).unwrap();

        let expected = Catalog::from([("SMA-50", 1.0)]);
        assert_eq!(catalog, expected);
        assert_eq!(remote.snapshot(), expected);
        assert_eq!(local.load(), expected);
        assert_eq!(outcome.merged, 1);
        assert_eq!(outcome.added_from_local, 0);
        assert_eq!(outcome.overridden_local, 1);
    }

    #[test]
    fn sync_fails_when_remote_empty_or_unreachable() {
        let dir = TempDir::new().unwrap();
        let local = local_in(&dir);
        local.save(&Catalog::from([("A", 2.0)])).unwrap();
        let mut catalog = Catalog::from([("A", 2.0)]);

        let empty = CatalogSources::new(FakeRemote::default().boxed(), local.clone());
        assert!(matches!(
            CatalogWriter::new(&empty).sync(&mut catalog),
            Err(CatalogError::SourceUnreachable { .. })
        ));

        let offline = CatalogSources::new(FakeRemote::unreachable().boxed(), local.clone());
        assert!(matches!(
            CatalogWriter::new(&offline).sync(&mut catalog),
            Err(CatalogError::SourceUnreachable { .. })
        ));

        let disabled = CatalogSources::local_only(local.clone());
        assert!(matches!(
            CatalogWriter::new(&disabled).sync(&mut catalog),
            Err(CatalogError::RemoteDisabled)
        ));

        assert_eq!(local.load(), Catalog::from([("A", 2.0)]));
        assert_eq!(catalog, Catalog::from([("A", 2.0)]));
    }

    #[test]
    fn sync_with_read_only_remote_still_refreshes_local() {
        let dir = TempDir::new().unwrap();
        let local = local_in(&dir);
        local.save(&Catalog::from([("L", 5.0)])).unwrap();
        let remote = FakeRemote::with(Catalog::from([("R", 1.0)])).read_only();
        let sources = CatalogSources::new(remote.boxed(), local.clone());
        let mut catalog = Catalog::new();

        let outcome = CatalogWriter::new(&sources).sync(&mut catalog).unwrap();

        assert!(matches!(outcome.write.remote, TargetStatus::Denied(_)));
        assert!(outcome.write.local_ok());
        assert_eq!(local.load(), Catalog::from([("L", 5.0), ("R", 1.0)]));
        assert_eq!(remote.snapshot(), Catalog::from([("R", 1.0)]));
    }
}
