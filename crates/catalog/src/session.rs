use crate::error::Result;
use crate::record::Catalog;
use crate::resolver::{CatalogOrigin, CatalogSources, ResolvedCatalog};
use crate::writer::{CatalogWriter, SyncOutcome, WriteOutcome};

/// The catalog one operator session works against.
///
/// Built from [`CatalogSources::resolve`] and reused until a write reports
/// `reload_required`; the next [`Session::refresh`] then resolves again.
#[derive(Debug, Clone)]
pub struct Session {
    resolved: ResolvedCatalog,
    reload_pending: bool,
}

impl Session {
    pub fn open(sources: &CatalogSources) -> Self {
        Self {
            resolved: sources.resolve(),
            reload_pending: false,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.resolved.catalog
    }

    pub fn origin(&self) -> CatalogOrigin {
        self.resolved.origin
    }

    pub fn reload_pending(&self) -> bool {
        self.reload_pending
    }

    /// Ask for a fresh resolve on the next [`Session::refresh`].
    pub fn invalidate(&mut self) {
        self.reload_pending = true;
    }

    /// Resolve again if a write asked for it.  Returns whether it did.
    pub fn refresh(&mut self, sources: &CatalogSources) -> bool {
        if !self.reload_pending {
            return false;
        }
        self.resolved = sources.resolve();
        self.reload_pending = false;
        true
    }

    pub fn insert(&mut self, sources: &CatalogSources, name: &str, size: f64) -> Result<WriteOutcome> {
        let outcome = CatalogWriter::new(sources).insert(&mut self.resolved.catalog, name, size)?;
        Ok(self.absorb(outcome))
    }

    pub fn rename(
        &mut self,
        sources: &CatalogSources,
        old_name: &str,
        new_name: &str,
        size: f64,
    ) -> Result<WriteOutcome> {
        let outcome =
            CatalogWriter::new(sources).rename(&mut self.resolved.catalog, old_name, new_name, size)?;
        Ok(self.absorb(outcome))
    }

    pub fn update_size(&mut self, sources: &CatalogSources, name: &str, size: f64) -> Result<WriteOutcome> {
        let outcome = CatalogWriter::new(sources).update_size(&mut self.resolved.catalog, name, size)?;
        Ok(self.absorb(outcome))
    }

    pub fn delete(&mut self, sources: &CatalogSources, name: &str) -> Result<WriteOutcome> {
        let outcome = CatalogWriter::new(sources).delete(&mut self.resolved.catalog, name)?;
        Ok(self.absorb(outcome))
    }

    pub fn sync(&mut self, sources: &CatalogSources) -> Result<SyncOutcome> {
        let outcome = CatalogWriter::new(sources).sync(&mut self.resolved.catalog)?;
        self.absorb(outcome.write.clone());
        Ok(outcome)
    }

    fn absorb(&mut self, outcome: WriteOutcome) -> WriteOutcome {
        if outcome.reload_required {
            self.reload_pending = true;
        }
        outcome
    }
}
