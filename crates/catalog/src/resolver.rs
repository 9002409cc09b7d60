use std::fmt;

use crate::local::LocalCatalogStore;
use crate::record::Catalog;
use crate::remote::RemoteCatalogSource;
use crate::seed::default_catalog;

/// Where a resolved catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrigin {
    Remote,
    Local,
    Defaults,
}

impl CatalogOrigin {
    pub fn label(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
            Self::Defaults => "defaults",
        }
    }
}

impl fmt::Display for CatalogOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCatalog {
    pub catalog: Catalog,
    pub origin: CatalogOrigin,
}

/// The persistence targets a session reads from and writes to.
///
/// `remote` is `None` when the deployment has the spreadsheet switched off.
pub struct CatalogSources {
    remote: Option<Box<dyn RemoteCatalogSource>>,
    pub local: LocalCatalogStore,
}

impl CatalogSources {
    pub fn new(remote: Option<Box<dyn RemoteCatalogSource>>, local: LocalCatalogStore) -> Self {
        Self { remote, local }
    }

    pub fn local_only(local: LocalCatalogStore) -> Self {
        Self {
            remote: None,
            local,
        }
    }

    pub fn remote(&self) -> Option<&dyn RemoteCatalogSource> {
        self.remote.as_deref()
    }

    /// Remote, else local, else the built-in seed.  Never fails.
    pub fn resolve(&self) -> ResolvedCatalog {
        if let Some(remote) = self.remote() {
            let catalog = remote.fetch();
            if !catalog.is_empty() {
                tracing::info!(entries = catalog.len(), source = %remote.describe(), "catalog resolved from remote");
                return ResolvedCatalog {
                    catalog,
                    origin: CatalogOrigin::Remote,
                };
            }
        }

        let catalog = self.local.load();
        if !catalog.is_empty() {
            tracing::info!(
                entries = catalog.len(),
                path = %self.local.path().display(),
                "catalog resolved from local file"
            );
            return ResolvedCatalog {
                catalog,
                origin: CatalogOrigin::Local,
            };
        }

        tracing::info!("no catalog source available, using built-in defaults");
        ResolvedCatalog {
            catalog: default_catalog(),
            origin: CatalogOrigin::Defaults,
        }
    }
}
