pub mod calc;
pub mod delimited;
pub mod error;
pub mod local;
pub mod record;
pub mod remote;
pub mod resolver;
pub mod seed;
pub mod session;
pub mod writer;

pub use calc::{Calculation, CalculationInputs, Conversion, Tolerance, calculate};
pub use error::{CatalogError, Result};
pub use local::LocalCatalogStore;
pub use record::{Catalog, CatalogStats, normalize_name};
pub use remote::{RemoteCatalogSource, SheetsSource};
pub use resolver::{CatalogOrigin, CatalogSources, ResolvedCatalog};
pub use session::Session;
pub use writer::{CatalogWriter, SyncOutcome, TargetStatus, WriteOutcome};

use cablecalc_config::AppConfig;

/// Build the stores described by `config`.
///
/// The remote is left out when the deployment disables it or no document id
/// is configured.  A remote that cannot be constructed is logged and left
/// out as well, so the session still resolves from local data.
pub fn sources_from_config(config: &AppConfig) -> CatalogSources {
    let local = LocalCatalogStore::new(&config.catalog.local_path);
    if !config.remote_active() {
        tracing::debug!("remote catalog disabled for this deployment");
        return CatalogSources::local_only(local);
    }

    match SheetsSource::from_config(&config.remote) {
        Ok(remote) => CatalogSources::new(Some(Box::new(remote)), local),
        Err(err) => {
            tracing::warn!(error = %err, "remote catalog client unavailable");
            CatalogSources::local_only(local)
        }
    }
}
