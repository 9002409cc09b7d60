use crate::record::Catalog;

/// Last-resort entries so the calculator works on a cold start with neither
/// the spreadsheet nor a local file available.
pub const DEFAULT_ENTRIES: &[(&str, f64)] = &[
    ("SF9351-60004", 3.0),
    ("16_MCX-50-2-104", 5.0),
    ("16_SMA-50-2-103/111_NE", 3.0),
    ("SMA-50-2-103", 2.5),
    ("N-50-2-103", 4.0),
    ("TNC-50-2-103", 3.5),
    ("BNC-50-2-103", 2.8),
    ("MCX-50-2-103", 3.2),
    ("MMCX-50-2-103", 2.1),
    ("U.FL-50-2-103", 1.8),
];

pub fn default_catalog() -> Catalog {
    DEFAULT_ENTRIES
        .iter()
        .map(|(name, size)| (name.to_string(), *size))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_has_every_entry_once() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), DEFAULT_ENTRIES.len());
        assert_eq!(catalog.get("SMA-50-2-103"), Some(2.5));
    }
}
