use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Canonical form used for identity comparisons: trimmed and upper-cased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Reject names that are blank after trimming; returns the normalized form.
pub fn validate_name(name: &str) -> Result<String> {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        return Err(CatalogError::InvalidName);
    }
    Ok(normalized)
}

pub fn validate_size(size: f64) -> Result<f64> {
    if !size.is_finite() || size < 0.0 {
        return Err(CatalogError::InvalidSize { value: size });
    }
    Ok(size)
}

/// Connector name → shrink size in millimetres.
///
/// Keys are stored as they arrived from their source; identity checks go
/// through [`normalize_name`].  Iteration is by name, which is also the
/// presentation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, f64>,
}

/// Aggregate figures shown next to the connector list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogStats {
    pub count: usize,
    pub mean_size: f64,
    pub max_size: f64,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact-key lookup.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.get(name).copied()
    }

    /// Key of the entry whose normalized name equals `name`'s, if any.
    pub fn find(&self, name: &str) -> Option<&str> {
        let wanted = normalize_name(name);
        if self.entries.contains_key(&wanted) {
            return self.entries.get_key_value(&wanted).map(|(k, _)| k.as_str());
        }
        self.entries
            .keys()
            .find(|key| normalize_name(key) == wanted)
            .map(String::as_str)
    }

    pub fn contains_normalized(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Size for `name`, exact key first, then by normalized match.
    pub fn size_of(&self, name: &str) -> Option<f64> {
        self.get(name)
            .or_else(|| self.find(name).and_then(|key| self.get(key)))
    }

    pub fn insert(&mut self, name: impl Into<String>, size: f64) -> Option<f64> {
        self.entries.insert(name.into(), size)
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.entries.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Union of `self` and `other`; on a normalized-name collision `self` wins.
    pub fn merged_with(&self, other: &Catalog) -> Catalog {
        let mut merged = self.clone();
        for (name, size) in other.iter() {
            if !merged.contains_normalized(name) {
                merged.entries.insert(name.to_string(), size);
            }
        }
        merged
    }

    pub fn stats(&self) -> Option<CatalogStats> {
        if self.entries.is_empty() {
            return None;
        }
        let count = self.entries.len();
        let total: f64 = self.entries.values().sum();
        let max_size = self
            .entries
            .values()
            .copied()
            .fold(f64::MIN, f64::max);
        Some(CatalogStats {
            count,
            mean_size: total / count as f64,
            max_size,
        })
    }
}

impl FromIterator<(String, f64)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[(&str, f64); N]> for Catalog {
    fn from(pairs: [(&str, f64); N]) -> Self {
        pairs
            .into_iter()
            .map(|(name, size)| (name.to_string(), size))
            .collect()
    }
}
