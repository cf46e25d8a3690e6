//! Resource catalog model.
//!
//! A resource type is a named pool of distinguishable instances (e.g. three
//! printers `p1, p2, p3`). The number of instances is fixed when the catalog
//! is built; only how many are *available* changes at run time, and that
//! count is tracked by the ledger, not here.
//!
//! # Reference
//! Silberschatz et al. (2018), "Operating System Concepts", Ch. 8.6

use serde::{Deserialize, Serialize};

use super::Units;

/// A resource type with its ordered instance identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceType {
    /// Resource name (e.g. "R1", "printer").
    pub name: String,
    /// Opaque instance identifiers, in declaration order.
    pub instances: Vec<String>,
}

impl ResourceType {
    /// Creates a resource type with no instances.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instances: Vec::new(),
        }
    }

    /// Adds an instance identifier.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instances.push(instance.into());
        self
    }

    /// Adds several instance identifiers.
    pub fn with_instances<I, S>(mut self, instances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instances.extend(instances.into_iter().map(Into::into));
        self
    }

    /// Number of instances (the total supply of this type).
    #[inline]
    pub fn instance_count(&self) -> Units {
        self.instances.len() as Units
    }

    /// Whether `instance` is one of this type's identifiers.
    pub fn has_instance(&self, instance: &str) -> bool {
        self.instances.iter().any(|i| i == instance)
    }
}

/// Immutable, ordered list of resource types.
///
/// Position in the catalog is the resource index used by every amount
/// vector (`request(a, b, c)` means `a` of the first type, `b` of the
/// second, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceCatalog {
    types: Vec<ResourceType>,
}

impl ResourceCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resource type.
    pub fn with_type(mut self, resource: ResourceType) -> Self {
        self.types.push(resource);
        self
    }

    /// Number of resource types.
    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the catalog declares no resource types.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Resource types in declaration order.
    pub fn types(&self) -> &[ResourceType] {
        &self.types
    }

    /// Resource type at `index`.
    pub fn get(&self, index: usize) -> Option<&ResourceType> {
        self.types.get(index)
    }

    /// Index of the resource type named `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.types.iter().position(|t| t.name == name)
    }

    /// Total instances per resource type.
    pub fn instance_counts(&self) -> Vec<Units> {
        self.types.iter().map(ResourceType::instance_count).collect()
    }

    /// Name of the resource type at `index`, or `"?"` when out of range.
    pub fn name(&self, index: usize) -> &str {
        self.types.get(index).map(|t| t.name.as_str()).unwrap_or("?")
    }
}

impl FromIterator<ResourceType> for ResourceCatalog {
    fn from_iter<T: IntoIterator<Item = ResourceType>>(iter: T) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> ResourceCatalog {
        ResourceCatalog::new()
            .with_type(ResourceType::new("R1").with_instances(["a", "b", "c"]))
            .with_type(ResourceType::new("R2").with_instance("x"))
    }

    #[test]
    fn test_instance_counts() {
        let catalog = sample_catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.instance_counts(), vec![3, 1]);
    }

    #[test]
    fn test_lookup() {
        let catalog = sample_catalog();
        assert_eq!(catalog.index_of("R2"), Some(1));
        assert_eq!(catalog.index_of("R9"), None);
        assert_eq!(catalog.name(0), "R1");
        assert_eq!(catalog.name(5), "?");
        assert!(catalog.get(0).unwrap().has_instance("b"));
        assert!(!catalog.get(1).unwrap().has_instance("b"));
    }

    #[test]
    fn test_serde_transparent() {
        let catalog = sample_catalog();
        let json = serde_json::to_string(&catalog).unwrap();
        assert!(json.starts_with('['));
        let back: ResourceCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = ResourceCatalog::new();
        assert!(catalog.is_empty());
        assert!(catalog.instance_counts().is_empty());
    }
}
