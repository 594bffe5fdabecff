//! Kind registry folding discovered resources into one descriptor per kind
//!
//! The registry is an insertion-ordered map. Both the conflict rule and the
//! display ordering depend on that order, so it is part of the contract:
//! iteration always yields kinds in the order they were first inserted.
use indexmap::{map::Entry, IndexMap};
use serde::Serialize;

use crate::discovery::ResourceDescriptor;

/// apiVersion treated as deprecated, superseded by any other group serving the same kind
pub const DEPRECATED_API_VERSION: &str = "extensions/v1beta1";

/// Two groups advertising the same kind where neither is deprecated
///
/// The first-seen descriptor is kept, the later one is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindConflict {
    /// Contested kind
    pub kind: String,
    /// apiVersion of the descriptor kept in the registry
    pub kept: String,
    /// apiVersion of the descriptor that was dropped
    pub discarded: String,
}

/// Outcome of [`KindRegistry::insert`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    /// First descriptor for its kind
    Inserted,
    /// Replaced a descriptor from the deprecated group, which is returned
    Superseded(ResourceDescriptor),
    /// Kind already held by a non-deprecated group, incoming descriptor dropped
    Discarded(KindConflict),
}

/// Mapping from kind to the single descriptor used to address it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindRegistry {
    kinds: IndexMap<String, ResourceDescriptor>,
    #[serde(skip)]
    conflicts: Vec<KindConflict>,
}

impl KindRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one descriptor into the registry
    ///
    /// A descriptor from [`DEPRECATED_API_VERSION`] is always replaced by a later one
    /// for the same kind, keeping the kind's original position. Any other collision
    /// keeps the existing descriptor and records a [`KindConflict`].
    pub fn insert(&mut self, resource: ResourceDescriptor) -> Insertion {
        match self.kinds.entry(resource.kind.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(resource);
                Insertion::Inserted
            }
            Entry::Occupied(mut entry) if entry.get().api_version == DEPRECATED_API_VERSION => {
                Insertion::Superseded(entry.insert(resource))
            }
            Entry::Occupied(entry) => {
                let conflict = KindConflict {
                    kind: resource.kind,
                    kept: entry.get().api_version.clone(),
                    discarded: resource.api_version,
                };
                self.conflicts.push(conflict.clone());
                Insertion::Discarded(conflict)
            }
        }
    }

    /// Descriptor registered for `kind`
    pub fn get(&self, kind: &str) -> Option<&ResourceDescriptor> {
        self.kinds.get(kind)
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether no kind is registered
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Iterates kinds and descriptors in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceDescriptor)> {
        self.kinds.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates descriptors in insertion order
    pub fn descriptors(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.kinds.values()
    }

    /// Collisions resolved by discarding a descriptor, in the order they happened
    pub fn conflicts(&self) -> &[KindConflict] {
        &self.conflicts
    }

    pub(crate) fn kinds(&self) -> &IndexMap<String, ResourceDescriptor> {
        &self.kinds
    }
}

impl FromIterator<ResourceDescriptor> for KindRegistry {
    fn from_iter<I: IntoIterator<Item = ResourceDescriptor>>(iter: I) -> Self {
        let mut registry = Self::new();
        for resource in iter {
            registry.insert(resource);
        }
        registry
    }
}
