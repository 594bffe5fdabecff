//! Display ordering of registered kinds
use crate::{discovery::ResourceDescriptor, registry::KindRegistry};

/// Kinds shown first, highest priority first
///
/// Fixed for the process and independent of what the server advertises.
pub const PRIORITY: [&str; 15] = [
    "Ingress",
    "Service",
    "Deployment",
    "ReplicaSet",
    "DaemonSet",
    "StatefulSet",
    "ReplicationController",
    "Pod",
    "Job",
    "PersistentVolumeClaim",
    "ConfigMap",
    "Secret",
    "ServiceAccount",
    "Role",
    "RoleBinding",
];

/// Orders the registry for display using [`PRIORITY`]
pub fn prioritize(registry: &KindRegistry) -> Vec<ResourceDescriptor> {
    prioritize_with(registry, &PRIORITY)
}

/// Orders the registry for display using a custom priority table
///
/// Every registered kind appears exactly once: kinds named in `table` come first in
/// table order, followed by the rest in registry insertion order.
pub fn prioritize_with(registry: &KindRegistry, table: &[&str]) -> Vec<ResourceDescriptor> {
    let mut remaining = registry.kinds().clone();
    let mut ordered = Vec::with_capacity(remaining.len());
    for kind in table {
        if let Some(resource) = remaining.shift_remove(*kind) {
            ordered.push(resource);
        }
    }
    ordered.extend(remaining.into_values());
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(kinds: &[&str]) -> KindRegistry {
        kinds
            .iter()
            .map(|kind| ResourceDescriptor {
                kind: kind.to_string(),
                api_version: "v1".into(),
                name: kind.to_ascii_lowercase(),
                namespaced: true,
                verbs: Default::default(),
            })
            .collect()
    }

    fn kinds(list: &[ResourceDescriptor]) -> Vec<&str> {
        list.iter().map(|r| r.kind.as_str()).collect()
    }

    #[test]
    fn priority_kinds_precede_the_rest() {
        let ordered = prioritize(&registry(&["Pod", "Widget", "Service"]));
        assert_eq!(kinds(&ordered), vec!["Service", "Pod", "Widget"]);
    }

    #[test]
    fn unprioritized_keep_insertion_order() {
        let ordered = prioritize(&registry(&["Zeta", "Secret", "Alpha", "Ingress", "Mu"]));
        assert_eq!(kinds(&ordered), vec!["Ingress", "Secret", "Zeta", "Alpha", "Mu"]);
    }

    #[test]
    fn every_kind_appears_once() {
        let all: Vec<&str> = PRIORITY.iter().rev().copied().chain(["Node", "Lease"]).collect();
        let reg = registry(&all);
        let ordered = prioritize(&reg);
        assert_eq!(ordered.len(), reg.len());
        assert_eq!(&kinds(&ordered)[..PRIORITY.len()], &PRIORITY[..]);
        assert_eq!(&kinds(&ordered)[PRIORITY.len()..], &["Node", "Lease"]);
    }

    #[test]
    fn empty_registry() {
        assert!(prioritize(&KindRegistry::new()).is_empty());
    }

    #[test]
    fn custom_table() {
        let ordered = prioritize_with(&registry(&["Pod", "Node"]), &["Node"]);
        assert_eq!(kinds(&ordered), vec!["Node", "Pod"]);
    }
}
