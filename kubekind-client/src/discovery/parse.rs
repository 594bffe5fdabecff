//! Abstractions on top of k8s_openapi::apimachinery::pkg::apis::meta::v1
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIGroup, APIResource, APIResourceList};
use kubekind_core::{discovery::normalize_kind, ApiGroupRef, GroupVersion, ResourceDescriptor};

/// Creates an `ApiGroupRef` for the preferred version of a `meta::v1::APIGroup`
///
/// Falls back to the first advertised version when no preference is given.
pub(crate) fn group_ref(group: &APIGroup) -> Option<ApiGroupRef> {
    let Some(preferred) = group.preferred_version.as_ref().or_else(|| group.versions.first()) else {
        tracing::warn!(group = %group.name, "Skipping api group without versions");
        return None;
    };
    match preferred.group_version.parse::<GroupVersion>() {
        Ok(gv) => Some(ApiGroupRef::new(&gv)),
        Err(err) => {
            tracing::warn!(group = %group.name, error = %err, "Skipping api group with invalid version");
            None
        }
    }
}

/// Creates a `ResourceDescriptor` from a `meta::v1::APIResource` served at `group`
///
/// The descriptor takes its `apiVersion` from the group reference, not from the list.
fn parse_apiresource(ar: &APIResource, group: &ApiGroupRef) -> Option<ResourceDescriptor> {
    let Some(kind) = normalize_kind(&ar.kind) else {
        tracing::warn!(name = %ar.name, kind = %ar.kind, url = %group.url, "Skipping resource with invalid kind");
        return None;
    };
    Some(ResourceDescriptor {
        kind: kind.to_string(),
        api_version: group.version.clone(),
        name: ar.name.clone(),
        namespaced: ar.namespaced,
        verbs: ar.verbs.iter().cloned().collect(),
    })
}

/// Extracts the top level resources of a group's `meta::v1::APIResourceList`, in server order
pub(crate) fn resources(group: &ApiGroupRef, list: &APIResourceList) -> Vec<ResourceDescriptor> {
    list.resources
        .iter()
        // skip subresources
        .filter(|res| !res.name.contains('/'))
        .filter_map(|res| parse_apiresource(res, group))
        .collect()
}
