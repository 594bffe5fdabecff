//! Cached discovery of resource kinds and resolution of resource paths.
//!
//! Discovery runs as a chain of stages, each computed at most once per [`Discovery`]:
//!
//! 1. [`api_groups`](Discovery::api_groups): preferred versions of the named groups, core last
//! 2. [`resource_apis`](Discovery::resource_apis): every group's resources, fetched concurrently
//! 3. [`listable_resource_apis`](Discovery::listable_resource_apis): resources supporting `list`
//! 4. [`resource_kinds`](Discovery::resource_kinds): a [`KindRegistry`] keyed by kind
//! 5. [`resource_kinds_prioritized`](Discovery::resource_kinds_prioritized): the registry in display order
//!
//! Later stages await earlier ones, so asking for the prioritized kinds first still
//! runs each stage once. A failed stage stays failed for the life of the cache.
use std::sync::Arc;

use futures::future::try_join_all;
use kubekind_core::{
    prioritize, registry::Insertion, ApiGroupRef, FetchParams, KindRegistry, Payload, ResourceDescriptor,
};
use tracing::{debug, warn};

use crate::{Client, Error, Result};

mod memo;
mod parse;

use memo::Memo;

/// A caching client for discovering resource kinds and fetching resources by kind.
///
/// Cloning is cheap and clones share the cache, so one instance created at startup
/// serves the whole process. There is no way to reset it; create a new [`Discovery`]
/// to observe changes on the server.
#[derive(Clone)]
pub struct Discovery {
    client: Client,
    stages: PrioritizedStage,
}

type Resources = Arc<Vec<ResourceDescriptor>>;

// Each stage owns its cell and a handle on the stages it reads from. A computation
// stored in a cell only ever holds upstream stages, never its own.
#[derive(Clone)]
struct GroupStage {
    client: Client,
    cell: Arc<Memo<Arc<Vec<ApiGroupRef>>>>,
}

#[derive(Clone)]
struct ResourceStage {
    groups: GroupStage,
    cell: Arc<Memo<Resources>>,
}

#[derive(Clone)]
struct ListableStage {
    resources: ResourceStage,
    cell: Arc<Memo<Resources>>,
}

#[derive(Clone)]
struct KindStage {
    listable: ListableStage,
    cell: Arc<Memo<Arc<KindRegistry>>>,
}

#[derive(Clone)]
struct PrioritizedStage {
    kinds: KindStage,
    cell: Arc<Memo<Resources>>,
}

impl Discovery {
    /// Construct an empty discovery cache around a client
    ///
    /// Nothing is requested until a stage is first asked for.
    #[must_use]
    pub fn new(client: Client) -> Self {
        let groups = GroupStage {
            client: client.clone(),
            cell: Arc::default(),
        };
        let resources = ResourceStage {
            groups,
            cell: Arc::default(),
        };
        let listable = ListableStage {
            resources,
            cell: Arc::default(),
        };
        let kinds = KindStage {
            listable,
            cell: Arc::default(),
        };
        let stages = PrioritizedStage {
            kinds,
            cell: Arc::default(),
        };
        Self { client, stages }
    }

    /// The client used for discovery and fetching
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Whether the kind registry has been requested from this cache
    pub fn is_discovered(&self) -> bool {
        self.stages.kinds.cell.is_initialized()
    }

    /// The kind registry, if it has already been built successfully
    pub fn cached_kinds(&self) -> Option<Arc<KindRegistry>> {
        self.stages.kinds.cell.peek().and_then(|res| res.ok())
    }
}

/// Discovery stages
impl Discovery {
    /// Group endpoints advertised under `/apis`, followed by the core group
    ///
    /// Each named group is referenced at its preferred version.
    pub async fn api_groups(&self) -> Result<Arc<Vec<ApiGroupRef>>> {
        self.stages.kinds.listable.resources.groups.get().await
    }

    /// All top level resources of all groups, in group order then server order
    ///
    /// Group resource lists are requested concurrently. Any failed request fails the stage.
    pub async fn resource_apis(&self) -> Result<Resources> {
        self.stages.kinds.listable.resources.get().await
    }

    /// Resources whose verbs include `list`, keeping their order
    pub async fn listable_resource_apis(&self) -> Result<Resources> {
        self.stages.kinds.listable.get().await
    }

    /// Listable resources folded into one descriptor per kind
    ///
    /// `extensions/v1beta1` descriptors are replaced when another group serves the same
    /// kind. Any other collision keeps the first descriptor, logs a warning and
    /// records the collision in [`KindRegistry::conflicts`].
    pub async fn resource_kinds(&self) -> Result<Arc<KindRegistry>> {
        self.stages.kinds.get().await
    }

    /// Registered descriptors in display order
    ///
    /// Kinds from [`PRIORITY`](kubekind_core::PRIORITY) come first, in table order,
    /// followed by every other kind in registry order.
    pub async fn resource_kinds_prioritized(&self) -> Result<Resources> {
        self.stages.get().await
    }
}

impl GroupStage {
    async fn get(&self) -> Result<Arc<Vec<ApiGroupRef>>> {
        let client = self.client.clone();
        self.cell
            .get_or_init(move || async move {
                let list = client.list_api_groups().await?;
                let mut groups: Vec<_> = list.groups.iter().filter_map(parse::group_ref).collect();
                groups.push(ApiGroupRef::core());
                debug!(groups = groups.len(), "Discovered api groups");
                Ok(Arc::new(groups))
            })
            .await
            .map_err(Error::Discovery)
    }
}

impl ResourceStage {
    async fn get(&self) -> Result<Resources> {
        let groups = self.groups.clone();
        self.cell
            .get_or_init(move || async move {
                let refs = groups.get().await?;
                let client = &groups.client;
                let lists = try_join_all(refs.iter().map(|group| async move {
                    let list = client.list_resources(&group.url).await?;
                    let resources = parse::resources(group, &list);
                    debug!(url = %group.url, resources = resources.len(), "Discovered group resources");
                    Ok::<_, Error>(resources)
                }))
                .await?;
                Ok(Arc::new(lists.into_iter().flatten().collect()))
            })
            .await
            .map_err(Error::Discovery)
    }
}

impl ListableStage {
    async fn get(&self) -> Result<Resources> {
        let resources = self.resources.clone();
        self.cell
            .get_or_init(move || async move {
                let all = resources.get().await?;
                let listable: Vec<_> = all.iter().filter(|r| r.is_listable()).cloned().collect();
                debug!(
                    listable = listable.len(),
                    total = all.len(),
                    "Filtered listable resources"
                );
                Ok(Arc::new(listable))
            })
            .await
            .map_err(Error::Discovery)
    }
}

impl KindStage {
    async fn get(&self) -> Result<Arc<KindRegistry>> {
        let listable = self.listable.clone();
        self.cell
            .get_or_init(move || async move { Ok(Arc::new(build_registry(&listable.get().await?))) })
            .await
            .map_err(Error::Discovery)
    }
}

impl PrioritizedStage {
    async fn get(&self) -> Result<Resources> {
        let kinds = self.kinds.clone();
        self.cell
            .get_or_init(move || async move {
                let registry = kinds.get().await?;
                Ok(Arc::new(prioritize(&registry)))
            })
            .await
            .map_err(Error::Discovery)
    }
}

fn build_registry(listable: &[ResourceDescriptor]) -> KindRegistry {
    let mut registry = KindRegistry::new();
    for resource in listable.iter().cloned() {
        let kind = resource.kind.clone();
        let api_version = resource.api_version.clone();
        match registry.insert(resource) {
            Insertion::Inserted => {}
            Insertion::Superseded(old) => {
                debug!(%kind, from = %old.api_version, to = %api_version, "Superseded deprecated kind");
            }
            Insertion::Discarded(conflict) => {
                warn!(
                    kind = %conflict.kind,
                    kept = %conflict.kept,
                    discarded = %conflict.discarded,
                    "Kind served by multiple groups, keeping the first"
                );
            }
        }
    }
    debug!(kinds = registry.len(), conflicts = registry.conflicts().len(), "Built kind registry");
    registry
}

/// Path resolution
impl Discovery {
    /// Descriptor registered for `kind`, discovering first if needed
    pub async fn resolve_kind(&self, kind: &str) -> Result<Option<ResourceDescriptor>> {
        Ok(self.resource_kinds().await?.get(kind).cloned())
    }

    /// Fetch a resource collection or a single named instance of a kind
    ///
    /// The request path is built from the kind's registered descriptor: `namespace` is
    /// only used for namespaced kinds, and an empty `name` lists the collection.
    /// Listed items in a json collection are stamped with the kind's `kind` and
    /// `apiVersion`, since collection responses omit them per item.
    ///
    /// Returns `Ok(None)` without making a request when `kind` is not registered.
    pub async fn fetch_resource(
        &self,
        name: Option<&str>,
        kind: &str,
        namespace: Option<&str>,
        params: &FetchParams,
    ) -> Result<Option<Payload>> {
        let registry = self.resource_kinds().await?;
        let Some(resource) = registry.get(kind) else {
            debug!(%kind, "Kind is not registered");
            return Ok(None);
        };

        let request = kubekind_core::Request::for_resource(resource, namespace).map_err(Error::BuildRequest)?;
        let name = name.filter(|name| !name.is_empty());
        let req = match name {
            Some(name) => request.get(name, params),
            None => request.list(params),
        }
        .map_err(Error::BuildRequest)?;

        let mut payload = self.client.request_payload(req, params.media_type).await?;
        if name.is_none() && !payload.stamp_items(resource) {
            debug!(%kind, "Nothing to stamp on collection response");
        }
        Ok(Some(payload))
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, time::Duration};

    use assert_json_diff::assert_json_eq;
    use futures::{future::join, pin_mut};
    use http::{Request, Response, StatusCode};
    use kubekind_core::{Environment, KindConflict, MediaType};
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use tower_test::mock;

    use super::*;
    use crate::client::Body;

    type Requests = Arc<Mutex<Vec<String>>>;

    fn resource(name: &str, kind: &str, namespaced: bool, verbs: &[&str]) -> Value {
        json!({
            "name": name,
            "singularName": "",
            "namespaced": namespaced,
            "kind": kind,
            "verbs": verbs,
        })
    }

    fn resource_list(group_version: &str, resources: Vec<Value>) -> Value {
        json!({
            "kind": "APIResourceList",
            "apiVersion": "v1",
            "groupVersion": group_version,
            "resources": resources,
        })
    }

    fn group(name: &str, version: &str) -> Value {
        let gv = json!({ "groupVersion": format!("{name}/{version}"), "version": version });
        json!({ "name": name, "versions": [gv.clone()], "preferredVersion": gv })
    }

    fn not_found(path: &str) -> (StatusCode, String) {
        let status = json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": format!("the server could not find the requested resource {path}"),
            "reason": "NotFound",
            "code": 404
        });
        (StatusCode::NOT_FOUND, status.to_string())
    }

    /// A small cluster where `Deployment` moved from extensions to apps
    /// and `Event` is served by both the core and events groups
    fn cluster(path: &str) -> (StatusCode, String) {
        let path = path.strip_prefix("/k8s").unwrap_or(path);
        let body = match path {
            "/apis" => json!({
                "kind": "APIGroupList",
                "apiVersion": "v1",
                "groups": [
                    group("extensions", "v1beta1"),
                    group("apps", "v1"),
                    group("events.k8s.io", "v1"),
                ]
            }),
            "/apis/extensions/v1beta1" => resource_list("extensions/v1beta1", vec![
                resource("deployments", "Deployment", true, &["get", "list"]),
                resource("ingresses", "Ingress", true, &["get", "list", "watch"]),
            ]),
            "/apis/apps/v1" => resource_list("apps/v1", vec![
                resource("deployments", "Deployment", true, &["get", "list", "watch"]),
                resource("deployments/scale", "Scale", true, &["get", "patch"]),
                resource("replicasets", "ReplicaSet", true, &["get", "list"]),
            ]),
            "/apis/events.k8s.io/v1" => resource_list("events.k8s.io/v1", vec![resource(
                "events",
                "Event",
                true,
                &["get", "list"],
            )]),
            "/api/v1" => resource_list("v1", vec![
                resource("bindings", "Binding", true, &["create"]),
                resource("pods", "Pod", true, &["get", "list", "watch"]),
                resource("pods/log", "Pod", true, &["get"]),
                resource("nodes", "Node", false, &["get", "list"]),
                resource("events", "Event", true, &["get", "list"]),
            ]),
            "/api/v1/namespaces/default/pods" | "/api/v1/pods" => json!({
                "kind": "PodList",
                "apiVersion": "v1",
                "metadata": { "resourceVersion": "1" },
                "items": [
                    { "metadata": { "name": "web-0" } },
                    { "metadata": { "name": "web-1" }, "kind": "Stale" },
                ]
            }),
            "/api/v1/nodes" => json!({
                "kind": "NodeList",
                "apiVersion": "v1",
                "items": [{ "metadata": { "name": "node-a" } }]
            }),
            "/apis/apps/v1/namespaces/web/deployments/frontend" => json!({
                "kind": "Deployment",
                "apiVersion": "apps/v1",
                "metadata": { "name": "frontend", "namespace": "web" }
            }),
            "/apis/extensions/v1beta1/namespaces/default/ingresses" => json!({
                "kind": "IngressList",
                "apiVersion": "extensions/v1beta1",
                "items": []
            }),
            "/api/v1/namespaces/yaml/pods" => {
                return (StatusCode::OK, "apiVersion: v1\nitems: []\nkind: PodList\n".into());
            }
            _ => return not_found(path),
        };
        (StatusCode::OK, body.to_string())
    }

    fn testcontext<F>(environment: Environment, route: F) -> (Discovery, Requests)
    where
        F: Fn(&str) -> (StatusCode, String) + Send + 'static,
    {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let requests = Requests::default();
        let seen = requests.clone();
        tokio::spawn(async move {
            pin_mut!(handle);
            while let Some((request, send)) = handle.next_request().await {
                let path = request.uri().path().to_string();
                seen.lock().push(path.clone());
                let (status, body) = route(&path);
                send.send_response(Response::builder().status(status).body(Body::from(body)).unwrap());
            }
        });
        let discovery = Discovery::new(Client::new(mock_service, environment));
        (discovery, requests)
    }

    fn kinds(resources: &[ResourceDescriptor]) -> Vec<(&str, &str)> {
        resources
            .iter()
            .map(|r| (r.kind.as_str(), r.api_version.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn api_groups_end_with_core() {
        let (discovery, _) = testcontext(Environment::Production, cluster);
        let groups = discovery.api_groups().await.unwrap();
        let urls: Vec<_> = groups.iter().map(|g| g.url.as_str()).collect();
        assert_eq!(urls, vec![
            "apis/extensions/v1beta1",
            "apis/apps/v1",
            "apis/events.k8s.io/v1",
            "api/v1",
        ]);
        assert_eq!(groups.last().unwrap(), &ApiGroupRef::core());
    }

    #[tokio::test]
    async fn empty_group_list_yields_core_only() {
        let (discovery, _) = testcontext(Environment::Production, |path| match path {
            "/apis" => (
                StatusCode::OK,
                json!({ "kind": "APIGroupList", "apiVersion": "v1", "groups": [] }).to_string(),
            ),
            _ => cluster(path),
        });
        let groups = discovery.api_groups().await.unwrap();
        assert_eq!(*groups, vec![ApiGroupRef::core()]);

        let all = discovery.resource_apis().await.unwrap();
        assert!(all.iter().all(|r| r.api_version == "v1"));
    }

    #[tokio::test]
    async fn abandoned_stage_releases_the_client() {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let discovery = Discovery::new(Client::new(mock_service, Environment::Production));
        pin_mut!(handle);

        let pending = tokio::time::timeout(
            Duration::from_millis(50),
            discovery.resource_kinds_prioritized(),
        );
        let (res, req) = join(pending, handle.next_request()).await;
        assert!(res.is_err(), "stage should still be waiting on the server");
        let (request, _unanswered) = req.expect("service not called");
        assert_eq!(request.uri().path(), "/apis");
        assert!(discovery.is_discovered());

        // dropping the last handle must drop the installed computations and with them the client
        drop(discovery);
        let next = tokio::time::timeout(Duration::from_secs(1), handle.next_request())
            .await
            .expect("client was not released");
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn resource_stages_keep_group_order() {
        let (discovery, _) = testcontext(Environment::Production, cluster);
        let all = discovery.resource_apis().await.unwrap();
        assert_eq!(kinds(&all), vec![
            ("Deployment", "extensions/v1beta1"),
            ("Ingress", "extensions/v1beta1"),
            ("Deployment", "apps/v1"),
            ("ReplicaSet", "apps/v1"),
            ("Event", "events.k8s.io/v1"),
            ("Binding", "v1"),
            ("Pod", "v1"),
            ("Node", "v1"),
            ("Event", "v1"),
        ]);

        let listable = discovery.listable_resource_apis().await.unwrap();
        assert_eq!(listable.len(), all.len() - 1);
        assert!(listable.iter().all(|r| r.kind != "Binding"));
    }

    #[tokio::test]
    async fn registry_resolves_deprecations_and_conflicts() {
        let (discovery, _) = testcontext(Environment::Production, cluster);
        let registry = discovery.resource_kinds().await.unwrap();
        let registered: Vec<_> = registry.descriptors().cloned().collect();
        assert_eq!(kinds(&registered), vec![
            ("Deployment", "apps/v1"),
            ("Ingress", "extensions/v1beta1"),
            ("ReplicaSet", "apps/v1"),
            ("Event", "events.k8s.io/v1"),
            ("Pod", "v1"),
            ("Node", "v1"),
        ]);
        assert_eq!(registry.conflicts(), &[KindConflict {
            kind: "Event".into(),
            kept: "events.k8s.io/v1".into(),
            discarded: "v1".into(),
        }]);
        assert!(!registry.get("Node").unwrap().namespaced);
    }

    #[tokio::test]
    async fn prioritized_kinds_lead_with_the_table() {
        let (discovery, _) = testcontext(Environment::Production, cluster);
        let ordered = discovery.resource_kinds_prioritized().await.unwrap();
        let order: Vec<_> = ordered.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(order, vec!["Ingress", "Deployment", "ReplicaSet", "Pod", "Event", "Node"]);
    }

    #[tokio::test]
    async fn stages_are_computed_once() {
        let (discovery, requests) = testcontext(Environment::Production, cluster);
        assert!(!discovery.is_discovered());

        let (kinds, ordered) = join(discovery.resource_kinds(), discovery.resource_kinds_prioritized()).await;
        let (kinds, ordered) = (kinds.unwrap(), ordered.unwrap());
        assert_eq!(requests.lock().len(), 5);
        assert!(discovery.is_discovered());

        let again = discovery.clone().resource_kinds().await.unwrap();
        assert!(Arc::ptr_eq(&kinds, &again));
        assert!(Arc::ptr_eq(&kinds, &discovery.cached_kinds().unwrap()));
        let ordered_again = discovery.resource_kinds_prioritized().await.unwrap();
        assert!(Arc::ptr_eq(&ordered, &ordered_again));
        discovery.api_groups().await.unwrap();
        assert_eq!(requests.lock().len(), 5);
    }

    #[tokio::test]
    async fn failed_stage_is_shared_and_not_retried() {
        let (discovery, requests) = testcontext(Environment::Production, |path: &str| {
            if path == "/apis/events.k8s.io/v1" {
                return (StatusCode::SERVICE_UNAVAILABLE, "etcd timeout".into());
            }
            cluster(path)
        });

        let first = discovery.resource_kinds_prioritized().await.unwrap_err();
        let second = discovery.resource_kinds().await.unwrap_err();
        let (Error::Discovery(first), Error::Discovery(second)) = (first, second) else {
            panic!("expected shared discovery errors");
        };
        assert!(Arc::ptr_eq(&first, &second));
        assert!(matches!(first.root(), Error::Api(e) if e.code == 503));

        // the group list itself succeeded and stays cached
        assert_eq!(discovery.api_groups().await.unwrap().len(), 4);
        assert_eq!(requests.lock().iter().filter(|p| *p == "/apis").count(), 1);

        let fetched = discovery
            .fetch_resource(None, "Pod", Some("default"), &FetchParams::default())
            .await;
        assert!(matches!(fetched, Err(Error::Discovery(e)) if Arc::ptr_eq(&e, &first)));
        assert!(discovery.cached_kinds().is_none());
    }

    #[tokio::test]
    async fn fetch_list_stamps_items() {
        let (discovery, requests) = testcontext(Environment::Production, cluster);
        let payload = discovery
            .fetch_resource(None, "Pod", Some("default"), &FetchParams::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(requests.lock().last().unwrap(), "/api/v1/namespaces/default/pods");

        assert_json_eq!(
            payload.into_json().unwrap(),
            json!({
                "kind": "PodList",
                "apiVersion": "v1",
                "metadata": { "resourceVersion": "1" },
                "items": [
                    { "metadata": { "name": "web-0" }, "kind": "Pod", "apiVersion": "v1" },
                    { "metadata": { "name": "web-1" }, "kind": "Pod", "apiVersion": "v1" },
                ]
            })
        );
    }

    #[tokio::test]
    async fn fetch_named_instance() {
        let (discovery, requests) = testcontext(Environment::Production, cluster);
        let payload = discovery
            .fetch_resource(Some("frontend"), "Deployment", Some("web"), &FetchParams::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            requests.lock().last().unwrap(),
            "/apis/apps/v1/namespaces/web/deployments/frontend"
        );
        assert_eq!(payload.as_json().unwrap()["metadata"]["name"], "frontend");
    }

    #[tokio::test]
    async fn fetch_ignores_namespace_for_cluster_kinds() {
        let (discovery, requests) = testcontext(Environment::Production, cluster);
        let payload = discovery
            .fetch_resource(Some(""), "Node", Some("default"), &FetchParams::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(requests.lock().last().unwrap(), "/api/v1/nodes");
        assert_eq!(payload.as_json().unwrap()["items"][0]["kind"], "Node");
    }

    #[tokio::test]
    async fn fetch_without_namespace_lists_all() {
        let (discovery, requests) = testcontext(Environment::Production, cluster);
        discovery
            .fetch_resource(None, "Pod", None, &FetchParams::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(requests.lock().last().unwrap(), "/api/v1/pods");
    }

    #[tokio::test]
    async fn fetch_unknown_kind_is_none() {
        let (discovery, requests) = testcontext(Environment::Production, cluster);
        let fetched = discovery
            .fetch_resource(None, "Widget", None, &FetchParams::default())
            .await
            .unwrap();
        assert!(fetched.is_none());
        assert_eq!(requests.lock().len(), 5);
        assert!(discovery.resolve_kind("Widget").await.unwrap().is_none());
        assert_eq!(discovery.resolve_kind("Pod").await.unwrap().unwrap().name, "pods");
    }

    #[tokio::test]
    async fn fetch_yaml_returns_text() {
        let (discovery, _) = testcontext(Environment::Production, cluster);
        let params = FetchParams { media_type: MediaType::Yaml };
        let payload = discovery
            .fetch_resource(None, "Pod", Some("yaml"), &params)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload.as_text(), Some("apiVersion: v1\nitems: []\nkind: PodList\n"));
    }

    #[tokio::test]
    async fn development_paths_use_proxy_prefix() {
        let (discovery, requests) = testcontext(Environment::Development, cluster);
        discovery
            .fetch_resource(None, "Ingress", Some("default"), &FetchParams::default())
            .await
            .unwrap();
        let requests = requests.lock();
        assert_eq!(requests.len(), 6);
        assert!(requests.iter().all(|p| p.starts_with("/k8s/")));
        assert!(requests.contains(&"/k8s/apis/extensions/v1beta1/namespaces/default/ingresses".to_string()));
    }
}
