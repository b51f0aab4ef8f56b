//! In-memory [`ObjectStore`] that records every call

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use gatehouse_common::{Error, Result};
use kube::api::ListParams;
use kube::core::{DynamicObject, ErrorResponse};
use kube::discovery::ApiResource;
use kube::runtime::watcher;

use crate::store::{ObjectStore, StorePatch, WatchStream};

/// Storage key: apiVersion, kind, namespace, name
type Key = (String, String, String, String);

/// One recorded store call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub op: &'static str,
    pub api_version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: Option<String>,
}

#[derive(Default)]
pub struct RecordingStore {
    objects: Mutex<BTreeMap<Key, DynamicObject>>,
    calls: Mutex<Vec<Call>>,
    merge_patches: Mutex<Vec<serde_json::Value>>,
}

pub fn not_found(name: &str) -> Error {
    Error::Kube {
        source: kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{name} not found"),
            reason: "NotFound".to_string(),
            code: 404,
        }),
    }
}

fn key(ar: &ApiResource, namespace: Option<&str>, name: &str) -> Key {
    (
        ar.api_version.clone(),
        ar.kind.clone(),
        namespace.unwrap_or_default().to_string(),
        name.to_string(),
    )
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object under its own apiVersion and kind
    pub fn seed(&self, obj: DynamicObject) {
        let types = obj.types.clone().unwrap_or_default();
        let k = (
            types.api_version,
            types.kind,
            obj.metadata.namespace.clone().unwrap_or_default(),
            obj.metadata.name.clone().unwrap_or_default(),
        );
        self.objects.lock().unwrap().insert(k, obj);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn merge_patches(&self) -> Vec<serde_json::Value> {
        self.merge_patches.lock().unwrap().clone()
    }

    /// Stored object, if any
    pub fn object(&self, ar: &ApiResource, namespace: Option<&str>, name: &str) -> Option<DynamicObject> {
        self.objects.lock().unwrap().get(&key(ar, namespace, name)).cloned()
    }

    /// Number of stored objects of a resource type
    pub fn count(&self, ar: &ApiResource) -> usize {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(v, k, _, _)| *v == ar.api_version && *k == ar.kind)
            .count()
    }

    fn record(&self, op: &'static str, ar: &ApiResource, namespace: Option<&str>, name: Option<&str>) {
        self.calls.lock().unwrap().push(Call {
            op,
            api_version: ar.api_version.clone(),
            kind: ar.kind.clone(),
            namespace: namespace.map(str::to_string),
            name: name.map(str::to_string),
        });
    }

    fn store(&self, ar: &ApiResource, obj: &DynamicObject) {
        let k = key(
            ar,
            obj.metadata.namespace.as_deref(),
            obj.metadata.name.as_deref().unwrap_or_default(),
        );
        self.objects.lock().unwrap().insert(k, obj.clone());
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn get(&self, ar: &ApiResource, namespace: Option<&str>, name: &str) -> Result<DynamicObject> {
        self.record("get", ar, namespace, Some(name));
        self.object(ar, namespace, name).ok_or_else(|| not_found(name))
    }

    async fn list(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        _params: &ListParams,
    ) -> Result<Vec<DynamicObject>> {
        self.record("list", ar, namespace, None);
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|((v, k, ns, _), _)| {
                *v == ar.api_version && *k == ar.kind && namespace.map_or(true, |want| want == ns.as_str())
            })
            .map(|(_, obj)| obj.clone())
            .collect())
    }

    async fn create(&self, ar: &ApiResource, obj: &DynamicObject) -> Result<()> {
        self.record("create", ar, obj.metadata.namespace.as_deref(), obj.metadata.name.as_deref());
        self.store(ar, obj);
        Ok(())
    }

    async fn update(&self, ar: &ApiResource, obj: &DynamicObject) -> Result<()> {
        self.record("update", ar, obj.metadata.namespace.as_deref(), obj.metadata.name.as_deref());
        self.store(ar, obj);
        Ok(())
    }

    async fn delete(&self, ar: &ApiResource, namespace: Option<&str>, name: &str) -> Result<()> {
        self.record("delete", ar, namespace, Some(name));
        self.objects
            .lock()
            .unwrap()
            .remove(&key(ar, namespace, name))
            .map(|_| ())
            .ok_or_else(|| not_found(name))
    }

    async fn delete_collection(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        _params: &ListParams,
    ) -> Result<()> {
        self.record("delete_collection", ar, namespace, None);
        self.objects.lock().unwrap().retain(|(v, k, ns, _), _| {
            !(*v == ar.api_version && *k == ar.kind && namespace.map_or(true, |want| want == ns.as_str()))
        });
        Ok(())
    }

    async fn patch(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        name: &str,
        patch: &StorePatch,
    ) -> Result<()> {
        self.record("patch", ar, namespace, Some(name));
        match patch {
            StorePatch::Apply(obj) => self.store(ar, obj),
            StorePatch::Merge(body) => self.merge_patches.lock().unwrap().push(body.clone()),
        }
        Ok(())
    }

    async fn watch(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        _config: watcher::Config,
    ) -> Result<WatchStream> {
        self.record("watch", ar, namespace, None);
        Ok(futures::stream::empty().boxed())
    }
}
