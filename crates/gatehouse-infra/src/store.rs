//! Backing store client contract
//!
//! Objects are untyped [`DynamicObject`]s addressed by an [`ApiResource`] so
//! the version shim can retarget requests to another schema generation.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use gatehouse_common::{Error, Result, FIELD_MANAGER};
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::core::DynamicObject;
use kube::discovery::ApiResource;
use kube::runtime::watcher;
use kube::{Client, ResourceExt};

/// Stream of watch events
pub type WatchStream = BoxStream<'static, Result<watcher::Event<DynamicObject>>>;

/// Patch body accepted by [`ObjectStore::patch`]
#[derive(Clone, Debug, PartialEq)]
pub enum StorePatch {
    /// Server-side apply of a full object, forcing ownership
    Apply(DynamicObject),
    /// JSON merge patch
    Merge(serde_json::Value),
}

/// Read and write access to a Kubernetes-like object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one object
    async fn get(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject>;

    /// List objects; `namespace = None` lists across namespaces
    async fn list(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        params: &ListParams,
    ) -> Result<Vec<DynamicObject>>;

    /// Create an object
    async fn create(&self, ar: &ApiResource, obj: &DynamicObject) -> Result<()>;

    /// Replace an existing object
    async fn update(&self, ar: &ApiResource, obj: &DynamicObject) -> Result<()>;

    /// Delete one object
    async fn delete(&self, ar: &ApiResource, namespace: Option<&str>, name: &str) -> Result<()>;

    /// Delete every object matching `params`
    async fn delete_collection(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        params: &ListParams,
    ) -> Result<()>;

    /// Patch one object
    async fn patch(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        name: &str,
        patch: &StorePatch,
    ) -> Result<()>;

    /// Watch objects
    async fn watch(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        config: watcher::Config,
    ) -> Result<WatchStream>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn get(&self, ar: &ApiResource, namespace: Option<&str>, name: &str) -> Result<DynamicObject> {
        (**self).get(ar, namespace, name).await
    }

    async fn list(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        params: &ListParams,
    ) -> Result<Vec<DynamicObject>> {
        (**self).list(ar, namespace, params).await
    }

    async fn create(&self, ar: &ApiResource, obj: &DynamicObject) -> Result<()> {
        (**self).create(ar, obj).await
    }

    async fn update(&self, ar: &ApiResource, obj: &DynamicObject) -> Result<()> {
        (**self).update(ar, obj).await
    }

    async fn delete(&self, ar: &ApiResource, namespace: Option<&str>, name: &str) -> Result<()> {
        (**self).delete(ar, namespace, name).await
    }

    async fn delete_collection(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        params: &ListParams,
    ) -> Result<()> {
        (**self).delete_collection(ar, namespace, params).await
    }

    async fn patch(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        name: &str,
        patch: &StorePatch,
    ) -> Result<()> {
        (**self).patch(ar, namespace, name, patch).await
    }

    async fn watch(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        config: watcher::Config,
    ) -> Result<WatchStream> {
        (**self).watch(ar, namespace, config).await
    }
}

/// [`ObjectStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeObjectStore {
    client: Client,
}

impl KubeObjectStore {
    /// Wrap a kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, ar: &ApiResource, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, ar),
            None => Api::all_with(self.client.clone(), ar),
        }
    }
}

fn object_name(obj: &DynamicObject) -> Result<String> {
    obj.metadata
        .name
        .clone()
        .ok_or_else(|| Error::validation("object has no metadata.name"))
}

#[async_trait]
impl ObjectStore for KubeObjectStore {
    async fn get(&self, ar: &ApiResource, namespace: Option<&str>, name: &str) -> Result<DynamicObject> {
        Ok(self.api(ar, namespace).get(name).await?)
    }

    async fn list(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        params: &ListParams,
    ) -> Result<Vec<DynamicObject>> {
        Ok(self.api(ar, namespace).list(params).await?.items)
    }

    async fn create(&self, ar: &ApiResource, obj: &DynamicObject) -> Result<()> {
        self.api(ar, obj.namespace().as_deref())
            .create(&PostParams::default(), obj)
            .await?;
        Ok(())
    }

    async fn update(&self, ar: &ApiResource, obj: &DynamicObject) -> Result<()> {
        let name = object_name(obj)?;
        self.api(ar, obj.namespace().as_deref())
            .replace(&name, &PostParams::default(), obj)
            .await?;
        Ok(())
    }

    async fn delete(&self, ar: &ApiResource, namespace: Option<&str>, name: &str) -> Result<()> {
        self.api(ar, namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }

    async fn delete_collection(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        params: &ListParams,
    ) -> Result<()> {
        self.api(ar, namespace)
            .delete_collection(&DeleteParams::default(), params)
            .await?;
        Ok(())
    }

    async fn patch(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        name: &str,
        patch: &StorePatch,
    ) -> Result<()> {
        let api = self.api(ar, namespace);
        match patch {
            StorePatch::Apply(obj) => {
                api.patch(name, &PatchParams::apply(FIELD_MANAGER).force(), &Patch::Apply(obj))
                    .await?
            }
            StorePatch::Merge(body) => {
                api.patch(name, &PatchParams::default(), &Patch::Merge(body))
                    .await?
            }
        };
        Ok(())
    }

    async fn watch(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        config: watcher::Config,
    ) -> Result<WatchStream> {
        let stream = watcher(self.api(ar, namespace), config)
            .map_err(|e| Error::internal_with_context("watch", e.to_string()))
            .boxed();
        Ok(stream)
    }
}
