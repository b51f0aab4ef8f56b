//! Gateway API version shim
//!
//! Wraps an [`ObjectStore`] whose server only understands `v1alpha2` for
//! Gateway API kinds while callers speak `v1beta1`. Requests for a kind in
//! [`SHIMMED_KINDS`] are retargeted to `v1alpha2`, write bodies are
//! downgraded before the call, and read results are upgraded on the way
//! back. Everything else passes through untouched.

mod convert;

use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_common::gateway_api::{GatewayApiKind, GROUP, V1ALPHA2, V1BETA1};
use gatehouse_common::kube_utils::join_api_version;
use gatehouse_common::{Error, Result};
use kube::api::ListParams;
use kube::core::{DynamicObject, TypeMeta};
use kube::discovery::ApiResource;
use kube::runtime::watcher;
use tracing::trace;

use crate::store::{ObjectStore, StorePatch, WatchStream};
use convert::{convert_route_body, Direction};

/// How an object body changes between generations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyConversion {
    /// Only `apiVersion` changes
    Retype,
    /// Parent references, backend references, and parent statuses are
    /// converted as well
    Route,
}

/// One entry of the substitution table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindShim {
    /// The shimmed kind
    pub kind: GatewayApiKind,
    /// Body conversion applied in both directions
    pub convert: BodyConversion,
}

/// Kinds substituted by the shim
pub const SHIMMED_KINDS: &[KindShim] = &[
    KindShim { kind: GatewayApiKind::GatewayClass, convert: BodyConversion::Retype },
    KindShim { kind: GatewayApiKind::Gateway, convert: BodyConversion::Retype },
    KindShim { kind: GatewayApiKind::HttpRoute, convert: BodyConversion::Route },
    KindShim { kind: GatewayApiKind::GrpcRoute, convert: BodyConversion::Route },
    KindShim { kind: GatewayApiKind::TlsRoute, convert: BodyConversion::Route },
    KindShim { kind: GatewayApiKind::TcpRoute, convert: BodyConversion::Route },
    KindShim { kind: GatewayApiKind::UdpRoute, convert: BodyConversion::Route },
    KindShim { kind: GatewayApiKind::ReferenceGrant, convert: BodyConversion::Retype },
];

/// Table entry for a caller-side resource, if the shim handles it
pub fn shim_for(ar: &ApiResource) -> Option<&'static KindShim> {
    if ar.group != GROUP || ar.version != V1BETA1 {
        return None;
    }
    SHIMMED_KINDS.iter().find(|s| s.kind.as_str() == ar.kind)
}

impl KindShim {
    /// The `v1alpha2` resource requests are retargeted to
    pub fn older_resource(&self) -> ApiResource {
        ApiResource {
            group: GROUP.to_string(),
            version: V1ALPHA2.to_string(),
            api_version: join_api_version(GROUP, V1ALPHA2),
            kind: self.kind.as_str().to_string(),
            plural: self.kind.plural().to_string(),
        }
    }

    /// Convert a caller object into its `v1alpha2` equivalent
    pub fn downgrade(&self, obj: &DynamicObject) -> Result<DynamicObject> {
        self.check_kind(obj)?;
        let mut out = obj.clone();
        out.types = Some(self.types(V1ALPHA2));
        self.convert_body(&mut out.data, Direction::Downgrade)?;
        Ok(out)
    }

    /// Convert an object returned by the store back to `v1beta1`.
    ///
    /// Read results must carry their type; an untyped object cannot be
    /// checked against the table entry and is rejected.
    pub fn upgrade(&self, mut obj: DynamicObject) -> Result<DynamicObject> {
        if obj.types.is_none() {
            return Err(Error::conversion(
                self.kind.as_str(),
                "object read back without apiVersion/kind",
            ));
        }
        self.check_kind(&obj)?;
        obj.types = Some(self.types(V1BETA1));
        self.convert_body(&mut obj.data, Direction::Upgrade)?;
        Ok(obj)
    }

    /// Downgrade a merge patch body
    pub fn downgrade_merge(&self, body: &serde_json::Value) -> Result<serde_json::Value> {
        let mut out = body.clone();
        if let Some(api_version) = out.get_mut("apiVersion") {
            *api_version = serde_json::Value::String(join_api_version(GROUP, V1ALPHA2));
        }
        self.convert_body(&mut out, Direction::Downgrade)?;
        Ok(out)
    }

    fn types(&self, version: &str) -> TypeMeta {
        TypeMeta {
            api_version: join_api_version(GROUP, version),
            kind: self.kind.as_str().to_string(),
        }
    }

    /// Reject objects typed as another kind. Untyped caller objects pass
    /// since `downgrade` stamps the type itself.
    fn check_kind(&self, obj: &DynamicObject) -> Result<()> {
        match &obj.types {
            Some(types) if types.kind != self.kind.as_str() => Err(Error::conversion(
                self.kind.as_str(),
                format!("object has kind {}", types.kind),
            )),
            _ => Ok(()),
        }
    }

    fn convert_body(&self, body: &mut serde_json::Value, direction: Direction) -> Result<()> {
        match self.convert {
            BodyConversion::Retype => Ok(()),
            BodyConversion::Route => convert_route_body(body, direction)
                .map_err(|msg| Error::conversion(self.kind.as_str(), msg)),
        }
    }
}

/// [`ObjectStore`] adapter serving `v1beta1` Gateway API objects from a
/// `v1alpha2` store
#[derive(Clone)]
pub struct VersionShim {
    inner: Arc<dyn ObjectStore>,
}

impl VersionShim {
    /// Wrap a store
    pub fn new(inner: Arc<dyn ObjectStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ObjectStore for VersionShim {
    async fn get(&self, ar: &ApiResource, namespace: Option<&str>, name: &str) -> Result<DynamicObject> {
        let Some(shim) = shim_for(ar) else {
            return self.inner.get(ar, namespace, name).await;
        };
        trace!(kind = %shim.kind, name, "get through version shim");
        let obj = self.inner.get(&shim.older_resource(), namespace, name).await?;
        shim.upgrade(obj)
    }

    async fn list(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        params: &ListParams,
    ) -> Result<Vec<DynamicObject>> {
        let Some(shim) = shim_for(ar) else {
            return self.inner.list(ar, namespace, params).await;
        };
        trace!(kind = %shim.kind, "list through version shim");
        self.inner
            .list(&shim.older_resource(), namespace, params)
            .await?
            .into_iter()
            .map(|obj| shim.upgrade(obj))
            .collect()
    }

    async fn create(&self, ar: &ApiResource, obj: &DynamicObject) -> Result<()> {
        match shim_for(ar) {
            Some(shim) => {
                self.inner
                    .create(&shim.older_resource(), &shim.downgrade(obj)?)
                    .await
            }
            None => self.inner.create(ar, obj).await,
        }
    }

    async fn update(&self, ar: &ApiResource, obj: &DynamicObject) -> Result<()> {
        match shim_for(ar) {
            Some(shim) => {
                self.inner
                    .update(&shim.older_resource(), &shim.downgrade(obj)?)
                    .await
            }
            None => self.inner.update(ar, obj).await,
        }
    }

    async fn delete(&self, ar: &ApiResource, namespace: Option<&str>, name: &str) -> Result<()> {
        match shim_for(ar) {
            Some(shim) => self.inner.delete(&shim.older_resource(), namespace, name).await,
            None => self.inner.delete(ar, namespace, name).await,
        }
    }

    async fn delete_collection(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        params: &ListParams,
    ) -> Result<()> {
        match shim_for(ar) {
            Some(shim) => {
                self.inner
                    .delete_collection(&shim.older_resource(), namespace, params)
                    .await
            }
            None => self.inner.delete_collection(ar, namespace, params).await,
        }
    }

    async fn patch(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        name: &str,
        patch: &StorePatch,
    ) -> Result<()> {
        let Some(shim) = shim_for(ar) else {
            return self.inner.patch(ar, namespace, name, patch).await;
        };
        let patch = match patch {
            StorePatch::Apply(obj) => StorePatch::Apply(shim.downgrade(obj)?),
            StorePatch::Merge(body) => StorePatch::Merge(shim.downgrade_merge(body)?),
        };
        self.inner
            .patch(&shim.older_resource(), namespace, name, &patch)
            .await
    }

    async fn watch(
        &self,
        ar: &ApiResource,
        _namespace: Option<&str>,
        _config: watcher::Config,
    ) -> Result<WatchStream> {
        Err(Error::unsupported(
            "watch",
            format!("{} cannot be watched through the Gateway API version shim", ar.kind),
        ))
    }
}
