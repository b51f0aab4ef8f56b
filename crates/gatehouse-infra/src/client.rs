//! Client and store construction from the gateway configuration

use std::sync::Arc;

use gatehouse_common::config::GatewayConfig;
use gatehouse_common::{Error, Result};
use kube::client::ClientBuilder;
use kube::{Client, Config};
use tracing::info;

use crate::rewrite::RewriteApiVersionLayer;
use crate::shim::VersionShim;
use crate::store::{KubeObjectStore, ObjectStore};

/// Build a kube client from the ambient kubeconfig or in-cluster config.
///
/// Clusters serving Gateway API only up to `v1beta1` get the path rewrite
/// layer so `v1` requests land on `v1beta1` endpoints.
pub async fn build_client(config: &GatewayConfig) -> Result<Client> {
    let kube_config = Config::infer()
        .await
        .map_err(|e| Error::config(format!("failed to infer kube config: {e}")))?;

    let builder = ClientBuilder::try_from(kube_config)?;
    if config.gateway_api.needs_path_rewrite() {
        info!("rewriting Gateway API v1 request paths to v1beta1");
        Ok(builder.with_layer(&RewriteApiVersionLayer).build())
    } else {
        Ok(builder.build())
    }
}

/// Wrap a client in the object store the rest of gatehouse uses
pub fn build_store(client: Client, config: &GatewayConfig) -> Arc<dyn ObjectStore> {
    wrap_store(Arc::new(KubeObjectStore::new(client)), config)
}

fn wrap_store(store: Arc<dyn ObjectStore>, config: &GatewayConfig) -> Arc<dyn ObjectStore> {
    if config.gateway_api.needs_version_shim() {
        info!("serving Gateway API v1beta1 objects from v1alpha2 storage");
        Arc::new(VersionShim::new(store))
    } else {
        store
    }
}
