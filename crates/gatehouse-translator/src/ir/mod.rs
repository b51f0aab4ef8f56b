//! Intermediate representation produced by translation
//!
//! - [`xds`]: per-target proxy configuration bundles keyed by [`IrKey`]
//! - [`infra`]: the proxy fleet's runtime shape, consumed by the infra manager

pub mod infra;
pub mod xds;

pub use infra::{
    container_port_for, Infra, ListenerPort, ListenerProtocol, ProxyConfig, ProxyInfra,
    ProxyListener,
};
pub use xds::{
    ConnectionLimit, HttpListener, IrKey, JsonPatchConfig, PatchOp, PatchOperation,
    PatchPolicyIr, PolicyKey, XdsIr, XdsIrMap,
};
