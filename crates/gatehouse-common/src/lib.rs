//! Common types for gatehouse: CRDs, Gateway API references, errors, and utilities

#![deny(missing_docs)]

pub mod config;
pub mod crd;
pub mod error;
pub mod gateway_api;
pub mod kube_utils;
pub mod telemetry;
pub mod yaml;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Field manager used for every server-side apply issued by gatehouse
pub const FIELD_MANAGER: &str = "gatehouse-controller";

/// Label key identifying the component that owns a generated resource
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Label value for resources managed by gatehouse
pub const LABEL_MANAGED_BY_GATEHOUSE: &str = "gatehouse";

/// Label key for the standard resource name label
pub const LABEL_NAME: &str = "app.kubernetes.io/name";

/// Label key for the component within the proxy fleet (proxy, ratelimit)
pub const LABEL_COMPONENT: &str = "app.kubernetes.io/component";

/// Namespace where the proxy fleet and rate limit service are deployed
pub const GATEHOUSE_SYSTEM_NAMESPACE: &str = "gatehouse-system";
