//! Gateway API reference types across schema generations
//!
//! Routes that have not graduated (TLSRoute, TCPRoute, UDPRoute, GRPCRoute)
//! still carry `v1alpha2` parent and backend references while the translator
//! works against `v1beta1`. [`compat`] converts between the two.

pub mod compat;
pub mod v1alpha2;
pub mod v1beta1;

/// API group of all Gateway API resources
pub const GROUP: &str = "gateway.networking.k8s.io";

/// Version string of the older schema generation
pub const V1ALPHA2: &str = "v1alpha2";

/// Version string of the newer schema generation
pub const V1BETA1: &str = "v1beta1";

/// Version string of the GA schema
pub const V1: &str = "v1";

/// Gateway kind
pub const KIND_GATEWAY: &str = "Gateway";

/// GatewayClass kind
pub const KIND_GATEWAY_CLASS: &str = "GatewayClass";

/// Gateway API resource kinds known to gatehouse
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GatewayApiKind {
    /// GatewayClass
    GatewayClass,
    /// Gateway
    Gateway,
    /// HTTPRoute
    HttpRoute,
    /// GRPCRoute
    GrpcRoute,
    /// TLSRoute
    TlsRoute,
    /// TCPRoute
    TcpRoute,
    /// UDPRoute
    UdpRoute,
    /// ReferenceGrant
    ReferenceGrant,
}

impl GatewayApiKind {
    /// All known kinds
    pub const ALL: [GatewayApiKind; 8] = [
        Self::GatewayClass,
        Self::Gateway,
        Self::HttpRoute,
        Self::GrpcRoute,
        Self::TlsRoute,
        Self::TcpRoute,
        Self::UdpRoute,
        Self::ReferenceGrant,
    ];

    /// Kind string as used in `TypeMeta`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GatewayClass => KIND_GATEWAY_CLASS,
            Self::Gateway => KIND_GATEWAY,
            Self::HttpRoute => "HTTPRoute",
            Self::GrpcRoute => "GRPCRoute",
            Self::TlsRoute => "TLSRoute",
            Self::TcpRoute => "TCPRoute",
            Self::UdpRoute => "UDPRoute",
            Self::ReferenceGrant => "ReferenceGrant",
        }
    }

    /// Lowercase plural resource name used in API paths
    pub fn plural(&self) -> &'static str {
        match self {
            Self::GatewayClass => "gatewayclasses",
            Self::Gateway => "gateways",
            Self::HttpRoute => "httproutes",
            Self::GrpcRoute => "grpcroutes",
            Self::TlsRoute => "tlsroutes",
            Self::TcpRoute => "tcproutes",
            Self::UdpRoute => "udproutes",
            Self::ReferenceGrant => "referencegrants",
        }
    }

    /// Look up a kind by its `TypeMeta` string
    pub fn from_kind(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == kind)
    }

    /// Returns true for cluster-scoped kinds
    pub fn is_cluster_scoped(&self) -> bool {
        matches!(self, Self::GatewayClass)
    }
}

impl std::fmt::Display for GatewayApiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
