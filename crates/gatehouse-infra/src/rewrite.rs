//! HTTP path rewriting for clusters that only serve Gateway API `v1beta1`
//!
//! Installed as a layer on the kube client so requests built for the GA
//! `v1` endpoints reach the `v1beta1` ones instead.

use std::task::{Context, Poll};

use http::uri::{PathAndQuery, Uri};
use http::Request;
use tower::{Layer, Service};

use gatehouse_common::gateway_api::GROUP;

/// Rewrites `/apis/gateway.networking.k8s.io/v1/...` to `.../v1beta1/...`
#[derive(Clone, Debug, Default)]
pub struct RewriteApiVersionLayer;

impl<S> Layer<S> for RewriteApiVersionLayer {
    type Service = RewriteApiVersion<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RewriteApiVersion { inner }
    }
}

/// Service produced by [`RewriteApiVersionLayer`]
#[derive(Clone, Debug)]
pub struct RewriteApiVersion<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for RewriteApiVersion<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        if let Some(uri) = rewrite_uri(req.uri()) {
            *req.uri_mut() = uri;
        }
        self.inner.call(req)
    }
}

/// The rewritten URI, or `None` when the request is not for a GA Gateway
/// API endpoint
pub fn rewrite_uri(uri: &Uri) -> Option<Uri> {
    let from = format!("/apis/{GROUP}/v1/");
    let path_and_query = uri.path_and_query()?;
    let rest = path_and_query.as_str().strip_prefix(&from)?;

    let rewritten = format!("/apis/{GROUP}/v1beta1/{rest}");
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(rewritten).ok()?);
    Uri::from_parts(parts).ok()
}
