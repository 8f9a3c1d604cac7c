//! HTTP client for the WAPT server API.
//!
//! Each call issues one GET, decodes the JSON [`Envelope`] and checks its
//! `success` flag. Failures are logged here with the endpoint and call
//! name, then returned so the caller can decide what to skip.

use std::future::Future;

use base64::Engine;
use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use http::uri::Scheme;
use http::{Request, StatusCode, Uri};
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::config::InventoryConfig;
use crate::error::{InventoryError, InventoryResult};
use crate::types::{Envelope, HostRecord, PackageRecord, PingInfo};

/// Upper bound on hosts requested per listing.
pub const MAX_HOSTS: usize = 10_000;

const PING_PATH: &str = "/ping";
const HOSTS_PATH: &str = "/api/v3/hosts";
const PACKAGES_PATH: &str = "/api/v3/packages";

/// Read-only view of the WAPT inventory used by the collector.
pub trait InventoryApi: Send + Sync {
    /// Unauthenticated liveness check.
    fn ping(&self) -> impl Future<Output = InventoryResult<PingInfo>> + Send;

    /// Registered hosts, capped at [`MAX_HOSTS`].
    fn list_hosts(&self) -> impl Future<Output = InventoryResult<Vec<HostRecord>>> + Send;

    /// Packages known to the server's local repository.
    fn list_packages(&self) -> impl Future<Output = InventoryResult<Vec<PackageRecord>>> + Send;

    /// True only when the ping went through and the server reported success.
    fn check_liveness(&self) -> impl Future<Output = bool> + Send {
        async { self.ping().await.is_ok() }
    }
}

/// A single GET against the WAPT API.
struct Call {
    name: &'static str,
    path: &'static str,
    query: Option<String>,
    authenticated: bool,
}

/// Client for one WAPT server, built once from an immutable config.
#[derive(Clone, Debug)]
pub struct InventoryClient {
    config: InventoryConfig,
    http: Client<HttpConnector, Empty<Bytes>>,
}

impl InventoryClient {
    pub fn new(config: InventoryConfig) -> Self {
        let http = Client::builder(TokioExecutor::new()).build_http();
        Self { config, http }
    }

    /// Run a call and log whatever went wrong.
    async fn call<T>(&self, call: Call) -> InventoryResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let endpoint = &self.config.endpoint;
        match self.fetch::<T>(&call).await {
            Ok(envelope) if envelope.success => {
                debug!(
                    %endpoint,
                    call = call.name,
                    request_time = envelope.request_time,
                    "got {} response",
                    call.name
                );
                Ok(envelope.into_result())
            }
            Ok(envelope) => {
                warn!(
                    %endpoint,
                    call = call.name,
                    msg = %envelope.msg,
                    "got {} response but success = false",
                    call.name
                );
                Err(InventoryError::Rejected { msg: envelope.msg })
            }
            Err(e) => {
                error!(%endpoint, call = call.name, error = %e, "{} request failed", call.name);
                Err(e)
            }
        }
    }

    async fn fetch<T>(&self, call: &Call) -> InventoryResult<Envelope<T>>
    where
        T: DeserializeOwned,
    {
        let uri = endpoint_uri(&self.config.endpoint, call.path, call.query.as_deref())?;

        let mut builder = Request::get(uri)
            .header(USER_AGENT, concat!("wapt-exporter/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/json");
        if call.authenticated {
            builder = builder.header(
                AUTHORIZATION,
                basic_auth(&self.config.username, &self.config.password),
            );
        }
        let req = builder
            .body(Empty::<Bytes>::new())
            .map_err(|e| InventoryError::Transport(e.to_string()))?;

        let exchange = async {
            let resp = self.http.request(req).await.map_err(transport)?;
            let status = resp.status();
            let body = resp.into_body().collect().await.map_err(transport)?.to_bytes();
            Ok::<_, InventoryError>((status, body))
        };

        let (status, body) = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| InventoryError::Timeout(limit))??,
            None => exchange.await?,
        };

        decode_envelope(status, &body)
    }
}

impl InventoryApi for InventoryClient {
    async fn ping(&self) -> InventoryResult<PingInfo> {
        let info: PingInfo = self
            .call(Call {
                name: "ping",
                path: PING_PATH,
                query: None,
                authenticated: false,
            })
            .await?;
        debug!(endpoint = %self.config.endpoint, version = %info.version, "server is up");
        Ok(info)
    }

    async fn list_hosts(&self) -> InventoryResult<Vec<HostRecord>> {
        self.call(Call {
            name: "hosts",
            path: HOSTS_PATH,
            query: Some(format!("limit={MAX_HOSTS}")),
            authenticated: true,
        })
        .await
    }

    async fn list_packages(&self) -> InventoryResult<Vec<PackageRecord>> {
        self.call(Call {
            name: "packages",
            path: PACKAGES_PATH,
            query: None,
            authenticated: true,
        })
        .await
    }
}

/// Join an API path onto the configured base endpoint.
///
/// Any path prefix on the base is kept (`http://h/wapt` + `/ping` gives
/// `http://h/wapt/ping`). Only plain `http` is supported.
pub fn endpoint_uri(base: &str, path: &str, query: Option<&str>) -> InventoryResult<Uri> {
    let invalid = |reason: String| InventoryError::InvalidEndpoint {
        endpoint: base.to_string(),
        reason,
    };

    let uri: Uri = base.parse().map_err(|e: http::uri::InvalidUri| invalid(e.to_string()))?;
    let scheme = uri.scheme().ok_or_else(|| invalid("missing scheme".into()))?;
    if *scheme != Scheme::HTTP {
        return Err(invalid(format!("unsupported scheme {scheme}")));
    }
    let authority = uri.authority().ok_or_else(|| invalid("missing host".into()))?;

    let mut path_and_query = format!("{}{}", uri.path().trim_end_matches('/'), path);
    if let Some(query) = query {
        path_and_query.push('?');
        path_and_query.push_str(query);
    }

    Uri::builder()
        .scheme(scheme.clone())
        .authority(authority.clone())
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| invalid(e.to_string()))
}

/// `Authorization` header value for HTTP basic auth.
pub fn basic_auth(username: &str, password: &str) -> String {
    let token = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {token}")
}

/// Decode a response body as an envelope.
///
/// The server answers some refusals with a non-2xx status and a regular
/// envelope, so the body is tried first and the status only matters when
/// the body is not an envelope.
fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> InventoryResult<Envelope<T>> {
    match serde_json::from_slice::<Envelope<T>>(body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !status.is_success() => Err(InventoryError::Status(status)),
        Err(e) => Err(InventoryError::Decode(e.to_string())),
    }
}

/// Flatten an error and its sources into one message.
fn transport(err: impl std::error::Error) -> InventoryError {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    InventoryError::Transport(msg)
}
