use super::error::HttpError;
use super::trace::{Timings, TraceHooks, TracedStream};
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONNECTION, HOST};
use http::{HeaderMap, Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use std::net::{IpAddr, SocketAddr};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_native_tls::TlsConnector;
use tracing::{debug, trace};
use url::Url;

/// Outgoing request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Accept any server certificate and host name
    pub skip_verify: bool,
}

impl Request {
    pub fn new(method: Method, url: &str) -> Result<Self, HttpError> {
        let url = Url::parse(url).map_err(|source| HttpError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            skip_verify: false,
        })
    }

    pub fn get(url: &str) -> Result<Self, HttpError> {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_skip_verify(mut self, skip_verify: bool) -> Self {
        self.skip_verify = skip_verify;
        self
    }
}

/// Fully read response together with its timing breakdown
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub timings: Timings,
}

impl Response {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: Request) -> Result<Response, HttpError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    Http,
    Https,
}

/// Connection coordinates extracted from a request URL
#[derive(Debug)]
struct Target {
    scheme: Scheme,
    host: String,
    ip: Option<IpAddr>,
    port: u16,
    authority: String,
    origin_form: String,
}

impl Target {
    fn from_url(url: &Url) -> Result<Self, HttpError> {
        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(HttpError::UnsupportedScheme(other.to_string())),
        };

        let (host, ip) = match url.host() {
            Some(url::Host::Domain(domain)) => (domain.to_string(), None),
            Some(url::Host::Ipv4(ip)) => (ip.to_string(), Some(IpAddr::V4(ip))),
            Some(url::Host::Ipv6(ip)) => (ip.to_string(), Some(IpAddr::V6(ip))),
            None => return Err(HttpError::MissingHost(url.to_string())),
        };

        let port = url
            .port_or_known_default()
            .ok_or_else(|| HttpError::MissingHost(url.to_string()))?;

        let host_str = url.host_str().unwrap_or(host.as_str());
        let authority = match url.port() {
            Some(port) => format!("{host_str}:{port}"),
            None => host_str.to_string(),
        };

        let mut origin_form = url.path().to_string();
        if let Some(query) = url.query() {
            origin_form.push('?');
            origin_form.push_str(query);
        }

        Ok(Self {
            scheme,
            host,
            ip,
            port,
            authority,
            origin_form,
        })
    }
}

/// HTTP/1.1 client measuring DNS, TCP, TLS, server and transfer phases
///
/// Connections are never pooled. Trace state lives in the call, so one
/// client can serve concurrent requests.
#[derive(Clone)]
pub struct TimedClient {
    verifying: TlsConnector,
    insecure: TlsConnector,
}

impl TimedClient {
    pub fn new() -> Result<Self, HttpError> {
        let verifying = native_tls::TlsConnector::new().map_err(HttpError::TlsConfig)?;
        let insecure = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(HttpError::TlsConfig)?;

        Ok(Self {
            verifying: verifying.into(),
            insecure: insecure.into(),
        })
    }

    fn connector(&self, skip_verify: bool) -> &TlsConnector {
        if skip_verify {
            &self.insecure
        } else {
            &self.verifying
        }
    }
}

#[async_trait]
impl HttpClient for TimedClient {
    async fn execute(&self, request: Request) -> Result<Response, HttpError> {
        let target = Target::from_url(&request.url)?;
        let hooks = TraceHooks::new();
        debug!("{} {}", request.method, request.url);

        let addrs = resolve(&target, &hooks).await?;
        let tcp = connect(&addrs, &hooks).await?;

        let response = match target.scheme {
            Scheme::Http => {
                exchange(TracedStream::new(tcp, hooks.clone()), &request, &target, &hooks).await?
            }
            Scheme::Https => {
                hooks.tls_start();
                let tls = self
                    .connector(request.skip_verify)
                    .connect(&target.host, tcp)
                    .await
                    .map_err(|source| HttpError::Tls {
                        host: target.host.clone(),
                        source,
                    })?;
                hooks.tls_done();
                exchange(TracedStream::new(tls, hooks.clone()), &request, &target, &hooks).await?
            }
        };

        debug!(
            "{} {} -> {} in {:?}",
            request.method,
            request.url,
            response.status,
            response.timings.total()
        );
        Ok(response)
    }
}

async fn resolve(target: &Target, hooks: &TraceHooks) -> Result<Vec<SocketAddr>, HttpError> {
    if let Some(ip) = target.ip {
        return Ok(vec![SocketAddr::new(ip, target.port)]);
    }

    hooks.dns_start();
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((target.host.as_str(), target.port))
        .await
        .map_err(|source| HttpError::Dns {
            host: target.host.clone(),
            source,
        })?
        .collect();
    hooks.dns_done();

    if addrs.is_empty() {
        return Err(HttpError::NoAddress(target.host.clone()));
    }
    trace!("resolved {} to {:?}", target.host, addrs);
    Ok(addrs)
}

/// Connect to the first reachable address
async fn connect(addrs: &[SocketAddr], hooks: &TraceHooks) -> Result<TcpStream, HttpError> {
    hooks.connect_start();
    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                hooks.connect_done();
                return Ok(stream);
            }
            Err(source) => {
                debug!("connect to {} failed: {}", addr, source);
                last_error = Some((*addr, source));
            }
        }
    }

    match last_error {
        Some((addr, source)) => Err(HttpError::Connect { addr, source }),
        None => Err(HttpError::NoAddress(String::new())),
    }
}

async fn exchange<S>(
    stream: S,
    request: &Request,
    target: &Target,
    hooks: &TraceHooks,
) -> Result<Response, HttpError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, connection) =
        hyper::client::conn::http1::handshake::<_, Full<Bytes>>(TokioIo::new(stream)).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            debug!("connection closed with error: {}", e);
        }
    });

    let outgoing = build_request(request, target)?;
    let response = sender.send_request(outgoing).await?;
    let (parts, body) = response.into_parts();
    let body = body.collect().await?.to_bytes();
    hooks.done();

    Ok(Response {
        status: parts.status,
        headers: parts.headers,
        body,
        timings: hooks.timings(),
    })
}

fn build_request(
    request: &Request,
    target: &Target,
) -> Result<http::Request<Full<Bytes>>, HttpError> {
    let mut builder = http::Request::builder()
        .method(request.method.clone())
        .uri(target.origin_form.as_str());
    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }
    let mut outgoing = builder.body(Full::new(request.body.clone()))?;

    let headers = outgoing.headers_mut();
    if !headers.contains_key(HOST) {
        let host = HeaderValue::from_str(&target.authority).map_err(http::Error::from)?;
        headers.insert(HOST, host);
    }
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    Ok(outgoing)
}
