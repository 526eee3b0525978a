use crate::error::{ApidError, ErrorCode};
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported url scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("url '{0}' has no host")]
    MissingHost(String),

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] http::Error),

    #[error("dns lookup for {host} failed: {source}")]
    Dns {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no addresses found for {0}")]
    NoAddress(String),

    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("tls setup failed: {0}")]
    TlsConfig(#[source] native_tls::Error),

    #[error("tls handshake with {host} failed: {source}")]
    Tls {
        host: String,
        #[source]
        source: native_tls::Error,
    },

    #[error("http exchange failed: {0}")]
    Protocol(#[from] hyper::Error),
}

impl HttpError {
    pub fn is_tls(&self) -> bool {
        matches!(self, HttpError::Tls { .. } | HttpError::TlsConfig(_))
    }
}

impl From<HttpError> for ApidError {
    fn from(err: HttpError) -> Self {
        let code = match &err {
            HttpError::InvalidUrl { .. }
            | HttpError::UnsupportedScheme(_)
            | HttpError::MissingHost(_)
            | HttpError::InvalidRequest(_) => ErrorCode::HTTP_INVALID_REQUEST,
            HttpError::Dns { .. } | HttpError::NoAddress(_) => ErrorCode::HTTP_DNS_FAILED,
            HttpError::Connect { .. } => ErrorCode::HTTP_CONNECT_FAILED,
            HttpError::TlsConfig(_) | HttpError::Tls { .. } => ErrorCode::HTTP_TLS_FAILED,
            HttpError::Protocol(_) => ErrorCode::HTTP_PROTOCOL_ERROR,
        };

        ApidError::http_with_code(code, err.to_string()).with_source(err)
    }
}
