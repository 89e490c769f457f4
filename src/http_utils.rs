//! HTTP utilities shared by the API families.
//!
//! Every family talks to its server through a [`HttpClient`] built from a
//! [`HttpRequestConfig`]. Certificate validation can be switched off for one
//! client; the setting never leaves that client.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client, RequestBuilder, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace, warn};
use url::Url;

pub const DEFAULT_USER_AGENT: &str = concat!("adminctl/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx response; the message is the server's error text or the status reason.
    #[error("{message}")]
    Http { status: StatusCode, message: String },
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("invalid server address '{server}': {source}")]
    InvalidServer {
        server: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("server address {0} cannot take a path")]
    InvalidPath(String),
    #[error("login succeeded but the response carried no session token")]
    MissingToken,
    #[error("stopped after {0} pages while the server still reported more")]
    PageLimitExceeded(u32),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// 401 or 403: the token is stale or the credential was rejected.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// Configuration for one HTTP client.
#[derive(Debug, Clone)]
pub struct HttpRequestConfig {
    /// Headers sent with every request.
    pub default_headers: HashMap<String, String>,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Accept any server certificate. Applies to this client only.
    pub accept_invalid_certificates: bool,
}

impl Default for HttpRequestConfig {
    fn default() -> Self {
        Self {
            default_headers: HashMap::new(),
            timeout: crate::configuration::DEFAULT_TIMEOUT_SECONDS,
            accept_invalid_certificates: false,
        }
    }
}

impl HttpRequestConfig {
    pub fn from_configuration(configuration: &crate::configuration::Configuration) -> Self {
        Self {
            timeout: configuration.timeout_seconds(),
            ..Self::default()
        }
    }

    pub fn accept_invalid_certificates(mut self, accept: bool) -> Self {
        self.accept_invalid_certificates = accept;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .insert(name.to_string(), value.to_string());
        self
    }
}

/// A reqwest client bound to one server.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    config: HttpRequestConfig,
}

impl HttpClient {
    pub fn new(server: &str, config: HttpRequestConfig) -> Result<Self, ApiError> {
        let base_url = server_url(server)?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidHeader(name.clone()))?;
            let value =
                HeaderValue::from_str(value).map_err(|_| ApiError::InvalidHeader(name.as_str().to_string()))?;
            headers.insert(name, value);
        }

        if config.accept_invalid_certificates {
            warn!(
                "Certificate validation is disabled for connections to {}",
                base_url
            );
        }

        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout))
            .danger_accept_invalid_certs(config.accept_invalid_certificates)
            .build()?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    pub fn config(&self) -> &HttpRequestConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Absolute URL for a path such as `/api/session`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Absolute URL for a path given as segments. Each segment is
    /// percent-encoded, so ids may contain `/`, `?` or `#`.
    pub fn segment_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidPath(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn get_segments(&self, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.segment_url(segments)?;
        trace!("GET {}", url);
        Ok(self.client.get(url))
    }

    pub fn post_segments(&self, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.segment_url(segments)?;
        trace!("POST {}", url);
        Ok(self.client.post(url))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        trace!("GET {}", url);
        self.client.get(url)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        trace!("POST {}", url);
        self.client.post(url)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        trace!("DELETE {}", url);
        self.client.delete(url)
    }
}

/// Parse a server name or URL. Bare host names default to HTTPS.
pub fn server_url(server: &str) -> Result<Url, ApiError> {
    let server = server.trim();
    let candidate = if server.contains("://") {
        server.to_string()
    } else {
        format!("https://{}", server)
    };
    Url::parse(&candidate).map_err(|source| ApiError::InvalidServer {
        server: server.to_string(),
        source,
    })
}

/// Pass a 2xx response through; turn anything else into [`ApiError::Http`].
pub async fn check_response(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    debug!("Response status: {}", status);
    if status.is_success() {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to read error response body: {}", e);
            String::new()
        }
    };
    Err(ApiError::Http {
        status,
        message: error_message(status, &body),
    })
}

/// Send a request and decode a JSON body.
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
    let response = check_response(request.send().await?).await?;
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

/// Best human-readable text from an error body.
///
/// Knows the vault shape (`ErrorMessage`), the virtualization shape
/// (`messages[].default_message`) and the cloud XML `Error` element's
/// `message` attribute; anything else is returned as-is.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status
            .canonical_reason()
            .map(|reason| format!("{} {}", status.as_u16(), reason))
            .unwrap_or_else(|| status.to_string());
    }

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(message) = json.get("ErrorMessage").and_then(Value::as_str) {
            return message.to_string();
        }
        if let Some(message) = json
            .get("messages")
            .and_then(|m| m.get(0))
            .and_then(|m| m.get("default_message"))
            .and_then(Value::as_str)
        {
            return message.to_string();
        }
        if let Some(message) = json.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }

    if body.starts_with('<') {
        if let Some(message) = xml_error_message(body) {
            return message;
        }
    }

    body.to_string()
}

fn xml_error_message(body: &str) -> Option<String> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_str(body);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"Error" => {
                let attr = e.try_get_attribute("message").ok().flatten()?;
                return attr.unescape_value().ok().map(|v| v.into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}
