// Tracking server HTTP client
//
// Wraps `reqwest::Client` with server-specific URL construction, status
// mapping, and JSON / text decoding. Endpoint groups (devices, positions,
// reports, server) are implemented as inherent methods in separate files
// to keep this module focused on transport mechanics.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest body excerpt carried in error messages.
const BODY_PREVIEW_CHARS: usize = 200;

/// Raw HTTP client for a tracking server's `/api` surface.
///
/// All methods return decoded wire types from [`crate::models`]; the
/// domain conversion happens in `fleetview-core`.
pub struct TrackingClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Option<Credentials>,
    /// Cookie jar reference for extracting the session cookie (socket auth).
    cookie_jar: Option<Arc<Jar>>,
}

impl TrackingClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// Token credentials become a default `Authorization` header; session
    /// credentials get a cookie jar (created if the config lacks one) and
    /// require a call to [`authenticate`](Self::authenticate).
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if credentials.needs_cookie_jar() && transport.cookie_jar.is_none() {
            transport.clone().with_cookie_jar()
        } else {
            transport.clone()
        };
        let cookie_jar = config.cookie_jar.clone();

        let http = match &credentials {
            Credentials::Token(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                    .map_err(|_| Error::Authentication {
                        message: "API token contains characters not allowed in a header".into(),
                    })?;
                value.set_sensitive(true);
                let mut headers = HeaderMap::new();
                headers.insert(AUTHORIZATION, value);
                config.build_client_with_headers(headers)?
            }
            Credentials::Session { .. } => config.build_client()?,
        };

        Ok(Self {
            http,
            base_url,
            credentials: Some(credentials),
            cookie_jar,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Use this when authentication is already handled by the client
    /// (or not needed, as in tests against a mock server).
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            credentials: None,
            cookie_jar: None,
        }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The credentials this client was built with, if any.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Extract the session cookie header value for socket auth.
    pub fn cookie_header(&self) -> Option<String> {
        let jar = self.cookie_jar.as_ref()?;
        let cookies = jar.cookies(&self.base_url)?;
        cookies.to_str().ok().map(String::from)
    }

    /// The push socket URL: `ws(s)://{host}/api/socket`.
    pub fn socket_url(&self) -> Result<Url, Error> {
        let mut url = self.api_url("socket")?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::SocketConnect(format!("cannot derive socket URL from {url}")))?;
        Ok(url)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request with query parameters and decode a JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(query)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let body = check_status(resp).await?.text().await?;

        decode_json(body)
    }

    /// Send a GET request and return the body as plain text.
    pub(crate) async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, Error> {
        let url = self.api_url(path)?;
        debug!("GET {}", url);

        let resp = self.http.get(url).query(query).send().await?;
        Ok(check_status(resp).await?.text().await?)
    }
}

/// Map HTTP status codes to crate errors, passing successful responses through.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "session expired or invalid credentials".into(),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            message: preview(&body),
        });
    }

    Ok(resp)
}

/// Decode a JSON body, keeping the raw text on failure.
pub(crate) fn decode_json<T: DeserializeOwned>(body: String) -> Result<T, Error> {
    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(e) => Err(Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        }),
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
