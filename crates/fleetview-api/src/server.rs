// Server and session endpoints
//
// Session login, server settings (which carry the geocoder switch), the
// built-in reverse geocoder and the dashboard counters.

use reqwest::header::ACCEPT;
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::auth::Credentials;
use crate::client::{TrackingClient, check_status, decode_json};
use crate::error::Error;
use crate::models::{DashboardStats, ServerInfo};

impl TrackingClient {
    /// Establish whatever session the configured credentials need.
    ///
    /// Session credentials log in via `POST /api/session`; token
    /// credentials are already attached to every request, so this is a
    /// no-op for them (and for clients built with [`with_client`](Self::with_client)).
    pub async fn authenticate(&self) -> Result<(), Error> {
        match self.credentials() {
            Some(Credentials::Session { email, password }) => {
                self.login(email, password.expose_secret()).await
            }
            Some(Credentials::Token(_)) | None => Ok(()),
        }
    }

    /// Log in with email and password.
    ///
    /// `POST /api/session` with a form body. The session cookie lands in
    /// the client's cookie jar.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), Error> {
        let url = self.api_url("session")?;
        debug!("logging in at {}", url);

        let resp = self
            .http()
            .post(url)
            .form(&[("email", email), ("password", password)])
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", body.trim()),
            });
        }

        info!(email, "session established");
        Ok(())
    }

    /// Server settings.
    ///
    /// `GET /api/server`
    pub async fn server_info(&self) -> Result<ServerInfo, Error> {
        self.get_json("server", &[]).await
    }

    /// Reverse-geocode a coordinate with the server's own geocoder.
    ///
    /// `GET /api/server/geocode?latitude={lat}&longitude={lon}`, plain-text body.
    pub async fn server_geocode(&self, latitude: f64, longitude: f64) -> Result<String, Error> {
        self.get_text(
            "server/geocode",
            &[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
            ],
        )
        .await
    }

    /// Fleet dashboard counters.
    ///
    /// `GET /api/dashboard`
    pub async fn dashboard(&self) -> Result<DashboardStats, Error> {
        let url = self.api_url("dashboard")?;
        debug!("GET {}", url);
        let resp = self.http().get(url).header(ACCEPT, "application/json").send().await?;
        let body = check_status(resp).await?.text().await?;
        // Some server builds answer an empty body when there is nothing to count.
        if body.trim().is_empty() {
            return Ok(DashboardStats::default());
        }
        decode_json(body)
    }
}
