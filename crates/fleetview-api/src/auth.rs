use secrecy::SecretString;

/// Credentials for authenticating with a tracking server.
///
/// Each variant carries the secret material needed for its auth flow.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// API token sent as `Authorization: Bearer <token>` on every request.
    /// Generated in the server's user settings.
    Token(SecretString),

    /// Cookie-based session created by `POST /api/session`.
    /// The client keeps the session cookie in its jar after login.
    Session { email: String, password: SecretString },
}

impl Credentials {
    /// Whether this flow needs a cookie jar on the HTTP client.
    pub fn needs_cookie_jar(&self) -> bool {
        matches!(self, Self::Session { .. })
    }
}
