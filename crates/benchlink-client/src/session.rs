//! Authenticated session handle
//!
//! A [`Session`] bundles the server base URL with the token obtained at login.
//! It is cheap to clone and carries no live connection; the HTTP connection
//! pool lives in [`crate::RemoteJobClient`].

/// Connection parameters for an authenticated play-server session.
#[derive(Debug, Clone)]
pub struct Session {
    base_url: String,
    token: String,
}

impl Session {
    /// Build a session against `https://{host}:{port}/api`.
    #[must_use]
    pub fn new(host: &str, port: u16, token: impl Into<String>) -> Self {
        Self {
            base_url: format!("https://{host}:{port}/api"),
            token: token.into(),
        }
    }

    /// Build a session from a full base URL, trailing slash stripped.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            token: token.into(),
        }
    }

    /// Absolute URL for a path relative to the API root.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// The session token, sent verbatim as the `Authorization` header.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}
