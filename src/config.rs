use std::env;

const DEFAULT_APP_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Application configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_redirect_uri: String,
    /// Public base URL the browser lands on after login.
    pub app_url: String,
    /// Whether the credential cookie carries the `Secure` attribute.
    pub secure_cookies: bool,
    pub spotify_accounts_url: String,
    pub spotify_api_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} is required", key))
        };

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let spotify_client_id = required("SPOTIFY_CLIENT_ID")?;
        let spotify_client_secret = required("SPOTIFY_CLIENT_SECRET")?;
        let spotify_redirect_uri = required("SPOTIFY_REDIRECT_URI")?;

        let app_url = lookup("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.into());

        let secure_cookies = lookup("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let spotify_accounts_url = lookup("SPOTIFY_ACCOUNTS_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.into());

        let spotify_api_url = lookup("SPOTIFY_API_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.into());

        Ok(Self {
            port,
            spotify_client_id,
            spotify_client_secret,
            spotify_redirect_uri,
            app_url,
            secure_cookies,
            spotify_accounts_url,
            spotify_api_url,
        })
    }
}
