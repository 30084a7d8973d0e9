//! Spotify Web API client.
//!
//! Uses the Authorization Code flow: the server exchanges a one-time code for
//! a user access token, and every catalog call is made with the token the
//! caller supplies. The client itself holds no per-user state.

mod models;

pub use models::*;

use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

const SCOPES: [&str; 3] = ["user-read-email", "user-top-read", "user-read-private"];

/// Failure talking to Spotify.
#[derive(Debug, thiserror::Error)]
pub enum SpotifyError {
    /// The access token was rejected (expired or revoked).
    #[error("access token rejected by Spotify")]
    Unauthorized,
    #[error("Spotify API error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("{context} failed: {source}")]
    Request {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Spotify API client.
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    accounts_url: String,
    api_url: String,
}

impl SpotifyClient {
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        accounts_url: String,
        api_url: String,
    ) -> Self {
        Self {
            client: Client::new(),
            client_id,
            client_secret,
            redirect_uri,
            accounts_url,
            api_url,
        }
    }

    /// URL of the consent page the browser is sent to on login.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}/authorize?client_id={}&response_type=code&redirect_uri={}&scope={}&show_dialog=true",
            self.accounts_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&SCOPES.join(" ")),
        )
    }

    /// Exchanges an authorization code for an access token.
    ///
    /// Any non-2xx answer surfaces as [`SpotifyError::Status`] carrying the
    /// upstream body, including 401 (bad client credentials are not a user
    /// session problem).
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, SpotifyError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        let auth = base64::engine::general_purpose::STANDARD.encode(
            format!("{}:{}", self.client_id, self.client_secret).as_bytes(),
        );

        let res = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .header("Authorization", format!("Basic {}", auth))
            .form(&params)
            .send()
            .await
            .map_err(|source| SpotifyError::Request {
                context: "token request",
                source,
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SpotifyError::Status { status, body });
        }

        let body: TokenResponse = res.json().await.map_err(|source| SpotifyError::Request {
            context: "token parse",
            source,
        })?;

        Ok(TokenGrant {
            access_token: body.access_token,
            expires_in: body.expires_in,
        })
    }

    /// `GET /me`
    pub async fn current_user(&self, token: &str) -> Result<UserProfile, SpotifyError> {
        let url = format!("{}/me", self.api_url);
        self.get_json(token, &url, "profile request").await
    }

    /// `GET /me/top/{kind}` for one window.
    async fn top_items<T: DeserializeOwned>(
        &self,
        token: &str,
        kind: TopItemKind,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<T>, SpotifyError> {
        let limit = limit.clamp(1, 50);
        let url = format!(
            "{}/me/top/{}?time_range={}&limit={}",
            self.api_url,
            kind.as_str(),
            window.as_str(),
            limit,
        );
        let page: Paging<T> = self.get_json(token, &url, "top items request").await?;
        Ok(page.items)
    }

    pub async fn top_artists(
        &self,
        token: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<Artist>, SpotifyError> {
        self.top_items(token, TopItemKind::Artists, window, limit).await
    }

    pub async fn top_tracks(
        &self,
        token: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError> {
        self.top_items(token, TopItemKind::Tracks, window, limit).await
    }

    /// Fetch audio features for up to 100 track IDs in one call. Entries are
    /// `None` where Spotify has no analysis for the track.
    pub async fn audio_features(
        &self,
        token: &str,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, SpotifyError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<_> = ids.iter().take(100).cloned().collect();
        // Spotify IDs are base62, so the list goes on the wire unescaped.
        let url = format!("{}/audio-features?ids={}", self.api_url, ids.join(","));

        let body: AudioFeaturesResponse = self.get_json(token, &url, "audio-features request").await?;
        Ok(body.audio_features)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        url: &str,
        context: &'static str,
    ) -> Result<T, SpotifyError> {
        let res = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|source| SpotifyError::Request { context, source })?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SpotifyError::Unauthorized);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SpotifyError::Status { status, body });
        }

        res.json()
            .await
            .map_err(|source| SpotifyError::Request { context, source })
    }
}

/// Result of a successful code exchange.
#[derive(Clone, Debug)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime of the token in seconds.
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SpotifyClient {
        SpotifyClient::new(
            "my id".into(),
            "secret".into(),
            "http://127.0.0.1:3000/callback".into(),
            "https://accounts.example".into(),
            "https://api.example/v1".into(),
        )
    }

    #[test]
    fn authorize_url_encodes_parameters() {
        let url = client().authorize_url();
        assert!(url.starts_with("https://accounts.example/authorize?"));
        assert!(url.contains("client_id=my%20id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A3000%2Fcallback"));
        assert!(url.contains("scope=user-read-email%20user-top-read%20user-read-private"));
        assert!(url.ends_with("show_dialog=true"));
    }

    #[tokio::test]
    async fn audio_features_for_no_ids_skips_the_request() {
        let features = client().audio_features("token", &[]).await.unwrap();
        assert!(features.is_empty());
    }
}
