//! The per-user credential: a Spotify access token carried in an HttpOnly
//! cookie and handed to each handler through its request.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::error::AppError;
use crate::spotify::TokenGrant;

pub const ACCESS_TOKEN_COOKIE: &str = "spotify_access_token";

/// Access token plus the instant Spotify stops honouring it.
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: String,
    pub expires_at: OffsetDateTime,
}

impl Credential {
    pub fn issue(grant: TokenGrant, now: OffsetDateTime) -> Self {
        let lifetime = Duration::seconds(i64::try_from(grant.expires_in).unwrap_or(i64::MAX));
        Self {
            access_token: grant.access_token,
            expires_at: now.saturating_add(lifetime),
        }
    }

    /// Cookie that lives exactly as long as the token has left at `now`.
    pub fn into_cookie(self, secure: bool, now: OffsetDateTime) -> Cookie<'static> {
        let max_age = (self.expires_at - now).max(Duration::ZERO);
        Cookie::build((ACCESS_TOKEN_COOKIE, self.access_token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure)
            .max_age(max_age)
            .build()
    }
}

/// Bearer token read from the credential cookie. Rejects with
/// [`AppError::Unauthenticated`] when the cookie is absent.
#[derive(Debug, Clone)]
pub struct AccessToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AccessToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        CookieJar::from_headers(&parts.headers)
            .get(ACCESS_TOKEN_COOKIE)
            .map(Cookie::value)
            .filter(|v| !v.is_empty())
            .map(|v| AccessToken(v.to_string()))
            .ok_or_else(|| {
                debug!("no {} cookie on request", ACCESS_TOKEN_COOKIE);
                AppError::Unauthenticated
            })
    }
}
