//! HTTP handlers for the listening dashboard API.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;

use crate::aggregate::{self, TOP_GENRES};
use crate::error::AppError;
use crate::metrics::{AudioProfile, MetricsSnapshot};
use crate::session::{AccessToken, Credential};
use crate::spotify::{SpotifyClient, SpotifyError, TimeWindow};

/// Tracks sampled for the audio-features profile.
const FEATURE_SAMPLE_SIZE: u32 = 20;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub spotify: SpotifyClient,
    /// Where the browser goes once logged in.
    pub app_url: String,
    pub secure_cookies: bool,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: ProfileSummary,
}

#[derive(Debug, Serialize)]
pub struct ProfileSummary {
    pub name: Option<String>,
    pub country: Option<String>,
    pub followers: Option<u64>,
    pub image: Option<String>,
}

/// GET /health - Health check.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /login - Send the browser to the Spotify consent page.
pub async fn login(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.spotify.authorize_url())
}

/// GET /callback - Exchange the authorization code and set the credential cookie.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Result<(CookieJar, Redirect), AppError> {
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("No code provided".into()))?;

    let grant = state
        .spotify
        .exchange_code(&code)
        .await
        .map_err(|e| match e {
            SpotifyError::Status { status, body } => AppError::UpstreamAuth { status, body },
            other => AppError::Spotify(other.to_string()),
        })?;

    let now = OffsetDateTime::now_utc();
    let credential = Credential::issue(grant, now);
    info!(expires_at = %credential.expires_at, "user logged in");

    let jar = jar.add(credential.into_cookie(state.secure_cookies, now));
    Ok((jar, Redirect::to(&state.app_url)))
}

/// GET /profile - The logged-in user's public profile.
pub async fn profile(
    State(state): State<AppState>,
    AccessToken(token): AccessToken,
) -> Result<Json<ProfileResponse>, AppError> {
    let me = state.spotify.current_user(&token).await?;
    Ok(Json(ProfileResponse {
        profile: ProfileSummary {
            name: me.display_name,
            country: me.country,
            followers: me.followers.and_then(|f| f.total),
            image: me.images.into_iter().next().and_then(|i| i.url),
        },
    }))
}

/// GET /top-artists-by-time
pub async fn top_artists_by_time(
    State(state): State<AppState>,
    AccessToken(token): AccessToken,
) -> Result<impl IntoResponse, AppError> {
    let artists = aggregate::top_artists_by_window(&state.spotify, &token).await?;
    Ok(Json(artists))
}

/// GET /top-tracks-by-time
pub async fn top_tracks_by_time(
    State(state): State<AppState>,
    AccessToken(token): AccessToken,
) -> Result<impl IntoResponse, AppError> {
    let tracks = aggregate::top_tracks_by_window(&state.spotify, &token).await?;
    Ok(Json(tracks))
}

/// GET /top-genres-by-time - Top ten genres per window by share of tags.
pub async fn top_genres_by_time(
    State(state): State<AppState>,
    AccessToken(token): AccessToken,
) -> Result<impl IntoResponse, AppError> {
    let tallies = aggregate::genre_tallies_by_window(&state.spotify, &token).await?;
    Ok(Json(tallies.map(|t| t.rank(TOP_GENRES))))
}

/// GET /features-profile - Mean energy, valence and tempo of the top tracks.
pub async fn features_profile(
    State(state): State<AppState>,
    AccessToken(token): AccessToken,
) -> Result<Json<AudioProfile>, AppError> {
    let tracks = state
        .spotify
        .top_tracks(&token, TimeWindow::Medium, FEATURE_SAMPLE_SIZE)
        .await?;
    let ids: Vec<String> = tracks.into_iter().filter_map(|t| t.id).collect();

    let features = state.spotify.audio_features(&token, &ids).await?;

    AudioProfile::average(&features)
        .map(Json)
        .ok_or_else(|| AppError::NoValidData("No valid audio features found".into()))
}

/// GET /listening-profile - Derived metrics and listening type.
pub async fn listening_profile(
    State(state): State<AppState>,
    AccessToken(token): AccessToken,
) -> Result<Json<MetricsSnapshot>, AppError> {
    let (artists, genres) = tokio::try_join!(
        aggregate::top_artists_by_window(&state.spotify, &token),
        aggregate::genre_tallies_by_window(&state.spotify, &token),
    )?;
    Ok(Json(MetricsSnapshot::compute(&artists, &genres)))
}

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/profile", get(profile))
        .route("/top-artists-by-time", get(top_artists_by_time))
        .route("/top-genres-by-time", get(top_genres_by_time))
        .route("/top-tracks-by-time", get(top_tracks_by_time))
        .route("/features-profile", get(features_profile))
        .route("/listening-profile", get(listening_profile))
}
