//! Typed shapes of the Spotify Web API payloads this service reads.
//!
//! Every field the upstream may omit or null out is either `Option` or
//! defaulted, so a sparse payload still parses.

use std::fmt;

use serde::Deserialize;

/// Lookback window for the `me/top/*` endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    /// Roughly the last four weeks.
    Short,
    /// Roughly the last six months.
    Medium,
    /// Several years of history.
    Long,
}

impl TimeWindow {
    /// Value of the upstream `time_range` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::Short => "short_term",
            TimeWindow::Medium => "medium_term",
            TimeWindow::Long => "long_term",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of item served by `me/top/{kind}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopItemKind {
    Artists,
    Tracks,
}

impl TopItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TopItemKind::Artists => "artists",
            TopItemKind::Tracks => "tracks",
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

#[derive(Deserialize)]
pub(crate) struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Deserialize)]
pub(crate) struct AudioFeaturesResponse {
    #[serde(default)]
    pub audio_features: Vec<Option<AudioFeatures>>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct Image {
    pub url: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// A Spotify artist. Track payloads embed a simplified artist with no
/// genres or images, which parses into the same type.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct Artist {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct Album {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct Track {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub album: Album,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

/// Subset of `GET /v1/audio-features` used for averaging.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct AudioFeatures {
    pub energy: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct Followers {
    pub total: Option<u64>,
}

/// `GET /v1/me`
#[derive(Clone, Debug, Deserialize, Default)]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub followers: Option<Followers>,
    #[serde(default)]
    pub images: Vec<Image>,
}
