//! Per-window top-item feeds, reshaped for the dashboard.
//!
//! All three windows are always fetched together and concurrently. A window
//! whose upstream call fails comes back empty without failing its siblings;
//! only a rejected token aborts the whole aggregate.

use std::collections::HashMap;
use std::future::Future;

use serde::Serialize;
use tracing::warn;

use crate::error::AppError;
use crate::spotify::{Artist, SpotifyClient, SpotifyError, TimeWindow, Track};

/// Artist sample the genre tally is taken over.
pub const GENRE_SAMPLE_SIZE: u32 = 20;
/// Number of genres kept per window after ranking.
pub const TOP_GENRES: usize = 10;
/// Items requested per window for the artist and track feeds.
pub const FEED_LIMIT: u32 = 50;

/// One value per lookback window, serialised under the upstream window names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ByWindow<T> {
    pub short_term: T,
    pub medium_term: T,
    pub long_term: T,
}

impl<T> ByWindow<T> {
    pub fn get(&self, window: TimeWindow) -> &T {
        match window {
            TimeWindow::Short => &self.short_term,
            TimeWindow::Medium => &self.medium_term,
            TimeWindow::Long => &self.long_term,
        }
    }

    pub fn map<U, F>(self, mut f: F) -> ByWindow<U>
    where
        F: FnMut(T) -> U,
    {
        ByWindow {
            short_term: f(self.short_term),
            medium_term: f(self.medium_term),
            long_term: f(self.long_term),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSummary {
    pub name: String,
    pub image: Option<String>,
    pub genres: Vec<String>,
    pub spotify_url: Option<String>,
}

impl From<Artist> for ArtistSummary {
    fn from(a: Artist) -> Self {
        Self {
            name: a.name,
            image: a.images.into_iter().next().and_then(|i| i.url),
            genres: a.genres,
            spotify_url: a.external_urls.spotify,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub name: String,
    /// Artist names joined with `", "`.
    pub artists: String,
    pub album: String,
    pub image: Option<String>,
    pub spotify_url: Option<String>,
}

impl From<Track> for TrackSummary {
    fn from(t: Track) -> Self {
        Self {
            artists: t
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            image: t.album.images.into_iter().next().and_then(|i| i.url),
            album: t.album.name,
            name: t.name,
            spotify_url: t.external_urls.spotify,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreRank {
    pub genre: String,
    /// Share of all genre tags in the sample, 0-100.
    pub percent: u32,
}

/// Genre occurrence counts across an artist sample, in first-seen order.
///
/// An artist contributes one count to each genre it is tagged with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenreTally {
    counts: Vec<(String, u32)>,
}

impl GenreTally {
    pub fn from_artists<'a, I>(artists: I) -> Self
    where
        I: IntoIterator<Item = &'a Artist>,
    {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut counts: Vec<(String, u32)> = Vec::new();
        for genre in artists.into_iter().flat_map(|a| a.genres.iter()) {
            match index.get(genre.as_str()) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(genre.as_str(), counts.len());
                    counts.push((genre.clone(), 1));
                }
            }
        }
        Self { counts }
    }

    /// Number of distinct genres seen.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Total tag occurrences (not the artist count).
    pub fn total(&self) -> u32 {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    /// Genres by descending share, truncated to `top`. Equal counts keep
    /// first-seen order. An empty tally ranks to nothing.
    ///
    /// Shares are rounded to the nearest percent; whatever rounding pushes
    /// past 100 is taken back one point at a time from the lowest-ranked
    /// genres, so a window never sums to more than 100.
    pub fn rank(&self, top: usize) -> Vec<GenreRank> {
        let total = self.total();
        if total == 0 {
            return Vec::new();
        }
        let mut sorted: Vec<&(String, u32)> = self.counts.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));

        let mut ranked: Vec<GenreRank> = sorted
            .into_iter()
            .map(|(genre, count)| GenreRank {
                genre: genre.clone(),
                percent: (100.0 * f64::from(*count) / f64::from(total)).round() as u32,
            })
            .collect();

        let mut surplus = ranked.iter().map(|g| g.percent).sum::<u32>().saturating_sub(100);
        for g in ranked.iter_mut().rev() {
            if surplus == 0 {
                break;
            }
            if g.percent > 0 {
                g.percent -= 1;
                surplus -= 1;
            }
        }

        ranked.truncate(top);
        ranked
    }
}

/// Collapses one window's outcome: a rejected token aborts, anything else
/// degrades to an empty list.
fn settle<T>(window: TimeWindow, result: Result<Vec<T>, SpotifyError>) -> Result<Vec<T>, AppError> {
    match result {
        Ok(items) => Ok(items),
        Err(SpotifyError::Unauthorized) => Err(AppError::SessionExpired),
        Err(e) => {
            warn!(%window, "window degraded to empty: {}", e);
            Ok(Vec::new())
        }
    }
}

async fn fetch_windows<T, F, Fut>(fetch: F) -> Result<ByWindow<Vec<T>>, AppError>
where
    F: Fn(TimeWindow) -> Fut,
    Fut: Future<Output = Result<Vec<T>, SpotifyError>>,
{
    let (short, medium, long) = tokio::join!(
        fetch(TimeWindow::Short),
        fetch(TimeWindow::Medium),
        fetch(TimeWindow::Long),
    );
    Ok(ByWindow {
        short_term: settle(TimeWindow::Short, short)?,
        medium_term: settle(TimeWindow::Medium, medium)?,
        long_term: settle(TimeWindow::Long, long)?,
    })
}

pub async fn top_artists_by_window(
    spotify: &SpotifyClient,
    token: &str,
) -> Result<ByWindow<Vec<ArtistSummary>>, AppError> {
    let raw = fetch_windows(move |w| spotify.top_artists(token, w, FEED_LIMIT)).await?;
    Ok(raw.map(|artists| artists.into_iter().map(ArtistSummary::from).collect()))
}

pub async fn top_tracks_by_window(
    spotify: &SpotifyClient,
    token: &str,
) -> Result<ByWindow<Vec<TrackSummary>>, AppError> {
    let raw = fetch_windows(move |w| spotify.top_tracks(token, w, FEED_LIMIT)).await?;
    Ok(raw.map(|tracks| tracks.into_iter().map(TrackSummary::from).collect()))
}

pub async fn genre_tallies_by_window(
    spotify: &SpotifyClient,
    token: &str,
) -> Result<ByWindow<GenreTally>, AppError> {
    let raw = fetch_windows(move |w| spotify.top_artists(token, w, GENRE_SAMPLE_SIZE)).await?;
    Ok(raw.map(|artists| GenreTally::from_artists(&artists)))
}
