//! Listening-profile metrics. Everything here is a pure function of data
//! that has already been fetched.

use std::collections::HashSet;

use serde::Serialize;

use crate::aggregate::{ArtistSummary, ByWindow, GenreTally, GENRE_SAMPLE_SIZE, TOP_GENRES};
use crate::spotify::{AudioFeatures, TimeWindow};

/// Rounds to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Share of the top-artist list held by its first three entries.
pub fn artist_concentration(artist_count: usize) -> f64 {
    let top = artist_count.min(3) as f64;
    round2(top / artist_count.max(1) as f64)
}

/// Distinct genres as a fraction of the genre sample ceiling, capped at 1.
pub fn genre_diversity(distinct_genres: usize) -> f64 {
    round2((distinct_genres as f64 / f64::from(GENRE_SAMPLE_SIZE)).min(1.0))
}

/// `|a ∩ b| / max(|a|, 1)`, with exact string matching. Duplicates in `a`
/// count once per occurrence.
pub fn overlap_ratio<'a, A, B>(a: A, b: B) -> f64
where
    A: IntoIterator<Item = &'a str>,
    B: IntoIterator<Item = &'a str>,
{
    let b: HashSet<&str> = b.into_iter().collect();
    let mut len = 0usize;
    let mut shared = 0usize;
    for item in a {
        len += 1;
        if b.contains(item) {
            shared += 1;
        }
    }
    round2(shared as f64 / len.max(1) as f64)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ListeningType {
    #[serde(rename = "Focused Listener")]
    Focused,
    #[serde(rename = "Explorer")]
    Explorer,
    #[serde(rename = "Balanced Listener")]
    Balanced,
}

impl ListeningType {
    /// First matching rule wins.
    pub fn classify(artist_concentration: f64, genre_diversity: f64) -> Self {
        if artist_concentration > 0.6 && genre_diversity < 0.5 {
            ListeningType::Focused
        } else if artist_concentration < 0.4 && genre_diversity > 0.6 {
            ListeningType::Explorer
        } else {
            ListeningType::Balanced
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub artist_concentration: f64,
    pub genre_diversity: f64,
    pub artist_stability: f64,
    pub genre_stability: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub listening_type: ListeningType,
    pub metrics: Metrics,
}

impl MetricsSnapshot {
    /// Concentration and diversity look at the short window only; stability
    /// compares short against long. Genre stability uses the ranked top
    /// genres, diversity the full distinct count of the sample.
    pub fn compute(artists: &ByWindow<Vec<ArtistSummary>>, genres: &ByWindow<GenreTally>) -> Self {
        let short_artists = artists.get(TimeWindow::Short);
        let long_artists = artists.get(TimeWindow::Long);
        let short_genres = genres.get(TimeWindow::Short).rank(TOP_GENRES);
        let long_genres = genres.get(TimeWindow::Long).rank(TOP_GENRES);

        let artist_concentration = artist_concentration(short_artists.len());
        let genre_diversity = genre_diversity(genres.get(TimeWindow::Short).distinct());
        let artist_stability = overlap_ratio(
            short_artists.iter().map(|a| a.name.as_str()),
            long_artists.iter().map(|a| a.name.as_str()),
        );
        let genre_stability = overlap_ratio(
            short_genres.iter().map(|g| g.genre.as_str()),
            long_genres.iter().map(|g| g.genre.as_str()),
        );

        Self {
            listening_type: ListeningType::classify(artist_concentration, genre_diversity),
            metrics: Metrics {
                artist_concentration,
                genre_diversity,
                artist_stability,
                genre_stability,
            },
        }
    }
}

/// Mean audio characteristics of a track sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioProfile {
    pub tracks_analyzed: usize,
    pub energy: f64,
    pub valence: f64,
    pub tempo: f64,
}

impl AudioProfile {
    /// Averages over entries that exist and carry an energy value. A missing
    /// valence or tempo on such an entry counts as zero. `None` when no entry
    /// qualifies.
    pub fn average(features: &[Option<AudioFeatures>]) -> Option<Self> {
        let valid: Vec<&AudioFeatures> = features
            .iter()
            .flatten()
            .filter(|f| f.energy.is_some())
            .collect();
        if valid.is_empty() {
            return None;
        }

        let n = valid.len() as f64;
        let mean = |field: fn(&AudioFeatures) -> Option<f64>| {
            valid.iter().map(|f| field(f).unwrap_or(0.0)).sum::<f64>() / n
        };

        Some(Self {
            tracks_analyzed: valid.len(),
            energy: mean(|f| f.energy),
            valence: mean(|f| f.valence),
            tempo: mean(|f| f.tempo),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::Artist;

    #[test]
    fn concentration_by_list_size() {
        assert_eq!(artist_concentration(0), 0.0);
        assert_eq!(artist_concentration(1), 1.0);
        assert_eq!(artist_concentration(2), 1.0);
        assert_eq!(artist_concentration(3), 1.0);
        assert_eq!(artist_concentration(4), 0.75);
        assert_eq!(artist_concentration(50), 0.06);
    }

    #[test]
    fn diversity_over_twenty_slots() {
        assert_eq!(genre_diversity(0), 0.0);
        assert_eq!(genre_diversity(7), 0.35);
        assert_eq!(genre_diversity(20), 1.0);
        assert_eq!(genre_diversity(34), 1.0);
    }

    #[test]
    fn overlap_uses_left_side_as_denominator() {
        assert_eq!(overlap_ratio(["a", "b", "c"], ["b", "c"]), 0.67);
        assert_eq!(overlap_ratio(["b", "c"], ["a", "b", "c"]), 1.0);
        assert_eq!(overlap_ratio(Vec::<&str>::new(), ["a"]), 0.0);
        assert_eq!(overlap_ratio(["Rock"], ["rock"]), 0.0);
    }

    #[test]
    fn classification_table() {
        assert_eq!(ListeningType::classify(0.8, 0.2), ListeningType::Focused);
        assert_eq!(ListeningType::classify(0.2, 0.8), ListeningType::Explorer);
        assert_eq!(ListeningType::classify(0.5, 0.5), ListeningType::Balanced);
        assert_eq!(ListeningType::classify(0.6, 0.2), ListeningType::Balanced);
        assert_eq!(ListeningType::classify(0.4, 0.9), ListeningType::Balanced);
    }

    #[test]
    fn listening_type_serialises_as_label() {
        assert_eq!(
            serde_json::to_value(ListeningType::Focused).unwrap(),
            "Focused Listener"
        );
    }

    fn summary(name: &str) -> ArtistSummary {
        ArtistSummary {
            name: name.into(),
            image: None,
            genres: vec![],
            spotify_url: None,
        }
    }

    fn tally(genres: &[&[&str]]) -> GenreTally {
        let artists: Vec<Artist> = genres
            .iter()
            .map(|g| Artist {
                genres: g.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            })
            .collect();
        GenreTally::from_artists(&artists)
    }

    #[test]
    fn snapshot_from_windows() {
        let artists = ByWindow {
            short_term: vec![summary("A"), summary("B"), summary("C"), summary("D")],
            medium_term: vec![],
            long_term: vec![summary("B"), summary("D"), summary("E")],
        };
        let genres = ByWindow {
            short_term: tally(&[&["rock", "pop"], &["rock"]]),
            medium_term: GenreTally::default(),
            long_term: tally(&[&["rock"]]),
        };

        let snapshot = MetricsSnapshot::compute(&artists, &genres);
        assert_eq!(
            snapshot.metrics,
            Metrics {
                artist_concentration: 0.75,
                genre_diversity: 0.1,
                artist_stability: 0.5,
                genre_stability: 0.5,
            }
        );
        assert_eq!(snapshot.listening_type, ListeningType::Focused);

        // Pure recomputation.
        assert_eq!(MetricsSnapshot::compute(&artists, &genres), snapshot);
    }

    #[test]
    fn snapshot_of_empty_history_is_balanced_zero() {
        let snapshot = MetricsSnapshot::compute(&ByWindow::default(), &ByWindow::default());
        assert_eq!(snapshot.metrics.artist_concentration, 0.0);
        assert_eq!(snapshot.metrics.genre_diversity, 0.0);
        assert_eq!(snapshot.metrics.artist_stability, 0.0);
        assert_eq!(snapshot.listening_type, ListeningType::Balanced);
    }

    fn features(energy: Option<f64>, valence: Option<f64>, tempo: Option<f64>) -> Option<AudioFeatures> {
        Some(AudioFeatures {
            energy,
            valence,
            tempo,
        })
    }

    #[test]
    fn averages_only_entries_with_energy() {
        let profile = AudioProfile::average(&[
            features(Some(0.2), Some(0.4), Some(100.0)),
            features(None, Some(1.0), Some(200.0)),
            features(Some(0.8), None, Some(140.0)),
            None,
        ])
        .unwrap();
        assert_eq!(profile.tracks_analyzed, 2);
        assert!((profile.energy - 0.5).abs() < 1e-9);
        assert!((profile.valence - 0.2).abs() < 1e-9);
        assert!((profile.tempo - 120.0).abs() < 1e-9);
    }

    #[test]
    fn no_entry_with_energy_yields_nothing() {
        assert_eq!(AudioProfile::average(&[]), None);
        assert_eq!(AudioProfile::average(&[None, features(None, Some(0.5), None)]), None);
    }
}
