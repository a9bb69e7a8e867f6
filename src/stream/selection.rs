//! What to download from resolved catalog content.
//!
//! A [`Request`] is built from CLI flags. Unsupported modes are rejected by
//! [`Request::check_supported`] before any network call.

use regex::Regex;

use crate::error::{Result, StreamError};
use crate::stream::provider::StreamQuality;
use crate::stream::titles::{Content, Title};

/// Which titles of the resolved content to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// The URL points at a single episode.
    Direct,
    /// `(season, episode)` pairs.
    Episodes(Vec<(u32, u32)>),
    Seasons(Vec<u32>),
    Complete,
    Movie,
    /// Print titles and exit.
    ListTitles { movie: bool },
}

impl Mode {
    /// Whether the URL should be resolved as a film.
    pub fn is_movie(&self) -> bool {
        matches!(self, Self::Movie | Self::ListTitles { movie: true })
    }
}

/// A download request.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub mode: Mode,
    pub quality: StreamQuality,
    /// Print title and keys before downloading.
    pub info: bool,
    /// Remote CDM requested.
    pub remote: bool,
    /// Subtitles-only download requested.
    pub sub_only: bool,
}

impl Request {
    pub fn new(url: impl Into<String>, mode: Mode) -> Self {
        Self {
            url: url.into(),
            mode,
            quality: StreamQuality::Best,
            info: false,
            remote: false,
            sub_only: false,
        }
    }

    /// Reject modes this service cannot serve.
    pub fn check_supported(&self) -> Result<()> {
        if self.remote {
            return Err(StreamError::UnsupportedMode("Remote CDM"));
        }
        if self.sub_only {
            return Err(StreamError::UnsupportedMode("Subtitle-only download"));
        }
        Ok(())
    }
}

/// Parse `"S01E03,s2e4"` into `(season, episode)` pairs.
pub fn parse_episodes(value: &str) -> Result<Vec<(u32, u32)>> {
    let pattern =
        Regex::new(r"(?i)^S(\d+)E(\d+)$").map_err(|e| StreamError::Selection(e.to_string()))?;
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| -> Result<(u32, u32)> {
            let invalid = || StreamError::Selection(format!("{item:?}, expected e.g. S01E03"));
            let caps = pattern.captures(item).ok_or_else(invalid)?;
            let season = caps[1].parse().map_err(|_| invalid())?;
            let number = caps[2].parse().map_err(|_| invalid())?;
            Ok((season, number))
        })
        .collect()
}

/// Parse `"S01,2"` into season numbers.
pub fn parse_seasons(value: &str) -> Result<Vec<u32>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| {
            let digits = item.trim_start_matches(['S', 's']);
            digits
                .parse()
                .map_err(|_| StreamError::Selection(format!("{item:?}, expected e.g. S01")))
        })
        .collect()
}

/// Pick titles from `content` according to `mode`.
///
/// Selections that match nothing are a [`StreamError::Selection`].
pub fn select(content: &Content, mode: &Mode) -> Result<Vec<Title>> {
    let titles = content.titles();
    let picked: Vec<Title> = match mode {
        Mode::Direct | Mode::Complete | Mode::Movie => titles,
        Mode::ListTitles { .. } => Vec::new(),
        Mode::Episodes(wanted) => titles
            .into_iter()
            .filter(|t| matches!(t, Title::Episode(e) if wanted.contains(&(e.season, e.number))))
            .collect(),
        Mode::Seasons(wanted) => titles
            .into_iter()
            .filter(|t| matches!(t, Title::Episode(e) if wanted.contains(&e.season)))
            .collect(),
    };

    if picked.is_empty() && !matches!(mode, Mode::ListTitles { .. }) {
        return Err(StreamError::Selection(format!("nothing matched {mode:?}")));
    }
    Ok(picked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::titles::{Episode, Series, SERVICE_TAG};

    fn series() -> Content {
        let ep = |season, number| Episode {
            id: format!("{season}-{number}"),
            service: SERVICE_TAG,
            title: "Gruen".to_string(),
            season,
            number,
            name: None,
            description: None,
            year: None,
        };
        Content::Series(Series::new(vec![ep(1, 1), ep(1, 2), ep(2, 1), ep(2, 2)]))
    }

    fn ids(titles: &[Title]) -> Vec<&str> {
        titles.iter().map(Title::id).collect()
    }

    #[test]
    fn parses_episode_lists() {
        assert_eq!(parse_episodes("S01E03").unwrap(), vec![(1, 3)]);
        assert_eq!(parse_episodes("s2e4, S10E01").unwrap(), vec![(2, 4), (10, 1)]);
        assert!(matches!(parse_episodes("E03"), Err(StreamError::Selection(_))));
    }

    #[test]
    fn parses_season_lists() {
        assert_eq!(parse_seasons("S01,2,s3").unwrap(), vec![1, 2, 3]);
        assert!(parse_seasons("first").is_err());
    }

    #[test]
    fn selects_episodes_and_seasons() {
        let content = series();
        let picked = select(&content, &Mode::Episodes(vec![(2, 1), (1, 2)])).unwrap();
        assert_eq!(ids(&picked), vec!["1-2", "2-1"]);

        let picked = select(&content, &Mode::Seasons(vec![2])).unwrap();
        assert_eq!(ids(&picked), vec!["2-1", "2-2"]);

        let picked = select(&content, &Mode::Complete).unwrap();
        assert_eq!(picked.len(), 4);
    }

    #[test]
    fn empty_selection_is_error() {
        let err = select(&series(), &Mode::Seasons(vec![9])).unwrap_err();
        assert!(matches!(err, StreamError::Selection(_)));
        assert!(select(&series(), &Mode::ListTitles { movie: false }).unwrap().is_empty());
    }

    #[test]
    fn unsupported_modes_rejected() {
        let mut request = Request::new("https://iview.abc.net.au/show/gruen", Mode::Complete);
        assert!(request.check_supported().is_ok());

        request.remote = true;
        assert!(matches!(request.check_supported(), Err(StreamError::UnsupportedMode(_))));

        request.remote = false;
        request.sub_only = true;
        assert!(matches!(request.check_supported(), Err(StreamError::UnsupportedMode(_))));
    }

    #[test]
    fn movie_modes() {
        assert!(Mode::Movie.is_movie());
        assert!(Mode::ListTitles { movie: true }.is_movie());
        assert!(!Mode::Complete.is_movie());
    }
}
