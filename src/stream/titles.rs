//! Title records: episodes, movies and the collections that hold them.

use std::collections::BTreeMap;
use std::fmt;

/// Service tag written into filenames.
pub const SERVICE_TAG: &str = "iV";

/// A single episode of a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    /// Playback identifier (e.g. `ZW3679A001S00`).
    pub id: String,
    pub service: &'static str,
    /// Show title.
    pub title: String,
    /// Season number, 0 when it could not be parsed.
    pub season: u32,
    /// Episode number, 0 when it could not be parsed.
    pub number: u32,
    /// Episode name.
    pub name: Option<String>,
    pub description: Option<String>,
    pub year: Option<u32>,
}

/// A single film.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    pub id: String,
    pub service: &'static str,
    pub title: String,
    pub name: String,
    pub year: Option<u32>,
    pub synopsis: Option<String>,
}

/// Anything that can be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Title {
    Episode(Episode),
    Movie(Movie),
}

impl Title {
    pub fn id(&self) -> &str {
        match self {
            Self::Episode(e) => &e.id,
            Self::Movie(m) => &m.id,
        }
    }

    /// Release filename without extension.
    pub fn filename(&self, height: u32, audio: &str) -> String {
        let stem = match self {
            Self::Episode(e) => {
                let mut parts = vec![
                    e.title.clone(),
                    format!("S{:02}E{:02}", e.season, e.number),
                ];
                if let Some(name) = e.name.as_deref().filter(|n| *n != e.title) {
                    parts.push(name.to_string());
                }
                parts.join(" ")
            }
            Self::Movie(m) => match m.year {
                Some(year) => format!("{} {year}", m.name),
                None => m.name.clone(),
            },
        };
        clean_name(&format!(
            "{stem} {height}p {SERVICE_TAG} WEB-DL {audio} H.264"
        ))
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} S{:02}E{:02}", self.title, self.season, self.number)?;
        if let Some(name) = &self.name {
            write!(f, " {name}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} ({year})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Episode(e) => e.fmt(f),
            Self::Movie(m) => m.fmt(f),
        }
    }
}

/// Episodes of one show, in season order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Series {
    episodes: Vec<Episode>,
}

impl Series {
    pub fn new(episodes: Vec<Episode>) -> Self {
        Self { episodes }
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Episode count per season.
    pub fn seasons(&self) -> BTreeMap<u32, usize> {
        let mut seasons = BTreeMap::new();
        for ep in &self.episodes {
            *seasons.entry(ep.season).or_insert(0) += 1;
        }
        seasons
    }

    /// `"Show: 2 Season(s), 14 Episode(s)"`
    pub fn summary(&self) -> String {
        format!(
            "{self}: {} Season(s), {} Episode(s)",
            self.seasons().len(),
            self.len()
        )
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.episodes.first() {
            Some(ep) => write!(f, "{}", ep.title),
            None => Ok(()),
        }
    }
}

/// A movie collection, usually a single film.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Movies {
    movies: Vec<Movie>,
}

impl Movies {
    pub fn new(movies: Vec<Movie>) -> Self {
        Self { movies }
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }
}

impl fmt::Display for Movies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.movies.first() {
            Some(m) => m.fmt(f),
            None => Ok(()),
        }
    }
}

/// Catalog content resolved from a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Series(Series),
    Movies(Movies),
}

impl Content {
    pub fn titles(&self) -> Vec<Title> {
        match self {
            Self::Series(s) => s.episodes().iter().cloned().map(Title::Episode).collect(),
            Self::Movies(m) => m.movies().iter().cloned().map(Title::Movie).collect(),
        }
    }

    /// Human summary used in progress output.
    pub fn summary(&self) -> String {
        match self {
            Self::Series(s) => s.summary(),
            Self::Movies(m) => m.to_string(),
        }
    }

    /// Folder name for downloads of this content.
    pub fn folder_name(&self) -> String {
        match self {
            Self::Series(s) => clean_name(&s.to_string()),
            Self::Movies(m) => clean_name(&m.to_string()),
        }
    }
}

/// Make a string safe for use as a file or folder name.
///
/// Separators (space, `:`, `;`) become dots, `&` becomes `and`, characters
/// that are unsafe on common filesystems are dropped and runs of dots collapse.
pub fn clean_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            ' ' | ':' | ';' | '\t' => out.push('.'),
            '&' => out.push_str("and"),
            '\\' | '/' | '*' | '!' | '?' | '¿' | ',' | '\'' | '"' | '(' | ')' | '<' | '>'
            | '|' | '$' | '#' | '`' => {}
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    let mut collapsed = String::with_capacity(out.len());
    for c in out.chars() {
        if c == '.' && collapsed.ends_with('.') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed.trim_matches('.').to_string()
}
