//! ABC iview (Australian) streaming provider

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::{expand, IviewConfig};
use crate::error::{Result, StreamError};
use crate::http_client::{single_header, ServiceClient};
use crate::stream::drm::{self, KeyResolver};
use crate::stream::manifest::{select_quality, Manifest};
use crate::stream::provider::{Playlist, PreparedStream, StreamProvider, StreamQuality};
use crate::stream::title_rules::TitleRules;
use crate::stream::titles::{Episode, Movie, Movies, Series, Title, SERVICE_TAG};

pub struct AbcIviewProvider {
    client: ServiceClient,
    config: IviewConfig,
    rules: TitleRules,
    keys: Box<dyn KeyResolver>,
}

impl AbcIviewProvider {
    pub fn new(
        client: ServiceClient,
        config: IviewConfig,
        keys: Box<dyn KeyResolver>,
    ) -> Result<Self> {
        let rules = TitleRules::new().map_err(|e| StreamError::Config(e.to_string()))?;
        Ok(Self {
            client,
            config,
            rules,
            keys,
        })
    }

    /// Second path segment of a catalog URL.
    /// URLs: <https://iview.abc.net.au/show/mystery-road>
    /// URLs: <https://iview.abc.net.au/video/ZW3679A001S00>
    fn extract_path_id(url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| StreamError::Resolution(format!("{url}: {e}")))?;
        parsed
            .path_segments()
            .and_then(|mut segments| segments.nth(1))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| StreamError::Resolution(url.to_string()))
    }

    fn create_episode(&self, raw: &IviewEpisode) -> Episode {
        let display_title = raw.title.as_deref().unwrap_or_default();
        let parsed = self.rules.parse(display_title, raw.display_subtitle.as_deref());
        debug!(title = %display_title, rule = parsed.rule, "Parsed episode title");

        Episode {
            id: raw.id.clone(),
            service: SERVICE_TAG,
            title: raw
                .show_title
                .clone()
                .unwrap_or_else(|| display_title.to_string()),
            season: parsed.season,
            number: parsed.number,
            name: parsed.name,
            description: raw.description.clone(),
            year: raw.production_year.as_ref().and_then(Year::value),
        }
    }

    /// Flatten season pages into one list. Each page lists its episodes
    /// newest first, so every batch is reversed; season order is kept.
    fn flatten_seasons(&self, seasons: Vec<IviewSeason>) -> Vec<Episode> {
        seasons
            .iter()
            .flat_map(|season| season.embedded.video_episodes.items.iter().rev())
            .map(|raw| self.create_episode(raw))
            .collect()
    }

    fn movies_from_film(film: IviewFilm) -> Result<Movies> {
        let id = film
            .embedded
            .and_then(|e| e.highlight_video)
            .map(|v| v.id)
            .ok_or_else(|| StreamError::Resolution(format!("film {:?} has no video", film.title)))?;

        Ok(Movies::new(vec![Movie {
            id,
            service: SERVICE_TAG,
            title: film.title.clone(),
            name: film.title,
            year: film.production_year.as_ref().and_then(Year::value),
            synopsis: film.description,
        }]))
    }

    /// First `program` entry of a playback document.
    fn program_playlist(vod: IviewVod) -> Result<Playlist> {
        let Some(embedded) = vod.embedded else {
            return Err(StreamError::Unavailable(
                vod.unavailable_message
                    .unwrap_or_else(|| "This program is not currently available".to_string()),
            ));
        };

        let program = embedded
            .playlist
            .into_iter()
            .find(|entry| entry.kind == "program")
            .ok_or_else(|| StreamError::Resolution("playlist has no program entry".to_string()))?;

        let dash = program
            .streams
            .and_then(|s| s.mpegdash)
            .ok_or_else(|| StreamError::Resolution("program has no DASH streams".to_string()))?;

        // Only 720p is advertised; 1080p is served from the sibling path.
        let manifest_url = match (dash.hd_720, dash.sd) {
            (Some(hd), _) => hd.replace("720.mpd", "1080.mpd"),
            (None, Some(sd)) => sd,
            (None, None) => {
                return Err(StreamError::Resolution(
                    "program has no usable DASH manifest".to_string(),
                ))
            }
        };

        Ok(Playlist {
            manifest_url,
            subtitle_url: program.captions.and_then(|c| c.src_vtt),
        })
    }

    async fn fetch_vod(&self, video_id: &str) -> Result<IviewVod> {
        let url = expand(&self.config.vod, "video_id", video_id);
        self.client.get_refusable_json(&url).await
    }

    async fn get_token(&self) -> Result<String> {
        let client_id = self.config.client_id()?;
        let resp: TokenResponse = self
            .client
            .post_form_json(&self.config.jwt, &[("clientId", client_id)])
            .await
            .map_err(|e| StreamError::License(format!("token request failed: {e}")))?;

        resp.token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| StreamError::License("token response has no token".to_string()))
    }

    #[instrument(skip(self))]
    async fn get_license(&self, video_id: &str) -> Result<String> {
        let jwt = self.get_token().await?;
        let url = expand(&self.config.drm, "video_id", video_id);

        let resp: LicenseResponse = self
            .client
            .get_json(&url, single_header("bearer", &jwt)?)
            .await
            .map_err(|e| StreamError::License(e.to_string()))?;

        Self::license_from(resp)
    }

    fn license_from(resp: LicenseResponse) -> Result<String> {
        match (resp.status.as_deref(), resp.license) {
            (Some("ok"), Some(license)) => Ok(license),
            (status, _) => Err(StreamError::License(format!(
                "status {}",
                status.unwrap_or("missing")
            ))),
        }
    }
}

#[async_trait]
impl StreamProvider for AbcIviewProvider {
    fn name(&self) -> &'static str {
        "abciview"
    }

    fn matches(&self, url: &str) -> bool {
        url.contains("iview.abc.net.au")
    }

    #[instrument(skip(self))]
    async fn get_series(&self, url: &str) -> Result<Series> {
        let show = Self::extract_path_id(url)?;
        let api = expand(&self.config.series, "show", &show);

        let seasons: OneOrMany<IviewSeason> = self.client.get_json(&api, HeaderMap::new()).await?;
        let series = Series::new(self.flatten_seasons(seasons.into_vec()));
        if series.is_empty() {
            return Err(StreamError::Resolution(format!("no episodes found for {show}")));
        }
        Ok(series)
    }

    #[instrument(skip(self))]
    async fn get_movies(&self, url: &str) -> Result<Movies> {
        let slug = Self::extract_path_id(url)?;
        let api = expand(&self.config.film, "slug", &slug);

        let film: IviewFilm = self.client.get_json(&api, HeaderMap::new()).await?;
        Self::movies_from_film(film)
    }

    #[instrument(skip(self))]
    async fn get_episode(&self, url: &str) -> Result<Series> {
        let video_id = Self::extract_path_id(url)?;
        let api = expand(&self.config.vod, "video_id", &video_id);

        let episode: IviewEpisode = self.client.get_json(&api, HeaderMap::new()).await?;
        Ok(Series::new(vec![self.create_episode(&episode)]))
    }

    async fn get_playlist(&self, video_id: &str) -> Result<Playlist> {
        let vod = self.fetch_vod(video_id).await?;
        Self::program_playlist(vod)
    }

    async fn prepare(&self, title: &Title, quality: StreamQuality) -> Result<PreparedStream> {
        let playlist = self.get_playlist(title.id()).await?;
        debug!(
            manifest = %playlist.manifest_url,
            subtitle = ?playlist.subtitle_url,
            "Playlist resolved"
        );

        let xml = self.client.get_text(&playlist.manifest_url).await?;
        let manifest = Manifest::inspect(
            &playlist.manifest_url,
            &xml,
            playlist.subtitle_url.as_deref(),
        )?;
        let height = select_quality(&manifest.heights, quality)
            .ok_or_else(|| StreamError::Manifest("no video representations".to_string()))?;

        let license = self.get_license(title.id()).await?;
        let headers = single_header("customdata", &license)?;
        let keys = self
            .keys
            .resolve_keys(&manifest.pssh, &self.config.license, &headers)
            .await?;

        let workdir = tempfile::Builder::new().prefix("vodgrab-").tempdir()?;
        let manifest_path = manifest.persist(workdir.path()).await?;
        let key_file = drm::write_key_file(workdir.path(), &keys).await?;
        info!(title = %title, height, "Stream prepared");

        Ok(PreparedStream {
            title: title.clone(),
            height,
            keys,
            manifest_path,
            key_file,
            workdir,
        })
    }
}

// Serde structures for iview API responses

/// The series endpoint returns a bare season object for single-season shows
/// and an array otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(many) => many,
            Self::One(one) => vec![one],
        }
    }
}

#[derive(Debug, Deserialize)]
struct IviewSeason {
    #[serde(rename = "_embedded")]
    embedded: IviewSeasonEmbedded,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IviewSeasonEmbedded {
    video_episodes: IviewEpisodePage,
}

#[derive(Debug, Deserialize)]
struct IviewEpisodePage {
    #[serde(default)]
    items: Vec<IviewEpisode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IviewEpisode {
    id: String,
    show_title: Option<String>,
    title: Option<String>,
    display_subtitle: Option<String>,
    description: Option<String>,
    production_year: Option<Year>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IviewFilm {
    title: String,
    production_year: Option<Year>,
    description: Option<String>,
    #[serde(rename = "_embedded")]
    embedded: Option<IviewFilmEmbedded>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IviewFilmEmbedded {
    highlight_video: Option<IviewVideoRef>,
}

#[derive(Debug, Deserialize)]
struct IviewVideoRef {
    id: String,
}

/// Years arrive as either numbers or strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Year {
    Number(u32),
    Text(String),
}

impl Year {
    fn value(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IviewVod {
    #[serde(rename = "_embedded")]
    embedded: Option<IviewVodEmbedded>,
    unavailable_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IviewVodEmbedded {
    #[serde(default)]
    playlist: Vec<IviewPlaylistEntry>,
}

#[derive(Debug, Deserialize)]
struct IviewPlaylistEntry {
    #[serde(rename = "type")]
    kind: String,
    streams: Option<IviewStreams>,
    captions: Option<IviewCaptions>,
}

#[derive(Debug, Deserialize)]
struct IviewStreams {
    mpegdash: Option<IviewDash>,
}

#[derive(Debug, Deserialize)]
struct IviewDash {
    #[serde(rename = "720")]
    hd_720: Option<String>,
    sd: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IviewCaptions {
    #[serde(rename = "src-vtt")]
    src_vtt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LicenseResponse {
    status: Option<String>,
    license: Option<String>,
}
