//! `vodgrab` CLI - Download shows and films from ABC iview

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vodgrab::stream::selection::{parse_episodes, parse_seasons};
use vodgrab::stream::{Mode, Request};
use vodgrab::{Config, StreamQuality};

#[derive(Parser)]
#[command(name = "vodgrab")]
#[command(about = "Download shows and films from ABC iview")]
#[command(version = vodgrab::VERSION)]
struct Cli {
    /// Show, episode or film URL
    url: String,

    /// Download episodes, e.g. S01E03 or S01E01,S01E02
    #[arg(short, long, conflicts_with_all = ["season", "complete", "movie"])]
    episode: Option<String>,

    /// Download whole seasons, e.g. S01 or 1,2
    #[arg(short, long, conflicts_with_all = ["complete", "movie"])]
    season: Option<String>,

    /// Download every episode of the show
    #[arg(short, long, conflicts_with = "movie")]
    complete: bool,

    /// Treat the URL as a film
    #[arg(short, long)]
    movie: bool,

    /// List titles without downloading
    #[arg(short, long)]
    titles: bool,

    /// Video height, e.g. 720 (default: best)
    #[arg(short, long)]
    quality: Option<u32>,

    /// Print title and keys before downloading
    #[arg(short, long)]
    info: bool,

    /// Use a remote CDM (not supported on iview)
    #[arg(short, long)]
    remote: bool,

    /// Download subtitles only (not supported on iview)
    #[arg(long)]
    sub_only: bool,

    /// Override the download directory
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Config file (default: ~/.config/vodgrab/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn mode(&self) -> Result<Mode> {
        let mode = if self.titles {
            Mode::ListTitles { movie: self.movie }
        } else if let Some(episodes) = &self.episode {
            Mode::Episodes(parse_episodes(episodes)?)
        } else if let Some(seasons) = &self.season {
            Mode::Seasons(parse_seasons(seasons)?)
        } else if self.complete {
            Mode::Complete
        } else if self.movie {
            Mode::Movie
        } else {
            Mode::Direct
        };
        Ok(mode)
    }

    fn request(&self) -> Result<Request> {
        let mut request = Request::new(&self.url, self.mode()?);
        request.quality = StreamQuality::from_height(self.quality);
        request.info = self.info;
        request.remote = self.remote;
        request.sub_only = self.sub_only;
        Ok(request)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let request = cli.request()?;
    request.check_supported()?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.save_dir {
        config.save_dir = dir;
    }

    cmd::cmd_download(&request, config).await
}
