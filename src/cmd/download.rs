use anyhow::Result;

use vodgrab::stream::backend::{download, DownloadJob, DownloadOutcome};
use vodgrab::stream::backends::NM3u8DlBackend;
use vodgrab::stream::drm::CommandKeyResolver;
use vodgrab::stream::providers::AbcIviewProvider;
use vodgrab::stream::selection::select;
use vodgrab::stream::{Content, Mode, Request, StreamProvider, Title};
use vodgrab::{Config, ServiceClient};

const AUDIO: &str = "AAC2.0";

pub async fn cmd_download(request: &Request, config: Config) -> Result<()> {
    let keys = CommandKeyResolver::new(&config.key_helper)?;
    let provider = AbcIviewProvider::new(ServiceClient::new()?, config.iview, Box::new(keys))?;

    if !provider.matches(&request.url) {
        anyhow::bail!("Not an ABC iview URL: {}", request.url);
    }
    eprintln!("🎬 Provider: {}", provider.name());

    eprintln!("📡 Fetching titles for: {}", request.url);
    let content = match &request.mode {
        Mode::Direct => Content::Series(provider.get_episode(&request.url).await?),
        mode if mode.is_movie() => Content::Movies(provider.get_movies(&request.url).await?),
        _ => Content::Series(provider.get_series(&request.url).await?),
    };
    eprintln!("📺 {}", content.summary());

    // List titles mode
    if let Mode::ListTitles { .. } = request.mode {
        for title in content.titles() {
            println!("  {title}");
        }
        return Ok(());
    }

    let titles = select(&content, &request.mode)?;

    let mut backend = NM3u8DlBackend::new();
    if let Some(ref path) = config.downloader {
        backend = backend.with_binary_path(path);
    }
    if !backend.check_available().await {
        eprintln!("⚠️  N_m3u8DL-RE not found; downloads will fail");
    }

    let save_dir = config.save_dir.join(content.folder_name());
    let mut failed = 0usize;

    for title in &titles {
        if let Err(e) = download_title(&provider, &backend, request, title, &save_dir).await {
            eprintln!("   ❌ {title}: {e}");
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} title(s) failed", titles.len());
    }
    Ok(())
}

async fn download_title(
    provider: &AbcIviewProvider,
    backend: &NM3u8DlBackend,
    request: &Request,
    title: &Title,
    save_dir: &std::path::Path,
) -> Result<()> {
    eprintln!("🔄 Preparing {title}");
    let stream = provider.prepare(title, request.quality).await?;

    // Info mode
    if request.info {
        println!("Title: {title}");
        println!("Height: {}p", stream.height);
        for key in &stream.keys {
            println!("Key: {key}");
        }
    }

    let job = DownloadJob {
        manifest_path: &stream.manifest_path,
        key_file: &stream.key_file,
        tmp_dir: stream.workdir.path(),
        save_dir: save_dir.to_path_buf(),
        save_name: title.filename(stream.height, AUDIO),
        height: stream.height,
    };

    match download(backend, &job).await? {
        DownloadOutcome::Completed(path) => eprintln!("   ✅ Saved {}", path.display()),
        DownloadOutcome::Skipped(path) => eprintln!("   ⏭️  {} already exists", path.display()),
    }
    Ok(())
}
