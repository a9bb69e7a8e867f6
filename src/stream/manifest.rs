//! DASH manifest inspection and rewriting.
//!
//! A single streaming pass over the MPD collects the Widevine key id and the
//! representation heights, resolves every `BaseURL` against the manifest URL
//! and, when a subtitle URL is supplied, appends a WebVTT adaptation set to
//! the first period. The rewritten document is what the downloader reads.

use std::path::{Path, PathBuf};

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Result, StreamError};
use crate::stream::drm;
use crate::stream::provider::StreamQuality;

/// File name of the rewritten manifest inside the working directory.
pub const MANIFEST_FILE: &str = "manifest.mpd";

/// Result of inspecting a manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// 16-byte key id from `cenc:default_KID`.
    pub kid: [u8; 16],
    /// Base64 Widevine PSSH built from `kid`.
    pub pssh: String,
    /// Offered heights, highest first, without duplicates.
    pub heights: Vec<u32>,
    /// Rewritten MPD.
    pub document: String,
}

impl Manifest {
    /// Inspect `xml` fetched from `manifest_url`.
    ///
    /// Fails with [`StreamError::RegionRestricted`] when no protection element
    /// carries a key id; iview serves such manifests outside Australia.
    pub fn inspect(manifest_url: &str, xml: &str, subtitle: Option<&str>) -> Result<Self> {
        let base = Url::parse(manifest_url).map_err(StreamError::manifest)?;
        // An empty BaseURL points at the manifest's own directory.
        let directory = base.join(".").map_err(StreamError::manifest)?;

        let mut reader = Reader::from_str(xml);
        let mut writer = Writer::new(Vec::with_capacity(xml.len() + 512));

        let mut kid_hex: Option<String> = None;
        let mut heights = Vec::new();
        let mut in_base_url = false;
        let mut base_url_filled = false;
        let mut pending_subtitle = subtitle;

        loop {
            let event = reader.read_event().map_err(StreamError::manifest)?;
            match event {
                Event::Eof => break,
                Event::Start(e) => {
                    in_base_url = e.local_name().as_ref() == b"BaseURL";
                    base_url_filled = false;
                    scan_element(&e, &mut kid_hex, &mut heights)?;
                    write(&mut writer, Event::Start(e))?;
                }
                Event::Empty(e) if e.local_name().as_ref() == b"BaseURL" => {
                    let end = e.to_end().into_owned();
                    write(&mut writer, Event::Start(e))?;
                    write(&mut writer, Event::Text(BytesText::new(directory.as_str())))?;
                    write(&mut writer, Event::End(end))?;
                }
                Event::Empty(e) => {
                    scan_element(&e, &mut kid_hex, &mut heights)?;
                    write(&mut writer, Event::Empty(e))?;
                }
                Event::Text(t) if in_base_url => {
                    let raw = t.unescape().map_err(StreamError::manifest)?;
                    if !raw.trim().is_empty() {
                        let absolute = base.join(raw.trim()).map_err(StreamError::manifest)?;
                        write(&mut writer, Event::Text(BytesText::new(absolute.as_str())))?;
                        base_url_filled = true;
                    }
                }
                Event::End(e) => {
                    let name = e.local_name();
                    if name.as_ref() == b"BaseURL" {
                        if in_base_url && !base_url_filled {
                            write(&mut writer, Event::Text(BytesText::new(directory.as_str())))?;
                        }
                        in_base_url = false;
                    } else if name.as_ref() == b"Period" {
                        if let Some(url) = pending_subtitle.take() {
                            write_subtitle_set(&mut writer, url)?;
                        }
                    }
                    write(&mut writer, Event::End(e))?;
                }
                other => write(&mut writer, other)?,
            }
        }

        let kid_hex = kid_hex.ok_or(StreamError::RegionRestricted)?;
        let kid = drm::parse_kid(&kid_hex)?;

        heights.sort_unstable_by(|a, b| b.cmp(a));
        heights.dedup();
        debug!(kid = %kid_hex, ?heights, "Manifest inspected");

        if pending_subtitle.is_some() {
            warn!("Manifest has no Period, subtitles not merged");
        }

        let document = String::from_utf8(writer.into_inner()).map_err(StreamError::manifest)?;

        Ok(Self {
            kid,
            pssh: drm::build_pssh(&kid),
            heights,
            document,
        })
    }

    /// Write the rewritten manifest into `dir`.
    pub async fn persist(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        tokio::fs::write(&path, &self.document).await?;
        Ok(path)
    }
}

/// Pick a height from `heights` (highest first).
///
/// `Best` returns the maximum. `Specific(h)` returns `h` if offered, else the
/// closest offered height; on an exact tie the larger one wins because it
/// comes first.
pub fn select_quality(heights: &[u32], quality: StreamQuality) -> Option<u32> {
    match quality {
        StreamQuality::Best => heights.iter().copied().max(),
        StreamQuality::Specific(wanted) => {
            if heights.contains(&wanted) {
                return Some(wanted);
            }
            let closest = heights
                .iter()
                .copied()
                .min_by_key(|h| h.abs_diff(wanted))?;
            warn!("{wanted}p not available, using closest match {closest}p");
            Some(closest)
        }
    }
}

fn scan_element(
    e: &BytesStart<'_>,
    kid: &mut Option<String>,
    heights: &mut Vec<u32>,
) -> Result<()> {
    match e.local_name().as_ref() {
        b"ContentProtection" if kid.is_none() => {
            for attr in e.attributes() {
                let attr = attr.map_err(StreamError::manifest)?;
                if attr.key.local_name().as_ref() == b"default_KID" {
                    let value = attr.unescape_value().map_err(StreamError::manifest)?;
                    *kid = Some(value.replace('-', ""));
                }
            }
        }
        b"Representation" => {
            if let Some(attr) = e
                .try_get_attribute("height")
                .map_err(StreamError::manifest)?
            {
                let value = attr.unescape_value().map_err(StreamError::manifest)?;
                if let Ok(h) = value.trim().parse::<u32>() {
                    heights.push(h);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn write_subtitle_set(writer: &mut Writer<Vec<u8>>, url: &str) -> Result<()> {
    let set = BytesStart::new("AdaptationSet").with_attributes([
        ("contentType", "text"),
        ("mimeType", "text/vtt"),
        ("lang", "en"),
    ]);
    let rep = BytesStart::new("Representation")
        .with_attributes([("id", "subtitles-en"), ("bandwidth", "0")]);

    write(writer, Event::Start(set))?;
    write(writer, Event::Start(rep))?;
    write(writer, Event::Start(BytesStart::new("BaseURL")))?;
    write(writer, Event::Text(BytesText::new(url)))?;
    write(writer, Event::End(BytesEnd::new("BaseURL")))?;
    write(writer, Event::End(BytesEnd::new("Representation")))?;
    write(writer, Event::End(BytesEnd::new("AdaptationSet")))?;
    Ok(())
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(StreamError::manifest)
}
