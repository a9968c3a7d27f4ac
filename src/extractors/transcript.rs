use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use super::{run_yt_dlp, TranscriptError, TranscriptFetcher, TranscriptSegment};

/// yt-dlp lists live chat replays alongside real subtitle tracks
const LIVE_CHAT_TRACK: &str = "live_chat";

/// Which caption track to pick when a video offers several
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePolicy {
    /// Preferred languages, most preferred first
    pub languages: Vec<String>,

    /// Consider YouTube's auto-generated captions
    pub allow_auto_captions: bool,

    /// Take any available track when none of the preferred languages exist
    pub fallback_to_any_language: bool,
}

impl Default for LanguagePolicy {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            allow_auto_captions: true,
            fallback_to_any_language: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Manual,
    Automatic,
}

/// A caption track chosen for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedTrack {
    pub language: String,
    pub kind: TrackKind,
    pub url: String,
}

/// The caption listing part of `yt-dlp -J` output for a single video
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CaptionListing {
    #[serde(default)]
    subtitles: Option<BTreeMap<String, Vec<TrackFormat>>>,
    #[serde(default)]
    automatic_captions: Option<BTreeMap<String, Vec<TrackFormat>>>,
}

#[derive(Debug, Deserialize)]
struct TrackFormat {
    ext: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Json3Transcript {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: f64,
    #[serde(rename = "dDurationMs", default)]
    duration_ms: f64,
    #[serde(default)]
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

impl LanguagePolicy {
    /// Pick the caption track for a video according to this policy
    pub(crate) fn select(&self, listing: &CaptionListing) -> Result<SelectedTrack, TranscriptError> {
        let manual = tracks(&listing.subtitles);
        let auto = if self.allow_auto_captions {
            tracks(&listing.automatic_captions)
        } else {
            Vec::new()
        };

        if manual.is_empty() && auto.is_empty() {
            return Err(TranscriptError::Disabled);
        }

        let chosen = self
            .languages
            .iter()
            .find_map(|lang| {
                let prefix = format!("{}-", lang);
                manual
                    .iter()
                    .find(|(key, _)| *key == lang || key.starts_with(&prefix))
                    .map(|track| (*track, TrackKind::Manual))
            })
            .or_else(|| {
                self.languages.iter().find_map(|lang| {
                    let orig = format!("{}-orig", lang);
                    auto.iter()
                        .find(|(key, _)| *key == orig)
                        .or_else(|| auto.iter().find(|(key, _)| *key == lang))
                        .map(|track| (*track, TrackKind::Automatic))
                })
            })
            .or_else(|| {
                if !self.fallback_to_any_language {
                    return None;
                }
                manual
                    .first()
                    .map(|track| (*track, TrackKind::Manual))
                    .or_else(|| {
                        auto.iter()
                            .find(|(key, _)| key.ends_with("-orig"))
                            .map(|track| (*track, TrackKind::Automatic))
                    })
            });

        let ((language, formats), kind) = chosen.ok_or_else(|| TranscriptError::NoMatchingTrack {
            requested: self.languages.clone(),
            available: manual
                .iter()
                .map(|(key, _)| key.to_string())
                .chain(
                    auto.iter()
                        .filter(|(key, _)| key.ends_with("-orig"))
                        .map(|(key, _)| key.to_string()),
                )
                .collect(),
        })?;

        let url = formats
            .iter()
            .find(|f| f.ext.as_deref() == Some("json3"))
            .and_then(|f| f.url.clone())
            .ok_or_else(|| TranscriptError::UnsupportedFormat(language.to_string()))?;

        Ok(SelectedTrack {
            language: language.to_string(),
            kind,
            url,
        })
    }
}

fn tracks(map: &Option<BTreeMap<String, Vec<TrackFormat>>>) -> Vec<(&str, &[TrackFormat])> {
    map.iter()
        .flatten()
        .filter(|(key, formats)| key.as_str() != LIVE_CHAT_TRACK && !formats.is_empty())
        .map(|(key, formats)| (key.as_str(), formats.as_slice()))
        .collect()
}

/// Turn a json3 caption document into ordered segments
pub(crate) fn parse_json3(body: &str) -> Result<Vec<TranscriptSegment>, TranscriptError> {
    let doc: Json3Transcript =
        serde_json::from_str(body).map_err(|e| TranscriptError::Parse(e.to_string()))?;

    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event
                .segs?
                .iter()
                .map(|seg| seg.utf8.as_str())
                .collect::<String>()
                .replace('\n', " ");
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment {
                text: text.to_string(),
                start: event.start_ms / 1000.0,
                duration: event.duration_ms / 1000.0,
            })
        })
        .collect())
}

/// Transcript fetcher that lists caption tracks with yt-dlp and downloads the chosen one
pub struct YtDlpTranscriptFetcher {
    yt_dlp_path: String,
    policy: LanguagePolicy,
    client: reqwest::Client,
}

impl YtDlpTranscriptFetcher {
    pub fn new(
        yt_dlp_path: impl Into<String>,
        policy: LanguagePolicy,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            yt_dlp_path: yt_dlp_path.into(),
            policy,
            client,
        })
    }

    /// List available caption tracks without downloading the video
    async fn list_captions(&self, video_id: &str) -> Result<CaptionListing, TranscriptError> {
        let output = run_yt_dlp(
            &self.yt_dlp_path,
            &["-J", "--skip-download", "--no-playlist", "--no-warnings", "--", video_id],
        )
        .await
        .map_err(|source| TranscriptError::Spawn {
            program: self.yt_dlp_path.clone(),
            source,
        })?;

        if !output.success {
            return Err(TranscriptError::Provider(output.error_message()));
        }

        serde_json::from_str(&output.stdout).map_err(|e| TranscriptError::Parse(e.to_string()))
    }

    async fn download_track(&self, track: &SelectedTrack) -> Result<String, TranscriptError> {
        let response = self
            .client
            .get(&track.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TranscriptError::Http(e.to_string()))?;

        response
            .text()
            .await
            .map_err(|e| TranscriptError::Http(e.to_string()))
    }
}

#[async_trait]
impl TranscriptFetcher for YtDlpTranscriptFetcher {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let listing = self.list_captions(video_id).await?;
        let track = self.policy.select(&listing)?;

        tracing::debug!(
            "Using {:?} caption track '{}' for {}",
            track.kind,
            track.language,
            video_id
        );

        let body = self.download_track(&track).await?;
        parse_json3(&body)
    }
}
