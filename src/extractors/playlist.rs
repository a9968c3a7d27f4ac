use async_trait::async_trait;
use serde::Deserialize;

use super::{
    run_yt_dlp, Playlist, PlaylistResolver, ResolutionError, VideoDescriptor,
    DEFAULT_PLAYLIST_TITLE,
};

/// Playlist resolver using yt-dlp's flat extraction mode
pub struct YtDlpPlaylistResolver {
    yt_dlp_path: String,
}

/// The subset of `yt-dlp --flat-playlist -J` output we care about
#[derive(Debug, Deserialize)]
struct FlatPlaylist {
    title: Option<String>,
    entries: Option<Vec<FlatEntry>>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    title: Option<String>,
}

impl YtDlpPlaylistResolver {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }
}

#[async_trait]
impl PlaylistResolver for YtDlpPlaylistResolver {
    async fn resolve(&self, url: &str) -> Result<Playlist, ResolutionError> {
        tracing::info!("Fetching playlist information for: {}", url);

        let output = run_yt_dlp(
            &self.yt_dlp_path,
            &["--flat-playlist", "-J", "--no-warnings", "--", url],
        )
        .await
        .map_err(|source| ResolutionError::Spawn {
            program: self.yt_dlp_path.clone(),
            source,
        })?;

        if !output.success {
            return Err(ResolutionError::Provider(output.error_message()));
        }

        parse_flat_playlist(url, &output.stdout)
    }
}

/// Build a [`Playlist`] from yt-dlp's single-document JSON dump
pub(crate) fn parse_flat_playlist(url: &str, json: &str) -> Result<Playlist, ResolutionError> {
    let raw: FlatPlaylist =
        serde_json::from_str(json).map_err(|e| ResolutionError::Parse(e.to_string()))?;

    let entries = raw
        .entries
        .ok_or_else(|| ResolutionError::NotAPlaylist(url.to_string()))?;

    let videos: Vec<VideoDescriptor> = entries
        .into_iter()
        .filter_map(|entry| match entry.id {
            Some(id) if !id.is_empty() => {
                let title = entry.title.unwrap_or_else(|| id.clone());
                Some(VideoDescriptor { id, title })
            }
            _ => {
                tracing::warn!("Skipping playlist entry without an id: {:?}", entry.title);
                None
            }
        })
        .collect();

    if videos.is_empty() {
        return Err(ResolutionError::EmptyPlaylist(url.to_string()));
    }

    let title = raw
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PLAYLIST_TITLE.to_string());

    tracing::info!("Found {} videos in playlist: {}", videos.len(), title);

    Ok(Playlist { title, videos })
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.youtube.com/playlist?list=PLtest";

    #[test]
    fn test_parse_keeps_playlist_order() {
        let json = r#"{
            "_type": "playlist",
            "title": "Rust Talks",
            "entries": [
                {"_type": "url", "id": "b2", "title": "Second upload"},
                {"_type": "url", "id": "a1", "title": "First: upload?"},
                {"_type": "url", "id": "c3", "title": "Third"}
            ]
        }"#;

        let playlist = parse_flat_playlist(URL, json).unwrap();
        assert_eq!(playlist.title, "Rust Talks");
        let ids: Vec<&str> = playlist.videos.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["b2", "a1", "c3"]);
        assert_eq!(playlist.videos[1].title, "First: upload?");
    }

    #[test]
    fn test_parse_defaults_missing_titles() {
        let json = r#"{"entries": [{"id": "x1", "title": null}, {"id": "x2"}]}"#;

        let playlist = parse_flat_playlist(URL, json).unwrap();
        assert_eq!(playlist.title, DEFAULT_PLAYLIST_TITLE);
        assert_eq!(playlist.videos[0].title, "x1");
        assert_eq!(playlist.videos[1].title, "x2");
    }

    #[test]
    fn test_parse_skips_entries_without_id() {
        let json = r#"{"title": "t", "entries": [{"title": "ghost"}, {"id": "", "title": "blank"}, {"id": "ok", "title": "Ok"}]}"#;

        let playlist = parse_flat_playlist(URL, json).unwrap();
        assert_eq!(playlist.videos, vec![VideoDescriptor { id: "ok".into(), title: "Ok".into() }]);
    }

    #[test]
    fn test_parse_rejects_single_video() {
        let json = r#"{"id": "dQw4w9WgXcQ", "title": "A video"}"#;
        assert!(matches!(
            parse_flat_playlist(URL, json),
            Err(ResolutionError::NotAPlaylist(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_playlist() {
        let json = r#"{"title": "Nothing here", "entries": []}"#;
        assert!(matches!(
            parse_flat_playlist(URL, json),
            Err(ResolutionError::EmptyPlaylist(_))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_flat_playlist(URL, "not json"),
            Err(ResolutionError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_reports_missing_program() {
        let resolver = YtDlpPlaylistResolver::new("definitely-not-a-real-yt-dlp-binary");
        let err = resolver.resolve(URL).await.unwrap_err();
        assert!(matches!(err, ResolutionError::Spawn { .. }));
        assert!(err.to_string().contains("definitely-not-a-real-yt-dlp-binary"));
    }
}
