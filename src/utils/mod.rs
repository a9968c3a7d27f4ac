use anyhow::Result;
use url::Url;

use crate::extractors::VideoDescriptor;

/// Characters that are not allowed in file names on at least one common platform
const FORBIDDEN_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Prefixes YouTube uses for playlist identifiers
const PLAYLIST_ID_PREFIXES: &[&str] = &["PL", "UU", "LL", "FL", "OL", "RD"];

/// Sanitize a title for safe filesystem usage.
///
/// Every forbidden character is replaced with an underscore; everything else,
/// including whitespace and non-ASCII text, is kept as-is.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .map(|c| if FORBIDDEN_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Archive entry name for a video's transcript
pub fn transcript_filename(video: &VideoDescriptor) -> String {
    format!("{}_{}.txt", sanitize_filename(&video.title), video.id)
}

/// Validate a URL and return normalized version
pub fn validate_and_normalize_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed.to_string())
}

/// Turn user input into something the playlist provider understands.
///
/// Full URLs are validated, bare playlist IDs are expanded to a playlist URL,
/// and anything else is handed to the provider untouched.
pub fn normalize_playlist_input(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        anyhow::bail!("Please enter a valid YouTube playlist URL.");
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        return validate_and_normalize_url(input);
    }

    if is_playlist_id(input) {
        return Ok(format!("https://www.youtube.com/playlist?list={}", input));
    }

    Ok(input.to_string())
}

fn is_playlist_id(input: &str) -> bool {
    PLAYLIST_ID_PREFIXES.iter().any(|prefix| input.starts_with(prefix))
        && input.len() > 12
        && input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Check if the current environment has required tools
pub async fn check_dependencies(yt_dlp_path: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp_path).await {
        missing.push(format!(
            "{} - required for playlist and caption extraction",
            yt_dlp_path
        ));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
