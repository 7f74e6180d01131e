//! Link classification, URL extraction and filename sanitizing.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use tunegrab_types::Platform;

/// Host markers identifying a YouTube link.
pub const YOUTUBE_MARKERS: &[&str] = &["youtube.com/", "youtu.be/"];

/// Host markers identifying a SoundCloud link.
pub const SOUNDCLOUD_MARKERS: &[&str] = &["soundcloud.com/"];

/// Name used when sanitizing leaves nothing usable.
pub const FALLBACK_FILE_NAME: &str = "track";

const MAX_FILE_NAME_CHARS: usize = 120;

static VIDEO_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:\S*?&)?v=|shorts/|embed/|live/|v/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("video id pattern is valid")
});

/// Decide which platform, if any, `text` links to.
pub fn classify(text: &str) -> Option<Platform> {
    if contains_any(text, YOUTUBE_MARKERS) {
        Some(Platform::YouTube)
    } else if contains_any(text, SOUNDCLOUD_MARKERS) {
        Some(Platform::SoundCloud)
    } else {
        None
    }
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.contains(m))
}

/// Pull the first whitespace-delimited token containing one of `markers`
/// out of a chat message. Scheme-less links get `https://` and parseable
/// links come back normalized. Falls back to the trimmed message.
pub fn extract_url(text: &str, markers: &[&str]) -> String {
    let Some(token) = text
        .split_whitespace()
        .find(|token| contains_any(token, markers))
    else {
        return text.trim().to_string();
    };

    // Clean trailing punctuation
    let token = token.trim_end_matches(['.', ',', ';', '!', ')', '>']);
    let candidate = if token.starts_with("http://") || token.starts_with("https://") {
        token.to_string()
    } else {
        format!("https://{token}")
    };

    match Url::parse(&candidate) {
        Ok(url) => url.into(),
        Err(_) => candidate,
    }
}

/// Extract an 11-character YouTube video id from watch, short-link,
/// shorts, embed or live URLs.
pub fn extract_video_id(text: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Make a track title safe to use as a file name.
///
/// Reserved characters and control characters become `_`; the result never
/// contains a path separator and is never empty.
pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(MAX_FILE_NAME_CHARS)
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');
    if trimmed.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
