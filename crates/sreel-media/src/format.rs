//! URL format policy.
//!
//! Video is strict: a wrongly accepted clip causes a hard decode failure
//! downstream, which costs more than a placeholder. Audio is lenient in
//! three tiers: losing narration to a false negative is worse than the odd
//! false positive, and signed URLs routinely bury the extension in query
//! parameters.

use url::Url;

/// Container extensions accepted for point footage.
const SUPPORTED_VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm"];

/// Extensions accepted for narration audio.
const SUPPORTED_AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".m4a", ".ogg", ".aac"];

/// Whether a URL names a supported video container.
///
/// Supported iff the path (query ignored) ends with an allow-listed
/// extension.
pub fn video_format_supported(url: &str) -> bool {
    let path = url_path(url).to_ascii_lowercase();
    SUPPORTED_VIDEO_EXTENSIONS
        .iter()
        .any(|ext| path.ends_with(ext))
}

/// Whether a URL names supported narration audio.
///
/// Three tiers, first hit wins:
/// 1. a content-type query hint declaring an `audio/*` MIME
/// 2. the path ends with an allow-listed extension
/// 3. any allow-listed extension token anywhere in the full URL string
///
/// A URL that fails to parse falls back to tier 3 instead of erroring.
pub fn audio_format_supported(url: &str) -> bool {
    if let Ok(parsed) = Url::parse(url) {
        if parsed
            .query_pairs()
            .any(|(key, value)| is_content_type_key(&key) && value.starts_with("audio/"))
        {
            return true;
        }

        let path = parsed.path().to_ascii_lowercase();
        if SUPPORTED_AUDIO_EXTENSIONS
            .iter()
            .any(|ext| path.ends_with(ext))
        {
            return true;
        }
    }

    audio_token_anywhere(url)
}

/// URL path with query/fragment stripped; best-effort for unparseable URLs.
pub(crate) fn url_path(url: &str) -> &str {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);

    match without_query.find("://") {
        Some(scheme_end) => {
            let rest = &without_query[scheme_end + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "",
            }
        }
        None => without_query,
    }
}

fn is_content_type_key(key: &str) -> bool {
    let normalized: String = key
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    normalized.ends_with("contenttype") || normalized == "mime" || normalized == "mimetype"
}

fn audio_token_anywhere(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    SUPPORTED_AUDIO_EXTENSIONS
        .iter()
        .any(|ext| lower.contains(ext))
}
