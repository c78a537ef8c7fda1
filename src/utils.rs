//! Utility functions for URL cleaning and archive entry naming

use url::Url;

use crate::error::Result;

/// Clean and normalize a single URL, defaulting to `https` when no scheme
/// is present
///
/// # Examples
///
/// ```
/// use tunepack::utils::clean_url;
///
/// let url = clean_url(" youtube.com/watch?v=abc123 ").unwrap();
/// assert_eq!(url, "https://youtube.com/watch?v=abc123");
/// ```
pub fn clean_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let parsed = Url::parse(&with_scheme)?;
    let mut cleaned = parsed.to_string();
    // Url appends a trailing slash to bare-host URLs; keep the input shape
    if !trimmed.ends_with('/') && cleaned.ends_with('/') {
        cleaned.pop();
    }
    Ok(cleaned)
}

/// Extract, clean, and normalize all URLs from free-form input text
///
/// Commas and whitespace both separate URLs. Tokens that fail to parse are
/// dropped (they are not per-URL errors yet, since they may be arbitrary
/// text around the pasted links).
pub fn extract_and_clean_urls(input: &str) -> Vec<String> {
    input
        .replace(',', " ")
        .split_whitespace()
        .filter_map(|token| clean_url(token).ok())
        .collect()
}

/// Order-preserving dedup, keeping the first occurrence of each element
pub fn dedup_ordered(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Sanitize an archive entry name
///
/// Whitespace and path separators are replaced by underscores so every
/// entry is a flat, filesystem-safe name with no directory components.
pub fn sanitize_entry_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_url_adds_https_scheme() {
        assert_eq!(
            clean_url("soundcloud.com/artist/track").unwrap(),
            "https://soundcloud.com/artist/track"
        );
    }

    #[test]
    fn test_clean_url_preserves_existing_scheme_and_query() {
        assert_eq!(
            clean_url("http://youtube.com/playlist?list=PL123").unwrap(),
            "http://youtube.com/playlist?list=PL123"
        );
    }

    #[test]
    fn test_clean_url_trims_whitespace() {
        assert_eq!(
            clean_url("  https://open.spotify.com/track/abc  ").unwrap(),
            "https://open.spotify.com/track/abc"
        );
    }

    #[test]
    fn test_extract_splits_on_commas_and_whitespace() {
        let urls = extract_and_clean_urls("youtube.com/watch?v=1, soundcloud.com/a/b\nspotify.com/track/x");
        assert_eq!(
            urls,
            vec![
                "https://youtube.com/watch?v=1",
                "https://soundcloud.com/a/b",
                "https://spotify.com/track/x",
            ]
        );
    }

    #[test]
    fn test_extract_empty_input() {
        assert!(extract_and_clean_urls("   ").is_empty());
    }

    #[test]
    fn test_dedup_ordered_keeps_first_occurrence() {
        let deduped = dedup_ordered(vec![
            "a".to_string(),
            "b".to_string(),
            "a".to_string(),
            "c".to_string(),
            "b".to_string(),
        ]);
        assert_eq!(deduped, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sanitize_entry_name_flattens_paths() {
        assert_eq!(
            sanitize_entry_name("My Song - Live/Acoustic\\Mix.mp3"),
            "My_Song_-_Live_Acoustic_Mix.mp3"
        );
    }

    #[test]
    fn test_sanitize_entry_name_replaces_all_whitespace() {
        assert_eq!(sanitize_entry_name("a\tb\nc d"), "a_b_c_d");
    }
}
