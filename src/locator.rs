// ABOUTME: Resolves page URLs and bare identifiers into page ids
// ABOUTME: Database-style locators are rejected as unsupported

use crate::codec::normalize_id;
use crate::{Error, Result};
use url::Url;

/// Resolve a Notion URL or bare identifier into a normalized page id.
///
/// `https://www.notion.so/ws/My-Page-1a2b…?pvs=4` yields the text after the
/// last hyphen of the final path segment. A full dashed UUID is taken whole.
/// Segments without a hyphen address databases, which are not supported.
pub fn resolve_locator(locator: &str) -> Result<String> {
    let segment = last_segment(locator.trim());

    // Departs from the last-hyphen rule on purpose: splitting a dashed UUID
    // would keep only its final 12-digit group.
    if is_dashed_uuid(&segment) {
        return Ok(normalize_id(&segment));
    }

    match segment.rsplit_once('-') {
        Some((_, id)) if !id.is_empty() => Ok(normalize_id(id)),
        _ => Err(Error::UnsupportedLocator(format!(
            "{} (database locators are not supported; pass a page URL or id)",
            locator
        ))),
    }
}

fn last_segment(locator: &str) -> String {
    if let Ok(url) = Url::parse(locator) {
        if url.has_host() {
            return url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .unwrap_or_default()
                .to_string();
        }
    }

    let path = locator.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn is_dashed_uuid(s: &str) -> bool {
    s.len() == 36
        && s.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_page_url() {
        let id = resolve_locator(
            "https://www.notion.so/acme/Meeting-Notes-0123456789abcdef0123456789abcdef",
        )
        .unwrap();
        assert_eq!(id, "0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn test_resolve_page_url_with_query_and_trailing_slash() {
        let id = resolve_locator("https://www.notion.so/Roadmap-ABCDEF0123?pvs=4#heading").unwrap();
        assert_eq!(id, "abcdef0123");

        let id = resolve_locator("https://www.notion.so/Roadmap-abcdef0123/").unwrap();
        assert_eq!(id, "abcdef0123");
    }

    #[test]
    fn test_resolve_bare_slug() {
        assert_eq!(resolve_locator("Roadmap-abc123").unwrap(), "abc123");
        assert_eq!(resolve_locator("acme/Roadmap-abc123?v=1").unwrap(), "abc123");
    }

    #[test]
    fn test_resolve_dashed_uuid_whole() {
        let id = resolve_locator("1a2b3c4d-0000-4000-8000-00000000abcd").unwrap();
        assert_eq!(id, "1a2b3c4d00004000800000000000abcd");
    }

    #[test]
    fn test_database_locator_is_unsupported() {
        let err = resolve_locator("https://www.notion.so/acme/0123456789abcdef0123456789abcdef?v=42")
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedLocator(_)));

        assert!(matches!(
            resolve_locator("0123456789abcdef0123456789abcdef"),
            Err(Error::UnsupportedLocator(_))
        ));
        assert!(matches!(resolve_locator("Dangling-"), Err(Error::UnsupportedLocator(_))));
        assert!(matches!(resolve_locator(""), Err(Error::UnsupportedLocator(_))));
    }
}
