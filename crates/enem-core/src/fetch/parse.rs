//! Parse HTTP response header lines into HeadResult.

use super::HeadResult;

/// Parse collected header lines into HeadResult.
///
/// A status line (`HTTP/...`) starts a new header block, so after redirects
/// only the final response's headers are kept.
pub(crate) fn parse_headers(lines: &[String]) -> HeadResult {
    let mut result = HeadResult::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            result = HeadResult::default();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                if let Ok(n) = value.parse::<u64>() {
                    result.content_length = Some(n);
                }
            }
            if name.eq_ignore_ascii_case("content-type") {
                result.content_type = Some(value.to_string());
            }
            if name.eq_ignore_ascii_case("last-modified") {
                result.last_modified = Some(value.to_string());
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_headers_content_length() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 200 OK",
            "Content-Length: 12345",
            "Content-Type: application/zip",
        ]));
        assert_eq!(r.content_length, Some(12345));
        assert_eq!(r.content_type.as_deref(), Some("application/zip"));
        assert!(r.last_modified.is_none());
    }

    #[test]
    fn parse_headers_keeps_last_block_after_redirect() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 302 Found",
            "Content-Length: 0",
            "Location: https://mirror.example/x.zip",
            "",
            "HTTP/1.1 200 OK",
            "Content-Length: 999",
            "Last-Modified: Wed, 21 Oct 2015 07:28:00 GMT",
        ]));
        assert_eq!(r.content_length, Some(999));
        assert_eq!(
            r.last_modified.as_deref(),
            Some("Wed, 21 Oct 2015 07:28:00 GMT")
        );
    }

    #[test]
    fn parse_headers_ignores_garbage_length() {
        let r = parse_headers(&lines(&["Content-Length: lots"]));
        assert_eq!(r.content_length, None);
    }
}
