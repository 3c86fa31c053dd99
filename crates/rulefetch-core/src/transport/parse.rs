//! Parse collected response header lines (status line plus fields).

use crate::request::HeaderList;

/// Status line and header fields of the final response block.
#[derive(Debug, Default)]
pub(crate) struct ParsedHead {
    pub status_text: String,
    pub headers: HeaderList,
}

/// Parse header lines as collected from curl's header callback.
///
/// Curl reports every response block it sees (e.g. `100 Continue` before the
/// real response); a new status line starts a new block, so only the last
/// block is kept.
pub(crate) fn parse_head(lines: &[String]) -> ParsedHead {
    let mut head = ParsedHead::default();

    for line in lines {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            head = ParsedHead {
                status_text: reason_phrase(line).to_string(),
                headers: HeaderList::new(),
            };
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            head.headers.append(name.trim(), value.trim());
        }
    }

    head
}

/// `HTTP/1.1 404 Not Found` -> `Not Found`; `HTTP/2 200` -> ``.
fn reason_phrase(status_line: &str) -> &str {
    let mut parts = status_line.splitn(3, ' ');
    let _version = parts.next();
    let _code = parts.next();
    parts.next().map(str::trim).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_status_text_and_headers() {
        let head = parse_head(&lines(&[
            "HTTP/1.1 503 Service Unavailable\r\n",
            "Retry-After: 2\r\n",
            "Content-Length: 0\r\n",
            "\r\n",
        ]));
        assert_eq!(head.status_text, "Service Unavailable");
        assert_eq!(head.headers.get("retry-after"), Some("2"));
        assert_eq!(head.headers.get("content-length"), Some("0"));
    }

    #[test]
    fn keeps_only_last_block() {
        let head = parse_head(&lines(&[
            "HTTP/1.1 100 Continue",
            "",
            "HTTP/1.1 200 OK",
            "ETag: \"abc\"",
        ]));
        assert_eq!(head.status_text, "OK");
        assert_eq!(head.headers.len(), 1);
        assert_eq!(head.headers.get("etag"), Some("\"abc\""));
    }

    #[test]
    fn http2_status_line_has_no_reason() {
        let head = parse_head(&lines(&["HTTP/2 200", "location: /x"]));
        assert_eq!(head.status_text, "");
        assert_eq!(head.headers.get("Location"), Some("/x"));
    }

    #[test]
    fn header_values_with_colons_are_kept_whole() {
        let head = parse_head(&lines(&[
            "HTTP/1.1 503 Busy",
            "Retry-After: Wed, 21 Oct 2015 07:28:00 GMT",
        ]));
        assert_eq!(
            head.headers.get("retry-after"),
            Some("Wed, 21 Oct 2015 07:28:00 GMT")
        );
    }
}
