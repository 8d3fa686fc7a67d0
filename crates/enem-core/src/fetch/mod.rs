//! Archive fetcher: HEAD availability check, then a streaming GET into memory.
//!
//! Uses the curl crate (libcurl). The HEAD check has its own total timeout;
//! the GET has separate budgets for connection establishment and for the
//! whole body transfer, plus a low-speed abort. Received bytes are checked
//! against the declared `Content-Length` so a truncated body is never handed
//! to the extractor.

mod error;
mod parse;

pub use error::FetchError;

use std::str;
use std::time::Duration;

use crate::control::CancelToken;

/// Default browser-like User-Agent; the upstream server rejects some bare clients.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Upper bound for pre-sizing the body buffer from a declared length.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Timeout and identity settings for HEAD and GET.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub head_timeout: Duration,
    pub connect_timeout: Duration,
    pub transfer_timeout: Duration,
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            head_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
            transfer_timeout: Duration::from_secs(3600),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(120),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Key headers of a response.
#[derive(Debug, Clone, Default)]
pub struct HeadResult {
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub last_modified: Option<String>,
}

/// A downloaded ZIP held in memory. Owned by the fetcher until handed to the extractor.
#[derive(Debug)]
pub struct RawArchive {
    pub url: String,
    pub bytes: Vec<u8>,
    /// `Content-Length` of the GET response (or of the HEAD when the GET had none).
    pub declared_len: Option<u64>,
}

/// Performs a HEAD request and returns parsed metadata.
///
/// Follows redirects. Fails with `NotAvailable` on any non-2xx final status.
pub fn head(url: &str, opts: &FetchOptions) -> Result<HeadResult, FetchError> {
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(FetchError::Transfer)?;
    easy.nobody(true).map_err(FetchError::Transfer)?; // HEAD request
    easy.follow_location(true).map_err(FetchError::Transfer)?;
    easy.useragent(&opts.user_agent).map_err(FetchError::Transfer)?;
    easy.connect_timeout(opts.connect_timeout.min(opts.head_timeout))
        .map_err(FetchError::Transfer)?;
    easy.timeout(opts.head_timeout).map_err(FetchError::Transfer)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(FetchError::Transfer)?;
        transfer.perform().map_err(FetchError::Transfer)?;
    }

    let code = easy.response_code().map_err(FetchError::Transfer)?;
    if !(200..300).contains(&code) {
        return Err(FetchError::NotAvailable {
            url: url.to_string(),
            status: code,
        });
    }

    Ok(parse::parse_headers(&headers))
}

fn prealloc_len(declared: Option<u64>) -> usize {
    declared
        .map(|n| n.min(MAX_PREALLOC))
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}

/// Checks availability with HEAD, then downloads the whole body into memory.
///
/// `on_progress(bytes_done, declared_total)` is advisory and may be called
/// often. The transfer is aborted when `cancel` is tripped.
pub fn fetch(
    url: &str,
    opts: &FetchOptions,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(u64, Option<u64>),
) -> Result<RawArchive, FetchError> {
    let head = head(url, opts)?;
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    tracing::debug!(
        url,
        content_length = ?head.content_length,
        content_type = ?head.content_type,
        last_modified = ?head.last_modified,
        "HEAD ok"
    );

    // The declared length is untrusted; the buffer grows past the cap as bytes arrive.
    let mut body: Vec<u8> = Vec::with_capacity(prealloc_len(head.content_length));
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(FetchError::Transfer)?;
    easy.follow_location(true).map_err(FetchError::Transfer)?;
    easy.max_redirections(10).map_err(FetchError::Transfer)?;
    easy.useragent(&opts.user_agent).map_err(FetchError::Transfer)?;
    easy.connect_timeout(opts.connect_timeout)
        .map_err(FetchError::Transfer)?;
    easy.timeout(opts.transfer_timeout)
        .map_err(FetchError::Transfer)?;
    easy.low_speed_limit(opts.low_speed_limit)
        .map_err(FetchError::Transfer)?;
    easy.low_speed_time(opts.low_speed_time)
        .map_err(FetchError::Transfer)?;
    easy.progress(true).map_err(FetchError::Transfer)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(FetchError::Transfer)?;
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(FetchError::Transfer)?;
        let declared_hint = head.content_length;
        transfer
            .progress_function(move |dltotal, dlnow, _, _| {
                if cancel.is_cancelled() {
                    return false;
                }
                let total = if dltotal > 0.0 {
                    Some(dltotal as u64)
                } else {
                    declared_hint
                };
                on_progress(dlnow as u64, total);
                true
            })
            .map_err(FetchError::Transfer)?;
        transfer.perform()
    };

    let declared_len = parse::parse_headers(&headers)
        .content_length
        .or(head.content_length);
    let received = body.len() as u64;

    if let Err(e) = performed {
        if cancel.is_cancelled() || e.is_aborted_by_callback() {
            return Err(FetchError::Cancelled);
        }
        if e.is_partial_file() {
            return Err(FetchError::Truncated {
                expected: declared_len.unwrap_or(received),
                received,
            });
        }
        return Err(FetchError::Transfer(e));
    }

    let code = easy.response_code().map_err(FetchError::Transfer)?;
    if !(200..300).contains(&code) {
        return Err(FetchError::NotAvailable {
            url: url.to_string(),
            status: code,
        });
    }

    if declared_len == Some(0) || received == 0 {
        return Err(FetchError::EmptyBody);
    }
    if let Some(expected) = declared_len {
        if expected != received {
            return Err(FetchError::Truncated { expected, received });
        }
    }

    tracing::info!(url, bytes = received, "archive downloaded");
    Ok(RawArchive {
        url: url.to_string(),
        bytes: body,
        declared_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prealloc_is_capped() {
        assert_eq!(prealloc_len(None), 0);
        assert_eq!(prealloc_len(Some(1000)), 1000);
        assert_eq!(prealloc_len(Some(1 << 62)), MAX_PREALLOC as usize);
        assert_eq!(prealloc_len(Some(u64::MAX)), MAX_PREALLOC as usize);
    }
}
