use thiserror::Error;

/// Failure of the archive fetcher for one URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HEAD or GET answered with a non-2xx status.
    #[error("archive not available at {url} (HTTP {status})")]
    NotAvailable { url: String, status: u32 },
    /// Network failure, timeout or other curl error.
    #[error("transfer failed: {0}")]
    Transfer(#[source] curl::Error),
    /// Server declared (or delivered) an empty body.
    #[error("archive body is empty")]
    EmptyBody,
    /// Fewer (or more) bytes arrived than `Content-Length` declared.
    #[error("truncated transfer: expected {expected} bytes, got {received}")]
    Truncated { expected: u64, received: u64 },
    #[error("download cancelled")]
    Cancelled,
}
