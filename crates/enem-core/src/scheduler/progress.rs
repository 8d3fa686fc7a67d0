//! Download progress snapshots sent from the pipeline to the CLI.
//!
//! Advisory only: senders use `try_send` and drop snapshots when the channel is full.

/// Snapshot of one year's archive download.
#[derive(Debug, Clone)]
pub struct ProgressStats {
    pub year: u16,
    /// Bytes received so far.
    pub bytes_done: u64,
    /// Declared size, when the server sent one.
    pub total_bytes: Option<u64>,
    /// Seconds since the GET started.
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Fraction complete in [0.0, 1.0]; None without a declared size.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) => Some(1.0),
            Some(total) => Some((self.bytes_done as f64 / total as f64).min(1.0)),
            None => None,
        }
    }

    /// Estimated seconds remaining (None if size unknown or rate is 0).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes?.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }
}
