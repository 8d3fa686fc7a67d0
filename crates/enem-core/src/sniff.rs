//! Format sniffer: guesses delimiter and header presence from a leading sample.
//!
//! Best-effort only. A truncated or unusual sample can be misclassified;
//! callers log the `ambiguous` case and continue with the defaults.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Column names that only appear in a header row of the microdata table.
pub const HEADER_TOKENS: [&str; 4] = ["NU_INSCRICAO", "TP_FAIXA_ETARIA", "TP_SEXO", "CO_MUNICIPIO"];

/// Delimiter used when the sample gives no signal.
pub const DEFAULT_DELIMITER: u8 = b',';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sniffed {
    pub delimiter: u8,
    pub has_header: bool,
    /// Semicolon and comma counts were equal, so the default delimiter was used.
    pub ambiguous: bool,
}

/// Decodes raw bytes as Latin-1 (windows-1252); never fails.
pub fn decode_latin1(bytes: &[u8]) -> String {
    let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// `;` iff it strictly outnumbers `,`; header iff any known column token appears (case-insensitive).
pub fn sniff(sample: &[u8]) -> Sniffed {
    let text = decode_latin1(sample);
    let semicolons = text.matches(';').count();
    let commas = text.matches(',').count();
    let delimiter = if semicolons > commas { b';' } else { DEFAULT_DELIMITER };

    let upper = text.to_uppercase();
    let has_header = HEADER_TOKENS.iter().any(|t| upper.contains(t));

    Sniffed {
        delimiter,
        has_header,
        ambiguous: semicolons == commas,
    }
}

/// Reads up to `max_bytes` from the start of `path`.
pub fn read_sample(path: &Path, max_bytes: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(max_bytes);
    File::open(path)?
        .take(max_bytes as u64)
        .read_to_end(&mut buf)?;
    Ok(buf)
}
