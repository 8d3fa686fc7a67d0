//! Choice of the main data table among archive entries.

/// Name and declared (uncompressed) size of one archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub index: usize,
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

/// True for entries that look like delimited text tables.
pub fn is_tabular(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".csv")
}

/// Picks the CSV-like entry with the largest declared size.
///
/// The main microdata file dwarfs the auxiliary dictionaries and item files
/// shipped alongside it. Ties keep the entry listed first.
pub fn select_tabular_entry(entries: &[EntryInfo]) -> Option<&EntryInfo> {
    entries
        .iter()
        .filter(|e| !e.is_dir && is_tabular(&e.name))
        .fold(None, |best: Option<&EntryInfo>, e| match best {
            Some(b) if b.size >= e.size => Some(b),
            _ => Some(e),
        })
}
