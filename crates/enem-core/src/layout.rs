//! Remote and local naming: archive URLs, per-year dataset paths, scratch names.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// `<base>/microdados/microdados_enem_<year>.zip`. Any path already on `base_url` is kept.
pub fn archive_url(base_url: &str, year: u16) -> Result<String> {
    let mut base = url::Url::parse(base_url).with_context(|| format!("invalid base URL {base_url}"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let url = base
        .join(&format!("microdados/microdados_enem_{year}.zip"))
        .context("join archive path")?;
    Ok(url.to_string())
}

/// File name of the persisted dataset for `year`.
pub fn dataset_file_name(year: u16) -> String {
    format!("microdados_enem_{year}.parquet")
}

/// `<data_dir>/microdados_enem_<year>.parquet`.
pub fn dataset_path(data_dir: &Path, year: u16) -> PathBuf {
    data_dir.join(dataset_file_name(year))
}

/// Parses the year back out of a dataset file name, if it is one.
pub fn year_from_file_name(name: &str) -> Option<u16> {
    name.strip_prefix("microdados_enem_")?
        .strip_suffix(".parquet")?
        .parse()
        .ok()
}

/// Path for the temp file: appends `.part` to the final path.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Reduces an archive entry name to a safe basename for the scratch directory.
///
/// Drops any directory part (entries may carry `DADOS/` prefixes or `..`),
/// replaces NUL, backslash and control characters with `_`, and trims dots and spaces.
pub fn scratch_file_name(entry_name: &str) -> String {
    let base = entry_name
        .rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or("");

    let mut out = String::with_capacity(base.len());
    let mut prev_underscore = false;
    for c in base.chars() {
        let c = if c == '\0' || c.is_control() || c == ' ' || c == '\t' {
            '_'
        } else {
            c
        };
        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "table.csv".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_url_pattern() {
        assert_eq!(
            archive_url("https://download.inep.gov.br", 2021).unwrap(),
            "https://download.inep.gov.br/microdados/microdados_enem_2021.zip"
        );
        assert_eq!(
            archive_url("http://127.0.0.1:8080/mirror", 2019).unwrap(),
            "http://127.0.0.1:8080/mirror/microdados/microdados_enem_2019.zip"
        );
        assert!(archive_url("not a url", 2019).is_err());
    }

    #[test]
    fn dataset_paths() {
        let p = dataset_path(Path::new("dados_enem"), 2020);
        assert_eq!(p, PathBuf::from("dados_enem/microdados_enem_2020.parquet"));
        assert_eq!(
            temp_path(&p),
            PathBuf::from("dados_enem/microdados_enem_2020.parquet.part")
        );
        assert_eq!(year_from_file_name("microdados_enem_2020.parquet"), Some(2020));
        assert_eq!(year_from_file_name("microdados_enem_2020.parquet.part"), None);
        assert_eq!(year_from_file_name("notes.txt"), None);
    }

    #[test]
    fn scratch_names_are_basenames() {
        assert_eq!(
            scratch_file_name("DADOS/MICRODADOS_ENEM_2020.csv"),
            "MICRODADOS_ENEM_2020.csv"
        );
        assert_eq!(scratch_file_name("../../etc/passwd.csv"), "passwd.csv");
        assert_eq!(scratch_file_name("a\\b\\c d.csv"), "c_d.csv");
        assert_eq!(scratch_file_name("../"), "table.csv");
    }
}
