use std::path::{Path, PathBuf};

use chrono::Utc;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// UTC timestamp stamped on generated reports.
pub fn report_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Output path for one seed: unchanged for single-seed runs, otherwise the
/// seed is appended to the file stem (`log.csv` becomes `log-1337.csv`).
pub fn seed_path(base: &Path, seed: u64, multi_seed: bool) -> PathBuf {
    if !multi_seed {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map_or_else(|| "output".to_string(), |s| s.to_string_lossy().into_owned());
    let name = match base.extension() {
        Some(ext) => format!("{stem}-{seed}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{seed}"),
    };
    base.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_drops_empty() {
        assert_eq!(split_csv(" 1, 2,,3 "), vec!["1", "2", "3"]);
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn seed_path_only_suffixes_multi_seed_runs() {
        let base = Path::new("out/log.csv");
        assert_eq!(seed_path(base, 7, false), PathBuf::from("out/log.csv"));
        assert_eq!(seed_path(base, 7, true), PathBuf::from("out/log-7.csv"));
        assert_eq!(
            seed_path(Path::new("table"), 9, true),
            PathBuf::from("table-9")
        );
    }

    #[test]
    fn timestamp_is_iso_like() {
        let ts = report_timestamp();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), 20);
    }
}
