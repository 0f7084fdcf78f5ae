// src/watch/scanner.rs

//! One-shot "newest matching file" scan.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::watch::FileFilter;

/// Return the matching regular file with the greatest modification time, or
/// `None` when the directory has no matches or is (transiently) unreadable.
///
/// A file vanishing between readdir and stat is skipped, never an error.
/// Equal mtimes are broken deterministically: the lexicographically greatest
/// file name wins.
pub fn latest_file(dir: &Path, filter: &FileFilter) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            // Network shares can briefly drop out; the next trigger retries.
            debug!(dir = %dir.display(), %err, "watch directory unreadable; treating as empty");
            return None;
        }
    };

    let mut best: Option<(SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !filter.matches(name) {
            continue;
        }
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let Ok(mtime) = meta.modified() else {
            continue;
        };

        let candidate = (mtime, entry.path());
        match &best {
            Some(current) if *current >= candidate => {}
            _ => best = Some(candidate),
        }
    }

    best.map(|(_, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File, FileTimes};
    use std::time::{Duration, SystemTime};

    fn accept_all() -> FileFilter {
        FileFilter::new(&[]).unwrap()
    }

    fn write_with_mtime(dir: &Path, name: &str, mtime: SystemTime) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"data").unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_times(FileTimes::new().set_modified(mtime)).unwrap();
        path
    }

    #[test]
    fn picks_the_file_with_greatest_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        write_with_mtime(dir.path(), "old.tif", base);
        let newest = write_with_mtime(dir.path(), "new.tif", base + Duration::from_secs(10));
        write_with_mtime(dir.path(), "mid.tif", base + Duration::from_secs(5));

        assert_eq!(latest_file(dir.path(), &accept_all()), Some(newest));
    }

    #[test]
    fn respects_the_filter() {
        let dir = tempfile::tempdir().unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        write_with_mtime(dir.path(), "a.png", base + Duration::from_secs(10));
        let tif = write_with_mtime(dir.path(), "a.tif", base);

        let filter = FileFilter::new(&["*.tif".to_string()]).unwrap();
        assert_eq!(latest_file(dir.path(), &filter), Some(tif));
    }

    #[test]
    fn hidden_files_never_win() {
        let dir = tempfile::tempdir().unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        write_with_mtime(dir.path(), ".sneaky.tif", base + Duration::from_secs(100));
        let visible = write_with_mtime(dir.path(), "plain.tif", base);

        assert_eq!(latest_file(dir.path(), &accept_all()), Some(visible));
    }

    #[test]
    fn missing_directory_is_none_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("not-here");
        assert_eq!(latest_file(&gone, &accept_all()), None);
    }

    #[test]
    fn empty_directory_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(latest_file(dir.path(), &accept_all()), None);
    }

    #[test]
    fn equal_mtime_breaks_ties_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        write_with_mtime(dir.path(), "a.tif", base);
        let b = write_with_mtime(dir.path(), "b.tif", base);

        assert_eq!(latest_file(dir.path(), &accept_all()), Some(b));
    }
}
