// src/serve/convert.rs

//! Browser-format conversion with a single-entry cache.
//!
//! Scientific formats (TIFF and friends) get decoded and re-encoded as PNG
//! for inline preview. Only the newest image is ever relevant, so the cache
//! holds at most one converted image, keyed by (path, mtime).

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Extensions browsers render natively; anything else goes through
/// [`encode_png`].
const WEB_FRIENDLY_EXTS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

pub fn is_web_friendly(path: &Path) -> bool {
    extension_lower(path)
        .map(|ext| WEB_FRIENDLY_EXTS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Content type for a web-friendly extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match extension_lower(path).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn extension_lower(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Decode `path` and re-encode it as PNG. Runs CPU-bound; callers use
/// `spawn_blocking`.
pub fn encode_png(path: &Path) -> anyhow::Result<Vec<u8>> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

#[derive(Debug, Clone, PartialEq)]
struct CacheKey {
    path: PathBuf,
    mtime: SystemTime,
}

/// Single-entry conversion cache. Replace-on-miss, no LRU: the newest image
/// supersedes everything older.
#[derive(Debug, Clone, Default)]
pub struct ConvertCache {
    entry: Arc<Mutex<Option<(CacheKey, Arc<Vec<u8>>)>>>,
}

impl ConvertCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path, mtime: SystemTime) -> Option<Arc<Vec<u8>>> {
        let guard = self.entry.lock().expect("convert cache lock poisoned");
        guard.as_ref().and_then(|(key, bytes)| {
            (key.path == path && key.mtime == mtime).then(|| Arc::clone(bytes))
        })
    }

    pub fn put(&self, path: PathBuf, mtime: SystemTime, bytes: Vec<u8>) -> Arc<Vec<u8>> {
        let bytes = Arc::new(bytes);
        let mut guard = self.entry.lock().expect("convert cache lock poisoned");
        *guard = Some((CacheKey { path, mtime }, Arc::clone(&bytes)));
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn web_friendly_extensions() {
        assert!(is_web_friendly(Path::new("a.png")));
        assert!(is_web_friendly(Path::new("a.JPG")));
        assert!(!is_web_friendly(Path::new("a.tif")));
        assert!(!is_web_friendly(Path::new("noext")));
    }

    #[test]
    fn cache_replaces_previous_entry() {
        let cache = ConvertCache::new();
        let t0 = SystemTime::UNIX_EPOCH;
        let t1 = t0 + Duration::from_secs(1);

        cache.put(PathBuf::from("/a.tif"), t0, vec![1]);
        assert_eq!(*cache.get(Path::new("/a.tif"), t0).unwrap(), vec![1]);

        cache.put(PathBuf::from("/b.tif"), t1, vec![2]);
        assert!(cache.get(Path::new("/a.tif"), t0).is_none());
        assert_eq!(*cache.get(Path::new("/b.tif"), t1).unwrap(), vec![2]);
    }

    #[test]
    fn stale_mtime_misses() {
        let cache = ConvertCache::new();
        let t0 = SystemTime::UNIX_EPOCH;
        cache.put(PathBuf::from("/a.tif"), t0, vec![1]);
        assert!(cache
            .get(Path::new("/a.tif"), t0 + Duration::from_secs(1))
            .is_none());
    }

    #[test]
    fn encode_png_round_trips_a_real_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.tif");
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]));
        img.save(&path).unwrap();

        let png = encode_png(&path).unwrap();
        // PNG magic bytes.
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn encode_png_fails_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.tif");
        std::fs::write(&path, b"not an image at all").unwrap();
        assert!(encode_png(&path).is_err());
    }
}
