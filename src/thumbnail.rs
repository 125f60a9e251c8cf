//! Waypoint-image thumbnail materialization, running as a background job
//! so loading a large image never blocks the mutator thread.
//!
//! Grounded on `examples/original_source/src/thumbnails.cpp`'s
//! `a_thumbnails_create`: a thumbnail cached to disk next to a source
//! image, regenerated only when missing or stale.
//! Uses `image` for decode/resize rather than shelling out to an
//! external tool the way the C original does via GdkPixbuf.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;

use crate::error::JobError;
use crate::job::{BackgroundJobEngine, JobContext, JobId, Pool};

/// Notified once a thumbnail job finishes successfully, so a caller can
/// trigger a UI redraw without the job engine itself knowing anything
/// about rendering.
pub trait RedrawHint: Send + Sync {
    fn request_redraw(&self, image_path: &Path);
}

/// A `RedrawHint` that does nothing, for headless batch processing.
pub struct NullRedrawHint;
impl RedrawHint for NullRedrawHint {
    fn request_redraw(&self, _image_path: &Path) {}
}

/// Returned in place of a real thumbnail path when a waypoint has an
/// image but no thumbnail has been generated for it yet (the job hasn't
/// run, or failed). Lets a caller render a placeholder without special-
/// casing "no thumbnail" against "thumbnail not ready", mirroring
/// `thumbnails.h`'s `a_thumbnails_get_default`.
pub fn default_thumbnail_marker() -> &'static str {
    "(pending)"
}

/// Where a thumbnail for `source` would live under `thumbnail_dir`. Two
/// different source paths never collide because the file stem is paired
/// with a hash of the full source path.
pub fn thumbnail_path(thumbnail_dir: &Path, source: &Path) -> PathBuf {
    let digest = simple_hash(source.to_string_lossy().as_bytes());
    let stem = source.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
    thumbnail_dir.join(format!("{stem}-{digest:016x}.png"))
}

fn simple_hash(bytes: &[u8]) -> u64 {
    // FNV-1a; stable across runs, good enough for a cache-busting suffix.
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Whether an existing thumbnail at `dest` is at least as new as
/// `source`, so regenerating it would be wasted work.
fn is_fresh(source: &Path, dest: &Path) -> bool {
    let source_mtime = std::fs::metadata(source).and_then(|m| m.modified());
    let dest_mtime = std::fs::metadata(dest).and_then(|m| m.modified());
    match (source_mtime, dest_mtime) {
        (Ok(s), Ok(d)) => d >= s,
        _ => false,
    }
}

/// Decode `source`, scale it to fit within `max_dim` x `max_dim`
/// preserving aspect ratio, and write a PNG thumbnail to `thumbnail_dir`.
/// If a fresh thumbnail already exists, this is a no-op that returns its
/// path — calling it twice in a row does no extra work.
pub fn generate_thumbnail(source: &Path, thumbnail_dir: &Path, max_dim: u32) -> Result<PathBuf, JobError> {
    std::fs::create_dir_all(thumbnail_dir).map_err(|e| JobError::Io(e.into()))?;
    let dest = thumbnail_path(thumbnail_dir, source);
    if is_fresh(source, &dest) {
        return Ok(dest);
    }
    let img = image::open(source).map_err(|e| JobError::Failed(format!("decoding {}: {e}", source.display())))?;
    let thumb = img.resize(max_dim, max_dim, FilterType::Lanczos3);
    thumb.save(&dest).map_err(|e| JobError::Failed(format!("saving {}: {e}", dest.display())))?;
    Ok(dest)
}

/// Enqueue thumbnail generation for `source` on the job engine's
/// CPU-bound pool. `redraw` is notified once the thumbnail is ready (or
/// was already fresh); a failed decode is reported through
/// `on_job_finished` like any other job error, not through `redraw`.
pub fn spawn_thumbnail_job(
    engine: &BackgroundJobEngine,
    source: PathBuf,
    thumbnail_dir: PathBuf,
    max_dim: u32,
    redraw: std::sync::Arc<dyn RedrawHint>,
) -> JobId {
    engine.spawn(Pool::CpuBound, format!("thumbnail: {}", source.display()), move |ctx: JobContext| {
        ctx.checkpoint(0, 1);
        let result = generate_thumbnail(&source, &thumbnail_dir, max_dim);
        ctx.checkpoint(1, 1);
        let path = result?;
        redraw.request_redraw(&path);
        Ok(1)
    })
}

/// Enqueue thumbnail generation for every path in `sources` as a single
/// job, checkpointing cumulative `done/total` progress across the whole
/// batch rather than per image. A single decode failure is logged and
/// skipped so one bad image doesn't abort the rest of the batch; the job
/// itself only fails on cancellation. `redraw` is notified once per
/// thumbnail that's ready.
pub fn spawn_thumbnail_batch_job(
    engine: &BackgroundJobEngine,
    sources: Vec<PathBuf>,
    thumbnail_dir: PathBuf,
    max_dim: u32,
    redraw: std::sync::Arc<dyn RedrawHint>,
) -> JobId {
    engine.spawn(Pool::CpuBound, format!("thumbnails: {} images", sources.len()), move |ctx: JobContext| {
        let total = sources.len() as u64;
        let mut done_count = 0u64;
        for source in &sources {
            if ctx.checkpoint(done_count, total) == crate::job::ProgressSignal::Cancel {
                return Err(JobError::Cancelled);
            }
            match generate_thumbnail(source, &thumbnail_dir, max_dim) {
                Ok(path) => redraw.request_redraw(&path),
                Err(e) => tracing::warn!(source = %source.display(), error = %e, "skipping thumbnail"),
            }
            done_count += 1;
        }
        ctx.checkpoint(done_count, total);
        Ok(done_count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn write_test_png(path: &Path) {
        let img = image::RgbImage::from_pixel(64, 64, image::Rgb([200, 10, 10]));
        image::DynamicImage::ImageRgb8(img).save(path).unwrap();
    }

    #[test]
    fn generate_thumbnail_creates_a_smaller_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.png");
        write_test_png(&source);
        let thumb_dir = dir.path().join("thumbs");

        let dest = generate_thumbnail(&source, &thumb_dir, 16).unwrap();
        let decoded = image::open(&dest).unwrap();
        assert!(decoded.width() <= 16 && decoded.height() <= 16);
    }

    #[test]
    fn regenerating_a_fresh_thumbnail_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.png");
        write_test_png(&source);
        let thumb_dir = dir.path().join("thumbs");

        let first = generate_thumbnail(&source, &thumb_dir, 16).unwrap();
        let first_written = std::fs::metadata(&first).unwrap().modified().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let second = generate_thumbnail(&source, &thumb_dir, 16).unwrap();
        let second_written = std::fs::metadata(&second).unwrap().modified().unwrap();
        assert_eq!(first, second);
        assert_eq!(first_written, second_written);
    }

    #[test]
    fn spawn_thumbnail_job_notifies_redraw_hint_on_success() {
        use crate::job::progress::NullObserver;

        struct FlagHint(Arc<AtomicBool>);
        impl RedrawHint for FlagHint {
            fn request_redraw(&self, _image_path: &Path) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.png");
        write_test_png(&source);
        let thumb_dir = dir.path().join("thumbs");

        let engine = BackgroundJobEngine::new(1, 1, Arc::new(NullObserver));
        let flag = Arc::new(AtomicBool::new(false));
        spawn_thumbnail_job(&engine, source, thumb_dir, 16, Arc::new(FlagHint(flag.clone())));
        engine.join();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn spawn_thumbnail_batch_job_processes_every_source_and_skips_bad_ones() {
        use crate::job::progress::NullObserver;
        use std::sync::atomic::AtomicUsize;

        struct CountHint(Arc<AtomicUsize>);
        impl RedrawHint for CountHint {
            fn request_redraw(&self, _image_path: &Path) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let good_a = dir.path().join("a.png");
        let good_b = dir.path().join("b.png");
        write_test_png(&good_a);
        write_test_png(&good_b);
        let bad = dir.path().join("not-an-image.png");
        std::fs::write(&bad, b"not a real image").unwrap();
        let thumb_dir = dir.path().join("thumbs");

        let engine = BackgroundJobEngine::new(1, 1, Arc::new(NullObserver));
        let count = Arc::new(AtomicUsize::new(0));
        spawn_thumbnail_batch_job(&engine, vec![good_a, bad, good_b], thumb_dir, 16, Arc::new(CountHint(count.clone())));
        engine.join();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
