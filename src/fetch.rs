use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, error, info};

use crate::config::Source;
use crate::error::ExtractError;

pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the PDF for `academic_year` is kept inside `cache_dir`.
pub fn cached_pdf_path(cache_dir: impl AsRef<Path>, academic_year: &str) -> PathBuf {
    cache_dir
        .as_ref()
        .join(format!("term-dates-{academic_year}.pdf"))
}

/// Return the cached PDF, downloading it first when absent.
pub fn fetch_pdf(
    url: &str,
    cache_dir: impl AsRef<Path>,
    academic_year: &str,
) -> Result<PathBuf, ExtractError> {
    let target = cached_pdf_path(&cache_dir, academic_year);
    if target.exists() {
        debug!(path = %target.display(), "using cached PDF");
        return Ok(target);
    }
    info!(%url, academic_year, "downloading term dates");
    download_with_progress(url, &target, None::<fn(u64, Option<u64>)>)?;
    Ok(target)
}

/// Download `url` to `target`, reporting `(downloaded, total)` after each chunk.
///
/// Bytes are written to a `.part` sibling and renamed once complete, so an
/// interrupted download never leaves a truncated PDF in the cache.
pub fn download_with_progress<F>(
    url: &str,
    target: &Path,
    mut progress: Option<F>,
) -> Result<(), ExtractError>
where
    F: FnMut(u64, Option<u64>),
{
    if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let partial = partial_path(target);

    let client = Client::builder()
        .gzip(true)
        .brotli(true)
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?;
    let mut response = client.get(url).send()?.error_for_status()?;
    let total_size = response.content_length();
    let mut file = fs::File::create(&partial)?;

    let mut downloaded = 0u64;
    let mut buffer = [0u8; 16 * 1024];
    loop {
        let read = response.read(&mut buffer)?;
        if read == 0 {
            break;
        }

        file.write_all(&buffer[..read])?;
        downloaded += read as u64;

        if let Some(ref mut cb) = progress {
            cb(downloaded, total_size);
        }
    }
    file.flush()?;
    drop(file);

    fs::rename(&partial, target)?;
    info!(path = %target.display(), bytes = downloaded, "saved PDF");
    Ok(())
}

/// Result of fetching one source in [`download_sources`].
#[derive(Debug)]
pub enum FetchOutcome {
    Skipped(PathBuf),
    Downloaded(PathBuf),
    Failed(ExtractError),
}

/// Download every source into `cache_dir`. A failed source is logged and the
/// rest still run. Cached copies are kept unless `force` is set.
pub fn download_sources<F>(
    sources: &[Source],
    cache_dir: &Path,
    force: bool,
    mut progress: F,
) -> Vec<(String, FetchOutcome)>
where
    F: FnMut(u64, Option<u64>),
{
    let mut outcomes = Vec::with_capacity(sources.len());
    for source in sources {
        let target = cached_pdf_path(cache_dir, &source.academic_year);
        let outcome = if !force && target.exists() {
            FetchOutcome::Skipped(target)
        } else {
            match download_with_progress(&source.url, &target, Some(&mut progress)) {
                Ok(()) => FetchOutcome::Downloaded(target),
                Err(err) => {
                    error!(academic_year = %source.academic_year, url = %source.url, %err, "download failed");
                    FetchOutcome::Failed(err)
                }
            }
        };
        outcomes.push((source.academic_year.clone(), outcome));
    }
    outcomes
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_file_is_named_after_the_year() {
        let path = cached_pdf_path("/tmp/cache", "2025-2026");
        assert_eq!(path, PathBuf::from("/tmp/cache/term-dates-2025-2026.pdf"));
        assert_eq!(
            partial_path(&path),
            PathBuf::from("/tmp/cache/term-dates-2025-2026.pdf.part")
        );
    }

    #[test]
    fn cached_file_is_reused_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let cached = cached_pdf_path(dir.path(), "2025-2026");
        fs::write(&cached, b"%PDF-1.4").unwrap();
        // The URL is unreachable; a cache hit must not touch it.
        let path = fetch_pdf("http://127.0.0.1:9/unused.pdf", dir.path(), "2025-2026").unwrap();
        assert_eq!(path, cached);
    }

    #[test]
    fn failed_source_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(cached_pdf_path(dir.path(), "2026-2027"), b"%PDF-1.4").unwrap();
        let sources = [
            Source {
                academic_year: "2025-2026".to_string(),
                url: "http://127.0.0.1:9/unreachable.pdf".to_string(),
            },
            Source {
                academic_year: "2026-2027".to_string(),
                url: "http://127.0.0.1:9/also-unreachable.pdf".to_string(),
            },
        ];

        let outcomes = download_sources(&sources, dir.path(), false, |_, _| {});
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].0, "2025-2026");
        assert!(matches!(outcomes[0].1, FetchOutcome::Failed(_)));
        assert!(!cached_pdf_path(dir.path(), "2025-2026").exists());
        assert!(
            matches!(&outcomes[1].1, FetchOutcome::Skipped(path) if *path == cached_pdf_path(dir.path(), "2026-2027"))
        );
    }
}
