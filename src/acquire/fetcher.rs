use crate::acquire::error::AcquireError;
use async_compression::tokio::bufread::GzipDecoder;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::{fs, task};
use tokio_util::io::StreamReader;

const DOWNLOAD_DIR: &str = "downloads";
const EXTRACT_DIR: &str = "extracted";

/// Downloads remote datasets into a cache directory and reuses them afterwards.
pub struct DatasetFetcher {
    cache_dir: PathBuf,
    download_client: Client,
}

impl DatasetFetcher {
    pub fn new(cache_dir: &Path) -> DatasetFetcher {
        let download_client = Client::new();
        DatasetFetcher {
            cache_dir: cache_dir.to_path_buf(),
            download_client,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Local path `url` is (or would be) cached at. A `.gz` suffix is dropped
    /// because the file is stored decompressed.
    pub fn cached_path(&self, url: &str) -> Result<PathBuf, AcquireError> {
        let (name, _) = file_name_of(url)?;
        Ok(self.cache_dir.join(DOWNLOAD_DIR).join(name))
    }

    /// Returns the cached copy of `url`, downloading it on a cache miss.
    pub async fn fetch(&self, url: &str) -> Result<PathBuf, AcquireError> {
        let (_, gzipped) = file_name_of(url)?;
        let target = self.cached_path(url)?;

        if fs::metadata(&target).await.is_ok() {
            info!("Cache hit for {} at {:?}", url, target);
            return Ok(target);
        }
        warn!("Cache miss for {}. Downloading.", url);

        let download_dir = self.cache_dir.join(DOWNLOAD_DIR);
        fs::create_dir_all(&download_dir)
            .await
            .map_err(|e| AcquireError::CacheDirCreation(download_dir.clone(), e))?;

        info!("Downloading data from {}", url);
        let response = self
            .download_client
            .get(url)
            .send()
            .await
            .map_err(|e| AcquireError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    AcquireError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    AcquireError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let stream_reader = StreamReader::new(stream);
        let mut reader: Pin<Box<dyn AsyncRead + Send>> = if gzipped {
            Box::pin(GzipDecoder::new(stream_reader))
        } else {
            Box::pin(stream_reader)
        };

        // Written next to the target so the final rename stays on one filesystem.
        let temp_file = NamedTempFile::new_in(&download_dir)
            .map_err(|e| AcquireError::DownloadIo(url.to_string(), e))?;
        let std_file = temp_file
            .reopen()
            .map_err(|e| AcquireError::DownloadIo(url.to_string(), e))?;
        let mut file = fs::File::from_std(std_file);
        let bytes = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| AcquireError::DownloadIo(url.to_string(), e))?;
        file.flush()
            .await
            .map_err(|e| AcquireError::DownloadIo(url.to_string(), e))?;
        drop(file);

        temp_file
            .persist(&target)
            .map_err(|e| AcquireError::Persist(target.clone(), e))?;
        info!("Successfully downloaded {} bytes to {:?}", bytes, target);
        Ok(target)
    }

    /// Returns a directory holding the extracted content of the zip archive at `url`.
    ///
    /// The archive is extracted once into the cache and reused. Other formats are
    /// rejected before anything is downloaded.
    pub async fn fetch_into_dir(&self, url: &str) -> Result<PathBuf, AcquireError> {
        let (name, _) = file_name_of(url)?;
        let is_zip = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("zip"));
        if !is_zip {
            return Err(AcquireError::UnsupportedArchive(url.to_string()));
        }
        let archive = self.fetch(url).await?;

        let stem = archive
            .file_stem()
            .map(|s| s.to_os_string())
            .ok_or_else(|| AcquireError::InvalidUrl(url.to_string()))?;
        let target = self.cache_dir.join(EXTRACT_DIR).join(stem);
        if fs::metadata(&target).await.is_ok() {
            info!("Using extracted archive at {:?}", target);
            return Ok(target);
        }

        let extract_root = self.cache_dir.join(EXTRACT_DIR);
        fs::create_dir_all(&extract_root)
            .await
            .map_err(|e| AcquireError::CacheDirCreation(extract_root.clone(), e))?;

        info!("Extracting {:?} into {:?}", archive, target);
        let final_dir = target.clone();
        task::spawn_blocking(move || extract_zip(&archive, &final_dir)).await??;
        Ok(target)
    }
}

/// Extracts into a sibling `.partial` directory first so an interrupted run
/// never leaves a half-filled target behind.
fn extract_zip(archive: &Path, target: &Path) -> Result<(), AcquireError> {
    let partial = partial_dir(target);
    if partial.exists() {
        std::fs::remove_dir_all(&partial)
            .map_err(|e| AcquireError::CacheDirCreation(partial.clone(), e))?;
    }
    let file = std::fs::File::open(archive)
        .map_err(|e| AcquireError::ArchiveOpen(archive.to_path_buf(), e))?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| AcquireError::Extract(archive.to_path_buf(), e))?;
    zip.extract(&partial)
        .map_err(|e| AcquireError::Extract(archive.to_path_buf(), e))?;
    std::fs::rename(&partial, target)
        .map_err(|e| AcquireError::CacheDirCreation(target.to_path_buf(), e))?;
    info!("Extracted {} entries from {:?}", zip.len(), archive);
    Ok(())
}

fn partial_dir(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    target.with_file_name(name)
}

/// Last path segment of `url` (query and fragment removed) and whether it is gzip-compressed.
fn file_name_of(url: &str) -> Result<(String, bool), AcquireError> {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let name = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
        .ok_or_else(|| AcquireError::InvalidUrl(url.to_string()))?;
    match name.strip_suffix(".gz") {
        Some(stripped) if !stripped.is_empty() => Ok((stripped.to_string(), true)),
        _ => Ok((name.to_string(), false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Nothing listens on the discard port, so any real request fails fast.
    const UNREACHABLE: &str = "http://127.0.0.1:9/climate";

    #[test]
    fn derives_cache_names_from_urls() {
        assert_eq!(
            file_name_of("https://host/a/wc2.1_10m_tavg.zip").unwrap(),
            ("wc2.1_10m_tavg.zip".to_string(), false)
        );
        assert_eq!(
            file_name_of("https://host/a/t2m.csv.gz?token=1").unwrap(),
            ("t2m.csv".to_string(), true)
        );
        assert!(matches!(
            file_name_of("https://"),
            Err(AcquireError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn cached_download_is_reused_without_network() {
        let cache = tempfile::tempdir().unwrap();
        let fetcher = DatasetFetcher::new(cache.path());
        let url = format!("{}/prec_1.tif.gz", UNREACHABLE);
        let cached = fetcher.cached_path(&url).unwrap();
        std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
        std::fs::write(&cached, b"cached").unwrap();

        let path = fetcher.fetch(&url).await.unwrap();
        assert_eq!(path, cached);
        assert!(path.ends_with("downloads/prec_1.tif"));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let cache = tempfile::tempdir().unwrap();
        let fetcher = DatasetFetcher::new(cache.path());
        let result = fetcher.fetch(&format!("{}/missing.zip", UNREACHABLE)).await;
        assert!(matches!(
            result,
            Err(AcquireError::NetworkRequest(_, _)) | Err(AcquireError::HttpStatus { .. })
        ));
    }

    #[tokio::test]
    async fn cached_zip_is_extracted_once() {
        let cache = tempfile::tempdir().unwrap();
        let fetcher = DatasetFetcher::new(cache.path());
        let url = format!("{}/tavg.zip", UNREACHABLE);
        let archive = fetcher.cached_path(&url).unwrap();
        std::fs::create_dir_all(archive.parent().unwrap()).unwrap();
        {
            let file = std::fs::File::create(&archive).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("tavg/tmean_1.tif", options).unwrap();
            zip.write_all(b"layer").unwrap();
            zip.finish().unwrap();
        }

        let dir = fetcher.fetch_into_dir(&url).await.unwrap();
        assert_eq!(
            std::fs::read(dir.join("tavg").join("tmean_1.tif")).unwrap(),
            b"layer"
        );
        assert!(!partial_dir(&dir).exists());

        // Second call reuses the extracted directory even if the archive is gone.
        std::fs::remove_file(&archive).unwrap();
        std::fs::write(&archive, b"not a zip").unwrap();
        assert_eq!(fetcher.fetch_into_dir(&url).await.unwrap(), dir);
    }

    #[tokio::test]
    async fn non_zip_layer_archives_are_rejected_before_download() {
        let cache = tempfile::tempdir().unwrap();
        let fetcher = DatasetFetcher::new(cache.path());
        for url in [
            format!("{}/tmean_1.tif.gz", UNREACHABLE),
            format!("{}/wc2.1_10m_tavg.tar.gz", UNREACHABLE),
        ] {
            let result = fetcher.fetch_into_dir(&url).await;
            assert!(
                matches!(&result, Err(AcquireError::UnsupportedArchive(u)) if *u == url),
                "{:?}",
                result
            );
        }
        assert!(!cache.path().join(DOWNLOAD_DIR).exists());
    }
}
