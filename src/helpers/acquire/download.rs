//! Streaming archive downloads

use super::http::ArchiveResponse;
use crate::core::error::{FetchError, FetchResult};
use crate::helpers::internal::fs_utils;
use crate::helpers::internal::progress::Progress;
use std::io::{Read, Write};
use std::path::Path;

const CHUNK_SIZE: usize = 256 * 1024;

/// Stream an opened archive response to `dest`, returning the byte count.
///
/// A partially written file is removed when the transfer fails.
pub fn download_to_file(response: ArchiveResponse, dest: &Path) -> FetchResult<u64> {
    fs_utils::ensure_parent_dir(dest)?;

    let filename = dest
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());

    let result = stream_with_progress(response, dest, &filename);
    if result.is_err() {
        let _ = fs_utils::remove_file_if_exists(dest);
    }
    result
}

fn stream_with_progress(response: ArchiveResponse, dest: &Path, filename: &str) -> FetchResult<u64> {
    let progress = Progress::spinner(&format!("downloading {}", filename));
    if let Some(len) = response.content_length {
        progress.set_total_bytes(len);
    }

    let url = response.url.clone();
    let mut file = std::fs::File::create(dest)
        .map_err(|e| FetchError::io(format!("cannot create {}", dest.display()), e))?;
    let mut reader = response.into_reader();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| FetchError::Http {
            url: url.clone(),
            reason: format!("read error: {}", e),
        })?;

        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .map_err(|e| FetchError::io(format!("write error on {}", dest.display()), e))?;

        total_bytes += bytes_read as u64;
        progress.set_position(total_bytes);
    }

    file.flush()
        .map_err(|e| FetchError::io(format!("write error on {}", dest.display()), e))?;
    Ok(total_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"))
        }
    }

    #[test]
    fn test_download_writes_body() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("nested/.foo.tar.gz");
        let body = vec![7u8; CHUNK_SIZE + 10];
        let response = ArchiveResponse::new(
            "http://example.invalid/foo.tar.gz",
            None,
            Some(body.len() as u64),
            Box::new(Cursor::new(body.clone())),
        );

        let written = download_to_file(response, &dest).unwrap();
        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[test]
    fn test_failed_download_removes_partial_file() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join(".foo.tar.gz");
        let response =
            ArchiveResponse::new("http://example.invalid/foo.tar.gz", None, None, Box::new(FailingReader));

        let err = download_to_file(response, &dest).unwrap_err();
        assert!(matches!(err, FetchError::Http { .. }));
        assert!(!dest.exists());
    }
}
