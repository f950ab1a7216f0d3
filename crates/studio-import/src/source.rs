//! Asset sources: local paths and HTTP(S) URLs
//!
//! Both paths stream in fixed-size chunks so callers can surface load
//! progress while a subject or backdrop arrives.

use std::io::Read;
use std::path::Path;
use std::time::Duration;
use studio_core::{Result, StudioError};

const CHUNK_SIZE: usize = 64 * 1024;
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// True for `http://` and `https://` sources
pub fn is_remote(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Lower-case file extension of a path or URL, ignoring query and fragment
pub fn source_extension(source: &str) -> Option<String> {
    let without_query = source
        .split(['?', '#'])
        .next()
        .unwrap_or(source);
    let last_segment = without_query.rsplit(['/', '\\']).next()?;
    let (stem, ext) = last_segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Read all bytes from `source`, reporting whole-number percentages.
///
/// `progress` is only called when the total size is known, with strictly
/// increasing values ending at 100.
pub fn fetch(source: &str, mut progress: impl FnMut(u8)) -> Result<Vec<u8>> {
    if is_remote(source) {
        let response = build_agent()
            .get(source)
            .call()
            .map_err(|e| StudioError::FetchError(format!("GET {} failed: {}", source, e)))?;
        let total = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let mut reader = response.into_body().into_reader();
        read_with_progress(&mut reader, total, &mut progress)
            .map_err(|e| StudioError::FetchError(format!("Reading {} failed: {}", source, e)))
    } else {
        let path = Path::new(source);
        let total = std::fs::metadata(path)?.len();
        let mut file = std::fs::File::open(path)?;
        Ok(read_with_progress(&mut file, Some(total), &mut progress)?)
    }
}

fn build_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .build();
    config.into()
}

fn read_with_progress(
    reader: &mut impl Read,
    total: Option<u64>,
    progress: &mut impl FnMut(u8),
) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(total.unwrap_or(0).min(256 * 1024 * 1024) as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut last_reported = None;

    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        if let Some(total) = total.filter(|t| *t > 0) {
            let pct = ((bytes.len() as u64 * 100) / total).min(99) as u8;
            if last_reported.map_or(true, |prev| pct > prev) {
                progress(pct);
                last_reported = Some(pct);
            }
        }
    }

    if total.is_some() {
        progress(100);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://example.com/a.glb"));
        assert!(is_remote("HTTP://example.com/a.glb"));
        assert!(!is_remote("/tmp/a.glb"));
        assert!(!is_remote("models/avatar.glb"));
    }

    #[test]
    fn extension_ignores_query_and_case() {
        assert_eq!(
            source_extension("https://threejs.org/x/venice_sunset_1k.HDR?v=2#top").as_deref(),
            Some("hdr")
        );
        assert_eq!(source_extension("C:\\assets\\set.glb").as_deref(), Some("glb"));
        assert_eq!(
            source_extension("https://images.unsplash.com/photo-1621619856624?w=1920"),
            None
        );
        assert_eq!(source_extension(".hidden"), None);
    }

    #[test]
    fn progress_is_monotonic_and_finishes_at_100() {
        let data = vec![7u8; CHUNK_SIZE * 3 + 10];
        let mut seen = Vec::new();
        let out =
            read_with_progress(&mut data.as_slice(), Some(data.len() as u64), &mut |p| {
                seen.push(p)
            })
            .unwrap();
        assert_eq!(out.len(), data.len());
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn unknown_length_reports_nothing() {
        let data = vec![1u8; 100];
        let mut calls = 0;
        read_with_progress(&mut data.as_slice(), None, &mut |_| calls += 1).unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn local_file_fetch() {
        let dir = std::env::temp_dir().join("studio_import_fetch_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("payload.bin");
        std::fs::write(&path, b"hello").unwrap();
        let mut last = 0;
        let bytes = fetch(path.to_str().unwrap(), |p| last = p).unwrap();
        assert_eq!(bytes, b"hello");
        assert_eq!(last, 100);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = fetch("/nonexistent/studio/asset.glb", |_| {}).unwrap_err();
        assert!(matches!(err, StudioError::IoError(_)));
    }
}
