use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::config::load_config;
use crate::error::FetchError;
use crate::part::PartFile;
use crate::util::urljoin;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the file server, typically
    /// `http://storage.googleapis.com/global-surface-water`.
    pub url: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

/// Blocking HTTP client for the tile file server.
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    progress: bool,
    http: HttpClient,
}

impl Client {
    /// Creates a client using environment variables and/or `.waterdatarc`.
    ///
    /// This is equivalent to `Client::new(None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`verify` arguments
    /// - environment variable `WATER_DATA_URL`
    /// - config file from `WATER_DATA_RC` or `.waterdatarc`
    /// - the public Global Surface Water server
    pub fn new(url: Option<String>, verify: Option<bool>) -> Result<Self> {
        let cfg = load_config(url, verify)?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("download-water-data/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("download-water-data")),
        );

        // Tiles are large and the server is slow at times; never give up on a transfer.
        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(None::<Duration>);

        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            url: cfg.url,
            progress: true,
            http,
        })
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Whether a byte progress bar is drawn while fetching.
    pub fn shows_progress(&self) -> bool {
        self.progress
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    /// Absolute URL of a path below the server base.
    pub fn url_for(&self, path: &str) -> String {
        urljoin(&self.url, path)
    }

    /// Fetches `url` into `<target>.part` and renames it onto `target` once complete.
    ///
    /// Nothing is written when the server rejects the request. A transfer that
    /// breaks off mid-body leaves its `.part` file behind; a cancelled one does not.
    /// The `.part` path is registered with `cancel` for as long as it is being written.
    pub fn fetch(
        &self,
        url: &str,
        target: &Path,
        cancel: &CancelToken,
    ) -> Result<PathBuf, FetchError> {
        debug!(%url, "fetching");
        let mut resp = self
            .http
            .get(url)
            .send()
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let (part, mut out) = PartFile::create(target, cancel).map_err(io_err(target))?;

        let pb = self.progress_bar(resp.content_length(), target);
        let mut written: u64 = 0;
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            if cancel.is_cancelled() {
                if let Some(pb) = &pb {
                    pb.finish_and_clear();
                }
                return Err(FetchError::Cancelled);
            }

            let n = match resp.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(source) => {
                    if let Some(pb) = &pb {
                        pb.finish_and_clear();
                    }
                    drop(out);
                    part.keep();
                    return Err(FetchError::Body {
                        url: url.to_string(),
                        source,
                    });
                }
            };

            out.write_all(&buf[..n]).map_err(io_err(part.path()))?;
            written += n as u64;
            if let Some(pb) = &pb {
                pb.inc(n as u64);
            }
        }

        out.flush().map_err(io_err(part.path()))?;
        drop(out);
        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }

        debug!(%url, bytes = written, "fetched");
        part.commit()
    }

    fn progress_bar(&self, len: Option<u64>, target: &Path) -> Option<ProgressBar> {
        if !self.progress {
            return None;
        }

        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let pb = match len {
            Some(len) => {
                let pb = ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stderr());
                pb.set_style(
                    ProgressStyle::with_template(
                        "{msg} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
                );
                pb
            }
            None => {
                let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
                pb.set_style(
                    ProgressStyle::with_template("{spinner:.green} {msg} {bytes} ({bytes_per_sec})")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                pb
            }
        };
        pb.set_message(name);
        Some(pb)
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> FetchError + use<> {
    let path = path.to_path_buf();
    move |source| FetchError::Io { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> Client {
        Client::new(Some(url.to_string()), Some(true))
            .unwrap()
            .with_progress(false)
    }

    #[test]
    fn url_for_joins_below_base() {
        let c = client("http://localhost:1/global-surface-water/");
        assert_eq!(c.base_url(), "http://localhost:1/global-surface-water/");
        assert_eq!(
            c.url_for("downloads2/change/change_0E_0N_v1_1.tif"),
            "http://localhost:1/global-surface-water/downloads2/change/change_0E_0N_v1_1.tif"
        );
    }

    #[test]
    fn fetch_writes_and_renames() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/tile.tif")
            .with_status(200)
            .with_body("raster")
            .create();

        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("tile.tif");
        let c = client(&server.url());

        let out = c
            .fetch(&c.url_for("tile.tif"), &target, &CancelToken::new())
            .unwrap();

        mock.assert();
        assert_eq!(out, target);
        assert_eq!(std::fs::read(&target).unwrap(), b"raster");
        assert!(!dir.path().join("tile.tif.part").exists());
    }

    #[test]
    fn status_error_writes_nothing() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/missing.tif").with_status(404).create();

        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("missing.tif");
        let c = client(&server.url());

        let err = c
            .fetch(&c.url_for("missing.tif"), &target, &CancelToken::new())
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { .. }));
        assert_eq!(err.to_string(), "HTTP Error 404: Not Found");
        assert!(!target.exists());
        assert!(!dir.path().join("missing.tif.part").exists());
    }

    #[test]
    fn cancelled_fetch_removes_part_file() {
        let token = CancelToken::new();
        let trip = token.clone();

        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/big.tif")
            .with_status(200)
            .with_chunked_body(move |w| {
                w.write_all(&[1u8; 1024])?;
                trip.cancel();
                w.write_all(&[2u8; 1024])
            })
            .create();

        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("big.tif");
        let c = client(&server.url());

        let err = c.fetch(&c.url_for("big.tif"), &target, &token).unwrap_err();

        assert!(matches!(err, FetchError::Cancelled));
        assert!(!target.exists());
        assert!(!dir.path().join("big.tif.part").exists());
    }

    #[test]
    fn interrupt_removes_part_file_during_stalled_read() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/slow.tif")
            .with_status(200)
            .with_chunked_body(|w| {
                w.write_all(&[1u8; 1024])?;
                w.flush()?;
                std::thread::sleep(Duration::from_secs(2));
                w.write_all(&[2u8; 1024])
            })
            .create();

        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("slow.tif");
        let part = dir.path().join("slow.tif.part");
        let token = CancelToken::new();
        let c = client(&server.url());

        let fetcher = {
            let (c, target, token) = (c.clone(), target.clone(), token.clone());
            std::thread::spawn(move || c.fetch(&c.url_for("slow.tif"), &target, &token))
        };

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while token.in_flight().is_none() {
            assert!(std::time::Instant::now() < deadline, "fetch never started");
            std::thread::sleep(Duration::from_millis(10));
        }

        // The fetching thread is blocked on the body; the interrupt must not wait for it.
        let started = std::time::Instant::now();
        assert_eq!(token.interrupt(), Some(part.clone()));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!part.exists());

        let err = fetcher.join().unwrap().unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
        assert!(!target.exists());
        assert!(!part.exists());
    }
}
