use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::client::ClientConfig;
use crate::util::is_http_url;

/// Public file server hosting the Global Surface Water tiles.
pub const DEFAULT_BASE_URL: &str = "http://storage.googleapis.com/global-surface-water";

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    verify: Option<bool>,
}

pub(crate) fn load_config(url: Option<String>, verify: Option<bool>) -> Result<ClientConfig> {
    let mut url = url.or_else(|| std::env::var("WATER_DATA_URL").ok());
    let mut file_verify: Option<bool> = None;

    if url.is_none() || verify.is_none() {
        for rc_path in &rc_candidates() {
            if rc_path.exists() {
                let cfg = read_rc(rc_path).with_context(|| {
                    format!("failed to read configuration file {}", rc_path.display())
                })?;
                debug!(path = %rc_path.display(), "loaded configuration file");

                if url.is_none() {
                    url = cfg.url;
                }
                file_verify = cfg.verify;
                break;
            }
        }
    }

    let url = url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    if !is_http_url(&url) {
        bail!("Invalid configuration: url must start with http:// or https:// (got \"{url}\")");
    }

    let verify = verify.or(file_verify).unwrap_or(true);

    debug!(%url, verify, "resolved configuration");
    Ok(ClientConfig { url, verify })
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    // `url:` may be followed by its value on the next line.
    let mut pending_url = false;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if pending_url {
            pending_url = false;
            // A value line looks like a URL; anything else is the next key.
            if is_http_url(strip_quotes(line)) {
                cfg.url = Some(strip_quotes(line).to_string());
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let v = strip_quotes(v.trim());
            match k.trim() {
                "url" => {
                    if !v.is_empty() {
                        cfg.url = Some(v.to_string());
                    } else {
                        pending_url = true;
                    }
                }
                "verify" => {
                    if !v.is_empty() {
                        cfg.verify = Some(v != "0");
                    }
                }
                _ => {}
            }
        }
    }

    cfg
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // 1) WATER_DATA_RC (explicit)
    // 2) ./.waterdatarc
    // 3) ~/.waterdatarc
    if let Ok(p) = std::env::var("WATER_DATA_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".waterdatarc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".waterdatarc"));
    }
    v
}
