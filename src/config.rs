use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::ClientConfig;
use crate::util::normalize_base_url;

/// Default WOUDC service endpoint.
pub(crate) const DEFAULT_URL: &str = "https://api.woudc.org";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    timeout: Option<u64>,
    verify: Option<bool>,
}

/// Resolves client configuration, in order of precedence:
/// - explicit arguments
/// - environment variables `WOUDC_API_URL` / `WOUDC_API_TIMEOUT` / `WOUDC_API_VERIFY`
/// - rc file from `WOUDC_API_RC`, `./.woudcrc` or `~/.woudcrc`
/// - built-in defaults
pub(crate) fn load_config(
    url: Option<String>,
    timeout: Option<Duration>,
    verify: Option<bool>,
) -> Result<ClientConfig> {
    let mut url = url.or_else(|| std::env::var("WOUDC_API_URL").ok());

    let mut timeout = match timeout {
        Some(t) => Some(t),
        None => match std::env::var("WOUDC_API_TIMEOUT") {
            Ok(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid WOUDC_API_TIMEOUT value {raw:?}"))?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        },
    };

    let mut verify = verify.or_else(|| {
        std::env::var("WOUDC_API_VERIFY")
            .ok()
            .map(|v| v.trim() != "0")
    });

    if url.is_none() || timeout.is_none() || verify.is_none() {
        for rc_path in rc_candidates() {
            if rc_path.exists() {
                let cfg = read_rc(&rc_path).with_context(|| {
                    format!("failed to read configuration file {}", rc_path.display())
                })?;

                if url.is_none() {
                    url = cfg.url;
                }
                if timeout.is_none() {
                    timeout = cfg.timeout.map(Duration::from_secs);
                }
                if verify.is_none() {
                    verify = cfg.verify;
                }
                break;
            }
        }
    }

    Ok(ClientConfig {
        url: normalize_base_url(url.as_deref().unwrap_or(DEFAULT_URL)),
        timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
        verify: verify.unwrap_or(true),
    })
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    let mut cfg = RcConfig::default();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                continue;
            }
            match k {
                "url" => cfg.url = Some(v.to_string()),
                "timeout" => {
                    cfg.timeout = Some(v.parse().with_context(|| {
                        format!("invalid timeout value {v:?} in {}", path.display())
                    })?);
                }
                "verify" => cfg.verify = Some(v != "0"),
                _ => {}
            }
        }
    }

    Ok(cfg)
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
    // 1) WOUDC_API_RC (explicit)
    // 2) ./.woudcrc (current working directory)
    // 3) ~/.woudcrc
    if let Ok(p) = std::env::var("WOUDC_API_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".woudcrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".woudcrc"));
    }
    v
}
