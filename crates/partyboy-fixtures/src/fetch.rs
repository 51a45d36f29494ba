use std::fs::File;
use std::io::{Read as _, Write as _};
use std::path::Path;

use ureq::tls::TlsConfig;
use url::Url;

use crate::error::{IoResultExt as _, ProvisionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    Strict,
    /// Skips certificate chain and hostname verification.
    Relaxed,
}

/// Hosts whose certificates are accepted without verification. Everything
/// else is fetched with [`TlsMode::Strict`].
///
/// A relaxed fetch never follows redirects, so the exemption cannot carry over
/// to whatever host a listed one points at.
#[derive(Debug, Clone, Default)]
pub struct TrustPolicy {
    relaxed_hosts: Vec<String>,
}

impl TrustPolicy {
    pub fn strict() -> Self {
        TrustPolicy::default()
    }

    pub fn with_relaxed_hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TrustPolicy {
            relaxed_hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn mode_for(&self, url: &str) -> TlsMode {
        let Ok(parsed) = Url::parse(url) else {
            return TlsMode::Strict;
        };
        let Some(host) = parsed.host_str() else {
            return TlsMode::Strict;
        };
        if self
            .relaxed_hosts
            .iter()
            .any(|h| h.eq_ignore_ascii_case(host))
        {
            TlsMode::Relaxed
        } else {
            TlsMode::Strict
        }
    }
}

pub trait Fetch {
    fn fetch(&self, url: &str, dest: &Path, mode: TlsMode) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path, mode: TlsMode) -> Result<()> {
        fetch(url, dest, mode)
    }
}

/// Streams the body of `url` into `dest`, truncating any existing file.
///
/// A failure after the first byte leaves a truncated `dest` behind; it is not
/// removed here.
pub fn fetch(url: &str, dest: &Path, mode: TlsMode) -> Result<()> {
    let parsed = Url::parse(url).map_err(|_| ProvisionError::UnsupportedUrl {
        url: url.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ProvisionError::UnsupportedUrl {
            url: url.to_string(),
        });
    }
    if mode == TlsMode::Relaxed {
        tracing::warn!(host = parsed.host_str().unwrap_or(""), "certificate verification disabled");
    }

    let resp = agent(mode).get(parsed.as_str()).call().map_err(|err| match err {
        ureq::Error::StatusCode(status) => ProvisionError::Http {
            url: url.to_string(),
            status,
        },
        other => ProvisionError::Network {
            url: url.to_string(),
            source: Box::new(other),
        },
    })?;
    if resp.status().is_redirection() {
        return Err(ProvisionError::Http {
            url: url.to_string(),
            status: resp.status().as_u16(),
        });
    }
    let mut reader = resp.into_body().into_reader();

    let mut f = File::create(dest).with_io_context(|| format!("create {}", dest.display()))?;
    let mut buf = [0u8; 1024 * 64];
    let mut total: u64 = 0;
    loop {
        let n = reader.read(&mut buf).map_err(|err| ProvisionError::Network {
            url: url.to_string(),
            source: Box::new(err),
        })?;
        if n == 0 {
            break;
        }
        f.write_all(&buf[..n])
            .with_io_context(|| format!("write {}", dest.display()))?;
        total += n as u64;
    }
    f.flush()
        .with_io_context(|| format!("flush {}", dest.display()))?;

    tracing::debug!(url, bytes = total, dest = %dest.display(), "download complete");
    Ok(())
}

fn agent(mode: TlsMode) -> ureq::Agent {
    let config = match mode {
        TlsMode::Strict => ureq::Agent::config_builder()
            .tls_config(TlsConfig::default())
            .build(),
        TlsMode::Relaxed => ureq::Agent::config_builder()
            .tls_config(TlsConfig::builder().disable_verification(true).build())
            .max_redirects(0)
            .build(),
    };
    ureq::Agent::new_with_config(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_listed_hosts_are_relaxed() {
        let trust = TrustPolicy::with_relaxed_hosts(["gbdev.gg8.se", "gekkio.fi"]);
        assert_eq!(
            trust.mode_for("https://gbdev.gg8.se/files/roms/bootroms/cgb_boot.bin"),
            TlsMode::Relaxed
        );
        assert_eq!(trust.mode_for("https://GEKKIO.fi/files/x.zip"), TlsMode::Relaxed);
        assert_eq!(
            trust.mode_for("https://github.com/mattcurrie/dmg-acid2/releases/download/v1.0/dmg-acid2.gb"),
            TlsMode::Strict
        );
        assert_eq!(trust.mode_for("https://sub.gekkio.fi/x.zip"), TlsMode::Strict);
    }

    #[test]
    fn unparsable_urls_stay_strict() {
        let trust = TrustPolicy::with_relaxed_hosts(["gbdev.gg8.se"]);
        assert_eq!(trust.mode_for("gbdev.gg8.se/cgb_boot.bin"), TlsMode::Strict);
        assert_eq!(TrustPolicy::strict().mode_for("https://gbdev.gg8.se/"), TlsMode::Strict);
    }

    #[test]
    fn non_http_scheme_is_rejected_before_touching_dest() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("rom.gb");
        let err = fetch("ftp://example.invalid/rom.gb", &dest, TlsMode::Strict).unwrap_err();
        assert!(matches!(err, ProvisionError::UnsupportedUrl { .. }), "{err}");
        assert!(!dest.exists());
    }
}
