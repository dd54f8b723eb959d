//! Stream-proxy URL encoding.
//!
//! Drive media URLs need the drive's session cookie, which a video player
//! cannot send. Instead the player is given a URL on the local proxy process:
//!
//! ```text
//! http://<provider>.proxy?url=<base64url(target)>&cookie=<base64url(cookie)>
//! ```
//!
//! Both values use the URL-safe base64 alphabet without padding. The proxy
//! decodes them with [`decode`]; changing either side is a wire-format break.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tracing::error;
use url::Url;

use crate::error::{Error, Result};

/// Build the proxy URL for `target_url` fetched with `cookie`.
///
/// Returns `None` (and logs) if either value is empty.
#[must_use]
pub fn encode(provider: &str, target_url: &str, cookie: &str) -> Option<String> {
    if target_url.is_empty() || cookie.is_empty() {
        error!(provider, "Cannot build proxy URL: missing target URL or cookie");
        return None;
    }
    let url = URL_SAFE_NO_PAD.encode(target_url);
    let cookie = URL_SAFE_NO_PAD.encode(cookie);
    Some(format!("http://{provider}.proxy?url={url}&cookie={cookie}"))
}

/// Decoded parameters of a proxy URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    pub provider: String,
    pub url: String,
    pub cookie: String,
}

/// Reverse [`encode`].
pub fn decode(proxy_url: &str) -> Result<ProxyTarget> {
    let parsed =
        Url::parse(proxy_url).map_err(|e| Error::InvalidInput(format!("bad proxy URL: {e}")))?;
    let provider = parsed
        .host_str()
        .and_then(|h| h.strip_suffix(".proxy"))
        .ok_or_else(|| Error::InvalidInput(format!("not a proxy URL: {proxy_url}")))?
        .to_string();

    let param = |name: &str| -> Result<String> {
        let raw = parsed
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| Error::InvalidInput(format!("proxy URL has no {name} parameter")))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(raw.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("{name} is not base64url: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| Error::InvalidInput(format!("{name} is not UTF-8: {e}")))
    };

    Ok(ProxyTarget {
        provider,
        url: param("url")?,
        cookie: param("cookie")?,
    })
}
