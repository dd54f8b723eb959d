//! Cloud-drive share links: classification, clients and playback descriptors.
//!
//! Share links found on detail pages point into a cloud drive's shared-folder
//! namespace. [`ShareLinkResolver`] turns them into play lists and playable
//! URLs, lazily creating one drive client per drive through [`DriveRegistry`].
//!
//! Only Quark has a client. Ali and UC links are recognised so they can be
//! reported as unsupported instead of being mistaken for direct media URLs.

pub mod credential;
pub mod quark;
pub mod registry;
pub mod resolver;
pub mod transport;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

pub use credential::SessionCookie;
pub use quark::{PlayId, QuarkDrive, QuarkOptions, ShareData, VideoFile};
pub use registry::DriveRegistry;
pub use resolver::ShareLinkResolver;
pub use transport::{ApiMethod, ApiRequest, ApiResponse, DriveEndpoint, DriveTransport, HttpTransport};

static ALI_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(alipan|aliyundrive)\.com").expect("valid regex"));
static QUARK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pan\.quark\.cn/s/").expect("valid regex"));
static UC_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"drive\.uc\.cn").expect("valid regex"));

/// Transcoding tier named in Quark play labels.
const QUARK_TIER: &str = "normal";

/// A known cloud drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveKind {
    Ali,
    Quark,
    Uc,
}

impl DriveKind {
    /// Classification order; the first matching drive owns a link.
    pub const PRECEDENCE: [Self; 3] = [Self::Ali, Self::Quark, Self::Uc];

    /// Drive id, also the credential store key and the play-flag prefix.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Ali => "ali",
            Self::Quark => "quark",
            Self::Uc => "uc",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Self::Ali => &ALI_PATTERN,
            Self::Quark => &QUARK_PATTERN,
            Self::Uc => &UC_PATTERN,
        }
    }

    #[must_use]
    pub fn matches(self, link: &str) -> bool {
        self.pattern().is_match(link)
    }

    /// Drive owning `link`, or `None` for a direct media link.
    #[must_use]
    pub fn classify(link: &str) -> Option<Self> {
        Self::PRECEDENCE.into_iter().find(|kind| kind.matches(link))
    }

    /// Drive named by a play flag such as `quarknormal#01`.
    #[must_use]
    pub fn from_flag(flag: &str) -> Option<Self> {
        Self::PRECEDENCE
            .into_iter()
            .find(|kind| flag.starts_with(kind.id()))
    }

    /// Play label of the link at 1-based `position`.
    #[must_use]
    pub fn label(self, position: usize) -> String {
        match self {
            Self::Quark => format!("quark{QUARK_TIER}#{position:02}"),
            Self::Ali | Self::Uc => self.id().to_string(),
        }
    }
}

impl fmt::Display for DriveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Container type of a playable URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "m3u8")]
    Hls,
    #[serde(rename = "mp4")]
    Mp4,
    #[default]
    #[serde(rename = "")]
    Unknown,
}

impl MediaType {
    /// Type of a transcoded drive URL: HLS if it carries `.m3u8`, else MP4.
    #[must_use]
    pub fn classify_transcoded(url: &str) -> Self {
        if url.contains(".m3u8") {
            Self::Hls
        } else {
            Self::Mp4
        }
    }

    /// Type of a direct link, sniffed from the URL path extension.
    ///
    /// Strings that do not parse as URLs fall back to a substring check.
    #[must_use]
    pub fn classify_direct(link: &str) -> Self {
        if let Ok(url) = Url::parse(link) {
            let path = url.path().to_ascii_lowercase();
            return if path.ends_with(".m3u8") {
                Self::Hls
            } else if path.ends_with(".mp4") {
                Self::Mp4
            } else {
                Self::Unknown
            };
        }
        let lower = link.to_ascii_lowercase();
        if lower.contains(".m3u8") {
            Self::Hls
        } else if lower.contains(".mp4") {
            Self::Mp4
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hls => "m3u8",
            Self::Mp4 => "mp4",
            Self::Unknown => "",
        }
    }
}

/// Resolved playback descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    /// Drive that produced the URL; `None` for direct links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive: Option<DriveKind>,
    /// Id of the transferred private copy.
    #[serde(default, rename = "saveFileId", skip_serializing_if = "Option::is_none")]
    pub save_file_id: Option<String>,
}

impl PlayerInfo {
    /// Wrap a direct media link.
    #[must_use]
    pub fn direct(link: &str) -> Self {
        Self {
            url: link.to_string(),
            media_type: MediaType::classify_direct(link),
            drive: None,
            save_file_id: None,
        }
    }
}
