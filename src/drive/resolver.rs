//! Share-link resolution.
//!
//! Detail pages of scraped sites list raw share links. The resolver turns
//! that list into the two aligned strings a player expects:
//!
//! - play URLs: one segment per link, joined by `$$$`
//! - play labels: one label per link, joined by `$$$`
//!
//! A link that fails to resolve yields a placeholder segment in its place, so
//! position `i` of both strings always describes input link `i`.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::quark::{QuarkDrive, ShareData};
use super::registry::DriveRegistry;
use super::{DriveKind, PlayerInfo};
use crate::error::{Error, Result};

/// Separator between per-link segments.
pub const SEGMENT_SEPARATOR: &str = "$$$";

/// Label of a link that belongs to no known drive.
pub const DIRECT_LABEL: &str = "direct";

fn placeholder(kind: &str, link: &str) -> String {
    format!("{kind}${link}")
}

pub struct ShareLinkResolver {
    drives: Arc<DriveRegistry>,
}

impl ShareLinkResolver {
    #[must_use]
    pub fn new(drives: Arc<DriveRegistry>) -> Self {
        Self { drives }
    }

    /// Play URL segments of `links`, joined by [`SEGMENT_SEPARATOR`].
    ///
    /// Links are resolved concurrently; output order follows input order.
    pub async fn resolve_play_urls(&self, links: &[String]) -> String {
        let segments = join_all(links.iter().map(|link| self.resolve_link(link))).await;
        if let Some(quark) = self.drives.loaded_quark() {
            self.persist_rotation(&quark).await;
        }
        segments.join(SEGMENT_SEPARATOR)
    }

    /// Play labels of `links`, joined by [`SEGMENT_SEPARATOR`].
    #[must_use]
    pub fn resolve_play_labels(&self, links: &[String]) -> String {
        play_labels(links)
    }

    async fn resolve_link(&self, link: &str) -> String {
        match DriveKind::classify(link) {
            None => placeholder("direct", link),
            Some(DriveKind::Quark) => {
                if ShareData::from_link(link).is_none() {
                    return placeholder("invalid", link);
                }
                let result = match self.drives.quark().await {
                    Ok(drive) => drive.play_list(link).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(segment) => segment,
                    Err(e) => {
                        warn!(link, error = %e, "Failed to resolve share link");
                        placeholder("failed", link)
                    }
                }
            }
            Some(kind) => {
                debug!(link, drive = %kind, "No client for drive");
                placeholder("unsupported", link)
            }
        }
    }

    /// Playable URL for an entry of a resolved play list.
    ///
    /// `flag` is the entry's label; its drive prefix picks the client. Entries
    /// without a drive prefix are direct links and are returned as-is.
    pub async fn player_content(&self, flag: &str, id: &str) -> Result<PlayerInfo> {
        match DriveKind::from_flag(flag) {
            Some(DriveKind::Quark) => {
                let drive = self.drives.quark().await?;
                let result = drive.player_content(id).await;
                self.persist_rotation(&drive).await;
                result
            }
            Some(kind) => Err(Error::UnsupportedDrive(kind.id().to_string())),
            None => Ok(PlayerInfo::direct(id)),
        }
    }

    /// Save the client's cookie if the server rotated it. Failures are logged.
    async fn persist_rotation(&self, drive: &QuarkDrive) {
        let Some(cookie) = drive.take_rotated_cookie().await else {
            return;
        };
        let id = DriveKind::Quark.id();
        let store = self.drives.store();
        let result = async {
            let mut credential = store.get_config(id).await?.unwrap_or_default();
            credential.cookie = cookie;
            store.save_config(id, &credential).await
        }
        .await;
        match result {
            Ok(()) => info!(drive = id, "Persisted rotated session cookie"),
            Err(e) => warn!(drive = id, error = %e, "Failed to persist rotated session cookie"),
        }
    }
}

/// Labels of `links`, joined by [`SEGMENT_SEPARATOR`].
#[must_use]
pub fn play_labels(links: &[String]) -> String {
    links
        .iter()
        .enumerate()
        .map(|(i, link)| match DriveKind::classify(link) {
            Some(kind) => kind.label(i + 1),
            None => DIRECT_LABEL.to_string(),
        })
        .collect::<Vec<_>>()
        .join(SEGMENT_SEPARATOR)
}
