//! `panplay` - video listing aggregator with cloud-drive playback
//!
//! # Features
//!
//! - **Search**: one keyword fanned out to every configured site, bounded concurrency
//! - **Provider protocols**: JSON listing APIs, placeholder sites, HTML scrapers
//! - **Share links**: Quark share folders resolved into play lists
//! - **Playback**: transfer-then-transcode, served through a local stream proxy
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use panplay::{Aggregator, FileConfigStore, Settings};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load_default()?;
//!     let aggregator = Aggregator::from_settings(&settings, Arc::new(FileConfigStore::open_default())).await?;
//!     aggregator
//!         .search(
//!             "dune",
//!             |site, items| println!("{}: {} results", site.name, items.len()),
//!             |done, total| eprintln!("{done}/{total}"),
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod drive;
pub mod error;
pub mod handler;
pub mod http_client;
pub mod provider;
pub mod proxy;
pub mod search;
pub mod service;
pub mod spider;

#[cfg(test)]
mod test_server;

pub use config::{ConfigStore, DriveCredential, FileConfigStore, MemoryConfigStore, Settings, SiteCatalog};
pub use drive::{DriveKind, DriveRegistry, MediaType, PlayerInfo, QuarkDrive, ShareLinkResolver};
pub use error::{Error, Result};
pub use handler::{HandlerRegistry, ProviderHandler};
pub use http_client::HttpClient;
pub use provider::{PlayUrl, ProtocolVariant, Provider, SearchResult, VodDetail, VodItem};
pub use search::{SearchDispatcher, SearchSummary};
pub use service::Aggregator;
pub use spider::{Spider, SpiderRegistry};

/// Version of panplay
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
