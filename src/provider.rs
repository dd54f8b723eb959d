//! Provider and listing data model.
//!
//! A [`Provider`] is one entry of the site catalog. Its protocol variant
//! decides which [`ProviderHandler`](crate::handler::ProviderHandler) talks
//! to it. Handlers return normalized [`VodItem`]s and [`VodDetail`]s, which
//! keep every field the upstream sent so callers can render extra columns.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Protocol variant tag declared by a provider (`type` in the catalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ProtocolVariant {
    /// JSON CMS API queried with `ac=detail`.
    DirectApi,
    /// Reserved for an HTML scraping strategy; searches return nothing.
    Placeholder,
    /// `api` names a scraper that handles the provider.
    SecondaryDispatch,
    /// Any tag without a built-in meaning.
    Other(i64),
}

impl ProtocolVariant {
    /// Numeric tag as written in the catalog.
    #[must_use]
    pub fn tag(self) -> i64 {
        match self {
            Self::DirectApi => 1,
            Self::Placeholder => 2,
            Self::SecondaryDispatch => 3,
            Self::Other(tag) => tag,
        }
    }
}

impl From<i64> for ProtocolVariant {
    fn from(tag: i64) -> Self {
        match tag {
            1 => Self::DirectApi,
            2 => Self::Placeholder,
            3 => Self::SecondaryDispatch,
            other => Self::Other(other),
        }
    }
}

impl From<ProtocolVariant> for i64 {
    fn from(variant: ProtocolVariant) -> Self {
        variant.tag()
    }
}

impl std::fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A configured content source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// Unique catalog key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Endpoint URL, or a scraper name for [`ProtocolVariant::SecondaryDispatch`].
    #[serde(default)]
    pub api: String,
    #[serde(rename = "type")]
    pub variant: ProtocolVariant,
    #[serde(default, deserialize_with = "bool_or_int")]
    pub searchable: bool,
}

/// One item of a provider listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VodItem {
    #[serde(deserialize_with = "string_or_number")]
    pub vod_id: String,
    #[serde(default, deserialize_with = "text_or_null")]
    pub vod_name: String,
    #[serde(default, deserialize_with = "text_or_null")]
    pub vod_pic: String,
    #[serde(default, deserialize_with = "text_or_null")]
    pub vod_remarks: String,
    /// Fields the normalized shape does not name.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A listing item tagged with the provider it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub item: VodItem,
    #[serde(rename = "sourceKey")]
    pub source_key: String,
    #[serde(rename = "sourceSite")]
    pub source_name: String,
}

impl SearchResult {
    #[must_use]
    pub fn new(item: VodItem, provider: &Provider) -> Self {
        Self {
            item,
            source_key: provider.key.clone(),
            source_name: provider.name.clone(),
        }
    }
}

/// `{"list": [...]}` envelope of listing responses. A missing `list` fails to parse.
#[derive(Debug, Deserialize)]
pub struct Listing {
    pub list: Vec<VodItem>,
}

/// Play URL field of a detail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayUrl {
    /// Already in `name$url#name$url` form.
    Ready(String),
    /// Raw share links still to be resolved.
    ShareLinks(Vec<String>),
}

impl Default for PlayUrl {
    fn default() -> Self {
        Self::Ready(String::new())
    }
}

/// Full record of one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VodDetail {
    #[serde(deserialize_with = "string_or_number")]
    pub vod_id: String,
    #[serde(default, deserialize_with = "text_or_null")]
    pub vod_name: String,
    #[serde(default, deserialize_with = "text_or_null")]
    pub vod_pic: String,
    #[serde(default)]
    pub vod_play_from: Option<String>,
    #[serde(default, deserialize_with = "play_url_or_null")]
    pub vod_play_url: PlayUrl,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `{"list": [detail]}` envelope of detail responses.
#[derive(Debug, Deserialize)]
pub struct DetailListing {
    pub list: Vec<VodDetail>,
}

impl DetailListing {
    /// The single record a detail response must carry.
    pub fn into_first(self) -> Result<VodDetail> {
        self.list
            .into_iter()
            .next()
            .ok_or_else(|| Error::protocol("detail response contains no record"))
    }
}

fn bool_or_int<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<bool, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    })
}

fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Display text that upstreams sometimes send as a number or `null`.
fn text_or_null<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(de)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!("expected text, got {other}"))),
    }
}

fn play_url_or_null<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<PlayUrl, D::Error> {
    Ok(Option::<PlayUrl>::deserialize(de)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_integer_flags() {
        let json = r#"{"key":"a","name":"A","api":"https://a.example/api","type":1,"searchable":1}"#;
        let provider: Provider = serde_json::from_str(json).unwrap();
        assert_eq!(provider.variant, ProtocolVariant::DirectApi);
        assert!(provider.searchable);
    }

    #[test]
    fn unknown_variant_keeps_its_tag() {
        let json = r#"{"key":"a","name":"A","type":9}"#;
        let provider: Provider = serde_json::from_str(json).unwrap();
        assert_eq!(provider.variant, ProtocolVariant::Other(9));
        assert_eq!(provider.variant.tag(), 9);
        assert!(!provider.searchable);
    }

    #[test]
    fn listing_requires_list_field() {
        assert!(serde_json::from_str::<Listing>(r#"{"code":1}"#).is_err());
        let listing: Listing =
            serde_json::from_str(r#"{"list":[{"vod_id":42,"vod_name":"x","type_name":"Movie"}]}"#)
                .unwrap();
        assert_eq!(listing.list[0].vod_id, "42");
        assert_eq!(listing.list[0].extra["type_name"], "Movie");
    }

    #[test]
    fn null_text_fields_become_empty() {
        let listing: Listing = serde_json::from_str(
            r#"{"list":[{"vod_id":1,"vod_name":"A","vod_pic":null,"vod_remarks":2024}]}"#,
        )
        .unwrap();
        let item = &listing.list[0];
        assert_eq!(item.vod_pic, "");
        assert_eq!(item.vod_remarks, "2024");

        let detail: VodDetail =
            serde_json::from_str(r#"{"vod_id":"1","vod_name":null,"vod_play_url":null}"#).unwrap();
        assert_eq!(detail.vod_name, "");
        assert_eq!(detail.vod_play_url, PlayUrl::default());
    }

    #[test]
    fn play_url_accepts_string_or_links() {
        let ready: VodDetail =
            serde_json::from_str(r#"{"vod_id":"1","vod_play_url":"ep1$http://a/1.m3u8"}"#).unwrap();
        assert_eq!(ready.vod_play_url, PlayUrl::Ready("ep1$http://a/1.m3u8".into()));

        let links: VodDetail =
            serde_json::from_str(r#"{"vod_id":"1","vod_play_url":["https://pan.quark.cn/s/abc"]}"#)
                .unwrap();
        assert_eq!(
            links.vod_play_url,
            PlayUrl::ShareLinks(vec!["https://pan.quark.cn/s/abc".into()])
        );
    }

    #[test]
    fn search_result_serializes_provenance() {
        let provider = Provider {
            key: "k".into(),
            name: "Site".into(),
            api: String::new(),
            variant: ProtocolVariant::DirectApi,
            searchable: true,
        };
        let item: VodItem = serde_json::from_str(r#"{"vod_id":"1","vod_name":"x"}"#).unwrap();
        let value = serde_json::to_value(SearchResult::new(item, &provider)).unwrap();
        assert_eq!(value["sourceKey"], "k");
        assert_eq!(value["sourceSite"], "Site");
        assert_eq!(value["vod_name"], "x");
    }
}
