//! Wogg (玩偶) HTML scraper.
//!
//! Search results come from the site's vodsearch page; detail pages carry the
//! cloud-drive share links the resolver turns into playable streams, so
//! `vod_play_url` is returned as the raw [`PlayUrl::ShareLinks`] sequence.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use tracing::debug;

use super::Spider;
use crate::error::{Error, Result};
use crate::http_client::{HttpClient, SEARCH_TIMEOUT};
use crate::provider::{PlayUrl, VodDetail, VodItem};

const WOGG_SITE_URL: &str = "https://www.wogg.one";

pub struct WoggSpider {
    client: HttpClient,
    site_url: String,
}

impl WoggSpider {
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self::with_site_url(client, WOGG_SITE_URL)
    }

    /// Point the scraper at a mirror.
    #[must_use]
    pub fn with_site_url(client: HttpClient, site_url: &str) -> Self {
        Self {
            client,
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, keyword: &str, page: u32) -> String {
        format!(
            "{}/index.php/vodsearch/{}----------{page}---.html",
            self.site_url,
            urlencoding::encode(keyword)
        )
    }
}

#[async_trait]
impl Spider for WoggSpider {
    fn name(&self) -> &'static str {
        "csp_WoGGGuard"
    }

    async fn search(&self, keyword: &str, page: u32) -> Result<Vec<VodItem>> {
        let url = self.search_url(keyword, page);
        let html = self.client.fetch_text(&url, SEARCH_TIMEOUT).await?;
        let items = parse_search(&html, &self.site_url)?;
        debug!(count = items.len(), keyword, "Wogg search parsed");
        Ok(items)
    }

    async fn detail(&self, id: &str) -> Result<VodDetail> {
        if id.is_empty() {
            return Err(Error::InvalidInput("empty video id".into()));
        }
        let url = complete_url(&self.site_url, id);
        let html = self.client.fetch_text(&url, self.client.timeout()).await?;
        parse_detail(&html, id, &self.site_url)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::protocol(format!("bad selector {css}: {e:?}")))
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn joined_text(root: ElementRef<'_>, css: &str) -> Result<String> {
    let sel = selector(css)?;
    Ok(root.select(&sel).map(text_of).collect::<Vec<_>>().join(","))
}

/// Resolve `relative` against `base`; absolute and empty values pass through.
fn complete_url(base: &str, relative: &str) -> String {
    if relative.is_empty() || relative.starts_with("http") {
        return relative.to_string();
    }
    url::Url::parse(base)
        .and_then(|b| b.join(relative))
        .map_or_else(|_| relative.to_string(), String::from)
}

/// Parse the `.module-search-item` cards of a search page.
pub(crate) fn parse_search(html: &str, site_url: &str) -> Result<Vec<VodItem>> {
    let document = Html::parse_document(html);
    let item_sel = selector(".module-search-item")?;
    let serial_sel = selector(".video-serial")?;
    let pic_sel = selector(".module-item-pic > img")?;
    let tag_sel = selector(".video-tag-icon")?;

    let mut items = Vec::new();
    for card in document.select(&item_sel) {
        let serial = card.select(&serial_sel).next();
        let vod_id = serial
            .and_then(|s| s.value().attr("href"))
            .unwrap_or_default();
        let vod_name = serial
            .and_then(|s| s.value().attr("title"))
            .unwrap_or_default();
        if vod_id.is_empty() || vod_name.is_empty() {
            continue;
        }
        let pic = card
            .select(&pic_sel)
            .next()
            .and_then(|img| img.value().attr("data-src"))
            .unwrap_or_default();
        let remarks = card.select(&tag_sel).next().map(text_of).unwrap_or_default();

        items.push(VodItem {
            vod_id: vod_id.to_string(),
            vod_name: vod_name.to_string(),
            vod_pic: complete_url(site_url, pic),
            vod_remarks: remarks,
            extra: Map::new(),
        });
    }
    Ok(items)
}

/// Parse a detail page into a record whose play URL is the raw share-link list.
pub(crate) fn parse_detail(html: &str, vod_id: &str, site_url: &str) -> Result<VodDetail> {
    let document = Html::parse_document(html);
    let first_text = |css: &str| -> Result<String> {
        let sel = selector(css)?;
        Ok(document.select(&sel).next().map(text_of).unwrap_or_default())
    };

    let vod_name = first_text(".video-info-header > .page-title")?;
    let pic_sel = selector(".module-item-pic img")?;
    let vod_pic = document
        .select(&pic_sel)
        .next()
        .and_then(|img| img.value().attr("data-src"))
        .map(|src| complete_url(site_url, src))
        .unwrap_or_default();

    let mut extra = Map::new();
    extra.insert(
        "vod_area".into(),
        Value::String(first_text(".video-info-header a.tag-link:last-child")?),
    );
    extra.insert(
        "type_name".into(),
        Value::String(joined_text(
            document.root_element(),
            ".video-info-header div.tag-link a",
        )?),
    );

    let link_sel = selector(".module-row-text")?;
    let share_links: Vec<String> = document
        .select(&link_sel)
        .filter_map(|el| el.value().attr("data-clipboard-text"))
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .map(String::from)
        .collect();

    // Each info item is labelled by the element right before it.
    let info_sel = selector(".video-info-item")?;
    let summary_sel = selector(".sqjj_a")?;
    let anchor_sel = selector("a")?;
    for item in document.select(&info_sel) {
        let label = item
            .prev_siblings()
            .find_map(ElementRef::wrap)
            .map(text_of)
            .unwrap_or_default();
        let (field, value) = if label.contains("导演") {
            ("vod_director", joined_text(item, "a")?)
        } else if label.contains("主演") {
            ("vod_actor", joined_text(item, "a")?)
        } else if label.contains("年代") {
            let year = item.select(&anchor_sel).next().map(text_of).unwrap_or_default();
            ("vod_year", year)
        } else if label.contains("备注") {
            ("vod_remarks", text_of(item))
        } else if label.contains("剧情") {
            let content = item
                .select(&summary_sel)
                .next()
                .map(|el| text_of(el).replace("[收起部分]", "").trim().to_string())
                .unwrap_or_default();
            ("vod_content", content)
        } else {
            continue;
        };
        extra.insert(field.into(), Value::String(value));
    }

    Ok(VodDetail {
        vod_id: vod_id.to_string(),
        vod_name,
        vod_pic,
        vod_play_from: None,
        vod_play_url: PlayUrl::ShareLinks(share_links),
        extra,
    })
}
