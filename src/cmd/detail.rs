use anyhow::{Context as _, Result};

use panplay::PlayUrl;

use super::Context;

pub async fn cmd_detail(ctx: &Context, site: Option<&str>, id: &str, json: bool) -> Result<()> {
    let site = site
        .or(ctx.settings.current_site.as_deref())
        .context("no site selected: pass --site or run `panplay config set-site <key>`")?;
    let aggregator = ctx.aggregator().await?;
    let detail = aggregator.detail(site, id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    println!("🎬 {} ({})", detail.vod_name, detail.vod_id);
    if !detail.vod_pic.is_empty() {
        println!("   Poster: {}", detail.vod_pic);
    }

    let play_url = match &detail.vod_play_url {
        PlayUrl::Ready(url) => url.clone(),
        PlayUrl::ShareLinks(links) => links.join("$$$"),
    };
    let labels: Vec<&str> = detail
        .vod_play_from
        .as_deref()
        .map(|from| from.split("$$$").collect())
        .unwrap_or_default();

    for (i, segment) in play_url.split("$$$").enumerate() {
        let label = labels.get(i).copied().unwrap_or("-");
        println!("\n▶ {label}");
        for entry in segment.split('#').filter(|e| !e.is_empty()) {
            match entry.split_once('$') {
                Some((name, id)) => println!("   {name}\n      {id}"),
                None => println!("   {entry}"),
            }
        }
    }
    Ok(())
}
