use anyhow::Result;
use tracing::debug;

use super::Context;

pub async fn cmd_search(ctx: &Context, keyword: &str, json: bool) -> Result<()> {
    let aggregator = ctx.aggregator().await?;
    let mut collected = Vec::new();

    let summary = aggregator
        .search(
            keyword,
            |site, items| {
                if !json {
                    println!("📺 {} ({} results)", site.name, items.len());
                    for result in &items {
                        let item = &result.item;
                        println!("   {} | {} | {}", item.vod_id, item.vod_name, item.vod_remarks);
                    }
                }
                collected.extend(items);
            },
            |done, total| debug!(done, total, "Search progress"),
        )
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&collected)?);
    } else {
        println!(
            "\n✅ {} results from {}/{} sites ({} failed)",
            summary.items, summary.succeeded, summary.total, summary.failed
        );
    }
    Ok(())
}
