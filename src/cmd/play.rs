use anyhow::Result;

use panplay::service::build_resolver;
use panplay::HttpClient;

use super::Context;

pub async fn cmd_play(ctx: &Context, flag: &str, id: &str) -> Result<()> {
    let client = HttpClient::with_timeout(ctx.settings.request_timeout())?;
    let resolver = build_resolver(client, &ctx.settings, ctx.store.clone());

    let info = resolver.player_content(flag, id).await?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
