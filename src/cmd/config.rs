use anyhow::{bail, Result};

use panplay::{ConfigStore, DriveKind};

use super::Context;
use crate::ConfigAction;

pub async fn cmd_config(mut ctx: Context, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => show(&ctx).await,
        ConfigAction::SetCookie { drive, cookie } => {
            let Some(kind) = DriveKind::PRECEDENCE.into_iter().find(|k| k.id() == drive) else {
                bail!("unknown drive: {drive} (expected quark, ali or uc)");
            };
            if cookie.trim().is_empty() {
                bail!("cookie is empty");
            }
            let mut credential = ctx.store.get_config(kind.id()).await?.unwrap_or_default();
            credential.cookie = cookie;
            ctx.store.save_config(kind.id(), &credential).await?;
            println!("✅ Saved {kind} cookie");
            Ok(())
        }
        ConfigAction::SetConcurrency { limit } => {
            ctx.settings.set_concurrency_limit(limit);
            ctx.settings.save(&ctx.settings_path)?;
            println!("✅ Search concurrency: {}", ctx.settings.concurrency_limit);
            Ok(())
        }
        ConfigAction::SetSite { key } => {
            let aggregator = ctx.aggregator().await?;
            let site = aggregator.catalog().get(&key)?;
            println!("✅ Current site: {} ({})", site.name, site.key);
            ctx.settings.current_site = Some(key);
            ctx.settings.save(&ctx.settings_path)?;
            Ok(())
        }
    }
}

async fn show(ctx: &Context) -> Result<()> {
    let settings = &ctx.settings;
    println!("📁 Settings: {}", ctx.settings_path.display());
    println!(
        "   Catalog URL: {}",
        settings.config_url.as_deref().unwrap_or("(none)")
    );
    println!(
        "   Sites file: {}",
        settings
            .sites_file
            .as_ref()
            .map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
    );
    println!("   Search concurrency: {}", settings.concurrency_limit);
    println!("   Traversal concurrency: {}", settings.traversal_concurrency);
    println!("   Request timeout: {}s", settings.request_timeout().as_secs());
    println!(
        "   Current site: {}",
        settings.current_site.as_deref().unwrap_or("(none)")
    );

    println!("\n🔑 Drives:");
    for kind in DriveKind::PRECEDENCE {
        let configured = ctx
            .store
            .get_config(kind.id())
            .await?
            .is_some_and(|c| !c.cookie.trim().is_empty());
        let status = if configured { "configured" } else { "not configured" };
        println!("   {kind}: {status}");
    }
    Ok(())
}
