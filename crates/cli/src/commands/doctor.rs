//! `chatrelay doctor`: Diagnose configuration and storage.

use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("chatrelay doctor");
    println!("================\n");

    let mut issues = 0;

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            return Err(e);
        }
    };

    if config.telegram.bot_token.as_deref().is_some_and(|t| !t.is_empty()) {
        println!("  ✅ Telegram bot token configured");
    } else {
        println!("  ❌ No Telegram bot token: set telegram.bot_token or TELEGRAM_TOKEN");
        issues += 1;
    }

    if config.telegram.webhook_secret.as_deref().is_some_and(|s| !s.is_empty()) {
        println!("  ✅ Webhook secret configured");
    } else {
        println!("  ❌ No webhook secret: set telegram.webhook_secret or X_TELEGRAM_BOT_HEADER (every update is rejected without it)");
        issues += 1;
    }

    if config.provider.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        println!("  ✅ Provider API key configured ({})", config.provider.name);
    } else {
        println!("  ❌ No provider API key: set provider.api_key or OPENAI_API_KEY");
        issues += 1;
    }

    match chatrelay_agent::resolve_budget(&config) {
        Ok(budget) => println!(
            "  ✅ Model {} → context budget {} chars",
            config.model,
            budget.chars()
        ),
        Err(e) => {
            println!("  ❌ {e}: add it under [context.model_limits] or set context.budget_chars");
            issues += 1;
        }
    }

    match super::open_history(&config).await {
        Ok(store) => match store.ping().await {
            Ok(()) => println!("  ✅ History store reachable ({})", store.name()),
            Err(e) => {
                println!("  ❌ History store ping failed: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ History store unavailable: {e}");
            issues += 1;
        }
    }

    match &config.summary_queue {
        Some(queue) => println!("  ✅ Summary queue: {}", queue.url),
        None => println!("  ℹ️  No summary queue: /summary_url disabled"),
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
