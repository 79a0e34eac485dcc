//! One-shot CLI commands.

use std::collections::BTreeMap;

use tokio::sync::broadcast::error::RecvError;

use fanout_config::{Config, ConfigValidator};
use fanout_protocols::{CoordinatorEvent, QueryOutcome};

use crate::app::App;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Last `max` characters of `text`, on one line.
fn tail(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let count = flat.chars().count();
    if count <= max {
        flat
    } else {
        let skipped: String = flat.chars().skip(count - max).collect();
        format!("...{}", skipped)
    }
}

/// Fan a prompt out and print progress while waiting.
pub(crate) async fn query(app: &App, prompt: &str, platforms: Vec<String>, json: bool) -> CmdResult {
    let platforms = if platforms.is_empty() {
        app.coordinator.registry().enabled()
    } else {
        platforms
    };
    if platforms.is_empty() {
        return Err("no platforms enabled; pass --platform or set platforms.enabled".into());
    }

    let mut events = app.coordinator.subscribe();
    let progress = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(CoordinatorEvent::Progress { platform, text, .. }) => {
                    eprintln!("[{}] ... {}", platform, tail(&text, 60));
                }
                Ok(CoordinatorEvent::Final { platform, .. }) => {
                    eprintln!("[{}] done", platform);
                }
                Ok(CoordinatorEvent::Error { platform, error }) => {
                    eprintln!("[{}] failed: {}", platform, error);
                }
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });

    let results = app.coordinator.fan_out(prompt, &platforms).await;
    progress.abort();

    if json {
        let outcomes: BTreeMap<_, _> = results
            .into_iter()
            .map(|(platform, result)| (platform, QueryOutcome::from(result)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    for (platform, result) in results {
        println!();
        match result {
            Ok(text) => {
                println!("=== {} ===", platform);
                println!("{}", text);
            }
            Err(e) => {
                println!("=== {} (failed) ===", platform);
                println!("{}", e);
            }
        }
    }
    Ok(())
}

pub(crate) async fn check(app: &App, platform: Option<String>) -> CmdResult {
    let platforms = match platform {
        Some(platform) => vec![platform],
        None => app.coordinator.registry().list_ids(),
    };

    for platform in platforms {
        let status = app.coordinator.check_connection(&platform).await;
        let mark = if status.connected { "ok" } else { "--" };
        println!("{:<2}  {:<10} {}", mark, status.platform, status.message);
    }
    Ok(())
}

pub(crate) async fn tabs(app: &App) -> CmdResult {
    let tabs = app.coordinator.list_tabs().await?;
    println!("{} tab(s)", tabs.len());
    for tab in tabs {
        println!("{:<34} {}\n{:<34} {}", tab.id, tab.title, "", tab.url);
    }
    Ok(())
}

pub(crate) fn platforms(app: &App) -> CmdResult {
    let registry = app.coordinator.registry();
    let enabled = registry.enabled();
    for target in registry.targets() {
        let mark = if enabled.contains(&target.id) { "*" } else { " " };
        println!(
            "{} {:<10} {:<12} {:<32} {}",
            mark,
            target.id,
            target.name,
            target.pattern.to_string(),
            target.script
        );
    }
    println!("\n* = enabled");
    Ok(())
}

pub(crate) fn config_validate(config: &Config) -> CmdResult {
    let result = ConfigValidator::validate(config)?;
    for error in &result.errors {
        println!("error   {}: {}", error.path, error.message);
    }
    for warning in &result.warnings {
        println!("warning {}: {}", warning.path, warning.message);
    }

    if result.is_valid() {
        println!("Configuration is valid ({} warning(s))", result.warnings.len());
        Ok(())
    } else {
        Err(format!("{} configuration error(s)", result.errors.len()).into())
    }
}

pub(crate) fn config_show(config: &Config) -> CmdResult {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
