//! Interactive configuration editor, built on dialoguer.

use std::path::{Path, PathBuf};

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

use crate::types::config::Config;
use crate::JakasResult;

/// Runs the interactive editor and saves on request.
pub fn run_interactive_config(config_path: &Path) -> JakasResult<()> {
    let theme = ColorfulTheme::default();

    println!("\n🔧 jakas configuration\n");

    let mut config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        println!("Creating a new configuration...\n");
        Config::default_config()
    };

    loop {
        let options = [
            "General",
            "Storage",
            "Scorer",
            "Cache",
            "Retry policy",
            "Save and exit",
            "Exit without saving",
        ];

        let selection = Select::with_theme(&theme)
            .with_prompt("What do you want to configure?")
            .items(&options)
            .default(0)
            .interact()?;

        match selection {
            0 => configure_general(&theme, &mut config)?,
            1 => configure_store(&theme, &mut config)?,
            2 => configure_scorer(&theme, &mut config)?,
            3 => configure_cache(&theme, &mut config)?,
            4 => configure_poll(&theme, &mut config)?,
            5 => {
                config.save(config_path)?;
                println!("\n✓ Configuration saved to: {}\n", config_path.display());
                break;
            }
            6 => {
                if Confirm::with_theme(&theme)
                    .with_prompt("Really exit without saving?")
                    .default(false)
                    .interact()?
                {
                    println!("\nExiting without saving.\n");
                    break;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn configure_general(theme: &ColorfulTheme, config: &mut Config) -> JakasResult<()> {
    let log_levels = ["error", "warn", "info", "debug", "trace"];
    let current_idx = log_levels
        .iter()
        .position(|&l| l == config.general.log_level)
        .unwrap_or(2);

    let log_level_idx = Select::with_theme(theme)
        .with_prompt("Log level")
        .items(&log_levels)
        .default(current_idx)
        .interact()?;
    config.general.log_level = log_levels[log_level_idx].to_string();

    let log_formats = ["text", "json"];
    let current_format_idx = log_formats
        .iter()
        .position(|&f| f == config.general.log_format)
        .unwrap_or(0);

    let log_format_idx = Select::with_theme(theme)
        .with_prompt("Log format")
        .items(&log_formats)
        .default(current_format_idx)
        .interact()?;
    config.general.log_format = log_formats[log_format_idx].to_string();

    Ok(())
}

fn configure_store(theme: &ColorfulTheme, config: &mut Config) -> JakasResult<()> {
    let db_path: String = Input::with_theme(theme)
        .with_prompt("Database path")
        .default(config.store.db_path.display().to_string())
        .interact_text()?;
    config.store.db_path = PathBuf::from(db_path);

    Ok(())
}

fn configure_scorer(theme: &ColorfulTheme, config: &mut Config) -> JakasResult<()> {
    let command: String = Input::with_theme(theme)
        .with_prompt("Command")
        .default(config.scorer.command.clone())
        .interact_text()?;
    config.scorer.command = command;

    let args: String = Input::with_theme(theme)
        .with_prompt("Arguments (space separated)")
        .default(config.scorer.args.join(" "))
        .allow_empty(true)
        .interact_text()?;
    config.scorer.args = args.split_whitespace().map(String::from).collect();

    let model: String = Input::with_theme(theme)
        .with_prompt("Model")
        .default(config.scorer.model.clone())
        .allow_empty(true)
        .interact_text()?;
    config.scorer.model = model;

    let timeout: u64 = Input::with_theme(theme)
        .with_prompt("Timeout (seconds)")
        .default(config.scorer.timeout_secs)
        .interact_text()?;
    config.scorer.timeout_secs = timeout.max(1);

    println!("\n✓ Scorer configured.\n");
    Ok(())
}

fn configure_cache(theme: &ColorfulTheme, config: &mut Config) -> JakasResult<()> {
    let ttl: u64 = Input::with_theme(theme)
        .with_prompt("Score freshness (seconds)")
        .default(config.cache.ttl_secs)
        .interact_text()?;
    config.cache.ttl_secs = ttl;

    config.cache.invalidate_on_review_change = Confirm::with_theme(theme)
        .with_prompt("Recompute when reviews change?")
        .default(config.cache.invalidate_on_review_change)
        .interact()?;

    config.cache.enabled = Confirm::with_theme(theme)
        .with_prompt("Keep recent scores in memory?")
        .default(config.cache.enabled)
        .interact()?;

    if config.cache.enabled {
        let capacity: usize = Input::with_theme(theme)
            .with_prompt("Memory capacity (records)")
            .default(config.cache.capacity)
            .interact_text()?;
        config.cache.capacity = capacity;
    }

    println!("\n✓ Cache configured.\n");
    Ok(())
}

fn configure_poll(theme: &ColorfulTheme, config: &mut Config) -> JakasResult<()> {
    let interval: u64 = Input::with_theme(theme)
        .with_prompt("Delay between attempts (ms)")
        .default(config.poll.interval_ms)
        .interact_text()?;
    config.poll.interval_ms = interval;

    let attempts: u32 = Input::with_theme(theme)
        .with_prompt("Maximum attempts")
        .default(config.poll.max_attempts)
        .interact_text()?;
    config.poll.max_attempts = attempts.max(1);

    Ok(())
}

/// Prints a summary of the current configuration.
pub fn show_config_summary(config: &Config) {
    println!("\n📋 Current configuration\n");
    println!("  Log level:      {}", config.general.log_level);
    println!("  Log format:     {}", config.general.log_format);
    println!("  Database:       {}", config.store.db_path.display());
    println!(
        "  Scorer:         {} {} (model {}, timeout {}s)",
        config.scorer.command,
        config.scorer.args.join(" "),
        config.scorer.model,
        config.scorer.timeout_secs
    );
    println!(
        "  Freshness:      {}s{}",
        config.cache.ttl_secs,
        if config.cache.invalidate_on_review_change {
            ", recompute on review change"
        } else {
            ""
        }
    );
    if config.cache.enabled {
        println!("  Memory cache:   {} records", config.cache.capacity);
    } else {
        println!("  Memory cache:   disabled");
    }
    println!(
        "  Retry policy:   {} attempts, {}ms apart",
        config.poll.max_attempts, config.poll.interval_ms
    );
    println!();
}
