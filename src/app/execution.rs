//! Command execution

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use crate::cli::{self, Command};
use crate::display::{views, ColourManager};
use crate::service::StatService;
use crate::source::{DocumentSource, DriveSource};
use crate::stats::WordCounter;
use crate::store::StoreResult;
use crate::{config, stats};

/// Run the parsed command to completion
pub async fn execute(args: &cli::Args, config: &config::ConfigManager, colours: &ColourManager) -> Result<()> {
    match &args.command {
        Command::Words { file } => count_words(file, args, config, colours),
        command => {
            let service = super::initialization::open_service(args, config)?;
            execute_with_service(command, args, config, &service, colours).await
        }
    }
}

/// Count a local text file; needs no database
fn count_words(file: &Path, args: &cli::Args, config: &config::ConfigManager, colours: &ColourManager) -> Result<()> {
    let text = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let counter = WordCounter::new(config.get_word_options()?);
    let (words, total) = counter.sample(&text);

    if args.json {
        return print_json(&serde_json::json!({ "total": total, "words": words }));
    }
    print!("{}", views::render_word_count(total, &words, colours));
    Ok(())
}

async fn execute_with_service(
    command: &Command,
    args: &cli::Args,
    config: &config::ConfigManager,
    service: &StatService,
    colours: &ColourManager,
) -> Result<()> {
    match command {
        Command::Sweep { query, max_workers, requests_per_second } => {
            let mut sweep_config = service.config().clone();
            if max_workers.is_some() {
                sweep_config.max_workers = *max_workers;
            }
            if let Some(rate) = requests_per_second {
                sweep_config.requests_per_second = *rate;
            }
            let service = StatService::new(Arc::clone(service.store()), sweep_config);

            let settings = config.get_drive_settings();
            let token = match settings.access_token {
                Some(token) => token,
                None => stored_token(&service)?.ok_or_else(|| {
                    anyhow::anyhow!(
                        "No access token: set {} or [drive] access-token",
                        config::ACCESS_TOKEN_ENV
                    )
                })?,
            };
            let source: Arc<dyn DocumentSource> = Arc::new(DriveSource::new(settings.api_base, token)?);

            let cancel = CancellationToken::new();
            let interrupt = spawn_interrupt_handler(cancel.clone());
            let result = service.sweep(source, query.as_deref(), cancel).await;
            interrupt.abort();
            let report = result?;

            if args.json {
                return print_json(&report);
            }
            print!("{}", views::render_sweep_report(&report, colours));
            Ok(())
        }

        Command::Rebuild => {
            let days = service.rebuild_from_store()?;
            info!("Rebuilt {} days from stored document stats", days.len());

            if args.json {
                return print_json(&days.values().collect::<Vec<_>>());
            }
            println!("{}", colours.success(&format!("Rebuilt {} days", days.len())));
            Ok(())
        }

        Command::Day { date } => {
            let date = cli::parse_day(date)?;
            let detail = service.day_detail(date)?;

            if args.json {
                return print_json(&detail);
            }
            match detail {
                Some(detail) => print!("{}", views::render_day_detail(&detail, colours)),
                None => println!("{}", colours.info(&format!("No activity recorded on {}", date))),
            }
            Ok(())
        }

        Command::File { id } => {
            let detail = service
                .document_stat(id)?
                .ok_or_else(|| anyhow::anyhow!("Document '{}' is not in the database", id))?;

            if args.json {
                return print_json(&detail);
            }
            print!("{}", views::render_document(&detail, colours));
            Ok(())
        }

        Command::Days { from } => {
            let from = from.as_deref().map(cli::parse_day).transpose()?;
            let days = service.iterate_daily_stats(from).collect::<StoreResult<Vec<_>>>()?;
            debug!("Loaded {} daily stats", days.len());

            if args.json {
                return print_json(&days);
            }
            print!("{}", views::render_days(&days, colours));
            Ok(())
        }

        Command::Calendar { window } => {
            let window = window.unwrap_or(service.config().window_days);
            let view = service.build_calendar_view(window)?;

            if args.json {
                return print_json(&view);
            }
            print!("{}", views::render_calendar(&view, colours));
            Ok(())
        }

        Command::User => {
            let user = service.user()?;

            if args.json {
                return print_json(&user.as_ref().map(user_summary));
            }
            print!("{}", views::render_user(user.as_ref(), colours));
            Ok(())
        }

        Command::Words { file } => count_words(file, args, config, colours),
    }
}

/// Cancel the sweep on the first Ctrl-C
fn spawn_interrupt_handler(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling sweep");
            cancel.cancel();
        }
    })
}

/// Bearer token left in the database by the login flow, if it is text
fn stored_token(service: &StatService) -> Result<Option<String>> {
    let Some(user) = service.user()? else {
        return Ok(None);
    };
    match String::from_utf8(user.token) {
        Ok(token) if !token.trim().is_empty() => {
            debug!("Using the access token stored for {}", user.email);
            Ok(Some(token.trim().to_string()))
        }
        _ => {
            warn!("Stored token for {} is not usable as an access token", user.email);
            Ok(None)
        }
    }
}

/// The user record without its credential blob
fn user_summary(user: &stats::UserIdentity) -> serde_json::Value {
    serde_json::json!({
        "user_id": user.user_id,
        "email": user.email,
        "update_date": stats::format_timestamp(&user.update_date),
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
