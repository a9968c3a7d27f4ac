use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use playlist_transcripts::cli::{Cli, Commands};
use playlist_transcripts::config::Config;
use playlist_transcripts::output::{print_report, ConsoleReporter};
use playlist_transcripts::utils;
use playlist_transcripts::PlaylistPipeline;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    let mut config = Config::load().await?;

    match cli.command {
        Commands::Download {
            url,
            output,
            languages,
            no_auto_captions,
            delay_ms,
            format,
        } => {
            if !languages.is_empty() {
                config.provider.languages = languages;
            }
            if no_auto_captions {
                config.provider.allow_auto_captions = false;
            }
            if let Some(delay_ms) = delay_ms {
                config.app.item_delay_ms = delay_ms;
            }
            let format = format.unwrap_or(config.app.default_report_format);

            // Check for required external dependencies (non-fatal)
            let missing_deps = utils::check_dependencies(&config.provider.yt_dlp_path).await;
            if !missing_deps.is_empty() {
                eprintln!("⚠️  Dependency check warnings:");
                for dep in missing_deps {
                    eprintln!("   • {}", dep);
                }
                eprintln!("   (Continuing anyway - tools may be available)");
            }

            let raw_url = match url {
                Some(url) => url,
                None => prompt_for_url()?,
            };
            let url = utils::normalize_playlist_input(&raw_url)?;

            let cancel = CancellationToken::new();
            let ctrl_c_token = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                tracing::warn!("Interrupt received, finishing the current video (press Ctrl-C again to abort)");
                ctrl_c_token.cancel();

                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("Aborted");
                    std::process::exit(130);
                }
            });

            let pipeline = PlaylistPipeline::from_config(&config)?.with_cancellation(cancel);

            tracing::info!("Starting transcript download for playlist: {}", url);

            let mut reporter = ConsoleReporter::new(cli.quiet);
            let result = pipeline.run(&url, output.as_deref(), &mut reporter).await;
            reporter.finish();

            let report = result?;
            print_report(&report, format)?;

            if !report.run.result.has_successes() && !report.run.result.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Configuration file: {}", Config::config_path()?.display());
                println!("Edit it to change defaults, or run with --show to print the current values.");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "playlist_transcripts=debug"
    } else {
        "playlist_transcripts=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Ask for the playlist URL on the terminal
fn prompt_for_url() -> Result<String> {
    let term = console::Term::stderr();
    term.write_str("Enter YouTube Playlist URL: ")
        .context("Failed to write prompt")?;
    term.read_line().context("Failed to read playlist URL")
}
