//! Main entry point for the rytex CLI

use anyhow::Context;
use clap::Parser;
use rytex::cli::{Args, OutputFormatter, RetryConfigBuilder, RetryExecutor};
use rytex::platform::patterns;
use rytex::utils::extract_video_id;
use rytex::{Extractor, RytexError};
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    debug!("Starting rytex with args: {:?}", args);
    let formatter = OutputFormatter::new(args.verbosity_level());

    if let Err(e) = run(&args, &formatter).await {
        if e.is_extraction_failure() {
            formatter.warning(&format!(
                "Site markup no longer matches pattern revision {}",
                patterns::REVISION
            ));
        }
        return Err(e.into());
    }
    Ok(())
}

async fn run(args: &Args, formatter: &OutputFormatter) -> Result<(), RytexError> {
    let start_time = Instant::now();
    let video_id = extract_video_id(&args.url)?;
    info!("Resolving video {}", video_id);

    let extractor = Extractor::with_config(args.http_config())?;
    let retry = RetryExecutor::with_config(
        RetryConfigBuilder::new().max_retries(args.retries).build(),
    );

    if args.print_url {
        let url = retry
            .execute(|| async {
                if args.embedded_player {
                    extractor.embedded_player_url(&video_id).await
                } else {
                    extractor.muxed_url(&video_id).await
                }
            })
            .await?;
        match url {
            Some(url) => println!("{}", url),
            None => formatter.warning("No muxed stream with a playable URL"),
        }
        return Ok(());
    }

    let spinner = formatter.spinner(&format!("Extracting {}", video_id));
    let config = retry.execute(|| extractor.extract(&video_id)).await;
    spinner.finish_and_clear();
    let config = config?;

    if args.json {
        let json = serde_json::to_string_pretty(&config)
            .map_err(|e| RytexError::InvalidInput(format!("cannot serialize config: {}", e)))?;
        println!("{}", json);
    } else {
        formatter.print_video_info(&config);
    }

    if args.subtitles {
        let spinner = formatter.spinner("Fetching subtitles");
        let subtitles = retry.execute(|| extractor.extract_subtitles(&video_id)).await;
        spinner.finish_and_clear();
        formatter.print_subtitles(&subtitles?);
    }

    formatter.print_elapsed(start_time.elapsed());
    Ok(())
}

/// Initialize logging; `RUST_LOG` wins over the verbosity flag
fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_level))
        .context("invalid log filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    Ok(())
}
