use anyhow::{Context, Result};
use clap::Parser;
use client_matching_lib::io::clients::read_client_names;
use client_matching_lib::io::document::read_document_text;
use client_matching_lib::io::results::{write_json_report, write_tsv_results};
use client_matching_lib::matching::engine::{MatchEngine, MatchRunContext};
use client_matching_lib::utils::config::MatchConfig;
use client_matching_lib::utils::env::load_env;
use client_matching_lib::utils::progress_bars::logging::log_run_summary;
use client_matching_lib::utils::progress_bars::progress_callback::{
    create_logging_callback, parse_counts,
};
use client_matching_lib::utils::progress_bars::progress_config::ProgressConfig;
use env_logger::Env;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct MatchArgs {
    /// Client list, one name per line
    #[arg(long)]
    clients: PathBuf,

    /// Extracted document text
    #[arg(long)]
    document: PathBuf,

    /// Write the full JSON report here
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write a tab-separated results sheet here
    #[arg(long)]
    tsv: Option<PathBuf>,

    /// Tolerance 0-100 for fuzzy-only verdicts (overrides MATCH_THRESHOLD)
    #[arg(long)]
    threshold: Option<u32>,

    /// Worker threads; 1 runs sequentially (overrides MATCH_WORKERS)
    #[arg(long)]
    workers: Option<usize>,

    /// 0-based column holding the name in a delimited client list
    #[arg(long)]
    column: Option<usize>,

    #[arg(short, long)]
    verbose: bool,
}

fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = MatchArgs::parse();

    // Initialize environment and logging; RUST_LOG still wins over --verbose
    load_env();
    env_logger::Builder::from_env(Env::default().default_filter_or(default_log_filter(args.verbose)))
        .init();

    let mut config = MatchConfig::from_env();
    if let Some(threshold) = args.threshold {
        config = config.with_threshold(threshold);
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    config.log_config();

    let names = read_client_names(&args.clients, args.column)?;
    let document = read_document_text(&args.document)
        .context("Document source is missing or unreadable")?;

    let progress_config = ProgressConfig::from_env();
    let progress_bar = if args.verbose {
        None
    } else {
        progress_config.create_progress_bar(names.len() as u64)
    };

    let ctx = match progress_bar.clone() {
        Some(pb) => MatchRunContext::new().with_progress_callback(Arc::new(
            move |phase: String, details: Option<String>| {
                if let Some((current, total)) = details.as_deref().and_then(parse_counts) {
                    pb.set_length(total);
                    pb.set_position(current);
                }
                pb.set_message(phase);
            },
        )),
        None => MatchRunContext::new().with_progress_callback(create_logging_callback("CLIENTS")),
    };
    let ctx = Arc::new(ctx);

    let cancel_flag = ctx.cancellation_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Interrupt received; finishing clients in flight and keeping partial results");
            cancel_flag.store(true, Ordering::SeqCst);
        }
    });

    let engine = MatchEngine::new(config);
    let run_ctx = Arc::clone(&ctx);
    let report = tokio::task::spawn_blocking(move || engine.run(&names, Some(&document), &run_ctx))
        .await
        .context("Matching task did not complete")?
        .context("Matching run failed")?;

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!(
            "{} of {} clients found",
            report.summary.found, report.summary.evaluated
        ));
    }

    for result in report.found() {
        info!(
            "✅ {} ({}%, {}): {}",
            result.client_name,
            result.confidence,
            result.match_type_label(),
            result.context
        );
    }

    if let Some(path) = &args.output {
        write_json_report(path, &report)?;
    }
    if let Some(path) = &args.tsv {
        write_tsv_results(path, &report.results)?;
    }
    if args.output.is_none() && args.tsv.is_none() {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    }

    log_run_summary(&report.summary);
    if report.is_cancelled() {
        warn!("Results are partial: the run was cancelled");
    }
    Ok(())
}
