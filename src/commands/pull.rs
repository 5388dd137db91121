use crate::cli::PullArgs;
use crate::error::{Error, Result};
use crate::models::RunConfig;
use crate::services::{HttpSession, PriceSync, SyncSummary};
use std::sync::Arc;

pub fn run(args: PullArgs) {
    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "📥 Pulling prices: batch size {}, {} req/min, budget {:.1}h, data dir {}",
        config.batch_size,
        config.requests_per_minute,
        config.max_duration.as_secs_f64() / 3600.0,
        config.data_dir.display()
    );

    let login_secure = args.login_secure.unwrap_or_default();

    match run_pull(config, &login_secure) {
        Ok(summary) => print_summary(&summary),
        Err(e) => {
            eprintln!("\n❌ Price pull failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_pull(config: RunConfig, login_secure: &str) -> Result<SyncSummary> {
    // No market session, no run
    let market_session = HttpSession::authenticated(login_secure)?;
    let catalog_session = HttpSession::anonymous()?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(async {
        let sync = PriceSync::new(config, Arc::new(catalog_session), Arc::new(market_session));
        sync.run().await
    })
}

fn print_summary(summary: &SyncSummary) {
    let report = &summary.report;

    println!("\n✅ Run finished");
    println!("   Catalog items: {}", report.catalog_items);
    println!("   Started at:    {}", report.start_index);
    println!("   Processed:     {}", report.processed);
    println!("   Succeeded:     {}", report.succeeded);
    println!("   Failed:        {}", report.failed.len());
    println!("   Next cursor:   {}", report.next_cursor);

    if report.stopped_early {
        println!("⏱️  Time budget reached; the next run resumes at {}", report.next_cursor);
    }

    let show = 10;
    for item in report.failed.iter().take(show) {
        println!("   ⚠️  {}", item);
    }
    if report.failed.len() > show {
        println!("   ... ({} more)", report.failed.len() - show);
    }

    match &summary.merge {
        Some(merge) => println!(
            "💾 Price store: {} -> {} items ({})",
            merge.previous_items,
            merge.merged_items,
            merge.latest_path.display()
        ),
        None => println!("💾 Price store unchanged"),
    }
}
