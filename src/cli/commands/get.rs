//! Get command - look up current readings through the cache

use crate::cache::WeatherCache;
use crate::cli::args::{GetArgs, OutputFormat};
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use crate::query::LocationQuery;
use crate::reading::Reading;
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// One printed row
#[derive(Debug, Serialize)]
struct Lookup {
    round: u32,
    query: LocationQuery,
    reading: Reading,
}

/// Execute the get command
pub async fn execute(args: GetArgs, config: &Config) -> CacheResult<()> {
    // Reject malformed keys before any cache work happens
    let queries = args
        .queries
        .iter()
        .map(|q| q.parse::<LocationQuery>())
        .collect::<CacheResult<Vec<_>>>()?;

    let cache = Arc::new(WeatherCache::from_config(config)?);
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, cancelling pending lookups");
                cancel.cancel();
            }
        }
    });

    let mut failed = 0;
    let mut total = 0;

    for round in 1..=args.repeat {
        let lookups = run_round(&cache, &queries, round, &cancel).await?;

        total += lookups.len();
        failed += lookups.iter().filter(|l| !l.reading.is_successful()).count();

        match args.format {
            OutputFormat::Table => print_table(&lookups, args.repeat > 1),
            OutputFormat::Json => print_json(&lookups)?,
            OutputFormat::Plain => print_plain(&lookups),
        }

        if round < args.repeat && args.interval_ms > 0 {
            tokio::select! {
                _ = cancel.cancelled() => return Err(CacheError::Cancelled),
                _ = tokio::time::sleep(Duration::from_millis(args.interval_ms)) => {}
            }
        }
    }

    debug!(
        "{} lookups, {} cached entries",
        total,
        cache.entry_count()
    );

    if failed > 0 {
        return Err(CacheError::User(format!(
            "{} of {} lookups failed",
            failed, total
        )));
    }

    Ok(())
}

/// Look every query up concurrently, results in argument order
async fn run_round(
    cache: &Arc<WeatherCache>,
    queries: &[LocationQuery],
    round: u32,
    cancel: &CancellationToken,
) -> CacheResult<Vec<Lookup>> {
    let mut tasks = JoinSet::new();
    for (idx, query) in queries.iter().cloned().enumerate() {
        let cache = Arc::clone(cache);
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let reading = cache.get_async(&query, Some(&cancel)).await;
            (idx, query, reading)
        });
    }

    let mut lookups = Vec::with_capacity(queries.len());
    while let Some(joined) = tasks.join_next().await {
        let (idx, query, reading) =
            joined.map_err(|e| CacheError::User(format!("lookup task failed: {}", e)))?;
        lookups.push((
            idx,
            Lookup {
                round,
                query,
                reading: reading?,
            },
        ));
    }

    lookups.sort_by_key(|(idx, _)| *idx);
    Ok(lookups.into_iter().map(|(_, lookup)| lookup).collect())
}

fn source(reading: &Reading) -> &'static str {
    match (reading.is_successful(), reading.is_from_cache) {
        (false, _) => "failed",
        (true, true) => "cache",
        (true, false) => "api",
    }
}

fn print_table(lookups: &[Lookup], show_round: bool) {
    let ctx = UiContext::detect();
    if show_round {
        if let Some(first) = lookups.first() {
            ui::intro(&ctx, &format!("Round {}", first.round));
        }
    } else {
        ui::intro(&ctx, "Current weather");
    }

    println!(
        "{:<28} {:<10} {:<10} {:<18} {:<8}",
        style("QUERY").bold(),
        style("TEMP").bold(),
        style("HUMIDITY").bold(),
        style("MEASURED").bold(),
        style("SOURCE").bold()
    );
    println!("{}", "-".repeat(78));

    for lookup in lookups {
        let reading = &lookup.reading;
        let source_styled = match source(reading) {
            "cache" => style("cache").cyan(),
            "api" => style("api").green(),
            other => style(other).red(),
        };

        match &reading.weather {
            Some(weather) => println!(
                "{:<28} {:<10} {:<10} {:<18} {:<8}",
                lookup.query.to_string(),
                weather.temperature.to_string(),
                format!("{}%", weather.humidity),
                reading.measured_at.format("%Y-%m-%d %H:%M").to_string(),
                source_styled
            ),
            None => {
                println!(
                    "{:<28} {:<10} {:<10} {:<18} {:<8}",
                    lookup.query.to_string(),
                    "-",
                    "-",
                    "-",
                    source_styled
                );
                if let Some(error) = &reading.error {
                    ui::step_error_detail(&ctx, "Lookup failed", error);
                }
            }
        }
    }

    println!();
}

fn print_json(lookups: &[Lookup]) -> CacheResult<()> {
    let json = serde_json::to_string_pretty(lookups)?;
    println!("{}", json);
    Ok(())
}

fn print_plain(lookups: &[Lookup]) {
    for lookup in lookups {
        let reading = &lookup.reading;
        match &reading.weather {
            Some(weather) => println!(
                "{}\t{:.1}\t{}",
                lookup.query,
                weather.temperature.celsius(),
                source(reading)
            ),
            None => println!(
                "{}\t-\t{}",
                lookup.query,
                reading.error.as_deref().unwrap_or("failed")
            ),
        }
    }
}
