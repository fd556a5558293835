use std::{path::Path, sync::Arc};

use anyhow::Context;
use clap::Parser;
use log::{error, info};
use serde::Serialize;
use tokio::{signal, sync::broadcast};
use url::Url;

use namaste_explorer::{
    TerminologyClient,
    cli::{Cli, Commands},
    config::{ExplorerConfig, load_explorer_config},
    dashboard::{Dashboard, DashboardState, PollTarget, format_uptime},
    http::{
        ApiStats, BulkMapRequest, FhirConditionParams, HealthStatus, MapParams, MappingResult, SearchParams,
        SearchResult,
    },
    log::init_logging,
    telemetry::LatencyBreakdown,
};

const TOP_ENDPOINTS: usize = 10;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_logging()?;
    let cli = Cli::parse();

    let mut config = load_explorer_config(&cli.config)?;
    config.apply_connection(&cli.connection);

    let base_url = Url::parse(&config.base_url).with_context(|| format!("Invalid base URL '{}'", config.base_url))?;
    let client = Arc::new(TerminologyClient::new(base_url)?);
    info!(base_url = &*config.base_url; "Client ready");

    let result = run_command(cli.command, &client, &config, cli.json).await;

    print_local_telemetry(&client).await;

    if let Err(e) = &result {
        error!("Command failed: {}", e);
    }
    result
}

async fn run_command(
    command: Commands,
    client: &Arc<TerminologyClient>,
    config: &ExplorerConfig,
    json: bool,
) -> Result<(), anyhow::Error> {
    match command {
        Commands::Health => {
            let health = client.check_health().await?;
            if json {
                print_json(&health)?;
            } else {
                print_health(&health);
            }
            Ok(())
        },
        Commands::Stats { watch } => {
            if watch {
                let dashboard = Dashboard::new(client.clone(), PollTarget::StatsOnly, config.stats_refresh());
                run_dashboard(dashboard, json).await
            } else {
                let stats = client.get_stats().await?;
                if json {
                    print_json(&stats)?;
                } else {
                    print_stats(&stats);
                }
                Ok(())
            }
        },
        Commands::Search {
            query,
            source,
            system,
            raw,
            dry_run,
        } => {
            let mut params = SearchParams::new(query).with_source(source);
            params.ayush_system = system;

            if dry_run {
                println!("GET {}", client.search_url(&params)?);
                return Ok(());
            }

            let outcome = client.search_with_raw(&params).await?;
            if json {
                print_json(&outcome.results)?;
            } else {
                print_search_results(&outcome.results);
            }
            if raw {
                println!("\nRaw response:");
                print_json(&outcome.raw)?;
            }
            Ok(())
        },
        Commands::Map {
            namaste_id,
            include_fhir,
            dry_run,
        } => {
            let params = MapParams::new(namaste_id).with_fhir(include_fhir);
            if dry_run {
                println!("POST {}", client.map_url(&params)?);
                return Ok(());
            }

            let mapping = client.map_terminology(&params).await?;
            if json {
                print_json(&mapping)?;
            } else {
                print_mapping(&params.namaste_id, &mapping);
            }
            Ok(())
        },
        Commands::BulkMap { file, body } => {
            let body = match (file, body) {
                (Some(path), _) => read_body(&path)?,
                (None, Some(body)) => body,
                (None, None) => anyhow::bail!("Either --file or --body is required"),
            };
            let request = BulkMapRequest::from_json(&body)?;

            let mappings = client.bulk_map(&request).await?;
            if json {
                print_json(&mappings)?;
            } else {
                for (term, mapping) in request.terms.iter().zip(&mappings) {
                    print_mapping(&term.namaste_id, mapping);
                }
            }
            Ok(())
        },
        Commands::Fhir {
            namaste_id,
            patient_id,
            dry_run,
        } => {
            let params = FhirConditionParams { namaste_id, patient_id };
            if dry_run {
                println!("GET {}", client.fhir_condition_url(&params)?);
                return Ok(());
            }

            let condition = client.get_fhir_condition(&params).await?;
            print_json(&condition)
        },
        Commands::Dashboard { interval, ticks } => {
            let interval = interval
                .map(|secs| std::time::Duration::from_secs(secs.max(1)))
                .unwrap_or_else(|| config.dashboard_refresh());
            let dashboard =
                Dashboard::new(client.clone(), PollTarget::HealthAndStats, interval).with_max_refreshes(ticks);
            run_dashboard(dashboard, json).await
        },
    }
}

async fn run_dashboard(dashboard: Dashboard, json: bool) -> Result<(), anyhow::Error> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let signal_handle = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    println!("Polling. Press Ctrl+C to stop.");
    dashboard
        .run(shutdown_rx, |state| {
            if json {
                if let Err(e) = print_json(&DashboardView::from(state)) {
                    error!("Failed to render dashboard: {}", e);
                }
            } else {
                print_dashboard(state);
            }
        })
        .await;

    signal_handle.abort();
    Ok(())
}

#[derive(Serialize)]
struct DashboardView<'a> {
    health: Option<&'a HealthStatus>,
    stats: Option<&'a ApiStats>,
    last_error: Option<&'a str>,
    refreshed_at: Option<String>,
}

impl<'a> From<&'a DashboardState> for DashboardView<'a> {
    fn from(state: &'a DashboardState) -> Self {
        Self {
            health: state.health.as_ref(),
            stats: state.stats.as_ref(),
            last_error: state.last_error.as_deref(),
            refreshed_at: state.refreshed_at.map(|t| t.to_rfc3339()),
        }
    }
}

fn read_body(path: &Path) -> Result<String, anyhow::Error> {
    std::fs::read_to_string(path).with_context(|| format!("Could not read request body from {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), anyhow::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_health(health: &HealthStatus) {
    println!("Status:    {}", health.status_label());
    println!("Version:   {}", health.version.as_deref().unwrap_or("unknown"));
    println!("Timestamp: {}", health.timestamp.as_deref().unwrap_or("-"));
    if let Some(services) = &health.services {
        for (name, status) in [
            ("ICD-11", &services.icd11),
            ("NAMASTE", &services.namaste),
            ("FHIR", &services.fhir),
        ] {
            println!("  {:<8} {}", name, status.as_deref().unwrap_or("-"));
        }
    }
}

fn print_stats(stats: &ApiStats) {
    println!("Total requests:   {}", stats.total_requests);
    println!("Success rate:     {:.1}%", stats.success_rate);
    println!(
        "Response time:    avg {:.0} ms, min {:.0} ms, max {:.0} ms",
        stats.average_response_time, stats.min_response_time, stats.max_response_time
    );
    println!("Uptime:           {}", format_uptime(stats.uptime_seconds));
    print_breakdown(&LatencyBreakdown::from_samples(&stats.recent_response_times_ms()));

    let top = stats.top_endpoints(TOP_ENDPOINTS);
    if !top.is_empty() {
        println!("Top endpoints:");
        for (endpoint, count) in top {
            println!("  {:>6}  {}", count, endpoint);
        }
    }
    if !stats.status_code_distribution.is_empty() {
        println!("Status codes:");
        for (code, count) in &stats.status_code_distribution {
            println!("  {:>6}  {}", count, code);
        }
    }
}

fn print_breakdown(breakdown: &LatencyBreakdown) {
    println!("Latency buckets:  {}", breakdown);
}

fn print_search_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }
    for result in results {
        let confidence = result
            .confidence
            .map(|c| format!(" ({:.0}%)", c * 100.0))
            .unwrap_or_default();
        println!(
            "[{:<7}] {:<12} {}{}",
            result.source.label(),
            result.code().unwrap_or("-"),
            result.term,
            confidence
        );
        if let Some(hindi) = &result.term_hindi {
            println!("{:>22}{}", "", hindi);
        }
        if let Some(synonyms) = result.synonyms.as_ref().filter(|s| !s.is_empty()) {
            println!("{:>22}synonyms: {}", "", synonyms.join(", "));
        }
    }
    println!("{} result(s)", results.len());
}

fn print_mapping(namaste_id: &str, mapping: &MappingResult) {
    let info = mapping.match_info();
    let term = mapping.term_name().map(|t| format!(" ({})", t)).unwrap_or_default();
    println!(
        "{}{} -> {} {} (confidence {:.0}%)",
        namaste_id,
        term,
        info.code,
        info.title,
        info.confidence * 100.0
    );
    if mapping.fhir_condition.is_some() {
        println!("  FHIR Condition resource included (use --json to view)");
    }
}

fn print_dashboard(state: &DashboardState) {
    let refreshed = state
        .refreshed_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default();
    println!("--- refresh #{} at {} ---", state.refreshes, refreshed);
    if let Some(health) = &state.health {
        println!(
            "API {} (version {})",
            health.status_label(),
            health.version.as_deref().unwrap_or("unknown")
        );
    }
    if let Some(stats) = &state.stats {
        print_stats(stats);
    }
    if let Some(error) = &state.last_error {
        println!("Last refresh failed: {}", error);
    }
}

async fn print_local_telemetry(client: &TerminologyClient) {
    let snapshot = client.telemetry_snapshot().await;
    if snapshot.request_count == 0 {
        return;
    }
    eprintln!(
        "Local telemetry: {} request(s), average {} ms over {} sample(s)",
        snapshot.request_count,
        snapshot.average_response_time_ms,
        snapshot.response_times_ms.len()
    );
    eprintln!("  {}", snapshot.breakdown());
}
