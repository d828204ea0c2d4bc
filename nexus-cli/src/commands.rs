use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use nexus_core::orchestrator::{NoRetriever, StaticRetriever};
use nexus_core::{ChatRequest, ResponseOrchestrator, Retriever};
use nexus_types::models::model_spec::display_name_for;
use nexus_types::{ActionKind, GenerationOutcome};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use crate::services::Services;

pub struct AskArgs {
    pub message: String,
    pub actor: String,
    pub context_file: Option<PathBuf>,
    pub documents: Vec<String>,
    pub json: bool,
}

pub async fn ask(services: &Services, args: AskArgs) -> Result<()> {
    let retriever: Arc<dyn Retriever> = match &args.context_file {
        Some(path) => {
            let context = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Arc::new(StaticRetriever::new(context))
        },
        None => Arc::new(NoRetriever),
    };
    let orchestrator = ResponseOrchestrator::new(
        Arc::new(services.cascade()?),
        retriever,
        services.config.orchestrator.clone(),
    );
    let message = orchestrator.validate(&args.message)?.to_string();

    let gate = services.gate();
    let admission = gate.admit(&args.actor, ActionKind::Generate).await;
    if !admission.is_allowed() {
        let decision = admission.decision();
        if args.json {
            println!("{}", serde_json::to_string_pretty(decision)?);
        } else {
            println!("{}", decision.reason.yellow());
            println!("Retry after {}s", decision.retry_after_seconds);
        }
        return Ok(());
    }

    let mut request = ChatRequest::new(message);
    if args.context_file.is_some() || !args.documents.is_empty() {
        request = request.with_documents(args.actor.clone(), args.documents.clone());
    }
    let result = orchestrator.build_and_generate(&request).await;
    admission.complete().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&GenerationOutcome::from(result))?);
        return Ok(());
    }

    match result {
        Ok(generated) => {
            println!("{}", generated.text);
            println!("\n{}", format!("[{}]", display_name_for(&generated.model_used)).dimmed());
            Ok(())
        },
        Err(e) => {
            tracing::debug!("Generation failed: {}", e);
            anyhow::bail!(e.user_message())
        },
    }
}

pub async fn admit(services: &Services, actor: &str, kind: ActionKind, count: u32) -> Result<()> {
    let gate = services.gate();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Decision", "Retry after", "Reason"]);

    for i in 1..=count {
        let admission = gate.admit(actor, kind).await;
        let decision = admission.decision().clone();
        admission.complete().await;

        let verdict = if decision.allowed {
            Cell::new("Allowed").fg(Color::Green)
        } else {
            Cell::new("Denied").fg(Color::Red)
        };
        let retry = if decision.allowed {
            "-".to_string()
        } else {
            format!("{}s", decision.retry_after_seconds)
        };
        table.add_row(vec![Cell::new(i), verdict, Cell::new(retry), Cell::new(&decision.reason)]);
    }

    println!("{table}");
    Ok(())
}

pub async fn status(services: &Services, json: bool) -> Result<()> {
    let availability = services.latch().availability().await;
    let in_flight = services.gate().limiter().in_flight().await;
    let admission = &services.config.admission;

    if json {
        let store = if services.config.store.redis_url.is_some() { "redis" } else { "memory" };
        let report = json!({
            "availability": availability,
            "in_flight": in_flight,
            "limits": admission,
            "store": store,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if availability.available {
        println!("{}", availability.message.green());
    } else {
        println!("{}", availability.message.red());
    }
    println!(
        "In flight: {}/{}",
        in_flight.to_string().cyan(),
        admission.global_parallel_limit
    );

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Gate", "Limit", "Window"]);
    let rows = [
        ("Global parallel", admission.global_parallel_limit, "in flight"),
        ("Per user", admission.user_requests_per_minute, "60s"),
        ("Per user", admission.user_requests_per_hour, "3600s"),
        ("AI calls per user", admission.api_calls_per_minute, "60s"),
    ];
    for (gate, limit, window) in rows {
        table.add_row(vec![Cell::new(gate), Cell::new(limit), Cell::new(window)]);
    }
    println!("{table}");
    Ok(())
}

pub fn models(services: &Services) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Priority", "Model", "Name"]);
    let specs = services.config.cascade.model_specs();
    for (i, spec) in specs.iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(&spec.id), Cell::new(&spec.display_name)]);
    }
    println!("{table}");
    println!(
        "\n{} models, {} attempts each on transient errors",
        specs.len(),
        services.config.cascade.max_retries_per_model
    );
}

pub fn show_config(services: &Services) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&services.config)?);
    Ok(())
}

pub async fn reset_exhaustion(services: &Services) {
    services.latch().clear().await;
    println!("{}", "Exhaustion flag cleared.".green());
}

pub async fn metrics(services: &Services) {
    // Touch the store so the snapshot reflects its health
    let availability = services.latch().availability().await;
    let in_flight = services.gate().limiter().in_flight().await;
    tracing::debug!(available = availability.available, in_flight, "Store probed for metrics");
    print!("{}", nexus_core::prometheus::render_metrics());
}
