//! CLI entrypoint for appforge
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use appforge_application::{
    FeedbackScorer, ModelDispatcher, RetryController, RunGenerationUseCase, StartGenerationInput,
    UsageSink,
};
use appforge_domain::{Model, ModelWeights};
use appforge_infrastructure::{
    ConfigLoader, FanOutUsageSink, FileConfig, InMemoryStore, JsonlUsageLog, SimulatedGateway,
    UsageLedger,
};
use appforge_presentation::{
    Cli, ConsoleFormatter, OutputFormat, ProgressReporter, SimpleProgress, UsageLine,
};
use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install stderr logging plus an optional log file.
///
/// The returned guard must live until exit so buffered file output is flushed.
fn init_tracing(verbose: u8, config: &FileConfig) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let (file_layer, guard) = match config.logging.file_path() {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| ".".into());
            let name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "appforge.log".into());
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

/// Load configuration and apply command-line overrides
fn load_config(cli: &Cli) -> Result<FileConfig> {
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    if let Some(strategy) = &cli.strategy {
        config.aggregation.strategy = strategy.clone();
    }
    if let Some(top_k) = cli.top_k {
        config.dispatch.top_k = top_k;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_gateway(cli: &Cli) -> Result<SimulatedGateway> {
    let mut gateway = SimulatedGateway::new();
    for (id, count) in cli.scripted_failures().map_err(|e| anyhow!(e))? {
        let model: Model = id.parse()?;
        gateway = gateway.with_failures(model, count);
    }
    Ok(gateway)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let _guard = init_tracing(cli.verbose, &config);

    info!("Starting appforge");

    let prompt = match &cli.prompt {
        Some(p) => p.clone(),
        None => bail!("A description of the application to generate is required."),
    };

    let engine = config.to_engine_config()?;
    let registry = Arc::new(config.to_registry()?);

    // === Dependency Injection ===
    let ledger = Arc::new(UsageLedger::new());
    let mut sinks: Vec<Arc<dyn UsageSink>> = vec![ledger.clone() as Arc<dyn UsageSink>];
    if let Some(path) = config.logging.usage_log_path() {
        match JsonlUsageLog::new(&path) {
            Some(log) => sinks.push(Arc::new(log)),
            None => warn!("Usage log disabled: could not open {}", path.display()),
        }
    }

    let store = Arc::new(InMemoryStore::new());
    let dispatcher = ModelDispatcher::new(
        Arc::new(build_gateway(&cli)?),
        registry,
        Arc::new(FeedbackScorer::new(ModelWeights::default())),
        Arc::new(RetryController::new(engine.circuit_breaker().clone())),
    )
    .with_usage_sink(Arc::new(FanOutUsageSink::new(sinks)))
    .with_policy(engine.dispatch().clone());

    let use_case = RunGenerationUseCase::new(dispatcher, engine.pipeline().clone())
        .with_persistence(store.clone());
    use_case.refresh_weights().await;

    let input = StartGenerationInput::new(cli.user.clone(), prompt)
        .with_tech_stack(cli.tech.clone())
        .with_project_type(cli.project_type.clone());

    // Execute with or without progress reporting
    let report = if cli.quiet {
        use_case.execute(input).await?
    } else if cli.output == OutputFormat::Json || std::io::stderr().is_terminal() {
        // Progress bars draw on stderr, keeping stdout clean for the report
        let progress = ProgressReporter::new();
        use_case.execute_with_progress(input, &progress).await?
    } else {
        let progress = SimpleProgress;
        use_case.execute_with_progress(input, &progress).await?
    };

    // Output results
    let output = match cli.output {
        OutputFormat::Full => {
            let components = use_case
                .snapshot(&report.request_id)
                .map(|request| ConsoleFormatter::format_components(request.components()))
                .unwrap_or_default();
            format!("{}{}", ConsoleFormatter::format(&report), components)
        }
        OutputFormat::Summary => ConsoleFormatter::format_summary(&report),
        OutputFormat::Json => ConsoleFormatter::format_json(&report),
    };
    println!("{}", output);

    if cli.usage {
        let lines: Vec<UsageLine> = ledger
            .summary()
            .into_iter()
            .map(|(model, usage)| UsageLine {
                model,
                calls: usage.calls,
                tokens: usage.tokens_used,
                cost: usage.cost,
            })
            .collect();
        eprintln!("{}", ConsoleFormatter::format_usage(&lines));
    }

    Ok(())
}
