mod config;

use clap::{Parser, Subcommand};
use client::api::AnalysisService;
use client::errors::ClientError;
use client::metrics_defs::ALL_METRICS;
use client::types::FieldCorrection;
use config::{Config, ConfigError, MetricsConfig};
use session::store::HttpSessionStore;
use session::throttle::RefreshThrottle;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docbridge", about = "Client for the document analysis service")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "docbridge.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a document for processing
    Upload { path: PathBuf },
    /// Run the analysis for a document
    Analyze { document_id: String },
    /// Ask a question over the document corpus
    Query {
        question: String,
        /// Restrict retrieval to these documents
        #[arg(long = "document")]
        documents: Vec<String>,
    },
    /// Submit field corrections for an analyzed document
    Correct {
        document_id: String,
        /// Corrections as name=value pairs
        #[arg(long = "set", required = true)]
        set: Vec<String>,
    },
    /// Manage the document catalog
    #[command(subcommand)]
    Documents(DocumentsCommand),
}

#[derive(Subcommand)]
enum DocumentsCommand {
    /// List all documents
    List,
    /// Show one document
    Show { document_id: String },
    /// Delete a document
    Delete { document_id: String },
}

#[derive(thiserror::Error, Debug)]
enum MainError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("could not read {0}: {1}")]
    ReadInput(PathBuf, std::io::Error),
    #[error("invalid correction '{0}', expected name=value")]
    BadCorrection(String),
    #[error("could not encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("could not install metrics exporter: {0}")]
    Metrics(String),
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("docbridge: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), MainError> {
    let config = Config::from_file(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // The guard must outlive the runtime for events to be delivered.
    let _sentry = config.sentry_dsn().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    if let Some(metrics_config) = config.metrics() {
        install_statsd(metrics_config)?;
    }
    for metric in ALL_METRICS {
        tracing::debug!(
            name = metric.name,
            kind = metric.metric_type.as_str(),
            "metric registered"
        );
    }

    // The coordination core assumes cooperative single-threaded scheduling.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(execute(cli.command, &config))
}

fn install_statsd(config: &MetricsConfig) -> Result<(), MainError> {
    let recorder =
        metrics_exporter_statsd::StatsdBuilder::from(&config.statsd_host, config.statsd_port)
            .build(Some("docbridge"))
            .map_err(|err| MainError::Metrics(err.to_string()))?;
    metrics::set_global_recorder(recorder)
        .map_err(|_| MainError::Metrics("global recorder already installed".to_string()))
}

async fn execute(command: Command, config: &Config) -> Result<(), MainError> {
    let http = config.server.http_client()?;
    let throttle =
        RefreshThrottle::new(Duration::from_secs(config.session.refresh_throttle_secs));
    let store = Arc::new(HttpSessionStore::new(
        http.clone(),
        config.server.base_url.clone(),
        throttle,
    ));
    let service = AnalysisService::new(&config.server, http, store);

    match command {
        Command::Upload { path } => {
            let bytes =
                std::fs::read(&path).map_err(|err| MainError::ReadInput(path.clone(), err))?;
            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("document")
                .to_string();
            print_json(&service.upload_document(&filename, bytes).await?)
        }
        Command::Analyze { document_id } => {
            print_json(&service.analyze_document(&document_id).await?)
        }
        Command::Query {
            question,
            documents,
        } => print_json(&service.query(&question, &documents).await?),
        Command::Correct { document_id, set } => {
            let corrections = set
                .iter()
                .map(|raw| parse_correction(raw))
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&service.submit_corrections(&document_id, &corrections).await?)
        }
        Command::Documents(DocumentsCommand::List) => print_json(&service.list_documents().await?),
        Command::Documents(DocumentsCommand::Show { document_id }) => {
            print_json(&service.get_document(&document_id).await?)
        }
        Command::Documents(DocumentsCommand::Delete { document_id }) => {
            service.delete_document(&document_id).await?;
            println!("deleted {document_id}");
            Ok(())
        }
    }
}

fn parse_correction(raw: &str) -> Result<FieldCorrection, MainError> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| MainError::BadCorrection(raw.to_string()))?;
    if name.is_empty() {
        return Err(MainError::BadCorrection(raw.to_string()));
    }

    Ok(FieldCorrection {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), MainError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
