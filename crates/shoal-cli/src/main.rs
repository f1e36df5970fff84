use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use rand::Rng;
use serde::Serialize;
use tokio::sync::oneshot;

use shoal_core::domain::{EventKind, StoreEvent};
use shoal_core::impls::{ChannelDispatcher, EventLoop, FileFetcher, InlineDispatcher};
use shoal_core::observability::BatchProgress;
use shoal_core::ports::Dispatcher;
use shoal_core::{
    BatchCoordinator, BatchHandle, BuildError, ConcurrentStore, ConfigError, DispatchMode,
    EntryOutcome, FetchError, FetchRequest, ShoalConfig,
};

/// Fetch a batch of sources into a shared store.
#[derive(Parser, Debug)]
#[command(name = "shoal", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read local files as one batch and print a JSON summary.
    Fetch(FetchArgs),
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// JSON config file (see `ShoalConfig`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override `max_concurrent_fetches`
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Resolve sources relative to this directory
    #[arg(long)]
    root: Option<PathBuf>,

    /// Try to cancel one randomly chosen entry right after the batch starts
    #[arg(long)]
    cancel_random: bool,

    /// Sources to fetch (file paths)
    #[arg(required = true)]
    sources: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("batch was dropped before it completed")]
    Abandoned,

    #[error("failed to encode summary: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct ItemSummary {
    source: String,
    bytes: usize,
    fetched_at: String,
}

#[derive(Debug, Serialize)]
struct Summary {
    batch: String,
    progress: BatchProgress,
    items: Vec<ItemSummary>,
    first_error: Option<String>,
}

impl Summary {
    fn new(handle: &BatchHandle, store: &ConcurrentStore, first_error: Option<&FetchError>) -> Self {
        let items = store
            .snapshot()
            .iter()
            .map(|item| ItemSummary {
                source: item.source().to_string(),
                bytes: item.payload().len(),
                fetched_at: item.fetched_at().to_rfc3339(),
            })
            .collect();
        Self {
            batch: handle.id().to_string(),
            progress: handle.progress(),
            items,
            first_error: first_error.map(ToString::to_string),
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(args: &FetchArgs) -> Result<ShoalConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => ShoalConfig::load(path)?,
        None => ShoalConfig::default(),
    };
    if let Some(n) = args.max_concurrent {
        config.max_concurrent_fetches = n;
    }
    config.validate()?;
    Ok(config)
}

/// Wait for the batch while running dispatched callbacks on this task.
async fn drive(
    mut events: EventLoop,
    mut done: oneshot::Receiver<Option<FetchError>>,
) -> Result<Option<FetchError>, CliError> {
    loop {
        tokio::select! {
            biased;
            result = &mut done => {
                events.run_pending();
                return result.map_err(|_| CliError::Abandoned);
            }
            more = events.turn() => {
                if !more {
                    return Err(CliError::Abandoned);
                }
            }
        }
    }
}

async fn fetch(args: FetchArgs) -> Result<Summary, CliError> {
    let config = load_config(&args)?;

    // (A) 配送先を決める（event_loop ならこのタスクが「UI スレッド」役）
    let (dispatcher, events): (Arc<dyn Dispatcher>, Option<EventLoop>) = match config.dispatch {
        DispatchMode::Inline => (Arc::new(InlineDispatcher), None),
        DispatchMode::EventLoop => {
            let (dispatcher, events) = ChannelDispatcher::new();
            (Arc::new(dispatcher), Some(events))
        }
    };

    // (B) store と listener
    let store = Arc::new(ConcurrentStore::new(Arc::clone(&dispatcher)));
    store.subscribe(EventKind::ContentAdded, |event| {
        let StoreEvent::ContentAdded { index, source } = event;
        tracing::info!(index, source = %source, "content added");
    });

    let fetcher = match &args.root {
        Some(root) => FileFetcher::with_root(root),
        None => FileFetcher::new(),
    };
    let coordinator = BatchCoordinator::builder()
        .fetcher(Arc::new(fetcher))
        .store(Arc::clone(&store))
        .dispatcher(dispatcher)
        .config(config)
        .build()?;

    // (C) batch 投入
    let requests = args
        .sources
        .iter()
        .enumerate()
        .map(|(index, source)| {
            FetchRequest::new(source.as_str()).on_outcome(move |outcome| match outcome {
                EntryOutcome::Succeeded(item) => {
                    tracing::debug!(index, bytes = item.payload().len(), "entry succeeded")
                }
                EntryOutcome::Failed(err) => tracing::warn!(index, "entry failed: {err}"),
                EntryOutcome::Canceled => tracing::info!(index, "entry canceled"),
            })
        })
        .collect();

    let (done_tx, done_rx) = oneshot::channel();
    let handle = coordinator.run(requests, move |first_error| {
        let _ = done_tx.send(first_error);
    });

    // (D) まだ始まっていない entry だけがキャンセルできる
    if args.cancel_random && !handle.is_empty() {
        let index = rand::thread_rng().gen_range(0..handle.len());
        if handle.cancel(index) {
            tracing::info!(index, "canceled before start");
        } else {
            tracing::info!(index, "cancel missed; entry already started");
        }
    }

    // (E) 完了待ち
    let first_error = match events {
        Some(events) => drive(events, done_rx).await?,
        None => done_rx.await.map_err(|_| CliError::Abandoned)?,
    };

    Ok(Summary::new(&handle, &store, first_error.as_ref()))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Fetch(args) => fetch(args).await,
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(2);
        }
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!("{}", CliError::from(e));
            return ExitCode::from(2);
        }
    }

    if summary.first_error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
