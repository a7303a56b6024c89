#![warn(clippy::all, rust_2018_idioms)]

use anyhow::Context;
use awsdash_web::app::api_server::{self, AppState, CacheHandles};
use awsdash_web::app::commands::CommandCatalogue;
use awsdash_web::app::config::AppConfig;
use awsdash_web::app::cost_explorer::CliCostService;
use awsdash_web::app::profiles::{ProfileManager, StsCredentialValidator};
use awsdash_web::app::resource_explorer::{
    AwsCliExecutor, CachedResourceService, CliExecutor, CliResourceService, RegionAggregator,
    TtlCache,
};
use awsdash_web::{log_error, log_info, log_warn};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;

const DEFAULT_LOG_FILTER: &str = "awsdash_web=info,tower_http=info";

fn log_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "", "awsdash-web")
        .map(|dirs| dirs.data_dir().join("logs"))
}

/// Open the append-only log file, owner read/write only.
fn open_log_file() -> Option<(std::fs::File, PathBuf)> {
    let log_dir = log_dir()?;
    std::fs::create_dir_all(&log_dir).ok()?;
    let log_path = log_dir.join("awsdash-web.log");

    let file = match std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(&log_path, std::fs::Permissions::from_mode(0o600))
        {
            eprintln!("[SECURITY] Failed to set log file permissions: {}", e);
        }
    }

    Some((file, log_path))
}

fn init_logging() -> Option<PathBuf> {
    // RUST_LOG wins over the default filter
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    let log_file = open_log_file();
    let log_path = log_file.as_ref().map(|(_, path)| path.clone());
    let file_layer = log_file.map(|(file, _)| {
        tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false) // No ANSI colors in file
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return log_path;
    }

    // Bridge log crate events (log_* macros) to tracing.
    // This must be done AFTER setting the tracing subscriber
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize log-to-tracing bridge: {}", e);
    }

    match &log_path {
        Some(path) => tracing::info!("Logging initialized to: {:?}", path),
        None => tracing::info!("Logging to stderr only"),
    }
    log_path
}

fn setup_panic_handler() {
    // Install a panic handler that writes to a crash log file
    // This catches panics even if normal logging hasn't been initialized yet
    std::panic::set_hook(Box::new(|panic_info| {
        let crash_msg = format!(
            "awsdash-web crashed!\n\
             Panic occurred at: {}\n\
             Details: {}\n\
             Backtrace:\n{:?}\n",
            panic_info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "unknown location".to_string()),
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic_info.payload().downcast_ref::<String>().map(|s| s.as_str()))
                .unwrap_or("unknown panic"),
            std::backtrace::Backtrace::force_capture()
        );

        eprintln!("\n{}", crash_msg);

        if let Some(log_dir) = log_dir() {
            let _ = std::fs::create_dir_all(&log_dir);
            let crash_log_path = log_dir.join("crash.log");

            if let Ok(mut file) = std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(&crash_log_path)
            {
                use std::io::Write;
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                let _ = writeln!(file, "\n=== CRASH at {} ===\n{}", timestamp, crash_msg);
                eprintln!("Crash log written to: {:?}", crash_log_path);
            }
        }
    }));
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    // Credentials are probed with a bare executor; the shared one below
    // follows whichever profile is active
    let validator = Arc::new(StsCredentialValidator::new(AwsCliExecutor::new(
        &config.aws_cli_path,
        config.cli_timeout,
    )));
    let profiles = Arc::new(
        ProfileManager::initialize(Some(config.profile_store_path.clone()), validator).await,
    );

    let executor: Arc<dyn CliExecutor> = Arc::new(
        AwsCliExecutor::new(&config.aws_cli_path, config.cli_timeout)
            .with_environment(profiles.clone()),
    );

    let commands = match CommandCatalogue::load(&config.command_config_path, executor.clone()) {
        Ok(commands) => commands,
        Err(e) => {
            log_warn!("Failed to load command config: {:#}", e);
            CommandCatalogue::empty(executor.clone())
        }
    };
    log_info!(
        "{} catalogue commands, system credentials {}",
        commands.len(),
        if profiles.system_available() {
            "available"
        } else {
            "unavailable"
        }
    );

    let aggregator =
        RegionAggregator::new(executor.clone()).with_max_concurrent(config.max_concurrent_regions);
    let resources = CachedResourceService::new(
        Arc::new(CliResourceService::new(aggregator)),
        TtlCache::new(config.cache_ttl),
    )
    .with_profiles(profiles.clone());
    let costs = CliCostService::new(executor.clone(), TtlCache::new(config.cache_ttl))
        .with_profiles(profiles.clone());

    // Cache clear reaches the services' own caches through shared handles
    let caches = CacheHandles {
        resources: resources.cache().clone(),
        costs: costs.cache().clone(),
    };

    let shutdown = CancellationToken::new();
    let state = AppState {
        costs: Arc::new(costs),
        resources: Arc::new(resources),
        profiles,
        commands: Arc::new(commands),
        caches,
        static_dir: Arc::new(config.static_dir.clone()),
        shutdown: shutdown.clone(),
    };

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log_info!("Shutdown requested");
                signal_token.cancel();
            }
            Err(e) => log_error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    api_server::serve(listener, api_server::router(state), shutdown).await
}

fn main() -> anyhow::Result<()> {
    // Set up panic handler BEFORE anything else to catch early crashes
    setup_panic_handler();
    init_logging();

    let config = AppConfig::from_env();
    log_info!(
        "awsdash-web {} ({}@{}) starting, static dir {:?}, cache TTL {:?}, {} regions in flight",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_BRANCH"),
        env!("GIT_COMMIT"),
        config.static_dir,
        config.cache_ttl,
        config.max_concurrent_regions
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let result = runtime.block_on(run(config));
    if let Err(e) = &result {
        log_error!("Server failed: {:#}", e);
    }
    result
}
