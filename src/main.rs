use clap::Parser;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use telescoped::config::Config;
use telescoped::controller::Controller;
use telescoped::error::{ConfigError, StartupError};
use telescoped::hal::Hal;
use telescoped::{hal, plugins, server};
use tokio::net::TcpListener;

/// Telescope control daemon: drives a two-axis stepper mount and serves
/// Stellarium + a custom control client over a binary TCP protocol.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 10000)]
    port: u16,

    /// Module name of an alternative controller. Rust has no equivalent of
    /// dynamic module substitution, so this is parsed and logged but the
    /// bundled `Controller` is always the one instantiated.
    #[arg(long, env = "CONTROLLER", default_value = "controller")]
    controller: String,

    #[arg(long = "log-level", env = "LOGLEVEL", default_value = "error")]
    log_level: String,

    #[arg(long = "log-file", env = "LOGFILE")]
    log_file: Option<String>,

    #[arg(long = "user-plugins", env = "USER_PLUGINS", value_delimiter = ',')]
    user_plugins: Vec<String>,
}

fn init_logging(args: &Args) -> Result<(), ConfigError> {
    let level: tracing::Level = args
        .log_level
        .to_uppercase()
        .parse()
        .map_err(|_| ConfigError::InvalidLogLevel(args.log_level.clone()))?;
    let filter = tracing_subscriber::EnvFilter::new(level.to_string());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &args.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| ConfigError::LogFile {
                    path: path.clone(),
                    source,
                })?;
            builder.with_writer(Mutex::new(file)).init();
        }
        None => builder.init(),
    }
    Ok(())
}

async fn bind(addr: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.to_string(),
            source,
        })
}

#[cfg(feature = "rpi")]
fn build_hal() -> Arc<dyn Hal> {
    match hal::RppalHal::new() {
        Ok(rpi) => Arc::new(rpi),
        Err(error) => {
            tracing::error!(%error, "failed to initialize rpi gpio, falling back to stub hal");
            Arc::new(hal::StubHal::new())
        }
    }
}

#[cfg(not(feature = "rpi"))]
fn build_hal() -> Arc<dyn Hal> {
    Arc::new(hal::StubHal::new())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(error) = init_logging(&args) {
        eprintln!("{error}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        controller = %args.controller,
        "controller module requested (the bundled controller is always used)"
    );
    for plugin in &args.user_plugins {
        plugins::log_requested(plugin);
    }

    let config: Config = match confy::load("telescoped", None).map_err(ConfigError::from) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(error = %StartupError::from(error), "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let hal = build_hal();
    let controller = Controller::new(&config, hal);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = match bind(&addr).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "startup failed");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%addr, "telescope server listening");

    tokio::select! {
        _ = server::run(listener, controller) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
        }
    }

    ExitCode::SUCCESS
}
