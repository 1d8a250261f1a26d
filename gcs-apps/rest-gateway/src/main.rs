//! REST telemetry gateway binary.

use clap::Parser;
use ext_config::{Config, File, FileFormat};
use rest_gateway_mav::{config::RestGatewayConfig, RestTelemetryGateway};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// MAVLink REST telemetry gateway
#[derive(Parser, Debug)]
#[command(name = "rest-gateway")]
#[command(about = "Serves the latest vehicle telemetry snapshot over a JSON REST interface")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short = 'c', long = "config", default_value = "rest-gateway-config.toml")]
    config_path: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config: RestGatewayConfig = match Config::builder()
        .add_source(File::new(&args.config_path, FileFormat::Toml))
        .build()
        .and_then(|settings| settings.try_deserialize())
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config at {}: {}", args.config_path, e);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    info!("REST telemetry gateway v{}", env!("CARGO_PKG_VERSION"));

    let gateway = RestTelemetryGateway::new(config);
    if let Err(e) = gateway.start().await {
        error!("REST gateway error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(config: &RestGatewayConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_file() {
        Some(path) => {
            let file = std::fs::File::create(path).expect("Failed to create log file");
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
