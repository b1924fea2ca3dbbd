use clap::Parser;
use oa_barometer::config::Config;
use oa_barometer::{logging, server};

#[tokio::main]
async fn main() {
    let config = Config::parse();
    logging::init(config.verbose, config.log_json);

    tracing::info!("starting oa-barometer");
    if config.verbose {
        tracing::debug!(?config, "cli config");
    }

    if let Err(e) = server::run(config).await {
        tracing::error!(error = %e, "oa-barometer failed");
        eprintln!("oa-barometer: {e}");
        std::process::exit(1);
    }
}
