use anyhow::Result;
use tracing::{error, info};

use stylegen::app::api::app_api_loop;
use stylegen::app::build_pipeline;
use stylegen::environment::AppConfig;
use stylegen::logging::configure_logging;

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();

    // Refuse to start without credentials, before touching the corpus or network
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Starting stylegen {} ({}), corpus root {}",
        env!("CARGO_PKG_VERSION"),
        env!("STYLEGEN_GIT_HASH"),
        config.corpus_root.display()
    );

    let pipeline = build_pipeline(&config)?;
    app_api_loop(&config, pipeline).await
}
