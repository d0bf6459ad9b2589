// aifiler - AI-powered, local-first file and folder assistant
// Main entry point

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use aifiler::cli::{App, Cli, Output, TerminalOutput};
use aifiler::config::ConfigStore;
use aifiler::logging;

#[tokio::main]
async fn main() {
    logging::init_tracing();

    let cli = Cli::parse();
    let output: Arc<dyn Output> = Arc::new(TerminalOutput::new());

    // Ctrl-C cancels the in-flight model request
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling");
            ctrl_c.cancel();
        }
    });

    let store = match ConfigStore::default_location() {
        Ok(store) => store,
        Err(e) => {
            output.error(&format!("failed to resolve config path: {:#}", e));
            std::process::exit(1);
        }
    };

    let working_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            output.error(&format!("failed to resolve current directory: {}", e));
            std::process::exit(1);
        }
    };

    let app = App::new(output, store, working_dir).with_cancellation(cancel);
    let code = app.run(cli).await;
    std::process::exit(code);
}
