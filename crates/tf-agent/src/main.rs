//! Terrapilot agent — natural-language Terraform dispatch over stdio.
//!
//! Reads one query per line from stdin and writes the response text to
//! stdout, terminated by a blank line. All diagnostics go to stderr so
//! stdout stays a clean response channel.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use tf_agent::config::AgentConfig;
use tf_agent::dispatch::QueryDispatcher;
use tf_ops::TerraformHandler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tf-agent starting");

    // ── Load config ─────────────────────────────────────────────
    let config_path = std::env::args().nth(1);
    let config = AgentConfig::load(config_path.as_deref())?;
    tokio::fs::create_dir_all(&config.log_dir).await?;
    tracing::info!(
        project_root = %config.project_root.display(),
        workspace = %config.workspace.display(),
        log_dir = %config.log_dir.display(),
        "config resolved"
    );

    // ── Build the handler (fatal on invalid workspace / missing CLI) ─
    let handler = TerraformHandler::with_binary(
        &config.terraform_binary,
        &config.workspace,
        config.env.clone(),
    )
    .await
    .map_err(|e| anyhow::anyhow!("failed to initialize terraform handler: {e}"))?;

    let dispatcher = QueryDispatcher::new(handler);
    tracing::info!("tf-agent ready");

    // ── Query loop: one query per stdin line ────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(query) => {
                        if query.trim().is_empty() {
                            continue;
                        }
                        let response = dispatcher.dispatch(&query).await;
                        stdout.write_all(response.text.as_bytes()).await?;
                        stdout.write_all(b"\n\n").await?;
                        stdout.flush().await?;
                    }
                    None => {
                        tracing::info!("stdin closed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    tracing::info!("tf-agent stopped");
    Ok(())
}
