use std::path::PathBuf;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use immersive_error::{GuardConfig, ImmersiveErrorGuard, OutgoingMessage, ProcessOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Config file as first argument, otherwise IMMERSIVE_* env vars
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => GuardConfig::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => GuardConfig::from_env(),
    };

    let guard = ImmersiveErrorGuard::new(config);
    guard.wait_loaded().await;

    let [silent, reported, fallback] = guard.rule_counts();
    eprintln!("🛡️  Immersive error guard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Rules: {silent} silent, {reported} reported, {fallback} fallback");
    eprintln!("   Each stdin line is treated as an outgoing response. Ctrl-D to exit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let mut message = OutgoingMessage::text(line);
        let outcome = guard.on_decorating_result(&mut message).await;

        println!("{}", message.delivered_text());
        if let ProcessOutcome::Replaced { role, keyword, .. } = &outcome {
            eprintln!("   [{role}] matched {keyword:?}");
        }
        if let Some(original) = &message.reported_error {
            eprintln!("   reported_error: {original}");
        }
    }

    guard.shutdown().await;
    Ok(())
}
