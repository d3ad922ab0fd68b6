//! Simulated bot traffic against a metrics service.
//!
//! This example shows how a chat bot wires Botmeter into its handlers:
//! text messages record visits, download buttons record downloads, and an
//! admin command prints the snapshot.
//!
//! # Running
//!
//! ```bash
//! export BOTMETER_STATE_PATH=/tmp/botmeter-demo/stats.json
//! cargo run --example bot_metrics
//! ```

use botmeter::{MeterConfig, MeterError, MetricsService, UsageMeter};
use std::sync::Arc;

// Handler for any non-command text message.
async fn on_text_message(meter: &UsageMeter, user_id: i64) {
    if let Err(e) = meter.record_visit(user_id).await {
        eprintln!("could not record visit, please retry: {}", e);
    }
}

// Handler for a download button click.
async fn on_download_click(meter: &UsageMeter, user_id: i64) {
    if let Err(e) = meter.record_download(user_id).await {
        eprintln!("could not record download, please retry: {}", e);
    }
}

#[tokio::main]
async fn main() {
    let config = match MeterConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let service = match MetricsService::start(config).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Could not start metrics: {}", e);
            std::process::exit(1);
        }
    };

    // Every inbound event runs on its own task, sharing one meter.
    let meter: Arc<UsageMeter> = service.meter();
    let mut handlers = Vec::new();
    for user_id in 1..=20i64 {
        let meter = meter.clone();
        handlers.push(tokio::spawn(async move {
            on_text_message(&meter, user_id).await;
            if user_id % 4 == 0 {
                on_download_click(&meter, user_id).await;
            }
        }));
    }
    for handler in handlers {
        let _ = handler.await;
    }

    // Admin-only /stats command; access control belongs to the bot.
    match meter.snapshot().await {
        Ok(snapshot) => println!("{}", snapshot),
        Err(MeterError::PersistenceUnavailable(reason)) => {
            eprintln!("Stats unavailable right now: {}", reason);
        }
        Err(e) => eprintln!("Stats error: {}", e),
    }

    service.shutdown().await;
}
