//! Example live ticker over a WebSocket price stream.
//!
//! Run with: `cargo run --example ticker -- wss://prices.example.com/ws ETH BTC`
//!
//! Set `RUST_LOG=tickbook_hub=debug` to watch reconnects and resubscribes.

use std::time::Duration;
use tickbook::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "ws://127.0.0.1:8080/prices".to_string());
    let mut symbols: Vec<String> = args.collect();
    if symbols.is_empty() {
        symbols = vec!["ETH".to_string(), "BTC".to_string()];
    }

    println!("Streaming {:?} from {}", symbols, url);

    let (driver, hub) = HubBuilder::new(WsConnector::new(url))
        .connect_timeout(Duration::from_secs(5))
        .retry_interval(Duration::from_millis(3000))
        .max_reconnect_attempts(10)
        .build();

    hub.on_status_change(|event| match event {
        StatusEvent::StateChanged(state) => println!("[Hub] {}", state),
        StatusEvent::TransportError(message) => eprintln!("[Hub] transport error: {}", message),
        StatusEvent::RetriesExhausted { attempts } => {
            eprintln!("[Hub] gave up after {} attempts; press Ctrl+C to exit", attempts);
        }
    });

    for symbol in &symbols {
        hub.subscribe(symbol.as_str(), |msg| {
            if let Some(tick) = msg.tick() {
                println!(
                    "{:<8} bid {:>14} ask {:>14} mid {:>14}",
                    tick.symbol, tick.bid, tick.ask, tick.mid
                );
            }
        });
    }

    hub.subscribe(WILDCARD, |msg| {
        if msg.tick().is_none() {
            println!("[Hub] {} message", msg.kind);
        }
    });

    let driver_task = tokio::spawn(driver.run());

    tokio::signal::ctrl_c().await?;
    println!("\nShutting down...");

    hub.shutdown()?;
    driver_task.await?;

    Ok(())
}
