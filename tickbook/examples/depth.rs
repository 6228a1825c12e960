//! Example depth view built from a canned depth response.
//!
//! Run with: `cargo run --example depth -- 0.25`
//!
//! The optional argument is the bucket step in percent (0.01, 0.25, 0.5 or 1).

use async_trait::async_trait;
use tickbook::prelude::*;

const RESPONSE: &str = r#"{
    "bids": [
        {"price": "2001.20", "amount": "3.0", "count": 2},
        {"price": "1999.80", "amount": "1.5", "count": 3},
        {"price": "1998.10", "amount": "4.2", "count": 5},
        {"price": "1995.00", "amount": "12", "count": 9},
        {"price": "1990.40", "amount": "7.7", "count": 4},
        {"price": "1984.00", "amount": "20", "count": 11}
    ],
    "asks": [
        {"price": "1999.00", "amount": "2.0", "count": 1},
        {"price": "2000.40", "amount": "0.8", "count": 2},
        {"price": "2002.50", "amount": "5.1", "count": 4},
        {"price": "2006.00", "amount": "9.0", "count": 6},
        {"price": "2011.90", "amount": "3.3", "count": 2},
        {"price": "2030.00", "amount": "25", "count": 14}
    ],
    "timestamp": 1700000000000,
    "summary": {"spotPrice": "2000"}
}"#;

/// Depth source answering every request with [`RESPONSE`].
struct CannedSource;

#[async_trait]
impl DepthSource for CannedSource {
    async fn fetch(&self, chain: ChainId, pair: &TokenPair) -> Result<RawOrderBook, SourceError> {
        Ok(DepthResponse::from_json(RESPONSE)?.into_raw(chain, pair.clone()))
    }
}

fn print_side(label: &str, rows: &[AggregatedLevel]) {
    println!("{label}");
    println!("  {:>12} {:>10} {:>10} {:>6}", "price", "amount", "total", "orders");
    for row in rows {
        let marker = if row.is_remainder { " (rest)" } else { "" };
        println!(
            "  {:>12} {:>10} {:>10} {:>6}{}",
            row.price, row.amount, row.total, row.count, marker
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let step = match std::env::args().nth(1) {
        Some(raw) => StepPercent::new(raw.parse()?)?,
        None => StepPercent::QUARTER,
    };
    let params = ViewParams::default().step(step).display_cap(4);

    let service = DepthService::new(CannedSource);
    let view = service
        .view(ChainId(1), &TokenPair::new("WETH", "USDC"), &params)
        .await?;

    println!(
        "{} on chain {} (reference {:?}, step {}%)",
        view.pair,
        view.chain,
        view.reference_price,
        step.value()
    );
    print_side("Asks", &view.asks);
    print_side("Bids", &view.bids);

    if let Some(spread) = view.spread {
        println!(
            "Spread {} ({:?}%) {:?}",
            spread.absolute, spread.percent, spread.status
        );
    }

    println!("\n{}", serde_json::to_string_pretty(&view)?);

    Ok(())
}
