//! Example keeping a set of exchange rates fresh on a tokio runtime.
//!
//! Every third fetch fails to show that readers keep seeing the last good rates.
//! Run with `RUST_LOG=info` to see the refresh logs.

use refresh_cache::{RefreshCache, RefreshCacheConfig, TokioScheduler};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Rates {
    fetch: u32,
    eur_usd: f64,
    gbp_usd: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = RefreshCacheConfig::from_env("RATES_CACHE")?;
    if std::env::var("RATES_CACHE_PERIOD_MS").is_err() {
        config.period_ms = 500;
    }

    let fetches = Arc::new(AtomicU32::new(0));
    let fetches_clone = fetches.clone();
    let rates = RefreshCache::<Rates>::builder()
        .config(&config)
        .producer(move || -> Result<Rates, String> {
            let fetch = fetches_clone.fetch_add(1, Ordering::SeqCst) + 1;
            if fetch % 3 == 0 {
                return Err(format!("rate feed timed out on fetch {fetch}"));
            }
            Ok(Rates {
                fetch,
                eur_usd: 1.08 + f64::from(fetch) * 0.001,
                gbp_usd: 1.27 - f64::from(fetch) * 0.001,
            })
        })
        .scheduler(Arc::new(TokioScheduler::current()?))
        .build()?;

    let period = config.schedule().period();
    for _ in 0..8 {
        match rates.read() {
            Some(current) => println!("{}", serde_json::to_string(current.as_ref())?),
            None => println!("no rates yet"),
        }
        tokio::time::sleep(period).await;
    }

    println!("{:?}", rates.stats());
    Ok(())
}
