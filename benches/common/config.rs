use std::env;

/// Configuration for benchmarks, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Refresh period in milliseconds (from BENCH_PERIOD_MS env var, defaults to 1)
    pub period_ms: i64,

    /// Size of the cached payload (from BENCH_PAYLOAD_LEN env var, defaults to 1024)
    pub payload_len: usize,

    /// Sample size for benchmarks (from BENCH_SAMPLE_SIZE env var, defaults to 100)
    pub sample_size: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            period_ms: env::var("BENCH_PERIOD_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            payload_len: env::var("BENCH_PAYLOAD_LEN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024),
            sample_size: env::var("BENCH_SAMPLE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
        }
    }
}

impl BenchConfig {
    pub fn new() -> Self {
        let config = Self::default();
        eprintln!("Benchmark Configuration:");
        eprintln!("  Refresh period: {}ms", config.period_ms);
        eprintln!("  Payload length: {}", config.payload_len);
        eprintln!("  Sample Size: {}", config.sample_size);
        config
    }
}
