//! Tracing setup (§2.1 "ambient stack"), replacing the reference's
//! bespoke CSV packet logger (`logging/csv.rs`, `logging/packets.rs`)
//! with the `tracing`/`tracing-subscriber` stack the rest of the
//! workspace already depends on.

use tracing_subscriber::EnvFilter;

/// Install a compact, env-filterable subscriber. Respects `RUST_LOG`;
/// falls back to `info` for both crates in this workspace and `warn`
/// for `tokio`'s own internal spans.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("rts_core=info,rts_types=info,tokio=warn")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}
