use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use envconfig::Envconfig;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use feature_context::config::Config;
use feature_context::flags::flag_models::RawFlags;
use feature_context::flags::overrides::CookieOverrideStore;
use feature_context::provider::FeaturesProvider;

fn init_logging(debug: bool) {
    // Logs go to stderr, stdout carries the features JSON
    let base_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    let log_layer = if debug {
        base_layer
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_ansi(true)
            .with_filter(EnvFilter::from_default_env())
            .boxed()
    } else {
        base_layer
            .json()
            .with_filter(EnvFilter::from_default_env())
            .boxed()
    };

    tracing_subscriber::registry().with(log_layer).init();
}

/// Reads raw flags as JSON on stdin and an optional `Cookie` header as the
/// first argument, then prints the resulting features as JSON.
fn main() -> anyhow::Result<()> {
    let config = Config::init_from_env().context("Invalid configuration")?;
    init_logging(*config.debug);

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read flags from stdin")?;
    let flags: RawFlags = if input.trim().is_empty() {
        RawFlags::default()
    } else {
        serde_json::from_str(&input).context("flags on stdin are not a JSON object")?
    };

    let cookie_header = std::env::args().nth(1);
    let store = CookieOverrideStore::from_config(&config, cookie_header);
    let mut provider = FeaturesProvider::new(store, config.is_preview())
        .with_inspector(|keys| tracing::info!(?keys, "merged feature keys"));

    let features = provider.provide(Arc::new(flags), Some(true), Some(true));
    println!("{}", serde_json::to_string_pretty(&*features)?);

    Ok(())
}
