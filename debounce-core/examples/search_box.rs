//! A search box and a button, debounced.
//!
//! Simulates typing into a search field (trailing edge, 500ms) and
//! hammering a button (leading edge, 1s), then cancelling a pending
//! search before it fires.
//!
//! Run with: cargo run -p debounce-core --example search_box

use std::time::Duration;

use debounce_core::{DebounceConfig, DebouncedSignal, Debouncer, TokioScheduler};
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let scheduler = TokioScheduler::current();

    // Search input: react once typing pauses.
    let query = DebouncedSignal::new(String::new(), DebounceConfig::default(), scheduler.clone());
    let _search = query
        .settled()
        .subscribe(|q: &String| info!(query = %q, "searching"));

    for text in ["d", "de", "deb", "debo", "debounce"] {
        query.set(text.to_string());
        tokio::time::sleep(Duration::from_millis(120)).await;
    }
    tokio::time::sleep(Duration::from_millis(600)).await;

    // Button: first click counts, the rest of the burst is swallowed.
    let clicks = Debouncer::with_config(
        |n: u32| {
            info!(click = n, "button pressed");
            n
        },
        DebounceConfig::leading(Duration::from_secs(1)),
        scheduler.clone(),
    );
    for n in 1..=3 {
        let accepted = clicks.call(n).await;
        info!(click = n, ?accepted, "click handled");
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    // Cancel a pending search before it fires.
    query.set("never sent".to_string());
    tokio::time::sleep(Duration::from_millis(100)).await;
    query.cancel();
    tokio::time::sleep(Duration::from_millis(600)).await;

    info!(settled = %query.settled().get(), "done");
}
