//! Moving work between execution contexts: producing on a Tokio runtime and
//! observing on a dedicated event loop thread.
//!
//! To run this example, execute `cargo run --example scheduling`.

use std::{sync::mpsc, time::Duration};

use rxkit::{
    subscribe::{Subscriber, Subscription},
    EventLoopScheduler, Observable, ObservableExt, Observer, Subscribeable, SubscriptionBag,
    TokioScheduler,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let runtime = TokioScheduler::current().expect("running inside a Tokio runtime");
    let designated = EventLoopScheduler::new("designated");
    let bag = SubscriptionBag::new();
    let (done_tx, done_rx) = mpsc::channel();

    let designated_c = designated.clone();
    let mut observer = Subscriber::on_next(move |tick: u64| {
        info!(tick, on_event_loop = designated_c.is_current(), "tick observed");
    });
    observer.on_complete(move || {
        let _ = done_tx.send(());
    });

    // The producer itself is started from the event loop thread.
    let loop_for_producer = designated.clone();
    Observable::new(move |mut o: Subscriber<&str>| {
        info!(on_event_loop = loop_for_producer.is_current(), "producer started");
        o.next("warm-up");
        o.complete();
        Subscription::empty()
    })
    .subscribe_on(designated.clone())
    .subscribe(Subscriber::on_next(|v| info!(value = v, "producer emitted")))
    .disposed_by(&bag);

    Observable::interval(Duration::from_millis(50), runtime)
        .take(5)
        .observe_on(designated)
        .subscribe(observer)
        .disposed_by(&bag);

    let finished = tokio::task::spawn_blocking(move || done_rx.recv_timeout(Duration::from_secs(2)))
        .await
        .map(|r| r.is_ok())
        .unwrap_or(false);
    if !finished {
        warn!("interval did not complete in time");
    }
    // Dropping the bag releases whatever is still running.
    drop(bag);
}
