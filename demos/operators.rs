//! Chaining operators: `filter`, `map`, `scan`, `merge`, `zip`, `try_map` and
//! `debounce`.
//!
//! To run this example, execute `cargo run --example operators`.

use std::time::Duration;

use rxkit::{
    subjects::Subject, subscribe::Subscriber, Observable, ObservableExt, Observer, Subscribeable,
    TokioScheduler,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Running total of the even squares.
    Observable::from_iter(1..=6)
        .filter(|v| v % 2 == 0)
        .map(|v| v * v)
        .scan(0, |total, v| total + v)
        .subscribe(Subscriber::on_next(|v| println!("running total {}", v)));

    let odds = Observable::from_iter(vec![1, 3, 5]);
    let evens = Observable::from_iter(vec![2, 4, 6]);
    odds.merge_one(evens.clone())
        .subscribe(Subscriber::on_next(|v| println!("merged {}", v)));

    Observable::from_iter(vec!["one", "two", "three"])
        .zip(evens)
        .subscribe(Subscriber::on_next(|(name, v)| println!("{} -> {}", name, v)));

    let mut parsed = Subscriber::on_next(|v: i64| println!("parsed {}", v));
    parsed.on_error(|e| println!("parsing stopped: {}", e));
    Observable::from_iter(vec!["7", "42", "x", "9"])
        .try_map(|s: &str| s.parse::<i64>())
        .subscribe(parsed);

    // Only the last keystroke of a burst survives the debounce.
    let scheduler = TokioScheduler::current().expect("running inside a Tokio runtime");
    let (mut keys, key_stream) = Subject::emitter_receiver();
    let mut settled = Subscriber::on_next(|v: &str| println!("search for {:?}", v));
    settled.on_complete(|| println!("input closed"));
    key_stream
        .debounce(Duration::from_millis(100), scheduler)
        .subscribe(settled);

    for partial in ["r", "ru", "rus", "rust"] {
        keys.next(partial);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
    keys.next("rxkit");
    keys.complete();
}
