//! A synchronous `Observable` emitting values from 1 to 10 and completing, and an
//! asynchronous one emitting from an OS thread until it is unsubscribed.
//!
//! Set `RUST_LOG=rxkit=trace` to see subscription events.
//!
//! To run this example, execute `cargo run --example basic_observable`.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use rxkit::subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic};
use rxkit::{Observable, Observer, Subscribeable, Unsubscribeable};
use tracing::info;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let emit_10_observable = Observable::new(|mut subscriber| {
        for i in 1..=10 {
            subscriber.next(i);
        }
        subscriber.complete();
        Subscription::empty()
    });

    let mut observer = Subscriber::on_next(|v| println!("Emitted {}", v));
    observer.on_complete(|| println!("Completed"));

    // Observables are cold: nothing runs until this line.
    emit_10_observable.subscribe(observer);

    let ticking = Observable::new(|mut o: Subscriber<u32>| {
        let done = Arc::new(AtomicBool::new(false));
        let done_c = Arc::clone(&done);

        let jh = std::thread::spawn(move || {
            for i in 0.. {
                if done_c.load(Ordering::Acquire) {
                    break;
                }
                o.next(i);
                std::thread::sleep(Duration::from_millis(10));
            }
            o.complete();
        });

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || done.store(true, Ordering::Release))),
            SubscriptionHandle::JoinThread(jh),
        )
    });

    let subscription = ticking.subscribe(Subscriber::on_next(|v| println!("Tick {}", v)));
    std::thread::sleep(Duration::from_millis(55));
    subscription.unsubscribe();

    if let Err(e) = subscription.join() {
        eprintln!("producer failed: {}", e);
    }
    info!("producer thread stopped");
}
