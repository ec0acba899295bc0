//! The three subject flavors and what a late subscriber receives from each.
//!
//! To run this example, execute `cargo run --example subjects`.

use std::time::Duration;

use rxkit::{
    subjects::{BehaviorSubject, BufSize, ReplaySubject, Subject},
    subscribe::Subscriber,
    Observable, ObservableExt, Observer, Subscribeable, Unsubscribeable,
};

fn create_subscriber(name: &'static str) -> Subscriber<i32> {
    let mut s = Subscriber::on_next(move |v| println!("{} received {}", name, v));
    s.on_complete(move || println!("{} completed", name));
    s.on_error(move |e| println!("{} errored: {}", name, e));
    s
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("-- Subject");
    let (mut emitter, receiver) = Subject::emitter_receiver();
    emitter.next(0); // Nobody listens yet.
    let first = receiver.subscribe(create_subscriber("first"));
    receiver.subscribe(create_subscriber("second"));
    emitter.next(1);
    first.unsubscribe();
    emitter.next(2);
    emitter.complete();

    println!("-- ReplaySubject");
    let (mut emitter, receiver) = ReplaySubject::emitter_receiver(BufSize::Bounded(2));
    for v in 1..=4 {
        emitter.next(v);
    }
    receiver.subscribe(create_subscriber("late")); // 3 and 4
    emitter.complete();
    receiver.subscribe(create_subscriber("after complete")); // 3, 4 and completion

    let (mut emitter, receiver) =
        ReplaySubject::emitter_receiver_time_aware(BufSize::Unbounded, Duration::from_millis(50));
    emitter.next(10);
    std::thread::sleep(Duration::from_millis(80));
    emitter.next(11);
    receiver.subscribe(create_subscriber("windowed")); // Only 11.

    println!("-- BehaviorSubject");
    let (mut emitter, receiver) = BehaviorSubject::emitter_receiver(100);
    receiver.subscribe(create_subscriber("first")); // 100
    emitter.next(101);
    receiver.subscribe(create_subscriber("second")); // 101
    println!("current value {}", receiver.value());

    println!("-- Subject as observer");
    let (emitter, receiver) = Subject::emitter_receiver();
    receiver
        .clone()
        .map(|v: i32| v * 10)
        .subscribe(create_subscriber("mapped"));
    Observable::from_iter(vec![1, 2, 3]).bind_to(emitter);
    println!("observers left {}", receiver.len());
}
