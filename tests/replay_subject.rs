mod custom_error;
mod register_emissions;

use std::{sync::Arc, time::Duration};

use custom_error::CustomError;
use register_emissions::Emissions;
use rxkit::subjects::{BufSize, ReplaySubject};
use rxkit::{ObservableExt, Observer, Subscribeable, Unsubscribeable};

#[test]
fn replay_subject_unbounded_buffer() {
    let (mut stx, srx) = ReplaySubject::emitter_receiver(BufSize::Unbounded);
    let early = Emissions::new();
    let late = Emissions::new();

    srx.subscribe(early.subscriber());
    stx.next(1);
    stx.next(2);
    stx.next(3);
    srx.subscribe(late.subscriber());
    stx.next(4);

    assert_eq!(early.values(), vec![1, 2, 3, 4]);
    assert_eq!(late.values(), vec![1, 2, 3, 4]);
    assert_eq!(srx.len(), 2);
}

#[test]
fn replay_subject_bounded_buffer() {
    let (mut stx, srx) = ReplaySubject::emitter_receiver(BufSize::Bounded(3));
    let emissions = Emissions::new();

    for v in 1..=5 {
        stx.next(v);
    }
    srx.subscribe(emissions.subscriber());
    assert_eq!(emissions.values(), vec![3, 4, 5]);

    stx.next(6);
    assert_eq!(emissions.values(), vec![3, 4, 5, 6]);
}

#[test]
fn replay_subject_zero_buffer_behaves_like_subject() {
    let (mut stx, srx) = ReplaySubject::emitter_receiver(BufSize::Bounded(0));
    let emissions = Emissions::new();

    stx.next(1);
    srx.subscribe(emissions.subscriber());
    stx.next(2);

    assert_eq!(emissions.values(), vec![2]);
}

#[test]
fn replay_subject_replays_then_completes() {
    let (mut stx, srx) = ReplaySubject::emitter_receiver(BufSize::Bounded(2));
    let emissions = Emissions::new();

    stx.next("a");
    stx.next("b");
    stx.next("c");
    stx.complete();
    stx.next("d");

    srx.subscribe(emissions.subscriber());
    assert_eq!(emissions.values(), vec!["b", "c"]);
    assert_eq!(emissions.completes(), 1);
    assert_eq!(srx.len(), 0);
}

#[test]
fn replay_subject_replays_then_errors() {
    let (mut stx, srx) = ReplaySubject::emitter_receiver(BufSize::Unbounded);
    let emissions = Emissions::new();

    stx.next(1);
    stx.error(Arc::new(CustomError));
    srx.subscribe(emissions.subscriber());

    assert_eq!(emissions.values(), vec![1]);
    assert_eq!(*emissions.errors.lock(), vec!["custom error occurred".to_string()]);
    assert_eq!(emissions.completes(), 0);
}

#[test]
fn replay_subject_time_window() {
    let (mut stx, srx) =
        ReplaySubject::emitter_receiver_time_aware(BufSize::Unbounded, Duration::from_millis(50));
    let emissions = Emissions::new();

    stx.next(1);
    stx.next(2);
    std::thread::sleep(Duration::from_millis(100));
    stx.next(3);
    srx.subscribe(emissions.subscriber());

    assert_eq!(emissions.values(), vec![3]);
}

#[test]
fn replay_subject_with_operators() {
    let (mut stx, srx) = ReplaySubject::emitter_receiver(BufSize::Unbounded);
    let emissions = Emissions::new();

    for v in 1..=6 {
        stx.next(v);
    }
    let subscription = srx
        .clone()
        .filter(|v| v % 2 == 0)
        .map(|v| v * 100)
        .subscribe(emissions.subscriber());
    assert_eq!(emissions.values(), vec![200, 400, 600]);

    subscription.unsubscribe();
    stx.next(8);
    assert_eq!(emissions.values(), vec![200, 400, 600]);
    assert!(srx.is_empty());
}
