mod custom_error;
mod register_emissions;

use std::sync::Arc;

use custom_error::CustomError;
use register_emissions::Emissions;
use rxkit::subjects::Subject;
use rxkit::{Observable, ObservableExt, Observer, Subscribeable, Unsubscribeable};

#[test]
fn subject_emit_than_complete() {
    let emissions = Emissions::new();
    let (mut stx, srx) = Subject::emitter_receiver();

    // Emitting a value, but there are currently no registered subscribers.
    stx.next(1);
    assert_eq!(srx.len(), 0);
    assert!(emissions.values().is_empty());

    // Emissions are not stored so nothing is emitted after subscribing.
    srx.subscribe(emissions.subscriber());
    assert_eq!(srx.len(), 1);
    assert!(emissions.values().is_empty());

    stx.next(2);
    stx.next(3);
    assert_eq!(emissions.values(), vec![2, 3]);

    // Register 2 additional subscribers.
    srx.subscribe(emissions.subscriber());
    srx.subscribe(emissions.subscriber());
    assert_eq!(srx.len(), 3);

    stx.next(4);
    assert_eq!(emissions.values(), vec![2, 3, 4, 4, 4]);

    stx.complete();
    assert_eq!(srx.len(), 0);
    assert_eq!(emissions.completes(), 3);
    assert_eq!(emissions.errors(), 0);

    // A late subscriber only receives the completion.
    let late = Emissions::new();
    srx.subscribe(late.subscriber());
    stx.next(5);
    assert!(late.values().is_empty());
    assert_eq!(late.completes(), 1);
    assert_eq!(srx.len(), 0);
}

#[test]
fn subject_emit_than_error() {
    let emissions = Emissions::new();
    let (mut stx, srx) = Subject::emitter_receiver();

    srx.subscribe(emissions.subscriber());
    srx.subscribe(emissions.subscriber());
    stx.next(1);
    stx.error(Arc::new(CustomError));
    stx.complete();
    stx.next(2);

    assert_eq!(emissions.values(), vec![1, 1]);
    assert_eq!(emissions.errors(), 2);
    assert_eq!(emissions.completes(), 0);

    // The error is delivered to late subscribers as well.
    let late = Emissions::<i32>::new();
    srx.subscribe(late.subscriber());
    assert_eq!(late.errors(), 1);
}

#[test]
fn unsubscribed_observer_is_removed() {
    let first = Emissions::new();
    let second = Emissions::new();
    let (mut stx, srx) = Subject::emitter_receiver();

    let subscription = srx.subscribe(first.subscriber());
    srx.subscribe(second.subscriber());
    stx.next(1);
    subscription.unsubscribe();
    subscription.unsubscribe();
    stx.next(2);

    assert_eq!(srx.len(), 1);
    assert_eq!(first.values(), vec![1]);
    assert_eq!(second.values(), vec![1, 2]);
}

#[test]
fn closing_receiver_drops_every_observer() {
    let emissions = Emissions::new();
    let (mut stx, srx) = Subject::emitter_receiver();

    srx.subscribe(emissions.subscriber());
    srx.unsubscribe();
    assert!(srx.is_closed());
    stx.next(1);
    stx.complete();
    srx.subscribe(emissions.subscriber());

    assert!(srx.is_empty());
    assert!(emissions.values().is_empty());
    assert_eq!(emissions.completes(), 0);
}

#[test]
fn subject_bound_to_observable() {
    let emissions = Emissions::new();
    let (stx, srx) = Subject::emitter_receiver();

    srx.clone()
        .map(|v: i32| v + 1)
        .subscribe(emissions.subscriber());
    Observable::from_iter(vec![1, 2, 3]).bind_to(stx);

    assert_eq!(emissions.values(), vec![2, 3, 4]);
    assert_eq!(emissions.completes(), 1);
    assert!(srx.is_empty());
}

#[test]
fn emitting_from_many_threads() {
    let emissions = Emissions::new();
    let (stx, srx) = Subject::emitter_receiver();
    srx.subscribe(emissions.subscriber());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let mut stx = stx.clone();
            std::thread::spawn(move || {
                for i in 0..100 {
                    stx.next(t * 100 + i);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let mut values = emissions.values();
    values.sort_unstable();
    assert_eq!(values, (0..400).collect::<Vec<_>>());
}
