mod custom_error;
mod generate_observable;
mod register_emissions;

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use custom_error::CustomError;
use generate_observable::generate_u32_observable;
use parking_lot::Mutex;
use register_emissions::Emissions;
use rxkit::{
    subjects::Subject,
    subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic},
    Observable, ObservableExt, Observer, RxError, Subscribeable, Unsubscribeable,
    VirtualTimeScheduler,
};

fn tracked_source(unsubscribed: &Arc<AtomicBool>) -> Observable<i32> {
    let unsubscribed = Arc::clone(unsubscribed);
    Observable::new(move |_| {
        let unsubscribed = Arc::clone(&unsubscribed);
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || unsubscribed.store(true, Ordering::SeqCst))),
            SubscriptionHandle::Nil,
        )
    })
}

// Emits `0..end` synchronously, checking `is_stopped` before every value, and
// counts how many values it produced.
fn counted_range(end: u64, produced: &Arc<AtomicUsize>) -> Observable<u64> {
    let produced = Arc::clone(produced);
    Observable::new(move |mut o: Subscriber<u64>| {
        for v in 0..end {
            if o.is_stopped() {
                break;
            }
            produced.fetch_add(1, Ordering::SeqCst);
            o.next(v);
        }
        o.complete();
        Subscription::empty()
    })
}

#[test]
fn map_observable() {
    let emissions = Emissions::new();

    Observable::from_iter(vec![1, 2, 3])
        .map(|x| format!("emit to str {}", x + 1000))
        .subscribe(emissions.subscriber());

    assert_eq!(
        emissions.values(),
        vec!["emit to str 1001", "emit to str 1002", "emit to str 1003"]
    );
    assert_eq!(emissions.completes(), 1);
}

#[test]
fn map_composes() {
    let f = |x: i32| x * 3;
    let g = |x: i32| x - 1;
    let chained = Emissions::new();
    let composed = Emissions::new();

    Observable::from_iter(0..10)
        .map(f)
        .map(g)
        .subscribe(chained.subscriber());
    Observable::from_iter(0..10)
        .map(move |x| g(f(x)))
        .subscribe(composed.subscriber());

    assert_eq!(chained.values(), composed.values());
}

#[test]
fn filter_observable() {
    let odd = Emissions::new();
    let all = Emissions::new();
    let none = Emissions::new();

    Observable::from_iter(0..=10)
        .filter(|x| x % 2 != 0)
        .subscribe(odd.subscriber());
    Observable::from_iter(0..=10)
        .filter(|_| true)
        .subscribe(all.subscriber());
    Observable::from_iter(0..=10)
        .filter(|_| false)
        .subscribe(none.subscriber());

    assert_eq!(odd.values(), vec![1, 3, 5, 7, 9]);
    assert_eq!(all.values(), (0..=10).collect::<Vec<_>>());
    assert!(none.values().is_empty());
    assert_eq!(none.completes(), 1);
}

#[test]
fn scan_emits_running_accumulation() {
    let emissions = Emissions::new();

    Observable::from_iter(vec![1, 2, 3, 4])
        .scan(10, |acc, v| acc + v)
        .subscribe(emissions.subscriber());

    assert_eq!(emissions.values(), vec![11, 13, 16, 20]);
    assert_eq!(emissions.completes(), 1);
}

#[test]
fn scan_keeps_state_per_subscription() {
    let counted = Observable::from_iter(vec!["a", "b"]).scan(0_usize, |count, _| count + 1);
    let first = Emissions::new();
    let second = Emissions::new();

    counted.subscribe(first.subscriber());
    counted.subscribe(second.subscriber());

    assert_eq!(first.values(), vec![1, 2]);
    assert_eq!(second.values(), vec![1, 2]);
}

#[test]
fn take_and_skip() {
    let taken = Emissions::new();
    let skipped = Emissions::new();
    let short = Emissions::new();

    Observable::from_iter(0..).take(4).subscribe(taken.subscriber());
    Observable::from_iter(0..6).skip(4).subscribe(skipped.subscriber());
    Observable::from_iter(0..2).take(5).subscribe(short.subscriber());

    assert_eq!(taken.values(), vec![0, 1, 2, 3]);
    assert_eq!(taken.completes(), 1);
    assert_eq!(skipped.values(), vec![4, 5]);
    assert_eq!(short.values(), vec![0, 1]);
    assert_eq!(short.completes(), 1);
}

#[test]
fn take_unsubscribes_thread_producer() {
    let last_emit = Arc::new(Mutex::new(None));
    let emissions = Emissions::new();

    let subscription = generate_u32_observable(10_000, Arc::clone(&last_emit))
        .take(7)
        .subscribe(emissions.subscriber());

    assert!(subscription.join().is_ok());
    assert_eq!(emissions.values(), (0..7).collect::<Vec<_>>());
    assert_eq!(emissions.completes(), 1);
    let last = last_emit.lock().unwrap_or_default();
    assert!(last < 100, "producer kept emitting up to {}", last);
}

#[test]
fn take_after_map_stops_infinite_iterator() {
    let emissions = Emissions::new();

    Observable::from_iter(0u64..)
        .map(|x| x * 2)
        .take(3)
        .subscribe(emissions.subscriber());

    assert_eq!(emissions.values(), vec![0, 2, 4]);
    assert_eq!(emissions.completes(), 1);
}

#[test]
fn take_stops_source_through_operator_chain() {
    let produced = Arc::new(AtomicUsize::new(0));
    let emissions = Emissions::new();

    counted_range(1_000_000, &produced)
        .map(|x| x + 1)
        .filter(|_| true)
        .scan(0, |sum, x| sum + x)
        .skip(1)
        .take(3)
        .subscribe(emissions.subscriber());

    assert_eq!(emissions.values(), vec![3, 6, 10]);
    assert_eq!(produced.load(Ordering::SeqCst), 4);
}

#[test]
fn try_map_error_stops_source_behind_map() {
    let produced = Arc::new(AtomicUsize::new(0));
    let emissions = Emissions::new();

    counted_range(1_000_000, &produced)
        .map(|x| x * 10)
        .try_map(|x| u8::try_from(x + 240))
        .subscribe(emissions.subscriber());

    assert_eq!(emissions.values(), vec![240, 250]);
    assert_eq!(emissions.errors(), 1);
    assert_eq!(produced.load(Ordering::SeqCst), 3);
}

#[test]
fn take_after_merge_stops_mapped_source() {
    let produced = Arc::new(AtomicUsize::new(0));
    let emissions = Emissions::new();

    counted_range(1_000_000, &produced)
        .map(|x| x + 1)
        .merge_one(Observable::never())
        .take(5)
        .subscribe(emissions.subscriber());

    assert_eq!(emissions.values(), vec![1, 2, 3, 4, 5]);
    assert_eq!(emissions.completes(), 1);
    assert_eq!(produced.load(Ordering::SeqCst), 5);
}

#[test]
fn zip_completion_stops_mapped_source() {
    let produced = Arc::new(AtomicUsize::new(0));
    let emissions = Emissions::new();

    Observable::from_iter(vec!["x", "y"])
        .zip(counted_range(1_000_000, &produced).map(|x| x * 2))
        .subscribe(emissions.subscriber());

    assert_eq!(emissions.values(), vec![("x", 0), ("y", 2)]);
    assert_eq!(emissions.completes(), 1);
    assert_eq!(produced.load(Ordering::SeqCst), 2);
}

#[test]
fn try_map_forwards_operator_error() {
    let error = Arc::new(Mutex::new(None));
    let error_c = Arc::clone(&error);
    let values = Arc::new(Mutex::new(Vec::new()));
    let values_c = Arc::clone(&values);

    let mut s = Subscriber::on_next(move |v: u8| values_c.lock().push(v));
    s.on_error(move |e| *error_c.lock() = Some(e));
    Observable::from_iter(vec![1_i32, 200, 300, 4])
        .try_map(u8::try_from)
        .subscribe(s);

    assert_eq!(*values.lock(), vec![1, 200]);
    let error = error.lock().take().expect("try_map did not report an error");
    match error.downcast_ref::<RxError>() {
        Some(RxError::Operator { operator, source }) => {
            assert_eq!(*operator, "try_map");
            assert!(source.is::<std::num::TryFromIntError>());
        }
        other => panic!("expected an operator error, got {:?}", other),
    }
}

#[test]
fn merge_interleaves_sources() {
    let (mut tx1, rx1) = Subject::emitter_receiver();
    let (mut tx2, rx2) = Subject::emitter_receiver();
    let emissions = Emissions::new();

    Observable::from(rx1)
        .merge_one(Observable::from(rx2))
        .subscribe(emissions.subscriber());

    tx1.next(1);
    tx2.next(2);
    tx1.next(3);
    tx1.complete();
    assert_eq!(emissions.completes(), 0);
    tx2.next(4);
    tx2.complete();

    assert_eq!(emissions.values(), vec![1, 2, 3, 4]);
    assert_eq!(emissions.completes(), 1);
}

#[test]
fn merge_error_cancels_siblings() {
    let first = Arc::new(AtomicBool::new(false));
    let second = Arc::new(AtomicBool::new(false));
    let emissions = Emissions::new();

    tracked_source(&first)
        .merge(vec![
            tracked_source(&second),
            Observable::throw(CustomError),
        ])
        .subscribe(emissions.subscriber());

    assert_eq!(emissions.errors(), 1);
    assert_eq!(emissions.completes(), 0);
    assert!(first.load(Ordering::SeqCst));
    assert!(second.load(Ordering::SeqCst));
}

#[test]
fn merge_all_of_finite_sources() {
    let emissions = Emissions::new();

    Observable::merge_all(vec![
        Observable::from_iter(vec![1, 2]),
        Observable::empty(),
        Observable::from_iter(vec![3]),
    ])
    .subscribe(emissions.subscriber());

    assert_eq!(emissions.values(), vec![1, 2, 3]);
    assert_eq!(emissions.completes(), 1);
}

#[test]
fn zip_pairs_by_index() {
    let (mut letters_tx, letters_rx) = Subject::emitter_receiver();
    let (mut numbers_tx, numbers_rx) = Subject::emitter_receiver();
    let emissions = Emissions::new();

    letters_rx
        .zip(Observable::from(numbers_rx))
        .subscribe(emissions.subscriber());

    letters_tx.next('a');
    letters_tx.next('b');
    assert!(emissions.values().is_empty());
    numbers_tx.next(1);
    numbers_tx.next(2);
    numbers_tx.next(3);
    letters_tx.complete();

    assert_eq!(emissions.values(), vec![('a', 1), ('b', 2)]);
    assert_eq!(emissions.completes(), 1);
}

#[test]
fn zip_stops_infinite_side() {
    let emissions = Emissions::new();

    // The finite side is subscribed first, so the infinite one is stopped once
    // both buffered items are paired.
    Observable::from_iter(vec!["x", "y"])
        .zip(Observable::from_iter(0_u64..))
        .subscribe(emissions.subscriber());

    assert_eq!(emissions.values(), vec![("x", 0), ("y", 1)]);
    assert_eq!(emissions.completes(), 1);
}

#[test]
fn zip_forwards_first_error() {
    let unsubscribed = Arc::new(AtomicBool::new(false));
    let emissions = Emissions::<(i32, i32)>::new();

    tracked_source(&unsubscribed)
        .zip(Observable::throw(CustomError))
        .subscribe(emissions.subscriber());

    assert_eq!(emissions.errors(), 1);
    assert!(unsubscribed.load(Ordering::SeqCst));
}

#[test]
fn debounce_emits_after_quiet_period() {
    let scheduler = VirtualTimeScheduler::new();
    let (mut tx, rx) = Subject::emitter_receiver();
    let emissions = Emissions::new();

    rx.debounce(Duration::from_millis(100), scheduler.clone())
        .subscribe(emissions.subscriber());

    tx.next(1);
    scheduler.advance_by(Duration::from_millis(50));
    tx.next(2);
    scheduler.advance_by(Duration::from_millis(50));
    tx.next(3);
    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(emissions.values(), vec![3]);

    tx.next(4);
    scheduler.advance_by(Duration::from_millis(150));
    tx.next(5);
    tx.complete();

    assert_eq!(emissions.values(), vec![3, 4, 5]);
    assert_eq!(emissions.completes(), 1);
}

#[test]
fn debounce_unsubscribe_cancels_pending_value() {
    let scheduler = VirtualTimeScheduler::new();
    let (mut tx, rx) = Subject::emitter_receiver();
    let emissions = Emissions::new();

    let subscription = rx
        .debounce(Duration::from_millis(10), scheduler.clone())
        .subscribe(emissions.subscriber());

    tx.next("pending");
    subscription.unsubscribe();
    scheduler.advance_by(Duration::from_millis(20));

    assert!(emissions.values().is_empty());
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn catch_error_switches_to_fallback() {
    let emissions = Emissions::new();
    let seen = Arc::new(Mutex::new(String::new()));
    let seen_c = Arc::clone(&seen);

    Observable::from_iter(vec![1, 2])
        .merge_one(Observable::throw(CustomError))
        .catch_error(move |e| {
            *seen_c.lock() = e.to_string();
            Observable::from_iter(vec![10, 20])
        })
        .subscribe(emissions.subscriber());

    assert_eq!(emissions.values(), vec![1, 2, 10, 20]);
    assert_eq!(emissions.completes(), 1);
    assert_eq!(emissions.errors(), 0);
    assert_eq!(*seen.lock(), "custom error occurred");
}

#[test]
fn retry_resubscribes_failing_source() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_c = Arc::clone(&attempts);
    let emissions = Emissions::new();

    let flaky = Observable::new(move |mut o: Subscriber<&str>| {
        if attempts_c.fetch_add(1, Ordering::SeqCst) < 2 {
            o.error(Arc::new(CustomError));
        } else {
            o.next("connected");
            o.complete();
        }
        Subscription::empty()
    });
    flaky.retry(5).subscribe(emissions.subscriber());

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(emissions.values(), vec!["connected"]);
    assert_eq!(emissions.errors(), 0);
}

#[test]
fn retry_many_synchronous_failures() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_c = Arc::clone(&attempts);
    let emissions = Emissions::new();

    let failing = Observable::new(move |mut o: Subscriber<i32>| {
        attempts_c.fetch_add(1, Ordering::SeqCst);
        o.error(Arc::new(CustomError));
        Subscription::empty()
    });
    failing.retry(10_000).subscribe(emissions.subscriber());

    assert_eq!(attempts.load(Ordering::SeqCst), 10_001);
    assert_eq!(emissions.errors(), 1);
    assert!(emissions.values().is_empty());
}

#[test]
fn retry_throw_exhausts_without_overflow() {
    let emissions = Emissions::new();

    Observable::<i32>::throw(CustomError)
        .retry(10_000)
        .subscribe(emissions.subscriber());

    assert_eq!(*emissions.errors.lock(), vec!["custom error occurred"]);
}

#[test]
fn catch_error_join_awaits_fallback_thread() {
    let last_emit = Arc::new(Mutex::new(None));
    let emissions = Emissions::new();
    let last_emit_c = Arc::clone(&last_emit);

    let subscription = Observable::throw(CustomError)
        .catch_error(move |_| generate_u32_observable(5, Arc::clone(&last_emit_c)))
        .subscribe(emissions.subscriber());

    assert!(subscription.join().is_ok());
    assert_eq!(emissions.values(), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(emissions.completes(), 1);
    assert_eq!(*last_emit.lock(), Some(5));
}

#[test]
fn bind_to_feeds_subject() {
    let (tx, rx) = Subject::emitter_receiver::<i32>();
    let emissions = Emissions::new();

    rx.subscribe(emissions.subscriber());
    Observable::from_iter(vec![1, 2, 3])
        .map(|v| v * v)
        .bind_to(tx);

    assert_eq!(emissions.values(), vec![1, 4, 9]);
    assert_eq!(emissions.completes(), 1);
}

#[test]
fn operators_chain_on_subject_receiver() {
    let (mut tx, rx) = Subject::emitter_receiver();
    let emissions = Emissions::new();

    let subscription = rx
        .clone()
        .filter(|v: &i32| *v > 0)
        .map(|v| v * 10)
        .scan(0, |acc, v| acc + v)
        .subscribe(emissions.subscriber());

    tx.next(1);
    tx.next(-5);
    tx.next(2);
    subscription.unsubscribe();
    tx.next(3);

    assert_eq!(emissions.values(), vec![10, 30]);
    assert_eq!(rx.len(), 0);
}
