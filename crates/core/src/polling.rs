//! Timer-driven sources
//!
//! Many system metrics have no change notification and must be read on an
//! interval. A [`Sampler`] knows how to read the metric into its properties;
//! [`PollingSource`] adds the lifecycle and a background thread that calls
//! it on a fixed tick.

use crate::constants::MIN_POLL_INTERVAL;
use crate::erased::AnyProperty;
use crate::error::SourceError;
use crate::lifecycle::MonitoringLifecycle;
use crate::source::{Controllable, ManuallyUpdatable, Source};
use crate::sync::lock;
use crossbeam::channel::{self, Sender};
use gathered_types::{Availability, SourceIdentifier};
use log::{debug, warn};
use std::sync::{Arc, Mutex, TryLockError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

/// Reads one metric into a fixed set of properties
pub trait Sampler: Send + Sync + 'static {
    fn identifier(&self) -> SourceIdentifier;

    fn name(&self) -> &str;

    fn availability(&self) -> Availability {
        Availability::Available
    }

    fn properties(&self) -> Vec<AnyProperty>;

    /// Read the metric and update the properties. Must not block for long.
    ///
    /// A [`PollingSource`] never runs two samples at once, so each read is
    /// stored and published before the next one begins.
    fn sample(&self);
}

/// Runs samples one at a time
#[derive(Default)]
struct SampleGate {
    running: Mutex<()>,
    owner: Mutex<Option<ThreadId>>,
}

impl SampleGate {
    /// Wait for any sample in progress, then sample.
    ///
    /// A listener that asks for a sample from inside one is ignored; the
    /// values it would read are already being published.
    fn sample<S: Sampler>(&self, sampler: &S) {
        if *lock(&self.owner) == Some(thread::current().id()) {
            debug!("Ignoring nested sample of {}", sampler.identifier());
            return;
        }
        let _running = lock(&self.running);
        self.run(sampler);
    }

    /// Sample unless another sample is in progress
    fn try_sample<S: Sampler>(&self, sampler: &S) {
        let _running = match self.running.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                debug!("Skipping tick of {}, sample in progress", sampler.identifier());
                return;
            }
        };
        self.run(sampler);
    }

    fn run<S: Sampler>(&self, sampler: &S) {
        *lock(&self.owner) = Some(thread::current().id());
        sampler.sample();
        *lock(&self.owner) = None;
    }
}

struct PollingThread {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl PollingThread {
    fn spawn<S: Sampler>(
        sampler: Arc<S>,
        gate: Arc<SampleGate>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let (stop, stop_rx) = channel::bounded::<()>(1);
        let ticker = channel::tick(interval);
        let handle = thread::Builder::new()
            .name(format!("poll-{}", sampler.identifier()))
            .spawn(move || loop {
                channel::select! {
                    recv(stop_rx) -> _ => break,
                    // Must not wait on the gate: `shutdown` may run inside a sample
                    recv(ticker) -> _ => gate.try_sample(&*sampler),
                }
            })?;
        Ok(Self { stop, handle })
    }

    fn shutdown(self) {
        let _ = self.stop.send(());
        if self.handle.thread().id() == thread::current().id() {
            // Dropped from a listener running on the polling thread itself
            return;
        }
        if self.handle.join().is_err() {
            warn!("Polling thread panicked");
        }
    }
}

/// A [`Controllable`] source that samples on a background thread.
///
/// `start_updating` samples once on the calling thread, so values are fresh
/// when it returns, then keeps sampling every `interval` until stopped or
/// dropped. Samples from the timer, `start_updating` and `update_values`
/// never overlap.
pub struct PollingSource<S: Sampler> {
    sampler: Arc<S>,
    gate: Arc<SampleGate>,
    interval: Duration,
    lifecycle: MonitoringLifecycle,
    thread: Mutex<Option<PollingThread>>,
}

impl<S: Sampler> PollingSource<S> {
    pub fn new(sampler: S, interval: Duration) -> Self {
        let lifecycle = MonitoringLifecycle::new(sampler.identifier());
        Self {
            sampler: Arc::new(sampler),
            gate: Arc::new(SampleGate::default()),
            interval: interval.max(MIN_POLL_INTERVAL),
            lifecycle,
            thread: Mutex::new(None),
        }
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<S: Sampler> Source for PollingSource<S> {
    fn identifier(&self) -> SourceIdentifier {
        self.sampler.identifier()
    }

    fn name(&self) -> &str {
        self.sampler.name()
    }

    fn availability(&self) -> Availability {
        self.sampler.availability()
    }

    fn all_properties(&self) -> Vec<AnyProperty> {
        self.sampler.properties()
    }

    fn as_controllable(&self) -> Option<&dyn Controllable> {
        Some(self)
    }

    fn as_manually_updatable(&self) -> Option<&dyn ManuallyUpdatable> {
        Some(self)
    }
}

impl<S: Sampler> ManuallyUpdatable for PollingSource<S> {
    fn update_values(&self) -> Vec<AnyProperty> {
        self.gate.sample(&*self.sampler);
        self.sampler.properties()
    }
}

impl<S: Sampler> Controllable for PollingSource<S> {
    fn lifecycle(&self) -> &MonitoringLifecycle {
        &self.lifecycle
    }

    fn start_updating(&self) {
        let availability = self.sampler.availability();
        if !availability.is_available() {
            if !self.lifecycle.is_updating() {
                self.lifecycle.reject(
                    SourceError::from_availability(availability).unwrap_or(SourceError::Unavailable),
                );
            }
            return;
        }

        {
            let mut thread = lock(&self.thread);
            if thread.is_some() {
                debug!("Source {} is already polling", self.sampler.identifier());
                return;
            }
            match PollingThread::spawn(
                Arc::clone(&self.sampler),
                Arc::clone(&self.gate),
                self.interval,
            ) {
                Ok(spawned) => *thread = Some(spawned),
                Err(e) => {
                    drop(thread);
                    self.lifecycle.reject(SourceError::Platform(e.to_string()));
                    return;
                }
            }
        }

        // Outside the thread lock; listeners may stop the source
        self.gate.sample(&*self.sampler);
        self.lifecycle.begin_monitoring();
        // A concurrent stop may have taken the thread before the transition
        if lock(&self.thread).is_none() {
            self.lifecycle.finish(None);
        }
    }

    fn stop_updating(&self) {
        let thread = lock(&self.thread).take();
        if let Some(thread) = thread {
            thread.shutdown();
        }
        self.lifecycle.finish(None);
    }
}

impl<S: Sampler> Drop for PollingSource<S> {
    fn drop(&mut self) {
        if let Some(thread) = lock(&self.thread).take() {
            thread.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{MonitoringState, SourceEvent};
    use crate::property::{BasicProperty, Property};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::mpsc;
    use std::time::Instant;

    struct CounterSampler {
        reads: AtomicU64,
        count: Arc<BasicProperty<u64>>,
        availability: Availability,
    }

    impl CounterSampler {
        fn new(availability: Availability) -> Self {
            Self {
                reads: AtomicU64::new(0),
                count: Arc::new(BasicProperty::new("Reads", 0)),
                availability,
            }
        }
    }

    impl Sampler for CounterSampler {
        fn identifier(&self) -> SourceIdentifier {
            "counter".into()
        }

        fn name(&self) -> &str {
            "Counter"
        }

        fn availability(&self) -> Availability {
            self.availability
        }

        fn properties(&self) -> Vec<AnyProperty> {
            vec![AnyProperty::new(Arc::clone(&self.count))]
        }

        fn sample(&self) {
            let reads = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            self.count.update_value_now(reads);
        }
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_fresh_source_is_idle() {
        let source = PollingSource::new(CounterSampler::new(Availability::Available), Duration::from_secs(1));
        assert!(!source.is_updating());
        assert_eq!(source.state(), MonitoringState::NotMonitoring);
        assert_eq!(source.sampler().reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_update_values_samples_without_timer() {
        let source = PollingSource::new(CounterSampler::new(Availability::Available), Duration::from_secs(1));

        let first = source.update_values();
        let second = source.update_values();

        assert_eq!(first.len(), 1);
        assert_eq!(second[0].value(), Some(serde_json::json!(2)));
        assert!(!source.is_updating());
        assert!(lock(&source.thread).is_none());
    }

    #[test]
    fn test_start_polls_until_stopped() {
        let source = PollingSource::new(
            CounterSampler::new(Availability::Available),
            Duration::from_millis(10),
        );

        source.start_updating();
        assert!(source.is_updating());
        assert!(source.sampler().reads.load(Ordering::SeqCst) >= 1);
        assert!(wait_for(|| source.sampler().reads.load(Ordering::SeqCst) >= 3));

        source.stop_updating();
        assert!(!source.is_updating());
        let after_stop = source.sampler().reads.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(source.sampler().reads.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_restart_does_not_spawn_twice() {
        let source = PollingSource::new(
            CounterSampler::new(Availability::Available),
            Duration::from_secs(60),
        );
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&events);
        let _subscription = source.add_event_listener(Box::new(move |event: &SourceEvent| {
            captured.lock().unwrap().push(event.clone());
        }));

        source.start_updating();
        source.start_updating();
        source.stop_updating();
        source.stop_updating();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                SourceEvent::StartedUpdating,
                SourceEvent::StoppedUpdating { error: None },
            ]
        );
    }

    #[test]
    fn test_unavailable_source_never_starts() {
        let source = PollingSource::new(
            CounterSampler::new(Availability::Unavailable),
            Duration::from_millis(10),
        );
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&events);
        let _subscription = source.add_event_listener(Box::new(move |event: &SourceEvent| {
            captured.lock().unwrap().push(event.clone());
        }));

        source.start_updating();

        assert!(!source.is_updating());
        assert_eq!(source.sampler().reads.load(Ordering::SeqCst), 0);
        assert_eq!(
            *events.lock().unwrap(),
            vec![SourceEvent::StoppedUpdating {
                error: Some(SourceError::Unavailable)
            }]
        );
    }

    #[test]
    fn test_subscriptions_survive_stop() {
        let source = PollingSource::new(
            CounterSampler::new(Availability::Available),
            Duration::from_secs(60),
        );
        let property = source.all_properties().remove(0);
        let received = Arc::new(AtomicU64::new(0));
        let captured = Arc::clone(&received);
        let _subscription = property.add_update_listener(move |_| {
            captured.fetch_add(1, Ordering::SeqCst);
        });

        source.start_updating();
        source.stop_updating();
        source.update_values();

        assert_eq!(received.load(Ordering::SeqCst), 2);
        assert_eq!(property.value(), Some(serde_json::json!(2)));
    }

    #[test]
    fn test_drop_stops_thread() {
        let sampler_reads;
        {
            let source = PollingSource::new(
                CounterSampler::new(Availability::Available),
                Duration::from_millis(10),
            );
            source.start_updating();
            sampler_reads = Arc::clone(&source.sampler);
        }
        let after_drop = sampler_reads.reads.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(sampler_reads.reads.load(Ordering::SeqCst), after_drop);
    }

    /// First read is slow and finishes after the second read has started
    struct SlowFirstSampler {
        reads: AtomicU64,
        value: Arc<BasicProperty<u64>>,
    }

    impl Sampler for SlowFirstSampler {
        fn identifier(&self) -> SourceIdentifier {
            "slow".into()
        }

        fn name(&self) -> &str {
            "Slow"
        }

        fn properties(&self) -> Vec<AnyProperty> {
            vec![AnyProperty::new(Arc::clone(&self.value))]
        }

        fn sample(&self) {
            let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            if read == 1 {
                thread::sleep(Duration::from_millis(150));
            }
            self.value.update_value_now(read);
        }
    }

    #[test]
    fn test_listener_can_stop_source_during_start() {
        let source = Arc::new(PollingSource::new(
            CounterSampler::new(Availability::Available),
            Duration::from_secs(60),
        ));
        let weak = Arc::downgrade(&source);
        let _subscription = source.sampler().count.add_update_listener(move |_| {
            if let Some(source) = weak.upgrade() {
                source.stop_updating();
            }
        });

        let (done_tx, done_rx) = mpsc::channel();
        let starter = Arc::clone(&source);
        thread::spawn(move || {
            starter.start_updating();
            let _ = done_tx.send(());
        });

        assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
        assert!(!source.is_updating());
        assert!(lock(&source.thread).is_none());
    }

    #[test]
    fn test_overlapping_samples_keep_newest_read() {
        let source = PollingSource::new(
            SlowFirstSampler {
                reads: AtomicU64::new(0),
                value: Arc::new(BasicProperty::new("Read", 0)),
            },
            Duration::from_secs(60),
        );

        thread::scope(|scope| {
            scope.spawn(|| source.update_values());
            thread::sleep(Duration::from_millis(30));
            scope.spawn(|| source.update_values());
        });

        assert_eq!(source.sampler().reads.load(Ordering::SeqCst), 2);
        assert_eq!(source.sampler().value.value(), 2);
    }

    #[test]
    fn test_nested_update_values_is_ignored() {
        let source = Arc::new(PollingSource::new(
            CounterSampler::new(Availability::Available),
            Duration::from_secs(60),
        ));
        let weak = Arc::downgrade(&source);
        let _subscription = source.sampler().count.add_update_listener(move |_| {
            if let Some(source) = weak.upgrade() {
                source.update_values();
            }
        });

        source.update_values();

        assert_eq!(source.sampler().reads.load(Ordering::SeqCst), 1);
    }
}
