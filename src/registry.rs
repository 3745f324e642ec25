// registry - shared sensor session state
//
// One channel record per sensor kind: an active flag, a reference count of
// subscribers, the ordered listener list and the latest raw sample. The
// platform integration layer pushes samples in; facades and probes read
// the latest sample out. Activation is reference counted: the channel goes
// live when the first consumer starts it and shuts down when the last one
// stops, so independent consumers cannot tear down each other's stream.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{SensorError, SensorResult};
use crate::screen::ScreenState;
use crate::types::{RawMotionSample, RawOrientationSample, SensorKind};

pub type OrientationListener = Arc<dyn Fn(&RawOrientationSample) + Send + Sync>;
pub type MotionListener = Arc<dyn Fn(&RawMotionSample) + Send + Sync>;

/// Hook invoked when a channel activates or deactivates; the platform
/// layer subscribes or unsubscribes its real event stream here.
pub type LifecycleHook = Arc<dyn Fn(SensorKind) + Send + Sync>;

/// Handle for removing a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ListenerEntry<S> {
    id: ListenerId,
    retired: Arc<AtomicBool>,
    callback: Arc<dyn Fn(&S) + Send + Sync>,
}

impl<S> Clone for ListenerEntry<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            retired: Arc::clone(&self.retired),
            callback: Arc::clone(&self.callback),
        }
    }
}

struct Channel<S> {
    active: bool,
    subscribers: u32,
    listeners: Vec<ListenerEntry<S>>,
    latest: Option<S>,
    next_listener_id: u64,
}

impl<S> Default for Channel<S> {
    fn default() -> Self {
        Self {
            active: false,
            subscribers: 0,
            listeners: Vec::new(),
            latest: None,
            next_listener_id: 0,
        }
    }
}

impl<S> Channel<S> {
    fn add_listener(
        &mut self,
        callback: Arc<dyn Fn(&S) + Send + Sync>,
        retired: Arc<AtomicBool>,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push(ListenerEntry {
            id,
            retired,
            callback,
        });
        id
    }
}

/// Process-wide sensor session registry.
pub struct SensorRegistry {
    orientation: Mutex<Channel<RawOrientationSample>>,
    motion: Mutex<Channel<RawMotionSample>>,
    screen: ScreenState,
    on_activate: Option<LifecycleHook>,
    on_deactivate: Option<LifecycleHook>,
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> SensorResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| SensorError::Internal("sensor channel lock poisoned".to_string()))
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self {
            orientation: Mutex::new(Channel::default()),
            motion: Mutex::new(Channel::default()),
            screen: ScreenState::new(),
            on_activate: None,
            on_deactivate: None,
        }
    }

    /// Install platform lifecycle hooks before sharing the registry.
    pub fn with_lifecycle(
        mut self,
        on_activate: LifecycleHook,
        on_deactivate: LifecycleHook,
    ) -> Self {
        self.on_activate = Some(on_activate);
        self.on_deactivate = Some(on_deactivate);
        self
    }

    pub fn screen(&self) -> &ScreenState {
        &self.screen
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    pub fn start_orientation(&self, listener: Option<OrientationListener>) -> SensorResult<()> {
        self.start_on(SensorKind::Orientation, &self.orientation, listener)
    }

    pub fn start_motion(&self, listener: Option<MotionListener>) -> SensorResult<()> {
        self.start_on(SensorKind::Motion, &self.motion, listener)
    }

    pub fn stop_orientation(&self) -> SensorResult<()> {
        self.stop_on(SensorKind::Orientation, &self.orientation)
    }

    pub fn stop_motion(&self) -> SensorResult<()> {
        self.stop_on(SensorKind::Motion, &self.motion)
    }

    fn start_on<S>(
        &self,
        kind: SensorKind,
        channel: &Mutex<Channel<S>>,
        listener: Option<Arc<dyn Fn(&S) + Send + Sync>>,
    ) -> SensorResult<()> {
        let mut guard = lock(channel)?;
        if let Some(callback) = listener {
            guard.add_listener(callback, Arc::new(AtomicBool::new(false)));
        }
        guard.subscribers += 1;
        let activated = !guard.active;
        guard.active = true;
        drop(guard);

        if activated {
            log::debug!("{kind} channel activated");
            if let Some(hook) = &self.on_activate {
                hook(kind);
            }
        }
        Ok(())
    }

    fn stop_on<S>(&self, kind: SensorKind, channel: &Mutex<Channel<S>>) -> SensorResult<()> {
        let mut guard = lock(channel)?;
        guard.subscribers = guard.subscribers.saturating_sub(1);
        let deactivated = guard.subscribers == 0 && guard.active;
        if deactivated {
            guard.active = false;
        }
        drop(guard);

        if deactivated {
            log::debug!("{kind} channel deactivated");
            if let Some(hook) = &self.on_deactivate {
                hook(kind);
            }
        }
        Ok(())
    }

    // ── Listeners ────────────────────────────────────────────────────────

    pub fn add_orientation_listener(&self, listener: OrientationListener) -> SensorResult<ListenerId> {
        Ok(lock(&self.orientation)?.add_listener(listener, Arc::new(AtomicBool::new(false))))
    }

    pub fn add_motion_listener(&self, listener: MotionListener) -> SensorResult<ListenerId> {
        Ok(lock(&self.motion)?.add_listener(listener, Arc::new(AtomicBool::new(false))))
    }

    /// Register a listener that can retire itself by setting `retired`;
    /// retired entries are pruned after the next dispatch.
    pub(crate) fn add_orientation_listener_with_flag(
        &self,
        listener: OrientationListener,
        retired: Arc<AtomicBool>,
    ) -> SensorResult<ListenerId> {
        Ok(lock(&self.orientation)?.add_listener(listener, retired))
    }

    pub fn remove_orientation_listener(&self, id: ListenerId) -> SensorResult<()> {
        lock(&self.orientation)?.listeners.retain(|entry| entry.id != id);
        Ok(())
    }

    pub fn remove_motion_listener(&self, id: ListenerId) -> SensorResult<()> {
        lock(&self.motion)?.listeners.retain(|entry| entry.id != id);
        Ok(())
    }

    // ── Sample delivery ──────────────────────────────────────────────────

    pub fn push_orientation_sample(&self, sample: RawOrientationSample) -> SensorResult<()> {
        Self::push_on(SensorKind::Orientation, &self.orientation, sample)
    }

    pub fn push_motion_sample(&self, sample: RawMotionSample) -> SensorResult<()> {
        Self::push_on(SensorKind::Motion, &self.motion, sample)
    }

    fn push_on<S: Clone>(
        kind: SensorKind,
        channel: &Mutex<Channel<S>>,
        sample: S,
    ) -> SensorResult<()> {
        let mut guard = lock(channel)?;
        if !guard.active {
            return Ok(());
        }
        guard.latest = Some(sample.clone());
        // Snapshot outside the lock so listeners may re-enter the registry.
        let snapshot: Vec<ListenerEntry<S>> = guard.listeners.clone();
        drop(guard);

        let mut panicked = 0usize;
        for entry in &snapshot {
            if entry.retired.load(Ordering::SeqCst) {
                continue;
            }
            let callback = Arc::clone(&entry.callback);
            if catch_unwind(AssertUnwindSafe(|| callback(&sample))).is_err() {
                panicked += 1;
            }
        }
        if panicked > 0 {
            log::warn!(
                "{kind} listener panicked during dispatch ({panicked} of {})",
                snapshot.len()
            );
        }

        let mut guard = lock(channel)?;
        guard
            .listeners
            .retain(|entry| !entry.retired.load(Ordering::SeqCst));
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn latest_orientation(&self) -> SensorResult<Option<RawOrientationSample>> {
        Ok(lock(&self.orientation)?.latest)
    }

    pub fn latest_motion(&self) -> SensorResult<Option<RawMotionSample>> {
        Ok(lock(&self.motion)?.latest)
    }

    pub fn has_sample(&self, kind: SensorKind) -> SensorResult<bool> {
        match kind {
            SensorKind::Orientation => Ok(lock(&self.orientation)?.latest.is_some()),
            SensorKind::Motion => Ok(lock(&self.motion)?.latest.is_some()),
        }
    }

    pub fn is_active(&self, kind: SensorKind) -> SensorResult<bool> {
        match kind {
            SensorKind::Orientation => Ok(lock(&self.orientation)?.active),
            SensorKind::Motion => Ok(lock(&self.motion)?.active),
        }
    }

    pub fn subscriber_count(&self, kind: SensorKind) -> SensorResult<u32> {
        match kind {
            SensorKind::Orientation => Ok(lock(&self.orientation)?.subscribers),
            SensorKind::Motion => Ok(lock(&self.motion)?.subscribers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_start_activates_once() {
        let activations = Arc::new(AtomicU32::new(0));
        let hook_count = Arc::clone(&activations);
        let registry = SensorRegistry::new().with_lifecycle(
            Arc::new(move |_| {
                hook_count.fetch_add(1, Ordering::SeqCst);
            }),
            Arc::new(|_| {}),
        );

        registry.start_orientation(None).unwrap();
        registry.start_orientation(None).unwrap();

        assert!(registry.is_active(SensorKind::Orientation).unwrap());
        assert_eq!(registry.subscriber_count(SensorKind::Orientation).unwrap(), 2);
        assert_eq!(activations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_is_reference_counted() {
        let deactivations = Arc::new(AtomicU32::new(0));
        let hook_count = Arc::clone(&deactivations);
        let registry = SensorRegistry::new().with_lifecycle(
            Arc::new(|_| {}),
            Arc::new(move |_| {
                hook_count.fetch_add(1, Ordering::SeqCst);
            }),
        );

        registry.start_orientation(None).unwrap();
        registry.start_orientation(None).unwrap();

        registry.stop_orientation().unwrap();
        assert!(registry.is_active(SensorKind::Orientation).unwrap());
        assert_eq!(deactivations.load(Ordering::SeqCst), 0);

        registry.stop_orientation().unwrap();
        assert!(!registry.is_active(SensorKind::Orientation).unwrap());
        assert_eq!(deactivations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_push_stores_latest_and_dispatches_in_order() {
        let registry = SensorRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in [1, 2, 3] {
            let seen = Arc::clone(&order);
            registry
                .add_orientation_listener(Arc::new(move |_| {
                    seen.lock().unwrap().push(tag);
                }))
                .unwrap();
        }

        registry.start_orientation(None).unwrap();
        registry
            .push_orientation_sample(RawOrientationSample::new(10.0, 20.0, 30.0))
            .unwrap();

        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
        let latest = registry.latest_orientation().unwrap().unwrap();
        assert_eq!(latest.alpha, Some(10.0));
    }

    #[test]
    fn test_listener_sees_stored_sample() {
        // The sample must be stored before dispatch so listeners can read
        // the registry and observe the event that woke them.
        let registry = Arc::new(SensorRegistry::new());
        let observed = Arc::new(Mutex::new(None));

        let reg = Arc::clone(&registry);
        let slot = Arc::clone(&observed);
        registry
            .add_orientation_listener(Arc::new(move |_| {
                *slot.lock().unwrap() = reg.latest_orientation().unwrap();
            }))
            .unwrap();

        registry.start_orientation(None).unwrap();
        registry
            .push_orientation_sample(RawOrientationSample::new(42.0, 0.0, 0.0))
            .unwrap();

        assert_eq!(observed.lock().unwrap().unwrap().alpha, Some(42.0));
    }

    #[test]
    fn test_panicking_listener_does_not_starve_later_listeners() {
        let registry = SensorRegistry::new();
        let reached = Arc::new(AtomicU32::new(0));

        registry
            .add_orientation_listener(Arc::new(|_| panic!("listener failure")))
            .unwrap();
        let count = Arc::clone(&reached);
        registry
            .add_orientation_listener(Arc::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        registry.start_orientation(None).unwrap();
        registry
            .push_orientation_sample(RawOrientationSample::new(1.0, 2.0, 3.0))
            .unwrap();

        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_push_on_inactive_channel_is_ignored() {
        let registry = SensorRegistry::new();
        let fired = Arc::new(AtomicU32::new(0));
        let count = Arc::clone(&fired);
        registry
            .add_orientation_listener(Arc::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        registry
            .push_orientation_sample(RawOrientationSample::new(1.0, 0.0, 0.0))
            .unwrap();

        assert!(registry.latest_orientation().unwrap().is_none());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_removed_listener_stops_receiving() {
        let registry = SensorRegistry::new();
        let fired = Arc::new(AtomicU32::new(0));
        let count = Arc::clone(&fired);
        let id = registry
            .add_orientation_listener(Arc::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        registry.start_orientation(None).unwrap();
        registry
            .push_orientation_sample(RawOrientationSample::new(1.0, 0.0, 0.0))
            .unwrap();
        registry.remove_orientation_listener(id).unwrap();
        registry
            .push_orientation_sample(RawOrientationSample::new(2.0, 0.0, 0.0))
            .unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_motion_channel_is_independent() {
        let registry = SensorRegistry::new();
        registry.start_motion(None).unwrap();
        assert!(registry.is_active(SensorKind::Motion).unwrap());
        assert!(!registry.is_active(SensorKind::Orientation).unwrap());

        registry
            .push_motion_sample(RawMotionSample::default())
            .unwrap();
        assert!(registry.has_sample(SensorKind::Motion).unwrap());
        assert!(!registry.has_sample(SensorKind::Orientation).unwrap());
    }
}
