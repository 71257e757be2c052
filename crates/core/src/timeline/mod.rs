//! Cooperative per-refresh loop. The host owns the refresh callback; the
//! scheduler only decides whether a callback is live and when to ask for the
//! next one.

use std::{collections::VecDeque, time::Duration};

/// Token returned by the host for one requested refresh callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Per-refresh callback facility of the host.
pub trait FrameHost {
    /// Asks for one callback on the next display refresh.
    fn request_frame(&mut self) -> FrameHandle;

    /// Withdraws a request. Unknown or already fired handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// In-memory host that holds requests until the caller simulates a refresh.
#[derive(Debug, Default)]
pub struct QueuedFrameHost {
    next_id: u64,
    pending: VecDeque<FrameHandle>,
}

impl QueuedFrameHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every request made before this refresh.
    pub fn drain(&mut self) -> Vec<FrameHandle> {
        self.pending.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

impl FrameHost for QueuedFrameHost {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle::new(self.next_id);
        self.pending.push_back(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.retain(|pending| *pending != handle);
    }
}

/// Seconds elapsed since the first refresh the clock observed.
#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    origin: Option<Duration>,
}

impl PlaybackClock {
    pub fn reset(&mut self) {
        self.origin = None;
    }

    /// Elapsed seconds at host timestamp `now`. The first call pins the origin;
    /// timestamps earlier than the origin read as zero.
    pub fn elapsed(&mut self, now: Duration) -> f32 {
        let origin = *self.origin.get_or_insert(now);
        now.saturating_sub(origin).as_secs_f32()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Stopped,
    Running,
}

/// Stopped/Running state machine that keeps at most one request in flight.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    state: SchedulerState,
    pending: Option<FrameHandle>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Returns `false` when already running.
    pub fn start(&mut self, host: &mut dyn FrameHost) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = SchedulerState::Running;
        self.pending = Some(host.request_frame());
        true
    }

    /// Cancels the outstanding request. Returns whether the loop was running.
    pub fn stop(&mut self, host: &mut dyn FrameHost) -> bool {
        let was_running = self.is_running();
        self.state = SchedulerState::Stopped;
        if let Some(handle) = self.pending.take() {
            host.cancel_frame(handle);
        }
        was_running
    }

    /// Accepts the callback for `handle` if it is the live request of a
    /// running loop. Stale callbacks return `false` and change nothing.
    pub fn begin_tick(&mut self, handle: FrameHandle) -> bool {
        if !self.is_running() || self.pending != Some(handle) {
            return false;
        }
        self.pending = None;
        true
    }

    /// Requests the next callback once a tick has finished.
    pub fn schedule_next(&mut self, host: &mut dyn FrameHost) {
        if self.is_running() && self.pending.is_none() {
            self.pending = Some(host.request_frame());
        }
    }

    /// Ends the loop from inside a tick without asking for another callback.
    pub fn halt(&mut self) {
        self.state = SchedulerState::Stopped;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_start_keeps_one_chain() {
        let mut host = QueuedFrameHost::new();
        let mut scheduler = FrameScheduler::new();

        assert!(scheduler.start(&mut host));
        assert!(!scheduler.start(&mut host));
        assert_eq!(host.pending(), 1);

        let handles = host.drain();
        assert!(scheduler.begin_tick(handles[0]));
        scheduler.schedule_next(&mut host);
        scheduler.schedule_next(&mut host);
        assert_eq!(host.pending(), 1);
    }

    #[test]
    fn stop_cancels_and_start_resumes() {
        let mut host = QueuedFrameHost::new();
        let mut scheduler = FrameScheduler::new();

        scheduler.start(&mut host);
        let first = scheduler.pending().unwrap();
        assert!(scheduler.stop(&mut host));
        assert!(host.is_idle());
        assert!(!scheduler.stop(&mut host));

        // A callback that slipped through after stop is ignored.
        assert!(!scheduler.begin_tick(first));

        scheduler.start(&mut host);
        let handles = host.drain();
        assert_eq!(handles.len(), 1);
        assert!(scheduler.begin_tick(handles[0]));
    }

    #[test]
    fn stale_handles_are_rejected() {
        let mut host = QueuedFrameHost::new();
        let mut scheduler = FrameScheduler::new();
        scheduler.start(&mut host);

        assert!(!scheduler.begin_tick(FrameHandle::new(999)));
        assert!(scheduler.pending().is_some());
    }

    #[test]
    fn halt_ends_the_loop_without_a_request() {
        let mut host = QueuedFrameHost::new();
        let mut scheduler = FrameScheduler::new();
        scheduler.start(&mut host);
        let handle = host.drain()[0];

        assert!(scheduler.begin_tick(handle));
        scheduler.halt();
        scheduler.schedule_next(&mut host);
        assert!(host.is_idle());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[test]
    fn clock_measures_from_first_refresh() {
        let mut clock = PlaybackClock::default();
        assert_eq!(clock.elapsed(Duration::from_millis(500)), 0.0);
        assert!((clock.elapsed(Duration::from_millis(2_000)) - 1.5).abs() < 1e-6);
        assert_eq!(clock.elapsed(Duration::from_millis(100)), 0.0);
        clock.reset();
        assert_eq!(clock.elapsed(Duration::from_secs(9)), 0.0);
    }
}
