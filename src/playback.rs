use std::time::Duration;
use std::time::Instant;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::config::PlaybackConfig;
use crate::error::LoadError;
use crate::frame_store::FrameStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackState::Playing => "PLAYING",
            PlaybackState::Paused => "PAUSED",
        }
    }
}

/// What triggered a load. Only failures of timer-driven loads pause playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadCause {
    Initial,
    Tick,
    StepForward,
    StepBackward,
}

/// A request for the loader to fetch one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    pub id: u64,
    pub frame_number: u32,
    pub cause: LoadCause,
}

/// A finished fetch, carrying the raw record text or the retrieval error.
#[derive(Debug)]
pub struct LoadResponse {
    pub request: LoadRequest,
    pub result: Result<String, LoadError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The frame store now holds the requested frame; redraw.
    Applied,
    /// The load failed; the store's object list is empty.
    Failed,
    /// The response did not match the most recent request and was dropped.
    Stale,
}

/// Drives frame advancement: a fixed-rate timer while playing, single steps
/// while paused.
///
/// The controller never performs I/O. It hands out [`LoadRequest`]s and is
/// told about their results through [`PlaybackController::complete`]. At most
/// one request is outstanding at a time; ticks and steps that arrive while a
/// request is in flight are dropped.
#[derive(Debug)]
pub struct PlaybackController {
    start_frame: u32,
    end_frame: u32,
    interval: Duration,
    state: PlaybackState,
    next_tick: Option<Instant>,
    in_flight: Option<LoadRequest>,
    latest: Option<LoadRequest>,
    next_id: u64,
}

impl PlaybackController {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            start_frame: config.start_frame,
            end_frame: config.end_frame,
            interval: config.tick_interval(),
            state: PlaybackState::Playing,
            next_tick: None,
            in_flight: None,
            latest: None,
            next_id: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Request the first frame. The timer is armed once it loads.
    pub fn start(&mut self) -> LoadRequest {
        info!(frame = self.start_frame, "Initializing playback");
        self.state = PlaybackState::Playing;
        self.next_tick = None;
        self.issue(self.start_frame, LoadCause::Initial)
    }

    fn issue(&mut self, frame_number: u32, cause: LoadCause) -> LoadRequest {
        self.next_id += 1;
        let request = LoadRequest { id: self.next_id, frame_number, cause };
        debug!(?request, "Issuing frame load");
        self.in_flight = Some(request);
        self.latest = Some(request);
        request
    }

    /// Flip between playing and paused. Resuming re-arms the timer from `now`.
    pub fn toggle(&mut self, now: Instant) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(now),
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Paused {
            return;
        }
        info!("Playback paused");
        self.state = PlaybackState::Paused;
        self.next_tick = None;
    }

    pub fn resume(&mut self, now: Instant) {
        if self.state == PlaybackState::Playing {
            return;
        }
        info!("Playback resumed");
        self.state = PlaybackState::Playing;
        self.next_tick = Some(now + self.interval);
    }

    /// Time left before the timer fires, if it is armed.
    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.next_tick.map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Fire the timer if it is due. Advances one frame, wrapping from the end
    /// of the range back to the start.
    pub fn poll_timer(&mut self, now: Instant, current_frame: u32) -> Option<LoadRequest> {
        let deadline = self.next_tick?;
        if now < deadline {
            return None;
        }

        let mut next_deadline = deadline + self.interval;
        if next_deadline <= now {
            next_deadline = now + self.interval;
        }
        self.next_tick = Some(next_deadline);

        if self.in_flight.is_some() {
            trace!(current_frame, "Load still outstanding, skipping tick");
            return None;
        }

        let next = if current_frame >= self.end_frame { self.start_frame } else { current_frame + 1 };
        Some(self.issue(next, LoadCause::Tick))
    }

    /// Load the next frame while paused. No wraparound; a no-op at the end of
    /// the range.
    pub fn step_forward(&mut self, current_frame: u32) -> Option<LoadRequest> {
        if !self.can_step() {
            return None;
        }
        let next = current_frame.checked_add(1).filter(|&n| n <= self.end_frame)?;
        Some(self.issue(next, LoadCause::StepForward))
    }

    /// Load the previous frame while paused. A no-op at the start of the range.
    pub fn step_backward(&mut self, current_frame: u32) -> Option<LoadRequest> {
        if !self.can_step() {
            return None;
        }
        let prev = current_frame.checked_sub(1).filter(|&n| n >= self.start_frame)?;
        Some(self.issue(prev, LoadCause::StepBackward))
    }

    fn can_step(&self) -> bool {
        if self.state != PlaybackState::Paused {
            return false;
        }
        if self.in_flight.is_some() {
            debug!("Load still outstanding, ignoring step");
            return false;
        }
        true
    }

    /// Apply a finished load to `store` if it answers the most recent request.
    pub fn complete(&mut self, response: LoadResponse, store: &mut FrameStore, now: Instant) -> LoadOutcome {
        let LoadResponse { request, result } = response;

        if self.in_flight.is_some_and(|r| r.id == request.id) {
            self.in_flight = None;
        }
        if self.latest != Some(request) {
            warn!(?request, latest = ?self.latest, "Discarding stale frame load");
            return LoadOutcome::Stale;
        }

        if store.apply(request.frame_number, result) {
            if request.cause == LoadCause::Initial && self.state == PlaybackState::Playing {
                info!("Initial frame loaded successfully");
                self.next_tick = Some(now + self.interval);
            }
            return LoadOutcome::Applied;
        }

        match request.cause {
            LoadCause::Initial | LoadCause::Tick => {
                error!(frame = request.frame_number, "Failed to load frame, pausing playback");
                self.pause();
            }
            LoadCause::StepForward | LoadCause::StepBackward => {
                error!(frame = request.frame_number, "Failed to load frame");
            }
        }
        LoadOutcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = "4 0 0 1 0 1 1 0 1 0.9";

    fn config() -> PlaybackConfig {
        PlaybackConfig { start_frame: 1, end_frame: 3, frame_rate: 10.0 }
    }

    fn ok(request: LoadRequest) -> LoadResponse {
        LoadResponse { request, result: Ok(RECORD.to_string()) }
    }

    fn failed(request: LoadRequest) -> LoadResponse {
        LoadResponse { request, result: Err(LoadError::EmptyContent(request.frame_number)) }
    }

    /// A controller that has loaded the start frame and armed its timer at `t0`.
    fn started(t0: Instant) -> (PlaybackController, FrameStore) {
        let mut controller = PlaybackController::new(&config());
        let mut store = FrameStore::new(&config());
        let request = controller.start();
        assert_eq!(request.frame_number, 1);
        assert_eq!(controller.complete(ok(request), &mut store, t0), LoadOutcome::Applied);
        (controller, store)
    }

    #[test]
    fn timer_fires_after_interval() {
        let t0 = Instant::now();
        let (mut controller, store) = started(t0);
        assert_eq!(controller.time_until_tick(t0), Some(Duration::from_millis(100)));
        assert!(controller.poll_timer(t0 + Duration::from_millis(50), store.frame_number()).is_none());

        let request = controller.poll_timer(t0 + Duration::from_millis(100), store.frame_number()).unwrap();
        assert_eq!(request.frame_number, 2);
        assert_eq!(request.cause, LoadCause::Tick);
    }

    #[test]
    fn auto_advance_wraps_at_end() {
        let t0 = Instant::now();
        let (mut controller, mut store) = started(t0);
        let mut now = t0;
        let mut frames = Vec::new();
        for _ in 0..4 {
            now += Duration::from_millis(100);
            let request = controller.poll_timer(now, store.frame_number()).unwrap();
            assert_eq!(controller.complete(ok(request), &mut store, now), LoadOutcome::Applied);
            frames.push(store.frame_number());
        }
        assert_eq!(frames, vec![2, 3, 1, 2]);
    }

    #[test]
    fn ticks_are_skipped_while_loading() {
        let t0 = Instant::now();
        let (mut controller, mut store) = started(t0);
        let first = controller.poll_timer(t0 + Duration::from_millis(100), store.frame_number()).unwrap();
        assert!(controller.is_loading());
        assert!(controller.poll_timer(t0 + Duration::from_millis(200), store.frame_number()).is_none());

        controller.complete(ok(first), &mut store, t0 + Duration::from_millis(250));
        let next = controller.poll_timer(t0 + Duration::from_millis(300), store.frame_number()).unwrap();
        assert_eq!(next.frame_number, 3);
    }

    #[test]
    fn tick_failure_pauses_and_keeps_frame() {
        let t0 = Instant::now();
        let (mut controller, mut store) = started(t0);
        let request = controller.poll_timer(t0 + Duration::from_millis(100), 1).unwrap();
        assert_eq!(controller.complete(failed(request), &mut store, t0), LoadOutcome::Failed);

        assert_eq!(controller.state(), PlaybackState::Paused);
        assert_eq!(controller.time_until_tick(t0), None);
        assert_eq!(store.frame_number(), 1);
        assert!(store.objects().is_empty());
        assert!(controller.poll_timer(t0 + Duration::from_secs(5), 1).is_none());
    }

    #[test]
    fn initial_failure_never_arms_timer() {
        let t0 = Instant::now();
        let mut controller = PlaybackController::new(&config());
        let mut store = FrameStore::new(&config());
        let request = controller.start();
        assert_eq!(controller.complete(failed(request), &mut store, t0), LoadOutcome::Failed);
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert!(controller.poll_timer(t0 + Duration::from_secs(1), 1).is_none());
    }

    #[test]
    fn toggle_pauses_and_resumes() {
        let t0 = Instant::now();
        let (mut controller, store) = started(t0);
        controller.toggle(t0);
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert!(controller.poll_timer(t0 + Duration::from_secs(1), store.frame_number()).is_none());
        assert_eq!(store.frame_number(), 1);

        let t1 = t0 + Duration::from_secs(2);
        controller.toggle(t1);
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert!(controller.poll_timer(t1 + Duration::from_millis(99), 1).is_none());
        assert!(controller.poll_timer(t1 + Duration::from_millis(100), 1).is_some());
    }

    #[test]
    fn steps_only_while_paused() {
        let t0 = Instant::now();
        let (mut controller, mut store) = started(t0);
        assert!(controller.step_forward(store.frame_number()).is_none());

        controller.pause();
        let request = controller.step_forward(store.frame_number()).unwrap();
        assert_eq!((request.frame_number, request.cause), (2, LoadCause::StepForward));
        assert_eq!(controller.complete(ok(request), &mut store, t0), LoadOutcome::Applied);

        let request = controller.step_backward(store.frame_number()).unwrap();
        assert_eq!(request.frame_number, 1);
        controller.complete(ok(request), &mut store, t0);
        assert_eq!(store.frame_number(), 1);
        assert_eq!(controller.state(), PlaybackState::Paused);
    }

    #[test]
    fn steps_stop_at_bounds() {
        let t0 = Instant::now();
        let (mut controller, mut store) = started(t0);
        controller.pause();

        assert!(controller.step_backward(1).is_none());
        assert!(!controller.is_loading());

        store.apply(3, Ok(RECORD.to_string()));
        assert!(controller.step_forward(store.frame_number()).is_none());
        assert_eq!(store.frame_number(), 3);
    }

    #[test]
    fn step_failure_stays_paused() {
        let t0 = Instant::now();
        let (mut controller, mut store) = started(t0);
        controller.pause();
        let request = controller.step_forward(1).unwrap();
        assert_eq!(controller.complete(failed(request), &mut store, t0), LoadOutcome::Failed);
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert_eq!(store.frame_number(), 1);
        assert!(controller.step_forward(1).is_some());
    }

    #[test]
    fn stale_responses_are_discarded() {
        let t0 = Instant::now();
        let (mut controller, mut store) = started(t0);
        let old = controller.poll_timer(t0 + Duration::from_millis(100), 1).unwrap();
        controller.complete(ok(old), &mut store, t0);
        controller.pause();
        let newer = controller.step_forward(store.frame_number()).unwrap();

        // A duplicate delivery of the earlier request must not regress the frame.
        assert_eq!(controller.complete(ok(old), &mut store, t0), LoadOutcome::Stale);
        assert!(controller.is_loading());
        assert_eq!(store.frame_number(), 2);

        assert_eq!(controller.complete(ok(newer), &mut store, t0), LoadOutcome::Applied);
        assert_eq!(store.frame_number(), 3);
    }
}
