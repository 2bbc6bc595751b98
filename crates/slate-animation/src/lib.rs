//! # Slate Animation
//!
//! Transition timing for the editor chrome: easing curves, transitions
//! ticked against wall-clock time, and a frame scheduler in the
//! requestAnimationFrame shape.
//!
//! ## Architecture
//!
//! ```text
//! FrameScheduler
//!    └── one-shot frame callbacks (request / cancel / tick)
//!
//! Transition
//!    ├── Timing (duration, delay)
//!    ├── Easing curve
//!    └── Target node
//! ```

use slate_dom::NodeId;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::trace;

/// Errors that can occur in animations.
#[derive(Error, Debug)]
pub enum AnimationError {
    #[error("Invalid timing function: {0}")]
    InvalidTimingFunction(String),
}

// ==================== Timing Functions ====================

/// CSS-style timing function (easing).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimingFunction {
    /// Linear interpolation.
    Linear,
    /// Default ease (0.25, 0.1, 0.25, 1.0).
    Ease,
    /// Ease in (0.42, 0, 1, 1).
    EaseIn,
    /// Ease out (0, 0, 0.58, 1).
    EaseOut,
    /// Ease in-out (0.42, 0, 0.58, 1).
    EaseInOut,
    /// Custom cubic bezier.
    CubicBezier(f64, f64, f64, f64),
}

impl Default for TimingFunction {
    fn default() -> Self {
        TimingFunction::Ease
    }
}

impl TimingFunction {
    /// Evaluate the timing function at time t (0.0 to 1.0).
    pub fn evaluate(&self, t: f64) -> f64 {
        match self {
            TimingFunction::Linear => t,
            TimingFunction::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            TimingFunction::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            TimingFunction::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            TimingFunction::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            TimingFunction::CubicBezier(x1, y1, x2, y2) => cubic_bezier(*x1, *y1, *x2, *y2, t),
        }
    }

    /// Parse from a CSS-style string (theme variables use these).
    pub fn parse(s: &str) -> Result<Self, AnimationError> {
        let s = s.trim().to_lowercase();

        match s.as_str() {
            "linear" => Ok(TimingFunction::Linear),
            "ease" => Ok(TimingFunction::Ease),
            "ease-in" => Ok(TimingFunction::EaseIn),
            "ease-out" => Ok(TimingFunction::EaseOut),
            "ease-in-out" => Ok(TimingFunction::EaseInOut),
            _ if s.starts_with("cubic-bezier(") => {
                let inner = s.trim_start_matches("cubic-bezier(").trim_end_matches(')');
                let parts: Vec<f64> = inner
                    .split(',')
                    .filter_map(|p| p.trim().parse().ok())
                    .collect();

                if parts.len() == 4 {
                    Ok(TimingFunction::CubicBezier(
                        parts[0], parts[1], parts[2], parts[3],
                    ))
                } else {
                    Err(AnimationError::InvalidTimingFunction(s))
                }
            }
            _ => Err(AnimationError::InvalidTimingFunction(s)),
        }
    }
}

/// Evaluate cubic bezier curve.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, t: f64) -> f64 {
    // Newton-Raphson iteration to find t for given x
    let epsilon = 1e-6;
    let mut guess = t;

    for _ in 0..8 {
        let x = bezier_value(x1, x2, guess) - t;
        if x.abs() < epsilon {
            break;
        }
        let dx = bezier_derivative(x1, x2, guess);
        if dx.abs() < epsilon {
            break;
        }
        guess -= x / dx;
    }

    bezier_value(y1, y2, guess)
}

/// Calculate bezier value at t.
fn bezier_value(p1: f64, p2: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;

    // B(t) = 3*mt^2*t*P1 + 3*mt*t^2*P2 + t^3
    3.0 * mt2 * t * p1 + 3.0 * mt * t2 * p2 + t3
}

/// Calculate bezier derivative at t.
fn bezier_derivative(p1: f64, p2: f64, t: f64) -> f64 {
    let t2 = t * t;
    let mt = 1.0 - t;

    // B'(t) = 3*mt^2*P1 + 6*mt*t*(P2-P1) + 3*t^2*(1-P2)
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t2 * (1.0 - p2)
}

// ==================== Transitions ====================

/// Unique transition identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionId(u64);

impl TransitionId {
    /// Generate a new unique ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TransitionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Transition state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    /// Waiting for delay.
    Pending,
    /// Actively transitioning.
    Running,
    /// Completed.
    Completed,
    /// Cancelled.
    Cancelled,
}

/// A chrome transition (popup fade, panel slide).
///
/// The chrome has no style interpolation target of its own; consumers read
/// `eased_progress` and apply it however they render. What matters to the
/// overlay lifecycle is the completion edge `tick` reports.
#[derive(Debug)]
pub struct Transition {
    /// Unique identifier.
    pub id: TransitionId,
    /// Target node.
    pub target: NodeId,
    /// Duration.
    pub duration: Duration,
    /// Delay.
    pub delay: Duration,
    /// Timing function.
    pub easing: TimingFunction,
    /// Start time.
    start_time: Instant,
    /// Current state.
    pub state: TransitionState,
    /// Eased progress at the last tick, in [0, 1].
    pub eased_progress: f64,
}

impl Transition {
    /// Create a transition starting now.
    pub fn new(target: NodeId, duration: Duration, easing: TimingFunction) -> Self {
        Self::with_delay(target, duration, Duration::ZERO, easing)
    }

    /// Create a delayed transition starting now.
    pub fn with_delay(
        target: NodeId,
        duration: Duration,
        delay: Duration,
        easing: TimingFunction,
    ) -> Self {
        Self {
            id: TransitionId::new(),
            target,
            duration,
            delay,
            easing,
            start_time: Instant::now(),
            state: TransitionState::Pending,
            eased_progress: 0.0,
        }
    }

    /// Update the transition. Returns true while it still needs ticking.
    pub fn tick(&mut self, now: Instant) -> bool {
        if matches!(
            self.state,
            TransitionState::Completed | TransitionState::Cancelled
        ) {
            return false;
        }

        let elapsed = now.saturating_duration_since(self.start_time);

        // Check delay
        if elapsed < self.delay {
            self.eased_progress = 0.0;
            return true;
        }

        if self.state == TransitionState::Pending {
            self.state = TransitionState::Running;
        }

        let active_time = elapsed - self.delay;

        // Check if complete
        if active_time >= self.duration {
            self.state = TransitionState::Completed;
            self.eased_progress = 1.0;
            return false;
        }

        // Calculate progress
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            active_time.as_secs_f64() / self.duration.as_secs_f64()
        };

        self.eased_progress = self.easing.evaluate(progress);
        true
    }

    /// Cancel the transition.
    pub fn cancel(&mut self) {
        self.state = TransitionState::Cancelled;
    }

    /// Whether the transition ran to completion.
    pub fn is_completed(&self) -> bool {
        self.state == TransitionState::Completed
    }
}

// ==================== Frame Scheduling ====================

/// Unique callback ID for frame callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameCallbackId(u64);

impl FrameCallbackId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A one-shot frame callback, invoked with the milliseconds elapsed since
/// the previous frame.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Frame scheduler in the requestAnimationFrame shape: one-shot callbacks,
/// re-requested by the caller each frame, drained by the host's event pump.
#[derive(Default)]
pub struct FrameScheduler {
    /// Pending callbacks for the next frame.
    pending: VecDeque<(FrameCallbackId, FrameCallback)>,
    /// Cancelled callback IDs.
    cancelled: HashSet<FrameCallbackId>,
    /// Last frame time.
    last_frame_time: Option<Instant>,
    /// Target frame duration (16.67ms for 60fps).
    target_frame_duration: Duration,
}

impl FrameScheduler {
    /// Create a new frame scheduler.
    pub fn new() -> Self {
        Self {
            target_frame_duration: Duration::from_secs_f64(1.0 / 60.0),
            ..Default::default()
        }
    }

    /// Request a frame callback.
    pub fn request(&mut self, callback: FrameCallback) -> FrameCallbackId {
        let id = FrameCallbackId::next();
        self.pending.push_back((id, callback));
        trace!("frame callback requested: {:?}", id);
        id
    }

    /// Cancel a pending callback.
    pub fn cancel(&mut self, id: FrameCallbackId) {
        self.cancelled.insert(id);
        trace!("frame callback cancelled: {:?}", id);
    }

    /// Check if there are pending callbacks.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain the callbacks due this frame.
    ///
    /// The caller invokes them after releasing its borrow of the scheduler,
    /// so a callback can re-request a frame (the cursor watch does this
    /// every frame). Re-requests land in the next tick, not this one.
    pub fn tick(&mut self, now: Instant) -> Vec<(FrameCallbackId, FrameCallback, f64)> {
        let timestamp = match self.last_frame_time {
            Some(last) => now.saturating_duration_since(last).as_secs_f64() * 1000.0,
            None => 0.0,
        };
        self.last_frame_time = Some(now);

        let mut due = Vec::new();
        while let Some((id, cb)) = self.pending.pop_front() {
            if !self.cancelled.remove(&id) {
                due.push((id, cb, timestamp));
            }
        }
        due
    }

    /// Get time until the next frame should run.
    pub fn time_to_next_frame(&self) -> Duration {
        if let Some(last) = self.last_frame_time {
            let elapsed = last.elapsed();
            if elapsed < self.target_frame_duration {
                self.target_frame_duration - elapsed
            } else {
                Duration::ZERO
            }
        } else {
            Duration::ZERO
        }
    }
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("pending", &self.pending.len())
            .field("cancelled", &self.cancelled.len())
            .finish()
    }
}

/// Run one frame of a shared scheduler: drain with the borrow held, invoke
/// with it released.
pub fn pump_frame(scheduler: &std::rc::Rc<std::cell::RefCell<FrameScheduler>>, now: Instant) {
    let due = scheduler.borrow_mut().tick(now);
    for (_id, callback, timestamp) in due {
        callback(timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_timing_function_endpoints() {
        for tf in [
            TimingFunction::Linear,
            TimingFunction::Ease,
            TimingFunction::EaseIn,
            TimingFunction::EaseOut,
            TimingFunction::EaseInOut,
        ] {
            assert!(tf.evaluate(0.0).abs() < 1e-3);
            assert!((tf.evaluate(1.0) - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_timing_function_parse() {
        assert_eq!(
            TimingFunction::parse("ease-out").unwrap(),
            TimingFunction::EaseOut
        );
        assert_eq!(
            TimingFunction::parse("cubic-bezier(0.2, 0, 0.4, 1)").unwrap(),
            TimingFunction::CubicBezier(0.2, 0.0, 0.4, 1.0)
        );
        assert!(TimingFunction::parse("bouncy").is_err());
    }

    #[test]
    fn test_transition_completes() {
        let mut t = Transition::new(
            NodeId::new(1),
            Duration::from_millis(150),
            TimingFunction::Linear,
        );

        let start = Instant::now();
        assert!(t.tick(start + Duration::from_millis(75)));
        assert_eq!(t.state, TransitionState::Running);

        assert!(!t.tick(start + Duration::from_millis(300)));
        assert!(t.is_completed());
        assert_eq!(t.eased_progress, 1.0);
    }

    #[test]
    fn test_transition_cancel() {
        let mut t = Transition::new(
            NodeId::new(1),
            Duration::from_millis(150),
            TimingFunction::Linear,
        );
        t.cancel();
        assert!(!t.tick(Instant::now()));
        assert!(!t.is_completed());
    }

    #[test]
    fn test_zero_duration_transition() {
        let mut t = Transition::new(NodeId::new(1), Duration::ZERO, TimingFunction::Linear);
        assert!(!t.tick(Instant::now()));
        assert!(t.is_completed());
    }

    #[test]
    fn test_frame_scheduler_runs_and_cancels() {
        let mut scheduler = FrameScheduler::new();
        let ran = Rc::new(Cell::new(0));

        let ran_a = ran.clone();
        scheduler.request(Box::new(move |_| ran_a.set(ran_a.get() + 1)));
        let ran_b = ran.clone();
        let b = scheduler.request(Box::new(move |_| ran_b.set(ran_b.get() + 10)));
        scheduler.cancel(b);

        for (_, cb, ts) in scheduler.tick(Instant::now()) {
            cb(ts);
        }
        assert_eq!(ran.get(), 1);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_pump_frame_allows_rerequest_from_callback() {
        use std::cell::RefCell;

        let scheduler = Rc::new(RefCell::new(FrameScheduler::new()));
        let ran = Rc::new(Cell::new(0));

        // The callback re-requests itself, like the cursor watch does.
        let scheduler_cb = scheduler.clone();
        let ran_cb = ran.clone();
        scheduler.borrow_mut().request(Box::new(move |_| {
            ran_cb.set(ran_cb.get() + 1);
            let ran_next = ran_cb.clone();
            scheduler_cb
                .borrow_mut()
                .request(Box::new(move |_| ran_next.set(ran_next.get() + 1)));
        }));

        pump_frame(&scheduler, Instant::now());
        assert_eq!(ran.get(), 1);
        assert!(scheduler.borrow().has_pending());

        pump_frame(&scheduler, Instant::now());
        assert_eq!(ran.get(), 2);
    }
}
