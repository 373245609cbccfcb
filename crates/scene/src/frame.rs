use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time since some fixed origin.
pub trait TimeSource {
    fn now(&self) -> Duration;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Advances by a fixed step on every read. Used for headless simulation.
#[derive(Debug)]
pub struct SteppedClock {
    step: Duration,
    current: Cell<Duration>,
}

impl SteppedClock {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            current: Cell::new(Duration::ZERO),
        }
    }
}

impl TimeSource for SteppedClock {
    fn now(&self) -> Duration {
        let now = self.current.get();
        self.current.set(now + self.step);
        now
    }
}

/// Shared stop flag for a [`FrameLoop`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Timing of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    pub index: u64,
    /// Seconds since the loop started. Never decreases.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
}

/// Per-frame scheduler: one [`FrameLoop::tick`] per display refresh until
/// cancelled. No fixed timestep and no catch-up for missed frames.
pub struct FrameLoop<C: TimeSource = SystemClock> {
    clock: C,
    start: Duration,
    last_elapsed: f32,
    frames: u64,
    cancel: CancelToken,
}

impl FrameLoop<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::default())
    }
}

impl Default for FrameLoop<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TimeSource> FrameLoop<C> {
    pub fn with_clock(clock: C) -> Self {
        let start = clock.now();
        Self {
            clock,
            start,
            last_elapsed: 0.0,
            frames: 0,
            cancel: CancelToken::default(),
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Start the next frame, or `None` once cancelled.
    pub fn tick(&mut self) -> Option<FrameTick> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let now = self.clock.now().saturating_sub(self.start).as_secs_f32();
        let elapsed = now.max(self.last_elapsed);
        let tick = FrameTick {
            index: self.frames,
            elapsed,
            delta: elapsed - self.last_elapsed,
        };
        self.last_elapsed = elapsed;
        self.frames += 1;
        Some(tick)
    }

    /// Call `frame` once per tick until the token is cancelled, either from
    /// inside `frame` or from elsewhere. Returns the number of frames run.
    pub fn run(&mut self, mut frame: impl FnMut(&FrameTick)) -> u64 {
        let first = self.frames;
        while let Some(tick) = self.tick() {
            frame(&tick);
        }
        self.frames - first
    }
}
