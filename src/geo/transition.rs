//! Timed transitions for animated layer properties.
//!
//! A transition interpolates from the value shown when it was (re)targeted
//! to its target over a fixed duration. Time is always passed in, so the
//! same instant gives the same value.

use eframe::egui::Color32;
use web_time::{Duration, Instant};

/// Duration of the point radius and fill transitions.
pub const TRANSITION_DURATION: Duration = Duration::from_millis(3000);

/// Overshoot used by the back easing curves.
const BACK_OVERSHOOT: f32 = 1.70158;

/// Easing curve applied to normalized progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Symmetric back easing: pulls back, then overshoots slightly.
    BackInOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::BackInOut => ease_back_in_out(t),
        }
    }
}

/// Back-in-out easing. Returns 0 at 0, 1 at 1 and leaves [0, 1] in between.
pub fn ease_back_in_out(t: f32) -> f32 {
    let s = BACK_OVERSHOOT;
    let t = t * 2.0;
    if t < 1.0 {
        t * t * ((s + 1.0) * t - s) / 2.0
    } else {
        let t = t - 2.0;
        (t * t * ((s + 1.0) * t + s) + 2.0) / 2.0
    }
}

/// Values that can be interpolated.
pub trait Lerp: Copy {
    fn lerp(self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

/// Interpolates premultiplied channels. Every fully transparent color is
/// the same starting point.
impl Lerp for Color32 {
    fn lerp(self, to: Self, t: f32) -> Self {
        let from = self.to_array();
        let to = to.to_array();
        let channel = |i: usize| {
            let v = from[i] as f32 + (to[i] as f32 - from[i] as f32) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Color32::from_rgba_premultiplied(channel(0), channel(1), channel(2), channel(3))
    }
}

/// An animated value.
#[derive(Debug, Clone, Copy)]
pub struct Transition<T> {
    from: T,
    to: T,
    started: Option<Instant>,
    duration: Duration,
    easing: Easing,
}

impl<T: Lerp + PartialEq> Transition<T> {
    /// A transition resting at `value`.
    pub fn settled(value: T, duration: Duration, easing: Easing) -> Self {
        Self {
            from: value,
            to: value,
            started: None,
            duration,
            easing,
        }
    }

    pub fn target(&self) -> T {
        self.to
    }

    pub fn started(&self) -> Option<Instant> {
        self.started
    }

    /// Value shown at `now`.
    pub fn value_at(&self, now: Instant) -> T {
        let Some(started) = self.started else {
            return self.to;
        };
        let elapsed = now.saturating_duration_since(started);
        if self.duration.is_zero() || elapsed >= self.duration {
            return self.to;
        }
        let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from.lerp(self.to, self.easing.apply(t))
    }

    pub fn is_running(&self, now: Instant) -> bool {
        self.started
            .is_some_and(|started| now.saturating_duration_since(started) < self.duration)
    }

    /// Points the transition at a new target, starting from the value shown
    /// at `now`. Returns false (and leaves a running transition alone) when
    /// the target is unchanged.
    pub fn retarget(&mut self, to: T, now: Instant) -> bool {
        if self.to == to {
            return false;
        }
        self.from = self.value_at(now);
        self.to = to;
        self.started = Some(now);
        true
    }
}
