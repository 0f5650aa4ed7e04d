//! Booking funnel progression and abandonment tracking
//!
//! The current URL path is polled against an ordered list of step prefixes.
//! A newly observed step is appended to the journey and reported as a
//! transition. Steps are recorded in first-observed order; revisits to an
//! earlier step become the current step again but the journey is never
//! rewritten. An inactivity clock drives abandonment detection while the
//! session sits inside the booking flow.

use crate::config::FunnelStepConfig;
use std::time::{Duration, Instant};

/// A step transition observed by the tracker
#[derive(Debug, Clone, PartialEq)]
pub struct StepTransition {
    pub step: String,
    /// Elapsed time since session start
    pub elapsed: Duration,
}

/// An abandonment event: inactivity past the threshold inside the funnel
#[derive(Debug, Clone, PartialEq)]
pub struct Abandonment {
    pub last_step: String,
    pub inactive_for: Duration,
}

/// Tracks funnel position, journey order and inactivity
#[derive(Debug)]
pub struct FunnelTracker {
    steps: Vec<FunnelStepConfig>,
    journey: Vec<String>,
    current: Option<String>,
    session_start: Instant,
    last_activity: Instant,
    abandonment_recorded: bool,
}

impl FunnelTracker {
    pub fn new(steps: Vec<FunnelStepConfig>) -> Self {
        let now = Instant::now();
        Self {
            steps,
            journey: Vec::new(),
            current: None,
            session_start: now,
            last_activity: now,
            abandonment_recorded: false,
        }
    }

    /// Match a path against the configured step prefixes. Returns a
    /// transition when the matched step differs from the current one.
    pub fn observe_path(&mut self, path: &str) -> Option<StepTransition> {
        let step = self
            .steps
            .iter()
            .find(|s| path.starts_with(&s.path_prefix))
            .map(|s| s.step.clone())?;

        if self.current.as_deref() == Some(step.as_str()) {
            return None;
        }

        self.current = Some(step.clone());
        if !self.journey.contains(&step) {
            self.journey.push(step.clone());
        }
        Some(StepTransition {
            step,
            elapsed: self.session_start.elapsed(),
        })
    }

    /// Reset the inactivity clock on any user input
    pub fn record_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Fire at most one abandonment per session, and only while positioned
    /// inside the booking flow
    pub fn check_abandonment(&mut self, threshold: Duration) -> Option<Abandonment> {
        if self.abandonment_recorded {
            return None;
        }
        let last_step = self.current.clone()?;
        let inactive_for = self.last_activity.elapsed();
        if inactive_for < threshold {
            return None;
        }
        self.abandonment_recorded = true;
        Some(Abandonment {
            last_step,
            inactive_for,
        })
    }

    /// Steps traversed so far, first-observed order
    pub fn journey(&self) -> &[String] {
        &self.journey
    }

    pub fn current_step(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Elapsed time since the session started
    pub fn session_elapsed(&self) -> Duration {
        self.session_start.elapsed()
    }

    /// Reset journey and timers; the session identity is owned by the
    /// collector and survives this
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.journey.clear();
        self.current = None;
        self.session_start = now;
        self.last_activity = now;
        self.abandonment_recorded = false;
    }
}
