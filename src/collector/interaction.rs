//! Interaction delay and touch responsiveness timing
//!
//! Pointer-down to click measures input responsiveness on any device;
//! touch-start to touch-end is recorded for mobile sessions only. The
//! caller filters out sub-threshold delays.

use std::time::Instant;

/// Paired-event timer for interaction measurements
#[derive(Debug, Default)]
pub struct InteractionTimer {
    pointer_down_at: Option<Instant>,
    touch_start_at: Option<Instant>,
}

impl InteractionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_down(&mut self) {
        self.pointer_down_at = Some(Instant::now());
    }

    /// Complete a pointer-down/click pair, returning the delay in ms
    pub fn click(&mut self) -> Option<f64> {
        let started = self.pointer_down_at.take()?;
        Some(started.elapsed().as_secs_f64() * 1000.0)
    }

    pub fn touch_start(&mut self) {
        self.touch_start_at = Some(Instant::now());
    }

    /// Complete a touch-start/touch-end pair, returning the duration in ms
    pub fn touch_end(&mut self) -> Option<f64> {
        let started = self.touch_start_at.take()?;
        Some(started.elapsed().as_secs_f64() * 1000.0)
    }

    pub fn reset(&mut self) {
        self.pointer_down_at = None;
        self.touch_start_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_without_pointer_down() {
        let mut timer = InteractionTimer::new();
        assert!(timer.click().is_none());
    }

    #[test]
    fn test_pointer_pair_measured_once() {
        let mut timer = InteractionTimer::new();
        timer.pointer_down();
        let delay = timer.click();
        assert!(delay.is_some());
        assert!(delay.unwrap() >= 0.0);
        // The pair is consumed.
        assert!(timer.click().is_none());
    }

    #[test]
    fn test_touch_pair() {
        let mut timer = InteractionTimer::new();
        timer.touch_start();
        assert!(timer.touch_end().is_some());
        assert!(timer.touch_end().is_none());
    }

    #[test]
    fn test_reset_discards_pending() {
        let mut timer = InteractionTimer::new();
        timer.pointer_down();
        timer.touch_start();
        timer.reset();
        assert!(timer.click().is_none());
        assert!(timer.touch_end().is_none());
    }
}
