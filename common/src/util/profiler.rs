use std::time::{Duration, Instant};

/// Logs the wall time of a scope when dropped. When a work count is recorded
/// the rate is logged as well, e.g. routed flows or evaluated moves per second.
pub struct ScopedTimer {
    name: &'static str,
    start: Instant,
    work: Option<(usize, &'static str)>,
}

impl ScopedTimer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
            work: None,
        }
    }

    pub fn record_work(&mut self, count: usize, unit: &'static str) {
        self.work = Some((count, unit));
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn rate(count: usize, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 { count as f64 / secs } else { 0.0 }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        match self.work {
            Some((count, unit)) => log::info!(
                "{} took {:?} ({} {}, {:.0} {}/s)",
                self.name,
                elapsed,
                count,
                unit,
                Self::rate(count, elapsed),
                unit
            ),
            None => log::info!("{} took {:?}", self.name, elapsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_handles_zero_elapsed_time() {
        assert_eq!(ScopedTimer::rate(10, Duration::ZERO), 0.0);
        assert_eq!(ScopedTimer::rate(10, Duration::from_secs(2)), 5.0);
    }
}
