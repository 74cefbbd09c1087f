//! Wall-clock laps for ticking the trainers' schedulers.

use std::time::{Duration, Instant};

/// Time since the previous lap.
#[derive(Debug)]
pub struct Stopwatch {
    last: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now - self.last;
        self.last = now;
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lap_measures_since_previous_lap() {
        let mut watch = Stopwatch::start();
        std::thread::sleep(Duration::from_millis(30));
        assert!(watch.lap() >= Duration::from_millis(30));
        assert!(watch.lap() < Duration::from_millis(30));
    }
}
