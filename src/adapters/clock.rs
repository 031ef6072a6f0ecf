use std::time::{SystemTime, UNIX_EPOCH};

/// Wall clock source, seconds since the Unix epoch.
pub trait Clock {
    fn now(&self) -> f64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs_f64(),
            // System clock set before 1970.
            Err(e) => -e.duration().as_secs_f64(),
        }
    }
}
