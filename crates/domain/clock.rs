use chrono::{DateTime, Utc};

/// Injectable time source. Expiry arithmetic, downgrade checks and cache TTL
/// decisions all read the clock through this trait so tests can pin "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
