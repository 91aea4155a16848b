use chrono::NaiveDateTime;

/// Source of local wall-clock time. All prayer comparisons are local and date-naive.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Wall clock that follows tokio's (pausable) timer, starting at `base`.
#[cfg(test)]
pub struct VirtualClock {
    base: NaiveDateTime,
    origin: tokio::time::Instant,
}

#[cfg(test)]
impl VirtualClock {
    pub fn starting_at(base: NaiveDateTime) -> Self {
        VirtualClock {
            base,
            origin: tokio::time::Instant::now(),
        }
    }
}

#[cfg(test)]
impl Clock for VirtualClock {
    fn now(&self) -> NaiveDateTime {
        let elapsed = tokio::time::Instant::now() - self.origin;
        self.base + chrono::Duration::milliseconds(elapsed.as_millis() as i64)
    }
}

/// Clock frozen at a single instant.
#[cfg(test)]
pub struct FixedClock(pub NaiveDateTime);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
