//!
//! Time source used for expiry checks
//!
//! Defaults to the system clock. Tests can pin it to a fixed instant or shift it through a [`MockHandle`].
//!

use std::{
    fmt,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Direction the delta should be adjusted in
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeltaDirection {
    /// Add to the delta
    Add,

    /// Subtract from the delta
    Sub,
}

/// Handle to adjust the delta of a mockable clock
#[derive(Clone, Debug)]
pub struct MockHandle {
    delta: Arc<AtomicI64>,
}

impl MockHandle {
    /// Adjust the delta by the duration in the direction specified
    pub fn adjust(&self, direction: DeltaDirection, delta: Duration) {
        let mut delta = i64::try_from(delta.as_nanos()).unwrap_or(i64::MAX);
        if direction == DeltaDirection::Sub {
            delta = -delta;
        }

        self.delta.fetch_add(delta, Ordering::AcqRel);
    }

    /// Set the delta to the absolute value (in nanoseconds)
    pub fn set_delta(&self, delta: i64) {
        self.delta.store(delta, Ordering::Release);
    }
}

/// Clock with an optional fixed base and an optional adjustable delta
#[derive(Clone, Default)]
pub struct Clock {
    base: Option<SystemTime>,
    delta: Option<Arc<AtomicI64>>,
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(std::any::type_name::<Self>())
            .field("base", &self.base)
            .field(
                "delta",
                &self.delta.as_ref().map(|delta| delta.load(Ordering::Relaxed)),
            )
            .finish()
    }
}

impl Clock {
    /// Clock reading the system time
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that always reads the same instant
    #[must_use]
    pub fn fixed(at: SystemTime) -> Self {
        Self {
            base: Some(at),
            delta: None,
        }
    }

    /// Clock pinned to a UNIX timestamp
    #[must_use]
    pub fn fixed_unix(timestamp: u64) -> Self {
        Self::fixed(UNIX_EPOCH + Duration::from_secs(timestamp))
    }

    /// Construct a mockable clock
    ///
    /// This clock returns a handle which you can use to adjust the delta
    #[must_use]
    pub fn mockable() -> (Self, MockHandle) {
        let delta = Arc::new(AtomicI64::default());

        let mock_handle = MockHandle {
            delta: Arc::clone(&delta),
        };
        let clock = Self {
            base: None,
            delta: Some(delta),
        };

        (clock, mock_handle)
    }

    /// Mockable clock that starts out at a fixed instant
    ///
    /// Only moves when the delta is adjusted through the returned handle
    #[must_use]
    pub fn mockable_at(at: SystemTime) -> (Self, MockHandle) {
        let (mut clock, mock_handle) = Self::mockable();
        clock.base = Some(at);

        (clock, mock_handle)
    }

    /// Read the current time and apply the delta
    #[must_use]
    pub fn now(&self) -> SystemTime {
        let mut now = self.base.unwrap_or_else(SystemTime::now);

        if let Some(ref delta) = self.delta {
            let ns_delta = delta.load(Ordering::Acquire);
            if ns_delta.is_positive() {
                now += Duration::from_nanos(ns_delta.unsigned_abs());
            } else {
                now -= Duration::from_nanos(ns_delta.unsigned_abs());
            }
        }

        now
    }

    /// Current time as a UNIX timestamp
    ///
    /// Times before the epoch read as zero
    #[must_use]
    pub fn unix_timestamp(&self) -> u64 {
        self.now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_secs())
    }
}
