//! Timer entity and its ordering

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::clock::{Clock, ClockId};
use crate::error::CallbackError;

type TimerFn = dyn FnMut(&mut Clock, f64) -> Result<(), CallbackError> + Send;

/// Shared handle to a timer callback.
///
/// Cloning is cheap and keeps the identity: two handles name the same callback iff
/// they were cloned from the same [`Callback::new`]. The same callback may be
/// registered several times under different periods.
#[derive(Clone)]
pub struct Callback(Arc<Mutex<TimerFn>>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(&mut Clock, f64) -> Result<(), CallbackError> + Send + 'static,
    {
        Self(Arc::new(Mutex::new(f)))
    }

    /// Whether both handles refer to the same callback
    pub fn same(&self, other: &Callback) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn call(&self, clock: &mut Clock, time: f64) -> Result<(), CallbackError> {
        let mut guard = self.0.lock();
        let f = &mut *guard;
        f(clock, time)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// Registration sequence number of a timer, unique within its clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub(crate) u64);

impl TimerId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Returned by registration; removes exactly the timer it was issued for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerHandle {
    pub id: TimerId,
    pub period: f64,
}

/// Read-only view of a registered timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerInfo {
    pub id: TimerId,
    pub period: f64,
    pub order: i32,
    pub next_fire_time: f64,
    pub firings: u64,
}

/// One periodic obligation owned by a [`Clock`]
pub struct Timer {
    id: TimerId,
    callback: Callback,
    period: f64,
    order: i32,
    origin: f64,
    firings: u64,
    clock: ClockId,
}

impl Timer {
    pub(crate) fn new(
        id: TimerId,
        callback: Callback,
        period: f64,
        order: i32,
        origin: f64,
        clock: ClockId,
    ) -> Self {
        Self { id, callback, period, order, origin, firings: 0, clock }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    /// Clock this timer is registered with
    pub fn clock(&self) -> ClockId {
        self.clock
    }

    /// Number of firings since registration or the last reset
    pub fn firings(&self) -> u64 {
        self.firings
    }

    /// Next simulated time at which the timer is due.
    ///
    /// Derived from the firing count rather than accumulated, so long runs do not drift.
    pub fn next_fire_time(&self) -> f64 {
        self.origin + self.firings as f64 * self.period
    }

    pub fn info(&self) -> TimerInfo {
        TimerInfo {
            id: self.id,
            period: self.period,
            order: self.order,
            next_fire_time: self.next_fire_time(),
            firings: self.firings,
        }
    }

    pub(crate) fn matches(&self, callback: &Callback, period: f64) -> bool {
        self.callback.same(callback) && self.period == period
    }

    pub(crate) fn advance(&mut self) {
        self.firings += 1;
    }

    pub(crate) fn rewind(&mut self, origin: f64) {
        self.origin = origin;
        self.firings = 0;
    }

    pub(crate) fn set_period(&mut self, period: f64) {
        self.period = period;
    }

    /// Three-way comparison on `(next_fire_time, order, id)`.
    ///
    /// Fire times are quantized to `epsilon`, so timers reaching the same instant through
    /// different periods (`3 * 0.1` and `30 * 0.01`) compare equal and fall through to
    /// `order`.
    pub fn schedule_cmp(&self, other: &Timer, epsilon: f64) -> Ordering {
        instant(self.next_fire_time(), epsilon)
            .total_cmp(&instant(other.next_fire_time(), epsilon))
            .then(self.order.cmp(&other.order))
            .then(self.id.cmp(&other.id))
    }
}

fn instant(time: f64, epsilon: f64) -> f64 {
    if epsilon > 0.0 {
        (time / epsilon).round()
    } else {
        time
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("clock", &self.clock)
            .field("period", &self.period)
            .field("order", &self.order)
            .field("next_fire_time", &self.next_fire_time())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = crate::DEFAULT_EPSILON;

    fn noop() -> Callback {
        Callback::new(|_, _| Ok(()))
    }

    fn timer(id: u64, period: f64, order: i32) -> Timer {
        Timer::new(TimerId(id), noop(), period, order, 0.0, ClockId::next())
    }

    #[test]
    fn test_earlier_fire_time_orders_first() {
        let mut a = timer(0, 0.1, 5);
        let b = timer(1, 0.1, -5);
        a.advance();
        assert_eq!(b.schedule_cmp(&a, EPS), Ordering::Less);
    }

    #[test]
    fn test_lower_order_breaks_ties() {
        let a = timer(0, 0.1, 1);
        let b = timer(1, 0.1, 0);
        assert_eq!(b.schedule_cmp(&a, EPS), Ordering::Less);
    }

    #[test]
    fn test_registration_breaks_remaining_ties() {
        let a = timer(0, 0.1, 0);
        let b = timer(1, 0.1, 0);
        assert_eq!(a.schedule_cmp(&b, EPS), Ordering::Less);
        assert_eq!(b.schedule_cmp(&a, EPS), Ordering::Greater);
    }

    #[test]
    fn test_same_instant_through_different_periods_ties_on_order() {
        let mut coarse = timer(0, 0.1, -1);
        let mut fine = timer(1, 0.01, 1);
        for _ in 0..3 {
            coarse.advance();
        }
        for _ in 0..30 {
            fine.advance();
        }
        assert!(coarse.next_fire_time() > fine.next_fire_time());

        assert_eq!(coarse.schedule_cmp(&fine, EPS), Ordering::Less);
        assert_eq!(fine.schedule_cmp(&coarse, EPS), Ordering::Greater);
        // Without tolerance the ULP difference decides.
        assert_eq!(coarse.schedule_cmp(&fine, 0.0), Ordering::Greater);
    }

    #[test]
    fn test_next_fire_time_is_drift_free() {
        let mut t = timer(0, 0.1, 0);
        for _ in 0..1000 {
            t.advance();
        }
        assert_eq!(t.next_fire_time(), 1000.0 * 0.1);
        t.rewind(2.0);
        assert_eq!(t.next_fire_time(), 2.0);
        assert_eq!(t.firings(), 0);
    }

    #[test]
    fn test_callback_identity() {
        let a = noop();
        let b = noop();
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));

        let t = timer(0, 0.25, 0);
        let cb = t.callback().clone();
        assert!(t.matches(&cb, 0.25));
        assert!(!t.matches(&cb, 0.1));
        assert!(!t.matches(&a, 0.25));
    }
}
