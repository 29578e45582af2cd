//! Preparation progress for orders in the kitchen.
//!
//! Progress is derived, never stored: clients poll and the value is computed
//! from `preparation_started`, `estimated_time` and the current time.

use crate::entities::{OrderStatus, order};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Progress of an order at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderProgress {
    /// Percentage in `[0, 100]`
    pub progress: f64,
    /// Minutes left, never negative
    pub remaining: f64,
}

/// Minutes since preparation started, or `None` if it has not started.
///
/// Clock skew that would yield a negative value is clamped to zero.
#[must_use]
pub fn elapsed_minutes(order: &order::Model, now: DateTime<Utc>) -> Option<f64> {
    let started = order.preparation_started?;
    #[allow(clippy::cast_precision_loss)]
    let minutes = (now - started).num_milliseconds() as f64 / 60_000.0;
    Some(minutes.max(0.0))
}

/// Computes progress and remaining time.
///
/// Only orders that are `Preparing` with a start stamp make progress; any
/// other order reports 0% and its full estimate. A zero or negative estimate
/// yields 0% instead of dividing by zero.
#[must_use]
pub fn compute_progress(order: &order::Model, now: DateTime<Utc>) -> OrderProgress {
    let estimated = f64::from(order.estimated_time);

    let elapsed = match (order.order_status, elapsed_minutes(order, now)) {
        (OrderStatus::Preparing, Some(elapsed)) => elapsed,
        _ => {
            return OrderProgress {
                progress: 0.0,
                remaining: estimated.max(0.0),
            };
        }
    };

    let progress = if estimated > 0.0 {
        (elapsed / estimated * 100.0).min(100.0)
    } else {
        0.0
    };

    OrderProgress {
        progress,
        remaining: (estimated - elapsed).max(0.0),
    }
}

/// Whether a preparing order has run past its estimate.
#[must_use]
pub fn is_overdue(order: &order::Model, now: DateTime<Utc>) -> bool {
    order.order_status == OrderStatus::Preparing
        && elapsed_minutes(order, now).is_some_and(|e| e > f64::from(order.estimated_time))
}

/// Rounds to one decimal place for display.
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::PaymentStatus;
    use chrono::Duration;

    fn preparing_order(estimated: i32, started_minutes_ago: i64, now: DateTime<Utc>) -> order::Model {
        order::Model {
            id: 1,
            user_id: 1,
            total_amount: 100.0,
            payment_status: PaymentStatus::Paid,
            order_status: OrderStatus::Preparing,
            order_time: now - Duration::minutes(started_minutes_ago + 5),
            estimated_time: estimated,
            preparation_started: Some(now - Duration::minutes(started_minutes_ago)),
            preparation_completed: None,
            notification_sent: false,
        }
    }

    #[test]
    fn test_progress_midway() {
        let now = Utc::now();
        let p = compute_progress(&preparing_order(20, 5, now), now);
        assert_eq!(p.progress, 25.0);
        assert_eq!(p.remaining, 15.0);
    }

    #[test]
    fn test_progress_caps_when_overdue() {
        let now = Utc::now();
        let order = preparing_order(10, 25, now);
        let p = compute_progress(&order, now);
        assert_eq!(p.progress, 100.0);
        assert_eq!(p.remaining, 0.0);
        assert!(is_overdue(&order, now));
    }

    #[test]
    fn test_progress_zero_estimate() {
        let now = Utc::now();
        let p = compute_progress(&preparing_order(0, 3, now), now);
        assert_eq!(p.progress, 0.0);
        assert_eq!(p.remaining, 0.0);

        let p = compute_progress(&preparing_order(-5, 3, now), now);
        assert_eq!(p.progress, 0.0);
        assert_eq!(p.remaining, 0.0);
    }

    #[test]
    fn test_progress_bounds_over_many_elapsed_times() {
        let now = Utc::now();
        for estimated in [-10, 0, 1, 15, 60] {
            for elapsed in [-30, 0, 1, 14, 15, 16, 600] {
                let p = compute_progress(&preparing_order(estimated, elapsed, now), now);
                assert!((0.0..=100.0).contains(&p.progress), "{estimated} {elapsed} {p:?}");
                assert!(p.remaining >= 0.0, "{estimated} {elapsed} {p:?}");
            }
        }
    }

    #[test]
    fn test_not_preparing_reports_full_estimate() {
        let now = Utc::now();
        let mut order = preparing_order(15, 5, now);
        order.order_status = OrderStatus::Pending;
        order.preparation_started = None;
        let p = compute_progress(&order, now);
        assert_eq!(p.progress, 0.0);
        assert_eq!(p.remaining, 15.0);
        assert!(!is_overdue(&order, now));

        order.order_status = OrderStatus::Ready;
        order.preparation_started = Some(now - Duration::minutes(100));
        assert_eq!(compute_progress(&order, now).progress, 0.0);
        assert!(!is_overdue(&order, now));
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(33.333_33), 33.3);
        assert_eq!(round1(66.66), 66.7);
        assert_eq!(round1(0.0), 0.0);
    }
}
