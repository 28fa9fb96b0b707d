//! Good-for-day pruning.
//!
//! A single long-lived thread sleeps until the next session close (a local
//! hour of day, 16:00 by default, plus a small slack), then cancels every
//! resting good-for-day order through the normal cancel path under the same
//! mutex as ordinary operations. The timed wait doubles as the shutdown
//! listener: dropping the [`crate::orderbook::Orderbook`] wakes it early and
//! it exits without pruning.

use std::time::Duration;

use chrono::{DateTime, Local, TimeZone, Timelike};
use tracing::{debug, info};

use crate::orderbook::Shared;
use crate::types::OrderType;

/// Wait to fall back on when the session-close instant cannot be computed
/// (a calendar edge such as a missing local time); re-evaluated on wake.
const FALLBACK_WAIT: Duration = Duration::from_secs(60 * 60);

/// Housekeeper thread body.
pub(crate) fn run(shared: &Shared) {
    loop {
        let wait = time_until_session_close(Local::now(), shared.config.session_close_hour)
            .unwrap_or(FALLBACK_WAIT)
            + shared.config.prune_slack;

        debug!(?wait, "housekeeper sleeping until session close");

        {
            let mut shutdown = shared.shutdown.lock();
            if *shutdown {
                info!("housekeeper shutting down");
                return;
            }

            let result = shared.shutdown_signal.wait_for(&mut shutdown, wait);

            if *shutdown {
                info!("housekeeper shutting down");
                return;
            }
            if !result.timed_out() {
                // Spurious wake: recompute the deadline and wait again.
                continue;
            }
        }

        prune_good_for_day(shared);
    }
}

/// Cancel all resting good-for-day orders.
///
/// Snapshots the ids and cancels them inside one critical section on the
/// book mutex, through the same cancel path as external callers.
pub(crate) fn prune_good_for_day(shared: &Shared) {
    let mut book = shared.book.lock();

    let order_ids = book.orders_with_type(OrderType::GoodForDay);
    let count = order_ids.len();

    for order_id in order_ids {
        shared.engine.cancel_order(&mut book, order_id);
    }

    if count > 0 {
        info!(count, "cancelled good-for-day orders at session close");
    }
}

/// The next instant at which the local clock reads `close_hour:00:00`.
///
/// Today if the hour has not yet been reached, otherwise tomorrow. `None`
/// only on calendar edges (end of supported range, or a local time skipped
/// by a DST transition).
pub(crate) fn next_session_close(
    now: DateTime<Local>,
    close_hour: u32,
) -> Option<DateTime<Local>> {
    let mut date = now.date_naive();
    if now.hour() >= close_hour {
        date = date.succ_opt()?;
    }

    let close = date.and_hms_opt(close_hour, 0, 0)?;
    Local.from_local_datetime(&close).earliest()
}

/// Duration from `now` until the next session close.
pub(crate) fn time_until_session_close(
    now: DateTime<Local>,
    close_hour: u32,
) -> Option<Duration> {
    let close = next_session_close(now, close_hour)?;
    (close - now).to_std().ok()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Book;
    use crate::config::EngineConfig;
    use crate::engine::MatchingEngine;
    use crate::types::{Order, Side};
    use parking_lot::{Condvar, Mutex};

    fn test_shared() -> Shared {
        Shared {
            book: Mutex::new(Book::new()),
            engine: MatchingEngine::new(),
            shutdown: Mutex::new(false),
            shutdown_signal: Condvar::new(),
            config: EngineConfig::default(),
        }
    }

    #[test]
    fn test_next_close_later_today() {
        let now = Local.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap();

        let close = next_session_close(now, 16).unwrap();

        assert_eq!(close.date_naive(), now.date_naive());
        assert_eq!(close.hour(), 16);
        assert_eq!(close.minute(), 0);
        assert!(close > now);
    }

    #[test]
    fn test_next_close_rolls_to_tomorrow() {
        let now = Local.with_ymd_and_hms(2024, 3, 4, 18, 0, 0).unwrap();

        let close = next_session_close(now, 16).unwrap();

        assert_eq!(close.date_naive(), now.date_naive().succ_opt().unwrap());
        assert_eq!(close.hour(), 16);
    }

    #[test]
    fn test_next_close_at_the_boundary_hour() {
        // Exactly 16:xx counts as past the close.
        let now = Local.with_ymd_and_hms(2024, 3, 4, 16, 0, 0).unwrap();

        let close = next_session_close(now, 16).unwrap();

        assert_eq!(close.date_naive(), now.date_naive().succ_opt().unwrap());
    }

    #[test]
    fn test_time_until_close_positive() {
        let now = Local.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap();

        let wait = time_until_session_close(now, 16).unwrap();

        assert_eq!(wait, Duration::from_secs(60 * 60));
    }

    #[test]
    fn test_prune_cancels_only_good_for_day() {
        let shared = test_shared();
        {
            let mut book = shared.book.lock();
            shared.engine.add_order(
                &mut book,
                Order::new(OrderType::GoodForDay, 1, Side::Buy, 100, 10),
            );
            shared.engine.add_order(
                &mut book,
                Order::new(OrderType::GoodTillCancel, 2, Side::Buy, 99, 5),
            );
            shared.engine.add_order(
                &mut book,
                Order::new(OrderType::GoodForDay, 3, Side::Sell, 105, 2),
            );
        }

        prune_good_for_day(&shared);

        let book = shared.book.lock();
        assert_eq!(book.size(), 1);
        assert!(book.contains(2));
        assert!(!book.contains(1));
        assert!(!book.contains(3));
        book.check_consistency().unwrap();
    }

    #[test]
    fn test_prune_on_empty_book_is_noop() {
        let shared = test_shared();
        prune_good_for_day(&shared);
        assert_eq!(shared.book.lock().size(), 0);
    }
}
