//! Bounded exponential backoff for oracle calls.

use std::time::Duration;

use tracing::warn;

use hindsight_core::errors::AttributionError;
use hindsight_core::HindsightResult;

/// Run `f` up to `max_attempts` times, sleeping `base_ms << attempt`
/// between failures. Returns `OracleExhausted` once the budget is spent.
pub fn with_backoff<T>(
    max_attempts: u32,
    base_ms: u64,
    mut f: impl FnMut() -> HindsightResult<T>,
) -> Result<T, AttributionError> {
    let attempts = max_attempts.max(1);
    let mut last_err = String::new();

    for attempt in 0..attempts {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                last_err = e.to_string();
                if attempt + 1 < attempts {
                    let delay = base_ms.saturating_mul(1 << attempt);
                    warn!(attempt, delay_ms = delay, error = %last_err, "oracle call failed, backing off");
                    std::thread::sleep(Duration::from_millis(delay));
                }
            }
        }
    }

    Err(AttributionError::OracleExhausted {
        attempts,
        reason: last_err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let out = with_backoff(3, 0, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, hindsight_core::HindsightError>(7)
        });
        assert_eq!(out.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let out = with_backoff(3, 0, || {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AttributionError::OracleError("transient".into()).into())
            } else {
                Ok(42)
            }
        });
        assert_eq!(out.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn exhausts_after_budget() {
        let calls = AtomicU32::new(0);
        let out: Result<i32, _> = with_backoff(3, 0, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AttributionError::OracleError("down".into()).into())
        });
        assert!(matches!(
            out,
            Err(AttributionError::OracleExhausted { attempts: 3, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
