//! Bounded retry combinator.

use std::thread;
use std::time::Duration;

use tracing::warn;

/// Run `operation` up to `attempts` times, sleeping `delay` between failures.
///
/// Returns the first success or the last error. `attempts` of zero is treated
/// as one.
pub fn retry<T, E, F>(attempts: u32, delay: Duration, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Result<T, E>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(attempt, attempts, error = %e, "Attempt failed, retrying");
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
