use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the unix epoch, 0 if the clock is set before it.
#[inline]
pub fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|x| x.as_millis() as u64).unwrap_or_default()
}
