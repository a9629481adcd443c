//! Helper utilities for clock handling.

/// Length of one spending window.
pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Helper function to get current timestamp, returns 0 if system time is before UNIX epoch.
pub fn current_timestamp() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}

/// Index of the day window containing `timestamp`.
pub fn day_index(timestamp: u64) -> u64 {
	timestamp / SECONDS_PER_DAY
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_day_index_boundaries() {
		assert_eq!(day_index(0), 0);
		assert_eq!(day_index(SECONDS_PER_DAY - 1), 0);
		assert_eq!(day_index(SECONDS_PER_DAY), 1);
		assert_eq!(day_index(10 * SECONDS_PER_DAY + 5), 10);
	}
}
