//! Utility functions shared across crates.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to two decimal places, midpoint away from zero.
pub fn round_money(value: Decimal) -> Decimal {
	value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncates an identifier for log output.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((end, _)) => format!("{}..", &id[..end]),
		None => id.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_round_money() {
		assert_eq!(round_money(Decimal::new(12345, 3)), Decimal::new(1235, 2));
		assert_eq!(round_money(Decimal::new(25, 0)), Decimal::new(2500, 2));
		assert_eq!(round_money(Decimal::new(1004, 3)), Decimal::new(100, 2));
	}

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("abc"), "abc");
		assert_eq!(
			truncate_id("6f2c9a1e-4a0b-4d8e-9c47-1f0d6c2b8a11"),
			"6f2c9a1e.."
		);
		assert_eq!(truncate_id("12345678"), "12345678");
		assert_eq!(truncate_id("ünïcödé-phone"), "ünïcödé-..");
	}
}
