//! Pickup token generation.

use uuid::Uuid;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Largest multiple of 36 that fits in a byte; bytes at or above it are
/// skipped so every symbol is equally likely.
const REJECT_FROM: u8 = 252;

/// Generates a random uppercase alphanumeric token of `length` characters.
///
/// Randomness comes from v4 UUIDs. Tokens are not checked for collisions:
/// they are a handoff aid shown next to the order, not a lookup key.
pub fn generate_pickup_token(length: usize) -> String {
	let mut token = String::with_capacity(length);

	while token.len() < length {
		let uuid = Uuid::new_v4();
		for (index, byte) in uuid.as_bytes().iter().enumerate() {
			// Bytes 6 and 8 carry the version and variant bits.
			if index == 6 || index == 8 || *byte >= REJECT_FROM {
				continue;
			}
			token.push(char::from(ALPHABET[usize::from(*byte % 36)]));
			if token.len() == length {
				break;
			}
		}
	}

	token
}
