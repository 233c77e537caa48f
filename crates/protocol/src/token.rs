//! Delivery token encoding.
//!
//! The OS hands out tokens as opaque bytes. Across the host boundary they are
//! carried as lowercase hex, two digits per byte, no separators.

use serde::{Deserialize, Serialize};

/// Encodes raw token bytes as lowercase hex. Empty input yields an empty string.
pub fn encode_token(bytes: &[u8]) -> String {
	hex::encode(bytes)
}

/// An opaque delivery token as received from the OS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DeliveryToken(Vec<u8>);

impl DeliveryToken {
	pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
		Self(bytes.into())
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	pub fn to_hex(&self) -> String {
		encode_token(&self.0)
	}
}

impl std::fmt::Display for DeliveryToken {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.to_hex())
	}
}

impl From<DeliveryToken> for String {
	fn from(token: DeliveryToken) -> Self {
		token.to_hex()
	}
}

impl TryFrom<String> for DeliveryToken {
	type Error = hex::FromHexError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		hex::decode(value).map(Self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn encodes_lowercase_pairs() {
		assert_eq!(encode_token(&[0x0a, 0xff]), "0aff");
		assert_eq!(encode_token(&[0x00, 0x01, 0xAB]), "0001ab");
	}

	#[test]
	fn empty_token_is_empty_string() {
		assert_eq!(encode_token(&[]), "");
	}

	#[test]
	fn delivery_token_displays_as_hex() {
		let token = DeliveryToken::new(vec![0xde, 0xad, 0xbe, 0xef]);
		assert_eq!(token.to_string(), "deadbeef");
		assert_eq!(serde_json::to_value(&token).unwrap(), serde_json::json!("deadbeef"));
	}
}
