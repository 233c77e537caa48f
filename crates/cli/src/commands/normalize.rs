use liveact::CanonicalConfig;

use super::read_config;
use crate::error::Result;

pub(super) fn execute(source: &str) -> Result<CanonicalConfig> {
	let config = read_config(source)?;
	let canonical = liveact::normalize(&config)?;
	tracing::info!(
		padding = ?canonical.padding,
		sizing = ?canonical.image_sizing,
		"Configuration normalized"
	);
	Ok(canonical)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn percent_strings_become_numbers() {
		let canonical = execute(r#"{ "padding": 8, "imageSize": { "width": "40%", "height": 60 } }"#).unwrap();
		let json = serde_json::to_value(&canonical).unwrap();

		assert_eq!(json["padding"], 8.0);
		assert_eq!(json["imageWidthPercent"], 40.0);
		assert_eq!(json["imageHeight"], 60.0);
	}

	#[test]
	fn malformed_percent_is_rejected() {
		let err = execute(r#"{ "imageSize": { "height": "150%" } }"#).unwrap_err();
		assert!(err.to_string().contains("imageSize.height"));
	}
}
