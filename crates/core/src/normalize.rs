//! Host configuration to [`CanonicalConfig`].

use std::sync::LazyLock;

use liveact_protocol::{
	ActivityConfig, CanonicalConfig, CanonicalPadding, Dimension, ImageDimension, ImageSizing, Padding,
};
use liveact_runtime::{Error, Result};
use regex::Regex;

static PERCENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(100(?:\.0+)?|\d{1,2}(?:\.\d+)?)%$").unwrap());

/// Canonicalizes a host configuration.
///
/// Fails with [`Error::InvalidConfiguration`] when an image dimension is a
/// string that is not a `0`-`100` percentage. Everything else passes through;
/// negative padding included. Normalizing
/// `ActivityConfig::from(&canonical)` yields `canonical` again.
pub fn normalize(config: &ActivityConfig) -> Result<CanonicalConfig> {
	let image_sizing = match &config.image_size {
		Some(size) => ImageSizing {
			width: dimension("imageSize.width", size.width.as_ref())?,
			height: dimension("imageSize.height", size.height.as_ref())?,
		},
		None => ImageSizing::default(),
	};

	Ok(CanonicalConfig {
		background_color: config.background_color.clone(),
		title_color: config.title_color.clone(),
		subtitle_color: config.subtitle_color.clone(),
		progress_view_tint: config.progress_view_tint.clone(),
		progress_view_label_color: config.progress_view_label_color.clone(),
		deep_link_url: config.deep_link_url.clone(),
		timer_type: config.timer_type,
		padding: config.padding.map(|padding| match padding {
			Padding::Uniform(value) => CanonicalPadding::Uniform(value),
			Padding::Details(details) => CanonicalPadding::Details(details),
		}),
		image_position: config.image_position,
		image_align: config.image_align,
		image_sizing,
		content_fit: config.content_fit,
	})
}

fn dimension(field: &str, value: Option<&ImageDimension>) -> Result<Option<Dimension>> {
	match value {
		None => Ok(None),
		Some(ImageDimension::Points(points)) => Ok(Some(Dimension::Points(*points))),
		Some(ImageDimension::Percent(raw)) => parse_percent(field, raw).map(|p| Some(Dimension::Percent(p))),
	}
}

/// Parses `"<0-100>%"` (surrounding whitespace ignored) into the numeric percent.
pub fn parse_percent(field: &str, raw: &str) -> Result<f64> {
	let invalid = || Error::InvalidConfiguration(format!("{field}: expected a percentage between 0% and 100%, got {raw:?}"));

	let captures = PERCENT.captures(raw.trim()).ok_or_else(invalid)?;
	captures[1].parse::<f64>().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
	use liveact_protocol::{ImagePosition, ImageSize, PaddingDetails};
	use serde_json::json;

	use super::*;

	fn with_width(width: ImageDimension) -> ActivityConfig {
		ActivityConfig {
			image_size: Some(ImageSize {
				width: Some(width),
				height: None,
			}),
			..Default::default()
		}
	}

	#[test]
	fn every_integer_and_tenth_percent_parses() {
		for tenths in 0..=1000u32 {
			let value = f64::from(tenths) / 10.0;
			let text = if tenths % 10 == 0 {
				format!("{}%", tenths / 10)
			} else {
				format!("{value:.1}%")
			};
			assert_eq!(parse_percent("w", &text).unwrap(), value, "{text}");
		}
	}

	#[test]
	fn percent_pattern_edges() {
		assert_eq!(parse_percent("w", " 50% ").unwrap(), 50.0);
		assert_eq!(parse_percent("w", "100.00%").unwrap(), 100.0);
		assert_eq!(parse_percent("w", "7.25%").unwrap(), 7.25);

		for bad in ["101%", "100.5%", "-1%", "50", "%", "abc", "50 %", "1000%", ""] {
			let err = parse_percent("w", bad).unwrap_err();
			assert!(matches!(err, Error::InvalidConfiguration(_)), "{bad}");
		}
	}

	#[test]
	fn error_names_the_field() {
		let err = normalize(&with_width("wide".into())).unwrap_err();
		assert!(err.to_string().contains("imageSize.width"), "{err}");
	}

	#[test]
	fn sizes_padding_and_passthrough() {
		let config: ActivityConfig = serde_json::from_value(json!({
			"titleColor": "#fff",
			"padding": { "horizontal": -4 },
			"imageSize": { "width": "25%", "height": 40 },
			"imagePosition": "leftStretch"
		}))
		.unwrap();

		let canonical = normalize(&config).unwrap();
		assert_eq!(canonical.title_color.as_deref(), Some("#fff"));
		assert_eq!(
			canonical.padding,
			Some(CanonicalPadding::Details(PaddingDetails {
				horizontal: Some(-4.0),
				..Default::default()
			}))
		);
		assert_eq!(canonical.image_sizing.width, Some(Dimension::Percent(25.0)));
		assert_eq!(canonical.image_sizing.height, Some(Dimension::Points(40.0)));
		assert_eq!(canonical.image_position, Some(ImagePosition::LeftStretch));
	}

	#[test]
	fn unset_stays_unset() {
		let canonical = normalize(&ActivityConfig::default()).unwrap();
		assert_eq!(canonical, CanonicalConfig::default());

		let canonical = normalize(&with_width(ImageDimension::Points(10.0))).unwrap();
		assert_eq!(canonical.image_sizing.height, None);
	}

	#[test]
	fn normalize_is_idempotent() {
		let config = ActivityConfig {
			padding: Some(Padding::Uniform(12.0)),
			image_size: Some(ImageSize {
				width: Some("33.5%".into()),
				height: Some(ImageDimension::Points(20.0)),
			}),
			..Default::default()
		};

		let once = normalize(&config).unwrap();
		let twice = normalize(&ActivityConfig::from(&once)).unwrap();
		assert_eq!(once, twice);
	}
}
