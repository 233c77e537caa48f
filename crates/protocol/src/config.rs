//! Visual configuration for a live activity.
//!
//! Two shapes exist for the same information:
//!
//! - [`ActivityConfig`] - the flexible form accepted from the host application
//!   (padding shorthand, `"50%"` strings, everything optional)
//! - [`CanonicalConfig`] - the unambiguous form stored in session attributes and
//!   consumed by layout code
//!
//! Turning one into the other is the job of `liveact::normalize`; this module
//! only defines the types and their JSON representation.

use serde::{Deserialize, Serialize};

/// Configuration object accepted when starting a session.
///
/// Field names follow the camelCase JSON convention used by host applications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityConfig {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub background_color: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title_color: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub subtitle_color: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub progress_view_tint: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub progress_view_label_color: Option<String>,
	/// Path appended to the app's URL scheme when the card is tapped.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub deep_link_url: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timer_type: Option<TimerType>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub padding: Option<Padding>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image_position: Option<ImagePosition>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image_align: Option<ImageAlign>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image_size: Option<ImageSize>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub content_fit: Option<ContentFit>,
}

/// Padding shorthand: one value for every edge, or a per-edge breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Padding {
	Uniform(f64),
	Details(PaddingDetails),
}

/// Per-edge padding. Specific edges win over the `vertical`/`horizontal` axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PaddingDetails {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub top: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub bottom: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub left: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub right: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub vertical: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub horizontal: Option<f64>,
}

/// Requested image size as supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub width: Option<ImageDimension>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub height: Option<ImageDimension>,
}

/// A single image dimension: absolute points or a `"<0-100>%"` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageDimension {
	Points(f64),
	Percent(String),
}

impl From<f64> for ImageDimension {
	fn from(points: f64) -> Self {
		Self::Points(points)
	}
}

impl From<&str> for ImageDimension {
	fn from(percent: &str) -> Self {
		Self::Percent(percent.to_string())
	}
}

/// Where the image sits relative to the text column.
///
/// The `*Stretch` variants select the layout in which the image column spans
/// the full card height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImagePosition {
	#[default]
	Left,
	Right,
	LeftStretch,
	RightStretch,
}

impl ImagePosition {
	pub fn is_stretch(self) -> bool {
		matches!(self, Self::LeftStretch | Self::RightStretch)
	}

	pub fn side(self) -> HorizontalSide {
		match self {
			Self::Left | Self::LeftStretch => HorizontalSide::Left,
			Self::Right | Self::RightStretch => HorizontalSide::Right,
		}
	}
}

/// Horizontal edge the image is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HorizontalSide {
	Left,
	Right,
}

/// Vertical alignment of the image inside its column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageAlign {
	Top,
	#[default]
	Center,
	Bottom,
}

/// How a source image maps into its target box (CSS `object-fit` semantics).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentFit {
	#[default]
	Cover,
	Contain,
	Fill,
	None,
	ScaleDown,
}

impl std::fmt::Display for ContentFit {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Cover => write!(f, "cover"),
			Self::Contain => write!(f, "contain"),
			Self::Fill => write!(f, "fill"),
			Self::None => write!(f, "none"),
			Self::ScaleDown => write!(f, "scale-down"),
		}
	}
}

/// Timer style shown in the compact system indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerType {
	#[default]
	Circular,
	Digital,
}

/// Canonical image dimension. Percentages are stored as the numeric percent
/// (`"50%"` becomes `Percent(50.0)`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
	Points(f64),
	Percent(f64),
}

/// Canonical image sizing. `None` means "auto", never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImageSizing {
	pub width: Option<Dimension>,
	pub height: Option<Dimension>,
}

/// Canonical padding: exactly one representation, never both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanonicalPadding {
	Uniform(f64),
	Details(PaddingDetails),
}

/// Padding applied on every edge when the config names none.
pub const DEFAULT_PADDING: f64 = 16.0;

/// Concrete per-edge padding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeInsets {
	pub top: f64,
	pub bottom: f64,
	pub left: f64,
	pub right: f64,
}

impl EdgeInsets {
	pub const fn uniform(value: f64) -> Self {
		Self {
			top: value,
			bottom: value,
			left: value,
			right: value,
		}
	}
}

impl Default for EdgeInsets {
	fn default() -> Self {
		Self::uniform(DEFAULT_PADDING)
	}
}

impl CanonicalPadding {
	/// Resolves to concrete insets. A specific edge wins over its axis, which
	/// wins over [`DEFAULT_PADDING`].
	pub fn insets(&self) -> EdgeInsets {
		match *self {
			Self::Uniform(value) => EdgeInsets::uniform(value),
			Self::Details(d) => {
				let pick = |edge: Option<f64>, axis: Option<f64>| edge.or(axis).unwrap_or(DEFAULT_PADDING);
				EdgeInsets {
					top: pick(d.top, d.vertical),
					bottom: pick(d.bottom, d.vertical),
					left: pick(d.left, d.horizontal),
					right: pick(d.right, d.horizontal),
				}
			}
		}
	}
}

/// Normalized configuration stored in immutable session attributes.
///
/// Serializes to the flat form native widgets read (`padding` /
/// `paddingDetails`, `imageWidth` / `imageWidthPercent`, ...). Deserializing a
/// flat form that sets both members of one of those pairs is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireCanonicalConfig", try_from = "WireCanonicalConfig")]
pub struct CanonicalConfig {
	pub background_color: Option<String>,
	pub title_color: Option<String>,
	pub subtitle_color: Option<String>,
	pub progress_view_tint: Option<String>,
	pub progress_view_label_color: Option<String>,
	pub deep_link_url: Option<String>,
	pub timer_type: Option<TimerType>,
	pub padding: Option<CanonicalPadding>,
	pub image_position: Option<ImagePosition>,
	pub image_align: Option<ImageAlign>,
	pub image_sizing: ImageSizing,
	pub content_fit: Option<ContentFit>,
}

impl CanonicalConfig {
	pub fn image_position(&self) -> ImagePosition {
		self.image_position.unwrap_or_default()
	}

	pub fn image_align(&self) -> ImageAlign {
		self.image_align.unwrap_or_default()
	}

	pub fn content_fit(&self) -> ContentFit {
		self.content_fit.unwrap_or_default()
	}

	/// Card padding, [`DEFAULT_PADDING`] on every edge when unset.
	pub fn insets(&self) -> EdgeInsets {
		self.padding.map(|p| p.insets()).unwrap_or_default()
	}
}

/// Converts back into the host-facing shape; normalizing the result yields
/// the same canonical value.
impl From<&CanonicalConfig> for ActivityConfig {
	fn from(config: &CanonicalConfig) -> Self {
		let dimension = |d: Option<Dimension>| {
			d.map(|d| match d {
				Dimension::Points(points) => ImageDimension::Points(points),
				Dimension::Percent(percent) => ImageDimension::Percent(format!("{percent}%")),
			})
		};
		let sizing = config.image_sizing;
		let image_size = (sizing.width.is_some() || sizing.height.is_some()).then(|| ImageSize {
			width: dimension(sizing.width),
			height: dimension(sizing.height),
		});

		Self {
			background_color: config.background_color.clone(),
			title_color: config.title_color.clone(),
			subtitle_color: config.subtitle_color.clone(),
			progress_view_tint: config.progress_view_tint.clone(),
			progress_view_label_color: config.progress_view_label_color.clone(),
			deep_link_url: config.deep_link_url.clone(),
			timer_type: config.timer_type,
			padding: config.padding.map(|p| match p {
				CanonicalPadding::Uniform(value) => Padding::Uniform(value),
				CanonicalPadding::Details(details) => Padding::Details(details),
			}),
			image_position: config.image_position,
			image_align: config.image_align,
			image_size,
			content_fit: config.content_fit,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCanonicalConfig {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	background_color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	title_color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	subtitle_color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	progress_view_tint: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	progress_view_label_color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	deep_link_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	timer_type: Option<TimerType>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	padding: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	padding_details: Option<PaddingDetails>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	image_position: Option<ImagePosition>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	image_align: Option<ImageAlign>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	image_width: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	image_height: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	image_width_percent: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	image_height_percent: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	content_fit: Option<ContentFit>,
}

impl From<CanonicalConfig> for WireCanonicalConfig {
	fn from(config: CanonicalConfig) -> Self {
		let (padding, padding_details) = match config.padding {
			Some(CanonicalPadding::Uniform(value)) => (Some(value), None),
			Some(CanonicalPadding::Details(details)) => (None, Some(details)),
			None => (None, None),
		};
		let split = |d: Option<Dimension>| match d {
			Some(Dimension::Points(points)) => (Some(points), None),
			Some(Dimension::Percent(percent)) => (None, Some(percent)),
			None => (None, None),
		};
		let (image_width, image_width_percent) = split(config.image_sizing.width);
		let (image_height, image_height_percent) = split(config.image_sizing.height);

		Self {
			background_color: config.background_color,
			title_color: config.title_color,
			subtitle_color: config.subtitle_color,
			progress_view_tint: config.progress_view_tint,
			progress_view_label_color: config.progress_view_label_color,
			deep_link_url: config.deep_link_url,
			timer_type: config.timer_type,
			padding,
			padding_details,
			image_position: config.image_position,
			image_align: config.image_align,
			image_width,
			image_height,
			image_width_percent,
			image_height_percent,
			content_fit: config.content_fit,
		}
	}
}

impl TryFrom<WireCanonicalConfig> for CanonicalConfig {
	type Error = String;

	fn try_from(wire: WireCanonicalConfig) -> Result<Self, Self::Error> {
		let padding = match (wire.padding, wire.padding_details) {
			(Some(_), Some(_)) => return Err("padding and paddingDetails are mutually exclusive".to_string()),
			(Some(value), None) => Some(CanonicalPadding::Uniform(value)),
			(None, Some(details)) => Some(CanonicalPadding::Details(details)),
			(None, None) => None,
		};
		let join = |name: &str, points: Option<f64>, percent: Option<f64>| match (points, percent) {
			(Some(_), Some(_)) => Err(format!("{name} and {name}Percent are mutually exclusive")),
			(Some(points), None) => Ok(Some(Dimension::Points(points))),
			(None, Some(percent)) => Ok(Some(Dimension::Percent(percent))),
			(None, None) => Ok(None),
		};

		Ok(Self {
			background_color: wire.background_color,
			title_color: wire.title_color,
			subtitle_color: wire.subtitle_color,
			progress_view_tint: wire.progress_view_tint,
			progress_view_label_color: wire.progress_view_label_color,
			deep_link_url: wire.deep_link_url,
			timer_type: wire.timer_type,
			padding,
			image_position: wire.image_position,
			image_align: wire.image_align,
			image_sizing: ImageSizing {
				width: join("imageWidth", wire.image_width, wire.image_width_percent)?,
				height: join("imageHeight", wire.image_height, wire.image_height_percent)?,
			},
			content_fit: wire.content_fit,
		})
	}
}
