//! Image box resolution for the rendered card.
//!
//! Resolution runs in two steps:
//!
//! 1. [`resolve_box`] turns the canonical sizing plus an optional container
//!    measurement into a target box whose dimensions may stay unresolved
//!    (aspect ratio preserved downstream).
//! 2. [`fit`] applies a [`ContentFit`] mode given the source image's
//!    intrinsic size, if known.
//!
//! Everything here is pure. [`ImageLayout`] is the only stateful piece: it
//! caches the latest container measurement so the renderer can re-resolve on
//! every layout pass.

use liveact_protocol::{
	CanonicalConfig, ContentFit, Dimension, EdgeInsets, HorizontalSide, ImageAlign, ImageSizing,
};
use serde::Serialize;

/// Box edge used for unset sizes and for percentages without a measurement.
pub const DEFAULT_IMAGE_SIZE: f64 = 64.0;

/// Width and height in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	fn usable(self) -> Option<Self> {
		let ok = |v: f64| v.is_finite() && v > 0.0;
		(ok(self.width) && ok(self.height)).then_some(self)
	}
}

/// Target box. `None` on an axis means "derive from the aspect ratio".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ImageBox {
	pub width: Option<f64>,
	pub height: Option<f64>,
}

/// Where the image column sits inside the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageAlignment {
	pub side: HorizontalSide,
	pub vertical: ImageAlign,
	/// Image column spans the full card height.
	pub stretch: bool,
}

impl ImageAlignment {
	pub fn from_config(config: &CanonicalConfig) -> Self {
		let position = config.image_position();
		Self {
			side: position.side(),
			vertical: config.image_align(),
			stretch: position.is_stretch(),
		}
	}
}

/// Image box plus alignment, before any content fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageFrame {
	pub width: Option<f64>,
	pub height: Option<f64>,
	pub alignment: ImageAlignment,
}

/// Result of applying a content-fit mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FittedImage {
	/// Box after deriving unresolved axes from the intrinsic aspect ratio.
	pub frame: ImageBox,
	/// Rendered image size. `None` leaves sizing to the renderer with the
	/// aspect ratio preserved.
	pub content: Option<Size>,
	/// Content overflows the box and must be clipped to it.
	pub clipped: bool,
}

/// A fitted image with its alignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImagePlacement {
	pub image: FittedImage,
	pub alignment: ImageAlignment,
}

/// Resolves the target box.
///
/// Per axis: a percentage scales the measured container edge (or
/// [`DEFAULT_IMAGE_SIZE`]) after clamping to `0..=100`; points are used as
/// given; an unset axis stays unresolved when the other axis is constrained
/// and falls back to [`DEFAULT_IMAGE_SIZE`] otherwise. Non-finite or
/// non-positive measurements count as absent.
pub fn resolve_box(sizing: &ImageSizing, measured: Option<Size>) -> ImageBox {
	let measured = measured.and_then(Size::usable);
	ImageBox {
		width: resolve_axis(sizing.width, sizing.height.is_some(), measured.map(|m| m.width)),
		height: resolve_axis(sizing.height, sizing.width.is_some(), measured.map(|m| m.height)),
	}
}

fn resolve_axis(dimension: Option<Dimension>, other_constrained: bool, measured: Option<f64>) -> Option<f64> {
	match dimension {
		Some(Dimension::Percent(percent)) => {
			Some(percent.clamp(0.0, 100.0) / 100.0 * measured.unwrap_or(DEFAULT_IMAGE_SIZE))
		}
		Some(Dimension::Points(points)) => Some(points),
		None if other_constrained => None,
		None => Some(DEFAULT_IMAGE_SIZE),
	}
}

/// Resolves the image frame for `config` in a container of `measured` size.
pub fn resolve(config: &CanonicalConfig, measured: Option<Size>) -> ImageFrame {
	let image_box = resolve_box(&config.image_sizing, measured);
	ImageFrame {
		width: image_box.width,
		height: image_box.height,
		alignment: ImageAlignment::from_config(config),
	}
}

/// Resolves and fits in one call. `None` means the image is skipped.
pub fn place(config: &CanonicalConfig, measured: Option<Size>, intrinsic: Option<Size>) -> Option<ImagePlacement> {
	let image_box = resolve_box(&config.image_sizing, measured);
	let image = fit(image_box, config.content_fit(), intrinsic)?;
	Some(ImagePlacement {
		image,
		alignment: ImageAlignment::from_config(config),
	})
}

/// Applies `mode` to `image_box` for a source of `intrinsic` size.
///
/// Returns `None` only for [`ContentFit::ScaleDown`] without a usable
/// intrinsic size, which cannot decide between scaling and not scaling.
pub fn fit(image_box: ImageBox, mode: ContentFit, intrinsic: Option<Size>) -> Option<FittedImage> {
	let intrinsic = intrinsic.and_then(Size::usable);
	let frame = derive_axes(image_box, intrinsic);

	let Some(source) = intrinsic else {
		if mode == ContentFit::ScaleDown {
			tracing::warn!(?image_box, "scale-down needs the intrinsic image size, skipping image");
			return None;
		}
		let content = match (mode, frame.width, frame.height) {
			(ContentFit::Fill, Some(width), Some(height)) => Some(Size::new(width, height)),
			_ => None,
		};
		return Some(FittedImage {
			frame,
			content,
			clipped: false,
		});
	};

	let (Some(width), Some(height)) = (frame.width, frame.height) else {
		return Some(FittedImage {
			frame,
			content: None,
			clipped: false,
		});
	};
	let target = Size::new(width, height);
	let exceeds = |s: Size| s.width > target.width || s.height > target.height;

	let mode = match mode {
		ContentFit::ScaleDown if exceeds(source) => ContentFit::Contain,
		ContentFit::ScaleDown => ContentFit::None,
		other => other,
	};

	let content = match mode {
		ContentFit::Fill => target,
		ContentFit::Contain => {
			let contained = scaled(source, (target.width / source.width).min(target.height / source.height));
			// Rounding may overshoot the box by an ulp.
			Size::new(contained.width.min(target.width), contained.height.min(target.height))
		}
		ContentFit::Cover => scaled(source, (target.width / source.width).max(target.height / source.height)),
		ContentFit::None | ContentFit::ScaleDown => source,
	};
	let clipped = mode != ContentFit::Contain && exceeds(content);

	Some(FittedImage {
		frame,
		content: Some(content),
		clipped,
	})
}

fn derive_axes(image_box: ImageBox, intrinsic: Option<Size>) -> ImageBox {
	match (image_box.width, image_box.height, intrinsic) {
		(None, Some(height), Some(source)) => ImageBox {
			width: Some(height * source.width / source.height),
			height: Some(height),
		},
		(Some(width), None, Some(source)) => ImageBox {
			width: Some(width),
			height: Some(width * source.height / source.width),
		},
		(None, None, Some(source)) => ImageBox {
			width: Some(source.width),
			height: Some(source.height),
		},
		_ => image_box,
	}
}

fn scaled(size: Size, factor: f64) -> Size {
	Size::new(size.width * factor, size.height * factor)
}

/// Per-card layout state: the canonical config plus the latest container
/// measurement.
#[derive(Debug, Clone)]
pub struct ImageLayout {
	config: CanonicalConfig,
	measured: Option<Size>,
}

impl ImageLayout {
	pub fn new(config: CanonicalConfig) -> Self {
		Self { config, measured: None }
	}

	/// Records a new container measurement and returns the recomputed frame.
	/// Later measurements replace earlier ones.
	pub fn on_measure(&mut self, size: Size) -> ImageFrame {
		self.measured = Some(size);
		self.frame()
	}

	pub fn measured(&self) -> Option<Size> {
		self.measured
	}

	pub fn frame(&self) -> ImageFrame {
		resolve(&self.config, self.measured)
	}

	pub fn place(&self, intrinsic: Option<Size>) -> Option<ImagePlacement> {
		place(&self.config, self.measured, intrinsic)
	}

	pub fn insets(&self) -> EdgeInsets {
		self.config.insets()
	}

	pub fn config(&self) -> &CanonicalConfig {
		&self.config
	}
}

#[cfg(test)]
mod tests {
	use liveact_protocol::{CanonicalPadding, ImagePosition};

	use super::*;

	fn sizing(width: Option<Dimension>, height: Option<Dimension>) -> ImageSizing {
		ImageSizing { width, height }
	}

	fn config(width: Option<Dimension>, height: Option<Dimension>, fit: ContentFit) -> CanonicalConfig {
		CanonicalConfig {
			image_sizing: sizing(width, height),
			content_fit: Some(fit),
			..Default::default()
		}
	}

	#[test]
	fn fill_half_of_measured_container() {
		let config = config(Some(Dimension::Percent(50.0)), Some(Dimension::Percent(50.0)), ContentFit::Fill);
		let placement = place(&config, Some(Size::new(200.0, 100.0)), None).unwrap();

		assert_eq!(placement.image.frame.width, Some(100.0));
		assert_eq!(placement.image.frame.height, Some(50.0));
		assert_eq!(placement.image.content, Some(Size::new(100.0, 50.0)));
	}

	#[test]
	fn defaults_without_size_or_measurement() {
		let frame = resolve(&CanonicalConfig::default(), None);
		assert_eq!(frame.width, Some(DEFAULT_IMAGE_SIZE));
		assert_eq!(frame.height, Some(DEFAULT_IMAGE_SIZE));
		assert_eq!(frame.alignment.side, HorizontalSide::Left);
		assert_eq!(frame.alignment.vertical, ImageAlign::Center);
		assert!(!frame.alignment.stretch);
	}

	#[test]
	fn resolve_is_idempotent() {
		let config = config(Some(Dimension::Percent(30.0)), None, ContentFit::Cover);
		let measured = Some(Size::new(320.0, 90.0));
		assert_eq!(resolve(&config, measured), resolve(&config, measured));
		let intrinsic = Some(Size::new(40.0, 20.0));
		assert_eq!(place(&config, measured, intrinsic), place(&config, measured, intrinsic));
	}

	#[test]
	fn percent_without_measurement_uses_default_edge() {
		let image_box = resolve_box(&sizing(Some(Dimension::Percent(50.0)), None), None);
		assert_eq!(image_box.width, Some(32.0));
		assert_eq!(image_box.height, None);
	}

	#[test]
	fn percent_is_clamped() {
		let image_box = resolve_box(
			&sizing(Some(Dimension::Percent(150.0)), Some(Dimension::Percent(-10.0))),
			Some(Size::new(100.0, 100.0)),
		);
		assert_eq!(image_box.width, Some(100.0));
		assert_eq!(image_box.height, Some(0.0));
	}

	#[test]
	fn unusable_measurement_counts_as_absent() {
		let sizing = sizing(Some(Dimension::Percent(100.0)), Some(Dimension::Points(10.0)));
		for measured in [Size::new(0.0, 50.0), Size::new(f64::NAN, 50.0), Size::new(-1.0, -1.0)] {
			assert_eq!(resolve_box(&sizing, Some(measured)).width, Some(DEFAULT_IMAGE_SIZE));
		}
	}

	#[test]
	fn scale_down_small_source_matches_none() {
		let image_box = ImageBox {
			width: Some(64.0),
			height: Some(64.0),
		};
		let small = Some(Size::new(20.0, 10.0));

		let scale_down = fit(image_box, ContentFit::ScaleDown, small);
		assert_eq!(scale_down, fit(image_box, ContentFit::None, small));
		assert_eq!(scale_down.unwrap().content, Some(Size::new(20.0, 10.0)));
	}

	#[test]
	fn scale_down_large_source_matches_contain() {
		let image_box = ImageBox {
			width: Some(50.0),
			height: Some(50.0),
		};
		let large = Some(Size::new(200.0, 100.0));

		let fitted = fit(image_box, ContentFit::ScaleDown, large).unwrap();
		assert_eq!(Some(fitted), fit(image_box, ContentFit::Contain, large));
		assert_eq!(fitted.content, Some(Size::new(50.0, 25.0)));
		assert!(!fitted.clipped);
	}

	#[test]
	fn contain_stays_inside_box_despite_rounding() {
		let image_box = ImageBox {
			width: Some(100.0),
			height: Some(100.0),
		};
		let fitted = fit(image_box, ContentFit::Contain, Some(Size::new(1.0, 11.0))).unwrap();
		let content = fitted.content.unwrap();

		assert_eq!(content.height, 100.0);
		assert!((content.width - 100.0 / 11.0).abs() < 1e-9);
		assert!(!fitted.clipped);

		let scaled_down = fit(image_box, ContentFit::ScaleDown, Some(Size::new(10.0, 110.0))).unwrap();
		assert!(scaled_down.content.unwrap().height <= 100.0);
		assert!(!scaled_down.clipped);
	}

	#[test]
	fn scale_down_without_intrinsic_is_skipped() {
		assert_eq!(fit(ImageBox::default(), ContentFit::ScaleDown, None), None);
	}

	#[test]
	fn cover_clips_overflow() {
		let image_box = ImageBox {
			width: Some(100.0),
			height: Some(50.0),
		};
		let fitted = fit(image_box, ContentFit::Cover, Some(Size::new(40.0, 40.0))).unwrap();
		assert_eq!(fitted.content, Some(Size::new(100.0, 100.0)));
		assert!(fitted.clipped);
	}

	#[test]
	fn none_clips_large_source() {
		let image_box = ImageBox {
			width: Some(10.0),
			height: Some(10.0),
		};
		let fitted = fit(image_box, ContentFit::None, Some(Size::new(30.0, 5.0))).unwrap();
		assert_eq!(fitted.content, Some(Size::new(30.0, 5.0)));
		assert!(fitted.clipped);
	}

	#[test]
	fn unresolved_axis_follows_aspect_ratio() {
		let image_box = resolve_box(&sizing(Some(Dimension::Points(80.0)), None), None);
		assert_eq!(image_box.height, None);

		let fitted = fit(image_box, ContentFit::Contain, Some(Size::new(40.0, 20.0))).unwrap();
		assert_eq!(fitted.frame.height, Some(40.0));
		assert_eq!(fitted.content, Some(Size::new(80.0, 40.0)));

		let unknown = fit(image_box, ContentFit::Contain, None).unwrap();
		assert_eq!(unknown.frame.height, None);
		assert_eq!(unknown.content, None);
	}

	#[test]
	fn layout_uses_latest_measurement() {
		let mut layout = ImageLayout::new(CanonicalConfig {
			image_sizing: sizing(Some(Dimension::Percent(50.0)), Some(Dimension::Percent(100.0))),
			image_position: Some(ImagePosition::RightStretch),
			padding: Some(CanonicalPadding::Uniform(8.0)),
			..Default::default()
		});
		assert_eq!(layout.frame().width, Some(32.0));

		layout.on_measure(Size::new(100.0, 40.0));
		let frame = layout.on_measure(Size::new(300.0, 80.0));
		assert_eq!(frame.width, Some(150.0));
		assert_eq!(frame.height, Some(80.0));
		assert_eq!(frame.alignment.side, HorizontalSide::Right);
		assert!(frame.alignment.stretch);
		assert_eq!(layout.insets(), EdgeInsets::uniform(8.0));
	}
}
