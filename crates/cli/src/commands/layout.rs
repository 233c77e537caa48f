use liveact::geometry::{ImageFrame, ImageLayout, ImagePlacement};
use liveact_protocol::EdgeInsets;
use serde::Serialize;

use super::read_config;
use crate::cli::LayoutArgs;
use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutData {
	pub frame: ImageFrame,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub placement: Option<ImagePlacement>,
	pub insets: EdgeInsets,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub widget_url: Option<String>,
}

pub(super) fn execute(args: &LayoutArgs) -> Result<LayoutData> {
	let config = liveact::normalize(&read_config(&args.config)?)?;
	let mut layout = ImageLayout::new(config);
	if let Some(container) = args.container {
		layout.on_measure(container);
	}

	let frame = layout.frame();
	let placement = layout.place(args.intrinsic);
	tracing::info!(
		width = ?frame.width,
		height = ?frame.height,
		placed = placement.is_some(),
		"Layout resolved"
	);

	let widget_url = liveact::widget_url(args.scheme.as_deref(), layout.config().deep_link_url.as_deref());
	if args.scheme.is_some() && widget_url.is_none() {
		tracing::warn!("No widget URL: deepLinkUrl missing or scheme invalid");
	}

	Ok(LayoutData {
		frame,
		placement,
		insets: layout.insets(),
		widget_url: widget_url.map(String::from),
	})
}
