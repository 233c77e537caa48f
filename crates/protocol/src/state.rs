//! Mutable content of a live activity and the OS-observed lifecycle state.

use serde::{Deserialize, Serialize};

/// Content state supplied by the host on start, update and end.
///
/// Every update replaces the whole state; there are no field-level patches,
/// so unchanged fields must be sent again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentState {
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subtitle: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub progress_bar: Option<ProgressBar>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dynamic_island_image_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub team_logo_left: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub team_logo_right: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub team_score_left: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub team_score_right: Option<String>,
}

impl ContentState {
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			..Default::default()
		}
	}

	pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
		self.subtitle = Some(subtitle.into());
		self
	}

	pub fn with_progress_bar(mut self, progress_bar: ProgressBar) -> Self {
		self.progress_bar = Some(progress_bar);
		self
	}

	pub fn with_image(mut self, image_name: impl Into<String>) -> Self {
		self.image_name = Some(image_name.into());
		self
	}

	pub fn with_dynamic_island_image(mut self, image_name: impl Into<String>) -> Self {
		self.dynamic_island_image_name = Some(image_name.into());
		self
	}

	/// Flattens the progress bar into the separate `date` / `progress` fields
	/// committed to the OS.
	pub fn to_native(&self) -> NativeContentState {
		let (date, progress) = match self.progress_bar {
			Some(ProgressBar::Date { date }) => (Some(date), None),
			Some(ProgressBar::Progress { progress }) => (None, Some(progress)),
			None => (None, None),
		};

		NativeContentState {
			title: self.title.clone(),
			subtitle: self.subtitle.clone(),
			date,
			progress,
			image_name: self.image_name.clone(),
			dynamic_island_image_name: self.dynamic_island_image_name.clone(),
			team_logo_left: self.team_logo_left.clone(),
			team_logo_right: self.team_logo_right.clone(),
			team_score_left: self.team_score_left.clone(),
			team_score_right: self.team_score_right.clone(),
		}
	}
}

/// Either a countdown timer or a determinate progress value, never both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressBar {
	/// Timer end time as epoch milliseconds.
	Date { date: f64 },
	/// Progress fraction in `0.0..=1.0`.
	Progress { progress: f64 },
}

/// Content state in the form committed to the OS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeContentState {
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subtitle: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub date: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub progress: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dynamic_island_image_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub team_logo_left: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub team_logo_right: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub team_score_left: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub team_score_right: Option<String>,
}

/// Image reference slots in a [`NativeContentState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
	Image,
	DynamicIslandImage,
	TeamLogoLeft,
	TeamLogoRight,
}

impl ImageSlot {
	pub const ALL: [ImageSlot; 4] = [
		ImageSlot::Image,
		ImageSlot::DynamicIslandImage,
		ImageSlot::TeamLogoLeft,
		ImageSlot::TeamLogoRight,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Image => "imageName",
			Self::DynamicIslandImage => "dynamicIslandImageName",
			Self::TeamLogoLeft => "teamLogoLeft",
			Self::TeamLogoRight => "teamLogoRight",
		}
	}
}

impl NativeContentState {
	pub fn image(&self, slot: ImageSlot) -> Option<&str> {
		match slot {
			ImageSlot::Image => self.image_name.as_deref(),
			ImageSlot::DynamicIslandImage => self.dynamic_island_image_name.as_deref(),
			ImageSlot::TeamLogoLeft => self.team_logo_left.as_deref(),
			ImageSlot::TeamLogoRight => self.team_logo_right.as_deref(),
		}
	}

	pub fn image_mut(&mut self, slot: ImageSlot) -> &mut Option<String> {
		match slot {
			ImageSlot::Image => &mut self.image_name,
			ImageSlot::DynamicIslandImage => &mut self.dynamic_island_image_name,
			ImageSlot::TeamLogoLeft => &mut self.team_logo_left,
			ImageSlot::TeamLogoRight => &mut self.team_logo_right,
		}
	}

	/// Image references present in this state, in slot order.
	pub fn image_references(&self) -> Vec<(ImageSlot, String)> {
		ImageSlot::ALL
			.into_iter()
			.filter_map(|slot| self.image(slot).map(|r| (slot, r.to_string())))
			.collect()
	}
}

/// Lifecycle state as observed from the OS. This crate never drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityState {
	Pending,
	Active,
	Stale,
	Dismissed,
	Ended,
}

impl ActivityState {
	/// Returns `true` once the session is gone from the user's surfaces.
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Dismissed | Self::Ended)
	}
}

impl std::fmt::Display for ActivityState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Pending => write!(f, "pending"),
			Self::Active => write!(f, "active"),
			Self::Stale => write!(f, "stale"),
			Self::Dismissed => write!(f, "dismissed"),
			Self::Ended => write!(f, "ended"),
		}
	}
}

/// When an ended session leaves the lock screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DismissalPolicy {
	#[default]
	Immediate,
	/// Let the OS decide (typically up to four hours).
	Default,
	/// Remove at the given epoch milliseconds.
	After { date: f64 },
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn progress_bar_variants_from_json() {
		let timer: ContentState = serde_json::from_value(json!({
			"title": "Pizza",
			"progressBar": { "date": 1700000000000.0 }
		}))
		.unwrap();
		assert_eq!(timer.progress_bar, Some(ProgressBar::Date { date: 1_700_000_000_000.0 }));

		let progress: ContentState = serde_json::from_value(json!({
			"title": "Upload",
			"progressBar": { "progress": 0.25 }
		}))
		.unwrap();
		assert_eq!(progress.progress_bar, Some(ProgressBar::Progress { progress: 0.25 }));
	}

	#[test]
	fn to_native_flattens_progress() {
		let state = ContentState::new("Upload")
			.with_subtitle("2 of 8")
			.with_progress_bar(ProgressBar::Progress { progress: 0.25 })
			.with_image("logo");

		let native = state.to_native();
		assert_eq!(native.title, "Upload");
		assert_eq!(native.subtitle.as_deref(), Some("2 of 8"));
		assert_eq!(native.progress, Some(0.25));
		assert_eq!(native.date, None);
		assert_eq!(native.image_name.as_deref(), Some("logo"));
	}

	#[test]
	fn image_references_in_slot_order() {
		let native = NativeContentState {
			title: "Match".into(),
			team_logo_right: Some("away".into()),
			image_name: Some("league".into()),
			..Default::default()
		};

		assert_eq!(
			native.image_references(),
			vec![
				(ImageSlot::Image, "league".to_string()),
				(ImageSlot::TeamLogoRight, "away".to_string()),
			]
		);
	}

	#[test]
	fn activity_state_wire_names() {
		assert_eq!(serde_json::to_value(ActivityState::Stale).unwrap(), json!("stale"));
		assert_eq!(ActivityState::Dismissed.to_string(), "dismissed");
		assert!(ActivityState::Ended.is_terminal());
		assert!(!ActivityState::Pending.is_terminal());
	}

	#[test]
	fn dismissal_policy_default_is_immediate() {
		assert_eq!(DismissalPolicy::default(), DismissalPolicy::Immediate);
		assert_eq!(serde_json::to_value(DismissalPolicy::Immediate).unwrap(), json!({ "type": "immediate" }));
	}
}
