//! End-to-end session flows against the in-memory platform.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use liveact::geometry::Size;
use liveact::{ActivityConfig, ActivityManager, ActivityState, ContentState, ImageLayout, ManagerOptions, StateChange};
use liveact_runtime::{
	AssetResolver, Capabilities, Commit, ImageHandle, MemoryAssets, MemoryPlatform, PlatformResult,
};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::Notify;

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_env_filter("liveact=debug").try_init();
}

async fn eventually(mut condition: impl FnMut() -> bool) {
	for _ in 0..200 {
		if condition() {
			return;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	panic!("condition not met within 2s");
}

/// Resolves `name` to `resolved/<name>` once the gate is opened.
#[derive(Default)]
struct GatedAssets {
	gate: Notify,
	calls: Mutex<Vec<String>>,
}

#[async_trait]
impl AssetResolver for GatedAssets {
	async fn resolve(&self, reference: &str) -> PlatformResult<ImageHandle> {
		self.calls.lock().push(reference.to_string());
		self.gate.notified().await;
		Ok(ImageHandle(format!("resolved/{reference}")))
	}
}

#[tokio::test]
async fn late_resolution_never_overwrites_newer_update() {
	init_tracing();
	let platform = Arc::new(MemoryPlatform::new());
	let assets = Arc::new(GatedAssets::default());
	let manager = ActivityManager::new(platform.clone(), Arc::new(Capabilities::full()), assets.clone());

	let id = manager.start(&ContentState::new("Kickoff"), None).await.unwrap();

	let first = ContentState::new("first").with_image("crest");
	let second = ContentState::new("second");
	let release = async {
		tokio::time::sleep(Duration::from_millis(50)).await;
		assets.gate.notify_one();
	};
	let (a, b, ()) = tokio::join!(manager.update(&id, &first), manager.update(&id, &second), release);
	a.unwrap();
	b.unwrap();

	assert_eq!(*assets.calls.lock(), vec!["crest".to_string()]);
	let content = platform.content(&id).unwrap();
	assert_eq!(content.title, "second");
	assert_eq!(content.image_name, None);
	assert!(
		platform
			.commits(&id)
			.iter()
			.all(|c| c.state().image_name.as_deref() != Some("resolved/crest"))
	);
}

#[tokio::test]
async fn full_session_flow_with_layout() {
	init_tracing();
	let platform = Arc::new(MemoryPlatform::new());
	let assets = Arc::new(MemoryAssets::passthrough());
	let manager = ActivityManager::with_options(
		platform.clone(),
		Arc::new(Capabilities::full()),
		assets,
		ManagerOptions::default().with_attributes_name("Delivery"),
	);

	let changes = Arc::new(Mutex::new(Vec::<StateChange>::new()));
	let sink = Arc::clone(&changes);
	let _sub = manager.on_state_change(move |change| sink.lock().push(change)).unwrap();

	let config: ActivityConfig = serde_json::from_value(json!({
		"backgroundColor": "#102030",
		"padding": { "vertical": 12 },
		"imageSize": { "width": "40%", "height": "50%" },
		"imagePosition": "right",
		"contentFit": "contain"
	}))
	.unwrap();

	let id = manager
		.start(&ContentState::new("Courier assigned").with_image("courier"), Some(&config))
		.await
		.unwrap();
	eventually(|| platform.content(&id).is_some_and(|c| c.image_name.as_deref() == Some("asset://courier"))).await;

	let attributes = platform.attributes(&id).unwrap();
	assert_eq!(attributes.name, "Delivery");

	let mut layout = ImageLayout::new(attributes.config);
	let frame = layout.on_measure(Size::new(300.0, 120.0));
	assert_eq!(frame.width, Some(120.0));
	assert_eq!(frame.height, Some(60.0));
	assert_eq!(layout.insets().top, 12.0);
	assert_eq!(layout.insets().left, 16.0);
	let placement = layout.place(Some(Size::new(240.0, 60.0))).unwrap();
	assert_eq!(placement.image.content, Some(Size::new(120.0, 30.0)));

	manager
		.update(&id, &ContentState::new("On the way").with_subtitle("5 min"))
		.await
		.unwrap();
	eventually(|| manager.session_state(&id) == Some(ActivityState::Active)).await;
	platform.set_state(&id, ActivityState::Stale);
	eventually(|| changes.lock().iter().any(|c| c.activity_state == ActivityState::Stale)).await;

	manager.end(&id, &ContentState::new("Delivered")).await.unwrap();
	eventually(|| changes.lock().iter().any(|c| c.activity_state == ActivityState::Ended)).await;

	assert!(matches!(platform.commits(&id).last(), Some(Commit::End(state, _)) if state.title == "Delivered"));
	assert!(manager.tracked_sessions().is_empty());
	assert_eq!(changes.lock().last().unwrap().activity_name, "Delivery");

	manager.shutdown().await;
}
