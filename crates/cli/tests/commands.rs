//! Runs the `liveact` binary and checks its result envelopes.

use std::process::{Command, Output};

use serde_json::Value;

fn liveact(args: &[&str]) -> (Output, Value) {
	let output = Command::new(env!("CARGO_BIN_EXE_liveact"))
		.args(["-f", "ndjson"])
		.args(args)
		.output()
		.expect("failed to execute liveact");

	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let json = serde_json::from_str(stdout.trim()).unwrap_or_else(|_| serde_json::json!({ "raw": stdout }));
	(output, json)
}

#[test]
fn normalize_inline_config() {
	let (output, json) = liveact(&["normalize", r#"{"padding":{"vertical":4},"imageSize":{"height":"25%"}}"#]);

	assert!(output.status.success());
	assert_eq!(json["ok"], true);
	assert_eq!(json["command"], "normalize");
	assert_eq!(json["data"]["paddingDetails"]["vertical"], 4.0);
	assert_eq!(json["data"]["imageHeightPercent"], 25.0);
}

#[test]
fn normalize_reports_invalid_percent() {
	let (output, json) = liveact(&["normalize", r#"{"imageSize":{"width":"abc%"}}"#]);

	assert!(!output.status.success());
	assert_eq!(json["ok"], false);
	assert_eq!(json["error"]["code"], "INVALID_CONFIGURATION");
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("INVALID_CONFIGURATION"), "stderr: {stderr}");
}

#[test]
fn layout_with_measurement() {
	let (output, json) = liveact(&[
		"layout",
		r#"{"imageSize":{"width":"40%","height":"50%"},"contentFit":"contain","imagePosition":"rightStretch"}"#,
		"--container",
		"300x120",
		"--intrinsic",
		"240x60",
	]);

	assert!(output.status.success());
	let data = &json["data"];
	assert_eq!(data["frame"]["width"], 120.0);
	assert_eq!(data["frame"]["height"], 60.0);
	assert_eq!(data["frame"]["alignment"]["side"], "right");
	assert_eq!(data["frame"]["alignment"]["stretch"], true);
	assert_eq!(data["placement"]["image"]["content"]["width"], 120.0);
	assert_eq!(data["placement"]["image"]["content"]["height"], 30.0);
	assert_eq!(data["insets"]["top"], 16.0);
}

#[test]
fn layout_prints_widget_url() {
	let (output, json) = liveact(&["layout", r#"{"deepLinkUrl":"orders/7?tab=map"}"#, "--scheme", "shop"]);

	assert!(output.status.success());
	assert_eq!(json["data"]["widgetUrl"], "shop://orders/7?tab=map");
}

#[test]
fn token_encodes_bytes() {
	let (output, json) = liveact(&["token", "0", "1", "171"]);

	assert!(output.status.success());
	assert_eq!(json["data"], "0001ab");
}

#[test]
fn missing_scenario_file_fails() {
	let (output, json) = liveact(&["simulate", "/nonexistent/scenario.json"]);

	assert!(!output.status.success());
	assert_eq!(json["error"]["code"], "IO_ERROR");
}
