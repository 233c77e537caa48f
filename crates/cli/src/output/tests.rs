use super::*;

#[test]
fn success_envelope_omits_error() {
	let result = CommandResult::success("token", "0aff".to_string());
	let json = serde_json::to_value(&result).unwrap();

	assert_eq!(json["ok"], true);
	assert_eq!(json["command"], "token");
	assert_eq!(json["data"], "0aff");
	assert!(json.get("error").is_none());
}

#[test]
fn failure_envelope_carries_code() {
	let result: CommandResult<()> = CommandResult::failure(
		"normalize",
		CommandError {
			code: ErrorCode::InvalidConfiguration,
			message: "bad width".into(),
		},
	);
	let json = serde_json::to_value(&result).unwrap();

	assert_eq!(json["ok"], false);
	assert!(json.get("data").is_none());
	assert_eq!(json["error"]["code"], "INVALID_CONFIGURATION");
}

#[test]
fn error_code_display() {
	assert_eq!(ErrorCode::SessionNotFound.to_string(), "SESSION_NOT_FOUND");
	assert_eq!(ErrorCode::PlatformFailed.to_string(), "PLATFORM_FAILED");
}

#[test]
fn output_format_parse() {
	assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
	assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
	assert!("toon".parse::<OutputFormat>().is_err());
}

#[test]
fn output_format_display() {
	assert_eq!(OutputFormat::Ndjson.to_string(), "ndjson");
	assert_eq!(OutputFormat::default().to_string(), "json");
}
