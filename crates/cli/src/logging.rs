use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Filter used when `RUST_LOG` is unset.
///
/// 0 = errors only (asset fallbacks stay quiet)
/// 1 (-v) = session start, update and end at info, library warnings visible
/// 2+ (-vv) = bridge and lane debug output
pub fn default_filter(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "error",
		1 => "warn,liveact=info,liveact_cli=info",
		_ => "debug",
	}
}

pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}

#[cfg(test)]
mod tests {
	use std::io;
	use std::sync::{Arc, Mutex};

	use serde_json::json;

	use super::*;
	use crate::commands::simulate::{Device, Scenario, run};

	#[derive(Clone, Default)]
	struct Captured(Arc<Mutex<Vec<u8>>>);

	impl io::Write for Captured {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0.lock().unwrap().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	#[tokio::test]
	async fn single_verbose_shows_session_lifecycle() {
		let captured = Captured::default();
		let writer = captured.clone();
		let subscriber = tracing_subscriber::fmt()
			.with_env_filter(EnvFilter::new(default_filter(1)))
			.with_writer(move || writer.clone())
			.with_ansi(false)
			.finish();
		let _guard = tracing::subscriber::set_default(subscriber);

		let scenario: Scenario = serde_json::from_value(json!({
			"steps": [
				{ "op": "start", "state": { "title": "a" } },
				{ "op": "update", "state": { "title": "b" } },
				{ "op": "end", "state": { "title": "c" } }
			]
		}))
		.unwrap();
		run(scenario, &Device::default()).await.unwrap();

		let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
		assert!(logs.contains("Session requested"), "logs: {logs}");
		assert!(logs.contains("Update queued"), "logs: {logs}");
		assert!(logs.contains("End queued"), "logs: {logs}");
		assert!(!logs.contains("Session lane started"), "logs: {logs}");
	}

	#[test]
	fn quiet_and_debug_filters() {
		assert_eq!(default_filter(0), "error");
		assert_eq!(default_filter(3), "debug");
	}
}
