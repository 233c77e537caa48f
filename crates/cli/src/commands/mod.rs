mod layout;
mod normalize;
pub mod simulate;
mod token;

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use liveact::ActivityConfig;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use crate::output::{CommandResult, OutputFormat, print_result};

pub async fn dispatch(cli: Cli, format: OutputFormat) -> Result<()> {
	match cli.command {
		Commands::Normalize { config } => {
			let data = normalize::execute(&config)?;
			print_result(&CommandResult::success("normalize", data), format);
		}
		Commands::Layout(args) => {
			let data = layout::execute(&args)?;
			print_result(&CommandResult::success("layout", data), format);
		}
		Commands::Token(args) => {
			let data = token::execute(&args);
			print_result(&CommandResult::success("token", data), format);
		}
		Commands::Simulate(args) => {
			let data = simulate::execute(&args).await?;
			print_result(&CommandResult::success("simulate", data), format);
		}
	}
	Ok(())
}

/// Loads a host configuration from inline JSON, stdin (`-`) or a file.
pub(crate) fn read_config(source: &str) -> Result<ActivityConfig> {
	let raw = if source.trim_start().starts_with('{') {
		source.to_string()
	} else if source == "-" {
		let mut buf = String::new();
		std::io::stdin().read_to_string(&mut buf)?;
		buf
	} else {
		let path = Path::new(source);
		std::fs::read_to_string(path).with_context(|| format!("failed to read config {}", path.display()))?
	};
	Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn inline_config_is_parsed() {
		let config = read_config(r#"{ "imageSize": { "width": "50%" }, "contentFit": "cover" }"#).unwrap();
		assert!(config.image_size.is_some());
		assert!(config.content_fit.is_some());
	}

	#[test]
	fn missing_file_names_path() {
		let err = read_config("/nonexistent/liveact.json").unwrap_err();
		assert!(format!("{err:#}").contains("/nonexistent/liveact.json"));
	}
}
