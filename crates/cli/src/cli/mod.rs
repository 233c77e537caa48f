#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use liveact::geometry::Size;
use liveact_runtime::OsVersion;

use crate::output::OutputFormat;
use crate::styles::cli_styles;

#[derive(Parser, Debug)]
#[command(name = "liveact")]
#[command(about = "Live activity configuration, layout and session simulation")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: json (default), ndjson, or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Normalize a host configuration into its canonical stored form
	Normalize {
		/// Configuration file, `-` for stdin, or inline JSON
		config: String,
	},

	/// Resolve the image frame and placement for a measured container
	Layout(LayoutArgs),

	/// Hex-encode a delivery token
	Token(TokenArgs),

	/// Run a scripted session against the in-memory platform
	Simulate(SimulateArgs),
}

#[derive(clap::Args, Debug)]
pub struct LayoutArgs {
	/// Configuration file, `-` for stdin, or inline JSON
	pub config: String,

	/// Measured container size, `WIDTHxHEIGHT`
	#[arg(long, value_parser = parse_size)]
	pub container: Option<Size>,

	/// Intrinsic image size, `WIDTHxHEIGHT`
	#[arg(long, value_parser = parse_size)]
	pub intrinsic: Option<Size>,

	/// App URL scheme; with the config's `deepLinkUrl` prints the tap-through URL
	#[arg(long)]
	pub scheme: Option<String>,
}

#[derive(clap::Args, Debug)]
#[command(group = clap::ArgGroup::new("input").required(true).args(["bytes", "utf8"]))]
pub struct TokenArgs {
	/// Token bytes as decimal values
	#[arg(value_name = "BYTE")]
	pub bytes: Vec<u8>,

	/// Encode the UTF-8 bytes of this string instead
	#[arg(long, conflicts_with = "bytes")]
	pub utf8: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SimulateArgs {
	/// Scenario file (JSON list of steps)
	pub scenario: PathBuf,

	/// Simulated OS version
	#[arg(long, value_parser = OsVersion::from_str, default_value = "17.2")]
	pub os_version: OsVersion,

	/// Simulate a platform without live activity support
	#[arg(long, conflicts_with = "os_version")]
	pub unsupported: bool,

	/// Simulate live activities switched off by the user
	#[arg(long)]
	pub disabled: bool,

	/// Disable push notifications on the simulated device
	#[arg(long)]
	pub no_push: bool,

	/// Attributes name attached to started sessions
	#[arg(long, default_value = liveact::session::DEFAULT_ATTRIBUTES_NAME)]
	pub attributes_name: String,

	/// Time allowed for events to settle after each step, in milliseconds
	#[arg(long, default_value_t = 25)]
	pub settle_ms: u64,
}

/// Parses `WIDTHxHEIGHT` (e.g. `320x120`).
pub fn parse_size(raw: &str) -> Result<Size, String> {
	let (width, height) = raw
		.split_once(['x', 'X'])
		.ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
	let width: f64 = width.trim().parse().map_err(|_| format!("invalid width in '{raw}'"))?;
	let height: f64 = height.trim().parse().map_err(|_| format!("invalid height in '{raw}'"))?;
	Ok(Size::new(width, height))
}
