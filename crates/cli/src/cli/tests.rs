use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn parse_layout_command() {
	let args = vec![
		"liveact",
		"layout",
		"card.json",
		"--container",
		"300x120",
		"--intrinsic",
		"240X60",
	];
	let cli = Cli::try_parse_from(args).unwrap();

	match cli.command {
		Commands::Layout(args) => {
			assert_eq!(args.config, "card.json");
			assert_eq!(args.container, Some(Size::new(300.0, 120.0)));
			assert_eq!(args.intrinsic, Some(Size::new(240.0, 60.0)));
			assert_eq!(args.scheme, None);
		}
		_ => panic!("Expected Layout command"),
	}
}

#[test]
fn parse_simulate_defaults() {
	let cli = Cli::try_parse_from(["liveact", "simulate", "flow.json"]).unwrap();

	assert_eq!(cli.format, OutputFormat::Json);
	match cli.command {
		Commands::Simulate(args) => {
			assert_eq!(args.scenario, PathBuf::from("flow.json"));
			assert_eq!(args.os_version, OsVersion::new(17, 2));
			assert!(!args.unsupported);
			assert!(!args.no_push);
			assert_eq!(args.attributes_name, "LiveActivity");
			assert_eq!(args.settle_ms, 25);
		}
		_ => panic!("Expected Simulate command"),
	}
}

#[test]
fn parse_global_flags_after_subcommand() {
	let cli = Cli::try_parse_from(["liveact", "token", "10", "255", "-vv", "-f", "text"]).unwrap();

	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.format, OutputFormat::Text);
	match cli.command {
		Commands::Token(args) => assert_eq!(args.bytes, vec![10, 255]),
		_ => panic!("Expected Token command"),
	}
}

#[test]
fn token_requires_input() {
	assert!(Cli::try_parse_from(["liveact", "token"]).is_err());
	assert!(Cli::try_parse_from(["liveact", "token", "256"]).is_err());
	assert!(Cli::try_parse_from(["liveact", "token", "1", "--utf8", "x"]).is_err());
}

#[test]
fn unsupported_conflicts_with_explicit_version() {
	let result = Cli::try_parse_from(["liveact", "simulate", "f.json", "--unsupported", "--os-version", "18.0"]);
	assert!(result.is_err());
}

#[test]
fn size_parser_rejects_garbage() {
	assert!(parse_size("300").is_err());
	assert!(parse_size("ax2").is_err());
	assert_eq!(parse_size(" 12 x 8 ").unwrap(), Size::new(12.0, 8.0));
}

#[test]
fn parse_layout_scheme() {
	let cli = Cli::try_parse_from(["liveact", "layout", "{}", "--scheme", "myapp"]).unwrap();

	match cli.command {
		Commands::Layout(args) => assert_eq!(args.scheme.as_deref(), Some("myapp")),
		_ => panic!("Expected Layout command"),
	}
}
