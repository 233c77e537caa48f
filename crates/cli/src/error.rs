use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error(transparent)]
	Activity(#[from] liveact::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let code = match self {
			CliError::InvalidInput(_) => ErrorCode::InvalidInput,
			CliError::Activity(err) => activity_error_code(err),
			CliError::Io(_) => ErrorCode::IoError,
			CliError::Json(_) => ErrorCode::InvalidInput,
			CliError::Anyhow(err) => {
				if let Some(err) = err.downcast_ref::<liveact::Error>() {
					activity_error_code(err)
				} else if err.downcast_ref::<std::io::Error>().is_some() {
					ErrorCode::IoError
				} else {
					ErrorCode::InternalError
				}
			}
		};

		CommandError {
			code,
			message: format!("{self:#}"),
		}
	}
}

fn activity_error_code(err: &liveact::Error) -> ErrorCode {
	use liveact::Error;

	match err {
		Error::InvalidConfiguration(_) => ErrorCode::InvalidConfiguration,
		Error::SessionNotFound(_) => ErrorCode::SessionNotFound,
		Error::PlatformRequestFailed { .. } => ErrorCode::PlatformFailed,
		err if err.is_unsupported() => ErrorCode::Unsupported,
		_ => ErrorCode::InternalError,
	}
}
