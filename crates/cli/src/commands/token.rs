use liveact_protocol::encode_token;

use crate::cli::TokenArgs;

pub(super) fn execute(args: &TokenArgs) -> String {
	match &args.utf8 {
		Some(text) => encode_token(text.as_bytes()),
		None => encode_token(&args.bytes),
	}
}
