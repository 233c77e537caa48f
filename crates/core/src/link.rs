//! Tap-through URL for the rendered card.

use url::Url;

/// Builds `scheme://deep_link`, the URL opened when the card is tapped.
///
/// Leading slashes on `deep_link` are dropped so `"/orders/7"` and
/// `"orders/7"` produce the same URL. Returns `None` when either part is
/// missing or the result does not parse.
pub fn widget_url(scheme: Option<&str>, deep_link: Option<&str>) -> Option<Url> {
	let scheme = scheme.map(str::trim).filter(|s| !s.is_empty())?;
	let link = deep_link.map(|l| l.trim().trim_start_matches('/')).filter(|l| !l.is_empty())?;

	match Url::parse(&format!("{scheme}://{link}")) {
		Ok(url) => Some(url),
		Err(e) => {
			tracing::debug!(scheme, link, error = %e, "Ignoring invalid widget URL");
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn joins_scheme_and_link() {
		let url = widget_url(Some("myapp"), Some("/orders/7?tab=map")).unwrap();
		assert_eq!(url.as_str(), "myapp://orders/7?tab=map");
		assert_eq!(widget_url(Some("myapp"), Some("orders/7")).unwrap().as_str(), "myapp://orders/7");
	}

	#[test]
	fn missing_parts_yield_none() {
		assert_eq!(widget_url(None, Some("orders")), None);
		assert_eq!(widget_url(Some("myapp"), None), None);
		assert_eq!(widget_url(Some("myapp"), Some("///")), None);
	}

	#[test]
	fn invalid_scheme_yields_none() {
		assert_eq!(widget_url(Some("my app"), Some("orders")), None);
	}
}
