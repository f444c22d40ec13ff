use thiserror::Error;
use url::Url;

/// Characters MediaWiki never allows in a page title.
const ILLEGAL_CHARS: &[char] = &['#', '<', '>', '[', ']', '|', '{', '}'];

/// Why user input could not be turned into an article title.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TitleError {
	/// Blank input.
	#[error("enter an article title or link")]
	Empty,
	/// A URL on some other host.
	#[error("{0} is not a {1} address")]
	ForeignHost(String, String),
	/// A wiki URL outside `/wiki/`.
	#[error("link does not point at an article")]
	NotAnArticle,
	/// URL that could not be parsed or decoded.
	#[error("malformed link: {0}")]
	Malformed(String),
	/// Title with characters MediaWiki rejects.
	#[error("title contains characters that are not allowed: {0:?}")]
	IllegalCharacters(String),
}

/// Resolve a bare title or an article URL on `domain` to a canonical-looking title.
///
/// Accepts `Albert_Einstein`, `Albert Einstein`,
/// `https://en.wikipedia.org/wiki/Albert_Einstein#Life`, the mobile host, and
/// `/w/index.php?title=...` links. Anything else is an error.
pub fn url_to_title(input: &str, domain: &str) -> Result<String, TitleError> {
	let input = input.trim();
	if input.is_empty() {
		return Err(TitleError::Empty);
	}
	match as_url(input, domain) {
		Some(candidate) => title_from_url(&candidate, domain),
		None => clean_title(input),
	}
}

/// Language subdomain of an article URL, e.g. `de` for `https://de.m.wikipedia.org/...`.
pub fn url_language(input: &str, domain: &str) -> Option<String> {
	let url = Url::parse(&as_url(input.trim(), domain)?).ok()?;
	let host = url.host_str()?.to_ascii_lowercase();
	let prefix = host.strip_suffix(domain)?.strip_suffix('.')?;
	let lang = prefix.split('.').next()?;
	(lang != "www" && is_valid_language_code(lang)).then(|| lang.to_owned())
}

/// Wiki language codes: lowercase ASCII letters and inner hyphens, 2 to 12 long.
pub fn is_valid_language_code(code: &str) -> bool {
	(2..=12).contains(&code.len())
		&& !code.starts_with('-')
		&& !code.ends_with('-')
		&& code.chars().all(|c| c.is_ascii_lowercase() || c == '-')
}

/// `Some(url)` when the input should be read as a link rather than a title.
fn as_url(input: &str, domain: &str) -> Option<String> {
	if input.contains("://") {
		return Some(input.to_owned());
	}
	let host = input.split('/').next()?.to_ascii_lowercase();
	let on_domain = host == domain || host.ends_with(&format!(".{domain}"));
	(on_domain || host.starts_with("www.")).then(|| format!("https://{input}"))
}

fn title_from_url(candidate: &str, domain: &str) -> Result<String, TitleError> {
	let url = Url::parse(candidate).map_err(|e| TitleError::Malformed(e.to_string()))?;
	if !matches!(url.scheme(), "http" | "https") {
		return Err(TitleError::Malformed(format!("unsupported scheme {}", url.scheme())));
	}
	let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
	if host != domain && !host.ends_with(&format!(".{domain}")) {
		return Err(TitleError::ForeignHost(host, domain.to_owned()));
	}

	let raw = if let Some(rest) = url.path().strip_prefix("/wiki/") {
		urlencoding::decode(rest)
			.map_err(|e| TitleError::Malformed(e.to_string()))?
			.into_owned()
	} else if url.path() == "/w/index.php" {
		url.query_pairs()
			.find(|(k, _)| k == "title")
			.map(|(_, v)| v.into_owned())
			.ok_or(TitleError::NotAnArticle)?
	} else {
		return Err(TitleError::NotAnArticle);
	};
	clean_title(&raw).map_err(|e| match e {
		TitleError::Empty => TitleError::NotAnArticle,
		other => other,
	})
}

fn clean_title(raw: &str) -> Result<String, TitleError> {
	let title = raw.replace('_', " ");
	let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
	if title.is_empty() {
		return Err(TitleError::Empty);
	}
	if title.contains(ILLEGAL_CHARS) {
		return Err(TitleError::IllegalCharacters(title));
	}
	Ok(title)
}
