//! MediaWiki action API and REST summary endpoint.
//!
//! Request building and response parsing are pure; only [`WikipediaClient`]
//! touches the browser `fetch`.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::Deserialize;
use url::Url;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use super::batch::translate_in_batches;
use super::title::is_valid_language_code;
use super::{ArticleProvider, ProviderError};
use crate::config::ProviderConfig;

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
	#[serde(default)]
	query: Option<Query>,
	#[serde(rename = "continue", default)]
	cont: Option<Continue>,
	#[serde(default)]
	error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
struct Query {
	#[serde(default)]
	normalized: Vec<Rename>,
	#[serde(default)]
	redirects: Vec<Rename>,
	#[serde(default)]
	pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Rename {
	from: String,
	to: String,
}

#[derive(Debug, Deserialize)]
struct Page {
	title: String,
	#[serde(default)]
	missing: bool,
	#[serde(default)]
	links: Vec<PageLink>,
	#[serde(default)]
	langlinks: Vec<LangLink>,
}

#[derive(Debug, Deserialize)]
struct PageLink {
	#[serde(default)]
	ns: i64,
	title: String,
}

#[derive(Debug, Deserialize)]
struct LangLink {
	lang: String,
	title: String,
}

#[derive(Debug, Deserialize)]
struct Continue {
	plcontinue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
	code: String,
	#[serde(default)]
	info: String,
}

#[derive(Debug, Deserialize)]
struct Summary {
	#[serde(default)]
	extract: String,
}

/// One page of an outgoing link listing.
#[derive(Debug, Default, PartialEq)]
pub struct LinksPage {
	/// Article-namespace titles on this page.
	pub titles: Vec<String>,
	/// `plcontinue` token for the next page.
	pub next: Option<String>,
}

fn decode_query(body: &str) -> Result<QueryResponse, ProviderError> {
	let response: QueryResponse = serde_json::from_str(body)?;
	if let Some(err) = response.error {
		return Err(ProviderError::Api {
			code: err.code,
			info: err.info,
		});
	}
	Ok(response)
}

/// Article-namespace link titles of the queried page plus the continuation token.
pub fn parse_links_page(body: &str) -> Result<LinksPage, ProviderError> {
	let response = decode_query(body)?;
	let titles = response
		.query
		.unwrap_or_default()
		.pages
		.into_iter()
		.filter(|p| !p.missing)
		.flat_map(|p| p.links)
		.filter(|l| l.ns == 0)
		.map(|l| l.title)
		.collect();
	Ok(LinksPage {
		titles,
		next: response.cont.and_then(|c| c.plcontinue),
	})
}

/// Trimmed plain-text extract of a REST summary response.
pub fn parse_summary(body: &str) -> Result<String, ProviderError> {
	let summary: Summary = serde_json::from_str(body)?;
	Ok(summary.extract.trim().to_owned())
}

/// Map each requested title to its `target` language title.
///
/// Requested titles are followed through the `normalized` and `redirects`
/// tables before the page lookup, so the keys are exactly what was asked for.
pub fn parse_translations(
	body: &str,
	requested: &[String],
	target: &str,
) -> Result<HashMap<String, String>, ProviderError> {
	let query = decode_query(body)?.query.unwrap_or_default();
	let normalized: HashMap<&str, &str> = query
		.normalized
		.iter()
		.map(|r| (r.from.as_str(), r.to.as_str()))
		.collect();
	let redirects: HashMap<&str, &str> = query
		.redirects
		.iter()
		.map(|r| (r.from.as_str(), r.to.as_str()))
		.collect();
	let translated: HashMap<&str, &str> = query
		.pages
		.iter()
		.filter_map(|p| {
			let link = p.langlinks.iter().find(|l| l.lang == target)?;
			Some((p.title.as_str(), link.title.as_str()))
		})
		.collect();

	Ok(requested
		.iter()
		.filter_map(|original| {
			let mut title = original.as_str();
			title = normalized.get(title).copied().unwrap_or(title);
			title = redirects.get(title).copied().unwrap_or(title);
			translated
				.get(title)
				.map(|t| (original.clone(), (*t).to_owned()))
		})
		.collect())
}

fn api_url(domain: &str, lang: &str) -> Result<Url, ProviderError> {
	if !is_valid_language_code(lang) {
		return Err(ProviderError::Language(lang.to_owned()));
	}
	Ok(Url::parse(&format!("https://{lang}.{domain}/w/api.php"))?)
}

fn base_query(url: &mut Url) {
	url.query_pairs_mut()
		.append_pair("action", "query")
		.append_pair("format", "json")
		.append_pair("formatversion", "2")
		.append_pair("origin", "*")
		.append_pair("redirects", "1");
}

/// Query for one page of outgoing article links of `title`.
pub fn links_url(
	domain: &str,
	lang: &str,
	title: &str,
	cont: Option<&str>,
) -> Result<Url, ProviderError> {
	let mut url = api_url(domain, lang)?;
	base_query(&mut url);
	url.query_pairs_mut()
		.append_pair("prop", "links")
		.append_pair("plnamespace", "0")
		.append_pair("pllimit", "max")
		.append_pair("titles", title);
	if let Some(cont) = cont {
		url.query_pairs_mut().append_pair("plcontinue", cont);
	}
	Ok(url)
}

/// Query for the `target` language titles of a batch of `source` titles.
pub fn langlinks_url(
	domain: &str,
	source: &str,
	target: &str,
	titles: &[String],
) -> Result<Url, ProviderError> {
	if !is_valid_language_code(target) {
		return Err(ProviderError::Language(target.to_owned()));
	}
	let mut url = api_url(domain, source)?;
	base_query(&mut url);
	url.query_pairs_mut()
		.append_pair("prop", "langlinks")
		.append_pair("lllang", target)
		.append_pair("lllimit", "max")
		.append_pair("titles", &titles.join("|"));
	Ok(url)
}

/// REST summary endpoint for `title`.
pub fn summary_url(domain: &str, lang: &str, title: &str) -> Result<Url, ProviderError> {
	if !is_valid_language_code(lang) {
		return Err(ProviderError::Language(lang.to_owned()));
	}
	let slug = urlencoding::encode(&title.replace(' ', "_")).into_owned();
	Ok(Url::parse(&format!(
		"https://{lang}.{domain}/api/rest_v1/page/summary/{slug}"
	))?)
}

/// Provider backed by the public wiki through the browser `fetch`.
#[derive(Clone, Debug, Default)]
pub struct WikipediaClient {
	config: ProviderConfig,
}

impl WikipediaClient {
	/// Client for the configured wiki.
	pub fn new(config: ProviderConfig) -> Self {
		Self { config }
	}

	/// Settings the client was built with.
	pub fn config(&self) -> &ProviderConfig {
		&self.config
	}

	async fn get_text(&self, url: &Url) -> Result<String, ProviderError> {
		debug!("GET {url}");
		let window = web_sys::window().ok_or(ProviderError::NoWindow)?;
		let response = JsFuture::from(window.fetch_with_str(url.as_str()))
			.await
			.map_err(ProviderError::from_js)?;
		let response: Response = response.dyn_into().map_err(ProviderError::from_js)?;
		if !response.ok() {
			return Err(ProviderError::Status(response.status()));
		}
		let text = JsFuture::from(response.text().map_err(ProviderError::from_js)?)
			.await
			.map_err(ProviderError::from_js)?;
		text.as_string()
			.ok_or_else(|| ProviderError::Network("response body is not text".into()))
	}

	async fn try_outgoing_links(&self, title: &str, lang: &str) -> Result<Vec<String>, ProviderError> {
		let mut seen = HashSet::new();
		let mut titles = Vec::new();
		let mut cont: Option<String> = None;
		for _ in 0..self.config.max_link_pages {
			let url = links_url(&self.config.domain, lang, title, cont.as_deref())?;
			let page = parse_links_page(&self.get_text(&url).await?)?;
			titles.extend(page.titles.into_iter().filter(|t| seen.insert(t.clone())));
			match page.next {
				Some(next) => cont = Some(next),
				None => return Ok(titles),
			}
		}
		warn!(
			"link listing for {title:?} truncated after {} pages",
			self.config.max_link_pages
		);
		Ok(titles)
	}

	async fn try_summary(&self, title: &str, lang: &str) -> Result<String, ProviderError> {
		let url = summary_url(&self.config.domain, lang, title)?;
		parse_summary(&self.get_text(&url).await?)
	}

	async fn try_translations(
		&self,
		titles: &[String],
		source: &str,
		target: &str,
	) -> Result<HashMap<String, String>, ProviderError> {
		let url = langlinks_url(&self.config.domain, source, target, titles)?;
		parse_translations(&self.get_text(&url).await?, titles, target)
	}
}

impl ArticleProvider for WikipediaClient {
	async fn fetch_outgoing_links(&self, title: &str, lang: &str) -> Vec<String> {
		self.try_outgoing_links(title, lang)
			.await
			.unwrap_or_else(|err| {
				warn!("fetching links of {title:?} failed: {err}");
				Vec::new()
			})
	}

	async fn fetch_summary(&self, title: &str, lang: &str) -> String {
		self.try_summary(title, lang).await.unwrap_or_else(|err| {
			warn!("fetching summary of {title:?} failed: {err}");
			String::new()
		})
	}

	async fn fetch_translated_title(&self, title: &str, source: &str, target: &str) -> Option<String> {
		let titles = [title.to_owned()];
		match self.try_translations(&titles, source, target).await {
			Ok(mut found) => found.remove(title),
			Err(err) => {
				warn!("translating {title:?} to {target} failed: {err}");
				None
			}
		}
	}

	async fn fetch_batch_translations(
		&self,
		titles: &[String],
		source: &str,
		target: &str,
	) -> HashMap<String, String> {
		translate_in_batches(titles, self.config.batch_size, |chunk| async move {
			self.try_translations(&chunk, source, target).await
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const DOMAIN: &str = "wikipedia.org";

	#[test]
	fn links_page_keeps_article_namespace_and_continuation() {
		let body = r#"{
			"continue": {"plcontinue": "736|0|Nobel_Prize", "continue": "||"},
			"query": {"pages": [{
				"pageid": 736, "ns": 0, "title": "Albert Einstein",
				"links": [
					{"ns": 0, "title": "Physics"},
					{"ns": 0, "title": "Germany"},
					{"ns": 14, "title": "Category:Physicists"}
				]
			}]}
		}"#;
		let page = parse_links_page(body).unwrap();
		assert_eq!(page.titles, vec!["Physics", "Germany"]);
		assert_eq!(page.next.as_deref(), Some("736|0|Nobel_Prize"));
	}

	#[test]
	fn missing_page_has_no_links() {
		let body = r#"{"query": {"pages": [{"ns": 0, "title": "Nope", "missing": true}]}}"#;
		assert_eq!(parse_links_page(body).unwrap(), LinksPage::default());
	}

	#[test]
	fn api_errors_and_garbage_are_errors() {
		let body = r#"{"error": {"code": "badvalue", "info": "Unrecognized value"}}"#;
		assert!(matches!(parse_links_page(body), Err(ProviderError::Api { .. })));
		assert!(matches!(parse_links_page("<html>"), Err(ProviderError::Decode(_))));
	}

	#[test]
	fn summary_extract() {
		let body = r#"{"title": "Physics", "extract": "Physics is the natural science. "}"#;
		assert_eq!(parse_summary(body).unwrap(), "Physics is the natural science.");
		assert_eq!(parse_summary(r#"{"title": "X"}"#).unwrap(), "");
	}

	#[test]
	fn translations_follow_normalization_and_redirects() {
		let body = r#"{"query": {
			"normalized": [{"fromencoded": false, "from": "physics", "to": "Physics"}],
			"redirects": [{"from": "Einstein", "to": "Albert Einstein"}],
			"pages": [
				{"title": "Physics", "langlinks": [{"lang": "fr", "title": "Physique"}]},
				{"title": "Albert Einstein", "langlinks": [{"lang": "fr", "title": "Albert Einstein"}]},
				{"title": "Germany", "langlinks": []},
				{"title": "Nowhere", "missing": true}
			]
		}}"#;
		let requested: Vec<String> = ["physics", "Einstein", "Germany", "Nowhere"]
			.into_iter()
			.map(String::from)
			.collect();
		let found = parse_translations(body, &requested, "fr").unwrap();
		assert_eq!(found.len(), 2);
		assert_eq!(found.get("physics").map(String::as_str), Some("Physique"));
		assert_eq!(found.get("Einstein").map(String::as_str), Some("Albert Einstein"));
		assert!(!found.contains_key("Germany"));
	}

	#[test]
	fn request_urls() {
		let url = links_url(DOMAIN, "en", "Albert Einstein", Some("736|0|X")).unwrap();
		assert_eq!(url.host_str(), Some("en.wikipedia.org"));
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();
		assert_eq!(pairs["titles"], "Albert Einstein");
		assert_eq!(pairs["plcontinue"], "736|0|X");
		assert_eq!(pairs["origin"], "*");

		let titles = vec!["A".to_string(), "B".to_string()];
		let url = langlinks_url(DOMAIN, "en", "fr", &titles).unwrap();
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();
		assert_eq!(pairs["titles"], "A|B");
		assert_eq!(pairs["lllang"], "fr");

		let url = summary_url(DOMAIN, "en", "AC/DC band").unwrap();
		assert!(url.as_str().ends_with("/page/summary/AC%2FDC_band"));

		assert!(matches!(
			links_url(DOMAIN, "evil.com/", "X", None),
			Err(ProviderError::Language(_))
		));
	}
}
