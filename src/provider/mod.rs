//! Article data provider: outgoing links, summaries and cross-language titles.
//!
//! Every fetch is total. Network and parse failures are logged and come back
//! as the empty result, so callers only ever deal with "nothing found".

use std::collections::HashMap;

use thiserror::Error;
use wasm_bindgen::JsValue;

mod batch;
mod title;
mod wikipedia;

pub use batch::{MAX_BATCH, translate_in_batches};
pub use title::{TitleError, is_valid_language_code, url_language, url_to_title};
pub use wikipedia::{
	LinksPage, WikipediaClient, langlinks_url, links_url, parse_links_page, parse_summary,
	parse_translations, summary_url,
};

/// Failure inside a provider call, before it is flattened to an empty result.
#[derive(Debug, Error)]
pub enum ProviderError {
	/// Request URL could not be built.
	#[error("invalid request url: {0}")]
	Url(#[from] url::ParseError),
	/// Language code failed validation.
	#[error("unsupported language code {0:?}")]
	Language(String),
	/// `fetch` rejected or the body could not be read.
	#[error("network error: {0}")]
	Network(String),
	/// Non-2xx response.
	#[error("unexpected HTTP status {0}")]
	Status(u16),
	/// Body was not the JSON we expected.
	#[error("malformed response: {0}")]
	Decode(#[from] serde_json::Error),
	/// The API answered with an `error` object.
	#[error("api error {code}: {info}")]
	Api {
		/// Machine-readable error code.
		code: String,
		/// Human-readable message.
		info: String,
	},
	/// Not running in a browser.
	#[error("no browser window available")]
	NoWindow,
}

impl ProviderError {
	pub(crate) fn from_js(value: JsValue) -> Self {
		Self::Network(format!("{value:?}"))
	}
}

/// The data source the explorer pulls articles from.
#[allow(async_fn_in_trait)]
pub trait ArticleProvider {
	/// Distinct article titles linked from `title`; empty when unknown or on error.
	async fn fetch_outgoing_links(&self, title: &str, lang: &str) -> Vec<String>;

	/// Plain-text lead of `title`; empty when there is none.
	async fn fetch_summary(&self, title: &str, lang: &str) -> String;

	/// Title of the `target` language version of `title`, if one exists.
	async fn fetch_translated_title(&self, title: &str, source: &str, target: &str) -> Option<String>;

	/// Original title to translated title. Titles without a translation are absent.
	async fn fetch_batch_translations(
		&self,
		titles: &[String],
		source: &str,
		target: &str,
	) -> HashMap<String, String>;
}
