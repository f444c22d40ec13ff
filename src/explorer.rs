//! Session state around the graph store: what is loading, what is selected,
//! which language the graph is in.
//!
//! Fetching is split into `begin_*` (synchronous, hands out a request),
//! `run_*` (async, talks to the provider) and `complete_*` (synchronous,
//! applies the result). Requests carry a [`Ticket`]; seeding, translating and
//! resetting invalidate every outstanding ticket so late answers for an old
//! graph are dropped instead of applied.

use std::collections::HashMap;

use log::{debug, info};

use crate::graph::{GraphStore, relabeled_id};
use crate::provider::{ArticleProvider, TitleError, is_valid_language_code, url_language, url_to_title};

/// Generation a request was issued in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

/// What the page should show besides the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
	/// Nothing searched yet, or reset.
	Idle,
	/// A search or translation is in flight.
	Loading,
	/// A graph is shown.
	Viewing,
	/// The last input was rejected.
	Error(String),
}

/// Links to fetch for a new root article.
#[derive(Clone, Debug)]
pub struct SearchRequest {
	/// Generation the request was issued in.
	pub ticket: Ticket,
	/// Canonical title of the root.
	pub title: String,
	/// Wikipedia subdomain to query.
	pub language: String,
}

/// Answer to a [`SearchRequest`].
#[derive(Clone, Debug)]
pub struct SearchResult {
	/// Copied from the request.
	pub ticket: Ticket,
	/// Root title the graph is seeded with.
	pub title: String,
	/// Outgoing links, empty when the fetch failed.
	pub links: Vec<String>,
}

/// More links for a node already in the graph.
#[derive(Clone, Debug)]
pub struct ExpandRequest {
	/// Current generation; expanding does not invalidate anything.
	pub ticket: Ticket,
	/// Id of the node to grow from.
	pub node: String,
	/// Wikipedia subdomain to query.
	pub language: String,
}

/// Answer to an [`ExpandRequest`].
#[derive(Clone, Debug)]
pub struct ExpandResult {
	/// Copied from the request.
	pub ticket: Ticket,
	/// Node the links hang off.
	pub node: String,
	/// Outgoing links, empty when the fetch failed.
	pub links: Vec<String>,
}

/// Intro text for the selected node.
#[derive(Clone, Debug)]
pub struct SummaryRequest {
	/// Current generation.
	pub ticket: Ticket,
	/// Selected title.
	pub title: String,
	/// Wikipedia subdomain to query.
	pub language: String,
}

/// Answer to a [`SummaryRequest`].
#[derive(Clone, Debug)]
pub struct SummaryResult {
	/// Copied from the request.
	pub ticket: Ticket,
	/// Title the text belongs to; dropped if the selection moved on.
	pub title: String,
	/// Plain-text extract, empty when none was found.
	pub text: String,
}

/// Every node title, to be translated into another language.
#[derive(Clone, Debug)]
pub struct TranslateRequest {
	/// Fresh generation; older requests are stale from here on.
	pub ticket: Ticket,
	/// All node ids in insertion order.
	pub titles: Vec<String>,
	/// Looked up on its own when the batch misses it.
	pub root: Option<String>,
	/// Language the titles are in.
	pub source: String,
	/// Language to translate into.
	pub target: String,
}

/// Answer to a [`TranslateRequest`].
#[derive(Clone, Debug)]
pub struct TranslateResult {
	/// Copied from the request.
	pub ticket: Ticket,
	/// Language the graph is in once applied.
	pub target: String,
	/// Source title to translated title. Titles without an entry keep their id.
	pub mapping: HashMap<String, String>,
}

/// One browsing session: the graph plus selection, language and request bookkeeping.
#[derive(Clone, Debug)]
pub struct Explorer {
	store: GraphStore,
	phase: Phase,
	language: String,
	domain: String,
	generation: u64,
	selected: Option<String>,
	summary: Option<String>,
	expanding: Option<String>,
}

impl Explorer {
	/// Idle session searching `language` on `domain` (e.g. `wikipedia.org`).
	pub fn new(language: impl Into<String>, domain: impl Into<String>) -> Self {
		Self {
			store: GraphStore::new(),
			phase: Phase::Idle,
			language: language.into(),
			domain: domain.into(),
			generation: 0,
			selected: None,
			summary: None,
			expanding: None,
		}
	}

	fn ticket(&self) -> Ticket {
		Ticket(self.generation)
	}

	fn invalidate(&mut self) -> Ticket {
		self.generation += 1;
		self.expanding = None;
		self.ticket()
	}

	fn is_current(&self, ticket: Ticket, what: &str) -> bool {
		let current = ticket == self.ticket();
		if !current {
			debug!("dropping stale {what} response");
		}
		current
	}

	/// The graph and its counters.
	pub fn store(&self) -> &GraphStore {
		&self.store
	}

	/// What the page should show next to the graph.
	pub fn phase(&self) -> &Phase {
		&self.phase
	}

	/// Language the current graph (or the next search) uses.
	pub fn language(&self) -> &str {
		&self.language
	}

	/// Id of the selected node.
	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// Summary of the selected node once it has arrived.
	pub fn summary(&self) -> Option<&str> {
		self.summary.as_deref()
	}

	/// Node whose links are being fetched.
	pub fn expanding(&self) -> Option<&str> {
		self.expanding.as_deref()
	}

	/// Change the language used for the next search. Only while nothing is shown.
	pub fn set_language(&mut self, language: &str) -> bool {
		if !self.store.graph().is_empty() || !is_valid_language_code(language) {
			return false;
		}
		self.language = language.to_owned();
		true
	}

	/// Start a search for a title or article link. Invalid input moves to `Error`.
	pub fn begin_search(&mut self, input: &str) -> Result<SearchRequest, TitleError> {
		let title = match url_to_title(input, &self.domain) {
			Ok(title) => title,
			Err(err) => {
				self.phase = Phase::Error(err.to_string());
				return Err(err);
			}
		};
		if let Some(lang) = url_language(input, &self.domain) {
			self.language = lang;
		}
		let ticket = self.invalidate();
		self.phase = Phase::Loading;
		self.selected = None;
		self.summary = None;
		info!("searching {title:?} on {}", self.language);
		Ok(SearchRequest {
			ticket,
			title,
			language: self.language.clone(),
		})
	}

	/// Seed the graph from a search answer. Returns false for stale answers.
	pub fn complete_search(&mut self, result: SearchResult) -> bool {
		if !self.is_current(result.ticket, "search") {
			return false;
		}
		info!("seeding {:?} with {} links", result.title, result.links.len());
		self.store.seed(&result.title, &result.links);
		self.phase = Phase::Viewing;
		true
	}

	/// Ask for more links of `node`. `None` when the node is unknown or already
	/// being expanded.
	pub fn begin_expand(&mut self, node: &str) -> Option<ExpandRequest> {
		if !self.store.graph().contains(node) || self.expanding.as_deref() == Some(node) {
			return None;
		}
		self.expanding = Some(node.to_owned());
		Some(ExpandRequest {
			ticket: self.ticket(),
			node: node.to_owned(),
			language: self.language.clone(),
		})
	}

	/// Merge fetched links into the graph. Returns whether anything was added.
	pub fn complete_expand(&mut self, result: ExpandResult) -> bool {
		if !self.is_current(result.ticket, "expand") {
			return false;
		}
		if self.expanding.as_deref() == Some(result.node.as_str()) {
			self.expanding = None;
		}
		let outcome = self.store.expand(&result.node, &result.links);
		debug!(
			"expanded {:?}: +{} nodes, +{} links",
			result.node, outcome.nodes_added, outcome.links_added
		);
		!outcome.is_noop()
	}

	/// Select a node and request its summary.
	pub fn select(&mut self, node: &str) -> Option<SummaryRequest> {
		if !self.store.graph().contains(node) {
			return None;
		}
		self.selected = Some(node.to_owned());
		self.summary = None;
		Some(SummaryRequest {
			ticket: self.ticket(),
			title: node.to_owned(),
			language: self.language.clone(),
		})
	}

	/// Store a summary if it is current and still for the selected node.
	pub fn complete_summary(&mut self, result: SummaryResult) -> bool {
		if !self.is_current(result.ticket, "summary") || self.selected.as_deref() != Some(result.title.as_str()) {
			return false;
		}
		self.summary = (!result.text.is_empty()).then_some(result.text);
		true
	}

	/// Translate every node into `target`. `None` when there is nothing to do.
	pub fn begin_translate(&mut self, target: &str) -> Option<TranslateRequest> {
		if target == self.language || !is_valid_language_code(target) || self.store.graph().is_empty() {
			return None;
		}
		let graph = self.store.graph();
		let titles: Vec<String> = graph.nodes().iter().map(|n| n.id.clone()).collect();
		let root = graph
			.nodes()
			.iter()
			.find(|n| n.is_root())
			.map(|n| n.id.clone());
		let ticket = self.invalidate();
		self.phase = Phase::Loading;
		Some(TranslateRequest {
			ticket,
			titles,
			root,
			source: self.language.clone(),
			target: target.to_owned(),
		})
	}

	/// Relabel the graph into the target language and carry the selection over.
	/// Returns false for stale answers.
	pub fn complete_translate(&mut self, result: TranslateResult) -> bool {
		if !self.is_current(result.ticket, "translation") {
			return false;
		}
		info!(
			"relabeling graph into {} ({} of {} titles translated)",
			result.target,
			result.mapping.len(),
			self.store.graph().len()
		);
		self.store.relabel(&result.mapping);
		self.selected = self
			.selected
			.take()
			.map(|id| relabeled_id(&result.mapping, &id));
		self.summary = None;
		self.language = result.target;
		self.phase = Phase::Viewing;
		true
	}

	/// Drop the graph and go back to idle. Outstanding requests become stale.
	pub fn reset(&mut self) {
		self.invalidate();
		self.store.clear();
		self.phase = Phase::Idle;
		self.selected = None;
		self.summary = None;
	}
}

/// Fetch the links a search asked for.
pub async fn run_search<P: ArticleProvider>(provider: &P, request: SearchRequest) -> SearchResult {
	let links = provider
		.fetch_outgoing_links(&request.title, &request.language)
		.await;
	SearchResult {
		ticket: request.ticket,
		title: request.title,
		links,
	}
}

/// Fetch the links an expansion asked for.
pub async fn run_expand<P: ArticleProvider>(provider: &P, request: ExpandRequest) -> ExpandResult {
	let links = provider
		.fetch_outgoing_links(&request.node, &request.language)
		.await;
	ExpandResult {
		ticket: request.ticket,
		node: request.node,
		links,
	}
}

/// Fetch the summary a selection asked for.
pub async fn run_summary<P: ArticleProvider>(provider: &P, request: SummaryRequest) -> SummaryResult {
	let text = provider.fetch_summary(&request.title, &request.language).await;
	SummaryResult {
		ticket: request.ticket,
		title: request.title,
		text,
	}
}

/// Batch-translate all titles, retrying the root alone if its batch came back without it.
pub async fn run_translate<P: ArticleProvider>(provider: &P, request: TranslateRequest) -> TranslateResult {
	let mut mapping = provider
		.fetch_batch_translations(&request.titles, &request.source, &request.target)
		.await;
	if let Some(root) = request.root.filter(|r| !mapping.contains_key(r)) {
		if let Some(translated) = provider
			.fetch_translated_title(&root, &request.source, &request.target)
			.await
		{
			mapping.insert(root, translated);
		}
	}
	TranslateResult {
		ticket: request.ticket,
		target: request.target,
		mapping,
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use futures::executor::block_on;

	use super::*;

	#[derive(Default)]
	struct FakeProvider {
		links: HashMap<String, Vec<String>>,
		french: HashMap<String, String>,
		batch_misses_root: bool,
		single_lookups: Cell<usize>,
	}

	impl FakeProvider {
		fn einstein() -> Self {
			let links = HashMap::from([
				(
					"Albert Einstein".to_string(),
					vec!["Physics".to_string(), "Nobel Prize".to_string(), "Germany".to_string()],
				),
				(
					"Physics".to_string(),
					vec!["Quantum Mechanics".to_string(), "Nobel Prize".to_string()],
				),
			]);
			let french = HashMap::from([
				("Albert Einstein".to_string(), "Albert Einstein".to_string()),
				("Physics".to_string(), "Physique".to_string()),
				("Germany".to_string(), "Allemagne".to_string()),
			]);
			Self {
				links,
				french,
				..Self::default()
			}
		}
	}

	impl ArticleProvider for FakeProvider {
		async fn fetch_outgoing_links(&self, title: &str, _lang: &str) -> Vec<String> {
			self.links.get(title).cloned().unwrap_or_default()
		}

		async fn fetch_summary(&self, title: &str, _lang: &str) -> String {
			if title == "Physics" {
				"Physics is the natural science of matter.".into()
			} else {
				String::new()
			}
		}

		async fn fetch_translated_title(&self, title: &str, _source: &str, _target: &str) -> Option<String> {
			self.single_lookups.set(self.single_lookups.get() + 1);
			self.french.get(title).cloned()
		}

		async fn fetch_batch_translations(
			&self,
			titles: &[String],
			_source: &str,
			_target: &str,
		) -> HashMap<String, String> {
			titles
				.iter()
				.filter(|t| !(self.batch_misses_root && t.as_str() == "Albert Einstein"))
				.filter_map(|t| Some((t.clone(), self.french.get(t)?.clone())))
				.collect()
		}
	}

	fn explorer() -> Explorer {
		Explorer::new("en", "wikipedia.org")
	}

	fn searched(provider: &FakeProvider) -> Explorer {
		let mut explorer = explorer();
		let request = explorer.begin_search("Albert Einstein").unwrap();
		assert_eq!(explorer.phase(), &Phase::Loading);
		assert!(explorer.complete_search(block_on(run_search(provider, request))));
		explorer
	}

	#[test]
	fn search_seeds_the_graph() {
		let explorer = searched(&FakeProvider::einstein());
		assert_eq!(explorer.phase(), &Phase::Viewing);
		assert_eq!(explorer.store().graph().len(), 4);
		assert_eq!(explorer.store().graph().links().len(), 3);
	}

	#[test]
	fn invalid_input_is_reported_not_thrown() {
		let mut explorer = explorer();
		assert!(explorer.begin_search("https://example.com/x").is_err());
		assert!(matches!(explorer.phase(), Phase::Error(_)));
		assert!(explorer.store().graph().is_empty());
	}

	#[test]
	fn url_input_switches_language() {
		let mut explorer = explorer();
		let request = explorer
			.begin_search("https://de.wikipedia.org/wiki/Albert_Einstein")
			.unwrap();
		assert_eq!(request.language, "de");
		assert_eq!(request.title, "Albert Einstein");
		assert_eq!(explorer.language(), "de");
	}

	#[test]
	fn expand_grows_and_duplicate_click_is_ignored() {
		let provider = FakeProvider::einstein();
		let mut explorer = searched(&provider);
		let request = explorer.begin_expand("Physics").unwrap();
		assert!(explorer.begin_expand("Physics").is_none());
		assert_eq!(explorer.expanding(), Some("Physics"));
		assert!(explorer.complete_expand(block_on(run_expand(&provider, request))));
		assert_eq!(explorer.store().graph().len(), 5);
		assert!(explorer.expanding().is_none());
		assert!(explorer.begin_expand("Unknown Title").is_none());
	}

	#[test]
	fn late_expand_after_new_search_is_dropped() {
		let provider = FakeProvider::einstein();
		let mut explorer = searched(&provider);
		let stale = explorer.begin_expand("Physics").unwrap();
		let search = explorer.begin_search("Albert Einstein").unwrap();
		assert!(!explorer.complete_expand(block_on(run_expand(&provider, stale))));
		assert!(explorer.complete_search(block_on(run_search(&provider, search))));
		assert_eq!(explorer.store().graph().len(), 4);
	}

	#[test]
	fn summary_only_lands_on_the_current_selection() {
		let provider = FakeProvider::einstein();
		let mut explorer = searched(&provider);
		let physics = explorer.select("Physics").unwrap();
		let germany = explorer.select("Germany").unwrap();
		assert!(!explorer.complete_summary(block_on(run_summary(&provider, physics))));
		assert!(explorer.complete_summary(block_on(run_summary(&provider, germany))));
		// Empty text means "no summary".
		assert_eq!(explorer.summary(), None);

		let physics = explorer.select("Physics").unwrap();
		assert!(explorer.complete_summary(block_on(run_summary(&provider, physics))));
		assert!(explorer.summary().unwrap().starts_with("Physics is"));
	}

	#[test]
	fn translate_relabels_and_keeps_selection() {
		let provider = FakeProvider::einstein();
		let mut explorer = searched(&provider);
		explorer.select("Physics");
		assert!(explorer.begin_translate("en").is_none());
		let request = explorer.begin_translate("fr").unwrap();
		assert_eq!(request.titles.len(), 4);
		assert!(explorer.complete_translate(block_on(run_translate(&provider, request))));

		let graph = explorer.store().graph();
		assert!(graph.contains("Physique"));
		assert!(graph.contains("Allemagne"));
		assert!(graph.contains("Nobel Prize"));
		assert_eq!(explorer.selected(), Some("Physique"));
		assert_eq!(explorer.language(), "fr");
		assert_eq!(explorer.phase(), &Phase::Viewing);
	}

	#[test]
	fn padded_or_blank_translations_keep_selection_in_graph() {
		let provider = FakeProvider::einstein();
		for (translated, expected) in [(" Physique ", "Physique"), ("", "Physics"), ("   ", "Physics")] {
			let mut explorer = searched(&provider);
			explorer.select("Physics");
			let request = explorer.begin_translate("fr").unwrap();
			explorer.complete_translate(TranslateResult {
				ticket: request.ticket,
				target: "fr".into(),
				mapping: HashMap::from([("Physics".to_string(), translated.to_string())]),
			});
			assert_eq!(explorer.selected(), Some(expected));
			assert!(explorer.store().graph().contains(expected));
		}
	}

	#[test]
	fn translate_retries_missing_root() {
		let provider = FakeProvider {
			batch_misses_root: true,
			..FakeProvider::einstein()
		};
		let mut explorer = searched(&provider);
		let request = explorer.begin_translate("fr").unwrap();
		let result = block_on(run_translate(&provider, request));
		assert_eq!(provider.single_lookups.get(), 1);
		assert!(result.mapping.contains_key("Albert Einstein"));
	}

	#[test]
	fn reset_returns_to_idle_and_invalidates() {
		let provider = FakeProvider::einstein();
		let mut explorer = searched(&provider);
		let pending = explorer.begin_expand("Physics").unwrap();
		explorer.reset();
		assert_eq!(explorer.phase(), &Phase::Idle);
		assert!(explorer.store().graph().is_empty());
		assert!(!explorer.complete_expand(block_on(run_expand(&provider, pending))));
		assert!(explorer.set_language("fr"));
	}
}
