use std::collections::{HashMap, HashSet};

use log::debug;

use super::types::{GraphLink, GraphNode, GraphSnapshot, LINKED_WEIGHT, ROOT_WEIGHT};

/// Node/link collection with id-unique nodes and pair-unique links.
///
/// Nodes live in an insertion-ordered arena with an id index. Links are plain
/// id pairs; a link is only inserted when both endpoints are present, so the
/// graph never holds a dangling reference.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: Vec<GraphNode>,
	index: HashMap<String, usize>,
	links: Vec<GraphLink>,
	link_keys: HashSet<(String, String)>,
}

/// What an [`Graph::expand`] call actually changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExpandOutcome {
	/// Nodes that were not in the graph before.
	pub nodes_added: usize,
	/// Links that were not in the graph before.
	pub links_added: usize,
}

impl ExpandOutcome {
	/// True when the call left the graph untouched.
	pub fn is_noop(&self) -> bool {
		self.nodes_added == 0 && self.links_added == 0
	}
}

/// Trim, drop empties and deduplicate in first-seen order.
fn distinct_titles<I, S>(titles: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut seen = HashSet::new();
	titles
		.into_iter()
		.filter_map(|t| {
			let t = t.as_ref().trim();
			(!t.is_empty() && seen.insert(t.to_owned())).then(|| t.to_owned())
		})
		.collect()
}

/// Id `id` takes under `mapping`: the trimmed translation, or `id` itself when
/// the mapping has nothing usable for it.
pub fn relabeled_id(mapping: &HashMap<String, String>, id: &str) -> String {
	match mapping.get(id).map(|t| t.trim()) {
		Some(t) if !t.is_empty() => t.to_owned(),
		_ => id.to_owned(),
	}
}

impl Graph {
	/// Empty graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// Root node (weight 2) plus one weight-1 node and one link per distinct linked title.
	pub fn seed<I, S>(root: &str, linked: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let root = root.trim();
		let mut graph = Self::new();
		graph.insert_node(root, ROOT_WEIGHT);
		for title in distinct_titles(linked) {
			if title == root {
				continue;
			}
			graph.insert_node(&title, LINKED_WEIGHT);
			graph.insert_link(root, &title);
		}
		graph
	}

	/// Union a freshly fetched outgoing link set of `from` into the graph.
	///
	/// Nothing changes unless at least one title is new to the graph. Links
	/// are added for pairs not already present whose target is either new in
	/// this call or was already in the graph.
	pub fn expand<I, S>(&mut self, from: &str, linked: I) -> ExpandOutcome
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let from = from.trim();
		if !self.contains(from) {
			debug!("expand from unknown node {from:?} ignored");
			return ExpandOutcome::default();
		}

		let titles = distinct_titles(linked);
		let fresh: HashSet<&str> = titles
			.iter()
			.map(String::as_str)
			.filter(|t| !self.contains(t))
			.collect();
		if fresh.is_empty() {
			return ExpandOutcome::default();
		}
		let existing: HashSet<&str> = titles
			.iter()
			.map(String::as_str)
			.filter(|t| self.contains(t))
			.collect();

		let mut outcome = ExpandOutcome::default();
		for title in &titles {
			if fresh.contains(title.as_str()) && self.insert_node(title, LINKED_WEIGHT) {
				outcome.nodes_added += 1;
			}
		}
		for title in &titles {
			let target = title.as_str();
			let resolvable = fresh.contains(target) || existing.contains(target);
			if resolvable && self.insert_link(from, target) {
				outcome.links_added += 1;
			}
		}
		outcome
	}

	/// New graph with every id substituted through `mapping` (identity when absent).
	///
	/// Ids that collapse onto the same translation become one node carrying the
	/// highest weight; their links are merged and self-loops dropped.
	pub fn relabel(&self, mapping: &HashMap<String, String>) -> Self {
		let translate = |id: &str| relabeled_id(mapping, id);

		let mut out = Self::new();
		for node in &self.nodes {
			let id = translate(&node.id);
			match out.index.get(&id) {
				Some(&i) => {
					let merged = &mut out.nodes[i];
					merged.weight = merged.weight.max(node.weight);
				}
				None => {
					out.insert_node(&id, node.weight);
				}
			}
		}
		for link in &self.links {
			out.insert_link(&translate(&link.source), &translate(&link.target));
		}
		out
	}

	fn insert_node(&mut self, id: &str, weight: u8) -> bool {
		if self.index.contains_key(id) {
			return false;
		}
		self.index.insert(id.to_owned(), self.nodes.len());
		self.nodes.push(GraphNode::new(id, weight));
		true
	}

	fn insert_link(&mut self, source: &str, target: &str) -> bool {
		if source == target || !self.contains(source) || !self.contains(target) {
			return false;
		}
		if !self.link_keys.insert((source.to_owned(), target.to_owned())) {
			return false;
		}
		self.links.push(GraphLink::new(source, target));
		true
	}

	/// Whether a node with this id exists.
	pub fn contains(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	/// Node with this id.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	/// Whether the directed link `source -> target` exists.
	pub fn has_link(&self, source: &str, target: &str) -> bool {
		self.link_keys
			.contains(&(source.to_owned(), target.to_owned()))
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	/// Links in insertion order.
	pub fn links(&self) -> &[GraphLink] {
		&self.links
	}

	/// Number of nodes.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Whether the graph has no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

/// The graph together with the counters the layout engine keys on.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
	graph: Graph,
	revision: u64,
	epoch: u64,
}

impl GraphStore {
	/// Empty store with both counters at zero.
	pub fn new() -> Self {
		Self::default()
	}

	/// Replace the graph with a fresh seed. Starts a new epoch.
	pub fn seed<I, S>(&mut self, root: &str, linked: I)
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.replace(Graph::seed(root, linked));
	}

	/// Grow the graph from `from` in place.
	///
	/// Bumps the revision only when something was added; the epoch stays, so the
	/// layout keeps existing coordinates.
	pub fn expand<I, S>(&mut self, from: &str, linked: I) -> ExpandOutcome
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let outcome = self.graph.expand(from, linked);
		if !outcome.is_noop() {
			self.revision += 1;
		}
		outcome
	}

	/// Rename nodes through `mapping`, merging ids that collide. Starts a new epoch.
	pub fn relabel(&mut self, mapping: &HashMap<String, String>) {
		let relabeled = self.graph.relabel(mapping);
		self.replace(relabeled);
	}

	/// Drop everything. Starts a new epoch with an empty graph.
	pub fn clear(&mut self) {
		self.replace(Graph::new());
	}

	fn replace(&mut self, graph: Graph) {
		self.graph = graph;
		self.revision += 1;
		self.epoch += 1;
	}

	/// Read-only view of the current graph.
	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	/// Bumped on every effective mutation.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// Bumped when the graph is replaced wholesale.
	pub fn epoch(&self) -> u64 {
		self.epoch
	}

	/// Owned copy of the current graph tagged with both counters.
	pub fn snapshot(&self) -> GraphSnapshot {
		GraphSnapshot {
			nodes: self.graph.nodes.clone(),
			links: self.graph.links.clone(),
			revision: self.revision,
			epoch: self.epoch,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn einstein() -> Graph {
		Graph::seed("Albert Einstein", ["Physics", "Nobel Prize", "Germany"])
	}

	#[test]
	fn seed_builds_root_and_linked_nodes() {
		let graph = einstein();
		assert_eq!(graph.len(), 4);
		assert_eq!(graph.links().len(), 3);
		assert_eq!(graph.node("Albert Einstein").map(|n| n.weight), Some(2));
		for title in ["Physics", "Nobel Prize", "Germany"] {
			assert_eq!(graph.node(title).map(|n| n.weight), Some(1));
			assert!(graph.has_link("Albert Einstein", title));
		}
	}

	#[test]
	fn seed_deduplicates_linked_titles() {
		let graph = Graph::seed("Root", ["A", "B", "A", " B ", ""]);
		assert_eq!(graph.len(), 3);
		assert_eq!(graph.links().len(), 2);
	}

	#[test]
	fn seed_without_links_is_a_single_node() {
		let graph = Graph::seed("Lonely", Vec::<String>::new());
		assert_eq!(graph.len(), 1);
		assert!(graph.links().is_empty());
	}

	#[test]
	fn seed_ignores_link_back_to_root() {
		let graph = Graph::seed("Root", ["Root", "A"]);
		assert_eq!(graph.len(), 2);
		assert_eq!(graph.node("Root").map(|n| n.weight), Some(2));
		assert!(!graph.has_link("Root", "Root"));
	}

	#[test]
	fn expand_with_known_titles_is_noop() {
		let mut graph = einstein();
		let outcome = graph.expand("Physics", ["Nobel Prize"]);
		assert!(outcome.is_noop());
		assert_eq!(graph.len(), 4);
		assert_eq!(graph.links().len(), 3);
		assert!(!graph.has_link("Physics", "Nobel Prize"));
	}

	#[test]
	fn expand_adds_one_node_and_one_link() {
		let mut graph = einstein();
		let outcome = graph.expand("Physics", ["Quantum Mechanics"]);
		assert_eq!(outcome, ExpandOutcome { nodes_added: 1, links_added: 1 });
		assert_eq!(graph.len(), 5);
		assert!(graph.has_link("Physics", "Quantum Mechanics"));
		assert_eq!(graph.node("Quantum Mechanics").map(|n| n.weight), Some(1));
	}

	#[test]
	fn expand_links_existing_targets_when_something_is_new() {
		let mut graph = einstein();
		let outcome = graph.expand("Physics", ["Germany", "Energy", "Energy"]);
		assert_eq!(outcome, ExpandOutcome { nodes_added: 1, links_added: 2 });
		assert!(graph.has_link("Physics", "Germany"));
		assert!(graph.has_link("Physics", "Energy"));
	}

	#[test]
	fn expand_is_idempotent() {
		let mut graph = einstein();
		graph.expand("Physics", ["Quantum Mechanics", "Germany"]);
		let (nodes, links) = (graph.nodes().to_vec(), graph.links().to_vec());
		assert!(graph.expand("Physics", ["Quantum Mechanics", "Germany"]).is_noop());
		assert_eq!(graph.nodes(), nodes.as_slice());
		assert_eq!(graph.links(), links.as_slice());
	}

	#[test]
	fn expand_from_missing_node_changes_nothing() {
		let mut graph = einstein();
		assert!(graph.expand("Chemistry", ["Atom"]).is_noop());
		assert!(!graph.contains("Atom"));
	}

	#[test]
	fn relabel_falls_back_to_identity() {
		let graph = einstein();
		let mapping = HashMap::from([("Physics".to_string(), "Physique".to_string())]);
		let relabeled = graph.relabel(&mapping);
		assert!(relabeled.contains("Physique"));
		assert!(!relabeled.contains("Physics"));
		assert!(relabeled.contains("Nobel Prize"));
		assert!(relabeled.contains("Germany"));
		assert!(relabeled.has_link("Albert Einstein", "Physique"));
		assert_eq!(relabeled.links().len(), 3);
	}

	#[test]
	fn relabel_merges_colliding_ids() {
		let mut graph = Graph::seed("Root", ["A", "B", "C"]);
		graph.expand("A", ["B", "D"]);
		let mapping = HashMap::from([
			("A".to_string(), "X".to_string()),
			("B".to_string(), "X".to_string()),
		]);
		let relabeled = graph.relabel(&mapping);
		let xs = relabeled.nodes().iter().filter(|n| n.id == "X").count();
		assert_eq!(xs, 1);
		assert_eq!(relabeled.len(), 4);
		// Root->A and Root->B collapse, A->B becomes a self-loop and is dropped.
		assert!(relabeled.has_link("Root", "X"));
		assert!(!relabeled.has_link("X", "X"));
		assert!(relabeled.has_link("X", "D"));
		assert_eq!(relabeled.links().len(), 3);
	}

	#[test]
	fn relabel_merge_keeps_root_weight() {
		let graph = Graph::seed("Root", ["A"]);
		let mapping = HashMap::from([("A".to_string(), "Root".to_string())]);
		let relabeled = graph.relabel(&mapping);
		assert_eq!(relabeled.len(), 1);
		assert_eq!(relabeled.node("Root").map(|n| n.weight), Some(ROOT_WEIGHT));
	}

	#[test]
	fn store_counters_track_mutations() {
		let mut store = GraphStore::new();
		store.seed("Albert Einstein", ["Physics", "Nobel Prize", "Germany"]);
		let (revision, epoch) = (store.revision(), store.epoch());

		store.expand("Physics", ["Nobel Prize"]);
		assert_eq!(store.revision(), revision);

		store.expand("Physics", ["Quantum Mechanics"]);
		assert_eq!(store.revision(), revision + 1);
		assert_eq!(store.epoch(), epoch);

		store.relabel(&HashMap::new());
		assert_eq!(store.epoch(), epoch + 1);

		store.clear();
		assert!(store.graph().is_empty());
		assert!(store.snapshot().is_empty());
		assert_eq!(store.epoch(), epoch + 2);
	}
}
