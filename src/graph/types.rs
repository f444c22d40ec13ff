/// Weight of the article a graph was seeded from.
pub const ROOT_WEIGHT: u8 = 2;
/// Weight of every article reached through a link.
pub const LINKED_WEIGHT: u8 = 1;

/// One article in the graph. The id is the canonical title and doubles as the label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphNode {
	/// Canonical article title.
	pub id: String,
	/// [`ROOT_WEIGHT`] or [`LINKED_WEIGHT`].
	pub weight: u8,
}

impl GraphNode {
	/// Node with the given id and weight.
	pub fn new(id: impl Into<String>, weight: u8) -> Self {
		Self {
			id: id.into(),
			weight,
		}
	}

	/// Whether this is the article the graph was seeded from.
	pub fn is_root(&self) -> bool {
		self.weight >= ROOT_WEIGHT
	}
}

/// A directed reference from one article to another, always kept as an id pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GraphLink {
	/// Id of the linking article.
	pub source: String,
	/// Id of the linked article.
	pub target: String,
}

impl GraphLink {
	/// Link `source -> target`.
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}
}

/// Owned copy of the store handed to the layout engine.
///
/// `revision` changes on every effective mutation, `epoch` only when the graph
/// is replaced wholesale (seed, relabel, clear). Layout state survives a new
/// revision within the same epoch and is dropped when the epoch moves.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
	/// Nodes in insertion order.
	pub nodes: Vec<GraphNode>,
	/// Links in insertion order; endpoints are always in `nodes`.
	pub links: Vec<GraphLink>,
	/// Store revision this copy was taken at.
	pub revision: u64,
	/// Store epoch this copy was taken at.
	pub epoch: u64,
}

impl GraphSnapshot {
	/// An empty snapshot means the graph was cleared.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}
