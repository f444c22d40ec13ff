use std::collections::{HashMap, HashSet};
use std::future::Future;

use log::warn;

use super::ProviderError;

/// Largest number of titles the API accepts in one request.
pub const MAX_BATCH: usize = 50;

/// Run `fetch` over distinct `titles` in chunks of at most `batch_size`
/// (never more than [`MAX_BATCH`]) and merge the results.
///
/// A failing chunk is logged and skipped; the remaining chunks still run.
pub async fn translate_in_batches<F, Fut>(
	titles: &[String],
	batch_size: usize,
	mut fetch: F,
) -> HashMap<String, String>
where
	F: FnMut(Vec<String>) -> Fut,
	Fut: Future<Output = Result<HashMap<String, String>, ProviderError>>,
{
	let mut seen = HashSet::new();
	let distinct: Vec<String> = titles
		.iter()
		.filter(|t| seen.insert(t.as_str()))
		.cloned()
		.collect();

	let mut found = HashMap::with_capacity(distinct.len());
	for (n, chunk) in distinct.chunks(batch_size.clamp(1, MAX_BATCH)).enumerate() {
		match fetch(chunk.to_vec()).await {
			Ok(mapping) => found.extend(mapping),
			Err(err) => warn!("translation batch {n} ({} titles) failed: {err}", chunk.len()),
		}
	}
	found
}
