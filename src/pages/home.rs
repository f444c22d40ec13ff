use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::force_graph::ForceGraphCanvas;
use crate::config::ProviderConfig;
use crate::explorer::{Explorer, Phase, run_expand, run_search, run_summary, run_translate};
use crate::provider::WikipediaClient;

/// Languages offered in the picker. Any valid code works through a pasted link.
const LANGUAGES: &[(&str, &str)] = &[
	("en", "English"),
	("de", "Deutsch"),
	("fr", "Français"),
	("es", "Español"),
	("it", "Italiano"),
	("nl", "Nederlands"),
	("pl", "Polski"),
	("pt", "Português"),
	("ru", "Русский"),
	("ja", "日本語"),
	("zh", "中文"),
];

fn article_url(domain: &str, lang: &str, title: &str) -> String {
	format!(
		"https://{lang}.{domain}/wiki/{}",
		urlencoding::encode(&title.replace(' ', "_"))
	)
}

/// Explorer page: search box, language picker and the bubble graph.
#[component]
pub fn Home() -> impl IntoView {
	let config = ProviderConfig::default();
	let domain = config.domain.clone();
	let client = WikipediaClient::new(config);

	let explorer = RwSignal::new(Explorer::new("en", domain.clone()));
	let query = RwSignal::new(String::new());
	let dark = RwSignal::new(false);
	let focus = RwSignal::new(None::<String>);
	let snapshot = Memo::new(move |_| explorer.with(|e| e.store().snapshot()));

	let client_search = client.clone();
	let on_search = move |ev: leptos::ev::SubmitEvent| {
		ev.prevent_default();
		let input = query.get_untracked();
		let Some(Ok(request)) = explorer.try_update(|e| e.begin_search(&input)) else {
			return;
		};
		let client = client_search.clone();
		spawn_local(async move {
			let result = run_search(&client, request).await;
			explorer.update(|e| {
				e.complete_search(result);
			});
		});
	};

	// Click on a bubble: grow the graph from it and show its summary.
	let client_click = client.clone();
	let on_node_click = Callback::new(move |id: String| {
		let (expand, summary) = explorer
			.try_update(|e| (e.begin_expand(&id), e.select(&id)))
			.unwrap_or_default();
		if let Some(request) = expand {
			let client = client_click.clone();
			spawn_local(async move {
				let result = run_expand(&client, request).await;
				explorer.update(|e| {
					e.complete_expand(result);
				});
			});
		}
		if let Some(request) = summary {
			let client = client_click.clone();
			spawn_local(async move {
				let result = run_summary(&client, request).await;
				explorer.update(|e| {
					e.complete_summary(result);
				});
			});
		}
	});

	// Before a search this only picks the language; afterwards it translates the graph.
	let client_lang = client;
	let on_language = move |ev: leptos::ev::Event| {
		let lang = event_target_value(&ev);
		let request = explorer
			.try_update(|e| {
				if e.store().graph().is_empty() {
					e.set_language(&lang);
					None
				} else {
					e.begin_translate(&lang)
				}
			})
			.flatten();
		let Some(request) = request else {
			return;
		};
		let client = client_lang.clone();
		spawn_local(async move {
			let result = run_translate(&client, request).await;
			explorer.update(|e| {
				e.complete_translate(result);
			});
		});
	};

	let on_reset = move |_| {
		explorer.update(Explorer::reset);
		query.set(String::new());
		focus.set(None);
	};

	let on_focus = move |_| {
		let target = explorer.with_untracked(|e| {
			e.selected().map(str::to_owned).or_else(|| {
				e.store()
					.graph()
					.nodes()
					.iter()
					.find(|n| n.is_root())
					.map(|n| n.id.clone())
			})
		});
		focus.set(target);
	};

	let status = move || {
		explorer.with(|e| match e.phase() {
			Phase::Idle => "Enter an article title or paste a link.".to_owned(),
			Phase::Loading => "Loading…".to_owned(),
			Phase::Viewing => format!(
				"{} articles, {} links. Click a bubble to expand it.",
				e.store().graph().len(),
				e.store().graph().links().len()
			),
			Phase::Error(message) => message.clone(),
		})
	};

	let summary_panel = move || {
		let domain = domain.clone();
		explorer.with(|e| {
			let title = e.selected()?.to_owned();
			let url = article_url(&domain, e.language(), &title);
			let text = e.summary().unwrap_or("No summary available.").to_owned();
			Some(view! {
				<aside class="summary-panel">
					<h2>{title}</h2>
					<p>{text}</p>
					<a href=url target="_blank" rel="noopener">"Read the article"</a>
				</aside>
			})
		})
	};

	view! {
		<div class="fullscreen-graph" class:dark=move || dark.get()>
			<ForceGraphCanvas
				data=snapshot
				dark=dark
				focus=focus
				on_node_click=on_node_click
				fullscreen=true
			/>
			<div class="graph-overlay">
				<h1>"Wiki Bubbles"</h1>
				<form on:submit=on_search>
					<input
						type="text"
						placeholder="Albert Einstein or https://en.wikipedia.org/wiki/..."
						prop:value=move || query.get()
						on:input=move |ev| query.set(event_target_value(&ev))
					/>
					<button type="submit">"Explore"</button>
				</form>
				<div class="controls">
					<select
						on:change=on_language
						prop:value=move || explorer.with(|e| e.language().to_owned())
					>
						{LANGUAGES
							.iter()
							.map(|(code, name)| view! { <option value=*code>{*name}</option> })
							.collect_view()}
					</select>
					<button on:click=on_focus>"Focus"</button>
					<button on:click=on_reset>"Reset"</button>
					<button on:click=move |_| dark.update(|d| *d = !*d)>
						{move || if dark.get() { "Light" } else { "Dark" }}
					</button>
				</div>
				<p class="subtitle">{status}</p>
				{summary_panel}
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn article_links_use_underscores() {
		assert_eq!(
			article_url("wikipedia.org", "de", "Albert Einstein"),
			"https://de.wikipedia.org/wiki/Albert_Einstein"
		);
		assert_eq!(
			article_url("wikipedia.org", "en", "C++"),
			"https://en.wikipedia.org/wiki/C%2B%2B"
		);
	}
}
