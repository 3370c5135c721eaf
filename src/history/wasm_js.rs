//! Browser based history backends.

use super::{History, HistoryError, Subscription};
use crate::{callback::OnPop, option::strip_base};
use futures::{
    channel::oneshot,
    future::{self, Either, FutureExt, LocalBoxFuture},
};
use gloo_events::EventListener;
use gloo_timers::future::TimeoutFuture;
use gloo_utils::window;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::js_sys;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// How long a traversal may take before it is considered a no-op, in milliseconds.
///
/// The browser fires no `popstate` event when `history.go` cannot move.
const TRAVERSAL_TIMEOUT: u32 = 1000;

/// The state object stored with every entry the router creates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    /// A unique key of the entry.
    pub key: String,
    /// The position of the entry relative to the first entry the router created.
    pub position: u32,
}

impl HistoryState {
    fn next(position: u32) -> Self {
        Self {
            key: format!("{:.3}", js_sys::Date::now()),
            position,
        }
    }
}

fn current_state() -> Option<HistoryState> {
    let state = window().history().ok()?.state().ok()?;
    serde_wasm_bindgen::from_value(state).ok()
}

fn write_entry(url: &str, replace: bool) -> Result<(), HistoryError> {
    let history = window().history()?;
    let position = current_state().map(|state| state.position).unwrap_or(0);
    let state = if replace {
        HistoryState::next(position)
    } else {
        HistoryState::next(position + 1)
    };
    let state: JsValue = serde_wasm_bindgen::to_value(&state)
        .map_err(|e| HistoryError::WebSys(e.to_string()))?;
    if replace {
        history.replace_state_with_url(&state, "", Some(url))?;
    } else {
        history.push_state_with_url(&state, "", Some(url))?;
    }
    #[cfg(feature = "tracing")]
    debug!("History entry written: {url} (replace: {replace})");
    Ok(())
}

async fn traverse(delta: i32) -> Result<(), HistoryError> {
    if delta == 0 {
        return Ok(());
    }
    let (sender, receiver) = oneshot::channel();
    let _listener = EventListener::once(&window(), "popstate", move |_| {
        let _ = sender.send(());
    });
    window().history()?.go_with_delta(delta)?;
    let timeout = TimeoutFuture::new(TRAVERSAL_TIMEOUT);
    futures::pin_mut!(timeout);
    match future::select(receiver, timeout).await {
        Either::Left(_) => {}
        Either::Right(_) => {
            #[cfg(feature = "tracing")]
            warn!("No popstate after history.go({delta}), assuming no traversal");
        }
    }
    Ok(())
}

fn subscribe_popstate(location: impl Fn() -> String + 'static, on_pop: OnPop) -> Subscription {
    let listener = EventListener::new(&window(), "popstate", move |_| {
        on_pop.call(&location());
    });
    Subscription::new(move || drop(listener))
}

/// Returns the `href` of the document's `<base>` element, without scheme and host.
#[cfg_attr(not(target_family = "wasm"), allow(dead_code))]
pub(crate) fn document_base() -> Option<String> {
    let element = window().document()?.query_selector("base").ok()??;
    let href = element.get_attribute("href")?;
    match href.split_once("://") {
        Some((_, rest)) => Some(rest.find('/').map_or("/", |i| &rest[i..]).to_string()),
        None => Some(href),
    }
}

/// A [`History`] on top of `window.history.pushState`, with paths rendered after the base.
#[derive(Clone, Debug)]
pub struct BrowserHistory {
    base: Rc<str>,
}

impl BrowserHistory {
    /// Constructs a new [`BrowserHistory`] for a normalized base path.
    pub fn new(base: &str) -> Self {
        Self { base: base.into() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl History for BrowserHistory {
    fn location(&self) -> String {
        let location = window().location();
        let pathname = location.pathname().unwrap_or_default();
        let search = location.search().unwrap_or_default();
        let hash = location.hash().unwrap_or_default();
        strip_base(&format!("{pathname}{search}{hash}"), &self.base)
    }

    fn push(&self, path: &str) -> Result<(), HistoryError> {
        write_entry(&self.url(path), false)
    }

    fn replace(&self, path: &str) -> Result<(), HistoryError> {
        write_entry(&self.url(path), true)
    }

    fn go(&self, delta: i32) -> LocalBoxFuture<'_, Result<(), HistoryError>> {
        traverse(delta).boxed_local()
    }

    fn subscribe(&self, on_pop: OnPop) -> Subscription {
        let history = self.clone();
        subscribe_popstate(move || history.location(), on_pop)
    }

    fn base(&self) -> Option<&str> {
        Some(&self.base)
    }
}

/// A [`History`] that keeps the path in the URL fragment (`#/spectrum`).
#[derive(Clone, Debug, Default)]
pub struct HashHistory;

impl HashHistory {
    /// Constructs a new [`HashHistory`], rewriting an empty or relative fragment to start
    /// with `/`.
    pub fn new() -> Self {
        let history = HashHistory;
        let hash = hash_path();
        if !hash.starts_with('/') {
            if let Err(_e) = history.replace(&format!("/{hash}")) {
                #[cfg(feature = "tracing")]
                warn!("Could not normalize the URL fragment: {_e}");
            }
        }
        history
    }

    fn url(&self, path: &str) -> String {
        let href = window().location().href().unwrap_or_default();
        let document = href.split_once('#').map_or(href.as_str(), |(document, _)| document);
        format!("{document}#{path}")
    }
}

fn hash_path() -> String {
    let hash = window().location().hash().unwrap_or_default();
    hash.strip_prefix('#').unwrap_or(&hash).to_string()
}

impl History for HashHistory {
    fn location(&self) -> String {
        let path = hash_path();
        if path.is_empty() {
            "/".to_string()
        } else {
            path
        }
    }

    fn push(&self, path: &str) -> Result<(), HistoryError> {
        write_entry(&self.url(path), false)
    }

    fn replace(&self, path: &str) -> Result<(), HistoryError> {
        write_entry(&self.url(path), true)
    }

    fn go(&self, delta: i32) -> LocalBoxFuture<'_, Result<(), HistoryError>> {
        traverse(delta).boxed_local()
    }

    fn subscribe(&self, on_pop: OnPop) -> Subscription {
        let history = self.clone();
        subscribe_popstate(move || history.location(), on_pop)
    }
}
