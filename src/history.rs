//! Addressable history backends.
//!
//! A [`History`] exposes the current app-relative path (base already stripped), records new
//! entries and traverses existing ones. [`MemoryHistory`] works everywhere; the browser
//! backends live in [`wasm_js`] behind the `wasm-js` feature.

use crate::callback::OnPop;
use futures::future::LocalBoxFuture;
use thiserror::Error;
use wasm_bindgen::JsValue;

mod memory;
#[cfg(feature = "wasm-js")]
pub mod wasm_js;

pub use memory::MemoryHistory;

/// The error type for history backends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// The browser rejected a history call.
    #[error("WebSys error: {0}")]
    WebSys(String),
}

impl From<JsValue> for HistoryError {
    fn from(value: JsValue) -> Self {
        HistoryError::WebSys(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

/// Trait for the addressable history a router writes to and reads from.
pub trait History {
    /// Returns the path of the current entry, including query and fragment.
    fn location(&self) -> String;

    /// Adds a new entry for `path` after the current one, discarding forward entries.
    fn push(&self, path: &str) -> Result<(), HistoryError>;

    /// Replaces the current entry with `path`.
    fn replace(&self, path: &str) -> Result<(), HistoryError>;

    /// Moves `delta` entries through the history. The returned future completes once the
    /// traversal has taken effect.
    fn go(&self, delta: i32) -> LocalBoxFuture<'_, Result<(), HistoryError>>;

    /// Registers a callback invoked with the new path after every traversal.
    fn subscribe(&self, on_pop: OnPop) -> Subscription;

    /// The base path this backend writes entries under, if it renders one.
    fn base(&self) -> Option<&str> {
        None
    }
}

/// Keeps a history callback registered until dropped.
#[must_use = "the callback is unregistered when the subscription is dropped"]
pub struct Subscription(Option<Box<dyn FnOnce()>>);

impl Subscription {
    pub(crate) fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Subscription(Some(Box::new(unsubscribe)))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.0.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.0.is_some())
            .finish()
    }
}

/// Enum dispatch over the available [`History`] backends.
#[derive(Clone, Debug)]
pub enum HistoryType {
    Memory(MemoryHistory),
    #[cfg(feature = "wasm-js")]
    Browser(wasm_js::BrowserHistory),
    #[cfg(feature = "wasm-js")]
    Hash(wasm_js::HashHistory),
}

impl History for HistoryType {
    fn location(&self) -> String {
        match self {
            HistoryType::Memory(history) => history.location(),
            #[cfg(feature = "wasm-js")]
            HistoryType::Browser(history) => history.location(),
            #[cfg(feature = "wasm-js")]
            HistoryType::Hash(history) => history.location(),
        }
    }

    fn push(&self, path: &str) -> Result<(), HistoryError> {
        match self {
            HistoryType::Memory(history) => history.push(path),
            #[cfg(feature = "wasm-js")]
            HistoryType::Browser(history) => history.push(path),
            #[cfg(feature = "wasm-js")]
            HistoryType::Hash(history) => history.push(path),
        }
    }

    fn replace(&self, path: &str) -> Result<(), HistoryError> {
        match self {
            HistoryType::Memory(history) => history.replace(path),
            #[cfg(feature = "wasm-js")]
            HistoryType::Browser(history) => history.replace(path),
            #[cfg(feature = "wasm-js")]
            HistoryType::Hash(history) => history.replace(path),
        }
    }

    fn go(&self, delta: i32) -> LocalBoxFuture<'_, Result<(), HistoryError>> {
        match self {
            HistoryType::Memory(history) => history.go(delta),
            #[cfg(feature = "wasm-js")]
            HistoryType::Browser(history) => history.go(delta),
            #[cfg(feature = "wasm-js")]
            HistoryType::Hash(history) => history.go(delta),
        }
    }

    fn subscribe(&self, on_pop: OnPop) -> Subscription {
        match self {
            HistoryType::Memory(history) => history.subscribe(on_pop),
            #[cfg(feature = "wasm-js")]
            HistoryType::Browser(history) => history.subscribe(on_pop),
            #[cfg(feature = "wasm-js")]
            HistoryType::Hash(history) => history.subscribe(on_pop),
        }
    }

    fn base(&self) -> Option<&str> {
        match self {
            HistoryType::Memory(history) => history.base(),
            #[cfg(feature = "wasm-js")]
            HistoryType::Browser(history) => history.base(),
            #[cfg(feature = "wasm-js")]
            HistoryType::Hash(history) => history.base(),
        }
    }
}

impl From<MemoryHistory> for HistoryType {
    fn from(history: MemoryHistory) -> Self {
        HistoryType::Memory(history)
    }
}

#[cfg(feature = "wasm-js")]
impl From<wasm_js::BrowserHistory> for HistoryType {
    fn from(history: wasm_js::BrowserHistory) -> Self {
        HistoryType::Browser(history)
    }
}

#[cfg(feature = "wasm-js")]
impl From<wasm_js::HashHistory> for HistoryType {
    fn from(history: wasm_js::HashHistory) -> Self {
        HistoryType::Hash(history)
    }
}
