//! Views loaded on first access.

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use std::{
    cell::{Cell, RefCell},
    fmt,
    future::Future,
    rc::Rc,
};
use thiserror::Error;
use wasm_bindgen::JsValue;

#[cfg(feature = "tracing")]
use tracing::{debug, error};

type Loader<V> = Rc<dyn Fn() -> LocalBoxFuture<'static, Result<V, LoadError>>>;
type PendingView<V> = Shared<LocalBoxFuture<'static, Result<V, LoadError>>>;

/// The error returned by a view loader, e.g. when fetching a code chunk fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct LoadError {
    message: String,
}

impl LoadError {
    /// Creates a new [`LoadError`] with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<JsValue> for LoadError {
    fn from(value: JsValue) -> Self {
        match value.as_string() {
            Some(message) => LoadError::new(message),
            None => LoadError::new(format!("{value:?}")),
        }
    }
}

impl From<LoadError> for JsValue {
    fn from(err: LoadError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

enum LoadState<V> {
    Unloaded,
    Loading { attempt: u64, pending: PendingView<V> },
    Loaded(V),
}

/// A view produced by an async loader the first time it is needed.
///
/// A successful load is cached for the lifetime of the view. Requests that arrive while a load
/// is in flight await that same load instead of starting another one. A failed load leaves the
/// view unloaded, so the next request invokes the loader again.
///
/// Clones share the loader and the cache.
pub struct DeferredView<V> {
    loader: Loader<V>,
    state: Rc<RefCell<LoadState<V>>>,
    attempts: Rc<Cell<u64>>,
}

impl<V> Clone for DeferredView<V> {
    fn clone(&self) -> Self {
        Self {
            loader: self.loader.clone(),
            state: self.state.clone(),
            attempts: self.attempts.clone(),
        }
    }
}

impl<V> fmt::Debug for DeferredView<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.borrow() {
            LoadState::Unloaded => "unloaded",
            LoadState::Loading { .. } => "loading",
            LoadState::Loaded(_) => "loaded",
        };
        f.debug_struct("DeferredView")
            .field("state", &state)
            .field("attempts", &self.attempts.get())
            .finish()
    }
}

impl<V> DeferredView<V> {
    /// Returns `true` once a load has succeeded.
    pub fn is_loaded(&self) -> bool {
        matches!(&*self.state.borrow(), LoadState::Loaded(_))
    }

    /// Returns `true` while a load is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(&*self.state.borrow(), LoadState::Loading { .. })
    }

    /// The number of times the loader has been invoked.
    pub fn attempts(&self) -> u64 {
        self.attempts.get()
    }
}

impl<V: Clone + 'static> DeferredView<V> {
    /// Constructs a new [`DeferredView`] from a zero-argument async loader.
    pub fn new<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<V, LoadError>> + 'static,
    {
        let loader: Loader<V> = Rc::new(move || loader().boxed_local());
        Self {
            loader,
            state: Rc::new(RefCell::new(LoadState::Unloaded)),
            attempts: Rc::new(Cell::new(0)),
        }
    }

    /// Returns the view, invoking the loader only if no load succeeded or is in flight.
    pub async fn load(&self) -> Result<V, LoadError> {
        let in_flight = match &*self.state.borrow() {
            LoadState::Loaded(view) => return Ok(view.clone()),
            LoadState::Loading { attempt, pending } => Some((*attempt, pending.clone())),
            LoadState::Unloaded => None,
        };

        let (attempt, pending) = match in_flight {
            Some(in_flight) => in_flight,
            None => {
                let attempt = self.attempts.get() + 1;
                self.attempts.set(attempt);
                #[cfg(feature = "tracing")]
                debug!("Invoking deferred view loader (attempt {attempt})");
                // The loader may inspect this view before returning its future.
                let pending = (self.loader)().shared();
                let mut state = self.state.borrow_mut();
                if matches!(&*state, LoadState::Unloaded) {
                    *state = LoadState::Loading {
                        attempt,
                        pending: pending.clone(),
                    };
                }
                (attempt, pending)
            }
        };

        let result = pending.await;

        // Only the waiters of the current attempt may settle the state.
        let mut state = self.state.borrow_mut();
        let current = matches!(&*state, LoadState::Loading { attempt: a, .. } if *a == attempt);
        if current {
            match &result {
                Ok(view) => *state = LoadState::Loaded(view.clone()),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    error!("Deferred view loader failed: {_e}");
                    *state = LoadState::Unloaded;
                }
            }
        }
        result
    }
}

#[cfg(all(test, not(target_family = "wasm")))]
mod tests {
    use super::*;

    fn counting_loader(calls: Rc<Cell<usize>>) -> DeferredView<Rc<str>> {
        DeferredView::new(move || {
            let calls = calls.clone();
            async move {
                calls.set(calls.get() + 1);
                tokio::task::yield_now().await;
                Ok(Rc::from("about"))
            }
        })
    }

    #[tokio::test]
    async fn test_load_is_cached() {
        let calls = Rc::new(Cell::new(0));
        let view = counting_loader(calls.clone());
        assert!(!view.is_loaded());

        let first = view.load().await.unwrap();
        let second = view.load().await.unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(view.attempts(), 1);
        assert!(view.is_loaded());
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_invocation() {
        let calls = Rc::new(Cell::new(0));
        let view = counting_loader(calls.clone());

        let (first, second) = futures::join!(view.load(), view.load());

        assert_eq!(calls.get(), 1);
        assert!(Rc::ptr_eq(&first.unwrap(), &second.unwrap()));
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();
        let view = DeferredView::new(move || {
            let calls = calls_clone.clone();
            async move {
                calls.set(calls.get() + 1);
                if calls.get() == 1 {
                    Err(LoadError::new("chunk about.js failed to load"))
                } else {
                    Ok("about")
                }
            }
        });

        let err = view.load().await.unwrap_err();
        assert_eq!(err.message(), "chunk about.js failed to load");
        assert!(!view.is_loaded());
        assert!(!view.is_loading());

        assert_eq!(view.load().await, Ok("about"));
        assert_eq!(calls.get(), 2);
        assert!(view.is_loaded());
    }

    #[tokio::test]
    async fn test_clones_share_the_cache() {
        let calls = Rc::new(Cell::new(0));
        let view = counting_loader(calls.clone());
        let clone = view.clone();

        view.load().await.unwrap();
        clone.load().await.unwrap();

        assert_eq!(calls.get(), 1);
        assert!(clone.is_loaded());
    }

    #[tokio::test]
    async fn test_loader_may_inspect_its_own_view() {
        let slot: Rc<RefCell<Option<DeferredView<&'static str>>>> = Rc::default();
        let slot_clone = slot.clone();
        let view = DeferredView::new(move || {
            let seen = slot_clone.borrow().as_ref().map(|view| {
                (view.is_loaded(), view.is_loading(), format!("{view:?}"))
            });
            async move {
                let (loaded, loading, debug) = seen.unwrap();
                assert!(!loaded);
                assert!(!loading);
                assert!(debug.contains("unloaded"));
                Ok("about")
            }
        });
        *slot.borrow_mut() = Some(view.clone());

        assert_eq!(view.load().await, Ok("about"));
        assert_eq!(view.attempts(), 1);
        assert!(view.is_loaded());
        slot.borrow_mut().take();
    }
}
