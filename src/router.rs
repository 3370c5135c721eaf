//! The route table resolver.

use crate::{
    callback::{OnNavigate, OnPop},
    history::{History, HistoryError, HistoryType, Subscription},
    option::{NavigationMode, RouterOptions, normalize_base, resolve_base},
    route::{LoadError, RouteEntry, View, normalize_path},
    util::spawn_local,
};
use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    rc::{Rc, Weak},
};
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// The error returned when a route table cannot be used.
///
/// This is a startup defect; the application should not boot with it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Two entries address the same path.
    #[error("Duplicate route path: {path}")]
    DuplicatePath { path: String },
    /// Two entries share a name.
    #[error("Duplicate route name: {name}")]
    DuplicateName { name: String },
    /// A path does not start with `/`.
    #[error("Route path must start with '/': {path}")]
    InvalidPath { path: String },
    /// An unknown navigation mode string.
    #[error("Unknown navigation mode: {0}")]
    InvalidMode(String),
    /// The configured base differs from the one the history backend writes under.
    #[error("Base {configured:?} does not match the history base {history:?}")]
    BaseMismatch { configured: String, history: String },
}

/// The error type for navigations. None of these are fatal to the application.
#[derive(Error, Debug)]
pub enum NavigationError {
    /// No entry matches the requested path.
    #[error("No route matches {path}")]
    NotFound { path: String },
    /// No entry has the requested name.
    #[error("No route named {name}")]
    UnknownName { name: String },
    /// The deferred view of the matched entry failed to load. Navigating again retries.
    #[error("Failed to load the view of {path}: {source}")]
    ViewLoad {
        path: String,
        #[source]
        source: LoadError,
    },
    /// A newer navigation to a different entry started while this one was waiting for its
    /// view.
    #[error("Navigation to {path} was superseded")]
    Cancelled { path: String },
    /// The history backend rejected the update.
    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

/// The outcome of a successful navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<V> {
    /// The name of the matched entry.
    pub name: String,
    /// The requested path.
    pub path: String,
    /// The view to render.
    pub view: V,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Write {
    Push,
    Replace,
    Skip,
}

struct RouterInner<V> {
    routes: Vec<RouteEntry<V>>,
    mode: NavigationMode,
    base: String,
    history: HistoryType,
    navigation: Cell<u64>,
    /// Key of the entry the latest navigation targets.
    target: RefCell<String>,
    pending: Cell<usize>,
}

/// Decrements the pending counter when a deferred load ends, including when its navigation
/// is dropped.
struct PendingGuard<'a>(&'a Cell<usize>);

impl<'a> PendingGuard<'a> {
    fn new(pending: &'a Cell<usize>) -> Self {
        pending.set(pending.get() + 1);
        Self(pending)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

/// Maps paths to views and keeps the addressable history in sync.
///
/// Construct one router at startup and pass it to whatever needs to navigate. Clones are
/// handles to the same router.
pub struct Router<V> {
    inner: Rc<RouterInner<V>>,
}

impl<V> Clone for Router<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V> std::fmt::Debug for Router<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("mode", &self.inner.mode)
            .field("base", &self.inner.base)
            .field("routes", &self.inner.routes)
            .field("history", &self.inner.history)
            .finish()
    }
}

fn validate<V>(routes: &[RouteEntry<V>]) -> Result<(), ConfigurationError> {
    let mut paths = HashSet::new();
    let mut names = HashSet::new();
    for route in routes {
        if !route.path().starts_with('/') {
            return Err(ConfigurationError::InvalidPath {
                path: route.path().to_string(),
            });
        }
        if !paths.insert(route.key()) {
            return Err(ConfigurationError::DuplicatePath {
                path: route.path().to_string(),
            });
        }
        if !names.insert(route.name()) {
            return Err(ConfigurationError::DuplicateName {
                name: route.name().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(all(feature = "wasm-js", target_family = "wasm"))]
fn default_history(mode: NavigationMode, base: &str) -> HistoryType {
    use crate::history::wasm_js::{BrowserHistory, HashHistory};

    match mode {
        NavigationMode::History => BrowserHistory::new(base).into(),
        NavigationMode::Hash => HashHistory::new().into(),
    }
}

#[cfg(not(all(feature = "wasm-js", target_family = "wasm")))]
fn default_history(_mode: NavigationMode, _base: &str) -> HistoryType {
    crate::history::MemoryHistory::default().into()
}

impl<V: Clone + 'static> Router<V> {
    /// Constructs a new [`Router`] with the history backend of the platform and mode.
    ///
    /// In the browser this is `pushState` history or hash history, natively an in-memory
    /// history starting at `/`.
    pub fn new(options: RouterOptions<V>) -> Result<Self, ConfigurationError> {
        let base = resolve_base(options.base.as_deref());
        let history = default_history(options.mode, &base);
        Self::build(options, base, history)
    }

    /// Constructs a new [`Router`] on top of the given history.
    ///
    /// A backend that renders its own base, such as
    /// [`BrowserHistory`](crate::history::wasm_js::BrowserHistory), supplies the router's base.
    /// An explicit `base` in `options` must then agree with it.
    pub fn with_history(
        options: RouterOptions<V>,
        history: impl Into<HistoryType>,
    ) -> Result<Self, ConfigurationError> {
        let history = history.into();
        let base = match (history.base().map(normalize_base), options.base.as_deref()) {
            (Some(rendered), Some(configured)) if normalize_base(configured) != rendered => {
                return Err(ConfigurationError::BaseMismatch {
                    configured: normalize_base(configured),
                    history: rendered,
                });
            }
            (Some(rendered), _) => rendered,
            (None, configured) => resolve_base(configured),
        };
        Self::build(options, base, history)
    }

    fn build(
        options: RouterOptions<V>,
        base: String,
        history: HistoryType,
    ) -> Result<Self, ConfigurationError> {
        validate(&options.routes)?;
        #[cfg(feature = "tracing")]
        info!(
            "Router created with {} routes (mode: {}, base: {:?})",
            options.routes.len(),
            options.mode,
            base
        );
        Ok(Self {
            inner: Rc::new(RouterInner {
                routes: options.routes,
                mode: options.mode,
                base,
                history,
                navigation: Cell::new(0),
                target: RefCell::new(String::new()),
                pending: Cell::new(0),
            }),
        })
    }

    /// Navigates to `path` and records it in the history.
    ///
    /// Resolving a path that addresses the current entry does not add a history entry.
    pub async fn resolve(&self, path: &str) -> Result<Resolution<V>, NavigationError> {
        self.navigate(path, Write::Push).await
    }

    /// Navigates to the entry called `name`.
    pub async fn resolve_named(&self, name: &str) -> Result<Resolution<V>, NavigationError> {
        let path = self.named_path(name)?;
        self.navigate(&path, Write::Push).await
    }

    /// Navigates to `path`, replacing the current history entry.
    pub async fn replace(&self, path: &str) -> Result<Resolution<V>, NavigationError> {
        self.navigate(path, Write::Replace).await
    }

    /// Resolves the path the history currently shows, without writing to it.
    pub async fn current(&self) -> Result<Resolution<V>, NavigationError> {
        let path = self.inner.history.location();
        self.navigate(&path, Write::Skip).await
    }

    /// Moves `delta` entries through the history and resolves the entry it lands on.
    pub async fn go(&self, delta: i32) -> Result<Resolution<V>, NavigationError> {
        self.inner.history.go(delta).await?;
        self.current().await
    }

    pub async fn back(&self) -> Result<Resolution<V>, NavigationError> {
        self.go(-1).await
    }

    pub async fn forward(&self) -> Result<Resolution<V>, NavigationError> {
        self.go(1).await
    }

    /// Calls `callback` with the resolution of every history traversal, e.g. the browser's
    /// back and forward buttons.
    ///
    /// The resolution runs on the local executor. Dropping the returned [`Subscription`]
    /// stops the callbacks.
    pub fn listen<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(Result<Resolution<V>, NavigationError>) + 'static,
    {
        let on_navigate = OnNavigate::from(callback);
        let router: Weak<RouterInner<V>> = Rc::downgrade(&self.inner);
        self.inner
            .history
            .subscribe(OnPop::from(move |_path: &str| {
                let Some(inner) = router.upgrade() else {
                    return;
                };
                let router = Router { inner };
                let on_navigate = on_navigate.clone();
                spawn_local(async move {
                    let result = router.current().await;
                    on_navigate.call(result);
                });
            }))
    }

    async fn navigate(&self, path: &str, write: Write) -> Result<Resolution<V>, NavigationError> {
        let Some(route) = self.matched(path) else {
            #[cfg(feature = "tracing")]
            warn!("No route matches {path}");
            return Err(NavigationError::NotFound {
                path: path.to_string(),
            });
        };

        let navigation = self.inner.navigation.get() + 1;
        self.inner.navigation.set(navigation);
        *self.inner.target.borrow_mut() = route.key().to_string();

        let view = self.view_of(route).await?;

        // Waiters on the entry the latest navigation targets still resolve.
        let superseded = self.inner.navigation.get() != navigation
            && *self.inner.target.borrow() != route.key();
        if superseded {
            #[cfg(feature = "tracing")]
            debug!("Navigation to {path} superseded");
            return Err(NavigationError::Cancelled {
                path: path.to_string(),
            });
        }

        match write {
            Write::Push if normalize_path(&self.inner.history.location()) != route.key() => {
                self.inner.history.push(path)?
            }
            Write::Replace => self.inner.history.replace(path)?,
            _ => {}
        }

        #[cfg(feature = "tracing")]
        debug!("Navigated to {path} ({})", route.name());
        Ok(Resolution {
            name: route.name().to_string(),
            path: path.to_string(),
            view,
        })
    }

    async fn view_of(&self, route: &RouteEntry<V>) -> Result<V, NavigationError> {
        match route.view() {
            View::Direct(view) => Ok(view.clone()),
            View::Deferred(deferred) => {
                let _pending = PendingGuard::new(&self.inner.pending);
                deferred
                    .load()
                    .await
                    .map_err(|source| NavigationError::ViewLoad {
                        path: route.path().to_string(),
                        source,
                    })
            }
        }
    }
}

impl<V> Router<V> {
    /// Returns the first entry matching `path`.
    pub fn matched(&self, path: &str) -> Option<&RouteEntry<V>> {
        self.inner.routes.iter().find(|route| route.matches(path))
    }

    /// Returns the entry called `name`.
    pub fn route(&self, name: &str) -> Option<&RouteEntry<V>> {
        self.inner.routes.iter().find(|route| route.name() == name)
    }

    pub fn routes(&self) -> &[RouteEntry<V>] {
        &self.inner.routes
    }

    pub fn mode(&self) -> NavigationMode {
        self.inner.mode
    }

    /// The normalized base path; empty for the root.
    pub fn base(&self) -> &str {
        &self.inner.base
    }

    pub fn history(&self) -> &HistoryType {
        &self.inner.history
    }

    /// Returns `true` while a navigation waits for a deferred view.
    pub fn is_pending(&self) -> bool {
        self.inner.pending.get() > 0
    }

    /// Returns the URL a link to `path` should point to.
    pub fn href(&self, path: &str) -> String {
        let base = &self.inner.base;
        match self.inner.mode {
            NavigationMode::History => format!("{base}{path}"),
            NavigationMode::Hash if base.is_empty() => format!("#{path}"),
            NavigationMode::Hash => format!("{base}/#{path}"),
        }
    }

    /// Returns the URL a link to the entry called `name` should point to.
    pub fn href_named(&self, name: &str) -> Result<String, NavigationError> {
        let path = self.named_path(name)?;
        Ok(self.href(&path))
    }

    fn named_path(&self, name: &str) -> Result<String, NavigationError> {
        self.route(name)
            .map(|route| route.path().to_string())
            .ok_or_else(|| NavigationError::UnknownName {
                name: name.to_string(),
            })
    }
}
