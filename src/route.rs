//! Route entries and the views they point to.

use std::future::Future;

mod deferred;

pub use deferred::{DeferredView, LoadError};

/// The view a route renders.
pub enum View<V> {
    /// A view bound when the route table is built.
    Direct(V),
    /// A view produced on first access by an async loader, then cached.
    Deferred(DeferredView<V>),
}

impl<V: Clone> Clone for View<V> {
    fn clone(&self) -> Self {
        match self {
            View::Direct(view) => View::Direct(view.clone()),
            View::Deferred(deferred) => View::Deferred(deferred.clone()),
        }
    }
}

impl<V> View<V> {
    /// Returns `true` if the view can be rendered without suspending.
    pub fn is_ready(&self) -> bool {
        match self {
            View::Direct(_) => true,
            View::Deferred(deferred) => deferred.is_loaded(),
        }
    }
}

impl<V> std::fmt::Debug for View<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Direct(_) => f.write_str("Direct"),
            View::Deferred(deferred) => std::fmt::Debug::fmt(deferred, f),
        }
    }
}

/// An entry of the route table: a literal path, a unique name and a view.
pub struct RouteEntry<V> {
    path: String,
    name: String,
    view: View<V>,
    key: String,
}

impl<V> RouteEntry<V> {
    /// Creates an entry whose view is bound immediately.
    pub fn new(path: impl Into<String>, name: impl Into<String>, view: V) -> Self {
        Self::with_view(path, name, View::Direct(view))
    }

    /// Creates an entry whose view is loaded by `loader` on first access.
    pub fn deferred<F, Fut>(path: impl Into<String>, name: impl Into<String>, loader: F) -> Self
    where
        V: Clone + 'static,
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<V, LoadError>> + 'static,
    {
        Self::with_view(path, name, View::Deferred(DeferredView::new(loader)))
    }

    /// Creates an entry from an already constructed [`View`].
    pub fn with_view(path: impl Into<String>, name: impl Into<String>, view: View<V>) -> Self {
        let path = path.into();
        let key = normalize_path(&path);
        Self {
            path,
            name: name.into(),
            view,
            key,
        }
    }

    /// The path the entry was declared with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The symbolic name of the entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn view(&self) -> &View<V> {
        &self.view
    }

    /// Returns `true` if `path` addresses this entry.
    ///
    /// Query and fragment are ignored, a trailing slash is tolerated and the comparison is
    /// ASCII-case-insensitive.
    pub fn matches(&self, path: &str) -> bool {
        normalize_path(path) == self.key
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }
}

impl<V: Clone> Clone for RouteEntry<V> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            name: self.name.clone(),
            view: self.view.clone(),
            key: self.key.clone(),
        }
    }
}

impl<V> std::fmt::Debug for RouteEntry<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("view", &self.view)
            .finish()
    }
}

/// Reduces a path to the form routes are compared in.
pub(crate) fn normalize_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    let path = match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    };
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/spectrum/"), "/spectrum");
        assert_eq!(normalize_path("/Spectrum?span=2e6#peak"), "/spectrum");
        assert_eq!(normalize_path("/?tab=1"), "/");
        assert_eq!(normalize_path("/spectrum//"), "/spectrum/");
    }

    #[test]
    fn test_route_entry_matches() {
        let entry = RouteEntry::new("/generator", "Generator", ());
        assert!(entry.matches("/generator"));
        assert!(entry.matches("/generator/"));
        assert!(entry.matches("/GENERATOR?ddm=0.155"));
        assert!(!entry.matches("/generator/settings"));
        assert!(!entry.matches("/"));

        let root = RouteEntry::new("/", "Home", ());
        assert!(root.matches("/"));
        assert!(root.matches("/#top"));
        assert!(!root.matches("/spectrum"));
    }

    #[test]
    fn test_view_is_ready() {
        let direct = RouteEntry::new("/", "Home", "home");
        assert!(direct.view().is_ready());

        let deferred = RouteEntry::deferred("/about", "About", || async { Ok("about") });
        assert!(!deferred.view().is_ready());
        assert_eq!(deferred.name(), "About");
        assert_eq!(deferred.path(), "/about");
    }
}
