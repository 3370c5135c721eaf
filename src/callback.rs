//! Navigation callbacks for history traversal and route changes.

use crate::router::{NavigationError, Resolution};
use std::{cell::RefCell, rc::Rc};

#[cfg(feature = "tracing")]
use tracing::warn;

pub(crate) type OnPopInner = Box<dyn FnMut(&str)>;

/// The callback executed when the history moves to another entry, taking the new path as an argument.
///
/// A callback is never re-entered: a traversal reported while the callback is still running
/// (for example one it triggered itself) is not delivered to it.
///
/// # Usage
/// ```
/// use webui_router::callback::OnPop;
///
/// let on_pop = OnPop::from(|path: &str| {
///     // React to back/forward navigation
/// });
/// ```
#[derive(Clone)]
pub struct OnPop(pub(crate) Rc<RefCell<OnPopInner>>);

impl<F> From<F> for OnPop
where
    F: FnMut(&str) + 'static,
{
    fn from(f: F) -> Self {
        OnPop(Rc::new(RefCell::new(Box::new(f))))
    }
}

impl OnPop {
    /// Runs the callback. Returns `false` if it was skipped because it is already running.
    pub(crate) fn call(&self, path: &str) -> bool {
        match self.0.try_borrow_mut() {
            Ok(mut callback) => {
                (callback)(path);
                true
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                warn!("Skipping re-entrant pop callback for {path}");
                false
            }
        }
    }
}

pub(crate) type OnNavigateInner<V> = Box<dyn FnMut(Result<Resolution<V>, NavigationError>)>;

/// The callback executed after the router resolved a history traversal.
///
/// Like [`OnPop`], it is never re-entered: a result that arrives while the callback is still
/// running is dropped.
///
/// # Usage
/// ```
/// use webui_router::{NavigationError, Resolution, callback::OnNavigate};
///
/// type Navigation = Result<Resolution<&'static str>, NavigationError>;
///
/// let on_navigate = OnNavigate::from(|result: Navigation| {
///     // Render the resolved view or a fallback
/// });
/// ```
pub struct OnNavigate<V>(pub(crate) Rc<RefCell<OnNavigateInner<V>>>);

impl<V> Clone for OnNavigate<V> {
    fn clone(&self) -> Self {
        OnNavigate(self.0.clone())
    }
}

impl<V, F> From<F> for OnNavigate<V>
where
    F: FnMut(Result<Resolution<V>, NavigationError>) + 'static,
{
    fn from(f: F) -> Self {
        OnNavigate(Rc::new(RefCell::new(Box::new(f))))
    }
}

impl<V> OnNavigate<V> {
    /// Runs the callback. Returns `false` if it was skipped because it is already running.
    pub(crate) fn call(&self, result: Result<Resolution<V>, NavigationError>) -> bool {
        match self.0.try_borrow_mut() {
            Ok(mut callback) => {
                (callback)(result);
                true
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                warn!("Skipping re-entrant navigation callback");
                false
            }
        }
    }
}
