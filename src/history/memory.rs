use super::{History, HistoryError, Subscription};
use crate::callback::OnPop;
use futures::future::{FutureExt, LocalBoxFuture};
use std::{cell::RefCell, rc::Rc};

#[cfg(feature = "tracing")]
use tracing::debug;

struct Stack {
    entries: Vec<String>,
    cursor: usize,
}

#[derive(Default)]
struct Listeners {
    next_id: usize,
    callbacks: Vec<(usize, OnPop)>,
}

/// An in-memory [`History`]: a stack of paths and a cursor.
///
/// Clones share the same stack, so a test can keep a handle while the router owns another.
#[derive(Clone)]
pub struct MemoryHistory {
    stack: Rc<RefCell<Stack>>,
    listeners: Rc<RefCell<Listeners>>,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl std::fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stack = self.stack.borrow();
        f.debug_struct("MemoryHistory")
            .field("entries", &stack.entries)
            .field("cursor", &stack.cursor)
            .finish()
    }
}

impl MemoryHistory {
    /// Constructs a new [`MemoryHistory`] whose only entry is `initial`.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            stack: Rc::new(RefCell::new(Stack {
                entries: vec![initial.into()],
                cursor: 0,
            })),
            listeners: Rc::new(RefCell::new(Listeners::default())),
        }
    }

    /// Returns a copy of every entry, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.stack.borrow().entries.clone()
    }

    /// The index of the current entry.
    pub fn position(&self) -> usize {
        self.stack.borrow().cursor
    }

    pub fn len(&self) -> usize {
        self.stack.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.borrow().entries.is_empty()
    }

    fn notify(&self, path: &str) {
        // Callbacks may subscribe or unsubscribe, so call them outside of the borrow.
        let callbacks: Vec<OnPop> = self
            .listeners
            .borrow()
            .callbacks
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback.call(path);
        }
    }
}

impl History for MemoryHistory {
    fn location(&self) -> String {
        let stack = self.stack.borrow();
        stack.entries[stack.cursor].clone()
    }

    fn push(&self, path: &str) -> Result<(), HistoryError> {
        let mut stack = self.stack.borrow_mut();
        let next = stack.cursor + 1;
        stack.entries.truncate(next);
        stack.entries.push(path.to_string());
        stack.cursor = next;
        Ok(())
    }

    fn replace(&self, path: &str) -> Result<(), HistoryError> {
        let mut stack = self.stack.borrow_mut();
        let cursor = stack.cursor;
        stack.entries[cursor] = path.to_string();
        Ok(())
    }

    fn go(&self, delta: i32) -> LocalBoxFuture<'_, Result<(), HistoryError>> {
        let moved_to = {
            let mut stack = self.stack.borrow_mut();
            let last = stack.entries.len() as i64 - 1;
            let target = (stack.cursor as i64 + delta as i64).clamp(0, last) as usize;
            if target == stack.cursor {
                None
            } else {
                stack.cursor = target;
                Some(stack.entries[target].clone())
            }
        };
        if let Some(path) = moved_to {
            #[cfg(feature = "tracing")]
            debug!("Memory history moved to {path}");
            self.notify(&path);
        }
        async { Ok(()) }.boxed_local()
    }

    fn subscribe(&self, on_pop: OnPop) -> Subscription {
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.callbacks.push((id, on_pop));
            id
        };
        let listeners = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners
                    .borrow_mut()
                    .callbacks
                    .retain(|(callback_id, _)| *callback_id != id);
            }
        })
    }
}

#[cfg(all(test, not(target_family = "wasm")))]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_replace() {
        let history = MemoryHistory::default();
        assert_eq!(history.location(), "/");

        history.push("/spectrum").unwrap();
        history.push("/generator").unwrap();
        assert_eq!(history.location(), "/generator");
        assert_eq!(history.position(), 2);

        history.replace("/about").unwrap();
        assert_eq!(history.entries(), vec!["/", "/spectrum", "/about"]);
    }

    #[tokio::test]
    async fn test_go_clamps_and_truncates_forward_entries() {
        let history = MemoryHistory::default();
        history.push("/spectrum").unwrap();
        history.push("/generator").unwrap();

        history.go(-5).await.unwrap();
        assert_eq!(history.location(), "/");

        history.go(1).await.unwrap();
        assert_eq!(history.location(), "/spectrum");

        history.push("/about").unwrap();
        assert_eq!(history.entries(), vec!["/", "/spectrum", "/about"]);

        history.go(1).await.unwrap();
        assert_eq!(history.location(), "/about");
    }

    #[tokio::test]
    async fn test_subscribers_see_traversals() {
        let history = MemoryHistory::default();
        history.push("/spectrum").unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let subscription = history.subscribe(OnPop::from(move |path: &str| {
            seen_clone.borrow_mut().push(path.to_string());
        }));

        history.go(-1).await.unwrap();
        // A traversal that does not move is not reported.
        history.go(-1).await.unwrap();
        history.go(1).await.unwrap();
        assert_eq!(*seen.borrow(), vec!["/", "/spectrum"]);

        drop(subscription);
        history.go(-1).await.unwrap();
        assert_eq!(seen.borrow().len(), 2);
    }
}
