//! Client-side route table for the ILS monitor web UI.
//!
//! The crate maps URL paths to views without full page reloads. It keeps the browser's
//! addressable history in sync with the active route and loads deferred views on first use.
//!
//! This crate is intended for use in front-end WebAssembly environments. Natively, the router
//! runs on top of an in-memory history, which is what the test-suite exercises.
//!
//! # Usage
//! ```
//! use webui_router::{NavigationMode, RouteEntry, Router, RouterOptions};
//!
//! let options = RouterOptions::builder()
//!     .mode(NavigationMode::History)
//!     .base("/")
//!     .routes(vec![
//!         RouteEntry::new("/", "Home", "home"),
//!         RouteEntry::deferred("/about", "About", || async { Ok("about") }),
//!     ])
//!     .build();
//!
//! let router = Router::new(options).expect("route table is valid");
//! assert_eq!(router.route("About").map(|route| route.path()), Some("/about"));
//! ```

pub mod callback;
pub mod history;
pub mod option;
pub mod route;
pub mod router;
pub mod webui;
mod util;

pub use history::{History, HistoryError, HistoryType, MemoryHistory, Subscription};
pub use option::{NavigationMode, RouterOptions};
pub use route::{DeferredView, LoadError, RouteEntry, View};
pub use router::{ConfigurationError, NavigationError, Resolution, Router};
pub use webui::{webui_router, webui_routes};

#[cfg(feature = "wasm-js")]
pub use history::wasm_js::{BrowserHistory, HashHistory};
