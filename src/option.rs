//! Router options and base path handling.
//!
//! This module provides the construction options for [`Router`](crate::Router), the
//! navigation modes it understands and the helpers that apply the deployment base path.

use crate::{route::RouteEntry, router::ConfigurationError};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The base path supplied by the build environment through the `BASE_URL` variable.
pub const BASE_URL: Option<&str> = option_env!("BASE_URL");

/// How paths are represented in the browser's address bar.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    /// Paths render without a fragment marker, using `pushState`.
    ///
    /// The hosting web server has to serve the application entry point for every unknown path.
    #[default]
    History,
    /// Paths live in the URL fragment (`#/spectrum`).
    Hash,
}

impl NavigationMode {
    /// Returns the configuration string of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationMode::History => "history",
            NavigationMode::Hash => "hash",
        }
    }
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NavigationMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "history" => Ok(NavigationMode::History),
            "hash" => Ok(NavigationMode::Hash),
            other => Err(ConfigurationError::InvalidMode(other.to_string())),
        }
    }
}

/// Options for [`Router::new`](crate::Router::new).
#[derive(bon::Builder)]
#[builder(on(String, into))]
pub struct RouterOptions<V> {
    /// The navigation mode. Defaults to [`NavigationMode::History`].
    #[builder(default)]
    pub mode: NavigationMode,

    /// Prefix applied to every route path.
    ///
    /// If not provided, [`BASE_URL`] is used. In the browser, the `href` of the document's
    /// `<base>` element is consulted next, and `/` is the last resort.
    pub base: Option<String>,

    /// The ordered route table. The first matching entry wins.
    #[builder(default)]
    pub routes: Vec<RouteEntry<V>>,
}

/// Normalizes a base path: a leading `/` is ensured and trailing slashes are removed.
///
/// The root base `/` normalizes to the empty prefix.
pub fn normalize_base(base: &str) -> String {
    let base = base.trim();
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return String::new();
    }
    if base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{base}")
    }
}

/// Removes a normalized base from the start of a location, returning the app-relative path.
pub fn strip_base(location: &str, base: &str) -> String {
    let stripped = match location.get(..base.len()) {
        Some(prefix) if !base.is_empty() && prefix.eq_ignore_ascii_case(base) => {
            let rest = &location[base.len()..];
            if rest.is_empty() || rest.starts_with(['/', '?', '#']) {
                rest
            } else {
                location
            }
        }
        _ => location,
    };
    if stripped.is_empty() {
        "/".to_string()
    } else if stripped.starts_with(['?', '#']) {
        format!("/{stripped}")
    } else {
        stripped.to_string()
    }
}

/// Picks the base path for a router: the explicit one, then the build environment, then the
/// document, then the root.
pub(crate) fn resolve_base(explicit: Option<&str>) -> String {
    if let Some(base) = explicit.or(BASE_URL) {
        return normalize_base(base);
    }
    #[cfg(all(feature = "wasm-js", target_family = "wasm"))]
    if let Some(base) = crate::history::wasm_js::document_base() {
        return normalize_base(&base);
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{Token, assert_tokens};

    #[test]
    fn test_normalize_base() {
        assert_eq!(normalize_base("/"), "");
        assert_eq!(normalize_base(""), "");
        assert_eq!(normalize_base("/ils/"), "/ils");
        assert_eq!(normalize_base("ils"), "/ils");
        assert_eq!(normalize_base("/webui/app//"), "/webui/app");
    }

    #[test]
    fn test_strip_base() {
        assert_eq!(strip_base("/ils/spectrum", "/ils"), "/spectrum");
        assert_eq!(strip_base("/ILS/spectrum", "/ils"), "/spectrum");
        assert_eq!(strip_base("/ils", "/ils"), "/");
        assert_eq!(strip_base("/ils?tab=1", "/ils"), "/?tab=1");
        assert_eq!(strip_base("/spectrum", ""), "/spectrum");
        assert_eq!(strip_base("/other/spectrum", "/ils"), "/other/spectrum");
        assert_eq!(strip_base("/ilsx/spectrum", "/ils"), "/ilsx/spectrum");
    }

    #[test]
    fn test_navigation_mode_serde() {
        assert_tokens(
            &NavigationMode::History,
            &[Token::UnitVariant {
                name: "NavigationMode",
                variant: "history",
            }],
        );
        assert_tokens(
            &NavigationMode::Hash,
            &[Token::UnitVariant {
                name: "NavigationMode",
                variant: "hash",
            }],
        );

        let mode: NavigationMode = serde_json::from_str("\"hash\"").unwrap();
        assert_eq!(mode, NavigationMode::Hash);
    }

    #[test]
    fn test_navigation_mode_from_str() {
        assert_eq!(
            "history".parse::<NavigationMode>(),
            Ok(NavigationMode::History)
        );
        assert_eq!("hash".parse::<NavigationMode>(), Ok(NavigationMode::Hash));
        assert_eq!(
            "abstract".parse::<NavigationMode>(),
            Err(ConfigurationError::InvalidMode("abstract".to_string()))
        );
    }

    #[test]
    fn test_router_options_defaults() {
        let options = RouterOptions::<&str>::builder().build();
        assert_eq!(options.mode, NavigationMode::History);
        assert!(options.base.is_none());
        assert!(options.routes.is_empty());
    }
}
