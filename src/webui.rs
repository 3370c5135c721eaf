//! The route table of the ILS monitor web UI.
//!
//! The views are supplied by the host application; this module only fixes which path and
//! name each of them lives under. The About view is split off and loaded on first visit.

use crate::{
    option::{NavigationMode, RouterOptions},
    route::{LoadError, RouteEntry},
    router::{ConfigurationError, Router},
};
use std::future::Future;

pub const HOME: &str = "Home";
pub const SPECTRUM: &str = "Spectrum";
pub const GENERATOR: &str = "Generator";
pub const ABOUT: &str = "About";

/// Builds the route table: `/`, `/spectrum` and `/generator` bound directly, `/about` deferred.
pub fn webui_routes<V, F, Fut>(home: V, spectrum: V, generator: V, about: F) -> Vec<RouteEntry<V>>
where
    V: Clone + 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<V, LoadError>> + 'static,
{
    vec![
        RouteEntry::new("/", HOME, home),
        RouteEntry::new("/spectrum", SPECTRUM, spectrum),
        RouteEntry::new("/generator", GENERATOR, generator),
        RouteEntry::deferred("/about", ABOUT, about),
    ]
}

/// Builds the web UI router in history mode with the base path of the build environment.
pub fn webui_router<V, F, Fut>(
    home: V,
    spectrum: V,
    generator: V,
    about: F,
) -> Result<Router<V>, ConfigurationError>
where
    V: Clone + 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<V, LoadError>> + 'static,
{
    let options = RouterOptions::builder()
        .mode(NavigationMode::History)
        .routes(webui_routes(home, spectrum, generator, about))
        .build();
    Router::new(options)
}

#[cfg(all(test, not(target_family = "wasm")))]
mod tests {
    use super::*;
    use crate::{History, MemoryHistory, NavigationError};
    use std::{cell::Cell, rc::Rc};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Page {
        Home,
        Spectrum,
        Generator,
        About,
    }

    fn router_with_counter() -> (Router<Rc<Page>>, MemoryHistory, Rc<Cell<usize>>) {
        let loads = Rc::new(Cell::new(0));
        let loads_clone = loads.clone();
        let routes = webui_routes(
            Rc::new(Page::Home),
            Rc::new(Page::Spectrum),
            Rc::new(Page::Generator),
            move || {
                let loads = loads_clone.clone();
                async move {
                    loads.set(loads.get() + 1);
                    Ok(Rc::new(Page::About))
                }
            },
        );
        let history = MemoryHistory::default();
        let options = RouterOptions::builder().base("/").routes(routes).build();
        let router = Router::with_history(options, history.clone()).unwrap();
        (router, history, loads)
    }

    #[test]
    fn test_webui_router() {
        let router = webui_router("home", "spectrum", "generator", || async { Ok("about") })
            .unwrap();
        assert_eq!(router.mode(), NavigationMode::History);
        let names: Vec<&str> = router.routes().iter().map(|route| route.name()).collect();
        assert_eq!(names, vec![HOME, SPECTRUM, GENERATOR, ABOUT]);
    }

    #[tokio::test]
    async fn test_direct_views() {
        let (router, _, _) = router_with_counter();

        let home = router.resolve("/").await.unwrap();
        assert_eq!(home.name, HOME);
        assert_eq!(*home.view, Page::Home);

        let spectrum = router.resolve("/spectrum").await.unwrap();
        assert_eq!(spectrum.name, SPECTRUM);
        assert_eq!(*spectrum.view, Page::Spectrum);

        let generator = router.resolve("/generator").await.unwrap();
        assert_eq!(generator.name, GENERATOR);
        assert_eq!(*generator.view, Page::Generator);
    }

    #[tokio::test]
    async fn test_about_is_loaded_once() {
        let (router, _, loads) = router_with_counter();
        assert!(!router.route(ABOUT).unwrap().view().is_ready());

        let first = router.resolve("/about").await.unwrap();
        assert_eq!(loads.get(), 1);

        let second = router.resolve("/about").await.unwrap();
        assert_eq!(loads.get(), 1);
        assert!(Rc::ptr_eq(&first.view, &second.view));
        assert_eq!(*second.view, Page::About);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let (router, history, _) = router_with_counter();
        router.resolve("/spectrum").await.unwrap();

        let err = router.resolve("/does-not-exist").await.unwrap_err();
        assert!(matches!(err, NavigationError::NotFound { .. }));
        assert_eq!(history.entries(), vec!["/", "/spectrum"]);
        assert_eq!(history.location(), "/spectrum");
    }

    #[tokio::test]
    async fn test_history_round_trip() {
        let (router, history, _) = router_with_counter();
        router.resolve("/generator").await.unwrap();

        router.resolve("/spectrum").await.unwrap();
        let back = router.back().await.unwrap();

        assert_eq!(back.name, GENERATOR);
        assert_eq!(history.location(), "/generator");
    }
}
