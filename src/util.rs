#[cfg(not(target_family = "wasm"))]
pub(crate) use tokio::task::spawn_local;
#[cfg(target_family = "wasm")]
pub(crate) use wasm_bindgen_futures::spawn_local;
