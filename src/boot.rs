//! Bridge to the loading shim in `index.html` (`window.__PB_BOOT`).

#[cfg(target_arch = "wasm32")]
use std::cell::Cell;

#[cfg(target_arch = "wasm32")]
use js_sys::{Array, Function, Object, Reflect};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{JsCast, JsValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BootPhase {
    Catalog,
    Document,
    Ready,
}

impl BootPhase {
    pub(crate) fn label(self) -> &'static str {
        match self {
            BootPhase::Catalog => "catalog",
            BootPhase::Document => "puzzle",
            BootPhase::Ready => "ready",
        }
    }
}

#[cfg(target_arch = "wasm32")]
thread_local! {
    static LAST_PHASE: Cell<Option<BootPhase>> = const { Cell::new(None) };
}

#[cfg(target_arch = "wasm32")]
fn shim() -> Option<Object> {
    let window = web_sys::window()?;
    let value = Reflect::get(&window, &JsValue::from_str("__PB_BOOT")).ok()?;
    if value.is_null() || value.is_undefined() {
        return None;
    }
    value.dyn_into::<Object>().ok()
}

#[cfg(target_arch = "wasm32")]
fn invoke(method: &str, args: &[JsValue]) {
    let Some(boot) = shim() else {
        return;
    };
    let Some(func) = Reflect::get(&boot, &JsValue::from_str(method))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
    else {
        return;
    };
    let _ = func.apply(&boot, &args.iter().collect::<Array>());
}

pub(crate) fn phase(phase: BootPhase, detail: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        LAST_PHASE.with(|last| last.set(Some(phase)));
        invoke(
            "setPhase",
            &[JsValue::from_str(phase.label()), JsValue::from_str(detail)],
        );
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (phase, detail);
    }
}

pub(crate) fn fail(message: &str, hint: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        let phase = LAST_PHASE.with(Cell::get).unwrap_or(BootPhase::Catalog);
        invoke(
            "fail",
            &[
                JsValue::from_str(phase.label()),
                JsValue::from_str(message),
                JsValue::from_str(hint),
            ],
        );
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (message, hint);
    }
}

/// Hides the loading shim. Only the first call after a load reaches it.
pub(crate) fn ready() {
    #[cfg(target_arch = "wasm32")]
    {
        let first = LAST_PHASE.with(|last| last.replace(Some(BootPhase::Ready))) != Some(BootPhase::Ready);
        if first {
            invoke("ready", &[]);
        }
    }
}
