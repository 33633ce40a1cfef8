//! WASM bridge for overlays: context menus and multi-selects in the browser.
//!
//! Compiled via `wasm-pack build --target web`. Menus, configs and
//! multi-select inputs cross the boundary as JSON; callbacks back into JS
//! are plain functions.

mod platform;
pub mod wire;

pub use platform::WebPlatform;

use overlay_core::context_menu::{AnchorOverride, open_context_menu_at};
use overlay_core::dom::{DomEvent, EventKind};
use overlay_core::host::{OverlayHandle, OverlayHost};
use overlay_core::menu::MenuDescriptor;
use overlay_core::OverlayConfig;
use overlay_select::{
    MultiSelectProps, SelectError, SelectResponse, XMultiSelect, XMultiSelectProps,
};
use std::rc::Rc;
use wasm_bindgen::prelude::*;

fn js_error(message: &str) -> JsValue {
    js_sys::Error::new(message).into()
}

fn select_error(err: SelectError) -> JsValue {
    js_error(&err.to_string())
}

// ─── Context menus ───────────────────────────────────────────────────────

/// Opens context menus on the page. One per document is enough: all
/// instances share the page-wide menu gate.
#[wasm_bindgen]
pub struct ContextMenuBridge {
    host: OverlayHost,
}

#[wasm_bindgen]
impl ContextMenuBridge {
    /// `config_json` is an optional `OverlayConfig` (`{"zIndex": 1050, ...}`).
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<ContextMenuBridge, JsValue> {
        console_error_panic_hook_setup();
        let platform = WebPlatform::new().map_err(|e| js_error(&e))?;
        let mut host = OverlayHost::new(Rc::new(platform));
        if let Some(json) = config_json {
            host = host.with_config(OverlayConfig::from_json(&json).map_err(|e| js_error(&e))?);
        }
        Ok(Self { host })
    }

    /// Open `menu_json` at page coordinates. `on_click(key, keyPath)` runs
    /// for every enabled item selected. Returns `undefined` when another
    /// menu is already open.
    pub fn open_at(
        &self,
        menu_json: &str,
        page_x: f64,
        page_y: f64,
        on_click: js_sys::Function,
    ) -> Result<Option<MenuHandle>, JsValue> {
        let menu = wire::parse_menu(menu_json)
            .map_err(|e| js_error(&e))?
            .on_click(move |click| {
                let path: js_sys::Array =
                    click.key_path.iter().map(|key| JsValue::from_str(key)).collect();
                let key = JsValue::from_str(&click.key);
                if let Err(err) = on_click.call2(&JsValue::NULL, &key, &path) {
                    log::error!("menu on_click threw: {err:?}");
                }
            });
        let event = DomEvent::context_menu(None, page_x, page_y);
        let descriptor = MenuDescriptor::from(menu);
        Ok(
            open_context_menu_at(&self.host, &event, Some(&descriptor), AnchorOverride::default())
                .map(|handle| MenuHandle { handle }),
        )
    }

    pub fn is_menu_open(&self) -> bool {
        self.host.gate().is_held()
    }
}

/// An open context menu.
#[wasm_bindgen]
pub struct MenuHandle {
    handle: OverlayHandle,
}

#[wasm_bindgen]
impl MenuHandle {
    /// Close the menu. Safe to call more than once.
    pub fn destroy(&self) {
        self.handle.destroy();
    }

    pub fn is_destroyed(&self) -> bool {
        self.handle.is_destroyed()
    }

    /// Forward the dropdown's own visibility changes.
    pub fn notify_visible_change(&self, visible: bool) {
        self.handle.notify_visible_change(visible);
    }
}

// ─── Frame relay ─────────────────────────────────────────────────────────

/// Call from the preview frame's `wheel` handler (on the top window's
/// module instance) so open menus close.
#[wasm_bindgen]
pub fn relay_frame_wheel() -> Result<(), JsValue> {
    relay(EventKind::FrameWheel)
}

/// Call from the preview frame's `pointerdown` handler.
#[wasm_bindgen]
pub fn relay_frame_pointer_down() -> Result<(), JsValue> {
    relay(EventKind::FramePointerDown)
}

fn relay(kind: EventKind) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| js_error("no global window"))?;
    platform::relay_on(&window, kind)
}

// ─── Multi-select ────────────────────────────────────────────────────────

/// A string multi-select driven from JS.
///
/// JS forwards DOM interactions to `handle` as JSON, applies the returned
/// `EventResponse` JSON to the native event, and paints `render()`.
/// Changes are reported through `emit(name, a, b)`:
/// `select(item)` (return `false` to keep the list open), `unselect(item)`,
/// `reorder(from, to)`, `focusItem(item)`, `inputValueChange(text)`,
/// `blur()`, `outerClick()`, `click()`.
#[wasm_bindgen]
pub struct MultiSelectBridge {
    select: XMultiSelect<String>,
    emit: Rc<js_sys::Function>,
}

#[wasm_bindgen]
impl MultiSelectBridge {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, emit: js_sys::Function) -> Result<MultiSelectBridge, JsValue> {
        console_error_panic_hook_setup();
        let config = wire::parse_select_config(config_json).map_err(|e| js_error(&e))?;
        let emit = Rc::new(emit);
        let select = XMultiSelect::new(build_props(config, &emit));
        Ok(Self { select, emit })
    }

    /// Re-render with new props from JS. Uncontrolled state is kept.
    pub fn set_config(&mut self, config_json: &str) -> Result<(), JsValue> {
        let config = wire::parse_select_config(config_json).map_err(|e| js_error(&e))?;
        self.select.set_props(build_props(config, &self.emit));
        Ok(())
    }

    /// Apply one interaction; returns the `EventResponse` as JSON.
    pub fn handle(&mut self, input_json: &str) -> Result<String, JsValue> {
        let input = wire::parse_select_input(input_json).map_err(|e| js_error(&e))?;
        let response = self.select.handle(&input).map_err(select_error)?;
        serde_json::to_string(&response)
            .map_err(|e| js_error(&format!("Serialization error: {e}")))
    }

    /// The current `MultiSelectView` as JSON.
    pub fn render(&self) -> Result<String, JsValue> {
        let view = self.select.render().map_err(select_error)?;
        serde_json::to_string(&view).map_err(|e| js_error(&format!("Serialization error: {e}")))
    }

    /// The selection as a JSON array, whichever side owns it.
    pub fn selected_items(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.select.selected_items())
            .map_err(|e| js_error(&format!("Serialization error: {e}")))
    }
}

fn call_emit(emit: &js_sys::Function, name: &str, a: JsValue, b: JsValue) -> JsValue {
    match emit.call3(&JsValue::NULL, &JsValue::from_str(name), &a, &b) {
        Ok(value) => value,
        Err(err) => {
            log::error!("multi-select {name} callback threw: {err:?}");
            JsValue::UNDEFINED
        }
    }
}

fn build_props(
    config: wire::SelectConfig,
    emit: &Rc<js_sys::Function>,
) -> XMultiSelectProps<String> {
    let mut base = MultiSelectProps::new(config.options)
        .fixed_values(config.fixed_values)
        .pills_focusable(config.pills_focusable)
        .hide_close_button(config.hide_close_button)
        .auto_focus(config.auto_focus)
        .show_dropdown_arrow(config.show_dropdown_arrow);
    base.placeholder = config.placeholder;
    if config.disabled {
        base = base.disabled(config.disabled_tooltip.as_deref());
    }

    let e = emit.clone();
    base = base.on_select(move |item: &String| {
        // Only an explicit `false` keeps the list open.
        let returned = call_emit(&e, "select", JsValue::from_str(item), JsValue::UNDEFINED);
        SelectResponse::from(returned.as_bool() != Some(false))
    });
    let e = emit.clone();
    base = base.on_unselect(move |item: &String| {
        call_emit(&e, "unselect", JsValue::from_str(item), JsValue::UNDEFINED);
    });
    if config.reorderable {
        let e = emit.clone();
        base = base.on_reorder(move |from, to| {
            call_emit(&e, "reorder", JsValue::from(from as u32), JsValue::from(to as u32));
        });
    }
    if config.focus_controlled {
        let e = emit.clone();
        base = base
            .focused_item(config.focused_item)
            .on_focus_item(move |item: &String| {
                call_emit(&e, "focusItem", JsValue::from_str(item), JsValue::UNDEFINED);
            });
    }
    let e = emit.clone();
    base = base.on_input_value_change(move |text| {
        call_emit(&e, "inputValueChange", JsValue::from_str(text), JsValue::UNDEFINED);
    });
    let e = emit.clone();
    base = base.on_blur(move || {
        call_emit(&e, "blur", JsValue::UNDEFINED, JsValue::UNDEFINED);
    });
    let e = emit.clone();
    base = base.on_outer_click(move || {
        call_emit(&e, "outerClick", JsValue::UNDEFINED, JsValue::UNDEFINED);
    });
    let e = emit.clone();
    base = base.on_click(move || {
        call_emit(&e, "click", JsValue::UNDEFINED, JsValue::UNDEFINED);
    });

    let mut props = XMultiSelectProps::new(base)
        .default_selected_items(config.default_selected_items)
        .default_focused_item(config.default_focused_item);
    props.selected_items = config.selected_items;
    props
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Overlay WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
