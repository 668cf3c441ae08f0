use icons::Check;
use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;
use leptos_ui::clx;
use tw_merge::*;

use crate::menu::{place_menu, MenuSnapshot, Side, Size};

/// Upper bound of the rendered menu, used for flip/clamp decisions.
const MENU_SIZE: Size = Size {
    width: 288.0,
    height: 320.0,
};

mod components {
    use super::*;
    clx! {SlashMenuList, div, "flex flex-col gap-0.5 max-h-80 overflow-y-auto overflow-x-hidden"}
    clx! {SlashMenuTitle, div, "truncate text-sm font-medium"}
    clx! {SlashMenuDescription, div, "truncate text-xs text-muted-foreground"}
}

pub use components::*;

fn viewport_size() -> Size {
    let Some(window) = web_sys::window() else {
        return Size::default();
    };
    let px = |v: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
    };
    Size {
        width: px(window.inner_width()),
        height: px(window.inner_height()),
    }
}

#[component]
pub fn SlashMenuItem(
    children: Children,
    #[prop(optional, into)] class: String,
    on_pick: Callback<()>,
    on_hover: Callback<()>,
    selected: bool,
) -> impl IntoView {
    let merged_class = tw_merge!(
        "group relative flex gap-2 items-center px-2 py-1.5 rounded-sm cursor-default select-none outline-none hover:cursor-pointer aria-selected:bg-accent aria-selected:text-accent-foreground",
        class
    );
    let check_class = "ml-auto size-4 shrink-0 text-muted-foreground hidden group-aria-selected:block";

    view! {
        <div
            data-name="SlashMenuItem"
            class=merged_class
            role="option"
            aria-selected=selected.to_string()
            on:mousedown=move |ev: web_sys::MouseEvent| {
                // Keep focus in the editor; blur would close the menu first.
                ev.prevent_default();
                on_pick.run(());
            }
            on:mousemove=move |_| on_hover.run(())
        >
            <div class="min-w-0 flex-1">{children()}</div>
            <Check class=check_class />
        </div>
    }
}

/// Candidate list anchored under (or above) the caret.
#[component]
pub fn SlashMenu(
    #[prop(into)] menu: Signal<MenuSnapshot>,
    on_select: Callback<usize>,
    on_hover: Callback<usize>,
    #[prop(optional, into)] class: String,
) -> impl IntoView {
    let class_sv = StoredValue::new(tw_merge!(
        "fixed z-50 w-72 max-w-[90vw] rounded-md border border-border-strong bg-background p-1 text-foreground shadow-lg",
        class
    ));

    // Re-place an open menu when the window is resized.
    let viewport: RwSignal<Size> = RwSignal::new(viewport_size());
    let resize_handle = window_event_listener(ev::resize, move |_ev: web_sys::UiEvent| {
        viewport.set(viewport_size());
    });
    on_cleanup(move || resize_handle.remove());

    move || {
        let snap = menu.get();
        let Some(anchor) = snap.anchor.filter(|_| snap.is_open) else {
            return ().into_any();
        };

        let placement = place_menu(anchor, viewport.get(), MENU_SIZE);
        let side = match placement.side {
            Side::Below => "below",
            Side::Above => "above",
        };
        let selected_index = snap.selected_index;

        view! {
            <div
                data-name="SlashMenu"
                data-side=side
                role="listbox"
                class=class_sv.get_value()
                style=format!("top: {}px; left: {}px;", placement.top, placement.left)
            >
                <SlashMenuList>
                    {snap
                        .candidates
                        .into_iter()
                        .enumerate()
                        .map(|(i, c)| {
                            let description = c.description.clone();
                            view! {
                                <SlashMenuItem
                                    selected=i == selected_index
                                    on_pick=Callback::new(move |_| on_select.run(i))
                                    on_hover=Callback::new(move |_| on_hover.run(i))
                                    attr:data-command-id=c.id.clone()
                                >
                                    <SlashMenuTitle>{c.title.clone()}</SlashMenuTitle>
                                    {description
                                        .map(|d| view! { <SlashMenuDescription>{d}</SlashMenuDescription> })}
                                </SlashMenuItem>
                            }
                        })
                        .collect_view()}
                </SlashMenuList>
            </div>
        }
        .into_any()
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_viewport_size_reads_window() {
        let size = viewport_size();
        assert!(size.width > 0.0);
        assert!(size.height > 0.0);
    }
}
