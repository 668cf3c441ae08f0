use crate::pages::{CommandsPage, EditorPage};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    // Leptos CSR requires the `csr` feature on `leptos`.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("commands") view=CommandsPage />
                <Route path=path!("") view=EditorPage />
            </Routes>
        </Router>
    }
}
