use crate::editor::SlashEditor;
use crate::registry::build_registry;
use crate::SlashConfig;
use leptos::prelude::*;

const SAMPLE_TEXT: &str = "Meeting notes\nType / at the start of a line to turn it into a heading or a list.\n";

#[component]
pub fn EditorPage() -> impl IntoView {
    view! {
        <div class="mx-auto max-w-5xl space-y-3 px-4 py-8">
            <div class="space-y-1">
                <h1 class="text-xl font-semibold">"Editor"</h1>
                <p class="text-xs text-muted-foreground">
                    "Arrow keys move, Enter applies, Escape dismisses."
                </p>
            </div>
            <SlashEditor initial=SAMPLE_TEXT />
        </div>
    }
}

/// Every command the palette can offer, in registry order.
#[component]
pub fn CommandsPage() -> impl IntoView {
    let commands = build_registry(&SlashConfig::new().extra_commands);

    view! {
        <div class="mx-auto max-w-2xl space-y-3 px-4 py-8">
            <h1 class="text-xl font-semibold">"Commands"</h1>
            <div class="divide-y divide-border rounded-md border border-border">
                {commands
                    .into_iter()
                    .map(|c| {
                        let aliases = c
                            .aliases
                            .iter()
                            .map(|a| format!("/{a}"))
                            .collect::<Vec<_>>()
                            .join(" ");
                        view! {
                            <div class="flex items-baseline gap-3 px-3 py-2">
                                <span class="text-sm font-medium">{c.title.clone()}</span>
                                <span class="font-mono text-xs text-muted-foreground">{aliases}</span>
                                <span class="ml-auto truncate text-xs text-muted-foreground">
                                    {c.description.clone().unwrap_or_default()}
                                </span>
                            </div>
                        }
                    })
                    .collect_view()}
            </div>
        </div>
    }
}
