use leptos::prelude::*;
use tw_merge::tw_merge;

use crate::models::BlockType;

fn block_class(block: BlockType) -> &'static str {
    match block {
        BlockType::Paragraph => "text-sm",
        BlockType::Heading1 => "text-2xl font-bold",
        BlockType::Heading2 => "text-xl font-semibold",
        BlockType::Heading3 => "text-lg font-semibold",
        BlockType::BulletListItem => "text-sm list-item list-disc ml-5",
        BlockType::NumberedListItem => "text-sm list-item list-decimal ml-5",
        BlockType::TaskListItem => "text-sm before:content-['☐_']",
        BlockType::Blockquote => "text-sm italic border-l-2 border-border-strong pl-3 text-muted-foreground",
        BlockType::CodeBlock => "font-mono text-xs rounded bg-muted px-2 py-1 whitespace-pre",
        BlockType::HorizontalRule => "my-2 h-px bg-border",
        BlockType::Table => "min-h-8 rounded border border-dashed border-border text-xs text-muted-foreground",
    }
}

/// Read-only rendering of the document blocks.
#[component]
pub fn BlockPreview(
    #[prop(into)] blocks: Signal<Vec<(BlockType, String)>>,
    #[prop(optional, into)] class: String,
) -> impl IntoView {
    let merged_class = tw_merge!("flex flex-col gap-1 rounded-md border p-3", class);

    view! {
        <div data-name="BlockPreview" class=merged_class>
            {move || {
                blocks
                    .get()
                    .into_iter()
                    .map(|(block, text)| {
                        view! {
                            <div data-block=block.to_string() class=block_class(block)>
                                {text}
                            </div>
                        }
                    })
                    .collect_view()
            }}
        </div>
    }
}
