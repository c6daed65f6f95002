//! Post edit page (`/posts/:post_id/edit`).

use imgdrop::{ImageEntry, PersistedImage};
use leptos::*;
use leptos_meta::Title;
use leptos_router::use_params_map;

use crate::components::ImageUpload;
use crate::MAX_IMAGES;

#[component]
pub fn EditPostPage() -> impl IntoView {
    let params = use_params_map();
    let post_id = move || params.with(|p| p.get("post_id").cloned().unwrap_or_default());

    let images = create_rw_signal(Vec::<ImageEntry>::new());
    let saved = create_rw_signal(None::<String>);

    let uploading = move || images.with(|list| list.iter().filter(|e| !e.is_uploaded()).count());

    let on_save = move |_: ev::MouseEvent| {
        let persisted: Vec<PersistedImage> = images.with(|list| {
            list.iter().filter_map(ImageEntry::to_persisted).collect()
        });
        match serde_json::to_string_pretty(&persisted) {
            Ok(json) => {
                log::info!("💾 Saving {} image(s) for post {}", persisted.len(), post_id());
                saved.set(Some(json));
            }
            Err(e) => log::error!("❌ Failed to serialize images: {}", e),
        }
    };

    view! {
        <Title text=move || format!("Edit post {}", post_id())/>

        <div class="container">
            <h1 class="page-title">"Edit post " {post_id}</h1>

            <ImageUpload
                value=images
                on_change={move |list: Vec<ImageEntry>| images.set(list)}
                max=MAX_IMAGES
                primary_image=true
            />

            <div class="post-footer">
                <span class="upload-hint">
                    {move || match uploading() {
                        0 => format!("{} image(s)", images.with(Vec::len)),
                        n => format!("⏳ {} upload(s) in progress", n),
                    }}
                </span>
                <button
                    class="btn btn-primary"
                    disabled=move || uploading() > 0
                    on:click=on_save
                >
                    "Save"
                </button>
            </div>

            <Show when=move || saved.with(Option::is_some) fallback=|| ()>
                <pre class="saved-images">{move || saved.get().unwrap_or_default()}</pre>
            </Show>
        </div>
    }
}
