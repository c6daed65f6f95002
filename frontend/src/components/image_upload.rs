//! Image collection widget with drag & drop.
//!
//! Dropped or picked files are summarized in the browser (blurhash +
//! thumbnail), shown immediately from an object URL and uploaded in the
//! background. Tiles can be reordered by dragging, annotated through
//! [`ImageMetaPopover`] or removed. Every change to the ordered list is
//! reported through `on_change`; a new `value` from the parent replaces
//! the list.

use std::collections::HashMap;

use imgdrop::{
    DragController, EntryKey, FileHandle, FileId, ImageCollection, ImageEntry, ImageMeta, LocalRef,
    ProgressTable, Summarizer, UploadStatus,
};
use leptos::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{DragEvent, File, FileList, HtmlInputElement, Url};

use crate::components::ImageMetaPopover;
use crate::services::upload_image;
use crate::{AppError, AppResult, TileView, ACCEPTED_TYPES, BACKEND_URL, MAX_FILE_SIZE, MAX_IMAGES};

/// Radius of the progress ring, in SVG units.
const RING_RADIUS: f64 = 18.0;

// =============================================================================
// Widget state
// =============================================================================

/// Reactive handles shared by every event handler of one widget.
#[derive(Clone, Copy)]
struct UploadWidget {
    collection: StoredValue<ImageCollection>,
    /// List captured by the collection listener, emitted once the
    /// collection is no longer borrowed.
    changed: StoredValue<Option<Vec<ImageEntry>>>,
    /// Browser files of pending entries, kept for retries.
    sources: StoredValue<HashMap<FileId, File>>,
    entries: RwSignal<Vec<ImageEntry>>,
    progress: RwSignal<ProgressTable>,
    error: RwSignal<Option<String>>,
    on_change: Callback<Vec<ImageEntry>>,
}

impl UploadWidget {
    fn new(
        max: usize,
        primary_image: bool,
        initial: Vec<ImageEntry>,
        on_change: Callback<Vec<ImageEntry>>,
    ) -> Self {
        let changed = store_value(None::<Vec<ImageEntry>>);
        let mut collection = ImageCollection::with_entries(max, primary_image, initial);
        let entries = create_rw_signal(collection.entries().to_vec());
        collection.on_change(move |list| changed.set_value(Some(list.to_vec())));

        Self {
            collection: store_value(collection),
            changed,
            sources: store_value(HashMap::new()),
            entries,
            progress: create_rw_signal(ProgressTable::new()),
            error: create_rw_signal(None),
            on_change,
        }
    }

    /// Run `f` against the collection, then publish the list if it changed.
    fn mutate<R>(self, f: impl FnOnce(&mut ImageCollection) -> R) -> Option<R> {
        let result = self.collection.try_update_value(f);
        if let Some(list) = self.changed.try_update_value(Option::take).flatten() {
            self.entries.set(list.clone());
            self.on_change.call(list);
        }
        result
    }

    fn available_slots(self) -> usize {
        self.collection
            .try_with_value(ImageCollection::available_slots)
            .unwrap_or(0)
    }

    /// Summarize, append and start uploading `files`.
    fn add_files(self, files: Vec<File>) {
        let slots = self.available_slots();
        if slots == 0 {
            log::info!("Ignoring {} file(s): image limit reached", files.len());
            return;
        }
        self.error.set(None);

        spawn_local(async move {
            let summarizer = Summarizer::default();
            let mut prepared = Vec::new();

            for file in files {
                if prepared.len() == slots {
                    log::info!("Ignoring {}: image limit reached", file.name());
                    continue;
                }
                match prepare(&summarizer, &file).await {
                    Ok(entry) => prepared.push((entry, file)),
                    Err(e) => {
                        log::warn!("Skipping {}: {}", file.name(), e);
                        self.error.set(Some(format!("{}: {}", file.name(), e)));
                    }
                }
            }

            let (entries, files): (Vec<ImageEntry>, Vec<File>) = prepared.into_iter().unzip();
            let ids: Vec<FileId> = entries
                .iter()
                .filter_map(|e| e.source_handle().map(FileHandle::id))
                .collect();
            let accepted = self.mutate(|c| c.append(entries)).map_or(0, |keys| keys.len());

            for (id, file) in ids.into_iter().zip(files).take(accepted) {
                self.sources.update_value(|s| {
                    s.insert(id, file.clone());
                });
                self.start_upload(id, file);
            }
        });
    }

    fn start_upload(self, id: FileId, file: File) {
        self.progress.update(|t| t.start(id));

        spawn_local(async move {
            match upload_image(&file, BACKEND_URL).await {
                Ok(remote_id) => {
                    log::info!("📤 Uploaded {} as {}", file.name(), remote_id);
                    self.progress.update(|t| {
                        t.finish(id);
                    });
                    self.sources.update_value(|s| {
                        s.remove(&id);
                    });
                    self.mutate(|c| c.complete_upload(id, remote_id));
                }
                Err(e) => {
                    log::error!("❌ Upload of {} failed: {}", file.name(), e);
                    let listed = self
                        .collection
                        .try_with_value(|c| c.find_by_file(id).is_some())
                        .unwrap_or(false);
                    self.progress.update(|t| {
                        self.sources
                            .update_value(|s| record_failure(t, s, id, listed, e.to_string()));
                    });
                }
            }
        });
    }

    fn retry(self, key: EntryKey) {
        let Some(id) = self
            .collection
            .try_with_value(|c| c.get(key).and_then(|e| e.source_handle()).map(FileHandle::id))
            .flatten()
        else {
            return;
        };
        if !self
            .progress
            .with_untracked(|t| matches!(t.get(id), Some(UploadStatus::Failed(_))))
        {
            return;
        }
        if let Some(file) = self.sources.with_value(|s| s.get(&id).cloned()) {
            self.start_upload(id, file);
        }
    }

    fn remove(self, key: EntryKey) {
        let Some(removed) = self.mutate(|c| c.remove(key)).flatten() else {
            return;
        };
        if let Some(id) = removed.source_handle().map(FileHandle::id) {
            self.progress.update(|t| {
                t.finish(id);
            });
            self.sources.update_value(|s| {
                s.remove(&id);
            });
        }
    }
}

/// Mark `id` as failed, or forget it entirely when its entry is gone.
fn record_failure<F>(
    progress: &mut ProgressTable,
    sources: &mut HashMap<FileId, F>,
    id: FileId,
    listed: bool,
    reason: String,
) {
    if listed {
        progress.fail(id, reason);
    } else {
        progress.finish(id);
        sources.remove(&id);
    }
}

/// Read, summarize and wrap one browser file.
async fn prepare(summarizer: &Summarizer, file: &File) -> AppResult<ImageEntry> {
    if file.size() as usize > MAX_FILE_SIZE {
        return Err(AppError::File(format!(
            "larger than {} MB",
            MAX_FILE_SIZE / (1024 * 1024)
        )));
    }

    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| AppError::File(format!("Failed to read file: {:?}", e)))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();

    let summary = summarizer
        .summarize(&bytes)
        .map_err(|e| AppError::File(e.to_string()))?;

    let url = Url::create_object_url_with_blob(file)
        .map_err(|e| AppError::File(format!("Failed to create object URL: {:?}", e)))?;
    let local = LocalRef::with_release(url, |uri| {
        let _ = Url::revoke_object_url(uri);
    });

    Ok(ImageEntry::pending(FileHandle::new(file.name(), bytes), local, summary))
}

fn file_list_to_vec(list: &FileList) -> Vec<File> {
    (0..list.length()).filter_map(|i| list.get(i)).collect()
}

// =============================================================================
// Component
// =============================================================================

#[component]
pub fn ImageUpload(
    /// Externally owned list; a different list replaces the current one.
    #[prop(into)]
    value: Signal<Vec<ImageEntry>>,
    /// Receives the ordered list after every change.
    #[prop(into)]
    on_change: Callback<Vec<ImageEntry>>,
    #[prop(default = MAX_IMAGES)] max: usize,
    /// Feature the first image.
    #[prop(optional)]
    primary_image: bool,
) -> impl IntoView {
    let widget = UploadWidget::new(max, primary_image, value.get_untracked(), on_change);
    let drag = create_rw_signal(DragController::new());
    let editing = create_rw_signal(None::<EntryKey>);

    // The first run only subscribes; the collection already holds `value`.
    create_effect(move |prev: Option<()>| {
        let external = value.get();
        if prev.is_some() {
            widget.mutate(|c| c.reconcile(external));
        }
    });

    let tiles = create_memo(move |_| {
        widget.progress.with(|table| {
            widget.entries.with(|list| {
                list.iter()
                    .enumerate()
                    .map(|(i, e)| TileView::new(e, primary_image && i == 0, table.status_of(e)))
                    .collect::<Vec<_>>()
            })
        })
    });

    let on_input_change = move |ev: ev::Event| {
        let input: HtmlInputElement = event_target(&ev);
        if let Some(files) = input.files() {
            widget.add_files(file_list_to_vec(&files));
        }
        input.set_value("");
    };

    let on_zone_drop = move |ev: DragEvent| {
        ev.prevent_default();
        if drag.with_untracked(DragController::is_dragging) {
            drag.update(DragController::cancel);
            return;
        }
        if let Some(files) = ev.data_transfer().and_then(|dt| dt.files()) {
            widget.add_files(file_list_to_vec(&files));
        }
    };

    let trigger_file_input = move |_| {
        if let Some(input) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("imageInput"))
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            input.click();
        }
    };

    let tile_view = move |tile: TileView| {
        let key = tile.key;
        let progress = tile.progress.clone();

        let on_drag_start = move |ev: DragEvent| {
            if let Some(dt) = ev.data_transfer() {
                dt.set_effect_allowed("move");
                let _ = dt.set_data("text/plain", &key.to_string());
            }
            drag.update(|d| {
                d.start(key);
            });
        };
        let on_drag_over = move |ev: DragEvent| {
            if drag.with_untracked(|d| d.is_dragging()) {
                ev.prevent_default();
                if drag.with_untracked(|d| d.over() != Some(key)) {
                    drag.update(|d| d.set_over(Some(key)));
                }
            }
        };
        let on_drop = move |ev: DragEvent| {
            if !drag.with_untracked(DragController::is_dragging) {
                return;
            }
            ev.prevent_default();
            ev.stop_propagation();
            let mut controller = drag.get_untracked();
            if let Some(Some((moved, target))) = widget.mutate(|c| controller.end(c)) {
                log::debug!("Moved {} onto {}", moved, target);
            }
            drag.set(controller);
        };

        view! {
            <div
                class="image-tile"
                class:dragging=move || drag.with(|d| d.active() == Some(key))
                class:drop-target=move || drag.with(|d| d.over() == Some(key) && d.active() != Some(key))
                draggable="true"
                on:dragstart=on_drag_start
                on:dragover=on_drag_over
                on:drop=on_drop
                on:dragend=move |_| drag.update(DragController::cancel)
            >
                <img class="tile-placeholder" src=tile.placeholder.clone() alt=""/>
                <img
                    class="tile-image"
                    src=tile.src.clone()
                    alt=tile.name.clone()
                    width=tile.width
                    height=tile.height
                />

                <Show when=move || tile.primary fallback=|| ()>
                    <span class="badge-primary">"⭐ Primary"</span>
                </Show>

                {progress.shows_indicator().then(|| {
                    let circumference = 2.0 * std::f64::consts::PI * RING_RADIUS;
                    view! {
                        <svg class="progress-ring" viewBox="0 0 40 40">
                            <circle
                                cx="20"
                                cy="20"
                                r=RING_RADIUS
                                stroke-dasharray=circumference
                                stroke-dashoffset=tile.ring_offset(RING_RADIUS)
                            />
                        </svg>
                    }
                })}

                {progress.is_failed().then(|| view! {
                    <button class="btn-icon tile-retry" title="Retry upload" on:click=move |_| widget.retry(key)>
                        "🔁"
                    </button>
                })}

                <div class="tile-actions">
                    <button
                        class="btn-icon"
                        class:has-meta=tile.has_meta
                        title="Edit metadata"
                        on:click=move |_| editing.set(Some(key))
                    >
                        "✏️"
                    </button>
                    <button
                        class="btn-icon"
                        title="Remove"
                        on:click=move |_| {
                            if editing.get_untracked() == Some(key) {
                                editing.set(None);
                            }
                            widget.remove(key);
                        }
                    >
                        "🗑️"
                    </button>
                </div>
            </div>
        }
    };

    let popover = move || {
        editing.get().map(|key| {
            let meta = widget
                .entries
                .with_untracked(|list| list.iter().find(|e| e.key() == key).and_then(|e| e.meta.clone()));
            view! {
                <ImageMetaPopover
                    meta=meta
                    on_submit={move |meta: Option<ImageMeta>| {
                        widget.mutate(|c| c.edit(key, meta));
                        editing.set(None);
                    }}
                    on_close=move |_: ()| editing.set(None)
                />
            }
        })
    };

    view! {
        <div class="image-upload">
            <div
                class="upload-section"
                on:dragover=|ev: DragEvent| ev.prevent_default()
                on:drop=on_zone_drop
                on:click=trigger_file_input
            >
                <div class="upload-icon">"🖼️"</div>
                <div class="upload-text">"Drop images here"</div>
                <div class="upload-hint">
                    {move || format!("or click to select ({} / {})", widget.entries.with(Vec::len), max)}
                </div>
                <input
                    type="file"
                    id="imageInput"
                    accept=ACCEPTED_TYPES
                    multiple=true
                    style="display:none"
                    on:change=on_input_change
                    on:click=|ev| ev.stop_propagation()
                />
            </div>

            <Show when=move || widget.error.with(Option::is_some) fallback=|| ()>
                <div class="error-message">{move || widget.error.get().unwrap_or_default()}</div>
            </Show>

            <div class="image-grid">
                <For
                    each=move || tiles.get()
                    key=|tile| {
                        (
                            tile.key,
                            tile.src.clone(),
                            tile.primary,
                            tile.has_meta,
                            tile.progress.percent(),
                            tile.progress.is_failed(),
                        )
                    }
                    children=tile_view
                />
            </div>

            {popover}
        </div>
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_of_listed_entry_keeps_file_for_retry() {
        let id = FileHandle::new("a.png", vec![0u8]).id();
        let mut progress = ProgressTable::new();
        let mut sources = HashMap::from([(id, ())]);
        progress.start(id);

        record_failure(&mut progress, &mut sources, id, true, "offline".into());

        assert_eq!(progress.get(id), Some(&UploadStatus::Failed("offline".into())));
        assert!(sources.contains_key(&id));
    }

    #[test]
    fn test_failure_of_removed_entry_drops_file() {
        let id = FileHandle::new("a.png", vec![0u8]).id();
        let mut progress = ProgressTable::new();
        let mut sources = HashMap::from([(id, ())]);
        progress.start(id);

        record_failure(&mut progress, &mut sources, id, false, "offline".into());

        assert!(progress.get(id).is_none());
        assert!(sources.is_empty());
    }
}
