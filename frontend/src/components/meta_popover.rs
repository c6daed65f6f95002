//! Generation metadata form shown over a thumbnail.
//!
//! Edits a local [`MetaForm`] copy; nothing reaches the list until
//! "Save". Closing discards the draft.

use imgdrop::{ImageMeta, MetaForm, MAX_CFG_SCALE, SAMPLERS};
use leptos::*;

#[component]
pub fn ImageMetaPopover(
    /// Current metadata of the entry.
    meta: Option<ImageMeta>,
    /// Receives the submitted metadata (`None` when every field is blank).
    #[prop(into)]
    on_submit: Callback<Option<ImageMeta>>,
    #[prop(into)] on_close: Callback<()>,
) -> impl IntoView {
    let initial = store_value(MetaForm::from_meta(meta.as_ref()));
    let form = create_rw_signal(initial.get_value());

    let on_form_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        on_submit.call(form.get_untracked().submit());
    };

    let on_cancel = move |_| {
        form.set(initial.get_value());
        on_close.call(());
    };

    let on_clear = move |_| on_submit.call(None);

    view! {
        <div class="meta-popover" on:click=|ev| ev.stop_propagation()>
            <form on:submit=on_form_submit>
                <label>
                    "Prompt"
                    <textarea
                        rows="3"
                        prop:value=move || form.with(|f| f.prompt.clone())
                        on:input=move |ev| form.update(|f| f.prompt = event_target_value(&ev))
                    />
                </label>

                <label>
                    "Negative prompt"
                    <textarea
                        rows="2"
                        prop:value=move || form.with(|f| f.negative_prompt.clone())
                        on:input=move |ev| form.update(|f| f.negative_prompt = event_target_value(&ev))
                    />
                </label>

                <div class="meta-row">
                    <label>
                        "CFG scale"
                        <input
                            type="number"
                            min="0"
                            max=MAX_CFG_SCALE.to_string()
                            step="0.5"
                            prop:value=move || form.with(|f| number_text(f.cfg_scale))
                            on:input=move |ev| form.update(|f| f.cfg_scale = event_target_value(&ev).parse().ok())
                        />
                    </label>
                    <label>
                        "Steps"
                        <input
                            type="number"
                            min="0"
                            step="1"
                            prop:value=move || form.with(|f| number_text(f.steps))
                            on:input=move |ev| form.update(|f| f.steps = event_target_value(&ev).parse().ok())
                        />
                    </label>
                </div>

                <div class="meta-row">
                    <label>
                        "Sampler"
                        <select on:change=move |ev| {
                            let value = event_target_value(&ev);
                            form.update(|f| f.sampler = (!value.is_empty()).then_some(value));
                        }>
                            <option value="" selected=move || form.with(|f| f.sampler.is_none())>
                                "None"
                            </option>
                            {SAMPLERS
                                .iter()
                                .map(|&name| {
                                    view! {
                                        <option
                                            value=name
                                            selected=move || form.with(|f| f.sampler.as_deref() == Some(name))
                                        >
                                            {name}
                                        </option>
                                    }
                                })
                                .collect_view()}
                        </select>
                    </label>
                    <label>
                        "Seed"
                        <input
                            type="number"
                            min="0"
                            prop:value=move || form.with(|f| number_text(f.seed))
                            on:input=move |ev| form.update(|f| f.seed = event_target_value(&ev).parse().ok())
                        />
                    </label>
                </div>

                <div class="meta-actions">
                    <button type="button" class="btn btn-secondary" on:click=on_clear>"Clear"</button>
                    <button type="button" class="btn btn-secondary" on:click=on_cancel>"Cancel"</button>
                    <button type="submit" class="btn btn-primary">"Save"</button>
                </div>
            </form>
        </div>
    }
}

fn number_text<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
