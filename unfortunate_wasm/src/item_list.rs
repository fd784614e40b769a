use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use unfortunate_core::items::{display_colors, is_already_added, validate_title};
use unfortunate_core::{
    assign_colors, to_percent, ColorPair, Debouncer, Item, WheelError, MIN_PROBABILITY,
    PROBABILITY_STEP, TITLE_DEBOUNCE,
};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, HtmlInputElement, Url};
use yew::prelude::*;

use crate::app::{clock, confirm, use_wheel};

const IMPORT_FAILED: &str = "Failed to fetch specified URL or parse its contents as JSON";
const EXPORT_NAME: &str = "wheel.json";

fn input_value<E: TargetCast>(e: &E) -> String {
    e.target_unchecked_into::<HtmlInputElement>().value()
}

fn swatch(colors: &ColorPair) -> String {
    format!("color: {}; background: {};", colors.fg, colors.bg)
}

type TimerSlot = Rc<RefCell<Option<Timeout>>>;
type TitleDebouncer = Rc<RefCell<Debouncer<String>>>;

/// Arms a browser timeout for the debouncer's pending title.
fn arm(timer: TimerSlot, debouncer: TitleDebouncer, on_ready: Callback<String>) {
    let Some(due) = debouncer.borrow().due_at() else {
        return;
    };
    let wait = due.saturating_sub(clock()).as_millis() as u32;
    let slot = timer.clone();
    let timeout = Timeout::new(wait, move || {
        let ready = debouncer.borrow_mut().poll(clock());
        match ready {
            Some(title) => on_ready.emit(title),
            // fired ahead of the clock; re-arm after this callback returns
            None => wasm_bindgen_futures::spawn_local(async move {
                arm(slot, debouncer, on_ready)
            }),
        }
    });
    *timer.borrow_mut() = Some(timeout);
}

#[function_component(ItemAddForm)]
fn item_add_form() -> Html {
    let ctx = use_wheel();
    let title = use_state(String::new);
    let weight = use_state(|| MIN_PROBABILITY);
    let preview = use_state(|| None::<ColorPair>);
    let error = use_state(|| None::<String>);
    let ready = use_state(|| false);
    let debouncer = use_mut_ref(|| Debouncer::new(TITLE_DEBOUNCE));
    let timer = use_mut_ref(|| None::<Timeout>);

    let (unassigned, fulfilled) = {
        let store = ctx.store.borrow();
        (store.unassigned_probability(), store.is_fulfilled())
    };
    if fulfilled {
        return html! {
            <p class="notice">{ WheelError::ProbabilityFulfilled.to_string() }</p>
        };
    }
    let max = unassigned.max(MIN_PROBABILITY);

    let on_ready = {
        let store = ctx.store.clone();
        let preview = preview.clone();
        let error = error.clone();
        let ready = ready.clone();
        Callback::from(move |candidate: String| {
            if is_already_added(&candidate, store.borrow().items()) {
                error.set(Some(WheelError::DuplicateTitle(candidate).to_string()));
                return;
            }
            preview.set(Some(assign_colors(&candidate)));
            error.set(None);
            ready.set(true);
        })
    };

    let on_title = {
        let title = title.clone();
        let preview = preview.clone();
        let error = error.clone();
        let ready = ready.clone();
        Callback::from(move |e: InputEvent| {
            let value = input_value(&e);
            title.set(value.clone());
            preview.set(None);
            ready.set(false);
            if let Err(err) = validate_title(&value) {
                debouncer.borrow_mut().cancel();
                timer.borrow_mut().take();
                error.set(Some(err.to_string()));
                return;
            }
            error.set(None);
            debouncer.borrow_mut().schedule(value, clock());
            arm(timer.clone(), debouncer.clone(), on_ready.clone());
        })
    };

    let on_weight = {
        let weight = weight.clone();
        Callback::from(move |e: InputEvent| {
            if let Ok(value) = input_value(&e).parse::<f64>() {
                weight.set(value);
            }
        })
    };

    let onsubmit = {
        let store = ctx.store.clone();
        let title = title.clone();
        let weight = weight.clone();
        let preview = preview.clone();
        let error = error.clone();
        let ready = ready.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if !*ready {
                return;
            }
            let added = store.borrow_mut().add_item(&title, *weight).map(|_| ());
            match added {
                Ok(()) => {
                    title.set(String::new());
                    weight.set(MIN_PROBABILITY);
                    preview.set(None);
                    ready.set(false);
                }
                Err(err) => error.set(Some(err.to_string())),
            }
        })
    };

    let shown_weight = (*weight).min(max);
    html! {
        <form class="item-add" {onsubmit}>
            <input
                type="text"
                placeholder="What could happen?"
                value={(*title).clone()}
                oninput={on_title}
                style={(*preview).as_ref().map(swatch)}
            />
            <input
                type="range"
                min={MIN_PROBABILITY.to_string()}
                max={max.to_string()}
                step={PROBABILITY_STEP.to_string()}
                value={shown_weight.to_string()}
                oninput={on_weight}
            />
            <span class="percent">{ format!("{}%", to_percent(shown_weight)) }</span>
            <button type="submit" disabled={!*ready}>{ "Add" }</button>
            if let Some(message) = (*error).clone() {
                <p class="error">{ message }</p>
            }
        </form>
    }
}

#[derive(Properties, PartialEq)]
struct ItemRowProps {
    index: usize,
    item: Item,
}

#[function_component(ItemRow)]
fn item_row(props: &ItemRowProps) -> Html {
    let ctx = use_wheel();
    let editing = use_state(|| false);
    let title = use_state(|| props.item.title.clone());
    let weight = use_state(|| props.item.weight);
    let error = use_state(|| None::<String>);
    let index = props.index;
    let colors = display_colors(&props.item);

    let start_edit = {
        let editing = editing.clone();
        let title = title.clone();
        let weight = weight.clone();
        let item = props.item.clone();
        Callback::from(move |_: MouseEvent| {
            title.set(item.title.clone());
            weight.set(item.weight);
            editing.set(true);
        })
    };

    let cancel = {
        let editing = editing.clone();
        let error = error.clone();
        Callback::from(move |_: MouseEvent| {
            error.set(None);
            editing.set(false);
        })
    };

    let save = {
        let store = ctx.store.clone();
        let editing = editing.clone();
        let title = title.clone();
        let weight = weight.clone();
        let error = error.clone();
        Callback::from(move |_: MouseEvent| {
            let edited = store.borrow_mut().edit_item(index, &title, *weight).map(|_| ());
            match edited {
                Ok(()) => {
                    error.set(None);
                    editing.set(false);
                }
                Err(err) => error.set(Some(err.to_string())),
            }
        })
    };

    let remove = {
        let store = ctx.store.clone();
        let error = error.clone();
        let name = props.item.title.clone();
        Callback::from(move |_: MouseEvent| {
            if !confirm(&format!("Remove \"{name}\" from the wheel?")) {
                return;
            }
            let removed = store.borrow_mut().remove_item(index);
            if let Err(err) = removed {
                tracing::warn!(%err, index, "remove failed");
                error.set(Some(err.to_string()));
            }
        })
    };

    if !*editing {
        return html! {
            <li class="item" style={swatch(&colors)}>
                <span class="title">{ props.item.title.clone() }</span>
                <span class="percent">{ format!("{}%", to_percent(props.item.weight)) }</span>
                <button onclick={start_edit}>{ "Edit" }</button>
                <button onclick={remove}>{ "Delete" }</button>
                if let Some(message) = (*error).clone() {
                    <p class="error">{ message }</p>
                }
            </li>
        };
    }

    let max = props.item.weight + ctx.store.borrow().unassigned_probability();
    let on_title = {
        let title = title.clone();
        Callback::from(move |e: InputEvent| title.set(input_value(&e)))
    };
    let on_weight = {
        let weight = weight.clone();
        Callback::from(move |e: InputEvent| {
            if let Ok(value) = input_value(&e).parse::<f64>() {
                weight.set(value);
            }
        })
    };

    html! {
        <li class="item editing">
            <input type="text" value={(*title).clone()} oninput={on_title} />
            <input
                type="range"
                min={MIN_PROBABILITY.to_string()}
                max={max.to_string()}
                step={PROBABILITY_STEP.to_string()}
                value={(*weight).to_string()}
                oninput={on_weight}
            />
            <span class="percent">{ format!("{}%", to_percent(*weight)) }</span>
            <button onclick={save}>{ "Save" }</button>
            <button onclick={cancel}>{ "Cancel" }</button>
            if let Some(message) = (*error).clone() {
                <p class="error">{ message }</p>
            }
        </li>
    }
}

fn download(name: &str, contents: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let parts = js_sys::Array::of1(&JsValue::from_str(contents));
    let options = BlobPropertyBag::new();
    options.set_type("application/json");
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;
    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(name);
    anchor.click();
    Url::revoke_object_url(&url)
}

async fn fetch_text(url: &str) -> Result<String, reqwest::Error> {
    reqwest::get(url).await?.error_for_status()?.text().await
}

#[function_component(Toolbar)]
fn toolbar() -> Html {
    let ctx = use_wheel();
    let url = use_state(String::new);
    let status = use_state(|| None::<String>);

    let on_url = {
        let url = url.clone();
        Callback::from(move |e: InputEvent| url.set(input_value(&e)))
    };

    let import = {
        let store = ctx.store.clone();
        let url = url.clone();
        let status = status.clone();
        Callback::from(move |_: MouseEvent| {
            let store = store.clone();
            let source = (*url).clone();
            let status = status.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let imported = match fetch_text(&source).await {
                    Ok(body) => store.borrow_mut().import_json(&body),
                    Err(err) => Err(WheelError::MalformedImport(err.to_string())),
                };
                match imported {
                    Ok(()) => status.set(None),
                    Err(err) => {
                        tracing::warn!(%err, %source, "import failed");
                        status.set(Some(IMPORT_FAILED.to_string()));
                    }
                }
            });
        })
    };

    let export = {
        let store = ctx.store.clone();
        let status = status.clone();
        Callback::from(move |_: MouseEvent| {
            let exported = store.borrow().export_json();
            let result = match exported {
                Ok(json) => download(EXPORT_NAME, &json).map_err(|e| format!("{e:?}")),
                Err(err) => Err(err.to_string()),
            };
            if let Err(err) = result {
                tracing::warn!(%err, "export failed");
                status.set(Some(err));
            }
        })
    };

    let erase = {
        let store = ctx.store.clone();
        let status = status.clone();
        Callback::from(move |_: MouseEvent| {
            if !confirm("Erase all items and history?") {
                return;
            }
            let erased = store.borrow_mut().erase();
            match erased {
                Ok(()) => status.set(None),
                Err(err) => {
                    tracing::warn!(%err, "erase failed");
                    status.set(Some(err.to_string()));
                }
            }
        })
    };

    html! {
        <div class="toolbar">
            <input type="url" placeholder="https://..." value={(*url).clone()} oninput={on_url} />
            <button onclick={import}>{ "Import" }</button>
            <button onclick={export}>{ "Export" }</button>
            <button class="danger" onclick={erase}>{ "Erase" }</button>
            if let Some(message) = (*status).clone() {
                <p class="error">{ message }</p>
            }
        </div>
    }
}

#[function_component(ItemList)]
pub fn item_list() -> Html {
    let ctx = use_wheel();
    let (items, unassigned) = {
        let store = ctx.store.borrow();
        (store.items().to_vec(), store.unassigned_probability())
    };

    html! {
        <section class="items">
            <h2>{ "Events" }</h2>
            if items.is_empty() {
                <p class="empty">{ "Nothing's on the list yet" }</p>
            }
            <ul>
                { for items.into_iter().enumerate().map(|(index, item)| html! {
                    <ItemRow key={format!("{index}:{}", item.title)} {index} item={item.clone()} />
                }) }
            </ul>
            <p class="unassigned">{ format!("Unassigned: {}%", to_percent(unassigned)) }</p>
            <ItemAddForm />
            <Toolbar />
        </section>
    }
}
