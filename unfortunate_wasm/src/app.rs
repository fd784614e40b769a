use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use unfortunate_core::Store;
use yew::prelude::*;

use crate::history_view::HistoryView;
use crate::item_list::ItemList;
use crate::storage::LocalStorage;
use crate::wheel_view::WheelView;

pub type SharedStore = Rc<RefCell<Store<LocalStorage>>>;

/// Store handed down through context. `revision` bumps on every store event
/// so consumers re-render even though the `Rc` itself never changes.
#[derive(Clone)]
pub struct WheelContext {
    pub store: SharedStore,
    pub revision: u64,
}

impl PartialEq for WheelContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.store, &other.store) && self.revision == other.revision
    }
}

#[hook]
pub fn use_wheel() -> WheelContext {
    use_context::<WheelContext>().expect("WheelContext provided by App")
}

/// Milliseconds since the epoch as a duration, for the debouncer and spin clock.
pub fn clock() -> Duration {
    Duration::from_secs_f64(js_sys::Date::now().max(0.0) / 1000.0)
}

pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

#[function_component(App)]
pub fn app() -> Html {
    let store: SharedStore = use_mut_ref(|| Store::load(LocalStorage::open()));
    let revision = use_mut_ref(|| 0u64);
    let force = use_force_update();

    {
        let store = store.clone();
        let revision = revision.clone();
        use_effect_with((), move |_| {
            let id = store.borrow_mut().subscribe(move |event| {
                tracing::debug!(?event, "store changed");
                *revision.borrow_mut() += 1;
                // the store is still borrowed by the mutation that notified us
                let force = force.clone();
                wasm_bindgen_futures::spawn_local(async move { force.force_update() });
            });
            move || {
                store.borrow_mut().unsubscribe(id);
            }
        });
    }

    let ctx = WheelContext {
        store,
        revision: *revision.borrow(),
    };

    html! {
        <ContextProvider<WheelContext> context={ctx}>
            <main class="app">
                <h1>{ "Wheel of Unfortunate" }</h1>
                <div class="layout">
                    <WheelView />
                    <div class="sidebar">
                        <ItemList />
                        <HistoryView />
                    </div>
                </div>
            </main>
        </ContextProvider<WheelContext>>
    }
}
