use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use unfortunate_core::{
    to_percent, Animator, Item, SeededRng, SpinOutcome, WheelError, WheelRenderer,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use yew::prelude::*;

use crate::app::{clock, use_wheel, SharedStore};
use crate::canvas::CanvasSurface;

type FrameLoop = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn request_frame(f: &Closure<dyn FnMut()>) {
    if let Some(window) = web_sys::window() {
        let _ = window.request_animation_frame(f.as_ref().unchecked_ref());
    }
}

fn session_seed() -> String {
    let salt = (js_sys::Math::random() * f64::from(u32::MAX)) as u32;
    format!("{:x}-{salt:08x}", js_sys::Date::now() as u64)
}

struct SpinDriver {
    canvas: NodeRef,
    animator: Rc<RefCell<Animator>>,
    store: SharedStore,
    items: Vec<Item>,
    renderer: WheelRenderer,
    on_done: Callback<SpinOutcome>,
    on_error: Callback<String>,
}

/// Redraws on every animation frame until the animator reports an outcome.
fn start_loop(driver: SpinDriver) {
    let started = clock();
    let slot: FrameLoop = Rc::new(RefCell::new(None));
    let handle = slot.clone();

    *slot.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let elapsed = clock().saturating_sub(started);
        let frame = driver.animator.borrow_mut().advance(elapsed);
        if let Some(mut surface) = CanvasSurface::from_node(&driver.canvas) {
            driver.renderer.draw(&mut surface, frame.angle, &driver.items);
        }
        match frame.outcome {
            Some(outcome) => {
                let recorded = driver.store.borrow_mut().record_spin(outcome.history_entry());
                if let Err(err) = recorded {
                    tracing::warn!(%err, "spin result not saved");
                    driver.on_error.emit(format!("Spin result not saved: {err}"));
                }
                driver.on_done.emit(outcome);
                // a closure must not be dropped while it runs
                let handle = handle.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    drop(handle.borrow_mut().take());
                });
            }
            None => {
                if let Some(f) = handle.borrow().as_ref() {
                    request_frame(f);
                }
            }
        }
    }) as Box<dyn FnMut()>));

    if let Some(f) = slot.borrow().as_ref() {
        request_frame(f);
    }
;
}

#[function_component(WheelView)]
pub fn wheel_view() -> Html {
    let ctx = use_wheel();
    let canvas = use_node_ref();
    let animator = use_mut_ref(Animator::default);
    let rng = use_mut_ref(|| SeededRng::new(session_seed(), 0));
    let outcome = use_state(|| None::<SpinOutcome>);
    let notice = use_state(|| None::<String>);

    let pointer_angle = animator.borrow().config().pointer_angle;
    let renderer = WheelRenderer::default().with_pointer_angle(pointer_angle);
    let size = renderer.config().size.to_string();

    {
        let canvas = canvas.clone();
        let animator = animator.clone();
        let store = ctx.store.clone();
        let renderer = renderer.clone();
        use_effect_with(ctx.revision, move |_| {
            let animator = animator.borrow();
            if !animator.is_spinning() {
                if let Some(mut surface) = CanvasSurface::from_node(&canvas) {
                    renderer.draw(&mut surface, animator.resting_angle(), store.borrow().items());
                }
            }
        });
    }

    let onclick = {
        let canvas = canvas.clone();
        let store = ctx.store.clone();
        let outcome = outcome.clone();
        let notice = notice.clone();
        Callback::from(move |_: MouseEvent| {
            let items = store.borrow().items().to_vec();
            let planned = animator
                .borrow_mut()
                .plan_spin(&items, &mut *rng.borrow_mut(), Utc::now())
                .map(|plan| plan.target_angle());
            match planned {
                Ok(target) => {
                    let seed = rng.borrow().seed().to_string();
                    tracing::debug!(target_angle = target, %seed, "spin started");
                    notice.set(None);
                    let outcome = outcome.clone();
                    let failed = notice.clone();
                    start_loop(SpinDriver {
                        canvas: canvas.clone(),
                        animator: animator.clone(),
                        store: store.clone(),
                        items,
                        renderer: renderer.clone(),
                        on_done: Callback::from(move |done| outcome.set(Some(done))),
                        on_error: Callback::from(move |message| failed.set(Some(message))),
                    });
                }
                Err(WheelError::SpinInProgress) => {}
                Err(err) => notice.set(Some(err.to_string())),
            }
        })
    };

    let close = {
        let outcome = outcome.clone();
        Callback::from(move |_: MouseEvent| outcome.set(None))
    };

    html! {
        <section class="wheel">
            <canvas
                ref={canvas}
                class="wheel-canvas"
                width={size.clone()}
                height={size}
                {onclick}
            />
            if let Some(message) = (*notice).clone() {
                <p class="notice">{ message }</p>
            }
            if let Some(done) = (*outcome).clone() {
                <div class="modal">
                    <div class="modal-body">
                        <h2>{ done.title.clone() }</h2>
                        <p>{ format!("{}%", to_percent(done.weight)) }</p>
                        <button onclick={close}>{ "OK" }</button>
                    </div>
                </div>
            }
        </section>
    }
}
