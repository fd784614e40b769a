use chrono::Local;
use unfortunate_core::{to_percent, HistoryEntry};
use yew::prelude::*;

use crate::app::use_wheel;

fn local_time(entry: &HistoryEntry) -> String {
    entry.ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[function_component(HistoryView)]
pub fn history_view() -> Html {
    let ctx = use_wheel();
    let history = ctx.store.borrow().history().to_vec();

    html! {
        <section class="history">
            <h2>{ "History" }</h2>
            if history.is_empty() {
                <p class="empty">{ "Empty" }</p>
            } else {
                <ol>
                    { for history.iter().map(|entry| html! {
                        <li>
                            <time>{ local_time(entry) }</time>
                            { format!(" {} ({}%)", entry.title, to_percent(entry.weight)) }
                        </li>
                    }) }
                </ol>
            }
        </section>
    }
}
