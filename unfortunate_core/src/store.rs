use std::collections::HashMap;

use tracing::{info, warn};
use unfortunate_shared::{
    HistoryEntry, Item, WheelError, WheelResult, WheelSnapshot, HISTORY_KEY, ITEMS_KEY,
};

use crate::config::SpinConfig;
use crate::items::{
    colored_item, is_already_added, is_fulfilled, unassigned_probability, validate_title,
    validate_weight,
};

/// String key-value backend (browser local storage, a directory, memory).
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> WheelResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> WheelResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> WheelResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> WheelResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    ItemsChanged,
    HistoryChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(StoreEvent)>;

pub struct Store<S: KeyValueStorage> {
    storage: S,
    items: Vec<Item>,
    history: Vec<HistoryEntry>,
    unassigned: f64,
    epsilon: f64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S: KeyValueStorage> Store<S> {
    /// Missing or unreadable values start empty.
    pub fn load(storage: S) -> Self {
        let items: Vec<Item> = load_list(&storage, ITEMS_KEY);
        let history: Vec<HistoryEntry> = load_list(&storage, HISTORY_KEY);
        info!(items = items.len(), history = history.len(), "store loaded");
        Self {
            unassigned: unassigned_probability(&items),
            storage,
            items,
            history,
            epsilon: SpinConfig::default().epsilon,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn unassigned_probability(&self) -> f64 {
        self.unassigned
    }

    pub fn is_fulfilled(&self) -> bool {
        is_fulfilled(self.unassigned, self.epsilon)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn subscribe(&mut self, listener: impl FnMut(StoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        before != self.listeners.len()
    }

    pub fn set_items(&mut self, items: Vec<Item>) -> WheelResult<()> {
        self.commit_items(items)?;
        self.notify(StoreEvent::ItemsChanged);
        Ok(())
    }

    pub fn add_item(&mut self, title: &str, weight: f64) -> WheelResult<&Item> {
        validate_title(title)?;
        if is_already_added(title, &self.items) {
            return Err(WheelError::DuplicateTitle(title.to_string()));
        }
        if self.is_fulfilled() {
            return Err(WheelError::ProbabilityFulfilled);
        }
        validate_weight(weight, self.unassigned)?;

        let mut items = self.items.clone();
        items.push(colored_item(title, weight));
        self.commit_items(items)?;
        info!(title, weight, "item added");
        self.notify(StoreEvent::ItemsChanged);
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn edit_item(&mut self, index: usize, title: &str, weight: f64) -> WheelResult<&Item> {
        let current = self.items.get(index).ok_or(WheelError::ItemNotFound(index))?;
        validate_title(title)?;
        if current.title != title && is_already_added(title, &self.items) {
            return Err(WheelError::DuplicateTitle(title.to_string()));
        }
        validate_weight(weight, current.weight + self.unassigned)?;

        let mut items = self.items.clone();
        items[index] = colored_item(title, weight);
        self.commit_items(items)?;
        info!(index, title, weight, "item edited");
        self.notify(StoreEvent::ItemsChanged);
        Ok(&self.items[index])
    }

    pub fn remove_item(&mut self, index: usize) -> WheelResult<Item> {
        if index >= self.items.len() {
            return Err(WheelError::ItemNotFound(index));
        }
        let mut items = self.items.clone();
        let removed = items.remove(index);
        self.commit_items(items)?;
        info!(index, title = %removed.title, "item removed");
        self.notify(StoreEvent::ItemsChanged);
        Ok(removed)
    }

    pub fn record_spin(&mut self, entry: HistoryEntry) -> WheelResult<()> {
        let mut history = Vec::with_capacity(self.history.len() + 1);
        history.push(entry);
        history.extend(self.history.iter().cloned());
        self.commit_history(history)?;
        self.notify(StoreEvent::HistoryChanged);
        Ok(())
    }

    pub fn erase(&mut self) -> WheelResult<()> {
        self.replace_all(Vec::new(), Vec::new())?;
        info!("store erased");
        Ok(())
    }

    /// Replaces both lists with the snapshot contents, unvalidated.
    pub fn import(&mut self, snapshot: WheelSnapshot) -> WheelResult<()> {
        let WheelSnapshot { items, history } = snapshot;
        info!(items = items.len(), history = history.len(), "importing snapshot");
        self.replace_all(items, history)
    }

    pub fn import_json(&mut self, payload: &str) -> WheelResult<()> {
        let snapshot = WheelSnapshot::from_json(payload)?;
        self.import(snapshot)
    }

    pub fn export(&self) -> WheelSnapshot {
        WheelSnapshot {
            items: self.items.clone(),
            history: self.history.clone(),
        }
    }

    pub fn export_json(&self) -> WheelResult<String> {
        self.export().to_json()
    }

    fn replace_all(&mut self, items: Vec<Item>, history: Vec<HistoryEntry>) -> WheelResult<()> {
        let items_json = encode(&items)?;
        let history_json = encode(&history)?;
        let previous_items = encode(&self.items)?;
        self.storage.set(ITEMS_KEY, &items_json)?;
        if let Err(err) = self.storage.set(HISTORY_KEY, &history_json) {
            // put the old items back so both keys stay in step
            if let Err(rollback) = self.storage.set(ITEMS_KEY, &previous_items) {
                warn!(%rollback, "restoring items after a failed history write");
            }
            return Err(err);
        }
        self.unassigned = unassigned_probability(&items);
        self.items = items;
        self.history = history;
        self.notify(StoreEvent::ItemsChanged);
        self.notify(StoreEvent::HistoryChanged);
        Ok(())
    }

    fn commit_items(&mut self, items: Vec<Item>) -> WheelResult<()> {
        self.storage.set(ITEMS_KEY, &encode(&items)?)?;
        self.unassigned = unassigned_probability(&items);
        self.items = items;
        Ok(())
    }

    fn commit_history(&mut self, history: Vec<HistoryEntry>) -> WheelResult<()> {
        self.storage.set(HISTORY_KEY, &encode(&history)?)?;
        self.history = history;
        Ok(())
    }

    fn notify(&mut self, event: StoreEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }
}

fn encode<T: serde::Serialize>(value: &T) -> WheelResult<String> {
    serde_json::to_string(value).map_err(|e| WheelError::Storage(e.to_string()))
}

fn load_list<T, S>(storage: &S, key: &str) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
    S: KeyValueStorage,
{
    match storage.get(key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(key, %err, "stored value is unreadable, starting empty");
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(err) => {
            warn!(key, %err, "storage read failed, starting empty");
            Vec::new()
        }
    }
}
