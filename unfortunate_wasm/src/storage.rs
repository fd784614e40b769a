use wasm_bindgen::JsValue;

use unfortunate_core::KeyValueStorage;
use unfortunate_shared::{WheelError, WheelResult};

/// `window.localStorage`; reads as empty when the browser refuses access.
pub struct LocalStorage {
    inner: Option<web_sys::Storage>,
}

impl LocalStorage {
    pub fn open() -> Self {
        let inner = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if inner.is_none() {
            tracing::warn!("local storage unavailable, changes will not persist");
        }
        Self { inner }
    }
}

fn js_error(err: JsValue) -> WheelError {
    WheelError::Storage(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

impl KeyValueStorage for LocalStorage {
    fn get(&self, key: &str) -> WheelResult<Option<String>> {
        match &self.inner {
            Some(storage) => storage.get_item(key).map_err(js_error),
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> WheelResult<()> {
        match &self.inner {
            Some(storage) => storage.set_item(key, value).map_err(js_error),
            None => Err(WheelError::Storage("local storage unavailable".into())),
        }
    }
}
