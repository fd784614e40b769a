use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage key holding the serialized item list.
pub const ITEMS_KEY: &str = "items";
/// Storage key holding the serialized spin history.
pub const HISTORY_KEY: &str = "history";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Item {
    pub title: String,
    pub weight: f64,
    #[serde(default)]
    pub fg: Option<String>,
    #[serde(default)]
    pub bg: Option<String>,
}

impl Item {
    pub fn new(title: impl Into<String>, weight: f64) -> Self {
        Self {
            title: title.into(),
            weight,
            fg: None,
            bg: None,
        }
    }

    pub fn with_colors(mut self, fg: impl Into<String>, bg: impl Into<String>) -> Self {
        self.fg = Some(fg.into());
        self.bg = Some(bg.into());
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoryEntry {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
    pub title: String,
    pub weight: f64,
}

/// Import/export document: `{ "items": [...], "history": [...] }`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct WheelSnapshot {
    pub items: Vec<Item>,
    pub history: Vec<HistoryEntry>,
}

impl WheelSnapshot {
    pub fn from_json(payload: &str) -> WheelResult<Self> {
        serde_json::from_str(payload).map_err(|e| WheelError::MalformedImport(e.to_string()))
    }

    pub fn to_json(&self) -> WheelResult<String> {
        serde_json::to_string(self).map_err(|e| WheelError::Storage(e.to_string()))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum WheelError {
    #[error("there is nothing on the wheel yet")]
    NoItems,
    #[error("probability is not fully assigned ({unassigned:.4} left)")]
    NotFullyAssigned { unassigned: f64 },
    #[error("the wheel is already spinning")]
    SpinInProgress,
    #[error("title must be non-empty")]
    EmptyTitle,
    #[error("it's already on the list: {0}")]
    DuplicateTitle(String),
    #[error("invalid probability: {0}")]
    InvalidWeight(f64),
    #[error("probability {requested:.4} exceeds the available {available:.4}")]
    WeightExceedsAvailable { requested: f64, available: f64 },
    #[error("the total probability of specified events has reached 100%")]
    ProbabilityFulfilled,
    #[error("no item at position {0}")]
    ItemNotFound(usize),
    #[error("failed to parse import payload: {0}")]
    MalformedImport(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

pub type WheelResult<T> = Result<T, WheelError>;
