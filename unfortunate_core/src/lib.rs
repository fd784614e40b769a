pub mod animator;
pub mod config;
pub mod debounce;
pub mod items;
pub mod render;
pub mod rng;
pub mod selector;
pub mod store;
pub mod trajectory;

pub use crate::animator::{
    normalize_angle, sector_at_pointer, Animator, Frame, SpinOutcome, SpinPhase, SpinPlan,
};
pub use crate::config::{
    RenderConfig, SpinConfig, WheelConfig, MIN_PROBABILITY, PROBABILITY_STEP, TITLE_DEBOUNCE,
};
pub use crate::debounce::Debouncer;
pub use crate::items::{
    assign_colors, colored_item, is_fulfilled, to_percent, unassigned_probability, ColorPair,
};
pub use crate::render::{
    DrawingContext, LabelFit, RecordingContext, RenderReport, TextAlign, TextBaseline,
    WheelRenderer,
};
pub use crate::rng::{derive_floats, derive_hash_hex, ScriptedSource, SeededRng, UniformSource};
pub use crate::selector::{select, select_assigned, select_with};
pub use crate::store::{KeyValueStorage, MemoryStorage, Store, StoreEvent, SubscriptionId};
pub use crate::trajectory::Trajectory;
pub use unfortunate_shared::{HistoryEntry, Item, WheelError, WheelResult, WheelSnapshot};
