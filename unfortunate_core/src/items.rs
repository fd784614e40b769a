use unfortunate_shared::{Item, WheelError, WheelResult};

use crate::config::MIN_PROBABILITY;
use crate::rng::derive_hash_hex;

/// Slack absorbed on top of the epsilon so that e.g. `1 - 0.9999` still counts.
const FLOAT_SLACK: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPair {
    pub fg: String,
    pub bg: String,
}

/// Foreground is the tail of the title's SHA-256, background its 24-bit complement.
pub fn assign_colors(title: &str) -> ColorPair {
    let hex = derive_hash_hex(title.as_bytes());
    let tail = &hex[hex.len() - 6..];
    let fg = u32::from_str_radix(tail, 16).unwrap_or_default();
    let bg = !fg & 0x00ff_ffff;
    ColorPair {
        fg: format!("#{tail}"),
        bg: format!("#{bg:06x}"),
    }
}

/// Builds an item with its derived colors.
pub fn colored_item(title: impl Into<String>, weight: f64) -> Item {
    let title = title.into();
    let ColorPair { fg, bg } = assign_colors(&title);
    Item::new(title, weight).with_colors(fg, bg)
}

/// Colors for drawing; items imported without colors get derived ones.
pub fn display_colors(item: &Item) -> ColorPair {
    match (&item.fg, &item.bg) {
        (Some(fg), Some(bg)) => ColorPair {
            fg: fg.clone(),
            bg: bg.clone(),
        },
        _ => assign_colors(&item.title),
    }
}

pub fn total_weight(items: &[Item]) -> f64 {
    items.iter().map(|i| i.weight).sum()
}

pub fn unassigned_probability(items: &[Item]) -> f64 {
    1.0 - total_weight(items)
}

pub fn is_fulfilled(unassigned: f64, epsilon: f64) -> bool {
    unassigned.abs() <= epsilon + FLOAT_SLACK
}

pub fn is_already_added(title: &str, items: &[Item]) -> bool {
    items.iter().any(|i| i.title == title)
}

/// Probability as a percentage with two decimals.
pub fn to_percent(weight: f64) -> String {
    format!("{:.2}", weight * 100.0)
}

pub fn validate_title(title: &str) -> WheelResult<()> {
    if title.trim().is_empty() {
        return Err(WheelError::EmptyTitle);
    }
    Ok(())
}

/// Checks `weight` against the minimum and the probability still available.
pub fn validate_weight(weight: f64, available: f64) -> WheelResult<()> {
    if !weight.is_finite() || weight < MIN_PROBABILITY - FLOAT_SLACK || weight > 1.0 {
        return Err(WheelError::InvalidWeight(weight));
    }
    if weight > available + FLOAT_SLACK {
        return Err(WheelError::WeightExceedsAvailable {
            requested: weight,
            available,
        });
    }
    Ok(())
}
