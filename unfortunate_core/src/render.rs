use std::f64::consts::{FRAC_PI_2, TAU};

use unfortunate_shared::Item;

use crate::config::{RenderConfig, SpinConfig};
use crate::items::display_colors;
use crate::selector::sector_span;

/// Labels end this far out, as a share of the radius.
const LABEL_OUTER: f64 = 0.95;
const POINTER_DEPTH: f64 = 0.12;
const POINTER_HALF_WIDTH: f64 = 0.05;
const HUB_RADIUS: f64 = 0.04;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBaseline {
    Top,
    Middle,
    Bottom,
}

pub trait DrawingContext {
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn begin_path(&mut self);
    fn close_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    /// Clockwise arc around `(x, y)` from `start` to `end` radians.
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64);
    fn fill(&mut self);
    fn stroke(&mut self);
    fn set_fill_color(&mut self, color: &str);
    fn set_stroke_color(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);
    fn reset_transform(&mut self);
    /// CSS font shorthand, e.g. `"24px sans-serif"`.
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: TextAlign);
    fn set_text_baseline(&mut self, baseline: TextBaseline);
    fn measure_text(&self, text: &str) -> f64;
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelFit {
    pub font_px: f64,
    pub width: f64,
}

/// What one frame drew; one entry per item, `None` where the label was skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub labels: Vec<Option<LabelFit>>,
}

#[derive(Debug, Clone)]
pub struct WheelRenderer {
    config: RenderConfig,
    pointer_angle: f64,
}

impl Default for WheelRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl WheelRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            pointer_angle: SpinConfig::default().pointer_angle,
        }
    }

    pub fn with_pointer_angle(mut self, pointer_angle: f64) -> Self {
        self.pointer_angle = pointer_angle;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn font(&self, px: f64) -> String {
        format!("{px}px {}", self.config.font_family)
    }

    pub fn draw<C: DrawingContext + ?Sized>(
        &self,
        ctx: &mut C,
        angle: f64,
        items: &[Item],
    ) -> RenderReport {
        let size = self.config.size;
        let r = self.config.radius();
        let mut report = RenderReport::default();

        ctx.reset_transform();
        ctx.clear_rect(0.0, 0.0, size, size);
        ctx.translate(r, r);

        if items.is_empty() {
            ctx.begin_path();
            ctx.arc(0.0, 0.0, r, 0.0, TAU);
            ctx.set_fill_color(&self.config.placeholder_color);
            ctx.fill();
        } else {
            ctx.rotate(angle);
            ctx.set_line_width(1.0);
            ctx.set_text_align(TextAlign::Right);
            ctx.set_text_baseline(TextBaseline::Middle);
            for item in items {
                let span = sector_span(item.weight);
                let colors = display_colors(item);

                ctx.begin_path();
                ctx.move_to(0.0, 0.0);
                ctx.arc(0.0, 0.0, r, 0.0, span);
                ctx.close_path();
                ctx.set_fill_color(&colors.bg);
                ctx.fill();
                ctx.set_stroke_color(&self.config.outline_color);
                ctx.stroke();

                ctx.rotate(span / 2.0);
                let fit = self.fit_label(ctx, &item.title, span);
                if let Some(fit) = fit {
                    ctx.set_font(&self.font(fit.font_px));
                    ctx.set_fill_color(&colors.fg);
                    ctx.fill_text(&item.title, r * LABEL_OUTER, 0.0);
                }
                report.labels.push(fit);
                ctx.rotate(span / 2.0);
            }
        }

        ctx.reset_transform();
        self.draw_pointer(ctx);
        report
    }

    /// Largest font whose label fits the sector, by bisection.
    pub fn fit_label<C: DrawingContext + ?Sized>(
        &self,
        ctx: &mut C,
        text: &str,
        span: f64,
    ) -> Option<LabelFit> {
        if text.is_empty() {
            return None;
        }
        let (min, max) = (self.config.min_font_px, self.config.max_font_px);
        let mut best = LabelFit {
            font_px: min,
            width: self.label_fits(ctx, text, span, min)?,
        };
        if let Some(width) = self.label_fits(ctx, text, span, max) {
            return Some(LabelFit {
                font_px: max,
                width,
            });
        }

        let (mut lo, mut hi) = (min, max);
        for _ in 0..self.config.font_fit_iterations() {
            let mid = (lo + hi) / 2.0;
            match self.label_fits(ctx, text, span, mid) {
                Some(width) => {
                    best = LabelFit {
                        font_px: mid,
                        width,
                    };
                    lo = mid;
                }
                None => hi = mid,
            }
        }
        Some(best)
    }

    fn label_fits<C: DrawingContext + ?Sized>(
        &self,
        ctx: &mut C,
        text: &str,
        span: f64,
        px: f64,
    ) -> Option<f64> {
        let r = self.config.radius();
        ctx.set_font(&self.font(px));
        let width = ctx.measure_text(text);
        if width > r * self.config.text_width_ratio {
            return None;
        }
        let half = span / 2.0;
        if half < FRAC_PI_2 {
            let inner = r * LABEL_OUTER - width;
            if px > 2.0 * inner * half.tan() {
                return None;
            }
        }
        Some(width)
    }

    fn draw_pointer<C: DrawingContext + ?Sized>(&self, ctx: &mut C) {
        let r = self.config.radius();
        let (sin, cos) = self.pointer_angle.sin_cos();
        let tip = (r + cos * r * (1.0 - POINTER_DEPTH), r + sin * r * (1.0 - POINTER_DEPTH));
        let base = (r + cos * r, r + sin * r);
        let half = r * POINTER_HALF_WIDTH;

        ctx.begin_path();
        ctx.move_to(tip.0, tip.1);
        ctx.line_to(base.0 - sin * half, base.1 + cos * half);
        ctx.line_to(base.0 + sin * half, base.1 - cos * half);
        ctx.close_path();
        ctx.set_fill_color(&self.config.pointer_color);
        ctx.fill();

        ctx.begin_path();
        ctx.arc(r, r, r * HUB_RADIUS, 0.0, TAU);
        ctx.fill();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    ClearRect(f64, f64, f64, f64),
    BeginPath,
    ClosePath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Arc { radius: f64, start: f64, end: f64 },
    Fill(String),
    Stroke(String),
    Translate(f64, f64),
    Rotate(f64),
    ResetTransform,
    FillText { text: String, font: String, color: String },
}

/// Records draw calls. Text is measured as `chars × px × char_ratio`.
#[derive(Debug, Clone)]
pub struct RecordingContext {
    pub commands: Vec<DrawCommand>,
    pub char_ratio: f64,
    fill: String,
    stroke: String,
    font: String,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            char_ratio: 0.6,
            fill: "#000000".into(),
            stroke: "#000000".into(),
            font: "10px sans-serif".into(),
        }
    }
}

impl RecordingContext {
    pub fn font_px(&self) -> f64 {
        parse_font_px(&self.font).unwrap_or(10.0)
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn total_rotation(&self) -> f64 {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Rotate(a) => Some(*a),
                _ => None,
            })
            .sum()
    }
}

impl DrawingContext for RecordingContext {
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.commands.push(DrawCommand::ClearRect(x, y, width, height));
    }
    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }
    fn close_path(&mut self) {
        self.commands.push(DrawCommand::ClosePath);
    }
    fn move_to(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::MoveTo(x, y));
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::LineTo(x, y));
    }
    fn arc(&mut self, _x: f64, _y: f64, radius: f64, start: f64, end: f64) {
        self.commands.push(DrawCommand::Arc { radius, start, end });
    }
    fn fill(&mut self) {
        self.commands.push(DrawCommand::Fill(self.fill.clone()));
    }
    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke(self.stroke.clone()));
    }
    fn set_fill_color(&mut self, color: &str) {
        self.fill = color.to_string();
    }
    fn set_stroke_color(&mut self, color: &str) {
        self.stroke = color.to_string();
    }
    fn set_line_width(&mut self, _width: f64) {}
    fn translate(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::Translate(x, y));
    }
    fn rotate(&mut self, angle: f64) {
        self.commands.push(DrawCommand::Rotate(angle));
    }
    fn reset_transform(&mut self) {
        self.commands.push(DrawCommand::ResetTransform);
    }
    fn set_font(&mut self, font: &str) {
        self.font = font.to_string();
    }
    fn set_text_align(&mut self, _align: TextAlign) {}
    fn set_text_baseline(&mut self, _baseline: TextBaseline) {}
    fn measure_text(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.font_px() * self.char_ratio
    }
    fn fill_text(&mut self, text: &str, _x: f64, _y: f64) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            font: self.font.clone(),
            color: self.fill.clone(),
        });
    }
}

pub fn parse_font_px(font: &str) -> Option<f64> {
    font.split_whitespace()
        .find_map(|part| part.strip_suffix("px"))
        .and_then(|px| px.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_never_exceed_width_budget() {
        let renderer = WheelRenderer::default();
        let mut ctx = RecordingContext::default();
        let items = vec![
            Item::new("a rather long chore title", 0.5),
            Item::new("x", 0.5),
        ];
        let report = renderer.draw(&mut ctx, 0.3, &items);
        let budget = renderer.config().radius() * renderer.config().text_width_ratio;
        for fit in report.labels.iter().flatten() {
            assert!(fit.width <= budget);
        }
        assert_eq!(ctx.texts(), ["a rather long chore title", "x"]);
    }

    #[test]
    fn short_label_gets_max_font() {
        let renderer = WheelRenderer::default();
        let mut ctx = RecordingContext::default();
        let fit = renderer.fit_label(&mut ctx, "go", std::f64::consts::PI).unwrap();
        assert_eq!(fit.font_px, renderer.config().max_font_px);
    }

    #[test]
    fn fitted_font_is_within_one_pixel_of_limit() {
        let renderer = WheelRenderer::default();
        let mut ctx = RecordingContext::default();
        let text = "twenty-one characters";
        let fit = renderer.fit_label(&mut ctx, text, std::f64::consts::PI).unwrap();
        // width budget 300px at 21 chars × 0.6 puts the limit near 23.8px
        let limit = 300.0 / (21.0 * 0.6);
        assert!(fit.font_px <= limit);
        assert!(fit.font_px > limit - 1.0);
    }

    #[test]
    fn sliver_sector_has_no_label() {
        let renderer = WheelRenderer::default();
        let mut ctx = RecordingContext::default();
        let items = vec![Item::new("big", 0.9999), Item::new("tiny", 0.0001)];
        let report = renderer.draw(&mut ctx, 0.0, &items);
        assert!(report.labels[0].is_some());
        assert!(report.labels[1].is_none());
        assert_eq!(ctx.texts(), ["big"]);
    }

    #[test]
    fn rotation_covers_angle_plus_full_circle() {
        let renderer = WheelRenderer::default();
        let mut ctx = RecordingContext::default();
        let items = vec![Item::new("a", 0.25), Item::new("b", 0.75)];
        renderer.draw(&mut ctx, 1.0, &items);
        assert!((ctx.total_rotation() - (1.0 + TAU)).abs() < 1e-9);
    }

    #[test]
    fn empty_wheel_draws_placeholder_and_pointer() {
        let renderer = WheelRenderer::default();
        let mut ctx = RecordingContext::default();
        let report = renderer.draw(&mut ctx, 0.0, &[]);
        assert!(report.labels.is_empty());
        assert!(ctx
            .commands
            .contains(&DrawCommand::Fill(renderer.config().placeholder_color.clone())));
        assert!(ctx
            .commands
            .contains(&DrawCommand::Fill(renderer.config().pointer_color.clone())));
        let pointer_fill = DrawCommand::Fill(renderer.config().pointer_color.clone());
        assert_eq!(ctx.commands.last(), Some(&pointer_fill));
    }

    #[test]
    fn font_px_parsing() {
        assert_eq!(parse_font_px("24px sans-serif"), Some(24.0));
        assert_eq!(parse_font_px("bold 12.5px serif"), Some(12.5));
        assert_eq!(parse_font_px("serif"), None);
    }
}
