use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};
use yew::NodeRef;

use unfortunate_core::{DrawingContext, TextAlign, TextBaseline};

/// Browser 2D context behind the renderer's drawing trait.
pub struct CanvasSurface(pub CanvasRenderingContext2d);

impl CanvasSurface {
    pub fn from_node(node: &NodeRef) -> Option<Self> {
        let canvas = node.cast::<HtmlCanvasElement>()?;
        let ctx = canvas.get_context("2d").ok()??;
        ctx.dyn_into::<CanvasRenderingContext2d>().ok().map(Self)
    }
}

impl DrawingContext for CanvasSurface {
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.0.clear_rect(x, y, width, height);
    }

    fn begin_path(&mut self) {
        self.0.begin_path();
    }

    fn close_path(&mut self) {
        self.0.close_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.0.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.0.line_to(x, y);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        let _ = self.0.arc(x, y, radius, start, end);
    }

    fn fill(&mut self) {
        self.0.fill();
    }

    fn stroke(&mut self) {
        self.0.stroke();
    }

    fn set_fill_color(&mut self, color: &str) {
        self.0.set_fill_style(&JsValue::from_str(color));
    }

    fn set_stroke_color(&mut self, color: &str) {
        self.0.set_stroke_style(&JsValue::from_str(color));
    }

    fn set_line_width(&mut self, width: f64) {
        self.0.set_line_width(width);
    }

    fn translate(&mut self, x: f64, y: f64) {
        let _ = self.0.translate(x, y);
    }

    fn rotate(&mut self, angle: f64) {
        let _ = self.0.rotate(angle);
    }

    fn reset_transform(&mut self) {
        let _ = self.0.reset_transform();
    }

    fn set_font(&mut self, font: &str) {
        self.0.set_font(font);
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.0.set_text_align(match align {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        });
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.0.set_text_baseline(match baseline {
            TextBaseline::Top => "top",
            TextBaseline::Middle => "middle",
            TextBaseline::Bottom => "bottom",
        });
    }

    fn measure_text(&self, text: &str) -> f64 {
        self.0.measure_text(text).map(|m| m.width()).unwrap_or(0.0)
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let _ = self.0.fill_text(text, x, y);
    }
}
