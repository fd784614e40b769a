use std::f64::consts::{PI, TAU};
use std::fmt::Write as _;

use unfortunate_core::render::{parse_font_px, DrawingContext, TextAlign, TextBaseline};

const CHAR_WIDTH_RATIO: f64 = 0.6;

/// Affine transform `[a, b, c, d, e, f]` as used by the canvas API.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Transform([f64; 6]);

impl Transform {
    const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    fn then(&self, [a2, b2, c2, d2, e2, f2]: [f64; 6]) -> Self {
        let [a, b, c, d, e, f] = self.0;
        Self([
            a * a2 + c * b2,
            b * a2 + d * b2,
            a * c2 + c * d2,
            b * c2 + d * d2,
            a * e2 + c * f2 + e,
            b * e2 + d * f2 + f,
        ])
    }

    fn scale(&self) -> f64 {
        let [a, b, ..] = self.0;
        (a * a + b * b).sqrt()
    }
}

pub struct SvgCanvas {
    width: f64,
    height: f64,
    elements: Vec<String>,
    path: String,
    has_point: bool,
    transform: Transform,
    fill: String,
    stroke: String,
    line_width: f64,
    font: String,
    align: TextAlign,
    baseline: TextBaseline,
}

impl SvgCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
            path: String::new(),
            has_point: false,
            transform: Transform::IDENTITY,
            fill: "#000000".into(),
            stroke: "#000000".into(),
            line_width: 1.0,
            font: "10px sans-serif".into(),
            align: TextAlign::Left,
            baseline: TextBaseline::Middle,
        }
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn to_svg(&self) -> String {
        let mut out = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        out.push('\n');
        for el in &self.elements {
            out.push_str("  ");
            out.push_str(el);
            out.push('\n');
        }
        out.push_str("</svg>\n");
        out
    }

    fn font_px(&self) -> f64 {
        parse_font_px(&self.font).unwrap_or(10.0)
    }

    fn font_family(&self) -> &str {
        self.font
            .split_once("px ")
            .map(|(_, family)| family)
            .unwrap_or("sans-serif")
    }

    fn push_point(&mut self, cmd: char, x: f64, y: f64) {
        let (x, y) = self.transform.apply(x, y);
        let _ = write!(self.path, "{cmd}{x:.3} {y:.3} ");
        self.has_point = true;
    }

    fn push_arc_segment(&mut self, radius: f64, large: bool, x: f64, y: f64) {
        let (x, y) = self.transform.apply(x, y);
        let r = radius * self.transform.scale();
        let _ = write!(self.path, "A{r:.3} {r:.3} 0 {} 1 {x:.3} {y:.3} ", large as u8);
    }
}

impl DrawingContext for SvgCanvas {
    // the renderer always clears the whole surface
    fn clear_rect(&mut self, _x: f64, _y: f64, _width: f64, _height: f64) {
        self.elements.clear();
    }

    fn begin_path(&mut self) {
        self.path.clear();
        self.has_point = false;
    }

    fn close_path(&mut self) {
        self.path.push_str("Z ");
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.push_point('M', x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let cmd = if self.has_point { 'L' } else { 'M' };
        self.push_point(cmd, x, y);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        let (sx, sy) = (x + radius * start.cos(), y + radius * start.sin());
        let cmd = if self.has_point { 'L' } else { 'M' };
        self.push_point(cmd, sx, sy);

        let sweep = (end - start).clamp(0.0, TAU);
        if sweep >= TAU - 1e-9 {
            // a single SVG arc cannot close on itself
            let mid = start + PI;
            self.push_arc_segment(radius, false, x + radius * mid.cos(), y + radius * mid.sin());
            self.push_arc_segment(radius, false, sx, sy);
        } else {
            let (ex, ey) = (x + radius * end.cos(), y + radius * end.sin());
            self.push_arc_segment(radius, sweep > PI, ex, ey);
        }
    }

    fn fill(&mut self) {
        let el = format!(
            r#"<path d="{}" fill="{}"/>"#,
            self.path.trim_end(),
            escape(&self.fill)
        );
        self.elements.push(el);
    }

    fn stroke(&mut self) {
        let el = format!(
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
            self.path.trim_end(),
            escape(&self.stroke),
            self.line_width
        );
        self.elements.push(el);
    }

    fn set_fill_color(&mut self, color: &str) {
        self.fill = color.to_string();
    }

    fn set_stroke_color(&mut self, color: &str) {
        self.stroke = color.to_string();
    }

    fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.transform = self.transform.then([1.0, 0.0, 0.0, 1.0, x, y]);
    }

    fn rotate(&mut self, angle: f64) {
        let (sin, cos) = angle.sin_cos();
        self.transform = self.transform.then([cos, sin, -sin, cos, 0.0, 0.0]);
    }

    fn reset_transform(&mut self) {
        self.transform = Transform::IDENTITY;
    }

    fn set_font(&mut self, font: &str) {
        self.font = font.to_string();
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.align = align;
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.baseline = baseline;
    }

    fn measure_text(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.font_px() * CHAR_WIDTH_RATIO
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let anchor = match self.align {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        };
        let baseline = match self.baseline {
            TextBaseline::Top => "hanging",
            TextBaseline::Middle => "central",
            TextBaseline::Bottom => "text-after-edge",
        };
        let [a, b, c, d, e, f] = self.transform.0;
        let el = format!(
            r#"<text transform="matrix({a:.6} {b:.6} {c:.6} {d:.6} {e:.3} {f:.3})" x="{x:.3}" y="{y:.3}" font-size="{}" font-family="{}" fill="{}" text-anchor="{anchor}" dominant-baseline="{baseline}">{}</text>"#,
            self.font_px(),
            escape(self.font_family()),
            escape(&self.fill),
            escape(text)
        );
        self.elements.push(el);
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use unfortunate_core::{colored_item, WheelRenderer};

    #[test]
    fn rotate_then_translate_composes_like_canvas() {
        let mut canvas = SvgCanvas::new(100.0, 100.0);
        canvas.translate(50.0, 50.0);
        canvas.rotate(std::f64::consts::FRAC_PI_2);
        let (x, y) = canvas.transform.apply(10.0, 0.0);
        assert!((x - 50.0).abs() < 1e-9);
        assert!((y - 60.0).abs() < 1e-9);
    }

    #[test]
    fn wheel_renders_sectors_and_labels() {
        let renderer = WheelRenderer::default();
        let size = renderer.config().size;
        let mut canvas = SvgCanvas::new(size, size);
        let items = vec![colored_item("tea", 0.5), colored_item("R&D <notes>", 0.5)];
        renderer.draw(&mut canvas, 0.4, &items);
        let svg = canvas.to_svg();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<text").count(), 2);
        assert!(svg.contains("R&amp;D &lt;notes&gt;"));
        assert!(svg.contains(items[0].bg.as_deref().unwrap()));
    }

    #[test]
    fn redraw_replaces_previous_frame() {
        let renderer = WheelRenderer::default();
        let mut canvas = SvgCanvas::new(750.0, 750.0);
        let items = vec![colored_item("a", 1.0)];
        renderer.draw(&mut canvas, 0.0, &items);
        let first = canvas.element_count();
        renderer.draw(&mut canvas, 1.0, &items);
        assert_eq!(canvas.element_count(), first);
    }

    #[test]
    fn full_circle_is_split_in_two_arcs() {
        let mut canvas = SvgCanvas::new(10.0, 10.0);
        canvas.begin_path();
        canvas.arc(5.0, 5.0, 5.0, 0.0, TAU);
        canvas.fill();
        assert_eq!(canvas.to_svg().matches('A').count(), 2);
    }
}
