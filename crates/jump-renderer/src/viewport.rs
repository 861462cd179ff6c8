use serde::{Deserialize, Serialize};

use jump_core::{Envelope, Point};

/// Maps model coordinates onto the pixels of the view panel.
///
/// Model y grows upwards, screen y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Center X in model coordinates.
    pub center_x: f64,
    /// Center Y in model coordinates.
    pub center_y: f64,
    /// Pixels per model unit.
    pub zoom: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Viewport {
    pub fn new(canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            zoom: 1.0,
            canvas_width,
            canvas_height,
        }
    }

    /// Pan the viewport by a delta in screen pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.center_x -= dx / self.zoom;
        self.center_y += dy / self.zoom;
    }

    /// Zoom in/out keeping the model point under `(screen_x, screen_y)` fixed.
    pub fn zoom_at(&mut self, screen_x: f64, screen_y: f64, factor: f64) {
        let before = self.to_model(screen_x, screen_y);
        self.zoom = (self.zoom * factor).clamp(1e-9, 1e9);
        let after = self.to_model(screen_x, screen_y);
        self.center_x -= after.x - before.x;
        self.center_y -= after.y - before.y;
    }

    /// Zoom to fit an envelope, leaving a 5% margin on each side.
    pub fn zoom_to_envelope(&mut self, envelope: &Envelope) {
        let center = envelope.center();
        self.center_x = center.x;
        self.center_y = center.y;
        let width = envelope.width();
        let height = envelope.height();
        if width <= 0.0 && height <= 0.0 {
            return;
        }
        let zoom_x = if width > 0.0 { self.canvas_width as f64 / width } else { f64::INFINITY };
        let zoom_y = if height > 0.0 { self.canvas_height as f64 / height } else { f64::INFINITY };
        self.zoom = zoom_x.min(zoom_y) * 0.9;
    }

    pub fn to_model(&self, screen_x: f64, screen_y: f64) -> Point {
        Point::new(
            (screen_x - self.canvas_width as f64 / 2.0) / self.zoom + self.center_x,
            (self.canvas_height as f64 / 2.0 - screen_y) / self.zoom + self.center_y,
        )
    }

    pub fn to_screen(&self, p: &Point) -> (f64, f64) {
        (
            (p.x - self.center_x) * self.zoom + self.canvas_width as f64 / 2.0,
            self.canvas_height as f64 / 2.0 - (p.y - self.center_y) * self.zoom,
        )
    }

    /// The visible area in model coordinates.
    pub fn envelope_in_model_coordinates(&self) -> Envelope {
        let half_w = self.canvas_width as f64 / (2.0 * self.zoom);
        let half_h = self.canvas_height as f64 / (2.0 * self.zoom);
        Envelope::from_coords(
            self.center_x - half_w,
            self.center_y - half_h,
            self.center_x + half_w,
            self.center_y + half_h,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_y_flip() {
        let mut vp = Viewport::new(200, 100);
        vp.zoom = 2.0;
        let (sx, sy) = vp.to_screen(&Point::new(10.0, 10.0));
        assert!((sx - 120.0).abs() < 1e-9);
        assert!((sy - 30.0).abs() < 1e-9);
        let back = vp.to_model(sx, sy);
        assert!((back.x - 10.0).abs() < 1e-9 && (back.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_to_envelope_contains_it() {
        let mut vp = Viewport::new(400, 200);
        let env = Envelope::from_coords(100.0, 100.0, 300.0, 400.0);
        vp.zoom_to_envelope(&env);
        let visible = vp.envelope_in_model_coordinates();
        assert!(visible.contains_point(&env.min) && visible.contains_point(&env.max));
    }

    #[test]
    fn test_zoom_at_keeps_anchor() {
        let mut vp = Viewport::new(100, 100);
        let anchor = vp.to_model(80.0, 20.0);
        vp.zoom_at(80.0, 20.0, 4.0);
        let after = vp.to_model(80.0, 20.0);
        assert!((anchor.x - after.x).abs() < 1e-9 && (anchor.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_pan_moves_content_with_cursor() {
        let mut vp = Viewport::new(100, 100);
        let p = Point::new(0.0, 0.0);
        let (x0, y0) = vp.to_screen(&p);
        vp.pan(10.0, 5.0);
        let (x1, y1) = vp.to_screen(&p);
        assert!((x1 - x0 - 10.0).abs() < 1e-9 && (y1 - y0 - 5.0).abs() < 1e-9);
    }
}
