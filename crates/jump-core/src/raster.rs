use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Same colour with its alpha scaled by `factor` (clamped to 0..=1).
    pub fn with_opacity(self, factor: f32) -> Self {
        let a = (self.a as f32 * factor.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Source-over composite of `self` onto `dst`.
    pub fn over(self, dst: Rgba) -> Rgba {
        if self.a == 255 {
            return self;
        }
        if self.a == 0 {
            return dst;
        }
        let sa = self.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        let channel = |s: u8, d: u8| -> u8 {
            let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgba {
            r: channel(self.r, dst.r),
            g: channel(self.g, dst.g),
            b: channel(self.b, dst.b),
            a: (out_a * 255.0).round() as u8,
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::rgb(128, 128, 128)
    }
}

/// Hatch spacing in pixels for hatched fills.
pub const HATCH_SPACING: i64 = 6;

/// An RGBA8 pixel buffer in screen space: origin top-left, y down.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Raster {
    /// A fully transparent raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgba::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: i64, y: i64) -> Option<Rgba> {
        self.offset(x, y).map(|i| self.pixels[i])
    }

    pub fn set(&mut self, x: i64, y: i64, color: Rgba) {
        if let Some(i) = self.offset(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Composite `color` over the pixel at (x, y); out-of-bounds is ignored.
    pub fn blend(&mut self, x: i64, y: i64, color: Rgba) {
        if let Some(i) = self.offset(x, y) {
            self.pixels[i] = color.over(self.pixels[i]);
        }
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: Rgba) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width as i64);
        let y1 = y.saturating_add(h).min(self.height as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color);
            }
        }
    }

    /// Bresenham line; `width > 1` stamps a square brush at each step.
    /// The segment is clipped to the raster first, so only visible steps
    /// are walked.
    pub fn draw_line(&mut self, from: (i64, i64), to: (i64, i64), width: u32, color: Rgba) {
        let brush = width.max(1) as i64;
        let pad = brush as f64;
        let Some((a, b)) = clip_segment(
            (from.0 as f64, from.1 as f64),
            (to.0 as f64, to.1 as f64),
            (-pad, -pad),
            (self.width as f64 + pad, self.height as f64 + pad),
        ) else {
            return;
        };
        let (mut x0, mut y0) = (a.0.round() as i64, a.1.round() as i64);
        let (x1, y1) = (b.0.round() as i64, b.1.round() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let half = (brush - 1) / 2;
        loop {
            if brush == 1 {
                self.blend(x0, y0, color);
            } else {
                self.stamp(x0 - half, y0 - half, brush, color);
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn stamp(&mut self, x: i64, y: i64, size: i64, color: Rgba) {
        self.fill_rect(x, y, size, size, color);
    }

    /// Scanline even-odd fill of a closed ring given in pixel coordinates.
    /// When `hatched`, only pixels on diagonal hatch lines are painted.
    pub fn fill_polygon(&mut self, ring: &[(f64, f64)], color: Rgba, hatched: bool) {
        if ring.len() < 3 {
            return;
        }
        let min_y = ring.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_y = ring.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        let y_start = (min_y.floor() as i64).max(0);
        let y_end = (max_y.ceil() as i64).min(self.height as i64 - 1);

        let mut crossings: Vec<f64> = Vec::new();
        for y in y_start..=y_end {
            let scan = y as f64 + 0.5;
            crossings.clear();
            for (i, a) in ring.iter().enumerate() {
                let b = ring[(i + 1) % ring.len()];
                if (a.1 <= scan && b.1 > scan) || (b.1 <= scan && a.1 > scan) {
                    let t = (scan - a.1) / (b.1 - a.1);
                    crossings.push(a.0 + t * (b.0 - a.0));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for span in crossings.chunks_exact(2) {
                let x_start = ((span[0] - 0.5).ceil() as i64).max(0);
                let x_end = ((span[1] - 0.5).floor() as i64).min(self.width as i64 - 1);
                for x in x_start..=x_end {
                    if !hatched || (x + y).rem_euclid(HATCH_SPACING) == 0 {
                        self.blend(x, y, color);
                    }
                }
            }
        }
    }

    /// Composite `src` over this raster with its alpha scaled by `opacity`.
    /// Both rasters share the same origin; the overlap is composited.
    pub fn draw_over(&mut self, src: &Raster, opacity: f32) {
        let w = self.width.min(src.width) as i64;
        let h = self.height.min(src.height) as i64;
        let full = opacity >= 1.0;
        for y in 0..h {
            for x in 0..w {
                if let Some(color) = src.get(x, y) {
                    let color = if full { color } else { color.with_opacity(opacity) };
                    self.blend(x, y, color);
                }
            }
        }
    }

    /// Pixels as interleaved RGBA bytes, row-major.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| [p.r, p.g, p.b, p.a])
            .collect()
    }

    pub fn count_pixels(&self, color: Rgba) -> usize {
        self.pixels.iter().filter(|&&p| p == color).count()
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|p| p.a == 0)
    }
}

/// Liang-Barsky clip of the segment `a`-`b` to the rectangle `min`..`max`
/// (`min` must not exceed `max`). Returns `None` when nothing of the segment
/// lies inside or a coordinate is not finite.
///
/// Entry and exit points are placed on the edge that cut them and then
/// clamped to the rectangle, so segments far longer than the rectangle
/// still come back with endpoints inside it.
pub fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    if ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let edges = [min.0, max.0, min.1, max.1];
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let mut enter = None;
    let mut exit = None;
    let checks = [
        (-dx, a.0 - min.0),
        (dx, max.0 - a.0),
        (-dy, a.1 - min.1),
        (dy, max.1 - a.1),
    ];
    for (edge, (p, q)) in checks.into_iter().enumerate() {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            if r > t0 {
                t0 = r;
                enter = Some(edge);
            }
        } else {
            if r < t0 {
                return None;
            }
            if r < t1 {
                t1 = r;
                exit = Some(edge);
            }
        }
    }

    let place = |edge: Option<usize>, end: (f64, f64)| {
        let (x, y) = match edge {
            Some(e) if e < 2 => (edges[e], a.1 + (edges[e] - a.0) * dy / dx),
            Some(e) => (a.0 + (edges[e] - a.1) * dx / dy, edges[e]),
            None => end,
        };
        (x.clamp(min.0, max.0), y.clamp(min.1, max.1))
    };
    Some((place(enter, a), place(exit, b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_over_opaque_and_transparent() {
        let red = Rgba::rgb(255, 0, 0);
        assert_eq!(red.over(Rgba::WHITE), red);
        assert_eq!(Rgba::TRANSPARENT.over(red), red);
        let half = Rgba::new(0, 0, 255, 128).over(Rgba::TRANSPARENT);
        assert_eq!(half, Rgba::new(0, 0, 255, 128));
    }

    #[test]
    fn test_draw_line_endpoints() {
        let mut r = Raster::new(10, 10);
        r.draw_line((1, 1), (8, 5), 1, Rgba::BLACK);
        assert_eq!(r.get(1, 1), Some(Rgba::BLACK));
        assert_eq!(r.get(8, 5), Some(Rgba::BLACK));
        assert_eq!(r.get(1, 8), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_fill_polygon_covers_interior_only() {
        let mut r = Raster::new(20, 20);
        let ring = [(2.0, 2.0), (12.0, 2.0), (12.0, 12.0), (2.0, 12.0)];
        r.fill_polygon(&ring, Rgba::BLACK, false);
        assert_eq!(r.count_pixels(Rgba::BLACK), 100);
        assert_eq!(r.get(5, 5), Some(Rgba::BLACK));
        assert_eq!(r.get(15, 15), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_hatched_fill_is_sparse() {
        let mut r = Raster::new(20, 20);
        let ring = [(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)];
        r.fill_polygon(&ring, Rgba::BLACK, true);
        let painted = r.count_pixels(Rgba::BLACK);
        assert!(painted > 0 && painted < 400 / 4);
    }

    #[test]
    fn test_draw_over_clips_to_overlap() {
        let mut dst = Raster::filled(4, 4, Rgba::WHITE);
        let src = Raster::filled(8, 2, Rgba::BLACK);
        dst.draw_over(&src, 1.0);
        assert_eq!(dst.count_pixels(Rgba::BLACK), 8);
        assert_eq!(dst.get(0, 3), Some(Rgba::WHITE));
    }

    #[test]
    fn test_out_of_bounds_writes_ignored() {
        let mut r = Raster::new(2, 2);
        r.blend(-1, 0, Rgba::BLACK);
        r.fill_rect(1, 1, 5, 5, Rgba::BLACK);
        assert_eq!(r.count_pixels(Rgba::BLACK), 1);
        assert_eq!(r.to_rgba_bytes().len(), 16);
    }

    #[test]
    fn test_far_away_line_is_clipped() {
        let mut r = Raster::new(10, 10);
        r.draw_line((i64::MIN, 0), (i64::MAX, 0), 1, Rgba::BLACK);
        assert_eq!(r.count_pixels(Rgba::BLACK), 10);
        r.draw_line((i64::MIN, i64::MIN), (-5, -5), 3, Rgba::WHITE);
        assert_eq!(r.count_pixels(Rgba::WHITE), 0);
    }

    #[test]
    fn test_fill_rect_with_saturated_extent() {
        let mut r = Raster::new(4, 4);
        r.fill_rect(2, 2, i64::MAX, i64::MAX, Rgba::BLACK);
        assert_eq!(r.count_pixels(Rgba::BLACK), 4);
        r.fill_rect(i64::MAX, 0, i64::MAX, 1, Rgba::WHITE);
        assert_eq!(r.count_pixels(Rgba::WHITE), 0);
    }

    #[test]
    fn test_clip_segment() {
        let clipped = clip_segment((-10.0, 5.0), (20.0, 5.0), (0.0, 0.0), (10.0, 10.0));
        assert_eq!(clipped, Some(((0.0, 5.0), (10.0, 5.0))));
        assert_eq!(clip_segment((-10.0, -1.0), (20.0, -1.0), (0.0, 0.0), (10.0, 10.0)), None);
        assert_eq!(clip_segment((f64::NAN, 0.0), (1.0, 1.0), (0.0, 0.0), (10.0, 10.0)), None);
    }
}
