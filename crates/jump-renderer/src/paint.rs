//! Painting geometries onto rasters in screen space.

use jump_core::{clip_segment, FillPattern, Geometry, LayerStyle, Point, Raster, Rgba};

use crate::viewport::Viewport;

fn pixel(x: f64, y: f64) -> (i64, i64) {
    (x.floor() as i64, y.floor() as i64)
}

fn to_pixel(viewport: &Viewport, p: &Point) -> (i64, i64) {
    let (x, y) = viewport.to_screen(p);
    pixel(x, y)
}

/// Draws one segment, clipped to the canvas in screen space so far-away
/// vertices never reach the integer rasterizer.
fn segment(raster: &mut Raster, viewport: &Viewport, a: &Point, b: &Point, width: u32, color: Rgba) {
    let pad = width.max(1) as f64;
    let clipped = clip_segment(
        viewport.to_screen(a),
        viewport.to_screen(b),
        (-pad, -pad),
        (raster.width() as f64 + pad, raster.height() as f64 + pad),
    );
    if let Some((from, to)) = clipped {
        raster.draw_line(pixel(from.0, from.1), pixel(to.0, to.1), width, color);
    }
}

fn stroke(raster: &mut Raster, viewport: &Viewport, points: &[Point], closed: bool, width: u32, color: Rgba) {
    for pair in points.windows(2) {
        segment(raster, viewport, &pair[0], &pair[1], width, color);
    }
    if closed && points.len() > 2 {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            segment(raster, viewport, last, first, width, color);
        }
    }
}

/// Square marker of `size` pixels centred on `p`.
pub fn paint_marker(raster: &mut Raster, viewport: &Viewport, p: &Point, size: u32, color: Rgba) {
    let (x, y) = to_pixel(viewport, p);
    let size = size.max(1) as i64;
    raster.fill_rect(x.saturating_sub(size / 2), y.saturating_sub(size / 2), size, size, color);
}

/// Fill and outline of one geometry. Vertex markers are painted separately
/// so they can go on top of every feature.
pub fn paint_geometry(raster: &mut Raster, viewport: &Viewport, geometry: &Geometry, style: &LayerStyle) {
    let fill = style.fill.with_opacity(style.opacity);
    let line = style.line.with_opacity(style.opacity.max(0.5));
    match geometry {
        Geometry::Point(p) => {
            paint_marker(raster, viewport, p, style.vertex_size.max(3), fill);
        }
        Geometry::LineString(points) => {
            stroke(raster, viewport, points, false, style.line_width, line);
        }
        Geometry::Polygon(ring) => {
            if style.fill_pattern != FillPattern::Outline {
                let screen: Vec<(f64, f64)> = ring.iter().map(|p| viewport.to_screen(p)).collect();
                raster.fill_polygon(&screen, fill, style.fill_pattern == FillPattern::Hatched);
            }
            stroke(raster, viewport, ring, true, style.line_width, line);
        }
    }
}

pub fn paint_vertices(raster: &mut Raster, viewport: &Viewport, geometry: &Geometry, size: u32, color: Rgba) {
    for vertex in geometry.vertices() {
        paint_marker(raster, viewport, vertex, size, color);
    }
}

/// Wide stroke around a geometry, used for highlight halos.
pub fn paint_halo(raster: &mut Raster, viewport: &Viewport, geometry: &Geometry, width: u32, color: Rgba) {
    match geometry {
        Geometry::Point(p) => paint_marker(raster, viewport, p, width.saturating_mul(2), color),
        Geometry::LineString(points) => stroke(raster, viewport, points, false, width, color),
        Geometry::Polygon(ring) => stroke(raster, viewport, ring, true, width, color),
    }
}
