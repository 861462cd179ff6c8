use std::sync::Arc;

use jump_core::{ContentId, Geometry, Raster, Rgba};

use crate::error::RenderError;
use crate::image_cache::ImageCache;
use crate::paint;
use crate::panel::LayerViewPanel;
use crate::renderer::{RenderJob, Renderer};

pub const SELECTION_BACKGROUND: ContentId = ContentId::overlay("SELECTION_BACKGROUND");
pub const FEATURE_SELECTION: ContentId = ContentId::overlay("FEATURE_SELECTION");
pub const LINE_STRING_SELECTION: ContentId = ContentId::overlay("LINE_STRING_SELECTION");
pub const PART_SELECTION: ContentId = ContentId::overlay("PART_SELECTION");

const HALO_COLOR: Rgba = Rgba::new(255, 255, 255, 160);
const HALO_WIDTH: u32 = 7;
const HIGHLIGHT_COLOR: Rgba = Rgba::rgb(255, 255, 0);
const HANDLE_SIZE: u32 = 5;
const LINE_STRING_COLOR: Rgba = Rgba::rgb(0, 255, 255);
const PART_COLOR: Rgba = Rgba::rgb(255, 140, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStyle {
    /// Wide translucent halo painted beneath the highlight.
    Background,
    /// Outline plus a handle on every vertex.
    Highlight,
    /// Outline and handles of selected line strings; other geometries are
    /// skipped.
    LineString,
    /// Thin outline of each selected part.
    Part,
}

/// Paints the panel's current feature selection.
pub struct SelectionRenderer {
    content_id: ContentId,
    style: SelectionStyle,
    panel: Arc<dyn LayerViewPanel>,
    cache: Arc<ImageCache>,
}

impl SelectionRenderer {
    pub fn new(content_id: ContentId, style: SelectionStyle, panel: Arc<dyn LayerViewPanel>) -> Self {
        Self {
            content_id,
            style,
            panel,
            cache: ImageCache::new(),
        }
    }

    pub fn background(panel: Arc<dyn LayerViewPanel>) -> Self {
        Self::new(SELECTION_BACKGROUND, SelectionStyle::Background, panel)
    }

    pub fn highlight(panel: Arc<dyn LayerViewPanel>) -> Self {
        Self::new(FEATURE_SELECTION, SelectionStyle::Highlight, panel)
    }

    pub fn line_strings(panel: Arc<dyn LayerViewPanel>) -> Self {
        Self::new(LINE_STRING_SELECTION, SelectionStyle::LineString, panel)
    }

    pub fn parts(panel: Arc<dyn LayerViewPanel>) -> Self {
        Self::new(PART_SELECTION, SelectionStyle::Part, panel)
    }
}

impl Renderer for SelectionRenderer {
    fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    fn create_runnable(&self) -> Option<RenderJob> {
        let selection = self.panel.selection();
        if selection.is_empty() {
            self.cache.clear();
            return None;
        }
        let viewport = self.panel.viewport();
        let style = self.style;
        let session = self.cache.begin();
        Some(Box::new(move || -> Result<(), RenderError> {
            session.start_image(viewport.canvas_width, viewport.canvas_height)?;
            for (_, feature) in selection.items() {
                session.paint(|image| match style {
                    SelectionStyle::Background => {
                        paint::paint_halo(image, &viewport, &feature.geometry, HALO_WIDTH, HALO_COLOR)
                    }
                    SelectionStyle::Highlight => {
                        paint::paint_halo(image, &viewport, &feature.geometry, 1, HIGHLIGHT_COLOR);
                        paint::paint_vertices(image, &viewport, &feature.geometry, HANDLE_SIZE, HIGHLIGHT_COLOR);
                    }
                    SelectionStyle::LineString => {
                        if matches!(feature.geometry, Geometry::LineString(_)) {
                            paint::paint_halo(image, &viewport, &feature.geometry, 1, LINE_STRING_COLOR);
                            paint::paint_vertices(image, &viewport, &feature.geometry, HANDLE_SIZE, LINE_STRING_COLOR);
                        }
                    }
                    SelectionStyle::Part => {
                        paint::paint_halo(image, &viewport, &feature.geometry, 1, PART_COLOR)
                    }
                })?;
            }
            Ok(())
        }))
    }

    fn is_rendering(&self) -> bool {
        self.cache.is_rendering()
    }

    fn cancel(&self) {
        self.cache.cancel();
    }

    fn copy_to(&self, target: &mut Raster) {
        self.cache.copy_to(target, 1.0);
    }

    fn clear_image_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestPanel;
    use jump_core::{Feature, Geometry, Layer, Point};

    #[test]
    fn test_empty_selection_has_no_work() {
        let panel = TestPanel::new(10, 10);
        let renderer = SelectionRenderer::highlight(panel.clone());
        assert!(renderer.create_runnable().is_none());
        assert!(!renderer.is_rendering());
    }

    #[test]
    fn test_highlight_marks_vertices() {
        let panel = TestPanel::new(20, 20);
        let layer = panel.add_layer(Layer::new("a"));
        panel.select(layer, Feature::new(1, Geometry::Point(Point::new(0.0, 0.0))));
        let renderer = SelectionRenderer::highlight(panel.clone());
        renderer.create_runnable().unwrap()().unwrap();
        let mut target = Raster::new(20, 20);
        renderer.copy_to(&mut target);
        assert_eq!(target.get(10, 10), Some(HIGHLIGHT_COLOR));
    }

    #[test]
    fn test_clearing_selection_clears_image() {
        let panel = TestPanel::new(20, 20);
        let layer = panel.add_layer(Layer::new("a"));
        panel.select(layer, Feature::new(1, Geometry::Point(Point::new(0.0, 0.0))));
        let renderer = SelectionRenderer::background(panel.clone());
        renderer.create_runnable().unwrap()().unwrap();
        panel.clear_selection();
        assert!(renderer.create_runnable().is_none());
        let mut target = Raster::new(20, 20);
        renderer.copy_to(&mut target);
        assert!(target.is_blank());
    }

    #[test]
    fn test_line_string_style_skips_other_geometries() {
        let panel = TestPanel::new(20, 20);
        let layer = panel.add_layer(Layer::new("a"));
        panel.select(
            layer,
            Feature::new(
                1,
                Geometry::Polygon(vec![
                    Point::new(-5.0, -5.0),
                    Point::new(5.0, -5.0),
                    Point::new(5.0, 5.0),
                    Point::new(-5.0, 5.0),
                ]),
            ),
        );
        let renderer = SelectionRenderer::line_strings(panel.clone());
        renderer.create_runnable().unwrap()().unwrap();
        let mut target = Raster::new(20, 20);
        renderer.copy_to(&mut target);
        assert!(target.is_blank());

        panel.select(
            layer,
            Feature::new(2, Geometry::LineString(vec![Point::new(-5.0, 0.0), Point::new(5.0, 0.0)])),
        );
        renderer.create_runnable().unwrap()().unwrap();
        let mut target = Raster::new(20, 20);
        renderer.copy_to(&mut target);
        assert_eq!(target.get(10, 10), Some(LINE_STRING_COLOR));
        assert_eq!(target.count_pixels(PART_COLOR), 0);
    }

    #[test]
    fn test_part_style_outlines_without_handles() {
        let panel = TestPanel::new(20, 20);
        let layer = panel.add_layer(Layer::new("a"));
        panel.select(
            layer,
            Feature::new(1, Geometry::LineString(vec![Point::new(-5.0, 0.0), Point::new(5.0, 0.0)])),
        );
        let renderer = SelectionRenderer::parts(panel.clone());
        renderer.create_runnable().unwrap()().unwrap();
        let mut target = Raster::new(20, 20);
        renderer.copy_to(&mut target);
        assert_eq!(target.get(10, 10), Some(PART_COLOR));
        // A handle would cover the rows above and below the line end.
        assert_eq!(target.get(5, 9), Some(Rgba::TRANSPARENT));
    }
}
