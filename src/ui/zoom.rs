/// Zoom and pan geometry for the hi-res viewer
///
/// Pure state, no rendering. All positions are in viewport pixels relative to
/// the viewport's top-left corner; `translate` is the image's offset from its
/// centred position.

use cgmath::{vec2, Vector2, Zero};

pub const MIN_SCALE: f32 = 1.0;
pub const MAX_SCALE: f32 = 5.0;
/// Scale change per wheel event
pub const ZOOM_STEP: f32 = 0.15;

/// Scales closer than this to 1.0 snap to exactly 1.0
const SCALE_EPSILON: f32 = 1e-3;

/// Where a drag started
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragAnchor {
    cursor: Vector2<f32>,
    translate: Vector2<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoomPanTransform {
    scale: f32,
    translate: Vector2<f32>,
    drag: Option<DragAnchor>,
    /// Reference of the image currently shown; a new one resets the transform
    image: Option<String>,
}

impl Default for ZoomPanTransform {
    fn default() -> Self {
        Self {
            scale: MIN_SCALE,
            translate: Vector2::zero(),
            drag: None,
            image: None,
        }
    }
}

impl ZoomPanTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn translate(&self) -> Vector2<f32> {
        self.translate
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Back to 1× centred, forgetting which image was shown
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Reset to 1× centred whenever a different image is opened
    pub fn show(&mut self, image: &str) {
        if self.image.as_deref() != Some(image) {
            *self = Self {
                image: Some(image.to_string()),
                ..Self::default()
            };
        }
    }

    /// Wheel zoom anchored at `cursor`. Negative `delta_y` zooms in.
    ///
    /// Returns false if the scale was already at the limit.
    pub fn on_scroll(&mut self, delta_y: f32, cursor: Vector2<f32>, viewport: Vector2<f32>) -> bool {
        let previous = self.scale;
        let step = if delta_y < 0.0 { ZOOM_STEP } else { -ZOOM_STEP };
        let mut next = (previous + step).clamp(MIN_SCALE, MAX_SCALE);
        if (next - MIN_SCALE).abs() < SCALE_EPSILON {
            next = MIN_SCALE;
        }

        if next == previous {
            return false;
        }

        self.scale = next;

        if next == MIN_SCALE {
            self.translate = Vector2::zero();
            self.drag = None;
            return true;
        }

        // keep the image point under the cursor fixed
        let offset = cursor - viewport / 2.0 - self.translate;
        let ratio = (next - previous) / previous;
        self.translate -= offset * ratio;
        true
    }

    /// Begin panning. Ignored at 1×.
    pub fn on_drag_start(&mut self, cursor: Vector2<f32>) -> bool {
        if self.scale <= MIN_SCALE {
            return false;
        }
        self.drag = Some(DragAnchor {
            cursor,
            translate: self.translate,
        });
        true
    }

    /// Follow the cursor, clamped so the image never leaves the viewport.
    ///
    /// `natural` is the image's natural size in pixels.
    pub fn on_drag_move(&mut self, cursor: Vector2<f32>, natural: Vector2<f32>, viewport: Vector2<f32>) -> bool {
        let Some(anchor) = self.drag else {
            return false;
        };

        let wanted = anchor.translate + (cursor - anchor.cursor);
        let limit = self.pan_limit(natural, viewport);
        self.translate = vec2(
            wanted.x.clamp(-limit.x, limit.x),
            wanted.y.clamp(-limit.y, limit.y),
        );
        true
    }

    pub fn on_drag_end(&mut self) {
        self.drag = None;
    }

    /// Largest allowed |translate| per axis at the current scale
    pub fn pan_limit(&self, natural: Vector2<f32>, viewport: Vector2<f32>) -> Vector2<f32> {
        vec2(
            ((natural.x * self.scale - viewport.x) / 2.0).max(0.0),
            ((natural.y * self.scale - viewport.y) / 2.0).max(0.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Vector2<f32> = Vector2 { x: 800.0, y: 600.0 };
    const NATURAL: Vector2<f32> = Vector2 { x: 1200.0, y: 900.0 };

    fn centre() -> Vector2<f32> {
        VIEWPORT / 2.0
    }

    fn zoomed_to(steps: usize, cursor: Vector2<f32>) -> ZoomPanTransform {
        let mut transform = ZoomPanTransform::new();
        for _ in 0..steps {
            transform.on_scroll(-1.0, cursor, VIEWPORT);
        }
        transform
    }

    #[test]
    fn test_zoom_at_centre_keeps_translate() {
        let mut transform = ZoomPanTransform::new();
        assert!(transform.on_scroll(-100.0, centre(), VIEWPORT));
        assert!((transform.scale() - 1.15).abs() < 1e-6);
        assert_eq!(transform.translate(), Vector2::zero());
    }

    #[test]
    fn test_zoom_back_to_one_recentres() {
        let mut transform = zoomed_to(3, vec2(700.0, 100.0));
        assert!(transform.translate() != Vector2::zero());

        for _ in 0..3 {
            transform.on_scroll(1.0, vec2(50.0, 500.0), VIEWPORT);
        }

        assert_eq!(transform.scale(), MIN_SCALE);
        assert_eq!(transform.translate(), Vector2::zero());
    }

    #[test]
    fn test_zoom_keeps_cursor_point_fixed() {
        let cursor = vec2(600.0, 450.0);
        let mut transform = zoomed_to(2, cursor);
        let before_scale = transform.scale();
        let before = transform.translate();
        // image-space point under the cursor
        let point = (cursor - centre() - before) / before_scale;

        transform.on_scroll(-1.0, cursor, VIEWPORT);

        let after = centre() + transform.translate() + point * transform.scale();
        assert!((after.x - cursor.x).abs() < 1e-3);
        assert!((after.y - cursor.y).abs() < 1e-3);
    }

    #[test]
    fn test_scale_is_clamped() {
        let mut transform = zoomed_to(40, centre());
        assert_eq!(transform.scale(), MAX_SCALE);
        assert!(!transform.on_scroll(-1.0, centre(), VIEWPORT));

        let mut fresh = ZoomPanTransform::new();
        assert!(!fresh.on_scroll(1.0, centre(), VIEWPORT));
        assert_eq!(fresh.scale(), MIN_SCALE);
    }

    #[test]
    fn test_no_panning_at_minimum_scale() {
        let mut transform = ZoomPanTransform::new();
        assert!(!transform.on_drag_start(centre()));
        assert!(!transform.on_drag_move(vec2(0.0, 0.0), NATURAL, VIEWPORT));
        assert_eq!(transform.translate(), Vector2::zero());
    }

    #[test]
    fn test_pan_clamped_at_double_scale() {
        let mut transform = ZoomPanTransform::new();
        transform.scale = 2.0;
        let limit = vec2((NATURAL.x * 2.0 - VIEWPORT.x) / 2.0, (NATURAL.y * 2.0 - VIEWPORT.y) / 2.0);

        assert!(transform.on_drag_start(centre()));
        for target in [vec2(5000.0, -5000.0), vec2(-9000.0, 9000.0), vec2(420.0, 310.0)] {
            transform.on_drag_move(target, NATURAL, VIEWPORT);
            assert!(transform.translate().x.abs() <= limit.x);
            assert!(transform.translate().y.abs() <= limit.y);
        }
        transform.on_drag_end();
        assert!(!transform.is_dragging());
    }

    #[test]
    fn test_drag_follows_cursor_delta() {
        let mut transform = ZoomPanTransform::new();
        transform.scale = 2.0;
        transform.on_drag_start(vec2(100.0, 100.0));
        transform.on_drag_move(vec2(130.0, 80.0), NATURAL, VIEWPORT);
        assert_eq!(transform.translate(), vec2(30.0, -20.0));
    }

    #[test]
    fn test_small_image_cannot_pan() {
        let mut transform = ZoomPanTransform::new();
        transform.scale = 2.0;
        transform.on_drag_start(centre());
        transform.on_drag_move(vec2(900.0, 900.0), vec2(100.0, 100.0), VIEWPORT);
        assert_eq!(transform.translate(), Vector2::zero());
    }

    #[test]
    fn test_reopening_same_image_after_reset_starts_fresh() {
        let mut transform = ZoomPanTransform::new();
        transform.show("a.jpg");
        transform.on_scroll(-1.0, vec2(700.0, 100.0), VIEWPORT);
        transform.on_scroll(-1.0, vec2(700.0, 100.0), VIEWPORT);
        transform.on_drag_start(centre());

        transform.reset();
        transform.show("a.jpg");

        assert_eq!(transform.scale(), MIN_SCALE);
        assert_eq!(transform.translate(), Vector2::zero());
        assert!(!transform.is_dragging());
    }

    #[test]
    fn test_new_image_resets() {
        let mut transform = ZoomPanTransform::new();
        transform.show("a.jpg");
        transform.on_scroll(-1.0, vec2(10.0, 10.0), VIEWPORT);

        transform.show("a.jpg");
        assert!(transform.scale() > MIN_SCALE);

        transform.show("b.jpg");
        assert_eq!(transform.scale(), MIN_SCALE);
        assert_eq!(transform.translate(), Vector2::zero());
    }
}
