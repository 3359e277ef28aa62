use crate::geom::{Point, Size, point};
use serde::{Deserialize, Serialize};

/// Gap between the pointer anchor and the tooltip box.
pub const TOOLTIP_OFFSET: f64 = 14.0;
/// Minimum distance kept from every viewport edge.
pub const EDGE_INSET: f64 = 8.0;

/// Places a measured content box relative to an anchor point, in viewport
/// coordinates. Default placement is below-right of the anchor; each axis
/// independently flips to the other side when it would overflow, then clamps
/// to the inset.
pub fn place_tooltip(anchor: Point, content: Size, viewport: Size) -> Point {
    let mut left = anchor.x + TOOLTIP_OFFSET;
    let mut top = anchor.y + TOOLTIP_OFFSET;

    if left + content.width > viewport.width - EDGE_INSET {
        left = anchor.x - content.width - TOOLTIP_OFFSET;
    }
    if left < EDGE_INSET {
        left = EDGE_INSET;
    }

    if top + content.height > viewport.height - EDGE_INSET {
        top = anchor.y - content.height - TOOLTIP_OFFSET;
    }
    if top < EDGE_INSET {
        top = EDGE_INSET;
    }

    point(left, top)
}

/// What the hover tooltip says about a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TooltipContent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yoy: Option<String>,
}

/// Viewport-aware tooltip state. The computed position persists across
/// hide/show cycles: a re-show before the next anchor update must not flash
/// at a stale default position.
#[derive(Debug, Clone)]
pub struct TooltipOverlay {
    visible: bool,
    position: Point,
    content: TooltipContent,
}

impl Default for TooltipOverlay {
    fn default() -> Self {
        Self {
            visible: false,
            position: point(0.0, 0.0),
            content: TooltipContent::default(),
        }
    }
}

impl TooltipOverlay {
    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn content(&self) -> &TooltipContent {
        &self.content
    }

    pub fn show(
        &mut self,
        anchor: Point,
        content_box: Size,
        viewport: Size,
        content: TooltipContent,
    ) {
        self.visible = true;
        self.content = content;
        self.position = place_tooltip(anchor, content_box, viewport);
    }

    /// Follows the pointer while already visible.
    pub fn move_anchor(&mut self, anchor: Point, content_box: Size, viewport: Size) {
        self.visible = true;
        self.position = place_tooltip(anchor, content_box, viewport);
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::size;

    #[test]
    fn default_placement_is_below_right_of_anchor() {
        let p = place_tooltip(point(100.0, 100.0), size(120.0, 60.0), size(800.0, 600.0));
        assert_eq!(p, point(114.0, 114.0));
    }

    #[test]
    fn bottom_right_anchor_flips_both_axes_within_insets() {
        let viewport = size(800.0, 600.0);
        let p = place_tooltip(point(790.0, 590.0), size(120.0, 60.0), viewport);
        assert_eq!(p, point(790.0 - 120.0 - 14.0, 590.0 - 60.0 - 14.0));
        assert!(p.x >= EDGE_INSET && p.x + 120.0 <= viewport.width - EDGE_INSET);
        assert!(p.y >= EDGE_INSET && p.y + 60.0 <= viewport.height - EDGE_INSET);
    }

    #[test]
    fn flip_decisions_are_independent_per_axis() {
        // Overflows only on the right: horizontal flips, vertical stays.
        let p = place_tooltip(point(790.0, 100.0), size(120.0, 60.0), size(800.0, 600.0));
        assert_eq!(p, point(656.0, 114.0));
    }

    #[test]
    fn flipped_placement_clamps_to_edge_inset() {
        // Anchor so far left that the flipped box would go negative.
        let p = place_tooltip(point(795.0, 5.0), size(790.0, 4.0), size(800.0, 600.0));
        assert_eq!(p.x, EDGE_INSET);
        assert_eq!(p.y, 19.0);
    }

    #[test]
    fn hidden_overlay_retains_last_position() {
        let mut overlay = TooltipOverlay::default();
        overlay.show(
            point(100.0, 100.0),
            size(120.0, 60.0),
            size(800.0, 600.0),
            TooltipContent {
                title: "Revenue".to_string(),
                value: Some("$50M".to_string()),
                yoy: None,
            },
        );
        let shown_at = overlay.position();
        overlay.hide();
        assert!(!overlay.visible());
        assert_eq!(overlay.position(), shown_at);
    }
}
