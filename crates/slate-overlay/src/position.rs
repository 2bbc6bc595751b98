//! Popup placement against the viewport.
//!
//! Deterministic, order-sensitive: horizontal side first, vertical side
//! second, then the soft panel-bounds nudge, then the trigger-containment
//! shift. Panel bounds are a preference; viewport bounds are a hard
//! constraint; trigger containment overrides both so the cursor that opened
//! a menu is always over it.

use slate_input::Point;
use slate_layout::{Rect, Size, Viewport};
use tracing::trace;

/// Default margin kept between a popup and the viewport edges.
pub const DEFAULT_MARGIN: f64 = 20.0;

/// Fallback size for a context menu whose measurement came back zero.
pub const MENU_FALLBACK_SIZE: Size = Size {
    width: 200.0,
    height: 150.0,
};

/// Fallback size for a dropdown whose measurement came back zero.
pub const DROPDOWN_FALLBACK_SIZE: Size = Size {
    width: 150.0,
    height: 50.0,
};

/// How close the trigger point is pulled to the popup edge when the
/// containment shift applies.
const TRIGGER_EDGE_INSET: f64 = 2.0;

/// Which side of the trigger the popup opens toward horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalSide {
    Right,
    Left,
}

/// Which side of the trigger the popup opens toward vertically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalSide {
    Below,
    Above,
}

/// Placement outcome: the popup origin plus which quadrant it opened into,
/// consumed for CSS placement and the open-animation class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionResult {
    pub x: f64,
    pub y: f64,
    pub horizontal: HorizontalSide,
    pub vertical: VerticalSide,
}

impl PositionResult {
    pub fn rect(&self, size: Size) -> Rect {
        Rect::new(self.x, self.y, size.width, size.height)
    }
}

/// A placement request.
#[derive(Debug, Clone, Copy)]
pub struct PlacementRequest {
    /// Where the popup was requested (cursor position of the trigger event).
    pub trigger: Point,
    /// Measured popup size, already fallback-substituted via
    /// [`effective_size`].
    pub size: Size,
    /// Current viewport.
    pub viewport: Viewport,
    /// Bounds of the owning panel, when the popup should prefer staying
    /// inside it.
    pub panel_bounds: Option<Rect>,
    /// Margin kept to viewport edges.
    pub margin: f64,
}

/// Substitute a fallback for zero-size measurements so a menu is never
/// positioned as a zero-size point.
pub fn effective_size(measured: Size, fallback: Size) -> Size {
    if measured.is_empty() {
        fallback
    } else {
        measured
    }
}

/// Compute the popup position for a request.
pub fn position_popup(req: &PlacementRequest) -> PositionResult {
    let PlacementRequest {
        trigger,
        size,
        viewport,
        panel_bounds,
        margin,
    } = *req;

    // Horizontal: prefer opening right of the trigger, flip left when the
    // right side cannot fit the popup plus margin, center-clamp when
    // neither side can.
    let space_right = viewport.width - trigger.x;
    let space_left = trigger.x;
    let (mut x, horizontal) = if space_right >= size.width + margin {
        (trigger.x, HorizontalSide::Right)
    } else if space_left >= size.width + margin {
        (trigger.x - size.width, HorizontalSide::Left)
    } else {
        let side = if trigger.x > viewport.width / 2.0 {
            HorizontalSide::Left
        } else {
            HorizontalSide::Right
        };
        (
            clamp(
                trigger.x - size.width / 2.0,
                margin,
                viewport.width - size.width - margin,
            ),
            side,
        )
    };

    // Vertical: symmetric rule.
    let space_below = viewport.height - trigger.y;
    let space_above = trigger.y;
    let (mut y, vertical) = if space_below >= size.height + margin {
        (trigger.y, VerticalSide::Below)
    } else if space_above >= size.height + margin {
        (trigger.y - size.height, VerticalSide::Above)
    } else {
        let side = if trigger.y > viewport.height / 2.0 {
            VerticalSide::Above
        } else {
            VerticalSide::Below
        };
        (
            clamp(
                trigger.y - size.height / 2.0,
                margin,
                viewport.height - size.height - margin,
            ),
            side,
        )
    };

    // Soft preference: stay inside the owning panel when that is still
    // compatible with the viewport constraint.
    if let Some(panel) = panel_bounds {
        if panel.width >= size.width {
            let preferred = clamp(x, panel.x, panel.right() - size.width);
            x = clamp(preferred, margin, viewport.width - size.width - margin);
        }
        if panel.height >= size.height {
            let preferred = clamp(y, panel.y, panel.bottom() - size.height);
            y = clamp(preferred, margin, viewport.height - size.height - margin);
        }
    }

    // Hard guarantee: the trigger point ends up inside the popup rect, so
    // the cursor that opened the menu is over the menu. Shift by the
    // minimum delta when clamping pushed the rect off the trigger.
    let rect = Rect::new(x, y, size.width, size.height);
    if !rect.contains(trigger.x, trigger.y) {
        if trigger.x < rect.x {
            x = trigger.x - TRIGGER_EDGE_INSET;
        } else if trigger.x >= rect.right() {
            x = trigger.x + TRIGGER_EDGE_INSET - size.width;
        }
        if trigger.y < rect.y {
            y = trigger.y - TRIGGER_EDGE_INSET;
        } else if trigger.y >= rect.bottom() {
            y = trigger.y + TRIGGER_EDGE_INSET - size.height;
        }
        trace!(
            from = ?(rect.x, rect.y),
            to = ?(x, y),
            "trigger containment shift applied"
        );
    }

    PositionResult {
        x,
        y,
        horizontal,
        vertical,
    }
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if max < min {
        // Degenerate range (popup larger than the allowed span): pin to min.
        return min;
    }
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(trigger: (f64, f64)) -> PlacementRequest {
        PlacementRequest {
            trigger: Point::new(trigger.0, trigger.1),
            size: Size::new(200.0, 150.0),
            viewport: Viewport::new(1000.0, 800.0),
            panel_bounds: None,
            margin: DEFAULT_MARGIN,
        }
    }

    #[test]
    fn ample_space_anchors_right_below() {
        let result = position_popup(&request((10.0, 10.0)));
        assert_eq!((result.x, result.y), (10.0, 10.0));
        assert_eq!(result.horizontal, HorizontalSide::Right);
        assert_eq!(result.vertical, VerticalSide::Below);
    }

    #[test]
    fn near_right_edge_flips_left() {
        let result = position_popup(&request((990.0, 10.0)));
        assert_eq!(result.x, 790.0);
        assert_eq!(result.horizontal, HorizontalSide::Left);
        assert_eq!(result.y, 10.0);
    }

    #[test]
    fn bottom_left_corner_flips_above_keeps_right() {
        let result = position_popup(&request((5.0, 790.0)));
        assert_eq!(result.x, 5.0);
        assert_eq!(result.horizontal, HorizontalSide::Right);
        assert_eq!(result.y, 640.0);
        assert_eq!(result.vertical, VerticalSide::Above);
    }

    #[test]
    fn centered_fallback_clamps_to_margins() {
        // Popup too wide for either side of a mid-viewport trigger.
        let req = PlacementRequest {
            trigger: Point::new(500.0, 400.0),
            size: Size::new(900.0, 700.0),
            viewport: Viewport::new(1000.0, 800.0),
            panel_bounds: None,
            margin: DEFAULT_MARGIN,
        };
        let result = position_popup(&req);
        assert!(result.x >= DEFAULT_MARGIN);
        assert!(result.x <= 1000.0 - 900.0 - DEFAULT_MARGIN);
        assert!(result.y >= DEFAULT_MARGIN);
        assert!(result.y <= 800.0 - 700.0 - DEFAULT_MARGIN);
    }

    #[test]
    fn trigger_always_inside_final_rect() {
        let triggers = [
            (0.0, 0.0),
            (999.0, 799.0),
            (500.0, 400.0),
            (10.0, 790.0),
            (990.0, 5.0),
        ];
        for (tx, ty) in triggers {
            let req = request((tx, ty));
            let result = position_popup(&req);
            let rect = result.rect(req.size).inflate(TRIGGER_EDGE_INSET);
            assert!(
                rect.contains(tx, ty),
                "trigger ({tx}, {ty}) outside rect {rect:?}"
            );
        }
    }

    #[test]
    fn centered_trigger_containment_after_clamp() {
        // Trigger in the far corner with a popup too large for either side:
        // clamping would leave the trigger outside, the shift pulls it back.
        let req = PlacementRequest {
            trigger: Point::new(2.0, 2.0),
            size: Size::new(980.0, 760.0),
            viewport: Viewport::new(1000.0, 800.0),
            panel_bounds: None,
            margin: DEFAULT_MARGIN,
        };
        let result = position_popup(&req);
        let rect = result.rect(req.size).inflate(TRIGGER_EDGE_INSET);
        assert!(rect.contains(2.0, 2.0));
    }

    #[test]
    fn panel_bounds_are_soft_preference() {
        // Panel on the left half; trigger near its right edge. The popup
        // would anchor right of the trigger and overflow the panel, so the
        // nudge pulls it back inside the panel.
        let req = PlacementRequest {
            trigger: Point::new(380.0, 100.0),
            size: Size::new(200.0, 150.0),
            viewport: Viewport::new(1000.0, 800.0),
            panel_bounds: Some(Rect::new(0.0, 0.0, 400.0, 800.0)),
            margin: DEFAULT_MARGIN,
        };
        let result = position_popup(&req);
        assert_eq!(result.x, 200.0); // panel.right - width
                                     // Trigger still inside the popup.
        let rect = result.rect(req.size).inflate(TRIGGER_EDGE_INSET);
        assert!(rect.contains(380.0, 100.0));
    }

    #[test]
    fn panel_narrower_than_popup_is_ignored() {
        let req = PlacementRequest {
            trigger: Point::new(100.0, 100.0),
            size: Size::new(200.0, 150.0),
            viewport: Viewport::new(1000.0, 800.0),
            panel_bounds: Some(Rect::new(50.0, 0.0, 100.0, 800.0)),
            margin: DEFAULT_MARGIN,
        };
        let result = position_popup(&req);
        // Horizontal nudge skipped entirely; the anchored position stands.
        assert_eq!(result.x, 100.0);
    }

    #[test]
    fn zero_measurement_gets_fallback() {
        assert_eq!(
            effective_size(Size::zero(), MENU_FALLBACK_SIZE),
            MENU_FALLBACK_SIZE
        );
        assert_eq!(
            effective_size(Size::new(180.0, 90.0), MENU_FALLBACK_SIZE),
            Size::new(180.0, 90.0)
        );
    }
}
