//! # Slate Layout
//!
//! Geometry primitives and measured-rect bookkeeping for the editor chrome.
//!
//! The host shell performs actual layout; this crate holds the resulting
//! rectangles so chrome code (hit checks, popup placement) can query them
//! without reaching back into the layout engine.

use slate_dom::NodeId;
use std::collections::HashMap;
use thiserror::Error;
use tracing::trace;

/// Errors that can occur in layout bookkeeping.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Node was never laid out: {0:?}")]
    NotLaidOut(NodeId),
}

/// A 2D rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Grow the rectangle by `amount` on every side (negative shrinks).
    pub fn inflate(&self, amount: f64) -> Rect {
        Rect::new(
            self.x - amount,
            self.y - amount,
            self.width + 2.0 * amount,
            self.height + 2.0 * amount,
        )
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// A 2D size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// A size with no area (either axis collapsed).
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Edge sizes (margin, padding, border).
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeSizes {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl EdgeSizes {
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Viewport metrics for the editor window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.bounds().contains(x, y)
    }
}

/// Laid-out rectangles per node, written by the host layout pass and read by
/// chrome code.
#[derive(Debug, Default)]
pub struct GeometryStore {
    rects: HashMap<NodeId, Rect>,
}

impl GeometryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the laid-out rect for a node.
    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        self.rects.insert(node, rect);
    }

    /// The laid-out rect for a node, if it was ever laid out.
    pub fn rect_of(&self, node: NodeId) -> Option<Rect> {
        self.rects.get(&node).copied()
    }

    /// Measure a node. Nodes that were never laid out (or laid out hidden)
    /// measure as zero; callers substitute their own fallbacks.
    pub fn measure(&self, node: NodeId) -> Size {
        self.rects
            .get(&node)
            .map(|r| r.size())
            .unwrap_or_else(Size::zero)
    }

    /// Forget a node (e.g. after it is removed from the document).
    pub fn remove(&mut self, node: NodeId) {
        self.rects.remove(&node);
    }

    /// Drop all recorded rects.
    pub fn clear(&mut self) {
        trace!(count = self.rects.len(), "geometry store cleared");
        self.rects.clear();
    }

    /// Hit-test: deepest recorded rect containing the point, preferring the
    /// smallest area on ties (a child rect nests inside its parent's).
    pub fn hit_test(&self, x: f64, y: f64) -> Option<NodeId> {
        self.rects
            .iter()
            .filter(|(_, r)| r.contains(x, y))
            .min_by(|(_, a), (_, b)| {
                let area_a = a.width * a.height;
                let area_b = b.width * b.height;
                area_a.partial_cmp(&area_b).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(id, _)| *id)
    }
}
