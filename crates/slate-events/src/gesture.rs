//! Interaction-gesture state shared across the chrome.
//!
//! The editor tracks exactly one in-progress pointer gesture at a time:
//! marquee selection, panel resize, or an item drag. Global input handling
//! (right-click, context menu) cancels whichever gesture is active through
//! the single entry point here, so no stale marquee overlay can survive a
//! popup opening.

use slate_dom::NodeId;
use tracing::debug;

/// The chrome's current pointer gesture. Variants carry the container that
/// owns the gesture so cancellation can notify the right panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveGesture {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Rubber-band multi-select inside a panel.
    MarqueeSelect { owner: NodeId },
    /// Dragging a panel edge.
    PanelResize { owner: NodeId },
    /// Dragging an item (asset, layer row).
    ItemDrag { owner: NodeId },
}

impl ActiveGesture {
    /// Whether this gesture paints a transient overlay that must be removed
    /// on cancellation.
    pub fn has_overlay(&self) -> bool {
        matches!(self, ActiveGesture::MarqueeSelect { .. })
    }
}

/// Explicitly-owned interaction state. Created once at startup and passed by
/// reference to every component that starts or cancels gestures.
#[derive(Debug, Default)]
pub struct InteractionState {
    current: ActiveGesture,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The gesture currently in progress.
    pub fn current(&self) -> ActiveGesture {
        self.current
    }

    pub fn is_idle(&self) -> bool {
        self.current == ActiveGesture::Idle
    }

    /// Begin a gesture. An already-active gesture is cancelled first; two
    /// gestures never run concurrently.
    pub fn begin(&mut self, gesture: ActiveGesture) {
        if self.current != ActiveGesture::Idle {
            debug!(replacing = ?self.current, with = ?gesture, "gesture superseded");
        }
        self.current = gesture;
    }

    /// Mark a gesture finished normally.
    pub fn finish(&mut self) {
        self.current = ActiveGesture::Idle;
    }

    /// The one cancellation entry point: clears whatever gesture is active
    /// and returns it so the caller can tear down gesture-specific state
    /// (marquee overlays in particular).
    pub fn cancel_active_gesture(&mut self) -> ActiveGesture {
        let cancelled = std::mem::take(&mut self.current);
        match cancelled {
            ActiveGesture::Idle => {}
            ActiveGesture::MarqueeSelect { owner } => {
                debug!(?owner, "marquee selection cancelled");
            }
            ActiveGesture::PanelResize { owner } => {
                debug!(?owner, "panel resize cancelled");
            }
            ActiveGesture::ItemDrag { owner } => {
                debug!(?owner, "item drag cancelled");
            }
        }
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_gesture_at_a_time() {
        let mut state = InteractionState::new();
        assert!(state.is_idle());

        state.begin(ActiveGesture::MarqueeSelect {
            owner: NodeId::new(1),
        });
        state.begin(ActiveGesture::PanelResize {
            owner: NodeId::new(2),
        });

        assert_eq!(
            state.current(),
            ActiveGesture::PanelResize {
                owner: NodeId::new(2)
            }
        );
    }

    #[test]
    fn test_cancel_returns_previous() {
        let mut state = InteractionState::new();
        state.begin(ActiveGesture::MarqueeSelect {
            owner: NodeId::new(4),
        });

        let cancelled = state.cancel_active_gesture();
        assert_eq!(
            cancelled,
            ActiveGesture::MarqueeSelect {
                owner: NodeId::new(4)
            }
        );
        assert!(cancelled.has_overlay());
        assert!(state.is_idle());

        // Cancelling again is a no-op.
        assert_eq!(state.cancel_active_gesture(), ActiveGesture::Idle);
    }
}
