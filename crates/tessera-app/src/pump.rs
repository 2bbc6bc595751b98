//! Input pump.
//!
//! Translates platform-agnostic input events into tree events: updates the
//! shared mouse/keyboard state first (the overlay's containment checks read
//! it), hit-tests the pointer against laid-out rects, derives
//! mouseenter/mouseleave transitions, and dispatches through the
//! capture/bubble pipeline. Also owns the frame tick that drives popup
//! transitions.

use crate::context::EditorContext;
use slate_animation::FrameScheduler;
use slate_dom::{
    Document, DomEvent, EventDispatcher, InputEventData, KeyboardEventData, MouseEventData, Node,
    NodeId, WheelEventData,
};
use slate_events::HoverTracker;
use slate_input::{InputEvent, KeyEvent, KeyEventType, KeyboardState, MouseEvent, MouseEventType, MouseState};
use slate_layout::GeometryStore;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;
use tracing::trace;

/// Routes host input into the element tree and ticks frames.
pub struct InputPump {
    document: Rc<Document>,
    geometry: Rc<RefCell<GeometryStore>>,
    mouse: Rc<RefCell<MouseState>>,
    scheduler: Rc<RefCell<FrameScheduler>>,
    hover: HoverTracker,
    keyboard: KeyboardState,
    /// Target of the last mousedown, for click synthesis.
    press_target: Option<NodeId>,
}

impl InputPump {
    pub fn new(ctx: &EditorContext) -> Self {
        Self {
            document: ctx.document.clone(),
            geometry: ctx.geometry.clone(),
            mouse: ctx.mouse.clone(),
            scheduler: ctx.scheduler.clone(),
            hover: HoverTracker::new(),
            keyboard: KeyboardState::new(),
            press_target: None,
        }
    }

    /// Dispatch one input event into the tree.
    pub fn dispatch(&mut self, event: InputEvent) {
        match event {
            InputEvent::Mouse(mouse) => self.dispatch_mouse(mouse),
            InputEvent::Key(key) => self.dispatch_key(key),
        }
    }

    /// Run `frames` scheduler ticks (popup transitions, cursor watches).
    pub fn run_frames(&self, frames: usize) {
        for _ in 0..frames {
            slate_animation::pump_frame(&self.scheduler, Instant::now());
        }
    }

    /// Text entry: the host keeps the field's value current and reports the
    /// full text on each input event.
    pub fn dispatch_text_input(&self, field: &Rc<Node>, text: &str) {
        field.set_attribute("value", text);
        let mut event = DomEvent::input(InputEventData {
            data: Some(text.to_string()),
            ..Default::default()
        });
        EventDispatcher::dispatch(&mut event, field);
    }

    fn dispatch_mouse(&mut self, mouse: MouseEvent) {
        // State first: the overlay's per-frame watch reads the shared
        // position, so it must be current before any handler runs.
        {
            let mut state = self.mouse.borrow_mut();
            state.set_position(mouse.position);
            match mouse.event_type {
                MouseEventType::MouseDown => state.button_down(mouse.button),
                MouseEventType::MouseUp => state.button_up(mouse.button),
                _ => {}
            }
        }

        let target = self.hit_target(mouse.position.x, mouse.position.y);
        trace!(
            event = mouse.event_type.name(),
            target = target.id.raw(),
            "pump dispatch"
        );

        if mouse.event_type == MouseEventType::MouseMove {
            self.update_hover(&target);
        }

        let data = MouseEventData {
            client_x: mouse.position.x,
            client_y: mouse.position.y,
            button: mouse.button.button_index(),
            buttons: mouse.buttons,
            ctrl_key: mouse.modifiers.ctrl,
            alt_key: mouse.modifiers.alt,
            shift_key: mouse.modifiers.shift,
            meta_key: mouse.modifiers.meta,
            detail: mouse.click_count,
        };

        match mouse.event_type {
            MouseEventType::Wheel => {
                let mut event = DomEvent::wheel(WheelEventData {
                    delta_x: mouse.delta.x,
                    delta_y: mouse.delta.y,
                    client_x: mouse.position.x,
                    client_y: mouse.position.y,
                });
                EventDispatcher::dispatch(&mut event, &target);
            }
            MouseEventType::MouseEnter | MouseEventType::MouseLeave => {
                // Viewport-level enter/leave; element-level transitions come
                // from the hover tracker.
            }
            _ => {
                let mut event = DomEvent::mouse(mouse.event_type.name(), true, data.clone());
                EventDispatcher::dispatch(&mut event, &target);
            }
        }

        // Click synthesis: mouseup on the element that took the mousedown.
        match mouse.event_type {
            MouseEventType::MouseDown => {
                self.press_target = Some(target.id);
            }
            MouseEventType::MouseUp => {
                if self.press_target.take() == Some(target.id) && mouse.button.is_primary() {
                    let mut click = DomEvent::mouse("click", true, data);
                    EventDispatcher::dispatch(&mut click, &target);
                }
            }
            _ => {}
        }
    }

    fn dispatch_key(&mut self, key: KeyEvent) {
        let repeat = match key.event_type {
            KeyEventType::KeyDown => self.keyboard.key_down(key.key_code),
            KeyEventType::KeyUp => {
                self.keyboard.key_up(key.key_code);
                false
            }
            KeyEventType::Input => false,
        };

        let name = match key.event_type {
            KeyEventType::KeyDown => "keydown",
            KeyEventType::KeyUp => "keyup",
            KeyEventType::Input => "input",
        };

        let target = self
            .document
            .body()
            .unwrap_or_else(|| self.document.root().clone());
        let mut event = DomEvent::keyboard(
            name,
            KeyboardEventData {
                key: key.key,
                code: key.code,
                repeat: repeat || key.repeat,
                ctrl_key: key.modifiers.ctrl,
                alt_key: key.modifiers.alt,
                shift_key: key.modifiers.shift,
                meta_key: key.modifiers.meta,
            },
        );
        EventDispatcher::dispatch(&mut event, &target);
    }

    fn hit_target(&self, x: f64, y: f64) -> Rc<Node> {
        let hit = self.geometry.borrow().hit_test(x, y);
        hit.and_then(|id| self.document.get_node(id))
            .or_else(|| self.document.body())
            .unwrap_or_else(|| self.document.root().clone())
    }

    fn update_hover(&mut self, target: &Rc<Node>) {
        let mut path: Vec<NodeId> = target.ancestors().iter().map(|n| n.id).collect();
        path.reverse();
        path.push(target.id);

        let (entered, left) = self.hover.update(path);
        for id in left {
            if let Some(node) = self.document.get_node(id) {
                let mut event = DomEvent::mouse("mouseleave", false, MouseEventData::default());
                EventDispatcher::dispatch(&mut event, &node);
            }
        }
        for id in entered {
            if let Some(node) = self.document.get_node(id) {
                let mut event = DomEvent::mouse("mouseenter", false, MouseEventData::default());
                EventDispatcher::dispatch(&mut event, &node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::bootstrap;
    use crate::layout::layout_chrome;
    use slate_input::{Modifiers, MouseButton, Point};
    use slate_layout::Viewport;
    use tessera_core::EditorConfig;
    use tessera_panels::EditorShell;

    fn pump_fixture() -> (EditorContext, InputPump) {
        let ctx = bootstrap(
            EditorConfig::default(),
            Viewport::new(1280.0, 800.0),
            EditorShell::new(),
        )
        .expect("bootstrap");
        layout_chrome(&ctx).expect("layout");
        let pump = InputPump::new(&ctx);
        (ctx, pump)
    }

    fn press_release(pump: &mut InputPump, at: Point) {
        pump.dispatch(InputEvent::Mouse(
            MouseEvent::new(MouseEventType::MouseDown, at).with_button(MouseButton::Primary),
        ));
        pump.dispatch(InputEvent::Mouse(
            MouseEvent::new(MouseEventType::MouseUp, at).with_button(MouseButton::Primary),
        ));
    }

    #[test]
    fn click_synthesis_hits_toolbar_button() {
        let (ctx, mut pump) = pump_fixture();

        // Second toolbar button (paint) sits at x = 8 + 72 = 80.
        press_release(&mut pump, Point::new(90.0, 20.0));

        assert_eq!(
            ctx.shell.borrow().active_tool(),
            tessera_panels::Tool::Paint
        );
    }

    #[test]
    fn mouse_state_tracks_position_before_dispatch() {
        let (ctx, mut pump) = pump_fixture();
        pump.dispatch(InputEvent::Mouse(MouseEvent::new(
            MouseEventType::MouseMove,
            Point::new(321.0, 123.0),
        )));
        assert_eq!(ctx.mouse.borrow().position, Point::new(321.0, 123.0));
    }

    #[test]
    fn hover_transitions_fire_once() {
        let (_ctx, mut pump) = pump_fixture();

        pump.dispatch(InputEvent::Mouse(MouseEvent::new(
            MouseEventType::MouseMove,
            Point::new(90.0, 20.0),
        )));
        assert!(!pump.hover.hover_path().is_empty());

        // Moving within the same element keeps the path stable.
        let before = pump.hover.hover_path().to_vec();
        pump.dispatch(InputEvent::Mouse(MouseEvent::new(
            MouseEventType::MouseMove,
            Point::new(91.0, 21.0),
        )));
        assert_eq!(before, pump.hover.hover_path());
    }

    #[test]
    fn escape_with_no_popup_is_absorbed() {
        let (ctx, mut pump) = pump_fixture();

        pump.dispatch(InputEvent::Key(KeyEvent::new(
            KeyEventType::KeyDown,
            slate_input::KeyCode::Escape,
            Modifiers::new(),
        )));
        assert!(!ctx.overlay.is_open());
    }
}
