//! # Slate Overlay
//!
//! Popup positioning and lifecycle control for the editor chrome: context
//! menus and dropdowns placed against the viewport, animated in and out,
//! dismissed on outside interaction, and guaranteed to be removed.
//!
//! Two cooperating pieces:
//!
//! - [`position`]: pure placement math (quadrant choice, margin clamping,
//!   soft panel bounds, trigger containment)
//! - [`OverlayController`]: the lifecycle — single visible popup, two-phase
//!   animated show with a bounded per-frame cursor watch, animated or
//!   immediate hide, and the document-level cancellation wiring for
//!   marquee-vs-right-click coordination

pub mod controller;
pub mod menu;
pub mod position;

pub use controller::{OverlayBuilder, OverlayController, OverlayError, PopupKind, PopupSpec};
pub use menu::{
    filter_visible, MenuAction, MenuActionCallback, MenuContext, MenuItem, MenuPredicate,
    MenuSource,
};
pub use position::{
    effective_size, position_popup, HorizontalSide, PlacementRequest, PositionResult,
    VerticalSide, DEFAULT_MARGIN, DROPDOWN_FALLBACK_SIZE, MENU_FALLBACK_SIZE,
};

#[cfg(test)]
mod tests {
    use super::*;
    use slate_animation::FrameScheduler;
    use slate_dom::{Document, DomEvent, EventDispatcher, KeyboardEventData, MouseEventData};
    use slate_events::{ActiveGesture, DelegateRegistry, InteractionState};
    use slate_input::{MouseState, Point};
    use slate_layout::{GeometryStore, Viewport};
    use slate_style::Theme;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Instant;

    struct Fixture {
        document: Rc<Document>,
        scheduler: Rc<RefCell<FrameScheduler>>,
        mouse: Rc<RefCell<MouseState>>,
        interaction: Rc<RefCell<InteractionState>>,
        controller: OverlayController,
    }

    /// Build a controller with instant transitions unless overridden.
    fn fixture(theme_overrides: &[(&str, &str)]) -> Fixture {
        let document =
            Rc::new(Document::parse_html("<html><body></body></html>").expect("template"));
        let registry = DelegateRegistry::new(document.clone());
        let scheduler = Rc::new(RefCell::new(FrameScheduler::new()));
        let geometry = Rc::new(RefCell::new(GeometryStore::new()));
        let mouse = Rc::new(RefCell::new(MouseState::new()));
        let interaction = Rc::new(RefCell::new(InteractionState::new()));

        let mut theme = Theme::new();
        theme.set("menu-open-ms", "0ms");
        theme.set("menu-close-ms", "0ms");
        for (k, v) in theme_overrides {
            theme.set(*k, *v);
        }

        let controller = OverlayController::builder()
            .document(document.clone())
            .registry(registry)
            .scheduler(scheduler.clone())
            .geometry(geometry)
            .mouse(mouse.clone())
            .interaction(interaction.clone())
            .theme(theme)
            .viewport(Viewport::new(1000.0, 800.0))
            .build()
            .expect("overlay builds");

        Fixture {
            document,
            scheduler,
            mouse,
            interaction,
            controller,
        }
    }

    fn tick(f: &Fixture) {
        slate_animation::pump_frame(&f.scheduler, Instant::now());
    }

    fn spec_at(trigger: (f64, f64)) -> PopupSpec {
        PopupSpec {
            trigger: Point::new(trigger.0, trigger.1),
            items: vec![MenuItem::action("rename", "Rename", |_| {})],
            context: MenuContext::new(),
            owner_panel_bounds: None,
            kind: PopupKind::ContextMenu,
        }
    }

    #[test]
    fn show_is_two_phase() {
        let f = fixture(&[]);
        f.mouse.borrow_mut().set_position(Point::new(20.0, 20.0));
        f.controller.show_menu(spec_at((10.0, 10.0)));

        let node = f.controller.active_node().expect("popup attached");
        assert_eq!(f.controller.popup_element_count(), 1);
        // Inserted hidden; the visible class lands on the next frame.
        assert!(!node.has_class("visible"));

        tick(&f);
        assert!(node.has_class("visible"));
        assert!(f.controller.is_open());
    }

    #[test]
    fn second_show_replaces_first_instantly() {
        let f = fixture(&[]);
        f.mouse.borrow_mut().set_position(Point::new(20.0, 20.0));

        f.controller.show_menu(spec_at((10.0, 10.0)));
        let first = f.controller.active_node().unwrap();

        f.controller.show_menu(spec_at((300.0, 300.0)));
        let second = f.controller.active_node().unwrap();

        assert_ne!(first.id, second.id);
        // Never two popups attached at once.
        assert_eq!(f.controller.popup_element_count(), 1);
        assert!(!f.document.contains(&first));
    }

    #[test]
    fn cursor_escape_during_open_animation_force_closes() {
        // Long open transition so the watch is active when the cursor moves.
        let f = fixture(&[("menu-open-ms", "10s"), ("menu-open-watch-ms", "10s")]);
        f.mouse.borrow_mut().set_position(Point::new(20.0, 20.0));
        f.controller.show_menu(spec_at((10.0, 10.0)));

        // Pointer darts away before the transition finishes.
        f.mouse.borrow_mut().set_position(Point::new(600.0, 600.0));
        tick(&f);

        assert!(!f.controller.is_open());
        assert_eq!(f.controller.popup_element_count(), 0);
    }

    #[test]
    fn cursor_near_popup_survives_open_watch() {
        let f = fixture(&[]);
        f.mouse.borrow_mut().set_position(Point::new(11.0, 11.0));
        f.controller.show_menu(spec_at((10.0, 10.0)));

        tick(&f);
        assert!(f.controller.is_open());
    }

    #[test]
    fn hide_immediate_is_synchronous() {
        let f = fixture(&[]);
        f.controller.show_menu(spec_at((10.0, 10.0)));
        assert_eq!(f.controller.popup_element_count(), 1);

        f.controller.hide_menu(true);
        assert!(!f.controller.is_open());
        assert_eq!(f.controller.popup_element_count(), 0);
    }

    #[test]
    fn animated_hide_waits_for_transition() {
        let f = fixture(&[]);
        f.mouse.borrow_mut().set_position(Point::new(20.0, 20.0));
        f.controller.show_menu(spec_at((10.0, 10.0)));
        tick(&f); // visible + open (zero-duration transition)

        f.controller.hide_menu(false);
        // Element still attached until the close transition runs its course.
        assert_eq!(f.controller.popup_element_count(), 1);
        let node = f.controller.active_node().unwrap();
        assert!(!node.has_class("visible"));

        tick(&f); // zero-duration close completes
        assert!(!f.controller.is_open());
        assert_eq!(f.controller.popup_element_count(), 0);
    }

    #[test]
    fn item_selection_invokes_callback_and_closes() {
        let f = fixture(&[]);
        f.mouse.borrow_mut().set_position(Point::new(20.0, 20.0));

        let selected = Rc::new(Cell::new(false));
        let selected_cb = selected.clone();
        let spec = PopupSpec {
            trigger: Point::new(10.0, 10.0),
            items: vec![MenuItem::action("delete", "Delete", move |ctx| {
                assert_eq!(ctx.get("layer-id"), Some("L2"));
                selected_cb.set(true);
            })],
            context: MenuContext::new().with("layer-id", "L2"),
            owner_panel_bounds: None,
            kind: PopupKind::ContextMenu,
        };
        f.controller.show_menu(spec);
        tick(&f);

        let item = f
            .document
            .select_first(&slate_style::Selector::parse("[data-menu-item=delete]").unwrap())
            .expect("item rendered");
        let mut click = DomEvent::mouse("click", true, MouseEventData::default());
        EventDispatcher::dispatch(&mut click, &item);

        assert!(selected.get());
        tick(&f); // close transition
        assert!(!f.controller.is_open());
    }

    #[test]
    fn disabled_item_does_not_fire() {
        let f = fixture(&[]);
        f.mouse.borrow_mut().set_position(Point::new(20.0, 20.0));

        let selected = Rc::new(Cell::new(false));
        let selected_cb = selected.clone();
        let spec = PopupSpec {
            trigger: Point::new(10.0, 10.0),
            items: vec![MenuItem::Action(
                crate::MenuAction::new("paste", "Paste", move |_| selected_cb.set(true))
                    .enabled_when(|_| false),
            )],
            context: MenuContext::new(),
            owner_panel_bounds: None,
            kind: PopupKind::ContextMenu,
        };
        f.controller.show_menu(spec);
        tick(&f);

        let item = f
            .document
            .select_first(&slate_style::Selector::parse("[data-menu-item=paste]").unwrap())
            .unwrap();
        assert!(item.has_class("disabled"));

        let mut click = DomEvent::mouse("click", true, MouseEventData::default());
        EventDispatcher::dispatch(&mut click, &item);

        assert!(!selected.get());
        assert!(f.controller.is_open());
    }

    #[test]
    fn fully_hidden_menu_is_not_shown() {
        let f = fixture(&[]);
        let spec = PopupSpec {
            trigger: Point::new(10.0, 10.0),
            items: vec![MenuItem::Action(
                crate::MenuAction::new("never", "Never", |_| {}).visible_when(|_| false),
            )],
            context: MenuContext::new(),
            owner_panel_bounds: None,
            kind: PopupKind::ContextMenu,
        };
        f.controller.show_menu(spec);
        assert!(!f.controller.is_open());
    }

    #[test]
    fn escape_dismisses() {
        let f = fixture(&[]);
        f.mouse.borrow_mut().set_position(Point::new(20.0, 20.0));
        f.controller.install_global_handlers();
        f.controller.show_menu(spec_at((10.0, 10.0)));
        tick(&f);

        let body = f.document.body().unwrap();
        let mut key = DomEvent::keyboard(
            "keydown",
            KeyboardEventData {
                key: "Escape".into(),
                code: "Escape".into(),
                ..Default::default()
            },
        );
        EventDispatcher::dispatch(&mut key, &body);

        tick(&f);
        assert!(!f.controller.is_open());
    }

    #[test]
    fn outside_press_dismisses_inside_press_does_not() {
        let f = fixture(&[]);
        f.mouse.borrow_mut().set_position(Point::new(20.0, 20.0));
        f.controller.install_global_handlers();
        f.controller.show_menu(spec_at((10.0, 10.0)));
        tick(&f);

        let body = f.document.body().unwrap();

        // Press inside the popup rect (popup spans 10..210 x 10..160).
        let mut inside = DomEvent::mouse(
            "mousedown",
            true,
            MouseEventData {
                client_x: 50.0,
                client_y: 50.0,
                ..Default::default()
            },
        );
        EventDispatcher::dispatch(&mut inside, &body);
        assert!(f.controller.is_open());

        let mut outside = DomEvent::mouse(
            "mousedown",
            true,
            MouseEventData {
                client_x: 700.0,
                client_y: 700.0,
                ..Default::default()
            },
        );
        EventDispatcher::dispatch(&mut outside, &body);
        tick(&f);
        assert!(!f.controller.is_open());
    }

    #[test]
    fn pointer_leaving_open_popup_closes_it() {
        let f = fixture(&[]);
        f.mouse.borrow_mut().set_position(Point::new(20.0, 20.0));
        f.controller.install_global_handlers();
        f.controller.show_menu(spec_at((10.0, 10.0)));
        tick(&f); // open

        let body = f.document.body().unwrap();
        let mut wander = DomEvent::mouse(
            "mousemove",
            true,
            MouseEventData {
                client_x: 640.0,
                client_y: 640.0,
                ..Default::default()
            },
        );
        EventDispatcher::dispatch(&mut wander, &body);

        tick(&f);
        assert!(!f.controller.is_open());
    }

    #[test]
    fn context_menu_press_cancels_marquee() {
        let f = fixture(&[]);
        f.controller.install_global_handlers();

        let owner = f.document.body().unwrap().id;
        f.interaction
            .borrow_mut()
            .begin(ActiveGesture::MarqueeSelect { owner });

        let body = f.document.body().unwrap();
        let mut ctx_press = DomEvent::mouse(
            "contextmenu",
            true,
            MouseEventData {
                button: 2,
                client_x: 100.0,
                client_y: 100.0,
                ..Default::default()
            },
        );
        EventDispatcher::dispatch(&mut ctx_press, &body);

        assert!(f.interaction.borrow().is_idle());
    }

    #[test]
    fn non_primary_mousedown_cancels_marquee() {
        let f = fixture(&[]);
        f.controller.install_global_handlers();

        let owner = f.document.body().unwrap().id;
        f.interaction
            .borrow_mut()
            .begin(ActiveGesture::MarqueeSelect { owner });

        let body = f.document.body().unwrap();
        let mut press = DomEvent::mouse(
            "mousedown",
            true,
            MouseEventData {
                button: 2,
                client_x: 100.0,
                client_y: 100.0,
                ..Default::default()
            },
        );
        EventDispatcher::dispatch(&mut press, &body);

        assert!(f.interaction.borrow().is_idle());
    }

    #[test]
    fn builder_requires_dependencies_and_mount() {
        let err = OverlayController::builder().build().unwrap_err();
        assert!(matches!(err, OverlayError::MissingDependency("document")));

        let document = Rc::new(Document::parse_html("<html><body></body></html>").unwrap());
        let err = OverlayController::builder()
            .document(document.clone())
            .registry(DelegateRegistry::new(document.clone()))
            .scheduler(Rc::new(RefCell::new(FrameScheduler::new())))
            .geometry(Rc::new(RefCell::new(GeometryStore::new())))
            .mouse(Rc::new(RefCell::new(MouseState::new())))
            .interaction(Rc::new(RefCell::new(InteractionState::new())))
            .viewport(Viewport::new(800.0, 600.0))
            .mount_id("overlay-root")
            .build()
            .unwrap_err();
        assert!(matches!(err, OverlayError::MountNotFound(_)));
    }
}
