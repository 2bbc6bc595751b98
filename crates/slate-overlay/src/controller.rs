//! Popup lifecycle control.
//!
//! One controller owns the single visible popup: it inserts the menu
//! element, positions it, animates it in over two phases (insert hidden,
//! add the visible class on the next frame), watches the cursor during the
//! opening transition, and guarantees eventual teardown.
//!
//! Ordering guarantee: at most one popup is in any lifecycle phase at a
//! time. A new show request synchronously tears down the current popup
//! (without a close animation) before its own animated show begins.

use crate::menu::{filter_visible, MenuContext, MenuItem, MenuSource};
use crate::position::{
    effective_size, position_popup, HorizontalSide, PlacementRequest, VerticalSide,
    DEFAULT_MARGIN, DROPDOWN_FALLBACK_SIZE, MENU_FALLBACK_SIZE,
};
use slate_animation::{FrameScheduler, TimingFunction, Transition};
use slate_dom::{Document, Node};
use slate_events::{DelegateRegistry, HandlerMap, InteractionState};
use slate_input::{MouseState, Point};
use slate_layout::{GeometryStore, Rect, Size, Viewport};
use slate_style::Theme;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Errors from overlay construction. Runtime show/hide failures are not
/// errors: popups are a non-critical affordance and show requests degrade to
/// logged no-ops instead of throwing into caller code.
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Overlay builder missing dependency: {0}")]
    MissingDependency(&'static str),

    #[error("Overlay mount point not found: {0}")]
    MountNotFound(String),
}

/// The flavor of popup, which picks the zero-measurement fallback size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKind {
    ContextMenu,
    Dropdown,
}

impl PopupKind {
    fn fallback_size(&self) -> Size {
        match self {
            PopupKind::ContextMenu => MENU_FALLBACK_SIZE,
            PopupKind::Dropdown => DROPDOWN_FALLBACK_SIZE,
        }
    }

    fn css_class(&self) -> &'static str {
        match self {
            PopupKind::ContextMenu => "context-menu",
            PopupKind::Dropdown => "dropdown-menu",
        }
    }
}

/// A show request. Created transiently per request and discarded on hide.
pub struct PopupSpec {
    /// Trigger point (the cursor position of the opening event).
    pub trigger: Point,
    /// Ordered items; hidden items are filtered against `context` at show.
    pub items: Vec<MenuItem>,
    /// Context data the item predicates and callbacks see.
    pub context: MenuContext,
    /// Bounds of the owning panel (soft positioning preference).
    pub owner_panel_bounds: Option<Rect>,
    /// Popup flavor.
    pub kind: PopupKind,
}

/// Lifecycle phase of the active popup.
enum PopupPhase {
    /// Visible class pending/applied, open transition running, cursor
    /// watched per frame until the deadline.
    Opening {
        transition: Transition,
        deadline: Instant,
    },
    /// Fully open.
    Open,
    /// Close transition running; node removed when it completes.
    Closing { transition: Transition },
}

struct ActivePopup {
    node: Rc<Node>,
    rect: Rect,
    context: MenuContext,
    items: Vec<MenuItem>,
    phase: PopupPhase,
}

struct OverlayInner {
    document: Rc<Document>,
    registry: DelegateRegistry,
    scheduler: Rc<RefCell<FrameScheduler>>,
    geometry: Rc<RefCell<GeometryStore>>,
    mouse: Rc<RefCell<MouseState>>,
    interaction: Rc<RefCell<InteractionState>>,
    theme: Theme,
    viewport: Viewport,
    mount: Rc<Node>,
    active: Option<ActivePopup>,
    /// Bumped on every show/teardown; stale frame callbacks check it and
    /// drop out instead of touching a popup they no longer own.
    epoch: u64,
}

impl OverlayInner {
    fn open_duration(&self) -> Duration {
        self.theme
            .duration("menu-open-ms", Duration::from_millis(150))
    }

    fn close_duration(&self) -> Duration {
        self.theme
            .duration("menu-close-ms", Duration::from_millis(150))
    }

    fn watch_cutoff(&self) -> Duration {
        self.theme
            .duration("menu-open-watch-ms", Duration::from_millis(200))
    }

    fn easing(&self) -> TimingFunction {
        self.theme
            .get("menu-easing")
            .and_then(|v| TimingFunction::parse(v).ok())
            .unwrap_or(TimingFunction::EaseOut)
    }

    fn margin(&self) -> f64 {
        self.theme.length_px("menu-margin", DEFAULT_MARGIN)
    }

    /// Instant, non-animated removal of the active popup.
    fn teardown_active(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.registry.unregister_container(&active.node);
        self.geometry.borrow_mut().remove(active.node.id);
        self.document.remove_node(&active.node);
        self.epoch += 1;
        debug!("popup torn down");
    }
}

/// Two-phase factory for the overlay controller.
///
/// `build` only succeeds once every dependency is supplied and the mount
/// node actually exists in the document; there is no half-constructed
/// controller waiting for its container to appear.
#[derive(Default)]
pub struct OverlayBuilder {
    document: Option<Rc<Document>>,
    registry: Option<DelegateRegistry>,
    scheduler: Option<Rc<RefCell<FrameScheduler>>>,
    geometry: Option<Rc<RefCell<GeometryStore>>>,
    mouse: Option<Rc<RefCell<MouseState>>>,
    interaction: Option<Rc<RefCell<InteractionState>>>,
    theme: Theme,
    viewport: Option<Viewport>,
    mount_id: Option<String>,
}

impl OverlayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(mut self, document: Rc<Document>) -> Self {
        self.document = Some(document);
        self
    }

    pub fn registry(mut self, registry: DelegateRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn scheduler(mut self, scheduler: Rc<RefCell<FrameScheduler>>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn geometry(mut self, geometry: Rc<RefCell<GeometryStore>>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn mouse(mut self, mouse: Rc<RefCell<MouseState>>) -> Self {
        self.mouse = Some(mouse);
        self
    }

    pub fn interaction(mut self, interaction: Rc<RefCell<InteractionState>>) -> Self {
        self.interaction = Some(interaction);
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// Element id to mount popups under. Defaults to `<body>`.
    pub fn mount_id(mut self, id: impl Into<String>) -> Self {
        self.mount_id = Some(id.into());
        self
    }

    pub fn build(self) -> Result<OverlayController, OverlayError> {
        let document = self
            .document
            .ok_or(OverlayError::MissingDependency("document"))?;
        let registry = self
            .registry
            .ok_or(OverlayError::MissingDependency("registry"))?;
        let scheduler = self
            .scheduler
            .ok_or(OverlayError::MissingDependency("scheduler"))?;
        let geometry = self
            .geometry
            .ok_or(OverlayError::MissingDependency("geometry"))?;
        let mouse = self.mouse.ok_or(OverlayError::MissingDependency("mouse"))?;
        let interaction = self
            .interaction
            .ok_or(OverlayError::MissingDependency("interaction"))?;
        let viewport = self
            .viewport
            .ok_or(OverlayError::MissingDependency("viewport"))?;

        let mount = match &self.mount_id {
            Some(id) => document
                .get_element_by_id(id)
                .ok_or_else(|| OverlayError::MountNotFound(format!("#{id}")))?,
            None => document
                .body()
                .ok_or_else(|| OverlayError::MountNotFound("<body>".into()))?,
        };
        if !document.contains(&mount) {
            return Err(OverlayError::MountNotFound(
                self.mount_id.unwrap_or_else(|| "<body>".into()),
            ));
        }

        Ok(OverlayController {
            inner: Rc::new(RefCell::new(OverlayInner {
                document,
                registry,
                scheduler,
                geometry,
                mouse,
                interaction,
                theme: self.theme,
                viewport,
                mount,
                active: None,
                epoch: 0,
            })),
        })
    }
}

/// Popup positioner and lifecycle controller.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct OverlayController {
    inner: Rc<RefCell<OverlayInner>>,
}

impl std::fmt::Debug for OverlayController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayController").finish_non_exhaustive()
    }
}

impl OverlayController {
    pub fn builder() -> OverlayBuilder {
        OverlayBuilder::new()
    }

    /// Show a context menu built by a panel's [`MenuSource`] for the given
    /// element.
    pub fn show_for_source(
        &self,
        source: &dyn MenuSource,
        element: &Rc<Node>,
        trigger: Point,
        owner_panel_bounds: Option<Rect>,
    ) {
        let context = source.extract_context(element);
        let items = source.menu_items(&context);
        self.show_menu(PopupSpec {
            trigger,
            items,
            context,
            owner_panel_bounds,
            kind: PopupKind::ContextMenu,
        });
    }

    /// Show a popup. Any currently visible popup is force-closed first,
    /// without a close animation.
    pub fn show_menu(&self, spec: PopupSpec) {
        let PopupSpec {
            trigger,
            items,
            context,
            owner_panel_bounds,
            kind,
        } = spec;

        let mut inner = self.inner.borrow_mut();

        inner.teardown_active();

        if !inner.document.contains(&inner.mount) {
            // Mount raced away underneath us; popups are non-critical.
            debug!("popup mount detached; dropping show request");
            return;
        }

        let items = filter_visible(items, &context);
        if items.is_empty() {
            debug!("no visible menu items; dropping show request");
            return;
        }

        // Build and insert the menu element, hidden.
        let menu = Self::build_menu_element(&inner, &items, &context, kind);
        inner.mount.append_child(menu.clone());

        // Measure: the element is attached (so a real layout pass could size
        // it) but hidden. Zero measurements get the kind's fallback.
        let measured = inner.geometry.borrow().measure(menu.id);
        let size = effective_size(measured, kind.fallback_size());

        let result = position_popup(&PlacementRequest {
            trigger,
            size,
            viewport: inner.viewport,
            panel_bounds: owner_panel_bounds,
            margin: inner.margin(),
        });

        menu.set_attribute(
            "style",
            &format!("left: {:.0}px; top: {:.0}px;", result.x, result.y),
        );
        if result.horizontal == HorizontalSide::Left {
            menu.add_class("opens-left");
        }
        if result.vertical == VerticalSide::Above {
            menu.add_class("opens-above");
        }

        let rect = result.rect(size);
        inner.geometry.borrow_mut().set_rect(menu.id, rect);

        self.register_item_handlers(&inner, &menu);

        let transition = Transition::new(menu.id, inner.open_duration(), inner.easing());
        let deadline = Instant::now() + inner.watch_cutoff();
        inner.active = Some(ActivePopup {
            node: menu.clone(),
            rect,
            context,
            items,
            phase: PopupPhase::Opening {
                transition,
                deadline,
            },
        });

        debug!(
            x = result.x,
            y = result.y,
            width = size.width,
            height = size.height,
            "popup shown"
        );

        // Two-phase show: the visible class lands on the next frame so the
        // CSS transition actually animates, then the cursor watch begins.
        let epoch = inner.epoch;
        let inner_rc = self.inner.clone();
        inner.scheduler.borrow_mut().request(Box::new(move |_| {
            {
                let inner = inner_rc.borrow();
                if inner.epoch != epoch {
                    return;
                }
                let Some(active) = &inner.active else {
                    return;
                };
                // A hide can land before the first frame; stay hidden then.
                if !matches!(active.phase, PopupPhase::Opening { .. }) {
                    return;
                }
                active.node.add_class("visible");
            }
            Self::monitor_frame(inner_rc, epoch);
        }));
    }

    /// Hide the active popup. `immediate` skips the close transition and
    /// removes the element synchronously.
    pub fn hide_menu(&self, immediate: bool) {
        let mut inner = self.inner.borrow_mut();
        if immediate {
            inner.teardown_active();
            return;
        }

        let close_duration = inner.close_duration();
        let easing = inner.easing();
        let epoch = inner.epoch;
        let Some(active) = &mut inner.active else {
            return;
        };
        if matches!(active.phase, PopupPhase::Closing { .. }) {
            return;
        }

        active.node.remove_class("visible");
        active.phase = PopupPhase::Closing {
            transition: Transition::new(active.node.id, close_duration, easing),
        };
        trace!("popup closing");

        let inner_rc = self.inner.clone();
        inner
            .scheduler
            .borrow_mut()
            .request(Box::new(move |_| Self::closing_frame(inner_rc, epoch)));
    }

    /// Whether a popup is currently live in any phase.
    pub fn is_open(&self) -> bool {
        self.inner.borrow().active.is_some()
    }

    /// The active popup's on-screen rect.
    pub fn active_rect(&self) -> Option<Rect> {
        self.inner.borrow().active.as_ref().map(|a| a.rect)
    }

    /// The active popup's element.
    pub fn active_node(&self) -> Option<Rc<Node>> {
        self.inner.borrow().active.as_ref().map(|a| a.node.clone())
    }

    /// Count popup elements currently attached under the mount. The single
    /// visible popup invariant keeps this at 0 or 1.
    pub fn popup_element_count(&self) -> usize {
        let inner = self.inner.borrow();
        inner
            .mount
            .children()
            .iter()
            .filter(|c| {
                c.has_class(PopupKind::ContextMenu.css_class())
                    || c.has_class(PopupKind::Dropdown.css_class())
            })
            .count()
    }

    /// Update viewport metrics (host window resized).
    pub fn set_viewport(&self, viewport: Viewport) {
        self.inner.borrow_mut().viewport = viewport;
    }

    /// Install the document-level input wiring:
    ///
    /// - capture-phase mousedown: non-primary buttons cancel the active
    ///   gesture; any press outside the popup dismisses it
    /// - capture-phase contextmenu: cancels the active gesture before any
    ///   panel handler can open a menu
    /// - keydown Escape: dismisses the popup
    /// - mousemove: once fully open, the pointer leaving the popup closes it
    pub fn install_global_handlers(&self) {
        let inner = self.inner.borrow();
        let root = inner.document.root().clone();

        let controller = self.clone();
        root.event_target.add_event_listener(
            "mousedown",
            Rc::new(move |event| {
                let non_primary = event.mouse_data().map(|d| d.button != 0).unwrap_or(false);
                if non_primary {
                    controller
                        .inner
                        .borrow()
                        .interaction
                        .borrow_mut()
                        .cancel_active_gesture();
                }
                if let Some((x, y)) = event.client_position() {
                    let outside = controller
                        .active_rect()
                        .map(|r| !r.contains(x, y))
                        .unwrap_or(false);
                    if outside {
                        controller.hide_menu(false);
                    }
                }
            }),
            slate_dom::AddEventListenerOptions {
                capture: true,
                once: false,
            },
        );

        let controller = self.clone();
        root.event_target.add_event_listener(
            "contextmenu",
            Rc::new(move |_| {
                let cancelled = controller
                    .inner
                    .borrow()
                    .interaction
                    .borrow_mut()
                    .cancel_active_gesture();
                if cancelled.has_overlay() {
                    debug!("marquee cancelled by context-menu press");
                }
            }),
            slate_dom::AddEventListenerOptions {
                capture: true,
                once: false,
            },
        );

        let controller = self.clone();
        root.event_target.add_event_listener(
            "keydown",
            Rc::new(move |event| {
                if let slate_dom::DomEvent::Keyboard(_, data) = event {
                    if data.key == "Escape" {
                        controller.hide_menu(false);
                    }
                }
            }),
            slate_dom::AddEventListenerOptions::default(),
        );

        let controller = self.clone();
        root.event_target.add_event_listener(
            "mousemove",
            Rc::new(move |event| {
                let Some((x, y)) = event.client_position() else {
                    return;
                };
                controller.pointer_left_open_popup(x, y);
            }),
            slate_dom::AddEventListenerOptions::default(),
        );
    }

    fn pointer_left_open_popup(&self, x: f64, y: f64) {
        let should_hide = {
            let inner = self.inner.borrow();
            match &inner.active {
                Some(active) if matches!(active.phase, PopupPhase::Open) => {
                    !active.rect.inflate(2.0).contains(x, y)
                }
                _ => false,
            }
        };
        if should_hide {
            trace!("pointer left open popup");
            self.hide_menu(false);
        }
    }

    fn build_menu_element(
        inner: &OverlayInner,
        items: &[MenuItem],
        context: &MenuContext,
        kind: PopupKind,
    ) -> Rc<Node> {
        let menu = inner
            .document
            .create_element("div", &[("class", kind.css_class())]);
        let list = inner.document.create_element("ul", &[("class", "menu-items")]);

        for item in items {
            match item {
                MenuItem::Action(action) => {
                    let mut class = String::from("menu-item");
                    if !action.is_enabled(context) {
                        class.push_str(" disabled");
                    }
                    let li = inner.document.create_element(
                        "li",
                        &[("class", &class), ("data-menu-item", &action.id)],
                    );
                    if let Some(icon) = &action.icon {
                        let icon_el = inner
                            .document
                            .create_element("span", &[("class", "menu-icon"), ("data-icon", icon)]);
                        li.append_child(icon_el);
                    }
                    li.append_child(inner.document.create_text(&action.label));
                    list.append_child(li);
                }
                MenuItem::Separator => {
                    let li = inner
                        .document
                        .create_element("li", &[("class", "menu-separator")]);
                    list.append_child(li);
                }
            }
        }

        menu.append_child(list);
        menu
    }

    fn register_item_handlers(&self, inner: &OverlayInner, menu: &Rc<Node>) {
        let controller = self.clone();
        let handlers = HandlerMap::new().on("click", "[data-menu-item]", move |_, el| {
            controller.on_item_selected(el);
            Ok(())
        });
        inner
            .registry
            .register_container(menu, handlers, Some("popup-menu"));
    }

    fn on_item_selected(&self, element: &Rc<Node>) {
        let Some(item_id) = element.dataset("menu-item") else {
            return;
        };
        if element.has_class("disabled") {
            trace!(item = %item_id, "ignoring disabled menu item");
            return;
        }

        // Resolve the callback with the borrow held, invoke without it: the
        // action may itself show or hide popups.
        let resolved = {
            let inner = self.inner.borrow();
            inner.active.as_ref().and_then(|active| {
                active.items.iter().find_map(|item| match item {
                    MenuItem::Action(a) if a.id == item_id => {
                        Some((a.on_select.clone(), active.context.clone()))
                    }
                    _ => None,
                })
            })
        };

        let Some((on_select, context)) = resolved else {
            warn!(item = %item_id, "selected menu item has no registered action");
            return;
        };

        debug!(item = %item_id, "menu item selected");
        on_select(&context);
        self.hide_menu(false);
    }

    /// One step of the opening cursor watch. Re-requests itself each frame
    /// until the transition completes, the wall-clock cutoff passes, or the
    /// cursor escapes the popup (which force-closes it).
    fn monitor_frame(inner_rc: Rc<RefCell<OverlayInner>>, epoch: u64) {
        let keep_watching = {
            let mut inner = inner_rc.borrow_mut();
            if inner.epoch != epoch {
                return;
            }

            let cursor = inner.mouse.borrow().position;
            let now = Instant::now();

            let Some(active) = &mut inner.active else {
                return;
            };
            let PopupPhase::Opening {
                transition,
                deadline,
            } = &mut active.phase
            else {
                return;
            };

            let containment = active.rect.inflate(2.0);
            if !containment.contains(cursor.x, cursor.y) {
                debug!("cursor left popup during open animation; force-closing");
                inner.teardown_active();
                return;
            }

            let still_running = transition.tick(now);
            if !still_running {
                // Transition finished; the containment check above was the
                // final one.
                active.phase = PopupPhase::Open;
                trace!("popup open");
                false
            } else if now >= *deadline {
                // No transition-end in sight (no CSS transition defined, or
                // a stalled frame); stop watching so the loop terminates.
                active.phase = PopupPhase::Open;
                trace!("popup open (watch cutoff)");
                false
            } else {
                true
            }
        };

        if keep_watching {
            let scheduler = inner_rc.borrow().scheduler.clone();
            let inner_next = inner_rc.clone();
            scheduler
                .borrow_mut()
                .request(Box::new(move |_| Self::monitor_frame(inner_next, epoch)));
        }
    }

    /// One step of the close-transition wait; detaches the popup when the
    /// transition has run its course.
    fn closing_frame(inner_rc: Rc<RefCell<OverlayInner>>, epoch: u64) {
        let keep_waiting = {
            let mut inner = inner_rc.borrow_mut();
            if inner.epoch != epoch {
                return;
            }
            let now = Instant::now();
            let Some(active) = &mut inner.active else {
                return;
            };
            let PopupPhase::Closing { transition } = &mut active.phase else {
                return;
            };

            if transition.tick(now) {
                true
            } else {
                inner.teardown_active();
                false
            }
        };

        if keep_waiting {
            let scheduler = inner_rc.borrow().scheduler.clone();
            let inner_next = inner_rc.clone();
            scheduler
                .borrow_mut()
                .request(Box::new(move |_| Self::closing_frame(inner_next, epoch)));
        }
    }
}
