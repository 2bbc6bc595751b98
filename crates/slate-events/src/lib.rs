//! # Slate Events
//!
//! Delegated event handling for the editor chrome: panels declare
//! "when event E occurs on an element matching selector S inside container C,
//! call F" and the registry attaches a single native listener per
//! (container, event type) pair, resolving the logical target by walking the
//! ancestor chain of the event target.
//!
//! ## Guarantees
//!
//! - Exactly one native listener per (container, event type), no matter how
//!   many selector handlers target that pair
//! - At most one handler fires per native event per container: the first
//!   matching element wins, and on one element the first-registered selector
//!   wins
//! - A handler returning an error is logged and contained; it never
//!   propagates, and other containers on the same bubbled event still run
//! - Unregistration removes every native listener the registration owns and
//!   is idempotent
//!
//! The registry does not watch for node removal: a container detached from
//! the document must still be unregistered explicitly by its owner.

pub mod gesture;
pub mod hover;

pub use gesture::{ActiveGesture, InteractionState};
pub use hover::HoverTracker;

use slate_dom::{AddEventListenerOptions, DomEvent, Document, ListenerId, Node, NodeId};
use slate_style::Selector;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Event types bound in the capture phase so drag/resize plumbing observes
/// them before bubbling consumers.
const CAPTURE_EVENT_TYPES: &[&str] = &["mousemove", "mouseup", "resize"];

/// Error returned by a delegated handler.
///
/// The JS editor this chrome descends from caught handler exceptions at the
/// dispatch site; handlers here return a `Result` and the registry logs the
/// failure without propagating it.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl From<String> for HandlerError {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HandlerError {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Result type for delegated handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// A delegated handler callback: receives the event and the matched element.
pub type HandlerCallback = Rc<dyn Fn(&DomEvent, &Rc<Node>) -> HandlerResult>;

/// One declarative handler entry: event type, optional selector, callback.
/// A `None` selector is the catch-all for its event type.
struct HandlerEntry {
    selector: Option<Selector>,
    callback: HandlerCallback,
}

/// Declarative handler map for a container registration.
///
/// Entries keep registration order per event type; that order is the
/// tiebreak when several selectors match the same element.
#[derive(Default)]
pub struct HandlerMap {
    entries: Vec<(String, HandlerEntry)>,
}

impl HandlerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a selector handler. A selector that fails to parse is skipped
    /// with a warning; the editor keeps running with that one wire missing.
    pub fn on(
        mut self,
        event_type: &str,
        selector: &str,
        callback: impl Fn(&DomEvent, &Rc<Node>) -> HandlerResult + 'static,
    ) -> Self {
        match Selector::parse(selector) {
            Ok(sel) => {
                self.entries.push((
                    event_type.to_string(),
                    HandlerEntry {
                        selector: Some(sel),
                        callback: Rc::new(callback),
                    },
                ));
            }
            Err(e) => {
                warn!(event_type, selector, error = %e, "skipping handler with bad selector");
            }
        }
        self
    }

    /// Add a catch-all handler for an event type, invoked when no selector
    /// handler matched.
    pub fn on_any(
        mut self,
        event_type: &str,
        callback: impl Fn(&DomEvent, &Rc<Node>) -> HandlerResult + 'static,
    ) -> Self {
        self.entries.push((
            event_type.to_string(),
            HandlerEntry {
                selector: None,
                callback: Rc::new(callback),
            },
        ));
        self
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Group entries by event type, preserving per-type registration order.
    fn into_typed(self) -> HashMap<String, Vec<HandlerEntry>> {
        let mut typed: HashMap<String, Vec<HandlerEntry>> = HashMap::new();
        for (event_type, entry) in self.entries {
            typed.entry(event_type).or_default().push(entry);
        }
        typed
    }
}

/// Handlers for a single-element registration (buttons, inputs, resizers).
/// No selector matching: the element itself is the target.
#[derive(Default)]
pub struct ElementHandlers {
    entries: Vec<(String, HandlerCallback)>,
}

impl ElementHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        mut self,
        event_type: &str,
        callback: impl Fn(&DomEvent, &Rc<Node>) -> HandlerResult + 'static,
    ) -> Self {
        self.entries
            .push((event_type.to_string(), Rc::new(callback)));
        self
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A live registration: handler table plus the native listener bindings it
/// owns on the container node.
struct Registration {
    /// Human-readable identifier for logs.
    label: String,
    /// Handlers per event type, in registration order.
    handlers: HashMap<String, Vec<HandlerEntry>>,
    /// The one native binding per event type.
    bindings: Vec<(String, ListenerId)>,
}

/// Process-wide delegated handler registry for one document.
///
/// Cheap to clone; clones share the same registration table.
#[derive(Clone)]
pub struct DelegateRegistry {
    document: Rc<Document>,
    registrations: Rc<RefCell<HashMap<NodeId, Registration>>>,
}

impl DelegateRegistry {
    /// Create a registry for a document.
    pub fn new(document: Rc<Document>) -> Self {
        Self {
            document,
            registrations: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Register delegated handlers on a container element.
    ///
    /// Re-registering a container replaces its handler set wholesale.
    /// A detached or non-element container is a logged no-op.
    pub fn register_container(
        &self,
        container: &Rc<Node>,
        handlers: HandlerMap,
        container_id: Option<&str>,
    ) {
        if handlers.is_empty() {
            warn!("register_container called with no handlers");
            return;
        }
        if !container.is_element() || !self.document.contains(container) {
            warn!(
                container = %describe(container),
                "cannot register handlers on a detached or non-element container"
            );
            return;
        }

        // Replace wholesale on re-registration.
        self.unregister_container(container);

        let label = container_id
            .map(|s| s.to_string())
            .unwrap_or_else(|| describe(container));
        let typed = handlers.into_typed();

        let mut bindings = Vec::new();
        for event_type in typed.keys() {
            let listener_id = self.attach_native(container, event_type);
            bindings.push((event_type.clone(), listener_id));
        }

        debug!(container = %label, event_types = bindings.len(), "container registered");
        self.registrations.borrow_mut().insert(
            container.id,
            Registration {
                label,
                handlers: typed,
                bindings,
            },
        );
    }

    /// Register handlers on a single element that is its own target.
    pub fn register_element(
        &self,
        element: &Rc<Node>,
        handlers: ElementHandlers,
        element_id: Option<&str>,
    ) {
        if handlers.is_empty() {
            warn!("register_element called with no handlers");
            return;
        }
        // Element registrations are catch-all registrations under the hood.
        let mut map = HandlerMap::new();
        for (event_type, callback) in handlers.entries {
            map.entries.push((
                event_type,
                HandlerEntry {
                    selector: None,
                    callback,
                },
            ));
        }
        self.register_container(element, map, element_id);
    }

    /// Remove a registration and every native listener it owns.
    /// Idempotent: unknown containers are a no-op.
    pub fn unregister_container(&self, container: &Rc<Node>) {
        let Some(registration) = self.registrations.borrow_mut().remove(&container.id) else {
            return;
        };
        for (event_type, listener_id) in registration.bindings {
            container
                .event_target
                .remove_event_listener(&event_type, listener_id);
        }
        debug!(container = %registration.label, "container unregistered");
    }

    /// Remove a single-element registration. Same teardown as
    /// [`Self::unregister_container`]; elements register as containers.
    pub fn unregister_element(&self, element: &Rc<Node>) {
        self.unregister_container(element);
    }

    /// Whether a container currently has a registration.
    pub fn is_registered(&self, container: &Rc<Node>) -> bool {
        self.registrations.borrow().contains_key(&container.id)
    }

    /// Number of native listeners the container owns for an event type.
    /// Always 0 or 1; exposed for invariant checks.
    pub fn native_listener_count(&self, container: &Rc<Node>, event_type: &str) -> usize {
        container.event_target.listener_count(event_type)
    }

    fn attach_native(&self, container: &Rc<Node>, event_type: &str) -> ListenerId {
        let registry = self.clone();
        let container_id = container.id;
        let event_type_owned = event_type.to_string();

        let callback: Rc<dyn Fn(&DomEvent)> = Rc::new(move |event| {
            registry.dispatch_for(container_id, &event_type_owned, event);
        });

        container.event_target.add_event_listener(
            event_type,
            callback,
            AddEventListenerOptions {
                capture: CAPTURE_EVENT_TYPES.contains(&event_type),
                once: false,
            },
        )
    }

    /// Resolve and invoke the one handler for a native event arriving at a
    /// registered container.
    fn dispatch_for(&self, container_id: NodeId, event_type: &str, event: &DomEvent) {
        // Resolve the matched element and callback with the registration
        // table borrowed, then drop the borrow before invoking: handlers may
        // re-register or unregister containers.
        let resolved = self.resolve_handler(container_id, event_type, event);

        let Some((label, callback, matched)) = resolved else {
            return;
        };

        trace!(container = %label, event_type, matched = %describe(&matched), "dispatching");
        if let Err(e) = callback(event, &matched) {
            warn!(
                container = %label,
                event_type,
                error = %e,
                "delegated handler failed"
            );
        }
    }

    fn resolve_handler(
        &self,
        container_id: NodeId,
        event_type: &str,
        event: &DomEvent,
    ) -> Option<(String, HandlerCallback, Rc<Node>)> {
        let registrations = self.registrations.borrow();
        let registration = registrations.get(&container_id)?;
        let handlers = registration.handlers.get(event_type)?;

        let target = event
            .event()
            .target()
            .and_then(|id| self.document.get_node(id))?;

        // Walk up from the event target to the container (inclusive); the
        // first element with a matching selector wins. Selectors are tested
        // in registration order on each element.
        let mut current = Some(target);
        while let Some(node) = current {
            if node.is_element() {
                for entry in handlers {
                    let Some(ref selector) = entry.selector else {
                        continue;
                    };
                    if node.matches(selector) {
                        return Some((
                            registration.label.clone(),
                            entry.callback.clone(),
                            node,
                        ));
                    }
                }
            }
            if node.id == container_id {
                break;
            }
            current = node.parent();
        }

        // No selector matched: fall back to the catch-all, with the
        // container itself as the matched element.
        let catch_all = handlers.iter().find(|e| e.selector.is_none())?;
        let container = self.document.get_node(container_id)?;
        Some((
            registration.label.clone(),
            catch_all.callback.clone(),
            container,
        ))
    }
}

fn describe(node: &Rc<Node>) -> String {
    match node.element_id() {
        Some(id) => format!("#{id}"),
        None => node.tag_name().unwrap_or("?").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_dom::{EventDispatcher, MouseEventData};
    use std::cell::RefCell;

    fn fixture() -> (Rc<Document>, DelegateRegistry) {
        let doc = Rc::new(Document::new());
        let registry = DelegateRegistry::new(doc.clone());
        (doc, registry)
    }

    fn click(target: &Rc<Node>) {
        let mut event = DomEvent::mouse("click", true, MouseEventData::default());
        EventDispatcher::dispatch(&mut event, target);
    }

    #[test]
    fn one_native_listener_per_event_type() {
        let (doc, registry) = fixture();
        let container = doc.create_element("div", &[("id", "outliner")]);
        doc.root().append_child(container.clone());

        let handlers = HandlerMap::new()
            .on("click", ".row", |_, _| Ok(()))
            .on("click", "[data-object-id]", |_, _| Ok(()))
            .on_any("click", |_, _| Ok(()))
            .on("contextmenu", ".row", |_, _| Ok(()));
        registry.register_container(&container, handlers, None);

        assert_eq!(registry.native_listener_count(&container, "click"), 1);
        assert_eq!(registry.native_listener_count(&container, "contextmenu"), 1);
        assert_eq!(registry.native_listener_count(&container, "mousedown"), 0);
    }

    #[test]
    fn first_matching_selector_wins() {
        let (doc, registry) = fixture();
        let container = doc.create_element("div", &[("id", "assets")]);
        let row = doc.create_element("li", &[("class", "tab"), ("data-asset-id", "a1")]);
        doc.root().append_child(container.clone());
        container.append_child(row.clone());

        let fired = Rc::new(RefCell::new(Vec::new()));

        let fired_a = fired.clone();
        let fired_b = fired.clone();
        let handlers = HandlerMap::new()
            .on("click", ".tab", move |_, _| {
                fired_a.borrow_mut().push("tab");
                Ok(())
            })
            .on("click", "[data-asset-id]", move |_, _| {
                fired_b.borrow_mut().push("asset");
                Ok(())
            });
        registry.register_container(&container, handlers, None);

        click(&row);

        // Both selectors match the same element; the first registered wins,
        // and only one handler fires.
        assert_eq!(*fired.borrow(), vec!["tab"]);
    }

    #[test]
    fn only_matching_selector_fires() {
        let (doc, registry) = fixture();
        let container = doc.create_element("div", &[]);
        let tab = doc.create_element("li", &[("class", "tab")]);
        let asset = doc.create_element("li", &[("data-asset-id", "a2")]);
        doc.root().append_child(container.clone());
        container.append_child(tab);
        container.append_child(asset.clone());

        let fired = Rc::new(RefCell::new(Vec::new()));

        let fired_a = fired.clone();
        let fired_b = fired.clone();
        let handlers = HandlerMap::new()
            .on("click", ".tab", move |_, _| {
                fired_a.borrow_mut().push("tab");
                Ok(())
            })
            .on("click", "[data-asset-id]", move |_, _| {
                fired_b.borrow_mut().push("asset");
                Ok(())
            });
        registry.register_container(&container, handlers, None);

        click(&asset);

        assert_eq!(*fired.borrow(), vec!["asset"]);
    }

    #[test]
    fn ancestor_walk_finds_logical_target() {
        let (doc, registry) = fixture();
        let container = doc.create_element("div", &[]);
        let row = doc.create_element("li", &[("class", "row")]);
        let label = doc.create_element("span", &[]);
        doc.root().append_child(container.clone());
        container.append_child(row.clone());
        row.append_child(label.clone());

        let matched_id = Rc::new(RefCell::new(None));
        let matched_cb = matched_id.clone();
        let handlers = HandlerMap::new().on("click", ".row", move |_, el| {
            *matched_cb.borrow_mut() = Some(el.id);
            Ok(())
        });
        registry.register_container(&container, handlers, None);

        // Click lands on the inner label; the handler receives the row.
        click(&label);
        assert_eq!(*matched_id.borrow(), Some(row.id));
    }

    #[test]
    fn catch_all_fires_when_no_selector_matches() {
        let (doc, registry) = fixture();
        let container = doc.create_element("div", &[]);
        let stray = doc.create_element("p", &[]);
        doc.root().append_child(container.clone());
        container.append_child(stray.clone());

        let fired = Rc::new(RefCell::new(Vec::new()));

        let fired_sel = fired.clone();
        let fired_any = fired.clone();
        let handlers = HandlerMap::new()
            .on("click", ".row", move |_, _| {
                fired_sel.borrow_mut().push("row");
                Ok(())
            })
            .on_any("click", move |_, _| {
                fired_any.borrow_mut().push("any");
                Ok(())
            });
        registry.register_container(&container, handlers, None);

        click(&stray);
        assert_eq!(*fired.borrow(), vec!["any"]);
    }

    #[test]
    fn unregister_silences_dispatch_and_is_idempotent() {
        let (doc, registry) = fixture();
        let container = doc.create_element("div", &[]);
        let row = doc.create_element("li", &[("class", "row")]);
        doc.root().append_child(container.clone());
        container.append_child(row.clone());

        let count = Rc::new(RefCell::new(0));
        let count_cb = count.clone();
        let handlers = HandlerMap::new().on("click", ".row", move |_, _| {
            *count_cb.borrow_mut() += 1;
            Ok(())
        });
        registry.register_container(&container, handlers, None);

        click(&row);
        assert_eq!(*count.borrow(), 1);

        registry.unregister_container(&container);
        assert_eq!(registry.native_listener_count(&container, "click"), 0);

        click(&row);
        assert_eq!(*count.borrow(), 1);

        // Second unregister is a no-op.
        registry.unregister_container(&container);
    }

    #[test]
    fn failing_handler_does_not_block_outer_container() {
        let (doc, registry) = fixture();
        let outer = doc.create_element("div", &[("id", "outer")]);
        let inner = doc.create_element("div", &[("id", "inner")]);
        let row = doc.create_element("li", &[("class", "row")]);
        doc.root().append_child(outer.clone());
        outer.append_child(inner.clone());
        inner.append_child(row.clone());

        let outer_fired = Rc::new(RefCell::new(false));

        let handlers_inner =
            HandlerMap::new().on("click", ".row", |_, _| Err("panel wiring broken".into()));
        registry.register_container(&inner, handlers_inner, Some("inner"));

        let outer_flag = outer_fired.clone();
        let handlers_outer = HandlerMap::new().on("click", ".row", move |_, _| {
            *outer_flag.borrow_mut() = true;
            Ok(())
        });
        registry.register_container(&outer, handlers_outer, Some("outer"));

        click(&row);

        // The inner handler failed; the outer container still dispatched.
        assert!(*outer_fired.borrow());
    }

    #[test]
    fn reregistration_replaces_wholesale() {
        let (doc, registry) = fixture();
        let container = doc.create_element("div", &[]);
        let row = doc.create_element("li", &[("class", "row")]);
        doc.root().append_child(container.clone());
        container.append_child(row.clone());

        let fired = Rc::new(RefCell::new(Vec::new()));

        let first = fired.clone();
        registry.register_container(
            &container,
            HandlerMap::new().on("click", ".row", move |_, _| {
                first.borrow_mut().push("first");
                Ok(())
            }),
            None,
        );

        let second = fired.clone();
        registry.register_container(
            &container,
            HandlerMap::new().on("click", ".row", move |_, _| {
                second.borrow_mut().push("second");
                Ok(())
            }),
            None,
        );

        assert_eq!(registry.native_listener_count(&container, "click"), 1);
        click(&row);
        assert_eq!(*fired.borrow(), vec!["second"]);
    }

    #[test]
    fn detached_container_is_a_no_op() {
        let (doc, registry) = fixture();
        let container = doc.create_element("div", &[]);
        // Never attached to the document.

        registry.register_container(
            &container,
            HandlerMap::new().on("click", ".row", |_, _| Ok(())),
            None,
        );
        assert!(!registry.is_registered(&container));
    }

    #[test]
    fn element_registration_targets_itself() {
        let (doc, registry) = fixture();
        let button = doc.create_element("button", &[("id", "save")]);
        doc.root().append_child(button.clone());

        let fired = Rc::new(RefCell::new(false));
        let fired_cb = fired.clone();
        registry.register_element(
            &button,
            ElementHandlers::new().on("click", move |_, el| {
                assert_eq!(el.element_id().as_deref(), Some("save"));
                *fired_cb.borrow_mut() = true;
                Ok(())
            }),
            None,
        );

        click(&button);
        assert!(*fired.borrow());
    }
}
