//! # DOM Events
//!
//! Event types and dispatch for the retained element tree, following the DOM
//! Events model: capture and bubble phases, stopPropagation, preventDefault.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Node, NodeId};

/// Event phases as per the DOM spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventPhase {
    /// No event is being processed.
    None = 0,
    /// Event is propagating through target's ancestors (capture).
    Capturing = 1,
    /// Event has arrived at the event target.
    AtTarget = 2,
    /// Event is propagating back up through ancestors (bubble).
    Bubbling = 3,
}

/// Common event interface for all tree events.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event type (e.g., "click", "contextmenu").
    pub event_type: String,
    /// Whether the event bubbles.
    pub bubbles: bool,
    /// Whether the event is cancelable.
    pub cancelable: bool,
    /// Whether the event was synthesized by the host shell (as opposed to
    /// editor code re-dispatching).
    pub is_trusted: bool,
    /// Current phase.
    phase: Cell<EventPhase>,
    /// The target node (where the event originated).
    target: RefCell<Option<NodeId>>,
    /// The node currently handling the event.
    current_target: RefCell<Option<NodeId>>,
    /// Whether stopPropagation was called.
    propagation_stopped: Cell<bool>,
    /// Whether stopImmediatePropagation was called.
    immediate_propagation_stopped: Cell<bool>,
    /// Whether preventDefault was called.
    default_prevented: Cell<bool>,
}

impl Event {
    /// Create a new event.
    pub fn new(event_type: &str, bubbles: bool, cancelable: bool) -> Self {
        Self {
            event_type: event_type.to_string(),
            bubbles,
            cancelable,
            is_trusted: false,
            phase: Cell::new(EventPhase::None),
            target: RefCell::new(None),
            current_target: RefCell::new(None),
            propagation_stopped: Cell::new(false),
            immediate_propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    /// Create a trusted event (from the host shell).
    pub fn new_trusted(event_type: &str, bubbles: bool, cancelable: bool) -> Self {
        let mut event = Self::new(event_type, bubbles, cancelable);
        event.is_trusted = true;
        event
    }

    /// Get the current phase.
    pub fn phase(&self) -> EventPhase {
        self.phase.get()
    }

    /// Get the target node ID.
    pub fn target(&self) -> Option<NodeId> {
        *self.target.borrow()
    }

    /// Get the current target node ID.
    pub fn current_target(&self) -> Option<NodeId> {
        *self.current_target.borrow()
    }

    /// Stop propagation of the event.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    /// Stop immediate propagation of the event.
    pub fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_propagation_stopped.set(true);
    }

    /// Prevent the default action.
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    /// Check if propagation is stopped.
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// Check if immediate propagation is stopped.
    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped.get()
    }

    /// Check if the default action was prevented.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub(crate) fn set_phase(&self, phase: EventPhase) {
        self.phase.set(phase);
    }

    pub(crate) fn set_target(&self, target: NodeId) {
        *self.target.borrow_mut() = Some(target);
    }

    pub(crate) fn set_current_target(&self, target: Option<NodeId>) {
        *self.current_target.borrow_mut() = target;
    }
}

/// Mouse event data.
#[derive(Debug, Clone, Default)]
pub struct MouseEventData {
    /// X coordinate relative to the viewport.
    pub client_x: f64,
    /// Y coordinate relative to the viewport.
    pub client_y: f64,
    /// Which mouse button triggered the event.
    pub button: i16,
    /// Currently pressed buttons bitmask.
    pub buttons: u16,
    /// Whether Ctrl key was pressed.
    pub ctrl_key: bool,
    /// Whether Alt key was pressed.
    pub alt_key: bool,
    /// Whether Shift key was pressed.
    pub shift_key: bool,
    /// Whether Meta key was pressed.
    pub meta_key: bool,
    /// Click count.
    pub detail: u32,
}

/// Wheel event data.
#[derive(Debug, Clone, Default)]
pub struct WheelEventData {
    pub delta_x: f64,
    pub delta_y: f64,
    pub client_x: f64,
    pub client_y: f64,
}

/// Keyboard event data.
#[derive(Debug, Clone, Default)]
pub struct KeyboardEventData {
    /// The key value.
    pub key: String,
    /// The key code.
    pub code: String,
    /// Whether this is a repeat event.
    pub repeat: bool,
    /// Whether Ctrl key was pressed.
    pub ctrl_key: bool,
    /// Whether Alt key was pressed.
    pub alt_key: bool,
    /// Whether Shift key was pressed.
    pub shift_key: bool,
    /// Whether Meta key was pressed.
    pub meta_key: bool,
}

/// Focus event data.
#[derive(Debug, Clone, Default)]
pub struct FocusEventData {
    /// The related target (element losing/gaining focus).
    pub related_target: Option<NodeId>,
}

/// Input event data (text entry in rename fields, search boxes).
#[derive(Debug, Clone)]
pub struct InputEventData {
    /// The characters entered, if any.
    pub data: Option<String>,
    /// The input type.
    pub input_type: String,
}

impl Default for InputEventData {
    fn default() -> Self {
        Self {
            data: None,
            input_type: "insertText".to_string(),
        }
    }
}

/// Tree event with type-specific data.
#[derive(Debug, Clone)]
pub enum DomEvent {
    /// Generic event.
    Generic(Event),
    /// Mouse event.
    Mouse(Event, MouseEventData),
    /// Wheel event.
    Wheel(Event, WheelEventData),
    /// Keyboard event.
    Keyboard(Event, KeyboardEventData),
    /// Focus event.
    Focus(Event, FocusEventData),
    /// Input event.
    Input(Event, InputEventData),
}

impl DomEvent {
    /// Get the base event.
    pub fn event(&self) -> &Event {
        match self {
            DomEvent::Generic(e) => e,
            DomEvent::Mouse(e, _) => e,
            DomEvent::Wheel(e, _) => e,
            DomEvent::Keyboard(e, _) => e,
            DomEvent::Focus(e, _) => e,
            DomEvent::Input(e, _) => e,
        }
    }

    /// Get mutable access to the base event.
    pub fn event_mut(&mut self) -> &mut Event {
        match self {
            DomEvent::Generic(e) => e,
            DomEvent::Mouse(e, _) => e,
            DomEvent::Wheel(e, _) => e,
            DomEvent::Keyboard(e, _) => e,
            DomEvent::Focus(e, _) => e,
            DomEvent::Input(e, _) => e,
        }
    }

    /// Get the mouse data, if this is a mouse event.
    pub fn mouse_data(&self) -> Option<&MouseEventData> {
        match self {
            DomEvent::Mouse(_, data) => Some(data),
            _ => None,
        }
    }

    /// The pointer position carried by the event, if any.
    pub fn client_position(&self) -> Option<(f64, f64)> {
        match self {
            DomEvent::Mouse(_, data) => Some((data.client_x, data.client_y)),
            DomEvent::Wheel(_, data) => Some((data.client_x, data.client_y)),
            _ => None,
        }
    }

    /// Create a mouse event.
    pub fn mouse(event_type: &str, bubbles: bool, data: MouseEventData) -> Self {
        let event = Event::new_trusted(event_type, bubbles, true);
        DomEvent::Mouse(event, data)
    }

    /// Create a wheel event.
    pub fn wheel(data: WheelEventData) -> Self {
        let event = Event::new_trusted("wheel", true, true);
        DomEvent::Wheel(event, data)
    }

    /// Create a keyboard event.
    pub fn keyboard(event_type: &str, data: KeyboardEventData) -> Self {
        let event = Event::new_trusted(event_type, true, true);
        DomEvent::Keyboard(event, data)
    }

    /// Create a focus event.
    pub fn focus(event_type: &str, data: FocusEventData) -> Self {
        // focus/blur don't bubble, focusin/focusout do
        let bubbles = event_type == "focusin" || event_type == "focusout";
        let event = Event::new_trusted(event_type, bubbles, false);
        DomEvent::Focus(event, data)
    }

    /// Create an input event.
    pub fn input(data: InputEventData) -> Self {
        let event = Event::new_trusted("input", true, false);
        DomEvent::Input(event, data)
    }
}

/// Options for adding an event listener.
#[derive(Debug, Clone, Default)]
pub struct AddEventListenerOptions {
    /// If true, the listener is invoked during capture phase.
    pub capture: bool,
    /// If true, the listener is automatically removed after first invocation.
    pub once: bool,
}

/// An event listener callback.
pub type EventListenerCallback = Rc<dyn Fn(&DomEvent)>;

/// Handle identifying a registered listener, for precise removal.
///
/// The delegation registry keeps one of these per native binding it owns, so
/// unregistering a container removes exactly its listeners and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A registered event listener.
struct EventListener {
    id: ListenerId,
    callback: EventListenerCallback,
    options: AddEventListenerOptions,
}

/// Event target mixin - manages event listeners for a node.
#[derive(Default)]
pub struct EventTarget {
    /// Listeners keyed by event type.
    listeners: RefCell<HashMap<String, Vec<EventListener>>>,
}

impl EventTarget {
    /// Create a new event target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event listener. Returns a handle for later removal.
    pub fn add_event_listener(
        &self,
        event_type: &str,
        callback: EventListenerCallback,
        options: AddEventListenerOptions,
    ) -> ListenerId {
        let id = ListenerId::next();
        let mut listeners = self.listeners.borrow_mut();
        let list = listeners.entry(event_type.to_string()).or_default();
        list.push(EventListener {
            id,
            callback,
            options,
        });
        id
    }

    /// Remove a specific listener by handle. Returns whether it was found.
    pub fn remove_event_listener(&self, event_type: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(list) = listeners.get_mut(event_type) {
            let before = list.len();
            list.retain(|l| l.id != id);
            let removed = list.len() < before;
            if list.is_empty() {
                listeners.remove(event_type);
            }
            return removed;
        }
        false
    }

    /// Remove all listeners for an event type.
    pub fn remove_all_listeners(&self, event_type: &str) {
        let mut listeners = self.listeners.borrow_mut();
        listeners.remove(event_type);
    }

    /// Check if there are any listeners for an event type.
    pub fn has_listeners(&self, event_type: &str) -> bool {
        let listeners = self.listeners.borrow();
        listeners
            .get(event_type)
            .map(|l| !l.is_empty())
            .unwrap_or(false)
    }

    /// Count listeners registered for an event type.
    pub fn listener_count(&self, event_type: &str) -> usize {
        let listeners = self.listeners.borrow();
        listeners.get(event_type).map(|l| l.len()).unwrap_or(0)
    }

    /// Invoke listeners for an event.
    /// Returns ids of listeners to remove (for `once` listeners).
    pub fn invoke_listeners(&self, event: &DomEvent, phase: EventPhase) -> Vec<ListenerId> {
        // Snapshot the callbacks so a listener may add/remove listeners on
        // this target without tripping the RefCell.
        let snapshot: Vec<(ListenerId, EventListenerCallback, AddEventListenerOptions)> = {
            let listeners = self.listeners.borrow();
            match listeners.get(&event.event().event_type) {
                Some(list) => list
                    .iter()
                    .map(|l| (l.id, l.callback.clone(), l.options.clone()))
                    .collect(),
                None => return Vec::new(),
            }
        };

        let mut to_remove = Vec::new();
        for (id, callback, options) in snapshot {
            // Check if listener should fire in this phase
            let should_fire = match phase {
                EventPhase::Capturing => options.capture,
                EventPhase::AtTarget => true,
                EventPhase::Bubbling => !options.capture,
                EventPhase::None => false,
            };

            if should_fire {
                callback(event);

                if options.once {
                    to_remove.push(id);
                }

                if event.event().immediate_propagation_stopped() {
                    break;
                }
            }
        }

        to_remove
    }

    /// Remove the listeners identified by `ids`.
    pub fn remove_listeners(&self, event_type: &str, ids: Vec<ListenerId>) {
        if ids.is_empty() {
            return;
        }

        let mut listeners = self.listeners.borrow_mut();
        if let Some(list) = listeners.get_mut(event_type) {
            list.retain(|l| !ids.contains(&l.id));
            if list.is_empty() {
                listeners.remove(event_type);
            }
        }
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("listener_count", &self.listeners.borrow().len())
            .finish()
    }
}

/// Event dispatcher for propagating events through the element tree.
pub struct EventDispatcher;

impl EventDispatcher {
    /// Dispatch an event to a target node, building the propagation path
    /// from the node's current ancestor chain.
    /// Returns true if the event was not prevented.
    pub fn dispatch(event: &mut DomEvent, target: &Rc<Node>) -> bool {
        // Ancestors ordered root-first.
        let mut ancestors = target.ancestors();
        ancestors.reverse();
        Self::dispatch_with_path(event, target, &ancestors)
    }

    /// Dispatch with an explicit ancestor path (root to parent).
    pub fn dispatch_with_path(
        event: &mut DomEvent,
        target: &Rc<Node>,
        ancestors: &[Rc<Node>],
    ) -> bool {
        let event_type = event.event().event_type.clone();
        let bubbles = event.event().bubbles;

        event.event().set_target(target.id);

        // Capture phase (root to parent of target)
        event.event().set_phase(EventPhase::Capturing);
        for node in ancestors {
            if event.event().propagation_stopped() {
                break;
            }
            event.event().set_current_target(Some(node.id));
            let to_remove = node
                .event_target
                .invoke_listeners(event, EventPhase::Capturing);
            node.event_target.remove_listeners(&event_type, to_remove);
        }

        // At target phase
        if !event.event().propagation_stopped() {
            event.event().set_phase(EventPhase::AtTarget);
            event.event().set_current_target(Some(target.id));
            let to_remove = target
                .event_target
                .invoke_listeners(event, EventPhase::AtTarget);
            target.event_target.remove_listeners(&event_type, to_remove);
        }

        // Bubble phase (parent of target up to root)
        if bubbles && !event.event().propagation_stopped() {
            event.event().set_phase(EventPhase::Bubbling);
            for node in ancestors.iter().rev() {
                if event.event().propagation_stopped() {
                    break;
                }
                event.event().set_current_target(Some(node.id));
                let to_remove = node
                    .event_target
                    .invoke_listeners(event, EventPhase::Bubbling);
                node.event_target.remove_listeners(&event_type, to_remove);
            }
        }

        // Reset state
        event.event().set_phase(EventPhase::None);
        event.event().set_current_target(None);

        !event.event().default_prevented()
    }
}
