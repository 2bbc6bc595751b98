//! # Slate Input
//!
//! Input event types for mouse, keyboard, and focus handling.
//! These events are translated from host-shell input into a
//! platform-agnostic representation before being dispatched into the
//! element tree.

use std::collections::HashSet;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button (usually left).
    Primary,
    /// Secondary button (usually right).
    Secondary,
    /// Auxiliary button (usually middle/wheel).
    Auxiliary,
    /// Fourth button (back).
    Back,
    /// Fifth button (forward).
    Forward,
}

impl MouseButton {
    /// Get the button index (matches the DOM MouseEvent.button convention).
    pub fn button_index(&self) -> i16 {
        match self {
            MouseButton::Primary => 0,
            MouseButton::Auxiliary => 1,
            MouseButton::Secondary => 2,
            MouseButton::Back => 3,
            MouseButton::Forward => 4,
        }
    }

    /// Get the buttons mask (matches the DOM MouseEvent.buttons convention).
    pub fn button_mask(&self) -> u16 {
        match self {
            MouseButton::Primary => 1,
            MouseButton::Secondary => 2,
            MouseButton::Auxiliary => 4,
            MouseButton::Back => 8,
            MouseButton::Forward => 16,
        }
    }

    /// Whether this is the primary button.
    pub fn is_primary(&self) -> bool {
        matches!(self, MouseButton::Primary)
    }
}

/// Keyboard modifier keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.shift || self.meta
    }

    /// Check if no modifiers are pressed.
    pub fn none(&self) -> bool {
        !self.any()
    }
}

/// Point in 2D space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// Mouse event data.
#[derive(Debug, Clone)]
pub struct MouseEvent {
    /// Event type.
    pub event_type: MouseEventType,
    /// Position relative to the viewport.
    pub position: Point,
    /// Which button triggered the event (for button events).
    pub button: MouseButton,
    /// Currently pressed buttons (bitmask).
    pub buttons: u16,
    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
    /// Click count (1 for single click, 2 for double click, etc.).
    pub click_count: u32,
    /// Delta for wheel events.
    pub delta: Point,
    /// Timestamp in milliseconds.
    pub timestamp: u64,
}

/// Mouse event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventType {
    /// Mouse button pressed down.
    MouseDown,
    /// Mouse button released.
    MouseUp,
    /// Mouse moved.
    MouseMove,
    /// Mouse entered the viewport.
    MouseEnter,
    /// Mouse left the viewport.
    MouseLeave,
    /// Mouse wheel scrolled.
    Wheel,
    /// Context menu requested (right-click or menu key).
    ContextMenu,
}

impl MouseEventType {
    /// The DOM-style event name used for handler registration.
    pub fn name(&self) -> &'static str {
        match self {
            MouseEventType::MouseDown => "mousedown",
            MouseEventType::MouseUp => "mouseup",
            MouseEventType::MouseMove => "mousemove",
            MouseEventType::MouseEnter => "mouseenter",
            MouseEventType::MouseLeave => "mouseleave",
            MouseEventType::Wheel => "wheel",
            MouseEventType::ContextMenu => "contextmenu",
        }
    }
}

impl MouseEvent {
    /// Create a new mouse event.
    pub fn new(event_type: MouseEventType, position: Point) -> Self {
        Self {
            event_type,
            position,
            button: MouseButton::Primary,
            buttons: 0,
            modifiers: Modifiers::default(),
            click_count: 1,
            delta: Point::zero(),
            timestamp: 0,
        }
    }

    /// Set the button.
    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    /// Set the buttons bitmask.
    pub fn with_buttons(mut self, buttons: u16) -> Self {
        self.buttons = buttons;
        self
    }

    /// Set modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Set click count.
    pub fn with_click_count(mut self, count: u32) -> Self {
        self.click_count = count;
        self
    }

    /// Set wheel delta.
    pub fn with_delta(mut self, delta: Point) -> Self {
        self.delta = delta;
        self
    }

    /// Set timestamp.
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Logical key identifiers (editor-relevant subset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    // Shortcut letters
    KeyA,
    KeyC,
    KeyD,
    KeyV,
    KeyX,
    KeyZ,
    // Editing / navigation
    Escape,
    Enter,
    Tab,
    Space,
    Backspace,
    Delete,
    F2,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    // Modifiers
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    MetaLeft,
    MetaRight,
    /// Anything the editor does not handle by key code.
    Unknown,
}

impl KeyCode {
    /// The key value (KeyboardEvent.key), honoring shift for letters.
    pub fn key_string(&self, shift: bool) -> &'static str {
        match self {
            KeyCode::KeyA => {
                if shift {
                    "A"
                } else {
                    "a"
                }
            }
            KeyCode::KeyC => {
                if shift {
                    "C"
                } else {
                    "c"
                }
            }
            KeyCode::KeyD => {
                if shift {
                    "D"
                } else {
                    "d"
                }
            }
            KeyCode::KeyV => {
                if shift {
                    "V"
                } else {
                    "v"
                }
            }
            KeyCode::KeyX => {
                if shift {
                    "X"
                } else {
                    "x"
                }
            }
            KeyCode::KeyZ => {
                if shift {
                    "Z"
                } else {
                    "z"
                }
            }
            KeyCode::Escape => "Escape",
            KeyCode::Enter => "Enter",
            KeyCode::Tab => "Tab",
            KeyCode::Space => " ",
            KeyCode::Backspace => "Backspace",
            KeyCode::Delete => "Delete",
            KeyCode::F2 => "F2",
            KeyCode::ArrowUp => "ArrowUp",
            KeyCode::ArrowDown => "ArrowDown",
            KeyCode::ArrowLeft => "ArrowLeft",
            KeyCode::ArrowRight => "ArrowRight",
            KeyCode::Home => "Home",
            KeyCode::End => "End",
            KeyCode::ShiftLeft | KeyCode::ShiftRight => "Shift",
            KeyCode::ControlLeft | KeyCode::ControlRight => "Control",
            KeyCode::AltLeft | KeyCode::AltRight => "Alt",
            KeyCode::MetaLeft | KeyCode::MetaRight => "Meta",
            KeyCode::Unknown => "Unidentified",
        }
    }

    /// The physical code string (KeyboardEvent.code).
    pub fn code_string(&self) -> &'static str {
        match self {
            KeyCode::KeyA => "KeyA",
            KeyCode::KeyC => "KeyC",
            KeyCode::KeyD => "KeyD",
            KeyCode::KeyV => "KeyV",
            KeyCode::KeyX => "KeyX",
            KeyCode::KeyZ => "KeyZ",
            KeyCode::Escape => "Escape",
            KeyCode::Enter => "Enter",
            KeyCode::Tab => "Tab",
            KeyCode::Space => "Space",
            KeyCode::Backspace => "Backspace",
            KeyCode::Delete => "Delete",
            KeyCode::F2 => "F2",
            KeyCode::ArrowUp => "ArrowUp",
            KeyCode::ArrowDown => "ArrowDown",
            KeyCode::ArrowLeft => "ArrowLeft",
            KeyCode::ArrowRight => "ArrowRight",
            KeyCode::Home => "Home",
            KeyCode::End => "End",
            KeyCode::ShiftLeft => "ShiftLeft",
            KeyCode::ShiftRight => "ShiftRight",
            KeyCode::ControlLeft => "ControlLeft",
            KeyCode::ControlRight => "ControlRight",
            KeyCode::AltLeft => "AltLeft",
            KeyCode::AltRight => "AltRight",
            KeyCode::MetaLeft => "MetaLeft",
            KeyCode::MetaRight => "MetaRight",
            KeyCode::Unknown => "",
        }
    }
}

/// Key event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventType {
    /// Key pressed down.
    KeyDown,
    /// Key released.
    KeyUp,
    /// Character input (after key processing).
    Input,
}

/// Keyboard event data.
#[derive(Debug, Clone)]
pub struct KeyEvent {
    /// Event type.
    pub event_type: KeyEventType,
    /// Logical key code.
    pub key_code: KeyCode,
    /// The key value (for Input events, this is the character).
    pub key: String,
    /// Physical key code string.
    pub code: String,
    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
    /// Whether this is a repeat event.
    pub repeat: bool,
    /// Timestamp in milliseconds.
    pub timestamp: u64,
}

impl KeyEvent {
    /// Create a new key event.
    pub fn new(event_type: KeyEventType, key_code: KeyCode, modifiers: Modifiers) -> Self {
        Self {
            event_type,
            key: key_code.key_string(modifiers.shift).to_string(),
            code: key_code.code_string().to_string(),
            key_code,
            modifiers,
            repeat: false,
            timestamp: 0,
        }
    }

    /// Create an input event with a specific character.
    pub fn input(ch: char) -> Self {
        Self {
            event_type: KeyEventType::Input,
            key_code: KeyCode::Unknown,
            key: ch.to_string(),
            code: String::new(),
            modifiers: Modifiers::default(),
            repeat: false,
            timestamp: 0,
        }
    }

    /// Set repeat flag.
    pub fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    /// Set timestamp.
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Unified input event type.
#[derive(Debug, Clone)]
pub enum InputEvent {
    Mouse(MouseEvent),
    Key(KeyEvent),
}

/// Track currently pressed keys for repeat detection.
#[derive(Debug, Default)]
pub struct KeyboardState {
    pressed_keys: HashSet<KeyCode>,
    modifiers: Modifiers,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a key down event, returns true if this is a repeat.
    pub fn key_down(&mut self, key_code: KeyCode) -> bool {
        let is_repeat = self.pressed_keys.contains(&key_code);
        self.pressed_keys.insert(key_code);
        self.update_modifiers(key_code, true);
        is_repeat
    }

    /// Handle a key up event.
    pub fn key_up(&mut self, key_code: KeyCode) {
        self.pressed_keys.remove(&key_code);
        self.update_modifiers(key_code, false);
    }

    /// Get current modifiers.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Check if a key is currently pressed.
    pub fn is_pressed(&self, key_code: KeyCode) -> bool {
        self.pressed_keys.contains(&key_code)
    }

    fn update_modifiers(&mut self, key_code: KeyCode, pressed: bool) {
        match key_code {
            KeyCode::ShiftLeft | KeyCode::ShiftRight => self.modifiers.shift = pressed,
            KeyCode::ControlLeft | KeyCode::ControlRight => self.modifiers.ctrl = pressed,
            KeyCode::AltLeft | KeyCode::AltRight => self.modifiers.alt = pressed,
            KeyCode::MetaLeft | KeyCode::MetaRight => self.modifiers.meta = pressed,
            _ => {}
        }
    }
}

/// Track mouse button state and the last-known cursor position.
///
/// The overlay layer reads `position` during its per-frame containment
/// checks, so this must be updated on every mousemove before dispatch.
#[derive(Debug, Default)]
pub struct MouseState {
    pub position: Point,
    pub buttons: u16,
    /// Where the current press started (cleared on release).
    pub press_origin: Option<Point>,
}

impl MouseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update position.
    pub fn set_position(&mut self, pos: Point) {
        self.position = pos;
    }

    /// Handle button down.
    pub fn button_down(&mut self, button: MouseButton) {
        if self.buttons == 0 {
            self.press_origin = Some(self.position);
        }
        self.buttons |= button.button_mask();
    }

    /// Handle button up.
    pub fn button_up(&mut self, button: MouseButton) {
        self.buttons &= !button.button_mask();
        if self.buttons == 0 {
            self.press_origin = None;
        }
    }

    /// Check if a button is pressed.
    pub fn is_pressed(&self, button: MouseButton) -> bool {
        (self.buttons & button.button_mask()) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_button_indices() {
        assert_eq!(MouseButton::Primary.button_index(), 0);
        assert_eq!(MouseButton::Auxiliary.button_index(), 1);
        assert_eq!(MouseButton::Secondary.button_index(), 2);
    }

    #[test]
    fn test_modifiers() {
        let mods = Modifiers::new().with_ctrl().with_shift();
        assert!(mods.ctrl);
        assert!(mods.shift);
        assert!(!mods.alt);
        assert!(!mods.meta);
        assert!(mods.any());
    }

    #[test]
    fn test_key_string() {
        assert_eq!(KeyCode::KeyA.key_string(false), "a");
        assert_eq!(KeyCode::KeyA.key_string(true), "A");
        assert_eq!(KeyCode::Enter.key_string(false), "Enter");
    }

    #[test]
    fn test_event_names() {
        assert_eq!(MouseEventType::ContextMenu.name(), "contextmenu");
        assert_eq!(MouseEventType::MouseDown.name(), "mousedown");
    }

    #[test]
    fn test_keyboard_state() {
        let mut state = KeyboardState::new();

        // First press is not repeat
        assert!(!state.key_down(KeyCode::KeyA));
        assert!(state.is_pressed(KeyCode::KeyA));

        // Second press is repeat
        assert!(state.key_down(KeyCode::KeyA));

        // Release
        state.key_up(KeyCode::KeyA);
        assert!(!state.is_pressed(KeyCode::KeyA));
    }

    #[test]
    fn test_mouse_state_press_origin() {
        let mut state = MouseState::new();
        state.set_position(Point::new(40.0, 60.0));

        state.button_down(MouseButton::Primary);
        assert!(state.is_pressed(MouseButton::Primary));
        assert_eq!(state.press_origin, Some(Point::new(40.0, 60.0)));

        state.button_up(MouseButton::Primary);
        assert!(!state.is_pressed(MouseButton::Primary));
        assert!(state.press_origin.is_none());
    }
}
