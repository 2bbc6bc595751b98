//! Declarative menu model.
//!
//! Panels do not subclass a menu controller; they implement [`MenuSource`],
//! a small strategy trait the lifecycle controller consumes: extract context
//! data from the clicked element, build an ordered item list, and the
//! controller does the rest (filtering, positioning, animation, teardown).

use slate_dom::{Node, NodeId};
use std::collections::HashMap;
use std::rc::Rc;

/// Caller-defined data extracted from the element a menu was opened on.
///
/// String-keyed so panels can stash ids ("asset-id", "layer-id") without the
/// overlay layer knowing their types.
#[derive(Debug, Clone, Default)]
pub struct MenuContext {
    /// The element the menu was opened on, when still attached.
    pub target: Option<NodeId>,
    values: HashMap<String, String>,
}

impl MenuContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_target(target: NodeId) -> Self {
        Self {
            target: Some(target),
            values: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Callback invoked when an action item is selected.
pub type MenuActionCallback = Rc<dyn Fn(&MenuContext)>;

/// Predicate evaluated against the menu context.
pub type MenuPredicate = Rc<dyn Fn(&MenuContext) -> bool>;

/// An action entry in a menu.
#[derive(Clone)]
pub struct MenuAction {
    /// Stable identifier, also used as the `data-menu-item` attribute.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Optional icon name.
    pub icon: Option<String>,
    /// Invoked when the item is selected.
    pub on_select: MenuActionCallback,
    /// Hides the item entirely when false.
    pub visible_when: Option<MenuPredicate>,
    /// Renders the item disabled (and unselectable) when false.
    pub enabled_when: Option<MenuPredicate>,
}

impl MenuAction {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        on_select: impl Fn(&MenuContext) + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            on_select: Rc::new(on_select),
            visible_when: None,
            enabled_when: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn visible_when(mut self, predicate: impl Fn(&MenuContext) -> bool + 'static) -> Self {
        self.visible_when = Some(Rc::new(predicate));
        self
    }

    pub fn enabled_when(mut self, predicate: impl Fn(&MenuContext) -> bool + 'static) -> Self {
        self.enabled_when = Some(Rc::new(predicate));
        self
    }

    pub fn is_visible(&self, ctx: &MenuContext) -> bool {
        self.visible_when.as_ref().map(|p| p(ctx)).unwrap_or(true)
    }

    pub fn is_enabled(&self, ctx: &MenuContext) -> bool {
        self.enabled_when.as_ref().map(|p| p(ctx)).unwrap_or(true)
    }
}

impl std::fmt::Debug for MenuAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuAction")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}

/// One entry in an ordered menu.
#[derive(Debug, Clone)]
pub enum MenuItem {
    Action(MenuAction),
    Separator,
}

impl MenuItem {
    pub fn action(
        id: impl Into<String>,
        label: impl Into<String>,
        on_select: impl Fn(&MenuContext) + 'static,
    ) -> Self {
        MenuItem::Action(MenuAction::new(id, label, on_select))
    }

    pub fn separator() -> Self {
        MenuItem::Separator
    }
}

/// Strategy trait a panel implements to supply context menus.
pub trait MenuSource {
    /// Pull context data off the element the menu was requested on.
    fn extract_context(&self, element: &Rc<Node>) -> MenuContext;

    /// Build the ordered item list for this context.
    fn menu_items(&self, ctx: &MenuContext) -> Vec<MenuItem>;
}

/// Drop hidden actions, then collapse the separators that filtering left
/// dangling (leading, trailing, doubled).
pub fn filter_visible(items: Vec<MenuItem>, ctx: &MenuContext) -> Vec<MenuItem> {
    let visible: Vec<MenuItem> = items
        .into_iter()
        .filter(|item| match item {
            MenuItem::Action(a) => a.is_visible(ctx),
            MenuItem::Separator => true,
        })
        .collect();

    let mut out: Vec<MenuItem> = Vec::with_capacity(visible.len());
    for item in visible {
        if matches!(item, MenuItem::Separator) {
            let last_is_sep = matches!(out.last(), Some(MenuItem::Separator) | None);
            if last_is_sep {
                continue;
            }
        }
        out.push(item);
    }
    while matches!(out.last(), Some(MenuItem::Separator)) {
        out.pop();
    }
    out
}
