//! Panel construction and handler wiring.
//!
//! Each panel finds its mount in the chrome template, renders its list from
//! [`EditorShell`] state, and registers delegated handlers for its rows.
//! Handlers mutate the shell and re-render the affected fragments; menus go
//! through the overlay controller.

use crate::menus::{AssetMenu, LayerMenu, OutlinerMenu};
use crate::{EditorShell, PanelKind, Tool};
use slate_dom::{Document, Node};
use slate_events::{
    ActiveGesture, DelegateRegistry, HandlerError, HandlerMap, InteractionState,
};
use slate_input::Point;
use slate_layout::GeometryStore;
use slate_overlay::{MenuAction, MenuContext, MenuItem, OverlayController, PopupKind, PopupSpec};
use slate_style::Selector;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tessera_core::types::{AssetId, LayerId, ObjectId, PanelId};
use tessera_core::{TesseraError, TesseraResult};
use tracing::debug;

/// Everything a panel needs to wire itself up. Created once at startup and
/// cloned into handlers (all fields are shared handles).
#[derive(Clone)]
pub struct PanelContext {
    pub document: Rc<Document>,
    pub registry: DelegateRegistry,
    pub overlay: OverlayController,
    pub interaction: Rc<RefCell<InteractionState>>,
    pub geometry: Rc<RefCell<GeometryStore>>,
    pub shell: Rc<RefCell<EditorShell>>,
    /// Mounted panel containers, for cross-panel refreshes.
    pub containers: Rc<RefCell<HashMap<PanelKind, Rc<Node>>>>,
}

impl PanelContext {
    /// The mounted container for a panel, if that panel is up.
    pub fn container(&self, kind: PanelKind) -> Option<Rc<Node>> {
        self.containers.borrow().get(&kind).cloned()
    }
}

/// A mounted panel.
pub struct Panel {
    pub id: PanelId,
    pub kind: PanelKind,
    pub container: Rc<Node>,
}

/// Mount every panel onto the chrome template.
pub fn mount_panels(ctx: &PanelContext) -> TesseraResult<Vec<Panel>> {
    let kinds = [
        PanelKind::Toolbar,
        PanelKind::AssetBrowser,
        PanelKind::Outliner,
        PanelKind::Layers,
    ];

    let mut panels = Vec::new();
    for kind in kinds {
        let container = ctx
            .document
            .get_element_by_id(kind.element_id())
            .ok_or_else(|| {
                TesseraError::template(format!(
                    "chrome template is missing #{}",
                    kind.element_id()
                ))
            })?;
        ctx.containers.borrow_mut().insert(kind, container.clone());

        match kind {
            PanelKind::Toolbar => wire_toolbar(ctx, &container)?,
            PanelKind::AssetBrowser => wire_asset_browser(ctx, &container)?,
            PanelKind::Outliner => wire_outliner(ctx, &container)?,
            PanelKind::Layers => wire_layers(ctx, &container)?,
        }

        log::info!("Mounted panel #{}", kind.element_id());
        panels.push(Panel {
            id: PanelId::new(),
            kind,
            container,
        });
    }

    Ok(panels)
}

fn sel(source: &str) -> TesseraResult<Selector> {
    Selector::parse(source).map_err(|e| TesseraError::template(format!("bad selector: {e}")))
}

fn handler_err(e: TesseraError) -> HandlerError {
    HandlerError(e.to_string())
}

/// Empty a list element and refill it via `fill`.
fn refill_list(
    ctx: &PanelContext,
    panel: PanelKind,
    list_selector: &Selector,
    fill: impl FnOnce(&Document, &Rc<Node>),
) -> TesseraResult<()> {
    let container = ctx
        .container(panel)
        .ok_or_else(|| TesseraError::panel(format!("#{} not mounted", panel.element_id())))?;
    let list = ctx
        .document
        .select_in(&container, list_selector)
        .into_iter()
        .next()
        .ok_or_else(|| {
            TesseraError::panel(format!("#{} has no list element", panel.element_id()))
        })?;

    for child in list.children() {
        ctx.document.remove_node(&child);
    }
    fill(&ctx.document, &list);
    Ok(())
}

// ==================== Asset browser ====================

/// Re-render the asset list from shell state.
pub fn render_asset_list(ctx: &PanelContext) -> TesseraResult<()> {
    let list_sel = sel(".asset-list")?;
    let shell = ctx.shell.borrow();
    let active = shell.active_asset();

    refill_list(ctx, PanelKind::AssetBrowser, &list_sel, |doc, list| {
        for asset in shell.visible_assets() {
            let mut class = String::from("asset");
            if active == Some(asset.id) {
                class.push_str(" active");
            }
            let li = doc.create_element(
                "li",
                &[
                    ("class", &class),
                    ("data-asset-id", &asset.id.0.to_string()),
                    ("data-kind", asset.kind.name()),
                ],
            );
            li.append_child(doc.create_text(&asset.name));
            list.append_child(li);
        }
    })
}

fn wire_asset_browser(ctx: &PanelContext, container: &Rc<Node>) -> TesseraResult<()> {
    render_asset_list(ctx)?;

    let click_ctx = ctx.clone();
    let menu_ctx = ctx.clone();
    let menu_container = container.clone();
    let search_ctx = ctx.clone();

    let handlers = HandlerMap::new()
        .on("click", "li[data-asset-id]", move |_, el| {
            let id = asset_id_of(el)?;
            {
                let mut shell = click_ctx.shell.borrow_mut();
                shell.set_active_asset(Some(id));
            }
            render_asset_list(&click_ctx).map_err(handler_err)
        })
        .on("contextmenu", "li[data-asset-id]", move |event, el| {
            let Some((x, y)) = event.client_position() else {
                return Ok(());
            };
            let bounds = menu_ctx.geometry.borrow().rect_of(menu_container.id);
            let menu = AssetMenu::new(menu_ctx.clone());
            menu_ctx
                .overlay
                .show_for_source(&menu, el, Point::new(x, y), bounds);
            Ok(())
        })
        .on("input", ".asset-search", move |event, _| {
            // The host supplies the field's full text on each input event.
            if let slate_dom::DomEvent::Input(_, data) = event {
                let query = data.data.clone().unwrap_or_default();
                search_ctx.shell.borrow_mut().set_asset_filter(query);
                return render_asset_list(&search_ctx).map_err(handler_err);
            }
            Ok(())
        });

    ctx.registry
        .register_container(container, handlers, Some("asset-browser"));
    Ok(())
}

fn asset_id_of(el: &Rc<Node>) -> Result<AssetId, HandlerError> {
    let raw = el
        .dataset("asset-id")
        .ok_or_else(|| HandlerError("row has no data-asset-id".into()))?;
    let id = raw
        .parse::<u64>()
        .map_err(|_| HandlerError(format!("bad asset id '{raw}'")))?;
    Ok(AssetId(id))
}

// ==================== Outliner ====================

/// Re-render the outliner rows from shell state.
pub fn render_outliner(ctx: &PanelContext) -> TesseraResult<()> {
    let list_sel = sel(".object-list")?;
    let shell = ctx.shell.borrow();

    refill_list(ctx, PanelKind::Outliner, &list_sel, |doc, list| {
        for object in shell.list_objects() {
            let mut class = String::from("row");
            if shell.is_selected(object.id) {
                class.push_str(" selected");
            }
            let li = doc.create_element(
                "li",
                &[
                    ("class", &class),
                    ("data-object-id", &object.id.0.to_string()),
                ],
            );
            li.append_child(doc.create_text(&object.name));
            list.append_child(li);
        }
    })
}

fn wire_outliner(ctx: &PanelContext, container: &Rc<Node>) -> TesseraResult<()> {
    render_outliner(ctx)?;

    let click_ctx = ctx.clone();
    let menu_ctx = ctx.clone();
    let menu_container = container.clone();
    let marquee_ctx = ctx.clone();
    let marquee_owner = container.id;
    let release_ctx = ctx.clone();

    let handlers = HandlerMap::new()
        .on("click", "li[data-object-id]", move |event, el| {
            let id = object_id_of(el)?;
            let multi = event
                .mouse_data()
                .map(|d| d.ctrl_key || d.shift_key)
                .unwrap_or(false);
            {
                let mut shell = click_ctx.shell.borrow_mut();
                if multi {
                    shell.toggle_selected(id);
                } else {
                    shell.select_only(id);
                }
            }
            render_outliner(&click_ctx).map_err(handler_err)
        })
        .on("contextmenu", "li[data-object-id]", move |event, el| {
            let Some((x, y)) = event.client_position() else {
                return Ok(());
            };
            let bounds = menu_ctx.geometry.borrow().rect_of(menu_container.id);
            let menu = OutlinerMenu::new(menu_ctx.clone());
            menu_ctx
                .overlay
                .show_for_source(&menu, el, Point::new(x, y), bounds);
            Ok(())
        })
        // Rows swallow presses; the catch-all below only sees empty space.
        .on("mousedown", "li[data-object-id]", |_, _| Ok(()))
        .on_any("mousedown", move |event, _| {
            let primary = event.mouse_data().map(|d| d.button == 0).unwrap_or(false);
            if primary {
                marquee_ctx
                    .interaction
                    .borrow_mut()
                    .begin(ActiveGesture::MarqueeSelect {
                        owner: marquee_owner,
                    });
                debug!("marquee selection started in outliner");
            }
            Ok(())
        })
        .on_any("mouseup", move |_, _| {
            let mut interaction = release_ctx.interaction.borrow_mut();
            if matches!(
                interaction.current(),
                ActiveGesture::MarqueeSelect { owner } if owner == marquee_owner
            ) {
                interaction.finish();
                debug!("marquee selection finished");
            }
            Ok(())
        });

    ctx.registry
        .register_container(container, handlers, Some("outliner"));
    Ok(())
}

fn object_id_of(el: &Rc<Node>) -> Result<ObjectId, HandlerError> {
    let raw = el
        .dataset("object-id")
        .ok_or_else(|| HandlerError("row has no data-object-id".into()))?;
    let id = raw
        .parse::<u64>()
        .map_err(|_| HandlerError(format!("bad object id '{raw}'")))?;
    Ok(ObjectId(id))
}

// ==================== Layers ====================

/// Re-render the layer rows from shell state.
pub fn render_layer_list(ctx: &PanelContext) -> TesseraResult<()> {
    let list_sel = sel(".layer-list")?;
    let shell = ctx.shell.borrow();
    let active = shell.active_layer();

    refill_list(ctx, PanelKind::Layers, &list_sel, |doc, list| {
        for layer in shell.list_layers() {
            let mut class = String::from("row");
            if !layer.visible {
                class.push_str(" hidden-layer");
            }
            if active == Some(layer.id) {
                class.push_str(" active");
            }
            let li = doc.create_element(
                "li",
                &[("class", &class), ("data-layer-id", &layer.id.0.to_string())],
            );

            let eye = doc.create_element(
                "span",
                &[
                    ("class", "icon"),
                    ("data-action", "toggle-visibility"),
                    ("data-icon", if layer.visible { "eye" } else { "eye-off" }),
                ],
            );
            let lock = doc.create_element(
                "span",
                &[
                    ("class", "icon"),
                    ("data-action", "toggle-lock"),
                    ("data-icon", if layer.locked { "lock" } else { "unlock" }),
                ],
            );
            let name = doc.create_element("span", &[("class", "layer-name")]);
            name.append_child(doc.create_text(&layer.name));

            li.append_child(eye);
            li.append_child(lock);
            li.append_child(name);
            list.append_child(li);
        }
    })
}

fn wire_layers(ctx: &PanelContext, container: &Rc<Node>) -> TesseraResult<()> {
    render_layer_list(ctx)?;

    let row_sel = sel("li[data-layer-id]")?;
    let boundary = container.id;

    let vis_ctx = ctx.clone();
    let vis_row_sel = row_sel.clone();
    let lock_ctx = ctx.clone();
    let lock_row_sel = row_sel.clone();
    let activate_ctx = ctx.clone();
    let menu_ctx = ctx.clone();
    let menu_container = container.clone();

    let handlers = HandlerMap::new()
        .on("click", "[data-action=toggle-visibility]", move |_, el| {
            let id = layer_id_of_row(el, &vis_row_sel, boundary)?;
            vis_ctx
                .shell
                .borrow_mut()
                .toggle_layer_visibility(id)
                .map_err(handler_err)?;
            render_layer_list(&vis_ctx).map_err(handler_err)
        })
        .on("click", "[data-action=toggle-lock]", move |_, el| {
            let id = layer_id_of_row(el, &lock_row_sel, boundary)?;
            lock_ctx
                .shell
                .borrow_mut()
                .toggle_layer_lock(id)
                .map_err(handler_err)?;
            render_layer_list(&lock_ctx).map_err(handler_err)
        })
        .on("click", "li[data-layer-id]", move |_, el| {
            let id = layer_id_of(el)?;
            activate_ctx
                .shell
                .borrow_mut()
                .set_active_layer(id)
                .map_err(handler_err)?;
            render_layer_list(&activate_ctx).map_err(handler_err)
        })
        .on("contextmenu", "li[data-layer-id]", move |event, el| {
            let Some((x, y)) = event.client_position() else {
                return Ok(());
            };
            let bounds = menu_ctx.geometry.borrow().rect_of(menu_container.id);
            let menu = LayerMenu::new(menu_ctx.clone());
            menu_ctx
                .overlay
                .show_for_source(&menu, el, Point::new(x, y), bounds);
            Ok(())
        });

    ctx.registry
        .register_container(container, handlers, Some("layers"));
    Ok(())
}

fn layer_id_of(el: &Rc<Node>) -> Result<LayerId, HandlerError> {
    let raw = el
        .dataset("layer-id")
        .ok_or_else(|| HandlerError("row has no data-layer-id".into()))?;
    let id = raw
        .parse::<u64>()
        .map_err(|_| HandlerError(format!("bad layer id '{raw}'")))?;
    Ok(LayerId(id))
}

/// Resolve the layer row an action icon belongs to.
fn layer_id_of_row(
    el: &Rc<Node>,
    row_sel: &Selector,
    boundary: slate_dom::NodeId,
) -> Result<LayerId, HandlerError> {
    let row = el
        .closest(row_sel, Some(boundary))
        .ok_or_else(|| HandlerError("action icon outside a layer row".into()))?;
    layer_id_of(&row)
}

// ==================== Toolbar ====================

fn wire_toolbar(ctx: &PanelContext, container: &Rc<Node>) -> TesseraResult<()> {
    let tool_ctx = ctx.clone();
    let tool_container = container.clone();
    let tool_sel = sel("[data-tool]")?;
    let dropdown_ctx = ctx.clone();
    let dropdown_container = container.clone();

    let handlers = HandlerMap::new()
        .on("click", "[data-tool]", move |_, el| {
            let name = el
                .dataset("tool")
                .ok_or_else(|| HandlerError("button has no data-tool".into()))?;
            let tool = Tool::from_name(&name)
                .ok_or_else(|| HandlerError(format!("unknown tool '{name}'")))?;

            tool_ctx.shell.borrow_mut().set_active_tool(tool);

            for button in tool_ctx.document.select_in(&tool_container, &tool_sel) {
                button.remove_class("active");
            }
            el.add_class("active");
            Ok(())
        })
        .on("click", "[data-dropdown=grid-size]", move |event, _| {
            let Some((x, y)) = event.client_position() else {
                return Ok(());
            };
            show_grid_size_dropdown(&dropdown_ctx, &dropdown_container, Point::new(x, y));
            Ok(())
        });

    ctx.registry
        .register_container(container, handlers, Some("toolbar"));
    Ok(())
}

/// Grid-size picker under the toolbar's grid button.
fn show_grid_size_dropdown(ctx: &PanelContext, container: &Rc<Node>, trigger: Point) {
    let items = [16u32, 32, 64]
        .into_iter()
        .map(|size| {
            let item_ctx = ctx.clone();
            MenuItem::Action(MenuAction::new(
                format!("grid-{size}"),
                format!("{size} px"),
                move |_| {
                    item_ctx.shell.borrow_mut().set_grid_cell_size(size);
                },
            ))
        })
        .collect();

    let bounds = ctx.geometry.borrow().rect_of(container.id);
    ctx.overlay.show_menu(PopupSpec {
        trigger,
        items,
        context: MenuContext::new(),
        owner_panel_bounds: bounds,
        kind: PopupKind::Dropdown,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chrome::{CHROME_STYLESHEET, CHROME_TEMPLATE};
    use slate_animation::FrameScheduler;
    use slate_dom::{DomEvent, EventDispatcher, MouseEventData};
    use slate_input::MouseState;
    use slate_layout::Viewport;
    use slate_style::{parse_stylesheet, Theme};
    use std::time::Instant;
    use tessera_core::types::{AssetInfo, AssetKind};

    struct Fixture {
        ctx: PanelContext,
        scheduler: Rc<RefCell<FrameScheduler>>,
        mouse: Rc<RefCell<MouseState>>,
    }

    fn fixture() -> Fixture {
        let document = Rc::new(Document::parse_html(CHROME_TEMPLATE).expect("chrome parses"));
        let registry = DelegateRegistry::new(document.clone());
        let scheduler = Rc::new(RefCell::new(FrameScheduler::new()));
        let geometry = Rc::new(RefCell::new(GeometryStore::new()));
        let mouse = Rc::new(RefCell::new(MouseState::new()));
        let interaction = Rc::new(RefCell::new(InteractionState::new()));

        let mut theme =
            Theme::from_stylesheet(&parse_stylesheet(CHROME_STYLESHEET).expect("stylesheet"));
        // Instant transitions keep the lifecycle deterministic under test.
        theme.set("menu-open-ms", "0ms");
        theme.set("menu-close-ms", "0ms");

        let overlay = OverlayController::builder()
            .document(document.clone())
            .registry(registry.clone())
            .scheduler(scheduler.clone())
            .geometry(geometry.clone())
            .mouse(mouse.clone())
            .interaction(interaction.clone())
            .theme(theme)
            .viewport(Viewport::new(1280.0, 800.0))
            .mount_id("overlay-root")
            .build()
            .expect("overlay builds");

        let mut shell = EditorShell::new();
        shell.add_asset(AssetInfo {
            id: AssetId(100),
            name: "grass_tile".into(),
            kind: AssetKind::Sprite,
            source: None,
            tags: vec![],
        });
        shell.add_asset(AssetInfo {
            id: AssetId(101),
            name: "water_tile".into(),
            kind: AssetKind::Sprite,
            source: None,
            tags: vec![],
        });
        let layer = shell.active_layer().unwrap();
        shell.add_object("Player".into(), layer).unwrap();
        shell.add_object("Crate".into(), layer).unwrap();

        let ctx = PanelContext {
            document,
            registry,
            overlay,
            interaction,
            geometry,
            shell: Rc::new(RefCell::new(shell)),
            containers: Rc::new(RefCell::new(HashMap::new())),
        };

        mount_panels(&ctx).expect("panels mount");
        Fixture {
            ctx,
            scheduler,
            mouse,
        }
    }

    fn click_on(target: &Rc<Node>) {
        let mut event = DomEvent::mouse("click", true, MouseEventData::default());
        EventDispatcher::dispatch(&mut event, target);
    }

    fn context_menu_on(f: &Fixture, target: &Rc<Node>, x: f64, y: f64) {
        f.mouse
            .borrow_mut()
            .set_position(slate_input::Point::new(x, y));
        let mut event = DomEvent::mouse(
            "contextmenu",
            true,
            MouseEventData {
                client_x: x,
                client_y: y,
                button: 2,
                ..Default::default()
            },
        );
        EventDispatcher::dispatch(&mut event, target);
    }

    fn find(f: &Fixture, selector: &str) -> Rc<Node> {
        f.ctx
            .document
            .select_first(&Selector::parse(selector).unwrap())
            .unwrap_or_else(|| panic!("no element for {selector}"))
    }

    #[test]
    fn asset_click_marks_row_active() {
        let f = fixture();
        let row = find(&f, "[data-asset-id=100]");
        click_on(&row);

        assert_eq!(f.ctx.shell.borrow().active_asset(), Some(AssetId(100)));
        // The list re-rendered; the fresh row carries the active class.
        let row = find(&f, "[data-asset-id=100]");
        assert!(row.has_class("active"));
    }

    #[test]
    fn asset_search_filters_rows() {
        let f = fixture();
        let search = find(&f, ".asset-search");

        let mut event = DomEvent::input(slate_dom::InputEventData {
            data: Some("water".into()),
            ..Default::default()
        });
        EventDispatcher::dispatch(&mut event, &search);

        let list = find(&f, ".asset-list");
        let rows: Vec<_> = list.children().into_iter().filter(|c| c.is_element()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].dataset("asset-id").as_deref(), Some("101"));
    }

    #[test]
    fn asset_context_menu_opens_popup() {
        let f = fixture();
        let row = find(&f, "[data-asset-id=100]");
        context_menu_on(&f, &row, 300.0, 200.0);

        assert!(f.ctx.overlay.is_open());
        slate_animation::pump_frame(&f.scheduler, Instant::now());
        let menu = f.ctx.overlay.active_node().expect("menu attached");
        assert!(menu.has_class("visible"));
    }

    #[test]
    fn outliner_click_selects_and_ctrl_click_extends() {
        let f = fixture();
        let first = find(&f, "li[data-object-id]");
        click_on(&first);
        assert_eq!(f.ctx.shell.borrow().selection_count(), 1);

        // Ctrl-click the other row.
        let rows = f
            .ctx
            .document
            .select_all(&Selector::parse("li[data-object-id]").unwrap());
        let other = rows
            .iter()
            .find(|r| !r.has_class("selected"))
            .expect("unselected row")
            .clone();
        let mut event = DomEvent::mouse(
            "click",
            true,
            MouseEventData {
                ctrl_key: true,
                ..Default::default()
            },
        );
        EventDispatcher::dispatch(&mut event, &other);
        assert_eq!(f.ctx.shell.borrow().selection_count(), 2);
    }

    #[test]
    fn empty_area_mousedown_starts_marquee_row_does_not() {
        let f = fixture();
        let outliner = f.ctx.container(PanelKind::Outliner).unwrap();

        // Press on a row: swallowed by the row handler.
        let row = find(&f, "li[data-object-id]");
        let mut press = DomEvent::mouse("mousedown", true, MouseEventData::default());
        EventDispatcher::dispatch(&mut press, &row);
        assert!(f.ctx.interaction.borrow().is_idle());

        // Press on the panel background: marquee starts.
        let mut press = DomEvent::mouse("mousedown", true, MouseEventData::default());
        EventDispatcher::dispatch(&mut press, &outliner);
        assert!(matches!(
            f.ctx.interaction.borrow().current(),
            ActiveGesture::MarqueeSelect { .. }
        ));

        // Release ends it.
        let mut release = DomEvent::mouse("mouseup", true, MouseEventData::default());
        EventDispatcher::dispatch(&mut release, &outliner);
        assert!(f.ctx.interaction.borrow().is_idle());
    }

    #[test]
    fn layer_visibility_toggle_rerenders_row() {
        let f = fixture();
        let eye = find(&f, "[data-action=toggle-visibility]");
        click_on(&eye);

        let row = find(&f, "li[data-layer-id]");
        assert!(row.has_class("hidden-layer"));
        let eye = find(&f, "[data-action=toggle-visibility]");
        assert_eq!(eye.dataset("icon").as_deref(), Some("eye-off"));
    }

    #[test]
    fn toolbar_grid_dropdown_sets_cell_size() {
        let f = fixture();
        f.mouse
            .borrow_mut()
            .set_position(slate_input::Point::new(330.0, 20.0));

        let button = find(&f, "[data-dropdown=grid-size]");
        let mut event = DomEvent::mouse(
            "click",
            true,
            MouseEventData {
                client_x: 330.0,
                client_y: 20.0,
                ..Default::default()
            },
        );
        EventDispatcher::dispatch(&mut event, &button);

        assert!(f.ctx.overlay.is_open());
        let menu = f.ctx.overlay.active_node().expect("dropdown attached");
        assert!(menu.has_class("dropdown-menu"));

        let item = find(&f, "[data-menu-item=grid-64]");
        click_on(&item);
        assert_eq!(f.ctx.shell.borrow().grid_cell_size(), 64);
    }

    #[test]
    fn toolbar_click_switches_tool() {
        let f = fixture();
        let paint = find(&f, "[data-tool=paint]");
        click_on(&paint);

        assert_eq!(f.ctx.shell.borrow().active_tool(), Tool::Paint);
        assert!(find(&f, "[data-tool=paint]").has_class("active"));
        assert!(!find(&f, "[data-tool=select]").has_class("active"));
    }
}
