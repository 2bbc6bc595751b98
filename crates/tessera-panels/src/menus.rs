//! Per-panel context menu sources.
//!
//! Each panel contributes a [`MenuSource`]: context extraction pulls ids off
//! the clicked row's `data-*` attributes, and the item lists use visibility
//! and enabled predicates evaluated against that context.

use crate::dialog;
use crate::panels::{render_asset_list, render_layer_list, render_outliner, PanelContext};
use slate_dom::Node;
use slate_overlay::{MenuAction, MenuContext, MenuItem, MenuSource};
use std::rc::Rc;
use tessera_core::types::{AssetId, LayerId, ObjectId};
use tracing::warn;

fn parse_u64(ctx: &MenuContext, key: &str) -> Option<u64> {
    ctx.get(key).and_then(|v| v.parse().ok())
}

/// Context menu for asset browser rows.
pub struct AssetMenu {
    ctx: PanelContext,
}

impl AssetMenu {
    pub fn new(ctx: PanelContext) -> Self {
        Self { ctx }
    }
}

impl MenuSource for AssetMenu {
    fn extract_context(&self, element: &Rc<Node>) -> MenuContext {
        let mut ctx = MenuContext::for_target(element.id);
        if let Some(id) = element.dataset("asset-id") {
            ctx.insert("asset-id", id);
        }
        if let Some(kind) = element.dataset("kind") {
            ctx.insert("kind", kind);
        }
        let shell = self.ctx.shell.borrow();
        if let Some(id) = parse_u64(&ctx, "asset-id") {
            if let Some(asset) = shell.asset(AssetId(id)) {
                ctx.insert("name", asset.name.clone());
            }
        }
        if let Some(layer) = shell.active_layer().and_then(|id| shell.layer(id)) {
            ctx.insert("layer-locked", layer.locked.to_string());
        }
        ctx
    }

    fn menu_items(&self, _ctx: &MenuContext) -> Vec<MenuItem> {
        let place_ctx = self.ctx.clone();
        let rename_ctx = self.ctx.clone();
        let duplicate_ctx = self.ctx.clone();
        let delete_ctx = self.ctx.clone();

        vec![
            MenuItem::Action(
                MenuAction::new("place", "Place on Active Layer", move |menu_ctx| {
                    let Some(id) = parse_u64(menu_ctx, "asset-id") else {
                        return;
                    };
                    let name = menu_ctx.get("name").unwrap_or("asset").to_string();
                    let placed = {
                        let mut shell = place_ctx.shell.borrow_mut();
                        if shell.asset(AssetId(id)).is_none() {
                            warn!(asset = id, "cannot place a missing asset");
                            return;
                        }
                        shell
                            .active_layer()
                            .and_then(|layer| shell.add_object(name, layer).ok())
                    };
                    if placed.is_some() {
                        if let Err(e) = render_outliner(&place_ctx) {
                            warn!(error = %e, "outliner refresh failed after place");
                        }
                    }
                })
                .with_icon("plus")
                .enabled_when(|c| c.get("layer-locked") != Some("true")),
            ),
            MenuItem::Action(
                MenuAction::new("rename", "Rename", move |menu_ctx| {
                    let Some(id) = parse_u64(menu_ctx, "asset-id") else {
                        return;
                    };
                    let initial = menu_ctx.get("name").unwrap_or_default().to_string();
                    let submit_ctx = rename_ctx.clone();
                    let shown = dialog::show_prompt(
                        &rename_ctx,
                        "Rename Asset",
                        &initial,
                        move |new_name| {
                            let renamed = submit_ctx
                                .shell
                                .borrow_mut()
                                .rename_asset(AssetId(id), new_name);
                            match renamed {
                                Ok(()) => {
                                    if let Err(e) = render_asset_list(&submit_ctx) {
                                        warn!(error = %e, "asset list refresh failed");
                                    }
                                }
                                Err(e) => warn!(error = %e, "asset rename failed"),
                            }
                        },
                    );
                    if let Err(e) = shown {
                        warn!(error = %e, "rename dialog failed to open");
                    }
                })
                .with_icon("edit"),
            ),
            MenuItem::Action(
                MenuAction::new("duplicate", "Duplicate", move |menu_ctx| {
                    let Some(id) = parse_u64(menu_ctx, "asset-id") else {
                        return;
                    };
                    let duplicated = duplicate_ctx.shell.borrow_mut().duplicate_asset(AssetId(id));
                    match duplicated {
                        Ok(_) => {
                            if let Err(e) = render_asset_list(&duplicate_ctx) {
                                warn!(error = %e, "asset list refresh failed");
                            }
                        }
                        Err(e) => warn!(error = %e, "asset duplicate failed"),
                    }
                })
                .with_icon("copy"),
            ),
            MenuItem::Separator,
            MenuItem::Action(
                MenuAction::new("delete", "Delete", move |menu_ctx| {
                    let Some(id) = parse_u64(menu_ctx, "asset-id") else {
                        return;
                    };
                    let name = menu_ctx.get("name").unwrap_or("this asset").to_string();
                    let confirm_ctx = delete_ctx.clone();
                    let shown = dialog::show_confirm(
                        &delete_ctx,
                        "Delete Asset",
                        &format!("Delete \"{name}\"? This cannot be undone."),
                        move || {
                            let removed = confirm_ctx.shell.borrow_mut().remove_asset(AssetId(id));
                            match removed {
                                Ok(()) => {
                                    if let Err(e) = render_asset_list(&confirm_ctx) {
                                        warn!(error = %e, "asset list refresh failed");
                                    }
                                }
                                Err(e) => warn!(error = %e, "asset delete failed"),
                            }
                        },
                    );
                    if let Err(e) = shown {
                        warn!(error = %e, "delete dialog failed to open");
                    }
                })
                .with_icon("trash"),
            ),
        ]
    }
}

/// Context menu for outliner rows.
pub struct OutlinerMenu {
    ctx: PanelContext,
}

impl OutlinerMenu {
    pub fn new(ctx: PanelContext) -> Self {
        Self { ctx }
    }
}

impl MenuSource for OutlinerMenu {
    fn extract_context(&self, element: &Rc<Node>) -> MenuContext {
        let mut ctx = MenuContext::for_target(element.id);
        if let Some(id) = element.dataset("object-id") {
            ctx.insert("object-id", id);
        }

        // Right-clicking an unselected row selects it first, like every
        // outliner does.
        if let Some(id) = parse_u64(&ctx, "object-id") {
            let mut shell = self.ctx.shell.borrow_mut();
            if !shell.is_selected(ObjectId(id)) {
                shell.select_only(ObjectId(id));
            }
            ctx.insert("selection-count", shell.selection_count().to_string());
            if let Some(object) = shell.object(ObjectId(id)) {
                ctx.insert("name", object.name.clone());
            }
        }
        ctx
    }

    fn menu_items(&self, _ctx: &MenuContext) -> Vec<MenuItem> {
        let rename_ctx = self.ctx.clone();
        let duplicate_ctx = self.ctx.clone();
        let delete_ctx = self.ctx.clone();

        vec![
            MenuItem::Action(
                MenuAction::new("rename", "Rename", move |menu_ctx| {
                    let Some(id) = parse_u64(menu_ctx, "object-id") else {
                        return;
                    };
                    let initial = menu_ctx.get("name").unwrap_or_default().to_string();
                    let submit_ctx = rename_ctx.clone();
                    let shown = dialog::show_prompt(
                        &rename_ctx,
                        "Rename Object",
                        &initial,
                        move |new_name| {
                            let renamed = submit_ctx
                                .shell
                                .borrow_mut()
                                .rename_object(ObjectId(id), new_name);
                            match renamed {
                                Ok(()) => {
                                    if let Err(e) = render_outliner(&submit_ctx) {
                                        warn!(error = %e, "outliner refresh failed");
                                    }
                                }
                                Err(e) => warn!(error = %e, "object rename failed"),
                            }
                        },
                    );
                    if let Err(e) = shown {
                        warn!(error = %e, "rename dialog failed to open");
                    }
                })
                .with_icon("edit")
                .enabled_when(|c| c.get("selection-count") == Some("1")),
            ),
            MenuItem::Action(
                MenuAction::new("duplicate", "Duplicate", move |menu_ctx| {
                    let Some(id) = parse_u64(menu_ctx, "object-id") else {
                        return;
                    };
                    let duplicated = duplicate_ctx
                        .shell
                        .borrow_mut()
                        .duplicate_object(ObjectId(id));
                    match duplicated {
                        Ok(_) => {
                            if let Err(e) = render_outliner(&duplicate_ctx) {
                                warn!(error = %e, "outliner refresh failed");
                            }
                        }
                        Err(e) => warn!(error = %e, "object duplicate failed"),
                    }
                })
                .with_icon("copy"),
            ),
            MenuItem::Separator,
            MenuItem::Action(
                MenuAction::new("delete", "Delete Selection", move |_| {
                    delete_ctx.shell.borrow_mut().delete_selection();
                    if let Err(e) = render_outliner(&delete_ctx) {
                        warn!(error = %e, "outliner refresh failed");
                    }
                })
                .with_icon("trash")
                .enabled_when(|c| c.get("selection-count") != Some("0")),
            ),
        ]
    }
}

/// Context menu for layer rows.
pub struct LayerMenu {
    ctx: PanelContext,
}

impl LayerMenu {
    pub fn new(ctx: PanelContext) -> Self {
        Self { ctx }
    }
}

impl MenuSource for LayerMenu {
    fn extract_context(&self, element: &Rc<Node>) -> MenuContext {
        let mut ctx = MenuContext::for_target(element.id);
        if let Some(id) = element.dataset("layer-id") {
            ctx.insert("layer-id", id);
        }
        let shell = self.ctx.shell.borrow();
        if let Some(id) = parse_u64(&ctx, "layer-id") {
            if let Some(layer) = shell.layer(LayerId(id)) {
                ctx.insert("name", layer.name.clone());
                ctx.insert("visible", layer.visible.to_string());
                ctx.insert("locked", layer.locked.to_string());
            }
        }
        ctx.insert("last-layer", (shell.layer_count() <= 1).to_string());
        ctx
    }

    fn menu_items(&self, ctx: &MenuContext) -> Vec<MenuItem> {
        let rename_ctx = self.ctx.clone();
        let visibility_ctx = self.ctx.clone();
        let lock_ctx = self.ctx.clone();
        let delete_ctx = self.ctx.clone();

        let visibility_label = if ctx.get("visible") == Some("true") {
            "Hide Layer"
        } else {
            "Show Layer"
        };
        let lock_label = if ctx.get("locked") == Some("true") {
            "Unlock Layer"
        } else {
            "Lock Layer"
        };

        vec![
            MenuItem::Action(
                MenuAction::new("rename", "Rename", move |menu_ctx| {
                    let Some(id) = parse_u64(menu_ctx, "layer-id") else {
                        return;
                    };
                    let initial = menu_ctx.get("name").unwrap_or_default().to_string();
                    let submit_ctx = rename_ctx.clone();
                    let shown = dialog::show_prompt(
                        &rename_ctx,
                        "Rename Layer",
                        &initial,
                        move |new_name| {
                            let renamed = submit_ctx
                                .shell
                                .borrow_mut()
                                .rename_layer(LayerId(id), new_name);
                            match renamed {
                                Ok(()) => {
                                    if let Err(e) = render_layer_list(&submit_ctx) {
                                        warn!(error = %e, "layer list refresh failed");
                                    }
                                }
                                Err(e) => warn!(error = %e, "layer rename failed"),
                            }
                        },
                    );
                    if let Err(e) = shown {
                        warn!(error = %e, "rename dialog failed to open");
                    }
                })
                .with_icon("edit")
                .enabled_when(|c| c.get("locked") != Some("true")),
            ),
            MenuItem::Action(MenuAction::new(
                "toggle-visibility",
                visibility_label,
                move |menu_ctx| {
                    let Some(id) = parse_u64(menu_ctx, "layer-id") else {
                        return;
                    };
                    let toggled = visibility_ctx
                        .shell
                        .borrow_mut()
                        .toggle_layer_visibility(LayerId(id));
                    match toggled {
                        Ok(_) => {
                            if let Err(e) = render_layer_list(&visibility_ctx) {
                                warn!(error = %e, "layer list refresh failed");
                            }
                        }
                        Err(e) => warn!(error = %e, "layer visibility toggle failed"),
                    }
                },
            )),
            MenuItem::Action(MenuAction::new("toggle-lock", lock_label, move |menu_ctx| {
                let Some(id) = parse_u64(menu_ctx, "layer-id") else {
                    return;
                };
                let toggled = lock_ctx.shell.borrow_mut().toggle_layer_lock(LayerId(id));
                match toggled {
                    Ok(_) => {
                        if let Err(e) = render_layer_list(&lock_ctx) {
                            warn!(error = %e, "layer list refresh failed");
                        }
                    }
                    Err(e) => warn!(error = %e, "layer lock toggle failed"),
                }
            })),
            MenuItem::Separator,
            MenuItem::Action(
                MenuAction::new("delete", "Delete Layer", move |menu_ctx| {
                    let Some(id) = parse_u64(menu_ctx, "layer-id") else {
                        return;
                    };
                    let name = menu_ctx.get("name").unwrap_or("this layer").to_string();
                    let confirm_ctx = delete_ctx.clone();
                    let shown = dialog::show_confirm(
                        &delete_ctx,
                        "Delete Layer",
                        &format!("Delete \"{name}\"? Its objects move to the first layer."),
                        move || {
                            let deleted =
                                confirm_ctx.shell.borrow_mut().delete_layer(LayerId(id));
                            match deleted {
                                Ok(()) => {
                                    let refreshed = render_layer_list(&confirm_ctx)
                                        .and_then(|_| render_outliner(&confirm_ctx));
                                    if let Err(e) = refreshed {
                                        warn!(error = %e, "panel refresh failed after layer delete");
                                    }
                                }
                                Err(e) => warn!(error = %e, "layer delete failed"),
                            }
                        },
                    );
                    if let Err(e) = shown {
                        warn!(error = %e, "delete dialog failed to open");
                    }
                })
                .with_icon("trash")
                .visible_when(|c| c.get("last-layer") != Some("true"))
                .enabled_when(|c| c.get("locked") != Some("true")),
            ),
        ]
    }
}
