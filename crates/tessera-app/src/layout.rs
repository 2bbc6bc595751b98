//! Chrome layout pass.
//!
//! The editor has no rendering host in this build, so a simple dock layout
//! assigns every interactive element a rectangle in the geometry store. The
//! pump hit-tests against these rects, and the overlay measures popups from
//! them. Re-run after any re-render that changes row counts.

use crate::context::EditorContext;
use slate_dom::Node;
use slate_layout::Rect;
use slate_style::Selector;
use std::rc::Rc;
use tessera_core::{TesseraError, TesseraResult};

const TOOLBAR_HEIGHT: f64 = 40.0;
const PANEL_HEADER_HEIGHT: f64 = 28.0;
const SEARCH_HEIGHT: f64 = 28.0;
const ROW_HEIGHT: f64 = 24.0;

pub fn layout_chrome(ctx: &EditorContext) -> TesseraResult<()> {
    let vw = ctx.viewport.width;
    let vh = ctx.viewport.height;
    let left_w = ctx.config.panels.left_dock_width;
    let right_w = ctx.config.panels.right_dock_width;

    let mut geometry = ctx.geometry.borrow_mut();
    // Rows removed by a re-render must not linger as ghost hit targets.
    geometry.clear();
    let mut set = |node: &Rc<Node>, rect: Rect| geometry.set_rect(node.id, rect);

    let by_id = |id: &str| {
        ctx.document
            .get_element_by_id(id)
            .ok_or_else(|| TesseraError::template(format!("missing #{id}")))
    };

    let toolbar = by_id("toolbar")?;
    set(&toolbar, Rect::new(0.0, 0.0, vw, TOOLBAR_HEIGHT));

    // Toolbar buttons in a row.
    let tool_sel = sel(".tool-button")?;
    for (i, button) in ctx.document.select_in(&toolbar, &tool_sel).iter().enumerate() {
        set(
            button,
            Rect::new(8.0 + i as f64 * 72.0, 4.0, 64.0, TOOLBAR_HEIGHT - 8.0),
        );
    }

    let body_top = TOOLBAR_HEIGHT;
    let body_h = vh - TOOLBAR_HEIGHT;

    // Left dock: asset browser.
    let assets = by_id("asset-browser")?;
    let assets_rect = Rect::new(0.0, body_top, left_w, body_h);
    set(&assets, assets_rect);
    let search_sel = sel(".asset-search")?;
    if let Some(search) = ctx.document.select_in(&assets, &search_sel).into_iter().next() {
        set(
            &search,
            Rect::new(
                4.0,
                body_top + PANEL_HEADER_HEIGHT,
                left_w - 8.0,
                SEARCH_HEIGHT,
            ),
        );
    }
    layout_rows(
        ctx,
        &mut set,
        &assets,
        "li[data-asset-id]",
        Rect::new(
            0.0,
            body_top + PANEL_HEADER_HEIGHT + SEARCH_HEIGHT,
            left_w,
            body_h - PANEL_HEADER_HEIGHT - SEARCH_HEIGHT,
        ),
    )?;

    // Center viewport.
    let viewport_el = by_id("viewport")?;
    set(
        &viewport_el,
        Rect::new(left_w, body_top, vw - left_w - right_w, body_h),
    );

    // Right dock: outliner above layers.
    let outliner = by_id("outliner")?;
    let outliner_rect = Rect::new(vw - right_w, body_top, right_w, body_h / 2.0);
    set(&outliner, outliner_rect);
    layout_rows(
        ctx,
        &mut set,
        &outliner,
        "li[data-object-id]",
        Rect::new(
            outliner_rect.x,
            outliner_rect.y + PANEL_HEADER_HEIGHT,
            right_w,
            outliner_rect.height - PANEL_HEADER_HEIGHT,
        ),
    )?;

    let layers = by_id("layers")?;
    let layers_rect = Rect::new(
        vw - right_w,
        body_top + body_h / 2.0,
        right_w,
        body_h / 2.0,
    );
    set(&layers, layers_rect);
    layout_rows(
        ctx,
        &mut set,
        &layers,
        "li[data-layer-id]",
        Rect::new(
            layers_rect.x,
            layers_rect.y + PANEL_HEADER_HEIGHT,
            right_w,
            layers_rect.height - PANEL_HEADER_HEIGHT,
        ),
    )?;

    log::debug!("chrome layout pass complete");
    Ok(())
}

fn sel(source: &str) -> TesseraResult<Selector> {
    Selector::parse(source).map_err(|e| TesseraError::template(format!("bad selector: {e}")))
}

/// Stack a panel's rows vertically inside `area`.
fn layout_rows(
    ctx: &EditorContext,
    set: &mut impl FnMut(&Rc<Node>, Rect),
    panel: &Rc<Node>,
    row_selector: &str,
    area: Rect,
) -> TesseraResult<()> {
    let row_sel = sel(row_selector)?;
    for (i, row) in ctx.document.select_in(panel, &row_sel).iter().enumerate() {
        let y = area.y + i as f64 * ROW_HEIGHT;
        if y + ROW_HEIGHT > area.bottom() {
            break;
        }
        set(row, Rect::new(area.x, y, area.width, ROW_HEIGHT));

        // Action icons, where a row carries them.
        let icon_sel = sel("[data-action]")?;
        for (j, icon) in ctx.document.select_in(row, &icon_sel).iter().enumerate() {
            set(
                icon,
                Rect::new(area.x + 4.0 + j as f64 * 20.0, y + 4.0, 16.0, 16.0),
            );
        }
    }
    Ok(())
}
