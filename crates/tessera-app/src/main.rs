//! Tessera smoke harness.
//!
//! The editor front-end has no rendering host in this build, so `main` runs
//! a scripted input drive through the full chrome stack: panel wiring,
//! delegated dispatch, context menus with positioning and animated
//! lifecycle, gesture cancellation, and dialogs. Each step's outcome and
//! duration land in a JSON summary on stdout.

mod context;
mod layout;
mod pump;

use anyhow::{anyhow, Context as _};
use context::{bootstrap, EditorContext};
use layout::layout_chrome;
use pump::InputPump;
use serde_json::json;
use slate_common::{init_logging, LogConfig};
use slate_input::{InputEvent, KeyCode, KeyEvent, KeyEventType, Modifiers, MouseButton, MouseEvent, MouseEventType, Point};
use slate_layout::Viewport;
use slate_style::Selector;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tessera_core::types::{AssetId, AssetInfo, AssetKind};
use tessera_core::EditorConfig;
use tessera_panels::{EditorShell, PanelKind};
use tracing::info;

/// Step timing collector for the drive summary.
struct DriveTiming {
    timings: RefCell<HashMap<&'static str, Vec<Duration>>>,
}

impl DriveTiming {
    fn new() -> Self {
        Self {
            timings: RefCell::new(HashMap::new()),
        }
    }

    fn record(&self, step: &'static str, duration: Duration) {
        self.timings
            .borrow_mut()
            .entry(step)
            .or_insert_with(Vec::new)
            .push(duration);
    }

    fn run<T>(&self, step: &'static str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(step, start.elapsed());
        out
    }

    fn summary(&self) -> serde_json::Value {
        let timings = self.timings.borrow();
        let mut summary = serde_json::Map::new();
        for (step, durations) in timings.iter() {
            let total_ms: f64 = durations.iter().map(|d| d.as_secs_f64() * 1000.0).sum();
            summary.insert(
                step.to_string(),
                json!({
                    "count": durations.len(),
                    "total_ms": (total_ms * 100.0).round() / 100.0,
                }),
            );
        }
        serde_json::Value::Object(summary)
    }
}

fn seeded_shell() -> EditorShell {
    let mut shell = EditorShell::new();
    for (id, name, kind) in [
        (1u64, "grass_tile", AssetKind::Tileset),
        (2, "water_tile", AssetKind::Tileset),
        (3, "player_idle", AssetKind::Sprite),
        (4, "crate", AssetKind::Prefab),
    ] {
        shell.add_asset(AssetInfo {
            id: AssetId(id),
            name: name.to_string(),
            kind,
            source: None,
            tags: Vec::new(),
        });
    }

    let background = shell.active_layer().expect("default layer");
    let props = shell.add_layer("Props".to_string());
    shell.add_object("Player".to_string(), background).ok();
    shell.add_object("Crate A".to_string(), props).ok();
    shell.add_object("Crate B".to_string(), props).ok();
    shell
}

fn rect_center(ctx: &EditorContext, selector: &str) -> anyhow::Result<Point> {
    let sel = Selector::parse(selector).map_err(|e| anyhow!("bad selector {selector}: {e}"))?;
    let node = ctx
        .document
        .select_first(&sel)
        .ok_or_else(|| anyhow!("no element for {selector}"))?;
    let rect = ctx
        .geometry
        .borrow()
        .rect_of(node.id)
        .ok_or_else(|| anyhow!("{selector} was never laid out"))?;
    Ok(Point::new(
        rect.x + rect.width / 2.0,
        rect.y + rect.height / 2.0,
    ))
}

fn move_and_click(pump: &mut InputPump, at: Point) {
    pump.dispatch(InputEvent::Mouse(MouseEvent::new(
        MouseEventType::MouseMove,
        at,
    )));
    pump.dispatch(InputEvent::Mouse(
        MouseEvent::new(MouseEventType::MouseDown, at).with_button(MouseButton::Primary),
    ));
    pump.dispatch(InputEvent::Mouse(
        MouseEvent::new(MouseEventType::MouseUp, at).with_button(MouseButton::Primary),
    ));
}

fn open_context_menu(pump: &mut InputPump, at: Point) {
    pump.dispatch(InputEvent::Mouse(MouseEvent::new(
        MouseEventType::MouseMove,
        at,
    )));
    pump.dispatch(InputEvent::Mouse(
        MouseEvent::new(MouseEventType::ContextMenu, at).with_button(MouseButton::Secondary),
    ));
}

fn main() -> anyhow::Result<()> {
    init_logging(LogConfig::default());

    let config_path = EditorConfig::default_path();
    let config = EditorConfig::load(&config_path).unwrap_or_default();

    let timing = DriveTiming::new();
    let viewport = Viewport::new(1280.0, 800.0);

    let ctx = timing.run("bootstrap", || {
        bootstrap(config, viewport, seeded_shell())
    })?;
    timing.run("layout", || layout_chrome(&ctx))?;

    let mut pump = InputPump::new(&ctx);

    // 1. Select an asset.
    timing.run("asset_click", || -> anyhow::Result<()> {
        let at = rect_center(&ctx, "li[data-asset-id=3]")?;
        move_and_click(&mut pump, at);
        anyhow::ensure!(
            ctx.shell.borrow().active_asset() == Some(AssetId(3)),
            "asset click did not set the active asset"
        );
        Ok(())
    })?;

    // 2. Filter the asset list, then clear the filter.
    timing.run("asset_search", || -> anyhow::Result<()> {
        let sel = Selector::parse(".asset-search").map_err(|e| anyhow!("{e}"))?;
        let field = ctx
            .document
            .select_first(&sel)
            .context("search field missing")?;
        pump.dispatch_text_input(&field, "tile");
        let rows = ctx
            .document
            .select_all(&Selector::parse("li[data-asset-id]").map_err(|e| anyhow!("{e}"))?);
        anyhow::ensure!(rows.len() == 2, "filter should leave 2 tile assets");
        pump.dispatch_text_input(&field, "");
        layout_chrome(&ctx)?;
        Ok(())
    })?;

    // 3. Context menu on an outliner row: open, watch the animation, pick an
    //    item.
    timing.run("outliner_menu", || -> anyhow::Result<()> {
        layout_chrome(&ctx)?;
        let at = rect_center(&ctx, "li[data-object-id]")?;
        open_context_menu(&mut pump, at);
        anyhow::ensure!(ctx.overlay.is_open(), "context menu did not open");

        // Two-phase show plus the open watch.
        pump.run_frames(2);
        let menu = ctx.overlay.active_node().context("menu node missing")?;
        anyhow::ensure!(menu.has_class("visible"), "menu never became visible");

        let before = ctx.shell.borrow().list_objects().len();
        let duplicate = ctx
            .document
            .select_first(&Selector::parse("[data-menu-item=duplicate]").map_err(|e| anyhow!("{e}"))?)
            .context("duplicate item missing")?;
        let mut click = slate_dom::DomEvent::mouse(
            "click",
            true,
            slate_dom::MouseEventData::default(),
        );
        slate_dom::EventDispatcher::dispatch(&mut click, &duplicate);

        anyhow::ensure!(
            ctx.shell.borrow().list_objects().len() == before + 1,
            "duplicate did not add an object"
        );

        // Let the close transition finish.
        std::thread::sleep(Duration::from_millis(160));
        pump.run_frames(2);
        anyhow::ensure!(!ctx.overlay.is_open(), "menu did not close after action");
        Ok(())
    })?;

    // 4. Right-click during a marquee cancels the gesture before the menu
    //    opens.
    timing.run("marquee_cancellation", || -> anyhow::Result<()> {
        layout_chrome(&ctx)?;
        let outliner = rect_center(&ctx, "#outliner")?;
        // Start a marquee on empty panel space (below the rows).
        let empty = Point::new(outliner.x, outliner.y + 150.0);
        pump.dispatch(InputEvent::Mouse(MouseEvent::new(
            MouseEventType::MouseMove,
            empty,
        )));
        pump.dispatch(InputEvent::Mouse(
            MouseEvent::new(MouseEventType::MouseDown, empty).with_button(MouseButton::Primary),
        ));
        anyhow::ensure!(
            !ctx.interaction.borrow().is_idle(),
            "marquee did not start"
        );

        let row = rect_center(&ctx, "li[data-object-id]")?;
        open_context_menu(&mut pump, row);
        anyhow::ensure!(
            ctx.interaction.borrow().is_idle(),
            "right-click left a stale marquee"
        );
        anyhow::ensure!(ctx.overlay.is_open(), "context menu did not open");
        Ok(())
    })?;

    // 5. Escape dismisses the menu.
    timing.run("escape_dismiss", || -> anyhow::Result<()> {
        pump.run_frames(2);
        pump.dispatch(InputEvent::Key(KeyEvent::new(
            KeyEventType::KeyDown,
            KeyCode::Escape,
            Modifiers::new(),
        )));
        std::thread::sleep(Duration::from_millis(160));
        pump.run_frames(2);
        anyhow::ensure!(!ctx.overlay.is_open(), "Escape did not dismiss the menu");
        Ok(())
    })?;

    // 6. Tool switch via the toolbar.
    timing.run("tool_switch", || -> anyhow::Result<()> {
        let at = rect_center(&ctx, "[data-tool=fill]")?;
        move_and_click(&mut pump, at);
        anyhow::ensure!(
            ctx.shell.borrow().active_tool() == tessera_panels::Tool::Fill,
            "toolbar click did not switch tools"
        );
        Ok(())
    })?;

    // 7. Unregistering a container silences its dispatch.
    timing.run("unregister_teardown", || -> anyhow::Result<()> {
        let assets = ctx
            .panels
            .iter()
            .find(|p| p.kind == PanelKind::AssetBrowser)
            .context("asset browser panel missing")?;
        ctx.registry.unregister_container(&assets.container);

        layout_chrome(&ctx)?;
        let before = ctx.shell.borrow().active_asset();
        let at = rect_center(&ctx, "li[data-asset-id=1]")?;
        move_and_click(&mut pump, at);
        anyhow::ensure!(
            ctx.shell.borrow().active_asset() == before,
            "unregistered panel still handled events"
        );
        Ok(())
    })?;

    info!("smoke drive complete");
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "result": "ok",
            "panels": ctx.panels.len(),
            "steps": timing.summary(),
        }))?
    );
    Ok(())
}
