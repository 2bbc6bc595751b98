//! Editor bootstrap.
//!
//! One [`EditorContext`] is created at startup and passed by reference to
//! everything that needs shared chrome services. Nothing in the editor is a
//! lazily-initialized global.

use slate_animation::FrameScheduler;
use slate_dom::Document;
use slate_events::{DelegateRegistry, InteractionState};
use slate_input::MouseState;
use slate_layout::{GeometryStore, Viewport};
use slate_overlay::OverlayController;
use slate_style::{parse_stylesheet, Theme};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tessera_core::{EditorConfig, TesseraError, TesseraResult};
use tessera_panels::chrome::{CHROME_STYLESHEET, CHROME_TEMPLATE};
use tessera_panels::{mount_panels, EditorShell, Panel, PanelContext};

/// Process-wide editor services, created once in `main`.
pub struct EditorContext {
    pub config: EditorConfig,
    pub document: Rc<Document>,
    pub registry: DelegateRegistry,
    pub scheduler: Rc<RefCell<FrameScheduler>>,
    pub geometry: Rc<RefCell<GeometryStore>>,
    pub mouse: Rc<RefCell<MouseState>>,
    pub interaction: Rc<RefCell<InteractionState>>,
    pub viewport: Viewport,
    pub overlay: OverlayController,
    pub shell: Rc<RefCell<EditorShell>>,
    pub panels: Vec<Panel>,
}

/// Parse the chrome, resolve the theme, build the shared services, and
/// mount the panels.
pub fn bootstrap(
    config: EditorConfig,
    viewport: Viewport,
    shell: EditorShell,
) -> TesseraResult<EditorContext> {
    let document = Rc::new(
        Document::parse_html(CHROME_TEMPLATE)
            .map_err(|e| TesseraError::template(e.to_string()))?,
    );

    let stylesheet =
        parse_stylesheet(CHROME_STYLESHEET).map_err(|e| TesseraError::template(e.to_string()))?;
    let mut theme = Theme::from_stylesheet(&stylesheet);
    for (name, value) in &config.theme.overrides {
        theme.set(name.clone(), value.clone());
    }

    let registry = DelegateRegistry::new(document.clone());
    let scheduler = Rc::new(RefCell::new(FrameScheduler::new()));
    let geometry = Rc::new(RefCell::new(GeometryStore::new()));
    let mouse = Rc::new(RefCell::new(MouseState::new()));
    let interaction = Rc::new(RefCell::new(InteractionState::new()));
    let shell = Rc::new(RefCell::new(shell));

    let overlay = OverlayController::builder()
        .document(document.clone())
        .registry(registry.clone())
        .scheduler(scheduler.clone())
        .geometry(geometry.clone())
        .mouse(mouse.clone())
        .interaction(interaction.clone())
        .theme(theme.clone())
        .viewport(viewport)
        .mount_id("overlay-root")
        .build()
        .map_err(|e| TesseraError::overlay(e.to_string()))?;

    overlay.install_global_handlers();

    let panel_ctx = PanelContext {
        document: document.clone(),
        registry: registry.clone(),
        overlay: overlay.clone(),
        interaction: interaction.clone(),
        geometry: geometry.clone(),
        shell: shell.clone(),
        containers: Rc::new(RefCell::new(HashMap::new())),
    };
    let panels = mount_panels(&panel_ctx)?;

    log::info!("Editor chrome ready ({} panels)", panels.len());
    Ok(EditorContext {
        config,
        document,
        registry,
        scheduler,
        geometry,
        mouse,
        interaction,
        viewport,
        overlay,
        shell,
        panels,
    })
}
