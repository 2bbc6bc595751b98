//! Modal confirm/prompt dialogs.
//!
//! Dialogs are plain chrome elements under `<body>`, wired through the same
//! delegated registry as everything else. One dialog at a time; opening a
//! new one replaces the old. Unlike popups they do not animate and are not
//! cursor-watched.

use crate::panels::PanelContext;
use slate_dom::Node;
use slate_events::HandlerMap;
use slate_style::Selector;
use std::rc::Rc;
use tessera_core::{TesseraError, TesseraResult};
use tracing::debug;

const BACKDROP_CLASS: &str = "dialog-backdrop";

/// Remove any open dialog.
pub fn close_dialog(ctx: &PanelContext) {
    let Ok(backdrop_sel) = Selector::parse(&format!(".{BACKDROP_CLASS}")) else {
        return;
    };
    for backdrop in ctx.document.select_all(&backdrop_sel) {
        ctx.registry.unregister_container(&backdrop);
        ctx.document.remove_node(&backdrop);
        debug!("dialog closed");
    }
}

/// Show a confirm dialog. `on_confirm` runs only on the confirm button.
pub fn show_confirm(
    ctx: &PanelContext,
    title: &str,
    message: &str,
    on_confirm: impl Fn() + 'static,
) -> TesseraResult<()> {
    let backdrop = build_dialog(ctx, title, Some(message), None)?;
    wire_dialog(ctx, &backdrop, move |_| on_confirm());
    Ok(())
}

/// Show a prompt dialog with a text field. `on_submit` receives the field's
/// `value` attribute at confirm time (the host keeps it current while the
/// user types).
pub fn show_prompt(
    ctx: &PanelContext,
    title: &str,
    initial: &str,
    on_submit: impl Fn(String) + 'static,
) -> TesseraResult<()> {
    let backdrop = build_dialog(ctx, title, None, Some(initial))?;

    let input_sel =
        Selector::parse(".dialog-input").map_err(|e| TesseraError::template(e.to_string()))?;
    let document = ctx.document.clone();
    let backdrop_for_read = backdrop.clone();
    let initial = initial.to_string();

    wire_dialog(ctx, &backdrop, move |_| {
        let value = document
            .select_in(&backdrop_for_read, &input_sel)
            .into_iter()
            .next()
            .and_then(|input| input.get_attribute("value"))
            .unwrap_or_else(|| initial.clone());
        on_submit(value);
    });
    Ok(())
}

fn build_dialog(
    ctx: &PanelContext,
    title: &str,
    message: Option<&str>,
    input_initial: Option<&str>,
) -> TesseraResult<Rc<Node>> {
    // One dialog at a time.
    close_dialog(ctx);

    let body = ctx
        .document
        .body()
        .ok_or_else(|| TesseraError::template("document has no <body>"))?;

    let backdrop = ctx
        .document
        .create_element("div", &[("class", BACKDROP_CLASS)]);
    let dialog = ctx.document.create_element("div", &[("class", "dialog")]);

    let heading = ctx.document.create_element("h2", &[("class", "dialog-title")]);
    heading.append_child(ctx.document.create_text(title));
    dialog.append_child(heading);

    if let Some(message) = message {
        let p = ctx
            .document
            .create_element("p", &[("class", "dialog-message")]);
        p.append_child(ctx.document.create_text(message));
        dialog.append_child(p);
    }

    if let Some(initial) = input_initial {
        let input = ctx.document.create_element(
            "input",
            &[
                ("class", "dialog-input"),
                ("type", "text"),
                ("value", initial),
            ],
        );
        dialog.append_child(input);
    }

    let footer = ctx
        .document
        .create_element("div", &[("class", "dialog-footer")]);
    let cancel = ctx.document.create_element(
        "button",
        &[("class", "dialog-button"), ("data-dialog", "cancel")],
    );
    cancel.append_child(ctx.document.create_text("Cancel"));
    let confirm = ctx.document.create_element(
        "button",
        &[("class", "dialog-button"), ("data-dialog", "confirm")],
    );
    confirm.append_child(ctx.document.create_text("OK"));
    footer.append_child(cancel);
    footer.append_child(confirm);
    dialog.append_child(footer);

    backdrop.append_child(dialog);
    body.append_child(backdrop.clone());
    debug!(title, "dialog opened");
    Ok(backdrop)
}

fn wire_dialog(ctx: &PanelContext, backdrop: &Rc<Node>, on_confirm: impl Fn(&Rc<Node>) + 'static) {
    let confirm_ctx = ctx.clone();
    let cancel_ctx = ctx.clone();
    let backdrop_ctx = ctx.clone();
    let backdrop_id = backdrop.id;

    let handlers = HandlerMap::new()
        .on("click", "[data-dialog=confirm]", move |_, el| {
            on_confirm(el);
            close_dialog(&confirm_ctx);
            Ok(())
        })
        .on("click", "[data-dialog=cancel]", move |_, _| {
            close_dialog(&cancel_ctx);
            Ok(())
        })
        // Clicks on the dialog body go nowhere; clicks on the backdrop
        // itself dismiss, like clicking outside a popup.
        .on("click", ".dialog", |_, _| Ok(()))
        .on_any("click", move |event, _| {
            if event.event().target() == Some(backdrop_id) {
                close_dialog(&backdrop_ctx);
            }
            Ok(())
        });

    ctx.registry
        .register_container(backdrop, handlers, Some("dialog"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chrome::CHROME_TEMPLATE;
    use crate::EditorShell;
    use slate_animation::FrameScheduler;
    use slate_dom::{Document, DomEvent, EventDispatcher, MouseEventData};
    use slate_events::{DelegateRegistry, InteractionState};
    use slate_input::MouseState;
    use slate_layout::{GeometryStore, Viewport};
    use slate_overlay::OverlayController;
    use slate_style::Theme;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    fn context() -> PanelContext {
        let document = Rc::new(Document::parse_html(CHROME_TEMPLATE).unwrap());
        let registry = DelegateRegistry::new(document.clone());
        let overlay = OverlayController::builder()
            .document(document.clone())
            .registry(registry.clone())
            .scheduler(Rc::new(RefCell::new(FrameScheduler::new())))
            .geometry(Rc::new(RefCell::new(GeometryStore::new())))
            .mouse(Rc::new(RefCell::new(MouseState::new())))
            .interaction(Rc::new(RefCell::new(InteractionState::new())))
            .theme(Theme::new())
            .viewport(Viewport::new(1280.0, 800.0))
            .mount_id("overlay-root")
            .build()
            .unwrap();

        PanelContext {
            document: document.clone(),
            registry,
            overlay,
            interaction: Rc::new(RefCell::new(InteractionState::new())),
            geometry: Rc::new(RefCell::new(GeometryStore::new())),
            shell: Rc::new(RefCell::new(EditorShell::new())),
            containers: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    fn click(target: &Rc<Node>) {
        let mut event = DomEvent::mouse("click", true, MouseEventData::default());
        EventDispatcher::dispatch(&mut event, target);
    }

    fn find(ctx: &PanelContext, selector: &str) -> Option<Rc<Node>> {
        ctx.document
            .select_first(&Selector::parse(selector).unwrap())
    }

    #[test]
    fn confirm_runs_callback_and_closes() {
        let ctx = context();
        let confirmed = Rc::new(Cell::new(false));
        let confirmed_cb = confirmed.clone();

        show_confirm(&ctx, "Delete Layer", "Really?", move || {
            confirmed_cb.set(true)
        })
        .unwrap();
        assert!(find(&ctx, ".dialog-backdrop").is_some());

        let ok = find(&ctx, "[data-dialog=confirm]").unwrap();
        click(&ok);

        assert!(confirmed.get());
        assert!(find(&ctx, ".dialog-backdrop").is_none());
    }

    #[test]
    fn cancel_skips_callback() {
        let ctx = context();
        let confirmed = Rc::new(Cell::new(false));
        let confirmed_cb = confirmed.clone();

        show_confirm(&ctx, "Delete", "Really?", move || confirmed_cb.set(true)).unwrap();
        let cancel = find(&ctx, "[data-dialog=cancel]").unwrap();
        click(&cancel);

        assert!(!confirmed.get());
        assert!(find(&ctx, ".dialog-backdrop").is_none());
    }

    #[test]
    fn prompt_submits_current_value() {
        let ctx = context();
        let submitted = Rc::new(RefCell::new(String::new()));
        let submitted_cb = submitted.clone();

        show_prompt(&ctx, "Rename", "old name", move |value| {
            *submitted_cb.borrow_mut() = value;
        })
        .unwrap();

        // The host updated the field while the user typed.
        let input = find(&ctx, ".dialog-input").unwrap();
        input.set_attribute("value", "new name");

        let ok = find(&ctx, "[data-dialog=confirm]").unwrap();
        click(&ok);

        assert_eq!(&*submitted.borrow(), "new name");
    }

    #[test]
    fn second_dialog_replaces_first() {
        let ctx = context();
        show_confirm(&ctx, "One", "first", || {}).unwrap();
        show_confirm(&ctx, "Two", "second", || {}).unwrap();

        let backdrops = ctx
            .document
            .select_all(&Selector::parse(".dialog-backdrop").unwrap());
        assert_eq!(backdrops.len(), 1);

        let title = find(&ctx, ".dialog-title").unwrap();
        assert_eq!(title.text_content(), "Two");
    }

    #[test]
    fn backdrop_click_dismisses() {
        let ctx = context();
        show_confirm(&ctx, "One", "first", || {}).unwrap();

        let backdrop = find(&ctx, ".dialog-backdrop").unwrap();
        click(&backdrop);
        assert!(find(&ctx, ".dialog-backdrop").is_none());
    }
}
