//! Chrome markup and stylesheet.
//!
//! The panel skeleton is plain HTML parsed into the element tree at startup;
//! panels fill their own lists in afterwards. The stylesheet's `:root`
//! custom properties feed the overlay sizing math through [`slate_style::Theme`].

/// Editor chrome skeleton.
pub const CHROME_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head></head>
<body>
<div id="editor" class="editor-root">
    <div id="toolbar" class="panel toolbar">
        <button class="tool-button active" data-tool="select" title="Select">Select</button>
        <button class="tool-button" data-tool="paint" title="Paint">Paint</button>
        <button class="tool-button" data-tool="erase" title="Erase">Erase</button>
        <button class="tool-button" data-tool="fill" title="Fill">Fill</button>
        <button class="tool-button" data-dropdown="grid-size" title="Grid size">Grid</button>
    </div>
    <div id="left-dock" class="dock dock-left">
        <div id="asset-browser" class="panel">
            <div class="panel-header">Assets</div>
            <input class="asset-search" type="text" placeholder="Search assets">
            <ul class="asset-list"></ul>
        </div>
    </div>
    <div id="viewport" class="viewport"></div>
    <div id="right-dock" class="dock dock-right">
        <div id="outliner" class="panel">
            <div class="panel-header">Outliner</div>
            <ul class="object-list"></ul>
        </div>
        <div id="layers" class="panel">
            <div class="panel-header">Layers</div>
            <ul class="layer-list"></ul>
        </div>
    </div>
    <div id="overlay-root" class="overlay-root"></div>
</div>
</body>
</html>
"#;

/// Editor chrome stylesheet. Only the `:root` custom properties are
/// interpreted by the chrome itself; the rest documents the intended look
/// for a host that renders it.
pub const CHROME_STYLESHEET: &str = r#"
:root {
    --menu-margin: 20px;
    --menu-open-ms: 150ms;
    --menu-close-ms: 150ms;
    --menu-open-watch-ms: 200ms;
    --menu-easing: ease-out;
    --panel-gap: 8px;
    --row-height: 24px;
}

.editor-root { background: #1e1f24; color: #d4d6dd; }
.panel { background: #26272e; border: 1px solid #111; }
.panel-header { font-weight: bold; padding: 4px 8px; }
.toolbar { height: 40px; }
.tool-button.active { background: #3a6ea5; }
.asset-list .asset.active { background: #3a6ea5; }
.object-list .row.selected { background: #31435a; }
.layer-list .row.hidden-layer { opacity: 0.5; }

.context-menu, .dropdown-menu {
    position: absolute;
    opacity: 0;
    transition: opacity 150ms ease-out;
}
.context-menu.visible, .dropdown-menu.visible { opacity: 1; }
.menu-item.disabled { opacity: 0.4; }
.menu-separator { border-top: 1px solid #3c3d44; }

.dialog-backdrop { position: absolute; background: #00000080; }
.dialog { background: #26272e; border: 1px solid #111; }
"#;
