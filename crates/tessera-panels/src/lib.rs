//! Editor panel chrome - asset browser, outliner, layers, toolbar, dialogs.
//!
//! [`EditorShell`] is the state manager behind the panels; the modules wire
//! its state to the element tree through the delegated handler registry and
//! open context menus through the overlay controller. Panels re-render their
//! own DOM fragments after every mutation; nothing here paints.

pub mod chrome;
pub mod dialog;
pub mod menus;
pub mod panels;

pub use panels::{mount_panels, Panel, PanelContext};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tessera_core::types::{
    AssetId, AssetInfo, LayerId, LayerInfo, ObjectId, SceneObjectInfo,
};
use tessera_core::{TesseraError, TesseraResult};

/// The kinds of panel the editor chrome mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Toolbar,
    AssetBrowser,
    Outliner,
    Layers,
}

impl PanelKind {
    /// The element id the panel mounts on in the chrome template.
    pub fn element_id(&self) -> &'static str {
        match self {
            PanelKind::Toolbar => "toolbar",
            PanelKind::AssetBrowser => "asset-browser",
            PanelKind::Outliner => "outliner",
            PanelKind::Layers => "layers",
        }
    }
}

/// The active editing tool selected in the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Paint,
    Erase,
    Fill,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Select => "select",
            Tool::Paint => "paint",
            Tool::Erase => "erase",
            Tool::Fill => "fill",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "select" => Some(Tool::Select),
            "paint" => Some(Tool::Paint),
            "erase" => Some(Tool::Erase),
            "fill" => Some(Tool::Fill),
            _ => None,
        }
    }
}

/// State manager behind the editor panels.
pub struct EditorShell {
    assets: Vec<AssetInfo>,
    layers: Vec<LayerInfo>,
    objects: Vec<SceneObjectInfo>,
    selection: HashSet<ObjectId>,
    active_asset: Option<AssetId>,
    active_layer: Option<LayerId>,
    active_tool: Tool,
    grid_cell_size: u32,
    asset_filter: String,
    matcher: SkimMatcherV2,
}

impl EditorShell {
    pub fn new() -> Self {
        log::info!("Initializing editor shell");

        let mut shell = Self {
            assets: Vec::new(),
            layers: Vec::new(),
            objects: Vec::new(),
            selection: HashSet::new(),
            active_asset: None,
            active_layer: None,
            active_tool: Tool::default(),
            grid_cell_size: 32,
            asset_filter: String::new(),
            matcher: SkimMatcherV2::default(),
        };

        // Every level starts with one layer
        let background = shell.add_layer("Background".to_string());
        shell.set_active_layer(background).ok();

        shell
    }

    // Asset management

    pub fn add_asset(&mut self, asset: AssetInfo) -> AssetId {
        let id = asset.id;
        log::info!("Registered asset {:?}: {}", id, asset.name);
        self.assets.push(asset);
        id
    }

    pub fn asset(&self, id: AssetId) -> Option<&AssetInfo> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn remove_asset(&mut self, id: AssetId) -> TesseraResult<()> {
        let before = self.assets.len();
        self.assets.retain(|a| a.id != id);
        if self.assets.len() == before {
            return Err(TesseraError::NotFound(format!("asset {id:?}")));
        }
        if self.active_asset == Some(id) {
            self.active_asset = None;
        }
        log::info!("Removed asset {:?}", id);
        Ok(())
    }

    pub fn rename_asset(&mut self, id: AssetId, new_name: String) -> TesseraResult<()> {
        let asset = self
            .assets
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| TesseraError::NotFound(format!("asset {id:?}")))?;
        log::info!("Renaming asset {:?} from '{}' to '{new_name}'", id, asset.name);
        asset.name = new_name;
        Ok(())
    }

    /// Clone an asset under a new id, "<name> copy".
    pub fn duplicate_asset(&mut self, id: AssetId) -> TesseraResult<AssetId> {
        let original = self
            .asset(id)
            .ok_or_else(|| TesseraError::NotFound(format!("asset {id:?}")))?;
        let mut copy = original.clone();
        copy.id = AssetId::new();
        copy.name = format!("{} copy", copy.name);
        let new_id = copy.id;
        self.assets.push(copy);
        Ok(new_id)
    }

    pub fn list_assets(&self) -> &[AssetInfo] {
        &self.assets
    }

    pub fn active_asset(&self) -> Option<AssetId> {
        self.active_asset
    }

    pub fn set_active_asset(&mut self, id: Option<AssetId>) {
        self.active_asset = id;
    }

    pub fn set_asset_filter(&mut self, filter: String) {
        self.asset_filter = filter;
    }

    pub fn asset_filter(&self) -> &str {
        &self.asset_filter
    }

    /// Fuzzy-search assets by name, best matches first.
    pub fn search_assets(&self, query: &str) -> Vec<&AssetInfo> {
        let mut results: Vec<(i64, &AssetInfo)> = self
            .assets
            .iter()
            .filter_map(|asset| {
                self.matcher
                    .fuzzy_match(&asset.name, query)
                    .map(|score| (score, asset))
            })
            .collect();

        // Sort by score descending
        results.sort_by(|a, b| b.0.cmp(&a.0));

        results.into_iter().map(|(_, a)| a).take(20).collect()
    }

    /// Assets as the browser panel shows them: all of them, or the fuzzy
    /// matches for the current filter.
    pub fn visible_assets(&self) -> Vec<&AssetInfo> {
        if self.asset_filter.is_empty() {
            self.assets.iter().collect()
        } else {
            self.search_assets(&self.asset_filter)
        }
    }

    // Layer management

    pub fn add_layer(&mut self, name: String) -> LayerId {
        let id = LayerId::new();
        let order = self.layers.iter().map(|l| l.order + 1).max().unwrap_or(0);
        log::info!("Created layer {:?}: {}", id, name);
        self.layers.push(LayerInfo {
            id,
            name,
            visible: true,
            locked: false,
            order,
        });
        id
    }

    pub fn delete_layer(&mut self, id: LayerId) -> TesseraResult<()> {
        if self.layers.len() <= 1 {
            return Err(TesseraError::Layer(
                "Cannot delete the last layer".to_string(),
            ));
        }
        let index = self
            .layers
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| TesseraError::NotFound(format!("layer {id:?}")))?;
        let removed = self.layers.remove(index);
        log::info!("Deleted layer {:?}: {}", id, removed.name);

        // Objects on the deleted layer move to the first remaining layer.
        let fallback = self.layers[0].id;
        for object in self.objects.iter_mut().filter(|o| o.layer_id == id) {
            object.layer_id = fallback;
        }

        if self.active_layer == Some(id) {
            self.active_layer = Some(fallback);
        }
        Ok(())
    }

    pub fn rename_layer(&mut self, id: LayerId, new_name: String) -> TesseraResult<()> {
        let layer = self
            .layer_mut(id)
            .ok_or_else(|| TesseraError::NotFound(format!("layer {id:?}")))?;
        log::info!(
            "Renaming layer {:?} from '{}' to '{new_name}'",
            id,
            layer.name
        );
        layer.name = new_name;
        Ok(())
    }

    /// Flip a layer's visibility. Returns the new state.
    pub fn toggle_layer_visibility(&mut self, id: LayerId) -> TesseraResult<bool> {
        let layer = self
            .layer_mut(id)
            .ok_or_else(|| TesseraError::NotFound(format!("layer {id:?}")))?;
        layer.visible = !layer.visible;
        Ok(layer.visible)
    }

    /// Flip a layer's lock. Returns the new state.
    pub fn toggle_layer_lock(&mut self, id: LayerId) -> TesseraResult<bool> {
        let layer = self
            .layer_mut(id)
            .ok_or_else(|| TesseraError::NotFound(format!("layer {id:?}")))?;
        layer.locked = !layer.locked;
        Ok(layer.locked)
    }

    pub fn layer(&self, id: LayerId) -> Option<&LayerInfo> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn layer_mut(&mut self, id: LayerId) -> Option<&mut LayerInfo> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// Layers in draw order.
    pub fn list_layers(&self) -> Vec<&LayerInfo> {
        let mut layers: Vec<&LayerInfo> = self.layers.iter().collect();
        layers.sort_by_key(|l| l.order);
        layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn active_layer(&self) -> Option<LayerId> {
        self.active_layer
    }

    pub fn set_active_layer(&mut self, id: LayerId) -> TesseraResult<()> {
        if self.layer(id).is_none() {
            return Err(TesseraError::NotFound(format!("layer {id:?}")));
        }
        self.active_layer = Some(id);
        Ok(())
    }

    // Scene objects (outliner rows)

    pub fn add_object(&mut self, name: String, layer_id: LayerId) -> TesseraResult<ObjectId> {
        if self.layer(layer_id).is_none() {
            return Err(TesseraError::NotFound(format!("layer {layer_id:?}")));
        }
        let id = ObjectId::new();
        self.objects.push(SceneObjectInfo {
            id,
            name,
            layer_id,
        });
        Ok(id)
    }

    pub fn remove_object(&mut self, id: ObjectId) -> TesseraResult<()> {
        let before = self.objects.len();
        self.objects.retain(|o| o.id != id);
        if self.objects.len() == before {
            return Err(TesseraError::NotFound(format!("object {id:?}")));
        }
        self.selection.remove(&id);
        Ok(())
    }

    pub fn rename_object(&mut self, id: ObjectId, new_name: String) -> TesseraResult<()> {
        let object = self
            .objects
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| TesseraError::NotFound(format!("object {id:?}")))?;
        object.name = new_name;
        Ok(())
    }

    pub fn duplicate_object(&mut self, id: ObjectId) -> TesseraResult<ObjectId> {
        let original = self
            .object(id)
            .ok_or_else(|| TesseraError::NotFound(format!("object {id:?}")))?;
        let copy_name = format!("{} copy", original.name);
        let layer_id = original.layer_id;
        self.add_object(copy_name, layer_id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObjectInfo> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn list_objects(&self) -> &[SceneObjectInfo] {
        &self.objects
    }

    // Selection

    pub fn select_only(&mut self, id: ObjectId) {
        self.selection.clear();
        self.selection.insert(id);
    }

    pub fn toggle_selected(&mut self, id: ObjectId) {
        if !self.selection.remove(&id) {
            self.selection.insert(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.selection.contains(&id)
    }

    pub fn selection_count(&self) -> usize {
        self.selection.len()
    }

    /// Selected object ids in a stable order.
    pub fn selection(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.selection.iter().copied().collect();
        ids.sort_by_key(|id| id.0);
        ids
    }

    /// Delete every selected object.
    pub fn delete_selection(&mut self) -> usize {
        let doomed = self.selection();
        for id in &doomed {
            self.objects.retain(|o| o.id != *id);
        }
        self.selection.clear();
        log::info!("Deleted {} selected objects", doomed.len());
        doomed.len()
    }

    // Tool state

    pub fn active_tool(&self) -> Tool {
        self.active_tool
    }

    pub fn set_active_tool(&mut self, tool: Tool) {
        log::info!("Active tool: {}", tool.name());
        self.active_tool = tool;
    }

    pub fn grid_cell_size(&self) -> u32 {
        self.grid_cell_size
    }

    pub fn set_grid_cell_size(&mut self, size: u32) {
        log::info!("Grid cell size: {size}");
        self.grid_cell_size = size;
    }

    // Snapshots

    /// Capture layers and objects for persistence. Selection and tool state
    /// are session-local and not captured.
    pub fn snapshot(&self) -> ShellSnapshot {
        let layers = self
            .list_layers()
            .into_iter()
            .map(|layer| LayerSnapshot {
                name: layer.name.clone(),
                visible: layer.visible,
                locked: layer.locked,
                objects: self
                    .objects
                    .iter()
                    .filter(|o| o.layer_id == layer.id)
                    .map(|o| o.name.clone())
                    .collect(),
            })
            .collect();

        let active_layer_index = self
            .active_layer
            .and_then(|active| self.list_layers().iter().position(|l| l.id == active));

        ShellSnapshot {
            layers,
            active_layer_index,
        }
    }

    /// Replace layers and objects from a snapshot. Ids are reissued; an
    /// empty snapshot still leaves one layer standing.
    pub fn load_snapshot(&mut self, snapshot: ShellSnapshot) {
        self.layers.clear();
        self.objects.clear();
        self.selection.clear();
        self.active_layer = None;

        let mut layer_ids = Vec::new();
        for layer_snapshot in snapshot.layers {
            let id = self.add_layer(layer_snapshot.name);
            if let Some(layer) = self.layer_mut(id) {
                layer.visible = layer_snapshot.visible;
                layer.locked = layer_snapshot.locked;
            }
            for object_name in layer_snapshot.objects {
                self.add_object(object_name, id).ok();
            }
            layer_ids.push(id);
        }

        if self.layers.is_empty() {
            let background = self.add_layer("Background".to_string());
            layer_ids.push(background);
        }

        let active = snapshot
            .active_layer_index
            .and_then(|i| layer_ids.get(i).copied())
            .or_else(|| layer_ids.first().copied());
        self.active_layer = active;
    }
}

/// Persisted form of one layer and its objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    pub objects: Vec<String>,
}

/// Persisted form of the shell's level state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellSnapshot {
    pub layers: Vec<LayerSnapshot>,
    pub active_layer_index: Option<usize>,
}

impl Default for EditorShell {
    fn default() -> Self {
        Self::new()
    }
}
