//! Common types used throughout Tessera

use serde::{Deserialize, Serialize};
use url::Url;

/// Unique identifier for a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanelId(pub u64);

/// Unique identifier for an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub u64);

/// Unique identifier for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub u64);

/// Unique identifier for a scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// What kind of asset an entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    Sprite,
    Tileset,
    Audio,
    Prefab,
}

impl AssetKind {
    /// The `data-kind` attribute value panels render for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            AssetKind::Sprite => "sprite",
            AssetKind::Tileset => "tileset",
            AssetKind::Audio => "audio",
            AssetKind::Prefab => "prefab",
        }
    }
}

/// Asset browser entry metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetInfo {
    pub id: AssetId,
    pub name: String,
    pub kind: AssetKind,
    /// Where the asset was imported from, when known.
    pub source: Option<Url>,
    pub tags: Vec<String>,
}

/// Layer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerInfo {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    /// Draw order; lower renders first.
    pub order: u32,
}

/// Outliner row metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObjectInfo {
    pub id: ObjectId,
    pub name: String,
    pub layer_id: LayerId,
}

impl PanelId {
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl AssetId {
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl LayerId {
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl ObjectId {
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for PanelId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}
