//! Layer Stack
//!
//! Z-ordered rendering layers owned by the navigator. Screens (and the HUD)
//! live on the screen layer; the modal blocker and popups live on the popup
//! layer above it. The stack only orders and toggles layers; what is drawn on
//! each layer comes from the handlers.

use std::collections::HashMap;

use tracing::trace;

use crate::animation::ViewSurface;
use crate::ids::{PopupId, ScreenId};

/// z-index of the screen layer
pub const SCREEN_LAYER_Z: i32 = 0;

/// z-index of the popup layer
pub const POPUP_LAYER_Z: i32 = 100;

/// Unique identifier for a layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(u32);

/// A named, z-ordered layer
#[derive(Clone, Debug)]
pub struct Layer {
    /// Layer identifier
    pub id: LayerId,
    /// Name for diagnostics
    pub name: String,
    /// Z-order (higher = on top)
    pub z_index: i32,
    /// Whether anything on this layer is rendered
    pub visible: bool,
}

/// All layers, kept sorted back-to-front
#[derive(Debug, Default)]
pub struct LayerStack {
    layers: HashMap<LayerId, Layer>,
    render_order: Vec<LayerId>,
    next_id: u32,
}

impl LayerStack {
    /// Create an empty stack
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new layer and return its ID
    pub fn create_layer(&mut self, name: impl Into<String>, z_index: i32) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;

        self.layers.insert(
            id,
            Layer {
                id,
                name: name.into(),
                z_index,
                visible: true,
            },
        );
        self.update_render_order();
        id
    }

    /// Set layer visibility
    pub fn set_visible(&mut self, id: LayerId, visible: bool) {
        if let Some(layer) = self.layers.get_mut(&id) {
            if layer.visible != visible {
                trace!(layer = %layer.name, visible, "layer visibility changed");
            }
            layer.visible = visible;
        }
    }

    /// Visible layers, back to front
    pub fn visible_back_to_front(&self) -> impl Iterator<Item = &Layer> {
        self.render_order
            .iter()
            .filter_map(|id| self.layers.get(id))
            .filter(|layer| layer.visible)
    }

    /// Number of layers
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the stack has no layers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn update_render_order(&mut self) {
        self.render_order = self.layers.keys().copied().collect();
        self.render_order.sort_by_key(|id| {
            (
                self.layers.get(id).map_or(0, |l| l.z_index),
                id.0,
            )
        });
    }
}

/// What a render entry shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderedView {
    /// The HUD overlay
    Hud(ScreenId),
    /// A screen
    Screen(ScreenId),
    /// The modal blocker beneath popups
    Blocker,
    /// A popup
    Popup(PopupId),
}

/// One active view, as a renderer should draw it
#[derive(Clone, Debug, PartialEq)]
pub struct RenderEntry {
    /// Layer the view lives on
    pub layer: LayerId,
    /// The view
    pub view: RenderedView,
    /// Its current visibility state
    pub surface: ViewSurface,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_order_follows_z_index() {
        let mut stack = LayerStack::new();
        let popups = stack.create_layer("popups", POPUP_LAYER_Z);
        let screens = stack.create_layer("screens", SCREEN_LAYER_Z);

        let overlay = stack.create_layer("overlay", POPUP_LAYER_Z);

        let order: Vec<_> = stack.visible_back_to_front().map(|l| l.id).collect();
        assert_eq!(order, vec![screens, popups, overlay]);

        let names: Vec<_> = stack.visible_back_to_front().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["screens", "popups", "overlay"]);
    }

    #[test]
    fn test_hidden_layers_are_skipped() {
        let mut stack = LayerStack::new();
        let screens = stack.create_layer("screens", SCREEN_LAYER_Z);
        let popups = stack.create_layer("popups", POPUP_LAYER_Z);

        stack.set_visible(popups, false);
        let order: Vec<_> = stack.visible_back_to_front().map(|l| l.id).collect();
        assert_eq!(order, vec![screens]);
        assert_eq!(stack.len(), 2);
    }
}
