//! Host collaborator boundary.
//!
//! The cloaking engine never touches a render tree directly. Everything it
//! needs from the outside world goes through three traits:
//!
//! - [`GeometryProvider`]: measurement of item slots and the viewport
//! - [`EventSource`]: subscription to scroll/resize/content signals
//! - [`Host`]: slot creation, mounting and placeholder styling
//!
//! A single host object implements all three, mirroring a document that both
//! measures and renders. [`crate::sim::StripLayout`] is the in-memory host used
//! by the CLI and the tests.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::model::ItemKey;

/// Read-only geometry queries.
///
/// All values are in the host's horizontal units (CSS pixels for a document).
/// Offsets are relative to the strip's content origin.
pub trait GeometryProvider {
    /// Left offset of the item slot.
    fn left_offset(&self, key: ItemKey) -> f64;

    /// Current rendered width of the item slot.
    fn width(&self, key: ItemKey) -> f64;

    /// Horizontal scroll offset of the viewport.
    fn scroll_offset(&self) -> f64;

    /// Width of the visible viewport.
    fn viewport_width(&self) -> f64;

    /// Width of the scrollable body; bounds the viewport's right edge.
    fn body_width(&self) -> f64;

    /// Correction added to every item offset when the strip scrolls inside a
    /// wrapper rather than the whole window.
    fn scroll_correction(&self) -> f64 {
        0.0
    }

    /// Outer width of a fixed-position element occluding the left of the
    /// viewport, looked up by selector.
    fn fixed_element_width(&self, _selector: &str) -> Option<f64> {
        None
    }
}

/// Raw signal kinds that can trigger a recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Viewport or wrapper scrolled.
    Scroll,
    /// Touch drag in progress.
    TouchMove,
    /// Viewport resized.
    Resize,
    /// Wrapper offset or width changed.
    WrapperGeometry,
    /// Backing content changed outside the strip's own mutation methods.
    ContentChanged,
}

impl SignalKind {
    /// Every signal a strip subscribes to on attach.
    pub const ALL: [SignalKind; 5] = [
        SignalKind::Scroll,
        SignalKind::TouchMove,
        SignalKind::Resize,
        SignalKind::WrapperGeometry,
        SignalKind::ContentChanged,
    ];
}

/// Handle returned by [`EventSource::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Registration point for raw signals.
pub trait EventSource {
    /// Register interest in a signal kind.
    fn subscribe(&mut self, kind: SignalKind) -> SubscriptionId;

    /// Drop a registration made by [`EventSource::subscribe`].
    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// What an uncloaked item renders.
#[derive(Debug)]
pub enum RenderTarget<T, C> {
    /// The raw content.
    Content(Rc<T>),
    /// A per-item controller wrapping the content.
    Controller(C),
}

/// How the render target is bound to the mounted view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetBinding {
    /// Bound as the view's `content`; the surrounding context is preserved.
    Content,
    /// Bound as the view's `context`.
    Context,
}

/// Everything the host needs to mount an item's view.
#[derive(Debug)]
pub struct MountRequest<'a, T, C> {
    /// Slot being mounted.
    pub key: ItemKey,
    /// Identifier of the view to instantiate.
    pub view: &'a str,
    /// Element id of the slot, if one was derived.
    pub element_id: Option<&'a str>,
    /// What the view renders.
    pub target: RenderTarget<T, C>,
    /// How the target is bound.
    pub binding: TargetBinding,
}

/// Full host collaborator: geometry, events, slots and mounts.
pub trait Host<T>: GeometryProvider + EventSource {
    /// Per-item controller type produced by the host.
    type Controller;

    /// Opaque handle for a mounted view.
    type Handle;

    /// Create the slot element for a new item at `index`.
    fn insert_slot(&mut self, key: ItemKey, index: usize, element_id: Option<&str>);

    /// Remove an item's slot element.
    fn remove_slot(&mut self, key: ItemKey);

    /// Create consecutive slots starting at `index`, in order.
    fn insert_slots(&mut self, index: usize, slots: &[(ItemKey, Option<&str>)]) {
        for (offset, (key, element_id)) in slots.iter().enumerate() {
            self.insert_slot(*key, index + offset, *element_id);
        }
    }

    /// Remove several slots at once.
    fn remove_slots(&mut self, keys: &[ItemKey]) {
        for &key in keys {
            self.remove_slot(key);
        }
    }

    /// Whether the slot is currently attached to the document.
    fn is_in_document(&self, key: ItemKey) -> bool;

    /// Mount the item's view into its slot.
    fn mount(&mut self, request: MountRequest<'_, T, Self::Controller>) -> Self::Handle;

    /// Release a mounted view.
    fn unmount(&mut self, handle: Self::Handle);

    /// Fix the slot's width (`Some`) or let it size to its content (`None`).
    fn set_placeholder_width(&mut self, key: ItemKey, width: Option<f64>);

    /// Render the loading markup into an empty slot.
    fn show_loading(&mut self, key: ItemKey, markup: &str);

    /// Remove loading markup previously rendered with [`Self::show_loading`].
    fn clear_loading(&mut self, key: ItemKey);

    /// Look up a registered controller by name.
    fn lookup_controller(&mut self, name: &str, content: &Rc<T>) -> Option<Self::Controller>;

    /// Generate a default controller when lookup fails.
    fn generate_controller(&mut self, name: &str, content: &Rc<T>) -> Self::Controller;
}
