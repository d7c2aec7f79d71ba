//! In-memory host: a horizontal strip of slots laid out side by side.
//!
//! `StripLayout` plays the part of the document. Slots are placed
//! contiguously from offset 0; a slot's width is its placeholder width when
//! one is pinned, otherwise the measured width of its mounted content, and 0
//! when it is empty. Every host call is appended to an operation log so tests
//! can assert on ordering.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::host::{
    EventSource, GeometryProvider, Host, MountRequest, RenderTarget, SignalKind, SubscriptionId,
    TargetBinding,
};
use crate::model::ItemKey;

use super::width_index::WidthIndex;

/// Handle for a view mounted into a [`StripLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MountHandle(u64);

/// Controller created by a [`StripLayout`] for per-item controller names.
#[derive(Debug)]
pub struct SimController<T> {
    /// Controller name.
    pub name: String,
    /// `true` if generated as a fallback rather than looked up.
    pub generated: bool,
    /// The wrapped content.
    pub model: Rc<T>,
}

/// One host operation, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    /// A slot was created.
    InsertSlot(ItemKey),
    /// A slot was removed.
    RemoveSlot(ItemKey),
    /// A view was mounted into a slot.
    Mount(ItemKey),
    /// A view was released.
    Unmount(ItemKey),
    /// A slot's placeholder width was pinned or cleared.
    Placeholder(ItemKey, Option<usize>),
    /// Loading markup was rendered into a slot.
    Loading(ItemKey),
    /// Loading markup was removed from a slot.
    ClearLoading(ItemKey),
    /// A signal subscription was registered.
    Subscribe(SignalKind),
    /// A signal subscription was dropped.
    Unsubscribe(SignalKind),
}

/// What was mounted, for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct MountRecord {
    /// Slot the view was mounted into.
    pub key: ItemKey,
    /// View identifier.
    pub view: String,
    /// Element id passed along with the mount.
    pub element_id: Option<String>,
    /// How the target was bound.
    pub binding: TargetBinding,
    /// Controller name and whether it was generated, if a controller was used.
    pub controller: Option<(String, bool)>,
}

#[derive(Debug, Clone)]
struct Slot {
    key: ItemKey,
    element_id: Option<String>,
    placeholder: Option<usize>,
    mounted: Option<(MountHandle, usize)>,
    loading: Option<String>,
}

impl Slot {
    fn width(&self) -> usize {
        self.placeholder
            .or(self.mounted.map(|(_, width)| width))
            .unwrap_or(0)
    }
}

/// In-memory [`Host`] implementation.
pub struct StripLayout<T> {
    slots: Vec<Slot>,
    positions: HashMap<ItemKey, usize>,
    index: WidthIndex,
    scroll_offset: f64,
    viewport_width: f64,
    scroll_correction: f64,
    fixed_elements: HashMap<String, f64>,
    controllers: HashSet<String>,
    measure: Box<dyn Fn(&T) -> usize>,
    mounts: HashMap<MountHandle, MountRecord>,
    next_handle: u64,
    subscriptions: HashMap<SubscriptionId, SignalKind>,
    next_subscription: u64,
    ops: Vec<HostOp>,
}

impl<T> std::fmt::Debug for StripLayout<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripLayout")
            .field("slots", &self.slots.len())
            .field("scroll_offset", &self.scroll_offset)
            .field("viewport_width", &self.viewport_width)
            .field("total_width", &self.index.total())
            .field("live_mounts", &self.mounts.len())
            .finish()
    }
}

impl<T> StripLayout<T> {
    /// Empty strip; `measure` gives the rendered width of mounted content.
    pub fn new(viewport_width: f64, measure: impl Fn(&T) -> usize + 'static) -> Self {
        Self {
            slots: Vec::new(),
            positions: HashMap::new(),
            index: WidthIndex::new(64),
            scroll_offset: 0.0,
            viewport_width,
            scroll_correction: 0.0,
            fixed_elements: HashMap::new(),
            controllers: HashSet::new(),
            measure: Box::new(measure),
            mounts: HashMap::new(),
            next_handle: 0,
            subscriptions: HashMap::new(),
            next_subscription: 0,
            ops: Vec::new(),
        }
    }

    /// Scroll the viewport to `offset`.
    pub fn set_scroll_offset(&mut self, offset: f64) {
        self.scroll_offset = offset.max(0.0);
    }

    /// Resize the viewport.
    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width.max(0.0);
    }

    /// Set the wrapper scroll correction added to every slot offset.
    pub fn set_scroll_correction(&mut self, correction: f64) {
        self.scroll_correction = correction;
    }

    /// Declare a fixed element and its outer width.
    pub fn set_fixed_element(&mut self, selector: impl Into<String>, width: f64) {
        self.fixed_elements.insert(selector.into(), width);
    }

    /// Make a controller name resolvable.
    pub fn register_controller(&mut self, name: impl Into<String>) {
        self.controllers.insert(name.into());
    }

    /// Operation log.
    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Take the operation log, leaving it empty.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of mounted views not yet released, including ones whose slot
    /// has since been remounted or removed.
    pub fn live_mounts(&self) -> usize {
        self.mounts.len()
    }

    /// Whether the slot currently shows a mounted view.
    pub fn is_mounted(&self, key: ItemKey) -> bool {
        self.slot(key).is_some_and(|slot| slot.mounted.is_some())
    }

    /// Pinned placeholder width of a slot.
    pub fn placeholder(&self, key: ItemKey) -> Option<usize> {
        self.slot(key).and_then(|slot| slot.placeholder)
    }

    /// Loading markup rendered in a slot, if any.
    pub fn loading_markup(&self, key: ItemKey) -> Option<&str> {
        self.slot(key).and_then(|slot| slot.loading.as_deref())
    }

    /// Element id of a slot.
    pub fn element_id(&self, key: ItemKey) -> Option<&str> {
        self.slot(key).and_then(|slot| slot.element_id.as_deref())
    }

    /// Record of the view currently mounted in a slot.
    pub fn mount_record(&self, key: ItemKey) -> Option<&MountRecord> {
        let (handle, _) = self.slot(key)?.mounted?;
        self.mounts.get(&handle)
    }

    /// Whether some subscription for `kind` is registered.
    pub fn is_subscribed(&self, kind: SignalKind) -> bool {
        self.subscriptions.values().any(|k| *k == kind)
    }

    /// Number of registered subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Total width of all slots.
    pub fn total_width(&self) -> f64 {
        self.index.total() as f64
    }

    fn slot(&self, key: ItemKey) -> Option<&Slot> {
        self.positions.get(&key).map(|&pos| &self.slots[pos])
    }

    fn slot_mut(&mut self, key: ItemKey) -> Option<(usize, &mut Slot)> {
        let pos = *self.positions.get(&key)?;
        Some((pos, &mut self.slots[pos]))
    }

    fn refresh_width(&mut self, pos: usize) {
        let width = self.slots[pos].width();
        self.index.set(pos, width);
    }

    fn relayout(&mut self) {
        self.positions = self
            .slots
            .iter()
            .enumerate()
            .map(|(pos, slot)| (slot.key, pos))
            .collect();
        self.index.rebuild(self.slots.iter().map(Slot::width));
    }
}

impl StripLayout<serde_json::Value> {
    /// Strip of JSON items whose rendered width is their `width` field
    /// (100 when absent).
    pub fn for_json(viewport_width: f64) -> Self {
        Self::new(viewport_width, |value: &serde_json::Value| {
            value
                .get("width")
                .and_then(serde_json::Value::as_u64)
                .map(|w| w as usize)
                .unwrap_or(100)
        })
    }
}

impl<T> GeometryProvider for StripLayout<T> {
    fn left_offset(&self, key: ItemKey) -> f64 {
        self.positions
            .get(&key)
            .map(|&pos| self.index.offset(pos) as f64)
            .unwrap_or(0.0)
    }

    fn width(&self, key: ItemKey) -> f64 {
        self.slot(key).map(|slot| slot.width() as f64).unwrap_or(0.0)
    }

    fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    fn body_width(&self) -> f64 {
        self.total_width().max(self.viewport_width)
    }

    fn scroll_correction(&self) -> f64 {
        self.scroll_correction
    }

    fn fixed_element_width(&self, selector: &str) -> Option<f64> {
        self.fixed_elements.get(selector).copied()
    }
}

impl<T> EventSource for StripLayout<T> {
    fn subscribe(&mut self, kind: SignalKind) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.insert(id, kind);
        self.ops.push(HostOp::Subscribe(kind));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        if let Some(kind) = self.subscriptions.remove(&id) {
            self.ops.push(HostOp::Unsubscribe(kind));
        }
    }
}

impl<T> Host<T> for StripLayout<T> {
    type Controller = SimController<T>;
    type Handle = MountHandle;

    fn insert_slot(&mut self, key: ItemKey, index: usize, element_id: Option<&str>) {
        self.insert_slots(index, &[(key, element_id)]);
    }

    fn remove_slot(&mut self, key: ItemKey) {
        self.remove_slots(&[key]);
    }

    fn insert_slots(&mut self, index: usize, slots: &[(ItemKey, Option<&str>)]) {
        if slots.is_empty() {
            return;
        }

        let index = index.min(self.slots.len());
        let appending = index == self.slots.len();
        let new_slots = slots.iter().map(|(key, element_id)| Slot {
            key: *key,
            element_id: element_id.map(str::to_string),
            placeholder: None,
            mounted: None,
            loading: None,
        });
        self.slots.splice(index..index, new_slots);

        if appending {
            // appended slots start empty; no existing offset moves
            for (pos, (key, _)) in slots.iter().enumerate() {
                self.positions.insert(*key, index + pos);
                self.index.push(0);
            }
        } else {
            self.relayout();
        }
        self.ops.extend(slots.iter().map(|(key, _)| HostOp::InsertSlot(*key)));
    }

    fn remove_slots(&mut self, keys: &[ItemKey]) {
        let removed: HashSet<ItemKey> = keys
            .iter()
            .copied()
            .filter(|key| self.positions.contains_key(key))
            .collect();
        if removed.is_empty() {
            return;
        }

        self.slots.retain(|slot| !removed.contains(&slot.key));
        self.relayout();
        self.ops.extend(
            keys.iter()
                .filter(|key| removed.contains(key))
                .map(|key| HostOp::RemoveSlot(*key)),
        );
    }

    fn is_in_document(&self, key: ItemKey) -> bool {
        self.positions.contains_key(&key)
    }

    fn mount(&mut self, request: MountRequest<'_, T, SimController<T>>) -> MountHandle {
        let (width, controller) = match &request.target {
            RenderTarget::Content(content) => ((self.measure)(content.as_ref()), None),
            RenderTarget::Controller(c) => (
                (self.measure)(c.model.as_ref()),
                Some((c.name.clone(), c.generated)),
            ),
        };

        let handle = MountHandle(self.next_handle);
        self.next_handle += 1;
        self.mounts.insert(
            handle,
            MountRecord {
                key: request.key,
                view: request.view.to_string(),
                element_id: request.element_id.map(str::to_string),
                binding: request.binding,
                controller,
            },
        );

        if let Some((pos, slot)) = self.slot_mut(request.key) {
            slot.mounted = Some((handle, width));
            slot.loading = None;
            self.refresh_width(pos);
        }
        self.ops.push(HostOp::Mount(request.key));
        handle
    }

    fn unmount(&mut self, handle: MountHandle) {
        let Some(record) = self.mounts.remove(&handle) else {
            return;
        };

        if let Some((pos, slot)) = self.slot_mut(record.key) {
            if slot.mounted.is_some_and(|(current, _)| current == handle) {
                slot.mounted = None;
                self.refresh_width(pos);
            }
        }
        self.ops.push(HostOp::Unmount(record.key));
    }

    fn set_placeholder_width(&mut self, key: ItemKey, width: Option<f64>) {
        let pinned = width.map(|w| w.round().max(0.0) as usize);
        if let Some((pos, slot)) = self.slot_mut(key) {
            slot.placeholder = pinned;
            self.refresh_width(pos);
        }
        self.ops.push(HostOp::Placeholder(key, pinned));
    }

    fn show_loading(&mut self, key: ItemKey, markup: &str) {
        if let Some((_, slot)) = self.slot_mut(key) {
            slot.loading = Some(markup.to_string());
        }
        self.ops.push(HostOp::Loading(key));
    }

    fn clear_loading(&mut self, key: ItemKey) {
        if let Some((_, slot)) = self.slot_mut(key) {
            slot.loading = None;
        }
        self.ops.push(HostOp::ClearLoading(key));
    }

    fn lookup_controller(&mut self, name: &str, content: &Rc<T>) -> Option<SimController<T>> {
        self.controllers.contains(name).then(|| SimController {
            name: name.to_string(),
            generated: false,
            model: Rc::clone(content),
        })
    }

    fn generate_controller(&mut self, name: &str, content: &Rc<T>) -> SimController<T> {
        SimController {
            name: name.to_string(),
            generated: true,
            model: Rc::clone(content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(n: u64) -> StripLayout<usize> {
        let mut layout = StripLayout::new(250.0, |w: &usize| *w);
        for i in 0..n {
            layout.insert_slot(ItemKey::new(i), i as usize, None);
        }
        layout
    }

    fn mount(layout: &mut StripLayout<usize>, key: u64, width: usize) -> MountHandle {
        layout.mount(MountRequest {
            key: ItemKey::new(key),
            view: "item",
            element_id: None,
            target: RenderTarget::Content(Rc::new(width)),
            binding: TargetBinding::Context,
        })
    }

    #[test]
    fn empty_slots_have_zero_width() {
        let layout = strip(3);
        assert_eq!(layout.width(ItemKey::new(1)), 0.0);
        assert_eq!(layout.total_width(), 0.0);
        assert_eq!(layout.body_width(), 250.0);
    }

    #[test]
    fn placeholders_and_mounts_drive_offsets() {
        let mut layout = strip(3);
        layout.set_placeholder_width(ItemKey::new(0), Some(100.0));
        mount(&mut layout, 1, 40);
        layout.set_placeholder_width(ItemKey::new(2), Some(60.4));

        assert_eq!(layout.left_offset(ItemKey::new(1)), 100.0);
        assert_eq!(layout.left_offset(ItemKey::new(2)), 140.0);
        assert_eq!(layout.width(ItemKey::new(2)), 60.0);
        assert_eq!(layout.total_width(), 200.0);
    }

    #[test]
    fn placeholder_overrides_mounted_width() {
        let mut layout = strip(1);
        mount(&mut layout, 0, 40);
        layout.set_placeholder_width(ItemKey::new(0), Some(40.0));
        let handle = layout.slot(ItemKey::new(0)).unwrap().mounted.unwrap().0;

        layout.unmount(handle);

        assert!(!layout.is_mounted(ItemKey::new(0)));
        assert_eq!(layout.width(ItemKey::new(0)), 40.0);
        assert_eq!(layout.live_mounts(), 0);
    }

    #[test]
    fn stale_unmount_does_not_clear_newer_mount() {
        let mut layout = strip(1);
        let old = mount(&mut layout, 0, 40);
        let _new = mount(&mut layout, 0, 40);

        layout.unmount(old);

        assert!(layout.is_mounted(ItemKey::new(0)));
        assert_eq!(layout.live_mounts(), 1);
    }

    #[test]
    fn insert_in_the_middle_shifts_later_slots() {
        let mut layout = strip(2);
        layout.set_placeholder_width(ItemKey::new(0), Some(100.0));
        layout.set_placeholder_width(ItemKey::new(1), Some(100.0));

        layout.insert_slot(ItemKey::new(9), 1, Some("item-cloak-9"));
        layout.set_placeholder_width(ItemKey::new(9), Some(50.0));

        assert_eq!(layout.left_offset(ItemKey::new(9)), 100.0);
        assert_eq!(layout.left_offset(ItemKey::new(1)), 150.0);
        assert_eq!(layout.element_id(ItemKey::new(9)), Some("item-cloak-9"));

        layout.remove_slot(ItemKey::new(0));
        assert_eq!(layout.left_offset(ItemKey::new(9)), 0.0);
        assert!(!layout.is_in_document(ItemKey::new(0)));
    }

    #[test]
    fn batched_insert_places_slots_in_order() {
        let mut layout = strip(2);
        layout.set_placeholder_width(ItemKey::new(0), Some(100.0));
        layout.set_placeholder_width(ItemKey::new(1), Some(100.0));
        layout.take_ops();

        layout.insert_slots(1, &[(ItemKey::new(7), None), (ItemKey::new(8), Some("b"))]);
        layout.set_placeholder_width(ItemKey::new(7), Some(30.0));

        assert_eq!(layout.slot_count(), 4);
        assert_eq!(layout.left_offset(ItemKey::new(8)), 130.0);
        assert_eq!(layout.left_offset(ItemKey::new(1)), 130.0);
        assert_eq!(layout.element_id(ItemKey::new(8)), Some("b"));
        assert_eq!(
            &layout.ops()[..2],
            &[
                HostOp::InsertSlot(ItemKey::new(7)),
                HostOp::InsertSlot(ItemKey::new(8))
            ]
        );
    }

    #[test]
    fn appending_many_slots_keeps_offsets() {
        let mut layout = strip(0);
        let slots: Vec<_> = (0..200).map(|i| (ItemKey::new(i), None)).collect();
        layout.insert_slots(0, &slots);
        for i in 0..200 {
            layout.set_placeholder_width(ItemKey::new(i), Some(10.0));
        }

        assert_eq!(layout.left_offset(ItemKey::new(150)), 1500.0);
        assert_eq!(layout.total_width(), 2000.0);
    }

    #[test]
    fn batched_remove_skips_unknown_keys() {
        let mut layout = strip(4);
        for i in 0..4 {
            layout.set_placeholder_width(ItemKey::new(i), Some(50.0));
        }
        layout.take_ops();

        layout.remove_slots(&[ItemKey::new(1), ItemKey::new(42), ItemKey::new(2)]);

        assert_eq!(layout.slot_count(), 2);
        assert_eq!(layout.left_offset(ItemKey::new(3)), 50.0);
        assert_eq!(
            layout.ops(),
            &[
                HostOp::RemoveSlot(ItemKey::new(1)),
                HostOp::RemoveSlot(ItemKey::new(2))
            ]
        );
    }

    #[test]
    fn clearing_loading_removes_markup() {
        let mut layout = strip(1);
        layout.show_loading(ItemKey::new(0), "Loading...");
        assert_eq!(layout.loading_markup(ItemKey::new(0)), Some("Loading..."));

        layout.clear_loading(ItemKey::new(0));
        assert_eq!(layout.loading_markup(ItemKey::new(0)), None);
    }

    #[test]
    fn controller_lookup_only_finds_registered_names() {
        let mut layout = strip(0);
        layout.register_controller("known");
        let content = Rc::new(5usize);

        assert!(layout.lookup_controller("known", &content).is_some());
        assert!(layout.lookup_controller("foo", &content).is_none());
        assert!(layout.generate_controller("foo", &content).generated);
    }

    #[test]
    fn subscriptions_are_tracked() {
        let mut layout = strip(0);
        let id = layout.subscribe(SignalKind::Scroll);
        assert!(layout.is_subscribed(SignalKind::Scroll));

        layout.unsubscribe(id);
        assert!(!layout.is_subscribed(SignalKind::Scroll));
        assert_eq!(
            layout.ops(),
            &[
                HostOp::Subscribe(SignalKind::Scroll),
                HostOp::Unsubscribe(SignalKind::Scroll)
            ]
        );
    }

    #[test]
    fn json_strip_measures_width_field() {
        let mut layout = StripLayout::for_json(300.0);
        layout.insert_slot(ItemKey::new(0), 0, None);
        layout.mount(MountRequest {
            key: ItemKey::new(0),
            view: "item",
            element_id: None,
            target: RenderTarget::Content(Rc::new(serde_json::json!({"width": 180}))),
            binding: TargetBinding::Content,
        });
        assert_eq!(layout.width(ItemKey::new(0)), 180.0);
    }
}
