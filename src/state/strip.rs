//! The cloaked strip: owns the item sequence and drives every pass.
//!
//! A [`CloakedStrip`] ties the pieces together:
//!
//! - raw signals from the host go through the [`ScrollCoalescer`]
//! - a settled burst schedules one recompute on the [`RenderQueue`]
//! - a recompute resolves the viewport, classifies the items, publishes a
//!   [`VisibilityReport`] and queues the uncloak/cloak batch
//! - [`CloakedStrip::settle`] flushes the queue at the render-settling point
//!
//! Nothing here blocks or spawns. The host's event loop feeds signals with
//! timestamps, polls [`CloakedStrip::tick`] when [`CloakedStrip::next_deadline`]
//! passes, and calls `settle` after rendering.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, trace};

use crate::config::CloakConfig;
use crate::host::{Host, SignalKind, SubscriptionId};
use crate::model::{CloakContent, Diagnostic, Item, ItemKey, KeyAllocator};
use crate::view_state::{
    classify, BoundaryChanges, Classification, ItemSpan, Viewport, VisibilityObserver,
    VisibilityReport, VisibilityTracker,
};

use super::coalescer::ScrollCoalescer;
use super::lifecycle;
use super::render_queue::{RenderQueue, Task};

/// Viewport-driven cloaking engine over a horizontal sequence of items.
pub struct CloakedStrip<T: 'static, H: Host<T>> {
    config: CloakConfig,
    host: H,
    items: Vec<Item<T, H::Handle>>,
    positions: HashMap<ItemKey, usize>,
    keys: KeyAllocator,
    queue: RenderQueue<T, H::Handle>,
    coalescer: ScrollCoalescer,
    tracker: VisibilityTracker<T>,
    observer: Option<Box<dyn VisibilityObserver<T>>>,
    subscriptions: Vec<(SignalKind, SubscriptionId)>,
    passes: usize,
    diagnostics: Vec<Diagnostic>,
    last_classification: Option<Classification>,
    loading_key: Option<ItemKey>,
}

impl<T, H> CloakedStrip<T, H>
where
    T: CloakContent + 'static,
    H: Host<T>,
{
    /// Detached, empty strip rendering into `host`.
    pub fn new(host: H, config: CloakConfig) -> Self {
        let coalescer = ScrollCoalescer::new(config.debounce);
        Self {
            config,
            host,
            items: Vec::new(),
            positions: HashMap::new(),
            keys: KeyAllocator::new(),
            queue: RenderQueue::new(),
            coalescer,
            tracker: VisibilityTracker::new(),
            observer: None,
            subscriptions: Vec::new(),
            passes: 0,
            diagnostics: Vec::new(),
            last_classification: None,
            loading_key: None,
        }
    }

    /// Install the observer that receives visibility hooks.
    pub fn set_observer(&mut self, observer: impl VisibilityObserver<T> + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Subscribe to every signal kind, enable scrolling and schedule a pass.
    ///
    /// Attaching twice is a no-op.
    pub fn attach(&mut self) {
        if self.is_attached() {
            return;
        }

        for kind in SignalKind::ALL {
            let id = self.host.subscribe(kind);
            self.subscriptions.push((kind, id));
        }
        self.coalescer.enable();
        self.scroll_triggered();
        debug!(items = self.items.len(), "attached");
    }

    /// Drop every subscription and disable scrolling.
    ///
    /// Pending debounced and queued work becomes a no-op, except releasing
    /// mounts that were already detached from their items.
    pub fn detach(&mut self) {
        for (_, id) in self.subscriptions.drain(..) {
            self.host.unsubscribe(id);
        }
        self.coalescer.disable();
        debug!("detached");
    }

    /// Whether the strip is attached and scrolling is enabled.
    pub fn is_attached(&self) -> bool {
        self.coalescer.is_enabled()
    }

    /// Feed a raw signal observed at `now`.
    ///
    /// Returns `false` if the strip is not subscribed to `kind`.
    pub fn signal(&mut self, kind: SignalKind, now: Instant) -> bool {
        if !self.subscriptions.iter().any(|(k, _)| *k == kind) {
            return false;
        }
        self.coalescer.signal(now)
    }

    /// When the pending burst of signals settles.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.coalescer.next_deadline()
    }

    /// Advance the debounce clock to `now`.
    ///
    /// Returns `true` if a burst settled and a recompute was scheduled; it
    /// runs on the next [`Self::settle`].
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.coalescer.poll(now) {
            return false;
        }
        self.scroll_triggered();
        true
    }

    /// Schedule a recompute for the next render-settling point.
    ///
    /// Returns `false` if one is already pending.
    pub fn scroll_triggered(&mut self) -> bool {
        self.queue.schedule_recompute()
    }

    /// Flush the render queue. Returns the number of tasks taken.
    ///
    /// Tasks scheduled while flushing (the batch queued by a recompute, the
    /// unmounts queued by cloaks) run in the same flush.
    pub fn settle(&mut self) -> usize {
        let mut taken = 0;

        while let Some(task) = self.queue.pop() {
            taken += 1;
            let enabled = self.coalescer.is_enabled();

            match task {
                Task::Recompute if enabled => self.recompute(),
                Task::SawObjects(objects) if enabled => {
                    if let Some(observer) = self.observer.as_deref_mut() {
                        observer.saw_objects(&objects);
                    }
                }
                Task::Uncloak(key) if enabled => {
                    if let Some(&pos) = self.positions.get(&key) {
                        lifecycle::uncloak(
                            &mut self.items[pos],
                            &mut self.host,
                            &self.config,
                            &mut self.diagnostics,
                        );
                    }
                }
                Task::Cloak(key) if enabled => {
                    if let Some(&pos) = self.positions.get(&key) {
                        lifecycle::cloak(
                            &mut self.items[pos],
                            &mut self.host,
                            &mut self.queue,
                            self.config.default_width,
                        );
                    }
                }
                Task::Unmount { key, handle } => {
                    trace!(%key, "releasing mount");
                    self.host.unmount(handle);
                }
                skipped => trace!(task = ?TaskKind::of(&skipped), "skipped while detached"),
            }
        }

        taken
    }

    /// Run one classification pass right now.
    ///
    /// Publishes the visibility report and queues the resulting batch: the
    /// on-screen set for `saw_objects`, then every uncloak, then every cloak.
    /// Does nothing while detached.
    pub fn recompute(&mut self) {
        if !self.is_attached() {
            trace!("recompute skipped while detached");
            return;
        }
        self.passes += 1;

        let viewport = Viewport::measure(
            &self.host,
            self.config.effective_slack_ratio(),
            self.config.offset_fixed.as_deref(),
        );

        let host = &self.host;
        let items = &self.items;
        let Some(classification) =
            classify(items.len(), &viewport, |i| ItemSpan::measure(host, items[i].key()))
        else {
            self.last_classification = None;
            self.set_loading(None);
            self.publish(VisibilityReport::empty());
            debug!(pass = self.passes, "nothing to classify");
            return;
        };

        let onscreen = classification
            .onscreen
            .clone()
            .map(|i| Rc::clone(self.items[i].content()))
            .collect();
        let changes = self.publish(VisibilityReport::from_onscreen(onscreen));

        let mut uncloaks = 0;
        for i in classification.uncloak.clone() {
            let item = &self.items[i];
            if !item.is_uncloaked() {
                self.queue.schedule(Task::Uncloak(item.key()));
                uncloaks += 1;
            }
        }

        let mut cloaks = 0;
        for i in classification.cloak_indices() {
            let item = &self.items[i];
            if item.is_uncloaked() {
                self.queue.schedule(Task::Cloak(item.key()));
                cloaks += 1;
            }
        }

        self.show_loading_from(classification.scan_end);

        debug!(
            pass = self.passes,
            window_left = viewport.window_left,
            window_right = viewport.window_right,
            left_boundary = classification.left_boundary,
            scan_end = classification.scan_end,
            onscreen = ?classification.onscreen,
            uncloaks,
            cloaks,
            left_changed = changes.left,
            right_changed = changes.right,
            "recomputed"
        );
        self.last_classification = Some(classification);
    }

    /// Replace `remove` items starting at `index` with `contents`.
    ///
    /// Removed items are torn down immediately and their slots removed. New
    /// items start cloaked (or uncloaked if so configured). A recompute is
    /// scheduled. Returns the removed contents.
    pub fn splice<I>(&mut self, index: usize, remove: usize, contents: I) -> Vec<Rc<T>>
    where
        I: IntoIterator,
        I::Item: Into<Rc<T>>,
    {
        let start = index.min(self.items.len());
        let end = start.saturating_add(remove).min(self.items.len());

        let removed: Vec<_> = self.items.drain(start..end).collect();
        let removed_contents: Vec<_> = removed
            .iter()
            .map(|item| Rc::clone(item.content()))
            .collect();
        self.release(removed);

        let mut added: Vec<_> = contents
            .into_iter()
            .map(|content| self.create_item(content.into()))
            .collect();
        if !added.is_empty() {
            let slots: Vec<_> = added
                .iter()
                .map(|item| (item.key(), item.element_id()))
                .collect();
            self.host.insert_slots(start, &slots);
        }
        for item in &mut added {
            if self.config.uncloak_default {
                lifecycle::uncloak(item, &mut self.host, &self.config, &mut self.diagnostics);
            }
            lifecycle::did_insert(item, &mut self.host, self.config.default_width);
        }

        let added_count = added.len();
        self.items.splice(start..start, added);
        self.reindex();

        debug!(
            index = start,
            removed = removed_contents.len(),
            added = added_count,
            len = self.items.len(),
            "sequence changed"
        );
        self.scroll_triggered();
        removed_contents
    }

    /// Append one item.
    pub fn push(&mut self, content: impl Into<Rc<T>>) -> ItemKey {
        let index = self.items.len();
        self.insert(index, content)
    }

    /// Insert one item at `index` (clamped to the length).
    pub fn insert(&mut self, index: usize, content: impl Into<Rc<T>>) -> ItemKey {
        let index = index.min(self.items.len());
        let content: Rc<T> = content.into();
        self.splice(index, 0, [content]);
        self.items[index].key()
    }

    /// Remove the item at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Rc<T>> {
        if index >= self.items.len() {
            return None;
        }
        self.splice(index, 1, std::iter::empty::<Rc<T>>()).pop()
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        let len = self.items.len();
        self.splice(0, len, std::iter::empty::<Rc<T>>());
    }

    /// Replace the whole sequence.
    pub fn set_contents<I>(&mut self, contents: I)
    where
        I: IntoIterator,
        I::Item: Into<Rc<T>>,
    {
        let len = self.items.len();
        self.splice(0, len, contents);
    }

    /// Detach, release every mount (including pending unmounts) and drop
    /// every item. Observers are not notified.
    pub fn destroy(&mut self) {
        self.detach();

        for (key, handle) in self.queue.drain_unmounts() {
            trace!(%key, "releasing mount");
            self.host.unmount(handle);
        }

        let items = std::mem::take(&mut self.items);
        self.release(items);

        self.positions.clear();
        self.tracker.reset();
        self.last_classification = None;
        debug!("destroyed");
    }

    /// Managed items, in order.
    pub fn items(&self) -> &[Item<T, H::Handle>] {
        &self.items
    }

    /// Item at `index`.
    pub fn item(&self, index: usize) -> Option<&Item<T, H::Handle>> {
        self.items.get(index)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably (e.g. to scroll a simulated viewport).
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Last published visibility report.
    pub fn report(&self) -> &VisibilityReport<T> {
        self.tracker.current()
    }

    /// Number of recompute passes run so far.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Non-fatal diagnostics recorded since the last [`Self::take_diagnostics`].
    ///
    /// Repeats of a retained diagnostic are not recorded again.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take the recorded diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Classification of the last non-empty pass.
    pub fn last_classification(&self) -> Option<&Classification> {
        self.last_classification.as_ref()
    }

    /// Engine configuration.
    pub fn config(&self) -> &CloakConfig {
        &self.config
    }

    /// Number of queued tasks.
    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    fn create_item(&mut self, content: Rc<T>) -> Item<T, H::Handle> {
        let key = self.keys.allocate();
        let element_id = self
            .config
            .id_property
            .as_deref()
            .and_then(|property| content.property(property))
            .map(|value| self.config.element_id(&value));

        Item::new(key, content, element_id)
    }

    /// Tear down detached items and drop their slots in one host call.
    fn release(&mut self, items: Vec<Item<T, H::Handle>>) {
        if items.is_empty() {
            return;
        }

        let mut keys = Vec::with_capacity(items.len());
        for mut item in items {
            lifecycle::teardown(&mut item, &mut self.host);
            if self.loading_key == Some(item.key()) {
                self.loading_key = None;
            }
            keys.push(item.key());
        }
        self.host.remove_slots(&keys);
    }

    fn reindex(&mut self) {
        self.positions = self
            .items
            .iter()
            .enumerate()
            .map(|(pos, item)| (item.key(), pos))
            .collect();
    }

    fn publish(&mut self, report: VisibilityReport<T>) -> BoundaryChanges {
        let (changes, seen) = self.tracker.publish(report, self.observer.as_deref_mut());
        if let Some(objects) = seen {
            self.queue.schedule(Task::SawObjects(objects));
        }
        changes
    }

    fn show_loading_from(&mut self, scan_end: usize) {
        let next = self.items[scan_end..]
            .iter()
            .find(|item| !item.is_uncloaked())
            .map(Item::key);
        self.set_loading(next);
    }

    /// Move the single loading indicator to `next`, clearing the previous one.
    fn set_loading(&mut self, next: Option<ItemKey>) {
        if let Some(previous) = self.loading_key.filter(|key| Some(*key) != next) {
            if let Some(&pos) = self.positions.get(&previous) {
                let item = &mut self.items[pos];
                if item.loading {
                    item.loading = false;
                    self.host.clear_loading(previous);
                }
            }
        }
        self.loading_key = next;

        let Some(&pos) = next.and_then(|key| self.positions.get(&key)) else {
            return;
        };
        let item = &mut self.items[pos];
        if !item.loading {
            item.loading = true;
            self.host.show_loading(item.key(), self.config.loading_markup());
        }
    }
}

#[derive(Debug)]
enum TaskKind {
    Recompute,
    SawObjects,
    Uncloak,
    Cloak,
    Unmount,
}

impl TaskKind {
    fn of<T, M>(task: &Task<T, M>) -> Self {
        match task {
            Task::Recompute => Self::Recompute,
            Task::SawObjects(_) => Self::SawObjects,
            Task::Uncloak(_) => Self::Uncloak,
            Task::Cloak(_) => Self::Cloak,
            Task::Unmount { .. } => Self::Unmount,
        }
    }
}

#[cfg(test)]
#[path = "strip_tests.rs"]
mod tests;
