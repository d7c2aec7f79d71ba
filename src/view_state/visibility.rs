//! Visibility reports and boundary-change notification.
//!
//! After each pass the strip publishes a [`VisibilityReport`] through a
//! [`VisibilityTracker`], which compares the new boundaries with the previous
//! ones by identity (`Rc::ptr_eq`) and fires the observer hooks that changed.

use std::cell::RefCell;
use std::rc::Rc;

/// Observer hooks for visibility changes. Every hook is optional.
pub trait VisibilityObserver<T> {
    /// The leftmost on-screen content changed (`None` when nothing is on screen).
    fn left_visible_changed(&mut self, _content: Option<&Rc<T>>) {}

    /// The rightmost on-screen content changed (`None` when nothing is on screen).
    fn right_visible_changed(&mut self, _content: Option<&Rc<T>>) {}

    /// Contents currently on screen, delivered at the render-settling point.
    fn saw_objects(&mut self, _objects: &[Rc<T>]) {}
}

/// Shared observers, so the caller can keep a handle to what the strip owns.
impl<T, O> VisibilityObserver<T> for Rc<RefCell<O>>
where
    O: VisibilityObserver<T> + ?Sized,
{
    fn left_visible_changed(&mut self, content: Option<&Rc<T>>) {
        self.borrow_mut().left_visible_changed(content);
    }

    fn right_visible_changed(&mut self, content: Option<&Rc<T>>) {
        self.borrow_mut().right_visible_changed(content);
    }

    fn saw_objects(&mut self, objects: &[Rc<T>]) {
        self.borrow_mut().saw_objects(objects);
    }
}

/// What is on screen after a pass.
///
/// # Invariants
/// - `leftmost`/`rightmost` are the first/last elements of `onscreen`
/// - both are `None` exactly when `onscreen` is empty
#[derive(Debug)]
pub struct VisibilityReport<T> {
    onscreen: Vec<Rc<T>>,
}

impl<T> VisibilityReport<T> {
    /// Report with nothing on screen.
    pub fn empty() -> Self {
        Self {
            onscreen: Vec::new(),
        }
    }

    /// Build a report from the ordered on-screen run.
    pub fn from_onscreen(onscreen: Vec<Rc<T>>) -> Self {
        Self { onscreen }
    }

    /// Leftmost on-screen content.
    pub fn leftmost(&self) -> Option<&Rc<T>> {
        self.onscreen.first()
    }

    /// Rightmost on-screen content.
    pub fn rightmost(&self) -> Option<&Rc<T>> {
        self.onscreen.last()
    }

    /// Ordered on-screen contents.
    pub fn onscreen(&self) -> &[Rc<T>] {
        &self.onscreen
    }

    /// Whether nothing is on screen.
    pub fn is_empty(&self) -> bool {
        self.onscreen.is_empty()
    }
}

impl<T> Clone for VisibilityReport<T> {
    fn clone(&self) -> Self {
        Self {
            onscreen: self.onscreen.clone(),
        }
    }
}

impl<T> Default for VisibilityReport<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Identity comparison of optional content references.
pub fn same_content<T>(a: Option<&Rc<T>>, b: Option<&Rc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Which boundaries changed when a report was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundaryChanges {
    /// Leftmost visible content changed.
    pub left: bool,
    /// Rightmost visible content changed.
    pub right: bool,
}

/// Remembers the last published report and drives the observer hooks.
#[derive(Debug)]
pub struct VisibilityTracker<T> {
    current: VisibilityReport<T>,
}

impl<T> Default for VisibilityTracker<T> {
    fn default() -> Self {
        Self {
            current: VisibilityReport::empty(),
        }
    }
}

impl<T> VisibilityTracker<T> {
    /// Tracker with nothing visible.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last published report.
    pub fn current(&self) -> &VisibilityReport<T> {
        &self.current
    }

    /// Publish a new report, firing boundary hooks that changed.
    ///
    /// Returns the on-screen set to hand to `saw_objects` once rendering
    /// settles, or `None` when nothing is on screen.
    pub fn publish<O>(
        &mut self,
        report: VisibilityReport<T>,
        observer: Option<&mut O>,
    ) -> (BoundaryChanges, Option<Vec<Rc<T>>>)
    where
        O: VisibilityObserver<T> + ?Sized,
    {
        let changes = BoundaryChanges {
            left: !same_content(self.current.leftmost(), report.leftmost()),
            right: !same_content(self.current.rightmost(), report.rightmost()),
        };
        self.current = report;

        if let Some(observer) = observer {
            if changes.left {
                observer.left_visible_changed(self.current.leftmost());
            }
            if changes.right {
                observer.right_visible_changed(self.current.rightmost());
            }
        }

        let seen = (!self.current.is_empty()).then(|| self.current.onscreen.clone());
        (changes, seen)
    }

    /// Forget the last report without notifying anyone.
    pub fn reset(&mut self) {
        self.current = VisibilityReport::empty();
    }
}
