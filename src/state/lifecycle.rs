//! Item lifecycle controller.
//!
//! The only code allowed to move an item between `Cloaked` and `Uncloaked`.
//! Each transition is idempotent: asking for the state an item is already in
//! touches nothing on the host.

use std::rc::Rc;

use tracing::{trace, warn};

use crate::config::CloakConfig;
use crate::host::{Host, MountRequest, RenderTarget, TargetBinding};
use crate::model::{Diagnostic, Item};

use super::render_queue::{RenderQueue, Task};

/// Mount the item's view.
///
/// Returns `true` if the item transitioned. A controller name that the host
/// cannot resolve falls back to a generated controller and pushes a
/// [`Diagnostic`] unless an identical one is already in `diagnostics`; the
/// item is mounted either way.
pub fn uncloak<T, H>(
    item: &mut Item<T, H::Handle>,
    host: &mut H,
    config: &CloakConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool
where
    H: Host<T>,
{
    if item.is_uncloaked() {
        return false;
    }

    let key = item.key();
    let content = Rc::clone(item.content());

    let target = match config.item_controller.as_deref() {
        Some(name) => RenderTarget::Controller(resolve_controller(host, name, &content, diagnostics)),
        None => RenderTarget::Content(content),
    };

    let binding = if config.preserves_context {
        TargetBinding::Content
    } else {
        TargetBinding::Context
    };

    item.placeholder_width = None;
    item.loading = false;
    host.set_placeholder_width(key, None);

    let handle = host.mount(MountRequest {
        key,
        view: &config.cloak_view,
        element_id: item.element_id(),
        target,
        binding,
    });
    item.mount = Some(handle);

    trace!(%key, "uncloaked");
    true
}

/// Reduce the item to a placeholder.
///
/// The placeholder is pinned to the current rendered width (`default_width`
/// if the view measures zero) before the view is released, and the release
/// itself is deferred to the render queue. Returns
/// `true` if the item transitioned; items that are cloaked already or whose
/// slot is not in the document are left alone.
pub fn cloak<T, H>(
    item: &mut Item<T, H::Handle>,
    host: &mut H,
    queue: &mut RenderQueue<T, H::Handle>,
    default_width: f64,
) -> bool
where
    H: Host<T>,
{
    let key = item.key();
    if !item.is_uncloaked() || !host.is_in_document(key) {
        return false;
    }

    let measured = host.width(key);
    let width = if measured > 0.0 {
        measured
    } else {
        default_width
    };
    item.placeholder_width = Some(width);
    host.set_placeholder_width(key, Some(width));

    if let Some(handle) = item.mount.take() {
        queue.schedule(Task::Unmount { key, handle });
    }

    trace!(%key, width, "cloaked");
    true
}

/// Size a freshly inserted slot.
///
/// A cloaked slot that measures zero width gets the configured default
/// placeholder width; anything already sized is left alone.
pub fn did_insert<T, H>(item: &mut Item<T, H::Handle>, host: &mut H, default_width: f64)
where
    H: Host<T>,
{
    if item.is_uncloaked() {
        return;
    }

    let key = item.key();
    if host.width(key) <= 0.0 {
        item.placeholder_width = Some(default_width);
        host.set_placeholder_width(key, Some(default_width));
    }
}

/// Release the item's mount immediately, whatever its state.
///
/// Safe to call repeatedly.
pub fn teardown<T, H>(item: &mut Item<T, H::Handle>, host: &mut H)
where
    H: Host<T>,
{
    if let Some(handle) = item.mount.take() {
        host.unmount(handle);
    }
    item.loading = false;
}

fn resolve_controller<T, H>(
    host: &mut H,
    name: &str,
    content: &Rc<T>,
    diagnostics: &mut Vec<Diagnostic>,
) -> H::Controller
where
    H: Host<T>,
{
    if let Some(controller) = host.lookup_controller(name, content) {
        return controller;
    }

    let diagnostic = Diagnostic::ControllerFallback {
        name: name.to_string(),
    };
    if diagnostics.contains(&diagnostic) {
        trace!(controller = name, "generated fallback controller");
    } else {
        warn!(controller = name, "{}", diagnostic);
        diagnostics.push(diagnostic);
    }

    host.generate_controller(name, content)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
