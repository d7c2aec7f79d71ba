//! Managed item: content reference plus lifecycle bookkeeping.

use std::rc::Rc;

use super::types::{ItemKey, LifecycleState};

/// Content that can be placed in a cloaked strip.
///
/// The only requirement is named property access, used to derive stable
/// element ids when an `id_property` is configured. Content without
/// properties can rely on the default implementation.
pub trait CloakContent {
    /// Look up a property by name, rendered as a string.
    fn property(&self, _name: &str) -> Option<String> {
        None
    }
}

impl CloakContent for serde_json::Value {
    fn property(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl CloakContent for String {}

impl CloakContent for &'static str {}

/// One element of the managed sequence.
///
/// The item's position in the sequence is its index; geometry is never stored
/// here and is always read fresh from the host. The lifecycle state is derived
/// from the mount handle, so an item is `Uncloaked` exactly when it holds one.
#[derive(Debug)]
pub struct Item<T, M> {
    key: ItemKey,
    content: Rc<T>,
    pub(crate) mount: Option<M>,
    pub(crate) placeholder_width: Option<f64>,
    pub(crate) loading: bool,
    element_id: Option<String>,
}

impl<T, M> Item<T, M> {
    /// Create a cloaked item.
    pub fn new(key: ItemKey, content: Rc<T>, element_id: Option<String>) -> Self {
        Self {
            key,
            content,
            mount: None,
            placeholder_width: None,
            loading: false,
            element_id,
        }
    }

    /// Stable slot key.
    pub fn key(&self) -> ItemKey {
        self.key
    }

    /// Shared content reference.
    pub fn content(&self) -> &Rc<T> {
        &self.content
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        if self.mount.is_some() {
            LifecycleState::Uncloaked
        } else {
            LifecycleState::Cloaked
        }
    }

    /// Whether the content view is mounted.
    pub fn is_uncloaked(&self) -> bool {
        self.mount.is_some()
    }

    /// Width applied to the placeholder while cloaked, if any.
    pub fn placeholder_width(&self) -> Option<f64> {
        self.placeholder_width
    }

    /// Whether the loading indicator is showing in this slot.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// DOM-addressable id derived from the configured id property.
    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    /// Mount handle, if uncloaked.
    pub fn mount(&self) -> Option<&M> {
        self.mount.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_item_is_cloaked_without_placeholder() {
        let item: Item<String, u32> = Item::new(ItemKey::new(1), Rc::new("a".into()), None);
        assert_eq!(item.state(), LifecycleState::Cloaked);
        assert_eq!(item.placeholder_width(), None);
        assert!(!item.is_loading());
        assert!(item.mount().is_none());
    }

    #[test]
    fn state_follows_mount_handle() {
        let mut item: Item<String, u32> = Item::new(ItemKey::new(1), Rc::new("a".into()), None);
        item.mount = Some(9);
        assert_eq!(item.state(), LifecycleState::Uncloaked);
        item.mount = None;
        assert_eq!(item.state(), LifecycleState::Cloaked);
    }

    #[test]
    fn json_property_renders_strings_and_numbers() {
        let value = json!({"id": 42, "slug": "post-42", "missing": null});
        assert_eq!(value.property("id"), Some("42".to_string()));
        assert_eq!(value.property("slug"), Some("post-42".to_string()));
        assert_eq!(value.property("missing"), None);
        assert_eq!(value.property("absent"), None);
    }

    #[test]
    fn plain_strings_have_no_properties() {
        assert_eq!("hello".to_string().property("id"), None);
    }
}
