//! # List Patches
//!
//! List-valued entity fields (repair steps, photo annotations) are patched
//! rather than overwritten. A patch either appends, replacing items in place
//! when their sub-id is already present, or fully replaces the list when it
//! carries `"replace": true`.
//!
//! Both wire forms are accepted:
//!
//! ```text
//! "steps": [ { "id": "s1", ... } ]                         // append
//! "steps": { "items": [ { "id": "s1", ... } ], "replace": true }  // full replace
//! ```

use serde::{Deserialize, Serialize};

/// An item inside a list-valued field, identified by its sub-id.
pub trait ListItem {
    /// Identifier unique within the owning list.
    fn item_id(&self) -> &str;
}

/// A patch to a list-valued field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ListPatchRepr<T>")]
pub struct ListPatch<T> {
    /// Items carried by the patch.
    pub items: Vec<T>,
    /// When set, `items` becomes the whole list.
    pub replace: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListPatchRepr<T> {
    Bare(Vec<T>),
    Explicit {
        items: Vec<T>,
        #[serde(default)]
        replace: bool,
    },
}

impl<T> From<ListPatchRepr<T>> for ListPatch<T> {
    fn from(repr: ListPatchRepr<T>) -> Self {
        match repr {
            ListPatchRepr::Bare(items) => Self {
                items,
                replace: false,
            },
            ListPatchRepr::Explicit { items, replace } => Self { items, replace },
        }
    }
}

impl<T> ListPatch<T> {
    /// Patch that appends (or replaces matching sub-ids).
    #[must_use]
    pub fn append(items: Vec<T>) -> Self {
        Self {
            items,
            replace: false,
        }
    }

    /// Patch that replaces the whole list.
    #[must_use]
    pub fn replace_all(items: Vec<T>) -> Self {
        Self {
            items,
            replace: true,
        }
    }
}

/// Apply a list patch to `current`.
///
/// Items whose sub-id already exists are replaced in place, never appended a
/// second time. This also holds for duplicates inside a single patch.
pub fn merge_list<T: ListItem>(current: &mut Vec<T>, patch: ListPatch<T>) {
    if patch.replace {
        current.clear();
    }
    for item in patch.items {
        match current
            .iter_mut()
            .find(|existing| existing.item_id() == item.item_id())
        {
            Some(slot) => *slot = item,
            None => current.push(item),
        }
    }
}
