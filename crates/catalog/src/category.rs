//! Category hierarchy.
//!
//! Categories form a forest: each category has at most one parent and any
//! number of children, and links to any number of items (an item may sit in
//! several categories). The tree is an arena keyed by [`CategoryId`]; parent and
//! child links are ids, updated together by every operation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use shop_core::{DomainError, DomainResult, Entity};

use crate::item::ItemId;

shop_core::typed_id!(
    /// Category identifier.
    CategoryId
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: CategoryId,
    name: String,
    parent: Option<CategoryId>,
    children: Vec<CategoryId>,
    items: Vec<ItemId>,
}

impl Category {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<CategoryId> {
        self.parent
    }

    pub fn children(&self) -> &[CategoryId] {
        &self.children
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTree {
    categories: BTreeMap<CategoryId, Category>,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn roots(&self) -> Vec<CategoryId> {
        self.categories
            .values()
            .filter(|c| c.parent.is_none())
            .map(|c| c.id)
            .collect()
    }

    pub fn add_root(&mut self, id: CategoryId, name: impl Into<String>) -> DomainResult<()> {
        self.insert(id, name.into(), None)
    }

    pub fn add_child(
        &mut self,
        parent: CategoryId,
        id: CategoryId,
        name: impl Into<String>,
    ) -> DomainResult<()> {
        self.require(parent)?;
        self.insert(id, name.into(), Some(parent))?;
        self.node_mut(parent)?.children.push(id);
        Ok(())
    }

    /// Re-parent `id` under `new_parent` (or make it a root with `None`).
    ///
    /// Fails when `new_parent` is `id` itself or one of its descendants.
    pub fn move_under(&mut self, id: CategoryId, new_parent: Option<CategoryId>) -> DomainResult<()> {
        let old_parent = self.require(id)?.parent;
        if let Some(target) = new_parent {
            self.require(target)?;
            if target == id || self.ancestors(target)?.contains(&id) {
                return Err(DomainError::invariant(format!(
                    "moving category {id} under {target} would create a cycle"
                )));
            }
        }
        if old_parent == new_parent {
            return Ok(());
        }

        if let Some(old) = old_parent {
            self.node_mut(old)?.children.retain(|c| *c != id);
        }
        if let Some(target) = new_parent {
            self.node_mut(target)?.children.push(id);
        }
        self.node_mut(id)?.parent = new_parent;
        Ok(())
    }

    /// Associate an item with a category. Linking twice is a no-op.
    pub fn link_item(&mut self, category: CategoryId, item: ItemId) -> DomainResult<()> {
        let node = self.node_mut(category)?;
        if !node.items.contains(&item) {
            node.items.push(item);
        }
        Ok(())
    }

    pub fn unlink_item(&mut self, category: CategoryId, item: ItemId) -> DomainResult<()> {
        self.node_mut(category)?.items.retain(|i| *i != item);
        Ok(())
    }

    /// Ancestors of `id`, nearest parent first.
    pub fn ancestors(&self, id: CategoryId) -> DomainResult<Vec<CategoryId>> {
        let mut out = Vec::new();
        let mut cursor = self.require(id)?.parent;
        while let Some(current) = cursor {
            if out.contains(&current) {
                return Err(DomainError::invariant("category tree contains a cycle"));
            }
            out.push(current);
            cursor = self.require(current)?.parent;
        }
        Ok(out)
    }

    /// All descendants of `id` in pre-order (children in insertion order).
    pub fn descendants(&self, id: CategoryId) -> DomainResult<Vec<CategoryId>> {
        let mut out = Vec::new();
        let mut stack: Vec<CategoryId> = self.require(id)?.children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.require(current)?.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Items linked to `id` or any of its descendants, without duplicates.
    pub fn items_under(&self, id: CategoryId) -> DomainResult<Vec<ItemId>> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        let scope = std::iter::once(id).chain(self.descendants(id)?);
        for category in scope {
            for item in &self.require(category)?.items {
                if seen.insert(*item) {
                    out.push(*item);
                }
            }
        }
        Ok(out)
    }

    fn insert(&mut self, id: CategoryId, name: String, parent: Option<CategoryId>) -> DomainResult<()> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        if self.categories.contains_key(&id) {
            return Err(DomainError::conflict(format!("category {id} already exists")));
        }
        self.categories.insert(
            id,
            Category {
                id,
                name,
                parent,
                children: Vec::new(),
                items: Vec::new(),
            },
        );
        Ok(())
    }

    fn require(&self, id: CategoryId) -> DomainResult<&Category> {
        self.categories
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("category {id}")))
    }

    fn node_mut(&mut self, id: CategoryId) -> DomainResult<&mut Category> {
        self.categories
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("category {id}")))
    }
}
