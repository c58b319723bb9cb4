//! Category tree derived from the flat category collection.
//!
//! The tree is rebuilt from the flat list whenever the collection changes
//! and is never mutated in place. A category whose `parent_id` names a
//! category outside the set is treated as a root.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use studyhub_core::types::CategoryId;

use super::model::Category;

/// A category together with the ids of its direct children.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryNode {
    /// The category record.
    pub category: Category,
    /// Direct children, in the order of the source collection.
    pub children: Vec<CategoryId>,
}

/// A row of the depth-first flattened tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatNode {
    /// Category id.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Nesting level (0 for roots).
    pub level: usize,
    /// Whether the node has children.
    pub has_children: bool,
}

/// A nested, serializable tree node for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTreeNode {
    /// Category id.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Depth level.
    pub depth: usize,
    /// Number of materials directly inside this category.
    pub material_count: u64,
    /// Child nodes.
    pub children: Vec<CategoryTreeNode>,
}

/// Parent/child index over one user's categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: HashMap<CategoryId, CategoryNode>,
    roots: Vec<CategoryId>,
}

impl CategoryTree {
    /// Build the tree in O(n).
    pub fn build(categories: &[Category]) -> Self {
        let mut nodes: HashMap<CategoryId, CategoryNode> = categories
            .iter()
            .map(|c| {
                (
                    c.id,
                    CategoryNode {
                        category: c.clone(),
                        children: Vec::new(),
                    },
                )
            })
            .collect();

        let mut roots = Vec::new();
        for category in categories {
            match category.parent_id {
                Some(parent) if parent != category.id && nodes.contains_key(&parent) => {
                    if let Some(node) = nodes.get_mut(&parent) {
                        node.children.push(category.id);
                    }
                }
                _ => roots.push(category.id),
            }
        }

        Self { nodes, roots }
    }

    /// Number of categories in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node.
    pub fn get(&self, id: &CategoryId) -> Option<&CategoryNode> {
        self.nodes.get(id)
    }

    /// Whether the category exists in this tree.
    pub fn contains(&self, id: &CategoryId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Root nodes, in the order of the source collection.
    pub fn roots(&self) -> impl Iterator<Item = &CategoryNode> {
        self.roots.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Direct children of a category, or the roots for `None`.
    pub fn children_of(&self, parent: Option<CategoryId>) -> Vec<&Category> {
        let ids: &[CategoryId] = match parent {
            None => &self.roots,
            Some(id) => match self.nodes.get(&id) {
                Some(node) => &node.children,
                None => &[],
            },
        };
        ids.iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|node| &node.category)
            .collect()
    }

    /// The effective parent: `None` when the recorded parent is missing.
    fn parent_of(&self, id: &CategoryId) -> Option<CategoryId> {
        self.nodes
            .get(id)
            .and_then(|node| node.category.parent_id)
            .filter(|parent| parent != id && self.nodes.contains_key(parent))
    }

    /// Ordered path from the root down to `id`, inclusive.
    ///
    /// `None` (the root/unfiled view) and unknown ids yield an empty path.
    pub fn ancestor_path(&self, id: Option<CategoryId>) -> Vec<&Category> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = id.filter(|id| self.nodes.contains_key(id));
        while let Some(cur) = current {
            if !seen.insert(cur) {
                break;
            }
            if let Some(node) = self.nodes.get(&cur) {
                path.push(&node.category);
            }
            current = self.parent_of(&cur);
        }
        path.reverse();
        path
    }

    /// Whether `node` is `candidate_ancestor` or lies beneath it.
    ///
    /// Walks parent links upward from `node`, so `is_descendant(a, a)` is
    /// true. The walk is bounded even if stored links contain a cycle.
    pub fn is_descendant(&self, candidate_ancestor: CategoryId, node: CategoryId) -> bool {
        let mut current = Some(node);
        let mut steps = 0usize;
        while let Some(cur) = current {
            if cur == candidate_ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            current = self.parent_of(&cur);
        }
        false
    }

    /// Whether `source` may be placed under `target` (`None` = root).
    pub fn can_reparent(&self, source: CategoryId, target: Option<CategoryId>) -> bool {
        match target {
            None => true,
            Some(target) => !self.is_descendant(source, target),
        }
    }

    /// All categories beneath `id` in depth-first pre-order, excluding `id`.
    pub fn descendants(&self, id: CategoryId) -> Vec<CategoryId> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut stack: Vec<CategoryId> = match self.nodes.get(&id) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(cur) = stack.pop() {
            if !seen.insert(cur) {
                continue;
            }
            out.push(cur);
            if let Some(node) = self.nodes.get(&cur) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Depth-first flattening with a level counter.
    ///
    /// When `expanded` is given, children are only emitted for expanded nodes.
    pub fn flatten(&self, expanded: Option<&HashSet<CategoryId>>) -> Vec<FlatNode> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut seen = HashSet::new();
        for root in &self.roots {
            self.flatten_into(*root, 0, expanded, &mut seen, &mut out);
        }
        out
    }

    fn flatten_into(
        &self,
        id: CategoryId,
        level: usize,
        expanded: Option<&HashSet<CategoryId>>,
        seen: &mut HashSet<CategoryId>,
        out: &mut Vec<FlatNode>,
    ) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !seen.insert(id) {
            return;
        }
        out.push(FlatNode {
            id,
            name: node.category.name.clone(),
            level,
            has_children: !node.children.is_empty(),
        });
        if expanded.is_none_or(|set| set.contains(&id)) {
            for child in &node.children {
                self.flatten_into(*child, level + 1, expanded, seen, out);
            }
        }
    }

    /// Nested display tree with per-category material counts.
    pub fn nested(&self, material_counts: &HashMap<CategoryId, u64>) -> Vec<CategoryTreeNode> {
        let mut seen = HashSet::new();
        self.roots
            .iter()
            .filter_map(|id| self.nest(*id, 0, material_counts, &mut seen))
            .collect()
    }

    fn nest(
        &self,
        id: CategoryId,
        depth: usize,
        counts: &HashMap<CategoryId, u64>,
        seen: &mut HashSet<CategoryId>,
    ) -> Option<CategoryTreeNode> {
        let node = self.nodes.get(&id)?;
        if !seen.insert(id) {
            return None;
        }
        let children = node
            .children
            .iter()
            .filter_map(|child| self.nest(*child, depth + 1, counts, seen))
            .collect();
        Some(CategoryTreeNode {
            id,
            name: node.category.name.clone(),
            depth,
            material_count: counts.get(&id).copied().unwrap_or(0),
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use studyhub_core::types::UserId;

    fn cat(name: &str, parent: Option<CategoryId>) -> Category {
        let now = Utc::now();
        Category {
            id: CategoryId::new(),
            user_id: UserId::new(),
            name: name.into(),
            parent_id: parent,
            created_at: now,
            updated_at: now,
        }
    }

    /// Math > Algebra > Groups, plus a second root Physics.
    fn sample() -> (Vec<Category>, CategoryId, CategoryId, CategoryId, CategoryId) {
        let math = cat("Math", None);
        let algebra = cat("Algebra", Some(math.id));
        let groups = cat("Groups", Some(algebra.id));
        let physics = cat("Physics", None);
        let ids = (math.id, algebra.id, groups.id, physics.id);
        (
            vec![math, algebra, groups, physics],
            ids.0,
            ids.1,
            ids.2,
            ids.3,
        )
    }

    #[test]
    fn test_roots_and_children() {
        let (cats, math, algebra, _, physics) = sample();
        let tree = CategoryTree::build(&cats);
        let roots: Vec<_> = tree.roots().map(|n| n.category.id).collect();
        assert_eq!(roots, vec![math, physics]);
        let children: Vec<_> = tree.children_of(Some(math)).iter().map(|c| c.id).collect();
        assert_eq!(children, vec![algebra]);
        assert_eq!(tree.children_of(None).len(), 2);
    }

    #[test]
    fn test_dangling_parent_is_root() {
        let orphan = cat("Orphan", Some(CategoryId::new()));
        let tree = CategoryTree::build(std::slice::from_ref(&orphan));
        assert_eq!(tree.roots().count(), 1);
        let path = tree.ancestor_path(Some(orphan.id));
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].id, orphan.id);
    }

    #[test]
    fn test_ancestor_path_root_to_node() {
        let (cats, math, algebra, groups, _) = sample();
        let tree = CategoryTree::build(&cats);
        let path: Vec<_> = tree.ancestor_path(Some(groups)).iter().map(|c| c.id).collect();
        assert_eq!(path, vec![math, algebra, groups]);
        assert!(tree.ancestor_path(None).is_empty());
        assert!(tree.ancestor_path(Some(CategoryId::new())).is_empty());
    }

    #[test]
    fn test_is_descendant() {
        let (cats, math, algebra, groups, physics) = sample();
        let tree = CategoryTree::build(&cats);
        assert!(tree.is_descendant(math, groups));
        assert!(tree.is_descendant(algebra, groups));
        assert!(tree.is_descendant(math, math));
        assert!(!tree.is_descendant(groups, math));
        assert!(!tree.is_descendant(physics, groups));
    }

    #[test]
    fn test_can_reparent_rejects_self_and_descendants() {
        let (cats, math, algebra, groups, physics) = sample();
        let tree = CategoryTree::build(&cats);
        assert!(!tree.can_reparent(math, Some(math)));
        assert!(!tree.can_reparent(math, Some(algebra)));
        assert!(!tree.can_reparent(math, Some(groups)));
        assert!(tree.can_reparent(math, Some(physics)));
        assert!(tree.can_reparent(groups, Some(math)));
        assert!(tree.can_reparent(groups, None));
    }

    #[test]
    fn test_cyclic_links_terminate() {
        let mut a = cat("A", None);
        let mut b = cat("B", None);
        a.parent_id = Some(b.id);
        b.parent_id = Some(a.id);
        let tree = CategoryTree::build(&[a.clone(), b.clone()]);
        assert!(tree.is_descendant(a.id, b.id));
        assert!(!tree.is_descendant(CategoryId::new(), a.id));
        assert_eq!(tree.ancestor_path(Some(a.id)).len(), 2);
    }

    #[test]
    fn test_flatten_levels_and_expansion() {
        let (cats, math, algebra, groups, physics) = sample();
        let tree = CategoryTree::build(&cats);
        let flat: Vec<_> = tree.flatten(None).iter().map(|n| (n.id, n.level)).collect();
        assert_eq!(flat, vec![(math, 0), (algebra, 1), (groups, 2), (physics, 0)]);

        let expanded = HashSet::from([math]);
        let flat: Vec<_> = tree
            .flatten(Some(&expanded))
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(flat, vec![math, algebra, physics]);
    }

    #[test]
    fn test_descendants_pre_order() {
        let (cats, math, algebra, groups, _) = sample();
        let tree = CategoryTree::build(&cats);
        assert_eq!(tree.descendants(math), vec![algebra, groups]);
        assert!(tree.descendants(groups).is_empty());
    }

    #[test]
    fn test_nested_counts() {
        let (cats, math, algebra, _, _) = sample();
        let tree = CategoryTree::build(&cats);
        let counts = HashMap::from([(algebra, 3u64)]);
        let nested = tree.nested(&counts);
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0].id, math);
        assert_eq!(nested[0].children[0].material_count, 3);
        assert_eq!(nested[0].children[0].depth, 1);
    }
}
