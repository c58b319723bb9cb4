//! Material search, filtering, and sorting over the local collection.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use studyhub_core::types::{CategoryId, SortDirection, TagId};
use studyhub_entity::material::Material;

/// Which category a search is restricted to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "id")]
pub enum CategoryScope {
    /// Every category, including unfiled materials.
    #[default]
    Any,
    /// Only unfiled (root) materials.
    Root,
    /// Only materials directly inside the given category.
    In(CategoryId),
}

impl CategoryScope {
    /// Scope for a folder view (`None` = root).
    pub fn folder(id: Option<CategoryId>) -> Self {
        id.map_or(Self::Root, Self::In)
    }

    fn matches(&self, material: &Material) -> bool {
        match self {
            Self::Any => true,
            Self::Root => material.category_id.is_none(),
            Self::In(id) => material.category_id == Some(*id),
        }
    }
}

/// Search criteria. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialFilter {
    /// Case-insensitive substring of the title or file name.
    #[serde(default)]
    pub query: Option<String>,
    /// Category restriction.
    #[serde(default)]
    pub category: CategoryScope,
    /// Materials carrying any of these tags.
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    /// Exact file type, e.g. `pdf`.
    #[serde(default)]
    pub file_type: Option<String>,
}

impl MaterialFilter {
    /// Whether a material satisfies every criterion.
    pub fn matches(&self, material: &Material) -> bool {
        if !self.category.matches(material) {
            return false;
        }
        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let query = query.to_lowercase();
            if !material.title.to_lowercase().contains(&query)
                && !material.file_name.to_lowercase().contains(&query)
            {
                return false;
            }
        }
        if !self.tag_ids.is_empty() && !self.tag_ids.iter().any(|t| material.has_tag(t)) {
            return false;
        }
        match &self.file_type {
            Some(file_type) => material.file_type.eq_ignore_ascii_case(file_type),
            None => true,
        }
    }
}

/// Sort key for material listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialSortField {
    /// Title, ignoring case.
    Title,
    /// Creation time.
    #[default]
    Created,
    /// File size.
    Size,
}

/// Sort specification for material listings. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSort {
    /// Sort key.
    pub field: MaterialSortField,
    /// Direction.
    pub direction: SortDirection,
}

impl Default for MaterialSort {
    fn default() -> Self {
        Self {
            field: MaterialSortField::Created,
            direction: SortDirection::Desc,
        }
    }
}

impl MaterialSort {
    /// Compare two materials under this sort.
    pub fn compare(&self, a: &Material, b: &Material) -> Ordering {
        let ordering = match self.field {
            MaterialSortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            MaterialSortField::Created => a.created_at.cmp(&b.created_at),
            MaterialSortField::Size => a.file_size.cmp(&b.file_size),
        };
        self.direction.apply(ordering)
    }
}

/// Filter and sort a collection.
pub fn search(materials: &[Material], filter: &MaterialFilter, sort: MaterialSort) -> Vec<Material> {
    let mut found: Vec<Material> = materials
        .iter()
        .filter(|m| filter.matches(m))
        .cloned()
        .collect();
    found.sort_by(|a, b| sort.compare(a, b));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use studyhub_core::types::{MaterialId, UserId};
    use studyhub_entity::tag::Tag;

    fn material(title: &str, file_name: &str, size: i64, age_minutes: i64) -> Material {
        let at = Utc::now() - Duration::minutes(age_minutes);
        Material {
            id: MaterialId::new(),
            user_id: UserId::new(),
            title: title.into(),
            file_name: file_name.into(),
            file_path: format!("u/{file_name}"),
            file_type: studyhub_entity::material::file_type_of(file_name),
            file_size: size,
            mime_type: None,
            category_id: None,
            sort_order: 0,
            created_at: at,
            updated_at: at,
            deleted_at: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_query_matches_title_or_file_name() {
        let items = vec![
            material("Linear Algebra", "la.pdf", 1, 0),
            material("Week 2", "calculus-notes.docx", 1, 0),
        ];
        let filter = MaterialFilter {
            query: Some("ALGEBRA".into()),
            ..MaterialFilter::default()
        };
        assert_eq!(search(&items, &filter, MaterialSort::default()).len(), 1);

        let filter = MaterialFilter {
            query: Some("calculus".into()),
            ..MaterialFilter::default()
        };
        assert_eq!(search(&items, &filter, MaterialSort::default())[0].title, "Week 2");
    }

    #[test]
    fn test_tag_filter_is_any_of() {
        let mut tagged = material("Notes", "n.pdf", 1, 0);
        let tag = Tag {
            id: TagId::new(),
            user_id: tagged.user_id,
            name: "exam".into(),
            color: "#fff".into(),
            created_at: Utc::now(),
        };
        tagged.tags.push(tag.clone());
        let items = vec![tagged, material("Other", "o.pdf", 1, 0)];
        let filter = MaterialFilter {
            tag_ids: vec![TagId::new(), tag.id],
            ..MaterialFilter::default()
        };
        let found = search(&items, &filter, MaterialSort::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Notes");
    }

    #[test]
    fn test_category_scope() {
        let category = CategoryId::new();
        let mut filed = material("Filed", "f.pdf", 1, 0);
        filed.category_id = Some(category);
        let items = vec![filed, material("Loose", "l.pdf", 1, 0)];

        let root = MaterialFilter {
            category: CategoryScope::folder(None),
            ..MaterialFilter::default()
        };
        assert_eq!(search(&items, &root, MaterialSort::default())[0].title, "Loose");
        let inside = MaterialFilter {
            category: CategoryScope::folder(Some(category)),
            ..MaterialFilter::default()
        };
        assert_eq!(search(&items, &inside, MaterialSort::default())[0].title, "Filed");
    }

    #[test]
    fn test_sorting() {
        let items = vec![
            material("b", "b.pdf", 30, 2),
            material("A", "a.pdf", 10, 1),
            material("c", "c.txt", 20, 3),
        ];
        let titles = |sort| {
            search(&items, &MaterialFilter::default(), sort)
                .into_iter()
                .map(|m| m.title)
                .collect::<Vec<_>>()
        };
        assert_eq!(titles(MaterialSort::default()), vec!["A", "b", "c"]);
        assert_eq!(
            titles(MaterialSort {
                field: MaterialSortField::Title,
                direction: SortDirection::Asc,
            }),
            vec!["A", "b", "c"]
        );
        assert_eq!(
            titles(MaterialSort {
                field: MaterialSortField::Size,
                direction: SortDirection::Desc,
            }),
            vec!["b", "c", "A"]
        );
        let only_txt = MaterialFilter {
            file_type: Some("TXT".into()),
            ..MaterialFilter::default()
        };
        assert_eq!(search(&items, &only_txt, MaterialSort::default()).len(), 1);
    }
}
