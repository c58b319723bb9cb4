//! Cache key builders.
//!
//! Keys label caches in logs and namespace signed URLs per bucket.

use studyhub_core::types::UserId;

/// The collections a session keeps locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Active (non-trashed) materials.
    Materials,
    /// Trashed materials.
    Trash,
    /// Categories.
    Categories,
    /// Tags.
    Tags,
}

impl CollectionKind {
    fn prefix(&self) -> &'static str {
        match self {
            Self::Materials => "materials",
            Self::Trash => "trash",
            Self::Categories => "categories",
            Self::Tags => "tags",
        }
    }
}

/// Key of a user's collection, e.g. `materials:<user-id>`.
pub fn collection(kind: CollectionKind, user_id: &UserId) -> String {
    format!("{}:{user_id}", kind.prefix())
}

/// Key of a signed URL for an object path.
pub fn signed_url(bucket: &str, path: &str) -> String {
    format!("signed:{bucket}:{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_key() {
        let user = UserId::new();
        assert_eq!(
            collection(CollectionKind::Trash, &user),
            format!("trash:{user}")
        );
    }

    #[test]
    fn test_signed_url_key() {
        assert_eq!(signed_url("materials", "u/a.pdf"), "signed:materials:u/a.pdf");
    }
}
