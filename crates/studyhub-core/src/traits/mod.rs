//! Collaborator traits defined in `studyhub-core` and implemented by other crates.

pub mod blob;
pub mod identity;
pub mod notify;
pub mod store;

pub use blob::{BlobStore, UploadedObject};
pub use identity::{AuthUser, IdentityProvider};
pub use notify::{Notification, NotificationVariant, Notifier};
pub use store::{EntityStore, Row, Table};
