//! Material domain entities.

pub mod model;

pub use model::{CreateMaterial, Material, MaterialPatch, file_type_of};
