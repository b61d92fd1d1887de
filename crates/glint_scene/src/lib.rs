//! Glint scene data - model and texture assets for the forward renderer.
//!
//! This crate provides:
//!
//! - **Mesh**: GPU-agnostic triangle geometry with computed normals and bounds
//! - **OBJ loading**: wavefront files via tobj
//! - **Texture**: diffuse map decoding ready for GPU upload
//!
//! The types here are deliberately decoupled from any GPU API; the viewport
//! converts them into vertex/texture resources.

pub mod mesh;
pub mod obj;
pub mod texture;

// Re-export commonly used types
pub use mesh::Mesh;
pub use obj::{load_obj, ObjError};
pub use texture::{Texture, TextureError};
