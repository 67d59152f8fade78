//! Output stage: projections of the finished model for a renderer.
pub mod json;
pub mod text;
