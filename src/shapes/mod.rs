// Copyright @yucwang 2026

pub mod cube;
pub mod rectangle;
pub mod sphere;
pub mod triangle;
pub mod triangle_mesh;
