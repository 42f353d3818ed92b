// Copyright @yucwang 2026

pub mod ao;
pub mod bsdf;
pub mod path;
