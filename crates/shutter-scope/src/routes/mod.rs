//! HTTP routes

pub mod camera;
pub mod stream;
