//! Background surface mesh building.

mod builder;

pub use builder::{MeshBuilder, MeshSnapshot, SurfaceReconstructor};
