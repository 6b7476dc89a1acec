//! giri-map - Real-time 3D voxel mapping backend
//!
//! Ingests timestamped range-sensor point clouds, compresses them into
//! voxel statistics fast enough for sensor-rate operation, and threads the
//! surrounding pipeline stages (odometry, mapping, meshing, transform
//! broadcast, visualization) together without any stage blocking another.
//!
//! # Architecture
//!
//! The crate is organized into 6 logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   threads/                          │  ← Worker loops + orchestrator
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    state/                           │  ← Buffers, gates, shared flags
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │               engine/  +  io/                       │  ← External algorithm & transport seams
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │              mapping/  +  mesh/                     │  ← Voxel structures, mesh builder
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation types
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Concurrency model
//!
//! One named worker thread per pipeline stage, each on its own fixed-rate
//! polling loop. Stages hand data to each other exclusively through bounded
//! [`state::PipelineBuffer`]s (drop-oldest on overflow, freshness over
//! completeness) and decide publication staleness independently through
//! [`state::PublicationGate`]s. No cross-stage locking, so the lock graph
//! stays acyclic. Shutdown is a cooperative token checked every iteration;
//! the owning [`threads::MappingPipeline`] joins all workers explicitly.

// Layer 1: Core foundation (no internal deps)
pub mod core;

// Layer 2: Voxel structures and mesh building (depends on core)
pub mod mapping;
pub mod mesh;

// Layer 3: External seams (depends on core, mapping, mesh)
pub mod engine;
pub mod io;

// Layer 4: Cross-thread primitives
pub mod state;

// Layer 5: Worker loops and the pipeline orchestrator
pub mod threads;

mod config;
mod error;

pub use config::{BufferConfig, FrameIds, PipelineConfig, VisualizationConfig};
pub use error::{Error, Result};
