//! Background mesh builder.
//!
//! Owns the reconstruction task's synchronization contract: at most one
//! build in flight, a snapshot that readers can always take without
//! blocking behind the build, and a state flag that cannot get stuck on
//! failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};

use nalgebra::Isometry3;

use crate::core::{PointCloud, TriangleMesh};
use crate::error::Result;

/// External surface reconstruction step (ball-pivoting, Poisson, ...).
///
/// Implementations must be safe to call from the builder's background
/// thread. A returned error aborts the build without touching the
/// published snapshot.
pub trait SurfaceReconstructor: Send + Sync + 'static {
    fn reconstruct(&self, cloud: &PointCloud, pose: &Isometry3<f64>) -> Result<TriangleMesh>;
}

/// A completed reconstruction result.
///
/// Immutable once published; readers hold it through an `Arc`, so a build
/// finishing underneath them never mutates what they see.
#[derive(Debug, Clone)]
pub struct MeshSnapshot {
    /// The reconstructed mesh, empty until the first build completes.
    pub mesh: TriangleMesh,
    /// Robot pose at the time the build was triggered.
    pub pose: Isometry3<f64>,
    /// Timestamp of the triggering map update, microseconds.
    pub timestamp_us: u64,
}

impl MeshSnapshot {
    fn empty() -> Self {
        Self {
            mesh: TriangleMesh::new(),
            pose: Isometry3::identity(),
            timestamp_us: crate::core::INVALID_TIMESTAMP,
        }
    }
}

struct Shared {
    /// Idle/Building state; the only writer-side gate.
    building: AtomicBool,
    /// Published snapshot, lock held only for the pointer swap.
    snapshot: RwLock<Arc<MeshSnapshot>>,
    /// Pose context handed to the reconstructor, updated at any rate.
    pose: Mutex<Isometry3<f64>>,
}

/// Releases the `building` flag on every exit path, including panics
/// inside the reconstructor.
struct BuildingGuard(Arc<Shared>);

impl Drop for BuildingGuard {
    fn drop(&mut self) {
        self.0.building.store(false, Ordering::SeqCst);
    }
}

/// Owner of the background reconstruction task.
///
/// State machine: `Idle → Building → Idle`. A request while `Building` is
/// a no-op (never queued). Failure inside the reconstructor releases the
/// state and leaves the previous snapshot untouched, surfacing only as a
/// continued "no new mesh" condition.
pub struct MeshBuilder {
    shared: Arc<Shared>,
    reconstructor: Arc<dyn SurfaceReconstructor>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MeshBuilder {
    pub fn new(reconstructor: Arc<dyn SurfaceReconstructor>) -> Self {
        Self {
            shared: Arc::new(Shared {
                building: AtomicBool::new(false),
                snapshot: RwLock::new(Arc::new(MeshSnapshot::empty())),
                pose: Mutex::new(Isometry3::identity()),
            }),
            reconstructor,
            worker: Mutex::new(None),
        }
    }

    /// Record the most recent robot pose for the next build.
    pub fn set_pose(&self, pose: Isometry3<f64>) {
        if let Ok(mut p) = self.shared.pose.lock() {
            *p = pose;
        }
    }

    /// Non-blocking point-in-time read of the build state.
    pub fn is_build_in_progress(&self) -> bool {
        self.shared.building.load(Ordering::SeqCst)
    }

    /// Last completed mesh; always safe to call, never blocks on a build.
    pub fn snapshot(&self) -> Arc<MeshSnapshot> {
        self.shared
            .snapshot
            .read()
            .map(|s| Arc::clone(&s))
            .unwrap_or_else(|poisoned| Arc::clone(&poisoned.into_inner()))
    }

    /// Start a background build from `cloud`.
    ///
    /// Returns `false` without doing anything if a build is already in
    /// flight; a second build is never queued.
    pub fn request_build(&self, cloud: PointCloud, timestamp_us: u64) -> bool {
        if self
            .shared
            .building
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("Mesh build already in progress, dropping request");
            return false;
        }

        let shared = Arc::clone(&self.shared);
        let reconstructor = Arc::clone(&self.reconstructor);
        let handle = thread::Builder::new()
            .name("mesh-build".into())
            .spawn(move || {
                let _guard = BuildingGuard(Arc::clone(&shared));
                let pose = shared
                    .pose
                    .lock()
                    .map(|p| *p)
                    .unwrap_or_else(|_| Isometry3::identity());
                match reconstructor.reconstruct(&cloud, &pose) {
                    Ok(mesh) => {
                        log::debug!(
                            "Mesh build finished: {} vertices, {} triangles",
                            mesh.num_vertices(),
                            mesh.num_triangles()
                        );
                        let fresh = Arc::new(MeshSnapshot {
                            mesh,
                            pose,
                            timestamp_us,
                        });
                        if let Ok(mut slot) = shared.snapshot.write() {
                            *slot = fresh;
                        }
                    }
                    Err(e) => {
                        // Previous snapshot stays published
                        log::warn!("Mesh build failed: {}", e);
                    }
                }
            });

        match handle {
            Ok(handle) => {
                // Reap the previous (necessarily finished) worker first
                if let Ok(mut slot) = self.worker.lock() {
                    if let Some(old) = slot.replace(handle) {
                        let _ = old.join();
                    }
                }
                true
            }
            Err(e) => {
                log::error!("Failed to spawn mesh build thread: {}", e);
                self.shared.building.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Wait for any in-flight build to finish (used on shutdown).
    pub fn join(&self) {
        if let Ok(mut slot) = self.worker.lock() {
            if let Some(handle) = slot.take() {
                let _ = handle.join();
            }
        }
    }
}
