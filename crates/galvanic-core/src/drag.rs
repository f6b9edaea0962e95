//! Drag resolution: pointer positions to one-way progress along a wire.

use galvanic_types::Point;

use crate::geometry::Path;

/// Where a dragged electron ends up after one pointer move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    /// New progress, never below the previous one.
    pub progress: f64,
    /// Position on the path at that progress.
    pub position: Point,
}

/// Resolve a drag point against `path`, starting from `current` progress.
pub fn resolve(path: &Path, point: Point, current: f64, samples: u32) -> Resolved {
    let progress = path.nearest_progress(point, current, samples);
    Resolved {
        progress,
        position: path.point_at_progress(progress),
    }
}

/// Whether `progress` is far enough along to count as reaching the end.
pub fn reached_end(progress: f64, threshold: f64) -> bool {
    progress >= threshold
}
