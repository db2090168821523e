//! Render statistics shared between worker threads.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters updated while rendering.
///
/// Workers batch their increments locally and add them once per query, so
/// the counters stay off the per-primitive hot path.
#[derive(Debug, Default)]
pub struct RenderStats {
    intersection_tests: AtomicU64,
    camera_rays: AtomicU64,
    shadow_rays: AtomicU64,
    reflection_rays: AtomicU64,
    refraction_rays: AtomicU64,
    rows_completed: AtomicU64,
}

/// Plain copy of the counters at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub intersection_tests: u64,
    pub camera_rays: u64,
    pub shadow_rays: u64,
    pub reflection_rays: u64,
    pub refraction_rays: u64,
    pub rows_completed: u64,
}

impl StatsSnapshot {
    /// Every ray traced, of any kind.
    pub fn total_rays(&self) -> u64 {
        self.camera_rays + self.shadow_rays + self.reflection_rays + self.refraction_rays
    }
}

impl RenderStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_intersection_tests(&self, n: u64) {
        if n > 0 {
            self.intersection_tests.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub fn add_camera_rays(&self, n: u64) {
        self.camera_rays.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_shadow_rays(&self, n: u64) {
        self.shadow_rays.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_reflection_rays(&self, n: u64) {
        self.reflection_rays.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_refraction_rays(&self, n: u64) {
        self.refraction_rays.fetch_add(n, Ordering::Relaxed);
    }

    /// Mark a row done and return how many rows are done now.
    pub fn row_completed(&self) -> u64 {
        self.rows_completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            intersection_tests: self.intersection_tests.load(Ordering::Relaxed),
            camera_rays: self.camera_rays.load(Ordering::Relaxed),
            shadow_rays: self.shadow_rays.load(Ordering::Relaxed),
            reflection_rays: self.reflection_rays.load(Ordering::Relaxed),
            refraction_rays: self.refraction_rays.load(Ordering::Relaxed),
            rows_completed: self.rows_completed.load(Ordering::Relaxed),
        }
    }

    /// Reset every counter to zero.
    pub fn reset(&self) {
        for counter in [
            &self.intersection_tests,
            &self.camera_rays,
            &self.shadow_rays,
            &self.reflection_rays,
            &self.refraction_rays,
            &self.rows_completed,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_counters_accumulate_across_threads() {
        let stats = RenderStats::new();
        (0..1000).into_par_iter().for_each(|_| {
            stats.add_intersection_tests(3);
            stats.add_shadow_rays(1);
        });
        let snap = stats.snapshot();
        assert_eq!(snap.intersection_tests, 3000);
        assert_eq!(snap.shadow_rays, 1000);
        assert_eq!(snap.total_rays(), 1000);
    }

    #[test]
    fn test_row_completed_counts_up() {
        let stats = RenderStats::new();
        assert_eq!(stats.row_completed(), 1);
        assert_eq!(stats.row_completed(), 2);
        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }
}
