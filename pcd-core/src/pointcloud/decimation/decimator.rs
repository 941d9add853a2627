use rand::{rngs::StdRng, seq::index, SeedableRng};

use crate::pointcloud::point::PointCloud;

pub trait PointCloudDecimator {
    fn decimate(&mut self, point_cloud: PointCloud) -> PointCloud;
}

/// Uniform random subsampling down to a fixed point budget.
///
/// Indices are drawn without replacement and the result keeps them in the
/// order they were drawn. Clouds that already fit the budget are returned
/// as they are.
pub struct RandomDecimator {
    pub target: usize,
    rng: StdRng,
}

impl RandomDecimator {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(target: usize, seed: u64) -> Self {
        Self {
            target,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PointCloudDecimator for RandomDecimator {
    fn decimate(&mut self, point_cloud: PointCloud) -> PointCloud {
        if point_cloud.len() <= self.target {
            return point_cloud;
        }

        let indices = index::sample(&mut self.rng, point_cloud.len(), self.target).into_vec();
        point_cloud.select(&indices)
    }
}
