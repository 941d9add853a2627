use pcd_core::pointcloud::point::PointCloud;

pub mod translation;

pub trait Transform {
    fn transform(&self, point_cloud: PointCloud) -> PointCloud;
}

pub struct CompositeTransform {
    transforms: Vec<Box<dyn Transform>>,
}

impl CompositeTransform {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }
}

impl Transform for CompositeTransform {
    fn transform(&self, point_cloud: PointCloud) -> PointCloud {
        self.transforms
            .iter()
            .fold(point_cloud, |pc, transform| transform.transform(pc))
    }
}
