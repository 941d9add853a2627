use pcd_core::pointcloud::point::PointCloud;

use super::Transform;

/// Shifts every point by a constant offset. Colors are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TranslationTransform {
    pub offset: [f64; 3],
}

impl TranslationTransform {
    pub fn new(offset: [f64; 3]) -> Self {
        Self { offset }
    }

    pub fn is_identity(&self) -> bool {
        self.offset == [0.0; 3]
    }
}

impl Transform for TranslationTransform {
    fn transform(&self, mut point_cloud: PointCloud) -> PointCloud {
        if self.is_identity() {
            return point_cloud;
        }
        for point in point_cloud.points_mut() {
            *point = point.translated(self.offset);
        }
        point_cloud
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcd_core::pointcloud::point::{Color, Point};

    fn make_cloud() -> PointCloud {
        let points = vec![
            Point::new(0.5, -1.25, 3.0),
            Point::new(10.0, 20.0, 30.0),
            Point::new(-7.75, 0.0, 0.125),
        ];
        let colors = vec![
            Color::new(1, 2, 3),
            Color::new(4, 5, 6),
            Color::new(7, 8, 9),
        ];
        PointCloud::with_colors(points, colors).unwrap()
    }

    #[test]
    fn translate_every_point() {
        let transformed = TranslationTransform::new([1.0, 2.0, 3.0]).transform(make_cloud());
        assert_eq!(
            transformed.points(),
            &[
                Point::new(1.5, 0.75, 6.0),
                Point::new(11.0, 22.0, 33.0),
                Point::new(-6.75, 2.0, 3.125),
            ]
        );
        assert_eq!(transformed.colors(), make_cloud().colors());
    }

    #[test]
    fn translate_round_trip_restores_coordinates() {
        let original = make_cloud();
        let forward = TranslationTransform::new([1.0, 2.0, 3.0]).transform(original.clone());
        let back = TranslationTransform::new([-1.0, -2.0, -3.0]).transform(forward);
        assert_eq!(back, original);
    }

    #[test]
    fn zero_offset_is_noop() {
        let transform = TranslationTransform::default();
        assert!(transform.is_identity());
        assert_eq!(transform.transform(make_cloud()), make_cloud());
    }
}
