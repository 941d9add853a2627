use std::error::Error;

use pcd_core::pointcloud::point::PointCloud;

use crate::pipeline::FrameViewer;

/// Reports the frame in the log instead of rendering it.
#[derive(Debug, Default)]
pub struct LogViewer;

impl FrameViewer for LogViewer {
    fn display(&mut self, title: &str, point_cloud: &PointCloud) -> Result<(), Box<dyn Error>> {
        match point_cloud.bounding_volume() {
            Some(bounds) => log::info!(
                "{}: {} points, min {:?}, max {:?}, colors: {}",
                title,
                point_cloud.len(),
                bounds.min,
                bounds.max,
                point_cloud.has_colors()
            ),
            None => log::info!("{}: empty point cloud", title),
        }
        Ok(())
    }
}

/// Sends the frame to a spawned Rerun viewer.
#[cfg(feature = "viewer")]
#[derive(Default)]
pub struct RerunViewer {
    recording: Option<rerun::RecordingStream>,
}

#[cfg(feature = "viewer")]
impl FrameViewer for RerunViewer {
    fn display(&mut self, title: &str, point_cloud: &PointCloud) -> Result<(), Box<dyn Error>> {
        let recording = match self.recording.take() {
            Some(recording) => recording,
            None => rerun::RecordingStreamBuilder::new("pcd-merge").spawn()?,
        };

        let positions = point_cloud.points().iter().map(|&p| <[f32; 3]>::from(p));
        let mut points = rerun::Points3D::new(positions);
        if let Some(colors) = point_cloud.colors() {
            points = points.with_colors(colors.iter().map(|c| rerun::Color::from_rgb(c.r, c.g, c.b)));
        }
        recording.log(title, &points)?;
        recording.flush_blocking();

        self.recording = Some(recording);
        Ok(())
    }
}

/// Picks the interactive viewer when it is compiled in.
pub fn default_viewer() -> Box<dyn FrameViewer> {
    #[cfg(feature = "viewer")]
    {
        Box::new(RerunViewer::default())
    }
    #[cfg(not(feature = "viewer"))]
    {
        Box::new(LogViewer)
    }
}
