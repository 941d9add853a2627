use std::{
    error::Error,
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use indicatif::ProgressBar;
use serde::Serialize;

use pcd_core::pointcloud::{
    decimation::decimator::{PointCloudDecimator as _, RandomDecimator},
    merge::merge,
    point::PointCloud,
};
use pcd_exporter::ExportError;
use pcd_parser::{parsers::Extension, sequence::sorted_frame_files, ParseError};
use pcd_transformer::{
    builder::ShiftTransformBuilder,
    runner::{PointCloudTransformer, Transformer as _},
};

use crate::{
    error::MergeError,
    summary::{MergeSummary, SkippedFrame, WrittenFrame},
};

/// Reads and writes frame files.
pub trait FrameCodec {
    fn read(&self, path: &Path) -> Result<PointCloud, ParseError>;
    fn write(&self, path: &Path, point_cloud: &PointCloud) -> Result<(), ExportError>;
}

/// Shows a merged frame to the user.
pub trait FrameViewer {
    fn display(&mut self, title: &str, point_cloud: &PointCloud) -> Result<(), Box<dyn Error>>;
}

/// Asks the user a yes/no question.
pub trait Confirmation {
    fn confirm(&mut self, message: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub folder1: PathBuf,
    pub folder2: PathBuf,
    pub destination: PathBuf,
    pub shift: [f64; 3],
    pub max_frames: Option<NonZeroUsize>,
    pub downsample: Option<NonZeroUsize>,
    pub verbose: bool,
    pub pause_first: bool,
    pub seed: Option<u64>,
    pub extension: Extension,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Idle,
    Processing(usize),
    PausedForConfirmation(usize),
    Done,
    Aborted,
}

/// Number of frames a run attempts.
pub fn sequence_bound(len1: usize, len2: usize, max_frames: Option<NonZeroUsize>) -> usize {
    let bound = len1.min(len2);
    match max_frames {
        Some(max) => bound.min(max.get()),
        None => bound,
    }
}

fn first_token(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    file_name.split('_').next().unwrap_or_default().to_string()
}

/// `<first token of a>_<first token of b>_<index + 1, 4 digits>.<ext>`
pub fn output_file_name(first: &Path, second: &Path, index: usize, extension: Extension) -> String {
    format!(
        "{}_{}_{:04}.{}",
        first_token(first),
        first_token(second),
        index + 1,
        extension
    )
}

pub struct MergePipeline {
    config: MergeConfig,
    codec: Box<dyn FrameCodec>,
    viewer: Box<dyn FrameViewer>,
    confirmation: Box<dyn Confirmation>,
    transformer: PointCloudTransformer,
    decimator: Option<RandomDecimator>,
    progress: ProgressBar,
    visualized: bool,
    paused: bool,
}

impl MergePipeline {
    pub fn new(
        config: MergeConfig,
        codec: Box<dyn FrameCodec>,
        viewer: Box<dyn FrameViewer>,
        confirmation: Box<dyn Confirmation>,
    ) -> Self {
        let transformer = PointCloudTransformer::new(&ShiftTransformBuilder::new(config.shift));
        let decimator = config.downsample.map(|target| match config.seed {
            Some(seed) => RandomDecimator::with_seed(target.get(), seed),
            None => RandomDecimator::new(target.get()),
        });

        Self {
            config,
            codec,
            viewer,
            confirmation,
            transformer,
            decimator,
            progress: ProgressBar::hidden(),
            visualized: false,
            paused: false,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn run(&mut self) -> Result<MergeSummary, MergeError> {
        let extension = self.config.extension;
        let files1 = sorted_frame_files(&self.config.folder1, extension)?;
        let files2 = sorted_frame_files(&self.config.folder2, extension)?;

        for (files, folder) in [(&files1, &self.config.folder1), (&files2, &self.config.folder2)] {
            if files.is_empty() {
                return Err(MergeError::NoFrames {
                    folder: folder.clone(),
                    extension,
                });
            }
        }

        let bound = sequence_bound(files1.len(), files2.len(), self.config.max_frames);

        fs::create_dir_all(&self.config.destination).map_err(|e| {
            MergeError::CreateDestination {
                path: self.config.destination.clone(),
                source: e,
            }
        })?;
        log::info!("Starting merge: {} frames will be processed.", bound);

        self.progress.set_length(bound as u64);
        let mut summary = MergeSummary::new(bound);
        let mut state = PipelineState::Idle;
        loop {
            state = match state {
                PipelineState::Idle => advance(None, bound),
                PipelineState::Processing(i) => {
                    let written = self.process_frame(i, &files1[i], &files2[i], &mut summary);
                    self.progress.inc(1);
                    if written && self.config.pause_first && !self.paused {
                        PipelineState::PausedForConfirmation(i)
                    } else {
                        advance(Some(i), bound)
                    }
                }
                PipelineState::PausedForConfirmation(i) => {
                    self.paused = true;
                    if self.confirm_first_frame(&summary) {
                        advance(Some(i), bound)
                    } else {
                        self.progress.suspend(|| log::info!("Exiting process."));
                        PipelineState::Aborted
                    }
                }
                PipelineState::Done | PipelineState::Aborted => break,
            };
        }
        self.progress.finish_and_clear();

        summary.state = state;
        Ok(summary)
    }

    /// Merges one frame pair. Returns whether an output file was written.
    fn process_frame(
        &mut self,
        index: usize,
        path1: &Path,
        path2: &Path,
        summary: &mut MergeSummary,
    ) -> bool {
        let pair = self
            .read_frame(path1)
            .and_then(|first| Ok((first, self.read_frame(path2)?)));
        let (first, second) = match pair {
            Ok(pair) => pair,
            Err(reason) => {
                self.progress
                    .suspend(|| log::warn!("Skipping frame {} due to read error: {}", index, reason));
                summary.skipped.push(SkippedFrame { index, reason });
                return false;
            }
        };

        let second = self.transformer.execute(second);
        let (first, second) = match self.decimator.as_mut() {
            Some(decimator) => (decimator.decimate(first), decimator.decimate(second)),
            None => (first, second),
        };
        let merged = merge(first, second);

        let file_name = output_file_name(path1, path2, index, self.config.extension);
        let out_path = self.config.destination.join(&file_name);
        if let Err(e) = self.codec.write(&out_path, &merged) {
            let reason = e.to_string();
            self.progress
                .suspend(|| log::warn!("Skipping frame {} due to write error: {}", index, reason));
            summary.skipped.push(SkippedFrame { index, reason });
            return false;
        }
        log::debug!("wrote {} ({} points)", out_path.display(), merged.len());

        if self.config.verbose && !self.visualized {
            self.visualized = true;
            if let Err(e) = self.viewer.display(&file_name, &merged) {
                self.progress
                    .suspend(|| log::warn!("Failed to display {}: {}", file_name, e));
            }
        }

        summary.written.push(WrittenFrame {
            index,
            path: out_path,
            point_count: merged.len(),
            bounding_volume: merged.bounding_volume(),
        });
        true
    }

    fn read_frame(&self, path: &Path) -> Result<PointCloud, String> {
        self.codec
            .read(path)
            .map_err(|e| format!("{}: {}", path.display(), e))
    }

    fn confirm_first_frame(&mut self, summary: &MergeSummary) -> bool {
        let output = summary
            .written
            .last()
            .map(|frame| frame.path.display().to_string())
            .unwrap_or_default();
        let confirmation = &mut self.confirmation;
        self.progress.suspend(|| {
            println!("Paused on first frame: {}", output);
            confirmation.confirm("Continue processing? (y/n): ")
        })
    }
}

fn advance(current: Option<usize>, bound: usize) -> PipelineState {
    let next = current.map_or(0, |i| i + 1);
    if next < bound {
        PipelineState::Processing(next)
    } else {
        PipelineState::Done
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        collections::{HashMap, HashSet},
        rc::Rc,
    };

    use pcd_core::pointcloud::point::{Color, Point};

    use super::*;

    type Written = Rc<RefCell<Vec<(PathBuf, PointCloud)>>>;

    #[derive(Default)]
    struct FakeCodec {
        frames: HashMap<String, PointCloud>,
        corrupt: HashSet<String>,
        unwritable: HashSet<String>,
        written: Written,
    }

    impl FrameCodec for FakeCodec {
        fn read(&self, path: &Path) -> Result<PointCloud, ParseError> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if self.corrupt.contains(&name) {
                return Err(ParseError::InvalidHeader("missing 'ply' magic".to_string()));
            }
            Ok(self.frames.get(&name).cloned().unwrap_or_default())
        }

        fn write(&self, path: &Path, point_cloud: &PointCloud) -> Result<(), ExportError> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if self.unwritable.contains(&name) {
                return Err(ExportError::CreateFile {
                    path: path.display().to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                });
            }
            self.written
                .borrow_mut()
                .push((path.to_path_buf(), point_cloud.clone()));
            Ok(())
        }
    }

    struct RecordingViewer(Rc<RefCell<Vec<String>>>);

    impl FrameViewer for RecordingViewer {
        fn display(&mut self, title: &str, _point_cloud: &PointCloud) -> Result<(), Box<dyn Error>> {
            self.0.borrow_mut().push(title.to_string());
            Ok(())
        }
    }

    struct ScriptedConfirmation {
        answer: bool,
        asked: Rc<Cell<usize>>,
    }

    impl Confirmation for ScriptedConfirmation {
        fn confirm(&mut self, _message: &str) -> bool {
            self.asked.set(self.asked.get() + 1);
            self.answer
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        config: MergeConfig,
        codec: FakeCodec,
        displayed: Rc<RefCell<Vec<String>>>,
        asked: Rc<Cell<usize>>,
        answer: bool,
    }

    impl Fixture {
        /// Two capture folders with `len1` and `len2` empty frame files.
        fn new(len1: usize, len2: usize) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let folder1 = dir.path().join("video1");
            let folder2 = dir.path().join("video2");
            fs::create_dir(&folder1).unwrap();
            fs::create_dir(&folder2).unwrap();
            for i in 0..len1 {
                fs::write(folder1.join(format!("cam1_{:04}.ply", i + 1)), b"").unwrap();
            }
            for i in 0..len2 {
                fs::write(folder2.join(format!("sceneX_{:04}.ply", i + 40)), b"").unwrap();
            }

            let config = MergeConfig {
                folder1,
                folder2,
                destination: dir.path().join("out"),
                shift: [0.0; 3],
                max_frames: None,
                downsample: None,
                verbose: false,
                pause_first: false,
                seed: Some(1),
                extension: Extension::Ply,
            };
            Self {
                _dir: dir,
                config,
                codec: FakeCodec::default(),
                displayed: Rc::default(),
                asked: Rc::default(),
                answer: true,
            }
        }

        fn run(self) -> (Result<MergeSummary, MergeError>, Written, Self) {
            let written = self.codec.written.clone();
            let mut pipeline = MergePipeline::new(
                self.config.clone(),
                Box::new(FakeCodec {
                    frames: self.codec.frames.clone(),
                    corrupt: self.codec.corrupt.clone(),
                    unwritable: self.codec.unwritable.clone(),
                    written: written.clone(),
                }),
                Box::new(RecordingViewer(self.displayed.clone())),
                Box::new(ScriptedConfirmation {
                    answer: self.answer,
                    asked: self.asked.clone(),
                }),
            );
            let result = pipeline.run();
            (result, written, self)
        }
    }

    fn written_names(written: &Written) -> Vec<String> {
        written
            .borrow()
            .iter()
            .map(|(path, _)| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn colored_cloud(n: usize, base: f64) -> PointCloud {
        let points = (0..n).map(|i| Point::new(base + i as f64, base, base)).collect();
        let colors = (0..n).map(|i| Color::new(i as u8, base as u8, 0)).collect();
        PointCloud::with_colors(points, colors).unwrap()
    }

    #[test]
    fn bound_is_shorter_sequence_and_cap() {
        assert_eq!(sequence_bound(5, 7, None), 5);
        assert_eq!(sequence_bound(5, 7, NonZeroUsize::new(3)), 3);
        assert_eq!(sequence_bound(5, 7, NonZeroUsize::new(10)), 5);
        assert_eq!(sequence_bound(9, 2, None), 2);
    }

    #[test]
    fn output_name_uses_first_tokens_and_position() {
        let name = output_file_name(
            Path::new("/a/cam1_0007.ply"),
            Path::new("/b/sceneX_0042.ply"),
            6,
            Extension::Ply,
        );
        assert_eq!(name, "cam1_sceneX_0007.ply");

        let name = output_file_name(
            Path::new("left_take_2_0001.ply"),
            Path::new("scan.ply"),
            0,
            Extension::Ply,
        );
        assert_eq!(name, "left_scan.ply_0001.ply");
    }

    #[test]
    fn attempts_exactly_the_shorter_sequence() {
        let (result, written, _) = Fixture::new(5, 7).run();
        let summary = result.unwrap();
        assert_eq!(summary.bound, 5);
        assert_eq!(summary.state, PipelineState::Done);
        assert_eq!(summary.attempted(), 5);
        assert_eq!(
            written_names(&written),
            [
                "cam1_sceneX_0001.ply",
                "cam1_sceneX_0002.ply",
                "cam1_sceneX_0003.ply",
                "cam1_sceneX_0004.ply",
                "cam1_sceneX_0005.ply",
            ]
        );
    }

    #[test]
    fn max_frames_caps_the_run() {
        let mut fixture = Fixture::new(5, 7);
        fixture.config.max_frames = NonZeroUsize::new(3);
        let (result, written, _) = fixture.run();
        assert_eq!(result.unwrap().attempted(), 3);
        assert_eq!(written.borrow().len(), 3);
    }

    #[test]
    fn unreadable_frame_is_skipped() {
        let mut fixture = Fixture::new(5, 5);
        fixture.codec.corrupt.insert("sceneX_0042.ply".to_string());
        let (result, written, _) = fixture.run();

        let summary = result.unwrap();
        assert_eq!(summary.state, PipelineState::Done);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].index, 2);
        assert!(summary.skipped[0].reason.contains("sceneX_0042.ply"));
        assert_eq!(
            written_names(&written),
            [
                "cam1_sceneX_0001.ply",
                "cam1_sceneX_0002.ply",
                "cam1_sceneX_0004.ply",
                "cam1_sceneX_0005.ply",
            ]
        );
    }

    #[test]
    fn declining_pause_aborts_after_first_frame() {
        let mut fixture = Fixture::new(4, 4);
        fixture.config.pause_first = true;
        fixture.answer = false;
        let (result, written, fixture) = fixture.run();

        let summary = result.unwrap();
        assert_eq!(summary.state, PipelineState::Aborted);
        assert_eq!(written_names(&written), ["cam1_sceneX_0001.ply"]);
        assert_eq!(fixture.asked.get(), 1);
    }

    #[test]
    fn accepting_pause_asks_once_and_continues() {
        let mut fixture = Fixture::new(4, 4);
        fixture.config.pause_first = true;
        let (result, written, fixture) = fixture.run();

        assert_eq!(result.unwrap().state, PipelineState::Done);
        assert_eq!(written.borrow().len(), 4);
        assert_eq!(fixture.asked.get(), 1);
    }

    #[test]
    fn pause_waits_for_first_written_frame() {
        let mut fixture = Fixture::new(3, 3);
        fixture.config.pause_first = true;
        fixture.answer = false;
        fixture.codec.corrupt.insert("cam1_0001.ply".to_string());
        let (result, written, _) = fixture.run();

        let summary = result.unwrap();
        assert_eq!(summary.state, PipelineState::Aborted);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(written_names(&written), ["cam1_sceneX_0002.ply"]);
    }

    #[test]
    fn verbose_displays_only_the_first_merged_frame() {
        let mut fixture = Fixture::new(3, 3);
        fixture.config.verbose = true;
        let (result, _, fixture) = fixture.run();

        result.unwrap();
        assert_eq!(*fixture.displayed.borrow(), ["cam1_sceneX_0001.ply"]);
    }

    #[test]
    fn quiet_run_displays_nothing() {
        let (result, _, fixture) = Fixture::new(2, 2).run();
        result.unwrap();
        assert!(fixture.displayed.borrow().is_empty());
        assert_eq!(fixture.asked.get(), 0);
    }

    #[test]
    fn second_cloud_is_shifted_and_appended() {
        let mut fixture = Fixture::new(1, 1);
        fixture.config.shift = [10.0, 0.0, -1.0];
        let first = colored_cloud(3, 1.0);
        let second = colored_cloud(4, 2.0);
        fixture
            .codec
            .frames
            .insert("cam1_0001.ply".to_string(), first.clone());
        fixture
            .codec
            .frames
            .insert("sceneX_0040.ply".to_string(), second.clone());
        let (result, written, _) = fixture.run();
        result.unwrap();

        let written = written.borrow();
        let merged = &written[0].1;
        assert_eq!(merged.len(), 7);
        assert_eq!(&merged.points()[..3], first.points());
        let shifted: Vec<Point> = second
            .points()
            .iter()
            .map(|p| p.translated([10.0, 0.0, -1.0]))
            .collect();
        assert_eq!(&merged.points()[3..], shifted.as_slice());
        let colors = merged.colors().unwrap();
        assert_eq!(&colors[..3], first.colors().unwrap());
        assert_eq!(&colors[3..], second.colors().unwrap());
    }

    #[test]
    fn downsample_applies_to_both_clouds() {
        let mut fixture = Fixture::new(1, 1);
        fixture.config.downsample = NonZeroUsize::new(10);
        fixture
            .codec
            .frames
            .insert("cam1_0001.ply".to_string(), colored_cloud(100, 0.0));
        fixture
            .codec
            .frames
            .insert("sceneX_0040.ply".to_string(), colored_cloud(5, 200.0));
        let (result, written, _) = fixture.run();
        result.unwrap();

        let written = written.borrow();
        let merged = &written[0].1;
        assert_eq!(merged.len(), 15);
        assert!(merged.points()[..10].iter().all(|p| p.y == 0.0));
        assert_eq!(&merged.points()[10..], colored_cloud(5, 200.0).points());
    }

    #[test]
    fn empty_folder_is_a_configuration_error() {
        let fixture = Fixture::new(3, 0);
        let destination = fixture.config.destination.clone();
        let (result, written, _) = fixture.run();

        assert!(matches!(result, Err(MergeError::NoFrames { .. })));
        assert!(written.borrow().is_empty());
        assert!(!destination.exists());
    }

    #[test]
    fn unwritable_frame_is_skipped() {
        let mut fixture = Fixture::new(3, 3);
        fixture
            .codec
            .unwritable
            .insert("cam1_sceneX_0001.ply".to_string());
        let (result, written, _) = fixture.run();

        let summary = result.unwrap();
        assert_eq!(summary.state, PipelineState::Done);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].index, 0);
        assert!(summary.skipped[0].reason.contains("cam1_sceneX_0001.ply"));
        assert_eq!(
            written_names(&written),
            ["cam1_sceneX_0002.ply", "cam1_sceneX_0003.ply"]
        );
    }

    #[test]
    fn verbose_displays_first_frame_actually_merged() {
        let mut fixture = Fixture::new(3, 3);
        fixture.config.verbose = true;
        fixture.codec.corrupt.insert("cam1_0001.ply".to_string());
        let (result, _, fixture) = fixture.run();

        assert_eq!(result.unwrap().skipped.len(), 1);
        assert_eq!(*fixture.displayed.borrow(), ["cam1_sceneX_0002.ply"]);
    }
}
