use image::RgbaImage;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::CaptureError;

/// Source of camera frames
///
/// `Ok(None)` means the source is exhausted and the game loop should stop.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<RgbaImage>, CaptureError>;

    /// Get source name (for logging)
    fn name(&self) -> String;
}

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Frames read from a directory of still images, in file name order
///
/// Stands in for a live camera: record a session to numbered files and the
/// loop replays it frame by frame.
pub struct ImageSequenceSource {
    root: PathBuf,
    frames: Vec<PathBuf>,
    position: usize,
    looping: bool,
    expected_size: Option<(u32, u32)>,
}

impl ImageSequenceSource {
    /// Scan `dir` for image files
    pub fn open(dir: &Path) -> Result<Self, CaptureError> {
        if !dir.is_dir() {
            return Err(CaptureError::DirectoryNotFound {
                path: dir.display().to_string(),
            });
        }

        let mut frames = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && is_frame_file(entry.path()) {
                frames.push(entry.into_path());
            }
        }

        if frames.is_empty() {
            return Err(CaptureError::NoFrames {
                path: dir.display().to_string(),
            });
        }

        tracing::info!("Found {} frames in {}", frames.len(), dir.display());

        Ok(Self {
            root: dir.to_path_buf(),
            frames,
            position: 0,
            looping: false,
            expected_size: None,
        })
    }

    /// Restart from the first frame instead of stopping at the end
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Resize frames that don't match `width` x `height`
    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.expected_size = Some((width, height));
        self
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<RgbaImage>, CaptureError> {
        if self.position >= self.frames.len() {
            if !self.looping {
                return Ok(None);
            }
            self.position = 0;
        }

        let path = &self.frames[self.position];
        self.position += 1;

        let frame = image::open(path)
            .map_err(|source| CaptureError::DecodeFailed {
                path: path.display().to_string(),
                source,
            })?
            .to_rgba8();

        match self.expected_size {
            Some((width, height)) if frame.dimensions() != (width, height) => {
                tracing::debug!(
                    "Resizing {} from {:?} to {}x{}",
                    path.display(),
                    frame.dimensions(),
                    width,
                    height
                );
                Ok(Some(image::imageops::resize(
                    &frame,
                    width,
                    height,
                    image::imageops::FilterType::Triangle,
                )))
            }
            _ => Ok(Some(frame)),
        }
    }

    fn name(&self) -> String {
        format!("ImageSequence({})", self.root.display())
    }
}
