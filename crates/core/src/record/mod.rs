use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{render::RasterSurface, Result};

/// Configuration options for frame recording.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecordingSettings {
    pub output_dir: PathBuf,
    pub fps: u32,
    /// File name prefix; frames are numbered after it.
    pub prefix: String,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("frames"),
            fps: 60,
            prefix: "frame".to_string(),
        }
    }
}

/// Writes rendered frames as a numbered PNG sequence.
#[derive(Debug)]
pub struct FrameRecorder {
    settings: RecordingSettings,
    frames_written: u32,
}

impl FrameRecorder {
    /// Creates the output directory if it does not exist yet.
    pub fn new(settings: RecordingSettings) -> Result<Self> {
        std::fs::create_dir_all(&settings.output_dir)?;
        tracing::info!(
            dir = %settings.output_dir.display(),
            fps = settings.fps,
            "recording frames"
        );
        Ok(Self {
            settings,
            frames_written: 0,
        })
    }

    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }

    pub fn frames_written(&self) -> u32 {
        self.frames_written
    }

    pub fn frame_path(&self, index: u32) -> PathBuf {
        self.settings
            .output_dir
            .join(format!("{}_{index:05}.png", self.settings.prefix))
    }

    /// Encodes the surface's current raster as the next frame.
    pub fn capture(&mut self, surface: &RasterSurface) -> Result<PathBuf> {
        let bytes = surface.encode_png()?;
        let path = self.frame_path(self.frames_written);
        std::fs::write(&path, bytes)?;
        self.frames_written += 1;
        tracing::trace!(path = %path.display(), "frame written");
        Ok(path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.settings.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Color, DisplayList, Surface, SurfaceSize};

    #[test]
    fn writes_numbered_png_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let settings = RecordingSettings {
            output_dir: dir.path().join("out"),
            ..RecordingSettings::default()
        };
        let mut recorder = FrameRecorder::new(settings).unwrap();

        let size = SurfaceSize::new(8.0, 8.0, 1.0).unwrap();
        let mut surface = RasterSurface::with_size(size).unwrap();
        let mut frame = DisplayList::new();
        frame.clear(Color::WHITE);
        surface.present(&frame).unwrap();

        let first = recorder.capture(&surface).unwrap();
        let second = recorder.capture(&surface).unwrap();

        assert!(first.ends_with("frame_00000.png"));
        assert!(second.ends_with("frame_00001.png"));
        assert_eq!(recorder.frames_written(), 2);
        let bytes = std::fs::read(second).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn empty_surface_is_an_encode_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = FrameRecorder::new(RecordingSettings {
            output_dir: dir.path().to_path_buf(),
            ..RecordingSettings::default()
        })
        .unwrap();

        assert!(recorder.capture(&RasterSurface::new()).is_err());
        assert_eq!(recorder.frames_written(), 0);
    }
}
