use image::RgbImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::error::{CardScanError, Result};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// Sequential source of decoded frames; `Ok(None)` marks end of stream
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// Sequential frame writer, closed once after the last frame
pub trait FrameSink {
    fn append_frame(&mut self, frame: &RgbImage) -> Result<()>;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Frames stored as image files in a directory, read in file name order
pub struct ImageSequenceSource {
    files: VecDeque<PathBuf>,
    position: usize,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|source| CardScanError::StreamOpen {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            })
            .collect();
        files.sort();

        tracing::info!(dir = %dir.display(), frames = files.len(), "opened frame sequence");
        Ok(Self {
            files: files.into(),
            position: 0,
        })
    }

    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.files.pop_front() else {
            return Ok(None);
        };
        let index = self.position;
        self.position += 1;

        let image = image::open(&path).map_err(|e| CardScanError::FrameRead {
            index,
            reason: format!("{}: {}", path.display(), e),
        })?;
        Ok(Some(image.to_rgb8()))
    }
}

/// Writes frames as numbered PNG files into a directory
pub struct ImageSequenceSink {
    dir: PathBuf,
    written: usize,
    closed: bool,
}

impl ImageSequenceSink {
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|source| CardScanError::StreamOpen {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            written: 0,
            closed: false,
        })
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{:05}.png", index))
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl FrameSink for ImageSequenceSink {
    fn append_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let index = self.written;
        if self.closed {
            return Err(CardScanError::FrameWrite {
                index,
                reason: "sink already closed".to_string(),
            });
        }
        let path = self.frame_path(index);
        frame.save(&path).map_err(|e| CardScanError::FrameWrite {
            index,
            reason: format!("{}: {}", path.display(), e),
        })?;
        self.written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        tracing::info!(dir = %self.dir.display(), frames = self.written, "output sequence closed");
        Ok(())
    }
}

/// In-memory frame source
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<RgbImage>,
}

impl MemorySource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }
}

/// In-memory frame sink
#[derive(Debug, Default)]
pub struct MemorySink {
    pub frames: Vec<RgbImage>,
    pub closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for MemorySink {
    fn append_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if self.closed {
            return Err(CardScanError::FrameWrite {
                index: self.frames.len(),
                reason: "sink already closed".to_string(),
            });
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
