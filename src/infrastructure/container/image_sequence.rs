//! Numbered still images plus a JSON manifest

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::domain::capture::CompressedFrame;
use crate::domain::encoding::QualityTier;

pub const MANIFEST_NAME: &str = "manifest.json";

/// `<dir>/<stem>_frames` for an output path `<dir>/<stem>.<ext>`
pub fn frames_dir(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".to_string());
    output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}_frames", stem))
}

/// `frame_000001.jpg` for the first frame
pub fn frame_file_name(index: usize, extension: &str) -> String {
    format!("frame_{:06}.{}", index, extension)
}

/// One image listed in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub index: usize,
    pub file: String,
    pub bytes: u64,
    pub offset_ms: u64,
}

/// Human-readable description of a frame directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceManifest {
    pub name: String,
    pub frame_rate: u32,
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
    pub quality: String,
    pub format: String,
    pub created: DateTime<Utc>,
    pub frames: Vec<ManifestEntry>,
}

/// Writes frames as numbered images into a directory
#[derive(Debug, Clone)]
pub struct ImageSequenceWriter {
    dir: PathBuf,
    frame_rate: u32,
}

impl ImageSequenceWriter {
    pub fn new(dir: impl Into<PathBuf>, frame_rate: u32) -> Self {
        Self {
            dir: dir.into(),
            frame_rate: frame_rate.max(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist every frame, returning one entry per image written
    pub async fn write_frames(&self, frames: &[CompressedFrame]) -> io::Result<Vec<ManifestEntry>> {
        fs::create_dir_all(&self.dir).await?;
        let mut entries = Vec::with_capacity(frames.len());
        for (i, frame) in frames.iter().enumerate() {
            let index = i + 1;
            let file = frame_file_name(index, frame.format().extension());
            fs::write(self.dir.join(&file), frame.data()).await?;
            entries.push(ManifestEntry {
                index,
                file,
                bytes: frame.len() as u64,
                offset_ms: i as u64 * 1000 / self.frame_rate as u64,
            });
        }
        Ok(entries)
    }

    /// Persist frames plus `manifest.json`; returns the manifest path
    pub async fn write(
        &self,
        name: &str,
        quality: QualityTier,
        frames: &[CompressedFrame],
    ) -> io::Result<PathBuf> {
        let entries = self.write_frames(frames).await?;
        let (width, height) = frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((0, 0));
        let manifest = SequenceManifest {
            name: name.to_string(),
            frame_rate: self.frame_rate,
            frame_count: entries.len(),
            width,
            height,
            quality: quality.as_str().to_string(),
            format: frames
                .first()
                .map(|f| f.format().extension())
                .unwrap_or("jpg")
                .to_string(),
            created: Utc::now(),
            frames: entries,
        };

        let path = self.dir.join(MANIFEST_NAME);
        let json = serde_json::to_string_pretty(&manifest)?;
        fs::write(&path, json).await?;
        Ok(path)
    }
}
