//! Encoding strategies and the fixed fallback cascades

mod avi;
mod buffer;
mod ffmpeg;
mod gif;
mod mp4;
mod sequence;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::application::ports::{EncodeError, EncodingStrategy, EndOutcome};
use crate::domain::capture::{CompressedFrame, Frame};
use crate::domain::encoding::{ContainerFamily, EncodingSettings, StrategyKind};

pub use avi::AviStrategy;
pub use ffmpeg::FfmpegStrategy;
pub use gif::GifStrategy;
pub use mp4::Mp4Strategy;
pub use sequence::{HtmlSequenceStrategy, ImageSequenceStrategy};

/// Closed set of encoder variants, so a cascade is a plain `Vec<Strategy>`
#[derive(Debug)]
pub enum Strategy {
    External(FfmpegStrategy),
    Mp4(Mp4Strategy),
    Avi(AviStrategy),
    Gif(GifStrategy),
    ImageSequence(ImageSequenceStrategy),
    HtmlSequence(HtmlSequenceStrategy),
}

impl Strategy {
    pub fn new(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::External => Self::External(FfmpegStrategy::new()),
            StrategyKind::Mp4 => Self::Mp4(Mp4Strategy::new()),
            StrategyKind::Avi => Self::Avi(AviStrategy::new()),
            StrategyKind::Gif => Self::Gif(GifStrategy::new()),
            StrategyKind::ImageSequence => Self::ImageSequence(ImageSequenceStrategy::new()),
            StrategyKind::HtmlSequence => Self::HtmlSequence(HtmlSequenceStrategy::new()),
        }
    }

    /// Strategies for the requested family, most preferred first
    pub fn cascade_for(settings: &EncodingSettings) -> Vec<Self> {
        cascade_kinds(settings.container, settings.external_encoder)
            .into_iter()
            .map(Self::new)
            .collect()
    }
}

/// Deterministic cascade order per container family
pub fn cascade_kinds(family: ContainerFamily, external_encoder: bool) -> Vec<StrategyKind> {
    use StrategyKind::*;

    match family {
        ContainerFamily::Mp4 => {
            let mut kinds = Vec::with_capacity(6);
            if external_encoder {
                kinds.push(External);
            }
            kinds.extend([Mp4, Avi, Gif, ImageSequence, HtmlSequence]);
            kinds
        }
        ContainerFamily::Avi => vec![Avi, Mp4, Gif, ImageSequence, HtmlSequence],
        ContainerFamily::Gif => vec![Gif, Mp4, Avi, ImageSequence, HtmlSequence],
        ContainerFamily::ImageSequence => vec![ImageSequence, HtmlSequence],
        ContainerFamily::HtmlSequence => vec![HtmlSequence],
    }
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Strategy::External($s) => $body,
            Strategy::Mp4($s) => $body,
            Strategy::Avi($s) => $body,
            Strategy::Gif($s) => $body,
            Strategy::ImageSequence($s) => $body,
            Strategy::HtmlSequence($s) => $body,
        }
    };
}

#[async_trait]
impl EncodingStrategy for Strategy {
    fn kind(&self) -> StrategyKind {
        dispatch!(self, s => s.kind())
    }

    async fn begin(&mut self, path: &Path, settings: &EncodingSettings) -> Result<PathBuf, EncodeError> {
        dispatch!(self, s => s.begin(path, settings).await)
    }

    async fn submit(&mut self, frame: &Frame) -> Result<(), EncodeError> {
        dispatch!(self, s => s.submit(frame).await)
    }

    async fn submit_compressed(&mut self, frame: &CompressedFrame) -> Result<(), EncodeError> {
        dispatch!(self, s => s.submit_compressed(frame).await)
    }

    async fn end(&mut self) -> Result<EndOutcome, EncodeError> {
        dispatch!(self, s => s.end().await)
    }

    fn abandon(&mut self) {
        dispatch!(self, s => s.abandon())
    }

    fn is_active(&self) -> bool {
        dispatch!(self, s => s.is_active())
    }

    fn buffered_bytes(&self) -> u64 {
        dispatch!(self, s => s.buffered_bytes())
    }
}
