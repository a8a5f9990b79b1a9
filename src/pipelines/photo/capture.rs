// SPDX-License-Identifier: GPL-3.0-only

//! Filtered photo capture
//!
//! Decode → bound → render target → fused resize + filter → snapshot →
//! encode → temp file → photo library. Every intermediate is a [`Tracked`]
//! handle, so each one is released when it goes out of scope, whichever
//! stage fails.

use super::encoding::{EncodingFormat, PhotoEncoder};
use super::processing::{RenderTarget, bounded_size, decode_bytes, decode_path};
use super::resources::{ResourceKind, ResourceLedger, Tracked};
use crate::config::Config;
use crate::errors::PipelineResult;
use crate::filters::{Paint, SimulationFidelity};
use crate::storage::{PhotoLibrary, write_temp_file};
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Encoded photo to capture
#[derive(Debug, Clone)]
pub enum PhotoSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// Limits for one capture
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Longest side of the render target
    pub ceiling: u32,
    /// Maximum bytes any single decode or allocation may use
    pub memory_limit: Option<u64>,
    /// Staging directory for the encoded output
    pub temp_dir: PathBuf,
}

impl CaptureSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ceiling: config.processing_ceiling,
            memory_limit: None,
            temp_dir: config.temp_dir(),
        }
    }
}

/// Result of a successful capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    /// Where the photo library stored the photo
    pub saved_path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Encoded size
    pub bytes: usize,
}

/// Runs the capture path for one photo at a time
pub struct CapturePipeline {
    settings: CaptureSettings,
    fidelity: SimulationFidelity,
    encoder: PhotoEncoder,
    library: Arc<dyn PhotoLibrary>,
    ledger: ResourceLedger,
}

impl CapturePipeline {
    pub fn new(
        settings: CaptureSettings,
        fidelity: SimulationFidelity,
        encoder: PhotoEncoder,
        library: Arc<dyn PhotoLibrary>,
    ) -> Self {
        Self {
            settings,
            fidelity,
            encoder,
            library,
            ledger: ResourceLedger::new(),
        }
    }

    pub fn from_config(config: &Config, library: Arc<dyn PhotoLibrary>) -> Self {
        let config = config.clone().validated();
        let encoder = PhotoEncoder::with_settings(
            config.output_format.into(),
            config.output_quality.into(),
        );
        Self::new(
            CaptureSettings::from_config(&config),
            config.still_fidelity,
            encoder,
            library,
        )
    }

    /// Ledger of this pipeline's intermediate resources
    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Filter, encode and save one photo
    pub async fn run(&self, source: PhotoSource) -> PipelineResult<CaptureReport> {
        let format = self.encoder.format();
        let snapshot = self.render(source, format).await?;
        let (width, height) = (snapshot.width(), snapshot.height());

        let encoded = self.encoder.encode(snapshot).await?;
        let bytes = encoded.data.len();

        let temp = write_temp_file(&self.settings.temp_dir, &encoded.data, format.extension()).await?;
        drop(encoded);
        let temp = self.ledger.track(ResourceKind::TempFile, temp, bytes);

        let saved_path = self
            .library
            .save_to_library(temp.path(), format.media_type())
            .await?;
        drop(temp);

        info!(path = %saved_path.display(), width, height, bytes, "Captured filtered photo");
        Ok(CaptureReport {
            saved_path,
            width,
            height,
            bytes,
        })
    }

    /// Steps up to the snapshot, on the blocking pool
    async fn render(
        &self,
        source: PhotoSource,
        format: EncodingFormat,
    ) -> PipelineResult<Tracked<DynamicImage>> {
        let ledger = self.ledger.clone();
        let ceiling = self.settings.ceiling;
        let memory_limit = self.settings.memory_limit;
        let paint = Paint::shared(self.fidelity);

        tokio::task::spawn_blocking(move || {
            let decoded = match &source {
                PhotoSource::Path(path) => decode_path(path, memory_limit, &ledger)?,
                PhotoSource::Bytes(bytes) => decode_bytes(bytes, memory_limit, &ledger)?,
            };
            drop(source);

            let (width, height) = bounded_size(decoded.width(), decoded.height(), ceiling);
            debug!(
                source_width = decoded.width(),
                source_height = decoded.height(),
                width,
                height,
                "Bounded capture size"
            );

            let mut target = RenderTarget::allocate(width, height, memory_limit, &ledger)?;
            target.draw(&decoded, &paint);
            drop(decoded);

            target.snapshot(format.supports_alpha(), &ledger)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;
    use crate::pipelines::photo::EncodingQuality;
    use crate::storage::MediaType;
    use futures::future::BoxFuture;
    use std::path::Path;

    struct Recorder;

    impl PhotoLibrary for Recorder {
        fn save_to_library<'a>(
            &'a self,
            path: &'a Path,
            media_type: MediaType,
        ) -> BoxFuture<'a, PipelineResult<PathBuf>> {
            Box::pin(async move {
                assert!(path.exists());
                assert_eq!(media_type, MediaType::Png);
                Ok(PathBuf::from("saved.png"))
            })
        }
    }

    #[tokio::test]
    async fn test_png_capture_from_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = Vec::new();
        image::RgbaImage::from_pixel(30, 20, image::Rgba([0, 0, 255, 255]))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let settings = CaptureSettings {
            ceiling: 15,
            memory_limit: None,
            temp_dir: dir.path().to_path_buf(),
        };
        let encoder = PhotoEncoder::with_settings(EncodingFormat::Png, EncodingQuality::High);
        let pipeline =
            CapturePipeline::new(settings, SimulationFidelity::Brettel, encoder, Arc::new(Recorder));

        let report = pipeline.run(PhotoSource::Bytes(bytes)).await.unwrap();
        assert_eq!((report.width, report.height), (15, 10));
        assert_eq!(pipeline.ledger().live(), 0);
        assert_eq!(pipeline.ledger().total(), 4);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_decode_failure_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.temp_dir = Some(dir.path().to_path_buf());
        let pipeline = CapturePipeline::from_config(&config, Arc::new(Recorder));

        let err = pipeline
            .run(PhotoSource::Bytes(b"garbage".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
        assert_eq!(pipeline.ledger().live(), 0);
        assert_eq!(pipeline.ledger().total(), 0);
    }
}
