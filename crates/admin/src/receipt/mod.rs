//! Order receipts.
//!
//! # Architecture
//!
//! Rendering is split into stages that can be tested on their own:
//!
//! 1. [`build_receipt`] - pure document tree from an order and a timestamp
//! 2. [`layout()`] - positions text and rules on a 400-unit canvas
//! 3. [`Rasterizer`] - paints the layout at 2× and encodes PNG
//! 4. [`FileSaver`] - writes `order-<orderNumber>-receipt.png` atomically
//!
//! [`ReceiptService`] runs the whole pipeline and reports the outcome to
//! the operator.

pub mod document;
pub mod font;
pub mod layout;
pub mod raster;
pub mod save;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use street_admin_core::Order;
use thiserror::Error;
use tracing::instrument;

pub use document::{Block, ItemLine, ReceiptDocument, Row, RowStyle, build_receipt};
pub use layout::{Color, DrawOp, Layout, layout};
pub use raster::{BitmapRasterizer, RECEIPT_SCALE, RasterImage, Rasterizer};
pub use save::{DirectorySaver, FileSaver};

use crate::config::ReceiptConfig;
use crate::error::AppError;
use crate::notify::Notifier;

pub const DOWNLOAD_SUCCESS_MESSAGE: &str = "Receipt downloaded successfully!";
pub const RECEIPT_FAILED_MESSAGE: &str = "Failed to generate receipt. Please try again.";

/// Receipt pipeline errors.
#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("Layout failed: {0}")]
    Layout(String),

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Saving receipt failed: {0}")]
    Save(#[from] std::io::Error),
}

/// `order-<orderNumber>-receipt.png`, with anything outside `[A-Za-z0-9_-]`
/// replaced by `_`.
#[must_use]
pub fn receipt_file_name(order_number: &str) -> String {
    let safe: String = order_number
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = if safe.is_empty() { "unknown" } else { &safe };
    format!("order-{safe}-receipt.png")
}

/// Build, lay out and rasterize the receipt for `order`.
///
/// # Errors
///
/// Returns `ReceiptError` from the layout or rasterization stage.
pub fn render_receipt(
    order: &Order,
    now: DateTime<Utc>,
    rasterizer: &dyn Rasterizer,
) -> Result<RasterImage, ReceiptError> {
    let document = build_receipt(order, now);
    let layout = layout(&document)?;
    rasterizer.rasterize(&layout, RECEIPT_SCALE)
}

/// A receipt written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReceipt {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Generates and saves receipts.
///
/// Never touches the order store.
#[derive(Clone)]
pub struct ReceiptService {
    rasterizer: Arc<dyn Rasterizer>,
    saver: Arc<dyn FileSaver>,
    notifier: Arc<dyn Notifier>,
    settle_delay: Duration,
}

impl std::fmt::Debug for ReceiptService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiptService")
            .field("settle_delay", &self.settle_delay)
            .finish_non_exhaustive()
    }
}

impl ReceiptService {
    #[must_use]
    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        saver: Arc<dyn FileSaver>,
        notifier: Arc<dyn Notifier>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            rasterizer,
            saver,
            notifier,
            settle_delay,
        }
    }

    /// Bitmap rasterizer saving into the configured directory.
    #[must_use]
    pub fn from_config(config: &ReceiptConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self::new(
            Arc::new(BitmapRasterizer),
            Arc::new(DirectorySaver::new(config.output_dir.clone())),
            notifier,
            config.settle_delay,
        )
    }

    /// Generate and save the receipt for `order` as of `now`.
    ///
    /// Waits the settling delay first; rasterizing and saving run on the
    /// blocking pool.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Receipt` if any stage fails.
    #[instrument(skip_all, fields(order_number = %order.order_number))]
    pub async fn generate(
        &self,
        order: &Order,
        now: DateTime<Utc>,
    ) -> Result<SavedReceipt, AppError> {
        tokio::time::sleep(self.settle_delay).await;

        let order = order.clone();
        let rasterizer = Arc::clone(&self.rasterizer);
        let saver = Arc::clone(&self.saver);

        let saved = tokio::task::spawn_blocking(move || -> Result<SavedReceipt, ReceiptError> {
            let image = render_receipt(&order, now, rasterizer.as_ref())?;
            let path = saver.save(&receipt_file_name(&order.order_number), &image.png)?;
            Ok(SavedReceipt {
                path,
                width: image.width,
                height: image.height,
            })
        })
        .await
        .map_err(|e| AppError::Internal(format!("receipt task failed: {e}")))??;

        tracing::info!(path = %saved.path.display(), "Receipt generated");
        Ok(saved)
    }

    /// Generate the receipt for `order` now and notify the operator.
    ///
    /// # Errors
    ///
    /// As [`generate`](Self::generate); the failure is also reported.
    pub async fn download(&self, order: &Order) -> Result<SavedReceipt, AppError> {
        match self.generate(order, Utc::now()).await {
            Ok(saved) => {
                self.notifier.success(DOWNLOAD_SUCCESS_MESSAGE);
                Ok(saved)
            }
            Err(e) => {
                e.report();
                self.notifier.error(RECEIPT_FAILED_MESSAGE);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use street_admin_core::OrderStatus;

    use super::*;
    use crate::notify::{MemoryNotifier, Notification};
    use crate::testing::order;

    fn now() -> DateTime<Utc> {
        "2024-08-01T09:30:00Z".parse().unwrap()
    }

    #[derive(Default)]
    struct CountingRasterizer {
        calls: AtomicUsize,
    }

    impl Rasterizer for CountingRasterizer {
        fn rasterize(&self, layout: &Layout, scale: u32) -> Result<RasterImage, ReceiptError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RasterImage {
                width: layout.width * scale,
                height: layout.height * scale,
                png: b"fake".to_vec(),
            })
        }
    }

    struct BrokenSaver;

    impl FileSaver for BrokenSaver {
        fn save(&self, _file_name: &str, _bytes: &[u8]) -> Result<PathBuf, ReceiptError> {
            Err(ReceiptError::Save(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn test_receipt_file_name() {
        assert_eq!(receipt_file_name("ORD-100"), "order-ORD-100-receipt.png");
        assert_eq!(receipt_file_name("../etc/x"), "order-___etc_x-receipt.png");
        assert_eq!(receipt_file_name("  "), "order-unknown-receipt.png");
    }

    #[test]
    fn test_render_is_idempotent() {
        let order = order("o1", "ORD-100", OrderStatus::Delivered);
        let first = render_receipt(&order, now(), &BitmapRasterizer).unwrap();
        let second = render_receipt(&order, now(), &BitmapRasterizer).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.width, 800);
        assert!(first.height >= 1200);
    }

    #[tokio::test]
    async fn test_download_saves_png_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(MemoryNotifier::new());
        let config = ReceiptConfig {
            output_dir: dir.path().to_path_buf(),
            settle_delay: Duration::ZERO,
        };
        let service = ReceiptService::from_config(&config, notifier.clone());

        let saved = service
            .download(&order("o1", "ORD-100", OrderStatus::Shipped))
            .await
            .unwrap();

        assert_eq!(saved.path, dir.path().join("order-ORD-100-receipt.png"));
        let bytes = std::fs::read(&saved.path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
        assert_eq!(
            notifier.entries(),
            vec![Notification::Success(DOWNLOAD_SUCCESS_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn test_save_failure_is_reported() {
        let notifier = Arc::new(MemoryNotifier::new());
        let service = ReceiptService::new(
            Arc::new(BitmapRasterizer),
            Arc::new(BrokenSaver),
            notifier.clone(),
            Duration::ZERO,
        );

        let err = service
            .download(&order("o1", "ORD-1", OrderStatus::Pending))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Receipt(ReceiptError::Save(_))));
        assert_eq!(
            notifier.last(),
            Some(Notification::Error(RECEIPT_FAILED_MESSAGE.to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_settling_delay_precedes_capture() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = Arc::new(CountingRasterizer::default());
        let service = ReceiptService::new(
            rasterizer.clone(),
            Arc::new(DirectorySaver::new(dir.path())),
            Arc::new(MemoryNotifier::new()),
            Duration::from_millis(100),
        );

        let started = tokio::time::Instant::now();
        service
            .generate(&order("o1", "ORD-1", OrderStatus::Pending), now())
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(100));
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 1);
    }
}
