use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::output_format::OutputFormat;

/// Abstracts video encoding so the pipeline can write output without
/// depending on a specific codec library.
pub trait VideoWriter: Send {
    fn open(&mut self, path: &Path, format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>>;

    /// Frames must match the size given to `open`.
    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes pending packets and releases the encoder. Closing an
    /// unopened or already closed writer is a no-op.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
