// Downloader module - playlist orchestration over an extraction client

pub mod backends;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod task;
pub mod tools;
pub mod traits;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use backends::YtDlpClient;
pub use errors::DownloadError;
pub use models::{
    DownloadOptions, DownloadOutcome, MediaKind, Metadata, MetadataRequest, NetworkConfig,
    ProgressEvent, VideoEntry,
};
pub use orchestrator::{DownloadSettings, PlaylistDownloader};
pub use progress::ProgressReporter;
pub use task::{DownloadTask, TaskContext};
pub use tools::{ToolInfo, ToolManager, ToolType};
pub use traits::{ExtractionClient, ProgressSink};
