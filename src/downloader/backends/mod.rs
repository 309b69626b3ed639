// Extraction client backends

pub mod ytdlp;

pub use ytdlp::YtDlpClient;
