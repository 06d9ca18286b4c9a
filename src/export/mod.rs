//! Export of discovered training sessions to disk.
//!
//! This module fetches each session's CSV export through the bridged
//! [`FlowClient`](crate::bridge::FlowClient), names the file after the
//! server's `Content-Disposition` header, and writes it into the output
//! directory. The main entry points are [`export_one`] and [`export_all`].

mod file_exporter;
mod filename;

// Re-export public API
pub use file_exporter::{export_all, export_one};
pub use filename::filename_from_content_disposition;
