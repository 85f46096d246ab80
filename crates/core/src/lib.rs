//! Parikshak Core Library
//!
//! Analysis pipeline for classroom recordings: local voice metrics, streamed
//! emotion segments from a remote server, frame-by-frame body-language
//! analysis, and a model-written pedagogical report.

pub mod activity;
pub mod audio;
pub mod cache;
pub mod config;
pub mod emotion;
pub mod error;
pub mod format;
pub mod live;
pub mod llm;
pub mod media;
pub mod provider;
pub mod report;
pub mod session;
pub mod slot;
pub mod store;
pub mod types;
pub mod vision;

pub use activity::{ActivityEntry, ActivityLevel, ActivityLog};
pub use cache::{get_audio_path, get_cache_dir, get_data_dir, get_report_path, get_root_cache_dir};
pub use config::AnalyzerConfig;
pub use error::{CoreError, Result};
pub use format::{format_report_readable, format_timestamp};
pub use live::{CaptureDevice, CaptureSession, LiveScorer, LiveSnapshot};
pub use media::{DecodedAudio, MediaAsset, decode_audio};
pub use provider::Provider;
pub use report::{ReportAssembler, load_report, save_report};
pub use session::{AnalysisRequest, AnalysisSession};
pub use slot::LatestSlot;
pub use store::{FileReportStore, MemoryReportStore, ReportStore, Reviewer, Role};
pub use types::{AnalysisReport, RunState};
