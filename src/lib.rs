//! Redub - Transcript-driven video dubbing
//!
//! Fetches a video's time-coded transcript, translates it, synthesizes speech
//! per segment, rebuilds a timing-accurate audio track and muxes it onto the
//! original video using yt-dlp, a translation API, gTTS/espeak-ng and ffmpeg.

pub mod assembly;
pub mod cli;
pub mod config;
pub mod error;
pub mod jobs;
pub mod language;
pub mod media;
pub mod outcome;
pub mod pacing;
pub mod retry;
pub mod segment;
pub mod speech;
pub mod timeline;
pub mod transcript;
pub mod translate;
pub mod workflow;
