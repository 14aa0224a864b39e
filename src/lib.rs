//! ScreenReel - periodic screen capture into video files
//!
//! This crate captures the screen (or a window, or a region) at a fixed
//! frame rate and writes the frames into MP4, AVI, GIF, a numbered image
//! sequence or a self-contained HTML player. When the preferred container
//! cannot be produced, the recording falls back along a fixed cascade and
//! leaves a diagnostic report next to the output.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Settings, frames, regions, the session state machine and errors
//! - **Application**: Capture loop, frame pipeline, fallback cascade, session controller and port traits
//! - **Infrastructure**: Capture providers, frame codec, container writers, encoding strategies, config store, notifications
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
