//! vttstitch - WebVTT fragment merging and translation
//!
//! Fetches a numbered sequence of subtitle fragments, merges and cleans
//! them, and translates the text lines while keeping cue numbering and
//! timing exactly where they were.

pub mod cli;
pub mod config;
pub mod error;
pub mod document;
pub mod fetch;
pub mod normalize;
pub mod classify;
pub mod translate;
pub mod sink;
pub mod pipeline;
pub mod server;
