//! `liveact` command line front end.
//!
//! Exposes configuration normalization, image layout resolution, token
//! encoding and a scripted session simulation against the in-memory platform.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod styles;
