// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity Recorder: live GPS workout recording
//!
//! This crate turns a noisy stream of location fixes into a segmented
//! route, running distance/duration/pace metrics, and a finalized track
//! that is uploaded to the remote activity API.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{LocationFeed, RecorderHandle};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub recorder: RecorderHandle,
    pub location_feed: LocationFeed,
}
