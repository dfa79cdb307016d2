// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development. The API token and owner
//! ID come from the login flow of the host app and are required.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default Sample Filter threshold (meters of reported accuracy).
pub const DEFAULT_ACCURACY_THRESHOLD_M: f64 = 50.0;
/// Default jump between accepted samples that breaks the polyline.
pub const DEFAULT_SEGMENT_BREAK_DISTANCE_M: f64 = 50.0;
/// Default movement allowance per second of gap on top of the break distance.
pub const DEFAULT_SEGMENT_BREAK_SPEED_MPS: f64 = 12.0;
/// Default time gap between accepted samples that breaks the polyline.
pub const DEFAULT_SEGMENT_BREAK_GAP_SECS: u64 = 30;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Remote activity API ---
    /// Base URL of the activity API (no trailing slash)
    pub api_base_url: String,
    /// Bearer token for the activity API
    pub api_token: String,
    /// Owner (user) ID attached to created activities
    pub owner_id: u64,

    // --- Local control API ---
    /// Server port
    pub port: u16,

    // --- Recording engine ---
    pub accuracy_threshold_m: f64,
    pub segment_break_distance_m: f64,
    pub segment_break_speed_mps: f64,
    pub segment_break_gap_secs: u64,
    pub location_min_interval_ms: u64,
    pub location_min_displacement_m: f64,
    pub tick_interval_ms: u64,
    pub permission_timeout_secs: u64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            api_token: "test_token".to_string(),
            owner_id: 1,
            port: 8080,
            accuracy_threshold_m: DEFAULT_ACCURACY_THRESHOLD_M,
            segment_break_distance_m: DEFAULT_SEGMENT_BREAK_DISTANCE_M,
            segment_break_speed_mps: DEFAULT_SEGMENT_BREAK_SPEED_MPS,
            segment_break_gap_secs: DEFAULT_SEGMENT_BREAK_GAP_SECS,
            location_min_interval_ms: 1000,
            location_min_displacement_m: 2.0,
            tick_interval_ms: 1000,
            permission_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Deterministic config for tests.
    ///
    /// Location throttling is disabled so every pushed sample reaches the
    /// recorder.
    pub fn test_default() -> Self {
        Self {
            location_min_interval_ms: 0,
            location_min_displacement_m: 0.0,
            permission_timeout_secs: 5,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        Ok(Self {
            api_base_url: env::var("API_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            api_token: env::var("API_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("API_TOKEN"))?,
            owner_id: env::var("OWNER_ID")
                .map_err(|_| ConfigError::Missing("OWNER_ID"))?
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("OWNER_ID"))?,
            port: parse_or("PORT", defaults.port)?,
            accuracy_threshold_m: parse_or("ACCURACY_THRESHOLD_M", defaults.accuracy_threshold_m)?,
            segment_break_distance_m: parse_or(
                "SEGMENT_BREAK_DISTANCE_M",
                defaults.segment_break_distance_m,
            )?,
            segment_break_speed_mps: parse_or(
                "SEGMENT_BREAK_SPEED_MPS",
                defaults.segment_break_speed_mps,
            )?,
            segment_break_gap_secs: parse_or(
                "SEGMENT_BREAK_GAP_SECS",
                defaults.segment_break_gap_secs,
            )?,
            location_min_interval_ms: parse_or(
                "LOCATION_MIN_INTERVAL_MS",
                defaults.location_min_interval_ms,
            )?,
            location_min_displacement_m: parse_or(
                "LOCATION_MIN_DISPLACEMENT_M",
                defaults.location_min_displacement_m,
            )?,
            tick_interval_ms: parse_or("TICK_INTERVAL_MS", defaults.tick_interval_ms)?,
            permission_timeout_secs: parse_or(
                "PERMISSION_TIMEOUT_SECS",
                defaults.permission_timeout_secs,
            )?,
        })
    }

    /// Engine tunables derived from this config.
    pub fn recorder_settings(&self) -> RecorderSettings {
        RecorderSettings {
            accuracy_threshold_m: self.accuracy_threshold_m,
            segment_break_distance_m: self.segment_break_distance_m,
            segment_break_speed_mps: self.segment_break_speed_mps,
            segment_break_gap: Duration::from_secs(self.segment_break_gap_secs),
            location: LocationParams {
                min_interval: Duration::from_millis(self.location_min_interval_ms),
                min_displacement_m: self.location_min_displacement_m,
            },
            tick_interval: Duration::from_millis(self.tick_interval_ms.max(1)),
            permission_timeout: self.permission_timeout(),
        }
    }

    pub fn permission_timeout(&self) -> Duration {
        Duration::from_secs(self.permission_timeout_secs)
    }
}

/// Tuning parameters handed to the location source on subscribe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationParams {
    pub min_interval: Duration,
    pub min_displacement_m: f64,
}

/// Tunables for the recording engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecorderSettings {
    pub accuracy_threshold_m: f64,
    pub segment_break_distance_m: f64,
    pub segment_break_speed_mps: f64,
    pub segment_break_gap: Duration,
    pub location: LocationParams,
    pub tick_interval: Duration,
    /// How long a permission request waits for the user's answer
    pub permission_timeout: Duration,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Config::default().recorder_settings()
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
