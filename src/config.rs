//! Typed configuration surface (ambient stack; see SPEC_FULL.md §B).
//!
//! These structs are the boundary the core accepts config *through*; reading
//! them from a file, environment, or CLI stays outside the core's scope
//! (spec §1/§6). Plain, `Default`-implementing structs with all the tunables
//! a caller might want to override, made `serde::Deserialize` since an
//! external loader is expected to produce one of these.

use serde::Deserialize;

/// Audio-chain tuning shared by every system.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub pre_emphasis_factor: f32,
    pub de_emphasis_factor: f32,
    pub dc_filter_cutoff_hz: f32,
    pub compander_attack_ms: f64,
    pub compander_recovery_ms: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            pre_emphasis_factor: 0.5,
            de_emphasis_factor: 0.5,
            dc_filter_cutoff_hz: 300.0,
            compander_attack_ms: 3.0,
            compander_recovery_ms: 13.5,
        }
    }
}

/// Supervisory-tone detector tuning (spec §4.4).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SupervisoryConfig {
    pub window_ms: u32,
    pub quality_threshold: f32,
    pub hysteresis_count: u32,
}

impl SupervisoryConfig {
    pub const AMPS_SAT: Self = Self { window_ms: 100, quality_threshold: 0.3, hysteresis_count: 3 };
    pub const NMT_SUPER: Self = Self { window_ms: 250, quality_threshold: 0.3, hysteresis_count: 3 };
}

impl Default for SupervisoryConfig {
    fn default() -> Self {
        Self::AMPS_SAT
    }
}

/// Timer/retry tuning per spec §4.7 (values shown are the AMPS defaults).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct FsmTimers {
    pub sat_acquire_ms: u64,
    pub sat_loss_ms: u64,
    pub page_reply_ms: u64,
    pub alert_confirm_ms: u64,
    pub answer_ms: u64,
    pub release_ms: u64,
    pub page_retry_limit: u32,
    pub alert_retry_limit: u32,
}

impl Default for FsmTimers {
    fn default() -> Self {
        Self {
            sat_acquire_ms: 5_000,
            sat_loss_ms: 5_000,
            page_reply_ms: 8_000,
            alert_confirm_ms: 600,
            answer_ms: 60_000,
            release_ms: 5_000,
            page_retry_limit: 2,
            alert_retry_limit: 3,
        }
    }
}

/// Top-level config bundle passed into [`crate::core::Core::new`].
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub audio: AudioConfig,
    pub supervisory: SupervisoryConfig,
    pub timers: FsmTimers,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            supervisory: SupervisoryConfig::default(),
            timers: FsmTimers::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_audio_config_has_sane_sample_rate() {
        assert!(AudioConfig::default().sample_rate >= 8000);
    }

    #[test]
    fn nmt_super_has_longer_window_than_amps_sat() {
        assert!(SupervisoryConfig::NMT_SUPER.window_ms > SupervisoryConfig::AMPS_SAT.window_ms);
    }
}
