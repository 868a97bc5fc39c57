//! Transceiver object (C6, spec §3/§4.6): one radio channel, tying the DSP
//! chain, modem, and supervisory detector/generator to a channel number and
//! role.
//!
//! A `create`-style constructor validates before returning, and `rx_samples`/
//! `tx_samples` follow spec §5's "never blocks, bounded chunk in/out" rule.

use crate::channel::{self, System, SystemInfo};
use crate::config::AudioConfig;
use crate::dsp::{Compander, DcFilter, DeEmphasis, PreEmphasis};
use crate::error::{ConfigError, Result};
use crate::modem::{rates::BitRate, Demodulator, Modulator};
use crate::supervisory::{ToneDetector, ToneGenerator, ToneSet};
use crate::transaction::TransactionId;

/// A transceiver's function on the air interface (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Control,
    Paging,
    Voice,
    Combined,
}

/// DSP operating mode (spec §3/§4.6). `Off` implies no carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DspMode {
    Off,
    AudioRxAudioTx,
    AudioRxSilenceTx,
    AudioRxFrameTx,
    FrameRxFrameTx,
}

/// Coarse lifecycle state (spec §4.6): `Idle<->Busy` only via voice-channel
/// assignment or the release path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransceiverState {
    Null,
    Idle,
    Busy,
}

/// One radio channel (spec §3). Owns its DSP/modem/supervisory state and the
/// list of transaction handles currently anchored on it; does not own the
/// [`Transaction`](crate::transaction::Transaction) data itself (that lives
/// in the [`crate::transaction::TransactionRegistry`] arena, spec §9).
pub struct Transceiver {
    pub channel: i32,
    pub role: Role,
    pub system_info: SystemInfo,
    pub sample_rate: u32,
    state: TransceiverState,
    dsp_mode: DspMode,

    pre_emphasis: PreEmphasis,
    de_emphasis: DeEmphasis,
    dc_filter: DcFilter,
    compander: Compander,

    modulator: Modulator,
    demodulator: Option<Demodulator>,
    supervisory: Option<ToneDetector>,
    tone_gen: Option<ToneGenerator>,

    transactions: Vec<TransactionId>,
}

impl Transceiver {
    /// Validate channel/role/band/SID compatibility and construct an idle
    /// transceiver (spec §4.6). Returns a [`ConfigError`] synchronously on
    /// any mismatch; no partial state is retained on failure.
    pub fn create(
        channel: i32,
        role: Role,
        system: System,
        audio: AudioConfig,
        invert_polarity: bool,
    ) -> Result<Self> {
        channel::channel_to_freq(system, channel, false).map_err(|_| ConfigError::InvalidChannel {
            channel: channel as u32,
            system,
        })?;

        if role == Role::Voice && matches!(system, System::BNetz) && channel == channel::BNETZ_PAGING_CHANNEL {
            return Err(ConfigError::IncompatibleRole { role, system }.into());
        }

        let rate = BitRate::for_system(system);
        let system_info = SystemInfo::new(system);

        Ok(Self {
            channel,
            role,
            system_info,
            sample_rate: audio.sample_rate,
            state: TransceiverState::Idle,
            dsp_mode: DspMode::Off,
            pre_emphasis: PreEmphasis::new(audio.pre_emphasis_factor),
            de_emphasis: DeEmphasis::new(audio.de_emphasis_factor),
            dc_filter: DcFilter::new(audio.sample_rate, audio.dc_filter_cutoff_hz),
            compander: Compander::new(audio.sample_rate, audio.compander_attack_ms, audio.compander_recovery_ms),
            modulator: Modulator::new(rate, audio.sample_rate, invert_polarity),
            demodulator: None,
            supervisory: None,
            tone_gen: None,
            transactions: Vec::new(),
        })
    }

    pub fn state(&self) -> TransceiverState {
        self.state
    }

    pub fn dsp_mode(&self) -> DspMode {
        self.dsp_mode
    }

    pub fn transactions(&self) -> &[TransactionId] {
        &self.transactions
    }

    pub fn anchor(&mut self, id: TransactionId) {
        if !self.transactions.contains(&id) {
            self.transactions.push(id);
        }
    }

    pub fn release_anchor(&mut self, id: TransactionId) {
        self.transactions.retain(|&existing| existing != id);
    }

    /// Release every anchored transaction (caller applies `CauseNormal` to
    /// each through the transaction registry), shut down DSP, clear state
    /// (spec §4.6 `destroy`/`go_idle`).
    pub fn go_idle(&mut self) -> Vec<TransactionId> {
        let released = std::mem::take(&mut self.transactions);
        self.state = TransceiverState::Idle;
        self.set_dsp_mode(match self.role {
            Role::Control | Role::Paging | Role::Combined => DspMode::FrameRxFrameTx,
            Role::Voice => DspMode::Off,
        });
        released
    }

    /// Fully tear down this transceiver; returns the transactions that were
    /// anchored so the caller can release their upstream callrefs with
    /// `CauseNormal` (spec §4.6/§5).
    pub fn destroy(&mut self) -> Vec<TransactionId> {
        let released = std::mem::take(&mut self.transactions);
        self.state = TransceiverState::Null;
        self.dsp_mode = DspMode::Off;
        self.demodulator = None;
        self.supervisory = None;
        self.tone_gen = None;
        released
    }

    /// Atomic transition among the five DSP modes (spec §4.6): resets the
    /// supervisory detector and rearms sync hunt on relevant mode changes.
    pub fn set_dsp_mode(&mut self, mode: DspMode) {
        if self.dsp_mode == mode {
            return;
        }
        self.dsp_mode = mode;
        self.dc_filter.reset();
        self.pre_emphasis.reset();
        self.de_emphasis.reset();
        if let Some(demod) = &mut self.demodulator {
            demod.reset();
        }
    }

    /// Install (or replace) the demodulator used in frame-RX modes, with the
    /// sync word/frame length the owning system's frame codec expects.
    pub fn install_demodulator(&mut self, demodulator: Demodulator) {
        self.demodulator = Some(demodulator);
    }

    pub fn install_supervisory(&mut self, detector: ToneDetector, generator: Option<ToneGenerator>) {
        self.supervisory = Some(detector);
        self.tone_gen = generator;
    }

    /// Assign this transceiver into `Busy` state for a voice call (spec
    /// §4.6 invariant: `Idle<->Busy` only via this path or release).
    pub fn assign_voice_channel(&mut self) -> Result<()> {
        if self.state != TransceiverState::Idle {
            return Err(ConfigError::IncompatibleRole { role: self.role, system: self.system_info.system }.into());
        }
        self.state = TransceiverState::Busy;
        Ok(())
    }

    pub fn release_voice_channel(&mut self) {
        self.state = TransceiverState::Idle;
    }

    /// Consume one chunk of RX samples: DC-filter, run the supervisory
    /// detector, then (if framed mode) the FSK demodulator. Supervisory
    /// edges are produced before any frame bits for this chunk (spec §5
    /// ordering guarantee). Never blocks; returns promptly.
    pub fn rx_samples(&mut self, samples: &[f32]) -> RxOutcome {
        let mut filtered = samples.to_vec();
        self.dc_filter.process_block(&mut filtered);

        let sat_transition = self.supervisory.as_mut().and_then(|det| det.process(&filtered));

        let mut frames = Vec::new();
        if matches!(self.dsp_mode, DspMode::AudioRxFrameTx | DspMode::FrameRxFrameTx) {
            if let Some(demod) = &mut self.demodulator {
                frames = demod.process(&filtered);
            }
        }

        let mut audio = Vec::new();
        if matches!(self.dsp_mode, DspMode::AudioRxAudioTx | DspMode::AudioRxSilenceTx | DspMode::AudioRxFrameTx) {
            self.de_emphasis.process_block(&mut filtered);
            audio = filtered.iter().map(|&s| (s * i16::MAX as f32) as i16).collect();
            self.compander.expand(&mut audio);
        }

        RxOutcome { sat_transition, frames, audio }
    }

    /// Produce `out.len()` TX samples: frame bits queued via
    /// [`Transceiver::queue_tx_bits`] are pulled by the modulator (the
    /// pull-model TX architecture, spec §4.7/§9); supervisory tone is mixed
    /// in during voice mode.
    pub fn tx_samples(&mut self, out: &mut [f32]) {
        match self.dsp_mode {
            DspMode::Off => {
                for s in out.iter_mut() {
                    *s = 0.0;
                }
            }
            DspMode::AudioRxSilenceTx => {
                for s in out.iter_mut() {
                    *s = 0.0;
                }
                if let Some(gen) = &mut self.tone_gen {
                    gen.mix_into(out);
                }
            }
            DspMode::AudioRxAudioTx => {
                for s in out.iter_mut() {
                    *s = 0.0;
                }
                self.pre_emphasis.process_block(out);
                if let Some(gen) = &mut self.tone_gen {
                    gen.mix_into(out);
                }
            }
            DspMode::AudioRxFrameTx | DspMode::FrameRxFrameTx => {
                self.modulator.fill(out);
            }
        }
    }

    pub fn queue_tx_bits(&mut self, bits: impl IntoIterator<Item = bool>) {
        self.modulator.push_bits(bits);
    }
}

/// Result of one [`Transceiver::rx_samples`] call (spec §2 pipeline: DC
/// filter -> SAT detector -> FSK demod -> frame parse, with supervisory
/// edges surfaced ahead of any frame completed from the same chunk).
#[derive(Debug, Default)]
pub struct RxOutcome {
    pub sat_transition: Option<bool>,
    pub frames: Vec<Vec<crate::modem::DemodulatedBit>>,
    pub audio: Vec<i16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_validates_channel_against_system() {
        let audio = AudioConfig::default();
        assert!(Transceiver::create(313, Role::Control, System::Amps, audio, false).is_ok());
        assert!(Transceiver::create(800, Role::Control, System::Amps, audio, false).is_err());
    }

    #[test]
    fn bnetz_paging_channel_cannot_be_a_voice_role() {
        let audio = AudioConfig::default();
        assert!(Transceiver::create(channel::BNETZ_PAGING_CHANNEL, Role::Voice, System::BNetz, audio, false).is_err());
        assert!(Transceiver::create(channel::BNETZ_PAGING_CHANNEL, Role::Paging, System::BNetz, audio, false).is_ok());
    }

    #[test]
    fn off_mode_implies_silent_tx() {
        let audio = AudioConfig::default();
        let mut tx = Transceiver::create(313, Role::Control, System::Amps, audio, false).unwrap();
        tx.set_dsp_mode(DspMode::Off);
        let mut out = vec![1.0f32; 10];
        tx.tx_samples(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn assign_voice_channel_transitions_idle_to_busy() {
        let audio = AudioConfig::default();
        let mut tx = Transceiver::create(500, Role::Voice, System::Amps, audio, false).unwrap();
        assert_eq!(tx.state(), TransceiverState::Idle);
        tx.assign_voice_channel().unwrap();
        assert_eq!(tx.state(), TransceiverState::Busy);
        tx.release_voice_channel();
        assert_eq!(tx.state(), TransceiverState::Idle);
    }

    #[test]
    fn go_idle_clears_anchored_transactions() {
        let audio = AudioConfig::default();
        let mut tx = Transceiver::create(313, Role::Control, System::Amps, audio, false).unwrap();
        let fake_id = crate::transaction::TransactionRegistry::new().create(crate::transaction::Transaction::new(
            System::Amps,
            crate::transaction::Identity::Amps { min1: 1, min2: 1 },
            crate::transaction::Direction::MobileOriginated,
            313,
        ));
        tx.anchor(fake_id);
        assert_eq!(tx.transactions().len(), 1);
        let released = tx.go_idle();
        assert_eq!(released.len(), 1);
        assert!(tx.transactions().is_empty());
    }

    #[test]
    fn destroy_resets_to_null_state() {
        let audio = AudioConfig::default();
        let mut tx = Transceiver::create(313, Role::Control, System::Amps, audio, false).unwrap();
        tx.destroy();
        assert_eq!(tx.state(), TransceiverState::Null);
        assert_eq!(tx.dsp_mode(), DspMode::Off);
    }
}
