//! NMT protocol FSM (spec §4.7; §8 scenario C), plus the stub authentication
//! handshake spec §1 allows ("cryptographic SIM authentication (stub
//! handshake only)").
//!
//! Shares the canonical MT-call shape with AMPS (spec §4.7: "common to
//! AMPS, NMT, C-Netz, with name variations") but is driven by
//! [`crate::frame::nmt::NmtFrame`] telegrams instead of AMPS words.

use crate::callcontrol::{Cause, CallUp};
use crate::frame::nmt::NmtFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NmtState {
    Idle,
    CallMtSetupSent,
    CallMtAssignConfirm,
    Ringing,
    Active,
    Release,
}

/// Wraps the subset of [`NmtFrame`] variants this FSM reacts to, distinct
/// from `fsm::amps`'s frame type so `fsm::FrameEvent` can carry either.
#[derive(Debug, Clone, PartialEq)]
pub enum NmtEvent {
    Frame(NmtFrame),
    SuperToneEdge(bool),
}

/// Stub authentication state (spec §1: "cryptographic SIM authentication
/// (stub handshake only)"). Always succeeds; exists so the call flow has a
/// place to hang a real challenge/response later without changing callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthStub {
    pub challenge: u32,
}

impl AuthStub {
    pub fn challenge(seed: u32) -> Self {
        Self { challenge: seed }
    }

    /// Always accepts; a real authentication center is out of scope (spec §1).
    pub fn verify(&self, _response: u32) -> bool {
        true
    }
}

pub struct NmtFsm {
    pub state: NmtState,
    pub country: u8,
    pub number: u32,
    pub assigned_channel: u16,
    pub auth: AuthStub,
    pending_telegram: Option<NmtFrame>,
}

impl NmtFsm {
    pub fn new(country: u8, number: u32) -> Self {
        Self {
            state: NmtState::Idle,
            country,
            number,
            assigned_channel: 0,
            auth: AuthStub::default(),
            pending_telegram: None,
        }
    }

    /// `call_down_setup(dialed)` (spec §8 scenario C): routes a "2a" MT call
    /// frame toward the mobile.
    pub fn call_down_setup(&mut self, dialed: &str) -> Vec<CallUp> {
        self.number = dialed.parse().unwrap_or(0);
        self.state = NmtState::CallMtSetupSent;
        self.pending_telegram = Some(NmtFrame::MtCallSetup2a { country: self.country, number: self.number });
        Vec::new()
    }

    /// A telegram was decoded on the signaling channel.
    pub fn on_frame(&mut self, frame: NmtFrame) -> Vec<CallUp> {
        match (self.state, frame) {
            (NmtState::CallMtSetupSent, NmtFrame::PagingReply10a { country, number }) => {
                self.country = country;
                self.number = number;
                self.state = NmtState::CallMtAssignConfirm;
                self.pending_telegram = Some(NmtFrame::ChannelActivation4a { channel: self.assigned_channel });
                Vec::new()
            }
            (_, NmtFrame::Release6a) => {
                self.state = NmtState::Release;
                vec![CallUp::Release { callref: 0, cause: Cause::Normal }]
            }
            _ => Vec::new(),
        }
    }

    pub fn on_channel_activation_ack(&mut self, channel: u16) {
        if self.state == NmtState::CallMtAssignConfirm {
            self.assigned_channel = channel;
        }
    }

    /// Super-tone edge (spec §4.4/§8 scenario C: "injected super-tone flips
    /// state to ringing").
    pub fn on_super_tone(&mut self, detected: bool) -> Vec<CallUp> {
        match (self.state, detected) {
            (NmtState::CallMtAssignConfirm, true) => {
                self.state = NmtState::Ringing;
                vec![CallUp::Alerting { callref: 0 }]
            }
            (NmtState::Ringing, false) => {
                self.state = NmtState::Active;
                vec![CallUp::Answer { callref: 0 }]
            }
            (NmtState::Active, false) => {
                self.state = NmtState::Release;
                vec![CallUp::Release { callref: 0, cause: Cause::Normal }]
            }
            _ => Vec::new(),
        }
    }

    pub fn call_down_release(&mut self) -> Vec<CallUp> {
        self.state = NmtState::Release;
        self.pending_telegram = Some(NmtFrame::Release6a);
        vec![CallUp::Release { callref: 0, cause: Cause::Normal }]
    }

    /// Pull-model TX: the signaling-channel modulator calls this when it
    /// needs a telegram, matching the AMPS FSM's `tx_frame_focc` shape.
    pub fn tx_telegram(&mut self) -> Option<NmtFrame> {
        self.pending_telegram.take()
    }
}
