//! AMPS/TACS/JTACS protocol FSM (spec §4.7, canonical MO/MT diagrams; §8
//! scenarios A/B).
//!
//! The state names follow the spec's own diagrams and scenario text
//! (`CallMoAssign`, `CallMtAssignConfirm`, `CallMtAnswerWait`, ...) rather
//! than inventing new ones, so a reader checking this against §8 can match
//! names directly. Frame emission is pull-model (spec §9): [`AmpsFsm::tx_frame_focc`]/
//! [`tx_frame_fvc`] are what the TX modem calls when it needs a frame; they
//! advance state (`X -> X_Send`-shaped transitions folded into the match
//! arms below) and return `Some(frame)`, or `None` to fall back to filler.

use crate::callcontrol::{Cause, CallUp};
use crate::frame::amps::{ChannelAssignment, Origination, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmpsState {
    Idle,
    CallMoAssign,
    CallMtPage,
    CallMtAssignConfirm,
    CallMtAlertConfirm,
    CallMtAnswerWait,
    Call,
    Release,
}

/// Outbound frame a pull from the TX modem returns.
#[derive(Debug, Clone, PartialEq)]
pub enum AmpsFrame {
    Page(Page),
    ChannelAssignment(ChannelAssignment),
    Alert { min1: u32 },
    Release { min1: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmpsTimer {
    PageReply,
    SatAcquire,
    AlertConfirm,
    Answer,
    SatLoss,
    Release,
}

/// Timer durations (ms), spec §4.7 AMPS defaults.
pub struct AmpsTimers {
    pub page_reply_ms: u64,
    pub sat_acquire_ms: u64,
    pub alert_confirm_ms: u64,
    pub answer_ms: u64,
    pub sat_loss_ms: u64,
    pub release_ms: u64,
    pub page_retry_limit: u32,
    pub alert_retry_limit: u32,
}

impl Default for AmpsTimers {
    fn default() -> Self {
        Self {
            page_reply_ms: 8_000,
            sat_acquire_ms: 5_000,
            alert_confirm_ms: 600,
            answer_ms: 60_000,
            sat_loss_ms: 5_000,
            release_ms: 5_000,
            page_retry_limit: 2,
            alert_retry_limit: 3,
        }
    }
}

/// One live AMPS procedure's state machine (spec §4.7).
pub struct AmpsFsm {
    pub state: AmpsState,
    pub min1: u32,
    pub min2: u16,
    pub assigned_channel: u16,
    pub page_retries: u32,
    pub alert_retries: u32,
    timers: AmpsTimers,
    pending_frame: Option<AmpsFrame>,
}

impl AmpsFsm {
    pub fn new(min1: u32, min2: u16) -> Self {
        Self {
            state: AmpsState::Idle,
            min1,
            min2,
            assigned_channel: 0,
            page_retries: 0,
            alert_retries: 0,
            timers: AmpsTimers::default(),
            pending_frame: None,
        }
    }

    /// `call_down_setup` (spec §6): start an MT call by paging.
    pub fn call_down_setup(&mut self) -> Vec<CallUp> {
        self.state = AmpsState::CallMtPage;
        self.page_retries = 0;
        self.pending_frame = Some(AmpsFrame::Page(Page { min1: self.min1, min2: self.min2, channel: 0 }));
        Vec::new()
    }

    /// A paging reply frame was parsed on RECC (spec §4.7 MT diagram).
    pub fn on_paging_reply(&mut self, assigned_channel: u16) {
        if self.state == AmpsState::CallMtPage {
            self.assigned_channel = assigned_channel;
            self.state = AmpsState::CallMtAssignConfirm;
            self.pending_frame =
                Some(AmpsFrame::ChannelAssignment(ChannelAssignment { min1: self.min1, channel: assigned_channel }));
        }
    }

    /// RECC seizure (origination) starts an MO call (spec §8 scenario A):
    /// "RECC seizure produces a transaction in CallMoAssign".
    pub fn on_recc_seizure(&mut self, origination: Origination) -> Vec<CallUp> {
        self.min1 = origination.min1;
        self.min2 = origination.min2;
        self.state = AmpsState::CallMoAssign;
        vec![CallUp::Setup {
            caller_id: String::new(),
            dialed: String::new(),
            network_id: "amps".into(),
            aux: None,
        }]
    }

    /// A forward channel-assignment word was accepted for this MO call.
    pub fn on_channel_assigned(&mut self, channel: u16) {
        if self.state == AmpsState::CallMoAssign {
            self.assigned_channel = channel;
        }
    }

    /// SAT detection edge (spec §4.7: "during `AlertConfirm` advances to
    /// `AnswerWait`"; also the MO-call `AssignConfirm --satDetected--> Active`
    /// transition, named `Call` here, and the MT diagram's `Assign
    /// --satDetected--> Alert`).
    pub fn on_sat(&mut self, detected: bool) -> Vec<CallUp> {
        if !detected {
            if self.state == AmpsState::Call {
                self.state = AmpsState::Release;
                return vec![CallUp::Release { callref: 0, cause: Cause::Normal }];
            }
            return Vec::new();
        }

        match self.state {
            AmpsState::CallMoAssign => {
                self.state = AmpsState::Call;
                vec![CallUp::Answer { callref: 0 }]
            }
            AmpsState::CallMtAssignConfirm => {
                self.state = AmpsState::CallMtAlertConfirm;
                self.pending_frame = Some(AmpsFrame::Alert { min1: self.min1 });
                vec![CallUp::Alerting { callref: 0 }]
            }
            _ => Vec::new(),
        }
    }

    /// Signaling-tone edge (spec §4.7/§8 scenario B): rise during
    /// `AlertConfirm` moves to `AnswerWait`; fall during `AnswerWait`
    /// triggers `call_up_answer`.
    pub fn on_signaling_tone(&mut self, detected: bool) -> Vec<CallUp> {
        match (self.state, detected) {
            (AmpsState::CallMtAlertConfirm, true) => {
                self.state = AmpsState::CallMtAnswerWait;
                Vec::new()
            }
            (AmpsState::CallMtAnswerWait, false) => {
                self.state = AmpsState::Call;
                vec![CallUp::Answer { callref: 0 }]
            }
            _ => Vec::new(),
        }
    }

    /// `call_down_release` (spec §8 scenario A): emits an FVC release word
    /// sequence and destroys the transaction (destruction is the caller's
    /// responsibility once `Release` is observed).
    pub fn call_down_release(&mut self) -> Vec<CallUp> {
        self.state = AmpsState::Release;
        self.pending_frame = Some(AmpsFrame::Release { min1: self.min1 });
        vec![CallUp::Release { callref: 0, cause: Cause::Normal }]
    }

    /// Timer expiry (spec §4.7: "retry counters are decremented on timer
    /// expiry; exhaustion releases the call to upper layers with a mapped
    /// cause").
    pub fn on_timer(&mut self, timer: AmpsTimer) -> Vec<CallUp> {
        match (self.state, timer) {
            (AmpsState::CallMtPage, AmpsTimer::PageReply) => {
                self.page_retries += 1;
                if self.page_retries >= self.timers.page_retry_limit {
                    self.state = AmpsState::Release;
                    vec![CallUp::Release { callref: 0, cause: Cause::NoAnswer }]
                } else {
                    self.pending_frame =
                        Some(AmpsFrame::Page(Page { min1: self.min1, min2: self.min2, channel: 0 }));
                    Vec::new()
                }
            }
            (AmpsState::CallMtAlertConfirm, AmpsTimer::AlertConfirm) => {
                self.alert_retries += 1;
                if self.alert_retries >= self.timers.alert_retry_limit {
                    self.state = AmpsState::Release;
                    vec![CallUp::Release { callref: 0, cause: Cause::NoAnswer }]
                } else {
                    self.pending_frame = Some(AmpsFrame::Alert { min1: self.min1 });
                    Vec::new()
                }
            }
            (AmpsState::CallMtAssignConfirm, AmpsTimer::SatAcquire)
            | (AmpsState::CallMoAssign, AmpsTimer::SatAcquire) => {
                self.state = AmpsState::Release;
                vec![CallUp::Release { callref: 0, cause: Cause::Temporary }]
            }
            (AmpsState::Call, AmpsTimer::SatLoss) => {
                self.state = AmpsState::Release;
                vec![CallUp::Release { callref: 0, cause: Cause::Temporary }]
            }
            (AmpsState::CallMtAnswerWait, AmpsTimer::Answer) => {
                self.state = AmpsState::Release;
                vec![CallUp::Release { callref: 0, cause: Cause::NoAnswer }]
            }
            (AmpsState::Release, AmpsTimer::Release) => Vec::new(),
            _ => Vec::new(),
        }
    }

    /// Pull-model TX: called by the forward control/voice channel train
    /// when it needs a frame. Returns `None` to fall back to filler/overhead.
    pub fn tx_frame_focc(&mut self) -> Option<AmpsFrame> {
        self.pending_frame.take()
    }

    pub fn tx_frame_fvc(&mut self) -> Option<AmpsFrame> {
        self.pending_frame.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_a_mo_call_reaches_call_then_releases() {
        let mut fsm = AmpsFsm::new(0, 0);
        let orig = Origination { min1: 0x123456, min2: 0x3AB, scm: 0 };
        fsm.on_recc_seizure(orig);
        assert_eq!(fsm.state, AmpsState::CallMoAssign);

        fsm.on_channel_assigned(42);
        assert_eq!(fsm.assigned_channel, 42);

        let events = fsm.on_sat(true);
        assert_eq!(fsm.state, AmpsState::Call);
        assert!(matches!(events[0], CallUp::Answer { .. }));

        let release_events = fsm.call_down_release();
        assert_eq!(fsm.state, AmpsState::Release);
        assert!(matches!(release_events[0], CallUp::Release { cause: Cause::Normal, .. }));
        assert!(matches!(fsm.tx_frame_fvc(), Some(AmpsFrame::Release { .. })));
    }

    #[test]
    fn scenario_b_mt_call_pages_then_answers() {
        let mut fsm = AmpsFsm::new(0x00AABBCC, 0x3AB);
        fsm.call_down_setup();
        assert_eq!(fsm.state, AmpsState::CallMtPage);
        assert!(matches!(fsm.tx_frame_focc(), Some(AmpsFrame::Page(_))));

        // first page-reply timeout retries, doesn't release yet
        let events = fsm.on_timer(AmpsTimer::PageReply);
        assert!(events.is_empty());
        assert_eq!(fsm.page_retries, 1);

        fsm.on_paging_reply(77);
        assert_eq!(fsm.state, AmpsState::CallMtAssignConfirm);

        let alert_events = fsm.on_sat(true);
        assert_eq!(fsm.state, AmpsState::CallMtAlertConfirm);
        assert!(matches!(alert_events[0], CallUp::Alerting { .. }));

        fsm.on_signaling_tone(true);
        assert_eq!(fsm.state, AmpsState::CallMtAnswerWait);

        let answer_events = fsm.on_signaling_tone(false);
        assert_eq!(fsm.state, AmpsState::Call);
        assert!(matches!(answer_events[0], CallUp::Answer { .. }));
    }

    #[test]
    fn page_retry_exhaustion_releases_with_no_answer() {
        let mut fsm = AmpsFsm::new(1, 1);
        fsm.call_down_setup();
        fsm.on_timer(AmpsTimer::PageReply);
        let events = fsm.on_timer(AmpsTimer::PageReply);
        assert_eq!(fsm.state, AmpsState::Release);
        assert!(matches!(events[0], CallUp::Release { cause: Cause::NoAnswer, .. }));
    }

    #[test]
    fn sat_loss_during_active_call_releases() {
        let mut fsm = AmpsFsm::new(1, 1);
        fsm.state = AmpsState::Call;
        let events = fsm.on_sat(false);
        assert_eq!(fsm.state, AmpsState::Release);
        assert!(matches!(events[0], CallUp::Release { cause: Cause::Normal, .. }));
    }
}
