//! C-Netz protocol FSM (spec §4.7: "common to AMPS, NMT, C-Netz, with name
//! variations"), driven by [`crate::frame::cnetz`] blocks scheduled onto the
//! [`crate::scheduler`]'s slot plan.

use crate::callcontrol::{Cause, CallUp};
use crate::frame::cnetz::FuTln;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CNetzState {
    Idle,
    Page,
    AssignConfirm,
    Alert,
    AnswerWait,
    SpK,
    Release,
}

/// A C-Netz reverse-control-slot reply, carried in a Meldeblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CNetzFrame {
    PagingReply { futln: FuTln },
    ChannelAssignAck { channel: u16 },
    Release,
}

pub struct CNetzFsm {
    pub state: CNetzState,
    pub futln: FuTln,
    pub assigned_channel: u16,
    pub page_retries: u32,
}

impl CNetzFsm {
    pub fn new(futln: FuTln) -> Self {
        Self { state: CNetzState::Idle, futln, assigned_channel: 0, page_retries: 0 }
    }

    pub fn call_down_setup(&mut self) {
        self.state = CNetzState::Page;
        self.page_retries = 0;
    }

    pub fn on_frame(&mut self, frame: CNetzFrame) -> Vec<CallUp> {
        match (self.state, frame) {
            (CNetzState::Page, CNetzFrame::PagingReply { .. }) => {
                self.state = CNetzState::AssignConfirm;
                Vec::new()
            }
            (CNetzState::AssignConfirm, CNetzFrame::ChannelAssignAck { channel }) => {
                self.assigned_channel = channel;
                self.state = CNetzState::Alert;
                vec![CallUp::Alerting { callref: 0 }]
            }
            (_, CNetzFrame::Release) => {
                self.state = CNetzState::Release;
                vec![CallUp::Release { callref: 0, cause: Cause::Normal }]
            }
            _ => Vec::new(),
        }
    }

    /// Super-tone equivalent (SpK supervision) rise/fall, same shape as
    /// AMPS's signaling-tone transitions (spec §4.7).
    pub fn on_signaling_tone(&mut self, detected: bool) -> Vec<CallUp> {
        match (self.state, detected) {
            (CNetzState::Alert, true) => {
                self.state = CNetzState::AnswerWait;
                Vec::new()
            }
            (CNetzState::AnswerWait, false) => {
                self.state = CNetzState::SpK;
                vec![CallUp::Answer { callref: 0 }]
            }
            _ => Vec::new(),
        }
    }

    pub fn on_page_timeout(&mut self) -> Vec<CallUp> {
        self.page_retries += 1;
        if self.page_retries >= 2 {
            self.state = CNetzState::Release;
            vec![CallUp::Release { callref: 0, cause: Cause::NoAnswer }]
        } else {
            Vec::new()
        }
    }

    pub fn call_down_release(&mut self) -> Vec<CallUp> {
        self.state = CNetzState::Release;
        vec![CallUp::Release { callref: 0, cause: Cause::Normal }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn futln() -> FuTln {
        FuTln { network: 1, station: 12345 }
    }

    #[test]
    fn mt_call_runs_through_to_spk() {
        let mut fsm = CNetzFsm::new(futln());
        fsm.call_down_setup();
        assert_eq!(fsm.state, CNetzState::Page);

        fsm.on_frame(CNetzFrame::PagingReply { futln: futln() });
        assert_eq!(fsm.state, CNetzState::AssignConfirm);

        fsm.on_frame(CNetzFrame::ChannelAssignAck { channel: 7 });
        assert_eq!(fsm.state, CNetzState::Alert);

        fsm.on_signaling_tone(true);
        assert_eq!(fsm.state, CNetzState::AnswerWait);

        let events = fsm.on_signaling_tone(false);
        assert_eq!(fsm.state, CNetzState::SpK);
        assert!(matches!(events[0], CallUp::Answer { .. }));
    }

    #[test]
    fn page_retry_exhaustion_releases() {
        let mut fsm = CNetzFsm::new(futln());
        fsm.call_down_setup();
        fsm.on_page_timeout();
        let events = fsm.on_page_timeout();
        assert_eq!(fsm.state, CNetzState::Release);
        assert!(matches!(events[0], CallUp::Release { cause: Cause::NoAnswer, .. }));
    }
}
