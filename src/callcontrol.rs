//! Upper-layer call-control vocabulary (spec §6, SPEC_FULL.md §C.5).
//!
//! Mirrors the shape of `mncc_sock.c`'s message catalog without the socket:
//! the call-control plane itself stays a black box (spec §1), so these are
//! plain in-process types a collaborator outside this crate answers/emits,
//! not a wire protocol this crate implements.

/// Release/reject cause, the vocabulary every `call_up_release` and FSM
/// timeout maps onto (spec §6/§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    Normal,
    Temporary,
    NoAnswer,
    OutOfOrder,
    NoChannel,
    Busy,
    InvalidNumber,
    InvalidCallref,
}

/// Inbound requests from the call-control plane (spec §6 table).
#[derive(Debug, Clone)]
pub enum CallDown {
    Setup { callref: u32, caller_id: String, call_type: CallType, dialed: String },
    Answer { callref: u32, timestamp_ms: Option<u64> },
    Disconnect { callref: u32, cause: Cause },
    Release { callref: u32, cause: Cause },
    Audio { callref: u32, seq: u32, timestamp_ms: u64, ssrc: u32, samples: Vec<i16> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    Voice,
    Data,
}

/// Outbound events toward the call-control plane (spec §6 table).
#[derive(Debug, Clone)]
pub enum CallUp {
    Setup { caller_id: String, dialed: String, network_id: String, aux: Option<String> },
    Alerting { callref: u32 },
    Answer { callref: u32 },
    Release { callref: u32, cause: Cause },
    Audio { callref: u32, samples: Vec<i16> },
}
