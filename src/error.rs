//! Crate-wide error types.
//!
//! One `snafu`-derived enum per failure domain, composed into a single
//! [`Error`] at the edges of the public API. See spec §7 for the
//! classification these mirror: configuration errors are surfaced
//! synchronously, transient radio errors are recovered internally and never
//! reach here, protocol timeouts are translated to a [`crate::callcontrol::Cause`]
//! by the owning FSM rather than propagated as an `Error`.

use snafu::Snafu;

/// Configuration errors, surfaced synchronously from [`crate::transceiver::Transceiver::create`].
#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("channel {channel} is not valid for system {system:?}"))]
    InvalidChannel { channel: u32, system: crate::channel::System },

    #[snafu(display("role {role:?} is incompatible with band/system {system:?}"))]
    IncompatibleRole { role: crate::transceiver::Role, system: crate::channel::System },

    #[snafu(display("device '{device}' is missing or unusable"))]
    MissingDevice { device: String },

    #[snafu(display("sample rate {sample_rate} is too low for system {system:?}"))]
    SampleRateTooLow { sample_rate: u32, system: crate::channel::System },
}

/// Frame encode/decode errors. Most are recovered locally (frame dropped);
/// callers that need the reason use this type, everyone else just sees `None`.
#[derive(Debug, Snafu)]
pub enum FrameError {
    #[snafu(display("parity/CRC check failed"))]
    ParityMismatch,

    #[snafu(display("frame buffer length {got} does not match expected {expected}"))]
    WrongLength { got: usize, expected: usize },

    #[snafu(display("unknown word type {word_type}"))]
    UnknownWordType { word_type: u32 },

    #[snafu(display("digit {digit} out of range for this encoding"))]
    DigitOutOfRange { digit: u8 },
}

/// Errors from the protocol state machines that represent a rejected request
/// rather than a released call (those go out as a `Cause` via `call_up_release`).
#[derive(Debug, Snafu)]
pub enum FsmError {
    #[snafu(display("no transaction for callref {callref}"))]
    UnknownCallref { callref: u32 },

    #[snafu(display("operation not valid in state {state}"))]
    InvalidState { state: String },
}

/// Errors from the DMS/SMS sublayer.
#[derive(Debug, Snafu)]
pub enum DmsError {
    #[snafu(display("CRC mismatch on received DMS frame"))]
    CrcMismatch,

    #[snafu(display("direction mismatch: expected {expected:?}, got {got:?}"))]
    DirectionMismatch { expected: crate::dms::Direction, got: crate::dms::Direction },

    #[snafu(display("SMS PDU malformed: {reason}"))]
    MalformedPdu { reason: String },
}

/// Top-level crate error, composed from the domain-specific ones above.
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("configuration error: {source}"))]
    Config { source: ConfigError },

    #[snafu(display("frame error: {source}"))]
    Frame { source: FrameError },

    #[snafu(display("fsm error: {source}"))]
    Fsm { source: FsmError },

    #[snafu(display("dms error: {source}"))]
    Dms { source: DmsError },
}

impl From<ConfigError> for Error {
    fn from(source: ConfigError) -> Self {
        Error::Config { source }
    }
}

impl From<FrameError> for Error {
    fn from(source: FrameError) -> Self {
        Error::Frame { source }
    }
}

impl From<FsmError> for Error {
    fn from(source: FsmError) -> Self {
        Error::Fsm { source }
    }
}

impl From<DmsError> for Error {
    fn from(source: DmsError) -> Self {
        Error::Dms { source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
