//! B-Netz protocol FSM (spec §4.7; §8 scenario F).
//!
//! B-Netz dialing is digit-at-a-time over [`crate::frame::bnetz::Telegram`]:
//! a mobile sends its 5-digit station id, then (after dial-start) the
//! called party's 7-digit number one telegram per digit. State names follow
//! the German terms the standard itself uses, since that is also what the
//! spec's scenario F checks against (`Gespraech` = "call").

use crate::callcontrol::{Cause, CallUp};
use crate::frame::bnetz::Telegram;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BNetzState {
    /// Idle / Gruppenfreisignal broadcast.
    Frei,
    /// Station id digits being collected.
    Kennung,
    /// Dial-start seen, collecting the called number's digits.
    Wahl,
    /// Full number collected, call established.
    Gespraech,
    Release,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BNetzFrame {
    Telegram(Telegram),
}

const STATION_DIGITS: usize = 5;
const NUMBER_DIGITS: usize = 7;

pub struct BNetzFsm {
    pub state: BNetzState,
    pub station_id: Vec<u8>,
    pub dialed: Vec<u8>,
}

impl BNetzFsm {
    pub fn new() -> Self {
        Self { state: BNetzState::Frei, station_id: Vec::new(), dialed: Vec::new() }
    }

    /// Feed one decoded telegram (spec §8 scenario F: "simulate the digit
    /// telegrams for a 5-digit station ID followed by a 7-digit called
    /// number").
    pub fn on_telegram(&mut self, telegram: Telegram) -> Vec<CallUp> {
        match (self.state, telegram) {
            (BNetzState::Frei, Telegram::Digit(d)) => {
                self.station_id.push(d);
                self.state = BNetzState::Kennung;
                Vec::new()
            }
            (BNetzState::Kennung, Telegram::Digit(d)) => {
                self.station_id.push(d);
                Vec::new()
            }
            (BNetzState::Kennung, Telegram::DialStart) => {
                if self.station_id.len() >= STATION_DIGITS {
                    self.state = BNetzState::Wahl;
                }
                Vec::new()
            }
            (BNetzState::Wahl, Telegram::Digit(d)) => {
                self.dialed.push(d);
                if self.dialed.len() >= NUMBER_DIGITS {
                    self.state = BNetzState::Gespraech;
                    let dialed: String = self.dialed.iter().map(|d| (b'0' + d) as char).collect();
                    return vec![CallUp::Setup {
                        caller_id: self.station_id.iter().map(|d| (b'0' + d) as char).collect(),
                        dialed,
                        network_id: "bnetz".into(),
                        aux: None,
                    }];
                }
                Vec::new()
            }
            (BNetzState::Wahl, Telegram::DialStop) => {
                self.state = BNetzState::Release;
                vec![CallUp::Release { callref: 0, cause: Cause::InvalidNumber }]
            }
            (_, Telegram::GroupFree) => {
                self.state = BNetzState::Frei;
                self.station_id.clear();
                self.dialed.clear();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn call_down_release(&mut self) -> Vec<CallUp> {
        self.state = BNetzState::Release;
        vec![CallUp::Release { callref: 0, cause: Cause::Normal }]
    }
}

impl Default for BNetzFsm {
    fn default() -> Self {
        Self::new()
    }
}
