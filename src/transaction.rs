//! Transaction & subscriber registry (C8, spec §3/§4.8).
//!
//! The source's cyclic `transceiver <-> transaction` references become an
//! arena-and-index (spec §9): [`TransactionRegistry`] is the single owner of
//! every [`Transaction`]; transceivers and FSMs hold a stable
//! [`TransactionId`] handle rather than a pointer. Re-parenting (control to
//! voice channel) is handle reassignment via [`TransactionRegistry::link`]/
//! [`unlink`], never shared ownership.

use std::collections::HashMap;
use std::time::Duration;

use crate::channel::System;

/// Subscriber identity, one variant per system (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// AMPS/TACS/JTACS MIN1/MIN2.
    Amps { min1: u32, min2: u16 },
    /// NMT country digit + 6-digit number.
    Nmt { country: u8, number: u32 },
    /// B-Netz 5-digit station id.
    BNetz { station: u32 },
    /// C-Netz FuTln triple (network, station, plus a password/ruf digit).
    CNetz { network: u8, station: u32, ruf: u8 },
}

/// Stable handle into a [`TransactionRegistry`]. Indices are reused via a
/// free list after removal; `generation` detects use-after-free of a stale
/// handle rather than silently aliasing a new transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId {
    index: usize,
    generation: u32,
}

impl TransactionId {
    /// Pack into a single `u64`, for callers (namely [`crate::core::Core`])
    /// that need to stash this handle in a `u64`-tagged timer payload
    /// without the registry exposing its internal index/generation layout
    /// more broadly.
    pub(crate) fn raw(self) -> u64 {
        (self.generation as u64) << 32 | self.index as u64
    }

    pub(crate) fn from_raw(raw: u64) -> Self {
        Self { index: (raw & 0xFFFF_FFFF) as usize, generation: (raw >> 32) as u32 }
    }
}

/// Call direction, mirrors the two canonical state-machine shapes in spec §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    MobileOriginated,
    MobileTerminated,
    Registration,
}

/// A live procedure for one subscriber (spec §3). `state` is an opaque
/// per-system FSM state tag (a `u32` discriminant read by the owning
/// `fsm::*` module); the registry itself never interprets it.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub system: System,
    pub identity: Identity,
    pub direction: Direction,
    pub state_tag: u32,
    pub esn: Option<u32>,
    pub password: Option<u32>,
    pub caller_id: Vec<u8>,
    pub assigned_channel: Option<i32>,
    pub page_retries: u32,
    pub alert_retries: u32,
    pub signaling_tone_observed: bool,
    pub rf_level_db: f32,
    pub callref: Option<u32>,
    pub transceiver_channel: i32,
}

impl Transaction {
    pub fn new(system: System, identity: Identity, direction: Direction, transceiver_channel: i32) -> Self {
        Self {
            system,
            identity,
            direction,
            state_tag: 0,
            esn: None,
            password: None,
            caller_id: Vec::new(),
            assigned_channel: None,
            page_retries: 0,
            alert_retries: 0,
            signaling_tone_observed: false,
            rf_level_db: -120.0,
            callref: None,
            transceiver_channel,
        }
    }
}

/// A per-transaction timer expiry, as a plain value the owning `fsm::*`
/// module interprets; matches spec §4.7's "Each FSM defines timer
/// durations" but keeps the `Duration` math (not the interpretation) here.
#[derive(Debug, Clone, Copy)]
pub struct TimerSpec {
    pub duration: Duration,
    pub retries_remaining: u32,
}

struct Slot {
    generation: u32,
    transaction: Option<Transaction>,
}

/// Process-wide, arena-backed collection of [`Transaction`]s keyed primarily
/// by [`Identity`] and secondarily by callref (spec §4.8).
#[derive(Default)]
pub struct TransactionRegistry {
    slots: Vec<Slot>,
    free_list: Vec<usize>,
    by_identity: HashMap<Identity, TransactionId>,
    by_callref: HashMap<u32, TransactionId>,
    /// FIFO of ids pending dispatch, used by C-Netz queued-call scheduling
    /// (spec §4.8's `search_queue_oldest`).
    queue_order: Vec<TransactionId>,
}

impl TransactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transaction for `identity`. A pre-existing transaction for
    /// the same identity is replaced; when the caller reports the current
    /// observed RF level is lower than the surviving transaction's, the
    /// prior one wins instead (the RF-level tiebreaker, spec §4.8).
    pub fn create(&mut self, mut transaction: Transaction) -> TransactionId {
        if let Some(&existing_id) = self.by_identity.get(&transaction.identity) {
            let existing_level = self.get(existing_id).map(|t| t.rf_level_db).unwrap_or(f32::NEG_INFINITY);
            if existing_level > transaction.rf_level_db {
                // prior transaction wins the tiebreaker; caller's transaction is dropped
                return existing_id;
            }
            self.remove(existing_id);
        }

        let id = if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index];
            slot.generation = slot.generation.wrapping_add(1);
            slot.transaction = Some(transaction.clone());
            TransactionId { index, generation: slot.generation }
        } else {
            let index = self.slots.len();
            self.slots.push(Slot { generation: 0, transaction: Some(transaction.clone()) });
            TransactionId { index, generation: 0 }
        };

        transaction.callref.map(|cr| self.by_callref.insert(cr, id));
        self.by_identity.insert(self.slots[id.index].transaction.as_ref().unwrap().identity.clone(), id);
        self.queue_order.push(id);
        id
    }

    fn slot(&self, id: TransactionId) -> Option<&Slot> {
        self.slots.get(id.index).filter(|s| s.generation == id.generation)
    }

    fn slot_mut(&mut self, id: TransactionId) -> Option<&mut Slot> {
        self.slots.get_mut(id.index).filter(|s| s.generation == id.generation)
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.slot(id).and_then(|s| s.transaction.as_ref())
    }

    pub fn get_mut(&mut self, id: TransactionId) -> Option<&mut Transaction> {
        self.slot_mut(id).and_then(|s| s.transaction.as_mut())
    }

    pub fn search_by_identity(&self, identity: &Identity) -> Option<TransactionId> {
        self.by_identity.get(identity).copied()
    }

    pub fn search_by_callref(&self, callref: u32) -> Option<TransactionId> {
        self.by_callref.get(&callref).copied()
    }

    /// Oldest still-present transaction in creation order, for C-Netz
    /// queued-call dispatch (spec §4.8).
    pub fn search_queue_oldest(&self) -> Option<TransactionId> {
        self.queue_order.iter().find(|&&id| self.get(id).is_some()).copied()
    }

    /// Destroy a transaction, releasing it from both indices.
    pub fn remove(&mut self, id: TransactionId) -> Option<Transaction> {
        let removed = self.slot_mut(id).and_then(|s| s.transaction.take());
        if let Some(t) = &removed {
            self.by_identity.remove(&t.identity);
            if let Some(cr) = t.callref {
                self.by_callref.remove(&cr);
            }
            self.free_list.push(id.index);
            self.queue_order.retain(|&qid| qid != id);
        }
        removed
    }

    /// Re-parent a transaction onto a different transceiver channel
    /// (control -> voice channel assignment, spec §4.8/§9: "unlink + relink,
    /// never shared ownership").
    pub fn link(&mut self, id: TransactionId, new_channel: i32) -> bool {
        if let Some(t) = self.get_mut(id) {
            t.transceiver_channel = new_channel;
            true
        } else {
            false
        }
    }

    pub fn unlink(&mut self, id: TransactionId) -> Option<i32> {
        self.get(id).map(|t| t.transceiver_channel)
    }

    pub fn len(&self) -> usize {
        self.by_identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amps_id(min1: u32) -> Identity {
        Identity::Amps { min1, min2: 0 }
    }

    #[test]
    fn create_and_search_by_identity() {
        let mut reg = TransactionRegistry::new();
        let t = Transaction::new(System::Amps, amps_id(1), Direction::MobileOriginated, 313);
        let id = reg.create(t);
        assert_eq!(reg.search_by_identity(&amps_id(1)), Some(id));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_identity_replaces_prior_transaction() {
        let mut reg = TransactionRegistry::new();
        let t1 = Transaction::new(System::Amps, amps_id(5), Direction::MobileOriginated, 313);
        let id1 = reg.create(t1);
        let mut t2 = Transaction::new(System::Amps, amps_id(5), Direction::MobileTerminated, 314);
        t2.rf_level_db = -50.0;
        let id2 = reg.create(t2);
        assert_ne!(id1, id2);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(id2).unwrap().direction, Direction::MobileTerminated);
    }

    #[test]
    fn rf_level_tiebreaker_keeps_the_stronger_transaction() {
        let mut reg = TransactionRegistry::new();
        let mut t1 = Transaction::new(System::Amps, amps_id(7), Direction::MobileOriginated, 313);
        t1.rf_level_db = -30.0;
        let id1 = reg.create(t1);

        let mut t2 = Transaction::new(System::Amps, amps_id(7), Direction::MobileOriginated, 314);
        t2.rf_level_db = -80.0;
        let id2 = reg.create(t2);

        assert_eq!(id1, id2, "weaker duplicate should not win the slot");
        assert_eq!(reg.get(id1).unwrap().transceiver_channel, 313);
    }

    #[test]
    fn remove_clears_both_indices() {
        let mut reg = TransactionRegistry::new();
        let mut t = Transaction::new(System::Amps, amps_id(9), Direction::MobileOriginated, 313);
        t.callref = Some(42);
        let id = reg.create(t);
        assert_eq!(reg.search_by_callref(42), Some(id));
        reg.remove(id);
        assert_eq!(reg.search_by_identity(&amps_id(9)), None);
        assert_eq!(reg.search_by_callref(42), None);
        assert!(reg.get(id).is_none());
    }

    #[test]
    fn link_reparents_without_changing_identity() {
        let mut reg = TransactionRegistry::new();
        let t = Transaction::new(System::Amps, amps_id(3), Direction::MobileTerminated, 313);
        let id = reg.create(t);
        assert!(reg.link(id, 500));
        assert_eq!(reg.get(id).unwrap().transceiver_channel, 500);
    }

    #[test]
    fn search_queue_oldest_returns_creation_order() {
        let mut reg = TransactionRegistry::new();
        let a = reg.create(Transaction::new(System::CNetz, Identity::CNetz { network: 1, station: 1, ruf: 0 }, Direction::Registration, 0));
        let _b = reg.create(Transaction::new(System::CNetz, Identity::CNetz { network: 1, station: 2, ruf: 0 }, Direction::Registration, 1));
        assert_eq!(reg.search_queue_oldest(), Some(a));
    }

    #[test]
    fn stale_handle_after_removal_and_reuse_is_rejected() {
        let mut reg = TransactionRegistry::new();
        let id1 = reg.create(Transaction::new(System::Amps, amps_id(1), Direction::MobileOriginated, 1));
        reg.remove(id1);
        let id2 = reg.create(Transaction::new(System::Amps, amps_id(2), Direction::MobileOriginated, 1));
        assert!(reg.get(id1).is_none());
        assert!(reg.get(id2).is_some());
    }
}
