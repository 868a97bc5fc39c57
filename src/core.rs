//! `Core` (spec §9 design note): the explicit context object that replaces
//! the source's unsynchronized globals (`sender_head`, the transaction
//! list). It owns every [`Transceiver`](crate::transceiver::Transceiver),
//! the [`TransactionRegistry`](crate::transaction::TransactionRegistry)
//! arena, and the [`TimerWheel`](crate::timer::TimerWheel); every other
//! entry point in the crate takes a `&mut Core` (or a piece borrowed from
//! one) rather than reaching for module-level state.
//!
//! Spec §5's single-threaded cooperative event loop: `Core` carries a
//! `!Send` marker so the single-thread assumption the source relies on is
//! enforced by the type system rather than left implicit.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::time::Duration;

use crate::config::CoreConfig;
use crate::error::{ConfigError, Result};
use crate::timer::{TimerId, TimerWheel};
use crate::transaction::{Transaction, TransactionId, TransactionRegistry};
use crate::transceiver::{Role, Transceiver};
use crate::channel::System;
use crate::config::AudioConfig;
use crate::callcontrol::{Cause, CallUp};

/// Process-wide context: the arena-and-index replacement for the source's
/// cyclic `transceiver <-> transaction` globals (spec §9).
///
/// `_not_send` enforces the single-threaded cooperative event loop (spec
/// §5): there are no implicit locks anywhere in this crate, so a `Core`
/// must never cross a thread boundary.
pub struct Core {
    pub config: CoreConfig,
    transceivers: HashMap<i32, Transceiver>,
    pub transactions: TransactionRegistry,
    pub timers: TimerWheel,
    _not_send: PhantomData<*const ()>,
}

impl Core {
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            transceivers: HashMap::new(),
            transactions: TransactionRegistry::new(),
            timers: TimerWheel::new(),
            _not_send: PhantomData,
        }
    }

    /// Validate and install a new transceiver on `channel` (spec §4.6
    /// `create`). Fails synchronously, leaving `self` unchanged, if the
    /// channel is already occupied or the transceiver itself rejects the
    /// channel/role/band combination.
    pub fn add_transceiver(
        &mut self,
        channel: i32,
        role: Role,
        system: System,
        audio: AudioConfig,
        invert_polarity: bool,
    ) -> Result<()> {
        if self.transceivers.contains_key(&channel) {
            return Err(ConfigError::InvalidChannel { channel: channel as u32, system }.into());
        }
        let transceiver = Transceiver::create(channel, role, system, audio, invert_polarity)?;
        self.transceivers.insert(channel, transceiver);
        Ok(())
    }

    pub fn transceiver(&self, channel: i32) -> Option<&Transceiver> {
        self.transceivers.get(&channel)
    }

    pub fn transceiver_mut(&mut self, channel: i32) -> Option<&mut Transceiver> {
        self.transceivers.get_mut(&channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = i32> + '_ {
        self.transceivers.keys().copied()
    }

    /// Replace `channel`'s broadcast overhead fields wholesale (spec §3:
    /// "read-only during a call; mutated only by configuration reload").
    /// A no-op if the channel has no transceiver.
    pub fn reload_system_info(&mut self, channel: i32, system_info: crate::channel::SystemInfo) {
        if let Some(transceiver) = self.transceivers.get_mut(&channel) {
            transceiver.system_info = system_info;
        }
    }

    /// Fully tear down the transceiver on `channel` (spec §4.6 `destroy`):
    /// cancels its timers, releases every anchored transaction with
    /// `CauseNormal`, and removes it from the registry. Returns the
    /// `call_up_release` events the caller forwards to the call-control
    /// plane, matching spec §5's "a destroyed transceiver cancels all its
    /// timers, releases all transactions with `CauseNormal`".
    pub fn remove_transceiver(&mut self, channel: i32) -> Vec<CallUp> {
        let Some(mut transceiver) = self.transceivers.remove(&channel) else {
            return Vec::new();
        };
        let anchored = transceiver.destroy();
        self.release_anchored(anchored, Cause::Normal)
    }

    /// Release a list of anchored transaction handles, cancelling every
    /// timer tagged with each one's raw index and producing a
    /// `call_up_release` per transaction that carried a live callref (spec
    /// §5/§9).
    pub fn release_anchored(&mut self, anchored: Vec<TransactionId>, cause: Cause) -> Vec<CallUp> {
        let mut events = Vec::with_capacity(anchored.len());
        for id in anchored {
            self.timers.cancel_all_with_payload(timer_payload(id));
            if let Some(transaction) = self.transactions.remove(id) {
                if let Some(callref) = transaction.callref {
                    events.push(CallUp::Release { callref, cause });
                }
            }
        }
        events
    }

    /// Create a transaction and anchor it on `channel`'s transceiver (spec
    /// §4.8 `create` + §4.6's transceiver-owned transaction list).
    pub fn create_transaction(&mut self, channel: i32, transaction: Transaction) -> TransactionId {
        let id = self.transactions.create(transaction);
        if let Some(transceiver) = self.transceivers.get_mut(&channel) {
            transceiver.anchor(id);
        }
        id
    }

    /// Re-parent a transaction from its current transceiver to
    /// `new_channel` (control -> voice channel assignment, spec §4.8/§9:
    /// "unlink + relink, never shared ownership").
    pub fn relink_transaction(&mut self, id: TransactionId, new_channel: i32) {
        if let Some(old_channel) = self.transactions.unlink(id) {
            if let Some(old) = self.transceivers.get_mut(&old_channel) {
                old.release_anchor(id);
            }
        }
        if self.transactions.link(id, new_channel) {
            if let Some(new) = self.transceivers.get_mut(&new_channel) {
                new.anchor(id);
            }
        }
    }

    /// Destroy one transaction, releasing it from its transceiver's anchor
    /// list and cancelling its timers (spec §4.8 lifecycle: "destroyed on
    /// terminal FSM state or `call_up_release`").
    pub fn destroy_transaction(&mut self, id: TransactionId) -> Option<Transaction> {
        if let Some(transaction) = self.transactions.get(id) {
            let channel = transaction.transceiver_channel;
            if let Some(transceiver) = self.transceivers.get_mut(&channel) {
                transceiver.release_anchor(id);
            }
        }
        self.timers.cancel_all_with_payload(timer_payload(id));
        self.transactions.remove(id)
    }

    /// Register a timer bound to `transaction`'s lifetime; cancelling the
    /// transaction (via [`Core::destroy_transaction`]) cancels this timer
    /// too (spec §5 cancellation rule).
    pub fn arm_timer(&mut self, transaction: TransactionId, duration: Duration) -> TimerId {
        self.timers.register(duration, timer_payload(transaction))
    }

    pub fn cancel_timer(&mut self, id: TimerId) {
        self.timers.cancel(id);
    }

    /// Advance the cooperative time source by `elapsed` and report which
    /// transaction handles had a timer expire, in registration order (spec
    /// §5: "expired timers fire in registration order"). Decoding the
    /// opaque `u64` payload back into a timer *kind* is the owning
    /// `fsm::<system>` module's responsibility; `Core` only knows which
    /// transaction it belonged to.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<TransactionId> {
        self.timers.tick(elapsed).into_iter().map(decode_timer_payload).collect()
    }
}

/// Transaction handles are opaque outside [`crate::transaction`]; pack the
/// arena index+generation into the timer wheel's `u64` payload and recover
/// it on expiry via [`TransactionId::from_raw`]. The generation is folded
/// in so a timer belonging to a long-destroyed transaction can never be
/// mistaken for a fresh one reusing the same slot (the registry's `get`
/// checks generation on every lookup).
fn timer_payload(id: TransactionId) -> u64 {
    id.raw()
}

fn decode_timer_payload(payload: u64) -> TransactionId {
    TransactionId::from_raw(payload)
}
