//! C-Netz TDMA scheduler (C10, spec §4.10, §8 scenario E): the 32-slot
//! counter that drives which forward block a C-Netz control transceiver
//! sends, plus the master/slave sample-phase sync that keeps two
//! transceivers sharing a sound device symbol-aligned.
//!
//! Grounded on `cnetz/dsp.c`'s `sched_ts`/`sched_r_m` counter and its
//! `count == master->frame_last_count ± 1` slave-phase correction. Unlike
//! the C, the Rufblock/Meldeblock choice isn't carried by a separate
//! half-slot flag (`sched_r_m`): [`crate::frame::cnetz::BlockKind::for_slot`]
//! already derives it from the slot's parity, so the counter here only
//! needs to advance one integer per 12.5 ms tick.

use crate::frame::cnetz::BlockKind;

pub const SLOT_COUNT: u32 = 32;
pub const SLOT_DURATION_MS: u32 = 13; // 12.5ms rounded for documentation; timer wheel uses slot cadence directly.

/// Which cell a base station's OgK (organization channel) is broadcasting
/// as (spec §4.10 table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellNr {
    Cell0,
    Cell1,
}

impl CellNr {
    fn index(self) -> u32 {
        match self {
            CellNr::Cell0 => 0,
            CellNr::Cell1 => 1,
        }
    }

    /// The four forward-slot indices a control channel transmits on for
    /// this cell (spec §4.10: cell 0 -> {0,8,16,24}, cell 1 -> {4,12,20,28}).
    pub fn forward_slots(self) -> [u32; 4] {
        let base = self.index() * 4;
        [base, base + 8, base + 16, base + 24]
    }

    /// `cell_auto` mode picks the cell from the slot's bit pattern, toggling
    /// between the two cells every 4 slots until a mobile responds on one
    /// (`(sched_ts & 7) >> 2` in the original).
    pub fn from_slot_auto(slot: u32) -> Self {
        if (slot & 7) >> 2 == 0 {
            CellNr::Cell0
        } else {
            CellNr::Cell1
        }
    }
}

/// Advances the 32-slot counter and tells the caller which block (if any)
/// is due to transmit this tick.
pub struct Scheduler {
    pub cell_nr: CellNr,
    pub cell_auto: bool,
    slot: u32,
    switch_countdown: Option<u32>,
    last_rufblock_slot: [Option<u32>; 2],
}

impl Scheduler {
    pub fn new(cell_nr: CellNr) -> Self {
        Self { cell_nr, cell_auto: false, slot: 0, switch_countdown: None, last_rufblock_slot: [None, None] }
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Schedule a channel-mode switch (e.g. to a traffic channel) `slots`
    /// ticks from now, giving the radio time to retune (spec §4.10).
    pub fn arm_mode_switch(&mut self, slots: u32) {
        self.switch_countdown = Some(slots);
    }

    /// Advance one 12.5ms tick. Returns the block kind due for transmission
    /// if this slot is a forward slot for the active cell, and whether an
    /// armed mode switch fires on this tick.
    pub fn tick(&mut self) -> SchedulerTick {
        if self.cell_auto {
            self.cell_nr = CellNr::from_slot_auto(self.slot);
        }

        let mode_switch_due = match self.switch_countdown {
            Some(0) | None => false,
            Some(n) => {
                let remaining = n - 1;
                self.switch_countdown = if remaining == 0 { None } else { Some(remaining) };
                remaining == 0
            }
        };

        let forward = self.cell_nr.forward_slots().contains(&self.slot);
        let block = if forward {
            let kind = BlockKind::for_slot(self.slot);
            if kind == BlockKind::Rufblock {
                self.last_rufblock_slot[self.cell_nr.index() as usize] = Some(self.slot);
            }
            Some(kind)
        } else {
            None
        };

        let tick = SchedulerTick { slot: self.slot, block, mode_switch_due };
        self.slot = (self.slot + 1) % SLOT_COUNT;
        tick
    }

    /// The slot a Rufblock was last sent on for a cell, used to match a
    /// mobile's Meldeblock reply to the paging attempt it answers.
    pub fn last_rufblock_slot(&self, cell_nr: CellNr) -> Option<u32> {
        self.last_rufblock_slot[cell_nr.index() as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTick {
    pub slot: u32,
    pub block: Option<BlockKind>,
    pub mode_switch_due: bool,
}

/// Whether a slave transceiver should nudge its sample stream to stay
/// aligned with a master sharing the same sound device (spec §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseAdjustment {
    None,
    /// Slave is one sample ahead of master; drop one sample.
    SkipOne,
    /// Slave is one sample behind master; duplicate one sample.
    InsertOne,
}

/// Compare a slave's frame-start sample count against the master's at the
/// same logical slot boundary (`frame_last_count` in the original).
/// Adjustments only apply when both counts fall strictly inside the current
/// sample chunk, exactly as the source gates this to avoid correcting
/// across a chunk boundary it can't see both sides of.
pub fn slave_phase_adjustment(
    master_count: i64,
    slave_count: i64,
    chunk_len: i64,
) -> PhaseAdjustment {
    let in_chunk = |c: i64| c > 0 && c < chunk_len - 1;
    if !in_chunk(master_count) || !in_chunk(slave_count) {
        return PhaseAdjustment::None;
    }
    if slave_count == master_count + 1 {
        PhaseAdjustment::SkipOne
    } else if slave_count == master_count - 1 {
        PhaseAdjustment::InsertOne
    } else {
        PhaseAdjustment::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_e_cell0_forward_slots() {
        let mut sched = Scheduler::new(CellNr::Cell0);
        let mut forward = Vec::new();
        for _ in 0..SLOT_COUNT {
            let tick = sched.tick();
            if tick.block.is_some() {
                forward.push(tick.slot);
            }
        }
        assert_eq!(forward, vec![0, 8, 16, 24]);
    }

    #[test]
    fn scenario_e_cell1_forward_slots() {
        let mut sched = Scheduler::new(CellNr::Cell1);
        let mut forward = Vec::new();
        for _ in 0..SLOT_COUNT {
            let tick = sched.tick();
            if tick.block.is_some() {
                forward.push(tick.slot);
            }
        }
        assert_eq!(forward, vec![4, 12, 20, 28]);
    }

    #[test]
    fn forward_slots_alternate_rufblock_and_meldeblock() {
        let mut sched = Scheduler::new(CellNr::Cell0);
        let mut kinds = Vec::new();
        for _ in 0..32 {
            let tick = sched.tick();
            if let Some(kind) = tick.block {
                kinds.push(kind);
            }
        }
        // all four cell-0 forward slots (0,8,16,24) are even -> Rufblock.
        assert!(kinds.iter().all(|&k| k == BlockKind::Rufblock));
    }

    #[test]
    fn mode_switch_fires_after_armed_slot_count() {
        let mut sched = Scheduler::new(CellNr::Cell0);
        sched.arm_mode_switch(3);
        assert!(!sched.tick().mode_switch_due);
        assert!(!sched.tick().mode_switch_due);
        assert!(sched.tick().mode_switch_due);
        assert!(!sched.tick().mode_switch_due);
    }

    #[test]
    fn slave_one_sample_ahead_is_skipped() {
        assert_eq!(slave_phase_adjustment(100, 101, 200), PhaseAdjustment::SkipOne);
    }

    #[test]
    fn slave_one_sample_behind_is_inserted() {
        assert_eq!(slave_phase_adjustment(100, 99, 200), PhaseAdjustment::InsertOne);
    }

    #[test]
    fn slave_in_sync_needs_no_adjustment() {
        assert_eq!(slave_phase_adjustment(100, 100, 200), PhaseAdjustment::None);
    }

    #[test]
    fn adjustment_suppressed_at_chunk_boundary() {
        assert_eq!(slave_phase_adjustment(0, 1, 200), PhaseAdjustment::None);
        assert_eq!(slave_phase_adjustment(199, 198, 200), PhaseAdjustment::None);
    }

    #[test]
    fn cell_auto_toggles_by_slot_bucket() {
        assert_eq!(CellNr::from_slot_auto(0), CellNr::Cell0);
        assert_eq!(CellNr::from_slot_auto(3), CellNr::Cell0);
        assert_eq!(CellNr::from_slot_auto(4), CellNr::Cell1);
        assert_eq!(CellNr::from_slot_auto(7), CellNr::Cell1);
    }
}
