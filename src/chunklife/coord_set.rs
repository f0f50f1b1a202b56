//! Reusable candidate-cell deduper for the step's discovery phase.
//!
//! Open-addressed linear-probing set of world coordinates. Slots are lazily
//! cleared with an epoch stamp, so each generation starts a fresh set
//! without touching the backing array. Inserted keys are also kept in
//! insertion order so the read phase can split them across workers.

use super::coord::coord_hash;

const LOAD_NUM: usize = 3;
const LOAD_DEN: usize = 4;

#[derive(Clone, Copy)]
#[repr(C)]
struct Slot {
    x: i64,
    y: i64,
    stamp: u32,
}

impl Slot {
    const EMPTY: Self = Self {
        x: 0,
        y: 0,
        stamp: 0,
    };
}

#[inline]
fn slots_for(keys: usize) -> usize {
    keys.saturating_mul(LOAD_DEN)
        .div_ceil(LOAD_NUM)
        .next_power_of_two()
        .max(16)
}

pub struct CoordSet {
    slots: Vec<Slot>,
    keys: Vec<(i64, i64)>,
    /// `slots.len() - 1`; the slot count is always a power of two.
    mask: usize,
    stamp: u32,
}

impl CoordSet {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(cap: usize) -> Self {
        let slots = slots_for(cap);
        Self {
            slots: vec![Slot::EMPTY; slots],
            keys: Vec::with_capacity(cap),
            mask: slots - 1,
            stamp: 1,
        }
    }

    /// Forget every key. O(1) apart from a full wipe once per 2^32 epochs.
    #[inline]
    pub fn begin_step(&mut self) {
        self.keys.clear();
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.stamp = 1;
            for slot in &mut self.slots {
                slot.stamp = 0;
            }
        }
    }

    #[inline]
    pub fn reserve_for(&mut self, keys: usize) {
        if keys == 0 {
            return;
        }
        let needed = slots_for(keys);
        if needed > self.slots.len() {
            self.resize(needed);
        }
        self.keys.reserve(keys.saturating_sub(self.keys.len()));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys inserted since the last `begin_step`, in insertion order.
    #[inline]
    pub fn as_slice(&self) -> &[(i64, i64)] {
        &self.keys
    }

    #[inline(always)]
    fn needs_grow(&self) -> bool {
        self.keys.len() * LOAD_DEN >= self.slots.len() * LOAD_NUM
    }

    fn resize(&mut self, new_slots: usize) {
        debug_assert!(new_slots.is_power_of_two());
        self.slots = vec![Slot::EMPTY; new_slots];
        self.mask = new_slots - 1;
        let stamp = self.stamp;
        for i in 0..self.keys.len() {
            let (x, y) = self.keys[i];
            let mut pos = coord_hash(x, y) as usize & self.mask;
            while self.slots[pos].stamp == stamp {
                pos = (pos + 1) & self.mask;
            }
            self.slots[pos] = Slot { x, y, stamp };
        }
    }

    /// Insert a coordinate.
    /// Returns `true` if newly inserted, `false` if it already existed.
    #[inline]
    pub fn insert(&mut self, x: i64, y: i64) -> bool {
        if self.needs_grow() {
            self.resize(self.slots.len() * 2);
        }

        let mask = self.mask;
        let mut pos = coord_hash(x, y) as usize & mask;
        loop {
            // SAFETY: `pos` is masked by `slots.len() - 1`.
            let slot = unsafe { self.slots.get_unchecked_mut(pos) };
            if slot.stamp != self.stamp {
                *slot = Slot {
                    x,
                    y,
                    stamp: self.stamp,
                };
                self.keys.push((x, y));
                return true;
            }
            if slot.x == x && slot.y == y {
                return false;
            }
            pos = (pos + 1) & mask;
        }
    }
}

impl Default for CoordSet {
    fn default() -> Self {
        Self::new()
    }
}
