// LogDelta - GPL-3.0-or-later
// This file is part of LogDelta.
//
// Copyright (C) 2026 The LogDelta Authors
//
// LogDelta is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// LogDelta is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with LogDelta.  If not, see <https://www.gnu.org/licenses/>.

//! Reuse of canonical record buffers across normalization calls.
//!
//! Pooling only bounds allocation pressure under high request volume. A
//! [`RecordSource`] that always allocates ([`Unpooled`]) behaves identically.

use crate::parser::CanonicalRecord;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Default number of idle records kept for reuse
pub const DEFAULT_MAX_IDLE: usize = 256;

/// Hands out and takes back canonical records.
///
/// Implementations must be safe to share between concurrent analysis
/// requests. An acquired record is owned by exactly one caller until released.
pub trait RecordSource: Send + Sync {
    /// Get a record that is indistinguishable from a freshly created one.
    fn acquire(&self) -> CanonicalRecord;

    /// Give a record back. Its contents are cleared before any reuse.
    fn release(&self, record: CanonicalRecord);
}

/// Snapshot of pool activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub allocated: u64,
    pub reused: u64,
    pub idle: usize,
}

/// Bounded free-list pool of [`CanonicalRecord`]s.
#[derive(Debug)]
pub struct RecordPool {
    free: Mutex<Vec<CanonicalRecord>>,
    max_idle: usize,
    allocated: AtomicU64,
    reused: AtomicU64,
}

impl RecordPool {
    #[must_use]
    pub const fn new(max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_idle,
            allocated: AtomicU64::new(0),
            reused: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.allocated.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            idle: self.free_list().len(),
        }
    }

    // Records are reset before they enter the free list, so a poisoned lock
    // never exposes partially written data.
    fn free_list(&self) -> std::sync::MutexGuard<'_, Vec<CanonicalRecord>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RecordPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE)
    }
}

impl RecordSource for RecordPool {
    fn acquire(&self) -> CanonicalRecord {
        let recycled = self.free_list().pop();
        recycled.map_or_else(
            || {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                CanonicalRecord::new()
            },
            |record| {
                self.reused.fetch_add(1, Ordering::Relaxed);
                record
            },
        )
    }

    fn release(&self, mut record: CanonicalRecord) {
        record.reset();
        let mut free = self.free_list();
        if free.len() < self.max_idle {
            free.push(record);
        }
    }
}

/// Plain allocation, no reuse.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unpooled;

impl RecordSource for Unpooled {
    fn acquire(&self) -> CanonicalRecord {
        CanonicalRecord::new()
    }

    fn release(&self, _record: CanonicalRecord) {}
}
