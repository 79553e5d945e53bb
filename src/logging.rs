//! Deferred logging, safe from both cores.
//!
//! Neither loop may block on serial output: the RT core has a 1 ms
//! budget and the host core sits in the USB service path. Log calls
//! therefore format into a lock-free ring and return; a drain step on
//! the host side pushes entries out over whatever console is attached,
//! at its leisure. Entries are dropped (and counted) when the ring is
//! full; losing a log line beats stalling a loop.

use core::cell::UnsafeCell;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Maximum formatted message length; longer messages are truncated.
pub const MAX_MSG_LEN: usize = 96;

/// Default ring capacity (entries). Must be a power of two.
pub const LOG_RING_SIZE: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// One buffered log record.
#[derive(Clone, Copy)]
pub struct LogEntry {
    pub timestamp_us: i64,
    pub level: LogLevel,
    len: u8,
    msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: Self = Self {
        timestamp_us: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    pub fn message(&self) -> &str {
        // Filled from str fragments only; empty beats a panic if an
        // entry ever tears on a UTF-8 boundary during truncation.
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("")
    }
}

/// Lock-free log ring: producers on either core, one drain consumer.
///
/// Producers claim slots with a CAS on `write_idx` and commit them via
/// a per-slot ready flag, so concurrent pushes from both cores never
/// alias and the consumer never sees a half-written entry. Push is O(1)
/// and never blocks; a full ring drops the record without claiming a
/// slot.
pub struct LogStream<const N: usize = LOG_RING_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    ready: [AtomicBool; N],
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: slot indices are claimed exclusively via CAS (producers) and
// only handed to the single drain consumer once the slot's ready flag
// is set; no slot is ever accessed from two sides at once.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "log ring size must be a power of 2");
        Self {
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            ready: [const { AtomicBool::new(false) }; N],
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Format and queue one record. Returns false if the ring was full
    /// and the record was dropped.
    pub fn push(&self, timestamp_us: i64, level: LogLevel, args: fmt::Arguments<'_>) -> bool {
        let mut write = self.write_idx.load(Ordering::Relaxed);
        loop {
            let read = self.read_idx.load(Ordering::Acquire);
            if write.wrapping_sub(read) >= N as u32 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            match self.write_idx.compare_exchange_weak(
                write,
                write.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => write = current,
            }
        }

        let idx = (write as usize) & Self::MASK;

        // SAFETY: the CAS hands each producer a unique slot, and the
        // consumer stays away from it until the ready flag below.
        unsafe {
            let entry = &mut (*self.entries.get())[idx];
            entry.timestamp_us = timestamp_us;
            entry.level = level;
            entry.len = write_truncated(&mut entry.msg, args) as u8;
        }
        self.ready[idx].store(true, Ordering::Release);
        true
    }

    /// Pop the next record, oldest first. `None` when the ring is empty
    /// or the oldest slot is claimed but not yet committed.
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        if read == write {
            return None;
        }

        let idx = (read as usize) & Self::MASK;
        if !self.ready[idx].load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: single consumer; the producer committed this slot and
        // will not reuse it until read_idx advances past it.
        let entry = unsafe { (*self.entries.get())[idx] };
        self.ready[idx].store(false, Ordering::Relaxed);
        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Records waiting to be drained.
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Records lost to a full ring since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Render formatted text into `buf`, truncating at its end.
fn write_truncated(buf: &mut [u8], args: fmt::Arguments<'_>) -> usize {
    struct Cursor<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl fmt::Write for Cursor<'_> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let bytes = s.as_bytes();
            let n = bytes.len().min(self.buf.len() - self.pos);
            self.buf[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
            self.pos += n;
            Ok(())
        }
    }

    let mut cursor = Cursor { buf, pos: 0 };
    let _ = fmt::write(&mut cursor, args);
    cursor.pos
}

/// Render a drained entry as `[timestamp] LEVEL: message` for the
/// console drain.
pub fn format_entry(entry: &LogEntry, out: &mut impl fmt::Write) -> fmt::Result {
    write!(
        out,
        "[{:>10}] {}: {}",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.message()
    )
}

/// Queue a log record on `$stream` without blocking.
#[macro_export]
macro_rules! fw_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $stream.push($timestamp, $level, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! fw_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! fw_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! fw_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! fw_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}
