//! Streaming scanner for mixed NMEA/UBX receiver output
//!
//! The receiver interleaves ASCII sentences and binary frames on one serial
//! line. [`Scanner`] consumes that stream one byte at a time, keeps its
//! position between calls and lends out each complete record as soon as its
//! last byte arrives. Chunk boundaries are irrelevant: feeding a stream in
//! one call or one byte per call yields the same records.
//!
//! ```text
//! Idle --'$'--> Sentence --'\n'--> line --> Idle
//! Idle --B5--> Sync2 --62--> Class --> Id --> LenLo --> LenHi
//!      --> Payload[0..len) --> CkA --> CkB --> frame --> Idle
//! ```

use log::{debug, trace};

use crate::checksum::{Fletcher8, SYNC_1, SYNC_2, verify_nmea_checksum};
use crate::ubx::{MAX_PAYLOAD_LEN, ProtocolFrame};

/// Longest sentence kept, including `$` and the trailing `\r`
pub const MAX_SENTENCE_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Sentence,
    Sync2,
    Class,
    Id,
    LenLo,
    LenHi,
    Payload,
    CkA,
    CkB,
}

/// A complete record lent out by the scanner
#[derive(Debug, Clone, Copy)]
pub enum Record<'a> {
    /// NMEA sentence starting at `$`, without the line terminator
    Sentence(&'a str),
    /// Binary frame
    Frame(&'a ProtocolFrame),
}

/// Counters describing what the scanner emitted and discarded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScannerStats {
    /// Sentences emitted
    pub sentences: u32,
    /// Binary frames emitted
    pub frames: u32,
    /// Frames or sentences whose checksum did not match
    pub checksum_failures: u32,
    /// Sentences discarded for exceeding [`MAX_SENTENCE_LEN`]
    pub overflows: u32,
    /// Frames aborted for declaring more than [`MAX_PAYLOAD_LEN`] bytes
    pub oversized: u32,
    /// Records abandoned because a new start marker arrived mid-record
    pub resyncs: u32,
}

/// Resumable byte-driven state machine
///
/// # Example
/// ```
/// use navcore::scanner::{Record, Scanner};
///
/// let mut scanner = Scanner::new();
/// let mut lines = Vec::new();
/// scanner.feed(b"$GPRMC,,V*1D\r\n$GPGGA,", |record| {
///     if let Record::Sentence(line) = record {
///         lines.push(line.to_string());
///     }
/// });
/// scanner.feed(b",,,,,0,00*4A\r\n", |record| {
///     if let Record::Sentence(line) = record {
///         lines.push(line.to_string());
///     }
/// });
/// assert_eq!(lines, ["$GPRMC,,V*1D", "$GPGGA,,,,,,0,00*4A"]);
/// ```
pub struct Scanner {
    state: State,
    line: [u8; MAX_SENTENCE_LEN],
    line_len: usize,
    frame: ProtocolFrame,
    len_lo: u8,
    payload_index: usize,
    checksum: Fletcher8,
    strict_checksum: bool,
    stats: ScannerStats,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    /// Scanner that emits every complete record regardless of checksums
    pub fn new() -> Self {
        Self::with_strict_checksum(false)
    }

    /// Scanner that optionally drops records failing their checksum
    ///
    /// With `strict` set, binary frames with a bad Fletcher pair and
    /// sentences whose `*hh` suffix is missing or wrong are discarded.
    pub fn with_strict_checksum(strict: bool) -> Self {
        Self {
            state: State::Idle,
            line: [0; MAX_SENTENCE_LEN],
            line_len: 0,
            frame: ProtocolFrame::empty(),
            len_lo: 0,
            payload_index: 0,
            checksum: Fletcher8::new(),
            strict_checksum: strict,
            stats: ScannerStats::default(),
        }
    }

    pub fn strict_checksum(&self) -> bool {
        self.strict_checksum
    }

    pub fn stats(&self) -> ScannerStats {
        self.stats
    }

    /// True between records
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Drop any partial record; statistics are kept
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.line_len = 0;
        self.payload_index = 0;
        self.checksum.reset();
    }

    /// Feed a chunk, calling `on_record` for every record it completes
    pub fn feed<F>(&mut self, bytes: &[u8], mut on_record: F)
    where
        F: FnMut(Record<'_>),
    {
        for &byte in bytes {
            if let Some(record) = self.push(byte) {
                on_record(record);
            }
        }
    }

    /// Advance by one byte
    ///
    /// Returns the record this byte completed, if any.
    pub fn push(&mut self, byte: u8) -> Option<Record<'_>> {
        match self.state {
            State::Idle => {
                self.dispatch_idle(byte);
                None
            }

            State::Sentence => match byte {
                b'\n' => {
                    self.state = State::Idle;
                    self.finish_sentence()
                }
                b'$' => {
                    trace!("sentence restarted after {} bytes", self.line_len);
                    self.stats.resyncs += 1;
                    self.begin_sentence();
                    None
                }
                SYNC_1 => {
                    trace!("sentence abandoned for binary frame");
                    self.stats.resyncs += 1;
                    self.state = State::Sync2;
                    None
                }
                _ => {
                    if self.line_len == MAX_SENTENCE_LEN {
                        debug!("sentence longer than {} bytes discarded", MAX_SENTENCE_LEN);
                        self.stats.overflows += 1;
                        self.state = State::Idle;
                    } else {
                        self.line[self.line_len] = byte;
                        self.line_len += 1;
                    }
                    None
                }
            },

            State::Sync2 => {
                if byte == SYNC_2 {
                    self.checksum.reset();
                    self.state = State::Class;
                } else {
                    trace!("lost sync on {:#04x}", byte);
                    self.stats.resyncs += 1;
                    self.state = State::Idle;
                    self.dispatch_idle(byte);
                }
                None
            }

            State::Class => {
                self.frame.class = byte;
                self.checksum.push(byte);
                self.state = State::Id;
                None
            }

            State::Id => {
                self.frame.id = byte;
                self.checksum.push(byte);
                self.state = State::LenLo;
                None
            }

            State::LenLo => {
                self.len_lo = byte;
                self.checksum.push(byte);
                self.state = State::LenHi;
                None
            }

            State::LenHi => {
                self.checksum.push(byte);
                let len = u16::from_le_bytes([self.len_lo, byte]);
                if usize::from(len) > MAX_PAYLOAD_LEN {
                    debug!(
                        "frame {:#04x}/{:#04x} declares {} bytes, aborted",
                        self.frame.class, self.frame.id, len
                    );
                    self.stats.oversized += 1;
                    self.state = State::Idle;
                } else {
                    self.frame.len = len;
                    self.payload_index = 0;
                    self.state = if len == 0 { State::CkA } else { State::Payload };
                }
                None
            }

            State::Payload => {
                self.frame.set_payload_byte(self.payload_index, byte);
                self.checksum.push(byte);
                self.payload_index += 1;
                if self.payload_index == usize::from(self.frame.len) {
                    self.state = State::CkA;
                }
                None
            }

            State::CkA => {
                self.frame.ck_a = byte;
                self.state = State::CkB;
                None
            }

            State::CkB => {
                self.frame.ck_b = byte;
                self.state = State::Idle;
                self.finish_frame()
            }
        }
    }

    fn dispatch_idle(&mut self, byte: u8) {
        match byte {
            b'$' => self.begin_sentence(),
            SYNC_1 => self.state = State::Sync2,
            _ => {}
        }
    }

    fn begin_sentence(&mut self) {
        self.line[0] = b'$';
        self.line_len = 1;
        self.state = State::Sentence;
    }

    fn finish_sentence(&mut self) -> Option<Record<'_>> {
        let mut len = self.line_len;
        while len > 0 && self.line[len - 1] == b'\r' {
            len -= 1;
        }

        let Ok(line) = core::str::from_utf8(&self.line[..len]) else {
            debug!("discarding sentence with invalid UTF-8");
            return None;
        };

        if self.strict_checksum && verify_nmea_checksum(line) != Some(true) {
            debug!("dropping sentence with bad checksum: {}", line);
            self.stats.checksum_failures += 1;
            return None;
        }

        self.stats.sentences += 1;
        Some(Record::Sentence(line))
    }

    fn finish_frame(&mut self) -> Option<Record<'_>> {
        self.frame.checksum_ok = self.checksum.matches(self.frame.ck_a, self.frame.ck_b);
        if !self.frame.checksum_ok {
            let (ck_a, ck_b) = self.checksum.value();
            debug!(
                "frame {:#04x}/{:#04x} checksum {:02x}{:02x}, expected {:02x}{:02x}",
                self.frame.class, self.frame.id, self.frame.ck_a, self.frame.ck_b, ck_a, ck_b
            );
            self.stats.checksum_failures += 1;
            if self.strict_checksum {
                return None;
            }
        }

        self.stats.frames += 1;
        Some(Record::Frame(&self.frame))
    }
}
