//! GNSS receiver state and polling loop
//!
//! [`GnssReceiver`] owns the scanner, the decoded [`PositionFix`] and the
//! [`SatelliteTable`]. It is the only writer of that state; after every chunk
//! that completed at least one record it publishes a [`GnssSnapshot`] for
//! readers obtained through [`GnssReceiver::subscribe`].

use std::io::{self, ErrorKind, Write};
use std::time::Duration;

use heapless::Vec;
use log::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::nmea::NmeaDecoder;
use crate::publish::{Publisher, SnapshotReader};
use crate::satellites::{MAX_SATELLITES, SatelliteRecord, SatelliteTable};
use crate::scanner::{Record, Scanner, ScannerStats};
use crate::source::ByteSource;
use crate::types::{GnssSettings, SatelliteStatus};
use crate::ubx::{MAX_COMMAND_LEN, ProtocolFrame, UbxCommands, UbxMessage};

/// Bytes requested from the source per poll
pub const READ_BUFFER_LEN: usize = 512;

/// Bounded wait for each poll so the loop stays live without data
pub const POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Latest navigation solution
///
/// Each field holds the value of the most recent sentence that carried it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PositionFix {
    /// GGA fix quality above zero
    pub fix_valid: bool,
    /// Satellites used in the solution
    pub satellites: u8,
    /// Degrees, south negative
    pub latitude: f64,
    /// Degrees, west negative
    pub longitude: f64,
    /// Meters above mean sea level
    pub altitude: f32,
    pub speed_kmh: f32,
    /// Course over ground in degrees
    pub heading: f32,
    pub hdop: f32,
    pub vdop: f32,
    pub pdop: f32,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Device time of the last GGA or RMC sentence
    pub timestamp_ms: u32,
}

/// Consistent view of receiver state published to readers
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GnssSnapshot {
    pub fix: PositionFix,
    /// Satellites in table order
    pub satellites: Vec<SatelliteRecord, MAX_SATELLITES>,
}

impl GnssSnapshot {
    /// Satellites currently part of the navigation solution
    pub fn used_satellites(&self) -> impl Iterator<Item = &SatelliteRecord> {
        self.satellites
            .iter()
            .filter(|sat| sat.status == SatelliteStatus::Used)
    }

    /// Milliseconds since the last GGA or RMC, the only staleness signal
    pub fn age_ms(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.fix.timestamp_ms)
    }
}

/// Owner of the receiver-side state
///
/// # Example
/// ```
/// use navcore::{GnssReceiver, GnssSettings};
///
/// let mut receiver = GnssReceiver::new(GnssSettings::default());
/// let reader = receiver.subscribe();
///
/// receiver.ingest(b"$GPGGA,120000,,,,,1,08,,12.3,M,,M,,\r\n", 1000);
///
/// let snapshot = reader.snapshot();
/// assert!(snapshot.fix.fix_valid);
/// assert_eq!(snapshot.fix.altitude, 12.3);
/// ```
pub struct GnssReceiver {
    settings: GnssSettings,
    scanner: Scanner,
    decoder: NmeaDecoder,
    fix: PositionFix,
    satellites: SatelliteTable,
    last_ack: Option<UbxMessage>,
    publisher: Publisher<GnssSnapshot>,
}

impl GnssReceiver {
    pub fn new(settings: GnssSettings) -> Self {
        Self {
            settings,
            scanner: Scanner::with_strict_checksum(settings.strict_checksum),
            decoder: NmeaDecoder::new(&settings),
            fix: PositionFix::default(),
            satellites: SatelliteTable::new(),
            last_ack: None,
            publisher: Publisher::new(GnssSnapshot::default()),
        }
    }

    pub fn settings(&self) -> &GnssSettings {
        &self.settings
    }

    /// Reader handle for published snapshots
    pub fn subscribe(&self) -> SnapshotReader<GnssSnapshot> {
        self.publisher.reader()
    }

    /// Writer-side view of the fix, current to the last byte ingested
    pub fn fix(&self) -> &PositionFix {
        &self.fix
    }

    pub fn satellites(&self) -> &SatelliteTable {
        &self.satellites
    }

    pub fn stats(&self) -> ScannerStats {
        self.scanner.stats()
    }

    /// Most recent ACK or NAK received
    pub fn last_ack(&self) -> Option<UbxMessage> {
        self.last_ack
    }

    /// Whether the receiver answered the command `class`/`id`
    ///
    /// `Some(true)` for an ACK, `Some(false)` for a NAK and `None` when the
    /// last acknowledgement was for a different command or none arrived yet.
    pub fn acknowledged(&self, class: u8, id: u8) -> Option<bool> {
        match self.last_ack? {
            UbxMessage::AckAck { class: c, id: i } if c == class && i == id => Some(true),
            UbxMessage::AckNak { class: c, id: i } if c == class && i == id => Some(false),
            _ => None,
        }
    }

    /// Feed a chunk of receiver output
    ///
    /// Returns the number of records handled. A snapshot is published when
    /// the chunk completed at least one record.
    pub fn ingest(&mut self, bytes: &[u8], now_ms: u32) -> usize {
        let Self {
            scanner,
            decoder,
            fix,
            satellites,
            last_ack,
            ..
        } = self;

        let mut records = 0;
        scanner.feed(bytes, |record| {
            records += 1;
            match record {
                Record::Sentence(line) => {
                    decoder.decode(line, now_ms, fix, satellites);
                }
                Record::Frame(frame) => handle_frame(frame, last_ack),
            }
        });

        if records > 0 {
            self.publish();
        }
        records
    }

    /// Read what `source` has within [`POLL_TIMEOUT`] and ingest it
    ///
    /// Read errors are logged and treated as an empty read.
    pub fn poll<S: ByteSource + ?Sized>(&mut self, source: &mut S, now_ms: u32) -> usize {
        let mut buffer = [0u8; READ_BUFFER_LEN];
        match source.read_available(&mut buffer, POLL_TIMEOUT) {
            Ok(0) => 0,
            Ok(n) => self.ingest(&buffer[..n], now_ms),
            Err(e) => {
                warn!("GNSS read failed: {}", e);
                0
            }
        }
    }

    /// Send a measurement-rate command, clamped to 1..=25 Hz
    pub fn set_rate<W: Write + ?Sized>(&self, writer: &mut W, rate_hz: u8) -> io::Result<()> {
        info!("setting GNSS rate to {} Hz", rate_hz);
        let mut buffer = [0u8; MAX_COMMAND_LEN];
        let len = UbxCommands::set_rate(rate_hz, &mut buffer).ok_or_else(command_too_long)?;
        writer.write_all(&buffer[..len])
    }

    /// Send a UART baud rate command
    pub fn set_baud_rate<W: Write + ?Sized>(&self, writer: &mut W, baud: u32) -> io::Result<()> {
        info!("switching GNSS UART to {} baud", baud);
        let mut buffer = [0u8; MAX_COMMAND_LEN];
        let len = UbxCommands::set_baud_rate(baud, &mut buffer).ok_or_else(command_too_long)?;
        writer.write_all(&buffer[..len])
    }

    /// Send the constellation enable flags
    pub fn set_constellations<W: Write + ?Sized>(
        &self,
        writer: &mut W,
        gps: bool,
        glonass: bool,
        galileo: bool,
        beidou: bool,
    ) -> io::Result<()> {
        info!(
            "configuring constellations: GPS={} GLONASS={} Galileo={} BeiDou={}",
            gps, glonass, galileo, beidou
        );
        let mut buffer = [0u8; MAX_COMMAND_LEN];
        let len = UbxCommands::set_constellations(gps, glonass, galileo, beidou, &mut buffer)
            .ok_or_else(command_too_long)?;
        writer.write_all(&buffer[..len])
    }

    fn publish(&self) {
        self.publisher.publish(GnssSnapshot {
            fix: self.fix,
            satellites: self.satellites.records().clone(),
        });
    }
}

fn handle_frame(frame: &ProtocolFrame, last_ack: &mut Option<UbxMessage>) {
    let message = frame.message();
    match message {
        UbxMessage::AckAck { class, id } => {
            info!("UBX ACK for {:#04x}/{:#04x}", class, id);
            *last_ack = Some(message);
        }
        UbxMessage::AckNak { class, id } => {
            warn!("UBX NAK for {:#04x}/{:#04x}", class, id);
            *last_ack = Some(message);
        }
        UbxMessage::Other { class, id, len } => {
            debug!("UBX frame {:#04x}/{:#04x}, {} bytes", class, id, len);
        }
    }
}

fn command_too_long() -> io::Error {
    io::Error::new(ErrorKind::InvalidInput, "command exceeds buffer")
}
