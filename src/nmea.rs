//! NMEA sentence decoding into the receiver's position and satellite state
//!
//! Decoding is positional: each sentence type writes the fields it carries
//! and leaves everything else untouched. An empty or unparseable field keeps
//! the value an earlier sentence wrote, so a receiver that omits a field for
//! a moment does not blank it out.

use heapless::Vec;
use log::trace;

use crate::gnss::PositionFix;
use crate::satellites::{SatelliteRecord, SatelliteTable};
use crate::types::{Constellation, GnssSettings, SatelliteStatus};

/// Fields kept per sentence; GSV with four satellites needs 20
const MAX_FIELDS: usize = 24;

/// Used-satellite slots in a GSA sentence
const GSA_SLOTS: usize = 12;

const KNOTS_TO_KMH: f32 = 1.852;

/// Sentence types the decoder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind {
    /// Fix data
    Gga,
    /// Recommended minimum data
    Rmc,
    /// Satellites in view
    Gsv,
    /// DOP and active satellites
    Gsa,
}

impl SentenceKind {
    fn from_type(sentence_type: &str) -> Option<Self> {
        match sentence_type {
            "GGA" => Some(SentenceKind::Gga),
            "RMC" => Some(SentenceKind::Rmc),
            "GSV" => Some(SentenceKind::Gsv),
            "GSA" => Some(SentenceKind::Gsa),
            _ => None,
        }
    }
}

/// Stateless field decoder configured from [`GnssSettings`]
///
/// # Example
/// ```
/// use navcore::gnss::PositionFix;
/// use navcore::nmea::{NmeaDecoder, SentenceKind};
/// use navcore::satellites::SatelliteTable;
/// use navcore::GnssSettings;
///
/// let decoder = NmeaDecoder::new(&GnssSettings::default());
/// let mut fix = PositionFix::default();
/// let mut table = SatelliteTable::new();
///
/// let kind = decoder.decode("$GPGGA,120000,,,,,1,08,,12.3,M,,M,,", 1000, &mut fix, &mut table);
/// assert_eq!(kind, Some(SentenceKind::Gga));
/// assert!(fix.fix_valid);
/// assert_eq!(fix.satellites, 8);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NmeaDecoder {
    rmc_navigation: bool,
    satellite_max_age_ms: Option<u32>,
}

impl NmeaDecoder {
    pub fn new(settings: &GnssSettings) -> Self {
        Self {
            rmc_navigation: settings.rmc_navigation,
            satellite_max_age_ms: settings.satellite_max_age_ms,
        }
    }

    /// Decode one sentence
    ///
    /// `line` starts at `$` and may carry a `*hh` suffix, which is ignored.
    /// Returns the sentence type when it was recognized. Unknown types,
    /// proprietary sentences, types followed by anything but `,` or `*`, and
    /// lines too short to carry a prefix return `None` and change nothing.
    pub fn decode(
        &self,
        line: &str,
        now_ms: u32,
        fix: &mut PositionFix,
        satellites: &mut SatelliteTable,
    ) -> Option<SentenceKind> {
        let body = line.strip_prefix('$')?;
        let talker = body.get(0..2)?;
        // proprietary sentences ($P...) share the layout but not the meaning
        if talker.starts_with('P') {
            return None;
        }
        if !matches!(body.as_bytes().get(5), None | Some(b',' | b'*')) {
            return None;
        }
        let kind = SentenceKind::from_type(body.get(2..5)?)?;

        let body = body.split_once('*').map_or(body, |(fields, _)| fields);
        let fields: Vec<&str, MAX_FIELDS> = body.split(',').take(MAX_FIELDS).collect();

        trace!("{:?} from {} with {} fields", kind, talker, fields.len());
        match kind {
            SentenceKind::Gga => decode_gga(&fields, now_ms, fix),
            SentenceKind::Rmc => self.decode_rmc(&fields, now_ms, fix),
            SentenceKind::Gsv => self.decode_gsv(talker, &fields, now_ms, satellites),
            SentenceKind::Gsa => decode_gsa(&fields, fix, satellites),
        }
        Some(kind)
    }

    fn decode_rmc(&self, fields: &[&str], now_ms: u32, fix: &mut PositionFix) {
        fix.timestamp_ms = now_ms;
        if !self.rmc_navigation {
            return;
        }

        set_time(fields, 1, fix);
        if let Some((day, month, year)) = field(fields, 9).and_then(parse_date) {
            fix.day = day;
            fix.month = month;
            fix.year = year;
        }

        // 'V' means the receiver has no valid solution to report
        if field(fields, 2) != Some("A") {
            return;
        }
        set_position(fields, 3, fix);
        if let Some(knots) = parse_field::<f32>(fields, 7) {
            fix.speed_kmh = knots * KNOTS_TO_KMH;
        }
        if let Some(course) = parse_field(fields, 8) {
            fix.heading = course;
        }
    }

    fn decode_gsv(
        &self,
        talker: &str,
        fields: &[&str],
        now_ms: u32,
        satellites: &mut SatelliteTable,
    ) {
        let constellation = Constellation::from_talker(talker);
        if let Some(message_number) = parse_field(fields, 2) {
            satellites.begin_message(constellation, message_number);
        }

        let mut group = 4;
        while group + 3 < fields.len() {
            let snr = parse_field::<u8>(fields, group + 3);
            let id = parse_field::<u16>(fields, group);
            if let (Some(id), Some(snr)) = (id, snr) {
                let mut record = satellites
                    .get(constellation, id)
                    .copied()
                    .unwrap_or(SatelliteRecord {
                        id,
                        constellation,
                        ..Default::default()
                    });
                if let Some(elevation) = parse_field(fields, group + 1) {
                    record.elevation = elevation;
                }
                if let Some(azimuth) = parse_field(fields, group + 2) {
                    record.azimuth = azimuth;
                }
                record.snr = snr;
                record.status = SatelliteStatus::Tracking;
                record.last_seen_ms = now_ms;
                satellites.upsert(record);
            }
            group += 4;
        }

        if let Some(max_age_ms) = self.satellite_max_age_ms {
            let removed = satellites.prune(now_ms, max_age_ms);
            if removed > 0 {
                trace!("aged out {} satellites", removed);
            }
        }
    }
}

fn decode_gga(fields: &[&str], now_ms: u32, fix: &mut PositionFix) {
    set_time(fields, 1, fix);
    set_position(fields, 2, fix);
    if let Some(quality) = parse_field::<u8>(fields, 6) {
        fix.fix_valid = quality > 0;
    }
    if let Some(satellites) = parse_field(fields, 7) {
        fix.satellites = satellites;
    }
    if let Some(hdop) = parse_field(fields, 8) {
        fix.hdop = hdop;
    }
    if let Some(altitude) = parse_field(fields, 9) {
        fix.altitude = altitude;
    }
    fix.timestamp_ms = now_ms;
}

fn decode_gsa(fields: &[&str], fix: &mut PositionFix, satellites: &mut SatelliteTable) {
    let used: Vec<u16, GSA_SLOTS> = (3..3 + GSA_SLOTS)
        .filter_map(|index| parse_field(fields, index))
        .collect();

    if let Some(pdop) = parse_field(fields, 15) {
        fix.pdop = pdop;
    }
    if let Some(hdop) = parse_field(fields, 16) {
        fix.hdop = hdop;
    }
    if let Some(vdop) = parse_field(fields, 17) {
        fix.vdop = vdop;
    }

    let promoted = satellites.mark_used(&used);
    trace!("{} satellites in use, {} matched", used.len(), promoted);
}

/// Non-empty field at `index`
fn field<'a>(fields: &[&'a str], index: usize) -> Option<&'a str> {
    fields.get(index).copied().filter(|value| !value.is_empty())
}

fn parse_field<T: core::str::FromStr>(fields: &[&str], index: usize) -> Option<T> {
    field(fields, index)?.parse().ok()
}

fn set_time(fields: &[&str], index: usize, fix: &mut PositionFix) {
    if let Some((hour, minute, second)) = field(fields, index).and_then(parse_time) {
        fix.hour = hour;
        fix.minute = minute;
        fix.second = second;
    }
}

/// Latitude pair at `index`, longitude pair right after it
fn set_position(fields: &[&str], index: usize, fix: &mut PositionFix) {
    if let (Some(value), Some(hemisphere)) = (field(fields, index), field(fields, index + 1)) {
        if let Some(latitude) = parse_coordinate(value, hemisphere) {
            fix.latitude = latitude;
        }
    }
    if let (Some(value), Some(hemisphere)) = (field(fields, index + 2), field(fields, index + 3)) {
        if let Some(longitude) = parse_coordinate(value, hemisphere) {
            fix.longitude = longitude;
        }
    }
}

/// Parse a `ddmm.mmmm` / `dddmm.mmmm` coordinate into signed degrees
fn parse_coordinate(value: &str, hemisphere: &str) -> Option<f64> {
    let raw = value.parse::<f64>().ok()?;
    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;

    match hemisphere {
        "N" | "E" => Some(decimal),
        "S" | "W" => Some(-decimal),
        _ => None,
    }
}

/// Parse `hhmmss[.ss]`; fractional seconds are dropped
fn parse_time(value: &str) -> Option<(u8, u8, u8)> {
    let hour = value.get(0..2)?.parse().ok()?;
    let minute = value.get(2..4)?.parse().ok()?;
    let second = value.get(4..6)?.parse().ok()?;
    Some((hour, minute, second))
}

/// Parse `ddmmyy` into (day, month, year)
fn parse_date(value: &str) -> Option<(u8, u8, u16)> {
    let day = value.get(0..2)?.parse().ok()?;
    let month = value.get(2..4)?.parse().ok()?;
    let year: u16 = value.get(4..6)?.parse().ok()?;
    Some((day, month, 2000 + year))
}
