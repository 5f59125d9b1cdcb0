//! Fixed-capacity table of satellites reported by the receiver
//!
//! GSV sentences arrive in scan cycles: each constellation reports its
//! satellites in view over one or more numbered messages. The table keeps
//! records in arrival order for the current cycle and lets records from the
//! previous cycle linger behind the write cursor until they are overwritten
//! (or aged out, when the receiver is configured to).

use heapless::Vec;
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{Constellation, SatelliteStatus};

/// Capacity of the satellite table
pub const MAX_SATELLITES: usize = 32;

/// One satellite as last reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteRecord {
    /// PRN / satellite id
    pub id: u16,
    pub constellation: Constellation,
    /// Carrier-to-noise density in dBHz
    pub snr: u8,
    pub status: SatelliteStatus,
    /// Elevation in degrees
    pub elevation: u8,
    /// Azimuth in degrees from true north
    pub azimuth: u16,
    /// Device time of the GSV sentence that last reported this satellite
    pub last_seen_ms: u32,
}

impl SatelliteRecord {
    fn same_satellite(&self, other: &SatelliteRecord) -> bool {
        self.id == other.id && self.constellation == other.constellation
    }
}

/// Satellites in view, in GSV arrival order
///
/// # Example
/// ```
/// use navcore::satellites::{SatelliteRecord, SatelliteTable};
/// use navcore::{Constellation, SatelliteStatus};
///
/// let mut table = SatelliteTable::new();
/// table.begin_message(Constellation::Gps, 1);
/// table.upsert(SatelliteRecord { id: 7, snr: 40, ..Default::default() });
/// table.upsert(SatelliteRecord { id: 9, snr: 31, ..Default::default() });
/// table.mark_used(&[9]);
///
/// let used: Vec<u16> = table
///     .iter()
///     .filter(|sat| sat.status == SatelliteStatus::Used)
///     .map(|sat| sat.id)
///     .collect();
/// assert_eq!(used, [9]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SatelliteTable {
    records: Vec<SatelliteRecord, MAX_SATELLITES>,
    /// Records before the cursor were reported in the current cycle
    cursor: usize,
    /// Constellations that sent message 1 in the current cycle
    cycle_constellations: u8,
}

impl SatelliteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn as_slice(&self) -> &[SatelliteRecord] {
        &self.records
    }

    pub(crate) fn records(&self) -> &Vec<SatelliteRecord, MAX_SATELLITES> {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &SatelliteRecord> {
        self.records.iter()
    }

    pub fn get(&self, constellation: Constellation, id: u16) -> Option<&SatelliteRecord> {
        self.records
            .iter()
            .find(|sat| sat.constellation == constellation && sat.id == id)
    }

    /// Number of satellites reported so far in the current cycle
    pub fn current_cycle_len(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.cursor = 0;
        self.cycle_constellations = 0;
    }

    /// Note the header of a GSV message
    ///
    /// Message 1 from a constellation that already reported in this cycle
    /// starts a new cycle.
    pub fn begin_message(&mut self, constellation: Constellation, message_number: u8) {
        if message_number != 1 {
            return;
        }
        let bit = constellation.bit();
        if self.cycle_constellations & bit != 0 {
            self.cursor = 0;
            self.cycle_constellations = 0;
        }
        self.cycle_constellations |= bit;
    }

    /// Store a satellite reported by GSV
    ///
    /// Returns false when the table is full and the record was dropped.
    pub fn upsert(&mut self, record: SatelliteRecord) -> bool {
        if let Some(existing) = self.records[..self.cursor]
            .iter_mut()
            .find(|sat| sat.same_satellite(&record))
        {
            *existing = record;
            return true;
        }

        let stale = self.records[self.cursor..]
            .iter()
            .position(|sat| sat.same_satellite(&record))
            .map(|offset| self.cursor + offset);

        if let Some(index) = stale {
            self.records.swap(index, self.cursor);
        }

        if self.cursor < self.records.len() {
            self.records[self.cursor] = record;
        } else if self.records.push(record).is_err() {
            debug!(
                "satellite table full, dropping {} {}",
                record.constellation.name(),
                record.id
            );
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Promote every satellite whose id appears in `ids` to [`SatelliteStatus::Used`]
    ///
    /// Returns how many records matched. Records not listed are left as they are.
    pub fn mark_used(&mut self, ids: &[u16]) -> usize {
        let mut promoted = 0;
        for sat in self.records.iter_mut().filter(|sat| ids.contains(&sat.id)) {
            sat.status = SatelliteStatus::Used;
            promoted += 1;
        }
        promoted
    }

    /// Remove records not reported within `max_age_ms` of `now_ms`
    ///
    /// Returns the number of records removed.
    pub fn prune(&mut self, now_ms: u32, max_age_ms: u32) -> usize {
        let mut removed = 0;
        let mut index = 0;
        while index < self.records.len() {
            if now_ms.wrapping_sub(self.records[index].last_seen_ms) > max_age_ms {
                self.records.remove(index);
                if index < self.cursor {
                    self.cursor -= 1;
                }
                removed += 1;
            } else {
                index += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sat(id: u16, snr: u8) -> SatelliteRecord {
        SatelliteRecord {
            id,
            snr,
            status: SatelliteStatus::Tracking,
            ..Default::default()
        }
    }

    fn ids(table: &SatelliteTable) -> std::vec::Vec<u16> {
        table.iter().map(|sat| sat.id).collect()
    }

    #[test]
    fn test_new_cycle_overwrites_in_order() {
        let mut table = SatelliteTable::new();
        table.begin_message(Constellation::Gps, 1);
        for id in [1, 2, 3] {
            table.upsert(sat(id, 30));
        }

        table.begin_message(Constellation::Gps, 1);
        table.upsert(sat(4, 30));
        assert_eq!(ids(&table), [4, 2, 3]);
        assert_eq!(table.current_cycle_len(), 1);
    }

    #[test]
    fn test_stale_copy_moves_to_cursor() {
        let mut table = SatelliteTable::new();
        table.begin_message(Constellation::Gps, 1);
        for id in [1, 2, 3] {
            table.upsert(sat(id, 30));
        }

        table.begin_message(Constellation::Gps, 1);
        table.upsert(sat(3, 45));
        assert_eq!(ids(&table), [3, 2, 1]);
        assert_eq!(table.get(Constellation::Gps, 3).unwrap().snr, 45);
    }

    #[test]
    fn test_repeat_within_cycle_updates_in_place() {
        let mut table = SatelliteTable::new();
        table.begin_message(Constellation::Gps, 1);
        table.upsert(sat(5, 20));
        table.begin_message(Constellation::Gps, 2);
        table.upsert(sat(5, 25));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(Constellation::Gps, 5).unwrap().snr, 25);
    }

    #[test]
    fn test_constellations_share_a_cycle() {
        let mut table = SatelliteTable::new();
        table.begin_message(Constellation::Gps, 1);
        table.upsert(sat(5, 20));
        table.begin_message(Constellation::Glonass, 1);
        table.upsert(SatelliteRecord {
            constellation: Constellation::Glonass,
            ..sat(5, 20)
        });
        assert_eq!(table.len(), 2);
        assert_eq!(table.current_cycle_len(), 2);
    }

    #[test]
    fn test_full_table_drops_new_satellites() {
        let mut table = SatelliteTable::new();
        table.begin_message(Constellation::Gps, 1);
        for id in 0..MAX_SATELLITES as u16 {
            assert!(table.upsert(sat(id, 30)));
        }
        assert!(!table.upsert(sat(100, 30)));
        assert_eq!(table.len(), MAX_SATELLITES);
    }

    #[test]
    fn test_mark_used_never_demotes() {
        let mut table = SatelliteTable::new();
        table.begin_message(Constellation::Gps, 1);
        table.upsert(sat(1, 30));
        table.upsert(sat(2, 30));

        assert_eq!(table.mark_used(&[1]), 1);
        assert_eq!(table.mark_used(&[2]), 1);
        assert!(table.iter().all(|sat| sat.status == SatelliteStatus::Used));
    }

    #[test]
    fn test_prune_adjusts_cursor() {
        let mut table = SatelliteTable::new();
        table.begin_message(Constellation::Gps, 1);
        table.upsert(SatelliteRecord {
            last_seen_ms: 0,
            ..sat(1, 30)
        });
        table.upsert(SatelliteRecord {
            last_seen_ms: 5000,
            ..sat(2, 30)
        });

        assert_eq!(table.prune(6000, 2000), 1);
        assert_eq!(ids(&table), [2]);
        assert_eq!(table.current_cycle_len(), 1);
    }
}
