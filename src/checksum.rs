//! Checksums and frame encoding for the receiver's two wire formats
//!
//! Binary frames use an 8-bit Fletcher pair over class, id, length and
//! payload. NMEA sentences carry an optional XOR checksum after `*`.

/// First binary frame sync byte
pub const SYNC_1: u8 = 0xB5;
/// Second binary frame sync byte
pub const SYNC_2: u8 = 0x62;
/// Sync, class, id and two length bytes
pub const FRAME_HEADER_LEN: usize = 6;
/// Header plus the two checksum bytes
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_LEN + 2;

/// Running 8-bit Fletcher checksum
///
/// # Example
/// ```
/// use navcore::checksum::Fletcher8;
///
/// let mut checksum = Fletcher8::new();
/// checksum.extend(&[0x05, 0x01, 0x02, 0x00, 0x06, 0x8A]);
/// assert_eq!(checksum.value(), (0x98, 0xC1));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fletcher8 {
    a: u8,
    b: u8,
}

impl Fletcher8 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate one byte
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.a = self.a.wrapping_add(byte);
        self.b = self.b.wrapping_add(self.a);
    }

    /// Accumulate a run of bytes
    pub fn extend(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// Current `(ck_a, ck_b)` pair
    pub fn value(&self) -> (u8, u8) {
        (self.a, self.b)
    }

    /// Whether a received trailer matches the accumulated pair
    pub fn matches(&self, ck_a: u8, ck_b: u8) -> bool {
        self.a == ck_a && self.b == ck_b
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Checksum over class, id, length and payload bytes
pub fn ubx_checksum(data: &[u8]) -> (u8, u8) {
    let mut checksum = Fletcher8::new();
    checksum.extend(data);
    checksum.value()
}

/// Write a complete binary frame into `buffer`
///
/// Returns the number of bytes written, or `None` when the payload does not
/// fit a 16-bit length or the buffer is too small.
pub fn encode_frame(class: u8, id: u8, payload: &[u8], buffer: &mut [u8]) -> Option<usize> {
    let payload_len = u16::try_from(payload.len()).ok()?;
    let total = FRAME_OVERHEAD + payload.len();
    if buffer.len() < total {
        return None;
    }

    let [len_lo, len_hi] = payload_len.to_le_bytes();
    buffer[..FRAME_HEADER_LEN].copy_from_slice(&[SYNC_1, SYNC_2, class, id, len_lo, len_hi]);
    buffer[FRAME_HEADER_LEN..FRAME_HEADER_LEN + payload.len()].copy_from_slice(payload);

    // sync bytes are excluded
    let (ck_a, ck_b) = ubx_checksum(&buffer[2..FRAME_HEADER_LEN + payload.len()]);
    buffer[total - 2] = ck_a;
    buffer[total - 1] = ck_b;

    Some(total)
}

/// XOR of every byte in a sentence body (between `$` and `*`)
pub fn nmea_checksum(body: &[u8]) -> u8 {
    body.iter().fold(0, |acc, &byte| acc ^ byte)
}

/// Verify the `*hh` suffix of a sentence
///
/// Returns `None` when the sentence carries no checksum, otherwise whether
/// the two hex digits match the XOR of the body.
///
/// # Example
/// ```
/// use navcore::checksum::verify_nmea_checksum;
///
/// assert_eq!(verify_nmea_checksum("$GPGLL,5057.970,N,00146.110,E,142451,A*27"), Some(true));
/// assert_eq!(verify_nmea_checksum("$GPGLL,5057.970,N,00146.110,E,142451,A*28"), Some(false));
/// assert_eq!(verify_nmea_checksum("$GPGLL,5057.970,N"), None);
/// ```
pub fn verify_nmea_checksum(sentence: &str) -> Option<bool> {
    let body = sentence.strip_prefix('$').unwrap_or(sentence);
    let (body, suffix) = body.rsplit_once('*')?;
    let digits = suffix.trim_end();
    if digits.len() != 2 {
        return Some(false);
    }
    match u8::from_str_radix(digits, 16) {
        Ok(expected) => Some(nmea_checksum(body.as_bytes()) == expected),
        Err(_) => Some(false),
    }
}
