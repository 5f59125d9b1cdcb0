//! Binary frame handling for u-blox receivers
//!
//! Holds the transient [`ProtocolFrame`] the scanner fills, classification of
//! the frames the receiver logic reacts to (ACK/NAK), and generators for the
//! CFG-VALSET configuration commands sent to the receiver.
//!
//! Commands are generated into caller-provided byte arrays that can be
//! written straight to the serial port.

use crate::checksum::{FRAME_OVERHEAD, encode_frame};

/// Largest payload the scanner will buffer
pub const MAX_PAYLOAD_LEN: usize = 1024;

pub const CLASS_ACK: u8 = 0x05;
pub const ID_ACK_NAK: u8 = 0x00;
pub const ID_ACK_ACK: u8 = 0x01;
pub const CLASS_CFG: u8 = 0x06;
pub const ID_CFG_VALSET: u8 = 0x8A;

/// CFG-VALSET layer bitfield
const LAYER_RAM: u8 = 0x01;

/// Configuration keys (u-blox generation 9/10 interface)
const CFG_UART1_BAUDRATE: u32 = 0x4052_0001; // U4
const CFG_RATE_MEAS: u32 = 0x3021_0001; // U2, measurement period in ms
const CFG_SIGNAL_GPS_ENA: u32 = 0x1031_001F; // L
const CFG_SIGNAL_GAL_ENA: u32 = 0x1031_0021; // L
const CFG_SIGNAL_BDS_ENA: u32 = 0x1031_0022; // L
const CFG_SIGNAL_GLO_ENA: u32 = 0x1031_0025; // L

/// Navigation rate limits of the receiver in Hz
pub const MIN_RATE_HZ: u8 = 1;
pub const MAX_RATE_HZ: u8 = 25;

/// Version, layers and two reserved bytes
const VALSET_HEADER_LEN: usize = 4;
/// Room for the header and four one-byte key/value pairs
const VALSET_MAX_PAYLOAD: usize = VALSET_HEADER_LEN + 4 * 5;

/// Buffer size that fits any command produced by [`UbxCommands`]
pub const MAX_COMMAND_LEN: usize = FRAME_OVERHEAD + VALSET_MAX_PAYLOAD;

/// One binary frame as received
///
/// Exists only while the scanner lends it out; the payload buffer is reused
/// for the next frame.
#[derive(Clone)]
pub struct ProtocolFrame {
    pub class: u8,
    pub id: u8,
    /// Declared payload length
    pub len: u16,
    pub ck_a: u8,
    pub ck_b: u8,
    /// Whether `ck_a`/`ck_b` match the checksum computed over the frame
    pub checksum_ok: bool,
    payload: [u8; MAX_PAYLOAD_LEN],
}

impl ProtocolFrame {
    pub(crate) fn empty() -> Self {
        Self {
            class: 0,
            id: 0,
            len: 0,
            ck_a: 0,
            ck_b: 0,
            checksum_ok: false,
            payload: [0; MAX_PAYLOAD_LEN],
        }
    }

    /// Payload bytes (exactly `len` of them)
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.len as usize]
    }

    pub(crate) fn set_payload_byte(&mut self, index: usize, byte: u8) {
        self.payload[index] = byte;
    }

    /// Classify the frame
    pub fn message(&self) -> UbxMessage {
        UbxMessage::classify(self)
    }
}

impl core::fmt::Debug for ProtocolFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProtocolFrame")
            .field("class", &self.class)
            .field("id", &self.id)
            .field("len", &self.len)
            .field("checksum_ok", &self.checksum_ok)
            .field("payload", &self.payload())
            .finish()
    }
}

/// Frames the receiver logic distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UbxMessage {
    /// Receiver accepted the configuration message `class`/`id`
    AckAck { class: u8, id: u8 },
    /// Receiver rejected the configuration message `class`/`id`
    AckNak { class: u8, id: u8 },
    /// Any other frame, identified only by its header
    Other { class: u8, id: u8, len: u16 },
}

impl UbxMessage {
    pub fn classify(frame: &ProtocolFrame) -> Self {
        let payload = frame.payload();
        match (frame.class, frame.id, payload) {
            (CLASS_ACK, ID_ACK_ACK, [class, id, ..]) => UbxMessage::AckAck {
                class: *class,
                id: *id,
            },
            (CLASS_ACK, ID_ACK_NAK, [class, id, ..]) => UbxMessage::AckNak {
                class: *class,
                id: *id,
            },
            _ => UbxMessage::Other {
                class: frame.class,
                id: frame.id,
                len: frame.len,
            },
        }
    }
}

/// Incrementally assembled CFG-VALSET payload
struct ValsetPayload {
    bytes: [u8; VALSET_MAX_PAYLOAD],
    len: usize,
}

impl ValsetPayload {
    fn new() -> Self {
        let mut bytes = [0u8; VALSET_MAX_PAYLOAD];
        bytes[1] = LAYER_RAM; // version 0, reserved zero
        Self {
            bytes,
            len: VALSET_HEADER_LEN,
        }
    }

    fn push(&mut self, key: u32, value: &[u8]) {
        let end = self.len + 4 + value.len();
        self.bytes[self.len..self.len + 4].copy_from_slice(&key.to_le_bytes());
        self.bytes[self.len + 4..end].copy_from_slice(value);
        self.len = end;
    }

    fn encode(&self, buffer: &mut [u8]) -> Option<usize> {
        encode_frame(CLASS_CFG, ID_CFG_VALSET, &self.bytes[..self.len], buffer)
    }
}

/// UBX command generator for receiver configuration
///
/// Every generator returns the number of bytes written, or `None` when the
/// buffer is shorter than [`MAX_COMMAND_LEN`] requires for that command.
pub struct UbxCommands;

impl UbxCommands {
    /// CFG-VALSET switching UART1 to `baud` (RAM layer)
    ///
    /// # Example
    /// ```
    /// use navcore::ubx::{UbxCommands, MAX_COMMAND_LEN};
    ///
    /// let mut buffer = [0u8; MAX_COMMAND_LEN];
    /// let len = UbxCommands::set_baud_rate(115_200, &mut buffer).unwrap();
    /// assert_eq!(&buffer[..6], &[0xB5, 0x62, 0x06, 0x8A, 12, 0]);
    /// assert_eq!(len, 20);
    /// ```
    pub fn set_baud_rate(baud: u32, buffer: &mut [u8]) -> Option<usize> {
        let mut payload = ValsetPayload::new();
        payload.push(CFG_UART1_BAUDRATE, &baud.to_le_bytes());
        payload.encode(buffer)
    }

    /// CFG-VALSET setting the measurement rate
    ///
    /// `rate_hz` is clamped to the receiver's 1..=25 Hz range.
    pub fn set_rate(rate_hz: u8, buffer: &mut [u8]) -> Option<usize> {
        let rate_hz = rate_hz.clamp(MIN_RATE_HZ, MAX_RATE_HZ);
        let period_ms = 1000u16 / u16::from(rate_hz);
        let mut payload = ValsetPayload::new();
        payload.push(CFG_RATE_MEAS, &period_ms.to_le_bytes());
        payload.encode(buffer)
    }

    /// CFG-VALSET enabling or disabling each constellation's signals
    pub fn set_constellations(
        gps: bool,
        glonass: bool,
        galileo: bool,
        beidou: bool,
        buffer: &mut [u8],
    ) -> Option<usize> {
        let mut payload = ValsetPayload::new();
        payload.push(CFG_SIGNAL_GPS_ENA, &[u8::from(gps)]);
        payload.push(CFG_SIGNAL_GLO_ENA, &[u8::from(glonass)]);
        payload.push(CFG_SIGNAL_GAL_ENA, &[u8::from(galileo)]);
        payload.push(CFG_SIGNAL_BDS_ENA, &[u8::from(beidou)]);
        payload.encode(buffer)
    }
}
