use navcore::checksum::{encode_frame, nmea_checksum, verify_nmea_checksum};
use navcore::scanner::{MAX_SENTENCE_LEN, Record, Scanner};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Owned {
    Sentence(String),
    Frame {
        class: u8,
        id: u8,
        payload: Vec<u8>,
        checksum_ok: bool,
    },
}

fn own(record: Record<'_>) -> Owned {
    match record {
        Record::Sentence(line) => Owned::Sentence(line.to_string()),
        Record::Frame(frame) => Owned::Frame {
            class: frame.class,
            id: frame.id,
            payload: frame.payload().to_vec(),
            checksum_ok: frame.checksum_ok,
        },
    }
}

fn sentence(body: &str) -> Vec<u8> {
    format!("${}*{:02X}\r\n", body, nmea_checksum(body.as_bytes())).into_bytes()
}

fn frame(class: u8, id: u8, payload: &[u8]) -> Vec<u8> {
    let mut buffer = vec![0u8; payload.len() + 8];
    let len = encode_frame(class, id, payload, &mut buffer).unwrap();
    buffer.truncate(len);
    buffer
}

fn scan_all(scanner: &mut Scanner, bytes: &[u8]) -> Vec<Owned> {
    let mut records = Vec::new();
    scanner.feed(bytes, |record| records.push(own(record)));
    records
}

/// Receiver output with sentences, frames and line noise interleaved
fn mixed_stream() -> Vec<u8> {
    let mut stream = Vec::new();
    stream.extend(b"\x00\xff garbage \xb5\x00");
    stream.extend(sentence("GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,"));
    stream.extend(frame(0x05, 0x01, &[0x06, 0x8A]));
    stream.extend(sentence("GPGSV,1,1,02,05,45,120,38,12,30,200,41"));
    // payload contains '$' and newlines
    stream.extend(frame(0x01, 0x07, b"$\n\r\n$GPGGA"));
    stream.extend(frame(0x0A, 0x04, &[]));
    stream.extend(sentence("GNGSA,A,3,05,12,,,,,,,,,,,1.8,0.9,1.5"));
    stream
}

#[test]
fn test_mixed_stream_records_in_order() {
    let mut scanner = Scanner::new();
    let records = scan_all(&mut scanner, &mixed_stream());

    assert_eq!(records.len(), 6);
    assert!(matches!(&records[0], Owned::Sentence(line) if line.starts_with("$GPGGA,123519")));
    assert_eq!(
        records[1],
        Owned::Frame {
            class: 0x05,
            id: 0x01,
            payload: vec![0x06, 0x8A],
            checksum_ok: true,
        }
    );
    assert!(matches!(&records[2], Owned::Sentence(line) if line.starts_with("$GPGSV")));
    assert_eq!(
        records[3],
        Owned::Frame {
            class: 0x01,
            id: 0x07,
            payload: b"$\n\r\n$GPGGA".to_vec(),
            checksum_ok: true,
        }
    );
    assert!(matches!(&records[4], Owned::Frame { class: 0x0A, payload, .. } if payload.is_empty()));
    assert!(matches!(&records[5], Owned::Sentence(line) if line.starts_with("$GNGSA")));

    for record in &records {
        if let Owned::Sentence(line) = record {
            assert!(!line.ends_with('\r'));
            assert_eq!(verify_nmea_checksum(line), Some(true));
        }
    }

    let stats = scanner.stats();
    assert_eq!(stats.sentences, 3);
    assert_eq!(stats.frames, 3);
    assert_eq!(stats.checksum_failures, 0);
    assert!(scanner.is_idle());
}

#[test]
fn test_chunking_is_irrelevant() {
    let stream = mixed_stream();
    let expected = scan_all(&mut Scanner::new(), &stream);

    let mut rng = Pcg64::seed_from_u64(0x5EED);
    for _ in 0..200 {
        let mut scanner = Scanner::new();
        let mut records = Vec::new();
        let mut rest = stream.as_slice();
        while !rest.is_empty() {
            let take = rng.random_range(1..=rest.len().min(17));
            let (chunk, tail) = rest.split_at(take);
            scanner.feed(chunk, |record| records.push(own(record)));
            rest = tail;
        }
        assert_eq!(records, expected);
    }
}

#[test]
fn test_byte_at_a_time_push() {
    let stream = mixed_stream();
    let expected = scan_all(&mut Scanner::new(), &stream);

    let mut scanner = Scanner::new();
    let mut records = Vec::new();
    for &byte in &stream {
        if let Some(record) = scanner.push(byte) {
            records.push(own(record));
        }
    }
    assert_eq!(records, expected);
}

#[test]
fn test_corrupted_frame_reported_when_lenient() {
    let mut bytes = frame(0x05, 0x01, &[0x06, 0x8A]);
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    let mut scanner = Scanner::new();
    let records = scan_all(&mut scanner, &bytes);
    assert!(matches!(
        records.as_slice(),
        [Owned::Frame {
            checksum_ok: false,
            ..
        }]
    ));
    assert_eq!(scanner.stats().checksum_failures, 1);

    let mut strict = Scanner::with_strict_checksum(true);
    assert!(scan_all(&mut strict, &bytes).is_empty());
    assert_eq!(strict.stats().checksum_failures, 1);
    assert_eq!(strict.stats().frames, 0);
}

#[test]
fn test_strict_mode_drops_bad_sentences() {
    let mut stream = sentence("GPGGA,120000,,,,,1,08,,12.3,M,,M,,");
    stream.extend(b"$GPGGA,120000,,,,,1,08,,12.3,M,,M,,\r\n");
    stream.extend(b"$GPGGA,120000,,,,,1,08,,12.3,M,,M,,*00\r\n");

    let mut lenient = Scanner::new();
    assert_eq!(scan_all(&mut lenient, &stream).len(), 3);

    let mut strict = Scanner::with_strict_checksum(true);
    let records = scan_all(&mut strict, &stream);
    assert_eq!(records.len(), 1);
    assert_eq!(strict.stats().checksum_failures, 2);
}

#[test]
fn test_oversized_frame_is_abandoned() {
    let mut stream = vec![0xB5, 0x62, 0x01, 0x07, 0xFF, 0xFF];
    stream.extend(sentence("GPRMC,,V,,,,,,,,,,N"));

    let mut scanner = Scanner::new();
    let records = scan_all(&mut scanner, &stream);
    assert_eq!(records.len(), 1);
    assert!(matches!(&records[0], Owned::Sentence(line) if line.starts_with("$GPRMC")));
    assert_eq!(scanner.stats().oversized, 1);
}

#[test]
fn test_long_line_is_discarded_then_recovers() {
    let mut stream = vec![b'$'];
    stream.extend(std::iter::repeat_n(b'A', MAX_SENTENCE_LEN * 2));
    stream.extend(b"\r\n");
    stream.extend(sentence("GPGGA,,,,,,0,00,,,M,,M,,"));

    let mut scanner = Scanner::new();
    let records = scan_all(&mut scanner, &stream);
    assert_eq!(records.len(), 1);
    assert_eq!(scanner.stats().overflows, 1);
}

#[test]
fn test_restart_mid_sentence() {
    let mut scanner = Scanner::new();
    let records = scan_all(&mut scanner, b"$GPGGA,1234$GPRMC,,V\r\n");
    assert_eq!(records, [Owned::Sentence("$GPRMC,,V".to_string())]);
    assert_eq!(scanner.stats().resyncs, 1);
}

#[test]
fn test_reset_drops_partial_record() {
    let mut scanner = Scanner::new();
    scanner.feed(&[0xB5, 0x62, 0x05, 0x01], |_| panic!("no record expected"));
    assert!(!scanner.is_idle());

    scanner.reset();
    assert!(scanner.is_idle());
    let records = scan_all(&mut scanner, &sentence("GPGSA,A,1,,,,,,,,,,,,,,,"));
    assert_eq!(records.len(), 1);
}
