//! Interfaces to the hardware the library reads from
//!
//! The serial port and the sensor bus live outside this crate. Callers
//! implement [`ByteSource`] and [`SensorSource`] over whatever drivers they
//! have; [`ReaderSource`] covers anything that already implements
//! [`std::io::Read`] (serial ports, files, sockets).

use std::io::{self, ErrorKind, Read};
use std::time::Duration;

use crate::types::{ImuSample, MagSample};

/// Serial byte stream from the GNSS receiver
pub trait ByteSource {
    /// Read whatever is available into `buf`, waiting at most `timeout`
    ///
    /// Returns the number of bytes read; `Ok(0)` means nothing arrived
    /// within the wait.
    fn read_available(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;
}

/// Inertial and magnetic samples, one of each per fusion cycle
pub trait SensorSource {
    /// Latest accelerometer/gyroscope sample, `None` when the read failed
    fn read_imu(&mut self) -> Option<ImuSample>;

    /// Latest magnetometer sample, `None` when the read failed
    fn read_mag(&mut self) -> Option<MagSample>;
}

/// [`ByteSource`] over any [`Read`]
///
/// The wait is whatever the reader itself is configured with (a serial
/// port's read timeout, for instance); timeouts and would-block conditions
/// are reported as zero bytes read.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use navcore::source::{ByteSource, ReaderSource};
///
/// let mut source = ReaderSource::new(&b"$GPRMC,,V\r\n"[..]);
/// let mut buf = [0u8; 64];
/// assert_eq!(source.read_available(&mut buf, Duration::from_millis(10)).unwrap(), 11);
/// assert_eq!(source.read_available(&mut buf, Duration::from_millis(10)).unwrap(), 0);
/// ```
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_available(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(n) => Ok(n),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_available(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        (**self).read_available(buf, timeout)
    }
}

impl<S: SensorSource + ?Sized> SensorSource for &mut S {
    fn read_imu(&mut self) -> Option<ImuSample> {
        (**self).read_imu()
    }

    fn read_mag(&mut self) -> Option<MagSample> {
        (**self).read_mag()
    }
}
