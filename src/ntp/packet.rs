//! The 48-byte NTP header and its wire codec.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |LI | VN  |Mode |    Stratum     |     Poll      |  Precision   |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         Root Delay                            |
//! |                         Root Dispersion                       |
//! |                          Reference ID                         |
//! |                     Reference Timestamp (64)                  |
//! |                      Origin Timestamp (64)                    |
//! |                      Receive Timestamp (64)                   |
//! |                      Transmit Timestamp (64)                  |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use std::io;

use byteorder::{BE, ReadBytesExt, WriteBytesExt};

use super::timestamp::{FRACTION_BITS, SHORT_FRACTION_BITS, fraction_part, integer_part, to_real};
use crate::error::{NtpError, Result};

/// Size of an NTP header without extension fields.
pub const PACKET_SIZE: usize = 48;

/// Mode value of a client request.
pub const MODE_CLIENT: u8 = 3;
/// Mode value of a server response.
pub const MODE_SERVER: u8 = 4;

const LEAP_MAX: u8 = 0b11;
const VERSION_MAX: u8 = 0b111;
const MODE_MAX: u8 = 0b111;
const SHORT_SECONDS_MAX: u32 = u16::MAX as u32;

/// An NTP header.
///
/// Leap, version and mode are kept as separate integers and only packed into
/// the first byte by [`Packet::to_bytes`], which rejects values wider than
/// their bit field. Delay, dispersion and the four timestamps are seconds;
/// the timestamps are NTP time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Packet {
    /// Leap indicator (2 bits).
    pub leap: u8,
    /// Protocol version (3 bits).
    pub version: u8,
    /// Association mode (3 bits).
    pub mode: u8,
    pub stratum: u8,
    /// Poll interval, log2 seconds.
    pub poll: i8,
    /// Clock precision, log2 seconds.
    pub precision: i8,
    /// 16.16 fixed point on the wire.
    pub root_delay: f64,
    /// 16.16 fixed point on the wire.
    pub root_dispersion: f64,
    pub ref_id: u32,
    pub ref_timestamp: f64,
    pub orig_timestamp: f64,
    pub recv_timestamp: f64,
    pub tx_timestamp: f64,
}

impl Packet {
    /// A client request carrying only version, mode and transmit timestamp.
    pub fn client_request(version: u8, tx_timestamp: f64) -> Self {
        Packet {
            version,
            mode: MODE_CLIENT,
            tx_timestamp,
            ..Packet::default()
        }
    }

    /// Serialize into a 48-byte big-endian buffer.
    pub fn to_bytes(&self) -> Result<[u8; PACKET_SIZE]> {
        let mut buf = [0u8; PACKET_SIZE];
        self.write_to(&mut buf[..])?;
        Ok(buf)
    }

    /// Serialize into any byte writer.
    pub fn write_to<W: WriteBytesExt>(&self, mut writer: W) -> Result<()> {
        let li_vn_mode = pack_li_vn_mode(self.leap, self.version, self.mode)?;
        let root_delay = short_format(self.root_delay, "root delay")?;
        let root_dispersion = short_format(self.root_dispersion, "root dispersion")?;
        let timestamps = [
            timestamp_format(self.ref_timestamp, "reference timestamp")?,
            timestamp_format(self.orig_timestamp, "originate timestamp")?,
            timestamp_format(self.recv_timestamp, "receive timestamp")?,
            timestamp_format(self.tx_timestamp, "transmit timestamp")?,
        ];

        let write = |writer: &mut W| -> io::Result<()> {
            writer.write_u8(li_vn_mode)?;
            writer.write_u8(self.stratum)?;
            writer.write_i8(self.poll)?;
            writer.write_i8(self.precision)?;
            writer.write_u32::<BE>(root_delay)?;
            writer.write_u32::<BE>(root_dispersion)?;
            writer.write_u32::<BE>(self.ref_id)?;
            for (seconds, fraction) in timestamps {
                writer.write_u32::<BE>(seconds)?;
                writer.write_u32::<BE>(fraction)?;
            }
            Ok(())
        };
        write(&mut writer).map_err(|e| NtpError::Encoding(e.to_string()))
    }

    /// Parse a 48-byte buffer. No semantic validation is performed.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() != PACKET_SIZE {
            return Err(NtpError::Decoding(format!(
                "expected {PACKET_SIZE} bytes, got {}",
                buf.len()
            )));
        }
        Self::read_from(buf).map_err(|e| NtpError::Decoding(e.to_string()))
    }

    fn read_from<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        let li_vn_mode = reader.read_u8()?;
        let stratum = reader.read_u8()?;
        let poll = reader.read_i8()?;
        let precision = reader.read_i8()?;
        let root_delay = from_short_format(reader.read_u32::<BE>()?);
        let root_dispersion = from_short_format(reader.read_u32::<BE>()?);
        let ref_id = reader.read_u32::<BE>()?;
        let mut read_timestamp = || -> io::Result<f64> {
            let seconds = reader.read_u32::<BE>()?;
            let fraction = reader.read_u32::<BE>()?;
            Ok(to_real(seconds, fraction, FRACTION_BITS))
        };
        let ref_timestamp = read_timestamp()?;
        let orig_timestamp = read_timestamp()?;
        let recv_timestamp = read_timestamp()?;
        let tx_timestamp = read_timestamp()?;

        Ok(Packet {
            leap: li_vn_mode >> 6,
            version: (li_vn_mode >> 3) & VERSION_MAX,
            mode: li_vn_mode & MODE_MAX,
            stratum,
            poll,
            precision,
            root_delay,
            root_dispersion,
            ref_id,
            ref_timestamp,
            orig_timestamp,
            recv_timestamp,
            tx_timestamp,
        })
    }
}

fn pack_li_vn_mode(leap: u8, version: u8, mode: u8) -> Result<u8> {
    if leap > LEAP_MAX {
        return Err(NtpError::Encoding(format!(
            "leap indicator {leap} does not fit in 2 bits"
        )));
    }
    if version > VERSION_MAX {
        return Err(NtpError::Encoding(format!(
            "version {version} does not fit in 3 bits"
        )));
    }
    if mode > MODE_MAX {
        return Err(NtpError::Encoding(format!(
            "mode {mode} does not fit in 3 bits"
        )));
    }
    Ok(leap << 6 | version << 3 | mode)
}

fn short_format(value: f64, field: &str) -> Result<u32> {
    let seconds = integer_part(value).map_err(|e| field_error(field, e))?;
    if seconds > SHORT_SECONDS_MAX {
        return Err(NtpError::Encoding(format!(
            "{field} {value} does not fit in 16.16 fixed point"
        )));
    }
    let fraction = fraction_part(value, SHORT_FRACTION_BITS)?;
    Ok(seconds << 16 | fraction)
}

fn from_short_format(word: u32) -> f64 {
    to_real(word >> 16, word & 0xFFFF, SHORT_FRACTION_BITS)
}

fn timestamp_format(value: f64, field: &str) -> Result<(u32, u32)> {
    let seconds = integer_part(value).map_err(|e| field_error(field, e))?;
    let fraction = fraction_part(value, FRACTION_BITS)?;
    Ok((seconds, fraction))
}

fn field_error(field: &str, err: NtpError) -> NtpError {
    match err {
        NtpError::Encoding(msg) => NtpError::Encoding(format!("{field}: {msg}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Packet {
        Packet {
            leap: 1,
            version: 4,
            mode: MODE_SERVER,
            stratum: 2,
            poll: 6,
            precision: -20,
            root_delay: 0.5 + 1.0 / 65_536.0,
            root_dispersion: 12.25,
            ref_id: u32::from_be_bytes([192, 168, 1, 10]),
            ref_timestamp: 3_913_056_000.5,
            orig_timestamp: 3_913_056_001.25,
            recv_timestamp: 3_913_056_001.375,
            tx_timestamp: 3_913_056_001.5,
        }
    }

    #[test]
    fn encodes_header_layout() {
        let buf = sample().to_bytes().unwrap();
        assert_eq!(buf.len(), PACKET_SIZE);
        assert_eq!(buf[0], 0b01_100_100);
        assert_eq!(buf[1], 2);
        assert_eq!(buf[2], 6);
        assert_eq!(buf[3] as i8, -20);
        assert_eq!(&buf[4..8], &[0x00, 0x00, 0x80, 0x01]);
        assert_eq!(&buf[8..12], &[0x00, 0x0C, 0x40, 0x00]);
        assert_eq!(&buf[12..16], &[192, 168, 1, 10]);
        assert_eq!(&buf[16..20], &3_913_056_000u32.to_be_bytes());
        assert_eq!(&buf[20..24], &0x8000_0000u32.to_be_bytes());
        assert_eq!(&buf[44..48], &0x8000_0000u32.to_be_bytes());
    }

    #[test]
    fn decode_reverses_encode() {
        let packet = sample();
        let decoded = Packet::from_bytes(&packet.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn rejects_wrong_length() {
        for len in [0, 47, 49, 68] {
            let buf = vec![0u8; len];
            assert!(matches!(
                Packet::from_bytes(&buf),
                Err(NtpError::Decoding(_))
            ));
        }
    }

    #[test]
    fn rejects_bit_field_overflow() {
        let mode = Packet { mode: 8, ..sample() };
        assert!(matches!(mode.to_bytes(), Err(NtpError::Encoding(_))));
        let version = Packet { version: 8, ..sample() };
        assert!(matches!(version.to_bytes(), Err(NtpError::Encoding(_))));
        let leap = Packet { leap: 4, ..sample() };
        assert!(matches!(leap.to_bytes(), Err(NtpError::Encoding(_))));
    }

    #[test]
    fn rejects_unrepresentable_values() {
        let delay = Packet { root_delay: 65_536.0, ..sample() };
        assert!(matches!(delay.to_bytes(), Err(NtpError::Encoding(_))));
        let negative = Packet { root_dispersion: -1.0, ..sample() };
        assert!(matches!(negative.to_bytes(), Err(NtpError::Encoding(_))));
        let ts = Packet { tx_timestamp: 5e9, ..sample() };
        let err = ts.to_bytes().unwrap_err();
        assert!(err.to_string().contains("transmit timestamp"));
    }

    #[test]
    fn decode_sign_extends_poll_and_precision() {
        let mut buf = [0u8; PACKET_SIZE];
        buf[0] = 0b11_011_100;
        buf[2] = 0xFA;
        buf[3] = 0xE9;
        let packet = Packet::from_bytes(&buf).unwrap();
        assert_eq!(packet.leap, 3);
        assert_eq!(packet.version, 3);
        assert_eq!(packet.mode, 4);
        assert_eq!(packet.poll, -6);
        assert_eq!(packet.precision, -23);
    }

    #[test]
    fn decode_does_not_validate_semantics() {
        let mut buf = [0u8; PACKET_SIZE];
        buf[0] = 0xFF;
        buf[1] = 255;
        let packet = Packet::from_bytes(&buf).unwrap();
        assert_eq!((packet.leap, packet.version, packet.mode), (3, 7, 7));
        assert_eq!(packet.stratum, 255);
    }

    #[test]
    fn client_request_sets_only_mode_version_and_transmit() {
        let packet = Packet::client_request(3, 3_913_056_000.75);
        assert_eq!(packet.mode, MODE_CLIENT);
        assert_eq!(packet.version, 3);
        assert_eq!(packet.tx_timestamp, 3_913_056_000.75);
        let buf = packet.to_bytes().unwrap();
        assert_eq!(buf[0], 0b00_011_011);
        assert!(buf[1..40].iter().all(|b| *b == 0));
    }
}
