//! Fixed-point NTP time conversions.
//!
//! NTP carries time as an unsigned integer number of seconds followed by an
//! unsigned binary fraction. Timestamps use a 32-bit fraction, root delay and
//! root dispersion a 16-bit one. Everything above this module works in `f64`
//! seconds; all truncation happens here.

use crate::error::{NtpError, Result};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch (1970-01-01).
pub const NTP_EPOCH_DELTA: f64 = 2_208_988_800.0;

/// Fraction width of the 64-bit timestamp format.
pub const FRACTION_BITS: u32 = 32;

/// Fraction width of the 32-bit short format (root delay, root dispersion).
pub const SHORT_FRACTION_BITS: u32 = 16;

/// Integer seconds of `t`, truncated toward zero.
///
/// `t` must be finite and within `0..=u32::MAX`.
pub fn integer_part(t: f64) -> Result<u32> {
    if !t.is_finite() || t < 0.0 || t.trunc() > u32::MAX as f64 {
        return Err(NtpError::Encoding(format!(
            "{t} is outside the 32-bit unsigned seconds range"
        )));
    }
    Ok(t.trunc() as u32)
}

/// Fractional part of `t` scaled to `frac_bits` bits, truncated.
pub fn fraction_part(t: f64, frac_bits: u32) -> Result<u32> {
    check_width(frac_bits)?;
    let int = integer_part(t)?;
    let frac = (t - int as f64).abs() * scale(frac_bits);
    Ok(frac.trunc() as u32)
}

/// Rebuild seconds from an integer part and a `frac_bits`-wide fraction.
pub fn to_real(int_part: u32, frac_part: u32, frac_bits: u32) -> f64 {
    int_part as f64 + frac_part as f64 / scale(frac_bits)
}

/// NTP seconds to Unix seconds.
pub fn to_calendar_time(ntp_time: f64) -> f64 {
    ntp_time - NTP_EPOCH_DELTA
}

/// Unix seconds to NTP seconds.
pub fn to_ntp_time(calendar_time: f64) -> f64 {
    calendar_time + NTP_EPOCH_DELTA
}

fn scale(frac_bits: u32) -> f64 {
    (1u64 << frac_bits) as f64
}

fn check_width(frac_bits: u32) -> Result<()> {
    if frac_bits == 0 || frac_bits > FRACTION_BITS {
        return Err(NtpError::Encoding(format!(
            "fraction width must be 1..=32 bits, got {frac_bits}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_part_truncates() {
        assert_eq!(integer_part(0.0).unwrap(), 0);
        assert_eq!(integer_part(1.999).unwrap(), 1);
        assert_eq!(integer_part(u32::MAX as f64 + 0.5).unwrap(), u32::MAX);
    }

    #[test]
    fn integer_part_rejects_out_of_range() {
        assert!(matches!(integer_part(-0.5), Err(NtpError::Encoding(_))));
        assert!(matches!(
            integer_part(u32::MAX as f64 + 1.0),
            Err(NtpError::Encoding(_))
        ));
        assert!(integer_part(f64::NAN).is_err());
        assert!(integer_part(f64::INFINITY).is_err());
    }

    #[test]
    fn fraction_part_scales_to_width() {
        assert_eq!(fraction_part(1.5, 32).unwrap(), 0x8000_0000);
        assert_eq!(fraction_part(1.5, 16).unwrap(), 0x8000);
        assert_eq!(fraction_part(3.25, 16).unwrap(), 0x4000);
        assert_eq!(fraction_part(7.0, 32).unwrap(), 0);
    }

    #[test]
    fn fraction_part_rejects_bad_width() {
        assert!(fraction_part(1.5, 0).is_err());
        assert!(fraction_part(1.5, 33).is_err());
    }

    #[test]
    fn quantized_values_round_trip() {
        let samples = [
            0.0,
            0.5,
            1000.0 + 1.0 / 1024.0,
            123_456.0 + 3.0 / 65_536.0,
            3_913_056_000.0 + 0.25,
        ];
        for t in samples {
            let int = integer_part(t).unwrap();
            let frac = fraction_part(t, FRACTION_BITS).unwrap();
            assert_eq!(to_real(int, frac, FRACTION_BITS), t, "round trip of {t}");
        }
    }

    #[test]
    fn unquantized_values_lose_at_most_one_unit() {
        let t = 12.345_678_9;
        let int = integer_part(t).unwrap();
        let frac = fraction_part(t, SHORT_FRACTION_BITS).unwrap();
        let back = to_real(int, frac, SHORT_FRACTION_BITS);
        assert!(back <= t);
        assert!(t - back < 1.0 / 65_536.0);
    }

    #[test]
    fn epoch_conversion_is_exact_inverse() {
        for t in [0.0, 1.5, 1_700_000_000.125, 4_000_000_000.0] {
            assert_eq!(to_calendar_time(to_ntp_time(t)), t);
        }
        assert_eq!(to_ntp_time(0.0), NTP_EPOCH_DELTA);
        assert_eq!(to_calendar_time(NTP_EPOCH_DELTA), 0.0);
    }
}
