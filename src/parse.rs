pub const LINE_DELIMITER: u8 = b';';

/// Reasons a measurement field is rejected. Only `-?[0-9]+\.[0-9]` is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MeasurementError {
    #[error("empty value")]
    Empty,
    #[error("no decimal point")]
    MissingDecimalPoint,
    #[error("no digits before the decimal point")]
    MissingIntegerPart,
    #[error("expected exactly one fractional digit, found {0}")]
    FractionDigits(usize),
    #[error("unexpected byte 0x{0:02x}")]
    InvalidByte(u8),
    #[error("value does not fit in 32 bits once scaled")]
    Overflow,
}

/// Splits a record into its key and measurement at the first delimiter.
#[inline]
pub fn split_line(line: &[u8]) -> Option<(&[u8], &[u8])> {
    let delimiter = line.iter().position(|&b| b == LINE_DELIMITER)?;
    Some((&line[..delimiter], &line[delimiter + 1..]))
}

/// Parses a one-fractional-digit decimal into an integer scaled by 10.
///
/// Digits are accumulated right to left, each multiplied by its place value,
/// and the sign is applied at the end: `"-12.3"` becomes `-123`.
pub fn parse_measurement(value: &[u8]) -> Result<i32, MeasurementError> {
    let (negative, digits) = match value {
        [b'-', rest @ ..] => (true, rest),
        _ => (false, value),
    };
    if digits.is_empty() {
        return Err(MeasurementError::Empty);
    }
    let point = digits
        .iter()
        .position(|&b| b == b'.')
        .ok_or(MeasurementError::MissingDecimalPoint)?;
    let fraction_digits = digits.len() - point - 1;
    if fraction_digits != 1 {
        return Err(MeasurementError::FractionDigits(fraction_digits));
    }
    if point == 0 {
        return Err(MeasurementError::MissingIntegerPart);
    }

    let mut result: i32 = 0;
    // None once the place value no longer fits; only an error if a non-zero
    // digit lands there.
    let mut place_value = Some(1i32);
    for (i, &byte) in digits.iter().enumerate().rev() {
        if i == point {
            continue;
        }
        if !byte.is_ascii_digit() {
            return Err(MeasurementError::InvalidByte(byte));
        }
        let digit = (byte - b'0') as i32;
        if digit != 0 {
            let term = place_value
                .and_then(|place| place.checked_mul(digit))
                .ok_or(MeasurementError::Overflow)?;
            result = result.checked_add(term).ok_or(MeasurementError::Overflow)?;
        }
        place_value = place_value.and_then(|place| place.checked_mul(10));
    }

    Ok(if negative { -result } else { result })
}
