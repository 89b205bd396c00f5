//! `WxH` size strings, e.g. `32x32`.

use std::num::IntErrorKind;

pub const MAX_DIMENSION: i64 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SizeError {
    #[error("Invalid size format. Use format like '32x32'")]
    InvalidFormat,
    #[error("Maximum size is 128x128")]
    SizeTooLarge,
}

/// Parse a size string into `(width, height)`.
///
/// The string must split on `x` into exactly two integers. Anything above
/// 128 is rejected as too large before the lower bound is considered, so
/// `-5x200` reports `SizeTooLarge` while `0x16` reports `InvalidFormat`.
pub fn parse_size(size: &str) -> Result<(u32, u32), SizeError> {
    let parts: Vec<&str> = size.split('x').collect();
    if parts.len() != 2 {
        return Err(SizeError::InvalidFormat);
    }

    let width = parse_dimension(parts[0])?;
    let height = parse_dimension(parts[1])?;

    let (Some(width), Some(height)) = (width, height) else {
        return Err(SizeError::SizeTooLarge);
    };

    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(SizeError::SizeTooLarge);
    }
    if width < 1 || height < 1 {
        return Err(SizeError::InvalidFormat);
    }

    // Both values are in 1..=128 here.
    Ok((width as u32, height as u32))
}

/// `Ok(None)` means the integer was well formed but overflowed.
fn parse_dimension(raw: &str) -> Result<Option<i64>, SizeError> {
    match raw.trim().parse::<i64>() {
        Ok(v) => Ok(Some(v)),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(None),
        Err(_) => Err(SizeError::InvalidFormat),
    }
}
