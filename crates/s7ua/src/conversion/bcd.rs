// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Binary-coded decimal helpers.

use crate::error::ConversionError;

/// Decodes one nibble, rejecting values above 9.
#[inline]
pub fn decode_nibble(nibble: u8, byte: u8, position: usize) -> Result<u8, ConversionError> {
    if nibble > 9 {
        return Err(ConversionError::invalid_bcd(byte, position));
    }
    Ok(nibble)
}

/// Decodes a two-digit BCD byte (0x00..=0x99) to 0..=99.
pub fn decode_byte(byte: u8, position: usize) -> Result<u8, ConversionError> {
    let tens = decode_nibble(byte >> 4, byte, position)?;
    let ones = decode_nibble(byte & 0x0F, byte, position)?;
    Ok(tens * 10 + ones)
}

/// Encodes 0..=99 as a two-digit BCD byte.
pub fn encode_byte(value: u8) -> Result<u8, ConversionError> {
    if value > 99 {
        return Err(ConversionError::value_out_of_range(value, 0, 99));
    }
    Ok(((value / 10) << 4) | (value % 10))
}

/// Decodes the low three BCD digits of a word (0..=999).
pub fn decode_three_digits(word: u16) -> Result<u16, ConversionError> {
    let [high, low] = word.to_be_bytes();
    let hundreds = decode_nibble(high & 0x0F, high, 0)?;
    let tens = decode_nibble(low >> 4, low, 1)?;
    let ones = decode_nibble(low & 0x0F, low, 1)?;
    Ok(hundreds as u16 * 100 + tens as u16 * 10 + ones as u16)
}

/// Encodes 0..=999 into the low three BCD digits of a word.
pub fn encode_three_digits(value: u16) -> Result<u16, ConversionError> {
    if value > 999 {
        return Err(ConversionError::value_out_of_range(value, 0, 999));
    }
    let hundreds = value / 100;
    let tens = (value / 10) % 10;
    let ones = value % 10;
    Ok((hundreds << 8) | (tens << 4) | ones)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_roundtrip() {
        assert_eq!(encode_byte(0).unwrap(), 0x00);
        assert_eq!(encode_byte(59).unwrap(), 0x59);
        assert_eq!(encode_byte(99).unwrap(), 0x99);
        assert_eq!(decode_byte(0x42, 0).unwrap(), 42);
        assert!(encode_byte(100).is_err());
    }

    #[test]
    fn test_invalid_nibbles() {
        assert!(matches!(
            decode_byte(0x4A, 3),
            Err(ConversionError::InvalidFormat { .. })
        ));
        assert!(decode_byte(0xA1, 0).is_err());
    }

    #[test]
    fn test_three_digits() {
        assert_eq!(encode_three_digits(123).unwrap(), 0x0123);
        assert_eq!(decode_three_digits(0x2999).unwrap(), 999);
        assert!(decode_three_digits(0x00F0).is_err());
        assert!(encode_three_digits(1000).is_err());
    }
}
