//! Frame checksum: reflected CRC-16 (polynomial 0x8408, init 0xFFFF, no final XOR).

use crc::{Crc, Digest, CRC_16_MCRF4XX};

use crate::error::DecodeError;

/// MCRF4XX is CRC-16/0x1021 reflected (0x8408 LSB-first), init 0xFFFF,
/// with no final XOR, which is exactly the frame checksum.
pub static FRAME_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_MCRF4XX);

/// Compute the frame checksum over `bytes`. Empty input yields `0xFFFF`.
pub fn checksum(bytes: &[u8]) -> u16 {
    FRAME_CRC.checksum(bytes)
}

/// Start an incremental checksum, for frames assembled piecewise.
pub fn digest() -> Digest<'static, u16> {
    FRAME_CRC.digest()
}

/// Check the little-endian checksum stored in a complete frame.
///
/// The checksum sits in the two bytes before the end marker and covers every
/// byte before it.
pub fn verify_checksum(frame: &[u8]) -> Result<(), DecodeError> {
    if frame.len() < 3 {
        return Err(DecodeError::TruncatedHeader {
            len: frame.len(),
            needed: 3,
        });
    }
    let crc_at = frame.len() - 3;
    let computed = checksum(&frame[..crc_at]);
    let received = u16::from_le_bytes([frame[crc_at], frame[crc_at + 1]]);
    if computed != received {
        return Err(DecodeError::ChecksumMismatch { computed, received });
    }
    Ok(())
}
