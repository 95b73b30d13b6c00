//! Frame checksum
//!
//! MeCom frames carry a CRC-16/CCITT (poly 0x1021, init 0x0000, MSB first,
//! no reflection, no final XOR) over the header and payload characters.
//! That parameter set is known as CRC-16/XMODEM.

use crc::{Crc, CRC_16_XMODEM};

const MECOM_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Compute the frame checksum over a byte span
pub fn checksum(bytes: &[u8]) -> u16 {
    MECOM_CRC.checksum(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(checksum(b"123456789"), 0x31C3);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(checksum(b""), 0x0000);
    }

    #[test]
    fn test_deterministic() {
        let frame = b"#000001?VR03E801";
        assert_eq!(checksum(frame), checksum(frame));
        assert_ne!(checksum(frame), checksum(b"#000002?VR03E801"));
    }
}
