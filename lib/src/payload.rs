//! 28-byte RM209 tally datagram encoding.
//!
//! The panel protocol is unpublished; the layout and the per-screen checksum
//! offsets below were reverse-engineered from a packet capture of the
//! vendor's own control app. They must be reproduced byte-for-byte, since
//! any deviation desynchronizes with the hardware.

use crate::{Screen, TallyState};

/// Every tally datagram is exactly this long.
pub const PAYLOAD_LEN: usize = 28;

/// Fixed opening bytes of the header.
const HEADER_MAGIC: [u8; 4] = [0x5A, 0x1C, 0x00, 0x20];

/// Fixed byte closing every payload.
const TRAILER: u8 = 0xDD;

// Per-screen checksum offsets, straight from the capture. Not a generic
// checksum algorithm: a fixed constant baked into the wire format.
const CHECKSUM_OFFSET_SCREEN_ONE: u8 = 0x15;
const CHECKSUM_OFFSET_SCREEN_TWO: u8 = 0x9C;

/// Build the datagram commanding `screen` into `state`.
///
/// Pure and deterministic: the same (screen, state) pair always yields
/// byte-identical output.
pub fn encode(screen: Screen, state: TallyState) -> [u8; PAYLOAD_LEN] {
    let mut payload = [0u8; PAYLOAD_LEN];

    // Header (9 bytes): 5A 1C 00 20 0X FF 00 YY 05, where X is the screen
    // id and YY is 7A for screen 1, 00 for screen 2.
    payload[..4].copy_from_slice(&HEADER_MAGIC);
    payload[4] = u8::from(screen);
    payload[5] = 0xFF;
    payload[6] = 0x00;
    payload[7] = match screen {
        Screen::One => 0x7A,
        Screen::Two => 0x00,
    };
    payload[8] = 0x05;

    // Body (19 bytes): state code, 16 zero bytes, checksum, trailer.
    payload[9] = state.code();
    payload[26] = state.code().wrapping_add(checksum_offset(screen));
    payload[27] = TRAILER;

    payload
}

fn checksum_offset(screen: Screen) -> u8 {
    match screen {
        Screen::One => CHECKSUM_OFFSET_SCREEN_ONE,
        Screen::Two => CHECKSUM_OFFSET_SCREEN_TWO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_always_28_bytes() {
        for screen in Screen::ALL {
            for state in TallyState::ALL {
                assert_eq!(encode(screen, state).len(), PAYLOAD_LEN);
            }
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        for screen in Screen::ALL {
            for state in TallyState::ALL {
                assert_eq!(encode(screen, state), encode(screen, state));
            }
        }
    }

    #[test]
    fn test_header_template_screen_one() {
        let payload = encode(Screen::One, TallyState::Red);
        assert_eq!(
            &payload[..9],
            &[0x5A, 0x1C, 0x00, 0x20, 0x01, 0xFF, 0x00, 0x7A, 0x05]
        );
    }

    #[test]
    fn test_header_template_screen_two() {
        let payload = encode(Screen::Two, TallyState::Red);
        assert_eq!(
            &payload[..9],
            &[0x5A, 0x1C, 0x00, 0x20, 0x02, 0xFF, 0x00, 0x00, 0x05]
        );
    }

    #[test]
    fn test_body_zero_span() {
        let payload = encode(Screen::One, TallyState::Yellow);
        assert_eq!(&payload[10..26], &[0u8; 16]);
    }

    #[test]
    fn test_trailer_byte() {
        for screen in Screen::ALL {
            for state in TallyState::ALL {
                assert_eq!(encode(screen, state)[27], 0xDD);
            }
        }
    }

    #[test]
    fn test_checksum_is_code_plus_screen_offset() {
        for state in TallyState::ALL {
            let one = encode(Screen::One, state);
            assert_eq!(one[26], state.code().wrapping_add(0x15));

            let two = encode(Screen::Two, state);
            assert_eq!(two[26], state.code().wrapping_add(0x9C));
        }
    }

    #[test]
    fn test_states_differ_only_in_code_and_checksum() {
        let off = encode(Screen::One, TallyState::Off);
        let red = encode(Screen::One, TallyState::Red);

        for (i, (a, b)) in off.iter().zip(red.iter()).enumerate() {
            if i == 9 || i == 26 {
                assert_ne!(a, b, "byte {i} should differ between off and red");
            } else {
                assert_eq!(a, b, "byte {i} should match between off and red");
            }
        }
    }

    #[test]
    fn test_screens_differ_only_in_header_and_checksum() {
        let one = encode(Screen::One, TallyState::Green);
        let two = encode(Screen::Two, TallyState::Green);

        for (i, (a, b)) in one.iter().zip(two.iter()).enumerate() {
            if i == 4 || i == 7 || i == 26 {
                assert_ne!(a, b, "byte {i} should differ between screens");
            } else {
                assert_eq!(a, b, "byte {i} should match between screens");
            }
        }
    }
}
