//! Wire codec for the 160-bit command frames exchanged with Stellarium and
//! the custom control client, and for the 192-bit Stellarium position frame
//! sent back. Ported from the source daemon's `common/protocol.py` mtype
//! table and `handler.py`'s `_unpack_*`/`_pack_stellarium` helpers.

use crate::error::FrameError;

pub const REQUEST_FRAME_SIZE: usize = 20;
pub const POSITION_FRAME_SIZE: usize = 24;

/// One decoded client-to-server command. One variant per `mtype`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Command {
    /// mtype 0: a Stellarium `goto`. `ra_uint`/`dec_int` are the raw wire
    /// integers; callers convert with [`stellarium_to_radec`].
    Stellarium {
        time_us: i64,
        ra_uint: u32,
        dec_int: i32,
    },
    /// mtype 1: observer location, radians/meters.
    Location { lon: f32, lat: f32, alt: f32 },
    /// mtype 2
    StartCal,
    /// mtype 3
    StopCal,
    /// mtype 4
    MakeStep { az_steps: i16, alt_steps: i16 },
    /// mtype 5
    StartMot {
        motor_id: i16,
        action: i16,
        direction: i16,
    },
    /// mtype 6
    SetAngle { object_id: i16 },
    /// mtype 7
    ToggleTrack,
    /// mtype 8
    ApplyObject,
    /// mtype 99
    Status { code: i16 },
}

impl Command {
    /// A command is "single-shot": after dispatch the connection loop
    /// `break`s and stops polling. `Stellarium` is the one exception —
    /// Stellarium keeps the socket open and sends repeated gotos.
    pub fn is_single_shot(&self) -> bool {
        !matches!(self, Command::Stellarium { .. })
    }
}

fn u16_le(b: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([b[offset], b[offset + 1]])
}

fn u32_le(b: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([b[offset], b[offset + 1], b[offset + 2], b[offset + 3]])
}

fn i32_le(b: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([b[offset], b[offset + 1], b[offset + 2], b[offset + 3]])
}

fn i64_le(b: &[u8], offset: usize) -> i64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&b[offset..offset + 8]);
    i64::from_le_bytes(buf)
}

fn i16_le(b: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([b[offset], b[offset + 1]])
}

fn f32_le(b: &[u8], offset: usize) -> f32 {
    f32::from_bits(u32_le(b, offset))
}

/// Decode a request frame. `bytes` must be exactly [`REQUEST_FRAME_SIZE`]
/// long, as delivered by a 20-byte socket read (§4.F: `msize` is always
/// `0x0014` and is not itself re-validated here beyond the length check).
pub fn decode(bytes: &[u8]) -> Result<Command, FrameError> {
    if bytes.len() < 4 {
        return Err(FrameError::TooShort(bytes.len()));
    }
    let msize = u16_le(bytes, 0);
    if msize as usize != REQUEST_FRAME_SIZE {
        return Err(FrameError::SizeMismatch {
            got: msize,
            want: REQUEST_FRAME_SIZE as u16,
        });
    }
    if bytes.len() < REQUEST_FRAME_SIZE {
        return Err(FrameError::TooShort(bytes.len()));
    }
    let mtype = u16_le(bytes, 2);
    let payload = &bytes[4..REQUEST_FRAME_SIZE];

    let command = match mtype {
        0 => Command::Stellarium {
            time_us: i64_le(payload, 0),
            ra_uint: u32_le(payload, 8),
            dec_int: i32_le(payload, 12),
        },
        1 => Command::Location {
            lon: f32_le(payload, 0),
            lat: f32_le(payload, 4),
            alt: f32_le(payload, 8),
        },
        2 => Command::StartCal,
        3 => Command::StopCal,
        4 => Command::MakeStep {
            az_steps: i16_le(payload, 0),
            alt_steps: i16_le(payload, 2),
        },
        5 => Command::StartMot {
            motor_id: i16_le(payload, 0),
            action: i16_le(payload, 2),
            direction: i16_le(payload, 4),
        },
        6 => Command::SetAngle {
            object_id: i16_le(payload, 0),
        },
        7 => Command::ToggleTrack,
        8 => Command::ApplyObject,
        99 => Command::Status {
            code: i16_le(payload, 0),
        },
        other => return Err(FrameError::UnknownType(other)),
    };
    Ok(command)
}

/// Re-encode a command back into a 20-byte frame. Used by tests (unit and
/// integration) to check the round-trip property (§8 invariant 5) and to
/// script commands against a live server; the server itself never needs to
/// re-encode a request it has already dispatched.
pub fn encode(command: &Command) -> [u8; REQUEST_FRAME_SIZE] {
    let mut buf = [0u8; REQUEST_FRAME_SIZE];
    buf[0..2].copy_from_slice(&(REQUEST_FRAME_SIZE as u16).to_le_bytes());
    let mtype: u16 = match command {
        Command::Stellarium { .. } => 0,
        Command::Location { .. } => 1,
        Command::StartCal => 2,
        Command::StopCal => 3,
        Command::MakeStep { .. } => 4,
        Command::StartMot { .. } => 5,
        Command::SetAngle { .. } => 6,
        Command::ToggleTrack => 7,
        Command::ApplyObject => 8,
        Command::Status { .. } => 99,
    };
    buf[2..4].copy_from_slice(&mtype.to_le_bytes());
    let payload = &mut buf[4..REQUEST_FRAME_SIZE];
    match *command {
        Command::Stellarium {
            time_us,
            ra_uint,
            dec_int,
        } => {
            payload[0..8].copy_from_slice(&time_us.to_le_bytes());
            payload[8..12].copy_from_slice(&ra_uint.to_le_bytes());
            payload[12..16].copy_from_slice(&dec_int.to_le_bytes());
        }
        Command::Location { lon, lat, alt } => {
            payload[0..4].copy_from_slice(&lon.to_le_bytes());
            payload[4..8].copy_from_slice(&lat.to_le_bytes());
            payload[8..12].copy_from_slice(&alt.to_le_bytes());
        }
        Command::StartCal | Command::StopCal | Command::ToggleTrack | Command::ApplyObject => {}
        Command::MakeStep {
            az_steps,
            alt_steps,
        } => {
            payload[0..2].copy_from_slice(&az_steps.to_le_bytes());
            payload[2..4].copy_from_slice(&alt_steps.to_le_bytes());
        }
        Command::StartMot {
            motor_id,
            action,
            direction,
        } => {
            payload[0..2].copy_from_slice(&motor_id.to_le_bytes());
            payload[2..4].copy_from_slice(&action.to_le_bytes());
            payload[4..6].copy_from_slice(&direction.to_le_bytes());
        }
        Command::SetAngle { object_id } => {
            payload[0..2].copy_from_slice(&object_id.to_le_bytes());
        }
        Command::Status { code } => {
            payload[0..2].copy_from_slice(&code.to_le_bytes());
        }
    }
    buf
}

/// `ra_uint`/`dec_int` wire integers to `(ra_hours, dec_deg)` (§4.F).
pub fn stellarium_to_radec(ra_uint: u32, dec_int: i32) -> (f64, f64) {
    let ra_h = ra_uint as f64 * 12.0 / 2f64.powi(31);
    let dec_deg = dec_int as f64 * 90.0 / 2f64.powi(30);
    (ra_h, dec_deg)
}

/// `(ra_hours, dec_deg)` to the wire integers used in a position frame.
pub fn radec_to_stellarium(ra_h: f64, dec_deg: f64) -> (u32, i32) {
    let ra_uint = (ra_h * 2f64.powi(31) / 12.0).round() as i64 as u32;
    let dec_s = (dec_deg * 2f64.powi(30) / 90.0).round() as i32;
    (ra_uint, dec_s)
}

/// Encode a Stellarium position frame (server to Stellarium).
pub fn encode_position(local_time_us: i64, ra_h: f64, dec_deg: f64, status: i32) -> [u8; POSITION_FRAME_SIZE] {
    let (ra_s, dec_s) = radec_to_stellarium(ra_h, dec_deg);
    let mut buf = [0u8; POSITION_FRAME_SIZE];
    buf[0..2].copy_from_slice(&(POSITION_FRAME_SIZE as u16).to_le_bytes());
    buf[2..4].copy_from_slice(&0u16.to_le_bytes());
    buf[4..12].copy_from_slice(&local_time_us.to_le_bytes());
    buf[12..16].copy_from_slice(&ra_s.to_le_bytes());
    buf[16..20].copy_from_slice(&dec_s.to_le_bytes());
    buf[20..24].copy_from_slice(&status.to_le_bytes());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_location_frame_decodes() {
        let bytes: [u8; 20] = [
            0x14, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00,
            0xC8, 0x42, 0x00, 0x00, 0x00, 0x00,
        ];
        let command = decode(&bytes).unwrap();
        match command {
            Command::Location { lon, lat, alt } => {
                assert!((lon - 2.0).abs() < 1e-6);
                assert!((lat - 2.0).abs() < 1e-6);
                assert!((alt - 100.0).abs() < 1e-3);
            }
            other => panic!("expected Location, got {other:?}"),
        }
    }

    #[test]
    fn s2_stellarium_coordinate_conversion() {
        let (ra_h, dec_deg) = stellarium_to_radec(1u32 << 31, -(1i32 << 30));
        assert!((ra_h - 12.0).abs() < 1e-9);
        assert!((dec_deg - (-45.0)).abs() < 1e-9);
    }

    #[test]
    fn decode_rejects_wrong_size() {
        let mut bytes = [0u8; 20];
        bytes[0..2].copy_from_slice(&99u16.to_le_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(FrameError::SizeMismatch { got: 99, want: 20 })
        ));
    }

    #[test]
    fn decode_rejects_unknown_mtype() {
        let mut bytes = [0u8; 20];
        bytes[0..2].copy_from_slice(&20u16.to_le_bytes());
        bytes[2..4].copy_from_slice(&42u16.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(FrameError::UnknownType(42))));
    }

    #[test]
    fn every_mtype_round_trips() {
        let samples = [
            Command::Stellarium {
                time_us: 1_700_000_000_000_000,
                ra_uint: 123_456,
                dec_int: -654_321,
            },
            Command::Location {
                lon: 1.5,
                lat: -0.75,
                alt: 50.0,
            },
            Command::StartCal,
            Command::StopCal,
            Command::MakeStep {
                az_steps: -100,
                alt_steps: 250,
            },
            Command::StartMot {
                motor_id: 1,
                action: 1,
                direction: 0,
            },
            Command::SetAngle { object_id: 7 },
            Command::ToggleTrack,
            Command::ApplyObject,
            Command::Status { code: 20 },
        ];
        for command in samples {
            let bytes = encode(&command);
            assert_eq!(decode(&bytes).unwrap(), command);
        }
    }

    #[test]
    fn position_frame_has_expected_layout() {
        let buf = encode_position(1_000_000, 12.0, -45.0, 0);
        assert_eq!(buf.len(), 24);
        assert_eq!(u16_le(&buf, 0), 24);
        assert_eq!(u16_le(&buf, 2), 0);
        let (ra_h, dec_deg) = stellarium_to_radec(u32_le(&buf, 12), i32_le(&buf, 16));
        assert!((ra_h - 12.0).abs() < 1e-6);
        assert!((dec_deg - (-45.0)).abs() < 1e-6);
    }
}
