// RCON packet codec: [len: i32 LE][id: i32 LE][type: i32 LE][body][0x00][0x00].
// `len` counts everything after itself.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

pub const TYPE_RESPONSE: i32 = 0;
/// Command request; servers reuse the value for the login reply.
pub const TYPE_COMMAND: i32 = 2;
pub const TYPE_AUTH_RESPONSE: i32 = 2;
pub const TYPE_LOGIN: i32 = 3;

/// Request id the server echoes when the password is wrong.
pub const AUTH_FAILED_ID: i32 = -1;

/// id + type + two null terminators.
const MIN_LEN: usize = 10;
/// 4096-byte payload limit plus framing, with slack for lenient servers.
pub const MAX_LEN: usize = 4110;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("invalid packet length {0}")]
    InvalidLength(i32),
    #[error("body of {0} bytes exceeds the packet limit")]
    BodyTooLarge(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub kind: i32,
    pub body: String,
}

impl Packet {
    pub fn new(id: i32, kind: i32, body: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            body: body.into(),
        }
    }

    pub fn encode(&self) -> Result<Bytes, PacketError> {
        let len = MIN_LEN + self.body.len();
        if len > MAX_LEN {
            return Err(PacketError::BodyTooLarge(self.body.len()));
        }
        let mut buf = BytesMut::with_capacity(4 + len);
        buf.put_i32_le(len as i32);
        buf.put_i32_le(self.id);
        buf.put_i32_le(self.kind);
        buf.put_slice(self.body.as_bytes());
        buf.put_u8(0);
        buf.put_u8(0);
        Ok(buf.freeze())
    }

    /// Take one complete packet off the front of `buf`. `Ok(None)` means more bytes are needed.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>, PacketError> {
        if buf.len() < 4 {
            return Ok(None);
        }
        let raw_len = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let len = usize::try_from(raw_len).map_err(|_| PacketError::InvalidLength(raw_len))?;
        if !(MIN_LEN..=MAX_LEN).contains(&len) {
            return Err(PacketError::InvalidLength(raw_len));
        }
        if buf.len() < 4 + len {
            return Ok(None);
        }
        buf.advance(4);
        let mut frame = buf.split_to(len);
        let id = frame.get_i32_le();
        let kind = frame.get_i32_le();
        let body_len = len - MIN_LEN;
        let body = String::from_utf8_lossy(&frame[..body_len]).into_owned();
        Ok(Some(Self { id, kind, body }))
    }
}
