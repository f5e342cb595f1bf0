//! Wire framing for the server list ping exchange.
//!
//! Every packet is `VarInt length | VarInt packet id | data`. Only the
//! handshake, the status request and the status response are needed here.

use crate::error::ProbeError;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Largest response frame accepted from a server.
pub const MAX_FRAME_LEN: usize = 1 << 20;

const HANDSHAKE_ID: u8 = 0x00;
const STATUS_REQUEST_ID: u8 = 0x00;
const STATUS_RESPONSE_ID: i32 = 0x00;
const NEXT_STATE_STATUS: i32 = 1;

/// Append `value` as a protocol VarInt (LEB128 over the two's complement bits).
pub fn write_varint(buf: &mut Vec<u8>, value: i32) {
    let mut value = value as u32;
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Decode a VarInt from the front of `buf`, returning it and the bytes used.
pub fn decode_varint(buf: &[u8]) -> Option<(i32, usize)> {
    let mut value: u32 = 0;
    for (i, &byte) in buf.iter().take(5).enumerate() {
        value |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Some((value as i32, i + 1));
        }
    }
    None
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    write_varint(buf, s.len() as i32);
    buf.extend_from_slice(s.as_bytes());
}

/// Prefix `body` with its VarInt length.
pub fn frame(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 5);
    write_varint(&mut out, body.len() as i32);
    out.extend_from_slice(body);
    out
}

/// Handshake packet switching the connection into the status state.
///
/// Some server implementations require the host and port to match what the
/// client dialed, so they are sent as given.
pub fn handshake(host: &str, port: u16, protocol_version: i32) -> Vec<u8> {
    let mut body = vec![HANDSHAKE_ID];
    write_varint(&mut body, protocol_version);
    write_string(&mut body, host);
    body.extend_from_slice(&port.to_be_bytes());
    write_varint(&mut body, NEXT_STATE_STATUS);
    frame(&body)
}

/// The empty status request packet.
pub fn status_request() -> Vec<u8> {
    frame(&[STATUS_REQUEST_ID])
}

/// Read one VarInt from an async stream.
pub async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32, ProbeError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = reader.read_u8().await?;
        value |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(ProbeError::Malformed("VarInt longer than 5 bytes".to_string()))
}

/// Read one length-prefixed frame, rejecting empty or oversized frames.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProbeError> {
    let len = read_varint(reader).await?;
    if len <= 0 || len as usize > MAX_FRAME_LEN {
        return Err(ProbeError::Malformed(format!("frame length {}", len)));
    }

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// Extract the JSON document from a status response frame.
pub fn parse_status_response(frame: &[u8]) -> Result<String, ProbeError> {
    let (packet_id, used) = decode_varint(frame)
        .ok_or_else(|| ProbeError::Malformed("missing packet id".to_string()))?;
    if packet_id != STATUS_RESPONSE_ID {
        return Err(ProbeError::Malformed(format!(
            "unexpected packet id {:#04x}",
            packet_id
        )));
    }

    let rest = &frame[used..];
    let (len, used) = decode_varint(rest)
        .ok_or_else(|| ProbeError::Malformed("missing payload length".to_string()))?;
    if len < 0 {
        return Err(ProbeError::Malformed(format!("payload length {}", len)));
    }

    let payload = rest
        .get(used..used + len as usize)
        .ok_or_else(|| ProbeError::Malformed("truncated status payload".to_string()))?;

    String::from_utf8(payload.to_vec())
        .map_err(|_| ProbeError::Malformed("status payload is not UTF-8".to_string()))
}

/// Build a status response frame, as a server would send it.
#[cfg(test)]
pub(crate) fn status_response(json: &str) -> Vec<u8> {
    let mut body = vec![STATUS_RESPONSE_ID as u8];
    write_string(&mut body, json);
    frame(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varint(value: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        write_varint(&mut buf, value);
        buf
    }

    #[test]
    fn test_varint_known_encodings() {
        assert_eq!(varint(0), [0x00]);
        assert_eq!(varint(127), [0x7f]);
        assert_eq!(varint(128), [0x80, 0x01]);
        assert_eq!(varint(25565), [0xdd, 0xc7, 0x01]);
        assert_eq!(varint(-1), [0xff, 0xff, 0xff, 0xff, 0x0f]);
    }

    #[test]
    fn test_decode_varint() {
        assert_eq!(decode_varint(&[0xdd, 0xc7, 0x01, 0xaa]), Some((25565, 3)));
        assert_eq!(decode_varint(&[0xff, 0xff, 0xff, 0xff, 0x0f]), Some((-1, 5)));
        assert_eq!(decode_varint(&[0x80, 0x80]), None);
        assert_eq!(decode_varint(&[]), None);
    }

    #[test]
    fn test_handshake_layout() {
        let packet = handshake("mc", 25565, 47);
        // length, id, protocol 47, "mc", port, next state
        assert_eq!(packet, [8, 0x00, 47, 2, b'm', b'c', 0x63, 0xdd, 0x01]);
        assert_eq!(status_request(), [1, 0x00]);
    }

    #[test]
    fn test_parse_status_response() {
        let framed = status_response(r#"{"version":{"name":"1.20.1"}}"#);
        let (len, used) = decode_varint(&framed).unwrap();
        let body = &framed[used..];
        assert_eq!(len as usize, body.len());
        assert_eq!(
            parse_status_response(body).unwrap(),
            r#"{"version":{"name":"1.20.1"}}"#
        );
    }

    #[test]
    fn test_parse_status_response_rejects_bad_frames() {
        assert!(matches!(
            parse_status_response(&[0x01, 0x00]),
            Err(ProbeError::Malformed(_))
        ));
        // Declares 10 bytes of payload but carries 2.
        assert!(matches!(
            parse_status_response(&[0x00, 0x0a, b'{', b'}']),
            Err(ProbeError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_read_frame_limits() {
        let mut oversized = Vec::new();
        write_varint(&mut oversized, (MAX_FRAME_LEN + 1) as i32);
        assert!(matches!(
            read_frame(&mut oversized.as_slice()).await,
            Err(ProbeError::Malformed(_))
        ));

        let mut empty: &[u8] = &[0x00];
        assert!(read_frame(&mut empty).await.is_err());

        let mut truncated: &[u8] = &[0x05, 0x00, 0x01];
        assert!(matches!(read_frame(&mut truncated).await, Err(ProbeError::Io(_))));

        let mut ok: &[u8] = &[0x02, 0x00, 0x00];
        assert_eq!(read_frame(&mut ok).await.unwrap(), vec![0x00, 0x00]);
    }
}
