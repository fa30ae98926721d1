//! 定长前缀分帧：`[4 字节大端长度][正好这么多字节]`，长度为 0 时没有负载。

use std::io::{self, Read, Write};

/// 单帧负载上限，防止对端报一个离谱的长度把内存耗光
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("frame of {} bytes exceeds {MAX_FRAME_LEN}", payload.len()),
        ));
    }

    // 前缀和负载一次写出
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    writer.write_all(&frame)?;
    writer.flush()
}

pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut prefix = [0u8; 4];
    reader.read_exact(&mut prefix)?;

    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("peer announced a {len} byte frame"),
        ));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn prefix_is_big_endian() {
        let mut wire = Vec::new();
        write_frame(&mut wire, b"ls /").unwrap();
        assert_eq!(wire, [0, 0, 0, 4, b'l', b's', b' ', b'/']);
    }

    #[test]
    fn zero_length_frame_has_no_payload() {
        let mut wire = Vec::new();
        write_frame(&mut wire, b"").unwrap();
        assert_eq!(wire, [0, 0, 0, 0]);

        let mut reader = Cursor::new(wire);
        assert!(read_frame(&mut reader).unwrap().is_empty());
    }

    #[test]
    fn binary_payload_keeps_whitespace_and_newlines() {
        let payload = b"line one\nline\ttwo \r\n\0 trailing  ".to_vec();
        let mut wire = Vec::new();
        write_frame(&mut wire, &payload).unwrap();
        write_frame(&mut wire, b"next").unwrap();

        let mut reader = Cursor::new(wire);
        assert_eq!(read_frame(&mut reader).unwrap(), payload);
        assert_eq!(read_frame(&mut reader).unwrap(), b"next");
    }

    #[test]
    fn oversized_announcement_is_rejected() {
        let mut reader = Cursor::new(vec![0xFF, 0xFF, 0xFF, 0xFF]);
        let err = read_frame(&mut reader).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn truncated_frame_is_an_eof() {
        let mut reader = Cursor::new(vec![0, 0, 0, 10, b'a']);
        let err = read_frame(&mut reader).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
