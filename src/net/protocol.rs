//! 帧之上的约定：状态帧、成功 / 失败响应、连接握手。
//!
//! 每个命令的响应都是两帧：一个字节的状态（'1' 成功 / '0' 失败），
//! 紧接着一帧负载（结果、错误信息或目录列表）。

use std::io::{self, Read, Write};

use log::warn;

use crate::net::frame::{read_frame, write_frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    fn as_byte(self) -> u8 {
        match self {
            Self::Success => b'1',
            Self::Failure => b'0',
        }
    }
}

/// 成功时是负载，失败时是服务器给的错误信息
pub type Response = Result<Vec<u8>, String>;

pub fn send_status<W: Write>(writer: &mut W, status: Status) -> io::Result<()> {
    write_frame(writer, &[status.as_byte()])
}

pub fn recv_status<R: Read>(reader: &mut R) -> io::Result<Status> {
    match read_frame(reader)?.as_slice() {
        b"1" => Ok(Status::Success),
        b"0" => Ok(Status::Failure),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("bad status frame {other:?}"),
        )),
    }
}

pub fn send_success<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    send_status(writer, Status::Success)?;
    write_frame(writer, payload)
}

pub fn send_failure<W: Write>(writer: &mut W, message: &str) -> io::Result<()> {
    send_status(writer, Status::Failure)?;
    write_frame(writer, message.as_bytes())
}

pub fn recv_response<R: Read>(reader: &mut R) -> io::Result<Response> {
    let status = recv_status(reader)?;
    let payload = read_frame(reader)?;
    Ok(match status {
        Status::Success => Ok(payload),
        Status::Failure => Err(String::from_utf8_lossy(&payload).into_owned()),
    })
}

/// 客户端：发送用户 id，等服务器回一个状态帧
pub fn send_handshake<S: Read + Write>(stream: &mut S, user_id: i64) -> io::Result<()> {
    write_frame(stream, user_id.to_string().as_bytes())?;
    match recv_status(stream)? {
        Status::Success => Ok(()),
        Status::Failure => Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("server rejected user id {user_id}"),
        )),
    }
}

/// 服务器：读取用户 id 并无条件接受。id 只用于日志，不做任何鉴权。
pub fn accept_handshake<S: Read + Write>(stream: &mut S) -> io::Result<i64> {
    let frame = read_frame(stream)?;
    let text = String::from_utf8_lossy(&frame);
    let user_id = text.trim().parse().unwrap_or_else(|_| {
        warn!("user id {text:?} is not a number, using 0");
        0
    });
    send_status(stream, Status::Success)?;
    Ok(user_id)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn success_and_failure_are_two_frames() {
        let mut wire = Vec::new();
        send_success(&mut wire, b"a\nb").unwrap();
        send_failure(&mut wire, "no such file or directory: /x").unwrap();
        assert_eq!(&wire[..5], &[0, 0, 0, 1, b'1']);

        let mut reader = Cursor::new(wire);
        assert_eq!(recv_response(&mut reader).unwrap(), Ok(b"a\nb".to_vec()));
        assert_eq!(
            recv_response(&mut reader).unwrap(),
            Err("no such file or directory: /x".to_string())
        );
    }

    #[test]
    fn empty_success_payload() {
        let mut wire = Vec::new();
        send_success(&mut wire, b"").unwrap();
        let mut reader = Cursor::new(wire);
        assert_eq!(recv_response(&mut reader).unwrap(), Ok(Vec::new()));
    }

    #[test]
    fn garbage_status_is_invalid_data() {
        let mut wire = Vec::new();
        write_frame(&mut wire, b"yes").unwrap();
        let err = recv_status(&mut Cursor::new(wire)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
