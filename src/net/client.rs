use std::{
    io::{self, BufReader, BufWriter},
    net::{TcpStream, ToSocketAddrs},
};

use log::{debug, info};

use crate::{
    net::{
        frame::write_frame,
        protocol::{recv_response, send_handshake},
    },
    shell::command::{Command, CommandError, ContentSource, Executor, HostFiles, Reply},
};

/// 远程文件系统的一个会话，命令原样转发给服务器
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    user_id: i64,
}

impl Client {
    pub fn connect<A: ToSocketAddrs>(addr: A, user_id: i64) -> io::Result<Self> {
        let mut stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        send_handshake(&mut stream, user_id)?;
        info!("connected to {} as user {user_id}", stream.peer_addr()?);

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
            user_id,
        })
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// 通知服务器结束会话，服务器不会回复
    pub fn quit(&mut self) -> io::Result<()> {
        write_frame(&mut self.writer, Command::Quit.to_line().as_bytes())
    }
}

impl Executor for Client {
    fn execute(&mut self, command: &Command) -> Result<Reply, CommandError> {
        // 宿主文件先读出来，读不到就不必打扰服务器
        let upload = match command {
            Command::Get { host_path, .. } => {
                Some(HostFiles.fetch(host_path).map_err(|e| CommandError::Host {
                    path: host_path.clone(),
                    source: e,
                })?)
            }
            _ => None,
        };

        if *command == Command::Quit {
            self.quit()?;
            return Ok(Reply::Quit);
        }

        let line = command.to_line();
        debug!("sending {line:?}");
        write_frame(&mut self.writer, line.as_bytes())?;
        if let Some(content) = upload {
            write_frame(&mut self.writer, &content)?;
        }

        match recv_response(&mut self.reader)? {
            Ok(payload) => Ok(Reply::from_payload(command, payload)),
            Err(message) => Err(CommandError::Remote(message)),
        }
    }
}
