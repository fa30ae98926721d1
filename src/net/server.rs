use std::{
    io::{self, BufReader, BufWriter},
    net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs},
    sync::Arc,
    thread,
};

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::{
    disk::BackingStore,
    fs::FileSystem,
    net::{
        frame::read_frame,
        protocol::{accept_handshake, send_failure, send_success},
    },
    shell::{
        command::{execute, Command, ContentSource},
        needs_upload,
        parse::parse_command,
    },
};

/// 所有连接共用一个文件系统，整个命令在锁内执行
pub type SharedFs<S> = Arc<Mutex<FileSystem<S>>>;

pub struct Server<S: BackingStore> {
    listener: TcpListener,
    fs: SharedFs<S>,
}

impl<S: BackingStore + 'static> Server<S> {
    pub fn bind<A: ToSocketAddrs>(addr: A, fs: FileSystem<S>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        info!("listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            fs: Arc::new(Mutex::new(fs)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shared(&self) -> SharedFs<S> {
        Arc::clone(&self.fs)
    }

    /// 一直接受连接，每个连接一个线程
    pub fn serve(self) -> io::Result<()> {
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("accept failed: {e}");
                    continue;
                }
            };
            let fs = Arc::clone(&self.fs);
            thread::spawn(move || {
                let peer = stream
                    .peer_addr()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|_| "unknown".to_string());
                match handle_connection(stream, &fs) {
                    Ok(()) => info!("{peer}: session closed"),
                    Err(e) => warn!("{peer}: session aborted: {e}"),
                }
            });
        }
        Ok(())
    }
}

/// `get` 的内容在加锁之前就从连接上读好了
struct Upload(Option<Vec<u8>>);

impl ContentSource for Upload {
    fn fetch(&mut self, host_path: &str) -> io::Result<Vec<u8>> {
        self.0.take().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("no content was sent for {host_path}"),
            )
        })
    }
}

/// 一个连接的完整会话：握手，然后逐条处理命令直到 `quit` 或对端断开
pub fn handle_connection<S: BackingStore>(
    mut stream: TcpStream,
    fs: &SharedFs<S>,
) -> io::Result<()> {
    stream.set_nodelay(true)?;
    let peer = stream.peer_addr()?;

    // 握手直接在裸连接上做，之后才套缓冲
    let user_id = accept_handshake(&mut stream)?;
    info!("{peer}: user {user_id} connected");

    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);

    loop {
        let frame = match read_frame(&mut reader) {
            Ok(frame) => frame,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        };
        let line = String::from_utf8_lossy(&frame);
        debug!("{peer}: user {user_id} sent {line:?}");

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                send_failure(&mut writer, &e.to_string())?;
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        let mut upload = Upload(None);
        if needs_upload(&command) {
            upload.0 = Some(read_frame(&mut reader)?);
        }

        let result = {
            let mut guard = fs.lock();
            execute(&mut *guard, &command, &mut upload)
        };
        match result {
            Ok(reply) => send_success(&mut writer, &reply.into_payload())?,
            Err(e) => {
                debug!("{peer}: {} failed: {e}", command.to_line());
                send_failure(&mut writer, &e.to_string())?;
            }
        }
    }
    Ok(())
}
