use std::io;

use log::debug;

use crate::{
    disk::BackingStore,
    fs::{error::FsError, inode_table::InodeType, FileSystem},
};

pub const COMMANDS: [&str; 11] = [
    "touch", "mkdir", "rm", "rmdir", "cat", "ls", "stat", "get", "put", "help", "quit",
];

const HELP: &str = "MiniFS commands
  touch <path>                 Create an empty file
  mkdir <path>                 Create a directory
  rm <file path>               Remove a file
  rmdir <dir path>             Remove a directory and everything below it
  cat <file path>              Print a file
  ls <dir path>                List a directory
  stat <path>                  Show type, size and blocks
  get <host path> <fs path>    Copy a host file into MiniFS
  put <fs path> <host path>    Copy a MiniFS file out to the host
  help                         Show this help message
  quit                         Leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Touch(String),
    Mkdir(String),
    Rm(String),
    Rmdir(String),
    Cat(String),
    Ls(String),
    Stat(String),
    Get { host_path: String, fs_path: String },
    Put { fs_path: String, host_path: String },
    Quit,
}

impl Command {
    /// 还原成一行文本，远程模式下按这个格式发给服务器
    pub fn to_line(&self) -> String {
        match self {
            Self::Help => "help".to_string(),
            Self::Touch(path) => format!("touch {path}"),
            Self::Mkdir(path) => format!("mkdir {path}"),
            Self::Rm(path) => format!("rm {path}"),
            Self::Rmdir(path) => format!("rmdir {path}"),
            Self::Cat(path) => format!("cat {path}"),
            Self::Ls(path) => format!("ls {path}"),
            Self::Stat(path) => format!("stat {path}"),
            Self::Get { host_path, fs_path } => format!("get {host_path} {fs_path}"),
            Self::Put { fs_path, host_path } => format!("put {fs_path} {host_path}"),
            Self::Quit => "quit".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    Usage(&'static str),

    #[error("unknown command '{0}', type 'help' for the command list")]
    Unknown(String),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("{path}: {source}")]
    Host {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Remote(String),

    #[error("connection error: {0}")]
    Transport(#[from] io::Error),
}

/// 命令执行结果，由前端决定打印到终端还是发回客户端
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Done,
    Text(String),
    Content(Vec<u8>),
    Export { host_path: String, content: Vec<u8> },
    Quit,
}

impl Reply {
    /// 成功响应里第二帧的内容
    pub fn into_payload(self) -> Vec<u8> {
        match self {
            Self::Done | Self::Quit => Vec::new(),
            Self::Text(text) => text.into_bytes(),
            Self::Content(content) | Self::Export { content, .. } => content,
        }
    }

    /// 客户端收到成功响应后，按发出的命令还原结果
    pub fn from_payload(command: &Command, payload: Vec<u8>) -> Self {
        match command {
            Command::Cat(_) => Self::Content(payload),
            Command::Ls(_) | Command::Stat(_) | Command::Help => {
                Self::Text(String::from_utf8_lossy(&payload).into_owned())
            }
            Command::Put { host_path, .. } => Self::Export {
                host_path: host_path.clone(),
                content: payload,
            },
            Command::Quit => Self::Quit,
            _ => Self::Done,
        }
    }
}

/// `get` 命令的数据来源：本地直接读宿主文件，远程则是客户端发来的一帧
pub trait ContentSource {
    fn fetch(&mut self, host_path: &str) -> io::Result<Vec<u8>>;
}

/// 读宿主机上的文件
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFiles;

impl ContentSource for HostFiles {
    fn fetch(&mut self, host_path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(host_path)
    }
}

/// 能执行命令的东西：本地文件系统或者远程连接
pub trait Executor {
    fn execute(&mut self, command: &Command) -> Result<Reply, CommandError>;
}

impl<S: BackingStore> Executor for FileSystem<S> {
    fn execute(&mut self, command: &Command) -> Result<Reply, CommandError> {
        execute(self, command, &mut HostFiles)
    }
}

pub fn execute<S: BackingStore>(
    fs: &mut FileSystem<S>,
    command: &Command,
    source: &mut dyn ContentSource,
) -> Result<Reply, CommandError> {
    debug!("execute: {}", command.to_line());

    match command {
        Command::Help => Ok(Reply::Text(HELP.to_string())),
        Command::Touch(path) => {
            fs.create_entry(path, InodeType::File, None)?;
            Ok(Reply::Done)
        }
        Command::Mkdir(path) => {
            fs.create_entry(path, InodeType::Directory, None)?;
            Ok(Reply::Done)
        }
        Command::Rm(path) => {
            fs.remove_entry_checked(path, Some(InodeType::File))?;
            Ok(Reply::Done)
        }
        Command::Rmdir(path) => {
            fs.remove_entry_checked(path, Some(InodeType::Directory))?;
            Ok(Reply::Done)
        }
        Command::Cat(path) => Ok(Reply::Content(fs.read_path(path)?)),
        Command::Ls(path) => Ok(Reply::Text(fs.list_dir(path)?.join("\n"))),
        Command::Stat(path) => {
            let meta = fs.stat(path)?;
            Ok(Reply::Text(format!(
                "inode: {}\ntype: {}\nsize: {} bytes\nblocks: {:?}",
                meta.inode, meta.inode_type, meta.len, meta.blocks
            )))
        }
        Command::Get { host_path, fs_path } => {
            let content = source.fetch(host_path).map_err(|e| CommandError::Host {
                path: host_path.clone(),
                source: e,
            })?;
            fs.create_entry(fs_path, InodeType::File, Some(&content))?;
            Ok(Reply::Done)
        }
        Command::Put { fs_path, host_path } => Ok(Reply::Export {
            host_path: host_path.clone(),
            content: fs.read_path(fs_path)?,
        }),
        Command::Quit => Ok(Reply::Quit),
    }
}
