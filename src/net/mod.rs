//! 远程访问：分帧、请求 / 响应约定、多线程服务器和客户端

pub mod client;
pub mod frame;
pub mod protocol;
pub mod server;

pub use client::Client;
pub use server::{Server, SharedFs};
