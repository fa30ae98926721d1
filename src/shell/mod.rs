pub mod command;
pub mod parse;

use std::{
    io::{self, stdout, Write},
    path::PathBuf,
};

use colored::*;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use log::warn;
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal,
};

use crate::shell::{
    command::{Command, CommandError, Executor, Reply, COMMANDS},
    parse::parse_command,
};

/// 处理完一行之后是否继续
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// 与输入方式无关的命令循环：解析、执行、把结果写到 `out`
pub struct Shell<E: Executor> {
    executor: E,
}

impl<E: Executor> Shell<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                report(out, &e)?;
                return Ok(Flow::Continue);
            }
        };

        match self.executor.execute(&command) {
            Ok(Reply::Quit) => return Ok(Flow::Quit),
            Ok(reply) => render(out, reply)?,
            // 连接断了就没法继续了
            Err(CommandError::Transport(e)) => return Err(e),
            Err(e) => report(out, &e)?,
        }
        Ok(Flow::Continue)
    }
}

fn report<W: Write>(out: &mut W, error: &CommandError) -> io::Result<()> {
    writeln!(out, "{} {}", "❌ Error:".red().bold(), error)
}

/// 把执行结果输出到终端；`put` 的结果写到宿主文件
pub fn render<W: Write>(out: &mut W, reply: Reply) -> io::Result<()> {
    match reply {
        Reply::Done | Reply::Quit => Ok(()),
        Reply::Text(text) if text.is_empty() => Ok(()),
        Reply::Text(text) => writeln!(out, "{text}"),
        Reply::Content(content) => {
            out.write_all(&content)?;
            if !content.is_empty() && !content.ends_with(b"\n") {
                writeln!(out)?;
            }
            Ok(())
        }
        Reply::Export { host_path, content } => {
            if let Err(e) = std::fs::write(&host_path, &content) {
                report(out, &CommandError::Host { path: host_path, source: e })?;
            }
            Ok(())
        }
    }
}

fn line_editor() -> Reedline {
    let completer = DefaultCompleter::new_with_wordlen(
        COMMANDS.iter().map(|c| c.to_string()).collect(),
        2,
    );
    let editor = Reedline::create().with_completer(Box::new(completer));

    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".minifs_history");
    match FileBackedHistory::with_file(100, history_path) {
        Ok(history) => editor.with_history(Box::new(history)),
        Err(e) => {
            warn!("command history disabled: {e}");
            editor
        }
    }
}

/// 交互式命令循环，本地和远程客户端共用
pub fn start_shell<E: Executor>(executor: E, location: &str) -> io::Result<E> {
    execute!(
        stdout(),
        SetForegroundColor(Color::Cyan),
        Print("Welcome to MiniFS!\n"),
        ResetColor
    )?;
    println!(
        "{}",
        "Type 'help' for available commands. Use ↑↓ for history, Tab for auto-completion.\n"
            .bright_black()
    );

    let username = whoami::username();
    let hostname = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic(format!("{username}@{hostname} [{location}]")),
        DefaultPromptSegment::Empty,
    );

    let mut line_editor = line_editor();
    let mut shell = Shell::new(executor);
    let mut out = stdout();

    loop {
        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(buffer)) => {
                if shell.handle_line(&buffer, &mut out)? == Flow::Quit {
                    break;
                }
                out.flush()?;
            }
            Ok(Signal::CtrlC) => {
                println!();
                continue;
            }
            Ok(Signal::CtrlD) => break,
            #[allow(unreachable_patterns)]
            Ok(_) => continue,
            Err(e) => {
                println!("Error reading line: {}", e);
                break;
            }
        }
    }

    println!("{}", "👋 Bye!".bright_yellow());
    Ok(shell.into_inner())
}

/// 命令是否需要在发送前就读取宿主文件
pub fn needs_upload(command: &Command) -> bool {
    matches!(command, Command::Get { .. })
}
