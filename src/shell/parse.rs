use crate::shell::command::{Command, CommandError};

/// 命令按空白切分，所以路径参数里不能有空格
pub fn parse_command(input: &str) -> Result<Command, CommandError> {
    let tokens: Vec<&str> = input.split_ascii_whitespace().collect();
    let Some((&cmd, args)) = tokens.split_first() else {
        return Err(CommandError::Usage("empty command, type 'help' for the command list"));
    };

    let one = |usage: &'static str| match args {
        [path] => Ok(path.to_string()),
        _ => Err(CommandError::Usage(usage)),
    };

    match cmd {
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "touch" => one("Usage: touch <path>").map(Command::Touch),
        "mkdir" => one("Usage: mkdir <path>").map(Command::Mkdir),
        "rm" => one("Usage: rm <file path>").map(Command::Rm),
        "rmdir" => one("Usage: rmdir <dir path>").map(Command::Rmdir),
        "cat" => one("Usage: cat <file path>").map(Command::Cat),
        "ls" => one("Usage: ls <dir path>").map(Command::Ls),
        "stat" => one("Usage: stat <path>").map(Command::Stat),
        "get" => match args {
            [host_path, fs_path] => Ok(Command::Get {
                host_path: host_path.to_string(),
                fs_path: fs_path.to_string(),
            }),
            _ => Err(CommandError::Usage("Usage: get <host path> <minifs path>")),
        },
        "put" => match args {
            [fs_path, host_path] => Ok(Command::Put {
                fs_path: fs_path.to_string(),
                host_path: host_path.to_string(),
            }),
            _ => Err(CommandError::Usage("Usage: put <minifs path> <host path>")),
        },
        _ => Err(CommandError::Unknown(cmd.to_string())),
    }
}
