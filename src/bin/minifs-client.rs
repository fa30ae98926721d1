use anyhow::Context;
use clap::Parser;
use dialoguer::Input;
use minifs::{cli::init_logging, net::Client, shell::start_shell};

/// Work on a remote MiniFS server through the interactive shell.
#[derive(Parser, Debug)]
#[command(name = "minifs-client", version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// User id sent to the server, asked for interactively when missing
    #[arg(short, long)]
    user: Option<i64>,
}

fn main() -> anyhow::Result<()> {
    init_logging("warn");
    let args = Args::parse();

    let user_id = match args.user {
        Some(id) => id,
        None => Input::<i64>::new()
            .with_prompt("User id (for communication with server)")
            .interact_text()?,
    };

    let client = Client::connect((args.host.as_str(), args.port), user_id)
        .with_context(|| format!("cannot connect to {}:{}", args.host, args.port))?;
    let location = format!("{}:{}", args.host, args.port);
    start_shell(client, &location)?;
    Ok(())
}
