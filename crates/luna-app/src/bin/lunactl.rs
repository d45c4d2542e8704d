//! Command-line client for a running luna. Inside a luna window the port and
//! session id come from the environment.

use std::net::Ipv4Addr;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use luna_core::client;
use luna_core::{Request, CONTROL_PORT_ENV, SESSION_ID_ENV};

#[derive(Parser, Debug)]
#[command(name = "lunactl", version, about = "Control a running luna terminal")]
struct Cli {
    /// Control server port
    #[arg(long, env = CONTROL_PORT_ENV)]
    port: u16,

    /// Session to act on
    #[arg(long, env = SESSION_ID_ENV)]
    id: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the session's font, or switch to NAME
    Font { name: Option<String> },
    /// Print the default shell for new windows, or set it to PATH
    Shell { path: Option<String> },
    /// Move to the next font in the list
    Cycle {
        #[arg(long)]
        backward: bool,
    },
    /// Grow or shrink the font by STEP points
    Resize {
        #[arg(allow_hyphen_values = true)]
        step: i32,
    },
    /// Print the scrollback depth, or set it to LINES
    Scrollback { lines: Option<u64> },
}

impl Command {
    fn into_request(self, id: u64) -> Request {
        match self {
            Command::Font { name } => with_optional(Request::new("font", id), "font", name),
            Command::Shell { path } => with_optional(Request::new("shell", id), "shell", path),
            Command::Cycle { backward } => Request::new("cycle", id)
                .with_arg("direction", if backward { "backward" } else { "forward" }),
            Command::Resize { step } => Request::new("resize", id).with_arg("step", step),
            Command::Scrollback { lines } => {
                with_optional(Request::new("scrollback", id), "lines", lines)
            }
        }
    }
}

fn with_optional<T: Into<serde_json::Value>>(request: Request, key: &str, value: Option<T>) -> Request {
    match value {
        Some(value) => request.with_arg(key, value),
        None => request,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let request = cli.command.into_request(cli.id);

    match client::request((Ipv4Addr::LOCALHOST, cli.port), &request).await {
        Ok(response) => {
            if !response.message.is_empty() {
                println!("{}", response.message);
            }
            if response.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("lunactl: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Request {
        let cli = Cli::try_parse_from(args).unwrap();
        cli.command.into_request(cli.id)
    }

    #[test]
    fn test_font_query_and_set() {
        let query = parse(&["lunactl", "--port", "4000", "--id", "3", "font"]);
        assert_eq!(query.cmd, "font");
        assert_eq!(query.id, 3);
        assert!(query.args.is_empty());

        let set = parse(&["lunactl", "--port", "4000", "--id", "3", "font", "Hack 11"]);
        assert_eq!(set.args.get("font"), Some(&serde_json::Value::from("Hack 11")));
    }

    #[test]
    fn test_negative_resize_step() {
        let request = parse(&["lunactl", "--port", "1", "--id", "1", "resize", "-2"]);
        assert_eq!(request.args.get("step"), Some(&serde_json::Value::from(-2)));
    }

    #[test]
    fn test_cycle_direction() {
        let request = parse(&["lunactl", "--port", "1", "--id", "1", "cycle", "--backward"]);
        assert_eq!(
            request.args.get("direction"),
            Some(&serde_json::Value::from("backward"))
        );
    }
}
