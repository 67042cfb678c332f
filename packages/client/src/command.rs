//! Slash-command parsing for the REPL.
//!
//! Every room operation is entered as a `/command`, mirroring the events
//! the server understands. Parsing is pure so each command's shape can be
//! tested without a connection.

use std::str::FromStr;

use kobo_server::domain::Language;

/// Help text printed by `/help` and on startup mistakes
pub const USAGE: &str = "\
Commands:
  /code <text>               replace the shared document
  /lang <language>           switch language: javascript, python, cpp, java (host only)
  /run [stdin]               run the current document (host only)
  /cursor <line> <column>    share your cursor position
  /comment <line> <message>  open a comment thread on a line
  /reply <id> <message>      reply to a comment thread
  /resolve <id>              mark a comment thread resolved
  /unresolve <id>            reopen a comment thread
  /transfer <user-id>        hand the host role to another member (host only)
  /kick <user-id>            remove a member from the room (host only)
  /leave                     leave the room and exit
  /help                      show this help
";

/// A parsed REPL command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the shared document
    Code(String),
    /// Switch the room language
    Lang(Language),
    /// Run the current document with the given stdin
    Run(String),
    /// Share the cursor position (line, column)
    Cursor(u32, u32),
    /// Open a comment thread (line, message)
    Comment(u32, String),
    /// Reply to a comment thread (thread id, message)
    Reply(String, String),
    /// Mark a comment thread resolved
    Resolve(String),
    /// Reopen a comment thread
    Unresolve(String),
    /// Hand the host role to another member
    Transfer(String),
    /// Remove a member from the room
    Kick(String),
    /// Leave the room
    Leave,
    /// Show usage
    Help,
}

/// Parse one REPL line into a command.
///
/// # Returns
///
/// `Err` carries a human-readable usage message for display.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Err("Commands start with '/'. Type /help for the list.".to_string());
    };

    let (name, args) = split_head(rest);
    match name {
        "code" => {
            if args.is_empty() {
                return Err("Usage: /code <text>".to_string());
            }
            Ok(Command::Code(args.to_string()))
        }
        "lang" => {
            let language = Language::from_str(args).map_err(|_| {
                format!(
                    "Unknown language '{}'. Supported: javascript, python, cpp, java",
                    args
                )
            })?;
            Ok(Command::Lang(language))
        }
        "run" => Ok(Command::Run(args.to_string())),
        "cursor" => {
            let (line_text, column_text) = split_head(args);
            let parsed = (line_text.parse::<u32>(), column_text.parse::<u32>());
            match parsed {
                (Ok(line_number), Ok(column)) => Ok(Command::Cursor(line_number, column)),
                _ => Err("Usage: /cursor <line> <column>".to_string()),
            }
        }
        "comment" => {
            let (line_text, message) = split_head(args);
            let line_number = line_text
                .parse::<u32>()
                .map_err(|_| "Usage: /comment <line> <message>".to_string())?;
            if message.is_empty() {
                return Err("Usage: /comment <line> <message>".to_string());
            }
            Ok(Command::Comment(line_number, message.to_string()))
        }
        "reply" => {
            let (comment_id, message) = split_head(args);
            if comment_id.is_empty() || message.is_empty() {
                return Err("Usage: /reply <thread-id> <message>".to_string());
            }
            Ok(Command::Reply(comment_id.to_string(), message.to_string()))
        }
        "resolve" => single_arg(args, "/resolve <thread-id>").map(Command::Resolve),
        "unresolve" => single_arg(args, "/unresolve <thread-id>").map(Command::Unresolve),
        "transfer" => single_arg(args, "/transfer <user-id>").map(Command::Transfer),
        "kick" => single_arg(args, "/kick <user-id>").map(Command::Kick),
        "leave" => Ok(Command::Leave),
        "help" => Ok(Command::Help),
        other => Err(format!(
            "Unknown command '/{}'. Type /help for the list.",
            other
        )),
    }
}

/// 先頭のトークンと残り（トリム済み）に分割する
fn split_head(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    }
}

fn single_arg(args: &str, usage: &str) -> Result<String, String> {
    if args.is_empty() || args.split_whitespace().count() != 1 {
        return Err(format!("Usage: {}", usage));
    }
    Ok(args.to_string())
}
