//! Line-oriented interactive session.

#![deny(clippy::all, clippy::pedantic)]

use std::io::Write;

use lireddit_api_types::{PostInput, UsernamePasswordInput};
use lireddit_cache::VoteOutcome;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::CliError;
use crate::print;
use crate::session::ForumSession;

const HELP: &str = "\
commands:
  posts                               show the front page
  more                                load the next page
  post <id>                           show one post in full
  vote <id> up|down                   vote on a post
  create <title> | <text>             create a post
  delete <id>                         delete one of your posts
  login <username-or-email> <password>
  register <username> <email> <password>
  logout
  me                                  who am I
  forgot <email>                      mail a password reset link
  reset <token> <new-password>        set a new password from a reset link
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Posts,
    More,
    Post(i32),
    Vote { post_id: i32, value: i32 },
    Create { title: String, text: String },
    Delete(i32),
    Login { username_or_email: String, password: String },
    Register { username: String, email: String, password: String },
    Logout,
    Me,
    Forgot(String),
    Reset { token: String, new_password: String },
    Help,
    Quit,
}

pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, CliError> {
    let line = line.trim();
    let Some((head, rest)) = split_head(line) else {
        return Ok(None);
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match (head, args.as_slice()) {
        ("posts", []) => ShellCommand::Posts,
        ("more", []) => ShellCommand::More,
        ("post", [id]) => ShellCommand::Post(parse_id(id)?),
        ("vote", [id, direction]) => ShellCommand::Vote {
            post_id: parse_id(id)?,
            value: parse_direction(direction)?,
        },
        ("create", _) => {
            let (title, text) = rest
                .split_once('|')
                .map(|(title, text)| (title.trim(), text.trim()))
                .ok_or_else(|| CliError::InvalidInput("usage: create <title> | <text>".into()))?;
            if title.is_empty() || text.is_empty() {
                return Err(CliError::InvalidInput(
                    "title and text must not be empty".into(),
                ));
            }
            ShellCommand::Create {
                title: title.to_string(),
                text: text.to_string(),
            }
        }
        ("delete", [id]) => ShellCommand::Delete(parse_id(id)?),
        ("login", [who, password]) => ShellCommand::Login {
            username_or_email: (*who).to_string(),
            password: (*password).to_string(),
        },
        ("register", [username, email, password]) => ShellCommand::Register {
            username: (*username).to_string(),
            email: (*email).to_string(),
            password: (*password).to_string(),
        },
        ("logout", []) => ShellCommand::Logout,
        ("me", []) => ShellCommand::Me,
        ("forgot", [email]) => ShellCommand::Forgot((*email).to_string()),
        ("reset", [token, password]) => ShellCommand::Reset {
            token: (*token).to_string(),
            new_password: (*password).to_string(),
        },
        ("help" | "?", _) => ShellCommand::Help,
        ("quit" | "exit", _) => ShellCommand::Quit,
        (other, _) => {
            return Err(CliError::InvalidInput(format!(
                "unrecognised command `{other}` (try `help`)"
            )));
        }
    };
    Ok(Some(command))
}

fn split_head(line: &str) -> Option<(&str, &str)> {
    if line.is_empty() {
        return None;
    }
    Some(line.split_once(char::is_whitespace).unwrap_or((line, "")))
}

fn parse_id(raw: &str) -> Result<i32, CliError> {
    raw.trim_start_matches('#')
        .parse()
        .map_err(|_| CliError::InvalidInput(format!("`{raw}` is not a post id")))
}

fn parse_direction(raw: &str) -> Result<i32, CliError> {
    match raw {
        "up" | "+1" | "1" => Ok(1),
        "down" | "-1" => Ok(-1),
        other => Err(CliError::InvalidInput(format!(
            "vote must be `up` or `down`, got `{other}`"
        ))),
    }
}

pub async fn run(session: &mut ForumSession) -> Result<(), CliError> {
    println!("lireddit shell, `help` lists commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        if command == ShellCommand::Quit {
            return Ok(());
        }

        match dispatch(session, command).await {
            Ok(()) => {}
            Err(CliError::NotAuthenticated) => {
                eprintln!("{}", CliError::NotAuthenticated);
            }
            Err(err @ (CliError::Graphql(_) | CliError::InvalidInput(_))) => eprintln!("{err}"),
            Err(err) => eprintln!("request failed: {err}"),
        }
    }
}

async fn dispatch(session: &mut ForumSession, command: ShellCommand) -> Result<(), CliError> {
    match command {
        ShellCommand::Posts => print::posts(&session.front_page().await?),
        ShellCommand::More => print::posts(&session.more().await?),
        ShellCommand::Post(id) => match session.post(id).await? {
            Some(post) => print::post(&post),
            None => println!("post #{id} not found"),
        },
        ShellCommand::Vote { post_id, value } => match session.vote(post_id, value).await? {
            VoteOutcome::Unchanged => println!("already voted that way"),
            VoteOutcome::Missing | VoteOutcome::Applied(_) => println!("voted"),
        },
        ShellCommand::Create { title, text } => {
            let post = session.create_post(PostInput { title, text }).await?;
            println!("created post #{}", post.id);
        }
        ShellCommand::Delete(id) => {
            if session.delete_post(id).await? {
                println!("deleted post #{id}");
            } else {
                println!("post #{id} was not deleted (not yours, or already gone)");
            }
        }
        ShellCommand::Login {
            username_or_email,
            password,
        } => print::user_response(&session.login(&username_or_email, &password).await?),
        ShellCommand::Register {
            username,
            email,
            password,
        } => {
            let options = UsernamePasswordInput {
                email,
                username,
                password,
            };
            print::user_response(&session.register(options).await?);
        }
        ShellCommand::Logout => {
            session.logout().await?;
            println!("logged out");
        }
        ShellCommand::Me => print::me(session.me().await?.as_ref()),
        ShellCommand::Forgot(email) => {
            session.forgot_password(&email).await?;
            println!("if an account exists for {email}, a reset link is on its way");
        }
        ShellCommand::Reset {
            token,
            new_password,
        } => print::user_response(&session.change_password(&token, &new_password).await?),
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::Quit => {}
    }
    Ok(())
}
