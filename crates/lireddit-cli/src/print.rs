#![deny(clippy::all, clippy::pedantic)]

use lireddit_api_types::{PaginatedPosts, PostSnapshot, UserResponse, UserSnapshot};
use serde::Serialize;

use crate::client::CliError;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Server(format!("failed to render output: {e}")))?;
    println!("{out}");
    Ok(())
}

pub fn posts(page: &PaginatedPosts) {
    if page.posts.is_empty() {
        println!("no posts yet");
        return;
    }
    for post in &page.posts {
        println!("{}", post_line(post));
    }
    if page.has_more {
        println!("(more available: `more`)");
    }
}

pub fn post(post: &PostSnapshot) {
    println!("{}", post_line(post));
    if let Some(text) = &post.text {
        println!();
        println!("{text}");
    }
}

pub fn post_line(post: &PostSnapshot) -> String {
    let marker = match post.vote_status {
        Some(1) => "▲",
        Some(-1) => "▼",
        _ => " ",
    };
    format!(
        "{marker}{points:>5}  #{id} {title} (by {creator})\n         {snippet}",
        points = post.points,
        id = post.id,
        title = post.title,
        creator = post.creator.username,
        snippet = post.text_snippet,
    )
}

pub fn me(user: Option<&UserSnapshot>) {
    match user {
        Some(user) => println!("logged in as {} <{}> (#{})", user.username, user.email, user.id),
        None => println!("not logged in"),
    }
}

/// Print field errors, or the user the mutation returned.
pub fn user_response(response: &UserResponse) {
    if let Some(errors) = &response.errors {
        for error in errors {
            println!("{}: {}", error.field, error.message);
        }
        return;
    }
    me(response.users.as_ref());
}
