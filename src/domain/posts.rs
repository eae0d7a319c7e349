//! Post rules: vote arithmetic and derived fields.

use serde::Serialize;

pub const TEXT_SNIPPET_CHARS: usize = lireddit_api_types::TEXT_SNIPPET_CHARS;

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    /// Anything other than -1 is an upvote.
    pub fn from_raw(value: i32) -> Self {
        if value == -1 {
            VoteValue::Down
        } else {
            VoteValue::Up
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            VoteValue::Up => 1,
            VoteValue::Down => -1,
        }
    }

    /// Decode a stored value; the column only ever holds 1 or -1.
    pub fn from_stored(value: i32) -> Option<Self> {
        match value {
            1 => Some(VoteValue::Up),
            -1 => Some(VoteValue::Down),
            _ => None,
        }
    }
}

/// How casting `value` changes a post given the voter's previous vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    /// First vote of this user on this post.
    Cast { delta: i32 },
    /// The user switched sides.
    Switched { delta: i32 },
    /// Same vote again.
    Unchanged,
}

impl VoteChange {
    pub fn plan(previous: Option<VoteValue>, value: VoteValue) -> Self {
        match previous {
            None => VoteChange::Cast {
                delta: value.as_i32(),
            },
            Some(current) if current == value => VoteChange::Unchanged,
            Some(_) => VoteChange::Switched {
                delta: 2 * value.as_i32(),
            },
        }
    }

    pub fn delta(self) -> i32 {
        match self {
            VoteChange::Cast { delta } | VoteChange::Switched { delta } => delta,
            VoteChange::Unchanged => 0,
        }
    }
}

/// First [`TEXT_SNIPPET_CHARS`] characters of a post body.
pub fn text_snippet(text: &str) -> String {
    text.chars().take(TEXT_SNIPPET_CHARS).collect()
}
