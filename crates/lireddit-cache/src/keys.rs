//! Cache key definitions.
//!
//! Entities are addressed as `Typename:id`. Root fields are addressed by their name
//! plus their stringified arguments, e.g. `posts({"cursor":null,"limit":10})`.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use lireddit_api_types::PostsArgs;
use serde_json::Value;

/// Entity key of the query root.
pub const QUERY_ROOT: &str = "Query";

/// Identifies a normalized entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Post(i32),
    User(i32),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Post(id) => write!(f, "Post:{id}"),
            EntityKey::User(id) => write!(f, "User:{id}"),
        }
    }
}

/// Arguments of a root field. Ordered so equal argument sets render identically.
pub type FieldArgs = BTreeMap<String, Value>;

/// A root field together with the arguments it was fetched with.
#[derive(Debug, Clone)]
pub struct FieldKey {
    field_name: String,
    arguments: FieldArgs,
    rendered: String,
}

impl FieldKey {
    pub fn new(field_name: impl Into<String>, arguments: FieldArgs) -> Self {
        let field_name = field_name.into();
        let rendered = if arguments.is_empty() {
            field_name.clone()
        } else {
            let object = Value::Object(arguments.clone().into_iter().collect());
            format!("{field_name}({})", stringify_variables(&object))
        };
        Self {
            field_name,
            arguments,
            rendered,
        }
    }

    /// Key of the argument-less `me` query.
    pub fn me() -> Self {
        Self::new("me", FieldArgs::new())
    }

    /// Key of one `posts(limit, cursor)` page.
    pub fn posts(args: &PostsArgs) -> Self {
        Self::new("posts", posts_arguments(args))
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn arguments(&self) -> &FieldArgs {
        &self.arguments
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl PartialEq for FieldKey {
    fn eq(&self, other: &Self) -> bool {
        self.rendered == other.rendered
    }
}

impl Eq for FieldKey {}

impl Hash for FieldKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rendered.hash(state);
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Arguments of a `posts` page as they appear in its field key.
pub fn posts_arguments(args: &PostsArgs) -> FieldArgs {
    let mut arguments = FieldArgs::new();
    arguments.insert("limit".to_string(), Value::from(args.limit));
    arguments.insert(
        "cursor".to_string(),
        args.cursor
            .as_ref()
            .map_or(Value::Null, |cursor| Value::String(cursor.clone())),
    );
    arguments
}

/// Render a JSON value with object keys sorted, so the same variables always
/// produce the same string regardless of insertion order.
pub fn stringify_variables(value: &Value) -> String {
    let mut out = String::new();
    write_sorted(value, &mut out);
    out
}

fn write_sorted(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            out.push('{');
            for (index, (key, inner)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_sorted(inner, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, inner) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_sorted(inner, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
