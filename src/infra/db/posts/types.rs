use time::OffsetDateTime;

use crate::domain::entities::PostRecord;

pub(crate) const POST_COLUMNS: &str =
    "p.id, p.title, p.text, p.points, p.creator_id, p.created_at, p.updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: i32,
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) points: i32,
    pub(crate) creator_id: i32,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            text: row.text,
            points: row.points,
            creator_id: row.creator_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
