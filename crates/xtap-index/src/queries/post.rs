use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use xtap_types::{EngagementCounts, Post, PostWithEngagement, format_timestamp};

use crate::Result;
use crate::records::{TopPost, optional_timestamp_at, timestamp_at};

// Latest snapshot per post, plus snapshot count. Joined back onto engagements
// on the (post_id, captured_at) primary key to read the latest counters.
const LATEST_CTE: &str = r#"
    WITH latest AS (
        SELECT post_id, MAX(captured_at) AS captured_at, COUNT(*) AS observations
        FROM engagements
        GROUP BY post_id
    )
"#;

const POST_WITH_ENGAGEMENT_COLUMNS: &str = r#"
    p.post_id, p.username, p.name, p.text, p.created_at, p.is_long_form, p.first_seen_at,
    e.likes, e.retweets, e.replies, e.views, e.captured_at, e.following,
    COALESCE(l.observations, 0)
"#;

fn post_with_engagement_from_row(row: &Row<'_>) -> rusqlite::Result<PostWithEngagement> {
    Ok(PostWithEngagement {
        post: Post {
            id: row.get(0)?,
            username: row.get(1)?,
            name: row.get(2)?,
            text: row.get(3)?,
            created_at: row.get(4)?,
            is_long_form: row.get(5)?,
        },
        first_seen_at: timestamp_at(row, 6)?,
        counts: EngagementCounts {
            likes: row.get::<_, Option<i64>>(7)?.unwrap_or(0),
            retweets: row.get::<_, Option<i64>>(8)?.unwrap_or(0),
            replies: row.get::<_, Option<i64>>(9)?.unwrap_or(0),
            views: row.get::<_, Option<i64>>(10)?.unwrap_or(0),
        },
        captured_at: optional_timestamp_at(row, 11)?,
        following: row.get(12)?,
        observation_count: row.get(13)?,
    })
}

/// Insert the identity row unless the post is already known.
///
/// Returns true when a row was created. Identity fields of a known post are
/// never rewritten.
pub fn insert_if_absent(conn: &Connection, post: &Post, first_seen_at: DateTime<Utc>) -> Result<bool> {
    let inserted = conn.execute(
        r#"
        INSERT INTO posts (post_id, username, name, text, created_at, is_long_form, first_seen_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(post_id) DO NOTHING
        "#,
        params![
            &post.id,
            &post.username,
            &post.name,
            &post.text,
            &post.created_at,
            post.is_long_form,
            format_timestamp(first_seen_at)
        ],
    )?;

    Ok(inserted > 0)
}

pub fn get(conn: &Connection, post_id: &str) -> Result<Option<Post>> {
    let post = conn
        .query_row(
            r#"
            SELECT post_id, username, name, text, created_at, is_long_form
            FROM posts
            WHERE post_id = ?1
            "#,
            [post_id],
            |row| {
                Ok(Post {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    name: row.get(2)?,
                    text: row.get(3)?,
                    created_at: row.get(4)?,
                    is_long_form: row.get(5)?,
                })
            },
        )
        .optional()?;

    Ok(post)
}

/// Posts with their latest engagement, most recently captured first.
///
/// Posts without snapshots are included with zero counters; they sort by
/// first-seen time.
pub fn recent(conn: &Connection, limit: usize) -> Result<Vec<PostWithEngagement>> {
    let query = format!(
        r#"
        {}
        SELECT {}
        FROM posts p
        LEFT JOIN latest l ON l.post_id = p.post_id
        LEFT JOIN engagements e ON e.post_id = l.post_id AND e.captured_at = l.captured_at
        ORDER BY COALESCE(l.captured_at, p.first_seen_at) DESC, p.post_id DESC
        LIMIT ?1
        "#,
        LATEST_CTE, POST_WITH_ENGAGEMENT_COLUMNS
    );

    let mut stmt = conn.prepare(&query)?;
    let posts = stmt
        .query_map([limit as i64], post_with_engagement_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(posts)
}

/// All posts of one author, newest first
pub fn by_author(conn: &Connection, username: &str) -> Result<Vec<PostWithEngagement>> {
    let query = format!(
        r#"
        {}
        SELECT {}
        FROM posts p
        LEFT JOIN latest l ON l.post_id = p.post_id
        LEFT JOIN engagements e ON e.post_id = l.post_id AND e.captured_at = l.captured_at
        WHERE p.username = ?1 COLLATE NOCASE
        ORDER BY p.first_seen_at DESC, p.post_id DESC
        "#,
        LATEST_CTE, POST_WITH_ENGAGEMENT_COLUMNS
    );

    let mut stmt = conn.prepare(&query)?;
    let posts = stmt
        .query_map([username], post_with_engagement_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(posts)
}

/// Posts with the most snapshots; ties go to the most recent capture
pub fn top_by_observation_count(conn: &Connection, limit: usize) -> Result<Vec<TopPost>> {
    let query = format!(
        r#"
        {}
        SELECT p.post_id, p.username, e.following, l.observations, e.likes, p.created_at, l.captured_at
        FROM latest l
        JOIN posts p ON p.post_id = l.post_id
        JOIN engagements e ON e.post_id = l.post_id AND e.captured_at = l.captured_at
        ORDER BY l.observations DESC, l.captured_at DESC, p.post_id
        LIMIT ?1
        "#,
        LATEST_CTE
    );

    let mut stmt = conn.prepare(&query)?;
    let posts = stmt
        .query_map([limit as i64], |row| {
            Ok(TopPost {
                post_id: row.get(0)?,
                username: row.get(1)?,
                following: row.get(2)?,
                observation_count: row.get(3)?,
                likes: row.get(4)?,
                created_at: row.get(5)?,
                captured_at: timestamp_at(row, 6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(posts)
}
