use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeMap;
use xtap_types::{EngagementCounts, EngagementSnapshot, age_hours, format_timestamp};

use crate::Result;
use crate::records::{AuthorSeries, SeriesPoint, timestamp_at};

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<EngagementSnapshot> {
    Ok(EngagementSnapshot {
        post_id: row.get(0)?,
        captured_at: timestamp_at(row, 1)?,
        counts: EngagementCounts {
            likes: row.get(2)?,
            retweets: row.get(3)?,
            replies: row.get(4)?,
            views: row.get(5)?,
        },
        following: row.get(6)?,
    })
}

/// Append a snapshot. Returns false when one already exists for
/// (post, capture time).
pub fn insert(conn: &Connection, snapshot: &EngagementSnapshot) -> Result<bool> {
    let inserted = conn.execute(
        r#"
        INSERT INTO engagements (post_id, captured_at, likes, retweets, replies, views, following)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(post_id, captured_at) DO NOTHING
        "#,
        params![
            &snapshot.post_id,
            format_timestamp(snapshot.captured_at),
            snapshot.counts.likes,
            snapshot.counts.retweets,
            snapshot.counts.replies,
            snapshot.counts.views,
            snapshot.following
        ],
    )?;

    Ok(inserted > 0)
}

pub fn latest(conn: &Connection, post_id: &str) -> Result<Option<EngagementSnapshot>> {
    let snapshot = conn
        .query_row(
            r#"
            SELECT post_id, captured_at, likes, retweets, replies, views, following
            FROM engagements
            WHERE post_id = ?1
            ORDER BY captured_at DESC
            LIMIT 1
            "#,
            [post_id],
            snapshot_from_row,
        )
        .optional()?;

    Ok(snapshot)
}

/// All snapshots of a post, oldest first
pub fn history(conn: &Connection, post_id: &str) -> Result<Vec<EngagementSnapshot>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT post_id, captured_at, likes, retweets, replies, views, following
        FROM engagements
        WHERE post_id = ?1
        ORDER BY captured_at ASC
        "#,
    )?;

    let snapshots = stmt
        .query_map([post_id], snapshot_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(snapshots)
}

/// Likes-versus-age points grouped by author.
///
/// Only posts with more than `min_observations` snapshots contribute. Points
/// whose age is not below `max_age_hours` are dropped, as are posts whose
/// creation time cannot be parsed.
pub fn series(
    conn: &Connection,
    min_observations: usize,
    max_age_hours: f64,
) -> Result<Vec<AuthorSeries>> {
    let mut stmt = conn.prepare(
        r#"
        WITH observed AS (
            SELECT post_id
            FROM engagements
            GROUP BY post_id
            HAVING COUNT(*) > ?1
        )
        SELECT p.username, p.created_at, e.captured_at, e.likes
        FROM posts p
        JOIN observed o ON o.post_id = p.post_id
        JOIN engagements e ON e.post_id = p.post_id
        WHERE p.created_at IS NOT NULL
        ORDER BY p.username, e.captured_at
        "#,
    )?;

    let rows = stmt
        .query_map([min_observations as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                timestamp_at(row, 2)?,
                row.get::<_, i64>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    let mut by_author: BTreeMap<String, Vec<SeriesPoint>> = BTreeMap::new();
    for (username, created_at, captured_at, likes) in rows {
        let age = age_hours(Some(&created_at), captured_at);
        if age <= 0.0 || age >= max_age_hours {
            continue;
        }
        by_author
            .entry(username)
            .or_default()
            .push(SeriesPoint {
                age_hours: age,
                likes,
            });
    }

    Ok(by_author
        .into_iter()
        .map(|(username, points)| AuthorSeries { username, points })
        .collect())
}
