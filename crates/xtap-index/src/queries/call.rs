use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use xtap_types::format_timestamp;

use crate::Result;
use crate::records::{CallQuery, CallRecord, NewCall, json_at, timestamp_at};

/// Fingerprint identifying a delivered response, so a replayed exchange is
/// logged once.
pub fn fingerprint(call: &NewCall) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format_timestamp(call.timestamp).as_bytes());
    hasher.update([0]);
    hasher.update(call.method.as_bytes());
    hasher.update([0]);
    hasher.update(call.url.as_bytes());
    hasher.update([0]);
    hasher.update(
        call.status
            .map(|s| s.to_string())
            .unwrap_or_default()
            .as_bytes(),
    );
    hasher.update([0]);
    if let Some(body) = &call.body {
        hasher.update(body.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// `LIKE` pattern matching `needle` literally anywhere in the column.
/// Used with `ESCAPE '\'`.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Append a call. Returns false when the same call was already logged.
pub fn append(conn: &Connection, call: &NewCall) -> Result<bool> {
    let inserted = conn.execute(
        r#"
        INSERT INTO requests (fingerprint, timestamp, method, url, status, headers, request_body, body)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(fingerprint) DO NOTHING
        "#,
        params![
            fingerprint(call),
            format_timestamp(call.timestamp),
            &call.method,
            &call.url,
            call.status,
            call.headers.to_string(),
            &call.request_body,
            &call.body
        ],
    )?;

    Ok(inserted > 0)
}

/// Calls matching `query`, newest first
pub fn load(conn: &Connection, query: &CallQuery) -> Result<Vec<CallRecord>> {
    let mut where_clauses = vec![r"url LIKE ? ESCAPE '\'"];
    let mut params: Vec<Box<dyn rusqlite::ToSql>> =
        vec![Box::new(contains_pattern(&query.url_contains))];

    if let Some(status) = query.status {
        where_clauses.push("status = ?");
        params.push(Box::new(status));
    }

    if let Some(since) = query.since {
        where_clauses.push("timestamp > ?");
        params.push(Box::new(format_timestamp(since)));
    }

    let sql = format!(
        r#"
        SELECT id, timestamp, method, url, status, headers, request_body, body
        FROM requests
        WHERE {}
        ORDER BY timestamp DESC, id DESC
        "#,
        where_clauses.join(" AND ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let calls = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(CallRecord {
                id: row.get(0)?,
                timestamp: timestamp_at(row, 1)?,
                method: row.get(2)?,
                url: row.get(3)?,
                status: row.get(4)?,
                headers: json_at(row, 5)?,
                request_body: row.get(6)?,
                body: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(calls)
}

/// JSON body of the most recent call whose URL contains `url_contains`.
///
/// Bodies that are not valid JSON are passed over, as are calls with a
/// different status when `status` is given.
pub fn latest_body(
    conn: &Connection,
    url_contains: &str,
    status: Option<u16>,
) -> Result<Option<String>> {
    let body = conn
        .query_row(
            r#"
            SELECT body
            FROM requests
            WHERE url LIKE ?1 ESCAPE '\'
              AND (?2 IS NULL OR status = ?2)
              AND body IS NOT NULL
              AND json_valid(body)
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
            params![contains_pattern(url_contains), status],
            |row| row.get(0),
        )
        .optional()?;

    Ok(body)
}

pub fn count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM requests", [], |row| row.get(0))?;
    Ok(count)
}
