use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use xtap_types::{CookieMap, Credential, CredentialKey, format_timestamp};

use crate::Result;
use crate::records::{CookieMerge, CredentialWrite};

fn credential_from_row(row: &Row<'_>) -> rusqlite::Result<Credential> {
    let key: String = row.get(0)?;
    let key = key
        .parse::<CredentialKey>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, e.into()))?;
    Ok(Credential {
        key,
        value: row.get(1)?,
        version: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

pub fn get(conn: &Connection, key: CredentialKey) -> Result<Option<Credential>> {
    let credential = conn
        .query_row(
            r#"
            SELECT key, value, version, created_at, updated_at
            FROM credentials
            WHERE key = ?1
            "#,
            [key.as_str()],
            credential_from_row,
        )
        .optional()?;

    Ok(credential)
}

pub fn list(conn: &Connection) -> Result<Vec<Credential>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT key, value, version, created_at, updated_at
        FROM credentials
        ORDER BY key
        "#,
    )?;

    let credentials = stmt
        .query_map([], credential_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(credentials)
}

/// Store `value` under `key`. Caller provides the transaction.
pub fn upsert(
    conn: &Connection,
    key: CredentialKey,
    value: &str,
    now: DateTime<Utc>,
) -> Result<CredentialWrite> {
    let now = format_timestamp(now);
    let existing: Option<String> = conn
        .query_row(
            "SELECT value FROM credentials WHERE key = ?1",
            [key.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        None => {
            conn.execute(
                r#"
                INSERT INTO credentials (key, value, version, created_at, updated_at)
                VALUES (?1, ?2, 1, ?3, ?3)
                "#,
                params![key.as_str(), value, &now],
            )?;
            Ok(CredentialWrite::Inserted)
        }
        Some(current) if current == value => Ok(CredentialWrite::Unchanged),
        Some(_) => {
            conn.execute(
                r#"
                UPDATE credentials
                SET value = ?2, version = version + 1, updated_at = ?3
                WHERE key = ?1
                "#,
                params![key.as_str(), value, &now],
            )?;
            Ok(CredentialWrite::Updated)
        }
    }
}

/// Replace one sub-value of the stored composite cookie, keeping the others.
pub fn merge_cookie(
    conn: &Connection,
    name: &str,
    value: &str,
    now: DateTime<Utc>,
) -> Result<CookieMerge> {
    let Some(existing) = get(conn, CredentialKey::Cookie)? else {
        return Ok(CookieMerge::NoComposite);
    };

    let mut cookies = CookieMap::parse(&existing.value);
    if cookies.get(name) == Some(value) {
        return Ok(CookieMerge::Unchanged);
    }
    cookies.set(name, value);

    match upsert(conn, CredentialKey::Cookie, &cookies.to_string(), now)? {
        CredentialWrite::Unchanged => Ok(CookieMerge::Unchanged),
        CredentialWrite::Inserted | CredentialWrite::Updated => Ok(CookieMerge::Merged),
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use crate::records::{CookieMerge, CredentialWrite};
    use chrono::{Duration, TimeZone, Utc};
    use xtap_types::CredentialKey;

    #[test]
    fn test_version_only_moves_on_change() -> crate::Result<()> {
        let db = Database::open_in_memory()?;
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        let first = db.upsert_credential(CredentialKey::CsrfToken, "c1", t0)?;
        let same = db.upsert_credential(CredentialKey::CsrfToken, "c1", t0 + Duration::minutes(1))?;
        let changed =
            db.upsert_credential(CredentialKey::CsrfToken, "c2", t0 + Duration::minutes(2))?;

        assert_eq!(first, CredentialWrite::Inserted);
        assert_eq!(same, CredentialWrite::Unchanged);
        assert_eq!(changed, CredentialWrite::Updated);

        let stored = db.get_credential(CredentialKey::CsrfToken)?.unwrap();
        assert_eq!(stored.value, "c2");
        assert_eq!(stored.version, 2);
        assert_eq!(stored.created_at, "2025-01-01T00:00:00.000000Z");
        assert_eq!(stored.updated_at, "2025-01-01T00:02:00.000000Z");
        Ok(())
    }

    #[test]
    fn test_merge_without_composite_leaves_store_unchanged() -> crate::Result<()> {
        let db = Database::open_in_memory()?;
        let now = Utc::now();

        assert_eq!(db.merge_cookie("gt", "123", now)?, CookieMerge::NoComposite);
        assert!(db.get_credential(CredentialKey::Cookie)?.is_none());
        Ok(())
    }

    #[test]
    fn test_merge_replaces_only_the_sub_value() -> crate::Result<()> {
        let db = Database::open_in_memory()?;
        let now = Utc::now();
        db.upsert_credential(CredentialKey::Cookie, "auth_token=a; ct0=c; gt=1", now)?;

        assert_eq!(db.merge_cookie("gt", "2", now)?, CookieMerge::Merged);
        assert_eq!(db.merge_cookie("gt", "2", now)?, CookieMerge::Unchanged);

        let stored = db.get_credential(CredentialKey::Cookie)?.unwrap();
        assert_eq!(stored.value, "auth_token=a; ct0=c; gt=2");
        assert_eq!(stored.version, 2);
        Ok(())
    }

    #[test]
    fn test_list_is_ordered_by_key() -> crate::Result<()> {
        let db = Database::open_in_memory()?;
        let now = Utc::now();
        db.upsert_credential(CredentialKey::CsrfToken, "c", now)?;
        db.upsert_credential(CredentialKey::Authorization, "Bearer a", now)?;

        let keys: Vec<CredentialKey> = db.list_credentials()?.into_iter().map(|c| c.key).collect();
        assert_eq!(keys, vec![CredentialKey::Authorization, CredentialKey::CsrfToken]);
        Ok(())
    }
}
