use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Listing order by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// An export document uploaded to the archive on behalf of a user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ArchivedExport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub s3_key: String,
    pub row_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ArchivedExport {
    pub async fn insert(
        db: &PgPool,
        user_id: Uuid,
        name: &str,
        s3_key: &str,
        row_count: i32,
    ) -> anyhow::Result<ArchivedExport> {
        let rec = sqlx::query_as::<_, ArchivedExport>(
            r#"
            INSERT INTO archived_exports (id, user_id, name, s3_key, row_count)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, s3_key, row_count, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(s3_key)
        .bind(row_count)
        .fetch_one(db)
        .await
        .context("insert archived export")?;
        Ok(rec)
    }

    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        order: SortOrder,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<ArchivedExport>> {
        let sql = format!(
            r#"
            SELECT id, user_id, name, s3_key, row_count, created_at
              FROM archived_exports
             WHERE user_id = $1
             ORDER BY created_at {}
             LIMIT $2 OFFSET $3
            "#,
            order.as_sql()
        );
        let rows = sqlx::query_as::<_, ArchivedExport>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await
            .context("list archived exports")?;
        Ok(rows)
    }

    pub async fn get_for_user(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> anyhow::Result<Option<ArchivedExport>> {
        let row = sqlx::query_as::<_, ArchivedExport>(
            r#"
            SELECT id, user_id, name, s3_key, row_count, created_at
              FROM archived_exports
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("get archived export")?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::SortOrder;

    #[test]
    fn sort_order_parses_and_defaults_to_newest_first() {
        assert_eq!(SortOrder::default(), SortOrder::Desc);
        let asc: SortOrder = serde_json::from_str(r#""asc""#).unwrap();
        assert_eq!(asc.as_sql(), "ASC");
        assert!(serde_json::from_str::<SortOrder>(r#""sideways""#).is_err());
    }
}
