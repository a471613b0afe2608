//! Price list directory

use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{clamp_limit, PriceListOption, StatusFilter};

/// Price list service
#[derive(Clone)]
pub struct PriceListService {
    db: PgPool,
}

/// Query parameters for the price list selector
#[derive(Debug, Default, Deserialize)]
pub struct PriceListQuery {
    #[serde(default)]
    pub status: StatusFilter,
    /// Substring of code or name
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, FromRow)]
struct PriceListRow {
    id: Uuid,
    code: String,
    name: String,
    is_active: bool,
}

impl PriceListService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List non-deleted price lists ordered by name
    pub async fn list(&self, query: PriceListQuery) -> AppResult<Vec<PriceListOption>> {
        let pattern = search_pattern(query.q.as_deref());

        let rows = sqlx::query_as::<_, PriceListRow>(
            r#"
            SELECT id, code, name, is_active
            FROM price_lists
            WHERE deleted_at IS NULL
              AND ($1::boolean IS NULL OR is_active = $1)
              AND ($2::text IS NULL OR code ILIKE $2 OR name ILIKE $2)
            ORDER BY name
            LIMIT $3
            "#,
        )
        .bind(query.status.is_active())
        .bind(pattern)
        .bind(clamp_limit(query.limit))
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| PriceListOption {
                id: r.id,
                code: r.code,
                name: r.name,
                is_active: r.is_active,
            })
            .collect())
    }
}

/// `%q%` for ILIKE, or `None` when the search box is blank
pub(crate) fn search_pattern(q: Option<&str>) -> Option<String> {
    q.map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", q))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_pattern() {
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(Some(" dep ")), Some("%dep%".to_string()));
    }
}
