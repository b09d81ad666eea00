// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Postgres Organization Repository
//!
//! Pass 1 (exact match) is a single `IN`-style query over candidate
//! `(normalized_name, country)` tuples, built with `UNNEST` so the
//! candidate set size never changes the query plan. Pass 2 (fuzzy match)
//! relies on the `pg_trgm` extension and a GIN trigram index on
//! `normalized_name` (see migrations) — spec.md §4.3.

use super::map_sqlx_error;
use async_trait::async_trait;
use ledger_domain::entities::Organization;
use ledger_domain::repositories::OrganizationRepository;
use ledger_domain::value_objects::{CountryCode, OrgType};
use ledger_domain::PipelineError;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct PgOrganizationRepository {
    pool: PgPool,
}

impl PgOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_org(row: &sqlx::postgres::PgRow) -> Result<Organization, PipelineError> {
        let country: String = row.try_get("country").map_err(|e| map_sqlx_error("read organization.country", e))?;
        let org_type: String = row.try_get("org_type").map_err(|e| map_sqlx_error("read organization.org_type", e))?;

        Ok(Organization::from_parts(
            row.try_get("id").map_err(|e| map_sqlx_error("read organization.id", e))?,
            row.try_get("normalized_name").map_err(|e| map_sqlx_error("read organization.normalized_name", e))?,
            CountryCode::normalize(&country),
            parse_org_type(&org_type)?,
            row.try_get("raw_name_variants").map_err(|e| map_sqlx_error("read organization.raw_name_variants", e))?,
            row.try_get("first_seen").map_err(|e| map_sqlx_error("read organization.first_seen", e))?,
            row.try_get("last_seen").map_err(|e| map_sqlx_error("read organization.last_seen", e))?,
            row.try_get("transaction_count").map_err(|e| map_sqlx_error("read organization.transaction_count", e))?,
        ))
    }
}

fn org_type_str(org_type: OrgType) -> &'static str {
    match org_type {
        OrgType::Buyer => "BUYER",
        OrgType::Supplier => "SUPPLIER",
        OrgType::Mixed => "MIXED",
    }
}

fn parse_org_type(s: &str) -> Result<OrgType, PipelineError> {
    match s {
        "BUYER" => Ok(OrgType::Buyer),
        "SUPPLIER" => Ok(OrgType::Supplier),
        "MIXED" => Ok(OrgType::Mixed),
        other => Err(PipelineError::BugAssertionFailed(format!("unknown org_type '{other}'"))),
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, PipelineError> {
        let row = sqlx::query("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find organization by id", e))?;
        row.as_ref().map(Self::row_to_org).transpose()
    }

    async fn find_exact_batch(&self, tuples: &[(String, CountryCode)]) -> Result<Vec<Organization>, PipelineError> {
        if tuples.is_empty() {
            return Ok(Vec::new());
        }
        let names: Vec<&str> = tuples.iter().map(|(n, _)| n.as_str()).collect();
        let countries: Vec<&str> = tuples.iter().map(|(_, c)| c.as_str()).collect();
        let rows = sqlx::query(
            r#"
            SELECT o.* FROM organizations o
            JOIN UNNEST($1::text[], $2::text[]) AS candidate(normalized_name, country)
                ON o.normalized_name = candidate.normalized_name AND o.country = candidate.country
            "#,
        )
        .bind(&names)
        .bind(&countries)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find organizations exact batch", e))?;
        rows.iter().map(Self::row_to_org).collect()
    }

    async fn find_best_fuzzy_match(
        &self,
        normalized_name: &str,
        country: &CountryCode,
        threshold: f64,
    ) -> Result<Option<Organization>, PipelineError> {
        let row = sqlx::query(
            r#"
            SELECT *, similarity(normalized_name, $1) AS sim
            FROM organizations
            WHERE country = $2 AND similarity(normalized_name, $1) >= $3
            ORDER BY sim DESC, id ASC
            LIMIT 1
            "#,
        )
        .bind(normalized_name)
        .bind(country.as_str())
        .bind(threshold)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find fuzzy organization match", e))?;
        row.as_ref().map(Self::row_to_org).transpose()
    }

    async fn insert_or_get(&self, org: &Organization) -> Result<Organization, PipelineError> {
        let row = sqlx::query(
            r#"
            INSERT INTO organizations
                (id, normalized_name, country, org_type, raw_name_variants, first_seen, last_seen, transaction_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (normalized_name, country) DO UPDATE SET normalized_name = organizations.normalized_name
            RETURNING *
            "#,
        )
        .bind(org.id())
        .bind(org.normalized_name())
        .bind(org.country().as_str())
        .bind(org_type_str(org.org_type()))
        .bind(org.raw_name_variants())
        .bind(org.first_seen())
        .bind(org.last_seen())
        .bind(org.transaction_count())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_or_get organization", e))?;
        Self::row_to_org(&row)
    }

    async fn save(&self, org: &Organization) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            UPDATE organizations SET
                org_type = $2, raw_name_variants = $3, last_seen = $4, transaction_count = $5
            WHERE id = $1
            "#,
        )
        .bind(org.id())
        .bind(org_type_str(org.org_type()))
        .bind(org.raw_name_variants())
        .bind(org.last_seen())
        .bind(org.transaction_count())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("save organization", e))?;
        Ok(())
    }
}
