// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # S3 — Resolve Identity
//!
//! Two-pass organization resolution over rows missing a `buyer_uuid` or
//! `supplier_uuid` (spec.md §4.3): an exact-match batch lookup first,
//! then fuzzy trigram matching for the misses, with a fresh
//! [`Organization`] inserted only when neither pass finds one. Writes
//! back through [`StandardizedRowRepository::writeback_identities`]
//! rather than mutating rows in place, so a batch that fails partway
//! through retries cleanly.

use crate::application::commands::ResolveIdentityCommand;
use crate::infrastructure::runtime::{StageOutcome, StageRunner};
use ledger_domain::entities::{Organization, RunCounters, StandardizedRow};
use ledger_domain::repositories::{IdentityWriteback, OrganizationRepository, StandardizedRowRepository};
use ledger_domain::services::normalize::normalize_org_name;
use ledger_domain::value_objects::{CountryCode, OrgRole};
use ledger_domain::PipelineError;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const STAGE: &str = "identity";

pub struct ResolveIdentityUseCase {
    standardized_rows: Arc<dyn StandardizedRowRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    stage_runner: Arc<StageRunner>,
}

impl ResolveIdentityUseCase {
    pub fn new(
        standardized_rows: Arc<dyn StandardizedRowRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        stage_runner: Arc<StageRunner>,
    ) -> Self {
        Self { standardized_rows, organizations, stage_runner }
    }

    pub async fn execute(
        &self,
        cmd: &ResolveIdentityCommand,
        cancel: &CancellationToken,
    ) -> Result<ledger_domain::entities::PipelineRun, PipelineError> {
        let filters = json!({ "fuzzy_threshold": cmd.fuzzy_threshold });

        self.stage_runner
            .run(STAGE, filters, cancel, || async {
                let mut counters = RunCounters::default();
                loop {
                    let rows = self.standardized_rows.find_missing_identity(cmd.chunk_rows).await?;
                    if rows.is_empty() {
                        break;
                    }
                    let updates = self
                        .stage_runner
                        .run_chunk(cancel, self.resolve_chunk(&rows, cmd.fuzzy_threshold))
                        .await?;
                    let written = self
                        .stage_runner
                        .run_chunk(cancel, self.standardized_rows.writeback_identities(&updates))
                        .await?;
                    counters.merge(RunCounters { processed: rows.len() as u64, updated: written, ..Default::default() });
                }
                Ok(StageOutcome::new(counters))
            })
            .await
    }

    /// Resolves every row needing identity in one chunk, batching pass 1
    /// across both buyer and supplier sides before falling back to pass 2
    /// per miss (spec.md §4.3 steps 3-6).
    async fn resolve_chunk(&self, rows: &[StandardizedRow], threshold: f64) -> Result<Vec<IdentityWriteback>, PipelineError> {
        let mut candidates: Vec<(String, CountryCode)> = Vec::new();
        for row in rows {
            if row.buyer_uuid().is_none() {
                if let (Some(name), Some(country)) = (row.buyer_name(), row.destination_country()) {
                    candidates.push((normalize_org_name(name), country.clone()));
                }
            }
            if row.supplier_uuid().is_none() {
                if let (Some(name), Some(country)) = (row.supplier_name(), row.origin_country()) {
                    candidates.push((normalize_org_name(name), country.clone()));
                }
            }
        }
        candidates.sort();
        candidates.dedup();

        let exact: HashMap<(String, CountryCode), Organization> = if candidates.is_empty() {
            HashMap::new()
        } else {
            self.organizations
                .find_exact_batch(&candidates)
                .await?
                .into_iter()
                .map(|org| ((org.normalized_name().to_string(), org.country().clone()), org))
                .collect()
        };

        let mut resolved: HashMap<(String, CountryCode), Organization> = exact;
        let mut updates = Vec::with_capacity(rows.len());

        for row in rows {
            let buyer_uuid = match row.buyer_uuid() {
                Some(id) => Some(id),
                None => match (row.buyer_name(), row.destination_country()) {
                    (Some(name), Some(country)) => {
                        Some(self.resolve_one(&mut resolved, name, country, OrgRole::Buyer, threshold).await?)
                    }
                    _ => None,
                },
            };
            let supplier_uuid = match row.supplier_uuid() {
                Some(id) => Some(id),
                None => match (row.supplier_name(), row.origin_country()) {
                    (Some(name), Some(country)) => {
                        Some(self.resolve_one(&mut resolved, name, country, OrgRole::Supplier, threshold).await?)
                    }
                    _ => None,
                },
            };

            if buyer_uuid.is_some() || supplier_uuid.is_some() {
                updates.push(IdentityWriteback {
                    std_id: row.id(),
                    buyer_uuid,
                    supplier_uuid,
                    hidden_buyer_flag: row.hidden_buyer_flag(),
                });
            }
        }

        Ok(updates)
    }

    /// Resolves one raw name to an organization uuid: cache hit, then
    /// fuzzy match, then insert-or-get — in that order, per spec.md §4.3.
    async fn resolve_one(
        &self,
        resolved: &mut HashMap<(String, CountryCode), Organization>,
        raw_name: &str,
        country: &CountryCode,
        role: OrgRole,
        threshold: f64,
    ) -> Result<uuid::Uuid, PipelineError> {
        let normalized = normalize_org_name(raw_name);
        let key = (normalized.clone(), country.clone());

        if let Some(org) = resolved.get_mut(&key) {
            org.observe(role, raw_name);
            self.organizations.save(org).await?;
            return Ok(org.id());
        }

        if let Some(mut org) = self.organizations.find_best_fuzzy_match(&normalized, country, threshold).await? {
            org.observe(role, raw_name);
            self.organizations.save(&org).await?;
            let id = org.id();
            resolved.insert(key, org);
            return Ok(id);
        }

        let mut org = Organization::new(normalized.clone(), country.clone(), role, raw_name);
        org = self.organizations.insert_or_get(&org).await?;
        org.observe(role, raw_name);
        self.organizations.save(&org).await?;
        let id = org.id();
        resolved.insert(key, org);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_domain::entities::{PipelineRun, StandardizedRowFields};
    use ledger_domain::repositories::PipelineRunRepository;
    use ledger_domain::value_objects::OrgType;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeOrgs {
        by_key: Mutex<HashMap<(String, CountryCode), Organization>>,
    }

    #[async_trait::async_trait]
    impl OrganizationRepository for FakeOrgs {
        async fn find_by_id(&self, id: uuid::Uuid) -> Result<Option<Organization>, PipelineError> {
            Ok(self.by_key.lock().unwrap().values().find(|o| o.id() == id).cloned())
        }
        async fn find_exact_batch(&self, tuples: &[(String, CountryCode)]) -> Result<Vec<Organization>, PipelineError> {
            let map = self.by_key.lock().unwrap();
            Ok(tuples.iter().filter_map(|t| map.get(t).cloned()).collect())
        }
        async fn find_best_fuzzy_match(
            &self,
            _normalized_name: &str,
            _country: &CountryCode,
            _threshold: f64,
        ) -> Result<Option<Organization>, PipelineError> {
            Ok(None)
        }
        async fn insert_or_get(&self, org: &Organization) -> Result<Organization, PipelineError> {
            let mut map = self.by_key.lock().unwrap();
            let key = (org.normalized_name().to_string(), org.country().clone());
            Ok(map.entry(key).or_insert_with(|| org.clone()).clone())
        }
        async fn save(&self, org: &Organization) -> Result<(), PipelineError> {
            let key = (org.normalized_name().to_string(), org.country().clone());
            self.by_key.lock().unwrap().insert(key, org.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeStdRows {
        missing: Mutex<Vec<StandardizedRow>>,
        writebacks: Mutex<Vec<IdentityWriteback>>,
        served: Mutex<bool>,
    }

    #[async_trait::async_trait]
    impl StandardizedRowRepository for FakeStdRows {
        async fn insert_batch(&self, _rows: &[StandardizedRow]) -> Result<u64, PipelineError> {
            Ok(0)
        }
        async fn exists_for_raw_row(&self, _raw_row_id: uuid::Uuid) -> Result<bool, PipelineError> {
            Ok(false)
        }
        async fn find_missing_identity(&self, _limit: usize) -> Result<Vec<StandardizedRow>, PipelineError> {
            let mut served = self.served.lock().unwrap();
            if *served {
                return Ok(vec![]);
            }
            *served = true;
            Ok(self.missing.lock().unwrap().clone())
        }
        async fn writeback_identities(&self, updates: &[IdentityWriteback]) -> Result<u64, PipelineError> {
            self.writebacks.lock().unwrap().extend_from_slice(updates);
            Ok(updates.len() as u64)
        }
        async fn find_unpromoted(&self, _limit: usize) -> Result<Vec<StandardizedRow>, PipelineError> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct FakeRuns;

    #[async_trait::async_trait]
    impl PipelineRunRepository for FakeRuns {
        async fn insert(&self, _run: &PipelineRun) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn update(&self, _run: &PipelineRun) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn find_by_id(&self, _id: uuid::Uuid) -> Result<Option<PipelineRun>, PipelineError> {
            Ok(None)
        }
        async fn find_running(&self, _stage_name: &str) -> Result<Vec<PipelineRun>, PipelineError> {
            Ok(vec![])
        }
    }

    fn row_needing_identity(buyer_name: &str, destination: &str) -> StandardizedRow {
        StandardizedRow::new(
            uuid::Uuid::new_v4(),
            uuid::Uuid::new_v4(),
            StandardizedRowFields {
                buyer_name: Some(buyer_name.to_string()),
                destination_country: Some(CountryCode::normalize(destination)),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn inserts_new_organization_when_no_match_exists() {
        let std_rows = Arc::new(FakeStdRows::default());
        std_rows.missing.lock().unwrap().push(row_needing_identity("Acme Ltd", "KENYA"));
        let orgs = Arc::new(FakeOrgs::default());
        let runs = Arc::new(FakeRuns);
        let use_case = ResolveIdentityUseCase::new(std_rows.clone(), orgs.clone(), Arc::new(StageRunner::new(runs)));

        let run = use_case.execute(&ResolveIdentityCommand::default(), &CancellationToken::new()).await.unwrap();
        assert_eq!(run.counters().updated, 1);
        assert_eq!(std_rows.writebacks.lock().unwrap().len(), 1);
        assert_eq!(orgs.by_key.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_observation_promotes_to_mixed() {
        let std_rows = Arc::new(FakeStdRows::default());
        let orgs = Arc::new(FakeOrgs::default());
        let runs = Arc::new(FakeRuns);
        let use_case = ResolveIdentityUseCase::new(std_rows.clone(), orgs.clone(), Arc::new(StageRunner::new(runs)));

        let mut resolved = HashMap::new();
        let country = CountryCode::normalize("KENYA");
        use_case.resolve_one(&mut resolved, "Acme Ltd", &country, OrgRole::Buyer, 0.6).await.unwrap();
        let id = use_case.resolve_one(&mut resolved, "Acme Ltd", &country, OrgRole::Supplier, 0.6).await.unwrap();

        let org = orgs.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(org.org_type(), OrgType::Mixed);
    }
}
