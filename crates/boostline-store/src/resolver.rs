//! Maps human-entered codes and handles onto store rows.

use std::sync::Arc;

use boostline_core::{CampaignRecord, CreatorRecord, KpiPeriod, PeriodKpi};

use crate::error::{ResolveError, StoreError};
use crate::schema::{campaign, creator, kpi};
use crate::store::{Query, RecordStore, Row};

pub struct IdentityResolver {
    store: Arc<dyn RecordStore>,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Finds the campaign whose short code equals `code` exactly.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::EmptyInput`] if `code` is blank (no lookup is made).
    /// - [`ResolveError::NoMatch`] if no campaign carries the code.
    /// - [`ResolveError::Store`] on any store failure.
    pub async fn resolve_campaign(&self, code: &str) -> Result<CampaignRecord, ResolveError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ResolveError::EmptyInput { kind: "campaign" });
        }

        let rows = self
            .store
            .select(campaign::TABLE, &Query::field_equals(campaign::CODE, code).limit(1))
            .await?;
        let row = rows.into_iter().next().ok_or_else(|| ResolveError::NoMatch {
            kind: "campaign",
            value: code.to_owned(),
        })?;

        let stored_code = row.text(campaign::CODE).unwrap_or(code).to_owned();
        let display_name = row.text(campaign::NAME).unwrap_or(&stored_code).to_owned();
        tracing::debug!(code, record_id = %row.id, "resolved campaign");
        Ok(CampaignRecord {
            id: row.id,
            code: stored_code,
            display_name,
        })
    }

    /// Finds the creator owning `handle`, trying the canonical handle field
    /// before each alias field in order. The first field with a match wins.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::EmptyInput`] if `handle` is blank.
    /// - [`ResolveError::NoMatch`] if no field of any creator matches.
    /// - [`ResolveError::Store`] on any store failure.
    pub async fn resolve_creator(&self, handle: &str) -> Result<CreatorRecord, ResolveError> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(ResolveError::EmptyInput { kind: "creator" });
        }

        for field in creator::HANDLE_FIELDS {
            let rows = self
                .store
                .select(creator::TABLE, &Query::field_equals(field, handle).limit(1))
                .await?;
            if let Some(row) = rows.into_iter().next() {
                tracing::debug!(handle, field, record_id = %row.id, "resolved creator");
                return Ok(creator_record(row, handle));
            }
        }

        Err(ResolveError::NoMatch {
            kind: "creator",
            value: handle.to_owned(),
        })
    }

    /// The KPI row flagged current for `period`, if there is one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on any store failure.
    pub async fn current_kpi(&self, period: KpiPeriod) -> Result<Option<PeriodKpi>, StoreError> {
        let (table, flag) = match period {
            KpiPeriod::Weekly => (kpi::WEEKLY_TABLE, kpi::CURRENT_WEEK),
            KpiPeriod::Monthly => (kpi::MONTHLY_TABLE, kpi::CURRENT_MONTH),
        };

        let rows = match self
            .store
            .select(table, &Query::field_equals(flag, kpi::YES).limit(1))
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                if e.is_forbidden() {
                    tracing::error!(
                        %period,
                        "KPI lookup authentication error - check API key permissions"
                    );
                }
                return Err(e);
            }
        };

        Ok(rows.into_iter().next().map(|row| PeriodKpi {
            id: row.id,
            period,
            is_current: true,
        }))
    }
}

fn creator_record(row: Row, matched: &str) -> CreatorRecord {
    let [canonical_field, alias_fields @ ..] = creator::HANDLE_FIELDS;
    let canonical_handle = row.text(canonical_field).unwrap_or(matched).to_owned();
    let alias_handles = alias_fields
        .iter()
        .filter_map(|field| row.text(field))
        .map(str::to_owned)
        .collect();
    CreatorRecord {
        id: row.id,
        canonical_handle,
        alias_handles,
    }
}
