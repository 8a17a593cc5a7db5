//! The five analytical queries served by the API.
//!
//! Each aggregate reads the full merchant_activities table. Callers go
//! through the QueryService, which memoizes results for the process
//! lifetime, so these queries run at most once per process per name
//! (modulo a first-request race).

use super::ActivityStore;
use crate::error::AnalyticsResult;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Result shapes ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopMerchant {
    pub merchant_id: Option<String>,
    pub total_volume: f64,
}

/// Month key (YYYY-MM) to distinct-merchant count, ascending by month.
pub type MonthlyActive = BTreeMap<String, i64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAdoption {
    pub product: String,
    pub merchant_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KycFunnel {
    pub documents_submitted: i64,
    pub verifications_completed: i64,
    pub tier_upgrades: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRate {
    pub product: String,
    pub failure_rate: f64,
}

// ── Queries ────────────────────────────────────────────────────────

impl ActivityStore {
    /// Merchant with the highest summed SUCCESS volume, two decimal
    /// places. Ties go to the lexicographically smallest merchant_id so
    /// repeated runs agree. No SUCCESS rows at all: null merchant, zero
    /// volume.
    pub fn top_merchant(&self) -> AnalyticsResult<TopMerchant> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT merchant_id, SUM(amount) AS total_volume
                 FROM merchant_activities
                 WHERE status = 'SUCCESS'
                 GROUP BY merchant_id
                 ORDER BY total_volume DESC, merchant_id ASC
                 LIMIT 1",
                [],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
            )
            .optional()?;

        Ok(match row {
            Some((merchant_id, volume)) => TopMerchant {
                merchant_id: Some(merchant_id),
                total_volume: (volume * 100.0).round() / 100.0,
            },
            None => TopMerchant {
                merchant_id: None,
                total_volume: 0.0,
            },
        })
    }

    /// Distinct merchants with SUCCESS activity per calendar month,
    /// ascending by month. Rows whose timestamp yields no month key are
    /// excluded from the grouping.
    pub fn monthly_active_merchants(&self) -> AnalyticsResult<MonthlyActive> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT strftime('%Y-%m', event_timestamp) AS month,
                    COUNT(DISTINCT merchant_id) AS active_merchants
             FROM merchant_activities
             WHERE status = 'SUCCESS'
             GROUP BY month
             ORDER BY month",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut months = MonthlyActive::new();
        for row in rows {
            let (month, count) = row?;
            if let Some(month) = month {
                months.insert(month, count);
            }
        }
        Ok(months)
    }

    /// Distinct merchants that ever touched each product, any status,
    /// most-adopted first (product name breaks count ties).
    pub fn product_adoption(&self) -> AnalyticsResult<Vec<ProductAdoption>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT product, COUNT(DISTINCT merchant_id) AS merchant_count
             FROM merchant_activities
             GROUP BY product
             ORDER BY merchant_count DESC, product ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProductAdoption {
                product: row.get(0)?,
                merchant_count: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Distinct merchants reaching each KYC stage, SUCCESS only. Stages
    /// absent from the data report zero, not absent.
    pub fn kyc_funnel(&self) -> AnalyticsResult<KycFunnel> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT event_type, COUNT(DISTINCT merchant_id) AS merchant_count
             FROM merchant_activities
             WHERE product = 'KYC'
               AND status = 'SUCCESS'
               AND event_type IN ('DOCUMENT_SUBMITTED', 'VERIFICATION_COMPLETED', 'TIER_UPGRADE')
             GROUP BY event_type",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut funnel = KycFunnel {
            documents_submitted: 0,
            verifications_completed: 0,
            tier_upgrades: 0,
        };
        for row in rows {
            let (stage, count) = row?;
            match stage.as_str() {
                "DOCUMENT_SUBMITTED" => funnel.documents_submitted = count,
                "VERIFICATION_COMPLETED" => funnel.verifications_completed = count,
                "TIER_UPGRADE" => funnel.tier_upgrades = count,
                _ => {}
            }
        }
        Ok(funnel)
    }

    /// FAILED share of SUCCESS-or-FAILED rows per product, one decimal
    /// place, highest first. Products with no such rows fall out of the
    /// grouping; a NULL from the division guard surfaces as 0.0, never an
    /// error.
    pub fn failure_rates(&self) -> AnalyticsResult<Vec<FailureRate>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT product,
                    ROUND(
                        100.0 * SUM(CASE WHEN status = 'FAILED' THEN 1 ELSE 0 END)
                        / NULLIF(SUM(CASE WHEN status IN ('SUCCESS', 'FAILED') THEN 1 ELSE 0 END), 0),
                        1
                    ) AS failure_rate
             FROM merchant_activities
             WHERE status IN ('SUCCESS', 'FAILED')
             GROUP BY product
             ORDER BY failure_rate DESC, product ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FailureRate {
                product: row.get(0)?,
                failure_rate: row.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
