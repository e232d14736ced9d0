//! Daily recommendation cache
//!
//! One text per UTC day. The first signed-in request of the day claims the
//! fill inside a transaction, calls the generator and stores the result
//! only while its claim token still holds. Everyone else reads the cache or
//! gets the previous text while the fill is pending.

use dramawave_common::time::day_stamp;
use dramawave_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::generator::{RecommendationGenerator, DAILY_PROMPT};
use crate::db::app_state;

/// What the daily card should show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DailyRecommendation {
    /// Today's cached text
    Fresh { date: String, recommendations: String },
    /// This request filled today's cache
    Generated { date: String, recommendations: String },
    /// Another request is filling the cache
    Pending { stale: Option<String> },
    /// Generation failed; previous text shown
    Stale { recommendations: String },
    /// Card hidden (signed out, quota, not configured, nothing to show)
    Hidden,
}

impl DailyRecommendation {
    pub fn is_visible(&self) -> bool {
        match self {
            DailyRecommendation::Hidden => false,
            DailyRecommendation::Pending { stale } => stale.is_some(),
            _ => true,
        }
    }
}

/// Claim-guarded cache over the `dorama_update` row
#[derive(Clone)]
pub struct RecommendationCache {
    pool: SqlitePool,
    generator: Arc<dyn RecommendationGenerator>,
    claim_ttl_ms: i64,
}

enum ClaimResult {
    Fresh(String),
    Taken(Option<String>),
    Won { token: String, stale: Option<String> },
}

impl RecommendationCache {
    pub fn new(
        pool: SqlitePool,
        generator: Arc<dyn RecommendationGenerator>,
        claim_ttl_secs: u64,
    ) -> Self {
        Self {
            pool,
            generator,
            claim_ttl_ms: (claim_ttl_secs as i64).saturating_mul(1000),
        }
    }

    /// Resolve the card for a request at `now_ms`
    pub async fn daily(&self, authenticated: bool, now_ms: i64) -> Result<DailyRecommendation> {
        let date = day_stamp(now_ms);

        let row = app_state::read_recommendation_row(&self.pool).await?;
        if let Some(text) = row.fresh_text(&date) {
            return Ok(DailyRecommendation::Fresh {
                date,
                recommendations: text.to_string(),
            });
        }

        if !authenticated {
            debug!("No recommendation for {} and caller is signed out", date);
            return Ok(DailyRecommendation::Hidden);
        }
        if !self.generator.is_configured() {
            debug!("Recommendation generator not configured");
            return Ok(DailyRecommendation::Hidden);
        }

        let (token, stale) = match self.claim(&date, now_ms).await? {
            ClaimResult::Fresh(text) => {
                return Ok(DailyRecommendation::Fresh {
                    date,
                    recommendations: text,
                })
            }
            ClaimResult::Taken(stale) => {
                debug!("Recommendation fill for {} already claimed", date);
                return Ok(DailyRecommendation::Pending { stale });
            }
            ClaimResult::Won { token, stale } => (token, stale),
        };

        info!("Claimed recommendation fill for {}", date);

        match self.generator.generate(DAILY_PROMPT).await {
            Ok(text) if !text.trim().is_empty() => {
                if app_state::store_if_claimed(&self.pool, &token, &date, &text).await? {
                    info!("Stored recommendation for {}", date);
                    return Ok(DailyRecommendation::Generated {
                        date,
                        recommendations: text,
                    });
                }

                // Claim expired and was taken over while generating
                warn!("Recommendation claim for {} lost before store", date);
                let row = app_state::read_recommendation_row(&self.pool).await?;
                Ok(match row.fresh_text(&date) {
                    Some(text) => DailyRecommendation::Fresh {
                        date,
                        recommendations: text.to_string(),
                    },
                    None => DailyRecommendation::Pending {
                        stale: row.stale_text().map(str::to_string),
                    },
                })
            }
            Ok(_) => {
                app_state::release_claim(&self.pool, &token).await?;
                warn!("Recommendation generator returned empty text");
                Ok(DailyRecommendation::Hidden)
            }
            Err(e) if e.is_quota() => {
                app_state::release_claim(&self.pool, &token).await?;
                warn!("Recommendation quota exhausted, hiding card: {}", e);
                Ok(DailyRecommendation::Hidden)
            }
            Err(e) => {
                app_state::release_claim(&self.pool, &token).await?;
                warn!("Recommendation generation failed: {}", e);
                Ok(match stale {
                    Some(recommendations) => DailyRecommendation::Stale { recommendations },
                    None => DailyRecommendation::Hidden,
                })
            }
        }
    }

    /// Take the fill slot for `date` unless it is filled or held
    async fn claim(&self, date: &str, now_ms: i64) -> Result<ClaimResult> {
        let mut tx = self.pool.begin().await?;

        // Write first so the transaction holds the write lock before reading
        app_state::ensure_recommendation_row(&mut *tx).await?;
        let row = app_state::load_recommendation_row(&mut *tx).await?;

        if let Some(text) = row.fresh_text(date) {
            let text = text.to_string();
            tx.commit().await?;
            return Ok(ClaimResult::Fresh(text));
        }

        let stale = row.stale_text().map(str::to_string);
        if row.has_live_claim(date, now_ms, self.claim_ttl_ms) {
            tx.commit().await?;
            return Ok(ClaimResult::Taken(stale));
        }

        let token = dramawave_common::ids::generate().to_string();
        app_state::set_claim(&mut *tx, &token, now_ms, date).await?;
        tx.commit().await?;

        Ok(ClaimResult::Won { token, stale })
    }
}
