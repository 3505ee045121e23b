//! Negotiation Summary
//! Mission: Daily / weekly negotiation totals for the admin dashboard

use crate::negotiation::models::NegotiationRecord;
use crate::negotiation::store::NegotiationStore;
use anyhow::Result;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPeriod {
    #[default]
    Daily,
    Weekly,
}

impl SummaryPeriod {
    /// `[from, to)` window ending at `now`
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = match self {
            SummaryPeriod::Daily => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc())
                .unwrap_or(now),
            SummaryPeriod::Weekly => now - Duration::days(7),
        };
        (from, now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationSummary {
    pub period: SummaryPeriod,
    pub from: String,
    pub to: String,
    pub total_negotiations: usize,
    pub average_fitness: f64,
}

impl NegotiationSummary {
    pub fn from_records(
        period: SummaryPeriod,
        from: String,
        to: String,
        records: &[NegotiationRecord],
    ) -> Self {
        let total = records.len();
        let average_fitness = if total == 0 {
            0.0
        } else {
            let sum: f64 = records.iter().map(|r| r.recommended.fitness).sum();
            round2(sum / total as f64)
        };

        Self {
            period,
            from,
            to,
            total_negotiations: total,
            average_fitness,
        }
    }
}

/// Summarize the negotiations of `period` as seen at `now`
pub fn summarize(
    store: &NegotiationStore,
    period: SummaryPeriod,
    now: DateTime<Utc>,
) -> Result<NegotiationSummary> {
    let (from, to) = period.window(now);
    let from = from.to_rfc3339_opts(SecondsFormat::Micros, true);
    // Inclusive of anything stamped at `now`
    let end = (to + Duration::microseconds(1)).to_rfc3339_opts(SecondsFormat::Micros, true);
    let to = to.to_rfc3339_opts(SecondsFormat::Micros, true);

    let records = store.list_between(&from, &end)?;
    Ok(NegotiationSummary::from_records(period, from, to, &records))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::negotiation::models::{OfferTerms, OptimizedOffer};
    use chrono::TimeZone;
    use serde_json::Value;

    fn offer(fitness: f64) -> OptimizedOffer {
        OptimizedOffer {
            manufacturer_id: 1,
            optimized_offer: OfferTerms {
                price: 10.0,
                delivery: 10,
                quality: "Standard".to_string(),
            },
            fitness,
            round_history: Value::Null,
        }
    }

    #[test]
    fn test_windows() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 13, 45, 0).unwrap();

        let (from, to) = SummaryPeriod::Daily.window(now);
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
        assert_eq!(to, now);

        let (from, _) = SummaryPeriod::Weekly.window(now);
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 3, 8, 13, 45, 0).unwrap());
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let store = NegotiationStore::new(db::open_in_memory().unwrap()).unwrap();
        let summary = summarize(&store, SummaryPeriod::Weekly, Utc::now()).unwrap();
        assert_eq!(summary.total_negotiations, 0);
        assert_eq!(summary.average_fitness, 0.0);
    }

    #[test]
    fn test_summary_averages_fitness() {
        let store = NegotiationStore::new(db::open_in_memory().unwrap()).unwrap();
        store.insert("a", &offer(0.8)).unwrap();
        store.insert("b", &offer(0.555)).unwrap();
        store.insert("c", &offer(0.6)).unwrap();

        let summary = summarize(&store, SummaryPeriod::Daily, Utc::now()).unwrap();
        assert_eq!(summary.total_negotiations, 3);
        assert_eq!(summary.average_fitness, 0.65);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["period"], "daily");
        assert_eq!(json["totalNegotiations"], 3);
    }

    #[test]
    fn test_period_parsing() {
        let p: SummaryPeriod = serde_json::from_str(r#""weekly""#).unwrap();
        assert_eq!(p, SummaryPeriod::Weekly);
        assert!(serde_json::from_str::<SummaryPeriod>(r#""monthly""#).is_err());
    }
}
