//! Daily token accounting per provider, priced per 1M tokens.
//!
//! Persisted to `token_usage.json`; only the last 8 days are kept.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

const RETENTION_DAYS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DayUsage {
    #[serde(default)]
    pub tokens_in: u64,
    #[serde(default)]
    pub tokens_out: u64,
}

/// `day → provider → usage`.
type UsageMap = BTreeMap<String, BTreeMap<String, DayUsage>>;

#[derive(Debug, Clone, Copy)]
pub struct Pricing {
    pub in_per_mtok: f64,
    pub out_per_mtok: f64,
}

pub struct CostMeter {
    path: PathBuf,
    usage: Mutex<UsageMap>,
    prices: BTreeMap<String, Pricing>,
}

impl CostMeter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let usage = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => UsageMap::default(),
        };
        Self { path, usage: Mutex::new(usage), prices: BTreeMap::new() }
    }

    pub fn set_pricing(&mut self, provider: &str, in_per_mtok: f64, out_per_mtok: f64) {
        self.prices
            .insert(provider.to_string(), Pricing { in_per_mtok, out_per_mtok });
    }

    /// Record one call's token counts under today's bucket and persist.
    pub fn record(&self, provider: &str, tokens_in: u32, tokens_out: u32) {
        let today = Utc::now().date_naive();
        let mut usage = self.usage.lock().unwrap();
        let day = usage.entry(today.format("%Y-%m-%d").to_string()).or_default();
        let entry = day.entry(provider.to_string()).or_default();
        entry.tokens_in += tokens_in as u64;
        entry.tokens_out += tokens_out as u64;
        Self::prune(&mut usage, today);
        if let Err(e) = self.persist(&usage) {
            warn!("token usage persist failed: {e}");
        }
    }

    fn prune(usage: &mut UsageMap, today: NaiveDate) {
        let cutoff = today - chrono::Duration::days(RETENTION_DAYS as i64 - 1);
        let cutoff_key = cutoff.format("%Y-%m-%d").to_string();
        usage.retain(|day, _| day.as_str() >= cutoff_key.as_str());
    }

    fn persist(&self, usage: &UsageMap) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(usage).unwrap_or_else(|_| "{}".to_string());
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)
    }

    /// Today's estimated USD cost across all providers.
    pub fn cost_today(&self) -> f64 {
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let usage = self.usage.lock().unwrap();
        usage
            .get(&today)
            .map(|providers| {
                providers
                    .iter()
                    .map(|(name, u)| {
                        let p = self.prices.get(name).copied().unwrap_or(Pricing {
                            in_per_mtok: 0.0,
                            out_per_mtok: 0.0,
                        });
                        (u.tokens_in as f64 / 1e6) * p.in_per_mtok
                            + (u.tokens_out as f64 / 1e6) * p.out_per_mtok
                    })
                    .sum()
            })
            .unwrap_or(0.0)
    }

    /// Per-day totals for the admin diagnostics, newest first.
    pub fn summary(&self) -> Vec<(String, u64, u64)> {
        let usage = self.usage.lock().unwrap();
        usage
            .iter()
            .rev()
            .map(|(day, providers)| {
                let (tin, tout) = providers
                    .values()
                    .fold((0u64, 0u64), |(a, b), u| (a + u.tokens_in, b + u.tokens_out));
                (day.clone(), tin, tout)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates_and_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("token_usage.json");
        let meter = CostMeter::new(&path);
        meter.record("deepseek", 100, 50);
        meter.record("deepseek", 10, 5);
        meter.record("mimo", 1, 1);

        let reloaded = CostMeter::new(&path);
        let summary = reloaded.summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].1, 111);
        assert_eq!(summary[0].2, 56);
    }

    #[test]
    fn pricing_drives_cost() {
        let tmp = tempfile::tempdir().unwrap();
        let mut meter = CostMeter::new(tmp.path().join("u.json"));
        meter.set_pricing("deepseek", 1.0, 2.0);
        meter.record("deepseek", 1_000_000, 500_000);
        let cost = meter.cost_today();
        assert!((cost - 2.0).abs() < 1e-9);
    }
}
