//! Site-wide activity summary.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::account::GrailAccount;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedStat {
    pub update_count: u64,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatistics {
    pub total_grails: usize,
    /// Accounts modified strictly after `now - window`, newest first.
    pub modified_stats: Vec<ModifiedStat>,
}

impl SiteStatistics {
    #[must_use]
    pub fn summarize(accounts: &[GrailAccount], now: DateTime<Utc>, window: Duration) -> Self {
        let since = now - window;
        let mut modified_stats: Vec<ModifiedStat> = accounts
            .iter()
            .filter(|account| account.modified_at > since)
            .map(|account| ModifiedStat {
                update_count: account.update_count,
                modified: account.modified_at,
            })
            .collect();
        modified_stats.sort_by(|a, b| b.modified.cmp(&a.modified));
        Self {
            total_grails: accounts.len(),
            modified_stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::account;

    #[test]
    fn window_filters_and_orders_newest_first() {
        let now = account("x").modified_at + Duration::days(30);
        let mut old = account("old");
        old.modified_at = now - Duration::days(8);
        let mut recent = account("recent");
        recent.modified_at = now - Duration::days(1);
        recent.update_count = 4;
        let mut newest = account("newest");
        newest.modified_at = now - Duration::hours(1);

        let stats = SiteStatistics::summarize(&[old, recent, newest], now, Duration::days(7));
        assert_eq!(stats.total_grails, 3);
        assert_eq!(stats.modified_stats.len(), 2);
        assert_eq!(stats.modified_stats[0].modified, now - Duration::hours(1));
        assert_eq!(stats.modified_stats[1].update_count, 4);
    }

    #[test]
    fn window_start_is_exclusive() {
        let now = account("x").modified_at + Duration::days(30);
        let mut edge = account("edge");
        edge.modified_at = now - Duration::days(7);
        let mut inside = account("inside");
        inside.modified_at = now - Duration::days(7) + Duration::seconds(1);

        let stats = SiteStatistics::summarize(&[edge, inside], now, Duration::days(7));
        assert_eq!(stats.total_grails, 2);
        assert_eq!(stats.modified_stats.len(), 1);
        assert_eq!(
            stats.modified_stats[0].modified,
            now - Duration::days(7) + Duration::seconds(1)
        );
    }
}
