//! Sliding-window rate limiter per `(channel, chat_id)`, plus the
//! once-per-minute gate on the "too many messages" notice itself.

use std::time::{Duration, Instant};

use dashmap::DashMap;

const WINDOW: Duration = Duration::from_secs(60);
const NOTICE_COOLDOWN: Duration = Duration::from_secs(60);

pub struct RateLimiter {
    limit_per_minute: usize,
    hits: DashMap<(String, String), Vec<Instant>>,
    notice_sent: DashMap<(String, String), Instant>,
}

impl RateLimiter {
    pub fn new(limit_per_minute: u32) -> Self {
        Self {
            limit_per_minute: limit_per_minute.max(1) as usize,
            hits: DashMap::new(),
            notice_sent: DashMap::new(),
        }
    }

    /// Record one message and report whether the chat is over the limit.
    pub fn check_and_record(&self, channel: &str, chat_id: &str) -> bool {
        self.check_and_record_at(channel, chat_id, Instant::now())
    }

    fn check_and_record_at(&self, channel: &str, chat_id: &str, now: Instant) -> bool {
        let key = (channel.to_string(), chat_id.to_string());
        let mut entry = self.hits.entry(key).or_default();
        entry.retain(|t| now.duration_since(*t) < WINDOW);
        entry.push(now);
        entry.len() > self.limit_per_minute
    }

    /// At most one rate-limit notice per chat per 60 s.
    pub fn should_send_notice(&self, channel: &str, chat_id: &str) -> bool {
        let now = Instant::now();
        let key = (channel.to_string(), chat_id.to_string());
        // Lazy eviction of stale cooldown entries
        self.notice_sent
            .retain(|_, t| now.duration_since(*t) < NOTICE_COOLDOWN);
        if self.notice_sent.contains_key(&key) {
            return false;
        }
        self.notice_sent.insert(key, now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_trips_after_threshold() {
        let rl = RateLimiter::new(3);
        assert!(!rl.check_and_record("w", "c1"));
        assert!(!rl.check_and_record("w", "c1"));
        assert!(!rl.check_and_record("w", "c1"));
        assert!(rl.check_and_record("w", "c1"));
        // Different chat unaffected
        assert!(!rl.check_and_record("w", "c2"));
    }

    #[test]
    fn single_notice_per_window() {
        let rl = RateLimiter::new(1);
        assert!(rl.should_send_notice("w", "c1"));
        assert!(!rl.should_send_notice("w", "c1"));
        assert!(rl.should_send_notice("w", "c2"));
    }
}
