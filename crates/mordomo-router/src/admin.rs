//! God-mode: per-chat diagnostic access behind `#<password>`, valid for
//! 24 hours. Output never includes secrets or full phone numbers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use self::sha2_digest::digest_eq;

use mordomo_core::types::InboundMessage;
use mordomo_llm::CostMeter;
use mordomo_safety::blocklist::BlockedStore;
use mordomo_safety::painpoints::PainpointStore;

use crate::{Router, RouterOutcome};

const GRANT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

mod sha2_digest {
    use sha2::{Digest, Sha256};

    /// Constant-length comparison through a hash, so password length never
    /// leaks through timing.
    pub fn digest_eq(a: &str, b: &str) -> bool {
        let ha = Sha256::digest(a.as_bytes());
        let hb = Sha256::digest(b.as_bytes());
        ha == hb
    }
}

pub struct GodMode {
    password: Option<String>,
    grants: DashMap<(String, String), Instant>,
    muted: DashMap<String, ()>,
    pub painpoints: Option<Arc<PainpointStore>>,
    pub blocked: Option<Arc<BlockedStore>>,
    pub cost: Option<Arc<CostMeter>>,
}

impl GodMode {
    pub fn new(password: Option<String>) -> Self {
        Self {
            password,
            grants: DashMap::new(),
            muted: DashMap::new(),
            painpoints: None,
            blocked: None,
            cost: None,
        }
    }

    pub fn with_stores(
        mut self,
        painpoints: Arc<PainpointStore>,
        blocked: Arc<BlockedStore>,
        cost: Arc<CostMeter>,
    ) -> Self {
        self.painpoints = Some(painpoints);
        self.blocked = Some(blocked);
        self.cost = Some(cost);
        self
    }

    fn is_granted(&self, channel: &str, chat_id: &str) -> bool {
        let key = (channel.to_string(), chat_id.to_string());
        let active = match self.grants.get(&key) {
            Some(at) => at.elapsed() < GRANT_TTL,
            None => return false,
        };
        if !active {
            self.grants.remove(&key);
        }
        active
    }

    fn try_grant(&self, channel: &str, chat_id: &str, attempt: &str) -> bool {
        let Some(password) = &self.password else {
            return false;
        };
        if digest_eq(password, attempt) {
            self.grants
                .insert((channel.to_string(), chat_id.to_string()), Instant::now());
            return true;
        }
        false
    }

    fn revoke(&self, channel: &str, chat_id: &str) {
        self.grants.remove(&(channel.to_string(), chat_id.to_string()));
    }

    pub fn is_muted(&self, phone: &str) -> bool {
        self.muted.contains_key(phone)
    }
}

pub async fn handle(router: &Router, msg: &InboundMessage) -> Option<RouterOutcome> {
    let text = msg.content.trim();
    let body = text.strip_prefix('#')?;
    let god = &router.god;

    if !god.is_granted(&msg.channel, &msg.chat_id) {
        // Only a password attempt is meaningful before the grant.
        if god.try_grant(&msg.channel, &msg.chat_id, body) {
            return Some(RouterOutcome::reply("God mode ativo por 24h. #quit para sair."));
        }
        return None;
    }

    let (cmd, arg) = match body.split_once(char::is_whitespace) {
        Some((c, a)) => (c, a.trim()),
        None => (body, ""),
    };

    let reply = match cmd {
        "quit" => {
            god.revoke(&msg.channel, &msg.chat_id);
            "God mode desativado.".to_string()
        }
        "status" | "server" | "system" => {
            let users = router.store.count_users().unwrap_or(0);
            let jobs = router.cron.list_jobs(true).len();
            let enabled = router.cron.list_jobs(false).len();
            format!(
                "⚙️ status\n- users: {users}\n- jobs: {enabled} ativos / {jobs} total\n- clock offset: {}ms",
                router.clock.offset_ms()
            )
        }
        "users" => {
            let users = router.store.list_users(20).unwrap_or_default();
            let lines: Vec<String> = users
                .iter()
                .map(|u| {
                    format!(
                        "- {} | {} | tz {}",
                        u.phone_display,
                        u.lang,
                        u.tz_iana.as_deref().unwrap_or("—")
                    )
                })
                .collect();
            format!("👥 users ({}):\n{}", lines.len(), lines.join("\n"))
        }
        "cron" => {
            let jobs = router.cron.list_jobs(true);
            let lines: Vec<String> = jobs
                .iter()
                .take(30)
                .map(|j| {
                    format!(
                        "- {} {} next={:?} status={:?}",
                        j.id, j.name, j.state.next_run_at_ms, j.state.last_status
                    )
                })
                .collect();
            format!("⏲️ cron ({} jobs):\n{}", jobs.len(), lines.join("\n"))
        }
        "ai" => match &god.cost {
            Some(cost) => {
                let lines: Vec<String> = cost
                    .summary()
                    .iter()
                    .map(|(day, tin, tout)| format!("- {day}: {tin} in / {tout} out"))
                    .collect();
                format!("🤖 tokens (8 dias):\n{}\ncusto hoje: ${:.4}", lines.join("\n"), cost.cost_today())
            }
            None => "sem medidor de tokens configurado".to_string(),
        },
        "painpoints" => match &god.painpoints {
            Some(store) => {
                let recent = store.recent(10);
                if recent.is_empty() {
                    "sem painpoints registados".to_string()
                } else {
                    recent
                        .iter()
                        .map(|p| format!("- {} | {}", p.chat_id, p.note))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            None => "painpoints indisponíveis".to_string(),
        },
        "injection" | "blocked" => match &god.blocked {
            Some(store) => {
                let stats = store.stats();
                if stats.is_empty() {
                    "sem tentativas bloqueadas".to_string()
                } else {
                    stats
                        .iter()
                        .take(10)
                        .map(|(client, n)| format!("- {client}: {n}x"))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            None => "registo de bloqueios indisponível".to_string(),
        },
        "paid" => "faturação gerida fora do bot".to_string(),
        "mute" => {
            if arg.is_empty() {
                "uso: #mute <phone>".to_string()
            } else {
                god.muted.insert(arg.to_string(), ());
                format!("{arg} silenciado")
            }
        }
        "add" | "remove" => {
            // Allowlist management belongs to the bridge; acknowledge only.
            format!("{cmd} {arg}: gerido pelo bridge")
        }
        other => format!("comando desconhecido: #{other}"),
    };
    Some(RouterOutcome::reply(reply))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_requires_password() {
        let god = GodMode::new(Some("s3cr3t".to_string()));
        assert!(!god.try_grant("w", "c1", "wrong"));
        assert!(!god.is_granted("w", "c1"));
        assert!(god.try_grant("w", "c1", "s3cr3t"));
        assert!(god.is_granted("w", "c1"));
        god.revoke("w", "c1");
        assert!(!god.is_granted("w", "c1"));
    }

    #[test]
    fn no_password_never_grants() {
        let god = GodMode::new(None);
        assert!(!god.try_grant("w", "c1", "anything"));
    }
}
