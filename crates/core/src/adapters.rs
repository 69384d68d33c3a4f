//! External service adapters (C15): thin calls out to chat/party/quest/
//! faction/achievements/leaderboard/training/pvp/trade/tutorial/
//! accessibility/metrics/analytics systems.
//!
//! Per §9, these are "opaque services exposing pure in/out calls; they are
//! outside the core and must not reach into the world lock; they may call
//! back into the world only via the documented operations." Each service
//! is a trait so a real backend can be substituted without touching the
//! dispatcher; [`NoopAdapters`] is the bundled default, grounded in the
//! teacher's trait-object event-sink pattern (`crates/game/src/event/queue.rs`)
//! generalized from a single event bus to one trait per concern.

/// A single free-text response from an adapter call, already formatted for
/// display (the dispatcher applies the player's theme afterward).
pub type AdapterReply = String;

pub trait QuestService: Send + Sync {
    fn list(&self, _player: &str) -> AdapterReply {
        "You have no active quests.".to_string()
    }
}

pub trait FactionService: Send + Sync {
    fn standing(&self, _player: &str) -> AdapterReply {
        "You belong to no faction.".to_string()
    }
}

pub trait PartyService: Send + Sync {
    fn invite(&self, _from: &str, _to: &str) -> AdapterReply {
        "Party invites are not available on this server.".to_string()
    }
}

pub trait TradeService: Send + Sync {
    fn offer(&self, _from: &str, _to: &str) -> AdapterReply {
        "Player trading is not available on this server.".to_string()
    }
}

pub trait PvpService: Send + Sync {
    fn duel(&self, _from: &str, _to: &str) -> AdapterReply {
        "PvP duels are not available on this server.".to_string()
    }
}

pub trait ChatService: Send + Sync {
    fn join_channel(&self, _player: &str, _channel: &str) -> AdapterReply {
        "Custom chat channels are not available on this server.".to_string()
    }

    fn leave_channel(&self, _player: &str, _channel: &str) -> AdapterReply {
        "Custom chat channels are not available on this server.".to_string()
    }
}

pub trait TutorialService: Send + Sync {
    fn hint(&self, _player: &str) -> AdapterReply {
        "No tutorial hints are configured.".to_string()
    }
}

pub trait AccessibilityService: Send + Sync {
    fn describe_settings(&self, _player: &str) -> AdapterReply {
        "No accessibility options are configured.".to_string()
    }
}

pub trait AchievementService: Send + Sync {
    fn list(&self, _player: &str) -> AdapterReply {
        "You have earned no achievements yet.".to_string()
    }
}

pub trait LeaderboardService: Send + Sync {
    fn top(&self, _count: usize) -> AdapterReply {
        "The leaderboard is empty.".to_string()
    }
}

pub trait TrainingService: Send + Sync {
    fn train(&self, _player: &str, _stat: &str) -> AdapterReply {
        "Stat training is not available on this server.".to_string()
    }
}

/// A player-instanced area (e.g. a solo dungeon). The dispatcher consults
/// this only when the player's session mode is `Instance`; directional
/// commands, `kill`/`attack`, and `look` are routed here first (§4.10).
pub trait InstanceService: Send + Sync {
    fn handle(&self, _player: &str, _command: &str, _arg: &str) -> Option<AdapterReply> {
        None
    }
}

pub trait DialogueService: Send + Sync {
    /// Handles one line of dialogue-mode input (a numeric choice or `bye`).
    /// Returns the NPC's reply and whether the dialogue mode should end.
    fn respond(&self, _player: &str, _npc_id: &str, _choice: &str) -> (AdapterReply, bool) {
        ("The conversation ends.".to_string(), true)
    }
}

pub trait MetricsService: Send + Sync {
    fn record_command(&self, _player: &str, _command: &str) {}
}

pub trait AnalyticsService: Send + Sync {
    fn record_session_event(&self, _player: &str, _event: &str) {}
}

/// Bundles every adapter trait object the dispatcher calls out to. Built
/// with [`NoopAdapters::default`] unless a deployment wires in real
/// backends.
pub struct Adapters {
    pub quest: Box<dyn QuestService>,
    pub faction: Box<dyn FactionService>,
    pub party: Box<dyn PartyService>,
    pub trade: Box<dyn TradeService>,
    pub pvp: Box<dyn PvpService>,
    pub chat: Box<dyn ChatService>,
    pub tutorial: Box<dyn TutorialService>,
    pub accessibility: Box<dyn AccessibilityService>,
    pub achievement: Box<dyn AchievementService>,
    pub leaderboard: Box<dyn LeaderboardService>,
    pub training: Box<dyn TrainingService>,
    pub instance: Box<dyn InstanceService>,
    pub dialogue: Box<dyn DialogueService>,
    pub metrics: Box<dyn MetricsService>,
    pub analytics: Box<dyn AnalyticsService>,
}

#[derive(Default)]
struct Noop;

impl QuestService for Noop {}
impl FactionService for Noop {}
impl PartyService for Noop {}
impl TradeService for Noop {}
impl PvpService for Noop {}
impl ChatService for Noop {}
impl TutorialService for Noop {}
impl AccessibilityService for Noop {}
impl AchievementService for Noop {}
impl LeaderboardService for Noop {}
impl TrainingService for Noop {}
impl InstanceService for Noop {}
impl DialogueService for Noop {}
impl MetricsService for Noop {}
impl AnalyticsService for Noop {}

impl Default for Adapters {
    fn default() -> Self {
        Adapters {
            quest: Box::new(Noop),
            faction: Box::new(Noop),
            party: Box::new(Noop),
            trade: Box::new(Noop),
            pvp: Box::new(Noop),
            chat: Box::new(Noop),
            tutorial: Box::new(Noop),
            accessibility: Box::new(Noop),
            achievement: Box::new(Noop),
            leaderboard: Box::new(Noop),
            training: Box::new(Noop),
            instance: Box::new(Noop),
            dialogue: Box::new(Noop),
            metrics: Box::new(Noop),
            analytics: Box::new(Noop),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_adapters_return_placeholder_text() {
        let adapters = Adapters::default();
        assert!(adapters.quest.list("neo").contains("no active quests"));
        assert!(adapters.instance.handle("neo", "look", "").is_none());
    }
}
