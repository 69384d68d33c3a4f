//! Command parsing and dispatch (§4.10): rate limiting, session-mode
//! gating, alias resolution, and routing to world/combat/adapter handlers.
//!
//! Grounded in the teacher's single dispatch table keyed by command name
//! (`crates/server/src/server.rs`'s per-connection match over inbound
//! message kinds), generalized here to a command *enum* resolved from a
//! command-plus-alias lookup rather than a literal string match, since the
//! alias fan-out (`kill|k|attack|a`, ...) is exactly the kind of small
//! finite key set an enum models better than repeated string comparisons.
//!
//! Theming and the trailing `"> "` prompt are applied here to every
//! outbound [`Delivery`], looked up per-recipient (not just the acting
//! player) since a tick-driven broadcast can land on any connected player's
//! screen with their own theme preference.

use crate::adapters::Adapters;
use crate::codec::apply_theme;
use crate::combat;
use crate::error::MudError;
use crate::ratelimit::RateLimiter;
use crate::session::{DispatchMode, SessionRegistry};
use crate::world::{CombatState, Delivery, Storage, World};

pub struct DispatchServices<'a> {
    pub cmd_limiter: &'a RateLimiter,
    pub sessions: &'a SessionRegistry,
    pub storage: &'a Storage,
    pub adapters: &'a Adapters,
    pub max_inventory: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Move(Direction),
    Look,
    Inventory,
    Score,
    Who,
    Time,
    Get,
    Drop,
    Wear,
    RemoveEquip,
    Use,
    Kill,
    Flee,
    Cast,
    Cooldowns,
    List,
    Buy,
    Sell,
    Give,
    Deposit,
    Withdraw,
    Storage,
    Say,
    Gossip,
    Tell,
    Channels,
    ChannelJoin,
    ChannelLeave,
    Help,
    Teleport,
    Quit,
    Recall,
    Brief,
    Theme,
    Abilities,
    SeeCode,
    Focus,
    Call,
    Phonebook,
    Jackout,
    Quest,
    Faction,
    Party,
    Trade,
    Pvp,
    Tutorial,
    Accessibility,
    Achievements,
    Leaderboard,
    Training,
    GenerateCity,
    Dig,
    Create,
    Delete,
    EditRoom,
    SaveWorld,
    Map,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    fn canonical(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

fn resolve(cmd: &str) -> Option<Command> {
    use Command::*;
    use Direction::*;
    Some(match cmd {
        "north" | "n" => Move(North),
        "south" | "s" => Move(South),
        "east" | "e" => Move(East),
        "west" | "w" => Move(West),
        "up" | "u" => Move(Up),
        "down" | "dn" => Move(Down),
        "look" | "l" => Look,
        "inv" | "i" => Inventory,
        "score" | "sc" | "balance" | "bal" => Score,
        "who" => Who,
        "time" => Time,
        "get" | "g" => Get,
        "drop" | "d" => Drop,
        "wear" | "wield" | "equip" => Wear,
        "remove" | "unequip" => RemoveEquip,
        "use" | "eat" | "take" => Use,
        "kill" | "k" | "attack" | "a" => Kill,
        "flee" | "stop" => Flee,
        "cast" | "c" => Cast,
        "cooldowns" | "cd" => Cooldowns,
        "list" | "vendor" => List,
        "buy" => Buy,
        "sell" => Sell,
        "give" => Give,
        "deposit" => Deposit,
        "withdraw" => Withdraw,
        "storage" | "bank" => Storage,
        "say" => Say,
        "gossip" | "chat" => Gossip,
        "tell" | "whisper" | "t" | "/t" | "/chat" => Tell,
        "channels" => Channels,
        "/join" | "/g" | "/h" => ChannelJoin,
        "/leave" => ChannelLeave,
        "help" | "?" => Help,
        "teleport" => Teleport,
        "quit" => Quit,
        "recall" => Recall,
        "brief" => Brief,
        "theme" => Theme,
        "abilities" | "skills" => Abilities,
        "see_code" | "seecode" | "code" => SeeCode,
        "focus" => Focus,
        "call" => Call,
        "phones" | "phonebook" => Phonebook,
        "jackout" | "jack" => Jackout,
        "quest" | "quests" => Quest,
        "faction" | "factions" => Faction,
        "party" => Party,
        "trade" => Trade,
        "pvp" | "duel" => Pvp,
        "tutorial" => Tutorial,
        "accessibility" => Accessibility,
        "achievements" | "achievement" => Achievements,
        "leaderboard" => Leaderboard,
        "train" => Training,
        "map" | "automap" => Map,
        "dig" => Dig,
        "create" => Create,
        "delete" | "del" => Delete,
        "edit" => EditRoom,
        "generate" => GenerateCity,
        "save" => SaveWorld,
        _ => return None,
    })
}

const DIRECTION_NAMES: &[&str] = &["north", "n", "south", "s", "east", "e", "west", "w", "up", "u", "down", "dn", "d"];

fn is_instance_routed(cmd: &str) -> bool {
    DIRECTION_NAMES.contains(&cmd) || matches!(cmd, "kill" | "k" | "attack" | "a" | "look" | "l")
}

/// Parses, rate-limits, mode-gates, and dispatches one line of player
/// input. Always returns at least the reply [`Delivery`] addressed back
/// to `player_name`, themed and prompted for its recipient, plus any
/// broadcasts the command produced, themed per their own recipients.
pub fn dispatch(world: &mut World, services: &DispatchServices, player_name: &str, raw_input: &str) -> Vec<Delivery> {
    let trimmed = raw_input.trim();
    if trimmed.is_empty() {
        return finish(world, vec![Delivery::new(player_name, String::new())]);
    }

    if !services.cmd_limiter.allow(player_name) {
        return finish(world, vec![Delivery::new(player_name, "You're typing too fast. Slow down.".to_string())]);
    }

    let mode = services.sessions.mode(player_name).unwrap_or(DispatchMode::Normal);

    if mode == DispatchMode::Dialogue {
        let text = handle_dialogue_mode(services, player_name, trimmed);
        return finish(world, vec![Delivery::new(player_name, text)]);
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd_token = parts.next().unwrap_or("").to_ascii_lowercase();
    let arg = parts.next().unwrap_or("").trim().to_string();

    if mode == DispatchMode::Instance && is_instance_routed(&cmd_token) {
        if let Some(text) = services.adapters.instance.handle(player_name, &cmd_token, &arg) {
            return finish(world, vec![Delivery::new(player_name, text)]);
        }
    }

    let Some(command) = resolve(&cmd_token) else {
        return finish(world, vec![Delivery::new(player_name, format!("Huh? '{cmd_token}' isn't a command."))]);
    };

    services.adapters.metrics.record_command(player_name, &cmd_token);

    let deliveries = run_command(world, services, player_name, command, &arg);
    finish(world, deliveries)
}

/// Applies each recipient's theme and appends the `"> "` prompt, using the
/// world as it stands after the command ran (so a player who just changed
/// their theme sees the new one immediately).
fn finish(world: &World, deliveries: Vec<Delivery>) -> Vec<Delivery> {
    deliveries
        .into_iter()
        .map(|d| {
            let theme = world.player(&d.to).map(|p| p.theme).unwrap_or(crate::codec::Theme::Green);
            let body = if d.text.is_empty() { String::new() } else { format!("{}\n", apply_theme(&d.text, theme)) };
            Delivery::new(d.to, format!("{body}{}", apply_theme("> ", theme)))
        })
        .collect()
}

fn handle_dialogue_mode(services: &DispatchServices, player_name: &str, input: &str) -> String {
    if input.eq_ignore_ascii_case("bye") {
        services.sessions.set_mode(player_name, DispatchMode::Normal);
        return "You end the conversation.".to_string();
    }
    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        let (text, done) = services.adapters.dialogue.respond(player_name, "", input);
        if done {
            services.sessions.set_mode(player_name, DispatchMode::Normal);
        }
        return text;
    }
    "Type a number to choose, or 'bye' to end the conversation.".to_string()
}

fn run_command(world: &mut World, services: &DispatchServices, player_name: &str, command: Command, arg: &str) -> Vec<Delivery> {
    use Command::*;

    match command {
        Move(dir) => match world.move_player(player_name, dir.canonical()) {
            Ok(mut deliveries) => {
                deliveries.push(Delivery::new(player_name, world.look(player_name).unwrap_or_default()));
                deliveries
            }
            Err(e) => vec![Delivery::new(player_name, e.to_string())],
        },
        Look => vec![Delivery::new(player_name, world.look(player_name).unwrap_or_else(|e| e.to_string()))],
        Inventory => vec![Delivery::new(player_name, render_inventory(world, player_name))],
        Score => vec![Delivery::new(player_name, render_score(world, player_name))],
        Who => vec![Delivery::new(player_name, render_who(world))],
        Time => vec![Delivery::new(player_name, "The system clock ticks on, indifferent.".to_string())],
        Get => one(world.get_item(player_name, arg, services.max_inventory), player_name),
        Drop => one(world.drop_item(player_name, arg), player_name),
        Wear => one(world.wear_item(player_name, arg), player_name),
        RemoveEquip => one(world.remove_item(player_name, arg), player_name),
        Use => {
            if arg.eq_ignore_ascii_case("red") || arg.eq_ignore_ascii_case("red pill") {
                return vec![Delivery::new(player_name, handle_take_pill(world, player_name, "red_pill", true))];
            }
            if arg.eq_ignore_ascii_case("blue") || arg.eq_ignore_ascii_case("blue pill") {
                return vec![Delivery::new(player_name, handle_take_pill(world, player_name, "blue_pill", false))];
            }
            one(world.use_item(player_name, arg), player_name)
        }
        Kill => one(combat::initiate_combat(world, player_name, arg), player_name),
        Flee => {
            if let Some(p) = world.player_mut(player_name) {
                p.combat_state = CombatState::Idle;
                p.combat_target = None;
            }
            vec![Delivery::new(player_name, "You break off combat and flee.".to_string())]
        }
        Cast => {
            let mut split = arg.splitn(2, char::is_whitespace);
            let skill = split.next().unwrap_or("").to_string();
            let target = split.next().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
            one(combat::use_skill(world, player_name, &skill, target.as_deref()), player_name)
        }
        Cooldowns => vec![Delivery::new(player_name, "No cooldowns are tracked; skills are MP-gated only.".to_string())],
        List => vec![Delivery::new(player_name, render_vendor_list(world, player_name))],
        Buy => {
            let mut split = arg.splitn(2, char::is_whitespace);
            let npc_id = split.next().unwrap_or("").to_string();
            let item_name = split.next().unwrap_or("").to_string();
            one(world.buy_item(player_name, &npc_id, &item_name), player_name)
        }
        Sell => one(world.sell_item(player_name, arg), player_name),
        Give => {
            let mut split = arg.splitn(2, char::is_whitespace);
            let item_name = split.next().unwrap_or("").to_string();
            let npc_id = split.next().unwrap_or("").to_string();
            one(world.give_item(player_name, &item_name, &npc_id), player_name)
        }
        Deposit => one(world.deposit_item(player_name, arg), player_name),
        Withdraw => one(world.withdraw_item(player_name, arg, services.max_inventory), player_name),
        Storage => vec![Delivery::new(player_name, world.show_storage(player_name).unwrap_or_else(|e| e.to_string()))],
        Say => match world.say(player_name, arg) {
            Ok(mut deliveries) => {
                deliveries.push(Delivery::new(player_name, format!("You say: {arg}")));
                deliveries
            }
            Err(e) => vec![Delivery::new(player_name, e.to_string())],
        },
        Gossip => {
            let mut deliveries = world.gossip(&format!("[gossip] {player_name}: {arg}"));
            deliveries.push(Delivery::new(player_name, format!("[gossip] You: {arg}")));
            deliveries
        }
        Tell => {
            let mut split = arg.splitn(2, char::is_whitespace);
            let to = split.next().unwrap_or("").to_string();
            let body = split.next().unwrap_or("").to_string();
            match world.tell(player_name, &to, &body) {
                Ok((to_msg, confirm)) => vec![to_msg, confirm],
                Err(e) => vec![Delivery::new(player_name, e.to_string())],
            }
        }
        Channels => vec![Delivery::new(player_name, services.adapters.chat.join_channel(player_name, ""))],
        ChannelJoin => vec![Delivery::new(player_name, services.adapters.chat.join_channel(player_name, arg))],
        ChannelLeave => vec![Delivery::new(player_name, services.adapters.chat.leave_channel(player_name, arg))],
        Help => vec![Delivery::new(player_name, render_help())],
        Teleport => one(teleport(world, player_name, arg), player_name),
        Quit => {
            services.sessions.disconnect(player_name);
            let _ = world.save_player(services.storage, player_name);
            vec![Delivery::new(player_name, "Goodbye.".to_string())]
        }
        Recall => {
            if let Some(p) = world.player_mut(player_name) {
                p.room_id = crate::world::RECALL_ROOM.to_string();
                p.combat_state = CombatState::Idle;
                p.combat_target = None;
            }
            vec![Delivery::new(player_name, "You recall to the dojo.".to_string())]
        }
        Brief => {
            if let Some(p) = world.player_mut(player_name) {
                p.brief = !p.brief;
            }
            vec![Delivery::new(player_name, "Brief mode toggled.".to_string())]
        }
        Theme => one_theme(world, player_name, arg),
        Abilities => vec![Delivery::new(player_name, render_abilities(world, player_name))],
        SeeCode => vec![Delivery::new(player_name, "Lines of green code cascade past, meaningless to the unawakened eye.".to_string())],
        Focus => match world.player_mut(player_name) {
            Some(p) => one(combat::focus(p), player_name),
            None => vec![Delivery::new(player_name, "You aren't anywhere.".to_string())],
        },
        Call => vec![Delivery::new(player_name, "The line crackles, then connects to nothing in particular.".to_string())],
        Phonebook => vec![Delivery::new(player_name, render_phonebook(world, player_name))],
        Jackout => {
            services.sessions.disconnect(player_name);
            let _ = world.save_player(services.storage, player_name);
            vec![Delivery::new(player_name, "You jack out.".to_string())]
        }
        Quest => vec![Delivery::new(player_name, services.adapters.quest.list(player_name))],
        Faction => vec![Delivery::new(player_name, services.adapters.faction.standing(player_name))],
        Party => vec![Delivery::new(player_name, services.adapters.party.invite(player_name, arg))],
        Trade => vec![Delivery::new(player_name, services.adapters.trade.offer(player_name, arg))],
        Pvp => vec![Delivery::new(player_name, services.adapters.pvp.duel(player_name, arg))],
        Tutorial => vec![Delivery::new(player_name, services.adapters.tutorial.hint(player_name))],
        Accessibility => vec![Delivery::new(player_name, services.adapters.accessibility.describe_settings(player_name))],
        Achievements => vec![Delivery::new(player_name, services.adapters.achievement.list(player_name))],
        Leaderboard => vec![Delivery::new(player_name, services.adapters.leaderboard.top(10))],
        Training => {
            let stat = arg.split_whitespace().next().unwrap_or("").to_string();
            vec![Delivery::new(player_name, services.adapters.training.train(player_name, &stat))]
        }
        Map => vec![Delivery::new(player_name, render_map(world, player_name))],
        Dig => {
            let mut split = arg.splitn(3, char::is_whitespace);
            let direction = split.next().unwrap_or("").to_string();
            let room_id = split.next().unwrap_or("").to_string();
            let description = split.next().unwrap_or("A newly dug space.").to_string();
            let from_room = world.player(player_name).map(|p| p.room_id.clone()).unwrap_or_default();
            one(world.dig(&from_room, &direction, &room_id, &description), player_name)
        }
        Create => {
            let mut split = arg.splitn(2, char::is_whitespace);
            let kind = split.next().unwrap_or("").to_string();
            let template = split.next().unwrap_or("").to_string();
            let room_id = world.player(player_name).map(|p| p.room_id.clone()).unwrap_or_default();
            one(world.create_entity(&room_id, &kind, &template), player_name)
        }
        Delete => {
            let room_id = world.player(player_name).map(|p| p.room_id.clone()).unwrap_or_default();
            one(world.delete_entity(&room_id, arg), player_name)
        }
        EditRoom => {
            let room_id = world.player(player_name).map(|p| p.room_id.clone()).unwrap_or_default();
            let description = arg.strip_prefix("desc ").unwrap_or(arg).to_string();
            one(world.edit_room(&room_id, &description), player_name)
        }
        GenerateCity => {
            let mut split = arg.split_whitespace();
            let prefix = split.next().unwrap_or("city").to_string();
            let cols: u32 = split.next().and_then(|s| s.parse().ok()).unwrap_or(4);
            let rows: u32 = split.next().and_then(|s| s.parse().ok()).unwrap_or(4);
            one(world.generate_city(&prefix, cols, rows), player_name)
        }
        SaveWorld => one(world.save(services.storage).map(|_| "World saved.".to_string()), player_name),
    }
}

fn one(result: Result<String, MudError>, player_name: &str) -> Vec<Delivery> {
    vec![Delivery::new(player_name, result.unwrap_or_else(|e| e.to_string()))]
}

fn one_theme(world: &mut World, player_name: &str, arg: &str) -> Vec<Delivery> {
    let Some(parsed) = crate::codec::Theme::parse(arg) else {
        return vec![Delivery::new(player_name, "Usage: theme <green|amber|white|none>".to_string())];
    };
    if let Some(p) = world.player_mut(player_name) {
        p.theme = parsed;
    }
    vec![Delivery::new(player_name, format!("Theme set to {arg}."))]
}

fn handle_take_pill(world: &mut World, player_name: &str, pill_id: &str, is_red: bool) -> String {
    match world.take_pill(player_name, pill_id) {
        Ok(Some(_item)) => {
            if is_red {
                match world.player_mut(player_name) {
                    Some(p) => combat::awaken(p).unwrap_or_else(|e| e.to_string()),
                    None => "You aren't anywhere.".to_string(),
                }
            } else {
                "You remain asleep, comfortably unaware.".to_string()
            }
        }
        Ok(None) => "You don't have one of those.".to_string(),
        Err(e) => e.to_string(),
    }
}

fn teleport(world: &mut World, player_name: &str, room_id: &str) -> Result<String, MudError> {
    if !world.rooms.contains_key(room_id) {
        return Err(MudError::NotFound(format!("room '{room_id}'")));
    }
    let player = world.player_mut(player_name).ok_or_else(|| MudError::NotFound("player".to_string()))?;
    player.room_id = room_id.to_string();
    Ok(format!("You teleport to {room_id}."))
}

fn render_inventory(world: &World, player_name: &str) -> String {
    let Some(player) = world.player(player_name) else { return String::new() };
    if player.inventory.is_empty() {
        return "You are carrying nothing.".to_string();
    }
    let mut out = String::from("You are carrying:\n");
    for item in &player.inventory {
        out.push_str(&format!("  {}\n", item.name));
    }
    out
}

fn render_score(world: &World, player_name: &str) -> String {
    let Some(p) = world.player(player_name) else { return String::new() };
    format!(
        "{} the {} — Level {} ({} XP)\nHP {}/{}  MP {}/{}  STR {}\nMoney: {}  Heat: {}",
        p.name,
        p.class.map(|c| c.name()).unwrap_or("Unclassed"),
        p.level,
        p.xp,
        p.hp,
        p.max_hp,
        p.mp,
        p.max_mp,
        p.strength,
        p.money,
        p.heat
    )
}

fn render_who(world: &World) -> String {
    let mut names: Vec<&str> = world.players.values().map(|p| p.name.as_str()).collect();
    names.sort_unstable();
    if names.is_empty() {
        return "No one else is connected.".to_string();
    }
    format!("Online: {}", names.join(", "))
}

fn render_vendor_list(world: &World, player_name: &str) -> String {
    let Some(player) = world.player(player_name) else { return String::new() };
    let Some(room) = world.rooms.get(&player.room_id) else { return String::new() };
    let mut out = String::new();
    for npc in room.npcs.values().filter(|n| n.vendor) {
        out.push_str(&format!("{} offers:\n", npc.name));
        for id in &npc.vendor_inventory {
            if let Some(t) = world.item_templates.get(id) {
                out.push_str(&format!("  {} — {} fragments\n", t.name, t.price));
            }
        }
    }
    if out.is_empty() {
        out.push_str("No vendors here.");
    }
    out
}

fn render_abilities(world: &World, player_name: &str) -> String {
    use crate::world::Class;
    match world.player(player_name).and_then(|p| p.class) {
        Some(Class::Hacker) => "glitch <target> — 5 MP, 5-14 damage".to_string(),
        Some(Class::Rebel) => "smash <target> — 5 MP, STR to STR+7 damage".to_string(),
        Some(Class::Operator) => "patch — 5 MP, heal up to 10 HP".to_string(),
        None => "Choose a class to unlock abilities.".to_string(),
    }
}

fn render_phonebook(world: &World, player_name: &str) -> String {
    let Some(player) = world.player(player_name) else { return String::new() };
    if player.discovered_phones.is_empty() {
        return "You haven't discovered any hardline phones yet.".to_string();
    }
    format!("Known hardlines: {}", player.discovered_phones.join(", "))
}

fn render_map(world: &World, player_name: &str) -> String {
    let Some(player) = world.player(player_name) else { return String::new() };
    crate::world::render_automap(world, &player.room_id)
}

fn render_help() -> String {
    "Commands: look, inv, score, who, get, drop, wear, remove, use, kill, flee, cast, \
     list, buy, sell, give, deposit, withdraw, storage, say, gossip, tell, recall, \
     brief, theme, quit. See the manual for the full list."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Player;
    use std::time::Duration;

    fn services<'a>(limiter: &'a RateLimiter, sessions: &'a SessionRegistry, storage: &'a Storage, adapters: &'a Adapters) -> DispatchServices<'a> {
        DispatchServices {
            cmd_limiter: limiter,
            sessions,
            storage,
            adapters,
            max_inventory: 20,
        }
    }

    fn setup() -> (World, RateLimiter, SessionRegistry, Storage, Adapters) {
        let mut dir = std::env::temp_dir();
        dir.push(format!("mud-core-dispatch-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let storage = Storage::new(dir);
        let mut world = World::load(&storage);
        world.insert_player(Player::new_default("neo"));
        (
            world,
            RateLimiter::new(10, Duration::from_secs(1)),
            SessionRegistry::new(Duration::from_secs(60)),
            storage,
            Adapters::default(),
        )
    }

    #[test]
    fn unknown_command_is_reported() {
        let (mut world, limiter, sessions, storage, adapters) = setup();
        let svc = services(&limiter, &sessions, &storage, &adapters);
        let out = dispatch(&mut world, &svc, "neo", "xyzzy");
        assert!(out[0].text.contains("isn't a command"));
    }

    #[test]
    fn look_reports_room() {
        let (mut world, limiter, sessions, storage, adapters) = setup();
        let svc = services(&limiter, &sessions, &storage, &adapters);
        let out = dispatch(&mut world, &svc, "neo", "look");
        assert!(out[0].text.contains("loading_program"));
    }

    #[test]
    fn empty_input_just_reprompts() {
        let (mut world, limiter, sessions, storage, adapters) = setup();
        let svc = services(&limiter, &sessions, &storage, &adapters);
        let out = dispatch(&mut world, &svc, "neo", "   ");
        assert_eq!(out.len(), 1);
        assert!(out[0].text.ends_with("> "));
    }

    #[test]
    fn rate_limited_command_is_rejected() {
        let (mut world, limiter, sessions, storage, adapters) = setup();
        let svc = services(&limiter, &sessions, &storage, &adapters);
        for _ in 0..10 {
            dispatch(&mut world, &svc, "neo", "look");
        }
        let out = dispatch(&mut world, &svc, "neo", "look");
        assert!(out[0].text.contains("too fast"));
    }

    #[test]
    fn theme_command_updates_player() {
        let (mut world, limiter, sessions, storage, adapters) = setup();
        let svc = services(&limiter, &sessions, &storage, &adapters);
        dispatch(&mut world, &svc, "neo", "theme amber");
        assert_eq!(world.player("neo").unwrap().theme, crate::codec::Theme::Amber);
    }

    #[test]
    fn movement_reports_new_room() {
        let (mut world, limiter, sessions, storage, adapters) = setup();
        world.dig(crate::world::SPAWN_ROOM, "north", "hallway", "A dim hallway.").unwrap();
        let svc = services(&limiter, &sessions, &storage, &adapters);
        let out = dispatch(&mut world, &svc, "neo", "north");
        assert_eq!(world.player("neo").unwrap().room_id, "hallway");
        assert!(out.iter().any(|d| d.text.contains("hallway")));
    }
}
