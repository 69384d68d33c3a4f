//! Automap rendering (§4.10 `map`): a BFS from the player's current room
//! over the exit graph, projected onto a 2D grid via direction deltas, then
//! clipped to a Chebyshev-radius window around the player and rendered as
//! a character grid using each room's `symbol`.

use std::collections::{HashMap, VecDeque};

use super::room::Direction;
use super::World;

const MAP_RADIUS: i32 = 5;

fn direction_delta(dir: &str) -> Option<(i32, i32)> {
    match Direction::parse(dir)? {
        Direction::North => Some((0, -1)),
        Direction::South => Some((0, 1)),
        Direction::East => Some((1, 0)),
        Direction::West => Some((-1, 0)),
        // Up/Down don't project onto the 2D grid; they're shown as the
        // current room's own symbol only, never traversed for placement.
        Direction::Up | Direction::Down => None,
    }
}

/// Renders an ASCII automap centered on `center_room`, exploring outward
/// through room exits up to `MAP_RADIUS` in Chebyshev distance (so
/// diagonal reach costs the same as a straight line, matching a square
/// viewport rather than a diamond).
pub fn render_automap(world: &World, center_room: &str) -> String {
    if !world.rooms.contains_key(center_room) {
        return "You have no idea where you are.".to_string();
    }

    let mut coords: HashMap<String, (i32, i32)> = HashMap::new();
    coords.insert(center_room.to_string(), (0, 0));

    let mut queue = VecDeque::new();
    queue.push_back(center_room.to_string());

    while let Some(current) = queue.pop_front() {
        let (cx, cy) = coords[&current];
        if cx.abs() > MAP_RADIUS || cy.abs() > MAP_RADIUS {
            continue;
        }
        let Some(room) = world.rooms.get(&current) else { continue };
        for (dir, dest) in &room.exits {
            let Some((dx, dy)) = direction_delta(dir) else { continue };
            if coords.contains_key(dest) {
                continue;
            }
            let pos = (cx + dx, cy + dy);
            if pos.0.abs() > MAP_RADIUS || pos.1.abs() > MAP_RADIUS {
                continue;
            }
            coords.insert(dest.clone(), pos);
            queue.push_back(dest.clone());
        }
    }

    let mut grid = vec![vec![' '; (2 * MAP_RADIUS + 1) as usize]; (2 * MAP_RADIUS + 1) as usize];
    for (room_id, (x, y)) in &coords {
        let room = &world.rooms[room_id];
        let gx = (x + MAP_RADIUS) as usize;
        let gy = (y + MAP_RADIUS) as usize;
        grid[gy][gx] = if room_id == center_room { '@' } else { room.symbol };
    }

    grid.into_iter().map(|row| row.into_iter().collect::<String>()).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Storage;

    fn world() -> World {
        let mut dir = std::env::temp_dir();
        dir.push(format!("mud-core-mapping-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        World::load(&Storage::new(dir))
    }

    #[test]
    fn unknown_room_reports_lost() {
        let w = world();
        assert_eq!(render_automap(&w, "nowhere"), "You have no idea where you are.");
    }

    #[test]
    fn center_room_marked_with_at_sign() {
        let mut w = world();
        w.dig("dojo", "north", "hall", "A hall.").unwrap();
        let map = render_automap(&w, "dojo");
        assert!(map.contains('@'));
        assert!(map.contains('.'));
    }

    #[test]
    fn rooms_beyond_radius_are_not_placed() {
        let mut w = world();
        let mut prev = "dojo".to_string();
        for i in 0..(MAP_RADIUS + 3) {
            let next = format!("hall{i}");
            w.dig(&prev, "north", &next, "A hall.").unwrap();
            prev = next;
        }
        let map = render_automap(&w, "dojo");
        let rows: Vec<&str> = map.lines().collect();
        assert_eq!(rows.len(), (2 * MAP_RADIUS + 1) as usize);
    }
}
