use rand::Rng;

use crate::LevelError;

use super::{
    entity::{Enemy, Item, ItemKind},
    grid_map::GridMap,
    pos::Pos,
};

/// A square dungeon level: static walls, placed enemies and items, the entry
/// and exit tiles, and the route a player walked through it.
///
/// Every placement keeps a boolean map in sync with the entity lists, so
/// feature extraction can read maps while the game rules operate on
/// entities. Placement validity is *not* enforced here: a wall may be put on
/// the entry tile or an enemy on a wall. Curriculum rewards penalize those
/// placements instead.
#[derive(Debug, Clone)]
pub struct Level {
    map_size: usize,
    wall_map: GridMap,
    enemy_map: GridMap,
    heal_map: GridMap,
    power_map: GridMap,
    route: GridMap,
    enemies: Vec<Enemy>,
    items: Vec<Item>,
    entry: Pos,
    exit: Pos,
}

impl Level {
    pub const MIN_MAP_SIZE: usize = 3;

    /// Creates an empty level with the given entry and exit.
    pub fn new(map_size: usize, entry: Pos, exit: Pos) -> Result<Self, LevelError> {
        if map_size < Self::MIN_MAP_SIZE {
            return Err(LevelError::MapTooSmall { map_size });
        }
        if entry == exit {
            return Err(LevelError::CoincidentEndpoints { pos: entry });
        }
        let level = Self {
            map_size,
            wall_map: GridMap::new(map_size),
            enemy_map: GridMap::new(map_size),
            heal_map: GridMap::new(map_size),
            power_map: GridMap::new(map_size),
            route: GridMap::new(map_size),
            enemies: vec![],
            items: vec![],
            entry,
            exit,
        };
        for pos in [entry, exit] {
            if !level.contains(pos) {
                return Err(LevelError::OutOfBounds { pos, map_size });
            }
        }
        Ok(level)
    }

    /// Creates an empty level with randomly drawn endpoints.
    ///
    /// The exit is drawn uniformly. The entry is redrawn while it coincides
    /// with the exit or while the signed coordinate sum of `entry - exit`
    /// exceeds a third of the map size.
    pub fn random<R>(map_size: usize, rng: &mut R) -> Result<Self, LevelError>
    where
        R: Rng + ?Sized,
    {
        if map_size < Self::MIN_MAP_SIZE {
            return Err(LevelError::MapTooSmall { map_size });
        }
        #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let size = map_size as i32;
        let draw = |rng: &mut R| Pos::new(rng.random_range(0..size), rng.random_range(0..size));

        let exit = draw(rng);
        let mut entry = draw(rng);
        while entry == exit || (entry - exit).signed_sum() * 3 > size {
            entry = draw(rng);
        }
        Self::new(map_size, entry, exit)
    }

    #[must_use]
    pub fn map_size(&self) -> usize {
        self.map_size
    }

    #[must_use]
    pub fn contains(&self, pos: Pos) -> bool {
        self.wall_map.contains(pos)
    }

    #[must_use]
    pub fn entry(&self) -> Pos {
        self.entry
    }

    #[must_use]
    pub fn exit(&self) -> Pos {
        self.exit
    }

    #[must_use]
    pub fn wall_map(&self) -> &GridMap {
        &self.wall_map
    }

    #[must_use]
    pub fn enemy_map(&self) -> &GridMap {
        &self.enemy_map
    }

    #[must_use]
    pub fn heal_map(&self) -> &GridMap {
        &self.heal_map
    }

    #[must_use]
    pub fn power_map(&self) -> &GridMap {
        &self.power_map
    }

    /// Tiles visited by the player during solver runs.
    #[must_use]
    pub fn route(&self) -> &GridMap {
        &self.route
    }

    #[must_use]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemies_mut(&mut self) -> &mut [Enemy] {
        &mut self.enemies
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn is_endpoint(&self, pos: Pos) -> bool {
        pos == self.entry || pos == self.exit
    }

    pub fn add_wall_at(&mut self, pos: Pos) {
        self.wall_map.set(pos, true);
    }

    pub fn add_enemy_at(&mut self, pos: Pos) {
        self.enemy_map.set(pos, true);
        self.enemies.push(Enemy::new(pos));
    }

    pub fn add_healing_item_at(&mut self, pos: Pos) {
        self.heal_map.set(pos, true);
        self.items.push(Item::new(pos, ItemKind::Healing));
    }

    pub fn add_power_item_at(&mut self, pos: Pos) {
        self.power_map.set(pos, true);
        self.items.push(Item::new(pos, ItemKind::Power));
    }

    pub fn mark_route(&mut self, pos: Pos) {
        if self.contains(pos) {
            self.route.set(pos, true);
        }
    }

    /// Removes and returns every item lying on `pos`.
    pub fn take_items_at(&mut self, pos: Pos) -> Vec<Item> {
        let (taken, kept): (Vec<_>, Vec<_>) = self.items.drain(..).partition(|item| item.pos() == pos);
        self.items = kept;
        for item in &taken {
            match item.kind() {
                ItemKind::Healing => self.heal_map.set(pos, false),
                ItemKind::Power => self.power_map.set(pos, false),
            }
        }
        taken
    }

    /// Removes defeated enemies and returns the experience they were worth.
    pub fn remove_defeated_enemies(&mut self) -> u32 {
        let mut xp = 0;
        let enemy_map = &mut self.enemy_map;
        self.enemies.retain(|enemy| {
            if !enemy.is_defeated() {
                return true;
            }
            enemy_map.set(enemy.pos(), false);
            xp += Enemy::XP;
            false
        });
        xp
    }
}
