use crate::core::{
    entity::Player,
    level::Level,
    pos::Direction,
};

/// Reward for stepping onto the exit tile. Ends the run.
pub const EXIT_REWARD: i32 = 100;
/// Reward when the player's health drops to zero. Ends the run.
pub const DEATH_REWARD: i32 = -100;
/// Reward for a move that brings the player closer to the exit.
pub const PROGRESS_REWARD: i32 = 1;
/// Reward for a move that succeeds without getting closer to the exit.
pub const IDLE_MOVE_REWARD: i32 = -1;
/// Reward for bumping into a wall or the map border.
pub const BLOCKED_MOVE_REWARD: i32 = -3;
pub const ATTACK_COST: i32 = -1;
pub const KILL_REWARD: i32 = 5;
pub const HIT_REWARD: i32 = 1;
pub const PICKUP_REWARD: i32 = 3;
/// Applied once per enemy hit landed on the player.
pub const HURT_REWARD: i32 = -1;

/// Discrete player action.
///
/// Solver policies emit indices `0..8`; indices 5 and above wait for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum GameAction {
    Move(Direction),
    Attack,
    Wait,
}

impl GameAction {
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Move(Direction::Up),
            1 => Self::Move(Direction::Down),
            2 => Self::Move(Direction::Left),
            3 => Self::Move(Direction::Right),
            4 => Self::Attack,
            _ => Self::Wait,
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Move(Direction::Up) => 0,
            Self::Move(Direction::Down) => 1,
            Self::Move(Direction::Left) => 2,
            Self::Move(Direction::Right) => 3,
            Self::Attack => 4,
            Self::Wait => 5,
        }
    }
}

/// Turn-based dungeon run on a single [`Level`].
///
/// Each [`Game::tick`] advances all entities by one logical frame, applies
/// the player's action and returns the reward earned on that frame.
#[derive(Debug, Clone)]
pub struct Game {
    level: Level,
    player: Player,
    initial_health: i32,
    game_over: bool,
}

impl Game {
    #[must_use]
    pub fn new(level: Level, health: i32) -> Self {
        let player = Player::new(level.entry(), health);
        Self {
            level,
            player,
            initial_health: health,
            game_over: false,
        }
    }

    /// Replaces the active level and starts a fresh run on it.
    pub fn reset(&mut self, level: Level, health: i32) {
        *self = Self::new(level, health);
    }

    /// Starts a fresh run on the current level, keeping every placement.
    pub fn restart_run(&mut self) {
        self.player = Player::new(self.level.entry(), self.initial_health);
        self.game_over = false;
    }

    #[must_use]
    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.game_over
    }

    pub fn tick(&mut self, action: GameAction) -> i32 {
        self.player.tick();
        for enemy in self.level.enemies_mut() {
            enemy.tick();
        }

        if self.game_over {
            return 0;
        }

        let mut reward = 0;
        match action {
            GameAction::Move(direction) => {
                let before = self.player.pos().manhattan_distance(self.level.exit());
                if !self.move_player(direction) {
                    reward += BLOCKED_MOVE_REWARD;
                } else if self.player.pos() == self.level.exit() {
                    self.game_over = true;
                    return EXIT_REWARD;
                } else if self.player.pos().manhattan_distance(self.level.exit()) < before {
                    reward += PROGRESS_REWARD;
                } else {
                    reward += IDLE_MOVE_REWARD;
                }
            }
            GameAction::Attack => {
                let (killed, damaged) = self.attack_enemies();
                reward += ATTACK_COST + KILL_REWARD * killed + HIT_REWARD * damaged;
            }
            GameAction::Wait => {}
        }

        reward += PICKUP_REWARD * self.grab_items();
        reward += HURT_REWARD * self.attack_player();

        if self.player.health() > 0 {
            return reward;
        }

        self.player.die();
        self.game_over = true;
        DEATH_REWARD
    }

    fn move_player(&mut self, direction: Direction) -> bool {
        let next = self.player.pos() + direction.delta();
        if !self.level.contains(next) || self.level.wall_map().is_set(next) {
            return false;
        }
        self.player.set_pos(next);
        true
    }

    fn grab_items(&mut self) -> i32 {
        let items = self.level.take_items_at(self.player.pos());
        for item in &items {
            self.player.receive_bonus(item);
        }
        count(items.len())
    }

    fn attack_enemies(&mut self) -> (i32, i32) {
        self.player.begin_attack();

        let reach = self.player.pos().with_neighbors();
        let power = self.player.power();
        let (mut killed, mut damaged) = (0, 0);
        for enemy in self.level.enemies_mut() {
            if !reach.contains(&enemy.pos()) {
                continue;
            }
            enemy.hurt(power);
            if enemy.is_defeated() {
                killed += 1;
            } else {
                damaged += 1;
            }
        }
        let xp = self.level.remove_defeated_enemies();
        self.player.receive_xp(xp);
        (killed, damaged)
    }

    fn attack_player(&mut self) -> i32 {
        if self.player.state().is_attack() {
            return 0;
        }
        let target = self.player.pos();
        let mut hits = 0;
        for enemy in self.level.enemies_mut() {
            if !enemy.pos().with_neighbors().contains(&target) {
                continue;
            }
            if enemy.ready_to_strike() {
                self.player.hurt(enemy.power());
                hits += 1;
            }
        }
        hits
    }
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
