use serde::{Deserialize, Serialize};

use super::pos::Pos;

/// Number of ticks an attack or hurt reaction lasts.
pub const STATE_TICKS: i32 = 4;

/// Ticks between two enemy attacks while the player stays in reach.
pub const ENEMY_ATTACK_COOLDOWN: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum EntityState {
    Idle,
    Hurt,
    Attack,
    Dead,
}

/// Position, health, power and reaction state shared by the player and enemies.
#[derive(Debug, Clone)]
struct Body {
    pos: Pos,
    health: i32,
    power: i32,
    state: EntityState,
    frame: i32,
}

impl Body {
    fn new(pos: Pos, health: i32, power: i32) -> Self {
        Self {
            pos,
            health,
            power,
            state: EntityState::Idle,
            frame: 0,
        }
    }

    /// Applies damage unless the body is still reacting to a previous hit.
    fn hurt(&mut self, damage: i32) {
        if self.state != EntityState::Hurt {
            self.frame = -1;
            self.state = EntityState::Hurt;
            self.health -= damage;
        }
    }

    /// Returns `true` when a timed state (attack or hurt) just ended.
    fn tick_timed_state(&mut self) -> bool {
        self.frame += 1;
        let timed = matches!(self.state, EntityState::Hurt | EntityState::Attack);
        if timed && self.frame >= STATE_TICKS {
            self.state = EntityState::Idle;
            self.frame = 0;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    body: Body,
    base_power: i32,
    xp: u32,
}

impl Player {
    pub const BASE_HEALTH: i32 = 10;
    pub const BASE_POWER: i32 = 3;

    #[must_use]
    pub fn new(pos: Pos, health: i32) -> Self {
        Self {
            body: Body::new(pos, health, Self::BASE_POWER),
            base_power: Self::BASE_POWER,
            xp: 0,
        }
    }

    #[must_use]
    pub fn pos(&self) -> Pos {
        self.body.pos
    }

    pub fn set_pos(&mut self, pos: Pos) {
        self.body.pos = pos;
    }

    #[must_use]
    pub fn health(&self) -> i32 {
        self.body.health
    }

    #[must_use]
    pub fn power(&self) -> i32 {
        self.body.power
    }

    #[must_use]
    pub fn xp(&self) -> u32 {
        self.xp
    }

    #[must_use]
    pub fn state(&self) -> EntityState {
        self.body.state
    }

    pub fn hurt(&mut self, damage: i32) {
        self.body.hurt(damage);
    }

    pub fn begin_attack(&mut self) {
        if self.body.state != EntityState::Attack {
            self.body.frame = 0;
            self.body.state = EntityState::Attack;
        }
    }

    pub fn die(&mut self) {
        self.body.frame = 0;
        self.body.state = EntityState::Dead;
    }

    pub fn receive_xp(&mut self, xp: u32) {
        self.xp += xp;
    }

    pub fn receive_bonus(&mut self, item: &Item) {
        match item.kind() {
            ItemKind::Healing => self.body.health += item.bonus(),
            ItemKind::Power => self.body.power += item.bonus(),
        }
    }

    /// Advances reaction timers by one tick. A power boost lasts until the
    /// current attack ends.
    pub fn tick(&mut self) {
        if self.body.state.is_dead() {
            self.body.frame = (self.body.frame + 1).min(STATE_TICKS - 1);
            return;
        }
        let was_attacking = self.body.state.is_attack();
        if self.body.tick_timed_state() && was_attacking {
            self.body.power = self.base_power;
        }
        self.body.frame %= STATE_TICKS;
    }
}

#[derive(Debug, Clone)]
pub struct Enemy {
    body: Body,
    cooldown: u32,
}

impl Enemy {
    pub const HEALTH: i32 = 9;
    pub const POWER: i32 = 2;
    pub const XP: u32 = 3;

    #[must_use]
    pub fn new(pos: Pos) -> Self {
        Self {
            body: Body::new(pos, Self::HEALTH, Self::POWER),
            cooldown: 1,
        }
    }

    #[must_use]
    pub fn pos(&self) -> Pos {
        self.body.pos
    }

    #[must_use]
    pub fn health(&self) -> i32 {
        self.body.health
    }

    #[must_use]
    pub fn power(&self) -> i32 {
        self.body.power
    }

    #[must_use]
    pub fn state(&self) -> EntityState {
        self.body.state
    }

    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.body.health <= 0
    }

    pub fn hurt(&mut self, damage: i32) {
        self.body.hurt(damage);
    }

    /// Counts down towards the next attack and reports whether the enemy
    /// strikes on this tick.
    pub fn ready_to_strike(&mut self) -> bool {
        if self.body.state != EntityState::Attack {
            self.cooldown = (self.cooldown + 1) % ENEMY_ATTACK_COOLDOWN;
        }
        if self.cooldown == 0 {
            self.body.frame = -1;
            self.body.state = EntityState::Attack;
            return true;
        }
        false
    }

    pub fn tick(&mut self) {
        self.body.tick_timed_state();
        self.body.frame %= STATE_TICKS;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Healing,
    Power,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pos: Pos,
    kind: ItemKind,
}

impl Item {
    #[must_use]
    pub fn new(pos: Pos, kind: ItemKind) -> Self {
        Self { pos, kind }
    }

    #[must_use]
    pub fn pos(&self) -> Pos {
        self.pos
    }

    #[must_use]
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    #[must_use]
    pub fn bonus(&self) -> i32 {
        match self.kind {
            ItemKind::Healing => 2,
            ItemKind::Power => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hurt_is_ignored_while_reacting() {
        let mut enemy = Enemy::new(Pos::ORIGIN);
        enemy.hurt(3);
        enemy.hurt(3);
        assert_eq!(enemy.health(), Enemy::HEALTH - 3);

        // frame starts at -1, so the reaction lasts one extra tick
        for _ in 0..=STATE_TICKS {
            enemy.tick();
        }
        assert_eq!(enemy.state(), EntityState::Idle);
        enemy.hurt(3);
        assert_eq!(enemy.health(), Enemy::HEALTH - 6);
    }

    #[test]
    fn test_power_boost_lasts_until_attack_ends() {
        let mut player = Player::new(Pos::ORIGIN, 10);
        player.receive_bonus(&Item::new(Pos::ORIGIN, ItemKind::Power));
        assert_eq!(player.power(), Player::BASE_POWER + 3);

        player.begin_attack();
        for _ in 0..STATE_TICKS - 1 {
            player.tick();
            assert_eq!(player.power(), Player::BASE_POWER + 3);
        }
        player.tick();
        assert_eq!(player.state(), EntityState::Idle);
        assert_eq!(player.power(), Player::BASE_POWER);
    }

    #[test]
    fn test_enemy_strikes_on_cooldown() {
        let mut enemy = Enemy::new(Pos::ORIGIN);
        let strikes: Vec<bool> = (0..3).map(|_| enemy.ready_to_strike()).collect();
        assert_eq!(strikes, [false, false, true]);
        assert_eq!(enemy.state(), EntityState::Attack);
    }

    #[test]
    fn test_healing_item_restores_health() {
        let mut player = Player::new(Pos::ORIGIN, 4);
        player.receive_bonus(&Item::new(Pos::ORIGIN, ItemKind::Healing));
        assert_eq!(player.health(), 6);
    }
}
