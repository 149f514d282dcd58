use levelgen_game::{Game, GameAction, ItemKind, Pos};

use crate::{
    observation::{self, Observation, StageView},
    reward,
    stage::{Stage, StageSpace},
};

/// What an action did to the episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum ActionEffect {
    /// The cursor tile was left untouched.
    Skipped,
    /// An object was placed on the cursor tile. `prior_count` counts objects
    /// of the same family before the placement.
    Placed {
        placement: Placement,
        prior_count: usize,
    },
    /// The game advanced one tick and returned `game_reward`.
    Played { game_reward: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Wall,
    Enemy,
    Item(ItemKind),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Termination {
    pub done: bool,
    pub truncated: bool,
}

impl Termination {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.done || self.truncated
    }
}

/// Behaviour of one stage.
///
/// The environment owns the mutable episode state and drives every stage
/// through this trait, in the order `apply_action`, `compute_reward`, cursor
/// update, `is_done`, `encode_observation`.
pub trait StageRules: Send + Sync {
    fn stage(&self) -> Stage;

    fn space(&self) -> StageSpace {
        self.stage().space()
    }

    fn encode_observation(&self, view: &StageView<'_>) -> Observation;

    /// Applies `action` (already range checked) at `cursor`.
    fn apply_action(&self, game: &mut Game, cursor: Pos, action: usize) -> ActionEffect;

    /// Scores `effect`. Called before the cursor moves.
    fn compute_reward(&self, view: &StageView<'_>, effect: ActionEffect) -> f32;

    fn is_done(&self, view: &StageView<'_>) -> Termination;
}

/// Placement stages end once the sweep leaves the last row.
fn sweep_termination(view: &StageView<'_>) -> Termination {
    let past_last_row = usize::try_from(view.cursor.y).is_ok_and(|y| y >= view.params.map_size);
    Termination {
        done: past_last_row,
        truncated: false,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WallRules;

impl StageRules for WallRules {
    fn stage(&self) -> Stage {
        Stage::Walls
    }

    fn encode_observation(&self, view: &StageView<'_>) -> Observation {
        observation::encode_walls(view)
    }

    fn apply_action(&self, game: &mut Game, cursor: Pos, action: usize) -> ActionEffect {
        if action != 1 {
            return ActionEffect::Skipped;
        }
        let level = game.level_mut();
        let prior_count = level.wall_map().count();
        level.add_wall_at(cursor);
        ActionEffect::Placed {
            placement: Placement::Wall,
            prior_count,
        }
    }

    fn compute_reward(&self, view: &StageView<'_>, effect: ActionEffect) -> f32 {
        if effect.is_placed() {
            reward::wall_placement(view.level(), view.cursor, view.params)
        } else {
            0.0
        }
    }

    fn is_done(&self, view: &StageView<'_>) -> Termination {
        sweep_termination(view)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnemyRules;

impl StageRules for EnemyRules {
    fn stage(&self) -> Stage {
        Stage::Enemy
    }

    fn encode_observation(&self, view: &StageView<'_>) -> Observation {
        observation::encode_enemy(view)
    }

    fn apply_action(&self, game: &mut Game, cursor: Pos, action: usize) -> ActionEffect {
        if action != 1 {
            return ActionEffect::Skipped;
        }
        let level = game.level_mut();
        let prior_count = level.enemies().len();
        level.add_enemy_at(cursor);
        ActionEffect::Placed {
            placement: Placement::Enemy,
            prior_count,
        }
    }

    fn compute_reward(&self, view: &StageView<'_>, effect: ActionEffect) -> f32 {
        if effect.is_placed() {
            reward::enemy_placement(view.level(), view.cursor, view.params, view.health())
        } else {
            0.0
        }
    }

    fn is_done(&self, view: &StageView<'_>) -> Termination {
        sweep_termination(view)
    }
}

/// Action 0 skips, 1 places a healing item, 2 a power item.
#[derive(Debug, Clone, Copy)]
pub struct ItemRules;

impl StageRules for ItemRules {
    fn stage(&self) -> Stage {
        Stage::Item
    }

    fn encode_observation(&self, view: &StageView<'_>) -> Observation {
        observation::encode_item(view)
    }

    fn apply_action(&self, game: &mut Game, cursor: Pos, action: usize) -> ActionEffect {
        let kind = match action {
            1 => ItemKind::Healing,
            2 => ItemKind::Power,
            _ => return ActionEffect::Skipped,
        };
        let level = game.level_mut();
        let prior_count = level.items().len();
        match kind {
            ItemKind::Healing => level.add_healing_item_at(cursor),
            ItemKind::Power => level.add_power_item_at(cursor),
        }
        ActionEffect::Placed {
            placement: Placement::Item(kind),
            prior_count,
        }
    }

    fn compute_reward(&self, view: &StageView<'_>, effect: ActionEffect) -> f32 {
        let ActionEffect::Placed {
            placement: Placement::Item(kind),
            prior_count,
        } = effect
        else {
            return 0.0;
        };
        reward::item_placement(
            view.level(),
            view.cursor,
            view.params,
            view.health(),
            kind,
            prior_count,
        )
    }

    fn is_done(&self, view: &StageView<'_>) -> Termination {
        sweep_termination(view)
    }
}

/// Plays the generated level.
///
/// The run completes when the player stands on the exit. It is truncated
/// once more than `budget_factor * m²` steps were taken and, when
/// `fail_on_death` is set, as soon as the player's health reaches zero.
#[derive(Debug, Clone, Copy)]
pub struct SolverRules {
    pub stage: Stage,
    pub budget_factor: usize,
    pub fail_on_death: bool,
}

impl StageRules for SolverRules {
    fn stage(&self) -> Stage {
        self.stage
    }

    fn encode_observation(&self, view: &StageView<'_>) -> Observation {
        observation::encode_solver(view)
    }

    fn apply_action(&self, game: &mut Game, _cursor: Pos, action: usize) -> ActionEffect {
        let start = game.player().pos();
        game.level_mut().mark_route(start);
        let game_reward = game.tick(GameAction::from_index(action));
        ActionEffect::Played { game_reward }
    }

    fn compute_reward(&self, _view: &StageView<'_>, effect: ActionEffect) -> f32 {
        match effect {
            ActionEffect::Played { game_reward } => game_reward_value(game_reward),
            _ => 0.0,
        }
    }

    fn is_done(&self, view: &StageView<'_>) -> Termination {
        let done = view.game.player().pos() == view.level().exit();
        if done {
            return Termination {
                done,
                truncated: false,
            };
        }
        let area = view.params.map_size * view.params.map_size;
        let out_of_budget = view.steps > area * self.budget_factor;
        let dead = self.fail_on_death && view.health() <= 0;
        Termination {
            done: false,
            truncated: out_of_budget || dead,
        }
    }
}

#[expect(clippy::cast_precision_loss)]
fn game_reward_value(reward: i32) -> f32 {
    reward as f32
}

static WALLS: WallRules = WallRules;
static WALL_SOLVER: SolverRules = SolverRules {
    stage: Stage::WallSolver,
    budget_factor: 4,
    fail_on_death: false,
};
static ENEMY: EnemyRules = EnemyRules;
static ITEM: ItemRules = ItemRules;
static SOLVER: SolverRules = SolverRules {
    stage: Stage::Solver,
    budget_factor: 8,
    fail_on_death: true,
};

/// Rules object driving `stage`.
#[must_use]
pub fn rules_for(stage: Stage) -> &'static dyn StageRules {
    match stage {
        Stage::Walls => &WALLS,
        Stage::WallSolver => &WALL_SOLVER,
        Stage::Enemy => &ENEMY,
        Stage::Item => &ITEM,
        Stage::Solver => &SOLVER,
    }
}
