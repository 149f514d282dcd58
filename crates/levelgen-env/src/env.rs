use levelgen_game::{Game, Level, LevelError, Pos};
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use crate::{
    config::{ConfigError, EnvConfig, EpisodeParams},
    observation::{Observation, StageView},
    rules::{Termination, rules_for},
    stage::Stage,
};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum EnvError {
    #[display("action {action} is outside of 0..{action_count} in stage {stage}")]
    InvalidAction {
        stage: Stage,
        action: usize,
        action_count: usize,
    },
    #[display("stage {stage} already finished")]
    StageFinished { stage: Stage },
    #[display("no stage follows the solver stage")]
    CurriculumComplete,
    #[display("invalid environment configuration")]
    #[from]
    Config(ConfigError),
    #[display("failed to generate a level")]
    #[from]
    Level(LevelError),
}

/// Result of one [`CurriculumEnv::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f32,
    pub stage_done: bool,
    pub truncated: bool,
    pub stage: Stage,
}

impl StepOutcome {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.stage_done || self.truncated
    }
}

/// Staged level-design environment.
///
/// One curriculum episode walks through every [`Stage`] on the same level:
/// three placement sweeps and two solver runs. [`CurriculumEnv::step`]
/// never changes the stage; the driver calls [`CurriculumEnv::advance`]
/// once a stage reports `stage_done` or `truncated`.
#[derive(Debug, Clone)]
pub struct CurriculumEnv {
    config: EnvConfig,
    rng: Pcg32,
    params: EpisodeParams,
    game: Game,
    stage: Stage,
    cursor: Pos,
    steps: usize,
    termination: Termination,
}

impl CurriculumEnv {
    pub fn new(config: EnvConfig, seed: u64) -> Result<Self, EnvError> {
        config.validate()?;
        let mut rng = Pcg32::seed_from_u64(seed);
        let params = EpisodeParams::sample(&config, &mut rng);
        let level = Level::random(params.map_size, &mut rng)?;
        let game = Game::new(level, params.health);
        Ok(Self {
            config,
            rng,
            params,
            game,
            stage: Stage::Walls,
            cursor: Pos::ORIGIN,
            steps: 0,
            termination: Termination::default(),
        })
    }

    /// Starts a new curriculum episode on a fresh random level.
    pub fn reset(&mut self) -> Result<Observation, EnvError> {
        let params = EpisodeParams::sample(&self.config, &mut self.rng);
        let level = Level::random(params.map_size, &mut self.rng)?;
        Ok(self.reset_with_level(params, level))
    }

    /// Starts a new curriculum episode on `level`. The map size of `params`
    /// is replaced by the level's.
    pub fn reset_with_level(&mut self, mut params: EpisodeParams, level: Level) -> Observation {
        params.map_size = level.map_size();
        self.game.reset(level, params.health);
        self.params = params;
        self.stage = Stage::Walls;
        self.cursor = Pos::ORIGIN;
        self.steps = 0;
        self.termination = Termination::default();
        self.observe()
    }

    pub fn step(&mut self, action: usize) -> Result<StepOutcome, EnvError> {
        let stage = self.stage;
        let rules = rules_for(stage);
        let action_count = rules.space().action_count;
        if action >= action_count {
            return Err(EnvError::InvalidAction {
                stage,
                action,
                action_count,
            });
        }
        if self.termination.is_terminal() {
            return Err(EnvError::StageFinished { stage });
        }

        let effect = rules.apply_action(&mut self.game, self.cursor, action);
        let reward = rules.compute_reward(&self.view(), effect);
        if stage.is_placement() {
            self.advance_sweep();
        } else {
            self.cursor = self.game.player().pos();
            self.steps += 1;
        }
        self.termination = rules.is_done(&self.view());

        Ok(StepOutcome {
            observation: rules.encode_observation(&self.view()),
            reward,
            stage_done: self.termination.done,
            truncated: self.termination.truncated,
            stage,
        })
    }

    /// Moves to the next stage and returns its first observation.
    ///
    /// Placement stages start their sweep at `(0, 0)`. Solver stages start a
    /// fresh run from the entry with the episode's health, keeping every
    /// placement made so far.
    pub fn advance(&mut self) -> Result<Observation, EnvError> {
        let next = self.stage.successor().ok_or(EnvError::CurriculumComplete)?;
        if next.is_solving() {
            self.game.restart_run();
            self.cursor = self.game.level().entry();
        } else {
            self.cursor = Pos::ORIGIN;
        }
        self.stage = next;
        self.steps = 0;
        self.termination = Termination::default();
        tracing::trace!(stage = %next, "advanced curriculum stage");
        Ok(self.observe())
    }

    /// Observation of the current stage at the current cursor.
    #[must_use]
    pub fn observe(&self) -> Observation {
        rules_for(self.stage).encode_observation(&self.view())
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn params(&self) -> &EpisodeParams {
        &self.params
    }

    #[must_use]
    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[must_use]
    pub fn level(&self) -> &Level {
        self.game.level()
    }

    #[must_use]
    pub fn cursor(&self) -> Pos {
        self.cursor
    }

    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    fn view(&self) -> StageView<'_> {
        StageView {
            game: &self.game,
            params: &self.params,
            cursor: self.cursor,
            steps: self.steps,
        }
    }

    /// Row-major sweep: `x` grows first and wraps into the next row.
    fn advance_sweep(&mut self) {
        let last = i32::try_from(self.params.map_size).unwrap_or(i32::MAX) - 1;
        if self.cursor.x == last {
            self.cursor.y += 1;
        }
        self.cursor.x = (self.cursor.x + 1) % (last + 1);
    }
}
