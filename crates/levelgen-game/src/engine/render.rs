use std::fmt;

use crate::core::pos::Pos;

use super::game::Game;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderCell {
    #[default]
    Floor,
    Wall,
    Entry,
    Exit,
    Player,
    Enemy,
    Healing,
    Power,
    Route,
}

impl RenderCell {
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            RenderCell::Floor => '.',
            RenderCell::Wall => '#',
            RenderCell::Entry => 'S',
            RenderCell::Exit => 'E',
            RenderCell::Player => '@',
            RenderCell::Enemy => 'm',
            RenderCell::Healing => '+',
            RenderCell::Power => '!',
            RenderCell::Route => ',',
        }
    }
}

/// Text snapshot of a game, one character per tile.
///
/// Rows are stored bottom-up (`rows[y]`) and printed top-down so that
/// [`Direction::Up`](crate::Direction::Up) points up on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiFrame {
    rows: Vec<Vec<RenderCell>>,
    health: i32,
    xp: u32,
}

impl AsciiFrame {
    #[must_use]
    pub fn capture(game: &Game) -> Self {
        let level = game.level();
        let size = level.map_size();
        let mut rows = vec![vec![RenderCell::Floor; size]; size];

        let mut paint = |pos: Pos, cell: RenderCell| {
            let (Ok(x), Ok(y)) = (usize::try_from(pos.x), usize::try_from(pos.y)) else {
                return;
            };
            if x < size && y < size {
                rows[y][x] = cell;
            }
        };

        for pos in level.route().iter_set() {
            paint(pos, RenderCell::Route);
        }
        for pos in level.wall_map().iter_set() {
            paint(pos, RenderCell::Wall);
        }
        for item in level.items() {
            let cell = if item.kind().is_healing() {
                RenderCell::Healing
            } else {
                RenderCell::Power
            };
            paint(item.pos(), cell);
        }
        for enemy in level.enemies() {
            paint(enemy.pos(), RenderCell::Enemy);
        }
        paint(level.entry(), RenderCell::Entry);
        paint(level.exit(), RenderCell::Exit);
        paint(game.player().pos(), RenderCell::Player);

        Self {
            rows,
            health: game.player().health(),
            xp: game.player().xp(),
        }
    }

    /// Side length of the captured map.
    #[must_use]
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn cell(&self, pos: Pos) -> Option<RenderCell> {
        let x = usize::try_from(pos.x).ok()?;
        let y = usize::try_from(pos.y).ok()?;
        self.rows.get(y)?.get(x).copied()
    }
}

impl fmt::Display for AsciiFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows.iter().rev() {
            for cell in row {
                write!(f, "{}", cell.symbol())?;
            }
            writeln!(f)?;
        }
        write!(f, "hp={} xp={}", self.health, self.xp)
    }
}

/// Receives game snapshots while episodes run.
pub trait Renderer {
    fn render(&mut self, label: &str, game: &Game);
}

/// Discards every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _label: &str, _game: &Game) {}
}

/// Emits each frame as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRenderer;

impl Renderer for TracingRenderer {
    fn render(&mut self, label: &str, game: &Game) {
        let frame = AsciiFrame::capture(game);
        tracing::info!(target: "levelgen::render", %label, "\n{frame}");
    }
}
