use std::collections::VecDeque;

/// Rolling window over the most recent episode scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreWindow {
    capacity: usize,
    scores: VecDeque<f32>,
}

impl ScoreWindow {
    pub const DEFAULT_CAPACITY: usize = 100;

    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            scores: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, score: f32) {
        if self.capacity == 0 {
            return;
        }
        if self.scores.len() == self.capacity {
            self.scores.pop_front();
        }
        self.scores.push_back(score);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    #[must_use]
    pub fn sum(&self) -> f32 {
        self.scores.iter().sum()
    }

    /// Mean of the window, `0` while empty.
    #[must_use]
    pub fn mean(&self) -> f32 {
        if self.scores.is_empty() {
            return 0.0;
        }
        #[expect(clippy::cast_precision_loss)]
        let len = self.scores.len() as f32;
        self.sum() / len
    }
}

impl Default for ScoreWindow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// Per-episode scores of the four agents.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageScores {
    pub walls: f32,
    pub enemy: f32,
    pub item: f32,
    /// Wall solver and final solver runs combined.
    pub solver: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreWindows {
    pub walls: ScoreWindow,
    pub enemy: ScoreWindow,
    pub item: ScoreWindow,
    pub solver: ScoreWindow,
}

impl ScoreWindows {
    pub fn push(&mut self, scores: &StageScores) {
        self.walls.push(scores.walls);
        self.enemy.push(scores.enemy);
        self.item.push(scores.item);
        self.solver.push(scores.solver);
    }

    #[must_use]
    pub fn means(&self) -> StageScores {
        StageScores {
            walls: self.walls.mean(),
            enemy: self.enemy.mean(),
            item: self.item.mean(),
            solver: self.solver.mean(),
        }
    }

    /// Mean over the pooled scores of all four windows.
    #[must_use]
    pub fn overall_mean(&self) -> f32 {
        let windows = [&self.walls, &self.enemy, &self.item, &self.solver];
        let count: usize = windows.into_iter().map(ScoreWindow::len).sum();
        if count == 0 {
            return 0.0;
        }
        #[expect(clippy::cast_precision_loss)]
        let count = count as f32;
        windows.into_iter().map(ScoreWindow::sum).sum::<f32>() / count
    }
}
