/// Score and step counters of a single snake.
///
/// - **Score**: Number of apples eaten
/// - **Total steps**: Every successful move, eating moves included
/// - **Eat step**: Value of `total_steps` right after the last apple
///
/// A collision does not count as a step.
///
/// # Example
///
/// ```
/// use neurosnake_engine::SnakeStats;
///
/// let mut stats = SnakeStats::new();
/// stats.record_move();
/// stats.record_move();
/// stats.record_eat();
/// stats.record_move();
///
/// assert_eq!(stats.score(), 1);
/// assert_eq!(stats.total_steps(), 4);
/// assert_eq!(stats.steps_since_eat(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnakeStats {
    score: usize,
    total_steps: usize,
    eat_step: usize,
}

impl SnakeStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            total_steps: 0,
            eat_step: 0,
        }
    }

    #[must_use]
    pub const fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub const fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Returns the step count recorded at the last apple.
    #[must_use]
    pub const fn eat_step(&self) -> usize {
        self.eat_step
    }

    #[must_use]
    pub const fn steps_since_eat(&self) -> usize {
        self.total_steps - self.eat_step
    }

    /// Records a plain move onto an empty cell.
    pub const fn record_move(&mut self) {
        self.total_steps += 1;
    }

    /// Records a move onto the apple.
    pub const fn record_eat(&mut self) {
        self.score += 1;
        self.total_steps += 1;
        self.eat_step = self.total_steps;
    }
}
