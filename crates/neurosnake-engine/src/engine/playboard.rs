use std::collections::VecDeque;

use rand::{Rng, seq::IndexedRandom as _};
use rand_pcg::Pcg32;

use crate::{
    LayoutError,
    core::{Cell, Direction, Grid, Position},
};

use super::{BoardSeed, SnakeStats};

/// Board size and the rule that ends aimless runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentConfig {
    pub rows: usize,
    pub cols: usize,
    /// Maximum number of steps without eating before the snake is killed.
    ///
    /// Never lower than `rows * cols - 1` unless [`Self::strict_wander`] is set,
    /// in which case exactly `rows * cols - 1` is used.
    pub wander_threshold: usize,
    pub strict_wander: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            rows: 10,
            cols: 10,
            wander_threshold: 150,
            strict_wander: false,
        }
    }
}

impl EnvironmentConfig {
    /// Length of a freshly spawned snake.
    pub const INITIAL_SNAKE_LEN: usize = 1;

    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Number of steps since the last apple after which the snake dies.
    ///
    /// # Example
    ///
    /// ```
    /// use neurosnake_engine::EnvironmentConfig;
    ///
    /// let mut config = EnvironmentConfig::default();
    /// assert_eq!(config.stuck_threshold(), 150);
    ///
    /// config.wander_threshold = 10;
    /// assert_eq!(config.stuck_threshold(), 99);
    ///
    /// config.wander_threshold = 500;
    /// config.strict_wander = true;
    /// assert_eq!(config.stuck_threshold(), 99);
    /// ```
    #[must_use]
    pub const fn stuck_threshold(&self) -> usize {
        let strict = self.cell_count().saturating_sub(Self::INITIAL_SNAKE_LEN);
        if self.strict_wander || self.wander_threshold < strict {
            strict
        } else {
            self.wander_threshold
        }
    }
}

/// Why a snake stopped moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum DeathReason {
    #[display("Snake hit the wall.")]
    Wall,
    #[display("Snake bit itself.")]
    SelfCollision,
    #[display("Snake wandered without eating.")]
    Wander,
    /// The snake fills the whole board.
    #[display("Perfect snake, R.I.P.")]
    Perfect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SnakeState {
    Alive,
    Frozen,
    Dead(DeathReason),
}

/// Result of a single [`Playboard::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum StepOutcome {
    /// The head moved onto an empty cell and the tail followed.
    Moved,
    /// The head moved onto the apple; the snake grew by one cell.
    Ate,
    /// The move was fatal.
    Died(DeathReason),
    /// The snake was not alive, nothing happened.
    Idle,
}

/// A single snake on its own board.
///
/// The playboard owns the grid, the snake body (head at the front) and the
/// apple. The grid always mirrors the body and apple fields: body cells are
/// [`Cell::Snake`], the apple cell is [`Cell::Apple`], everything else is empty.
///
/// # Invariants
///
/// - The body is never empty and contains no duplicate cells
/// - The apple never overlaps the body
/// - While the snake is alive and an empty cell exists, exactly one apple is on the board
#[derive(Debug, Clone)]
pub struct Playboard {
    config: EnvironmentConfig,
    grid: Grid,
    body: VecDeque<Position>,
    apple: Option<Position>,
    direction: Direction,
    stats: SnakeStats,
    state: SnakeState,
    rng: Pcg32,
}

impl Playboard {
    /// Creates a board with a freshly spawned snake and a random seed.
    #[must_use]
    pub fn new(config: EnvironmentConfig) -> Self {
        Self::with_seed(config, rand::rng().random())
    }

    /// Creates a board with a freshly spawned snake.
    ///
    /// The snake has length one, faces a random direction and starts away from
    /// the walls; the apple is then placed on a random empty cell.
    #[must_use]
    pub fn with_seed(config: EnvironmentConfig, seed: BoardSeed) -> Self {
        let mut board = Self::empty(config, seed.rng());
        board.spawn();
        board
    }

    /// Creates a board from an explicit layout.
    ///
    /// `body` lists the snake cells head first. When `apple` is `None` an apple
    /// is placed on a random empty cell.
    pub fn from_parts<I>(
        config: EnvironmentConfig,
        body: I,
        direction: Direction,
        apple: Option<Position>,
        seed: BoardSeed,
    ) -> Result<Self, LayoutError>
    where
        I: IntoIterator<Item = Position>,
    {
        let mut board = Self::empty(config, seed.rng());
        let out_of_bounds = |position| LayoutError::OutOfBounds {
            position,
            rows: config.rows,
            cols: config.cols,
        };

        for pos in body {
            let cell = board.grid.get(pos).ok_or_else(|| out_of_bounds(pos))?;
            if cell.is_snake() {
                return Err(LayoutError::OverlappingBody(pos));
            }
            board.grid[pos] = Cell::Snake;
            board.body.push_back(pos);
        }
        if board.body.is_empty() {
            return Err(LayoutError::EmptyBody);
        }

        match apple {
            Some(apple) => {
                let cell = board.grid.get(apple).ok_or_else(|| out_of_bounds(apple))?;
                if cell.is_snake() {
                    return Err(LayoutError::AppleOnBody(apple));
                }
                board.grid[apple] = Cell::Apple;
                board.apple = Some(apple);
            }
            None => board.place_apple(),
        }
        board.direction = direction;
        Ok(board)
    }

    fn empty(config: EnvironmentConfig, rng: Pcg32) -> Self {
        Self {
            config,
            grid: Grid::new(config.rows, config.cols),
            body: VecDeque::with_capacity(config.cell_count()),
            apple: None,
            direction: Direction::Up,
            stats: SnakeStats::new(),
            state: SnakeState::Alive,
            rng,
        }
    }

    fn spawn(&mut self) {
        let row = spawn_coordinate(&mut self.rng, self.config.rows);
        let col = spawn_coordinate(&mut self.rng, self.config.cols);
        let head = Position::new(row, col);
        self.direction = self.rng.random();
        self.grid[head] = Cell::Snake;
        self.body.push_front(head);
        self.place_apple();
    }

    /// Starts over with a new snake, a new apple and zeroed counters.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.body.clear();
        self.apple = None;
        self.stats = SnakeStats::new();
        self.state = SnakeState::Alive;
        self.spawn();
    }

    #[must_use]
    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Snake cells, head first.
    pub fn body(&self) -> impl ExactSizeIterator<Item = Position> + '_ {
        self.body.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    #[must_use]
    pub fn head(&self) -> Position {
        *self.body.front().expect("snake body is never empty")
    }

    #[must_use]
    pub fn apple(&self) -> Option<Position> {
        self.apple
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Sets the direction of the next step.
    ///
    /// Reversing onto the body is allowed and is fatal on the next step for a
    /// snake longer than one cell.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    #[must_use]
    pub fn stats(&self) -> &SnakeStats {
        &self.stats
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.stats.score()
    }

    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.stats.total_steps()
    }

    #[must_use]
    pub fn state(&self) -> SnakeState {
        self.state
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state.is_alive()
    }

    pub fn pause(&mut self) {
        if self.state.is_alive() {
            self.state = SnakeState::Frozen;
        }
    }

    pub fn resume(&mut self) {
        if self.state.is_frozen() {
            self.state = SnakeState::Alive;
        }
    }

    /// Moves the head one cell in the current direction.
    pub fn step(&mut self) -> StepOutcome {
        if !self.state.is_alive() {
            return StepOutcome::Idle;
        }

        let next = self.head().step(self.direction);
        // Bounds first: cell contents are only defined inside the grid.
        let Some(cell) = self.grid.get(next) else {
            return self.die(DeathReason::Wall);
        };
        match cell {
            Cell::Snake => self.die(DeathReason::SelfCollision),
            Cell::Apple => self.eat(next),
            Cell::Empty => self.forward(next),
        }
    }

    /// Kills a living snake that went too long without eating.
    ///
    /// Returns the death reason if the rule fired.
    pub fn apply_wander_rule(&mut self) -> Option<DeathReason> {
        if self.state.is_alive() && self.stats.steps_since_eat() > self.config.stuck_threshold() {
            self.die(DeathReason::Wander);
            return Some(DeathReason::Wander);
        }
        None
    }

    fn eat(&mut self, next: Position) -> StepOutcome {
        self.stats.record_eat();
        self.apple = None;
        self.push_head(next);

        if self.body.len() == self.grid.cell_count() {
            return self.die(DeathReason::Perfect);
        }

        self.place_apple();
        StepOutcome::Ate
    }

    fn forward(&mut self, next: Position) -> StepOutcome {
        if let Some(tail) = self.body.pop_back() {
            self.grid[tail] = Cell::Empty;
        }
        self.push_head(next);
        self.stats.record_move();
        StepOutcome::Moved
    }

    fn push_head(&mut self, pos: Position) {
        self.grid[pos] = Cell::Snake;
        self.body.push_front(pos);
    }

    fn die(&mut self, reason: DeathReason) -> StepOutcome {
        self.state = SnakeState::Dead(reason);
        StepOutcome::Died(reason)
    }

    fn place_apple(&mut self) {
        let empty = self.grid.empty_positions().collect::<Vec<_>>();
        self.apple = empty.choose(&mut self.rng).copied();
        if let Some(apple) = self.apple {
            self.grid[apple] = Cell::Apple;
        }
    }
}

/// Picks a spawn coordinate at least 30% of the board away from the low edge.
#[expect(clippy::cast_possible_wrap)]
fn spawn_coordinate<R>(rng: &mut R, len: usize) -> isize
where
    R: Rng + ?Sized,
{
    let offset = len * 3 / 10;
    let high = usize::min(len - offset, len - 1);
    rng.random_range(offset..=high) as isize
}
