use neurosnake_brain::snake_brain::SnakeBrain;
use neurosnake_engine::{
    BoardSeed, DeathReason, EnvironmentConfig, Playboard, SnakeState, StepOutcome,
};

use crate::fitness;

/// One member of the population: a brain playing on its own board.
#[derive(Debug, Clone)]
pub struct Agent {
    brain: SnakeBrain,
    board: Playboard,
    fitness: f64,
}

impl Agent {
    #[must_use]
    pub fn new(brain: SnakeBrain, config: EnvironmentConfig) -> Self {
        Self::with_board(brain, Playboard::new(config))
    }

    #[must_use]
    pub fn with_seed(brain: SnakeBrain, config: EnvironmentConfig, seed: BoardSeed) -> Self {
        Self::with_board(brain, Playboard::with_seed(config, seed))
    }

    #[must_use]
    pub fn with_board(brain: SnakeBrain, board: Playboard) -> Self {
        Self {
            brain,
            board,
            fitness: 0.0,
        }
    }

    /// Advances the game by one tick.
    ///
    /// The snake moves first. A surviving snake is then checked against the
    /// wander rule and finally looks around and picks the direction of the
    /// next move. A degenerate decision keeps the current direction.
    pub fn tick(&mut self) -> StepOutcome {
        let outcome = self.board.step();
        if !self.board.is_alive() {
            return outcome;
        }
        if let Some(reason) = self.board.apply_wander_rule() {
            return StepOutcome::Died(reason);
        }
        match self.brain.decide(&self.board) {
            Ok(direction) => self.board.set_direction(direction),
            Err(e) => log::warn!("{e}, keeping direction {}", self.board.direction()),
        }
        outcome
    }

    /// Plays until the snake stops and returns why it stopped.
    ///
    /// Terminates for every brain because the wander rule bounds the number of
    /// moves between apples. Returns `None` if the board was paused.
    pub fn run(&mut self) -> Option<DeathReason> {
        while self.board.is_alive() {
            self.tick();
        }
        match self.board.state() {
            SnakeState::Dead(reason) => Some(reason),
            SnakeState::Alive | SnakeState::Frozen => None,
        }
    }

    /// Computes and stores the fitness of the current game.
    pub fn evaluate(&mut self) -> f64 {
        self.fitness = fitness::fitness(self.board.score(), self.board.total_steps());
        self.fitness
    }

    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.board.score()
    }

    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.board.total_steps()
    }

    #[must_use]
    pub fn brain(&self) -> &SnakeBrain {
        &self.brain
    }

    #[must_use]
    pub fn board(&self) -> &Playboard {
        &self.board
    }
}
