/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and log output.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Jumped,
    DoubleJumped,
    BlockBumped { solid: usize },
    QuestionOpened { solid: usize },
    EnemyStomped { enemy: usize },
    /// Carries the score after the pickup.
    CoinCollected { score: u32 },
    /// Squash window over; the enemy is gone from the level.
    EnemyRemoved,
    /// Non-lethal hit. Carries the health left.
    PlayerHurt { health: u32 },
    PlayerKilled,
    TimeUp,
    GoalReached,
}
