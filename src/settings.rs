use std::time::Duration;

/// all tunable knobs of a table, provided by whoever boots the game.
/// the defaults describe the classic layout: a 3x4 grid dealt from a
/// deck of 81 cards, sets of 3, one minute per round.
#[derive(Debug, Clone)]
pub struct Settings {
    /// number of slots on the table grid
    pub table_size: usize,
    /// number of distinct cards in the deck
    pub deck_size: usize,
    /// number of cards in a valid set, and the token budget per player
    pub feature_size: usize,
    /// seats driven by an external input source
    pub humans: usize,
    /// seats driven by an autonomous generator thread
    pub cpus: usize,
    /// duration of one round before the table is reshuffled
    pub turn_timeout: Duration,
    /// remaining time at which the countdown switches to warning mode
    pub turn_warning: Duration,
    /// pause imposed on a player after a scored set
    pub point_freeze: Duration,
    /// pause imposed on a player after a rejected claim
    pub penalty_freeze: Duration,
    /// artificial delay per card placement or removal
    pub deal_delay: Duration,
    /// log the sets currently on the table at round start
    pub hints: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            table_size: 12,
            deck_size: 81,
            feature_size: 3,
            humans: 0,
            cpus: 2,
            turn_timeout: Duration::from_secs(60),
            turn_warning: Duration::from_secs(5),
            point_freeze: Duration::from_secs(1),
            penalty_freeze: Duration::from_secs(3),
            deal_delay: Duration::from_millis(100),
            hints: false,
        }
    }
}

impl Settings {
    /// total number of seats at the table
    pub fn players(&self) -> usize {
        self.humans + self.cpus
    }
}
