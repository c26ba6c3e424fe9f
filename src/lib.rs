pub mod board;
pub mod game;
pub mod interface;
pub mod settings;
pub mod sync;

/// position on the table grid
pub type Slot = usize;
/// stable card identifier, an index into the full deck
pub type CardId = usize;
/// stable player identifier, assigned at the table in seating order
pub type PlayerId = usize;
/// points scored by a player, one per adjudicated set
pub type Score = u32;

/// initialize the combined terminal + file logger.
/// call this once from a binary entrypoint, never from the library.
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Info)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
