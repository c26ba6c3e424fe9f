//! Runnable table: computer players racing for sets, optional human
//! seat on stdin. Type a slot number to probe it, `Q` to stop the game.

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use setroom::CardId;
use setroom::PlayerId;
use setroom::Score;
use setroom::Slot;
use setroom::game::Dealer;
use setroom::interface::Rules;
use setroom::interface::Screen;
use setroom::settings::Settings;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(about = "run a Set table")]
struct Args {
    /// seats fed from stdin
    #[arg(long, default_value_t = 0)]
    humans: usize,
    /// autonomous seats
    #[arg(long, default_value_t = 2)]
    cpus: usize,
    /// round length in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,
    /// log the sets on the table each round
    #[arg(long, default_value_t = false)]
    hints: bool,
}

impl From<&Args> for Settings {
    fn from(args: &Args) -> Self {
        Self {
            humans: args.humans,
            cpus: args.cpus,
            turn_timeout: Duration::from_secs(args.timeout),
            hints: args.hints,
            ..Self::default()
        }
    }
}

/// the classic rules: 81 cards, 4 features of 3 values each, read off
/// the card id as base-3 digits. three cards make a set when every
/// feature is all-same or all-different, i.e. sums to 0 mod 3.
struct Classic;

impl Classic {
    fn feature(card: CardId, i: u32) -> usize {
        card / 3usize.pow(i) % 3
    }
}

impl Rules for Classic {
    fn is_valid_set(&self, cards: &[CardId]) -> bool {
        cards.len() == 3
            && (0..4).all(|i| cards.iter().map(|c| Self::feature(*c, i)).sum::<usize>() % 3 == 0)
    }

    fn find_sets(&self, cards: &[CardId], limit: usize) -> Vec<Vec<CardId>> {
        let mut sets = Vec::new();
        for a in 0..cards.len() {
            for b in a + 1..cards.len() {
                for c in b + 1..cards.len() {
                    if sets.len() >= limit {
                        return sets;
                    }
                    let candidate = vec![cards[a], cards[b], cards[c]];
                    if self.is_valid_set(&candidate) {
                        sets.push(candidate);
                    }
                }
            }
        }
        sets
    }
}

/// prints the table action; the countdown stays quiet except inside
/// the warning window
struct Shell;

impl Screen for Shell {
    fn place_card(&self, card: CardId, slot: Slot) {
        println!("  slot {:>2} {} card {}", slot, "<-".green(), card);
    }
    fn remove_card(&self, slot: Slot) {
        println!("  slot {:>2} cleared", slot);
    }
    fn place_token(&self, player: PlayerId, slot: Slot) {
        println!("  player {} marks slot {}", player, slot);
    }
    fn remove_token(&self, player: PlayerId, slot: Slot) {
        println!("  player {} unmarks slot {}", player, slot);
    }
    fn countdown(&self, remaining: Duration, warn: bool) {
        if warn {
            println!("{}", format!("  {:>4}ms left", remaining.as_millis()).red());
        }
    }
    fn score(&self, player: PlayerId, score: Score) {
        println!(
            "{}",
            format!("player {} scores a point, total {}", player, score).bold()
        );
    }
    fn winners(&self, players: &[PlayerId]) {
        println!("{}", format!("winners: {:?}", players).bold().yellow());
    }
}

fn main() -> anyhow::Result<()> {
    setroom::log();
    let args = Args::parse();
    let settings = Settings::from(&args);
    let slots = settings.table_size;
    let dealer = Dealer::new(settings, Arc::new(Classic), Arc::new(Shell));
    let human = dealer.seats().iter().take(args.humans).next().cloned();
    let switch = dealer.switch();
    std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            loop {
                let ref mut buffer = String::new();
                if std::io::stdin().read_line(buffer).is_err() {
                    continue;
                }
                let line = buffer.trim();
                if line.eq_ignore_ascii_case("q") {
                    log::warn!("stop requested, finishing the round");
                    switch.flip();
                    break;
                }
                if let (Ok(slot), Some(seat)) = (line.parse::<Slot>(), human.as_ref()) {
                    match slot < slots {
                        true => seat.probe(slot),
                        false => log::warn!("no slot {} on a {}-slot table", slot, slots),
                    }
                }
            }
        })
        .context("spawn stdin thread")?;
    let winners = dealer.run();
    log::info!("game over, winners {:?}", winners);
    Ok(())
}
