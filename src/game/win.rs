use super::player::{Alignment, Player};

/// Checks the living players for a winning side.
///
/// The village wins once no wolves remain. Otherwise the wolves win as soon as
/// they are at least as many as the villagers.
pub fn check_win(players: &[Player]) -> Option<Alignment> {
    let wolves = players.iter().filter(|p| p.alive && p.alignment() == Alignment::Wolf).count();
    let village = players.iter().filter(|p| p.alive && p.alignment() == Alignment::Village).count();
    if wolves == 0 {
        Some(Alignment::Village)
    } else if wolves >= village {
        Some(Alignment::Wolf)
    } else {
        None
    }
}
