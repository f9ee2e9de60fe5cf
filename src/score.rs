use crate::flatten::{project_drive, project_game, project_plays, FlatRecord};
use crate::model::{log, Game, ScoreType, ScoringSummaryEntry};
use std::collections::HashMap;

/// Per-game result of checking the reconstructed final score against the
/// feed's authoritative one. Advisory: a mismatch never discards records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Ok,
    Mismatch {
        eid: String,
        expected: (u16, u16),
        reconstructed: (u16, u16),
    },
}

const KICK_GOOD: &str = "kick is good";
const FAILURE_MARKERS: [&str; 5] = ["failed,", "failed", "blocked", "missed", "aborted"];

/// Points scored after a touchdown, recovered from the free-text scoring
/// description: 1 for a good kick, 2 for a run/pass conversion clause with
/// no failure marker, else 0. The feed is a human-written log, so this is
/// pattern matching, not parsing.
pub fn conversion_points(description: &str) -> u8 {
    let description = description.to_ascii_lowercase();

    if description.contains(KICK_GOOD) {
        return 1;
    }

    let clause = match description.find('(') {
        Some(open) => &description[open + 1..],
        None => return 0,
    };
    let clause = match clause.find(')') {
        Some(close) => &clause[..close],
        None => clause,
    };

    let tokens: Vec<&str> = clause.split_whitespace().collect();
    if tokens.iter().any(|t| FAILURE_MARKERS.contains(t)) {
        return 0;
    }
    if tokens.iter().any(|t| *t == "run" || *t == "pass") {
        return 2;
    }

    0
}

/// Running score for one game. Built fresh per game, only ever increases,
/// thrown away after the final validation check.
#[derive(Debug)]
pub struct RunningScore {
    scores: HashMap<String, u16>,
}

impl RunningScore {
    pub fn new(home: &str, away: &str) -> Self {
        let mut scores = HashMap::new();
        scores.insert(home.to_string(), 0);
        scores.insert(away.to_string(), 0);

        Self { scores }
    }

    pub fn get(&self, team: &str) -> u16 {
        self.scores.get(team).copied().unwrap_or(0)
    }

    fn credit(&mut self, team: &str, points: u16) -> bool {
        match self.scores.get_mut(team) {
            Some(score) => {
                *score += points;
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, eid: &str, play_id: &str, entry: &ScoringSummaryEntry) {
        let points = match &entry.score_type {
            ScoreType::Touchdown => 6 + conversion_points(&entry.description) as u16,
            ScoreType::FieldGoal => 3,
            // safeties are credited to the team the summary names, which is
            // the defense relative to the drive's possessing team
            ScoreType::Safety => 2,
            ScoreType::Other(raw) => {
                log(format!("[RunningScore::apply] Unrecognized score type {raw} on play {play_id} of game {eid}"));
                return;
            }
        };

        if !self.credit(&entry.team, points) {
            log(format!("[RunningScore::apply] Unknown scoring team {} on play {play_id} of game {eid}", entry.team));
        }
    }
}

/// Walk a game's plays in chronological order, fold the scoring summary into
/// a running score, and emit one merged game + drive + play record per play
/// with the offense/defense score as of that play. A scoring play's record
/// already shows its own new total.
pub fn reconstruct(game: &Game) -> (Vec<FlatRecord>, Validation) {
    let game_record = project_game(game);
    let mut score = RunningScore::new(&game.schedule.home, &game.schedule.away);

    let mut records = Vec::new();
    for drive in &game.drives {
        let drive_record = project_drive(drive);
        let defense_team = if drive.pos_team == game.schedule.home {
            &game.schedule.away
        } else {
            &game.schedule.home
        };

        for (play, play_record) in drive.plays.iter().zip(project_plays(drive)) {
            if let Some(entry) = game.scoring_summary.get(&play.play_id) {
                score.apply(&game.schedule.eid, &play.play_id, entry);
            }

            let mut record = game_record.clone();
            record.merge(&drive_record);
            record.merge(&play_record);
            record.push_int("score_offense", score.get(&drive.pos_team) as i64);
            record.push_int("score_defense", score.get(defense_team) as i64);
            records.push(record);
        }
    }

    let reconstructed = (score.get(&game.schedule.home), score.get(&game.schedule.away));
    let expected = (game.score_home, game.score_away);
    let validation = if reconstructed == expected {
        Validation::Ok
    } else {
        log(format!(
            "[reconstruct] Score mismatch for game {}: expected {:?}, reconstructed {:?}",
            game.schedule.eid, expected, reconstructed,
        ));
        Validation::Mismatch {
            eid: game.schedule.eid.clone(),
            expected,
            reconstructed,
        }
    };

    (records, validation)
}
