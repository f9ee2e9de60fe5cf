use crate::model::{Drive, Game, Play, TeamStats};

/// One cell of the flat per-play table.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl std::fmt::Display for FlatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlatValue::Text(s) => write!(f, "{}", s),
            FlatValue::Int(n) => write!(f, "{}", n),
            FlatValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// An ordered list of key/value pairs. Keys keep insertion order so the
/// exported columns line up with the projection tables below.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    fields: Vec<(String, FlatValue)>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn push(&mut self, key: impl Into<String>, value: FlatValue) {
        self.fields.push((key.into(), value));
    }

    pub fn push_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.push(key, FlatValue::Text(value.into()));
    }

    pub fn push_int(&mut self, key: impl Into<String>, value: i64) {
        self.push(key, FlatValue::Int(value));
    }

    pub fn merge(&mut self, other: &FlatRecord) {
        self.fields.extend(other.fields.iter().cloned());
    }

    pub fn get(&self, key: &str) -> Option<&FlatValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, FlatValue)> {
        self.fields.iter()
    }
}

fn push_team_stats(record: &mut FlatRecord, side: &str, stats: &TeamStats) {
    record.push_int(format!("game_{side}_first_downs"), stats.first_downs as i64);
    record.push_int(format!("game_{side}_total_yds"), stats.total_yds as i64);
    record.push_int(format!("game_{side}_passing_yds"), stats.passing_yds as i64);
    record.push_int(format!("game_{side}_rushing_yds"), stats.rushing_yds as i64);
    record.push_int(format!("game_{side}_penalty_cnt"), stats.penalty_cnt as i64);
    record.push_int(format!("game_{side}_penalty_yds"), stats.penalty_yds as i64);
    record.push_int(format!("game_{side}_turnovers"), stats.turnovers as i64);
    record.push_int(format!("game_{side}_punt_cnt"), stats.punt_cnt as i64);
    record.push_int(format!("game_{side}_punt_yds"), stats.punt_yds as i64);
    record.push_int(format!("game_{side}_punt_avg"), stats.punt_avg as i64);
    record.push_int(format!("game_{side}_pos_time"), stats.pos_time.total_seconds() as i64);
}

/// Flatten game-level attributes into one record: schedule, winner/loser,
/// final and per-quarter scores, aggregate team stats.
pub fn project_game(game: &Game) -> FlatRecord {
    let mut record = FlatRecord::new();

    record.push_int("season", game.schedule.season as i64);
    record.push_int("week", game.schedule.week as i64);
    record.push_int("year", game.schedule.year as i64);
    record.push_int("month", game.schedule.month as i64);
    record.push_int("day", game.schedule.day as i64);
    record.push_text("home", game.schedule.home.clone());
    record.push_text("away", game.schedule.away.clone());
    record.push_text("id", game.schedule.eid.clone());

    let (winner, loser) = if game.score_home > game.score_away {
        (game.schedule.home.clone(), game.schedule.away.clone())
    } else if game.score_away > game.score_home {
        (game.schedule.away.clone(), game.schedule.home.clone())
    } else {
        let tie = format!("{}/{}", game.schedule.home, game.schedule.away);
        (tie.clone(), tie)
    };
    record.push_text("winner", winner);
    record.push_text("loser", loser);

    record.push_int("score_home", game.score_home as i64);
    record.push_int("score_away", game.score_away as i64);
    for q in 0..5 {
        record.push_int(format!("score_home_q{}", q + 1), game.quarter_scores_home[q] as i64);
        record.push_int(format!("score_away_q{}", q + 1), game.quarter_scores_away[q] as i64);
    }

    push_team_stats(&mut record, "home", &game.stats_home);
    push_team_stats(&mut record, "away", &game.stats_away);

    record
}

/// Flatten drive-level attributes, excluding the play collection. Field
/// positions project to midfield offsets; a missing spot projects to no
/// column at all rather than zero.
pub fn project_drive(drive: &Drive) -> FlatRecord {
    let mut record = FlatRecord::new();

    record.push_int("drive_drive_num", drive.drive_num as i64);
    record.push_text("drive_pos_team", drive.pos_team.clone());
    record.push_int("drive_time_start_qtr", drive.time_start.qtr as i64);
    record.push_int("drive_time_start_minutes", drive.time_start.minutes as i64);
    record.push_int("drive_time_start_seconds", drive.time_start.seconds as i64);
    record.push_int("drive_time_end_qtr", drive.time_end.qtr as i64);
    record.push_int("drive_time_end_minutes", drive.time_end.minutes as i64);
    record.push_int("drive_time_end_seconds", drive.time_end.seconds as i64);
    if let Some(field_start) = drive.field_start {
        record.push_int("drive_field_start", field_start.offset as i64);
    }
    if let Some(field_end) = drive.field_end {
        record.push_int("drive_field_end", field_end.offset as i64);
    }
    record.push_int("drive_pos_time", drive.pos_time.total_seconds() as i64);
    record.push_int("drive_play_cnt", drive.play_cnt as i64);
    record.push_int("drive_yards_gained", drive.yards_gained as i64);
    record.push_text("drive_result", drive.result.clone());

    record
}

fn project_play(play: &Play) -> FlatRecord {
    let mut record = FlatRecord::new();

    record.push_text("play_playid", play.play_id.clone());
    // the clock's quarter is redundant with the drive-level quarter
    if let Some(time) = play.time {
        record.push_int("play_minutes", time.minutes as i64);
        record.push_int("play_seconds", time.seconds as i64);
    }
    if let Some(yardline) = play.yardline {
        record.push_int("play_yardline", yardline.offset as i64);
    }
    record.push_int("play_down", play.down as i64);
    record.push_int("play_yards_togo", play.yards_togo as i64);
    record.push_int("play_yards_net", play.yards_net as i64);
    record.push("play_sp", FlatValue::Bool(play.scoring_play));
    record.push_text("play_desc", play.description.clone());

    record
}

/// One record per play, in the drive's original chronological order.
pub fn project_plays(drive: &Drive) -> impl Iterator<Item = FlatRecord> + '_ {
    drive.plays.iter().map(project_play)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Game;
    use serde_json::json;

    fn drive_value() -> serde_json::Value {
        json!({
            "posteam": "NE",
            "postime": "4:23",
            "numplays": 2,
            "ydsgained": 80,
            "result": "Touchdown",
            "start": {"qtr": 1, "time": "12:42", "yrdln": "NE 20"},
            "end": {"qtr": 1, "time": "8:19", "yrdln": ""},
            "plays": {
                "55": {"qtr": 1, "time": "12:42", "yrdln": "NE 20", "down": 1, "ydstogo": 10, "ydsnet": 0, "sp": 0, "desc": "T.Brady pass short left to J.Edelman for 12 yards."},
                "56": {"qtr": 1, "time": "12:03", "yrdln": "NE 32", "down": 1, "ydstogo": 10, "ydsnet": 12, "sp": 1, "desc": "T.Brady pass deep middle to R.Gronkowski for 68 yards, TOUCHDOWN."},
            },
        })
    }

    #[test]
    fn drive_projection_excludes_plays_and_expands_clocks() {
        let drive = Drive::from_value(3, &drive_value()).unwrap();
        let record = project_drive(&drive);

        assert_eq!(record.get("drive_pos_team"), Some(&FlatValue::Text("NE".to_string())));
        assert_eq!(record.get("drive_time_start_qtr"), Some(&FlatValue::Int(1)));
        assert_eq!(record.get("drive_time_start_minutes"), Some(&FlatValue::Int(12)));
        assert_eq!(record.get("drive_time_start_seconds"), Some(&FlatValue::Int(42)));
        assert_eq!(record.get("drive_pos_time"), Some(&FlatValue::Int(263)));
        assert_eq!(record.get("drive_field_start"), Some(&FlatValue::Int(-30)));
        // empty end spot: no column, not zero
        assert_eq!(record.get("drive_field_end"), None);
        assert!(record.iter().all(|(k, _)| !k.contains("plays")));
    }

    #[test]
    fn play_projection_drops_clock_quarter() {
        let drive = Drive::from_value(3, &drive_value()).unwrap();
        let records: Vec<FlatRecord> = project_plays(&drive).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("play_playid"), Some(&FlatValue::Text("55".to_string())));
        assert_eq!(records[0].get("play_minutes"), Some(&FlatValue::Int(12)));
        assert_eq!(records[0].get("play_seconds"), Some(&FlatValue::Int(42)));
        assert_eq!(records[0].get("play_qtr"), None);
        assert_eq!(records[0].get("play_yardline"), Some(&FlatValue::Int(-30)));
        assert_eq!(records[1].get("play_sp"), Some(&FlatValue::Bool(true)));
    }

    fn game_value() -> serde_json::Value {
        let stats = json!({
            "totfd": 20, "totyds": 396, "pyds": 251, "ryds": 145,
            "pen": 5, "penyds": 35, "trnovr": 0,
            "pt": 4, "ptyds": 166, "ptavg": 41, "top": "31:49",
        });

        json!({
            "qtr": "Final",
            "home": {
                "abbr": "NE",
                "score": {"1": 7, "2": 0, "3": 7, "4": 7, "5": 0, "T": 21},
                "stats": {"team": stats},
            },
            "away": {
                "abbr": "NYJ",
                "score": {"1": 0, "2": 7, "3": 0, "4": 7, "5": 0, "T": 14},
                "stats": {"team": stats},
            },
            "drives": {"1": drive_value(), "crntdrv": 1},
            "scrsummary": {},
        })
    }

    #[test]
    fn game_projection_has_schedule_scores_and_stats() {
        let game = Game::from_value(&game_value(), "2013091200", 2013, 2).unwrap();
        let record = project_game(&game);

        assert_eq!(record.get("id"), Some(&FlatValue::Text("2013091200".to_string())));
        assert_eq!(record.get("season"), Some(&FlatValue::Int(2013)));
        assert_eq!(record.get("week"), Some(&FlatValue::Int(2)));
        assert_eq!(record.get("winner"), Some(&FlatValue::Text("NE".to_string())));
        assert_eq!(record.get("loser"), Some(&FlatValue::Text("NYJ".to_string())));
        assert_eq!(record.get("score_home"), Some(&FlatValue::Int(21)));
        assert_eq!(record.get("score_away_q2"), Some(&FlatValue::Int(7)));
        assert_eq!(record.get("game_home_pos_time"), Some(&FlatValue::Int(1909)));
        assert_eq!(record.get("game_away_total_yds"), Some(&FlatValue::Int(396)));
    }

    #[test]
    fn tied_game_joins_team_codes() {
        let mut value = game_value();
        value["home"]["score"]["T"] = json!(14);
        let game = Game::from_value(&value, "2013091200", 2013, 2).unwrap();
        let record = project_game(&game);

        assert_eq!(record.get("winner"), Some(&FlatValue::Text("NE/NYJ".to_string())));
        assert_eq!(record.get("loser"), Some(&FlatValue::Text("NE/NYJ".to_string())));
    }
}
