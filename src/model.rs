use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::io::Write;

pub fn log(message: String) {
    let _ = std::fs::create_dir("data");

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open("data/log.txt")
        .unwrap();

    writeln!(file, "{}", message).unwrap();
}

fn field_as_str(value: &serde_json::Value, field: &str) -> Result<String, String> {
    match value[field].as_str() {
        Some(s) => Ok(s.to_string()),
        None => Err(format!("No {field}")),
    }
}

fn field_as_u64(value: &serde_json::Value, field: &str) -> Result<u64, String> {
    match value[field].as_u64() {
        Some(n) => Ok(n),
        None => Err(format!("No {field}")),
    }
}

fn field_as_i64(value: &serde_json::Value, field: &str) -> Result<i64, String> {
    match value[field].as_i64() {
        Some(n) => Ok(n),
        None => Err(format!("No {field}")),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub season: u16,
    pub week: u8,
    pub eid: String,
    pub home: String,
    pub away: String,
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl Schedule {
    pub fn from_eid_and_teams(eid: &str, season: u16, week: u8, home: &str, away: &str) -> Result<Self, String> {
        // eids look like 2013090500: date plus a disambiguating suffix
        if eid.len() < 8 {
            return Err(format!("Bad eid: {eid}"));
        }

        let year = eid[0..4].parse().map_err(|_| format!("Bad eid year: {eid}"))?;
        let month = eid[4..6].parse().map_err(|_| format!("Bad eid month: {eid}"))?;
        let day = eid[6..8].parse().map_err(|_| format!("Bad eid day: {eid}"))?;

        Ok(Self {
            season,
            week,
            eid: eid.to_string(),
            home: home.to_string(),
            away: away.to_string(),
            year,
            month,
            day,
        })
    }
}

/// One game row of the weekly scorestrip feed.
#[derive(Debug, Deserialize)]
pub struct ScheduledGame {
    pub eid: String,
    #[serde(rename = "h")]
    pub home: String,
    #[serde(rename = "v")]
    pub away: String,
}

#[derive(Debug, Deserialize)]
struct ScoreStripGames {
    #[serde(rename = "g", default)]
    games: Vec<ScheduledGame>,
}

#[derive(Debug, Deserialize)]
struct ScoreStrip {
    gms: ScoreStripGames,
}

impl ScheduledGame {
    pub async fn week_schedule(season: u16, week: u8) -> Result<Vec<Self>, String> {
        let url = format!("http://www.nfl.com/ajax/scorestrip?season={season}&seasonType=REG&week={week}");
        log(format!("[ScheduledGame::week_schedule] Getting schedule: {url}"));
        let response = reqwest::get(&url).await
            .map_err(|e| format!("Failed to get schedule: {}", e))?;
        let xml = response.text().await
            .map_err(|e| format!("Failed to read schedule: {}", e))?;

        let strip = serde_xml_rs::from_str::<ScoreStrip>(&xml)
            .map_err(|e| format!("Failed to parse schedule: {}", e))?;

        Ok(strip.gms.games)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GameClock {
    pub qtr: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl GameClock {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, String> {
        let qtr = field_as_u64(value, "qtr")? as u8;
        let time = field_as_str(value, "time")?;
        let (minutes, seconds) = parse_clock(&time)?;

        Ok(Self { qtr, minutes, seconds })
    }
}

fn parse_clock(time: &str) -> Result<(u8, u8), String> {
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("Bad clock: {time}"));
    }

    let minutes = parts[0].trim().parse().map_err(|_| format!("Bad clock: {time}"))?;
    let seconds = parts[1].trim().parse().map_err(|_| format!("Bad clock: {time}"))?;

    Ok((minutes, seconds))
}

/// Elapsed time of possession, "MM:SS" in the feed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PossessionTime {
    pub minutes: u8,
    pub seconds: u8,
}

impl PossessionTime {
    pub fn from_str(time: &str) -> Result<Self, String> {
        let (minutes, seconds) = parse_clock(time)?;
        Ok(Self { minutes, seconds })
    }

    pub fn total_seconds(&self) -> u32 {
        self.minutes as u32 * 60 + self.seconds as u32
    }
}

/// A spot on the field as a signed offset from midfield, negative in the
/// possessing team's own territory. "NE 20" with NE in possession is -30,
/// "50" is 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FieldPosition {
    pub offset: i16,
}

impl FieldPosition {
    pub fn from_spot(pos_team: &str, spot: &str) -> Result<Self, String> {
        let parts: Vec<&str> = spot.split_whitespace().collect();

        let (territory, yard) = match parts.len() {
            1 => (pos_team, parts[0]),
            2 => (parts[0], parts[1]),
            _ => return Err(format!("Bad field spot: {spot}")),
        };
        let yard = yard.parse::<i16>().map_err(|_| format!("Bad field spot: {spot}"))?;

        let absolute = if territory == pos_team { yard } else { 100 - yard };

        Ok(Self { offset: absolute - 50 })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamStats {
    pub first_downs: u16,
    pub total_yds: i32,
    pub passing_yds: i32,
    pub rushing_yds: i32,
    pub penalty_cnt: u16,
    pub penalty_yds: i32,
    pub turnovers: u16,
    pub punt_cnt: u16,
    pub punt_yds: i32,
    pub punt_avg: i32,
    pub pos_time: PossessionTime,
}

impl TeamStats {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, String> {
        let pos_time = PossessionTime::from_str(&field_as_str(value, "top")?)?;

        Ok(Self {
            first_downs: field_as_u64(value, "totfd")? as u16,
            total_yds: field_as_i64(value, "totyds")? as i32,
            passing_yds: field_as_i64(value, "pyds")? as i32,
            rushing_yds: field_as_i64(value, "ryds")? as i32,
            penalty_cnt: field_as_u64(value, "pen")? as u16,
            penalty_yds: field_as_i64(value, "penyds")? as i32,
            turnovers: field_as_u64(value, "trnovr")? as u16,
            punt_cnt: field_as_u64(value, "pt")? as u16,
            punt_yds: field_as_i64(value, "ptyds")? as i32,
            punt_avg: field_as_i64(value, "ptavg")? as i32,
            pos_time,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Play {
    pub play_id: String,
    pub time: Option<GameClock>,
    pub yardline: Option<FieldPosition>,
    pub down: u8,
    pub yards_togo: u16,
    pub yards_net: i16,
    pub scoring_play: bool,
    pub description: String,
}

impl Play {
    pub fn from_value(play_id: &str, pos_team: &str, value: &serde_json::Value) -> Result<Self, String> {
        let time = match value["time"].as_str() {
            Some("") | None => None,
            Some(_) => Some(GameClock::from_value(value)?),
        };
        let yardline = match value["yrdln"].as_str() {
            Some("") | None => None,
            Some(spot) => Some(FieldPosition::from_spot(pos_team, spot)?),
        };

        Ok(Self {
            play_id: play_id.to_string(),
            time,
            yardline,
            down: field_as_u64(value, "down")? as u8,
            yards_togo: field_as_u64(value, "ydstogo")? as u16,
            yards_net: field_as_i64(value, "ydsnet")? as i16,
            scoring_play: value["sp"].as_u64().unwrap_or(0) != 0,
            description: field_as_str(value, "desc")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drive {
    pub drive_num: u16,
    pub pos_team: String,
    pub time_start: GameClock,
    pub time_end: GameClock,
    pub field_start: Option<FieldPosition>,
    pub field_end: Option<FieldPosition>,
    pub pos_time: PossessionTime,
    pub play_cnt: u16,
    pub yards_gained: i16,
    pub result: String,
    pub plays: Vec<Play>,
}

impl Drive {
    pub fn from_value(drive_num: u16, value: &serde_json::Value) -> Result<Self, String> {
        let pos_team = field_as_str(value, "posteam")?;

        let time_start = GameClock::from_value(&value["start"])?;
        let time_end = GameClock::from_value(&value["end"])?;
        let field_start = match value["start"]["yrdln"].as_str() {
            Some("") | None => None,
            Some(spot) => Some(FieldPosition::from_spot(&pos_team, spot)?),
        };
        let field_end = match value["end"]["yrdln"].as_str() {
            Some("") | None => None,
            Some(spot) => Some(FieldPosition::from_spot(&pos_team, spot)?),
        };

        let plays_data = match value["plays"].as_object() {
            Some(plays_data) => plays_data,
            None => return Err("No plays".to_string()),
        };

        // play ids are numeric strings; object order is not chronological
        let mut play_ids: Vec<u64> = Vec::new();
        for play_id in plays_data.keys() {
            let id = play_id.parse().map_err(|_| format!("Bad play id: {play_id}"))?;
            play_ids.push(id);
        }
        play_ids.sort_unstable();

        let mut plays = Vec::new();
        for play_id in play_ids {
            let play_id = play_id.to_string();
            let play = Play::from_value(&play_id, &pos_team, &plays_data[&play_id])?;
            plays.push(play);
        }

        Ok(Self {
            drive_num,
            pos_team,
            time_start,
            time_end,
            field_start,
            field_end,
            pos_time: PossessionTime::from_str(&field_as_str(value, "postime")?)?,
            play_cnt: field_as_u64(value, "numplays")? as u16,
            yards_gained: field_as_i64(value, "ydsgained")? as i16,
            result: field_as_str(value, "result")?,
            plays,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreType {
    Touchdown,
    FieldGoal,
    Safety,
    Other(String),
}

impl ScoreType {
    pub fn from_feed(raw: &str) -> Self {
        match raw {
            "TD" => ScoreType::Touchdown,
            "FG" => ScoreType::FieldGoal,
            "SAF" => ScoreType::Safety,
            _ => ScoreType::Other(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSummaryEntry {
    pub team: String,
    pub score_type: ScoreType,
    pub qtr: u8,
    pub description: String,
}

impl ScoringSummaryEntry {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, String> {
        Ok(Self {
            team: field_as_str(value, "team")?,
            score_type: ScoreType::from_feed(&field_as_str(value, "type")?),
            qtr: field_as_u64(value, "qtr")? as u8,
            description: field_as_str(value, "desc")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub schedule: Schedule,
    pub score_home: u16,
    pub score_away: u16,
    pub quarter_scores_home: [u16; 5],
    pub quarter_scores_away: [u16; 5],
    pub stats_home: TeamStats,
    pub stats_away: TeamStats,
    pub drives: Vec<Drive>,
    pub scoring_summary: HashMap<String, ScoringSummaryEntry>,
}

fn quarter_scores(value: &serde_json::Value) -> Result<[u16; 5], String> {
    let mut scores = [0u16; 5];
    for (i, slot) in ["1", "2", "3", "4", "5"].into_iter().enumerate() {
        scores[i] = field_as_u64(&value["score"], slot)? as u16;
    }

    Ok(scores)
}

impl Game {
    pub async fn from_eid(eid: &str, season: u16, week: u8) -> Result<Self, String> {
        let url = format!("http://www.nfl.com/liveupdate/game-center/{eid}/{eid}_gtd.json");
        log(format!("[Game::from_eid] Getting game: {url}"));
        let response = reqwest::get(&url).await
            .map_err(|e| format!("Failed to get game: {}", e))?;
        let game_data = response.json::<serde_json::Value>().await
            .map_err(|e| format!("Failed to read game: {}", e))?;

        Game::from_value(&game_data[eid], eid, season, week)
    }

    pub fn from_value(value: &serde_json::Value, eid: &str, season: u16, week: u8) -> Result<Self, String> {
        let phase = field_as_str(value, "qtr")?;
        if phase != "Final" && phase != "final overtime" {
            return Err("Game is not final".to_string());
        }

        let home = field_as_str(&value["home"], "abbr")?;
        let away = field_as_str(&value["away"], "abbr")?;
        let schedule = Schedule::from_eid_and_teams(eid, season, week, &home, &away)?;

        let score_home = field_as_u64(&value["home"]["score"], "T")? as u16;
        let score_away = field_as_u64(&value["away"]["score"], "T")? as u16;

        let drives_data = match value["drives"].as_object() {
            Some(drives_data) => drives_data,
            None => return Err("No drives".to_string()),
        };

        // drives are keyed "1", "2", ... plus a "crntdrv" counter
        let mut drive_nums: Vec<u16> = Vec::new();
        for key in drives_data.keys() {
            if key == "crntdrv" {
                continue;
            }
            let num = key.parse().map_err(|_| format!("Bad drive key: {key}"))?;
            drive_nums.push(num);
        }
        drive_nums.sort_unstable();

        let mut drives = Vec::new();
        for drive_num in drive_nums {
            let d = Drive::from_value(drive_num, &drives_data[&drive_num.to_string()])?;
            drives.push(d);
        }

        let mut scoring_summary = HashMap::new();
        if let Some(summary_data) = value["scrsummary"].as_object() {
            for (play_id, entry) in summary_data {
                let entry = ScoringSummaryEntry::from_value(entry)?;
                scoring_summary.insert(play_id.clone(), entry);
            }
        }

        Ok(Self {
            schedule,
            score_home,
            score_away,
            quarter_scores_home: quarter_scores(&value["home"])?,
            quarter_scores_away: quarter_scores(&value["away"])?,
            stats_home: TeamStats::from_value(&value["home"]["stats"]["team"])?,
            stats_away: TeamStats::from_value(&value["away"]["stats"]["team"])?,
            drives,
            scoring_summary,
        })
    }

    pub fn save(&self) -> Result<(), String> {
        let dir = format!("data/{}/{}", self.schedule.season, self.schedule.week);
        std::fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create directories: {}", e))?;

        let file_path = format!("{}/{}.json", dir, self.schedule.eid);

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize game: {}", e))?;
        std::fs::write(&file_path, json)
            .map_err(|e| format!("Failed to write game to file: {}", e))?;

        log(format!("[Game::save] Saved game to {}", file_path));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clock_parses_minutes_and_seconds() {
        let clock = GameClock::from_value(&json!({"qtr": 2, "time": "12:42"})).unwrap();
        assert_eq!(clock.qtr, 2);
        assert_eq!(clock.minutes, 12);
        assert_eq!(clock.seconds, 42);

        assert!(GameClock::from_value(&json!({"qtr": 2, "time": "1242"})).is_err());
    }

    #[test]
    fn possession_time_converts_to_seconds() {
        let top = PossessionTime::from_str("31:49").unwrap();
        assert_eq!(top.total_seconds(), 1909);
    }

    #[test]
    fn field_position_is_offset_from_midfield() {
        assert_eq!(FieldPosition::from_spot("NE", "NE 20").unwrap().offset, -30);
        assert_eq!(FieldPosition::from_spot("NE", "NYJ 20").unwrap().offset, 30);
        assert_eq!(FieldPosition::from_spot("NE", "50").unwrap().offset, 0);
    }

    #[test]
    fn score_type_maps_feed_strings() {
        assert_eq!(ScoreType::from_feed("TD"), ScoreType::Touchdown);
        assert_eq!(ScoreType::from_feed("FG"), ScoreType::FieldGoal);
        assert_eq!(ScoreType::from_feed("SAF"), ScoreType::Safety);
        assert_eq!(ScoreType::from_feed("2PC"), ScoreType::Other("2PC".to_string()));
    }

    #[test]
    fn drive_orders_plays_numerically() {
        let drive = Drive::from_value(1, &json!({
            "posteam": "NE",
            "postime": "2:10",
            "numplays": 3,
            "ydsgained": 15,
            "result": "Punt",
            "start": {"qtr": 1, "time": "15:00", "yrdln": "NE 20"},
            "end": {"qtr": 1, "time": "12:50", "yrdln": "NE 35"},
            "plays": {
                "102": {"qtr": 1, "time": "14:20", "yrdln": "NE 25", "down": 2, "ydstogo": 5, "ydsnet": 10, "sp": 0, "desc": "second"},
                "98": {"qtr": 1, "time": "15:00", "yrdln": "NE 20", "down": 1, "ydstogo": 10, "ydsnet": 5, "sp": 0, "desc": "first"},
                "110": {"qtr": 1, "time": "13:40", "yrdln": "NE 35", "down": 3, "ydstogo": 1, "ydsnet": 15, "sp": 0, "desc": "third"},
            },
        })).unwrap();

        let ids: Vec<&str> = drive.plays.iter().map(|p| p.play_id.as_str()).collect();
        assert_eq!(ids, vec!["98", "102", "110"]);
        assert_eq!(drive.plays[0].description, "first");
        assert_eq!(drive.field_start.unwrap().offset, -30);
    }

    #[test]
    fn game_requires_final_state() {
        let err = Game::from_value(&json!({"qtr": "3"}), "2013090500", 2013, 1);
        assert_eq!(err.unwrap_err(), "Game is not final".to_string());
    }

    #[test]
    fn schedule_decodes_date_from_eid() {
        let schedule = Schedule::from_eid_and_teams("2013090500", 2013, 1, "DEN", "BAL").unwrap();
        assert_eq!(schedule.year, 2013);
        assert_eq!(schedule.month, 9);
        assert_eq!(schedule.day, 5);

        assert!(Schedule::from_eid_and_teams("2013", 2013, 1, "DEN", "BAL").is_err());
    }
}
