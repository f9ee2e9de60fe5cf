use futures::future::join_all;
use glob::glob;
use indicatif::{ProgressIterator, ProgressStyle};

mod csv;
mod flatten;
mod model;
mod score;

use score::Validation;

const REGULAR_SEASON_WEEKS: [u8; 17] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17];

/// Remove the completed week from the list of weeks to be processed in the given season.
fn save_progress(season: u16, completed_week: u8) {
    let mut progress = serde_json::from_str::<serde_json::Value>(std::fs::read_to_string("data/progress.json").unwrap_or("{}".to_string()).as_str()).unwrap();

    if progress.get(&season.to_string()).is_none() {
        progress[season.to_string()] = serde_json::Value::Array(REGULAR_SEASON_WEEKS.iter().map(|w| serde_json::Value::Number(serde_json::Number::from(*w))).collect());
    }

    let progress_season = progress.get_mut(&season.to_string()).unwrap().as_array_mut().unwrap();
    progress_season.retain(|w| w.as_u64().unwrap() != completed_week as u64);

    let _ = std::fs::create_dir("data");
    std::fs::write("data/progress.json", serde_json::to_string_pretty(&progress).unwrap()).unwrap();
}

/// Get all game eids already cached for a given week.
fn cached_eids_for_week(season: u16, week: u8) -> Vec<String> {
    let cached = glob(format!("data/{season}/{week}/*.json").as_str()).unwrap();

    let mut eids = Vec::new();
    for game_path in cached {
        let game_path = game_path.unwrap();
        if let Some(stem) = game_path.file_stem() {
            eids.push(stem.to_string_lossy().to_string());
        }
    }

    eids
}

async fn get_week(season: u16, week: u8) {
    let schedule = match model::ScheduledGame::week_schedule(season, week).await {
        Ok(schedule) => schedule,
        Err(e) => {
            model::log(format!("[get_week] Error: {}", e));
            return;
        }
    };

    let cached = cached_eids_for_week(season, week);
    let wanted: Vec<&model::ScheduledGame> = schedule
        .iter()
        .filter(|g| !cached.contains(&g.eid))
        .collect();

    // one independent task per game, no state shared between them
    let games = join_all(
        wanted.iter().map(|g| model::Game::from_eid(&g.eid, season, week))
    ).await;

    for game in games {
        match game {
            Ok(game) => {
                if let Err(e) = game.save() {
                    model::log(format!("[get_week] Error: {}", e));
                }
            },
            Err(e) => model::log(format!("[get_week] Error: {}", e)),
        };
    }
}

fn flatten_season(season: u16) {
    let all_games = glob(format!("data/{season}/**/*.json").as_str()).unwrap();
    let all_games: Vec<_> = all_games.collect();

    let mut records = Vec::new();
    let mut mismatches = Vec::new();
    let mut total = 0usize;

    let progress_style = ProgressStyle::default_bar().template("{wide_bar} {pos}/{len} | elapsed: {elapsed_precise}, eta: {eta_precise}").unwrap();
    for game_path in all_games.iter().progress_with_style(progress_style) {
        let game_path = game_path.as_ref().unwrap();
        let game = match serde_json::from_str::<model::Game>(&std::fs::read_to_string(game_path).unwrap()) {
            Ok(game) => game,
            Err(e) => {
                model::log(format!("[flatten_season] Skipping {}: {}", game_path.display(), e));
                continue;
            }
        };

        total += 1;
        let (game_records, validation) = score::reconstruct(&game);
        records.extend(game_records);
        if let Validation::Mismatch { .. } = &validation {
            mismatches.push(validation);
        }
    }

    for mismatch in &mismatches {
        if let Validation::Mismatch { eid, expected, reconstructed } = mismatch {
            println!("Score mismatch for game {}: expected {:?}, reconstructed {:?}", eid, expected, reconstructed);
        }
    }
    println!("Flattened {} plays from {} games ({} mismatched)", records.len(), total, mismatches.len());

    std::fs::create_dir_all("flat_data").unwrap();
    let file = std::fs::File::create(format!("flat_data/{season}.csv")).unwrap();
    let mut writer = std::io::BufWriter::new(file);
    csv::write_records(&mut writer, &records).unwrap();
}

#[tokio::main]
async fn main() {
    match std::env::args().nth(1) {
        Some(command) => match command.as_str() {
            "get" => {
                let season = std::env::args().nth(2).unwrap().parse::<u16>().unwrap();

                let weeks = match std::env::args().nth(3) {
                    Some(week) => vec![week.parse::<u8>().unwrap()],
                    None => {
                        let progress = serde_json::from_str::<serde_json::Value>(std::fs::read_to_string("data/progress.json").unwrap_or("{}".to_string()).as_str()).unwrap();
                        match progress.get(&season.to_string()) {
                            Some(progress_season) => progress_season.as_array().unwrap().iter().map(|w| w.as_u64().unwrap() as u8).collect(),
                            None => REGULAR_SEASON_WEEKS.to_vec(),
                        }
                    },
                };
                println!("Processing season {} for {} weeks ({:?})", season, weeks.len(), weeks);

                let progress_style = ProgressStyle::default_bar().template("{wide_bar} {pos}/{len} | elapsed: {elapsed_precise}, eta: {eta_precise}").unwrap();
                for week in weeks.iter().progress_with_style(progress_style) {
                    get_week(season, *week).await;
                    save_progress(season, *week);
                }
            },
            "getone" => {
                let eid = std::env::args().nth(2).unwrap();
                let season = std::env::args().nth(3).unwrap().parse::<u16>().unwrap();
                let week = std::env::args().nth(4).unwrap().parse::<u8>().unwrap();

                match model::Game::from_eid(&eid, season, week).await {
                    Ok(game) => game.save().unwrap(),
                    Err(e) => eprintln!("Error: {}", e),
                };
            },
            "flatten" => {
                let season = std::env::args().nth(2).unwrap().parse::<u16>().unwrap();
                flatten_season(season);
            },
            _ => eprintln!("Unknown command."),
        },
        None => eprintln!("Please provide a command."),
    }
}
