//! Per-player weekly usage pulled straight from the raw play data.

use crate::{Param, Position, QueryEngine, Result};
use itertools::izip;
use serde::Serialize;

pub(crate) static PLAYERS_QUERY: &str = r#"
    SELECT DISTINCT gsis_id, full_name
    FROM nfl_rosters
    WHERE season = ? AND team = ? AND position = ? AND gsis_id IS NOT NULL
    ORDER BY full_name
"#;

pub(crate) static USAGE_QUERY: &str = r#"
    SELECT
        CAST(week AS BIGINT) AS week,
        CAST(COUNT(*) AS BIGINT) AS snaps,
        CAST(SUM(pass_attempt) AS DOUBLE) AS targets,
        CAST(SUM(rush_attempt) AS DOUBLE) AS rushes,
        CAST(SUM(CASE WHEN rush_attempt = 1 THEN yards_gained ELSE 0 END) AS DOUBLE) AS rush_yards,
        CAST(SUM(CASE WHEN complete_pass = 1 THEN yards_gained ELSE 0 END) AS DOUBLE) AS rec_yards
    FROM nfl_pbp_raw
    WHERE rusher_id = ? OR receiver_id = ?
    GROUP BY week
    ORDER BY week
"#;

/// A rostered player, identified by the league's gsis id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRef {
    pub player_id: String,
    pub name: String,
}

/// Touches and yardage for one player in one week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageWeek {
    pub week: i64,
    pub snaps: i64,
    pub targets: f64,
    pub rushes: f64,
    pub rush_yards: f64,
    pub rec_yards: f64,
}

/// Players rostered at a position for a team's season, sorted by name.
pub fn available_players(
    engine: &QueryEngine,
    season: i64,
    team: &str,
    position: Position,
) -> Result<Vec<PlayerRef>> {
    let params = [
        Param::Int(season),
        Param::from(team),
        Param::Str(position.to_string().to_uppercase()),
    ];
    let df = engine.execute_with(PLAYERS_QUERY, &params)?;

    let ids = df.column("gsis_id")?.str()?;
    let names = df.column("full_name")?.str()?;
    let players = ids
        .into_iter()
        .zip(names)
        .filter_map(|(id, name)| {
            Some(PlayerRef {
                player_id: id?.to_string(),
                name: name?.to_string(),
            })
        })
        .collect();
    Ok(players)
}

/// Weekly usage for a player, counting plays where they ran or were thrown to.
pub fn player_usage(engine: &QueryEngine, player_id: &str) -> Result<Vec<UsageWeek>> {
    let params = [Param::from(player_id), Param::from(player_id)];
    let df = engine.execute_with(USAGE_QUERY, &params)?;

    let weeks = df.column("week")?.i64()?;
    let snaps = df.column("snaps")?.i64()?;
    let targets = df.column("targets")?.f64()?;
    let rushes = df.column("rushes")?.f64()?;
    let rush_yards = df.column("rush_yards")?.f64()?;
    let rec_yards = df.column("rec_yards")?.f64()?;

    let usage = izip!(weeks, snaps, targets, rushes, rush_yards, rec_yards)
        .filter_map(|(week, snaps, targets, rushes, rush_yards, rec_yards)| {
            Some(UsageWeek {
                week: week?,
                snaps: snaps.unwrap_or(0),
                targets: targets.unwrap_or(0.0),
                rushes: rushes.unwrap_or(0.0),
                rush_yards: rush_yards.unwrap_or(0.0),
                rec_yards: rec_yards.unwrap_or(0.0),
            })
        })
        .collect();
    Ok(usage)
}
