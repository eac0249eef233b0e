//! Season-level offensive trends over the team-game summary table.

use crate::{Param, QueryEngine, Result, Stat};
use serde::Serialize;

pub(crate) static SEASONS_QUERY: &str = r#"
    SELECT DISTINCT CAST(season AS BIGINT) AS season
    FROM nfl_team_games
    ORDER BY season DESC
"#;

pub(crate) static TEAMS_QUERY: &str = r#"
    SELECT DISTINCT team
    FROM nfl_team_games
    WHERE season = ? AND team IS NOT NULL
    ORDER BY team
"#;

/// One week's value of the selected stat for a team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub week: i64,
    pub value: f64,
}

/// Aggregates over a team's games in one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonSummary {
    pub games: i64,
    pub total: f64,
    pub mean: f64,
    pub best: f64,
    pub worst: f64,
    pub avg_points: f64,
    pub turnovers: f64,
}

/// Seasons present in the team-game data, most recent first.
pub fn available_seasons(engine: &QueryEngine) -> Result<Vec<i64>> {
    let df = engine.execute(SEASONS_QUERY)?;
    let seasons = df.column("season")?.i64()?.into_iter().flatten().collect();
    Ok(seasons)
}

/// Teams that played in the given season, alphabetical.
pub fn available_teams(engine: &QueryEngine, season: i64) -> Result<Vec<String>> {
    let df = engine.execute_with(TEAMS_QUERY, &[Param::Int(season)])?;
    let teams = df
        .column("team")?
        .str()?
        .into_iter()
        .flatten()
        .map(String::from)
        .collect();
    Ok(teams)
}

/// Week-by-week values of one stat for a team's season, in week order.
pub fn weekly_trend(
    engine: &QueryEngine,
    season: i64,
    team: &str,
    stat: Stat,
) -> Result<Vec<TrendPoint>> {
    let sql = format!(
        r#"
    SELECT
        CAST(week AS BIGINT) AS week,
        CAST({stat} AS DOUBLE) AS value
    FROM nfl_team_games
    WHERE season = ? AND team = ?
    ORDER BY week
"#,
        stat = stat.column()
    );
    let df = engine.execute_with(&sql, &[Param::Int(season), Param::from(team)])?;

    let weeks = df.column("week")?.i64()?;
    let values = df.column("value")?.f64()?;
    let points = weeks
        .into_iter()
        .zip(values)
        .filter_map(|(week, value)| {
            Some(TrendPoint {
                week: week?,
                value: value?,
            })
        })
        .collect();
    Ok(points)
}

/// Season aggregates of one stat for one team, or `None` if it played no
/// games. Points and turnovers ride along regardless of the chosen stat.
pub fn season_summary(
    engine: &QueryEngine,
    season: i64,
    team: &str,
    stat: Stat,
) -> Result<Option<SeasonSummary>> {
    let sql = format!(
        r#"
    SELECT
        CAST(COUNT(*) AS BIGINT) AS games,
        CAST(SUM({stat}) AS DOUBLE) AS total,
        CAST(AVG({stat}) AS DOUBLE) AS mean,
        CAST(MAX({stat}) AS DOUBLE) AS best,
        CAST(MIN({stat}) AS DOUBLE) AS worst,
        CAST(AVG(points) AS DOUBLE) AS avg_points,
        CAST(SUM(turnovers) AS DOUBLE) AS turnovers
    FROM nfl_team_games
    WHERE season = ? AND team = ?
"#,
        stat = stat.column()
    );
    let df = engine.execute_with(&sql, &[Param::Int(season), Param::from(team)])?;
    let games = scalar_i64(&df, "games")?;
    if games == 0 {
        return Ok(None);
    }
    Ok(Some(SeasonSummary {
        games,
        total: scalar_f64(&df, "total")?,
        mean: scalar_f64(&df, "mean")?,
        best: scalar_f64(&df, "best")?,
        worst: scalar_f64(&df, "worst")?,
        avg_points: scalar_f64(&df, "avg_points")?,
        turnovers: scalar_f64(&df, "turnovers")?,
    }))
}

fn scalar_i64(df: &polars::prelude::DataFrame, column: &str) -> Result<i64> {
    Ok(df.column(column)?.i64()?.get(0).unwrap_or(0))
}

fn scalar_f64(df: &polars::prelude::DataFrame, column: &str) -> Result<f64> {
    Ok(df.column(column)?.f64()?.get(0).unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest;
    use polars::prelude::*;

    fn engine_with_games() -> (tempfile::TempDir, QueryEngine) {
        let dir = tempfile::tempdir().unwrap();
        let df = df!(
            "season" => [2023i64, 2024, 2024, 2024],
            "week" => [1i64, 1, 2, 1],
            "team" => ["KC", "KC", "KC", "DEN"],
            "total_yards" => [300i64, 350, 410, 280],
            "passing_yards" => [200i64, 250, 300, 150],
            "rushing_yards" => [100i64, 100, 110, 130],
            "points" => [17i64, 24, 27, 13],
            "turnovers" => [1i64, 0, 2, 1],
        )
        .unwrap();
        ingest::write_parquet(&df, dir.path().join(ingest::TEAM_GAMES_DATASET)).unwrap();
        let engine = QueryEngine::new(dir.path());
        (dir, engine)
    }

    #[test]
    fn test_available_seasons_newest_first() {
        let (_dir, engine) = engine_with_games();
        assert_eq!(available_seasons(&engine).unwrap(), vec![2024, 2023]);
    }

    #[test]
    fn test_available_teams_for_season() {
        let (_dir, engine) = engine_with_games();
        assert_eq!(available_teams(&engine, 2024).unwrap(), vec!["DEN", "KC"]);
        assert_eq!(available_teams(&engine, 2023).unwrap(), vec!["KC"]);
    }

    #[test]
    fn test_weekly_trend_in_week_order() {
        let (_dir, engine) = engine_with_games();
        let trend = weekly_trend(&engine, 2024, "KC", Stat::TotalYards).unwrap();
        assert_eq!(
            trend,
            vec![
                TrendPoint { week: 1, value: 350.0 },
                TrendPoint { week: 2, value: 410.0 },
            ]
        );
    }

    #[test]
    fn test_weekly_trend_selects_stat_column() {
        let (_dir, engine) = engine_with_games();
        let trend = weekly_trend(&engine, 2024, "KC", Stat::Points).unwrap();
        let values: Vec<f64> = trend.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![24.0, 27.0]);
    }

    #[test]
    fn test_season_summary_aggregates() {
        let (_dir, engine) = engine_with_games();
        let summary = season_summary(&engine, 2024, "KC", Stat::TotalYards)
            .unwrap()
            .unwrap();
        assert_eq!(summary.games, 2);
        assert_eq!(summary.total, 760.0);
        assert_eq!(summary.mean, 380.0);
        assert_eq!(summary.best, 410.0);
        assert_eq!(summary.worst, 350.0);
        assert_eq!(summary.avg_points, 25.5);
        assert_eq!(summary.turnovers, 2.0);
    }

    #[test]
    fn test_season_summary_follows_stat() {
        let (_dir, engine) = engine_with_games();
        let summary = season_summary(&engine, 2024, "KC", Stat::RushingYards)
            .unwrap()
            .unwrap();
        assert_eq!(summary.total, 210.0);
        assert_eq!(summary.best, 110.0);
        assert_eq!(summary.worst, 100.0);
        // points and turnovers are unaffected by the stat choice
        assert_eq!(summary.avg_points, 25.5);
        assert_eq!(summary.turnovers, 2.0);
    }

    #[test]
    fn test_season_summary_none_without_games() {
        let (_dir, engine) = engine_with_games();
        assert!(season_summary(&engine, 1999, "KC", Stat::TotalYards)
            .unwrap()
            .is_none());
    }
}
