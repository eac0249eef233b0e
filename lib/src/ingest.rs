//! Builds the per-team per-game summary tables from raw play-by-play data.
//!
//! The raw play file comes from an external download; this module only
//! aggregates it and writes the summary parquet files the query layer reads.

use crate::Result;
use derive_deref::Deref;
use polars::{prelude::*, sql::SQLContext};
use std::path::Path;

pub const PBP_DATASET: &str = "nfl_pbp_raw.parquet";
pub const TEAM_GAMES_DATASET: &str = "nfl_team_games.parquet";
pub const TEAMS_DATASET: &str = "nfl_teams.parquet";
pub const ROSTERS_DATASET: &str = "nfl_rosters.parquet";

#[derive(Clone, Deref)]
pub struct PlayDf(DataFrame);

impl PlayDf {
    pub fn new(df: DataFrame) -> Self {
        PlayDf(df)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let df = crate::load_parquet(path)?;
        Ok(PlayDf(df))
    }

    pub fn filter(self, filter: Expr) -> Result<Self> {
        let df = self.0.lazy().filter(filter).collect()?;
        Ok(PlayDf(df))
    }
}

pub(crate) static TEAM_GAMES_QUERY: &str = r#"
    SELECT
        game_id,
        season,
        week,
        posteam AS team,
        SUM(yards_gained) AS total_yards,
        SUM(pass_attempt) AS pass_attempts,
        SUM(rush_attempt) AS rush_attempts,
        SUM(first_down) AS first_downs,
        SUM(interception) AS interceptions,
        SUM(fumble_lost) AS fumbles_lost,
        SUM(touchdown) AS touchdowns,
        MAX(posteam_score) AS points
    FROM plays
    WHERE posteam IS NOT NULL
    GROUP BY game_id, season, week, posteam
"#;

pub(crate) static PASSING_YARDS_QUERY: &str = r#"
    SELECT
        game_id,
        posteam AS team,
        SUM(yards_gained) AS passing_yards
    FROM plays
    WHERE pass_attempt = 1 AND posteam IS NOT NULL
    GROUP BY game_id, posteam
"#;

pub(crate) static RUSHING_YARDS_QUERY: &str = r#"
    SELECT
        game_id,
        posteam AS team,
        SUM(yards_gained) AS rushing_yards
    FROM plays
    WHERE rush_attempt = 1 AND posteam IS NOT NULL
    GROUP BY game_id, posteam
"#;

/// One row per team per game: totals, yardage splits, and turnovers.
#[derive(Clone, Deref)]
pub struct TeamGameDf(DataFrame);

impl TeamGameDf {
    /// Aggregates raw plays into the team-game summary: per-game totals,
    /// separate passing/rushing yardage (teams without a pass or rush get
    /// zero, not null), a derived turnover count, sorted by season, week,
    /// and team.
    pub fn from_plays(plays: PlayDf) -> Result<Self> {
        let mut ctx = SQLContext::new();
        ctx.register("plays", plays.0.lazy());

        let totals = ctx.execute(TEAM_GAMES_QUERY)?.collect()?;
        log::debug!("{} team-games aggregated", totals.height());
        let passing = ctx.execute(PASSING_YARDS_QUERY)?.collect()?;
        log::debug!("{} team-games with passing yards", passing.height());
        let rushing = ctx.execute(RUSHING_YARDS_QUERY)?.collect()?;
        log::debug!("{} team-games with rushing yards", rushing.height());

        let join_cols = ["game_id", "team"];
        let join_args = JoinArgs::new(JoinType::Left).with_coalesce(JoinCoalesce::CoalesceColumns);
        let merged = totals
            .join(&passing, join_cols, join_cols, join_args.clone())?
            .join(&rushing, join_cols, join_cols, join_args)?;

        let df = merged
            .lazy()
            .with_columns([
                col("passing_yards").fill_null(lit(0)),
                col("rushing_yards").fill_null(lit(0)),
            ])
            .with_column((col("interceptions") + col("fumbles_lost")).alias("turnovers"))
            .sort(["season", "week", "team"], SortMultipleOptions::default())
            .collect()?;
        log::debug!("{} team-games summarized", df.height());
        Ok(TeamGameDf(df))
    }

    pub fn filter(self, filter: Expr) -> Result<Self> {
        let df = self.0.lazy().filter(filter).collect()?;
        Ok(TeamGameDf(df))
    }

    pub fn write_parquet<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_parquet(&self.0, path)
    }
}

/// Distinct teams appearing in the play data, alphabetical. Stands in for a
/// separately fetched team reference table.
pub fn unique_teams(plays: &PlayDf) -> Result<DataFrame> {
    let df = plays
        .0
        .clone()
        .lazy()
        .filter(col("posteam").is_not_null())
        .select([col("posteam").alias("team")])
        .filter(col("team").is_first_distinct())
        .sort(["team"], SortMultipleOptions::default())
        .collect()?;
    log::debug!("{} distinct teams", df.height());
    Ok(df)
}

pub fn write_parquet<P: AsRef<Path>>(df: &DataFrame, path: P) -> Result<()> {
    let mut df = df.clone();
    let file = std::fs::File::create(path)?;
    ParquetWriter::new(file).finish(&mut df)?;
    Ok(())
}

#[derive(Clone)]
pub struct GameFilter {
    filter_expr: Option<Expr>,
}

impl GameFilter {
    pub fn new() -> Self {
        Self { filter_expr: None }
    }

    pub fn team(mut self, team: &str) -> Self {
        let expr = col("team").eq(lit(team));
        self.extend_filter(expr)
    }

    pub fn season(mut self, season: i32) -> Self {
        let expr = col("season").eq(lit(season));
        self.extend_filter(expr)
    }

    // Adds a filter for the week
    pub fn week(mut self, week: u16) -> Self {
        let expr = col("week").eq(lit(week as u32));
        self.extend_filter(expr)
    }

    pub fn week_range(mut self, start: u16, end: u16) -> Self {
        let expr = col("week").is_between(start as u32, end as u32, ClosedInterval::Both);
        self.extend_filter(expr)
    }

    // Combines the current filter with a new one using AND logic
    fn extend_filter(&mut self, new_expr: Expr) -> Self {
        self.filter_expr = match self.filter_expr.take() {
            Some(existing_expr) => Some(existing_expr.and(new_expr)),
            None => Some(new_expr),
        };
        self.clone()
    }

    // Builds the final filter expression
    pub fn build(self) -> Expr {
        self.filter_expr.unwrap_or_else(|| lit(true))
    }
}

impl Default for GameFilter {
    fn default() -> Self {
        Self::new()
    }
}
