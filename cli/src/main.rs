use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use log::LevelFilter;
use parse_display::{Display, FromStr};
use polars::prelude::*;
use serde::Serialize;
use serde_json::{json, Value};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use statline::ingest::{self, PlayDf, TeamGameDf};
use statline::{trends, usage, Param, Position, QueryEngine, SchemaLookup, Stat};
use std::path::{Path, PathBuf};

#[derive(Copy, Clone, Debug, Display, FromStr)]
#[display(style = "lowercase")]
enum Format {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Directory holding the parquet datasets
    #[arg(
        short = 'd',
        long = "data-dir",
        value_name = "DIR",
        default_value = "data/parquet",
        global = true
    )]
    data_dir: PathBuf,

    /// Output format: table or json
    #[arg(long, default_value = "table", global = true)]
    format: String,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the parquet datasets in the data directory
    Datasets,
    /// Show the column names and types of one dataset
    Schema {
        /// Dataset file name, e.g. nfl_team_games.parquet
        file: String,
    },
    /// Run a SQL query against the datasets
    Query {
        sql: String,

        /// Value for a `?` placeholder, in order; repeatable
        #[arg(short = 'p', long = "param", value_name = "VALUE")]
        params: Vec<String>,
    },
    /// Build the summary datasets from a raw play-by-play parquet
    Ingest {
        /// Raw play-by-play parquet file
        pbp: PathBuf,

        /// Keep only plays from this season
        #[arg(long)]
        season: Option<i32>,
    },
    /// Weekly trend and season summary for one team
    Trend {
        #[arg(long)]
        season: i64,

        #[arg(short = 't', long = "team")]
        team: String,

        #[arg(long, default_value = "total_yards")]
        stat: String,
    },
    /// List a team's rostered players at a position
    Players {
        #[arg(long)]
        season: i64,

        #[arg(short = 't', long = "team")]
        team: String,

        #[arg(long)]
        position: String,
    },
    /// Weekly usage for one player
    Usage {
        /// Player gsis id, e.g. 00-0033873
        player: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set the default level based on verbosity
    let default_level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let config = ConfigBuilder::new().add_filter_allow_str("statline").build();

    // Initialize the logger with the custom configuration
    TermLogger::init(
        default_level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap();

    log::trace!("Args {:#?}", args);

    let format: Format = match args.format.parse() {
        Ok(format) => format,
        Err(_) => bail!("Unsupported format. Use: table or json"),
    };

    let engine = QueryEngine::new(&args.data_dir);

    match args.command {
        Command::Datasets => datasets(&engine, format),
        Command::Schema { file } => schema(&engine, &file, format),
        Command::Query { sql, params } => query(&engine, &sql, &params, format),
        Command::Ingest { pbp, season } => ingest_plays(&engine, &pbp, season),
        Command::Trend { season, team, stat } => trend(&engine, season, &team, &stat, format),
        Command::Players {
            season,
            team,
            position,
        } => players(&engine, season, &team, &position, format),
        Command::Usage { player } => usage_report(&engine, &player, format),
    }
}

fn datasets(engine: &QueryEngine, format: Format) -> Result<()> {
    let names = engine.list_datasets()?;
    match format {
        Format::Table => {
            if names.is_empty() {
                println!("No datasets in {}", engine.data_dir().display());
            } else {
                println!("{}", names.iter().join("\n"));
            }
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(&names)?),
    }
    Ok(())
}

#[derive(Serialize)]
struct SchemaRow {
    column: String,
    dtype: String,
}

fn schema(engine: &QueryEngine, file: &str, format: Format) -> Result<()> {
    match engine.describe_schema(file)? {
        SchemaLookup::NotFound { filename } => match format {
            Format::Table => println!("Dataset not found: {}", filename),
            Format::Json => println!("{}", json!({ "not_found": filename })),
        },
        SchemaLookup::Found { columns, .. } => match format {
            Format::Table => {
                for column in &columns {
                    println!("{}\t{}", column.name, column.dtype);
                }
            }
            Format::Json => {
                let rows: Vec<SchemaRow> = columns
                    .iter()
                    .map(|c| SchemaRow {
                        column: c.name.clone(),
                        dtype: c.dtype.to_string(),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
        },
    }
    Ok(())
}

fn query(engine: &QueryEngine, sql: &str, raw_params: &[String], format: Format) -> Result<()> {
    let params: Vec<Param> = raw_params.iter().map(|raw| Param::infer(raw)).collect();
    let df = engine.execute_with(sql, &params)?;
    log::info!("{} rows", df.height());
    print_frame(&df, format)
}

fn ingest_plays(engine: &QueryEngine, pbp: &Path, season: Option<i32>) -> Result<()> {
    // creates the dataset directory on first run
    engine.list_datasets()?;

    let mut plays = PlayDf::load(pbp)?;
    log::info!("Loaded {} plays", plays.height());
    if let Some(season) = season {
        plays = plays.filter(col("season").eq(lit(season)))?;
        log::info!("{} plays in season {}", plays.height(), season);
    }

    let raw_path = engine.data_dir().join(ingest::PBP_DATASET);
    ingest::write_parquet(&plays, &raw_path)?;
    println!("wrote {} ({} plays)", raw_path.display(), plays.height());

    let teams = ingest::unique_teams(&plays)?;
    let games = TeamGameDf::from_plays(plays)?;

    let games_path = engine.data_dir().join(ingest::TEAM_GAMES_DATASET);
    games.write_parquet(&games_path)?;
    println!("wrote {} ({} team-games)", games_path.display(), games.height());

    let teams_path = engine.data_dir().join(ingest::TEAMS_DATASET);
    ingest::write_parquet(&teams, &teams_path)?;
    println!("wrote {} ({} teams)", teams_path.display(), teams.height());

    Ok(())
}

fn trend(engine: &QueryEngine, season: i64, team: &str, stat: &str, format: Format) -> Result<()> {
    let stat: Stat = match stat.parse() {
        Ok(stat) => stat,
        Err(_) => bail!("Unsupported stat. Use: total_yards, passing_yards, rushing_yards, or points"),
    };

    let points = trends::weekly_trend(engine, season, team, stat)?;
    let summary = trends::season_summary(engine, season, team, stat)?;

    match format {
        Format::Json => {
            let value = json!({
                "season": season,
                "team": team,
                "stat": stat.to_string(),
                "weeks": points,
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Format::Table => match summary {
            None => println!("No games for {} in {}", team, season),
            Some(summary) => {
                println!("{} {} {} by week:", team, season, stat);
                for point in &points {
                    println!("  week {:>2}  {:>7.1}", point.week, point.value);
                }
                println!(
                    "{} games: total {:.1}, avg {:.1}, best {:.1}, worst {:.1}, {:.1} ppg, {} turnovers",
                    summary.games,
                    summary.total,
                    summary.mean,
                    summary.best,
                    summary.worst,
                    summary.avg_points,
                    summary.turnovers
                );
            }
        },
    }
    Ok(())
}

fn players(
    engine: &QueryEngine,
    season: i64,
    team: &str,
    position: &str,
    format: Format,
) -> Result<()> {
    let position: Position = match position.to_lowercase().parse() {
        Ok(position) => position,
        Err(_) => bail!("Unsupported position. Use: qb, rb, wr, te, or k"),
    };

    let players = usage::available_players(engine, season, team, position)?;
    match format {
        Format::Table => {
            for player in &players {
                println!("{}\t{}", player.player_id, player.name);
            }
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(&players)?),
    }
    Ok(())
}

fn usage_report(engine: &QueryEngine, player: &str, format: Format) -> Result<()> {
    let weeks = usage::player_usage(engine, player)?;
    match format {
        Format::Table => {
            println!("week  snaps  targets  rushes  rush_yds  rec_yds");
            for week in &weeks {
                println!(
                    "{:>4}  {:>5}  {:>7.0}  {:>6.0}  {:>8.1}  {:>7.1}",
                    week.week, week.snaps, week.targets, week.rushes, week.rush_yards, week.rec_yards
                );
            }
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(&weeks)?),
    }
    Ok(())
}

fn print_frame(df: &DataFrame, format: Format) -> Result<()> {
    match format {
        Format::Table => println!("{}", df),
        Format::Json => println!("{}", serde_json::to_string_pretty(&dataframe_to_json(df))?),
    }
    Ok(())
}

fn dataframe_to_json(df: &DataFrame) -> Value {
    let rows: Vec<Value> = (0..df.height())
        .map(|row| {
            let mut object = serde_json::Map::new();
            for column in df.get_columns() {
                let value = match column.get(row) {
                    Ok(av) => anyvalue_to_json(av),
                    Err(_) => Value::Null,
                };
                object.insert(column.name().to_string(), value);
            }
            Value::Object(object)
        })
        .collect();
    Value::Array(rows)
}

fn anyvalue_to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => json!(b),
        AnyValue::String(s) => json!(s),
        AnyValue::StringOwned(s) => json!(s.as_str()),
        AnyValue::Int8(v) => json!(v),
        AnyValue::Int16(v) => json!(v),
        AnyValue::Int32(v) => json!(v),
        AnyValue::Int64(v) => json!(v),
        AnyValue::UInt8(v) => json!(v),
        AnyValue::UInt16(v) => json!(v),
        AnyValue::UInt32(v) => json!(v),
        AnyValue::UInt64(v) => json!(v),
        AnyValue::Float32(v) => serde_json::Number::from_f64(v as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::Float64(v) => serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        av => Value::String(av.to_string()),
    }
}
