use parse_display::{Display, FromStr};
use polars::prelude::*;
use std::path::Path;

mod error;
pub mod ingest;
pub mod params;
pub mod query;
pub mod trends;
pub mod usage;

pub use error::Error;
pub use params::Param;
pub use query::{ColumnSchema, QueryEngine, SchemaLookup};

type Result<T> = std::result::Result<T, error::Error>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Display, FromStr)]
#[display(style = "lowercase")]
pub enum Position {
    Qb,
    Rb,
    Wr,
    Te,
    K,
}

/// Team stats that can be trended week over week.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, FromStr)]
#[display(style = "snake_case")]
pub enum Stat {
    TotalYards,
    PassingYards,
    RushingYards,
    Points,
}

impl Stat {
    /// Column name in the team-game summary table. Doubles as the allow-list
    /// for the one identifier ever spliced into SQL text.
    pub fn column(self) -> &'static str {
        match self {
            Stat::TotalYards => "total_yards",
            Stat::PassingYards => "passing_yards",
            Stat::RushingYards => "rushing_yards",
            Stat::Points => "points",
        }
    }
}

pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let mut file = std::fs::File::open(path)?;
    let df = ParquetReader::new(&mut file).finish()?;
    Ok(df)
}
