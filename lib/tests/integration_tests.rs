use polars::prelude::*;
use statline::{Error, Param, QueryEngine};
use std::path::Path;

fn write_parquet(dir: &Path, name: &str, df: &mut DataFrame) {
    let file = std::fs::File::create(dir.join(name)).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();
}

fn games_df() -> DataFrame {
    df!(
        "week" => [1i64, 2],
        "team" => ["KC", "KC"],
        "points" => [24i64, 27],
    )
    .unwrap()
}

#[test]
fn test_list_datasets_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("nested").join("parquet");
    let engine = QueryEngine::new(&data_dir);

    assert!(engine.list_datasets().unwrap().is_empty());
    assert!(data_dir.is_dir());
    // second listing sees the now-existing empty directory
    assert!(engine.list_datasets().unwrap().is_empty());
}

#[test]
fn test_list_datasets_sorted_parquet_only() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(dir.path(), "b.parquet", &mut games_df());
    write_parquet(dir.path(), "a.parquet", &mut games_df());
    std::fs::write(dir.path().join("notes.txt"), "scratch").unwrap();
    // a directory with a parquet-looking name is not a dataset
    std::fs::create_dir(dir.path().join("sub.parquet")).unwrap();

    let engine = QueryEngine::new(dir.path());
    assert_eq!(engine.list_datasets().unwrap(), vec!["a.parquet", "b.parquet"]);
}

#[test]
fn test_describe_schema_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let engine = QueryEngine::new(dir.path());

    let lookup = engine.describe_schema("missing.parquet").unwrap();
    assert!(lookup.is_not_found());
    assert_eq!(lookup.filename(), "missing.parquet");
    assert!(lookup.columns().is_none());
}

#[test]
fn test_describe_schema_columns_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(dir.path(), "games.parquet", &mut games_df());
    let engine = QueryEngine::new(dir.path());

    let lookup = engine.describe_schema("games.parquet").unwrap();
    let columns = lookup.columns().unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["week", "team", "points"]);
    assert_eq!(columns[0].dtype, DataType::Int64);
    assert_eq!(columns[1].dtype, DataType::String);
    assert_eq!(columns[2].dtype, DataType::Int64);
}

#[test]
fn test_execute_binds_parameters() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(dir.path(), "games.parquet", &mut games_df());
    let engine = QueryEngine::new(dir.path());

    let df = engine
        .execute_with(
            "SELECT SUM(points) AS total FROM 'games.parquet' WHERE team = ?",
            &[Param::from("KC")],
        )
        .unwrap();
    assert_eq!(df.column("total").unwrap().i64().unwrap().get(0), Some(51));
}

#[test]
fn test_dataset_addressable_by_stem_and_filename() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(dir.path(), "games.parquet", &mut games_df());
    let engine = QueryEngine::new(dir.path());

    for from in ["games", "\"games.parquet\"", "'games.parquet'"] {
        let sql = format!("SELECT CAST(COUNT(*) AS BIGINT) AS n FROM {from}");
        let df = engine.execute(&sql).unwrap();
        assert_eq!(df.column("n").unwrap().i64().unwrap().get(0), Some(2));
    }
}

#[test]
fn test_unknown_relation_is_query_error() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(dir.path(), "games.parquet", &mut games_df());
    let engine = QueryEngine::new(dir.path());

    let err = engine.execute("SELECT * FROM nonexistent").unwrap_err();
    assert!(matches!(err, Error::Query(_)));
}

#[test]
fn test_parameter_count_mismatch_both_directions() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(dir.path(), "games.parquet", &mut games_df());
    let engine = QueryEngine::new(dir.path());

    let err = engine
        .execute("SELECT * FROM games WHERE week = ?")
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ParameterCount {
            placeholders: 1,
            supplied: 0
        }
    ));

    let err = engine
        .execute_with("SELECT * FROM games", &[Param::Int(1)])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ParameterCount {
            placeholders: 0,
            supplied: 1
        }
    ));
}

#[test]
fn test_result_column_set_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(dir.path(), "games.parquet", &mut games_df());
    let engine = QueryEngine::new(dir.path());

    let first = engine.execute("SELECT week, team FROM games").unwrap();
    let second = engine.execute("SELECT week, team FROM games").unwrap();
    assert_eq!(first.get_column_names(), vec!["week", "team"]);
    assert_eq!(first.get_column_names(), second.get_column_names());
}

#[test]
fn test_empty_result_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(dir.path(), "games.parquet", &mut games_df());
    let engine = QueryEngine::new(dir.path());

    let df = engine
        .execute_with("SELECT week, points FROM games WHERE week = ?", &[Param::Int(99)])
        .unwrap();
    assert_eq!(df.height(), 0);
    assert_eq!(df.get_column_names(), vec!["week", "points"]);
}

#[test]
fn test_engine_survives_missing_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let engine = QueryEngine::new(dir.path().join("never_created"));

    // values-only queries still run; table references fail cleanly
    let df = engine.execute("SELECT 1 AS one").unwrap();
    assert_eq!(df.height(), 1);
    assert!(matches!(
        engine.execute("SELECT * FROM games"),
        Err(Error::Query(_))
    ));
}

#[test]
fn test_concurrent_queries_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(dir.path(), "games.parquet", &mut games_df());
    let mut others = df!("id" => [1i64, 2, 3]).unwrap();
    write_parquet(dir.path(), "others.parquet", &mut others);
    let engine = QueryEngine::new(dir.path());

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..10 {
                    let df = engine
                        .execute_with(
                            "SELECT SUM(points) AS total FROM games WHERE team = ?",
                            &[Param::from("KC")],
                        )
                        .unwrap();
                    assert_eq!(df.column("total").unwrap().i64().unwrap().get(0), Some(51));
                }
            });
            scope.spawn(|| {
                for _ in 0..10 {
                    let df = engine
                        .execute("SELECT CAST(COUNT(*) AS BIGINT) AS n FROM others")
                        .unwrap();
                    assert_eq!(df.column("n").unwrap().i64().unwrap().get(0), Some(3));
                }
            });
        }
    });
}

#[test]
fn test_end_to_end_list_describe_execute() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(dir.path(), "games.parquet", &mut games_df());
    let engine = QueryEngine::new(dir.path());

    let datasets = engine.list_datasets().unwrap();
    assert_eq!(datasets, vec!["games.parquet"]);

    let lookup = engine.describe_schema(&datasets[0]).unwrap();
    assert!(lookup.columns().is_some());

    let df = engine
        .execute_with(
            "SELECT week, points FROM 'games.parquet' WHERE team = ? ORDER BY week",
            &[Param::from("KC")],
        )
        .unwrap();
    assert_eq!(df.height(), 2);
    assert_eq!(df.column("points").unwrap().i64().unwrap().get(1), Some(27));
}
