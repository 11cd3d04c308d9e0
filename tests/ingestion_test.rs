use rollback_report::export::export_report;
use rollback_report::ingestion::{open_source, LoadCache, SourceOptions};
use rollback_report::{BucketGranularity, RollbackError, RollbackPipeline, RunConfig, RunOutcome};
use std::fs;
use std::path::{Path, PathBuf};

const BASE_CSV: &str = "\
 User_ID ,GAME_NAME,reference,created_at,brand_name,extra
101.0,Fortune Tiger,ref-1,2024-03-01 10:15:42,7kbet,x
101.0,Fortune Tiger,ref-1,2024-03-01 10:15:42,7KBET,x
202,Mines,ref-2,2024-03-01T10:16:00Z,Cassino,x
303,Mines,ref-3,2024-03-01 11:20:00,vera,x
,Aviator,ref-4,2024-03-01 11:21:00,,x
";

/// Two sheets: "Rollbacks" (first) and "Outros". Ids are numeric cells.
fn workbook_fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/rollbacks.xlsx")
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_csv_keeps_ids_as_text() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = write_file(dir.path(), "base.csv", BASE_CSV);

    let frame = open_source(&path, &SourceOptions::default())?.load()?;
    assert_eq!(frame.height(), 5);

    let config = RunConfig::default();
    let table = RollbackPipeline::new(&config)?.clean(&frame)?;
    assert_eq!(table.records[0].user_id.as_deref(), Some("101"));
    assert_eq!(table.records[4].user_id, None);
    assert_eq!(table.records[4].brand_name, "Sem Brand");
    Ok(())
}

#[test]
fn test_semicolon_file_is_sniffed() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = write_file(
        dir.path(),
        "base.csv",
        &BASE_CSV.replace(',', ";"),
    );

    let frame = open_source(&path, &SourceOptions::default())?.load()?;
    assert_eq!(frame.width(), 6);
    assert_eq!(frame.height(), 5);
    Ok(())
}

#[test]
fn test_load_cache_reuses_unchanged_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = write_file(dir.path(), "base.csv", BASE_CSV);
    let options = SourceOptions::default();

    let mut cache = LoadCache::default();
    let first = cache.load(&path, &options)?;
    let second = cache.load(&path, &options)?;
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.len(), 1);
    assert!(first.equals_missing(&second));

    // A different separator is a different load.
    let explicit = SourceOptions {
        separator: Some(b','),
        ..SourceOptions::default()
    };
    cache.load(&path, &explicit)?;
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.len(), 2);
    Ok(())
}

#[test]
fn test_expired_entries_are_reloaded() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = write_file(dir.path(), "base.csv", BASE_CSV);
    let options = SourceOptions::default();

    let mut cache = LoadCache::with_ttl(std::time::Duration::ZERO);
    cache.load(&path, &options)?;
    cache.load(&path, &options)?;
    assert_eq!(cache.hits(), 0);
    Ok(())
}

#[test]
fn test_export_report_writes_every_table() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = write_file(dir.path(), "base.csv", BASE_CSV);
    let out_dir = dir.path().join("out");

    let config = RunConfig {
        bucket_granularity: BucketGranularity::Hour,
        ..RunConfig::default()
    };
    let frame = LoadCache::default().load(&path, &SourceOptions::default())?;
    let report = match RollbackPipeline::new(&config)?.run(&frame, &config)? {
        RunOutcome::Report(report) => report,
        RunOutcome::Empty(reason) => panic!("unexpected empty outcome: {}", reason),
    };

    let written = export_report(&report, &out_dir)?;
    // Four global tables plus four per brand (7K, Cassino, Vera, Sem Brand).
    assert_eq!(written.len(), 4 + 4 * 4);

    let global_games = fs::read_to_string(out_dir.join("rollback_top_jogos_geral.csv"))?;
    assert_eq!(
        global_games,
        "game_name,qtd_rollbacks\nMines,2\nAviator,1\nFortune Tiger,1\n"
    );

    let hours = fs::read_to_string(out_dir.join("rollback_geral_horarios_hora.csv"))?;
    assert!(hours.starts_with("brand_name,horario_utc,qtd_rollbacks\n"));
    assert!(hours.contains("7K,01/03/2024 10:00,1\n"));

    let seven_k_users = fs::read_to_string(out_dir.join("rollback_7K_cliente_jogo.csv"))?;
    assert_eq!(
        seven_k_users,
        "brand_name,user_id,game_name,qtd_rollbacks\n7K,101,Fortune Tiger,1\n"
    );

    let no_brand_hours = fs::read_to_string(out_dir.join("rollback_Sem_Brand_horarios_hora.csv"))?;
    assert_eq!(no_brand_hours, "horario_utc,qtd_rollbacks\n01/03/2024 11:00,1\n");

    // Sem Brand's only row has no user, so its client/game slice is header-only.
    let no_brand_users = fs::read_to_string(out_dir.join("rollback_Sem_Brand_cliente_jogo.csv"))?;
    assert_eq!(no_brand_users, "brand_name,user_id,game_name,qtd_rollbacks\n");
    Ok(())
}

#[test]
fn test_export_keeps_brands_with_clashing_file_names() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = write_file(
        dir.path(),
        "brands.csv",
        "user_id,game_name,reference,created_at,brand_name\n\
         1,g,a,2024-03-01 10:00,foo bar\n\
         2,g,b,2024-03-01 10:00,foo_bar\n\
         3,g,c,2024-03-01 10:00,foo_bar\n",
    );
    let out_dir = dir.path().join("out");

    let config = RunConfig::default();
    let frame = LoadCache::default().load(&path, &SourceOptions::default())?;
    let report = match RollbackPipeline::new(&config)?.run(&frame, &config)? {
        RunOutcome::Report(report) => report,
        RunOutcome::Empty(reason) => panic!("unexpected empty outcome: {}", reason),
    };

    let written = export_report(&report, &out_dir)?;
    let unique: std::collections::HashSet<_> = written.iter().collect();
    assert_eq!(written.len(), 4 + 2 * 4);
    assert_eq!(unique.len(), written.len());

    let first = fs::read_to_string(out_dir.join("rollback_foo_bar_jogos.csv"))?;
    assert_eq!(first, "brand_name,game_name,qtd_rollbacks\nfoo bar,g,1\n");
    let second = fs::read_to_string(out_dir.join("rollback_foo_bar_2_jogos.csv"))?;
    assert_eq!(second, "brand_name,game_name,qtd_rollbacks\nfoo_bar,g,2\n");
    Ok(())
}

#[test]
fn test_workbook_first_sheet_is_default() -> Result<(), Box<dyn std::error::Error>> {
    let source = open_source(&workbook_fixture(), &SourceOptions::default())?;
    assert_eq!(source.source_type(), "spreadsheet");

    let frame = source.load()?;
    assert_eq!(frame.height(), 3);

    let config = RunConfig::default();
    let table = RollbackPipeline::new(&config)?.clean(&frame)?;
    // Numeric id cells read as "101.0" and lose the suffix.
    assert_eq!(table.records[0].user_id.as_deref(), Some("101"));
    assert_eq!(table.records[0].brand_name, "7K");

    let report = match compute_outcome(&frame, &config)? {
        RunOutcome::Report(report) => report,
        RunOutcome::Empty(reason) => panic!("unexpected empty outcome: {}", reason),
    };
    assert_eq!(report.kpis.total_rollbacks, 2);
    Ok(())
}

#[test]
fn test_workbook_named_sheet() -> Result<(), Box<dyn std::error::Error>> {
    let options = SourceOptions {
        sheet: Some("Outros".to_string()),
        ..SourceOptions::default()
    };
    let frame = open_source(&workbook_fixture(), &options)?.load()?;
    assert_eq!(frame.height(), 1);

    let config = RunConfig::default();
    let table = RollbackPipeline::new(&config)?.clean(&frame)?;
    assert_eq!(table.records[0].user_id.as_deref(), Some("303"));
    assert_eq!(table.records[0].reference.as_deref(), Some("ref-9"));
    assert_eq!(table.records[0].brand_name, "Vera");
    Ok(())
}

#[test]
fn test_workbook_unknown_sheet_lists_available() {
    let options = SourceOptions {
        sheet: Some("Missing".to_string()),
        ..SourceOptions::default()
    };
    let err = open_source(&workbook_fixture(), &options)
        .and_then(|source| source.load())
        .unwrap_err();

    match err {
        RollbackError::Spreadsheet(message) => {
            assert!(message.contains("Missing"));
            assert!(message.contains("Rollbacks, Outros"));
        }
        other => panic!("expected Spreadsheet error, got {:?}", other),
    }
}

fn compute_outcome(
    frame: &polars::prelude::DataFrame,
    config: &RunConfig,
) -> rollback_report::Result<RunOutcome> {
    RollbackPipeline::new(config)?.run(frame, config)
}
