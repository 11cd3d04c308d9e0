//! CSV export of the result tables with a fixed column order.

use crate::error::{Result, RollbackError};
use crate::models::{GameBrandCount, GameCount, TimeBucketCount, UserGameCount};
use crate::report::RollbackReport;
use csv::WriterBuilder;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A row type with a stable exported header.
pub trait ExportRow: Serialize {
    const COLUMNS: &'static [&'static str];
}

impl ExportRow for UserGameCount {
    const COLUMNS: &'static [&'static str] = &["brand_name", "user_id", "game_name", "qtd_rollbacks"];
}

impl ExportRow for TimeBucketCount {
    const COLUMNS: &'static [&'static str] = &["brand_name", "horario_utc", "qtd_rollbacks"];
}

impl ExportRow for GameBrandCount {
    const COLUMNS: &'static [&'static str] = &["brand_name", "game_name", "qtd_rollbacks"];
}

impl ExportRow for GameCount {
    const COLUMNS: &'static [&'static str] = &["game_name", "qtd_rollbacks"];
}

/// Time buckets inside a single brand slice drop the brand column.
#[derive(Debug, Clone, Serialize)]
pub struct BrandBucketRow<'a> {
    pub horario_utc: &'a str,
    pub qtd_rollbacks: u64,
}

impl ExportRow for BrandBucketRow<'_> {
    const COLUMNS: &'static [&'static str] = &["horario_utc", "qtd_rollbacks"];
}

impl<'a> From<&'a TimeBucketCount> for BrandBucketRow<'a> {
    fn from(row: &'a TimeBucketCount) -> Self {
        Self {
            horario_utc: &row.horario_utc,
            qtd_rollbacks: row.qtd_rollbacks,
        }
    }
}

/// Write header then rows. The header is written even when there are no rows.
pub fn write_csv<T, W>(rows: &[T], writer: W) -> Result<()>
where
    T: ExportRow,
    W: Write,
{
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(T::COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn to_csv_string<T: ExportRow>(rows: &[T]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(rows, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| RollbackError::Export(e.to_string()))
}

fn write_file<T: ExportRow>(dir: &Path, file_name: &str, rows: &[T]) -> Result<PathBuf> {
    let path = dir.join(file_name);
    let file = File::create(&path)?;
    write_csv(rows, file)?;
    Ok(path)
}

/// Brand label made safe for a file name.
pub fn file_safe(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Prefix of the global tables; no brand may take it.
const GLOBAL_STEM: &str = "geral";

/// One file stem per brand label. Labels that sanitize to an already used
/// stem (case-insensitively) get a `_2`, `_3`, ... suffix.
pub fn brand_file_stems<'a, I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut used: HashSet<String> = HashSet::from([GLOBAL_STEM.to_string()]);
    let mut stems = Vec::new();
    for label in labels {
        let base = file_safe(label);
        let mut stem = base.clone();
        let mut suffix = 2;
        while !used.insert(stem.to_lowercase()) {
            stem = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        if stem != base {
            warn!(brand = label, file_stem = %stem, "brand file name already taken, using suffix");
        }
        stems.push(stem);
    }
    stems
}

/// Write the global tables and every brand slice into `dir`.
pub fn export_report(report: &RollbackReport, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let bucket = report.granularity.file_label();
    let mut written = vec![
        write_file(dir, "rollback_geral_cliente_jogo.csv", &report.per_user_game)?,
        write_file(
            dir,
            &format!("rollback_geral_horarios_{}.csv", bucket),
            &report.per_time_bucket,
        )?,
        write_file(dir, "rollback_geral_jogos_por_brand.csv", &report.per_game_by_brand)?,
        write_file(dir, "rollback_top_jogos_geral.csv", &report.per_game_global)?,
    ];

    let stems = brand_file_stems(report.brands.iter().map(|b| b.brand.as_str()));
    for (section, brand) in report.brands.iter().zip(&stems) {
        let buckets: Vec<BrandBucketRow> = section.per_time_bucket.iter().map(BrandBucketRow::from).collect();

        written.push(write_file(
            dir,
            &format!("rollback_{}_cliente_jogo.csv", brand),
            &section.per_user_game,
        )?);
        written.push(write_file(
            dir,
            &format!("rollback_{}_horarios_{}.csv", brand, bucket),
            &buckets,
        )?);
        written.push(write_file(
            dir,
            &format!("rollback_{}_jogos.csv", brand),
            &section.per_game,
        )?);
        written.push(write_file(
            dir,
            &format!("rollback_top_jogos_{}.csv", brand),
            &section.per_game,
        )?);
    }

    info!(files = written.len(), dir = %dir.display(), "exports written");
    Ok(written)
}
