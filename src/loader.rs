use crate::error::LoadError;
use crate::types::{Gender, PaymentRow, RawRow};
use crate::util::{parse_date_safe, parse_f64_safe};
use csv::{ReaderBuilder, Trim};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

const EXPECTED_EXTENSION: &str = "csv";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    /// Rows dropped because they carry no `id_servidor`.
    pub missing_id_rows: usize,
    /// Records the CSV reader could not decode at all.
    pub parse_errors: usize,
    /// Non-empty amounts, dates or hours that were unparseable and became null.
    pub coerced_values: usize,
}

/// Check the path before any read: missing file first, then extension.
pub fn validate_path(path: &Path) -> Result<(), LoadError> {
    match std::fs::metadata(path) {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(LoadError::NotFound { path: path.to_path_buf() });
        }
        Err(e) => return Err(LoadError::Io(e)),
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != EXPECTED_EXTENSION {
        return Err(LoadError::WrongFormat { extension });
    }
    Ok(())
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn load_payroll(path: &Path) -> Result<(Vec<PaymentRow>, LoadReport), LoadError> {
    validate_path(path)?;
    info!("Loading payroll dataset from {}", path.display());

    let mut rdr = ReaderBuilder::new().flexible(true).trim(Trim::Headers).from_path(path)?;
    let mut report = LoadReport::default();
    let mut rows: Vec<PaymentRow> = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        let raw = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping undecodable record {}: {}", report.total_rows, e);
                report.parse_errors += 1;
                continue;
            }
        };

        let Some(employee_id) = non_empty(raw.employee_id) else {
            report.missing_id_rows += 1;
            continue;
        };

        // Malformed values become null; only count the ones that had content.
        let mut coerce_f64 = |s: Option<String>| -> Option<f64> {
            let s = non_empty(s)?;
            let v = parse_f64_safe(Some(&s));
            if v.is_none() && !is_null_like(&s) {
                report.coerced_values += 1;
            }
            v
        };
        let gross_amount = coerce_f64(raw.gross_amount);
        let weekly_hours = coerce_f64(raw.weekly_hours);

        let termination_date = match non_empty(raw.termination_date) {
            Some(s) => {
                let d = parse_date_safe(Some(&s));
                if d.is_none() && !is_null_like(&s) {
                    report.coerced_values += 1;
                }
                d
            }
            None => None,
        };

        rows.push(PaymentRow {
            employee_id,
            gender: Gender::parse(raw.gender.as_deref()),
            role_title: non_empty(raw.role_title),
            role_category: non_empty(raw.role_category),
            payment_type: non_empty(raw.payment_type),
            gross_amount,
            termination_date,
            weekly_hours,
        });
    }

    report.loaded_rows = rows.len();
    if report.missing_id_rows > 0 || report.parse_errors > 0 {
        warn!(
            "Skipped {} rows without employee id and {} undecodable rows",
            report.missing_id_rows, report.parse_errors
        );
    }
    info!("Loaded {} of {} rows", report.loaded_rows, report.total_rows);
    Ok((rows, report))
}

fn is_null_like(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "nan" | "nat" | "none" | "null" | "<na>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    fn write_fixture(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = load_payroll(Path::new("/nonexistent/folha-pagamento-2025.csv")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_io_failures_keep_their_own_kind() {
        let err: LoadError = std::io::Error::new(ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, LoadError::Io(_)));
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn test_wrong_extension_is_rejected() {
        let file = write_fixture(".parquet", "id_servidor\n1\n");
        let err = load_payroll(file.path()).unwrap_err();
        match err {
            LoadError::WrongFormat { extension } => assert_eq!(extension, "parquet"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_coerces_and_trims() {
        let content = "\
 id_servidor ,genero,cargo,categoria_cargo,tipo_pagamento,proventos,data_desligamento,carga_horaria_semanal,extra
10,F,Professora, Educacao ,folha_mensal,\"3.200,50\",,,x
10,F,Professora,educacao,13_parcela,abc,,,x
11,M,Assessor.c,comissionado,rescisao,1200,15/08/2025,40,x
,M,Vigia,operacional,folha_mensal,1500,,,x
12,nan,Gari,nan,folha_mensal,nan,NaT,,x
";
        let file = write_fixture(".csv", content);
        let (rows, report) = load_payroll(file.path()).unwrap();

        assert_eq!(report.total_rows, 5);
        assert_eq!(report.loaded_rows, 4);
        assert_eq!(report.missing_id_rows, 1);
        assert_eq!(report.coerced_values, 1);

        assert_eq!(rows[0].employee_id, "10");
        assert_eq!(rows[0].gross_amount, Some(3200.5));
        assert_eq!(rows[0].role_category.as_deref(), Some("Educacao"));
        assert_eq!(rows[1].gross_amount, None);
        assert_eq!(rows[2].termination_date, NaiveDate::from_ymd_opt(2025, 8, 15));
        assert_eq!(rows[2].weekly_hours, Some(40.0));
        assert_eq!(rows[3].gender, Gender::Unknown);
        assert_eq!(rows[3].termination_date, None);
    }

    #[test]
    fn test_missing_optional_columns() {
        let file = write_fixture(".CSV", "id_servidor,genero,proventos\n1,F,100\n");
        let (rows, _) = load_payroll(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].payment_type, None);
        assert_eq!(rows[0].weekly_hours, None);
    }
}
