use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use tabled::Tabled;

/// One CSV record as published, every column still a string. Missing
/// columns deserialize as `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawRow {
    #[serde(rename = "id_servidor")]
    pub employee_id: Option<String>,
    #[serde(rename = "genero")]
    pub gender: Option<String>,
    #[serde(rename = "cargo")]
    pub role_title: Option<String>,
    #[serde(rename = "categoria_cargo")]
    pub role_category: Option<String>,
    #[serde(rename = "tipo_pagamento")]
    pub payment_type: Option<String>,
    #[serde(rename = "proventos")]
    pub gross_amount: Option<String>,
    #[serde(rename = "data_desligamento")]
    pub termination_date: Option<String>,
    #[serde(rename = "carga_horaria_semanal")]
    pub weekly_hours: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gender {
    Female,
    Male,
    Other(String),
    Unknown,
}

impl Gender {
    /// Case and whitespace insensitive; null-like artifacts become `Unknown`.
    pub fn parse(raw: Option<&str>) -> Gender {
        let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Gender::Unknown;
        };
        match s.to_uppercase().as_str() {
            "F" => Gender::Female,
            "M" => Gender::Male,
            "NAN" | "NONE" | "NULL" | "NA" | "<NA>" => Gender::Unknown,
            other => Gender::Other(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Gender::Unknown)
    }

    pub fn label(&self) -> &str {
        match self {
            Gender::Female => "F",
            Gender::Male => "M",
            Gender::Other(s) => s,
            Gender::Unknown => "não informado",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Gender {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A typed fact row: one payment record for one employee.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRow {
    pub employee_id: String,
    pub gender: Gender,
    pub role_title: Option<String>,
    pub role_category: Option<String>,
    pub payment_type: Option<String>,
    pub gross_amount: Option<f64>,
    pub termination_date: Option<NaiveDate>,
    pub weekly_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct KpiRow {
    #[serde(rename = "TotalServidores")]
    #[tabled(rename = "TotalServidores")]
    pub headcount: usize,
    #[serde(rename = "TotalGasto")]
    #[tabled(skip)]
    pub total_spend: f64,
    #[serde(rename = "TotalGastoFmt")]
    #[tabled(rename = "TotalGasto")]
    pub total_spend_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct GenderCountRow {
    #[serde(rename = "Genero")]
    #[tabled(rename = "Genero")]
    pub gender: Gender,
    #[serde(rename = "TotalServidores")]
    #[tabled(rename = "TotalServidores")]
    pub count: usize,
    #[serde(rename = "Percentual")]
    #[tabled(skip)]
    pub percent: f64,
    #[serde(rename = "PercentualFmt")]
    #[tabled(rename = "Percentual")]
    pub percent_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct CategoryGenderRow {
    #[serde(rename = "Categoria")]
    #[tabled(rename = "Categoria")]
    pub category: String,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: usize,
    #[serde(rename = "TotalF")]
    #[tabled(rename = "TotalF")]
    pub total_f: usize,
    #[serde(rename = "TotalM")]
    #[tabled(rename = "TotalM")]
    pub total_m: usize,
    #[serde(rename = "PctF")]
    #[tabled(rename = "PctF")]
    pub pct_f: f64,
    #[serde(rename = "PctM")]
    #[tabled(rename = "PctM")]
    pub pct_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct CategoryCostRow {
    #[serde(rename = "Categoria")]
    #[tabled(rename = "Categoria")]
    pub category: String,
    #[serde(rename = "CustoTotal")]
    #[tabled(skip)]
    pub total_cost: f64,
    #[serde(rename = "CustoTotalFmt")]
    #[tabled(rename = "CustoTotal")]
    pub total_cost_display: String,
    #[serde(rename = "Magnitude")]
    #[tabled(rename = "Magnitude")]
    pub magnitude: String,
    #[serde(rename = "PctTotal")]
    #[tabled(rename = "PctTotal")]
    pub pct_of_grand_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct SalaryRankRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "IdServidor")]
    #[tabled(rename = "IdServidor")]
    pub employee_id: String,
    #[serde(rename = "Cargo")]
    #[tabled(rename = "Cargo")]
    pub role_title: String,
    #[serde(rename = "Genero")]
    #[tabled(rename = "Genero")]
    pub gender: Gender,
    #[serde(rename = "SalarioMensalMax")]
    #[tabled(skip)]
    pub max_monthly_salary: f64,
    #[serde(rename = "SalarioMensalMaxFmt")]
    #[tabled(rename = "SalarioMensalMax")]
    pub salary_display: String,
}

/// `base_salary` is `None` for employees with no monthly payroll row.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct AppointedRoleRow {
    #[serde(rename = "Cargo")]
    #[tabled(rename = "Cargo")]
    pub role_title: String,
    #[serde(rename = "SalarioBase")]
    #[tabled(skip)]
    pub base_salary: Option<f64>,
    #[serde(rename = "SalarioBaseFmt")]
    #[tabled(rename = "SalarioBase")]
    pub base_salary_display: String,
    #[serde(rename = "Servidores")]
    #[tabled(rename = "Servidores")]
    pub headcount: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeeklyHoursStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mode: Option<f64>,
}

/// F/M counts over a deduplicated population; `other` holds every
/// employee whose gender is neither, unknown included.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenderSplit {
    pub total: usize,
    pub female: usize,
    pub male: usize,
    pub other: usize,
    pub pct_female: f64,
    pub pct_male: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppointedRollup {
    pub by_role: Vec<AppointedRoleRow>,
    pub headcount: usize,
    pub monthly_payroll_headcount: usize,
    pub severance_only_headcount: usize,
    pub total_cost: f64,
    pub weekly_hours: WeeklyHoursStats,
    pub gender_split: GenderSplit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TerminationSummary {
    pub year: i32,
    pub split: GenderSplit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub conflicting_gender: usize,
    pub conflicting_category: usize,
    pub multiple_role_titles: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub rows: usize,
    pub employees: usize,
    pub rows_by_payment_type: Vec<(String, usize)>,
    pub missing_amounts: usize,
    pub skipped_rows: usize,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub headcount: usize,
    pub total_spend: f64,
    pub gender_distribution: Vec<GenderCountRow>,
    pub appointed_headcount: usize,
    pub appointed_severance_only: usize,
    pub appointed_total_cost: f64,
    pub appointed_weekly_hours: WeeklyHoursStats,
    pub appointed_gender: GenderSplit,
    pub terminations: TerminationSummary,
    pub data_quality: DataQualityReport,
    pub overview: DatasetOverview,
}
