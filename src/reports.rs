use crate::employees::{index_employees, normalize_payment_type, project_employees, row_category, EmployeeProfile};
use crate::loader::LoadReport;
use crate::types::{
    AppointedRoleRow, AppointedRollup, CategoryCostRow, CategoryGenderRow, DataQualityReport, DatasetOverview, Gender,
    GenderCountRow, GenderSplit, KpiRow, PaymentRow, SalaryRankRow, SummaryStats, TerminationSummary, WeeklyHoursStats,
};
use crate::util::{format_magnitude, format_money, format_percent, mode, percent, round_to};
use chrono::Datelike;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Display label for employees or rows with no usable category.
pub const UNCATEGORIZED: &str = "sem categoria";

/// Distinct employees and the sum of every non-null amount (all payment types).
pub fn headcount_and_total_spend(data: &[PaymentRow]) -> (usize, f64) {
    let ids: HashSet<&str> = data.iter().map(|r| r.employee_id.as_str()).collect();
    let total: f64 = data.iter().filter_map(|r| r.gross_amount).sum();
    (ids.len(), total)
}

pub fn kpis(data: &[PaymentRow]) -> KpiRow {
    let (headcount, total_spend) = headcount_and_total_spend(data);
    KpiRow {
        headcount,
        total_spend,
        total_spend_display: format_money(Some(total_spend)),
    }
}

/// F/M split whose percentages are derived from the integer counts only.
/// When nobody falls outside F/M, the male share is taken as the complement
/// so the two always add up to exactly 100.
fn gender_split<'g, I>(genders: I) -> GenderSplit
where
    I: IntoIterator<Item = &'g Gender>,
{
    let (mut total, mut female, mut male) = (0usize, 0usize, 0usize);
    for g in genders {
        total += 1;
        match g {
            Gender::Female => female += 1,
            Gender::Male => male += 1,
            _ => {}
        }
    }
    let other = total - female - male;
    let pct_female = round_to(percent(female as f64, total as f64), 1);
    let pct_male = if total > 0 && other == 0 {
        round_to(100.0 - pct_female, 1)
    } else {
        round_to(percent(male as f64, total as f64), 1)
    };
    GenderSplit {
        total,
        female,
        male,
        other,
        pct_female,
        pct_male,
    }
}

/// One bucket per gender value present after deduplicating by employee,
/// unknown included. Sorted by count, then label.
pub fn gender_distribution(data: &[PaymentRow]) -> Vec<GenderCountRow> {
    let profiles = project_employees(data);
    let mut counts: HashMap<&Gender, usize> = HashMap::new();
    for p in &profiles {
        *counts.entry(&p.gender).or_default() += 1;
    }
    let total = profiles.len() as f64;
    let mut rows: Vec<GenderCountRow> = counts
        .into_iter()
        .map(|(gender, count)| {
            let pct = round_to(percent(count as f64, total), 1);
            GenderCountRow {
                gender: gender.clone(),
                count,
                percent: pct,
                percent_display: format_percent(pct, 1),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.gender.cmp(&b.gender)));
    rows
}

pub fn category_gender_profile(data: &[PaymentRow]) -> Vec<CategoryGenderRow> {
    let profiles = project_employees(data);
    let mut groups: HashMap<&str, Vec<&Gender>> = HashMap::new();
    for p in &profiles {
        let key = p.category.as_deref().unwrap_or(UNCATEGORIZED);
        groups.entry(key).or_default().push(&p.gender);
    }
    let mut rows: Vec<CategoryGenderRow> = groups
        .into_iter()
        .map(|(category, genders)| {
            let split = gender_split(genders);
            CategoryGenderRow {
                category: category.to_string(),
                total: split.total,
                total_f: split.female,
                total_m: split.male,
                pct_f: split.pct_female,
                pct_m: split.pct_male,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    debug!("Category profile: {} categories over {} employees", rows.len(), profiles.len());
    rows
}

/// Row-scoped cost per category; every payment type counts and each row is
/// grouped by its own category, except that all rows of an appointed
/// employee count as `comissionado`.
pub fn annual_cost_by_category(data: &[PaymentRow]) -> Vec<CategoryCostRow> {
    let index = index_employees(data);
    let mut totals: HashMap<String, f64> = HashMap::new();
    for r in data {
        let key = row_category(r, &index).unwrap_or_else(|| UNCATEGORIZED.to_string());
        *totals.entry(key).or_default() += r.gross_amount.unwrap_or(0.0);
    }
    let grand_total: f64 = totals.values().sum();
    let mut rows: Vec<CategoryCostRow> = totals
        .into_iter()
        .map(|(category, total_cost)| CategoryCostRow {
            category,
            total_cost,
            total_cost_display: format_money(Some(total_cost)),
            magnitude: format_magnitude(total_cost),
            pct_of_grand_total: round_to(percent(total_cost, grand_total), 2),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_cost
            .partial_cmp(&a.total_cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    rows
}

/// Highest monthly payroll amounts, one entry per employee. Only
/// `folha_mensal` rows feed the salary, and each employee contributes the
/// maximum amount seen, not the sum.
///
/// Equal salaries keep the order in which the employees first appear in
/// the table.
pub fn top_n_salaries(data: &[PaymentRow], n: usize, gender_filter: Option<&Gender>) -> Vec<SalaryRankRow> {
    let profiles = project_employees(data);
    let mut ranked: Vec<(f64, &EmployeeProfile<'_>)> = profiles
        .iter()
        .filter(|p| gender_filter.map_or(true, |g| p.gender == *g))
        .filter_map(|p| p.max_monthly.map(|salary| (salary, p)))
        .collect();
    // `sort_by` is stable, so ties stay in first-appearance order.
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    ranked
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(idx, (salary, p))| SalaryRankRow {
            rank: idx + 1,
            employee_id: p.employee_id.to_string(),
            role_title: p.role_title.unwrap_or("-").to_string(),
            gender: p.gender.clone(),
            max_monthly_salary: salary,
            salary_display: format_money(Some(salary)),
        })
        .collect()
}

pub fn appointed_staff_rollup(data: &[PaymentRow]) -> AppointedRollup {
    let profiles = project_employees(data);
    let appointed: Vec<&EmployeeProfile<'_>> = profiles.iter().filter(|p| p.appointed).collect();
    let appointed_ids: HashSet<&str> = appointed.iter().map(|p| p.employee_id).collect();

    // Each employee lands in exactly one (role, has-monthly-salary) bucket,
    // salaried only by monthly rows carrying that role's title.
    let listed: Vec<(&str, Option<f64>)> = appointed
        .iter()
        .map(|p| match p.representative_title() {
            Some(title) => (title, p.monthly_for_title(title)),
            None => ("-", p.max_monthly),
        })
        .collect();
    let mut by_role: HashMap<(&str, bool), (Option<f64>, usize)> = HashMap::new();
    for (title, salary) in &listed {
        let e = by_role.entry((*title, salary.is_some())).or_insert((None, 0));
        if let Some(salary) = *salary {
            e.0 = Some(e.0.map_or(salary, |s: f64| s.max(salary)));
        }
        e.1 += 1;
    }
    let mut by_role: Vec<AppointedRoleRow> = by_role
        .into_iter()
        .map(|((role, _), (salary, headcount))| AppointedRoleRow {
            role_title: role.to_string(),
            base_salary: salary,
            base_salary_display: format_money(salary),
            headcount,
        })
        .collect();
    by_role.sort_by(|a, b| match (a.base_salary, b.base_salary) {
        (Some(x), Some(y)) => y
            .partial_cmp(&x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.role_title.cmp(&b.role_title)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.role_title.cmp(&b.role_title),
    });

    let total_cost: f64 = data
        .iter()
        .filter(|r| appointed_ids.contains(r.employee_id.as_str()))
        .filter_map(|r| r.gross_amount)
        .sum();

    let hours: Vec<f64> = appointed.iter().filter_map(|p| p.weekly_hours).collect();
    let weekly_hours = WeeklyHoursStats {
        min: hours.iter().copied().reduce(f64::min),
        max: hours.iter().copied().reduce(f64::max),
        mode: mode(&hours),
    };

    let monthly_payroll_headcount = listed.iter().filter(|(_, salary)| salary.is_some()).count();
    AppointedRollup {
        by_role,
        headcount: appointed.len(),
        monthly_payroll_headcount,
        severance_only_headcount: appointed.len() - monthly_payroll_headcount,
        total_cost,
        weekly_hours,
        gender_split: gender_split(appointed.iter().map(|p| &p.gender)),
    }
}

/// Employees whose termination date falls in `year`, split by gender.
pub fn terminations_by_gender(data: &[PaymentRow], year: i32) -> TerminationSummary {
    let profiles = project_employees(data);
    let split = gender_split(
        profiles
            .iter()
            .filter(|p| p.termination_date.is_some_and(|d| d.year() == year))
            .map(|p| &p.gender),
    );
    TerminationSummary { year, split }
}

pub fn data_quality(data: &[PaymentRow]) -> DataQualityReport {
    let profiles = project_employees(data);
    let report = DataQualityReport {
        conflicting_gender: profiles.iter().filter(|p| p.gender_conflict).count(),
        conflicting_category: profiles.iter().filter(|p| p.category_conflict).count(),
        multiple_role_titles: profiles.iter().filter(|p| p.multiple_titles).count(),
    };
    if report.conflicting_gender > 0 || report.conflicting_category > 0 {
        warn!(
            "Data quality: {} employees with conflicting gender, {} with conflicting category (first non-null kept)",
            report.conflicting_gender, report.conflicting_category
        );
    }
    report
}

pub fn dataset_overview(data: &[PaymentRow], load_report: &LoadReport) -> DatasetOverview {
    let (employees, _) = headcount_and_total_spend(data);
    let mut by_type: HashMap<String, usize> = HashMap::new();
    for r in data {
        let key = normalize_payment_type(r.payment_type.as_deref()).unwrap_or_else(|| "não informado".to_string());
        *by_type.entry(key).or_default() += 1;
    }
    let mut rows_by_payment_type: Vec<(String, usize)> = by_type.into_iter().collect();
    rows_by_payment_type.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    DatasetOverview {
        rows: data.len(),
        employees,
        rows_by_payment_type,
        missing_amounts: data.iter().filter(|r| r.gross_amount.is_none()).count(),
        skipped_rows: load_report.missing_id_rows + load_report.parse_errors,
    }
}

pub fn generate_summary(data: &[PaymentRow], load_report: &LoadReport, year: i32) -> SummaryStats {
    let (headcount, total_spend) = headcount_and_total_spend(data);
    let appointed = appointed_staff_rollup(data);
    SummaryStats {
        headcount,
        total_spend,
        gender_distribution: gender_distribution(data),
        appointed_headcount: appointed.headcount,
        appointed_severance_only: appointed.severance_only_headcount,
        appointed_total_cost: appointed.total_cost,
        appointed_weekly_hours: appointed.weekly_hours,
        appointed_gender: appointed.gender_split,
        terminations: terminations_by_gender(data, year),
        data_quality: data_quality(data),
        overview: dataset_overview(data, load_report),
    }
}
