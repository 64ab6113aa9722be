//! Category rules and the one-row-per-employee projection.
//!
//! Every view that needs an employee-scoped attribute goes through
//! [`project_employees`], so the appointed-position override and the
//! "first non-null wins" resolution are applied the same way everywhere.

use crate::types::{Gender, PaymentRow};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Canonical category key for appointed ("comissionado") positions.
pub const COMMISSIONED: &str = "comissionado";
pub const MONTHLY_PAYROLL: &str = "folha_mensal";

const COMMISSIONED_ALIASES: &[&str] = &[COMMISSIONED, "commissionado", "commissioned", "comissionados"];
const NULL_LIKE: &[&str] = &["nan", "none", "null", "<na>", "na", "n/a"];

/// Trim + lowercase; null-like artifacts (`"nan"`, `"None"`, ...) become `None`.
fn normalize_key(raw: Option<&str>) -> Option<String> {
    let s = raw?.trim().to_lowercase();
    if s.is_empty() || NULL_LIKE.contains(&s.as_str()) {
        return None;
    }
    Some(s)
}

/// Normalized category key; every spelling of the appointed category maps
/// to [`COMMISSIONED`].
pub fn normalize_category(raw: Option<&str>) -> Option<String> {
    let s = normalize_key(raw)?;
    if COMMISSIONED_ALIASES.contains(&s.as_str()) {
        return Some(COMMISSIONED.to_string());
    }
    Some(s)
}

pub fn normalize_payment_type(raw: Option<&str>) -> Option<String> {
    normalize_key(raw)
}

/// A role title ending in `.c` marks an appointed position. Case and
/// whitespace are ignored, so `"Diretor .C "` matches.
pub fn is_appointed_title(title: Option<&str>) -> bool {
    title
        .map(|t| {
            t.chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase()
                .ends_with(".c")
        })
        .unwrap_or(false)
}

pub fn is_monthly_payroll(row: &PaymentRow) -> bool {
    normalize_payment_type(row.payment_type.as_deref()).as_deref() == Some(MONTHLY_PAYROLL)
}

/// Category a single row counts under for row-scoped totals: `comissionado`
/// when the owning employee is appointed, otherwise the row's own category.
pub fn row_category(row: &PaymentRow, index: &HashMap<&str, EmployeeProfile<'_>>) -> Option<String> {
    if index.get(row.employee_id.as_str()).is_some_and(|p| p.appointed) {
        return Some(COMMISSIONED.to_string());
    }
    normalize_category(row.role_category.as_deref())
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeProfile<'a> {
    pub employee_id: &'a str,
    pub gender: Gender,
    pub role_title: Option<&'a str>,
    /// Effective category: `comissionado` when appointed, otherwise the
    /// first non-null normalized category.
    pub category: Option<String>,
    pub appointed: bool,
    /// Highest monthly payroll amount; `None` when the employee has no
    /// monthly payroll row with an amount (e.g. severance only).
    pub max_monthly: Option<f64>,
    /// First title ending in `.c`, if any.
    pub appointed_title: Option<&'a str>,
    /// Highest monthly payroll amount per distinct title, in first-seen order.
    pub monthly_by_title: Vec<(&'a str, f64)>,
    pub weekly_hours: Option<f64>,
    pub termination_date: Option<NaiveDate>,
    pub gender_conflict: bool,
    pub category_conflict: bool,
    pub multiple_titles: bool,
}

impl<'a> EmployeeProfile<'a> {
    fn new(employee_id: &'a str) -> Self {
        Self {
            employee_id,
            gender: Gender::Unknown,
            role_title: None,
            category: None,
            appointed: false,
            max_monthly: None,
            appointed_title: None,
            monthly_by_title: Vec::new(),
            weekly_hours: None,
            termination_date: None,
            gender_conflict: false,
            category_conflict: false,
            multiple_titles: false,
        }
    }

    fn absorb(&mut self, row: &'a PaymentRow) {
        if row.gender.is_known() {
            if !self.gender.is_known() {
                self.gender = row.gender.clone();
            } else if self.gender != row.gender {
                self.gender_conflict = true;
            }
        }

        let title = row.role_title.as_deref().map(str::trim).filter(|t| !t.is_empty());
        if let Some(t) = title {
            match self.role_title {
                None => self.role_title = Some(t),
                Some(first) if first != t => self.multiple_titles = true,
                _ => {}
            }
        }

        if is_appointed_title(title) && self.appointed_title.is_none() {
            self.appointed_title = title;
        }
        let category = normalize_category(row.role_category.as_deref());
        if category.as_deref() == Some(COMMISSIONED) || is_appointed_title(title) {
            self.appointed = true;
        }
        if let Some(c) = category {
            if self.category.is_none() {
                self.category = Some(c);
            } else if self.category.as_ref() != Some(&c) {
                self.category_conflict = true;
            }
        }

        if is_monthly_payroll(row) {
            if let Some(amount) = row.gross_amount {
                self.max_monthly = Some(self.max_monthly.map_or(amount, |m| m.max(amount)));
                if let Some(t) = title {
                    match self.monthly_by_title.iter_mut().find(|(seen, _)| *seen == t) {
                        Some(entry) => entry.1 = entry.1.max(amount),
                        None => self.monthly_by_title.push((t, amount)),
                    }
                }
            }
        }
        self.weekly_hours = self.weekly_hours.or(row.weekly_hours);
        self.termination_date = self.termination_date.or(row.termination_date);
    }

    /// Title an appointed employee is listed under: the first `.c` title,
    /// else the first title.
    pub fn representative_title(&self) -> Option<&'a str> {
        self.appointed_title.or(self.role_title)
    }

    /// Highest monthly payroll amount among rows carrying `title`.
    pub fn monthly_for_title(&self, title: &str) -> Option<f64> {
        self.monthly_by_title
            .iter()
            .find(|(seen, _)| *seen == title)
            .map(|(_, amount)| *amount)
    }
}

/// One profile per distinct `employee_id`, in order of first appearance.
pub fn project_employees(rows: &[PaymentRow]) -> Vec<EmployeeProfile<'_>> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut profiles: Vec<EmployeeProfile<'_>> = Vec::new();
    for row in rows {
        let idx = *positions.entry(row.employee_id.as_str()).or_insert_with(|| {
            profiles.push(EmployeeProfile::new(row.employee_id.as_str()));
            profiles.len() - 1
        });
        profiles[idx].absorb(row);
    }
    for p in &mut profiles {
        if p.appointed {
            p.category = Some(COMMISSIONED.to_string());
        }
    }
    profiles
}

/// Same projection keyed by employee id, for row-scoped lookups.
pub fn index_employees(rows: &[PaymentRow]) -> HashMap<&str, EmployeeProfile<'_>> {
    project_employees(rows)
        .into_iter()
        .map(|p| (p.employee_id, p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, gender: &str, title: &str, category: Option<&str>, kind: &str, amount: f64) -> PaymentRow {
        PaymentRow {
            employee_id: id.to_string(),
            gender: Gender::parse(Some(gender)),
            role_title: Some(title.to_string()),
            role_category: category.map(str::to_string),
            payment_type: Some(kind.to_string()),
            gross_amount: Some(amount),
            termination_date: None,
            weekly_hours: None,
        }
    }

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category(Some("  Saude ")), Some("saude".to_string()));
        assert_eq!(normalize_category(Some("NaN")), None);
        assert_eq!(normalize_category(Some("   ")), None);
        assert_eq!(normalize_category(Some("Comissionado")), Some(COMMISSIONED.to_string()));
        assert_eq!(normalize_category(None), None);
    }

    #[test]
    fn test_payment_type_keeps_its_own_value() {
        assert_eq!(normalize_payment_type(Some(" FOLHA_MENSAL ")), Some(MONTHLY_PAYROLL.to_string()));
        assert_eq!(normalize_payment_type(Some("Commissioned")), Some("commissioned".to_string()));
        assert_eq!(normalize_payment_type(Some("nan")), None);
        assert_eq!(normalize_category(Some("Commissioned")), Some(COMMISSIONED.to_string()));
    }

    #[test]
    fn test_is_appointed_title() {
        assert!(is_appointed_title(Some("Diretor de Obras.c")));
        assert!(is_appointed_title(Some("Assessor .C  ")));
        assert!(!is_appointed_title(Some("Professor")));
        assert!(!is_appointed_title(Some("Medico c")));
        assert!(!is_appointed_title(None));
    }

    #[test]
    fn test_override_applies_even_when_appointed_row_is_not_first() {
        let rows = vec![
            row("7", "M", "Agente Administrativo", Some("administrativo"), "folha_mensal", 3000.0),
            row("7", "M", "Chefe de Divisao.c", Some("administrativo"), "folha_mensal", 6000.0),
        ];
        let profiles = project_employees(&rows);
        assert_eq!(profiles.len(), 1);
        assert!(profiles[0].appointed);
        assert_eq!(profiles[0].category.as_deref(), Some(COMMISSIONED));
        assert_eq!(profiles[0].role_title, Some("Agente Administrativo"));
        assert!(profiles[0].multiple_titles);
        assert_eq!(profiles[0].max_monthly, Some(6000.0));
        assert_eq!(profiles[0].representative_title(), Some("Chefe de Divisao.c"));
        assert_eq!(profiles[0].monthly_for_title("Chefe de Divisao.c"), Some(6000.0));
        assert_eq!(profiles[0].monthly_for_title("Agente Administrativo"), Some(3000.0));
    }

    #[test]
    fn test_first_non_null_wins_and_conflicts_are_flagged() {
        let rows = vec![
            row("1", "", "Professor", None, "13_adiantamento", 900.0),
            row("1", "F", "Professor", Some("educacao"), "folha_mensal", 2500.0),
            row("1", "M", "Professor", Some("saude"), "folha_mensal", 2400.0),
        ];
        let p = &project_employees(&rows)[0];
        assert_eq!(p.gender, Gender::Female);
        assert_eq!(p.category.as_deref(), Some("educacao"));
        assert!(p.gender_conflict);
        assert!(p.category_conflict);
        assert!(!p.multiple_titles);
    }

    #[test]
    fn test_severance_only_has_no_monthly_salary() {
        let rows = vec![row("3", "M", "Vigia", None, "rescisao", 1200.0)];
        let p = &project_employees(&rows)[0];
        assert_eq!(p.max_monthly, None);
        assert_eq!(p.category, None);
    }
}
