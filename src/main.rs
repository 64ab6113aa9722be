// Entry point and high-level CLI flow.
//
// - Option [1] loads the processed payroll CSV and prints load diagnostics.
// - Option [2] runs every aggregation, exports CSV/JSON files and prints
//   markdown previews of each view.
// - After generating reports, the user can go back to the menu or exit.
mod config;
mod employees;
mod error;
mod loader;
mod output;
mod reports;
mod types;
mod util;

use config::SETTINGS;
use loader::LoadReport;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;
use types::{Gender, PaymentRow};

// The dataset is loaded once and reused by every report run in the session.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<(Vec<PaymentRow>, LoadReport)>,
}

fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(SETTINGS.log_level)
        .with_target(false)
        .compact()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load() {
    match loader::load_payroll(&SETTINGS.data_path) {
        Ok((data, load_report)) => {
            println!(
                "Processing dataset... ({} rows read, {} loaded)",
                util::format_int(load_report.total_rows),
                util::format_int(load_report.loaded_rows)
            );
            if load_report.missing_id_rows + load_report.parse_errors > 0 {
                println!(
                    "Note: {} rows skipped (missing employee id or undecodable).",
                    util::format_int(load_report.missing_id_rows + load_report.parse_errors)
                );
            }
            if load_report.coerced_values > 0 {
                println!(
                    "Info: {} malformed values treated as missing.",
                    util::format_int(load_report.coerced_values)
                );
            }
            println!();
            match APP_STATE.lock() {
                Ok(mut state) => state.data = Some((data, load_report)),
                Err(e) => error!("App state poisoned: {}", e),
            }
        }
        Err(e) => {
            error!("Load failed: {}", e);
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

fn export<T: serde::Serialize>(name: &str, rows: &[T]) {
    let path = SETTINGS.output_dir.join(name);
    if let Err(e) = output::write_csv(&path, rows) {
        eprintln!("Write error ({}): {}", path.display(), e);
    } else {
        info!("Wrote {}", path.display());
    }
}

fn handle_generate_reports() {
    let loaded = match APP_STATE.lock() {
        Ok(state) => state.data.clone(),
        Err(e) => {
            error!("App state poisoned: {}", e);
            None
        }
    };
    let Some((data, load_report)) = loaded else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    let year = SETTINGS.reference_year;
    let top_n = SETTINGS.top_n;

    println!("Generating reports...\n");

    let kpis = vec![reports::kpis(&data)];
    export("kpis.csv", &kpis);
    output::preview_table(&format!("Panorama Geral {}", year), None, &kpis, 1);

    let genders = reports::gender_distribution(&data);
    export("gender_distribution.csv", &genders);
    output::preview_table("Distribuição de servidores por gênero", None, &genders, 5);

    let profile = reports::category_gender_profile(&data);
    export("category_gender_profile.csv", &profile);
    output::preview_table("Gênero por categoria de cargo", Some("comissionados pelo sufixo .c"), &profile, 10);

    let costs = reports::annual_cost_by_category(&data);
    export("annual_cost_by_category.csv", &costs);
    output::preview_table("Custo anual por categoria", Some("todos os tipos de pagamento"), &costs, 10);

    let top_note = format!("Top {} por salário mensal (folha_mensal)", top_n);
    for (file, title, filter) in [
        ("top_salaries.csv", "Maiores salários", None),
        ("top_salaries_f.csv", "Maiores salários (F)", Some(Gender::Female)),
        ("top_salaries_m.csv", "Maiores salários (M)", Some(Gender::Male)),
    ] {
        let top = reports::top_n_salaries(&data, top_n, filter.as_ref());
        export(file, &top);
        output::preview_table(title, Some(&top_note), &top, top_n);
    }

    let appointed = reports::appointed_staff_rollup(&data);
    export("appointed_by_role.csv", &appointed.by_role);
    output::preview_table(
        "Cargos comissionados",
        Some(&format!(
            "{} servidores, {} apenas rescisão, custo {}",
            appointed.headcount,
            appointed.severance_only_headcount,
            util::format_money(Some(appointed.total_cost))
        )),
        &appointed.by_role,
        10,
    );

    let summary = reports::generate_summary(&data, &load_report, year);
    let summary_path = SETTINGS.output_dir.join("summary.json");
    if let Err(e) = output::write_json(&summary_path, &summary) {
        eprintln!("Write error ({}): {}", summary_path.display(), e);
    }
    let terminations = &summary.terminations.split;
    println!(
        "Desligamentos em {}: {} (F {}, M {})",
        year,
        terminations.total,
        util::format_percent(terminations.pct_female, 1),
        util::format_percent(terminations.pct_male, 1)
    );
    println!("(Full tables exported to {})\n", display_dir(&SETTINGS.output_dir));
}

fn display_dir(dir: &Path) -> String {
    dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf()).display().to_string()
}

fn main() {
    init_logging();
    info!("Payroll report v{}", env!("CARGO_PKG_VERSION"));
    loop {
        println!("Folha de Pagamento {}", SETTINGS.reference_year);
        println!("[1] Load the file");
        println!("[2] Generate Reports\n");
        match read_choice().as_str() {
            "1" => handle_load(),
            "2" => {
                println!();
                handle_generate_reports();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
}
