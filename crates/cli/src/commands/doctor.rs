use crate::commands::{
    CommandResult, EXIT_CONFIG, EXIT_DB_CONNECTIVITY, EXIT_MIGRATION, EXIT_RUNTIME,
};
use curio_core::config::{AppConfig, LoadOptions};
use curio_db::{connect_with_settings, DbPool};
use serde::Serialize;

const CATALOG_TABLES: [&str; 4] = ["item", "customer_order", "order_line", "item_view"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
    #[serde(skip)]
    exit_code: u8,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into(), exit_code: 0 }
    }

    fn fail(name: &'static str, details: impl Into<String>, exit_code: u8) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into(), exit_code }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: reason.to_string(), exit_code: 0 }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    /// Exit code of the first failing check, zero when all pass.
    fn exit_code(&self) -> u8 {
        self.checks
            .iter()
            .find(|check| check.status == CheckStatus::Fail)
            .map_or(0, |check| check.exit_code)
    }
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = report.exit_code();

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string(), EXIT_CONFIG));
            let reason = "skipped because configuration did not load";
            checks.push(DoctorCheck::skipped("database_connectivity", reason));
            checks.push(DoctorCheck::skipped("catalog_schema", reason));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck::fail(
                    "database_connectivity",
                    format!("failed to initialize async runtime: {error}"),
                    EXIT_RUNTIME,
                ),
                DoctorCheck::skipped("catalog_schema", "skipped because no runtime was available"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck::fail(
                        "database_connectivity",
                        format!("failed to connect to database: {error}"),
                        EXIT_DB_CONNECTIVITY,
                    ),
                    DoctorCheck::skipped(
                        "catalog_schema",
                        "skipped because the database is unreachable",
                    ),
                ];
            }
        };

        let connectivity = DoctorCheck::pass(
            "database_connectivity",
            format!("connected using `{}`", config.database.url),
        );
        let schema = check_catalog_schema(&pool).await;
        pool.close().await;
        vec![connectivity, schema]
    })
}

async fn check_catalog_schema(pool: &DbPool) -> DoctorCheck {
    let mut missing = Vec::new();
    for table in CATALOG_TABLES {
        let present = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(1) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        )
        .bind(table)
        .fetch_one(pool)
        .await;
        match present {
            Ok(1) => {}
            Ok(_) => missing.push(table),
            Err(error) => {
                return DoctorCheck::fail(
                    "catalog_schema",
                    format!("schema inspection failed: {error}"),
                    EXIT_DB_CONNECTIVITY,
                );
            }
        }
    }

    if missing.is_empty() {
        DoctorCheck::pass("catalog_schema", "catalog tables present")
    } else {
        DoctorCheck::fail(
            "catalog_schema",
            format!("missing tables: {} (run `curio migrate`)", missing.join(", ")),
            EXIT_MIGRATION,
        )
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
