use crate::commands::{
    open_pool, prepare, CommandResult, StepFailure, EXIT_MIGRATION, EXIT_VERIFICATION,
};
use curio_db::{migrations, DemoCatalog, DemoUser};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;

        let seed_result = DemoCatalog::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION))?;

        let verification = DemoCatalog::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), EXIT_VERIFICATION))?;

        let run_result: Result<SeedOutput, StepFailure> = if verification.all_present {
            Ok(SeedOutput { items: seed_result.items_seeded, users: seed_result.users })
        } else {
            let failed_checks = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(check.as_str()))
                .collect::<Vec<_>>();
            Err(("seed_verification", verification_message(&failed_checks), EXIT_VERIFICATION))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => CommandResult::success("seed", output.summary()),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

struct SeedOutput {
    items: usize,
    users: Vec<DemoUser>,
}

impl SeedOutput {
    fn summary(&self) -> String {
        let user_lines: Vec<String> = self
            .users
            .iter()
            .map(|user| {
                format!(
                    "  - {}: {} orders, {} views ({})",
                    user.user_id, user.orders, user.views, user.description
                )
            })
            .collect();
        format!(
            "demo catalog loaded with {} items for {} users:\n{}",
            self.items,
            self.users.len(),
            user_lines.join("\n")
        )
    }
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
