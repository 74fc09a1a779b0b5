use crate::commands::{open_pool, prepare, CommandResult, StepFailure, EXIT_MIGRATION};
use curio_db::migrations;

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("migrate") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;
        pool.close().await;
        Ok::<(), StepFailure>(())
    });

    match result {
        Ok(()) => CommandResult::success(
            "migrate",
            format!("applied pending migrations to `{}`", config.database.url),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
