use crate::commands::{
    open_pool, prepare, CommandResult, StepFailure, EXIT_CONFIG, EXIT_RUNTIME,
};
use curio_core::domain::user::UserId;
use curio_core::recommendations::{RecommendationEngine, SessionContext};
use curio_db::SqlCatalogStore;

/// Rank items for one user against the configured catalog and print the
/// tagged recommendation.
pub fn run(user_id: &str, categories: Vec<String>) -> CommandResult {
    let user_id = match UserId::parse(user_id) {
        Ok(user_id) => user_id,
        Err(error) => {
            return CommandResult::failure(
                "recommend",
                "input_validation",
                error.to_string(),
                EXIT_CONFIG,
            );
        }
    };
    let session = if categories.is_empty() {
        SessionContext::new()
    } else {
        SessionContext::new().with_categories(categories)
    };

    let (config, runtime) = match prepare("recommend") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let engine = RecommendationEngine::new(SqlCatalogStore::new(pool.clone()));
        let recommendation = engine.recommend(user_id.as_str(), &session).await;
        pool.close().await;
        Ok::<_, StepFailure>(recommendation)
    });

    match result {
        Ok(recommendation) => {
            let message = format!(
                "{} items for {} ({})",
                recommendation.items.len(),
                user_id,
                recommendation.outcome.as_str()
            );
            match serde_json::to_value(&recommendation) {
                Ok(data) => CommandResult::success_with_data("recommend", message, Some(data)),
                Err(error) => CommandResult::failure(
                    "recommend",
                    "serialization",
                    error.to_string(),
                    EXIT_RUNTIME,
                ),
            }
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("recommend", error_class, message, exit_code)
        }
    }
}
