use storefront_db::DemoCatalog;

use crate::commands::{block_on, load_config, open_migrated_pool, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let result = block_on("seed", async {
        let pool = open_migrated_pool(&config).await?;

        let seeded = DemoCatalog::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = DemoCatalog::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;
        pool.close().await;

        if !verification.all_present {
            let missing = verification
                .checks
                .iter()
                .filter_map(|(name, present)| (!present).then_some(*name))
                .collect::<Vec<_>>();
            return Err(("seed_verification", verification_message(&missing), 6u8));
        }

        Ok::<_, StepFailure>(seeded.products_seeded)
    });

    match result {
        Ok(products) => CommandResult::success("seed", seed_message(&products)),
        Err(failure) => failure,
    }
}

fn seed_message(products: &[String]) -> String {
    let lines = products.iter().map(|name| format!("  - {name}")).collect::<Vec<_>>();
    format!("demo catalog loaded with {} products:\n{}", products.len(), lines.join("\n"))
}

fn verification_message(missing: &[&str]) -> String {
    if missing.is_empty() {
        "demo catalog verification failed".to_string()
    } else {
        format!("demo catalog is missing: {}", missing.join(", "))
    }
}
