//! Verifies that the configured Gemini key can reach the model service.

use backend::analysis::prompt::CONNECTIVITY_PROMPT;
use backend::analysis::GeminiClient;
use backend::config::{redact_key, AppConfig};
use std::process::ExitCode;

#[actix_web::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let Some(api_key) = config.api_key.as_deref() else {
        eprintln!("Error: No Gemini API key found in environment variables.");
        eprintln!("Please set GEMINI_API_KEY (or GOOGLE_API_KEY) in your .env file.");
        return ExitCode::FAILURE;
    };
    println!("API key found: {} (middle redacted)", redact_key(api_key));

    let client = match GeminiClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("\nTesting connection to the Gemini API...");
    let result = async {
        let models = client.list_models().await?;
        println!("\nAvailable Gemini models:");
        for model in models.iter().filter(|m| m.name.contains("gemini")) {
            match &model.display_name {
                Some(display) => println!("  - {} ({})", model.name, display),
                None => println!("  - {}", model.name),
            }
        }

        println!("\nTesting {} with a simple prompt...", client.model());
        client.generate_text(CONNECTIVITY_PROMPT).await
    }
    .await;

    match result {
        Ok(reply) => {
            println!("\nAPI Response:\n{}\n{}\n{}", "-".repeat(40), reply.trim(), "-".repeat(40));
            println!("\nAPI test successful.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\nError connecting to Gemini API: {}", e);
            eprintln!("\nPossible issues:");
            eprintln!("1. Invalid API key");
            eprintln!("2. No internet connection");
            eprintln!("3. API quota exceeded");
            eprintln!("4. Missing or incorrect permissions for your API key");
            ExitCode::FAILURE
        }
    }
}
