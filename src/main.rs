use std::io::Read;
use std::sync::Arc;

use mail_triage::config::TriageConfig;
use mail_triage::email::EmailMessage;
use mail_triage::error::ConfigError;
use mail_triage::llm::{LlmConfig, create_provider};
use mail_triage::memory::MemoryStore;
use mail_triage::pipeline::EmailProcessor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let api_key = match std::env::var("OPENAI_API_KEY") {
        Ok(key) => key,
        Err(_) => {
            eprintln!("  export OPENAI_API_KEY=sk-...");
            return Err(ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()).into());
        }
    };

    let config = TriageConfig::from_env()?;

    eprintln!("📬 mail-triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   Memory: {}", config.memory_path.display());

    // Email JSON from a file argument, or stdin when none is given.
    let input = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read {path}: {e}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let email: EmailMessage =
        serde_json::from_str(&input).map_err(|e| anyhow::anyhow!("invalid email JSON: {e}"))?;

    let llm = create_provider(&LlmConfig {
        api_key: secrecy::SecretString::from(api_key),
        model: config.model.clone(),
        base_url: std::env::var("MAIL_TRIAGE_BASE_URL").ok(),
    });
    let memory = Arc::new(MemoryStore::new(&config.memory_path, config.max_history));
    let processor = EmailProcessor::new(llm, memory, config);

    let output = processor.process(email).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
