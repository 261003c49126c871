use preference_survey::channels::{CliChannel, cli};
use preference_survey::config::SurveyConfig;
use preference_survey::llm::create_provider;
use preference_survey::survey::SurveyContent;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (stderr, so stdout stays the survey)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = SurveyConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export OPENAI_API_KEY=sk-...");
        std::process::exit(1);
    });

    let content = SurveyContent::load(
        &config.instructions_path,
        &config.paragraphs_path,
        config.rewrites_path.as_deref(),
    )
    .unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    eprintln!("📝 Learning Preference Survey v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   Training pages: {}", content.training.len());
    eprintln!("   Personalized pages: {}", content.rewrite_sources.len());
    eprintln!("   Output: {}", config.output_dir.display());
    eprintln!("   Type 'help' for commands. /quit to exit.\n");

    let llm = create_provider(&config.llm)?;

    let lines = CliChannel::new().start();
    cli::run(lines, &content, llm, &config.output_dir).await?;

    eprintln!("👋 Goodbye!");
    Ok(())
}
