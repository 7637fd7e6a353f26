//! scandeval-openai binary entry point

use std::path::Path;

use color_eyre::Result;
use scandeval_openai::{
    cli::{Cli, Commands},
    config::{BenchmarkConfig, DatasetConfig, ModelConfig, ReferenceConfig, Settings},
    GenerationOverrides, OpenAIModel, OpenAITokenizer, TokenTensor,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Install error handler
    color_eyre::install()?;

    // Pick up OPENAI_API_KEY and friends from a local .env file
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Set up logging
    let default_level = if cli.verbose {
        "scandeval_openai=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let model_config = ModelConfig::new(&cli.model);
    let reference = ReferenceConfig::from(&cli.tokens);

    // Handle commands
    match cli.command {
        Some(Commands::Tokenize { texts }) => {
            let tokenizer = OpenAITokenizer::new(model_config, reference)?;
            if let TokenTensor::Batch(rows) = tokenizer.encode_batch(&texts) {
                for row in rows {
                    println!("{}", serde_json::to_string(&row)?);
                }
            }
        }
        Some(Commands::Decode { ids }) => {
            let tokenizer = OpenAITokenizer::new(model_config, reference)?;
            println!("{}", tokenizer.decode(&ids)?);
        }
        Some(Commands::Generate {
            prompts,
            generation,
        }) => {
            let model = load_model(cli.config.as_deref(), cli.base_url, model_config, reference)?;
            info!(model = %cli.model, prompts = prompts.len(), "Generating");

            let inputs = model.tokenizer().encode_batch(&prompts);
            let output = model
                .generate(&inputs, None, &GenerationOverrides::from(&generation))
                .await?;
            for row in output.rows() {
                println!("{}", model.tokenizer().decode(row)?);
            }
        }
        Some(Commands::Backend) => {
            let model = load_model(cli.config.as_deref(), cli.base_url, model_config, reference)?;
            println!("{}", model.backend_kind().await?);
        }
        Some(Commands::Version) => {
            println!("scandeval-openai version {}", env!("CARGO_PKG_VERSION"));
        }
        None => {
            println!("No command given");
            println!("Use --help for more information");
        }
    }

    Ok(())
}

/// Build the model adapter from settings, environment and CLI overrides
fn load_model(
    config_path: Option<&Path>,
    base_url: Option<String>,
    model_config: ModelConfig,
    reference: ReferenceConfig,
) -> Result<OpenAIModel> {
    let mut settings = match config_path {
        Some(path) => {
            let mut settings = Settings::load_from_path(path)?;
            settings.apply_env();
            settings
        }
        None => Settings::load()?,
    };
    if let Some(url) = base_url {
        settings.base_url = url;
    }
    settings.validate()?;

    let tokenizer = OpenAITokenizer::new(model_config.clone(), reference)?;
    let model = OpenAIModel::from_settings(
        &settings,
        model_config,
        reference,
        DatasetConfig::default(),
        BenchmarkConfig::default(),
        tokenizer,
    )?;
    Ok(model)
}
