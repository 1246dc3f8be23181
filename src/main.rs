use clap::Parser;
use onboarding_intake::config::cli::Command;
use onboarding_intake::core::submission::SubmissionReport;
use onboarding_intake::domain::model::SubmissionPayload;
use onboarding_intake::domain::ports::RecordStore;
use onboarding_intake::utils::error::{ErrorKind, IntakeError};
use onboarding_intake::utils::{logger, validation::Validate};
use onboarding_intake::{
    AirtableClient, CategoryResolver, CliConfig, DryRunStore, IntakeConfig, SubmissionOrchestrator,
};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);
    tracing::info!("Starting onboarding-intake CLI");

    if let Err(e) = run(&cli).await {
        tracing::error!("❌ {} (Kind: {:?})", e, e.kind());
        eprintln!("❌ {}", e);

        // 依錯誤類型決定退出碼
        let exit_code = match e.kind() {
            ErrorKind::Configuration => 2,
            ErrorKind::MalformedInput => 3,
            ErrorKind::UpstreamRead | ErrorKind::UpstreamWrite => 4,
            ErrorKind::Transport => 5,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run(cli: &CliConfig) -> Result<(), IntakeError> {
    let config = cli.resolve()?;
    config.validate()?;
    tracing::debug!("Resolved config: {:?}", config);

    let client = AirtableClient::new(&config.airtable)?;

    match &cli.command {
        Command::Submit { payload, dry_run } => {
            let payload = read_payload(payload)?;
            if *dry_run {
                let store = DryRunStore::new(client);
                let report = submit(&store, &config, &payload).await;
                println!("{}", serde_json::to_string_pretty(&store.writes().await)?);
                report
            } else {
                submit(&client, &config, &payload).await
            }
        }
        Command::Categories { flat } => {
            let resolver = CategoryResolver::new(&client, &config.submission);
            let rendered = if *flat {
                serde_json::to_string_pretty(&resolver.resolve_flat().await?)?
            } else {
                serde_json::to_string_pretty(resolver.resolve().await?.categories())?
            };
            println!("{}", rendered);
            Ok(())
        }
    }
}

async fn submit<S: RecordStore>(
    store: &S,
    config: &IntakeConfig,
    payload: &SubmissionPayload,
) -> Result<(), IntakeError> {
    let report: SubmissionReport = SubmissionOrchestrator::new(store, &config.submission)
        .submit(payload)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!(
        "✅ User {} created with {} jurisdiction record(s)",
        report.user_id,
        report.created_count()
    );
    report.into_result().map(|_| ())
}

fn read_payload(path: &Path) -> Result<SubmissionPayload, IntakeError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
