use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use onboarding_intake::config::lambda as env_config;
use onboarding_intake::utils::{logger, validation::Validate};
use onboarding_intake::{handle_event, AirtableClient, FormEvent, FormResponse};

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 冷啟動時建立配置與 HTTP client，之後每次呼叫共用
    let config = env_config::from_env()?;
    config.validate()?;
    tracing::info!("Starting onboarding intake Lambda: {:?}", config.airtable);

    let client = AirtableClient::new(&config.airtable)?;
    let client = &client;
    let settings = &config.submission;

    run(service_fn(move |event: LambdaEvent<FormEvent>| async move {
        let response: FormResponse = handle_event(&event.payload, client, settings).await;
        Ok::<FormResponse, Error>(response)
    }))
    .await
}
