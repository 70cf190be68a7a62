use anyhow::{Context, Result};
use benchjudge_cli::{Cli, Commands, Config, commands};
use benchjudge_core::{ChatClient, RequestContext};
use benchjudge_dispatch::{Dispatcher, EvaluationRequest};
use benchjudge_model::OpenAICompatibleClient;
use benchjudge_store::{EvalStore, SqliteEvalStore};
use clap::Parser;
use std::sync::Arc;

const SERVICE_NAME: &str = "benchjudge";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let telemetry = if cli.json_logs {
        benchjudge_telemetry::init_json_telemetry(SERVICE_NAME)
    } else {
        benchjudge_telemetry::init_telemetry(SERVICE_NAME)
    };
    telemetry.map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))?;

    let config = Config::load(cli.config.as_deref())?;
    let store = SqliteEvalStore::new(&cli.database)
        .await
        .with_context(|| format!("failed to open {}", cli.database))?;
    store.migrate().await?;
    let store: Arc<dyn EvalStore> = Arc::new(store);
    let ctx = RequestContext::new(cli.user);

    let output = match cli.command {
        Commands::Import { fixture } => commands::import(store.as_ref(), &ctx, &fixture).await?,
        Commands::Evaluate {
            generation_task_id,
            name,
            judge_model,
            workers,
            host,
            aggregate,
        } => {
            let client: Arc<dyn ChatClient> =
                Arc::new(OpenAICompatibleClient::new(config.client_config())?);
            let dispatcher =
                Dispatcher::new(Arc::clone(&store), client).with_config(config.dispatch.clone());
            let mut request =
                EvaluationRequest::new(generation_task_id, name, judge_model, workers);
            if let Some(host) = host {
                request = request.with_host(host);
            }
            commands::evaluate(&dispatcher, store.as_ref(), &ctx, request, aggregate).await?
        }
        Commands::Aggregate { evaluation_task_id } => {
            commands::aggregate(store.as_ref(), &ctx, evaluation_task_id).await?
        }
        Commands::Show { evaluation_task_id } => {
            commands::show(store.as_ref(), &ctx, evaluation_task_id).await?
        }
        Commands::Rates { evaluation_task_id, question } => match (evaluation_task_id, question) {
            (_, Some(question_id)) => {
                commands::rates_of_question(store.as_ref(), &ctx, question_id).await?
            }
            (Some(id), None) => commands::rates_of_evaluation(store.as_ref(), &ctx, id).await?,
            (None, None) => anyhow::bail!("pass an evaluation task id or --question"),
        },
    };

    print!("{output}");
    Ok(())
}
