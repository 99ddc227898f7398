use anyhow::{Context, Result};
use clap::Parser;
use loqa_caller::{
    create_router, AppState, CallHandle, CallOrchestrator, Config, HttpDialogueClient,
    SpeechBackendFactory, SpeechBackendKind,
};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "loqa-caller", about = "Voice call orchestrator for a remote dialogue agent")]
struct Args {
    /// Config file path (without extension)
    #[arg(short, long, default_value = "config/loqa-caller")]
    config: String,

    /// Override the speech backend from the config file
    #[arg(short, long, value_enum)]
    backend: Option<SpeechBackendKind>,

    /// Place a call as soon as the service is up
    #[arg(long)]
    start: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Loqa Caller v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Dialogue service: {}", cfg.dialogue.base_url);

    let backend_kind = args.backend.unwrap_or(cfg.speech.backend);
    let session_id = format!("call-{}", uuid::Uuid::new_v4());

    let dialogue = HttpDialogueClient::new(&cfg.dialogue)?;

    // Keep serving the control API without speech so the failure is visible
    let (call, orchestrator_task) =
        match SpeechBackendFactory::create(backend_kind, &cfg.speech, &session_id).await {
            Ok(backend) => {
                let (call, task) = CallOrchestrator::spawn(
                    cfg.call.clone(),
                    backend.recognizer,
                    backend.synthesizer,
                    Arc::new(dialogue),
                );
                (call, Some(task))
            }
            Err(e) => {
                error!("Speech capabilities unavailable: {}", e);
                (CallHandle::unavailable(cfg.call.clone(), e), None)
            }
        };

    if args.start {
        if let Err(e) = call.start_call() {
            warn!("Not placing a call: {:#}", e);
        }
    }

    let app = create_router(AppState::new(call.clone()));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP control API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;

    if let Some(task) = orchestrator_task {
        call.shutdown();
        task.await?;
    }

    Ok(())
}
