use std::path::{Path, PathBuf};
use std::sync::Arc;

use logstream::prelude::*;
use logstream::source::source_name;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, warn};

type InputReader = Box<dyn AsyncBufRead + Unpin + Send>;

#[tokio::main]
async fn main() {
    let code = CliApp::new("logstream").run(parse_args, run_pipeline).await;
    std::process::exit(code);
}

/// Parse and validate command-line arguments
fn parse_args(args: Vec<String>) -> Result<Option<PathBuf>, AppError> {
    match args.len() {
        0 | 1 => Ok(None),
        2 => Ok(Some(PathBuf::from(&args[1]))),
        _ => Err(AppError::InvalidArguments(
            "Usage: logstream [FILE]".to_string(),
        )),
    }
}

/// Open FILE, or stdin when no file is given
async fn open_input(path: Option<&Path>) -> Result<LineSource<InputReader>, AppError> {
    let Some(path) = path else {
        let reader: InputReader = Box::new(BufReader::new(tokio::io::stdin()));
        return Ok(LineSource::new("stdin", reader));
    };

    let file = tokio::fs::File::open(path).await?;
    let reader: InputReader = Box::new(BufReader::new(file));
    Ok(LineSource::new(source_name(path), reader))
}

/// Consume the input into an in-memory sink and write its snapshot to stdout
async fn run_pipeline(ctx: AppContext, input: Option<PathBuf>) -> Result<Completion, AppError> {
    let AppContext { config, mut stdout } = ctx;

    let lines = open_input(input.as_deref()).await?;
    let source = Arc::new(CloseOnce::new(lines.name().to_string(), lines));
    let sink = Arc::new(MemorySink::new());

    let coordinator =
        ShutdownCoordinator::new(config.shutdown_timeout()).with_resource(source.clone());
    let processor =
        StreamProcessor::new(source, sink.clone()).with_config(config.processor_config());

    let processing = processor.start(coordinator.token());
    tokio::pin!(processing);

    let completion = tokio::select! {
        result = &mut processing => {
            result?;
            Completion::Finished
        }
        stopped = coordinator.run_until_signal() => {
            let (signal, outcome) = stopped?;
            match tokio::time::timeout(coordinator.timeout(), &mut processing).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(
                        ?outcome,
                        in_flight = processor.in_flight(),
                        "in-flight messages not drained before timeout"
                    );
                }
            }
            Completion::Interrupted(signal)
        }
    };

    info!(stats = ?processor.stats(), stored = sink.len(), "processing finished");
    sink.snapshot(&mut stdout).await?;

    Ok(completion)
}
