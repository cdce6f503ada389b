use serde::Serialize;
use serde_json::json;
use std::env;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use subwise_core::{parse_import_file_with, ImportProgress, ImportResult, NativeFileHost};

#[derive(Debug, Serialize)]
struct AdapterErrorBody {
    category: String,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status")]
enum AdapterResponse {
    #[serde(rename = "success")]
    Success {
        job_id: String,
        payload: ImportResult,
    },
    #[serde(rename = "error")]
    Error { error: AdapterErrorBody },
}

struct LogProgress;

impl ImportProgress for LogProgress {
    fn on_progress(&self, percent: f64) {
        info!(percent, "import progress");
    }
}

fn parse_bool_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

fn classify_error_message(message: &str) -> String {
    if message.starts_with("failed to read ") {
        "IO_ERROR".to_string()
    } else if message.contains("csv") || message.contains("workbook") || message.contains("worksheet")
    {
        "TOKENIZER_ERROR".to_string()
    } else {
        "UNKNOWN_ERROR".to_string()
    }
}

fn error_response(category: impl Into<String>, message: impl Into<String>) -> AdapterResponse {
    AdapterResponse::Error {
        error: AdapterErrorBody {
            category: category.into(),
            message: message.into(),
        },
    }
}

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    let pretty = parse_bool_flag(&args, "--pretty");
    let verbose = parse_bool_flag(&args, "--verbose");
    let source = args.iter().find(|arg| !arg.starts_with("--")).cloned();

    let resp = match source {
        None => error_response(
            "ADAPTER_PROTOCOL_ERROR",
            "usage: subwise_import_adapter <file> [--pretty] [--verbose]",
        ),
        Some(path) => {
            if verbose {
                eprintln!("[subwise_import_adapter] file={path}");
            }
            let job_id = Uuid::new_v4().to_string();
            match parse_import_file_with(&NativeFileHost, Path::new(&path), &LogProgress).await {
                Ok(payload) => AdapterResponse::Success { job_id, payload },
                Err(message) => error_response(classify_error_message(&message), message),
            }
        }
    };

    let out = if pretty {
        serde_json::to_string_pretty(&resp)
    } else {
        serde_json::to_string(&resp)
    }
    .unwrap_or_else(|e| {
        json!({
            "status": "error",
            "error": {
                "category": "ADAPTER_PROTOCOL_ERROR",
                "message": format!("serialize response failed: {e}"),
            }
        })
        .to_string()
    });

    print!("{out}");
}
