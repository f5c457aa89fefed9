// src/cli/ask.rs - One-shot question from the terminal

use std::path::Path;

use crate::core::tutor::Tutor;
use crate::core::types::{Mode, PromptRequest, SolutionMode};
use crate::imaging::{self, ProcessedImage};
use crate::infra::credentials::StaticCredentials;
use crate::provider::ImageInput;

pub struct AskOptions {
    pub question: String,
    pub subject: String,
    pub mode: Mode,
    pub solution_mode: SolutionMode,
    pub image: Option<String>,
}

/// Ask once, print the answer, and fail the process if the provider did.
pub async fn run_ask(
    tutor: &Tutor,
    credentials: &StaticCredentials,
    options: AskOptions,
) -> anyhow::Result<()> {
    let mut request = PromptRequest::new(options.question.trim(), options.subject)
        .with_mode(options.mode, options.solution_mode);

    let image = match options.image.as_deref() {
        Some(path) => {
            let (name, input) = load_image(path)?;
            request = request.with_image(name);
            Some(input)
        }
        None => None,
    };

    if request.message.is_empty() {
        anyhow::bail!("question must not be empty");
    }

    let credential = credentials.resolve(None, None);
    let exchange = tutor
        .ask(&request, credential.as_ref().map(|c| c.key.as_str()), image)
        .await;

    if exchange.result.success {
        println!("{}", exchange.result.text);
        Ok(())
    } else {
        anyhow::bail!("{}", exchange.result.text)
    }
}

fn load_image(path: &str) -> anyhow::Result<(String, ImageInput)> {
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    imaging::validate_filename(&name)?;

    let bytes = std::fs::read(path)?;
    let input = match ProcessedImage::from_bytes(&bytes) {
        Ok(processed) => ImageInput::Jpeg(processed.jpeg),
        Err(e) => {
            eprintln!("warning: {e}");
            ImageInput::Unavailable {
                reason: e.to_string(),
            }
        }
    };
    Ok((name, input))
}
