use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

use jimeng_proxy::client::{GenerateForm, SubmitOutcome};

/// Terminal front end for the image generation proxy.
#[derive(Parser, Debug)]
#[command(name = "jimeng-generate", version, about)]
struct Args {
    /// Prompt to submit. When omitted, prompts are read line by line from stdin.
    prompt: Vec<String>,

    /// Proxy server base URL
    #[arg(long, env = "PROXY_URL", default_value = "http://localhost:3000")]
    server: String,

    /// Save the generated image to this file
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Always print the raw API response
    #[arg(long)]
    debug: bool,
}

/// Runs one submission and reports whether it produced an image.
async fn run_once(form: &GenerateForm, prompt: &str, args: &Args) -> bool {
    form.set_prompt(prompt);
    if !form.snapshot().can_submit() {
        println!("Enter a prompt first.");
        return false;
    }

    println!("Generating...");
    if form.submit().await == SubmitOutcome::Ignored {
        println!("A request is already in flight.");
        return false;
    }

    let state = form.snapshot();
    print!("{}", state.render(args.debug));

    if let (Some(path), Some(image)) = (&args.output, &state.image) {
        match form.image_bytes(image).await {
            Ok(bytes) => match tokio::fs::write(path, &bytes).await {
                Ok(()) => println!("Saved {} bytes to {}", bytes.len(), path.display()),
                Err(e) => {
                    eprintln!("Failed to save image: {}", e);
                    return false;
                }
            },
            Err(e) => {
                eprintln!("Failed to fetch image: {}", e);
                return false;
            }
        }
    }

    state.succeeded()
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jimeng_proxy=warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let form = GenerateForm::new(reqwest::Client::new(), &args.server);

    println!("Jimeng AI Image Generator");
    println!("  Server: {}", args.server);
    println!();

    if !args.prompt.is_empty() {
        let prompt = args.prompt.join(" ");
        if !run_once(&form, &prompt, &args).await {
            std::process::exit(1);
        }
        return;
    }

    let stdin = io::stdin();
    loop {
        print!("prompt> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Failed to read prompt: {}", e);
                std::process::exit(1);
            }
        }

        let prompt = line.trim_end_matches(['\r', '\n']);
        if prompt.trim().is_empty() {
            continue;
        }
        run_once(&form, prompt, &args).await;
        println!();
    }
}
