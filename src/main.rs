use media_resolver::{logging, Platform, ResolutionEngine, ResolutionResult, ResolverConfig};

/// Resolve a link and print the accepted candidate as JSON.
///
/// Usage: media-resolver <url> [platform]
#[tokio::main]
async fn main() {
    logging::init_tracing(false);

    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        eprintln!("Usage: media-resolver <url> [youtube|tiktok|instagram|twitter]");
        std::process::exit(2);
    };

    let hint = match args.next().map(|p| p.parse::<Platform>()) {
        Some(Ok(platform)) => Some(platform),
        Some(Err(e)) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
        None => None,
    };

    let engine = ResolutionEngine::from_config(ResolverConfig::from_env());

    match engine.resolve(&url, hint).await {
        ResolutionResult::Accepted(candidate) => match serde_json::to_string_pretty(&candidate) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize result: {}", e);
                std::process::exit(1);
            }
        },
        ResolutionResult::Exhausted(failures) => {
            eprintln!("{}", media_resolver::PipelineExhausted { failures });
            std::process::exit(1);
        }
    }
}
