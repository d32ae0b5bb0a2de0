use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use assessment_recommender::crawlers::shl::ShlCatalogCrawler;
use assessment_recommender::domain::assessment::Category;
use assessment_recommender::models::config::AppConfig;
use assessment_recommender::processing::ProcessingResult;
use assessment_recommender::processing::cleaning::process_clean_message;
use assessment_recommender::processing::crawler::process_crawler_message;
use assessment_recommender::processing::embedding::FastEmbedder;
use assessment_recommender::processing::evaluation::{
    EvaluationOptions, process_evaluation_message,
};
use assessment_recommender::processing::indexing::process_embed_message;
use assessment_recommender::processing::query::{QuerySession, render_recommendations};
use assessment_recommender::processing::retrieval::{CategoryFilter, SearchOptions};
use assessment_recommender::repository::{ArtifactPaths, FileRepository};

#[derive(Parser)]
#[command(name = "assessment-recommender")]
#[command(about = "Recommend catalog assessments for a job description", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl the catalog and write raw metadata
    Scrape,
    /// Normalize durations and test types in the raw metadata
    Clean,
    /// Embed cleaned metadata and rebuild the vector index
    Embed,
    /// Replay the labeled query set and report Recall@k / MAP@k
    Evaluate,
    /// Recommend assessments for a job description or URL
    Query(QueryArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// Job description or URL; reads one query per line from stdin when omitted
    text: Option<String>,
    #[arg(long)]
    top_k: Option<usize>,
    /// Maximum assessment duration in minutes
    #[arg(long, conflicts_with = "any_duration")]
    max_duration: Option<u32>,
    /// Do not filter on duration
    #[arg(long)]
    any_duration: bool,
    /// Preferred category; repeat for several
    #[arg(long = "category")]
    categories: Vec<Category>,
    /// Similarity multiplier for results outside the preferred categories
    #[arg(long)]
    penalty: Option<f32>,
}

impl QueryArgs {
    fn search_options(&self, config: &AppConfig) -> SearchOptions {
        let defaults = &config.query;
        SearchOptions {
            k: self.top_k.unwrap_or(defaults.top_k),
            max_duration: if self.any_duration {
                None
            } else {
                self.max_duration.or(defaults.max_duration)
            },
            required_categories: if self.categories.is_empty() {
                defaults.required_categories.clone()
            } else {
                self.categories.clone()
            },
            filter: CategoryFilter::Soft {
                penalty: self.penalty.unwrap_or(defaults.category_penalty),
            },
        }
    }
}

fn load_embedder(config: &AppConfig) -> ProcessingResult<FastEmbedder> {
    Ok(FastEmbedder::new(
        &config.embedding_model,
        config.model_cache_dir.clone(),
    )?)
}

async fn run_query(
    args: QueryArgs,
    config: &AppConfig,
    repo: &FileRepository,
) -> ProcessingResult<()> {
    let mut embedder = load_embedder(config)?;
    let mut session = QuerySession::new(repo, &mut embedder, args.search_options(config))?;

    if let Some(text) = args.text.as_deref() {
        let results = session.handle(text).await?;
        print!("{}", render_recommendations(&results));
        return Ok(());
    }

    println!("Enter a job description or a URL (Ctrl-D to quit):");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match session.handle(&line).await {
            Ok(results) => print!("{}", render_recommendations(&results)),
            Err(e) => {
                let level = e.log_level();
                log::log!(level, "Query failed: {e}");
                println!("{}: {e}", if level == log::Level::Warn { "Warning" } else { "Error" });
            }
        }
    }

    Ok(())
}

async fn run(command: Command, config: &AppConfig, repo: &FileRepository) -> ProcessingResult<()> {
    match command {
        Command::Scrape => {
            let crawler = ShlCatalogCrawler::new(&config.catalog_url, config.crawler_concurrency)?;
            process_crawler_message(&crawler, repo).await?;
        }
        Command::Clean => {
            let stats = process_clean_message(repo)?;
            println!("Total records cleaned: {} / {}", stats.cleaned, stats.total);
        }
        Command::Embed => {
            let mut embedder = load_embedder(config)?;
            process_embed_message(repo, &mut embedder)?;
        }
        Command::Evaluate => {
            let mut embedder = load_embedder(config)?;
            let options = EvaluationOptions {
                k: config.evaluation.k,
                max_duration: config.evaluation.max_duration,
                required_categories: config.evaluation.required_categories.clone(),
            };
            let report = process_evaluation_message(repo, &mut embedder, &options)?;
            println!("Evaluation Metrics:");
            println!("Mean Recall@{}: {}", options.k, report.summary.mean_recall);
            println!("MAP@{}: {}", options.k, report.summary.mean_average_precision);
        }
        Command::Query(args) => run_query(args, config, repo).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    let repo = FileRepository::new(ArtifactPaths::from_config(&config));

    if let Err(e) = run(cli.command, &config, &repo).await {
        log::error!("{e}");
        std::process::exit(1);
    }
}
