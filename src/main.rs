use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use wikibacon::cache::EmbeddingCache;
use wikibacon::db::Db;
use wikibacon::embeddings::OpenAIEmbedder;
use wikibacon::game::{self, DEFAULT_PICK_ATTEMPTS, PREVIEW_CHARS};
use wikibacon::links::count_records;
use wikibacon::wiki::{Page, PageDetail, WikiClient, resolve};
use wikibacon::{Config, LinkStore, PathFinder, SearchOptions, SearchReport, SimilarityScorer};

type Finder = PathFinder<WikiClient, OpenAIEmbedder>;

#[derive(Parser, Debug)]
#[command(name = "wikibacon")]
#[command(about = "Find link paths between Wikipedia articles, or play WikiBacon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search for a path between two articles
    Path {
        start: String,
        end: String,

        /// Follow article links only (no categories)
        #[arg(long)]
        hard: bool,

        /// Give up once the path would hold more titles than this
        #[arg(long)]
        max_depth: Option<usize>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Play WikiBacon against the computer
    Play {
        /// Start in hard mode (no categories)
        #[arg(long)]
        hard: bool,

        /// Word list for random pages
        #[arg(long)]
        dictionary: Option<PathBuf>,
    },
    /// Show link cache statistics
    Stats,
}

/// Build a configured embedder with an optional LRU embedding cache.
fn build_embedder(config: &Config) -> Result<OpenAIEmbedder> {
    let api_key = std::env::var(&config.embeddings.api_key_env).with_context(|| {
        format!(
            "Environment variable {} not set. Set it in your .env file or as an environment variable.",
            config.embeddings.api_key_env
        )
    })?;

    let embedder = OpenAIEmbedder::new(
        config.embeddings.api_base.clone(),
        api_key,
        config.embeddings.model.clone(),
        config.embeddings.batch_size,
        config.embeddings.dimensions,
    )?;

    if config.embeddings.cache_capacity > 0 {
        Ok(embedder.with_cache(Arc::new(EmbeddingCache::new(config.embeddings.cache_capacity))))
    } else {
        Ok(embedder)
    }
}

fn build_finder(config: &Config, db: Db) -> Result<(Finder, Arc<WikiClient>)> {
    let wiki = Arc::new(WikiClient::new(
        config.wiki.api_url.clone(),
        &config.wiki.user_agent,
        Duration::from_secs(config.wiki.request_timeout_secs),
    )?);
    let embedder = Arc::new(build_embedder(config)?);

    let finder = PathFinder::new(
        LinkStore::new(db, wiki.clone(), config.wiki.search_limit),
        SimilarityScorer::new(embedder, config.search.candidate_limit),
    );
    Ok((finder, wiki))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.wikibacon.log_level.as_str()),
    )
    .init();

    let db = Db::new(config.db_path());
    db.migrate(config.migrations_dir())
        .await
        .with_context(|| format!("Failed to migrate {}", config.db_path().display()))?;
    log::debug!("Link cache ready at {}", config.db_path().display());

    match cli.command {
        Command::Path {
            start,
            end,
            hard,
            max_depth,
            timeout,
        } => {
            let mut opts = config.search_options();
            opts.hard_mode |= hard;
            if let Some(depth) = max_depth {
                opts.max_depth = depth;
            }
            if let Some(secs) = timeout {
                opts.timeout = Duration::from_secs(secs);
            }
            run_path(&config, db, &start, &end, &opts).await
        }
        Command::Play { hard, dictionary } => {
            let dictionary = dictionary.unwrap_or_else(|| config.wikibacon.dictionary_path.clone());
            run_game(&config, db, hard, &dictionary).await
        }
        Command::Stats => run_stats(&db).await,
    }
}

async fn run_path(config: &Config, db: Db, start: &str, end: &str, opts: &SearchOptions) -> Result<()> {
    let (finder, _) = build_finder(config, db)?;
    let report = finder.search(start, end, opts).await;
    print_report(&report);
    Ok(())
}

async fn run_stats(db: &Db) -> Result<()> {
    let pages = count_records(db).await?;
    println!("\n=== WikiBacon Link Cache ===\n");
    println!("Database: {}", db.path().display());
    println!("Cached pages: {}", pages);
    Ok(())
}

fn print_report(report: &SearchReport) {
    match &report.path {
        Some(path) => {
            println!("{}", path);
            println!("Length: {}", path.len());
        }
        None => {
            println!("No path found ({}).", report.termination);
            println!("Length: ∞");
        }
    }
    println!(
        "Stopped: {} after {} rounds in {:.2}s\n",
        report.termination,
        report.rounds,
        report.elapsed.as_secs_f64()
    );
}

fn print_page(label: &str, page: &Page) {
    println!("{} {}\n", label, page.title);
    println!("Summary: {}\n", game::summary_preview(&page.summary, PREVIEW_CHARS));
}

/// Line-oriented prompt over async stdin. `None` on end of input.
struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn ask(&mut self, question: &str) -> Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(question.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        Ok(self.lines.next_line().await?.map(|line| line.trim().to_string()))
    }
}

fn wants_quit(answer: &Option<String>) -> bool {
    match answer {
        Some(line) => line.eq_ignore_ascii_case("q"),
        None => true,
    }
}

async fn run_game(config: &Config, db: Db, hard: bool, dictionary: &std::path::Path) -> Result<()> {
    let words = game::load_dictionary(dictionary)
        .with_context(|| format!("Failed to read dictionary {}", dictionary.display()))?;
    if words.is_empty() {
        anyhow::bail!("Dictionary {} has no words", dictionary.display());
    }

    let (finder, wiki) = build_finder(config, db)?;
    let mut prompt = Prompt::new();
    let mut opts = config.search_options();

    println!("\n\n🥓 Welcome to WikiBacon! 🥓\n");
    println!(
        "We start from a random Wikipedia page, then compete to name a page that is *farthest away* from it.\n"
    );

    opts.hard_mode |= hard;
    if !opts.hard_mode {
        println!("Difficulty modes:");
        println!("  [1] Normal - Uses both links and categories");
        println!("  [2] Hard - Links only (no categories)");
        let mode = prompt.ask("Choose mode (1 or 2, default=1):").await?;
        opts.hard_mode = mode.as_deref() == Some("2");
    }
    if opts.hard_mode {
        println!("🔥 Hard mode activated! Categories disabled.\n");
    } else {
        println!("✨ Normal mode selected.\n");
    }

    let mut answer = prompt
        .ask("Ready to play? Hit Enter to start, or type 'q' to quit")
        .await?;
    let mut rng = rand::thread_rng();

    while !wants_quit(&answer) {
        let start = pick(&*wiki, &words, &mut rng, config).await?;
        print_page("The starting page is:", &start);

        let computer = pick(&*wiki, &words, &mut rng, config).await?;
        print_page("The computer's page is:", &computer);

        let player = loop {
            let Some(name) = prompt.ask("What would you like your page to be?").await? else {
                return Ok(());
            };
            match resolve(&*wiki, &name, PageDetail::Summary, config.wiki.search_limit)
                .await
                .into_page()
            {
                Some(page) => break page,
                None => println!("Could not find page '{}'. Please try another page.\n", name),
            }
        };
        print_page("Your page is:", &player);

        println!("Calculating Bacon paths...\n");
        let outcome = game::play_round(&finder, &start, &computer, &player, &opts).await;

        println!("Computer's path:");
        print_report(&outcome.computer);
        println!("Your path:");
        print_report(&outcome.player);
        println!("{}", outcome.verdict.message());

        answer = prompt
            .ask("\n\nPlay again? Hit Enter for another round, or type 'q' to quit")
            .await?;
    }

    println!("\n🥓 Thanks for playing! 🥓\n");
    println!(
        "WikiBacon is not affiliated with Wikipedia or the Wikimedia Foundation. \
         To donate to Wikipedia and support their vision of an open internet that makes games like this possible, \
         please visit https://donate.wikimedia.org/\n"
    );
    Ok(())
}

async fn pick(
    wiki: &WikiClient,
    words: &[String],
    rng: &mut impl rand::Rng,
    config: &Config,
) -> Result<Page> {
    game::pick_random_page(wiki, words, rng, DEFAULT_PICK_ATTEMPTS, config.wiki.search_limit)
        .await
        .context("Could not find a random page; check your connection and dictionary")
}
