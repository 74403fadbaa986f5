mod cli;

use reelhook::config::{self, Config};
use reelhook::ingest::{IngestEvent, IngestOutcome, IngestPipeline};
use reelhook_common::ContentId;
use reelhook_db::queries::contents::{self, ContentFilter};
use reelhook_db::{get_conn, init_pool, ContentBody, ContentFlags, ContentRecord, DbPool};
use reelhook_parser::FilenameParser;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::io::BufRead;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelhook=trace,reelhook_db=debug,reelhook_parser=debug,reelhook_common=debug".to_string()
        } else {
            "reelhook=info,reelhook_db=warn,reelhook_parser=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Parse {
            input,
            caption,
            json,
        } => parse_input(&input, caption, config_path, json),
        Commands::Ingest {
            filename,
            media_ref,
            caption,
            size,
            media_kind,
            json,
        } => {
            let event = IngestEvent {
                filename,
                caption,
                media_reference: media_ref,
                size_bytes: size,
                media_kind,
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(ingest_one(event, config_path, json))
        }
        Commands::Replay { events } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(replay(&events, config_path))
        }
        Commands::List {
            kind,
            unresolved,
            title,
            limit,
            json,
        } => {
            let filter = ContentFilter {
                kind,
                unresolved_only: unresolved,
                title_contains: title,
                limit,
            };
            list(&filter, config_path, json)
        }
        Commands::Show { id, json } => show(&id, config_path, json),
        Commands::Resolve { id, title } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(resolve(&id, title.as_deref(), config_path))
        }
        Commands::Notify { id } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(notify(&id, config_path))
        }
        Commands::Delete { id } => delete(&id, config_path),
        Commands::Flag {
            id,
            trending,
            coming_soon,
        } => flag(&id, trending, coming_soon, config_path),
        Commands::Validate { file } => {
            let path = file.or_else(|| cli.config.clone());
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("reelhook {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_pool(config: &Config) -> Result<DbPool> {
    let db_path = config.database.path.to_string_lossy();
    tracing::debug!("Opening database at {}", db_path);
    init_pool(&db_path).with_context(|| format!("Failed to open database: {}", db_path))
}

fn parse_content_id(id: &str) -> Result<ContentId> {
    id.parse()
        .with_context(|| format!("Invalid content id: {}", id))
}

fn parse_input(
    input: &str,
    caption: Option<String>,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let parser = FilenameParser::new(config.parser.keyword_table())
        .context("Failed to compile parser keyword table")?;

    let mut event = IngestEvent::new(input, "");
    event.caption = caption;
    let parsed = event.parse_with(&parser)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        println!("Type: {}", parsed.content_type);
        println!("Title: {}", parsed.title);
        if let Some(ref year) = parsed.year {
            println!("Year: {}", year);
        }
        if let Some(season) = parsed.season {
            println!("Season: {}", season);
        }
        if let Some(episode) = parsed.episode {
            println!("Episode: {}", episode);
        }
        println!("Quality: {}", parsed.quality);
        if !parsed.languages.is_empty() {
            println!("Languages: {}", parsed.languages.join(", "));
        }
    }
    Ok(())
}

async fn ingest_one(event: IngestEvent, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_pool(&config)?;
    let pipeline = IngestPipeline::from_config(&config, pool)?;

    let outcome = pipeline.ingest(&event).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        IngestOutcome::Accepted(merged) => {
            println!("Accepted: {} [{}]", merged.title, merged.variant_summary);
            println!("  Content id: {}", merged.content_id);
            println!("  New record: {}", merged.is_new_record);
            println!("  New variant: {}", merged.is_new_variant);
        }
        IngestOutcome::Rejected { reason } => println!("Rejected: {}", reason),
        IngestOutcome::Failed { error } => anyhow::bail!("Ingestion failed: {}", error),
    }
    Ok(())
}

async fn replay(events: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_pool(&config)?;
    let pipeline = IngestPipeline::from_config(&config, pool)?;

    let file = std::fs::File::open(events)
        .with_context(|| format!("Failed to open events file: {:?}", events))?;

    let (mut accepted, mut rejected, mut failed) = (0usize, 0usize, 0usize);
    for (i, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {:?}", events))?;
        if line.trim().is_empty() {
            continue;
        }

        let event: IngestEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(line = i + 1, "Skipping malformed event: {}", e);
                rejected += 1;
                continue;
            }
        };

        match pipeline.ingest(&event).await {
            IngestOutcome::Accepted(_) => accepted += 1,
            IngestOutcome::Rejected { .. } => rejected += 1,
            IngestOutcome::Failed { .. } => failed += 1,
        }
    }

    println!(
        "Replayed {} events: {} accepted, {} rejected, {} failed",
        accepted + rejected + failed,
        accepted,
        rejected,
        failed
    );
    Ok(())
}

fn list(filter: &ContentFilter, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_pool(&config)?;
    let conn = get_conn(&pool)?;
    let records = contents::list_contents(&conn, filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for record in &records {
        println!(
            "{}  {:<6}  {}{}  ({} variants)",
            record.id,
            record.kind().as_str(),
            record.title,
            if record.unresolved { " [unresolved]" } else { "" },
            record.body.variant_count()
        );
    }
    println!("{} records", records.len());
    Ok(())
}

fn load_record(pool: &DbPool, id: ContentId) -> Result<ContentRecord> {
    let conn = get_conn(pool)?;
    contents::get_content(&conn, id)?.with_context(|| format!("Content not found: {}", id))
}

fn show(id: &str, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_pool(&config)?;
    let record = load_record(&pool, parse_content_id(id)?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("Title: {}", record.title);
    println!("Kind: {}", record.kind());
    println!("Id: {}", record.id);
    match record.metadata.catalog_id {
        Some(catalog_id) => println!("Catalog id: {}", catalog_id),
        None => println!("Catalog id: none (unresolved)"),
    }
    if let Some(ref date) = record.metadata.release_date {
        println!("Released: {}", date);
    }
    if let Some(rating) = record.metadata.rating {
        println!("Rating: {:.1}", rating);
    }
    if !record.metadata.genres.is_empty() {
        println!("Genres: {}", record.metadata.genres.join(", "));
    }
    if !record.languages.is_empty() {
        println!("Languages: {}", record.languages.join(", "));
    }
    println!(
        "Flags: trending={} coming_soon={}",
        record.flags.is_trending, record.flags.is_coming_soon
    );

    match &record.body {
        ContentBody::Movie { files } => {
            println!("\nFiles: {}", files.len());
            for file in files {
                println!("  {} {} ({} bytes)", file.quality, file.media_ref, file.size_bytes);
            }
        }
        ContentBody::Series {
            episodes,
            season_packs,
        } => {
            println!("\nEpisodes: {}", episodes.len());
            for ep in episodes {
                println!(
                    "  S{:02}E{:02} {} {}",
                    ep.season.unwrap_or(1),
                    ep.episode.unwrap_or(0),
                    ep.quality,
                    ep.media_ref
                );
            }
            println!("\nSeason packs: {}", season_packs.len());
            for pack in season_packs {
                println!("  Season {} {} {}", pack.season, pack.quality, pack.media_ref);
            }
        }
    }
    Ok(())
}

async fn resolve(id: &str, title: Option<&str>, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_pool(&config)?;
    let pipeline = IngestPipeline::from_config(&config, pool)?;

    let record = pipeline.resolve(parse_content_id(id)?, title).await?;
    match record.metadata.catalog_id {
        Some(catalog_id) => {
            println!("Resolved: {} ({})", record.title, record.id);
            println!("  Catalog id: {}", catalog_id);
        }
        None => println!("Renamed: {} ({}), still unresolved", record.title, record.id),
    }
    Ok(())
}

async fn notify(id: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_pool(&config)?;
    let pipeline = IngestPipeline::from_config(&config, pool)?;

    let notification = pipeline.announce(parse_content_id(id)?).await?;
    println!(
        "Announced: {} [{}]",
        notification.title, notification.variant_summary
    );
    Ok(())
}

fn delete(id: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_pool(&config)?;
    let id = parse_content_id(id)?;
    let conn = get_conn(&pool)?;

    if !contents::delete_content(&conn, id)? {
        anyhow::bail!("Content not found: {}", id);
    }
    println!("Deleted {}", id);
    Ok(())
}

fn flag(
    id: &str,
    trending: Option<bool>,
    coming_soon: Option<bool>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_pool(&config)?;
    let record = load_record(&pool, parse_content_id(id)?)?;

    let flags = ContentFlags {
        is_trending: trending.unwrap_or(record.flags.is_trending),
        is_coming_soon: coming_soon.unwrap_or(record.flags.is_coming_soon),
    };
    let conn = get_conn(&pool)?;
    contents::set_flags(&conn, record.id, flags)?;
    println!(
        "{}: trending={} coming_soon={}",
        record.title, flags.is_trending, flags.is_coming_soon
    );
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, checking defaults");
            config::load_config_or_default(None)?
        }
    };

    let warnings = config::validate_config(&config)?;
    println!("✓ Configuration is valid");
    println!("  Database: {}", config.database.path.display());
    println!(
        "  TMDB key: {}",
        if config.metadata.tmdb_api_key.trim().is_empty() {
            "not set"
        } else {
            "set"
        }
    );
    println!("  Catalog: {}", config.metadata.base_url);
    println!(
        "  Extra keywords: {} junk, {} pack, {} languages",
        config.parser.extra_junk_keywords.len(),
        config.parser.extra_pack_keywords.len(),
        config.parser.extra_languages.len()
    );
    println!("  Log notifications: {}", config.notifications.log);
    println!(
        "  Webhook: {}",
        config.notifications.webhook_url.as_deref().unwrap_or("none")
    );
    for warning in warnings {
        println!("  ! {}", warning);
    }
    Ok(())
}
