use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use essay_core::cache::{ResultCache, SledStore};
use essay_core::persist::{load_index, save_index, StorePaths};
use essay_core::sentence::positions;
use essay_core::{Document, FrequencyIndex, MorphNormalizer, Strategy, Summarizer, SummarizerConfig};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Deserialize, PartialEq)]
struct InputDoc {
    title: String,
    text: String,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a document store and summarize its documents", long_about = None)]
struct Cli {
    /// Store directory
    #[arg(long, global = true, default_value = "store")]
    store: PathBuf,
    /// Optional JSON config file; ESSAY_* variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    #[arg(long, conflicts_with = "id")]
    title: Option<String>,
    #[arg(long)]
    id: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add .txt files (title = file name) or JSON/JSONL `{title, text}` records
    Add {
        #[arg(long)]
        input: PathBuf,
    },
    /// List stored documents
    List,
    /// Print a summary of one document
    Summarize {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value = "own")]
        strategy: Strategy,
        /// Sentences in the summary (defaults to the configured top_k)
        #[arg(long)]
        k: Option<usize>,
    },
    /// Print the most characteristic terms of one document
    Keywords {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        count: Option<usize>,
    },
    /// Dump per-sentence scores with their positions
    Scores {
        #[command(flatten)]
        target: Target,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let mut config = SummarizerConfig::load(cli.config.as_deref())?;
    if let Commands::Summarize { k: Some(k), .. } = &cli.command {
        config.top_k = *k;
    }
    fs::create_dir_all(&cli.store)?;
    let cache = ResultCache::new(SledStore::open(cli.store.join("cache"))?, config.cache_ttl());
    let mut summarizer = open_store(&cli.store, config, cache)?;

    match cli.command {
        Commands::Add { input } => {
            let docs = read_inputs(&input)?;
            let (added, updated) = ingest(summarizer.index_mut(), docs)?;
            save_index(&StorePaths::new(&cli.store), summarizer.index())?;
            tracing::info!(added, updated, store = %cli.store.display(), "ingest complete");
        }
        Commands::List => {
            for doc in summarizer.index().documents() {
                println!("{}\t{}\t{} chars", doc.id, doc.title, doc.text.chars().count());
            }
        }
        Commands::Summarize { target, strategy, .. } => {
            let doc = resolve(&summarizer, &target)?;
            println!("{}", summarizer.summarize(doc.id, strategy)?);
        }
        Commands::Keywords { target, count } => {
            let doc = resolve(&summarizer, &target)?;
            let count = count.unwrap_or(summarizer.config().keyword_count);
            println!("{}", summarizer.keywords(doc.id, count)?.join(", "));
        }
        Commands::Scores { target } => {
            let doc = resolve(&summarizer, &target)?;
            for line in score_lines(&summarizer, doc)? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn open_store(root: &Path, config: SummarizerConfig, cache: ResultCache) -> Result<Summarizer> {
    let normalizer = Arc::new(MorphNormalizer::new());
    let paths = StorePaths::new(root);
    let index = if paths.exists() { load_index(&paths, normalizer, cache)? } else { FrequencyIndex::new(normalizer, cache) };
    Ok(Summarizer::from_index(config, index))
}

fn resolve<'a>(summarizer: &'a Summarizer, target: &Target) -> Result<&'a Document> {
    match (&target.title, target.id) {
        (Some(title), _) => summarizer.index().find_by_title(title).with_context(|| format!("no document titled {title:?}")),
        (None, Some(id)) => Ok(summarizer.index().document(id)?),
        (None, None) => bail!("pass --title or --id"),
    }
}

/// Adds new titles and re-indexes existing ones. Returns (added, updated).
fn ingest(index: &mut FrequencyIndex, docs: Vec<InputDoc>) -> Result<(usize, usize)> {
    let (mut added, mut updated) = (0, 0);
    for doc in docs {
        let existing = index.find_by_title(&doc.title).map(|d| d.id);
        match existing {
            Some(id) => {
                index.update_document(id, doc.text)?;
                updated += 1;
            }
            None => {
                index.add_document(doc.title, doc.text)?;
                added += 1;
            }
        }
    }
    Ok((added, updated))
}

fn score_lines(summarizer: &Summarizer, doc: &Document) -> Result<Vec<String>> {
    let scores = summarizer.sentence_scores(doc.id)?;
    let fmt_pos = |v: Option<f64>| v.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".into());
    Ok(scores
        .iter()
        .map(|s| {
            let (d, p) = positions(&s.text, &doc.text).map(|(d, p)| (Some(d), Some(p))).unwrap_or((None, None));
            format!("{:.4}\t{}\t{}\t{}", s.score, fmt_pos(d), fmt_pos(p), s.text)
        })
        .collect())
}

fn read_inputs(input: &Path) -> Result<Vec<InputDoc>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("txt" | "json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input {} does not exist", input.display());
    }

    let mut docs = Vec::new();
    for file in files {
        match extension(&file) {
            Some("jsonl") => read_jsonl(&file, &mut docs)?,
            Some("json") => read_json(&file, &mut docs)?,
            _ => docs.push(read_text(&file)?),
        }
    }
    Ok(docs)
}

fn extension(p: &Path) -> Option<&str> { p.extension().and_then(|s| s.to_str()) }

/// The title is the file name up to its first dot.
fn read_text(file: &Path) -> Result<InputDoc> {
    let name = file.file_name().and_then(|s| s.to_str()).with_context(|| format!("bad file name {}", file.display()))?;
    let title = name.split('.').next().unwrap_or(name).to_string();
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    Ok(InputDoc { title, text })
}

fn read_jsonl(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        docs.push(serde_json::from_str(&line).with_context(|| format!("parsing {}", file.display()))?);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(File::open(file)?))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => docs.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping JSON that is neither object nor array"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_text_and_json_inputs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Щука.ru.txt"), "Щука плавает.").unwrap();
        fs::write(dir.path().join("batch.jsonl"), "{\"title\":\"a\",\"text\":\"Один.\"}\n\n{\"title\":\"b\",\"text\":\"Два.\"}\n").unwrap();
        fs::write(dir.path().join("one.json"), r#"[{"title":"c","text":"Три."}]"#).unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let docs = read_inputs(dir.path()).unwrap();
        let titles: Vec<&str> = docs.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c", "Щука"]);
        assert_eq!(docs[3].text, "Щука плавает.");
    }

    #[test]
    fn ingest_updates_known_titles() {
        let dir = tempdir().unwrap();
        let mut summarizer = open_store(dir.path(), SummarizerConfig::default(), ResultCache::in_memory()).unwrap();
        let first = vec![InputDoc { title: "d".into(), text: "Кошка спит.".into() }];
        assert_eq!(ingest(summarizer.index_mut(), first).unwrap(), (1, 0));
        let second = vec![
            InputDoc { title: "d".into(), text: "Собака лает.".into() },
            InputDoc { title: "e".into(), text: "Птица поёт.".into() },
        ];
        assert_eq!(ingest(summarizer.index_mut(), second).unwrap(), (1, 1));
        assert_eq!(summarizer.index().df("кошка"), 0);
        assert_eq!(summarizer.index().docs_count(), 2);
    }

    #[test]
    fn transliterated_title_clash_is_reported() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("kot.txt"), "Собака лает.").unwrap();
        fs::write(input.join("кот.txt"), "Кошка спит.").unwrap();

        let mut summarizer = open_store(dir.path(), SummarizerConfig::default(), ResultCache::in_memory()).unwrap();
        let err = ingest(summarizer.index_mut(), read_inputs(&input).unwrap()).unwrap_err();
        assert!(format!("{err}").contains("кот"));
        assert_eq!(summarizer.index().df("собака"), 1);
        assert_eq!(summarizer.index().df("кошка"), 0);
    }

    #[test]
    fn store_survives_reopening() {
        let dir = tempdir().unwrap();
        {
            let mut summarizer = open_store(dir.path(), SummarizerConfig::default(), ResultCache::in_memory()).unwrap();
            let docs = vec![
                InputDoc { title: "d1".into(), text: "Кошка спит. Собака бежит.".into() },
                InputDoc { title: "d2".into(), text: "Кошка ест. Птица летает.".into() },
            ];
            ingest(summarizer.index_mut(), docs).unwrap();
            save_index(&StorePaths::new(dir.path()), summarizer.index()).unwrap();
        }
        let mut config = SummarizerConfig::default();
        config.top_k = 1;
        let summarizer = open_store(dir.path(), config, ResultCache::in_memory()).unwrap();
        let doc = resolve(&summarizer, &Target { title: Some("d1".into()), id: None }).unwrap();
        assert_eq!(summarizer.summarize(doc.id, Strategy::Own).unwrap(), "Собака бежит");

        let lines = score_lines(&summarizer, doc).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0.6931\t1.0000\t1.0000\t"));
    }

    #[test]
    fn target_requires_title_or_id() {
        let dir = tempdir().unwrap();
        let summarizer = open_store(dir.path(), SummarizerConfig::default(), ResultCache::in_memory()).unwrap();
        assert!(resolve(&summarizer, &Target { title: None, id: None }).is_err());
        assert!(resolve(&summarizer, &Target { title: Some("missing".into()), id: None }).is_err());
    }
}
