use anyhow::{Context, Result};
use genko_config::Config;
use genko_engine::{
    CancelToken, DictionaryStore, HeadingIndex, Paginator, SpanClassifier, TextBuffer,
};
use std::{env, path::PathBuf, process};

fn print_usage() {
    eprintln!("Usage: genko-cli <file.md> [--dict <dir>] [--json]");
    eprintln!();
    eprintln!("Prints heading character counts, per-line spans and the");
    eprintln!("manuscript-paper page layout for a Japanese prose document.");
}

struct Args {
    file: PathBuf,
    dict_dir: Option<PathBuf>,
    json: bool,
}

fn parse_args() -> Option<Args> {
    let mut file = None;
    let mut dict_dir = None;
    let mut json = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dict" => dict_dir = args.next().map(PathBuf::from),
            "--json" => json = true,
            "-h" | "--help" => return None,
            _ if file.is_none() => file = Some(PathBuf::from(arg)),
            _ => return None,
        }
    }
    Some(Args {
        file: file?,
        dict_dir,
        json,
    })
}

fn main() -> Result<()> {
    let Some(args) = parse_args() else {
        print_usage();
        process::exit(2);
    };

    let config = Config::load()
        .unwrap_or_else(|e| {
            eprintln!("Warning: {e}; using defaults");
            None
        })
        .unwrap_or_default();

    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let buffer = TextBuffer::from_bytes(&bytes)
        .with_context(|| format!("{} is not valid UTF-8", args.file.display()))?;
    let snapshot = buffer.snapshot();
    let cancel = CancelToken::new();

    let mut index = HeadingIndex::new(config.count_spaces);
    let metrics = index.metrics(&snapshot);

    let dict_dir = args.dict_dir.or(config.dictionary_dir.clone());
    let terms = match dict_dir {
        Some(dir) => {
            let mut store = DictionaryStore::new(dir);
            store.terms().clone()
        }
        None => Default::default(),
    };

    let mut classifier = SpanClassifier::new(config.analysis_settings(), None);
    let spans = classifier.classify_document(&snapshot, &terms, &cancel);

    let mut paginator = Paginator::new(config.layout_settings());
    let pages = paginator.paginate(&snapshot, &cancel);

    if args.json {
        let report = serde_json::json!({
            "outline": &*metrics,
            "spans": spans.iter().map(|s| &**s).collect::<Vec<_>>(),
            "pages": &*pages,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("== Outline ==");
    println!("document total: {}", metrics.document_total);
    if metrics.preamble_count > 0 {
        println!("preamble: {}", metrics.preamble_count);
    }
    for h in &metrics.headings {
        let indent = "  ".repeat(h.heading.level.saturating_sub(1) as usize);
        println!(
            "{indent}{} {} (own {}, subtree {})",
            "#".repeat(h.heading.level as usize),
            h.heading.raw_title,
            h.own_count,
            h.sub_count,
        );
    }

    println!();
    println!("== Spans ==");
    for (line_index, line_spans) in spans.iter().enumerate() {
        if line_spans.is_empty() {
            continue;
        }
        let line = snapshot.line(line_index).unwrap_or("");
        let chars: Vec<char> = line.chars().collect();
        print!("{line_index:>4}:");
        for span in line_spans.iter() {
            let text: String = chars[span.start..span.end].iter().collect();
            print!(" [{text}]{:?}", span.category);
        }
        println!();
    }

    println!();
    println!(
        "== Pages ({} x {} cells, {} page(s)) ==",
        pages.rows_per_page,
        pages.cols,
        pages.page_count()
    );
    for (page_number, page) in pages.pages.iter().enumerate() {
        println!("-- page {} --", page_number + 1);
        for row in &page.rows {
            println!("|{}|", row.text());
        }
    }

    Ok(())
}
