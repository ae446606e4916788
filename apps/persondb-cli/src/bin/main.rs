use std::collections::HashMap;
use std::env;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use persondb_core::config::{resolve_with_base, Config, Settings, IN_MEMORY};
use persondb_core::merge::MergeCopier;
use persondb_core::types::Person;
use persondb_service::{PersonService, RandomPersonGenerator};
use persondb_store::SqliteRecordStore;
use persondb_text::TantivyIndex;

const USAGE: &str = "Usage: persondb <command> [args...]

Commands:
  init [count]                                   generate and store synthetic people
  get <reference>                                print one person
  upsert <reference> <json>                      create or merge a person
  delete <reference>                             remove a person from store and index
  search [query] [--country C] [--date D] [--from N] [--size N]
  advanced [--name N] [--country C] [--city C] [--from N] [--size N]
  index-search [query] [--from N] [--size N]     same envelope, answered by the index
  reindex [--batch N]                            re-send every stored person to the index";

type Service = PersonService<SqliteRecordStore, TantivyIndex>;

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    args.remove(0);
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

/// Splits `args` into positionals and `--flag value` pairs.
fn split_flags(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut positional = Vec::new();
    let mut flags = HashMap::new();
    let mut i = 0;
    while i < args.len() {
        if let Some(name) = args[i].strip_prefix("--") {
            if i + 1 >= args.len() { eprintln!("--{name} requires a value"); std::process::exit(2); }
            flags.insert(name.to_string(), args[i + 1].clone());
            i += 2;
        } else {
            positional.push(args[i].clone());
            i += 1;
        }
    }
    (positional, flags)
}

fn usize_flag(flags: &HashMap<String, String>, name: &str) -> anyhow::Result<Option<usize>> {
    flags
        .get(name)
        .map(|v| v.parse::<usize>().map_err(|e| anyhow::anyhow!("--{name}: {e}")))
        .transpose()
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn build_service(settings: &Settings, base: &Path) -> anyhow::Result<Service> {
    let store = if settings.store.path == IN_MEMORY {
        SqliteRecordStore::open_in_memory()?
    } else {
        SqliteRecordStore::open(&resolve_with_base(base, &settings.store.path))?
    };
    let index = if settings.index.dir == IN_MEMORY {
        TantivyIndex::create_in_ram()?
    } else {
        TantivyIndex::open_or_create(&resolve_with_base(base, &settings.index.dir))?
    };
    Ok(PersonService::new(store, index, Box::new(MergeCopier), Box::new(RandomPersonGenerator::new())))
}

/// Prints a serialized envelope, or fails when serialization did not produce one.
fn print_envelope(json: Option<String>) -> anyhow::Result<()> {
    let json = json.ok_or_else(|| anyhow::anyhow!("search response could not be serialized"))?;
    println!("{json}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    init_logging(&settings);
    let (cmd, args) = parse_args();
    let (positional, flags) = split_flags(&args);
    let base = env::current_dir()?;
    let service = build_service(&settings, &base)?;

    let from = usize_flag(&flags, "from")?.unwrap_or(0);
    let size = settings.search.page_size(usize_flag(&flags, "size")?);

    match cmd.as_str() {
        "init" => {
            let count = match positional.first() {
                Some(n) => n.parse::<usize>().map_err(|e| anyhow::anyhow!("count: {e}"))?,
                None => settings.init.default_count,
            };
            let done = service.init(count)?;
            println!("{}", serde_json::json!({ "initialized": done, "count": count }));
        }
        "get" => {
            let reference = positional.first().ok_or_else(|| anyhow::anyhow!("get requires a reference"))?;
            match service.get(reference)? {
                Some(person) => println!("{}", serde_json::to_string_pretty(&person)?),
                None => { eprintln!("No person with reference {reference}"); std::process::exit(1); }
            }
        }
        "upsert" => {
            let (Some(reference), Some(body)) = (positional.first(), positional.get(1)) else {
                eprintln!("Usage: persondb upsert <reference> <json>"); std::process::exit(2);
            };
            let incoming: Person = serde_json::from_str(body)?;
            let stored = service.upsert(reference, incoming)?;
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }
        "delete" => {
            let reference = positional.first().ok_or_else(|| anyhow::anyhow!("delete requires a reference"))?;
            let deleted = service.delete(reference)?;
            println!("{}", serde_json::json!({ "deleted": deleted }));
        }
        "search" => {
            let query = positional.first().map(String::as_str);
            let country = flags.get("country").map(String::as_str);
            let date = flags.get("date").map(String::as_str);
            print_envelope(service.search(query, country, date, from, size)?)?;
        }
        "advanced" => {
            let name = flags.get("name").map(String::as_str);
            let country = flags.get("country").map(String::as_str);
            let city = flags.get("city").map(String::as_str);
            print_envelope(service.advanced_search(name, country, city, from, size)?)?;
        }
        "index-search" => {
            let query = positional.first().map(String::as_str);
            print_envelope(service.search_index(query, from, size)?)?;
        }
        "reindex" => {
            let batch = usize_flag(&flags, "batch")?.unwrap_or(settings.search.max_page_size);
            let indexed = service.reindex(batch)?;
            println!("{}", serde_json::json!({ "reindexed": indexed }));
        }
        _ => { eprintln!("Unknown command: {}\n\n{USAGE}", cmd); std::process::exit(1); }
    }
    Ok(())
}
