//! `student-records` - CLI and web server for student registration records.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use student_records::cli::{Cli, Command, ConfigCommand};
use student_records::{init_logging, store, web, Config, RecordStore, StudentRecord};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Validation looks at the named file alone, so it must not depend on the
    // effective configuration loading first.
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        return validate_config(file.clone());
    }

    let config = Config::load_from(cli.config.clone())?;

    init_logging(cli.verbosity(), config.log.format);

    match cli.command {
        Command::Serve { bind } => handle_serve(config, bind),
        Command::List { json } => {
            let store = store::open(&config.store)?;
            print_records(&store.list_all()?, json)
        }
        Command::Search { query, json } => {
            let store = store::open(&config.store)?;
            print_records(&store.search(&query)?, json)
        }
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn handle_serve(
    mut config: Config,
    bind: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    let addr = config.bind_addr()?;

    // Opened outside the runtime: the remote backend's blocking client must
    // not be created or dropped on an async thread.
    let store = store::open(&config.store)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(web::serve(Arc::clone(&store), addr))?;
    drop(runtime);
    drop(store);
    Ok(())
}

fn print_records(
    records: &[StudentRecord],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No student records.");
        return Ok(());
    }

    println!(
        "{:<24} {:<16} {:<20} {:<8}",
        "NAME", "REG NUMBER", "DEPARTMENT", "LEVEL"
    );
    for record in records {
        println!(
            "{:<24} {:<16} {:<20} {:<8}",
            record.name, record.reg_number, record.department, record.level
        );
    }
    println!();
    println!("{} record(s)", records.len());
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("[server]");
                println!("  bind:         {}", config.server.bind);
                println!();
                println!("[store]");
                println!("  backend:      {:?}", config.store.backend);
                println!("  data file:    {}", config.store.data_file.display());
                println!("  remote url:   {}", config.store.remote.base_url);
                println!("  collection:   {}", config.store.remote.collection);
                println!("  timeout (s):  {}", config.store.remote.timeout_secs);
                println!();
                println!("[log]");
                println!("  format:       {}", config.log.format);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => return validate_config(file),
    }
    Ok(())
}

fn validate_config(file: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    Config::validate_file(&path)?;
    println!("Configuration is valid.");
    Ok(())
}
