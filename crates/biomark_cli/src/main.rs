//! Command-line access to a biomarker database.
//!
//! Reads `BIOMARK_DB_PATH`, `BIOMARK_LOG_LEVEL` and `BIOMARK_LOG_DIR`.

use biomark_core::db::open_db;
use biomark_core::{
    init_logging, purge_user_data, AppConfig, BiomarkerCategory, CategoryListQuery,
    CategoryService, RecordListQuery, RecordService, SqliteCategoryRepository,
    SqliteRecordRepository, SqliteTargetRepository, UserRef,
};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::process::ExitCode;

const USAGE: &str = "usage:
  biomark version
  biomark categories [SEARCH...]
  biomark records USER [SEARCH...]
  biomark purge-user USER";

const RECORDS_PAGE_SIZE: u32 = 500;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    if command == "version" {
        println!("biomark_core version={}", biomark_core::core_version());
        return ExitCode::SUCCESS;
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err}");
            return ExitCode::from(2);
        }
    };

    if let Some(log_dir) = config.log_dir.as_ref() {
        if let Err(err) = init_logging(config.log_level, &log_dir.to_string_lossy()) {
            eprintln!("Logging error: {err}");
            return ExitCode::FAILURE;
        }
    }

    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("Database error ({}): {err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };
    info!("event=cli_command module=cli status=start command={command}");

    let result = match command.as_str() {
        "categories" => print_categories(&conn, &rest.join(" ")),
        "records" => match rest.split_first() {
            Some((user, search)) => print_records(&conn, user, &search.join(" ")),
            None => Err(USAGE.into()),
        },
        "purge-user" => match rest {
            [user] => purge_user(&conn, user),
            _ => Err(USAGE.into()),
        },
        _ => Err(USAGE.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn print_categories(conn: &Connection, search: &str) -> Result<(), Box<dyn Error>> {
    let service = CategoryService::new(SqliteCategoryRepository::try_new(conn)?);
    let query = CategoryListQuery {
        text: Some(search.to_string()),
        ..CategoryListQuery::default()
    };
    for category in service.list_categories(&query)? {
        println!("{}", category_line(&category));
    }
    Ok(())
}

fn print_records(conn: &Connection, user: &str, search: &str) -> Result<(), Box<dyn Error>> {
    let service = RecordService::new(
        SqliteRecordRepository::try_new(conn)?,
        SqliteCategoryRepository::try_new(conn)?,
        SqliteTargetRepository::try_new(conn)?,
    );
    let mut query = RecordListQuery {
        user: Some(UserRef::new(user)?),
        text: Some(search.to_string()),
        limit: Some(RECORDS_PAGE_SIZE),
        ..RecordListQuery::default()
    };
    loop {
        let page = service.list_record_views(&query)?;
        for view in &page {
            println!("{view}");
        }
        if page.len() < RECORDS_PAGE_SIZE as usize {
            return Ok(());
        }
        query.offset += RECORDS_PAGE_SIZE;
    }
}

fn purge_user(conn: &Connection, user: &str) -> Result<(), Box<dyn Error>> {
    let removed = purge_user_data(conn, &UserRef::new(user)?)?;
    println!(
        "removed {} records and {} targets",
        removed.records, removed.targets
    );
    Ok(())
}

fn category_line(category: &BiomarkerCategory) -> String {
    let bound = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
    let target = match (category.default_target_value, category.default_acceptable_range) {
        (Some(value), Some(range)) => format!("{value} ±{range}"),
        (Some(value), None) => value.to_string(),
        _ => "-".to_string(),
    };
    format!(
        "{}\t{}\t[{}, {}]\ttarget {}",
        category.name,
        category.unit,
        bound(category.reference_range_min),
        bound(category.reference_range_max),
        target
    )
}
