//! corpstore demo entry point.
//!
//! # Responsibility
//! - Open a persistence unit from configuration and seed random data.
//! - Print repository and query builder results for quick sanity checks,
//!   as tab-separated lines or as one JSON document.

use anyhow::{anyhow, Context};
use clap::Parser;
use corpstore_core::seed::DEPARTMENT_NAMES;
use corpstore_core::{
    default_registry, init_logging, load_config, Department, Employee, GenericRepository,
    PersistenceConfig, PersistenceUnit, RandomDataGenerator, SessionRepository, SqliteSession,
};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Seed and query a corpstore persistence unit."
)]
struct Cli {
    /// Path to the JSON persistence unit configuration.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of random employees to insert.
    #[arg(long, default_value_t = 20)]
    employees: usize,

    /// Only list employees with this last name.
    #[arg(long = "last-name")]
    last_name: Option<String>,

    /// Seed for reproducible data.
    #[arg(long)]
    seed: Option<u64>,

    /// Page size used when listing employees.
    #[arg(long = "page-size", default_value_t = 10)]
    page_size: i64,

    /// Print departments and the listed page as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PersistenceConfig::default(),
    };
    config.validate()?;
    init_logging(&config.log).map_err(|err| anyhow!(err))?;

    let unit = PersistenceUnit::new(config, default_registry()?);
    let conn = unit
        .open_connection()
        .with_context(|| format!("opening persistence unit `{}`", unit.name()))?;
    let session = SqliteSession::new(&conn, unit.registry().clone());
    let repo = SessionRepository::new(&session);

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut generator = RandomDataGenerator::new(rng);

    for name in DEPARTMENT_NAMES {
        if repo.find_by::<Department>("name", *name)?.is_empty() {
            repo.save(&Department::new(*name))?;
        }
    }

    for _ in 0..cli.employees {
        let department: Department =
            repo.find_one_by("name", generator.random_department().name)?;
        let mut employee = generator.random_employee();
        department.enroll(&mut employee);
        repo.save(&employee)?;
    }
    info!(
        "event=seed module=cli status=ok unit={} employees={}",
        unit.name(),
        cli.employees
    );

    let mut query = repo.query_builder_for::<Employee>()?;
    if let Some(last_name) = &cli.last_name {
        query.where_equals("lastName", last_name.as_str())?;
    }
    query
        .order_by("firstName", true)?
        .paginate(1, cli.page_size)?;

    let matching = query.count()?;
    let page = query.execute()?;

    if cli.json {
        let document = json!({
            "unit": unit.name(),
            "departments": repo.find_all::<Department>()?,
            "employees": repo.count::<Employee>()?,
            "matching": matching,
            "page": page,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!("unit={}", unit.name());
    println!("departments={}", repo.count::<Department>()?);
    println!("employees={}", repo.count::<Employee>()?);
    println!("matching={matching}");
    for employee in page {
        println!(
            "{}\t{}\t{}\t{}",
            employee.id.unwrap_or_default(),
            employee.full_name(),
            employee.email.as_deref().unwrap_or("-"),
            employee.salary.unwrap_or_default()
        );
    }

    Ok(())
}
