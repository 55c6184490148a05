use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use katha_api::{
    config::{self, AppConfig},
    db::{self, DbPool},
    entities::group,
    numbering::{next_category_number, CategoryNumber},
    services::{
        categories::{CategoryService, CreateCategoryInput},
        cities::{CityService, CreateCityInput},
        groups::{CreateGroupInput, GroupService},
        items::{CreateItemInput, ItemService},
    },
};
use migrations::Migrator;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Offline numbering needs neither config nor database
    if let Commands::NextCategory(args) = &cli.command {
        if args.offline {
            return handle_offline_next_category(args, cli.json);
        }
    }

    let context = CliContext::initialize().await?;
    match cli.command {
        Commands::Migrate(command) => handle_migrate_command(&context, command).await?,
        Commands::CheckConnection => handle_check_connection(&context, cli.json).await?,
        Commands::NextCategory(args) => handle_next_category(&context, args, cli.json).await?,
        Commands::Seed => handle_seed(&context).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "katha", about = "Katha CLI for database maintenance and numbering", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply or roll back schema migrations
    #[command(subcommand)]
    Migrate(MigrateCommands),
    /// Ping the configured database
    CheckConnection,
    /// Show the number the next category of a group would receive
    NextCategory(NextCategoryArgs),
    /// Load demo groups, categories, items and cities into an empty database
    Seed,
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Apply all pending migrations
    Up,
    /// Roll back the most recent migrations
    Down {
        #[arg(long, default_value_t = 1, help = "Number of migrations to roll back")]
        steps: u32,
    },
    /// List applied and pending migrations
    Status,
    /// Drop every table and re-apply all migrations
    Fresh,
}

#[derive(Args)]
struct NextCategoryArgs {
    #[arg(long, help = "Group number, e.g. 3 or 12")]
    group_number: u32,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Compute from --existing instead of reading the database"
    )]
    offline: bool,
    #[arg(
        long,
        value_delimiter = ',',
        requires = "offline",
        help = "Category numbers already used in the group (offline only)"
    )]
    existing: Vec<i64>,
}

#[derive(Serialize)]
struct NextCategoryOutput {
    group_number: u32,
    next_number: i64,
}

struct CliContext {
    _config: AppConfig,
    db: Arc<DbPool>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;

        Ok(Self {
            _config: config,
            db: Arc::new(db_pool),
        })
    }
}

async fn handle_migrate_command(context: &CliContext, command: MigrateCommands) -> Result<()> {
    let db = &*context.db;
    match command {
        MigrateCommands::Up => {
            Migrator::up(db, None).await.context("migration failed")?;
            println!("Migrations applied");
        }
        MigrateCommands::Down { steps } => {
            Migrator::down(db, Some(steps))
                .await
                .context("rollback failed")?;
            println!("Rolled back {} migration(s)", steps);
        }
        MigrateCommands::Status => {
            let applied = Migrator::get_applied_migrations(db).await?;
            let pending = Migrator::get_pending_migrations(db).await?;
            for migration in &applied {
                println!("applied  {}", migration.name());
            }
            for migration in &pending {
                println!("pending  {}", migration.name());
            }
        }
        MigrateCommands::Fresh => {
            Migrator::fresh(db).await.context("fresh migration failed")?;
            println!("Database recreated");
        }
    }
    Ok(())
}

async fn handle_check_connection(context: &CliContext, json: bool) -> Result<()> {
    let latency = db::check_connection(&context.db).await?;
    if json {
        print_json(&serde_json::json!({
            "status": "up",
            "latency_ms": latency.as_millis() as u64,
        }))?;
    } else {
        println!("Database reachable ({} ms)", latency.as_millis());
    }
    Ok(())
}

fn handle_offline_next_category(args: &NextCategoryArgs, json: bool) -> Result<()> {
    let existing = args
        .existing
        .iter()
        .map(|n| CategoryNumber::parse_for_group(args.group_number, *n))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid --existing number")?;
    let next = next_category_number(args.group_number, existing)?;
    render_next(
        &NextCategoryOutput {
            group_number: args.group_number,
            next_number: next.value(),
        },
        json,
    )
}

async fn handle_next_category(
    context: &CliContext,
    args: NextCategoryArgs,
    json: bool,
) -> Result<()> {
    let group_number = i32::try_from(args.group_number).context("group number too large")?;
    let group = group::Entity::find()
        .filter(group::Column::GroupNumber.eq(group_number))
        .one(&*context.db)
        .await?;

    let next_number = match group {
        Some(group) => {
            CategoryService::new(context.db.clone())
                .next_number(group.id)
                .await?
                .next_number
        }
        None => {
            info!(group_number, "group not in database; showing its first number");
            CategoryNumber::first(args.group_number)?.value()
        }
    };

    render_next(
        &NextCategoryOutput {
            group_number: args.group_number,
            next_number,
        },
        json,
    )
}

fn render_next(output: &NextCategoryOutput, json: bool) -> Result<()> {
    if json {
        print_json(output)?;
    } else {
        println!(
            "Next category number for group {}: {}",
            output.group_number, output.next_number
        );
    }
    Ok(())
}

struct SeedItem {
    code: &'static str,
    name: &'static str,
    mrp: rust_decimal::Decimal,
    stock: i32,
}

struct SeedCategory {
    name: &'static str,
    items: &'static [SeedItem],
}

struct SeedGroup {
    number: i32,
    name: &'static str,
    categories: &'static [SeedCategory],
}

const SEED_GROUPS: &[SeedGroup] = &[
    SeedGroup {
        number: 1,
        name: "Stationery",
        categories: &[
            SeedCategory {
                name: "Notebooks",
                items: &[
                    SeedItem { code: "NB-100", name: "Ruled notebook 100 pages", mrp: dec!(45), stock: 120 },
                    SeedItem { code: "NB-200", name: "Ruled notebook 200 pages", mrp: dec!(80), stock: 60 },
                ],
            },
            SeedCategory {
                name: "Pens",
                items: &[SeedItem { code: "PN-BL", name: "Blue ball pen", mrp: dec!(10), stock: 500 }],
            },
        ],
    },
    SeedGroup {
        number: 3,
        name: "Books",
        categories: &[
            SeedCategory {
                name: "Textbooks",
                items: &[SeedItem { code: "TB-MATH-5", name: "Mathematics class 5", mrp: dec!(220), stock: 40 }],
            },
            SeedCategory { name: "Story books", items: &[] },
        ],
    },
    SeedGroup {
        number: 12,
        name: "Uniforms",
        categories: &[SeedCategory {
            name: "Shirts",
            items: &[SeedItem { code: "SH-32", name: "White shirt size 32", mrp: dec!(350), stock: 25 }],
        }],
    },
];

const SEED_CITIES: &[&str] = &["Pune", "Nashik", "Kolhapur"];

async fn handle_seed(context: &CliContext) -> Result<()> {
    let groups = GroupService::new(context.db.clone());
    let categories = CategoryService::new(context.db.clone());
    let items = ItemService::new(context.db.clone());
    let cities = CityService::new(context.db.clone());

    if !groups.list_groups().await?.is_empty() {
        bail!("database already has groups; seed only runs on an empty database");
    }

    for seed_group in SEED_GROUPS {
        let group = groups
            .create_group(CreateGroupInput {
                group_number: seed_group.number,
                group_name: seed_group.name.to_string(),
            })
            .await?;
        for seed_category in seed_group.categories {
            let category = categories
                .create_category(CreateCategoryInput {
                    group_id: group.id,
                    category_name: seed_category.name.to_string(),
                    category_number: None,
                })
                .await?;
            println!(
                "group {} / category {} {}",
                group.group_number, category.category_number, category.category_name
            );
            for seed_item in seed_category.items {
                items
                    .create_item(CreateItemInput {
                        item_code: seed_item.code.to_string(),
                        item_name: seed_item.name.to_string(),
                        category_id: category.id,
                        mrp: seed_item.mrp,
                        gst_percentage: dec!(12),
                        opening_stock: seed_item.stock,
                        reorder_level: 10,
                    })
                    .await?;
            }
        }
    }

    for name in SEED_CITIES {
        cities
            .create_city(CreateCityInput {
                name: name.to_string(),
            })
            .await?;
    }

    println!(
        "Seeded {} groups and {} cities",
        SEED_GROUPS.len(),
        SEED_CITIES.len()
    );
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
