//! Command-line front end for the scoring core.
//!
//! # Responsibility
//! - Resolve configuration (`.env`, environment, flags) and start logging.
//! - Expose notice, catalog and project use-cases as subcommands.
//! - Score a catalog/ledger pair from JSON files without a database.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edital_core::db::{open_db, open_db_in_memory, Connection};
use edital_core::{
    compute_score, init_logging, ActivityCatalog, ActivityCategory, ActivityDefinition,
    ActivityId, CategoryId, CoreConfig, NoticeDraft, NoticeId, NoticeListQuery, NoticeService,
    ProjectActivityRecord, ProjectId, ProjectScore, ProjectService, SqliteNoticeRepository,
    SqliteProjectRepository,
};
use log::info;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "edital", version, about = "Research-program notice and project scoring")]
struct Cli {
    /// SQLite database file (overrides EDITAL_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log level (overrides EDITAL_LOG_LEVEL).
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute log directory (overrides EDITAL_LOG_DIR).
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Notice and catalog management.
    #[command(subcommand)]
    Notice(NoticeCommand),
    /// Project ledger and scores.
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Score a ledger against a catalog read from JSON files.
    Score(ScoreArgs),
    /// Print the core version.
    Version,
}

#[derive(Debug, Subcommand)]
enum NoticeCommand {
    /// Create a notice; without --catalog the latest notice's catalog is copied.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        opens_at: Option<i64>,
        #[arg(long)]
        closes_at: Option<i64>,
        /// JSON file holding a category list.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    List {
        /// Include deleted notices.
        #[arg(long)]
        all: bool,
    },
    Show {
        id: NoticeId,
    },
    AddCategory {
        notice_id: NoticeId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        unit: String,
    },
    AddActivity {
        notice_id: NoticeId,
        category_id: CategoryId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        points: u32,
        #[arg(long)]
        limit: u32,
    },
    /// Replace name, points and limit of an activity; its id is kept.
    UpdateActivity {
        notice_id: NoticeId,
        category_id: CategoryId,
        activity_id: ActivityId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        points: u32,
        #[arg(long)]
        limit: u32,
    },
    RemoveActivity {
        notice_id: NoticeId,
        category_id: CategoryId,
        activity_id: ActivityId,
    },
    RemoveCategory {
        notice_id: NoticeId,
        category_id: CategoryId,
    },
    Delete {
        id: NoticeId,
    },
}

#[derive(Debug, Subcommand)]
enum ProjectCommand {
    Create {
        notice_id: NoticeId,
        #[arg(long)]
        title: String,
    },
    /// Set the reported count of one activity; invalid counts are ignored.
    Report {
        project_id: ProjectId,
        activity_id: ActivityId,
        count: String,
    },
    Score {
        project_id: ProjectId,
    },
    /// Rank all active projects of a notice by total.
    Rank {
        notice_id: NoticeId,
    },
    Delete {
        id: ProjectId,
    },
}

#[derive(Debug, Args)]
struct ScoreArgs {
    /// JSON file holding a category list.
    #[arg(long)]
    catalog: PathBuf,
    /// JSON file holding ledger records.
    #[arg(long)]
    records: PathBuf,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }
    info!("event=cli_start module=cli status=ok");

    match cli.command {
        Command::Version => println!("edital_core version={}", edital_core::core_version()),
        Command::Score(args) => run_offline_score(&args)?,
        Command::Notice(command) => run_notice(&open_store(&config)?, command)?,
        Command::Project(command) => run_project(&open_store(&config)?, command)?,
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<CoreConfig> {
    let mut config = CoreConfig::from_env().context("invalid environment configuration")?;
    if let Some(db) = &cli.db {
        config.db_path = Some(db.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    Ok(config)
}

fn open_store(config: &CoreConfig) -> Result<Connection> {
    match &config.db_path {
        Some(path) => open_db(path).with_context(|| format!("failed to open {}", path.display())),
        None => open_db_in_memory().context("failed to open in-memory database"),
    }
}

fn run_notice(conn: &Connection, command: NoticeCommand) -> Result<()> {
    let service = NoticeService::new(SqliteNoticeRepository::try_new(conn)?);

    match command {
        NoticeCommand::Create {
            title,
            opens_at,
            closes_at,
            catalog,
        } => {
            let catalog = catalog.as_deref().map(read_catalog).transpose()?;
            let notice = service.create_notice(NoticeDraft {
                title,
                opens_at,
                closes_at,
                catalog,
            })?;
            print_json(&notice)?;
        }
        NoticeCommand::List { all } => {
            let notices = service.list_notices(&NoticeListQuery {
                include_deleted: all,
                ..NoticeListQuery::default()
            })?;
            for notice in notices {
                let state = if notice.is_active() { "active" } else { "deleted" };
                println!(
                    "{}\t{}\t{} activities\t{}",
                    notice.id,
                    state,
                    notice.catalog.activity_count(),
                    notice.title
                );
            }
        }
        NoticeCommand::Show { id } => print_json(&service.get_notice(id, true)?)?,
        NoticeCommand::AddCategory {
            notice_id,
            name,
            unit,
        } => {
            let (category_id, _) = service.edit_catalog(notice_id, |catalog| {
                catalog.add_category(ActivityCategory::new(name, unit))
            })?;
            println!("{category_id}");
        }
        NoticeCommand::AddActivity {
            notice_id,
            category_id,
            name,
            points,
            limit,
        } => {
            let (activity_id, _) = service.edit_catalog(notice_id, |catalog| {
                catalog.add_activity(category_id, ActivityDefinition::new(name, points, limit))
            })?;
            println!("{activity_id}");
        }
        NoticeCommand::UpdateActivity {
            notice_id,
            category_id,
            activity_id,
            name,
            points,
            limit,
        } => {
            let (_, notice) = service.edit_catalog(notice_id, |catalog| {
                catalog.update_activity(
                    category_id,
                    activity_id,
                    ActivityDefinition::new(name, points, limit),
                )
            })?;
            if let Some(activity) = notice.catalog.find_activity(activity_id) {
                print_json(activity)?;
            }
        }
        NoticeCommand::RemoveActivity {
            notice_id,
            category_id,
            activity_id,
        } => {
            service.edit_catalog(notice_id, |catalog| {
                catalog.remove_activity(category_id, activity_id)
            })?;
        }
        NoticeCommand::RemoveCategory {
            notice_id,
            category_id,
        } => {
            service.edit_catalog(notice_id, |catalog| catalog.remove_category(category_id))?;
        }
        NoticeCommand::Delete { id } => service.soft_delete_notice(id)?,
    }
    Ok(())
}

fn run_project(conn: &Connection, command: ProjectCommand) -> Result<()> {
    let service = ProjectService::new(
        SqliteNoticeRepository::try_new(conn)?,
        SqliteProjectRepository::try_new(conn)?,
    );

    match command {
        ProjectCommand::Create { notice_id, title } => {
            print_json(&service.create_project(notice_id, title)?)?;
        }
        ProjectCommand::Report {
            project_id,
            activity_id,
            count,
        } => {
            let outcome = service.report_activity(project_id, activity_id, &count)?;
            if !outcome.changed {
                eprintln!("count `{count}` ignored");
            }
            print_json(&score_json(&outcome.score))?;
        }
        ProjectCommand::Score { project_id } => {
            print_json(&score_json(&service.score_project(project_id)?))?;
        }
        ProjectCommand::Rank { notice_id } => {
            for (position, score) in service.rank_projects(notice_id)?.iter().enumerate() {
                println!(
                    "{}\t{}\t{}/{}",
                    position + 1,
                    score.project_id,
                    score.report.total,
                    score.max_total
                );
            }
        }
        ProjectCommand::Delete { id } => service.soft_delete_project(id)?,
    }
    Ok(())
}

fn run_offline_score(args: &ScoreArgs) -> Result<()> {
    let catalog = read_catalog(&args.catalog)?;
    let raw = fs::read_to_string(&args.records)
        .with_context(|| format!("failed to read {}", args.records.display()))?;
    let records: Vec<ProjectActivityRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid ledger in {}", args.records.display()))?;

    print_json(&compute_score(&catalog, &records))
}

fn read_catalog(path: &Path) -> Result<ActivityCatalog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let catalog: ActivityCatalog = serde_json::from_str(&raw)
        .with_context(|| format!("invalid catalog in {}", path.display()))?;
    catalog
        .validate()
        .with_context(|| format!("invalid catalog in {}", path.display()))?;
    Ok(catalog)
}

fn score_json(score: &ProjectScore) -> serde_json::Value {
    json!({
        "project_id": score.project_id,
        "notice_id": score.notice_id,
        "total": score.report.total,
        "max_total": score.max_total,
        "per_activity": score.report.per_activity,
        "records": score.records,
    })
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{run_notice, Cli, Command};
    use clap::Parser;
    use edital_core::db::open_db_in_memory;
    use edital_core::{
        ActivityCatalog, ActivityCategory, ActivityDefinition, NoticeDraft, NoticeService,
        SqliteNoticeRepository,
    };

    #[test]
    fn update_activity_rewrites_stored_definition() {
        let conn = open_db_in_memory().unwrap();
        let service = NoticeService::new(SqliteNoticeRepository::try_new(&conn).unwrap());
        let activity = ActivityDefinition::new("Journal paper", 10, 30);
        let category = ActivityCategory::new("Papers", "count").with_activity(activity.clone());
        let category_id = category.id;
        let mut draft = NoticeDraft::new("Edital 2026");
        draft.catalog = Some(ActivityCatalog::from_categories(vec![category]).unwrap());
        let notice = service.create_notice(draft).unwrap();

        let cli = Cli::try_parse_from([
            "edital".to_string(),
            "notice".to_string(),
            "update-activity".to_string(),
            notice.id.to_string(),
            category_id.to_string(),
            activity.id.to_string(),
            "--name".to_string(),
            "Journal paper (Q1)".to_string(),
            "--points".to_string(),
            "12".to_string(),
            "--limit".to_string(),
            "36".to_string(),
        ])
        .unwrap();
        let Command::Notice(command) = cli.command else {
            panic!("expected notice subcommand");
        };
        run_notice(&conn, command).unwrap();

        let catalog = service.get_catalog(notice.id).unwrap();
        let stored = catalog.find_activity(activity.id).unwrap();
        assert_eq!(stored.name, "Journal paper (Q1)");
        assert_eq!((stored.points, stored.limit), (12, 36));
    }

    #[test]
    fn update_activity_requires_all_fields() {
        let result = Cli::try_parse_from([
            "edital",
            "notice",
            "update-activity",
            "00000000-0000-0000-0000-000000000001",
            "00000000-0000-0000-0000-000000000002",
            "00000000-0000-0000-0000-000000000003",
            "--name",
            "Workshop",
        ]);
        assert!(result.is_err());
    }
}
