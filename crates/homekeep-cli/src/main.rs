// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod render;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use homekeep_app::{HouseId, MaintenanceItemId, Session, UserId};
use homekeep_db::Store;
use render::Style;
use runtime::{Command, ItemFields, Runtime, parse_filter};
use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let now = local_now();
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `homekeep --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    init_tracing(options.log_filter.as_deref().unwrap_or(config.log_filter()))?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or HOMEKEEP_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;

    let user_id = options.user_id.unwrap_or_else(|| config.user_id());
    let mut house_id = options.house_id.or_else(|| config.house_id());
    if options.demo {
        let demo_house = store.seed_demo_data(user_id, now)?;
        house_id = house_id.or(Some(demo_house));
    }
    if let Some(house_id) = house_id {
        store.get_house(house_id)?;
    }
    if options.check_only {
        return Ok(());
    }

    let Some(command) = options.command else {
        print_help();
        return Ok(());
    };

    let style = if std::io::stdout().is_terminal() {
        Style { color: true }
    } else {
        Style::PLAIN
    };
    let mut runtime = Runtime::new(store, Session::new(house_id, user_id), style);
    let output = runtime.execute(&command, now)?;
    print!("{output}");
    Ok(())
}

/// Wall clock in the local offset so "today" matches the user's calendar.
/// Falls back to UTC when the offset cannot be determined.
fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// The config or `--log` value sets the baseline; `RUST_LOG` directives
/// are layered on top.
fn init_tracing(filter: &str) -> Result<()> {
    let mut env_filter = EnvFilter::builder()
        .parse(filter)
        .with_context(|| format!("invalid log filter {filter:?}"))?;
    if let Ok(raw) = env::var("RUST_LOG") {
        for directive in raw.split(',').filter(|part| !part.trim().is_empty()) {
            match directive.parse::<Directive>() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(error) => eprintln!("ignoring RUST_LOG directive {directive:?}: {error}"),
            }
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    house_id: Option<HouseId>,
    user_id: Option<UserId>,
    log_filter: Option<String>,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    command: Option<Command>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        house_id: None,
        user_id: None,
        log_filter: None,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
        command: None,
    };

    let args: Vec<String> = args.into_iter().map(|arg| arg.as_ref().to_owned()).collect();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value);
            }
            "--house" => {
                options.house_id = Some(HouseId::new(parse_id(iter.next(), "--house")?));
            }
            "--user" => {
                options.user_id = Some(UserId::new(parse_id(iter.next(), "--user")?));
            }
            "--log" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--log requires a filter directive such as info"))?;
                options.log_filter = Some(value);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown if unknown.starts_with('-') => {
                bail!("unknown argument {unknown:?}; run with --help to see supported options");
            }
            name => {
                options.command = Some(parse_command(name, &mut iter)?);
                break;
            }
        }
    }

    Ok(options)
}

fn parse_command(name: &str, rest: &mut impl Iterator<Item = String>) -> Result<Command> {
    let command = match name {
        "houses" => Command::Houses,
        "add-house" => {
            let words: Vec<String> = rest.by_ref().collect();
            if words.is_empty() {
                bail!("add-house requires a name, for example `homekeep add-house \"Main St\"`");
            }
            return Ok(Command::AddHouse(words.join(" ")));
        }
        "list" => {
            let mut filter = None;
            let mut json = false;
            while let Some(arg) = rest.next() {
                match arg.as_str() {
                    "--filter" => {
                        let value = rest.next().ok_or_else(|| {
                            anyhow!("--filter requires one of: pending, completed, all")
                        })?;
                        filter = Some(parse_filter(&value)?);
                    }
                    "--json" => json = true,
                    other => bail!("unexpected argument {other:?} for list"),
                }
            }
            return Ok(Command::List { filter, json });
        }
        "show" => {
            let id = parse_item_id(rest.next(), "show")?;
            let mut json = false;
            for arg in rest.by_ref() {
                match arg.as_str() {
                    "--json" => json = true,
                    other => bail!("unexpected argument {other:?} for show"),
                }
            }
            return Ok(Command::Show { id, json });
        }
        "add" => {
            let fields = parse_item_fields(rest)?;
            if fields.title.is_none() {
                bail!("add requires --title <title>");
            }
            return Ok(Command::Add(fields));
        }
        "edit" => {
            let id = parse_item_id(rest.next(), "edit")?;
            let fields = parse_item_fields(rest)?;
            return Ok(Command::Edit { id, fields });
        }
        "toggle" => Command::Toggle(parse_item_id(rest.next(), "toggle")?),
        "complete" => Command::Complete(parse_item_id(rest.next(), "complete")?),
        "delete" => {
            let mut ids = Vec::new();
            let mut confirmed = false;
            for arg in rest.by_ref() {
                if arg == "--yes" || arg == "-y" {
                    confirmed = true;
                } else {
                    ids.push(parse_item_id(Some(arg), "delete")?);
                }
            }
            return Ok(Command::Delete { ids, confirmed });
        }
        "overdue" => {
            let mut json = false;
            for arg in rest.by_ref() {
                match arg.as_str() {
                    "--json" => json = true,
                    other => bail!("unexpected argument {other:?} for overdue"),
                }
            }
            return Ok(Command::Overdue { json });
        }
        unknown => {
            bail!("unknown command {unknown:?}; run with --help to see supported commands")
        }
    };

    if let Some(extra) = rest.next() {
        bail!("unexpected argument {extra:?} for {name}");
    }
    Ok(command)
}

fn parse_item_fields(rest: &mut impl Iterator<Item = String>) -> Result<ItemFields> {
    let mut fields = ItemFields::default();
    while let Some(flag) = rest.next() {
        let slot = match flag.as_str() {
            "--title" => &mut fields.title,
            "--description" => &mut fields.description,
            "--category" => &mut fields.category,
            "--priority" => &mut fields.priority,
            "--status" => &mut fields.status,
            "--due" => &mut fields.due,
            "--system" => &mut fields.system,
            "--notes" => &mut fields.notes,
            other => bail!("unknown item field {other:?}; run with --help to see field flags"),
        };
        let value = rest
            .next()
            .ok_or_else(|| anyhow!("{flag} requires a value (use \"\" to clear it)"))?;
        *slot = Some(value);
    }
    Ok(fields)
}

fn parse_item_id(raw: Option<String>, command: &str) -> Result<MaintenanceItemId> {
    let raw = raw.ok_or_else(|| anyhow!("{command} requires an item id"))?;
    let value = raw
        .parse::<i64>()
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| anyhow!("invalid item id {raw:?} for {command}; ids are positive integers"))?;
    Ok(MaintenanceItemId::new(value))
}

fn parse_id(raw: Option<String>, flag: &str) -> Result<i64> {
    let raw = raw.ok_or_else(|| anyhow!("{flag} requires a numeric id"))?;
    raw.parse::<i64>()
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| anyhow!("invalid {flag} value {raw:?}; ids are positive integers"))
}

fn print_help() {
    println!("homekeep: household maintenance tracker");
    println!();
    println!("usage: homekeep [options] <command> [args]");
    println!();
    println!("options:");
    println!("  --config <path>          Use a specific config path");
    println!("  --house <id>             Act on this house (default [household].house_id)");
    println!("  --user <id>              Record new items as this user");
    println!("  --log <filter>           tracing filter directive, for example debug");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Use an in-memory database with demo data");
    println!("  --check                  Validate config + DB and exit");
    println!("  --help                   Show this help");
    println!();
    println!("commands:");
    println!("  houses                       List houses");
    println!("  add-house <name>             Create a house");
    println!("  list [--filter F] [--json]   List items (pending, completed, all)");
    println!("  show <id> [--json]           Show one item");
    println!("  add --title T [fields]       Create an item");
    println!("  edit <id> [fields]           Change an item; \"\" clears optional fields");
    println!("  toggle <id>                  Flip between completed and pending");
    println!("  complete <id>                Mark an item completed");
    println!("  delete <id>... --yes         Delete items permanently");
    println!("  overdue [--json]             List overdue items, oldest first");
    println!();
    println!("fields:");
    println!("  --category C  --priority P  --status S  --due YYYY-MM-DD");
    println!("  --system S  --description D  --notes N");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, local_now, parse_cli_args};
    use crate::runtime::{Command, ItemFields};
    use anyhow::Result;
    use homekeep_app::{
        HouseId, MaintenanceCategory, MaintenanceItem, MaintenanceItemId, MaintenancePriority,
        MaintenanceStatus, StatusFilter, UserId,
    };
    use std::path::PathBuf;
    use time::macros::{date, datetime};
    use time::{Duration, OffsetDateTime};

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/homekeep-config.toml")
    }

    #[test]
    fn local_now_tracks_the_current_instant() {
        let drift = local_now() - OffsetDateTime::now_utc();
        assert!(drift.abs() < Duration::seconds(5));
    }

    #[test]
    fn due_today_is_judged_in_the_clock_offset() {
        let item = MaintenanceItem {
            id: Some(MaintenanceItemId::new(1)),
            house_id: HouseId::new(1),
            title: "Replace HVAC filter".to_owned(),
            description: None,
            category: MaintenanceCategory::Routine,
            priority: MaintenancePriority::High,
            status: MaintenanceStatus::Pending,
            due_date: Some(date!(2025 - 06 - 01)),
            related_system: None,
            notes: None,
            created_by: UserId::new(1),
            created_at: datetime!(2025-05-01 00:00 UTC),
            updated_at: datetime!(2025-05-01 00:00 UTC),
            completed_at: None,
        };
        let evening = datetime!(2025-06-01 20:00 -4);
        assert!(!item.is_overdue(evening));
        assert!(item.is_overdue(evening.to_offset(time::UtcOffset::UTC)));
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                house_id: None,
                user_id: None,
                log_filter: None,
                print_config_path: false,
                print_db_path: false,
                demo: false,
                print_example: false,
                check_only: false,
                show_help: false,
                command: None,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_reads_house_user_and_log() -> Result<()> {
        let options = parse_cli_args(
            vec!["--house", "3", "--user", "9", "--log", "debug", "houses"],
            default_options_path(),
        )?;
        assert_eq!(options.house_id, Some(HouseId::new(3)));
        assert_eq!(options.user_id, Some(UserId::new(9)));
        assert_eq!(options.log_filter.as_deref(), Some("debug"));
        assert_eq!(options.command, Some(Command::Houses));
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_bad_ids() {
        let error = parse_cli_args(vec!["--house", "zero"], default_options_path())
            .expect_err("non-numeric house should fail");
        assert!(error.to_string().contains("positive integers"));

        let error = parse_cli_args(vec!["toggle", "-4"], default_options_path())
            .expect_err("negative item id should fail");
        assert!(error.to_string().contains("invalid item id"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(!options.print_db_path);
        assert!(!options.demo);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn list_command_parses_filter_and_json() -> Result<()> {
        let options = parse_cli_args(
            vec!["--demo", "list", "--filter", "completed", "--json"],
            default_options_path(),
        )?;
        assert!(options.demo);
        assert_eq!(
            options.command,
            Some(Command::List {
                filter: Some(StatusFilter::Completed),
                json: true,
            })
        );
        Ok(())
    }

    #[test]
    fn add_command_collects_fields() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "add",
                "--title",
                "Clean gutters",
                "--category",
                "seasonal",
                "--due",
                "2025-10-15",
            ],
            default_options_path(),
        )?;
        assert_eq!(
            options.command,
            Some(Command::Add(ItemFields {
                title: Some("Clean gutters".to_owned()),
                category: Some("seasonal".to_owned()),
                due: Some("2025-10-15".to_owned()),
                ..ItemFields::default()
            }))
        );

        let error = parse_cli_args(vec!["add", "--notes", "x"], default_options_path())
            .expect_err("add without title should fail");
        assert!(error.to_string().contains("--title"));
        Ok(())
    }

    #[test]
    fn edit_command_accepts_empty_values() -> Result<()> {
        let options = parse_cli_args(
            vec!["edit", "4", "--description", ""],
            default_options_path(),
        )?;
        assert_eq!(
            options.command,
            Some(Command::Edit {
                id: MaintenanceItemId::new(4),
                fields: ItemFields {
                    description: Some(String::new()),
                    ..ItemFields::default()
                },
            })
        );
        Ok(())
    }

    #[test]
    fn delete_command_collects_ids_and_confirmation() -> Result<()> {
        let options = parse_cli_args(
            vec!["delete", "1", "2", "--yes", "3"],
            default_options_path(),
        )?;
        assert_eq!(
            options.command,
            Some(Command::Delete {
                ids: vec![
                    MaintenanceItemId::new(1),
                    MaintenanceItemId::new(2),
                    MaintenanceItemId::new(3),
                ],
                confirmed: true,
            })
        );
        Ok(())
    }

    #[test]
    fn unknown_command_and_trailing_args_fail() {
        let error = parse_cli_args(vec!["frobnicate"], default_options_path())
            .expect_err("unknown command should fail");
        assert!(error.to_string().contains("unknown command"));

        let error = parse_cli_args(vec!["toggle", "1", "2"], default_options_path())
            .expect_err("extra toggle args should fail");
        assert!(error.to_string().contains("unexpected argument"));
    }

    #[test]
    fn add_house_joins_words() -> Result<()> {
        let options = parse_cli_args(vec!["add-house", "Lake", "Cabin"], default_options_path())?;
        assert_eq!(
            options.command,
            Some(Command::AddHouse("Lake Cabin".to_owned()))
        );
        Ok(())
    }
}
