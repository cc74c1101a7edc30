// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use catalog_app::{CatalogGateway, CriteriaField, FormField, ItemId};
use catalog_client::Client;
use catalog_testkit::{InMemoryCatalog, RuleSet};
use config::Config;
use runtime::{Command, Console};
use std::env;
use std::io;
use std::path::PathBuf;
use tracing::info;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("{error:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<bool> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(true);
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(true);
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(true);
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `catalog --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    logging::init(config.log_level())?;

    let command = options
        .command
        .clone()
        .unwrap_or(Command::Search(Vec::new()));

    if options.demo {
        info!(rules = options.rules.as_str(), "using in-memory demo catalog");
        let catalog = InMemoryCatalog::demo()?.with_rules(options.rules);
        if options.check_only {
            return Ok(true);
        }
        return execute(catalog, &command);
    }

    let mut client = Client::new(config.base_url(), config.timeout()?)
        .with_context(|| {
            format!(
                "invalid [server] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        })?
        .with_endpoints(config.endpoints());
    if let Some(token) = config.csrf_token() {
        client = client.with_csrf_token(token);
    }

    if options.check_only {
        let companies = client.ping()?;
        println!("ok: {} reachable, {companies} companies", client.base_url());
        return Ok(true);
    }

    execute(client, &command)
}

fn execute<G: CatalogGateway>(gateway: G, command: &Command) -> Result<bool> {
    let mut console = Console::new(gateway);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    console.run(command, &mut out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    rules: RuleSet,
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
        print_config_path: false,
        demo: false,
        rules: RuleSet::default(),
        print_example: false,
        check_only: false,
        show_help: false,
        command: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--rules" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--rules requires classic or strict"))?;
                options.rules = RuleSet::parse(value.as_ref()).ok_or_else(|| {
                    anyhow!(
                        "unknown rule set {:?}; use classic or strict",
                        value.as_ref()
                    )
                })?;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            flag if flag.starts_with('-') => {
                bail!("unknown argument {flag:?}; run with --help to see supported options");
            }
            name => {
                let rest: Vec<String> = iter.by_ref().map(|arg| arg.as_ref().to_owned()).collect();
                options.command = Some(parse_command(name, &rest)?);
            }
        }
    }

    Ok(options)
}

fn parse_command(name: &str, args: &[String]) -> Result<Command> {
    match name {
        "search" => Ok(Command::Search(parse_criteria(name, args)?)),
        "count" => Ok(Command::Count(parse_criteria(name, args)?)),
        "companies" => {
            if let Some(extra) = args.first() {
                bail!("companies takes no arguments, got {extra:?}");
            }
            Ok(Command::Companies)
        }
        "show" => Ok(Command::Show(single_id(name, args)?)),
        "delete" => Ok(Command::Delete(single_id(name, args)?)),
        "create" => Ok(Command::Create(parse_edits(name, args)?)),
        "update" => {
            let (id, rest) = args
                .split_first()
                .ok_or_else(|| anyhow!("update requires a record id"))?;
            Ok(Command::Update(parse_item_id(id)?, parse_edits(name, rest)?))
        }
        unknown => bail!(
            "unknown command {unknown:?}; expected search, count, companies, show, create, update or delete"
        ),
    }
}

fn parse_criteria(command: &str, args: &[String]) -> Result<Vec<(CriteriaField, String)>> {
    let mut criteria = Vec::new();
    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let field = match flag.as_str() {
            "--name" => CriteriaField::Name,
            "--release-date" => CriteriaField::ReleaseDate,
            other => bail!("{command} does not accept {other:?}; use --name or --release-date"),
        };
        let value = iter
            .next()
            .ok_or_else(|| anyhow!("{flag} requires a value"))?;
        criteria.push((field, value.clone()));
    }
    Ok(criteria)
}

fn parse_edits(command: &str, args: &[String]) -> Result<Vec<(FormField, String)>> {
    let mut edits = Vec::new();
    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let field = match flag.as_str() {
            "--face-auth" => {
                edits.push((FormField::FaceAuth, "true".to_owned()));
                continue;
            }
            "--no-face-auth" => {
                edits.push((FormField::FaceAuth, "false".to_owned()));
                continue;
            }
            "--name" => FormField::Name,
            "--release-date" => FormField::ReleaseDate,
            "--company" => FormField::CompanyId,
            other => bail!(
                "{command} does not accept {other:?}; use --name, --release-date, --face-auth, --no-face-auth or --company"
            ),
        };
        let value = iter
            .next()
            .ok_or_else(|| anyhow!("{flag} requires a value"))?;
        edits.push((field, value.clone()));
    }
    Ok(edits)
}

fn single_id(command: &str, args: &[String]) -> Result<ItemId> {
    match args {
        [id] => parse_item_id(id),
        [] => bail!("{command} requires a record id"),
        [_, extra, ..] => bail!("{command} takes one record id, got extra {extra:?}"),
    }
}

fn parse_item_id(raw: &str) -> Result<ItemId> {
    let id: i64 = raw
        .parse()
        .with_context(|| format!("record id must be a number, got {raw:?}"))?;
    if id <= 0 {
        bail!("record id must be positive, got {id}");
    }
    Ok(ItemId::new(id))
}

fn print_help() {
    println!("catalog [options] [command]");
    println!();
    println!("options:");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Use a seeded in-memory catalog instead of the server");
    println!("  --rules <classic|strict> Validation rules of the demo catalog");
    println!("  --check                  Validate config and reach the server");
    println!("  --help                   Show this help");
    println!();
    println!("commands (default: search):");
    println!("  search [--name N] [--release-date YYYY-MM-DD]");
    println!("  count  [--name N] [--release-date YYYY-MM-DD]");
    println!("  companies");
    println!("  show <id>");
    println!("  create [--name N] [--release-date D] [--face-auth] [--company ID]");
    println!("  update <id> [--name N] [--release-date D] [--face-auth|--no-face-auth] [--company ID]");
    println!("  delete <id>");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use crate::runtime::Command;
    use anyhow::Result;
    use catalog_app::{CriteriaField, FormField, ItemId};
    use catalog_testkit::RuleSet;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/catalog-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                demo: false,
                rules: RuleSet::Classic,
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
    fn parse_cli_args_sets_demo_rules_and_check() -> Result<()> {
        let options = parse_cli_args(
            vec!["--demo", "--rules", "strict", "--check"],
            default_options_path(),
        )?;
        assert!(options.demo);
        assert_eq!(options.rules, RuleSet::Strict);
        assert!(options.check_only);
        assert!(!options.print_example);

        let error = parse_cli_args(vec!["--rules", "lax"], default_options_path())
            .expect_err("unknown rule set should fail");
        assert!(error.to_string().contains("classic or strict"));
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
    fn search_command_collects_criteria_in_order() -> Result<()> {
        let options = parse_cli_args(
            vec!["--demo", "search", "--release-date", "2024-01-01", "--name", "Pro"],
            default_options_path(),
        )?;
        assert_eq!(
            options.command,
            Some(Command::Search(vec![
                (CriteriaField::ReleaseDate, "2024-01-01".to_owned()),
                (CriteriaField::Name, "Pro".to_owned()),
            ]))
        );
        Ok(())
    }

    #[test]
    fn update_command_takes_id_then_edits() -> Result<()> {
        let options = parse_cli_args(
            vec!["update", "7", "--no-face-auth", "--company", "3"],
            default_options_path(),
        )?;
        assert_eq!(
            options.command,
            Some(Command::Update(
                ItemId::new(7),
                vec![
                    (FormField::FaceAuth, "false".to_owned()),
                    (FormField::CompanyId, "3".to_owned()),
                ]
            ))
        );
        Ok(())
    }

    #[test]
    fn id_commands_reject_bad_ids() {
        for args in [
            vec!["show"],
            vec!["show", "abc"],
            vec!["delete", "0"],
            vec!["delete", "1", "2"],
            vec!["update"],
        ] {
            let result = parse_cli_args(args.clone(), default_options_path());
            assert!(result.is_err(), "{args:?} should fail");
        }
    }

    #[test]
    fn flags_after_command_belong_to_the_command() {
        let error = parse_cli_args(vec!["companies", "--demo"], default_options_path())
            .expect_err("companies takes no args");
        assert!(error.to_string().contains("companies takes no arguments"));

        let error = parse_cli_args(vec!["create", "--colour", "red"], default_options_path())
            .expect_err("unknown create flag");
        assert!(error.to_string().contains("create does not accept"));
    }

    #[test]
    fn unknown_command_is_rejected() {
        let error = parse_cli_args(vec!["frobnicate"], default_options_path())
            .expect_err("unknown command should fail");
        assert!(error.to_string().contains("unknown command"));
    }
}
