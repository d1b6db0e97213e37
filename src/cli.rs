// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, command, value_parser};

fn user() -> Arg {
    Arg::new("user")
        .long("user")
        .short('u')
        .required(true)
        .help("Owning user name")
}

fn name() -> Arg {
    Arg::new("name").long("name").required(true)
}

fn output_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

pub fn build_cli() -> Command {
    command!()
        .name("fintrack")
        .about("Track income and expenditure; report per account or category")
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the database if missing"))
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            Arg::new("no-defaults")
                                .long("no-defaults")
                                .action(ArgAction::SetTrue)
                                .help("Skip provisioning the default categories"),
                        ),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("currency")
                .about("Manage currencies")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("code").long("code").required(true))
                        .arg(name()),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(user())
                        .arg(name())
                        .arg(Arg::new("currency").long("currency").required(true)),
                )
                .subcommand(Command::new("list").arg(user()))
                .subcommand(Command::new("activate").arg(user()).arg(name()))
                .subcommand(Command::new("deactivate").arg(user()).arg(name())),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(Command::new("add").arg(user()).arg(name()))
                .subcommand(Command::new("list").arg(user()))
                .subcommand(Command::new("rm").arg(user()).arg(name())),
        )
        .subcommand(
            Command::new("tag")
                .about("Manage tags")
                .subcommand(Command::new("add").arg(user()).arg(name()))
                .subcommand(Command::new("list").arg(user())),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(
                    Command::new("add")
                        .arg(user())
                        .arg(Arg::new("account").long("account").required(true))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .required(true)
                                .help("income|expenditure"),
                        )
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("tag")
                                .long("tag")
                                .action(ArgAction::Append)
                                .help("May be repeated"),
                        )
                        .arg(Arg::new("description").long("description"))
                        .arg(
                            Arg::new("at")
                                .long("at")
                                .help("YYYY-MM-DD[ HH:MM[:SS]] in the configured timezone"),
                        ),
                )
                .subcommand(output_flags(
                    Command::new("list")
                        .arg(user())
                        .arg(Arg::new("account").long("account"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("rules")
                .about("Auto-categorize transactions by description")
                .subcommand(
                    Command::new("add")
                        .arg(user())
                        .arg(Arg::new("pattern").long("pattern").required(true))
                        .arg(Arg::new("category").long("category").required(true)),
                )
                .subcommand(Command::new("list").arg(user()))
                .subcommand(Command::new("rm").arg(Arg::new("id").long("id").required(true))),
        )
        .subcommand(
            Command::new("import").subcommand(
                Command::new("transactions")
                    .arg(user())
                    .arg(Arg::new("path").long("path").required(true)),
            ),
        )
        .subcommand(
            Command::new("export").subcommand(
                Command::new("transactions")
                    .arg(user())
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv|json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(output_flags(
            Command::new("report")
                .about("Income, expenditure and balance per period")
                .arg(user())
                .arg(Arg::new("start").long("start").help("YYYY-MM-DD"))
                .arg(Arg::new("end").long("end").help("YYYY-MM-DD, defaults to today"))
                .arg(
                    Arg::new("granularity")
                        .long("granularity")
                        .help("monthly|daily (anything else means monthly)"),
                )
                .arg(
                    Arg::new("group-by")
                        .long("group-by")
                        .help("accounts|categories"),
                )
                .arg(
                    Arg::new("category")
                        .long("category")
                        .help("Only count transactions in this category"),
                ),
        ))
        .subcommand(
            Command::new("config")
                .about("Settings")
                .subcommand(
                    Command::new("set-timezone").arg(
                        Arg::new("offset")
                            .required(true)
                            .allow_hyphen_values(true)
                            .help("±HH:MM or UTC"),
                    ),
                )
                .subcommand(Command::new("show")),
        )
}
