// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

use crate::engine::MAX_INSTALLMENTS;

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn installments_parser() -> clap::builder::RangedI64ValueParser<u32> {
    value_parser!(u32).range(0..=i64::from(MAX_INSTALLMENTS))
}

fn description_arg() -> Arg {
    Arg::new("description").long("description").short('d')
}

fn range_args(cmd: Command, what: &str) -> Command {
    cmd.arg(
        Arg::new("from")
            .long("from")
            .help(format!("First {} of the report window", what)),
    )
    .arg(
        Arg::new("to")
            .long("to")
            .help(format!("Last {} of the report window", what)),
    )
    .arg(
        Arg::new("single_only")
            .long("single-only")
            .action(ArgAction::SetTrue)
            .help("Leave installment payments out"),
    )
}

fn by_arg(required: bool, multiple: bool) -> Arg {
    let arg = Arg::new("by")
        .long("by")
        .value_parser(["category", "type", "payment", "kind"])
        .help("Dimension to group by");
    let arg = if multiple {
        arg.action(ArgAction::Append)
    } else {
        arg
    };
    arg.required(required)
}

fn order_arg() -> Arg {
    Arg::new("order")
        .long("order")
        .value_parser(["alpha", "total"])
        .default_value("alpha")
        .help("Order of dimension values within a period")
}

fn kind_arg(required: bool) -> Arg {
    Arg::new("kind")
        .long("kind")
        .value_parser(["expense", "income", "investment"])
        .required(required)
}

pub fn build_cli() -> Command {
    Command::new("splitpay")
        .about("Expense tracker with installment-aware monthly reports")
        .version(clap::crate_version!())
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Write debug logs to the data directory"),
        )
        .subcommand(
            Command::new("init").about("Create the database").arg(
                Arg::new("seed")
                    .long("seed")
                    .action(ArgAction::SetTrue)
                    .help("Insert default categories, types and payment methods"),
            ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(kind_arg(false).default_value("expense"))
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(description_arg()),
                )
                .subcommand(json_args(Command::new("list").arg(kind_arg(false))))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(Arg::new("name").long("name"))
                        .arg(description_arg()),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("type")
                .about("Manage expense types")
                .subcommand(
                    Command::new("add")
                        .arg(kind_arg(false).default_value("expense"))
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("category").long("category"))
                        .arg(description_arg()),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(Arg::new("name").long("name"))
                        .arg(Arg::new("category").long("category"))
                        .arg(description_arg()),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("payment")
                .about("Manage payment methods")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(description_arg()),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(Arg::new("name").long("name"))
                        .arg(description_arg()),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("expense")
                .about("Record and browse expenses")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_hyphen_values(true)
                                .help("Full amount, or the value of each installment"),
                        )
                        .arg(Arg::new("type").long("type").required(true))
                        .arg(Arg::new("payment").long("payment").required(true))
                        .arg(description_arg().required(true))
                        .arg(
                            Arg::new("installments")
                                .long("installments")
                                .value_parser(installments_parser())
                                .default_value("0")
                                .help("Number of monthly installments; 0 pays in full"),
                        ),
                )
                .subcommand(json_args(
                    Command::new("list")
                        .arg(Arg::new("month").long("month"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("type").long("type"))
                        .arg(Arg::new("payment").long("payment"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(Arg::new("date").long("date"))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .allow_hyphen_values(true),
                        )
                        .arg(Arg::new("type").long("type"))
                        .arg(Arg::new("payment").long("payment"))
                        .arg(description_arg())
                        .arg(
                            Arg::new("installments")
                                .long("installments")
                                .value_parser(installments_parser()),
                        ),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("report")
                .about("Cash-flow reports")
                .subcommand(json_args(range_args(
                    Command::new("monthly")
                        .about("Totals per month, optionally split by dimensions")
                        .arg(by_arg(false, true))
                        .arg(order_arg()),
                    "month (YYYY-MM)",
                )))
                .subcommand(json_args(range_args(
                    Command::new("breakdown")
                        .about("Subtotals and shares per dimension value")
                        .arg(by_arg(true, false))
                        .arg(order_arg().default_value("total")),
                    "month (YYYY-MM)",
                )))
                .subcommand(json_args(
                    Command::new("installments")
                        .about("Installment amounts per month over the whole schedule"),
                ))
                .subcommand(json_args(range_args(
                    Command::new("daily")
                        .about("Totals per purchase day, without installment expansion")
                        .arg(by_arg(false, true))
                        .arg(order_arg()),
                    "day (YYYY-MM-DD)",
                )))
                .subcommand(range_args(
                    Command::new("dashboard").about("All monthly views for one window"),
                    "month (YYYY-MM)",
                )),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(range_args(
                    Command::new("schedule")
                        .about("Write the expanded cash-flow schedule to a file")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .value_parser(["csv", "json"])
                                .default_value("csv"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                    "month (YYYY-MM)",
                )),
        )
        .subcommand(Command::new("doctor").about("Report records that reports would skip"))
        .subcommand(
            Command::new("config")
                .about("Read or change settings")
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
}
