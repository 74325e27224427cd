//! Command tree for the `quire` binary.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the clap command tree.
pub fn build_cli() -> Command {
    Command::new("quire")
        .about("Operate a quire data directory")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_name("FILE")
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .short('d')
                .global(true)
                .value_name("DIR")
                .help("Data directory (overrides config and QUIRE_DATA_DIR)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log at debug level"),
        )
        .subcommand(Command::new("reindex").about("Rebuild the search index from published posts"))
        .subcommand(
            Command::new("search")
                .about("Query the search index")
                .arg(
                    Arg::new("query")
                        .required(true)
                        .num_args(1..)
                        .help("Query text; +term, -term, field:term and \"phrases\" (put -- before a leading -term)"),
                )
                .arg(
                    Arg::new("tag")
                        .long("tag")
                        .value_name("TAG")
                        .conflicts_with("category")
                        .help("Only posts with this tag"),
                )
                .arg(
                    Arg::new("category")
                        .long("category")
                        .value_name("CATEGORY")
                        .help("Only posts in this category"),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .short('n')
                        .value_name("N")
                        .value_parser(value_parser!(usize))
                        .help("Maximum number of hits"),
                ),
        )
        .subcommand(Command::new("publish-due").about("Publish every scheduled post that is due now"))
        .subcommand(
            Command::new("run-publisher").about("Run the scheduled publisher until interrupted"),
        )
        .subcommand(Command::new("stats").about("Show search index statistics"))
}
