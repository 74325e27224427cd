//! ArgMatches → CliAction conversion.

use clap::ArgMatches;
use quire::Filter;
use std::path::PathBuf;

/// What the invocation asked for.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    Reindex,
    Search {
        query: String,
        filter: Option<Filter>,
        limit: Option<usize>,
    },
    PublishDue,
    RunPublisher,
    Stats,
}

/// Global flags shared by every subcommand.
#[derive(Debug, Default, PartialEq)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub verbose: bool,
}

/// Read the global flags.
pub fn global_args(matches: &ArgMatches) -> GlobalArgs {
    GlobalArgs {
        config: matches.get_one::<String>("config").map(PathBuf::from),
        data_dir: matches.get_one::<String>("data-dir").map(PathBuf::from),
        verbose: matches.get_flag("verbose"),
    }
}

/// Convert clap ArgMatches into a CliAction.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let (sub_name, sub_matches) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;

    match sub_name {
        "reindex" => Ok(CliAction::Reindex),
        "search" => parse_search(sub_matches),
        "publish-due" => Ok(CliAction::PublishDue),
        "run-publisher" => Ok(CliAction::RunPublisher),
        "stats" => Ok(CliAction::Stats),
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn parse_search(matches: &ArgMatches) -> Result<CliAction, String> {
    let query = matches
        .get_many::<String>("query")
        .ok_or("search needs a query")?
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    let filter = match (
        matches.get_one::<String>("tag"),
        matches.get_one::<String>("category"),
    ) {
        (Some(tag), _) => Some(Filter::Tag(tag.clone())),
        (None, Some(category)) => Some(Filter::Category(category.clone())),
        (None, None) => None,
    };

    let limit = matches.get_one::<usize>("limit").copied();
    if limit == Some(0) {
        return Err("--limit must be at least 1".into());
    }

    Ok(CliAction::Search {
        query,
        filter,
        limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build_cli;

    fn parse(args: &[&str]) -> Result<CliAction, String> {
        let matches = build_cli()
            .try_get_matches_from(args)
            .map_err(|e| e.to_string())?;
        matches_to_action(&matches)
    }

    #[test]
    fn test_search_joins_words() {
        let action = parse(&["quire", "search", "--", "+rust", "\"async io\"", "-draft"]).unwrap();
        assert_eq!(
            action,
            CliAction::Search {
                query: "+rust \"async io\" -draft".into(),
                filter: None,
                limit: None,
            }
        );
    }

    #[test]
    fn test_search_filters_and_limit() {
        let action = parse(&["quire", "search", "x", "--tag", "Rust", "-n", "5"]).unwrap();
        assert_eq!(
            action,
            CliAction::Search {
                query: "x".into(),
                filter: Some(Filter::Tag("Rust".into())),
                limit: Some(5),
            }
        );

        let action = parse(&["quire", "search", "x", "--category", "news"]).unwrap();
        assert!(matches!(
            action,
            CliAction::Search { filter: Some(Filter::Category(ref c)), .. } if c == "news"
        ));

        assert!(parse(&["quire", "search", "x", "--tag", "a", "--category", "b"]).is_err());
        assert!(parse(&["quire", "search", "x", "--limit", "0"]).is_err());
    }

    #[test]
    fn test_options_with_escaped_exclusion() {
        let action = parse(&[
            "quire", "search", "--tag", "rust", "-n", "3", "--", "-draft", "async",
        ])
        .unwrap();
        assert_eq!(
            action,
            CliAction::Search {
                query: "-draft async".into(),
                filter: Some(Filter::Tag("rust".into())),
                limit: Some(3),
            }
        );

        let action = parse(&["quire", "search", "rust", "async", "--limit", "2"]).unwrap();
        assert!(matches!(
            action,
            CliAction::Search { ref query, limit: Some(2), filter: None } if query == "rust async"
        ));
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["quire", "reindex", "--data-dir", "/srv/blog", "-v"])
            .unwrap();
        let globals = global_args(&matches);
        assert_eq!(globals.data_dir, Some(PathBuf::from("/srv/blog")));
        assert!(globals.verbose);
        assert_eq!(globals.config, None);
        assert_eq!(matches_to_action(&matches).unwrap(), CliAction::Reindex);
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse(&["quire", "publish-due"]).unwrap(), CliAction::PublishDue);
        assert_eq!(parse(&["quire", "run-publisher"]).unwrap(), CliAction::RunPublisher);
        assert_eq!(parse(&["quire", "stats"]).unwrap(), CliAction::Stats);
        assert!(parse(&["quire"]).is_err());
    }
}
