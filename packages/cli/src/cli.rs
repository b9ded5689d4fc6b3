//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dirb - JSON documents in a directory
#[derive(Parser, Debug)]
#[command(name = "dirb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the documents
    #[arg(short, long, global = true, env = "DIRB_DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Use a collection's subdirectory (books, sellers, buyers or an alias)
    #[arg(short, long, global = true)]
    pub collection: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the directory, and any missing parents
    Init,

    /// Store a JSON object under a fresh name and print the name
    #[command(visible_aliases = ["new", "add"])]
    Create {
        /// The object, or `-` to read it from stdin
        json: String,
    },

    /// Print a document
    #[command(visible_alias = "read")]
    Get {
        name: String,

        /// Indent the output with tabs
        #[arg(short, long)]
        pretty: bool,
    },

    /// Merge a JSON object into a stored object
    #[command(visible_aliases = ["up", "patch", "pch"])]
    Update {
        name: String,
        /// The patch, or `-` to read it from stdin
        json: String,
    },

    /// Replace a document
    #[command(visible_aliases = ["ow", "replace"])]
    Overwrite {
        name: String,
        /// The new value, or `-` to read it from stdin
        json: String,
    },

    /// Delete a document
    #[command(visible_alias = "rm")]
    Remove { name: String },

    /// Print the names of all documents
    #[command(visible_alias = "ls")]
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn aliases_map_to_commands() {
        let cli = parse(&["dirb", "-d", "/tmp/x", "add", "{}"]);
        assert_eq!(cli.dir, PathBuf::from("/tmp/x"));
        assert_eq!(
            cli.command,
            Command::Create {
                json: "{}".to_string()
            }
        );

        let cli = parse(&["dirb", "read", "abc", "-p"]);
        assert_eq!(
            cli.command,
            Command::Get {
                name: "abc".to_string(),
                pretty: true
            }
        );

        for alias in ["update", "up", "patch", "pch"] {
            assert_eq!(
                parse(&["dirb", alias, "k", "{}"]).command,
                Command::Update {
                    name: "k".to_string(),
                    json: "{}".to_string()
                }
            );
        }

        assert_eq!(parse(&["dirb", "ls"]).command, Command::List);
        assert_eq!(
            parse(&["dirb", "rm", "k"]).command,
            Command::Remove {
                name: "k".to_string()
            }
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["dirb", "ls", "--collection", "bk", "--dir", "data"]);
        assert_eq!(cli.collection.as_deref(), Some("bk"));
        assert_eq!(cli.dir, PathBuf::from("data"));
    }

    #[test]
    fn usage_errors_exit_with_two() {
        for args in [
            &["dirb"][..],
            &["dirb", "get"][..],
            &["dirb", "update", "k"][..],
            &["dirb", "frobnicate"][..],
        ] {
            let err = Cli::try_parse_from(args).unwrap_err();
            assert_eq!(err.exit_code(), 2, "{:?}", args);
        }
    }
}
