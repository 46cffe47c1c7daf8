//! Query configuration flags.

use clap::Args;
use crudql_core::config::{DEFAULT_CHILD_DELIMITER, DEFAULT_MAX_CONDITION_DEPTH};
use crudql_core::QueryConfig;

/// Flags shared by every subcommand that validates or compiles a query.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Reject CONTAINS on every field.
    #[arg(long, global = true)]
    pub disable_contains: bool,

    /// Reject STARTSWITH on every field.
    #[arg(long, global = true)]
    pub disable_starts_with: bool,

    /// Reject ENDSWITH on every field.
    #[arg(long, global = true)]
    pub disable_ends_with: bool,

    /// Separator between a property and its child properties.
    #[arg(long, global = true, default_value = DEFAULT_CHILD_DELIMITER)]
    pub delimiter: String,

    /// Deepest allowed condition nesting (0 disables the limit).
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CONDITION_DEPTH)]
    pub max_depth: usize,
}

impl From<&ConfigArgs> for QueryConfig {
    fn from(args: &ConfigArgs) -> Self {
        let max_depth = (args.max_depth > 0).then_some(args.max_depth);

        QueryConfig::new()
            .with_contains_disabled(args.disable_contains)
            .with_starts_with_disabled(args.disable_starts_with)
            .with_ends_with_disabled(args.disable_ends_with)
            .with_child_delimiter(args.delimiter.clone())
            .with_max_condition_depth(max_depth)
    }
}
