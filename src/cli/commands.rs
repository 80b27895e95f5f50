//! Main CLI commands enum

use clap::Subcommand;

use crate::cli::args::SessionArgs;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Post a message; #tags and @mentions are extracted from the text
    Post {
        /// Posting user
        #[arg(long, short, env = "BLABBER_USER")]
        user: String,

        /// Message text
        text: String,
    },

    /// List tag popularity from the last aggregation cycle
    Tags,

    /// Show posts carrying a tag
    WithTag {
        /// Tag without the leading '#'
        tag: String,
    },

    /// Show posts mentioning a user
    Mentions {
        /// User name without the leading '@'
        user: String,
    },

    /// Run one aggregation cycle now
    Aggregate,

    /// Interactive session with background tag aggregation
    Session(SessionArgs),
}
