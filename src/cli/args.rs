use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Session user name
    #[arg(long, short, env = "BLABBER_USER")]
    pub user: String,

    /// Pause between aggregation cycles in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Do not start the background aggregator
    #[arg(long)]
    pub no_aggregator: bool,
}
