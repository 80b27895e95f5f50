//! `blabber session` command - interactive loop with background aggregation
//!
//! One command per line on stdin:
//! - `b <text>` post a message (prompts for the text when omitted)
//! - `t` tag popularity
//! - `s <tag>` posts carrying a tag (prompts when omitted)
//! - `m` posts mentioning the session user
//! - `x` exit
//!
//! Anything else prints `?`. End of input and Ctrl-C also end the session.
//! The aggregator runs on its own database handle and is cancelled and
//! joined before the command returns.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use blabber_core::aggregate::{Aggregator, AggregatorHandle};
use blabber_core::error::{BlabberError, Result};
use blabber_core::query::QueryFacade;
use blabber_core::store::{PostStore, TagCountStore};

use super::dispatch::CommandContext;
use super::output::{self, strip_marker};
use crate::cli::{OutputFormat, SessionArgs};

const INPUT_POLL: Duration = Duration::from_millis(100);

const MENU: &str = "b <text>: blab   t: tags   s <tag>: search tag   m: my mentions   x: exit";

/// Whether the loop keeps reading after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Command waiting for its argument on the next line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    PostText,
    Tag,
}

/// Line-oriented command interpreter for one user
pub struct Session {
    user: String,
    posts: Arc<dyn PostStore>,
    query: QueryFacade,
    format: OutputFormat,
    pending: Option<Pending>,
}

impl Session {
    pub fn new(
        user: impl Into<String>,
        posts: Arc<dyn PostStore>,
        counts: Arc<dyn TagCountStore>,
        format: OutputFormat,
    ) -> Self {
        Session {
            user: user.into(),
            query: QueryFacade::new(Arc::clone(&posts), counts),
            posts,
            format,
            pending: None,
        }
    }

    /// Interpret one input line.
    ///
    /// Store failures are reported on `out` and the session carries on;
    /// only failures to write `out` itself are returned.
    pub fn handle_line(&mut self, line: &str, out: &mut dyn Write) -> Result<Flow> {
        let line = line.trim();

        let result = match self.pending.take() {
            Some(Pending::PostText) => self.blab(line, out),
            Some(Pending::Tag) => self.search(line, out),
            None => {
                let (command, rest) = match line.split_once(char::is_whitespace) {
                    Some((command, rest)) => (command, rest.trim()),
                    None => (line, ""),
                };

                match command {
                    "" => Ok(()),
                    "x" => return Ok(Flow::Exit),
                    "b" if rest.is_empty() => self.prompt(Pending::PostText, "Text:", out),
                    "b" => self.blab(rest, out),
                    "t" => self.tags(out),
                    "s" if rest.is_empty() => self.prompt(Pending::Tag, "Tag:", out),
                    "s" => self.search(rest, out),
                    "m" => self.my_mentions(out),
                    _ => writeln!(out, "?").map_err(BlabberError::from),
                }
            }
        };

        match result {
            Ok(()) => Ok(Flow::Continue),
            Err(e @ BlabberError::Io(_)) => Err(e),
            Err(e) => {
                warn!(error = %e, "session command failed");
                writeln!(out, "error: {}", e)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn prompt(&mut self, pending: Pending, label: &str, out: &mut dyn Write) -> Result<()> {
        self.pending = Some(pending);
        writeln!(out, "{}", label)?;
        Ok(())
    }

    fn blab(&self, text: &str, out: &mut dyn Write) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let post = super::post::publish(self.posts.as_ref(), &self.user, text)?;
        debug!(tags = post.tags.len(), mentions = post.mentions.len(), "blab");
        output::write_created(out, self.format, &post)
    }

    fn tags(&self, out: &mut dyn Write) -> Result<()> {
        let counts = self.query.tag_counts()?;
        output::write_tag_counts(out, self.format, &counts)
    }

    fn search(&self, tag: &str, out: &mut dyn Write) -> Result<()> {
        let tag = strip_marker(tag, '#');
        if tag.is_empty() {
            return Ok(());
        }
        let posts = self.query.posts_with_tag(tag)?;
        output::write_posts(out, self.format, &posts)
    }

    fn my_mentions(&self, out: &mut dyn Write) -> Result<()> {
        let posts = self.query.posts_mentioning(&self.user)?;
        output::write_posts(out, self.format, &posts)
    }
}

/// Execute the session command
pub fn execute(ctx: &CommandContext, args: &SessionArgs) -> Result<()> {
    let interval = match args.interval_ms {
        Some(0) => blabber_core::bail_invalid!("interval_ms", 0),
        Some(ms) => Duration::from_millis(ms),
        None => ctx.config.interval(),
    };

    let db = ctx.open_database()?;
    let aggregator = if args.no_aggregator || !ctx.config.aggregator.enabled {
        debug!("background aggregator disabled");
        None
    } else {
        let worker_db = ctx.open_database()?;
        Some(
            Aggregator::new(worker_db.clone(), worker_db)
                .with_interval(interval)
                .spawn()?,
        )
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = Arc::clone(&interrupted);

    let _ = ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::SeqCst);
    });

    let mut session = Session::new(args.user.as_str(), db.clone(), db, ctx.cli.format);
    let result = read_loop(
        &mut session,
        spawn_reader(),
        &interrupted,
        ctx.cli.quiet || ctx.cli.format == OutputFormat::Json,
    );

    stop_aggregator(aggregator)?;
    result
}

fn read_loop(
    session: &mut Session,
    lines: Receiver<String>,
    interrupted: &AtomicBool,
    quiet: bool,
) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if !quiet {
        writeln!(out, "{}", MENU)?;
        out.flush()?;
    }

    loop {
        if interrupted.load(Ordering::SeqCst) {
            info!("session interrupted");
            return Ok(());
        }

        match lines.recv_timeout(INPUT_POLL) {
            Ok(line) => {
                let flow = session.handle_line(&line, &mut out)?;
                out.flush()?;
                if flow == Flow::Exit {
                    return Ok(());
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("end of input");
                return Ok(());
            }
        }
    }
}

/// Forward stdin lines to a channel so the loop can also watch for Ctrl-C
fn spawn_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn stop_aggregator(handle: Option<AggregatorHandle>) -> Result<()> {
    if let Some(handle) = handle {
        let stats = handle.shutdown()?;
        debug!(?stats, "session aggregator joined");
    }
    Ok(())
}
