use std::io::{self, BufRead, Write};

use anyhow::Context;
use tracing::{debug, info, instrument, warn};

use crate::cli::Command;
use crate::config::Config;
use crate::edit::SubmitOutcome;
use crate::event::{Event, SHELL_HELP};
use crate::render::Renderer;
use crate::session::Session;
use crate::storage::Storage;
use crate::tips::{HttpTipsSource, TipsSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Runs one subcommand against `session`, writing everything it shows to
/// `out`.
#[instrument(skip(session, cfg, renderer, out))]
pub fn dispatch<S, W>(
    session: &mut Session<S>,
    cfg: &Config,
    renderer: &mut Renderer,
    out: &mut W,
    command: Command,
) -> anyhow::Result<()>
where
    S: Storage,
    W: Write,
{
    match command {
        Command::List { filter } => {
            let filter = filter.unwrap_or_else(|| session.filter());
            renderer.write_task_list(out, session.tasks().filtered_view(filter), filter)?;
        }
        Command::Add { title } => {
            let title = Command::joined_title(&title);
            apply(session, renderer, out, Event::Submit(title), None::<&HttpTipsSource>)?;
        }
        Command::Edit { id, title } => {
            if !session.on_start_edit(&id) {
                warn!(id = %id, "no such task");
                writeln!(out, "No task with id {id}.")?;
                return Ok(());
            }
            let title = Command::joined_title(&title);
            apply(session, renderer, out, Event::Submit(title), None::<&HttpTipsSource>)?;
        }
        Command::Toggle { id } => {
            apply(session, renderer, out, Event::Toggle(id), None::<&HttpTipsSource>)?;
        }
        Command::Delete { id } => {
            apply(session, renderer, out, Event::Delete(id), None::<&HttpTipsSource>)?;
        }
        Command::Theme { theme } => {
            apply(session, renderer, out, Event::ThemeChange(theme), None::<&HttpTipsSource>)?;
        }
        Command::Filter { filter } => {
            apply(session, renderer, out, Event::FilterChange(filter), None::<&HttpTipsSource>)?;
        }
        Command::Prefs => {
            renderer.write_preferences(out, &session.preferences())?;
        }
        Command::Tips => {
            let source = ConfiguredTipsSource::new(cfg);
            apply(session, renderer, out, Event::LoadTips, Some(&source))?;
        }
        Command::Shell => {
            let source = ConfiguredTipsSource::new(cfg);
            let stdin = io::stdin();
            run_shell(session, renderer, stdin.lock(), out, &source)?;
        }
    }

    Ok(())
}

/// Reads events line by line until `quit` or end of input. Bad lines are
/// reported and skipped.
#[instrument(skip_all)]
pub fn run_shell<S, R, W, T>(
    session: &mut Session<S>,
    renderer: &mut Renderer,
    input: R,
    out: &mut W,
    source: &T,
) -> anyhow::Result<()>
where
    S: Storage,
    R: BufRead,
    W: Write,
    T: TipsSource,
{
    renderer.write_task_list(out, session.visible_tasks(), session.filter())?;

    for line in input.lines() {
        let line = line.context("failed reading shell input")?;
        let event = match line.parse::<Event>() {
            Ok(event) => event,
            Err(err) => {
                writeln!(out, "{err}")?;
                continue;
            }
        };

        if apply(session, renderer, out, event, Some(source))? == Flow::Quit {
            break;
        }
    }

    info!("shell closed");
    Ok(())
}

/// Hands one event to its session handler and re-renders what it touched.
#[instrument(skip(session, renderer, out, source))]
pub fn apply<S, W, T>(
    session: &mut Session<S>,
    renderer: &mut Renderer,
    out: &mut W,
    event: Event,
    source: Option<&T>,
) -> anyhow::Result<Flow>
where
    S: Storage,
    W: Write,
    T: TipsSource,
{
    match event {
        Event::Submit(title) => {
            let outcome = session.on_submit(&title)?;
            renderer.write_form(out, &session.form)?;
            if outcome != SubmitOutcome::Rejected {
                render_tasks(session, renderer, out)?;
            }
        }
        Event::StartEdit(id) => {
            if session.on_start_edit(&id) {
                renderer.write_form(out, &session.form)?;
            } else {
                writeln!(out, "No task with id {id}.")?;
            }
        }
        Event::CancelEdit => {
            session.on_cancel_edit();
            renderer.write_form(out, &session.form)?;
        }
        Event::Toggle(id) => {
            session.on_toggle(&id)?;
            render_tasks(session, renderer, out)?;
        }
        Event::Delete(id) => {
            session.on_delete(&id)?;
            render_tasks(session, renderer, out)?;
        }
        Event::ThemeChange(theme) => {
            let prefs = session.on_theme_change(theme)?;
            renderer.set_theme(prefs.theme);
            writeln!(out, "theme set to {}", prefs.theme)?;
        }
        Event::FilterChange(filter) => {
            session.on_filter_change(filter)?;
            render_tasks(session, renderer, out)?;
        }
        Event::LoadTips => {
            let Some(source) = source else {
                debug!("tips requested without a source");
                return Ok(Flow::Continue);
            };
            writeln!(out, "{}", crate::tips::LOADING_LABEL)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            runtime.block_on(session.on_load_tips(source));
            renderer.write_tips(out, &session.tips)?;
        }
        Event::List => render_tasks(session, renderer, out)?,
        Event::Help => writeln!(out, "{SHELL_HELP}")?,
        Event::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}

fn render_tasks<S, W>(session: &Session<S>, renderer: &Renderer, out: &mut W) -> anyhow::Result<()>
where
    S: Storage,
    W: Write,
{
    renderer.write_task_list(out, session.visible_tasks(), session.filter())
}

/// Reads the `tips.*` settings at fetch time, so a bad setting fails that
/// one load instead of the whole command.
#[derive(Debug, Clone, Copy)]
pub struct ConfiguredTipsSource<'a> {
    cfg: &'a Config,
}

impl<'a> ConfiguredTipsSource<'a> {
    pub fn new(cfg: &'a Config) -> Self {
        Self { cfg }
    }
}

impl TipsSource for ConfiguredTipsSource<'_> {
    async fn fetch_titles(&self) -> anyhow::Result<Vec<String>> {
        let source = HttpTipsSource::from_config(self.cfg).context("invalid tips settings")?;
        source.fetch_titles().await
    }
}
