pub mod cli;
pub mod commands;
pub mod config;
pub mod edit;
pub mod event;
pub mod filter;
pub mod prefs;
pub mod render;
pub mod session;
pub mod storage;
pub mod task;
pub mod task_store;
pub mod tips;

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting checklist"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.checklistrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let storage =
    storage::FileStorage::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open storage at {}",
        data_dir.display()
      )
    })?;

  let mut session =
    session::Session::open(storage);
  let mut renderer =
    render::Renderer::new(
      &cfg,
      session.preferences().theme
    )?;

  let command = cli.command.unwrap_or(
    cli::Command::List { filter: None }
  );
  let stdout = io::stdout();
  let mut out = stdout.lock();

  commands::dispatch(
    &mut session,
    &cfg,
    &mut renderer,
    &mut out,
    command
  )?;

  info!("done");
  Ok(())
}
