use std::str::FromStr;

use anyhow::{anyhow, bail};

use crate::filter::Filter;
use crate::prefs::Theme;

/// One UI event, as typed into the interactive shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Form submission; adds or saves the task under edit.
    Submit(String),
    StartEdit(String),
    CancelEdit,
    Toggle(String),
    Delete(String),
    ThemeChange(Theme),
    FilterChange(Filter),
    LoadTips,
    List,
    Help,
    Quit,
}

pub const SHELL_HELP: &str = "\
add <title>       add a task, or save the task being edited
edit <id>         load a task into the form for editing
cancel            leave edit mode
toggle <id>       flip a task between pending and completed
delete <id>       remove a task
theme <t>         light | dark
filter <f>        all | completed | pending
tips              fetch tips
list              show tasks
quit              leave the shell";

impl FromStr for Event {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let needs_arg = |what: &str| -> anyhow::Result<String> {
            if rest.is_empty() {
                Err(anyhow!("{word} needs {what}"))
            } else {
                Ok(rest.to_string())
            }
        };

        let event = match word.to_ascii_lowercase().as_str() {
            // Blank titles are the form's call, not the parser's.
            "add" | "submit" | "save" => Self::Submit(rest.to_string()),
            "edit" => Self::StartEdit(needs_arg("a task id")?),
            "cancel" => Self::CancelEdit,
            "toggle" | "done" => Self::Toggle(needs_arg("a task id")?),
            "delete" | "rm" => Self::Delete(needs_arg("a task id")?),
            "theme" => Self::ThemeChange(needs_arg("a theme")?.parse()?),
            "filter" => Self::FilterChange(needs_arg("a filter")?.parse()?),
            "tips" => Self::LoadTips,
            "list" | "ls" | "" => Self::List,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => bail!("unknown command '{other}', try help"),
        };
        Ok(event)
    }
}
