use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::edit::{EditMode, FormState, MessageKind, Notice};
use crate::filter::Filter;
use crate::prefs::{Preferences, Theme};
use crate::task::Task;
use crate::tips::TipsPanel;

pub const EMPTY_LIST_MESSAGE: &str = "No tasks to display.";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    theme: Theme,
}

impl Renderer {
    pub fn new(cfg: &Config, theme: Theme) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);

        Ok(Self {
            color: color && io::stdout().is_terminal(),
            theme,
        })
    }

    /// Renderer that never emits escape codes.
    pub fn plain(theme: Theme) -> Self {
        Self {
            color: false,
            theme,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    #[tracing::instrument(skip(self, out, tasks))]
    pub fn write_task_list<'a, W, I>(&self, out: &mut W, tasks: I, filter: Filter) -> anyhow::Result<()>
    where
        W: Write,
        I: IntoIterator<Item = &'a Task>,
    {
        let rows: Vec<Vec<String>> = tasks
            .into_iter()
            .map(|task| {
                let mark = if task.completed { "[x]" } else { "[ ]" };
                let title = if task.completed {
                    self.paint(&task.title, self.palette().muted)
                } else {
                    task.title.clone()
                };
                vec![self.paint(&task.id, self.palette().id), mark.to_string(), title]
            })
            .collect();

        writeln!(out, "Tasks ({filter})")?;
        if rows.is_empty() {
            writeln!(out, "{EMPTY_LIST_MESSAGE}")?;
            return Ok(());
        }

        let headers = vec!["ID".to_string(), "Done".to_string(), "Title".to_string()];
        write_table(out, headers, rows)
    }

    pub fn write_form<W: Write>(&self, out: &mut W, form: &FormState) -> anyhow::Result<()> {
        if let EditMode::Editing(id) = form.mode() {
            writeln!(out, "editing {id}: {}  (cancel to discard)", form.input)?;
        }
        if let Some(notice) = &form.message {
            self.write_notice(out, notice)?;
        }
        Ok(())
    }

    pub fn write_tips<W: Write>(&self, out: &mut W, panel: &TipsPanel) -> anyhow::Result<()> {
        if !panel.trigger_enabled() {
            writeln!(out, "{}", panel.trigger_label())?;
        }
        for (idx, title) in panel.items.iter().enumerate() {
            writeln!(out, "{:>2}. {title}", idx + 1)?;
        }
        if let Some(notice) = &panel.message {
            self.write_notice(out, notice)?;
        }
        Ok(())
    }

    pub fn write_preferences<W: Write>(&self, out: &mut W, prefs: &Preferences) -> anyhow::Result<()> {
        writeln!(out, "theme   {}", prefs.theme)?;
        writeln!(out, "filter  {}", prefs.filter)?;
        for (key, value) in &prefs.extra {
            writeln!(out, "{key}  {value}")?;
        }
        Ok(())
    }

    fn write_notice<W: Write>(&self, out: &mut W, notice: &Notice) -> anyhow::Result<()> {
        let code = match notice.kind {
            MessageKind::Success => self.palette().success,
            MessageKind::Error => self.palette().error,
        };
        writeln!(out, "{}", self.paint(&notice.text, code))?;
        Ok(())
    }

    fn palette(&self) -> Palette {
        match self.theme {
            Theme::Light => Palette {
                id: "33",
                muted: "2",
                success: "32",
                error: "31",
            },
            Theme::Dark => Palette {
                id: "93",
                muted: "90",
                success: "92",
                error: "91",
            },
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

struct Palette {
    id: &'static str,
    muted: &'static str,
    success: &'static str,
    error: &'static str,
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{EMPTY_LIST_MESSAGE, Renderer, strip_ansi};
    use crate::config::Config;
    use crate::filter::Filter;
    use crate::prefs::Theme;
    use crate::task::Task;

    fn rendered(tasks: &[Task], filter: Filter) -> String {
        let mut out = Vec::new();
        Renderer::plain(Theme::Light)
            .write_task_list(&mut out, tasks.iter().filter(|t| filter.matches(t)), filter)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn empty_view_prints_placeholder() {
        let text = rendered(&[], Filter::All);
        assert!(text.contains(EMPTY_LIST_MESSAGE));
    }

    #[test]
    fn rows_show_completion_marks() {
        let mut done = Task::new_pending("2".to_string(), "File taxes".to_string());
        done.completed = true;
        let tasks = vec![Task::new_pending("1".to_string(), "Buy milk".to_string()), done];

        let text = rendered(&tasks, Filter::All);
        let line_for = |needle: &str| {
            text.lines()
                .find(|line| line.contains(needle))
                .map(str::to_string)
                .unwrap_or_default()
        };
        assert!(line_for("Buy milk").contains("[ ]"));
        assert!(line_for("File taxes").contains("[x]"));

        let pending = rendered(&tasks, Filter::Pending);
        assert!(pending.contains("Buy milk"));
        assert!(!pending.contains("File taxes"));
    }

    #[test]
    fn strip_ansi_removes_escape_sequences() {
        assert_eq!(strip_ansi("\x1b[33mid\x1b[0m"), "id");
    }

    #[test]
    fn invalid_color_setting_is_an_error() {
        let mut cfg = Config::defaults();
        cfg.apply_overrides(vec![("color".to_string(), "sometimes".to_string())]);
        assert!(Renderer::new(&cfg, Theme::Dark).is_err());

        cfg.apply_overrides(vec![("color".to_string(), "off".to_string())]);
        let renderer = Renderer::new(&cfg, Theme::Dark).unwrap();
        assert_eq!(renderer.theme(), Theme::Dark);
    }
}
