use checklist_core::cli::Command;
use checklist_core::commands::dispatch;
use checklist_core::config::Config;
use checklist_core::filter::Filter;
use checklist_core::prefs::{PREFS_KEY, Theme};
use checklist_core::render::Renderer;
use checklist_core::session::Session;
use checklist_core::storage::{MemoryStorage, Storage};

fn run(session: &mut Session<MemoryStorage>, renderer: &mut Renderer, command: Command) -> String {
    let cfg = Config::defaults();
    let mut out = Vec::new();
    dispatch(session, &cfg, renderer, &mut out, command).expect("dispatch");
    String::from_utf8(out).expect("utf8 output")
}

fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[test]
fn editing_an_unknown_id_reports_it_and_changes_nothing() {
    let mut session = Session::open(MemoryStorage::new());
    let mut renderer = Renderer::plain(Theme::Light);
    run(&mut session, &mut renderer, Command::Add { title: words("Buy milk") });
    let before = session.tasks().tasks().to_vec();

    let output = run(
        &mut session,
        &mut renderer,
        Command::Edit {
            id: "42".to_string(),
            title: words("Something else"),
        },
    );

    assert!(output.contains("No task with id 42."));
    assert_eq!(session.tasks().tasks(), before.as_slice());
}

#[test]
fn list_filter_flag_does_not_change_the_saved_filter() {
    let mut session = Session::open(MemoryStorage::new());
    let mut renderer = Renderer::plain(Theme::Light);
    run(&mut session, &mut renderer, Command::Add { title: words("Buy milk") });
    run(&mut session, &mut renderer, Command::Add { title: words("Walk dog") });
    let milk = session
        .tasks()
        .tasks()
        .iter()
        .find(|t| t.title == "Buy milk")
        .expect("task")
        .id
        .clone();
    run(&mut session, &mut renderer, Command::Toggle { id: milk });

    let output = run(
        &mut session,
        &mut renderer,
        Command::List {
            filter: Some(Filter::Completed),
        },
    );

    assert!(output.contains("Buy milk"));
    assert!(!output.contains("Walk dog"));
    assert_eq!(session.preferences().filter, Filter::All);
    assert_eq!(session.filter(), Filter::All);
}

#[test]
fn prefs_prints_keys_it_does_not_know() {
    let storage = MemoryStorage::new();
    storage
        .set_item(PREFS_KEY, r#"{"theme":"dark","filter":"pending","fontSize":14}"#)
        .expect("seed prefs");
    let mut session = Session::open(storage);
    let mut renderer = Renderer::plain(Theme::Light);

    let output = run(&mut session, &mut renderer, Command::Prefs);

    assert!(output.contains("dark"));
    assert!(output.contains("pending"));
    let extra = output
        .lines()
        .find(|line| line.contains("fontSize"))
        .expect("extra key line");
    assert!(extra.contains("14"));
}

#[test]
fn theme_command_saves_and_switches_the_renderer() {
    let storage = MemoryStorage::new();
    let mut session = Session::open(storage.clone());
    let mut renderer = Renderer::plain(Theme::Light);

    let output = run(&mut session, &mut renderer, Command::Theme { theme: Theme::Dark });

    assert!(output.contains("theme set to dark"));
    assert_eq!(renderer.theme(), Theme::Dark);
    assert_eq!(Session::open(storage).preferences().theme, Theme::Dark);
}
