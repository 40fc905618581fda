use std::time::{Duration, Instant};

use markdown_scrivener_engine::{Editor, EngineOptions, HistoryEntryType, Key, KeyInput};
use pretty_assertions::assert_eq;

fn type_script(editor: &mut Editor, now: &mut Instant, script: &str) {
    for c in script.chars() {
        *now += Duration::from_millis(150);
        let key = match c {
            '\n' => KeyInput::new(Key::Enter),
            c => KeyInput::char(c),
        };
        editor.handle_key(key, *now);
        editor.tick(*now);
    }
}

#[test]
fn undo_everything_then_redo_everything() {
    let mut editor = Editor::new(EngineOptions::default());
    let mut now = Instant::now();
    type_script(
        &mut editor,
        &mut now,
        "# Notes\nsome **bold** text\n- first\nsecond",
    );
    editor.flush_history();
    let typed = editor.get_markdown();
    assert_eq!(typed, "# Notes\n\nsome **bold** text\n\n- first\n- second\n");

    let mut undone = 0;
    while editor.undo() {
        undone += 1;
    }
    assert_eq!(undone, editor.history().len());
    assert_eq!(editor.get_markdown(), "");
    assert!(!editor.can_undo());

    while editor.redo() {}
    assert_eq!(editor.get_markdown(), typed);
    assert!(!editor.can_redo());
}

#[test]
fn undo_restores_the_caret() {
    let mut editor = Editor::new(EngineOptions::default());
    editor.set_content("first\n\nsecond");
    let mut now = Instant::now();

    editor.handle_key(KeyInput::new(Key::ArrowDown), now);
    let before = editor.caret();
    type_script(&mut editor, &mut now, "xy");
    assert_eq!(editor.get_markdown(), "first\n\nxysecond\n");

    assert!(editor.undo());
    assert_eq!(editor.get_markdown(), "first\n\nsecond\n");
    assert_eq!(editor.caret(), before);
}

#[test]
fn edits_after_undo_drop_the_redo_tail() {
    let mut editor = Editor::new(EngineOptions::default());
    let mut now = Instant::now();
    type_script(&mut editor, &mut now, "a\nb");
    editor.flush_history();

    assert!(editor.undo());
    assert!(editor.can_redo());

    type_script(&mut editor, &mut now, "c");
    editor.flush_history();
    assert!(!editor.can_redo());
    assert_eq!(editor.get_markdown(), "a\n\nc\n");
}

#[test]
fn oldest_entries_are_evicted() {
    let options = EngineOptions {
        history_max_size: 2,
        ..EngineOptions::default()
    };
    let mut editor = Editor::new(options);
    let mut now = Instant::now();
    type_script(&mut editor, &mut now, "a\nb\nc");
    editor.flush_history();

    assert_eq!(editor.history().len(), 2);
    assert_eq!(editor.history_metrics().stack_size, 2);
    assert!(editor.undo());
    assert!(editor.undo());
    assert!(!editor.undo());
    assert_eq!(editor.get_markdown(), "a\n\nb\n");
}

#[test]
fn entry_kinds_follow_the_edit() {
    let mut editor = Editor::new(EngineOptions::default());
    let mut now = Instant::now();
    type_script(&mut editor, &mut now, "ab\ncd");
    now += Duration::from_millis(150);
    editor.handle_key(KeyInput::new(Key::Backspace), now);
    editor.flush_history();

    let kinds: Vec<HistoryEntryType> = editor.history().iter().map(|e| e.entry_type).collect();
    assert_eq!(
        kinds,
        vec![
            HistoryEntryType::Typing,
            HistoryEntryType::Split,
            HistoryEntryType::Typing,
            HistoryEntryType::Delete,
        ]
    );
}

#[test]
fn quiet_period_groups_keystrokes() {
    let mut editor = Editor::new(EngineOptions::default());
    let start = Instant::now();
    for (i, c) in "abc".chars().enumerate() {
        editor.handle_key(KeyInput::char(c), start + Duration::from_millis(100 * i as u64));
    }
    editor.tick(start + Duration::from_millis(400));
    assert_eq!(editor.history().len(), 0);

    editor.tick(start + Duration::from_millis(800));
    assert_eq!(editor.history().len(), 1);
    assert!(editor.undo());
    assert_eq!(editor.get_markdown(), "");
}
