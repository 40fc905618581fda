use std::time::{Duration, Instant};

use markdown_scrivener_engine::{BlockKind, Editor, EngineOptions, Key, KeyInput};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Types `script` one key at a time, slower than the typing gate so every
/// keystroke is reformatted. `\n` is Enter.
struct Session {
    editor: Editor,
    now: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            editor: Editor::new(EngineOptions::default()),
            now: Instant::now(),
        }
    }

    fn press(&mut self, key: KeyInput) -> bool {
        self.now += Duration::from_millis(200);
        let handled = self.editor.handle_key(key, self.now);
        self.editor.tick(self.now);
        handled
    }

    fn type_script(&mut self, script: &str) {
        for c in script.chars() {
            let key = match c {
                '\n' => KeyInput::new(Key::Enter),
                c => KeyInput::char(c),
            };
            self.press(key);
        }
    }

    fn kinds(&self) -> Vec<BlockKind> {
        let surface = self.editor.surface();
        surface
            .blocks()
            .into_iter()
            .filter_map(|b| surface.block_kind(b))
            .collect()
    }
}

#[rstest]
#[case::bold("a **b** c", "a **b** c\n")]
#[case::emphasis("an _em_ word", "an _em_ word\n")]
#[case::strike("~~old~~ new", "~~old~~ new\n")]
#[case::code("run `ls` now", "run `ls` now\n")]
#[case::heading("## Title", "## Title\n")]
#[case::bullets("- one\ntwo", "- one\n- two\n")]
#[case::ordinals("1. a\nb", "1. a\n2. b\n")]
#[case::heading_then_body("# Title\nbody", "# Title\n\nbody\n")]
#[case::rule("---after", "----\n\nafter\n")]
#[case::empty_code("a `` b", "a `` b\n")]
fn typed_markdown_serializes_back(#[case] script: &str, #[case] expected: &str) {
    let mut session = Session::new();
    session.type_script(script);
    assert_eq!(session.editor.get_markdown(), expected);
}

#[test]
fn typing_continues_outside_a_closed_span() {
    let mut session = Session::new();
    session.type_script("**b**");
    let surface = session.editor.surface();
    let block = surface.blocks()[0];
    let spans = surface
        .descendants(block)
        .into_iter()
        .filter(|&n| surface.is_inline(n))
        .count();
    assert_eq!(spans, 1);

    session.type_script(" tail");
    assert_eq!(session.editor.get_markdown(), "**b** tail\n");
}

#[test]
fn block_kinds_follow_prefixes() {
    let mut session = Session::new();
    session.type_script("# H\n- item\nnext");
    assert_eq!(
        session.kinds(),
        vec![
            BlockKind::Heading { level: 1 },
            BlockKind::UnorderedItem,
            BlockKind::UnorderedItem,
        ]
    );
    assert_eq!(session.editor.get_markdown(), "# H\n\n- item\n- next\n");
}

#[test]
fn backspace_at_block_start_joins_blocks() {
    let mut session = Session::new();
    session.type_script("one\ntwo");
    for _ in 0..3 {
        session.press(KeyInput::new(Key::ArrowLeft));
    }
    assert_eq!(session.editor.caret().map(|(_, v)| v), Some(0));

    session.press(KeyInput::new(Key::Backspace));
    assert_eq!(session.editor.get_markdown(), "onetwo\n");
    assert_eq!(session.editor.caret().map(|(_, v)| v), Some(3));
}

#[test]
fn delete_at_block_end_pulls_next_block_up() {
    let mut session = Session::new();
    session.type_script("one\ntwo");
    session.press(KeyInput::new(Key::ArrowUp));
    assert_eq!(session.editor.caret().map(|(_, v)| v), Some(3));

    session.press(KeyInput::new(Key::Delete));
    assert_eq!(session.editor.get_markdown(), "onetwo\n");
}

#[test]
fn arrows_cross_block_boundaries() {
    let mut session = Session::new();
    session.type_script("ab\ncd");
    let second = session.editor.caret().map(|(id, _)| id);

    session.press(KeyInput::new(Key::ArrowLeft));
    session.press(KeyInput::new(Key::ArrowLeft));
    session.press(KeyInput::new(Key::ArrowLeft));
    let (block, visible) = session.editor.caret().expect("caret");
    assert_ne!(Some(block), second);
    assert_eq!(visible, 2);

    session.press(KeyInput::new(Key::ArrowRight));
    assert_eq!(session.editor.caret(), second.map(|id| (id, 0)));
}

#[test]
fn fast_plain_typing_skips_reformatting() {
    let mut editor = Editor::new(EngineOptions::default());
    let now = Instant::now();
    editor.set_content("start");
    for c in "abc".chars() {
        editor.handle_key(KeyInput::char(c), now);
    }
    assert!(!editor.coordinator().has_pending());
    assert_eq!(editor.get_markdown(), "abcstart\n");
}

#[test]
fn deferred_reformat_waits_for_tick() {
    let options = EngineOptions {
        reformat_delay: Duration::from_millis(50),
        ..EngineOptions::default()
    };
    let mut editor = Editor::new(options);
    let start = Instant::now();
    for (i, c) in "*x*".chars().enumerate() {
        editor.handle_key(KeyInput::char(c), start + Duration::from_millis(200 * i as u64));
    }
    let typed_at = start + Duration::from_millis(400);
    assert!(editor.coordinator().has_pending());
    assert_eq!(editor.next_deadline(), Some(typed_at + Duration::from_millis(50)));

    editor.tick(typed_at + Duration::from_millis(10));
    assert!(editor.coordinator().has_pending());

    editor.tick(typed_at + Duration::from_millis(60));
    assert!(!editor.coordinator().has_pending());
    let surface = editor.surface();
    let block = surface.blocks()[0];
    assert!(
        surface
            .descendants(block)
            .into_iter()
            .any(|n| surface.is_inline(n))
    );
}
