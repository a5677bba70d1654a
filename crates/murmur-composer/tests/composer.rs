//! End-to-end composer scenarios over an in-memory surface.
//!
//! Each keystroke is delivered the way a browser host would: key-down, the
//! default effect unless prevented, input, content-changed, key-up, then the
//! selection settle delay.

use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;

use murmur_composer::{
    ComposerConfig, ComposerEvent, CompositionSession, DirectoryEntry, DirectoryQuery,
    LookupError, PopupKind, PopupState, Trigger, UserDirectory,
};
use murmur_editor_core::{
    Document, EditableSurface, Key, KeyEvent, KeyOutcome, PlainSurface, SurfaceEvent,
};
use murmur_emoji::{EmojiCatalog, EmojiData, EmojiEntry, EmojiError, SpriteCoordinates};

type Session = CompositionSession<PlainSurface>;

static TRACING: Once = Once::new();

fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

fn directory() -> UserDirectory {
    UserDirectory::new([
        DirectoryEntry::new(1, "John Doe"),
        DirectoryEntry::new(2, "Ann Lee"),
    ])
}

fn session_with(
    directory: impl DirectoryQuery + 'static,
    emoji: impl EmojiData + 'static,
    config: ComposerConfig,
) -> Session {
    init_test_tracing();
    let mut surface = PlainSurface::new();
    surface.focus();
    let mut session = CompositionSession::new(surface, Rc::new(directory), Rc::new(emoji), config);
    session.handle(SurfaceEvent::Focus);
    session
}

fn session() -> Session {
    session_with(directory(), EmojiCatalog::default(), ComposerConfig::default())
}

fn press(session: &mut Session, key: KeyEvent) -> KeyOutcome {
    let outcome = session.handle(SurfaceEvent::KeyDown(key.clone()));
    if !outcome.prevent_default {
        session.surface_mut().apply_default_key(&key).unwrap();
        let data = match &key.key {
            Key::Character(c) => Some(c.to_string()),
            _ => None,
        };
        session.handle(SurfaceEvent::Input { data });
        session.handle(SurfaceEvent::ContentChanged);
    }
    session.handle(SurfaceEvent::KeyUp(key));
    session.advance(Duration::from_millis(10));
    outcome
}

fn press_key(session: &mut Session, key: Key) -> KeyOutcome {
    press(session, KeyEvent::new(key))
}

fn type_text(session: &mut Session, text: &str) {
    for c in text.chars() {
        press(session, KeyEvent::character(c.to_string()));
    }
}

/// Raw markup with sprite styles removed, so snapshots stay readable.
fn markup(session: &Session) -> String {
    let mut doc = Document::from_html(&session.surface().raw_html());
    for node in doc.descendants(doc.root()) {
        if let Some(el) = doc.element_mut(node) {
            el.remove_attr("style");
        }
    }
    doc.to_html()
}

fn event_names(session: &mut Session) -> Vec<&'static str> {
    session.drain_events().iter().map(ComposerEvent::name).collect()
}

/// Emoji source that answers every query with the same list.
struct FixedEmoji(Vec<EmojiEntry>);

impl FixedEmoji {
    fn smile_smirk() -> Self {
        let entry = |native: &str, name: &str, unified: &str| EmojiEntry {
            native: native.to_string(),
            short_name: name.to_string(),
            short_names: vec![name.to_string()],
            name: name.to_string(),
            unified: unified.to_string(),
        };
        Self(vec![
            entry("😄", "smile", "1F604"),
            entry("😏", "smirk", "1F60F"),
        ])
    }
}

impl EmojiData for FixedEmoji {
    fn sprite_coordinates(&self, _unified: &str, _skin: u8, set: &str) -> Option<SpriteCoordinates> {
        Some(SpriteCoordinates {
            sheet: set.to_string(),
            x: 1,
            y: 2,
        })
    }

    fn search_by_short_name(&self, _prefix: &str) -> Result<Vec<EmojiEntry>, EmojiError> {
        Ok(self.0.clone())
    }
}

struct OfflineDirectory;

impl DirectoryQuery for OfflineDirectory {
    fn search(&self, _query: &str) -> Result<Vec<DirectoryEntry>, LookupError> {
        Err(LookupError::Unavailable("directory offline".into()))
    }
}

#[test]
fn test_mention_insertion() {
    let mut s = session();
    type_text(&mut s, "hello @jo");

    assert_eq!(s.trigger(), &Trigger::Mention("jo".into()));
    assert_eq!(s.popup_state(), PopupState::Open(PopupKind::Mention));
    let view = s.mention_candidates();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].item.user_id, 1);
    assert!(view.items[0].selected);

    let outcome = press_key(&mut s, Key::Enter);
    assert_eq!(outcome, KeyOutcome::consumed());
    insta::assert_snapshot!(
        markup(&s),
        @r#"<p>hello <span contenteditable="false" data-user-id="1" class="tag">@John Doe</span> </p>"#
    );
    assert_eq!(s.popup_state(), PopupState::Closed);

    let events = s.drain_events();
    assert!(!events.contains(&ComposerEvent::Submit));
    assert!(events.contains(&ComposerEvent::PopupOpened(PopupKind::Mention)));
    assert!(events.contains(&ComposerEvent::PopupClosed(PopupKind::Mention)));
}

#[test]
fn test_click_and_enter_commit_identically() {
    let mut by_key = session();
    type_text(&mut by_key, "hi @an");
    press_key(&mut by_key, Key::Enter);

    let mut by_click = session();
    type_text(&mut by_click, "hi @an");
    by_click.surface_mut().blur();
    assert!(by_click.pick_mention(0).unwrap());

    assert_eq!(by_key.surface().raw_html(), by_click.surface().raw_html());
    assert!(by_click.pick_mention(5).is_err());
}

#[test]
fn test_mention_without_user_id() {
    let config = ComposerConfig {
        mention_user_ids: false,
        ..ComposerConfig::default()
    };
    let mut s = session_with(directory(), EmojiCatalog::default(), config);
    type_text(&mut s, "@jo");
    press_key(&mut s, Key::Tab);
    insta::assert_snapshot!(
        markup(&s),
        @r#"<p><span contenteditable="false" class="tag">@John Doe</span> </p>"#
    );
}

#[test]
fn test_navigation_wraps() {
    let dir = UserDirectory::new([
        DirectoryEntry::new(1, "Ann Lee"),
        DirectoryEntry::new(2, "Dana Scully"),
        DirectoryEntry::new(3, "Mara Jade"),
    ]);
    let mut s = session_with(dir, EmojiCatalog::default(), ComposerConfig::default());
    type_text(&mut s, "@a");
    assert_eq!(s.mention_candidates().items.len(), 3);

    let caret = s.surface().caret();
    assert_eq!(press_key(&mut s, Key::ArrowUp), KeyOutcome::consumed());
    assert_eq!(s.mention_candidates().selected_index, 2);
    assert_eq!(s.surface().caret(), caret);

    for _ in 0..3 {
        press_key(&mut s, Key::ArrowDown);
    }
    assert_eq!(s.mention_candidates().selected_index, 2);
    press_key(&mut s, Key::ArrowDown);
    assert_eq!(s.mention_candidates().selected_index, 0);
}

#[test]
fn test_escape_closes_without_commit() {
    let mut s = session();
    type_text(&mut s, "@jo");
    assert_eq!(press_key(&mut s, Key::Escape), KeyOutcome::consumed());
    assert_eq!(s.popup_state(), PopupState::Closed);
    assert_eq!(markup(&s), "<p>@jo</p>");

    type_text(&mut s, "x");
    assert_eq!(s.popup_state(), PopupState::Open(PopupKind::Mention));
    assert!(s.mention_candidates().items.is_empty());
}

#[test]
fn test_failed_lookup_shows_empty_list() {
    let mut s = session_with(OfflineDirectory, EmojiCatalog::default(), ComposerConfig::default());
    type_text(&mut s, "@jo");
    assert_eq!(s.popup_state(), PopupState::Open(PopupKind::Mention));
    assert!(s.mention_candidates().items.is_empty());

    press_key(&mut s, Key::Enter);
    assert_eq!(markup(&s), "<p>@jo</p>");
}

#[test]
fn test_emoji_shortcode() {
    let mut s = session_with(directory(), FixedEmoji::smile_smirk(), ComposerConfig::default());
    type_text(&mut s, "ok :sma");
    assert_eq!(s.trigger(), &Trigger::EmojiShortcode("sma".into()));
    assert_eq!(s.popup_state(), PopupState::Open(PopupKind::Emoji));
    assert_eq!(s.emoji_candidates().selected_index, 0);

    press_key(&mut s, Key::ArrowDown);
    assert_eq!(s.emoji_candidates().selected_index, 1);

    press_key(&mut s, Key::Enter);
    insta::assert_snapshot!(
        markup(&s),
        @r#"<p>ok <img class="emoji-img" data-emoji="😏"></p>"#
    );
    assert_eq!(s.content(), "<p>ok 😏</p>");
    assert_eq!(s.popup_state(), PopupState::Closed);
}

#[test]
fn test_emoji_style_from_sprite() {
    let mut s = session_with(directory(), FixedEmoji::smile_smirk(), ComposerConfig::default());
    type_text(&mut s, ":smi");
    press_key(&mut s, Key::Enter);
    let html = s.surface().raw_html();
    assert!(html.contains("background-size: 5700% 5700%;"));
    let step = 100.0 / 56.0;
    assert!(html.contains(&format!("background-position: {}% {}%;", step, step * 2.0)));
}

#[test]
fn test_short_shortcode_has_no_popup() {
    let mut s = session_with(directory(), FixedEmoji::smile_smirk(), ComposerConfig::default());
    type_text(&mut s, ":s");
    assert_eq!(s.popup_state(), PopupState::Closed);
}

#[test]
fn test_ascii_conversion_and_undo() {
    let mut s = session();
    type_text(&mut s, ":)");
    assert_eq!(markup(&s), r#"<p><img class="emoji-img" data-emoji="🙂"></p>"#);
    assert_eq!(s.content(), "<p>🙂</p>");

    let outcome = press_key(&mut s, Key::Backspace);
    assert_eq!(outcome, KeyOutcome::consumed());
    assert_eq!(markup(&s), "<p>:) </p>");
}

#[test]
fn test_ascii_undo_only_on_next_key() {
    let mut s = session();
    type_text(&mut s, "<3a");
    assert_eq!(
        markup(&s),
        r#"<p><img class="emoji-img" data-emoji="❤️">a</p>"#
    );
    let outcome = press_key(&mut s, Key::Backspace);
    assert!(!outcome.prevent_default);
    assert_eq!(markup(&s), r#"<p><img class="emoji-img" data-emoji="❤️"></p>"#);
}

#[test]
fn test_url_is_not_an_emoticon() {
    let mut s = session();
    type_text(&mut s, "http://x");
    assert_eq!(markup(&s), "<p>http://x</p>");
}

#[test]
fn test_double_backspace_removes_mention() {
    let mut s = session();
    type_text(&mut s, "hello @jo");
    press_key(&mut s, Key::Enter);

    press_key(&mut s, Key::Backspace);
    let after_space = markup(&s);
    assert_eq!(
        after_space,
        r#"<p>hello <span contenteditable="false" data-user-id="1" class="tag">@John Doe</span></p>"#
    );
    assert!(!press_key(&mut s, Key::Backspace).prevent_default);
    assert_eq!(markup(&s), after_space);

    assert_eq!(press_key(&mut s, Key::Backspace), KeyOutcome::consumed());
    assert_eq!(markup(&s), "<p>hello </p>");
}

#[test]
fn test_typing_indicator() {
    let mut s = session();
    type_text(&mut s, "a");
    assert!(s.is_typing());
    s.set_content("");
    assert!(!s.is_typing());
    s.advance(Duration::from_secs(5));
    let typing: Vec<_> = event_names(&mut s)
        .into_iter()
        .filter(|n| n.ends_with("typing"))
        .collect();
    assert_eq!(typing, vec!["start_typing", "stop_typing"]);
}

#[test]
fn test_typing_stops_when_idle() {
    let mut s = session();
    type_text(&mut s, "hey");
    s.drain_events();
    s.advance(Duration::from_millis(2400));
    assert!(s.drain_events().is_empty());
    s.advance(Duration::from_millis(200));
    assert_eq!(s.drain_events(), vec![ComposerEvent::StopTyping]);
}

#[test]
fn test_submit_throttle() {
    let mut s = session();
    type_text(&mut s, "hi");
    s.drain_events();

    let outcome = press_key(&mut s, Key::Enter);
    assert!(outcome.prevent_default);
    assert_eq!(markup(&s), "<p>hi</p>");
    press_key(&mut s, Key::Enter);
    let submits = event_names(&mut s).iter().filter(|n| **n == "submit").count();
    assert_eq!(submits, 1);

    s.set_content("");
    type_text(&mut s, "next");
    press_key(&mut s, Key::Enter);
    assert!(event_names(&mut s).contains(&"submit"));
}

#[test]
fn test_shift_enter() {
    let mut s = session();
    type_text(&mut s, "a");
    s.drain_events();
    let outcome = press(&mut s, KeyEvent::shift(Key::Enter));
    assert!(!outcome.prevent_default);
    assert!(!s.drain_events().contains(&ComposerEvent::Submit));

    let config = ComposerConfig {
        alternate_newline: true,
        ..ComposerConfig::default()
    };
    let mut s = session_with(directory(), EmojiCatalog::default(), config);
    type_text(&mut s, "a");
    let outcome = press(&mut s, KeyEvent::shift(Key::Enter));
    assert_eq!(outcome, KeyOutcome::consumed());
    assert_eq!(markup(&s), "<p>a<br></p>");
}

#[test]
fn test_content_round_trip() {
    let mut s = session();
    for value in ["hi 🙂 there", "😄😄", "plain", "a 👍🏽 b ❤️"] {
        s.set_content(value);
        assert!(s.surface().raw_html().contains("emoji-img") || value == "plain");
        assert_eq!(s.content(), value);
    }
}

#[test]
fn test_content_changed_emitted_once() {
    let mut s = session();
    type_text(&mut s, "a");
    let changes: Vec<_> = s
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, ComposerEvent::ContentChanged(_)))
        .collect();
    assert_eq!(changes, vec![ComposerEvent::ContentChanged("<p>a</p>".into())]);

    s.handle(SurfaceEvent::ContentChanged);
    assert!(s.drain_events().is_empty());
}

#[test]
fn test_paste_rewrite() {
    let mut s = session();
    let outcome = s.handle(SurfaceEvent::PasteBeforeCleanup("<b>yay 🎉</b>".into()));
    let html = outcome.replacement_html.unwrap();
    assert!(html.starts_with(r#"<b>yay <img class="emoji-img" data-emoji="🎉""#));
    assert_eq!(
        s.handle(SurfaceEvent::PasteAfterCleanup("x".into())),
        KeyOutcome::PASS
    );
}

#[test]
fn test_typed_emoji_becomes_image() {
    let mut s = session();
    type_text(&mut s, "hi 😀");
    assert_eq!(markup(&s), r#"<p>hi <img class="emoji-img" data-emoji="😀"></p>"#);
}

#[test]
fn test_picker_insert() {
    let mut s = session();
    assert!(s.insert_emoji("👍").unwrap());
    assert_eq!(s.content(), "<p>👍</p>");

    let mut s = session();
    type_text(&mut s, "hi ");
    s.surface_mut().blur();
    assert!(s.insert_emoji("🎉").unwrap());
    assert_eq!(markup(&s), r#"<p>hi <img class="emoji-img" data-emoji="🎉"></p>"#);

    assert!(s.insert_emoji("nope").is_err());
}

#[test]
fn test_popup_never_double_opens() {
    let mut s = session();
    type_text(&mut s, "@j @jo x @a");
    let mut open = 0i32;
    for event in s.drain_events() {
        match event {
            ComposerEvent::PopupOpened(_) => open += 1,
            ComposerEvent::PopupClosed(_) => open -= 1,
            _ => {}
        }
        assert!((0..=1).contains(&open));
    }
    assert_eq!(open, 1);
}

#[test]
fn test_shortcode_lookup_ignores_case() {
    let mut lower = session();
    type_text(&mut lower, ":smi");
    let mut upper = session();
    type_text(&mut upper, ":SMI");

    assert_eq!(upper.popup_state(), PopupState::Open(PopupKind::Emoji));
    assert!(!upper.emoji_candidates().items.is_empty());
    assert_eq!(upper.emoji_candidates(), lower.emoji_candidates());
}
