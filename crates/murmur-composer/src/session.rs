//! One composer attached to one editable surface.
//!
//! The session owns the surface for its lifetime and is the only place that
//! mutates it. Hosts forward every [`SurfaceEvent`] to [`CompositionSession::handle`],
//! apply the native default effect unless the returned outcome prevents it,
//! drive time with [`advance`](CompositionSession::advance) or
//! [`poll`](CompositionSession::poll), and drain [`ComposerEvent`]s.

use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use murmur_editor_core::{
    CurrentWord, Document, DomRange, EditableSurface, Key, KeyEvent, KeyOutcome, SurfaceEvent,
    TrimWhitespace,
};
use murmur_emoji::{Emoji, EmojiData, EmojiEntry};
use tracing::{debug, trace, warn};
use web_time::Instant;

use crate::candidates::{CandidateList, CandidateView, Direction};
use crate::config::{ComposerConfig, PasteStage};
use crate::directory::{DirectoryEntry, DirectoryQuery};
use crate::error::ComposerError;
use crate::events::ComposerEvent;
use crate::gate::{GateTimer, SubmitGate, TypingGate};
use crate::insertion::{
    BackspaceWatch, ascii_restore_html, mention_before_caret, mention_html, remove_node,
    replace_trigger_word,
};
use crate::popup::{PopupController, PopupKind, PopupState, PopupTransition};
use crate::scheduler::{Scheduler, TimerId};
use crate::selection::{SelectionTracker, caret_word};
use crate::transform::{ArmedUndo, AsciiConverter, EmojiRenderer, render_outbound};
use crate::trigger::{Trigger, TriggerDetector};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Task {
    RefreshSelection,
    InputEmoji(String),
    Gate(GateTimer),
}

impl From<GateTimer> for Task {
    fn from(timer: GateTimer) -> Self {
        Self::Gate(timer)
    }
}

pub struct CompositionSession<S> {
    surface: S,
    config: ComposerConfig,
    directory: Rc<dyn DirectoryQuery>,
    renderer: EmojiRenderer,
    scheduler: Scheduler<Task>,
    tracker: SelectionTracker,
    detector: TriggerDetector,
    mentions: CandidateList<DirectoryEntry>,
    emojis: CandidateList<EmojiEntry>,
    popup: PopupController,
    ascii: AsciiConverter,
    backspace: BackspaceWatch,
    typing: TypingGate,
    submit: SubmitGate,
    last_out: String,
    last_range: Option<DomRange>,
    input_timer: Option<TimerId>,
    outbox: VecDeque<ComposerEvent>,
}

impl<S: EditableSurface> CompositionSession<S> {
    /// Attach to `surface`, registering the emoji transforms (and whitespace
    /// trimming when enabled) on it.
    pub fn new(
        mut surface: S,
        directory: Rc<dyn DirectoryQuery>,
        emoji_data: Rc<dyn EmojiData>,
        config: ComposerConfig,
    ) -> Self {
        let renderer = EmojiRenderer::new(emoji_data, config.emoji_sheet.clone());
        let inbound = renderer.clone();
        surface.register_inbound_transform(Box::new(move |doc: &mut Document| {
            inbound.render_inbound(doc)
        }));
        surface.register_outbound_transform(Box::new(render_outbound));
        if config.trim_whitespace {
            surface.register_outbound_transform(Box::new(TrimWhitespace));
        }
        let last_out = surface.content();
        debug!(set = %config.emoji_sheet.set, "composition session attached");

        Self {
            surface,
            config,
            directory,
            renderer,
            scheduler: Scheduler::new(),
            tracker: SelectionTracker::new(),
            detector: TriggerDetector::new(),
            mentions: CandidateList::new(),
            emojis: CandidateList::new(),
            popup: PopupController::new(),
            ascii: AsciiConverter::new(),
            backspace: BackspaceWatch::new(),
            typing: TypingGate::new(),
            submit: SubmitGate::new(),
            last_out,
            last_range: None,
            input_timer: None,
            outbox: VecDeque::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct access for hosts applying native default effects.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn popup_state(&self) -> PopupState {
        self.popup.state()
    }

    pub fn trigger(&self) -> &Trigger {
        self.detector.current()
    }

    pub fn mention_candidates(&self) -> CandidateView<DirectoryEntry> {
        self.mentions.view()
    }

    pub fn emoji_candidates(&self) -> CandidateView<EmojiEntry> {
        self.emojis.view()
    }

    /// Whether the typing indicator is currently on.
    pub fn is_typing(&self) -> bool {
        self.typing.is_typing()
    }

    pub fn drain_events(&mut self) -> Vec<ComposerEvent> {
        self.outbox.drain(..).collect()
    }

    /// Serialized content, with emoji images turned back into text.
    pub fn content(&self) -> String {
        self.surface.content()
    }

    /// Replace the content, e.g. to clear the composer after a submit.
    pub fn set_content(&mut self, html: &str) {
        self.surface.set_content(html);
        self.on_content_changed();
    }

    // === Events ===

    pub fn handle(&mut self, event: SurfaceEvent) -> KeyOutcome {
        match event {
            SurfaceEvent::KeyDown(key) => self.on_key_down(&key),
            SurfaceEvent::KeyUp(_) => {
                self.save_range();
                self.update_model();
                self.schedule_refresh(self.config.selection_settle());
                KeyOutcome::PASS
            }
            SurfaceEvent::Input { data } => {
                self.save_range();
                if let Some(data) = data {
                    self.on_input(data);
                }
                KeyOutcome::PASS
            }
            SurfaceEvent::Focus => {
                self.save_range();
                self.refresh_selection();
                KeyOutcome::PASS
            }
            SurfaceEvent::Blur => {
                trace!("surface blurred");
                KeyOutcome::PASS
            }
            SurfaceEvent::ContentChanged => {
                self.save_range();
                self.on_content_changed();
                KeyOutcome::PASS
            }
            SurfaceEvent::PasteBeforeCleanup(html) => {
                self.on_paste(&html, PasteStage::BeforeCleanup)
            }
            SurfaceEvent::PasteAfterCleanup(html) => {
                self.on_paste(&html, PasteStage::AfterCleanup)
            }
        }
    }

    fn on_key_down(&mut self, key: &KeyEvent) -> KeyOutcome {
        self.save_range();
        let popup = self.popup.open_kind();
        let is_backspace = key.is(&Key::Backspace);

        if let Some(armed) = self.ascii.take_armed() {
            if is_backspace {
                match self.undo_ascii(armed) {
                    Ok(true) => return KeyOutcome::consumed(),
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "emoticon undo failed"),
                }
            }
        }

        if self.backspace.on_keydown(is_backspace, &self.surface) {
            if let Some(span) = mention_before_caret(&self.surface) {
                match remove_node(&mut self.surface, span) {
                    Ok(true) => {
                        debug!(node = %span, "mention removed");
                        self.backspace.reset();
                        self.on_content_changed();
                        return KeyOutcome::consumed();
                    }
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "mention removal failed"),
                }
            }
        }

        if let Some(kind) = popup {
            match key.key {
                Key::ArrowUp | Key::ArrowDown => {
                    let direction = if key.key == Key::ArrowUp {
                        Direction::Up
                    } else {
                        Direction::Down
                    };
                    self.navigate(kind, direction);
                    return KeyOutcome::consumed();
                }
                Key::Enter | Key::Tab => {
                    if let Err(e) = self.commit_selected(kind) {
                        warn!(error = %e, ?kind, "commit failed");
                    }
                    return KeyOutcome::consumed();
                }
                Key::Escape => {
                    self.close_popup();
                    return KeyOutcome::consumed();
                }
                _ => {}
            }
        }

        let mut outcome = KeyOutcome::PASS;
        if key.is(&Key::Enter) {
            if key.modifiers.shift {
                if self.config.alternate_newline {
                    if let Err(e) = self.surface.insert_at_caret("<br>") {
                        warn!(error = %e, "line break insert failed");
                    }
                    self.on_content_changed();
                    outcome = KeyOutcome::consumed();
                }
            } else if popup.is_none() {
                outcome = KeyOutcome::prevented();
                if self.submit.request(&mut self.scheduler, self.config.submit_window()) {
                    debug!("submit");
                    self.outbox.push_back(ComposerEvent::Submit);
                }
            }
        }

        self.update_model();
        outcome
    }

    fn on_input(&mut self, data: String) {
        if Emoji::new(data.as_str()).is_err() {
            return;
        }
        if let Some(id) = self.input_timer.take() {
            self.scheduler.cancel(id);
        }
        let delay = self.config.input_debounce();
        self.input_timer = Some(self.scheduler.schedule(delay, Task::InputEmoji(data)));
    }

    fn on_paste(&mut self, html: &str, stage: PasteStage) -> KeyOutcome {
        if stage != self.config.paste_stage {
            return KeyOutcome::PASS;
        }
        let rewritten = self.renderer.rewrite_html(html);
        trace!(?stage, "paste rewritten");
        KeyOutcome::replace_with(rewritten)
    }

    fn on_content_changed(&mut self) {
        self.update_model();
        self.refresh_selection();
    }

    /// Remember where the caret was while focus is inside.
    fn save_range(&mut self) {
        if self.surface.is_focus_inside() {
            self.last_range = self.surface.range();
        }
    }

    /// Publish the serialized content if it changed. Re-entrant calls with
    /// unchanged content stop here.
    fn update_model(&mut self) -> bool {
        let content = self.surface.content();
        if content == self.last_out {
            return false;
        }
        self.last_out = content.clone();
        trace!(len = content.len(), "content changed");
        self.outbox.push_back(ComposerEvent::ContentChanged(content.clone()));

        self.submit.on_content(&content);
        let idle = self.config.typing_idle();
        match self.typing.on_content(&content, &mut self.scheduler, idle) {
            Some(true) => self.outbox.push_back(ComposerEvent::StartTyping),
            Some(false) => self.outbox.push_back(ComposerEvent::StopTyping),
            None => {}
        }
        true
    }

    // === Selection and triggers ===

    fn schedule_refresh(&mut self, delay: Duration) {
        self.scheduler.schedule(delay, Task::RefreshSelection);
    }

    fn refresh_selection(&mut self) {
        self.tracker.sync_focus(&self.surface);
        if self.tracker.observe(self.surface.selection()).is_none() {
            return;
        }

        let mut word = caret_word(&self.surface);
        if let Some((ascii_word, emoji)) = self.ascii.observe(word.as_ref()) {
            match self.convert_ascii(&ascii_word, &emoji) {
                Ok(true) => {
                    self.tracker.sync_focus(&self.surface);
                    self.tracker.observe(self.surface.selection());
                    word = caret_word(&self.surface);
                    self.ascii.observe(word.as_ref());
                }
                Ok(false) => {}
                Err(e) => warn!(error = %e, "emoticon conversion failed"),
            }
        }

        if let Some(trigger) = self.detector.observe(word.as_ref()).cloned() {
            self.apply_trigger(trigger);
        }
    }

    fn apply_trigger(&mut self, trigger: Trigger) {
        trace!(?trigger, "trigger changed");
        let transitions = self.popup.show(trigger.popup_kind());
        self.publish_transitions(transitions);

        match &trigger {
            Trigger::Mention(query) => {
                self.emojis.clear();
                let ticket = self.mentions.begin(query);
                let result = self.directory.search(query);
                self.mentions.complete(ticket, result);
                self.outbox
                    .push_back(ComposerEvent::MentionList(self.mentions.view()));
            }
            Trigger::EmojiShortcode(query) => {
                self.mentions.clear();
                let ticket = self.emojis.begin(query);
                let result = self.renderer.data().search_by_short_name(query);
                self.emojis.complete(ticket, result);
                self.outbox
                    .push_back(ComposerEvent::EmojiList(self.emojis.view()));
            }
            Trigger::None => {
                self.mentions.clear();
                self.emojis.clear();
            }
        }
    }

    fn publish_transitions(&mut self, transitions: Vec<PopupTransition>) {
        for t in transitions {
            self.outbox.push_back(match t {
                PopupTransition::Opened(kind) => ComposerEvent::PopupOpened(kind),
                PopupTransition::Closed(kind) => ComposerEvent::PopupClosed(kind),
            });
        }
    }

    fn close_popup(&mut self) {
        let transitions = self.popup.close();
        self.publish_transitions(transitions);
        self.mentions.clear();
        self.emojis.clear();
    }

    fn navigate(&mut self, kind: PopupKind, direction: Direction) {
        let event = match kind {
            PopupKind::Mention => {
                self.mentions.navigate(direction);
                ComposerEvent::MentionList(self.mentions.view())
            }
            PopupKind::Emoji => {
                self.emojis.navigate(direction);
                ComposerEvent::EmojiList(self.emojis.view())
            }
        };
        self.outbox.push_back(event);
    }

    // === Commits ===

    /// Commit the mention at `index`, as a click on that popup row would.
    pub fn pick_mention(&mut self, index: usize) -> Result<bool, ComposerError> {
        if !self.mentions.select(index) {
            return Err(ComposerError::NoCandidate {
                index,
                len: self.mentions.len(),
            });
        }
        self.commit_selected(PopupKind::Mention)
    }

    /// Commit the emoji at `index`, as a click on that popup row would.
    pub fn pick_emoji(&mut self, index: usize) -> Result<bool, ComposerError> {
        if !self.emojis.select(index) {
            return Err(ComposerError::NoCandidate {
                index,
                len: self.emojis.len(),
            });
        }
        self.commit_selected(PopupKind::Emoji)
    }

    fn commit_selected(&mut self, kind: PopupKind) -> Result<bool, ComposerError> {
        let html = match kind {
            PopupKind::Mention => {
                let Some(entry) = self.mentions.selected() else {
                    return Ok(false);
                };
                mention_html(entry, self.config.mention_user_ids)
            }
            PopupKind::Emoji => {
                let Some(entry) = self.emojis.selected() else {
                    return Ok(false);
                };
                let emoji = Emoji::new(entry.native.as_str())?;
                match self.renderer.image_html(&emoji) {
                    Some(html) => html,
                    None => {
                        warn!(emoji = %emoji, "no sprite for emoji; commit skipped");
                        return Ok(false);
                    }
                }
            }
        };

        let restore = self.tracker.in_editor_range();
        if replace_trigger_word(&mut self.surface, restore, &html)?.is_none() {
            return Ok(false);
        }
        debug!(?kind, "candidate committed");
        self.on_content_changed();
        self.schedule_refresh(self.config.refresh_after_insert());
        Ok(true)
    }

    /// Insert an emoji chosen outside the popup, e.g. from a picker, at the
    /// last caret position seen inside the editor.
    pub fn insert_emoji(&mut self, native: &str) -> Result<bool, ComposerError> {
        let emoji = Emoji::new(native)?;
        let Some(html) = self.renderer.image_html(&emoji) else {
            warn!(emoji = %emoji, "no sprite for emoji; insert skipped");
            return Ok(false);
        };
        if self.surface.is_empty() {
            self.surface.set_content(&format!("<p>{html}</p>"));
        } else {
            let restore = self
                .last_range
                .filter(|r| self.surface.document().is_valid_range(*r));
            if let Some(range) = restore {
                self.surface.set_range(range);
            }
            self.surface.insert_at_caret(&html)?;
        }
        self.on_content_changed();
        Ok(true)
    }

    // === Transforms ===

    fn convert_ascii(&mut self, word: &CurrentWord, emoji: &Emoji) -> Result<bool, ComposerError> {
        let Some(html) = self.renderer.image_html(emoji) else {
            return Ok(false);
        };
        let Some(caret) = self.surface.range().filter(DomRange::is_collapsed) else {
            return Ok(false);
        };
        let node = caret.start.node;
        if !self.surface.document().is_text(node) {
            return Ok(false);
        }
        self.surface
            .set_range(DomRange::within(node, word.start_offset, word.end_offset));
        let after = self.surface.insert_at_caret(&html)?;
        let image = after
            .offset
            .checked_sub(1)
            .and_then(|i| self.surface.document().children(after.node).get(i).copied());
        if let Some(image) = image {
            self.ascii.arm(ArmedUndo {
                ascii: word.text.clone(),
                image,
            });
        }
        debug!(ascii = %word.text, emoji = %emoji, "emoticon converted");
        self.update_model();
        Ok(true)
    }

    fn undo_ascii(&mut self, armed: ArmedUndo) -> Result<bool, ComposerError> {
        let doc = self.surface.document();
        if !doc.is_attached(armed.image) || !doc.is_element(armed.image, "img") {
            return Ok(false);
        }
        let Some(range) = doc.select_node(armed.image) else {
            return Ok(false);
        };
        self.surface.set_range(range);
        self.surface
            .insert_at_caret(&ascii_restore_html(&armed.ascii))?;
        debug!(ascii = %armed.ascii, "emoticon restored");
        self.on_content_changed();
        Ok(true)
    }

    fn convert_input_emoji(&mut self, native: &str) -> Result<bool, ComposerError> {
        let Some(caret) = self.surface.range().filter(DomRange::is_collapsed) else {
            return Ok(false);
        };
        let node = caret.start.node;
        let Some(text) = self.surface.document().text(node) else {
            return Ok(false);
        };
        let Some(byte) = text.rfind(native) else {
            return Ok(false);
        };
        let start = text[..byte].chars().count();
        let end = start + native.chars().count();

        let emoji = Emoji::new(native)?;
        let Some(html) = self.renderer.image_html(&emoji) else {
            return Ok(false);
        };
        self.surface.set_range(DomRange::within(node, start, end));
        self.surface.insert_at_caret(&html)?;
        debug!(emoji = %emoji, "typed emoji rendered");
        self.on_content_changed();
        Ok(true)
    }

    // === Time ===

    /// Move virtual time forward, running every task that comes due.
    pub fn advance(&mut self, by: Duration) {
        let target = self.scheduler.now() + by;
        self.run_until(target);
    }

    /// Run tasks due at the wall-clock instant `now`.
    pub fn poll(&mut self, now: Instant) {
        let target = self.scheduler.target_for(now);
        if target > self.scheduler.now() {
            self.run_until(target);
        }
    }

    /// Time until the next task, for hosts arming a real timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler
            .next_deadline()
            .map(|d| d.saturating_sub(self.scheduler.now()))
    }

    fn run_until(&mut self, target: Duration) {
        while let Some(task) = self.scheduler.pop_due(target) {
            self.run_task(task);
        }
        self.scheduler.settle_at(target);
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::RefreshSelection => self.refresh_selection(),
            Task::InputEmoji(native) => {
                self.input_timer = None;
                if let Err(e) = self.convert_input_emoji(&native) {
                    warn!(error = %e, "typed emoji conversion failed");
                }
            }
            Task::Gate(GateTimer::TypingIdle) => {
                if let Some(false) = self.typing.on_idle() {
                    self.outbox.push_back(ComposerEvent::StopTyping);
                }
            }
            Task::Gate(GateTimer::SubmitWindow) => self.submit.on_window_elapsed(),
        }
    }
}
