#![forbid(unsafe_code)]

//! Overlay message dialog.
//!
//! A [`MessageDialog`] is a title, a body, and an ordered row of buttons,
//! rendered through the host [`Toolkit`] and kept on the [`DialogStack`]
//! while open.
//!
//! # Lifecycle
//!
//! `Hidden → Visible → Closed` (`Hidden → Closed` is allowed too).
//!
//! Construction creates the container element, pushes the dialog on the
//! stack, and defers [`MessageDialog::show`] to the next event-loop turn, so
//! builder calls made in the same turn (`add_button`, `set_html`,
//! `set_text_align`) land before the dialog is rendered.
//!
//! # Invariants
//!
//! - Clicking a button runs its callback and nothing else. A dialog never
//!   closes itself; callbacks call [`MessageDialog::close`].
//! - Callbacks receive the dialog they belong to and may reenter it
//!   (close it, add buttons, change the body).
//! - `close()` is idempotent. After close, mutators only update state.
//!
//! # Failure Modes
//!
//! - `click()` with an out-of-range index, or on a closed dialog, returns
//!   `false`.
//! - Mutating after the dialog became visible re-renders the affected
//!   element; it never panics.
//!
//! [`Toolkit`]: spmodal_core::Toolkit

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use spmodal_core::{BindingId, DialogId, ElementId, ElementSpec, TextAlign};
use tracing::{debug, trace};

use crate::context::ModalContext;
use crate::modal::stack::StackModal;

/// Button callback. Receives the dialog the button belongs to.
pub type DialogCallback = Rc<dyn Fn(&MessageDialog)>;

/// Dialog type variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    /// Plain message dialog.
    Message,
    /// Message with an "Ok" button.
    Alert,
    /// Message with "Ok" and "Cancel".
    Confirm,
    /// Message with "Ok", raised as a failure after display.
    Error,
    /// Busy indicator; no buttons unless the caller adds some.
    Loading,
}

/// Visibility of a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
    Closed,
}

/// A button in a dialog.
#[derive(Clone)]
pub struct DialogButton {
    /// Display label.
    pub label: String,
    /// Runs on click.
    pub callback: DialogCallback,
}

impl fmt::Debug for DialogButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogButton")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl DialogButton {
    pub fn new(label: impl Into<String>, callback: impl Fn(&MessageDialog) + 'static) -> Self {
        Self {
            label: label.into(),
            callback: Rc::new(callback),
        }
    }
}

/// Rendered child elements, present only while visible.
#[derive(Debug, Default)]
struct Rendered {
    title: Option<ElementId>,
    body: Option<ElementId>,
    spinner: Option<ElementId>,
    buttons: Vec<(ElementId, BindingId)>,
}

#[derive(Debug)]
struct DialogState {
    title: String,
    message: String,
    html: bool,
    align: TextAlign,
    position: (Option<i32>, Option<i32>),
    buttons: Vec<DialogButton>,
    visibility: Visibility,
    covered: bool,
    rendered: Rendered,
}

impl DialogState {
    fn body_spec(&self) -> ElementSpec {
        ElementSpec::Body {
            content: self.message.clone(),
            html: self.html,
            align: self.align,
        }
    }
}

struct DialogShared {
    id: DialogId,
    kind: DialogKind,
    root: ElementId,
    ctx: ModalContext,
    state: RefCell<DialogState>,
}

impl StackModal for DialogShared {
    fn id(&self) -> DialogId {
        self.id
    }

    fn apply_z_index(&self, z_index: u32) {
        self.ctx.toolkit().set_z_index(self.root, z_index);
    }

    fn set_focused(&self, focused: bool) {
        let toolkit = self.ctx.toolkit();
        if focused {
            toolkit.focus(self.root);
        } else {
            toolkit.blur(self.root);
        }
    }

    fn set_covered(&self, covered: bool) {
        let visible = {
            let Ok(mut state) = self.state.try_borrow_mut() else {
                return;
            };
            state.covered = covered;
            state.visibility == Visibility::Visible
        };
        if visible {
            self.ctx.toolkit().set_visible(self.root, !covered);
        }
    }
}

/// Handle to an overlay dialog. Clones refer to the same dialog.
///
/// The dialog stays alive while it is on the stack, even if every handle is
/// dropped; closing it releases it.
#[derive(Clone)]
pub struct MessageDialog {
    inner: Rc<DialogShared>,
}

impl fmt::Debug for MessageDialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("MessageDialog")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("title", &state.title)
            .field("message", &state.message)
            .field("buttons", &state.buttons)
            .field("visibility", &state.visibility)
            .finish()
    }
}

impl PartialEq for MessageDialog {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl MessageDialog {
    /// Create a message dialog with a title and an optional body.
    pub fn new(ctx: &ModalContext, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_kind(ctx, DialogKind::Message, title, message)
    }

    pub(crate) fn with_kind(
        ctx: &ModalContext,
        kind: DialogKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let toolkit = ctx.toolkit();
        let root = toolkit.create(ElementSpec::Dialog);
        toolkit.set_visible(root, false);
        toolkit.attach(root, None);

        let dialog = Self {
            inner: Rc::new(DialogShared {
                id: DialogId::next(),
                kind,
                root,
                ctx: ctx.clone(),
                state: RefCell::new(DialogState {
                    title: title.into(),
                    message: message.into(),
                    html: false,
                    align: TextAlign::default(),
                    position: (None, None),
                    buttons: Vec::new(),
                    visibility: Visibility::Hidden,
                    covered: false,
                    rendered: Rendered::default(),
                }),
            }),
        };

        ctx.stack().push(dialog.inner.clone());

        let pending = dialog.clone();
        ctx.event_loop().defer(move || pending.show());

        debug!(dialog = %dialog.inner.id, kind = ?kind, "created dialog");
        dialog
    }

    fn from_weak(weak: &Weak<DialogShared>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    // --- Accessors ---

    #[must_use]
    pub fn id(&self) -> DialogId {
        self.inner.id
    }

    #[must_use]
    pub fn kind(&self) -> DialogKind {
        self.inner.kind
    }

    /// Container element issued by the toolkit.
    #[must_use]
    pub fn element(&self) -> ElementId {
        self.inner.root
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.inner.state.borrow().title.clone()
    }

    #[must_use]
    pub fn message(&self) -> String {
        self.inner.state.borrow().message.clone()
    }

    #[must_use]
    pub fn is_html(&self) -> bool {
        self.inner.state.borrow().html
    }

    #[must_use]
    pub fn text_align(&self) -> TextAlign {
        self.inner.state.borrow().align
    }

    #[must_use]
    pub fn position(&self) -> (Option<i32>, Option<i32>) {
        self.inner.state.borrow().position
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.inner.state.borrow().visibility
    }

    /// True until the dialog is closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.visibility() != Visibility::Closed
    }

    #[must_use]
    pub fn button_labels(&self) -> Vec<String> {
        self.inner
            .state
            .borrow()
            .buttons
            .iter()
            .map(|b| b.label.clone())
            .collect()
    }

    /// Stacking order while on the stack.
    #[must_use]
    pub fn z_index(&self) -> Option<u32> {
        self.inner.ctx.stack().z_index(self.inner.id)
    }

    // --- Builder-style mutators ---

    /// Append a button. The dialog does not close on click; `callback` is
    /// responsible for that.
    pub fn add_button(
        &self,
        label: impl Into<String>,
        callback: impl Fn(&MessageDialog) + 'static,
    ) -> &Self {
        let button = DialogButton::new(label, callback);
        let render_at = {
            let mut state = self.inner.state.borrow_mut();
            state.buttons.push(button.clone());
            (state.visibility == Visibility::Visible).then(|| state.buttons.len() - 1)
        };
        if let Some(index) = render_at {
            let rendered = self.render_button(index, &button.label);
            self.inner.state.borrow_mut().rendered.buttons.push(rendered);
        }
        self
    }

    pub fn set_title(&self, title: impl Into<String>) -> &Self {
        let update = {
            let mut state = self.inner.state.borrow_mut();
            state.title = title.into();
            state
                .rendered
                .title
                .map(|el| (el, ElementSpec::Title { text: state.title.clone() }))
        };
        if let Some((el, spec)) = update {
            self.inner.ctx.toolkit().update(el, spec);
        }
        self
    }

    pub fn set_message(&self, message: impl Into<String>) -> &Self {
        self.mutate_body(|state| state.message = message.into())
    }

    /// Render the body as markup (`true`) or plain text (`false`).
    pub fn set_html(&self, html: bool) -> &Self {
        self.mutate_body(|state| state.html = html)
    }

    pub fn set_text_align(&self, align: TextAlign) -> &Self {
        self.mutate_body(|state| state.align = align)
    }

    /// Pin the horizontal position; the vertical axis is left as is.
    pub fn set_x(&self, x: i32) -> &Self {
        self.mutate_position(|pos| pos.0 = Some(x))
    }

    /// Pin the vertical position; the horizontal axis is left as is.
    pub fn set_y(&self, y: i32) -> &Self {
        self.mutate_position(|pos| pos.1 = Some(y))
    }

    fn mutate_body(&self, f: impl FnOnce(&mut DialogState)) -> &Self {
        let update = {
            let mut state = self.inner.state.borrow_mut();
            f(&mut state);
            state.rendered.body.map(|el| (el, state.body_spec()))
        };
        if let Some((el, spec)) = update {
            self.inner.ctx.toolkit().update(el, spec);
        }
        self
    }

    fn mutate_position(&self, f: impl FnOnce(&mut (Option<i32>, Option<i32>))) -> &Self {
        let (open, (x, y)) = {
            let mut state = self.inner.state.borrow_mut();
            f(&mut state.position);
            (state.visibility != Visibility::Closed, state.position)
        };
        if open {
            self.inner.ctx.toolkit().set_position(self.inner.root, x, y);
        }
        self
    }

    // --- Lifecycle ---

    /// Render and reveal the dialog. No-op unless hidden.
    pub fn show(&self) {
        let (spec_title, spec_body, labels, covered, (x, y)) = {
            let state = self.inner.state.borrow();
            if state.visibility != Visibility::Hidden {
                return;
            }
            (
                ElementSpec::Title {
                    text: state.title.clone(),
                },
                state.body_spec(),
                state
                    .buttons
                    .iter()
                    .map(|b| b.label.clone())
                    .collect::<Vec<_>>(),
                state.covered,
                state.position,
            )
        };

        let toolkit = self.inner.ctx.toolkit();
        let root = self.inner.root;

        let title = toolkit.create(spec_title);
        toolkit.attach(title, Some(root));
        let body = toolkit.create(spec_body);
        toolkit.attach(body, Some(root));
        let spinner = (self.inner.kind == DialogKind::Loading).then(|| {
            let el = toolkit.create(ElementSpec::Spinner);
            toolkit.attach(el, Some(root));
            el
        });
        let buttons: Vec<_> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| self.render_button(i, label))
            .collect();

        {
            let mut state = self.inner.state.borrow_mut();
            state.visibility = Visibility::Visible;
            state.rendered = Rendered {
                title: Some(title),
                body: Some(body),
                spinner,
                buttons,
            };
        }

        if x.is_some() || y.is_some() {
            toolkit.set_position(root, x, y);
        }
        toolkit.set_visible(root, !covered);
        debug!(dialog = %self.inner.id, "dialog visible");
    }

    /// Run the callback of the button at `index`.
    ///
    /// Returns false when there is no such button or the dialog is closed.
    pub fn click(&self, index: usize) -> bool {
        let callback = {
            let state = self.inner.state.borrow();
            if state.visibility == Visibility::Closed {
                return false;
            }
            match state.buttons.get(index) {
                Some(button) => Rc::clone(&button.callback),
                None => return false,
            }
        };
        trace!(dialog = %self.inner.id, button = index, "button clicked");
        callback(self);
        true
    }

    /// Run the callback of the first button labeled `label`.
    pub fn click_label(&self, label: &str) -> bool {
        let index = self
            .inner
            .state
            .borrow()
            .buttons
            .iter()
            .position(|b| b.label == label);
        index.is_some_and(|i| self.click(i))
    }

    /// Remove the dialog from the stack and the page. Idempotent.
    pub fn close(&self) {
        let rendered = {
            let mut state = self.inner.state.borrow_mut();
            if state.visibility == Visibility::Closed {
                return;
            }
            state.visibility = Visibility::Closed;
            std::mem::take(&mut state.rendered)
        };

        let toolkit = self.inner.ctx.toolkit();
        for (_, binding) in rendered.buttons {
            toolkit.unbind(binding);
        }
        toolkit.detach(self.inner.root);
        self.inner.ctx.stack().remove(self.inner.id);
        debug!(dialog = %self.inner.id, "dialog closed");
    }

    fn render_button(&self, index: usize, label: &str) -> (ElementId, BindingId) {
        let toolkit = self.inner.ctx.toolkit();
        let el = toolkit.create(ElementSpec::Button {
            label: label.to_string(),
        });
        toolkit.attach(el, Some(self.inner.root));
        let weak = Rc::downgrade(&self.inner);
        let binding = toolkit.bind(
            el,
            "click",
            Rc::new(move || {
                if let Some(dialog) = Self::from_weak(&weak) {
                    dialog.click(index);
                }
            }),
        );
        (el, binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::stack::StackConfig;
    use spmodal_harness::{HeadlessDocuments, HeadlessToolkit};
    use std::cell::Cell;

    fn setup() -> (Rc<HeadlessToolkit>, ModalContext) {
        let toolkit = HeadlessToolkit::new();
        let ctx = ModalContext::isolated(
            toolkit.clone(),
            HeadlessDocuments::new(),
            StackConfig::default(),
        );
        (toolkit, ctx)
    }

    #[test]
    fn shows_on_next_turn() {
        let (toolkit, ctx) = setup();
        let dialog = MessageDialog::new(&ctx, "Title", "Body");
        assert_eq!(dialog.visibility(), Visibility::Hidden);
        assert!(!toolkit.is_visible(dialog.element()));

        ctx.event_loop().run_until_idle();
        assert_eq!(dialog.visibility(), Visibility::Visible);
        assert!(toolkit.is_visible(dialog.element()));
        assert_eq!(toolkit.title_of(dialog.element()).as_deref(), Some("Title"));
        assert_eq!(
            toolkit.body_of(dialog.element()),
            Some(("Body".to_string(), false, TextAlign::Center))
        );
    }

    #[test]
    fn same_turn_builder_calls_apply_before_render() {
        let (toolkit, ctx) = setup();
        let dialog = MessageDialog::new(&ctx, "T", "<b>x</b>");
        dialog.set_html(true).set_text_align(TextAlign::Left);
        dialog.add_button("Ok", |d| d.close());
        ctx.event_loop().run_until_idle();

        assert_eq!(
            toolkit.body_of(dialog.element()),
            Some(("<b>x</b>".to_string(), true, TextAlign::Left))
        );
        assert_eq!(toolkit.button_labels(dialog.element()), vec!["Ok"]);
    }

    #[test]
    fn mutation_after_visible_rerenders() {
        let (toolkit, ctx) = setup();
        let dialog = MessageDialog::new(&ctx, "T", "plain");
        ctx.event_loop().run_until_idle();

        dialog.set_html(true).set_message("<i>rich</i>").set_title("T2");
        dialog.add_button("Late", |_| {});
        assert_eq!(
            toolkit.body_of(dialog.element()),
            Some(("<i>rich</i>".to_string(), true, TextAlign::Center))
        );
        assert_eq!(toolkit.title_of(dialog.element()).as_deref(), Some("T2"));
        assert_eq!(toolkit.button_labels(dialog.element()), vec!["Late"]);
    }

    #[test]
    fn click_does_not_close_by_itself() {
        let (_toolkit, ctx) = setup();
        let clicks = Rc::new(Cell::new(0));
        let dialog = MessageDialog::new(&ctx, "T", "B");
        {
            let clicks = Rc::clone(&clicks);
            dialog.add_button("Count", move |_| clicks.set(clicks.get() + 1));
        }
        ctx.event_loop().run_until_idle();

        assert!(dialog.click(0));
        assert!(dialog.click_label("Count"));
        assert_eq!(clicks.get(), 2);
        assert!(dialog.is_open());
        assert!(!dialog.click(5));
        assert!(!dialog.click_label("Nope"));
    }

    #[test]
    fn toolkit_click_reaches_callback() {
        let (toolkit, ctx) = setup();
        let dialog = MessageDialog::new(&ctx, "T", "B");
        dialog.add_button("Close", |d| d.close());
        ctx.event_loop().run_until_idle();

        let buttons = toolkit.buttons(dialog.element());
        assert_eq!(buttons.len(), 1);
        toolkit.click(buttons[0]);
        assert_eq!(dialog.visibility(), Visibility::Closed);
        assert!(!toolkit.exists(dialog.element()));
    }

    #[test]
    fn close_is_idempotent_and_leaves_stack() {
        let (_toolkit, ctx) = setup();
        let dialog = MessageDialog::new(&ctx, "T", "B");
        assert!(ctx.stack().contains(dialog.id()));
        dialog.close();
        dialog.close();
        assert!(!ctx.stack().contains(dialog.id()));
        assert!(!dialog.click(0));
    }

    #[test]
    fn close_before_first_turn_never_shows() {
        let (toolkit, ctx) = setup();
        let dialog = MessageDialog::new(&ctx, "T", "B");
        dialog.close();
        ctx.event_loop().run_until_idle();
        assert_eq!(dialog.visibility(), Visibility::Closed);
        assert!(!toolkit.exists(dialog.element()));
    }

    #[test]
    fn newest_dialog_is_topmost_and_focused() {
        let (toolkit, ctx) = setup();
        let first = MessageDialog::new(&ctx, "1", "");
        let second = MessageDialog::new(&ctx, "2", "");
        assert!(second.z_index() > first.z_index());
        assert_eq!(toolkit.focused(), Some(second.element()));

        second.close();
        assert_eq!(toolkit.focused(), Some(first.element()));
    }

    #[test]
    fn dropped_handle_stays_alive_until_closed() {
        let (toolkit, ctx) = setup();
        let root = {
            let dialog = MessageDialog::new(&ctx, "T", "B");
            dialog.add_button("Ok", |d| d.close());
            dialog.element()
        };
        ctx.event_loop().run_until_idle();
        assert!(toolkit.is_visible(root));

        let button = toolkit.buttons(root)[0];
        toolkit.click(button);
        assert!(!toolkit.exists(root));
        assert!(ctx.stack().is_empty());
    }

    #[test]
    fn position_is_forwarded() {
        let (toolkit, ctx) = setup();
        let dialog = MessageDialog::new(&ctx, "T", "B");
        dialog.set_x(100).set_y(50);
        assert_eq!(dialog.position(), (Some(100), Some(50)));
        assert_eq!(toolkit.position_of(dialog.element()), (Some(100), Some(50)));
    }

    #[test]
    fn hide_covered_tracks_visibility() {
        let toolkit = HeadlessToolkit::new();
        let ctx = ModalContext::isolated(
            toolkit.clone(),
            HeadlessDocuments::new(),
            StackConfig {
                hide_covered: true,
                ..Default::default()
            },
        );
        let below = MessageDialog::new(&ctx, "below", "");
        ctx.event_loop().run_until_idle();
        assert!(toolkit.is_visible(below.element()));

        let above = MessageDialog::new(&ctx, "above", "");
        ctx.event_loop().run_until_idle();
        assert!(!toolkit.is_visible(below.element()));
        assert!(toolkit.is_visible(above.element()));

        above.close();
        assert!(toolkit.is_visible(below.element()));
    }
}
