//! Keyboard shortcuts for tool switching, zoom and delete.
//!
//! The host shell owns a [`ShortcutDispatcher`], registers it while the
//! canvas is mounted, and forwards key-down events to it. The dispatcher is
//! built with an input-focus predicate (shortcuts are ignored while a text
//! field has focus) and a [`ShortcutHandler`] that carries out the actions.
//!
//! | Key                      | Action          |
//! |--------------------------|-----------------|
//! | `v`, `Escape`            | select tool     |
//! | `a`                      | annotate tool   |
//! | `Ctrl/Cmd` + `=` or `+`  | zoom in         |
//! | `Ctrl/Cmd` + `-`         | zoom out        |
//! | `Delete`, `Backspace`    | delete selected |

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutAction {
    SelectTool,
    AnnotateTool,
    ZoomIn,
    ZoomOut,
    DeleteSelected,
}

/// A key-down event as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key name as reported by the platform, e.g. `"v"`, `"Escape"`, `"="`.
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            meta: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Map a key event to an action, ignoring focus.
pub fn resolve(event: &KeyEvent) -> Option<ShortcutAction> {
    match event.key.to_lowercase().as_str() {
        "v" | "escape" => Some(ShortcutAction::SelectTool),
        "a" => Some(ShortcutAction::AnnotateTool),
        "=" | "+" if event.command() => Some(ShortcutAction::ZoomIn),
        "-" if event.command() => Some(ShortcutAction::ZoomOut),
        "delete" | "backspace" => Some(ShortcutAction::DeleteSelected),
        _ => None,
    }
}

/// Receives dispatched shortcut actions.
pub trait ShortcutHandler {
    fn on_select_tool(&mut self);
    fn on_annotate_tool(&mut self);
    fn on_zoom_in(&mut self);
    fn on_zoom_out(&mut self);
    /// Delete the selected annotation; a no-op when nothing is selected.
    fn on_delete(&mut self);
}

/// Result of a handled key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
    pub action: ShortcutAction,
    /// The host should suppress the platform's default for this key
    /// (browser zoom for `Ctrl/Cmd` + `=`/`-`).
    pub prevent_default: bool,
}

type FocusPredicate = Box<dyn Fn() -> bool + Send + Sync>;

pub struct ShortcutDispatcher<H> {
    input_focused: FocusPredicate,
    handler: H,
    registered: bool,
}

impl<H: ShortcutHandler> ShortcutDispatcher<H> {
    /// Create an unregistered dispatcher.
    pub fn new(input_focused: impl Fn() -> bool + Send + Sync + 'static, handler: H) -> Self {
        Self {
            input_focused: Box::new(input_focused),
            handler,
            registered: false,
        }
    }

    pub fn register(&mut self) {
        self.registered = true;
    }

    pub fn unregister(&mut self) {
        self.registered = false;
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Handle one key-down event synchronously. Returns `None` when the
    /// dispatcher is unregistered, a text input has focus, or the key is not
    /// bound. Taking `&mut self` means a handler cannot re-enter dispatch.
    pub fn dispatch(&mut self, event: &KeyEvent) -> Option<Dispatched> {
        if !self.registered || (self.input_focused)() {
            return None;
        }
        let action = resolve(event)?;
        match action {
            ShortcutAction::SelectTool => self.handler.on_select_tool(),
            ShortcutAction::AnnotateTool => self.handler.on_annotate_tool(),
            ShortcutAction::ZoomIn => self.handler.on_zoom_in(),
            ShortcutAction::ZoomOut => self.handler.on_zoom_out(),
            ShortcutAction::DeleteSelected => self.handler.on_delete(),
        }
        Some(Dispatched {
            action,
            prevent_default: matches!(action, ShortcutAction::ZoomIn | ShortcutAction::ZoomOut),
        })
    }
}
