// Lifecycle signals and the observer registry that delivers them

use std::fmt;

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenubarEvent {
    Ready,
    CreateWindow,
    AfterCreateWindow,
    Show,
    AfterShow,
    Hide,
    AfterHide,
    AfterClose,
    FocusLost,
}

impl MenubarEvent {
    pub fn name(self) -> &'static str {
        match self {
            MenubarEvent::Ready => "ready",
            MenubarEvent::CreateWindow => "create-window",
            MenubarEvent::AfterCreateWindow => "after-create-window",
            MenubarEvent::Show => "show",
            MenubarEvent::AfterShow => "after-show",
            MenubarEvent::Hide => "hide",
            MenubarEvent::AfterHide => "after-hide",
            MenubarEvent::AfterClose => "after-close",
            MenubarEvent::FocusLost => "focus-lost",
        }
    }
}

impl fmt::Display for MenubarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<W> = Box<dyn FnMut(MenubarEvent, Option<&mut W>) + Send>;

/// Listeners run synchronously, in registration order, on every emit. Each
/// one also gets the live popup window, when there is one, so it can adjust
/// the window right after `after-create-window` or `show`.
pub struct EventBus<W> {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener<W>)>,
}

impl<W> Default for EventBus<W> {
    fn default() -> Self {
        EventBus {
            next_id: 0,
            listeners: Vec::new(),
        }
    }
}

impl<W> EventBus<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(MenubarEvent, Option<&mut W>) + Send + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: MenubarEvent, mut window: Option<&mut W>) {
        debug!("menubar event: {}", event);
        for (_, listener) in self.listeners.iter_mut() {
            listener(event, window.as_deref_mut());
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<W> fmt::Debug for EventBus<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
