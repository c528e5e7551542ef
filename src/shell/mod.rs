// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                         Shell Data Flow                                  │
// ├──────────────────┬───────────────────────────────────────────────────────┤
// │ ShellAction      │ EnterRoom | Collect | Say | ClearMessage              │
// │   ▼ reduce()     │                                                       │
// │ GameState        │ current_room, inventory, message                      │
// │   ▼ new()        │                                                       │
// │ ShellView        │ plain strings, ready for html!                        │
// │   ▼              │                                                       │
// │ app::App         │ yew component + GameHost effects                      │
// └──────────────────┴───────────────────────────────────────────────────────┘
use crate::content::{ContentRegistry, Item};
use std::rc::Rc;
use yew::Reducible;

pub mod app;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub current_room: String,
    pub inventory: Vec<Item>,
    /// empty means no message
    pub message: String,
}

impl GameState {
    pub fn new(registry: &ContentRegistry) -> Self {
        GameState {
            current_room: registry.starting_room().to_string(),
            inventory: Vec::new(),
            message: String::new(),
        }
    }

    fn apply(&mut self, action: ShellAction) {
        match action {
            ShellAction::EnterRoom(room) => self.current_room = room,
            ShellAction::Collect(item) => self.inventory.push(item),
            ShellAction::Say(message) => self.message = message,
            ShellAction::ClearMessage => self.message.clear(),
        }
    }
}

/// Room ids are checked against the registry before an action is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellAction {
    EnterRoom(String),
    Collect(Item),
    Say(String),
    ClearMessage,
}

impl Reducible for GameState {
    type Action = ShellAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        next.apply(action);
        Rc::new(next)
    }
}

/// What the page shows, derived from registry + state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellView {
    pub title: String,
    pub story: String,
    pub room_description: String,
    pub inventory: Vec<String>,
    pub message: Option<String>,
}

impl ShellView {
    pub fn new(registry: &ContentRegistry, state: &GameState) -> Self {
        ShellView {
            title: registry.title().to_string(),
            story: registry.story().to_string(),
            room_description: registry
                .room(&state.current_room)
                .map(|room| room.description.clone())
                .unwrap_or_default(),
            inventory: state.inventory.iter().map(Item::label).collect(),
            message: Some(state.message.clone()).filter(|message| !message.is_empty()),
        }
    }
}

/// Opacity 0 -> 1 once, when the element is inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeIn {
    pub duration_ms: u32,
}

impl Default for FadeIn {
    fn default() -> Self {
        FadeIn { duration_ms: 500 }
    }
}

impl FadeIn {
    pub const KEYFRAMES: &'static str =
        "@keyframes cabin-fade-in { from { opacity: 0; } to { opacity: 1; } }";

    pub fn style(&self) -> String {
        format!(
            "opacity: 0; animation: cabin-fade-in {}ms ease-in-out forwards;",
            self.duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::registry;

    fn key() -> Item {
        registry().unwrap().items()[0].clone()
    }

    fn reduce(state: GameState, action: ShellAction) -> GameState {
        (*Rc::new(state).reduce(action)).clone()
    }

    #[test]
    fn initial_state_is_empty_in_the_cabin() {
        let state = GameState::new(registry().unwrap());
        assert_eq!(state.current_room, "cabin");
        assert!(state.inventory.is_empty());
        assert!(state.message.is_empty());
    }

    #[test]
    fn empty_inventory_renders_no_labels() {
        let registry = registry().unwrap();
        let view = ShellView::new(registry, &GameState::new(registry));
        assert!(view.inventory.is_empty());
        assert_eq!(view.message, None);
        assert_eq!(view.title, "Mysterious Cabin");
        assert_eq!(view.room_description, "A cozy but mysterious wooden cabin.");
    }

    #[test]
    fn collected_item_is_labelled_english_then_japanese() {
        let registry = registry().unwrap();
        let state = reduce(GameState::new(registry), ShellAction::Collect(key()));
        let view = ShellView::new(registry, &state);
        assert_eq!(view.inventory, vec!["key (鍵)".to_string()]);
    }

    #[test]
    fn inventory_keeps_collection_order_and_duplicates() {
        let registry = registry().unwrap();
        let book = registry.items()[1].clone();
        let mut state = GameState::new(registry);
        for item in [key(), book, key()] {
            state = reduce(state, ShellAction::Collect(item));
        }
        let view = ShellView::new(registry, &state);
        assert_eq!(view.inventory, ["key (鍵)", "book (本)", "key (鍵)"]);
    }

    #[test]
    fn entering_a_room_changes_the_description() {
        let registry = registry().unwrap();
        let state = reduce(
            GameState::new(registry),
            ShellAction::EnterRoom("library".to_string()),
        );
        let view = ShellView::new(registry, &state);
        assert_eq!(
            view.room_description,
            "Shelves lined with books, some of which may hold secrets."
        );
    }

    #[test]
    fn message_shows_until_cleared() {
        let registry = registry().unwrap();
        let state = reduce(
            GameState::new(registry),
            ShellAction::Say("You found a key!".to_string()),
        );
        assert_eq!(
            ShellView::new(registry, &state).message.as_deref(),
            Some("You found a key!")
        );

        let state = reduce(state, ShellAction::ClearMessage);
        assert_eq!(ShellView::new(registry, &state).message, None);
    }

    #[test]
    fn fade_lasts_half_a_second() {
        let style = FadeIn::default().style();
        assert!(style.contains("cabin-fade-in 500ms"));
        assert!(FadeIn::KEYFRAMES.contains("cabin-fade-in"));
    }
}
