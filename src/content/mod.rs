// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                      Content Registry Layout                             │
// ├───────────────────────┬──────────────────────────────────────────────────┤
// │ content/registry.json │ Static table : rooms, authored items, template   │
// │ content/mod.rs        │ Parse + expand + validate -> ContentRegistry     │
// │ content/preload.rs    │ Registry -> PreloadPlan (key, path) per asset    │
// └───────────────────────┴──────────────────────────────────────────────────┘
use anyhow::{anyhow, ensure, Context, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub mod preload;

const EMBEDDED_REGISTRY: &str = include_str!("../../content/registry.json");

static REGISTRY: OnceCell<ContentRegistry> = OnceCell::new();

/// The embedded registry, parsed on first use and shared afterwards
pub fn registry() -> Result<&'static ContentRegistry> {
    REGISTRY.get_or_try_init(|| {
        ContentRegistry::from_json(EMBEDDED_REGISTRY).context("embedded content/registry.json")
    })
}

// ==================== Structs ====================
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Room {
    pub id: String,
    /// asset key of the background image
    pub background: String,
    pub description: String,
}

/// A vocabulary entry the player can carry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Item {
    pub japanese: String,
    pub romaji: String,
    pub english: String,
    #[serde(rename = "use")]
    pub usage: String,
    /// asset key of the item sprite
    pub sprite: String,
}

impl Item {
    /// "english (japanese)" as the inventory list shows it
    pub fn label(&self) -> String {
        format!("{} ({})", self.english, self.japanese)
    }
}

/// Generated entries share `usage` and `sprite`, only the labels carry
/// the running number (1 based)
#[derive(Debug, Clone, Deserialize, Serialize)]
struct PlaceholderTemplate {
    count: usize,
    japanese_prefix: String,
    romaji_prefix: String,
    english_prefix: String,
    #[serde(rename = "use")]
    usage: String,
    sprite: String,
}

impl PlaceholderTemplate {
    fn expand(&self) -> impl Iterator<Item = Item> + '_ {
        (1..=self.count).map(move |n| Item {
            japanese: format!("{}{}", self.japanese_prefix, n),
            romaji: format!("{}{}", self.romaji_prefix, n),
            english: format!("{}{}", self.english_prefix, n),
            usage: self.usage.clone(),
            sprite: self.sprite.clone(),
        })
    }
}

/// On disk shape of the registry, before placeholders are expanded
#[derive(Debug, Deserialize)]
struct RegistrySource {
    title: String,
    story: String,
    starting_room: String,
    rooms: Vec<Room>,
    items: Vec<Item>,
    placeholders: Option<PlaceholderTemplate>,
}

/// Read only rooms + items, fixed for the lifetime of the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRegistry {
    title: String,
    story: String,
    starting_room: String,
    rooms: Vec<Room>,
    items: Vec<Item>,
}

impl ContentRegistry {
    pub fn from_json(source: &str) -> Result<Self> {
        let source: RegistrySource =
            serde_json::from_str(source).context("registry is not valid JSON")?;

        let mut items = source.items;
        if let Some(template) = &source.placeholders {
            items.extend(template.expand());
        }

        let registry = ContentRegistry {
            title: source.title,
            story: source.story,
            starting_room: source.starting_room,
            rooms: source.rooms,
            items,
        };
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.rooms.is_empty(), "registry defines no rooms");

        let mut seen = HashSet::new();
        for room in &self.rooms {
            ensure!(!room.id.is_empty(), "room with empty id");
            ensure!(
                !room.background.is_empty() && !room.description.is_empty(),
                "room '{}' has an empty field",
                room.id
            );
            ensure!(seen.insert(room.id.as_str()), "duplicate room id '{}'", room.id);
        }

        for (index, item) in self.items.iter().enumerate() {
            let fields = [
                &item.japanese,
                &item.romaji,
                &item.english,
                &item.usage,
                &item.sprite,
            ];
            ensure!(
                fields.iter().all(|field| !field.is_empty()),
                "item #{} ('{}') has an empty field",
                index,
                item.english
            );
        }

        self.room(&self.starting_room).ok_or_else(|| {
            anyhow!(
                "starting room '{}' is not a registered room",
                self.starting_room
            )
        })?;
        Ok(())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn story(&self) -> &str {
        &self.story
    }

    pub fn starting_room(&self) -> &str {
        &self.starting_room
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }
}
