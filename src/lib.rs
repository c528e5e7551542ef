// ==================== Imports ====================
use crate::config::HostConfig;
use crate::content::ContentRegistry;
use crate::host::ContainerClaim;
use crate::shell::app::{App, AppProps, Bridge, ClaimSlot};
use crate::shell::ShellAction;
use crate::sound::{SoundBoard, SoundEffect};
use anyhow::{anyhow, Result};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;
use web_sys::Element;
use yew::AppHandle;

#[macro_use]
mod browser;
pub mod config;
pub mod content;
pub mod engine;
pub mod game;
pub mod host;
pub mod shell;
pub mod sound;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - mounts the shell into <body> with the default config
/// - returns the handle so the page can drive it
#[wasm_bindgen]
pub fn main_js() -> Result<GameShell, JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    let root = browser::body().map_err(browser::to_js_error)?;
    GameShell::mount(root, HostConfig::default()).map_err(browser::to_js_error)
}

/// Mount into the element `root_id`
/// - `config` may be undefined/null, or any subset of HostConfig fields
#[wasm_bindgen]
pub fn mount(root_id: &str, config: JsValue) -> Result<GameShell, JsValue> {
    console_error_panic_hook::set_once();

    let config = if config.is_undefined() || config.is_null() {
        HostConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)
            .map_err(|err| JsValue::from_str(&format!("invalid config : {}", err)))?
    };
    let root = browser::element_by_id(root_id).map_err(browser::to_js_error)?;
    GameShell::mount(root, config).map_err(browser::to_js_error)
}

/// Page side handle of a mounted shell
#[wasm_bindgen]
pub struct GameShell {
    app: Option<AppHandle<App>>,
    bridge: Bridge,
    registry: &'static ContentRegistry,
    sounds: SoundBoard,
}

impl GameShell {
    fn mount(root: Element, config: HostConfig) -> Result<Self> {
        config.validate()?;
        let registry = content::registry()?;
        let claim = ContainerClaim::acquire(&config.container_id)?;
        log!("GameShell: mounting on '{}'", claim.id());
        let bridge = Bridge::default();
        let sounds = SoundBoard::new(config.audio.clone());
        let props = AppProps {
            registry,
            config: Rc::new(config),
            bridge: bridge.clone(),
            claim: ClaimSlot::new(claim),
        };
        let app = yew::Renderer::<App>::with_root_and_props(root, props).render();
        Ok(GameShell {
            app: Some(app),
            bridge,
            registry,
            sounds,
        })
    }

    fn send(&self, action: ShellAction) -> Result<()> {
        if self.app.is_none() {
            return Err(anyhow!("shell is unmounted"));
        }
        self.bridge.dispatch(action);
        Ok(())
    }

    fn item(&self, index: usize) -> Result<ShellAction> {
        self.registry
            .items()
            .get(index)
            .map(|item| ShellAction::Collect(item.clone()))
            .ok_or_else(|| {
                anyhow!(
                    "no item #{} (registry holds {})",
                    index,
                    self.registry.items().len()
                )
            })
    }
}

#[wasm_bindgen]
impl GameShell {
    /// Switch rooms, the canvas follows on the next frame
    pub fn enter_room(&self, room: &str) -> Result<(), JsValue> {
        self.registry
            .room(room)
            .ok_or_else(|| anyhow!("unknown room '{}'", room))
            .and_then(|room| self.send(ShellAction::EnterRoom(room.id.clone())))
            .map_err(browser::to_js_error)
    }

    /// Add registry item `index` to the inventory
    pub fn collect(&self, index: usize) -> Result<(), JsValue> {
        self.item(index)
            .and_then(|action| self.send(action))
            .map_err(browser::to_js_error)
    }

    pub fn say(&self, message: &str) -> Result<(), JsValue> {
        self.send(ShellAction::Say(message.to_string()))
            .map_err(browser::to_js_error)
    }

    pub fn clear_message(&self) -> Result<(), JsValue> {
        self.send(ShellAction::ClearMessage)
            .map_err(browser::to_js_error)
    }

    /// click | success | fail | eerie
    pub fn play_sound(&self, name: &str) -> Result<(), JsValue> {
        name.parse::<SoundEffect>()
            .and_then(|effect| self.sounds.play(effect))
            .map_err(browser::to_js_error)
    }

    /// Tear down the UI, which destroys the engine instance with it and
    /// then frees the container id
    pub fn unmount(&mut self) {
        if let Some(app) = self.app.take() {
            app.destroy();
            log!("GameShell: unmounted");
        }
    }
}
