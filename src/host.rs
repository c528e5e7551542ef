use crate::browser;
use crate::config::HostConfig;
use crate::content::ContentRegistry;
use crate::engine::{GameLoop, LoopHandle, Renderer};
use crate::game::{CabinScene, SharedRoom};
use anyhow::{anyhow, bail, Result};
use once_cell::sync::Lazy;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Mutex;
use web_sys::HtmlCanvasElement;

/// ELI5:
/// ┌──────────────── Host State Transition Flow ─────────────┐
/// │  From State  →  Event     →  To State                   │
/// ├─────────────────────────────────────────────────────────┤
/// │  Absent      →  mount     →  Running (new instance)     │
/// │  Running     →  mount     →  Running (ignored)          │
/// │  Running     →  unmount   →  Absent  (destroyed)        │
/// │  Absent      →  unmount   →  Absent                     │
/// └─────────────────────────────────────────────────────────┘
pub trait EngineInstance {
    fn show_room(&self, room: &str) -> Result<()>;
    fn destroy(self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    Created,
    AlreadyRunning,
}

/// Sole owner of the engine instance, at most one at a time
pub struct GameHost<E: EngineInstance> {
    instance: Option<E>,
}

impl<E: EngineInstance> Default for GameHost<E> {
    fn default() -> Self {
        GameHost { instance: None }
    }
}

impl<E: EngineInstance> GameHost<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// `create` only runs when no instance is held
    pub fn mount(&mut self, create: impl FnOnce() -> Result<E>) -> Result<MountOutcome> {
        if self.instance.is_some() {
            log!("GameHost: already running, mount ignored");
            return Ok(MountOutcome::AlreadyRunning);
        }
        self.instance = Some(create()?);
        Ok(MountOutcome::Created)
    }

    /// Returns whether an instance was destroyed
    pub fn unmount(&mut self) -> bool {
        match self.instance.take() {
            Some(instance) => {
                instance.destroy();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.instance.is_some()
    }

    pub fn show_room(&self, room: &str) -> Result<()> {
        self.instance
            .as_ref()
            .ok_or_else(|| anyhow!("no engine instance to show '{}'", room))?
            .show_room(room)
    }
}

pub trait Stop {
    fn stop(self);
}

impl Stop for LoopHandle {
    fn stop(self) {
        LoopHandle::stop(self)
    }
}

/// Loading is async, so destroy can land before the loop exists
/// ┌────────────┬───────────────┬─────────────────────────────┐
/// │ State      │ started(loop) │ destroy()                   │
/// ├────────────┼───────────────┼─────────────────────────────┤
/// │ Loading    │ -> Running    │ -> Destroyed                │
/// │ Running    │ stop new loop │ stop loop, -> Destroyed     │
/// │ Destroyed  │ stop new loop │ no-op                       │
/// └────────────┴───────────────┴─────────────────────────────┘
pub enum Lifecycle<L: Stop> {
    Loading,
    Running(L),
    Destroyed,
}

impl<L: Stop> Lifecycle<L> {
    /// Returns false if the loop was refused (and stopped)
    pub fn started(&mut self, game_loop: L) -> bool {
        match self {
            Lifecycle::Loading => {
                *self = Lifecycle::Running(game_loop);
                true
            }
            Lifecycle::Running(_) | Lifecycle::Destroyed => {
                game_loop.stop();
                false
            }
        }
    }

    pub fn destroy(&mut self) {
        if let Lifecycle::Running(game_loop) = std::mem::replace(self, Lifecycle::Destroyed) {
            game_loop.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Lifecycle::Running(_))
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self, Lifecycle::Destroyed)
    }
}

/// The canvas plus the loop drawing on it
pub struct EngineHandle {
    canvas: HtmlCanvasElement,
    room: SharedRoom,
    registry: &'static ContentRegistry,
    lifecycle: Rc<RefCell<Lifecycle<LoopHandle>>>,
}

impl EngineHandle {
    /// Attach a canvas to the container and start loading the scene in the
    /// background. Returns before any asset has loaded.
    pub fn create(config: &HostConfig, registry: &'static ContentRegistry, room: &str) -> Result<Self> {
        config.validate()?;
        registry
            .room(room)
            .ok_or_else(|| anyhow!("unknown room '{}'", room))?;

        let canvas = browser::create_canvas(&config.container_id, config.width, config.height)?;
        let renderer = Renderer::new(browser::context(&canvas)?);
        let room: SharedRoom = Rc::new(RefCell::new(room.to_string()));
        let lifecycle = Rc::new(RefCell::new(Lifecycle::Loading));

        let scene = CabinScene::new(config, registry, room.clone());
        let pending = lifecycle.clone();
        browser::spawn_local(async move {
            match GameLoop::start(scene, renderer).await {
                Ok(game_loop) => {
                    if !pending.borrow_mut().started(game_loop) {
                        log!("EngineHandle: destroyed while loading, loop discarded");
                    }
                }
                Err(err) => error!("EngineHandle: scene failed to start : {:#}", err),
            }
        });
        log!("EngineHandle: canvas attached to '{}'", config.container_id);

        Ok(EngineHandle {
            canvas,
            room,
            registry,
            lifecycle,
        })
    }
}

impl EngineInstance for EngineHandle {
    fn show_room(&self, room: &str) -> Result<()> {
        self.registry
            .room(room)
            .ok_or_else(|| anyhow!("unknown room '{}'", room))?;
        *self.room.borrow_mut() = room.to_string();
        Ok(())
    }

    fn destroy(self) {
        self.lifecycle.borrow_mut().destroy();
        self.canvas.remove();
        log!("EngineHandle: destroyed");
    }
}

/// Container ids that currently hold a mounted shell, page wide
static CLAIMED_CONTAINERS: Lazy<Mutex<HashSet<String>>> = Lazy::new(Default::default);

/// Exclusive use of one game container id across every shell on the page,
/// released on drop
#[derive(Debug)]
pub struct ContainerClaim {
    id: String,
}

impl ContainerClaim {
    pub fn acquire(id: &str) -> Result<Self> {
        let mut claimed = CLAIMED_CONTAINERS
            .lock()
            .map_err(|_| anyhow!("container registry poisoned"))?;
        if !claimed.insert(id.to_string()) {
            bail!("container '{}' already hosts a game", id);
        }
        Ok(ContainerClaim { id: id.to_string() })
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for ContainerClaim {
    fn drop(&mut self) {
        if let Ok(mut claimed) = CLAIMED_CONTAINERS.lock() {
            claimed.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Counters {
        created: Cell<u32>,
        destroyed: Cell<u32>,
        stopped: Cell<u32>,
        last_room: RefCell<String>,
    }

    struct FakeEngine(Rc<Counters>);

    impl FakeEngine {
        fn create(counters: &Rc<Counters>) -> Result<Self> {
            counters.created.set(counters.created.get() + 1);
            Ok(FakeEngine(counters.clone()))
        }
    }

    impl EngineInstance for FakeEngine {
        fn show_room(&self, room: &str) -> Result<()> {
            *self.0.last_room.borrow_mut() = room.to_string();
            Ok(())
        }

        fn destroy(self) {
            self.0.destroyed.set(self.0.destroyed.get() + 1);
        }
    }

    struct FakeLoop(Rc<Counters>);

    impl Stop for FakeLoop {
        fn stop(self) {
            self.0.stopped.set(self.0.stopped.get() + 1);
        }
    }

    #[test]
    fn second_mount_does_not_create_another_instance() {
        let counters = Rc::new(Counters::default());
        let mut host = GameHost::new();

        assert_eq!(
            host.mount(|| FakeEngine::create(&counters)).unwrap(),
            MountOutcome::Created
        );
        assert_eq!(
            host.mount(|| FakeEngine::create(&counters)).unwrap(),
            MountOutcome::AlreadyRunning
        );
        assert_eq!(counters.created.get(), 1);
        assert!(host.is_running());
    }

    #[test]
    fn unmount_destroys_and_allows_a_fresh_mount() {
        let counters = Rc::new(Counters::default());
        let mut host = GameHost::new();
        host.mount(|| FakeEngine::create(&counters)).unwrap();

        assert!(host.unmount());
        assert!(!host.unmount());
        assert_eq!(counters.destroyed.get(), 1);
        assert!(!host.is_running());

        host.mount(|| FakeEngine::create(&counters)).unwrap();
        assert_eq!(counters.created.get(), 2);
    }

    #[test]
    fn failed_creation_leaves_host_absent() {
        let mut host: GameHost<FakeEngine> = GameHost::new();
        assert!(host.mount(|| Err(anyhow!("no container"))).is_err());
        assert!(!host.is_running());
    }

    #[test]
    fn show_room_needs_a_running_instance() {
        let counters = Rc::new(Counters::default());
        let mut host = GameHost::new();
        assert!(host.show_room("hallway").is_err());

        host.mount(|| FakeEngine::create(&counters)).unwrap();
        host.show_room("hallway").unwrap();
        assert_eq!(*counters.last_room.borrow(), "hallway");
    }

    #[test]
    fn destroy_stops_a_running_loop_once() {
        let counters = Rc::new(Counters::default());
        let mut lifecycle = Lifecycle::Loading;
        assert!(lifecycle.started(FakeLoop(counters.clone())));
        assert!(lifecycle.is_running());

        lifecycle.destroy();
        lifecycle.destroy();
        assert!(lifecycle.is_destroyed());
        assert_eq!(counters.stopped.get(), 1);
    }

    #[test]
    fn loop_finishing_after_destroy_is_stopped_at_once() {
        let counters = Rc::new(Counters::default());
        let mut lifecycle: Lifecycle<FakeLoop> = Lifecycle::Loading;
        lifecycle.destroy();

        assert!(!lifecycle.started(FakeLoop(counters.clone())));
        assert!(lifecycle.is_destroyed());
        assert_eq!(counters.stopped.get(), 1);
    }

    #[test]
    fn a_container_is_claimed_once_at_a_time() {
        let first = ContainerClaim::acquire("claim-test-a").unwrap();
        let err = ContainerClaim::acquire("claim-test-a").unwrap_err();
        assert!(err.to_string().contains("claim-test-a"));

        // other ids are independent
        let other = ContainerClaim::acquire("claim-test-b").unwrap();
        assert_eq!(other.id(), "claim-test-b");

        drop(first);
        let again = ContainerClaim::acquire("claim-test-a").unwrap();
        assert_eq!(again.id(), "claim-test-a");
    }
}
