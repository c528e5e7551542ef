use crate::config::HostConfig;
use crate::content::preload::PreloadPlan;
use crate::content::ContentRegistry;
use crate::engine::{self, Game, ImageCache, Point, Rect, Renderer, Size};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::cell::RefCell;
use std::rc::Rc;

/// Room id the scene draws, written by the host and read every frame
pub type SharedRoom = Rc<RefCell<String>>;

/// TABLE
/// ┌──────────────────────── Scene Lifecycle ───────────────────────────┐
/// │                                                                    │
/// │   ┌──────────────┐  initialize()  ┌──────────────┐                 │
/// │   │   Loading    ├───────────────►│    Loaded    │                 │
/// │   │ PreloadPlan  │  load_batch()  │  ImageCache  │                 │
/// │   └──────────────┘                └──────┬───────┘                 │
/// │                                          │ draw() every frame      │
/// │                                          ▼                         │
/// │                            background of *room at (center, scale)  │
/// │                                                                    │
/// └────────────────────────────────────────────────────────────────────┘
pub enum CabinScene {
    /// Assets requested, nothing drawable yet
    Loading(Pending),

    /// Every image of the plan is decoded
    Loaded(Stage),
}

pub struct Pending {
    plan: PreloadPlan,
    layout: Layout,
}

pub struct Stage {
    images: ImageCache,
    layout: Layout,
}

/// Where and how big the background goes, plus which room to show
#[derive(Clone)]
struct Layout {
    registry: &'static ContentRegistry,
    room: SharedRoom,
    canvas: Size,
    center: Point,
    scale: f32,
}

impl CabinScene {
    pub fn new(config: &HostConfig, registry: &'static ContentRegistry, room: SharedRoom) -> Self {
        let plan = PreloadPlan::from_registry(registry, &config.assets);
        Self::with_plan(plan, config, registry, room)
    }

    /// The plan must hold every background the registry's rooms name,
    /// missing ones are simply not drawn
    pub fn with_plan(
        plan: PreloadPlan,
        config: &HostConfig,
        registry: &'static ContentRegistry,
        room: SharedRoom,
    ) -> Self {
        let (x, y) = config.background_center;
        CabinScene::Loading(Pending {
            plan,
            layout: Layout {
                registry,
                room,
                canvas: Size {
                    width: config.width as f32,
                    height: config.height as f32,
                },
                center: Point { x, y },
                scale: config.background_scale,
            },
        })
    }
}

#[async_trait(?Send)]
impl Game for CabinScene {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            CabinScene::Loading(pending) => {
                let images = engine::load_batch(&pending.plan)
                    .await
                    .context("Failed to preload scene assets")?;
                log!(
                    "CabinScene: {} of {} assets ready",
                    images.len(),
                    pending.plan.len()
                );
                Ok(Box::new(CabinScene::Loaded(Stage {
                    images,
                    layout: pending.layout.clone(),
                })))
            }
            CabinScene::Loaded(_) => Err(anyhow!("Scene is already initialized")),
        }
    }

    // the scene is static, room changes are picked up in draw()
    fn update(&mut self) {}

    fn draw(&self, renderer: &Renderer) {
        if let CabinScene::Loaded(stage) = self {
            let layout = &stage.layout;
            renderer.clear(&Rect::new(Point { x: 0.0, y: 0.0 }, layout.canvas));

            let room_id = layout.room.borrow();
            let Some(room) = layout.registry.room(&room_id) else {
                return;
            };
            if let Some(image) = stage.images.get(&room.background) {
                let destination = placement(layout.center, engine::natural_size(image), layout.scale);
                renderer.draw_image(image, &destination);
            }
        }
    }
}

/// Destination of an image scaled uniformly around `center`
pub fn placement(center: Point, natural: Size, scale: f32) -> Rect {
    Rect::centered_on(
        center,
        Size {
            width: natural.width * scale,
            height: natural.height * scale,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::registry;
    use approx::assert_relative_eq;

    #[test]
    fn background_is_scaled_around_the_canvas_center() {
        let rect = placement(
            Point { x: 400.0, y: 300.0 },
            Size {
                width: 800.0,
                height: 600.0,
            },
            1.1,
        );
        assert_relative_eq!(rect.size.width, 880.0, epsilon = 1e-3);
        assert_relative_eq!(rect.size.height, 660.0, epsilon = 1e-3);
        assert_relative_eq!(rect.position.x, -40.0, epsilon = 1e-3);
        assert_relative_eq!(rect.position.y, -30.0, epsilon = 1e-3);
    }

    #[test]
    fn unit_scale_keeps_natural_size() {
        let natural = Size {
            width: 64.0,
            height: 32.0,
        };
        let rect = placement(Point { x: 0.0, y: 0.0 }, natural, 1.0);
        assert_eq!(rect.size, natural);
    }

    #[test]
    fn new_scene_starts_loading_with_the_full_plan() {
        let registry = registry().unwrap();
        let room = Rc::new(RefCell::new(registry.starting_room().to_string()));
        let scene = CabinScene::new(&HostConfig::default(), registry, room);
        match scene {
            CabinScene::Loading(pending) => {
                assert!(pending.plan.contains("cabin-optimized"));
                assert!(pending.plan.contains("generic-optimized"));
                assert_relative_eq!(pending.layout.scale, 1.1);
                assert_eq!(pending.layout.center, Point { x: 400.0, y: 300.0 });
            }
            CabinScene::Loaded(_) => panic!("scene must start in Loading"),
        }
    }
}
