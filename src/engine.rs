use crate::browser;
use crate::content::preload::PreloadPlan;
use anyhow::{anyhow, Context, Error, Result};
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use futures::future::try_join_all;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref (unsafe) cast from Javascript type to Rust type
    // - because we control the closure creation and specify the expected type,
    // in principle this should be generally safe (unsafe) code
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self);
    fn draw(&self, renderer: &Renderer);
}

// length of a frame in milliseconds
const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

/// ┌─────────────────── Loop Lifetime ───────────────────┐
/// │ start()  : initialize (await) -> first raf request  │
/// │ raf tick : stopped? -> bail, else update* + draw    │
/// │ stop()   : flag + cancel pending raf + drop closure │
/// └─────────────────────────────────────────────────────┘
impl GameLoop {
    /// No frame is drawn before `game.initialize()` resolves
    pub async fn start(game: impl Game + 'static, renderer: Renderer) -> Result<LoopHandle> {
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let stopped = Rc::new(Cell::new(false));
        let frame_id = Rc::new(Cell::new(None));

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        let tick_stopped = stopped.clone();
        let tick_frame_id = frame_id.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            if tick_stopped.get() {
                return;
            }
            game_loop.accumulated_delta += (perf - game_loop.last_frame) as f32;
            while game_loop.accumulated_delta > FRAME_SIZE {
                game.update();
                game_loop.accumulated_delta -= FRAME_SIZE;
            }
            game_loop.last_frame = perf;
            game.draw(&renderer);

            if let Some(closure) = f.borrow().as_ref() {
                match browser::request_animation_frame(closure) {
                    Ok(id) => tick_frame_id.set(Some(id)),
                    Err(err) => error!("GameLoop: {:#}", err),
                }
            }
        }));

        let handle = LoopHandle {
            stopped,
            frame_id,
            closure: g,
        };
        let first = handle
            .closure
            .borrow()
            .as_ref()
            .ok_or_else(|| anyhow!("GameLoop: Loop is None"))
            .and_then(browser::request_animation_frame);
        match first {
            Ok(id) => {
                handle.frame_id.set(Some(id));
                Ok(handle)
            }
            Err(err) => {
                // the closure still points at its own slot
                handle.stop();
                Err(err)
            }
        }
    }
}

/// Owner of a running loop, dropping it without `stop()` leaves the loop
/// running
pub struct LoopHandle {
    stopped: Rc<Cell<bool>>,
    frame_id: Rc<Cell<Option<i32>>>,
    closure: SharedLoopClosure,
}

impl LoopHandle {
    pub fn stop(self) {
        self.stopped.set(true);
        if let Some(id) = self.frame_id.take() {
            if let Err(err) = browser::cancel_animation_frame(id) {
                error!("GameLoop: {:#}", err);
            }
        }
        // the closure holds an Rc to its own slot, taking it breaks the cycle
        drop(self.closure.borrow_mut().take());
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    /// Rect of `size` whose center sits on `center`
    pub fn centered_on(center: Point, size: Size) -> Self {
        Rect {
            position: Point {
                x: center.x - size.width * 0.5,
                y: center.y - size.height * 0.5,
            },
            size,
        }
    }
}

pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn new(context: CanvasRenderingContext2d) -> Self {
        Renderer { context }
    }

    pub fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.position.x.into(),
            rect.position.y.into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }

    /// Draw the whole image stretched into `destination`
    pub fn draw_image(&self, image: &HtmlImageElement, destination: &Rect) {
        if let Err(err) = self.context.draw_image_with_html_image_element_and_dw_and_dh(
            image,
            destination.position.x.into(),
            destination.position.y.into(),
            destination.size.width.into(),
            destination.size.height.into(),
        ) {
            error!("Renderer: draw_image failed {:#?}", err);
        }
    }
}

/// Decoded images keyed by asset key
#[derive(Default)]
pub struct ImageCache {
    images: HashMap<String, HtmlImageElement>,
}

impl ImageCache {
    pub fn get(&self, key: &str) -> Option<&HtmlImageElement> {
        self.images.get(key)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

pub fn natural_size(image: &HtmlImageElement) -> Size {
    Size {
        width: image.natural_width() as f32,
        height: image.natural_height() as f32,
    }
}

/// Load every request of the plan at once
/// - resolves when ALL images are decoded
/// - rejects on the FIRST failure, naming the key that failed
pub async fn load_batch(plan: &PreloadPlan) -> Result<ImageCache> {
    let loads = plan.requests().iter().map(|request| async move {
        let image = load_image(&request.path)
            .await
            .with_context(|| format!("asset '{}' ({})", request.key, request.path))?;
        Ok::<_, Error>((request.key.clone(), image))
    });
    let images = try_join_all(loads).await?.into_iter().collect();
    Ok(ImageCache { images })
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::create_html_image_element()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!("Error loading image: {:#?}", err)));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callback alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // ?? - double unwrap because Result<Result<(), Error>, oneshot::Canceled>
    // - first unwrap yields channel result : Result<(), Error>
    // - second unwrap yields image load result : () or propagating Error
    rx.await??;

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn centered_rect_straddles_its_center() {
        let rect = Rect::centered_on(
            Point { x: 400.0, y: 300.0 },
            Size {
                width: 200.0,
                height: 100.0,
            },
        );
        assert_relative_eq!(rect.position.x, 300.0);
        assert_relative_eq!(rect.position.y, 250.0);
        assert_eq!(rect.size.width, 200.0);
    }
}
