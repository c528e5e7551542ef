use crate::config::HostConfig;
use crate::content::ContentRegistry;
use crate::host::{ContainerClaim, EngineHandle, GameHost};
use crate::shell::{FadeIn, GameState, ShellAction, ShellView};
use anyhow::Result;
use std::cell::RefCell;
use std::rc::Rc;
use yew::prelude::*;

/// Lets code outside the component tree dispatch into the shell state
/// - actions sent before the component connects are queued, then replayed
#[derive(Clone, Default)]
pub struct Bridge(Rc<RefCell<BridgeSlot>>);

#[derive(Default)]
struct BridgeSlot {
    dispatcher: Option<UseReducerDispatcher<GameState>>,
    queued: Vec<ShellAction>,
}

impl PartialEq for Bridge {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Bridge {
    pub fn dispatch(&self, action: ShellAction) {
        let dispatcher = self.0.borrow().dispatcher.clone();
        match dispatcher {
            Some(dispatcher) => dispatcher.dispatch(action),
            None => self.0.borrow_mut().queued.push(action),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.0.borrow().dispatcher.is_some()
    }

    fn connect(&self, dispatcher: UseReducerDispatcher<GameState>) {
        let queued = {
            let mut slot = self.0.borrow_mut();
            slot.dispatcher = Some(dispatcher.clone());
            std::mem::take(&mut slot.queued)
        };
        for action in queued {
            dispatcher.dispatch(action);
        }
    }

    fn disconnect(&self) {
        self.0.borrow_mut().dispatcher = None;
    }
}

/// Container claim handed to the component, released by the same teardown
/// that destroys the engine
#[derive(Clone)]
pub struct ClaimSlot(Rc<RefCell<Option<ContainerClaim>>>);

impl PartialEq for ClaimSlot {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl ClaimSlot {
    pub fn new(claim: ContainerClaim) -> Self {
        ClaimSlot(Rc::new(RefCell::new(Some(claim))))
    }

    pub fn is_held(&self) -> bool {
        self.0.borrow().is_some()
    }

    fn release(&self) {
        drop(self.0.borrow_mut().take());
    }
}

#[derive(Properties, PartialEq)]
pub struct AppProps {
    pub registry: &'static ContentRegistry,
    pub config: Rc<HostConfig>,
    pub bridge: Bridge,
    pub claim: ClaimSlot,
}

/// ┌─────────────────────────── App Effects ────────────────────────────┐
/// │ on mount         : bridge.connect, GameHost::mount(EngineHandle)   │
/// │ on current_room  : GameHost::show_room -> next frame redraws       │
/// │ on unmount       : bridge.disconnect, GameHost::unmount, claim     │
/// └────────────────────────────────────────────────────────────────────┘
#[function_component(App)]
pub fn app(props: &AppProps) -> Html {
    let registry = props.registry;
    let state = use_reducer(move || GameState::new(registry));
    let host = use_mut_ref(GameHost::<EngineHandle>::new);

    {
        let bridge = props.bridge.clone();
        let dispatcher = state.dispatcher();
        use_effect_with((), move |_| {
            bridge.connect(dispatcher);
            move || bridge.disconnect()
        });
    }

    {
        let host = host.clone();
        let config = props.config.clone();
        let claim = props.claim.clone();
        let room = state.current_room.clone();
        use_effect_with((), move |_| {
            let mounted = host
                .borrow_mut()
                .mount(|| EngineHandle::create(&config, registry, &room));
            if let Err(err) = mounted {
                error!("App: could not mount the game : {:#}", err);
            }
            move || {
                host.borrow_mut().unmount();
                claim.release();
            }
        });
    }

    {
        let host = host.clone();
        use_effect_with(state.current_room.clone(), move |room| {
            if let Err(err) = redraw(&host.borrow(), room) {
                error!("App: {:#}", err);
            }
            || ()
        });
    }

    let view = ShellView::new(registry, &state);
    let container_style = format!(
        "width: {}px; height: {}px;",
        props.config.width, props.config.height
    );

    html! {
        <div class="flex flex-col items-center gap-4 p-4">
            <style>{ FadeIn::KEYFRAMES }</style>
            <h1 class="text-2xl font-bold">{ view.title.clone() }</h1>
            <p class="italic text-gray-600 text-center max-w-lg">{ view.story.clone() }</p>
            <p>{ format!("Current Room: {}", view.room_description) }</p>
            <div
                id={props.config.container_id.clone()}
                class="border border-gray-500"
                style={container_style}
            ></div>
            <div class="mt-4 p-4 border rounded-lg w-80 text-center">
                <h2 class="text-lg font-bold">{ "Inventory" }</h2>
                <ul>
                    { for view.inventory.iter().enumerate().map(|(index, label)| html! {
                        <li key={index.to_string()} class="text-lg">{ label.clone() }</li>
                    }) }
                </ul>
            </div>
            { message(view.message.as_deref(), FadeIn::default()) }
        </div>
    }
}

fn redraw(host: &GameHost<EngineHandle>, room: &str) -> Result<()> {
    // effect order puts this after mount, but a failed mount leaves no instance
    if !host.is_running() {
        return Ok(());
    }
    host.show_room(room)
}

fn message(text: Option<&str>, fade: FadeIn) -> Html {
    match text {
        // keyed by text so a new message fades in again
        Some(text) => html! {
            <p
                key={text.to_string()}
                class="mt-4 text-lg font-semibold text-green-600"
                style={fade.style()}
            >
                { text.to_string() }
            </p>
        },
        None => html! {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_wait_for_the_component() {
        let bridge = Bridge::default();
        bridge.dispatch(ShellAction::Say("hello".to_string()));
        bridge.dispatch(ShellAction::ClearMessage);
        assert!(!bridge.is_connected());
        assert_eq!(
            bridge.0.borrow().queued,
            [
                ShellAction::Say("hello".to_string()),
                ShellAction::ClearMessage
            ]
        );
    }

    #[test]
    fn released_slot_frees_the_container() {
        let slot = ClaimSlot::new(ContainerClaim::acquire("slot-test").unwrap());
        assert!(ContainerClaim::acquire("slot-test").is_err());

        slot.clone().release();
        assert!(!slot.is_held());
        assert!(ContainerClaim::acquire("slot-test").is_ok());
    }

    #[test]
    fn bridges_compare_by_identity() {
        let bridge = Bridge::default();
        assert!(bridge == bridge.clone());
        assert!(bridge != Bridge::default());
    }
}
