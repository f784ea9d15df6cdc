//! Double-buffered rendering of compiled specs through an external engine.
//!
//! Two output slots exist and exactly one is visible. A render draws into the
//! hidden slot and swaps only once the engine is done, so the visible chart
//! never blanks. Only the most recent request may become visible: every new
//! request aborts the one in flight, and the abort flag is checked at each
//! suspension point.

use crate::interaction::{
    listener_plan, EventHandler, InteractionCoordinator, Listener, PointerEvent, SceneItem, SignalHandler,
};
use crate::ir::{ChartConfig, ChartSpec};
use crate::Theme;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// How long the outgoing view stays alive after a swap.
pub const TRANSITION_WINDOW: Duration = Duration::from_millis(300);

pub type ListenerId = u64;

// =============================================================================
// Engine boundary
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::A => "chart-a",
            Slot::B => "chart-b",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOptions {
    pub renderer: &'static str,
    pub theme: Theme,
}

#[async_trait]
pub trait Engine: Send + Sync {
    async fn embed(&self, slot: Slot, spec: &ChartSpec, options: EmbedOptions) -> Result<Arc<dyn View>>;
}

#[async_trait]
pub trait View: Send + Sync {
    async fn finalize(&self);
    fn add_event_listener(&self, event: &str, handler: EventHandler) -> ListenerId;
    fn remove_event_listener(&self, id: ListenerId);
    fn add_signal_listener(&self, signal: &str, handler: SignalHandler) -> ListenerId;
    fn remove_signal_listener(&self, id: ListenerId);
    async fn to_image_url(&self, format: &str, scale: f64) -> Result<String>;
}

// =============================================================================
// Render bookkeeping
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub config: ChartConfig,
    pub theme: Theme,
    pub mobile: bool,
    /// Render even when the spec is unchanged.
    pub force: bool,
}

/// What a call to [`RenderController::render`] ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Same spec as the visible one, nothing done.
    Unchanged,
    Rendered,
    /// Superseded by a newer request or by cleanup.
    Aborted,
    Failed,
}

/// Visible slot and whether the previous view is still being retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStatus {
    pub active: Slot,
    pub transitioning: bool,
}

pub type StatusCallback = Box<dyn Fn(RenderStatus) + Send + Sync>;

#[derive(Debug)]
struct RenderOperation {
    id: u64,
    target: Slot,
    aborted: AtomicBool,
}

impl RenderOperation {
    fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy)]
enum AttachedListener {
    Event(ListenerId),
    Signal(ListenerId),
}

/// A view living in a slot, with the listeners attached to it.
struct Mounted {
    view: Arc<dyn View>,
    listeners: Vec<AttachedListener>,
    generation: u64,
}

impl Mounted {
    async fn dispose(self) {
        for listener in self.listeners {
            match listener {
                AttachedListener::Event(id) => self.view.remove_event_listener(id),
                AttachedListener::Signal(id) => self.view.remove_signal_listener(id),
            }
        }
        self.view.finalize().await;
    }
}

struct State {
    active: Slot,
    transitioning: bool,
    slots: [Option<Mounted>; 2],
    current: Option<Arc<RenderOperation>>,
    counter: u64,
    /// Operation that performed the most recent swap.
    last_swap: u64,
    last_fingerprint: Option<String>,
}

impl State {
    fn status(&self) -> RenderStatus {
        RenderStatus {
            active: self.active,
            transitioning: self.transitioning,
        }
    }
}

struct Inner {
    engine: Arc<dyn Engine>,
    interactions: Arc<Mutex<InteractionCoordinator>>,
    state: Mutex<State>,
    on_change: Mutex<Option<StatusCallback>>,
}

impl Inner {
    fn notify(&self, status: RenderStatus) {
        if let Some(callback) = self.on_change.lock().as_ref() {
            callback(status);
        }
    }
}

/// Clears the in-flight marker however the render exits.
struct OperationGuard<'a> {
    inner: &'a Inner,
    id: u64,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        if state.current.as_ref().is_some_and(|op| op.id == self.id) {
            state.current = None;
        }
    }
}

fn attach_listeners(
    view: &dyn View,
    plan: &[Listener],
    interactions: &Arc<Mutex<InteractionCoordinator>>,
) -> Vec<AttachedListener> {
    plan.iter()
        .map(|listener| match *listener {
            Listener::Event(event) => {
                let coordinator = Arc::clone(interactions);
                let handler: EventHandler = Arc::new(move |ev: &PointerEvent, item: Option<&SceneItem>| {
                    coordinator.lock().handle_point_click(ev, item)
                });
                AttachedListener::Event(view.add_event_listener(event, handler))
            }
            Listener::Signal(signal) => {
                let coordinator = Arc::clone(interactions);
                let handler: SignalHandler =
                    Arc::new(move |_: &str, value: &Value| coordinator.lock().handle_brush(value));
                AttachedListener::Signal(view.add_signal_listener(signal, handler))
            }
        })
        .collect()
}

// =============================================================================
// Controller
// =============================================================================

#[derive(Clone)]
pub struct RenderController {
    inner: Arc<Inner>,
}

impl RenderController {
    pub fn new(engine: Arc<dyn Engine>, interactions: Arc<Mutex<InteractionCoordinator>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                interactions,
                state: Mutex::new(State {
                    active: Slot::A,
                    transitioning: false,
                    slots: [None, None],
                    current: None,
                    counter: 0,
                    last_swap: 0,
                    last_fingerprint: None,
                }),
                on_change: Mutex::new(None),
            }),
        }
    }

    pub fn on_change(&self, callback: impl Fn(RenderStatus) + Send + Sync + 'static) {
        *self.inner.on_change.lock() = Some(Box::new(callback));
    }

    pub fn status(&self) -> RenderStatus {
        self.inner.state.lock().status()
    }

    /// Whether a render is in flight.
    pub fn is_rendering(&self) -> bool {
        self.inner.state.lock().current.is_some()
    }

    pub async fn render(&self, spec: &ChartSpec, options: RenderOptions) -> RenderOutcome {
        let fingerprint = spec.fingerprint();
        let op = {
            let mut state = self.inner.state.lock();
            if !options.force && state.last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
                debug!("spec unchanged, skipping render");
                return RenderOutcome::Unchanged;
            }
            state.counter += 1;
            if let Some(previous) = state.current.take() {
                debug!(superseded = previous.id, "aborting in-flight render");
                previous.abort();
            }
            let op = Arc::new(RenderOperation {
                id: state.counter,
                target: state.active.other(),
                aborted: AtomicBool::new(false),
            });
            state.current = Some(Arc::clone(&op));
            op
        };

        let _guard = OperationGuard {
            inner: &self.inner,
            id: op.id,
        };
        match self.run(&op, spec, options, fingerprint).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(operation = op.id, slot = %op.target, "chart render failed: {:#}", err);
                RenderOutcome::Failed
            }
        }
    }

    async fn run(
        &self,
        op: &RenderOperation,
        spec: &ChartSpec,
        options: RenderOptions,
        fingerprint: String,
    ) -> Result<RenderOutcome> {
        if op.is_aborted() {
            return Ok(RenderOutcome::Aborted);
        }

        let embed = EmbedOptions {
            renderer: "canvas",
            theme: options.theme,
        };
        let view = self.inner.engine.embed(op.target, spec, embed).await?;

        if op.is_aborted() {
            view.finalize().await;
            return Ok(RenderOutcome::Aborted);
        }
        tokio::task::yield_now().await;
        if op.is_aborted() {
            view.finalize().await;
            return Ok(RenderOutcome::Aborted);
        }

        let plan = listener_plan(&options.config, options.mobile);
        let listeners = attach_listeners(view.as_ref(), &plan, &self.inner.interactions);
        let mounted = Mounted {
            view,
            listeners,
            generation: op.id,
        };

        // Aborts are raised under the state lock, so this check and the swap
        // cannot interleave with a newer render or a cleanup.
        let swapped = {
            let mut state = self.inner.state.lock();
            if op.is_aborted() {
                Err(mounted)
            } else {
                let outgoing = state.active;
                let outgoing_generation = state.slots[outgoing.index()].as_ref().map(|m| m.generation);
                let replaced = state.slots[op.target.index()].replace(mounted);
                state.active = op.target;
                state.transitioning = true;
                state.last_swap = op.id;
                state.last_fingerprint = Some(fingerprint);
                Ok((replaced, (outgoing, outgoing_generation), state.status()))
            }
        };
        let (replaced, outgoing, status) = match swapped {
            Ok(swap) => swap,
            Err(orphan) => {
                debug!(operation = op.id, "render aborted before swap");
                orphan.dispose().await;
                return Ok(RenderOutcome::Aborted);
            }
        };

        self.inner.interactions.lock().set_config(options.config);
        info!(operation = op.id, slot = %op.target, "chart swapped in");
        self.inner.notify(status);

        if let Some(stale) = replaced {
            stale.dispose().await;
        }
        self.schedule_disposal(op.id, outgoing.0, outgoing.1);
        Ok(RenderOutcome::Rendered)
    }

    /// Retire the view in `slot` once the transition window has passed,
    /// unless a newer render has taken the slot over.
    fn schedule_disposal(&self, swap: u64, slot: Slot, generation: Option<u64>) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(TRANSITION_WINDOW).await;
            let (stale, status) = {
                let mut state = inner.state.lock();
                let unchanged = generation.is_some()
                    && state.slots[slot.index()].as_ref().map(|m| m.generation) == generation
                    && state.active != slot;
                let stale = if unchanged {
                    state.slots[slot.index()].take()
                } else {
                    None
                };
                if state.last_swap == swap {
                    state.transitioning = false;
                }
                (stale, state.status())
            };
            if let Some(mounted) = stale {
                debug!(slot = %slot, "disposing previous view");
                mounted.dispose().await;
            }
            inner.notify(status);
        });
    }

    /// PNG of the visible chart as a data URL.
    pub async fn export_png(&self, scale: f64) -> Result<String> {
        let view = {
            let state = self.inner.state.lock();
            state.slots[state.active.index()]
                .as_ref()
                .map(|m| Arc::clone(&m.view))
        };
        let view = view.ok_or_else(|| anyhow!("no chart has been rendered"))?;
        view.to_image_url("png", scale).await
    }

    /// Abort anything in flight and tear down both slots.
    pub async fn cleanup(&self) {
        let (mounted, status) = {
            let mut state = self.inner.state.lock();
            if let Some(op) = state.current.take() {
                op.abort();
            }
            state.last_fingerprint = None;
            state.transitioning = false;
            let mounted: Vec<Mounted> = state.slots.iter_mut().filter_map(Option::take).collect();
            (mounted, state.status())
        };
        for m in mounted {
            m.dispose().await;
        }
        self.inner.notify(status);
    }
}
