//! Touch-gesture arbitration and inertial model rotation for a frame-driven
//! host. Components are hosted by [`Runtime`], talk over the [`EventBus`] and
//! mutate the host's transforms through [`scene::Scene`].

pub mod arbiter;
pub mod broadcaster;
pub mod bus;
pub mod clock;
pub mod config;
pub mod content;
pub mod controller;
pub mod drag_input;
pub mod hotspot;
pub mod pinch;
pub mod rotation;
pub mod runtime;
pub mod sampler;

pub use arbiter::{classify, Classification};
pub use broadcaster::{DragStateBroadcaster, DragStateListener};
pub use bus::{EventBus, Interest, Subscription};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ArbiterConfig, ContentConfig, ContentMode, GestureConfig, PinchConfig, RotationConfig,
    SamplerConfig,
};
pub use content::ContentStepper;
pub use controller::UnifiedInputController;
pub use drag_input::{DragBlocker, DragInputManager};
pub use hotspot::HotspotTapHandler;
pub use pinch::PinchScaler;
pub use rotation::{RotationController, RotationState, SpinState};
pub use runtime::{Component, Context, Runtime};
pub use sampler::{DragLifecycle, PointerSample, TouchSampler, VelocityEstimate};
