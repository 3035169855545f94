/// Messaging module
///
/// Game events are notifications of things that happened (past tense). The
/// scorekeeper produces them each tick and the game loop broadcasts them.
///
/// ```text
/// ┌─────────────┐   Vec<GameEvent>   ┌──────────┐   publish   ┌─────────────┐
/// │ Scorekeeper │ ─────────────────> │ GameLoop │ ──────────> │  Event Bus  │
/// └─────────────┘                    └──────────┘             └─────────────┘
///                                                                    │
///                                                                    ▼
///                                                              Subscribers
/// ```

pub mod bus;
pub mod events;

pub use bus::{EventBus, SubscriberId};
pub use events::GameEvent;
