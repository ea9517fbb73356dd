/// Server services
pub mod actions;
pub mod guard;
pub mod session;

pub use actions::{ActionService, DislikeReport, LikeReport};
pub use guard::{GuardDecision, GuardService};
pub use session::SessionService;
