pub mod poller;
pub mod portal_session;
pub mod search_ctx;
pub mod search_flow;

pub use poller::{await_result, PollPolicy, PollState, ResultPoller};
pub use portal_session::PortalSession;
pub use search_ctx::SearchCtx;
pub use search_flow::SearchFlow;
