//! Campaign console data layer: the orchestrator that owns canonical state,
//! the fallback dataset substituted for failed reads, and the pure view
//! projections derived from that state.

pub mod error;
pub mod fallback;
pub mod orchestrator;
pub mod state;
pub mod view;

pub use error::ConsoleError;
pub use fallback::{FallbackData, FALLBACK_CAMPAIGN_ID, FALLBACK_MARKETER_ID};
pub use orchestrator::{parse_budget, Console, Outcome};
pub use state::{ConsoleState, DataSource, ReportState, RequestSeq, Sources, Ticket};
pub use view::{Aggregates, MonthFilter, StatusFilter};
