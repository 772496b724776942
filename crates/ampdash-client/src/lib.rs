//! Upstream access for the campaign console: the named call surface, the HTTP
//! bridge client, the in-process demo upstream, and the normalizer that turns
//! every supported upstream shape into the canonical model.

pub mod call;
pub mod client;
pub mod demo;
pub mod error;
pub mod lenient;
pub mod normalize;
mod retry;
pub mod types;

pub use call::ApiCall;
pub use client::{HttpUpstream, Upstream};
pub use demo::{DemoUpstream, DEMO_MARKETER_ID};
pub use error::{ClientError, NormalizeError};
pub use normalize::{
    decode_campaign, decode_campaigns, decode_contents, decode_marketers, decode_reporting,
};
