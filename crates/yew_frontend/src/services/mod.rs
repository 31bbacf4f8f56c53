pub mod api;
pub mod poll;

pub use api::BrowserApi;
pub use poll::poll_analysis;
