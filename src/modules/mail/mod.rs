//! Outbound mail
//!
//! Defines the [`MailTransport`] port and an adapter that hands messages to
//! an HTTP mail relay.

mod http_relay;
mod transport;

pub use http_relay::{DisabledMailTransport, HttpMailRelay};
pub use transport::{MailTransport, OutgoingMail};
