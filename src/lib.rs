/*
 * Copyright Stalwart Labs Ltd. See the COPYING
 * file at the top-level directory of this distribution.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! # smtp-probe
//!
//! _smtp-probe_ is a single-shot diagnostic that checks whether an SMTP server is reachable
//! and willing to talk. One invocation performs exactly one connection attempt:
//!
//! - Opens a TCP connection (bounded by a 10 second timeout) and reads the server greeting.
//! - Identifies itself with `HELO test-client`.
//! - Tries to hand over one fixed test message. A failure here is reported but does not
//!   turn the probe into a failure.
//! - Closes the session with `QUIT`.
//!
//! Every line exchanged with the server is traced to standard output through
//! [`tracing`](https://crates.io/crates/tracing) once [`logging::init`] has been called.
//!
//! ## Usage Example
//!
//! ```rust
//!     let target = ProbeTarget::new("mail.example.com", 2525);
//!     let mut stdout = std::io::stdout();
//!
//!     let outcome = smtp_probe::probe(&target, &mut stdout).await?;
//!     outcome.write_summary(&mut stdout)?;
//! ```
//!
//! From the command line:
//!
//! ```bash
//!  $ smtp-probe localhost 2525
//! ```
//!
//! ## License
//!
//! Licensed under either of
//!
//!  * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//!  * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.
//!

#![forbid(unsafe_code)]

pub mod logging;
pub mod probe;
pub mod smtp;

use std::{fmt::Display, time::Duration};

pub use mail_builder;
pub use probe::{probe, ProbeError, ProbeOutcome, ProbeTarget};
pub use smtp_proto;

#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// The TCP connection could not be established.
    Connect(std::io::Error),

    /// The server greeted with something other than 220.
    UnexpectedGreeting(smtp_proto::Response<String>),

    /// The server closed the connection before a full reply arrived.
    ServerDisconnected,

    /// Failure parsing SMTP reply
    UnparseableReply,

    /// Unexpected SMTP reply.
    UnexpectedReply(smtp_proto::Response<String>),

    /// Missing message sender.
    MissingMailFrom,

    /// Missing message recipients.
    MissingRcptTo,

    /// Command timeout.
    Timeout,
}

pub type Result<T> = std::result::Result<T, Error>;

/// SMTP client holding an open session.
pub struct SmtpClient<T: tokio::io::AsyncRead + tokio::io::AsyncWrite> {
    pub stream: T,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct SmtpClientBuilder<T: AsRef<str>> {
    pub timeout: Duration,
    pub hostname: T,
    pub port: u16,
    pub local_host: String,
}

impl Error {
    /// Short name of the error kind, used when reporting otherwise
    /// unclassified failures.
    pub fn kind_name(&self) -> String {
        match self {
            Error::Io(e) => format!("{:?}", e.kind()),
            Error::Connect(_) => "Connect".to_string(),
            Error::UnexpectedGreeting(_) => "UnexpectedGreeting".to_string(),
            Error::ServerDisconnected => "ServerDisconnected".to_string(),
            Error::UnparseableReply => "UnparseableReply".to_string(),
            Error::UnexpectedReply(_) => "UnexpectedReply".to_string(),
            Error::MissingMailFrom => "MissingMailFrom".to_string(),
            Error::MissingRcptTo => "MissingRcptTo".to_string(),
            Error::Timeout => "Timeout".to_string(),
        }
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Connect(e) => write!(f, "{e}"),
            Error::UnexpectedGreeting(r) => {
                write!(f, "Unexpected greeting: {} {}", r.code, r.message)
            }
            Error::ServerDisconnected => write!(f, "Connection unexpectedly closed"),
            Error::UnparseableReply => write!(f, "Unparseable SMTP reply"),
            Error::UnexpectedReply(r) => write!(f, "Unexpected reply: {} {}", r.code, r.message),
            Error::MissingMailFrom => write!(f, "Missing message sender"),
            Error::MissingRcptTo => write!(f, "Missing message recipients"),
            Error::Timeout => write!(f, "Connection timeout"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
