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

use std::{
    fmt::Display,
    io::{self, Write},
    time::Duration,
};

use mail_builder::{mime::MimePart, MessageBuilder};

use crate::{smtp::AssertReply, SmtpClientBuilder};

pub const DEFAULT_HOST: &str = "voidcrew.dbmk2.com";
pub const DEFAULT_PORT: u16 = 25;

/// Upper bound for establishing the connection and for each exchange after it.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Name announced in the HELO command.
pub const CLIENT_ID: &str = "test-client";

pub const TEST_SENDER: &str = "test@example.com";
pub const TEST_RECIPIENT: &str = "test@voidcrew.dbmk2.com";
pub const TEST_SUBJECT: &str = "Test Email from SMTP Client";
pub const TEST_BODY: &str = "This is a test email to verify SMTP server functionality.";

/// Server to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
}

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// `true` once connected and the server answered HELO.
    pub success: bool,
    /// Last numbered step reached, from 1 to 5.
    pub stage_reached: u8,
    pub diagnostic_message: String,
}

/// Failures that end a probe before the test message is attempted.
#[derive(Debug)]
pub enum ProbeError {
    /// The server closed the connection during the handshake.
    ServerDisconnected,

    /// The connection could not be established or the server refused
    /// the session in its greeting.
    Connect(String),

    /// Any other failure, with the name of its kind.
    Other { category: String, detail: String },
}

impl ProbeTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ProbeTarget {
            host: host.into(),
            port,
        }
    }
}

impl Default for ProbeTarget {
    fn default() -> Self {
        ProbeTarget::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl Display for ProbeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl ProbeOutcome {
    /// Writes the closing verdict, plus a list of likely causes on failure.
    pub fn write_summary(&self, out: &mut impl Write) -> io::Result<()> {
        if self.success {
            writeln!(out, "\n✓ SMTP server is accessible and responding")?;
        } else {
            writeln!(out, "\n✗ SMTP server is not accessible")?;
            writeln!(out, "\nPossible issues:")?;
            writeln!(out, "- Port 25 is blocked by firewall or ISP/cloud provider")?;
            writeln!(out, "- SMTP service is not running on the server")?;
            writeln!(out, "- DNS is not resolving correctly")?;
        }
        out.flush()
    }
}

impl From<crate::Error> for ProbeError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::ServerDisconnected => ProbeError::ServerDisconnected,
            crate::Error::Connect(_) | crate::Error::UnexpectedGreeting(_) => {
                ProbeError::Connect(err.to_string())
            }
            err => ProbeError::Other {
                category: err.kind_name(),
                detail: err.to_string(),
            },
        }
    }
}

impl std::error::Error for ProbeError {}

impl Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::ServerDisconnected => write!(f, "Server disconnected unexpectedly"),
            ProbeError::Connect(detail) => {
                write!(f, "Failed to connect to SMTP server: {detail}")
            }
            ProbeError::Other { category, detail } => write!(f, "{category}: {detail}"),
        }
    }
}

/// Builds the fixed test message: a multipart message holding a single
/// plain text part.
pub fn test_message() -> MessageBuilder<'static> {
    MessageBuilder::new()
        .from(TEST_SENDER)
        .to(TEST_RECIPIENT)
        .subject(TEST_SUBJECT)
        .body(MimePart::new(
            "multipart/mixed",
            vec![MimePart::new("text/plain", TEST_BODY)],
        ))
}

fn failed(out: &mut impl Write, stage: u8, err: ProbeError) -> io::Result<ProbeOutcome> {
    writeln!(out, "ERROR: {err}")?;
    out.flush()?;
    Ok(ProbeOutcome {
        success: false,
        stage_reached: stage,
        diagnostic_message: err.to_string(),
    })
}

/// Probes an SMTP server: connects, says HELO, tries to deliver the test
/// message and quits, reporting each step on `out`.
///
/// Only a failure to connect, or losing the session during the HELO
/// exchange, makes the outcome unsuccessful. Errors are returned only when
/// writing to `out` fails.
pub async fn probe(target: &ProbeTarget, out: &mut impl Write) -> io::Result<ProbeOutcome> {
    writeln!(out, "Testing SMTP connection to {target}")?;
    writeln!(out, "1. Attempting to connect...")?;
    out.flush()?;

    let builder = SmtpClientBuilder::new(target.host.as_str(), target.port)
        .timeout(CONNECT_TIMEOUT)
        .helo_host(CLIENT_ID);
    let mut client = match builder.connect().await {
        Ok(client) => client,
        Err(err) => return failed(out, 1, err.into()),
    };

    writeln!(out, "2. Connected! Sending HELO...")?;
    out.flush()?;
    // A negative reply still counts as an acknowledgment, only a broken
    // session fails this step
    match client.helo(&builder.local_host).await {
        Ok(reply) if !reply.is_positive_completion() => {
            tracing::warn!("HELO rejected by {target}: {} {}", reply.code, reply.message);
        }
        Ok(_) => (),
        Err(err) => return failed(out, 2, err.into()),
    }

    writeln!(out, "3. Connection successful!")?;
    writeln!(out, "4. Attempting to send test email...")?;
    out.flush()?;

    let (stage_reached, diagnostic_message) = match client.send(test_message()).await {
        Ok(()) => {
            writeln!(out, "5. Test email sent successfully!")?;
            (5, "Test email sent successfully".to_string())
        }
        Err(err) => {
            writeln!(out, "4. Could not send email: {err}")?;
            (4, format!("Could not send email: {err}"))
        }
    };
    out.flush()?;

    if let Err(err) = client.quit().await {
        tracing::warn!("Failed to close SMTP session with {target}: {err}");
    }

    Ok(ProbeOutcome {
        success: true,
        stage_reached,
        diagnostic_message,
    })
}
