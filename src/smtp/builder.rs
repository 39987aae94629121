/*
 * Copyright Stalwart Labs Ltd.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use std::{io, time::Duration};

use tokio::net::TcpStream;

use crate::{SmtpClient, SmtpClientBuilder};

use super::stream::TraceStream;

impl<T: AsRef<str>> SmtpClientBuilder<T> {
    pub fn new(hostname: T, port: u16) -> Self {
        SmtpClientBuilder {
            hostname,
            port,
            timeout: Duration::from_secs(60 * 60),
            local_host: gethostname::gethostname()
                .to_str()
                .unwrap_or("[127.0.0.1]")
                .to_string(),
        }
    }

    /// Set the HELO hostname
    pub fn helo_host(mut self, host: impl Into<String>) -> Self {
        self.local_host = host.into();
        self
    }

    /// Sets the SMTP connection timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Connect over clear text and read the server greeting.
    pub async fn connect(&self) -> crate::Result<SmtpClient<TraceStream<TcpStream>>> {
        let stream = tokio::time::timeout(
            self.timeout,
            TcpStream::connect((self.hostname.as_ref(), self.port)),
        )
        .await
        .map_err(|_| {
            crate::Error::Connect(io::Error::new(io::ErrorKind::TimedOut, "timed out"))
        })?
        .map_err(crate::Error::Connect)?;

        let mut client = SmtpClient {
            stream: TraceStream::new(stream),
            timeout: self.timeout,
        };

        // Read greeting
        let greeting = tokio::time::timeout(self.timeout, client.read())
            .await
            .map_err(|_| crate::Error::Timeout)??;
        if greeting.code != 220 {
            return Err(crate::Error::UnexpectedGreeting(greeting));
        }

        Ok(client)
    }
}
