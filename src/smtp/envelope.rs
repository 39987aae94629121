/*
 * Copyright Stalwart Labs Ltd.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use smtp_proto::Response;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::SmtpClient;

use super::{
    message::{IntoMessage, Parameters},
    AssertReply,
};

impl<T: AsyncRead + AsyncWrite + Unpin> SmtpClient<T> {
    /// Sends a HELO command to the server.
    pub async fn helo(&mut self, hostname: &str) -> crate::Result<Response<String>> {
        self.cmd(format!("HELO {hostname}\r\n").as_bytes()).await
    }

    /// Sends a MAIL FROM command to the server.
    pub async fn mail_from(&mut self, addr: &str, params: &Parameters<'_>) -> crate::Result<()> {
        self.cmd(format!("MAIL FROM:<{addr}>{params}\r\n").as_bytes())
            .await?
            .assert_positive_completion()
    }

    /// Sends a RCPT TO command to the server.
    pub async fn rcpt_to(&mut self, addr: &str, params: &Parameters<'_>) -> crate::Result<()> {
        self.cmd(format!("RCPT TO:<{addr}>{params}\r\n").as_bytes())
            .await?
            .assert_positive_completion()
    }

    /// Sends a DATA command to the server.
    pub async fn data(&mut self, message: impl AsRef<[u8]>) -> crate::Result<()> {
        self.cmd(b"DATA\r\n").await?.assert_code(354)?;
        tokio::time::timeout(self.timeout, async {
            // Write message
            self.write_message(message.as_ref()).await?;
            self.read().await
        })
        .await
        .map_err(|_| crate::Error::Timeout)??
        .assert_positive_completion()
    }

    /// Sends a RSET command to the server.
    pub async fn rset(&mut self) -> crate::Result<()> {
        self.cmd(b"RSET\r\n").await?.assert_positive_completion()
    }

    /// Sends a QUIT command to the server.
    pub async fn quit(mut self) -> crate::Result<()> {
        self.cmd(b"QUIT\r\n").await?.assert_positive_completion()
    }

    /// Sends a message to the server.
    ///
    /// A rejected transaction is reset before the error is returned,
    /// leaving the session usable for QUIT.
    pub async fn send<'x>(&mut self, message: impl IntoMessage<'x>) -> crate::Result<()> {
        let message = message.into_message()?;

        let result = async {
            self.mail_from(
                message.mail_from.email.as_ref(),
                &message.mail_from.parameters,
            )
            .await?;
            for rcpt in &message.rcpt_to {
                self.rcpt_to(rcpt.email.as_ref(), &rcpt.parameters).await?;
            }
            self.data(message.body.as_ref()).await
        }
        .await;

        if let Err(crate::Error::UnexpectedReply(_)) = &result {
            if let Err(err) = self.rset().await {
                tracing::debug!("RSET after failed transaction: {err}");
            }
        }

        result
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    use crate::{smtp::message::Message, SmtpClient};

    async fn expect_line(reader: &mut (impl AsyncBufReadExt + Unpin), expected: &str) {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, expected);
    }

    #[tokio::test]
    async fn send_message() {
        let (client, server) = tokio::io::duplex(4096);
        let mut client = SmtpClient {
            stream: client,
            timeout: Duration::from_secs(5),
        };

        let server = tokio::spawn(async move {
            let (rd, mut wr) = tokio::io::split(server);
            let mut rd = BufReader::new(rd);
            expect_line(&mut rd, "MAIL FROM:<john@example.com>\r\n").await;
            wr.write_all(b"250 2.1.0 Ok\r\n").await.unwrap();
            expect_line(&mut rd, "RCPT TO:<jane@example.com>\r\n").await;
            wr.write_all(b"250 2.1.5 Ok\r\n").await.unwrap();
            expect_line(&mut rd, "DATA\r\n").await;
            wr.write_all(b"354 Go ahead\r\n").await.unwrap();
            expect_line(&mut rd, "Subject: hi\r\n").await;
            expect_line(&mut rd, "\r\n").await;
            expect_line(&mut rd, "..dotted\r\n").await;
            expect_line(&mut rd, ".\r\n").await;
            wr.write_all(b"250 2.0.0 Queued\r\n").await.unwrap();
        });

        client
            .send(Message::new(
                "john@example.com",
                ["jane@example.com"],
                "Subject: hi\r\n\r\n.dotted\r\n".as_bytes(),
            ))
            .await
            .unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn rejected_recipient_resets() {
        let (client, server) = tokio::io::duplex(4096);
        let mut client = SmtpClient {
            stream: client,
            timeout: Duration::from_secs(5),
        };

        let server = tokio::spawn(async move {
            let (rd, mut wr) = tokio::io::split(server);
            let mut rd = BufReader::new(rd);
            expect_line(&mut rd, "MAIL FROM:<john@example.com>\r\n").await;
            wr.write_all(b"250 2.1.0 Ok\r\n").await.unwrap();
            expect_line(&mut rd, "RCPT TO:<jane@example.com>\r\n").await;
            wr.write_all(b"550 5.1.1 No such user\r\n").await.unwrap();
            expect_line(&mut rd, "RSET\r\n").await;
            wr.write_all(b"250 2.0.0 Ok\r\n").await.unwrap();
        });

        let result = client
            .send(Message::new(
                "john@example.com",
                ["jane@example.com"],
                "Subject: hi\r\n\r\nhello\r\n".as_bytes(),
            ))
            .await;
        match result {
            Err(crate::Error::UnexpectedReply(reply)) => assert_eq!(reply.code, 550),
            other => panic!("unexpected result {other:?}"),
        }
        server.await.unwrap();
    }
}
