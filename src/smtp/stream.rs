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
    io,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Target used for the raw protocol trace.
pub const WIRE_TARGET: &str = "smtp_probe::wire";

/// Stream wrapper that traces every line sent to and received from the server.
pub struct TraceStream<T> {
    inner: T,
}

impl<T> TraceStream<T> {
    pub fn new(inner: T) -> Self {
        TraceStream { inner }
    }
}

fn trace_lines(direction: &str, bytes: &[u8]) {
    for line in bytes.split_inclusive(|&b| b == b'\n') {
        tracing::debug!(
            target: WIRE_TARGET,
            "{direction}: {:?}",
            String::from_utf8_lossy(line)
        );
    }
}

impl<T: AsyncRead + Unpin> AsyncRead for TraceStream<T> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let filled = buf.filled().len();
        let result = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &result {
            let bytes = &buf.filled()[filled..];
            if !bytes.is_empty() {
                trace_lines("reply", bytes);
            }
        }
        result
    }
}

impl<T: AsyncWrite + Unpin> AsyncWrite for TraceStream<T> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let result = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(written)) = &result {
            if let Some(bytes) = buf.get(..*written) {
                trace_lines("send", bytes);
            }
        }
        result
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod test {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tracing::metadata::LevelFilter;

    use super::TraceStream;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[tokio::test]
    async fn traces_each_line() {
        let captured = SharedBuf::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(LevelFilter::DEBUG)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (client, mut server) = tokio::io::duplex(256);
        let mut stream = TraceStream::new(client);

        stream.write_all(b"HELO test-client\r\n").await.unwrap();
        let mut buf = [0u8; 18];
        server.read_exact(&mut buf).await.unwrap();
        server.write_all(b"250 Hello\r\n").await.unwrap();
        let mut buf = [0u8; 11];
        stream.read_exact(&mut buf).await.unwrap();

        stream
            .write_all(b"MAIL FROM:<john@example.com>\r\nRCPT TO:<jane@example.com>\r\n")
            .await
            .unwrap();

        let trace = captured.contents();
        assert!(trace.contains(r#"send: "HELO test-client\r\n""#), "{trace}");
        assert!(trace.contains(r#"reply: "250 Hello\r\n""#), "{trace}");
        assert!(trace.contains(r#"send: "MAIL FROM:<john@example.com>\r\n""#), "{trace}");
        assert!(trace.contains(r#"send: "RCPT TO:<jane@example.com>\r\n""#), "{trace}");
        assert_eq!(trace.lines().count(), 4, "{trace}");
    }

    #[tokio::test]
    async fn passes_bytes_through() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut stream = TraceStream::new(client);

        stream.write_all(b"HELO test-client\r\n").await.unwrap();
        let mut buf = [0u8; 18];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"HELO test-client\r\n");

        server.write_all(b"250 Hello\r\n").await.unwrap();
        let mut buf = [0u8; 11];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"250 Hello\r\n");
    }
}
