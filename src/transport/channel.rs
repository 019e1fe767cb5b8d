//! Duplex byte channel adapter.
//!
//! Wraps any `AsyncRead + AsyncWrite` stream (TCP, Unix socket, an RFCOMM
//! socket wrapper, or `tokio::io::duplex` in tests) and exposes the two
//! primitives the OBEX session needs: write everything, and read exactly
//! `n` bytes or fail.
//!
//! The caller owns the stream's lifecycle. The channel never opens or
//! closes the underlying connection; use [`Channel::into_inner`] to take it
//! back.
//!
//! # Example
//!
//! ```ignore
//! use obex_pbap::transport::Channel;
//!
//! let stream = tokio::net::TcpStream::connect(addr).await?;
//! let mut channel = Channel::new(stream);
//! channel.send(&[0x81, 0x00, 0x03]).await?;
//! let prefix = channel.recv_exact(3).await?;
//! ```

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::IoError;

/// Exclusive owner of one duplex byte stream.
#[derive(Debug)]
pub struct Channel<S> {
    stream: S,
}

impl<S> Channel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an established stream.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Write all of `bytes` and flush.
    ///
    /// # Errors
    ///
    /// [`IoError::ChannelClosed`] if the peer went away, otherwise
    /// [`IoError::Transport`].
    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), IoError> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read exactly `n` bytes.
    ///
    /// Never returns fewer bytes: a stream that ends first yields
    /// [`IoError::ChannelClosed`].
    pub async fn recv_exact(&mut self, n: usize) -> Result<BytesMut, IoError> {
        let mut buf = BytesMut::zeroed(n);
        self.stream.read_exact(&mut buf).await?;
        Ok(buf)
    }

    /// Get a reference to the underlying stream.
    pub fn inner(&self) -> &S {
        &self.stream
    }

    /// Get a mutable reference to the underlying stream.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Give the stream back to the caller.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_recv_exact() {
        let (a, b) = tokio::io::duplex(64);
        let mut left = Channel::new(a);
        let mut right = Channel::new(b);

        left.send(b"\xA0\x00\x03").await.unwrap();
        let got = right.recv_exact(3).await.unwrap();
        assert_eq!(&got[..], b"\xA0\x00\x03");
    }

    #[tokio::test]
    async fn test_recv_exact_zero_bytes() {
        let (a, _b) = tokio::io::duplex(8);
        let mut channel = Channel::new(a);
        let got = channel.recv_exact(0).await.unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn test_recv_exact_reassembles_split_writes() {
        let (a, mut b) = tokio::io::duplex(64);
        let mut channel = Channel::new(a);

        tokio::spawn(async move {
            b.write_all(&[1, 2]).await.unwrap();
            tokio::task::yield_now().await;
            b.write_all(&[3, 4, 5]).await.unwrap();
            // keep b alive until the reader is done
            let mut sink = [0u8; 1];
            let _ = b.read(&mut sink).await;
        });

        let got = channel.recv_exact(5).await.unwrap();
        assert_eq!(&got[..], &[1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_recv_exact_on_closed_stream() {
        let (a, mut b) = tokio::io::duplex(64);
        let mut channel = Channel::new(a);

        b.write_all(&[0xA0]).await.unwrap();
        drop(b);

        let err = channel.recv_exact(3).await.unwrap_err();
        assert!(matches!(err, IoError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_send_on_closed_stream() {
        let (a, b) = tokio::io::duplex(64);
        let mut channel = Channel::new(a);
        drop(b);

        let err = channel.send(&[0x81, 0x00, 0x03]).await.unwrap_err();
        assert!(matches!(err, IoError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_into_inner_returns_stream() {
        let (a, mut b) = tokio::io::duplex(64);
        let channel = Channel::new(a);
        let mut stream = channel.into_inner();

        stream.write_all(b"ok").await.unwrap();
        let mut buf = [0u8; 2];
        b.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ok");
    }
}
