use std::io;

use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::net::{TcpStream, ToSocketAddrs};

/// Reads events from the notification channel, one line per event.
pub struct NotificationSubscriber {
    lines: Lines<BufReader<TcpStream>>,
}

impl NotificationSubscriber {
    pub async fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            lines: BufReader::new(stream).lines(),
        })
    }

    /// The next event, or `None` once the server closes the channel.
    pub async fn next_event(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }
}
