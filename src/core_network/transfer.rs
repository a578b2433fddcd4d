use log::{debug, error};
use std::io;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Copies `source` into `sink` in chunks of `buffer_size` until the source
/// reports end of stream. Returns the number of bytes moved.
pub async fn pump<R, W>(source: &mut R, sink: &mut W, buffer_size: usize) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0; buffer_size.max(1)];
    let mut total = 0u64;

    loop {
        let bytes_read = match source.read(&mut buffer).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        // write_all retries short writes until the chunk is gone
        sink.write_all(&buffer[..bytes_read]).await?;
        total += bytes_read as u64;
    }

    sink.flush().await?;
    Ok(total)
}

/// RETR direction: file contents out to the data peer.
///
/// A file that cannot be opened is logged and sends nothing.
pub async fn send_file<W>(path: &Path, data_stream: &mut W, buffer_size: usize) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut file = match File::open(path).await {
        Ok(f) => f,
        Err(e) => {
            error!("Unable to open file {:?}: {}", path, e);
            return Ok(0);
        }
    };

    let sent = pump(&mut file, data_stream, buffer_size).await?;
    debug!("Sent {} bytes from {:?}", sent, path);
    Ok(sent)
}

/// STOR direction: bytes from the data peer into a created or truncated file.
///
/// A file that cannot be created is logged and the upload is not read.
pub async fn receive_file<R>(path: &Path, data_stream: &mut R, buffer_size: usize) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut file = match OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .open(path)
        .await
    {
        Ok(f) => f,
        Err(e) => {
            error!("Unable to create file {:?}: {}", path, e);
            return Ok(0);
        }
    };

    let received = pump(data_stream, &mut file, buffer_size).await?;
    file.sync_all().await?;
    debug!("Received {} bytes into {:?}", received, path);
    Ok(received)
}
