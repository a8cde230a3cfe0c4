//! Drivers that run value state machines to completion.
//!
//! The state machines never touch the network. These helpers loop a step
//! function, refilling or draining between steps, over either the blocking
//! [`Transport`] seam or a tokio [`BufferedStream`].
//!
//! [`RowWriter`] and [`RowReader`] frame a whole row the way a `DataRow`
//! message does: an `i16` column count, then for each column an `i32` length
//! (`-1` for NULL) followed by the value's bytes.

use bytes::Bytes;
use pgwire_codec::{Buffer, BufferedStream, Transport};
use pgwire_protocol::{FormatCode, ProtocolError};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::TypeError;
use crate::handler::Handler;
use crate::length_cache::LengthCache;
use crate::read::ChunkedRead;
use crate::value::WireValue;
use crate::write::{DirectWrite, WriteStatus};

/// Length prefix announcing a NULL value.
pub const NULL_LENGTH: i32 = -1;

/// Step a read until it yields a value, refilling between steps.
pub fn drive_read<T, V, F>(transport: &mut T, buf: &mut Buffer, mut step: F) -> Result<V, TypeError>
where
    T: Transport + ?Sized,
    F: FnMut(&mut Buffer) -> Result<Option<V>, TypeError>,
{
    loop {
        if let Some(value) = step(buf)? {
            return Ok(value);
        }
        transport.fill(buf)?;
    }
}

/// Step a write until it completes, draining between steps.
pub fn drive_write<T, F>(transport: &mut T, buf: &mut Buffer, mut step: F) -> Result<(), TypeError>
where
    T: Transport + ?Sized,
    F: FnMut(&mut Buffer) -> Result<WriteStatus, TypeError>,
{
    loop {
        match step(buf)? {
            WriteStatus::Complete => return Ok(()),
            WriteStatus::Pending => transport.drain(buf)?,
            WriteStatus::Direct(bytes) => {
                transport.drain(buf)?;
                transport.write_direct(&bytes)?;
            }
        }
    }
}

/// Step a read until it yields a value, refilling the stream's read buffer.
pub async fn read_value<S, V, F>(stream: &mut BufferedStream<S>, mut step: F) -> Result<V, TypeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: FnMut(&mut Buffer) -> Result<Option<V>, TypeError>,
{
    loop {
        if let Some(value) = step(stream.read_buffer_mut())? {
            return Ok(value);
        }
        stream.fill().await?;
    }
}

/// Step a write until it completes, draining the stream's write buffer.
pub async fn write_value<S, F>(stream: &mut BufferedStream<S>, mut step: F) -> Result<(), TypeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: FnMut(&mut Buffer) -> Result<WriteStatus, TypeError>,
{
    loop {
        match step(stream.write_buffer_mut())? {
            WriteStatus::Complete => return Ok(()),
            WriteStatus::Pending => stream.drain().await?,
            WriteStatus::Direct(bytes) => {
                stream.drain().await?;
                stream.write_direct(&bytes).await?;
            }
        }
    }
}

/// A column's handler and wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Handler for the column's type.
    pub handler: Handler,
    /// Format the column's values travel in.
    pub format: FormatCode,
}

impl Column {
    /// Create a column description.
    #[must_use]
    pub fn new(handler: Handler, format: FormatCode) -> Self {
        Self { handler, format }
    }

    /// Describe a column by its server type name.
    pub fn for_type_name(name: &str, format: FormatCode) -> Result<Self, TypeError> {
        Ok(Self::new(Handler::for_type_name(name)?, format))
    }
}

fn value_length(len: usize) -> Result<i32, TypeError> {
    i32::try_from(len).map_err(|_| {
        ProtocolError::ValueTooLarge {
            len,
            max: i32::MAX as usize,
        }
        .into()
    })
}

fn column_count(columns: usize) -> Result<i16, TypeError> {
    i16::try_from(columns).map_err(|_| {
        ProtocolError::ValueTooLarge {
            len: columns,
            max: i16::MAX as usize,
        }
        .into()
    })
}

fn prefix(bytes: &[u8]) -> DirectWrite {
    DirectWrite::new(Bytes::copy_from_slice(bytes))
}

/// Writes rows with the two-pass length protocol.
#[derive(Debug, Clone)]
pub struct RowWriter {
    columns: Vec<Column>,
}

impl RowWriter {
    /// Create a writer for rows with these columns.
    #[must_use]
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// The row's columns.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Validate every value, returning the length prefixes to write.
    ///
    /// Nothing is written if any value is rejected.
    fn validate(
        &self,
        values: &[Option<WireValue>],
        cache: &mut LengthCache,
    ) -> Result<Vec<i32>, TypeError> {
        if values.len() != self.columns.len() {
            return Err(TypeError::ColumnCountMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }

        self.columns
            .iter()
            .zip(values)
            .map(|(column, value)| match value {
                Some(value) => value_length(column.handler.validate_and_get_length(
                    value,
                    column.format,
                    cache,
                )?),
                None => Ok(NULL_LENGTH),
            })
            .collect()
    }

    /// Write a row through a blocking transport.
    ///
    /// The row is left in `buf`, or already sent if it did not fit; call
    /// the transport's drain to push out the tail.
    pub fn write<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        buf: &mut Buffer,
        values: Vec<Option<WireValue>>,
    ) -> Result<(), TypeError> {
        let mut cache = LengthCache::with_capacity(values.len());
        let lengths = self.validate(&values, &mut cache)?;
        tracing::debug!(columns = self.columns.len(), "writing row");

        let mut header = prefix(&column_count(self.columns.len())?.to_be_bytes());
        drive_write(transport, buf, |b| header.step(b))?;

        for ((column, value), len) in self.columns.iter().zip(values).zip(lengths) {
            let mut len_prefix = prefix(&len.to_be_bytes());
            drive_write(transport, buf, |b| len_prefix.step(b))?;

            if let Some(value) = value {
                let mut op = column.handler.prepare_write(value, column.format, &mut cache)?;
                drive_write(transport, buf, |b| op.step(b))?;
            }
        }
        Ok(())
    }

    /// Write a row through a tokio stream.
    pub async fn write_async<S>(
        &self,
        stream: &mut BufferedStream<S>,
        values: Vec<Option<WireValue>>,
    ) -> Result<(), TypeError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut cache = LengthCache::with_capacity(values.len());
        let lengths = self.validate(&values, &mut cache)?;
        tracing::debug!(columns = self.columns.len(), "writing row");

        let mut header = prefix(&column_count(self.columns.len())?.to_be_bytes());
        write_value(stream, |b| header.step(b)).await?;

        for ((column, value), len) in self.columns.iter().zip(values).zip(lengths) {
            let mut len_prefix = prefix(&len.to_be_bytes());
            write_value(stream, |b| len_prefix.step(b)).await?;

            if let Some(value) = value {
                let mut op = column.handler.prepare_write(value, column.format, &mut cache)?;
                write_value(stream, |b| op.step(b)).await?;
            }
        }
        Ok(())
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0; N];
    out.copy_from_slice(bytes);
    out
}

/// Reads rows framed by [`RowWriter`].
#[derive(Debug, Clone)]
pub struct RowReader {
    columns: Vec<Column>,
}

impl RowReader {
    /// Create a reader for rows with these columns.
    #[must_use]
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// The row's columns.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn check_count(&self, count: i16) -> Result<(), TypeError> {
        if usize::try_from(count).ok() != Some(self.columns.len()) {
            return Err(TypeError::ColumnCountMismatch {
                expected: self.columns.len(),
                actual: usize::try_from(count).unwrap_or(0),
            });
        }
        Ok(())
    }

    /// Read one row through a blocking transport. NULLs come back as `None`.
    pub fn read<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        buf: &mut Buffer,
    ) -> Result<Vec<Option<WireValue>>, TypeError> {
        let mut header = ChunkedRead::<Bytes>::new(2);
        let count = i16::from_be_bytes(fixed(&drive_read(transport, buf, |b| header.step(b))?));
        self.check_count(count)?;

        let mut row = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let mut len_prefix = ChunkedRead::<Bytes>::new(4);
            let len = drive_read(transport, buf, |b| len_prefix.step(b))?;
            let len = i32::from_be_bytes(fixed(&len));

            // Any negative length is NULL.
            let Ok(len) = usize::try_from(len) else {
                row.push(None);
                continue;
            };
            let mut op = column.handler.prepare_read(len, column.format)?;
            row.push(Some(drive_read(transport, buf, |b| op.step(b))?));
        }
        Ok(row)
    }

    /// Read one row through a tokio stream.
    pub async fn read_async<S>(
        &self,
        stream: &mut BufferedStream<S>,
    ) -> Result<Vec<Option<WireValue>>, TypeError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut header = ChunkedRead::<Bytes>::new(2);
        let count = i16::from_be_bytes(fixed(&read_value(stream, |b| header.step(b)).await?));
        self.check_count(count)?;

        let mut row = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let mut len_prefix = ChunkedRead::<Bytes>::new(4);
            let len = read_value(stream, |b| len_prefix.step(b)).await?;
            let len = i32::from_be_bytes(fixed(&len));

            let Ok(len) = usize::try_from(len) else {
                row.push(None);
                continue;
            };
            let mut op = column.handler.prepare_read(len, column.format)?;
            row.push(Some(read_value(stream, |b| op.step(b)).await?));
        }
        Ok(row)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pgwire_testing::ScriptedTransport;

    use crate::write::EncodeWrite;

    fn columns() -> Vec<Column> {
        vec![
            Column::new(Handler::Int4, FormatCode::Binary),
            Column::new(Handler::Text, FormatCode::Text),
            Column::new(Handler::Bytea, FormatCode::Binary),
        ]
    }

    #[test]
    fn test_drive_write_drains_between_chunks() {
        let mut transport = ScriptedTransport::empty();
        let mut buf = Buffer::new(4);
        let chars: Vec<char> = "abcdefghij".chars().collect();
        let mut write = EncodeWrite::from_chars(chars);

        drive_write(&mut transport, &mut buf, |b| write.step(b)).unwrap();
        transport.drain(&mut buf).unwrap();

        assert_eq!(transport.written(), b"abcdefghij");
        assert_eq!(transport.direct_writes(), 0);
        assert_eq!(transport.drains(), 3);
    }

    #[test]
    fn test_drive_write_direct_handoff() {
        let mut transport = ScriptedTransport::empty();
        let mut buf = Buffer::new(4);
        buf.write_bytes(b"ab");
        let mut write = DirectWrite::from_string("overflowing".to_owned());

        drive_write(&mut transport, &mut buf, |b| write.step(b)).unwrap();

        // The staged prefix goes out before the direct bytes.
        assert_eq!(transport.written(), b"aboverflowing");
        assert_eq!(transport.direct_writes(), 1);
    }

    #[test]
    fn test_drive_read_refills() {
        let mut transport = ScriptedTransport::new(b"0123456789".to_vec()).with_max_fill(3);
        let mut buf = Buffer::new(4);
        let mut read = ChunkedRead::<String>::new(10);

        let value = drive_read(&mut transport, &mut buf, |b| read.step(b)).unwrap();
        assert_eq!(value, "0123456789");
        assert_eq!(transport.fills(), 4);
    }

    #[test]
    fn test_drive_read_exhausted() {
        let mut transport = ScriptedTransport::new(b"abc".to_vec());
        let mut buf = Buffer::new(8);
        let mut read = ChunkedRead::<Bytes>::new(5);

        let err = drive_read(&mut transport, &mut buf, |b| read.step(b)).unwrap_err();
        assert!(matches!(
            err,
            TypeError::Codec(pgwire_codec::CodecError::TransportExhausted { buffered: 3 })
        ));
    }

    #[test]
    fn test_row_round_trip() {
        let values = vec![
            Some(WireValue::Int4(7)),
            None,
            Some(WireValue::from(vec![1u8, 2, 3, 4, 5, 6])),
        ];

        let mut out = ScriptedTransport::empty();
        let mut buf = Buffer::new(5);
        RowWriter::new(columns())
            .write(&mut out, &mut buf, values.clone())
            .unwrap();
        out.drain(&mut buf).unwrap();

        let mut input = out.replay().with_max_fill(2);
        let mut buf = Buffer::new(5);
        let row = RowReader::new(columns()).read(&mut input, &mut buf).unwrap();
        assert_eq!(row, values);
    }

    #[test]
    fn test_row_framing_layout() {
        let mut out = ScriptedTransport::empty();
        let mut buf = Buffer::new(64);
        let writer = RowWriter::new(vec![Column::new(Handler::Text, FormatCode::Text)]);
        writer
            .write(&mut out, &mut buf, vec![Some(WireValue::from("hi"))])
            .unwrap();
        out.drain(&mut buf).unwrap();

        assert_eq!(out.written(), b"\x00\x01\x00\x00\x00\x02hi");
    }

    #[test]
    fn test_rejected_row_writes_nothing() {
        let mut out = ScriptedTransport::empty();
        let mut buf = Buffer::new(64);
        let values = vec![
            Some(WireValue::Int4(1)),
            Some(WireValue::Int8(2)),
            None,
        ];

        let err = RowWriter::new(columns())
            .write(&mut out, &mut buf, values)
            .unwrap_err();
        assert!(matches!(err, TypeError::UnsupportedValueType { .. }));
        assert!(buf.is_empty());
        assert!(out.written().is_empty());
    }

    #[test]
    fn test_column_count_mismatch() {
        let mut out = ScriptedTransport::empty();
        let mut buf = Buffer::new(64);
        let err = RowWriter::new(columns())
            .write(&mut out, &mut buf, vec![None])
            .unwrap_err();
        assert!(matches!(
            err,
            TypeError::ColumnCountMismatch {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_async_row_over_duplex() {
        let (client, server) = tokio::io::duplex(16);
        let config = pgwire_codec::BufferConfig::new().capacity(8);
        let mut writer_stream = BufferedStream::with_config(client, &config).unwrap();
        let mut reader_stream = BufferedStream::with_config(server, &config).unwrap();

        let text = "chunked ✓ over a small duplex pipe".to_owned();
        let values = vec![
            Some(WireValue::Int4(-1)),
            Some(WireValue::Text(text)),
            Some(WireValue::from(vec![0u8; 40])),
        ];

        let writer = RowWriter::new(columns());
        let reader = RowReader::new(columns());

        let expected = values.clone();
        let send = async {
            writer.write_async(&mut writer_stream, values).await.unwrap();
            writer_stream.flush().await.unwrap();
        };
        let recv = async { reader.read_async(&mut reader_stream).await.unwrap() };

        let ((), row) = tokio::join!(send, recv);
        assert_eq!(row, expected);
    }
}
