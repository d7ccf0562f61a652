//! Frame encode/decode over async byte streams.
//!
//! Decode functions consume exactly the bytes of one logical value and fail
//! with a [`WireError`] when the stream closes early or declares a length it
//! cannot honor. Encode functions are pure functions of their input; their
//! only effect is writing the frame bytes to the given sink.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{Opcode, WireError};

/// Upper bound on a declared string byte-length or list count.
///
/// The protocol itself carries no limit; this guards allocation against a
/// corrupt or hostile length prefix.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Read exactly `buf.len()` bytes, distinguishing a clean close (zero bytes
/// read) from a mid-value truncation.
async fn fill_exact<R>(reader: &mut R, buf: &mut [u8]) -> Result<(), WireError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Err(if filled == 0 {
                WireError::Eof
            } else {
                WireError::Truncated
            });
        }
        filled += n;
    }
    Ok(())
}

/// Validate a length prefix before allocating for it.
fn checked_len(len: i32) -> Result<usize, WireError> {
    if len < 0 || len as usize > MAX_FRAME_LEN {
        return Err(WireError::InvalidLength(len));
    }
    Ok(len as usize)
}

/// Decode an `Int32` frame.
pub async fn read_i32<R>(reader: &mut R) -> Result<i32, WireError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4];
    fill_exact(reader, &mut buf).await?;
    Ok(i32::from_le_bytes(buf))
}

/// Decode a `Bool` frame. Any nonzero byte is true.
pub async fn read_bool<R>(reader: &mut R) -> Result<bool, WireError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 1];
    fill_exact(reader, &mut buf).await?;
    Ok(buf[0] != 0)
}

/// Decode an opcode tag, rejecting values outside the closed set.
pub async fn read_opcode<R>(reader: &mut R) -> Result<Opcode, WireError>
where
    R: AsyncRead + Unpin,
{
    Opcode::try_from(read_i32(reader).await?)
}

/// Decode a `String` frame.
pub async fn read_string<R>(reader: &mut R) -> Result<String, WireError>
where
    R: AsyncRead + Unpin,
{
    let len = checked_len(read_i32(reader).await?)?;
    let mut buf = vec![0u8; len];
    if len > 0 {
        // The length prefix promised payload bytes; a close here is a
        // truncated frame even if it lands between reads.
        fill_exact(reader, &mut buf)
            .await
            .map_err(WireError::mid_frame)?;
    }
    Ok(String::from_utf8(buf)?)
}

/// Decode a `StringList` frame.
pub async fn read_string_list<R>(reader: &mut R) -> Result<Vec<String>, WireError>
where
    R: AsyncRead + Unpin,
{
    let count = checked_len(read_i32(reader).await?)?;
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(read_string(reader).await.map_err(WireError::mid_frame)?);
    }
    Ok(items)
}

/// Decode a `ListOfStringLists` frame.
pub async fn read_string_lists<R>(reader: &mut R) -> Result<Vec<Vec<String>>, WireError>
where
    R: AsyncRead + Unpin,
{
    let count = checked_len(read_i32(reader).await?)?;
    let mut lists = Vec::with_capacity(count);
    for _ in 0..count {
        lists.push(
            read_string_list(reader)
                .await
                .map_err(WireError::mid_frame)?,
        );
    }
    Ok(lists)
}

/// Encode an `Int32` frame.
pub async fn write_i32<W>(writer: &mut W, value: i32) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&value.to_le_bytes()).await?;
    Ok(())
}

/// Encode a `Bool` frame (canonically 1 for true).
pub async fn write_bool<W>(writer: &mut W, value: bool) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&[u8::from(value)]).await?;
    Ok(())
}

/// Encode an opcode tag.
pub async fn write_opcode<W>(writer: &mut W, opcode: Opcode) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    write_i32(writer, opcode.as_i32()).await
}

/// Encode a `String` frame.
pub async fn write_string<W>(writer: &mut W, value: &str) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    let len = i32::try_from(value.len()).map_err(|_| WireError::InvalidLength(i32::MAX))?;
    checked_len(len)?;
    write_i32(writer, len).await?;
    writer.write_all(value.as_bytes()).await?;
    Ok(())
}

/// Encode a `StringList` frame.
pub async fn write_string_list<W, S>(writer: &mut W, items: &[S]) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
    S: AsRef<str>,
{
    let count = i32::try_from(items.len()).map_err(|_| WireError::InvalidLength(i32::MAX))?;
    write_i32(writer, count).await?;
    for item in items {
        write_string(writer, item.as_ref()).await?;
    }
    Ok(())
}

/// Encode a `ListOfStringLists` frame.
pub async fn write_string_lists<W>(writer: &mut W, lists: &[Vec<String>]) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    let count = i32::try_from(lists.len()).map_err(|_| WireError::InvalidLength(i32::MAX))?;
    write_i32(writer, count).await?;
    for list in lists {
        write_string_list(writer, list).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_i32_is_little_endian() {
        let mut buf = Vec::new();
        write_i32(&mut buf, 1).await.unwrap();
        assert_eq!(buf, [1, 0, 0, 0]);

        let mut buf = Vec::new();
        write_i32(&mut buf, -2).await.unwrap();
        assert_eq!(buf, [0xfe, 0xff, 0xff, 0xff]);

        let mut reader: &[u8] = &[0x2c, 0x01, 0x00, 0x00];
        assert_eq!(read_i32(&mut reader).await.unwrap(), 300);
    }

    #[tokio::test]
    async fn test_bool_encoding() {
        let mut buf = Vec::new();
        write_bool(&mut buf, true).await.unwrap();
        write_bool(&mut buf, false).await.unwrap();
        assert_eq!(buf, [1, 0]);

        // any nonzero byte decodes as true
        let mut reader: &[u8] = &[0, 1, 0x7f];
        assert!(!read_bool(&mut reader).await.unwrap());
        assert!(read_bool(&mut reader).await.unwrap());
        assert!(read_bool(&mut reader).await.unwrap());
    }

    #[tokio::test]
    async fn test_string_roundtrip() {
        for text in ["hello", "", "héllo wörld", "日本語"] {
            let mut buf = Vec::new();
            write_string(&mut buf, text).await.unwrap();

            let mut reader: &[u8] = &buf;
            assert_eq!(read_string(&mut reader).await.unwrap(), text);
            assert!(reader.is_empty(), "decode must consume the whole frame");
        }
    }

    #[tokio::test]
    async fn test_string_layout_matches_struct_packing() {
        // "hi" packs as <i length prefix followed by raw bytes
        let mut buf = Vec::new();
        write_string(&mut buf, "hi").await.unwrap();
        assert_eq!(buf, [2, 0, 0, 0, b'h', b'i']);
    }

    #[tokio::test]
    async fn test_string_list_roundtrip() {
        let items = vec!["12:00:00".to_string(), "alice".into(), String::new()];
        let mut buf = Vec::new();
        write_string_list(&mut buf, &items).await.unwrap();

        let mut reader: &[u8] = &buf;
        assert_eq!(read_string_list(&mut reader).await.unwrap(), items);
    }

    #[tokio::test]
    async fn test_string_lists_roundtrip() {
        let lists: Vec<Vec<String>> = vec![
            vec!["12:00:00".into(), "alice".into(), "hello".into()],
            vec!["12:00:01".into(), "bob".into(), String::new()],
            vec![],
        ];
        let mut buf = Vec::new();
        write_string_lists(&mut buf, &lists).await.unwrap();

        let mut reader: &[u8] = &buf;
        assert_eq!(read_string_lists(&mut reader).await.unwrap(), lists);

        // empty outer list round-trips to four zero bytes
        let mut buf = Vec::new();
        write_string_lists(&mut buf, &[]).await.unwrap();
        assert_eq!(buf, [0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_clean_eof_at_value_boundary() {
        let mut reader: &[u8] = &[];
        assert!(matches!(read_i32(&mut reader).await, Err(WireError::Eof)));

        let mut reader: &[u8] = &[];
        assert!(matches!(
            read_string(&mut reader).await,
            Err(WireError::Eof)
        ));
    }

    #[tokio::test]
    async fn test_truncated_frames_are_not_clean() {
        // length prefix cut short
        let mut reader: &[u8] = &[5, 0];
        assert!(matches!(
            read_i32(&mut reader).await,
            Err(WireError::Truncated)
        ));

        // string payload shorter than declared
        let mut reader: &[u8] = &[5, 0, 0, 0, b'h', b'i'];
        assert!(matches!(
            read_string(&mut reader).await,
            Err(WireError::Truncated)
        ));

        // stream ends between list elements: mid-frame, not clean
        let mut buf = Vec::new();
        write_i32(&mut buf, 2).await.unwrap();
        write_string(&mut buf, "only one").await.unwrap();
        let mut reader: &[u8] = &buf;
        assert!(matches!(
            read_string_list(&mut reader).await,
            Err(WireError::Truncated)
        ));
    }

    #[tokio::test]
    async fn test_negative_and_oversized_lengths_rejected() {
        let mut buf = Vec::new();
        write_i32(&mut buf, -1).await.unwrap();
        let mut reader: &[u8] = &buf;
        assert!(matches!(
            read_string(&mut reader).await,
            Err(WireError::InvalidLength(-1))
        ));

        let huge = (MAX_FRAME_LEN as i32) + 1;
        let mut buf = Vec::new();
        write_i32(&mut buf, huge).await.unwrap();
        let mut reader: &[u8] = &buf;
        assert!(matches!(
            read_string_list(&mut reader).await,
            Err(WireError::InvalidLength(v)) if v == huge
        ));
    }

    #[tokio::test]
    async fn test_invalid_utf8_rejected() {
        let mut reader: &[u8] = &[2, 0, 0, 0, 0xff, 0xfe];
        assert!(matches!(
            read_string(&mut reader).await,
            Err(WireError::InvalidUtf8(_))
        ));
    }

    #[tokio::test]
    async fn test_opcode_frames() {
        let mut buf = Vec::new();
        write_opcode(&mut buf, Opcode::Register).await.unwrap();
        write_opcode(&mut buf, Opcode::Send).await.unwrap();
        write_i32(&mut buf, 9).await.unwrap();

        let mut reader: &[u8] = &buf;
        assert_eq!(read_opcode(&mut reader).await.unwrap(), Opcode::Register);
        assert_eq!(read_opcode(&mut reader).await.unwrap(), Opcode::Send);
        assert!(matches!(
            read_opcode(&mut reader).await,
            Err(WireError::UnknownOpcode(9))
        ));
    }
}
