use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only the `data` field is collected. Multiple `data` lines in one event
/// are joined with a line feed, and events without data are skipped.
pub struct Sse {
    // Raw bytes, since a chunk may end in the middle of a UTF-8 sequence.
    buf: Vec<u8>,
    // Bytes before this offset are known not to start an event terminator.
    scanned: usize,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            scanned: 0,
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            if let Some(data) = self.try_parse_event()? {
                return Ok(Some(data));
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            else {
                // An event is only dispatched after its blank line, the
                // incomplete tail is dropped.
                if !self.buf.iter().all(u8::is_ascii_whitespace) {
                    debug!(
                        "discarding {} bytes of unterminated event",
                        self.buf.len()
                    );
                }
                self.buf.clear();
                self.scanned = 0;
                return Ok(None);
            };
            self.buf.extend_from_slice(&bytes);
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        while let Some((block_end, consumed)) =
            find_event_end(&self.buf, self.scanned)
        {
            let data = {
                let Ok(block) = str::from_utf8(&self.buf[..block_end]) else {
                    return Err(Error::InvalidPayload);
                };
                parse_data(block)
            };
            self.buf.drain(..consumed);
            self.scanned = 0;
            if data.is_some() {
                return Ok(data);
            }
        }
        // A terminator starting in the last two bytes may be completed by
        // the next chunk.
        self.scanned = self.buf.len().saturating_sub(2);
        Ok(None)
    }
}

/// Finds the blank line that terminates the first event in `buf`, looking
/// at line feeds from offset `from` on.
///
/// Returns the length of the event block (with its last line ending) and
/// the number of bytes to consume. Both LF and CRLF are accepted.
fn find_event_end(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    buf.iter().enumerate().skip(from).find_map(|(idx, byte)| {
        if *byte != b'\n' {
            return None;
        }
        let rest = &buf[idx + 1..];
        if rest.starts_with(b"\n") {
            Some((idx + 1, idx + 2))
        } else if rest.starts_with(b"\r\n") {
            Some((idx + 1, idx + 3))
        } else {
            None
        }
    })
}

fn parse_data(block: &str) -> Option<String> {
    let mut data: Option<String> = None;
    for line in block.lines() {
        // Comments start with a colon.
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        if field != "data" {
            continue;
        }
        let value = value.strip_prefix(' ').unwrap_or(value);
        match &mut data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => data = Some(value.to_owned()),
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn sse_from(chunks: &[&'static [u8]]) -> Sse {
        let chunks = chunks.iter().copied().map(Bytes::from_static).collect();
        Sse::new(Chunks::from_vec_deque(chunks))
    }

    #[tokio::test]
    async fn test_normal_events() {
        let mut sse = sse_from(&[b"data: hello\n\n", b"data: bye\r\n\r\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_quirk_streaming() {
        let mut sse = sse_from(&[b"data:", b" hello\r\n", b"\r", b"\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_terminator_split_across_chunks() {
        let mut sse = sse_from(&[
            b"data: hel",
            b"lo",
            b"\r",
            b"\n\r",
            b"\n",
            b"data: bye\n",
            b"\n",
        ]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.scanned, 0);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[test]
    fn test_scan_resumes_after_partial_event() {
        let mut sse = sse_from(&[]);
        sse.buf.extend_from_slice(b"data: aaaaaaaa\ndata: bbbb");
        assert_eq!(sse.try_parse_event(), Ok(None));
        assert_eq!(sse.scanned, sse.buf.len() - 2);

        sse.buf.extend_from_slice(b"\n\n");
        let data = sse.try_parse_event().unwrap();
        assert_eq!(data.as_deref(), Some("aaaaaaaa\nbbbb"));
        assert!(sse.buf.is_empty());
        assert_eq!(sse.scanned, 0);
    }

    #[test]
    fn test_find_event_end_from_offset() {
        let buf = b"data: a\n\ndata: b\r\n\r\n";
        assert_eq!(find_event_end(buf, 0), Some((8, 9)));
        assert_eq!(find_event_end(buf, 9), Some((18, 20)));
        assert_eq!(find_event_end(&buf[..19], 9), None);
    }

    #[tokio::test]
    async fn test_split_utf8_sequence() {
        // "ß" is encoded as 0xC3 0x9F.
        let mut sse = sse_from(&[b"data: Stra\xC3", b"\x9Fe\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "Straße");
    }

    #[tokio::test]
    async fn test_fields_and_comments() {
        let mut sse = sse_from(&[
            b": keep-alive\n\n",
            b"event: message\nid: 7\ndata: first\ndata: second\n\n",
        ]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "first\nsecond");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_data() {
        let mut sse = sse_from(&[b"data: \xFF\xFE\n\n"]);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);

        let mut sse = sse_from(&[b"data: hello\n", b"data: bye\n"]);
        assert_eq!(sse.next_event().await.unwrap(), None);
    }
}
