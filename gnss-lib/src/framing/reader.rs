use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use super::{Frame, FrameSource};
use crate::prelude::*;

const CHUNK_SIZE: usize = 4096;

/// Iterates over frames synchronized from a reader. Created using [read_frames].
///
/// ## Errors
/// Read errors other than [ErrorKind::Interrupted] are returned once, after which the
/// iterator ends.
pub struct FrameIter<R, S> {
    reader: R,
    source: S,
    buf: Vec<u8>,
    ready: VecDeque<Frame>,
    done: bool,
}

impl<R, S> FrameIter<R, S>
where
    R: Read,
    S: FrameSource,
{
    /// Borrow the underlying source, e.g., to inspect its statistics.
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<R, S> Iterator for FrameIter<R, S>
where
    R: Read,
    S: FrameSource,
{
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Some(Ok(frame));
            }
            if self.done {
                return None;
            }
            match self.reader.read(&mut self.buf) {
                Ok(0) => self.done = true,
                Ok(n) => {
                    let frames = self.source.push_chunk(&self.buf[..n]);
                    self.ready.extend(frames);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    self.done = true;
                    return Some(Err(Error::Io(err)));
                }
            }
        }
    }
}

/// Creates an iterator of frames synchronized by `source` from the bytes of `reader`.
///
/// Any incomplete frame at the end of the stream is dropped. No attempt is made to
/// reconnect or retry a failed reader.
pub fn read_frames<R, S>(reader: R, source: S) -> FrameIter<R, S>
where
    R: Read,
    S: FrameSource,
{
    FrameIter {
        reader,
        source,
        buf: vec![0u8; CHUNK_SIZE],
        ready: VecDeque::new(),
        done: false,
    }
}
