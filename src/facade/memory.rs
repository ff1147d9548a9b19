use std::fmt;
use std::ops::{Deref, DerefMut};
use tracing::trace;

/// Zero-initialized scratch memory handed to the pipeline.
///
/// The buffer is owned by whoever holds it and is released exactly once,
/// either through `EngineFacade::free_mem` or by going out of scope.
pub struct ScratchBuffer {
    stream_id: i32,
    name: String,
    index: i32,
    data: Box<[u8]>,
}

impl ScratchBuffer {
    pub(crate) fn zeroed(stream_id: i32, name: &str, index: i32, size: usize) -> Self {
        Self {
            stream_id,
            name: name.to_string(),
            index,
            data: vec![0u8; size].into_boxed_slice(),
        }
    }

    pub fn stream_id(&self) -> i32 {
        self.stream_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Deref for ScratchBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for ScratchBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl fmt::Debug for ScratchBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchBuffer")
            .field("stream_id", &self.stream_id)
            .field("name", &self.name)
            .field("index", &self.index)
            .field("len", &self.data.len())
            .finish()
    }
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        trace!(
            "Released scratch buffer {} (stream {}, index {}, {} bytes)",
            self.name,
            self.stream_id,
            self.index,
            self.data.len()
        );
    }
}
