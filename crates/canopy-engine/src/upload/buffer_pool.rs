use std::collections::HashMap;

/// Reusable backing arrays for vertex attribute data, keyed by attribute name.
///
/// A backing array is replaced only when a write needs more floats than it holds;
/// shorter writes reuse it and expose an exact-length view.
#[derive(Debug, Default)]
pub struct BufferPool {
    buffers: HashMap<String, PooledBuffer>,
    allocations: usize,
}

#[derive(Debug, Default)]
struct PooledBuffer {
    data: Vec<f32>,
    len: usize,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a writable view of exactly `len` floats for `name`.
    ///
    /// Contents are whatever the previous write left behind; callers overwrite the
    /// whole view.
    pub fn slice_mut(&mut self, name: &str, len: usize) -> &mut [f32] {
        let buf = self.buffers.entry(name.to_owned()).or_default();
        if buf.data.len() < len {
            buf.data = vec![0.0; len];
            self.allocations += 1;
            log::trace!("buffer pool: `{name}` grew to {len} floats");
        }
        buf.len = len;
        &mut buf.data[..len]
    }

    /// Last written contents of `name`, at their exact length.
    pub fn get(&self, name: &str) -> Option<&[f32]> {
        self.buffers.get(name).map(|b| &b.data[..b.len])
    }

    /// Size of the retained backing array for `name`, in floats.
    pub fn capacity(&self, name: &str) -> usize {
        self.buffers.get(name).map_or(0, |b| b.data.len())
    }

    /// Number of backing arrays allocated over the pool's lifetime.
    #[inline]
    pub fn allocations(&self) -> usize {
        self.allocations
    }
}
