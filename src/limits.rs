use serde::{Deserialize, Serialize};

/// Various limits on incoming data
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Limits {
    /// Chunk size used by length-bounded parts when reading to the end
    pub chunk_size: usize,
    /// Max line size
    pub line_size: Option<usize>,
    /// Max number of headers in a part
    pub headers: usize,
    /// Max number of parts per multipart level
    pub parts: Option<usize>,
    /// Max number of whole stream
    pub stream_size: Option<u64>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            line_size: Some(Self::DEFAULT_LINE_SIZE),
            headers: Self::DEFAULT_HEADERS,
            parts: None,
            stream_size: None,
        }
    }
}

impl Limits {
    /// Chunk size, defaults to 8KB.
    pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

    /// Max number of line size, defaults to 16MB.
    pub const DEFAULT_LINE_SIZE: usize = 16 * 1024 * 1024;

    /// Max number of headers, defaults to 16.
    pub const DEFAULT_HEADERS: usize = 8 * 2;

    /// Chunk size
    ///
    /// # Panics
    ///
    /// If `size` is zero.
    #[must_use]
    pub fn chunk_size(mut self, size: usize) -> Self {
        assert!(size > 0, "The chunk_size cannot be zero.");

        self.chunk_size = size;
        self
    }

    /// Max line size
    #[must_use]
    pub fn line_size(mut self, max: usize) -> Self {
        self.line_size.replace(max);
        self
    }

    /// Max number of headers in a part
    #[must_use]
    pub fn headers(mut self, max: usize) -> Self {
        self.headers = max;
        self
    }

    /// Max number of parts per multipart level
    #[must_use]
    pub fn parts(mut self, max: usize) -> Self {
        self.parts.replace(max);
        self
    }

    /// Max number of whole stream size
    #[must_use]
    pub fn stream_size(mut self, max: u64) -> Self {
        self.stream_size.replace(max);
        self
    }

    /// Check line size
    #[must_use]
    pub fn checked_line_size(&self, rhs: usize) -> Option<usize> {
        self.line_size.filter(|max| rhs > *max)
    }

    /// Check parts
    #[must_use]
    pub fn checked_parts(&self, rhs: usize) -> Option<usize> {
        self.parts.filter(|max| rhs > *max)
    }

    /// Check stream size
    #[must_use]
    pub fn checked_stream_size(&self, rhs: u64) -> Option<u64> {
        self.stream_size.filter(|max| rhs > *max)
    }
}

#[cfg(test)]
mod tests {
    use super::Limits;

    #[test]
    fn checked() {
        let limits = Limits::default().parts(2).stream_size(10);

        assert_eq!(limits.checked_parts(2), None);
        assert_eq!(limits.checked_parts(3), Some(2));
        assert_eq!(limits.checked_stream_size(11), Some(10));
        assert_eq!(limits.checked_line_size(Limits::DEFAULT_LINE_SIZE), None);
        assert_eq!(
            Limits::default().checked_line_size(Limits::DEFAULT_LINE_SIZE + 1),
            Some(Limits::DEFAULT_LINE_SIZE)
        );
    }

    #[test]
    #[should_panic(expected = "The chunk_size cannot be zero.")]
    fn zero_chunk_size() {
        let _ = Limits::default().chunk_size(0);
    }
}
