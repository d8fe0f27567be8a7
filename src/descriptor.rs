//! Declarative cache operation descriptors
//!
//! Descriptors are built once, usually where operations are wired together,
//! and never change afterwards. Each carries a [`KeySpec`] naming the key
//! template and which call arguments feed it.

use std::time::Duration;

use crate::CacheError;

/// Default time-to-live for written entries (4 hours)
pub const DEFAULT_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Default time-to-live for cached empty results (5 minutes)
pub const NULL_TTL: Duration = Duration::from_secs(5 * 60);

/// Key template plus the argument positions that fill it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    template: String,
    arg_indices: Vec<usize>,
}

impl KeySpec {
    /// Create a key spec using every call argument. The template must not be empty.
    pub fn new(template: impl Into<String>) -> Result<Self, CacheError> {
        let template = template.into();
        if template.is_empty() {
            return Err(CacheError::InvalidDescriptor("key template must not be empty"));
        }
        Ok(Self {
            template,
            arg_indices: Vec::new(),
        })
    }

    /// Restrict the template's candidates to these argument positions, in this order
    pub fn with_args(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.arg_indices = indices.into_iter().collect();
        self
    }

    /// Key template with `{path}` placeholders
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Argument positions feeding the template; empty means all arguments
    pub fn arg_indices(&self) -> &[usize] {
        &self.arg_indices
    }
}

/// Whether a read-through consults the store before invoking the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Serve a stored value when present
    #[default]
    ReadFirst,
    /// Always invoke the operation, then store its result
    Bypass,
}

/// Read-through descriptor: serve from the store, or invoke and cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadThrough {
    key: KeySpec,
    ttl: Duration,
    mode: ReadMode,
    sync: bool,
    cache_null: bool,
    null_ttl: Duration,
}

impl ReadThrough {
    /// Create a read-first descriptor with the default TTL. The template must not be empty.
    pub fn new(template: impl Into<String>) -> Result<Self, CacheError> {
        Ok(Self {
            key: KeySpec::new(template)?,
            ttl: DEFAULT_TTL,
            mode: ReadMode::default(),
            sync: false,
            cache_null: true,
            null_ttl: NULL_TTL,
        })
    }

    /// Restrict the key's candidates to these argument positions
    pub fn with_args(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.key = self.key.with_args(indices);
        self
    }

    /// Time-to-live for values written on a miss. Zero means no expiry.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Choose between serving stored values and always invoking
    pub fn with_mode(mut self, mode: ReadMode) -> Self {
        self.mode = mode;
        self
    }

    /// Coalesce concurrent misses on the same resolved key into one invocation
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Carried for configuration compatibility; empty results are never written.
    pub fn with_null_caching(mut self, cache_null: bool, null_ttl: Duration) -> Self {
        self.cache_null = cache_null;
        self.null_ttl = null_ttl;
        self
    }

    /// Key template and argument selection
    pub fn key(&self) -> &KeySpec {
        &self.key
    }

    /// Time-to-live for stored results
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read mode
    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// Whether concurrent misses are coalesced
    pub fn sync(&self) -> bool {
        self.sync
    }

    /// Whether empty results would be cached
    pub fn cache_null(&self) -> bool {
        self.cache_null
    }

    /// TTL for cached empty results
    pub fn null_ttl(&self) -> Duration {
        self.null_ttl
    }
}

/// Write-through descriptor: store a successful result after the call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteThrough {
    key: KeySpec,
    ttl: Duration,
}

impl WriteThrough {
    /// Create a write-through descriptor with the default TTL
    pub fn new(template: impl Into<String>) -> Result<Self, CacheError> {
        Ok(Self {
            key: KeySpec::new(template)?,
            ttl: DEFAULT_TTL,
        })
    }

    /// Restrict the key's candidates to these argument positions
    pub fn with_args(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.key = self.key.with_args(indices);
        self
    }

    /// Time-to-live for the written value. Zero means no expiry.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Key template and argument selection
    pub fn key(&self) -> &KeySpec {
        &self.key
    }

    /// Time-to-live for the written value
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Evict descriptor: delete a key after the call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evict {
    key: KeySpec,
}

impl Evict {
    /// Create an evict descriptor for the given key template
    pub fn new(template: impl Into<String>) -> Result<Self, CacheError> {
        Ok(Self {
            key: KeySpec::new(template)?,
        })
    }

    /// Restrict the key's candidates to these argument positions
    pub fn with_args(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.key = self.key.with_args(indices);
        self
    }

    /// Key template and argument selection
    pub fn key(&self) -> &KeySpec {
        &self.key
    }
}

/// Several write-through and evict descriptors applied around one call.
///
/// Writes run before evictions, each class in the order added. Read-through
/// entries are accepted for configuration compatibility but never executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composite {
    read_through: Vec<ReadThrough>,
    write_through: Vec<WriteThrough>,
    evict: Vec<Evict>,
}

impl Composite {
    /// An empty composite
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a read-through entry. It is kept but not executed.
    pub fn with_read_through(mut self, descriptor: ReadThrough) -> Self {
        self.read_through.push(descriptor);
        self
    }

    /// Add a write-through, applied after earlier ones
    pub fn with_write_through(mut self, descriptor: WriteThrough) -> Self {
        self.write_through.push(descriptor);
        self
    }

    /// Add an eviction, applied after every write-through
    pub fn with_evict(mut self, descriptor: Evict) -> Self {
        self.evict.push(descriptor);
        self
    }

    pub fn read_through(&self) -> &[ReadThrough] {
        &self.read_through
    }

    pub fn write_through(&self) -> &[WriteThrough] {
        &self.write_through
    }

    pub fn evict(&self) -> &[Evict] {
        &self.evict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_through_defaults() {
        let descriptor = ReadThrough::new("USER:{id}").expect("valid template");
        assert_eq!(descriptor.key().template(), "USER:{id}");
        assert!(descriptor.key().arg_indices().is_empty());
        assert_eq!(descriptor.ttl(), Duration::from_secs(14_400));
        assert_eq!(descriptor.mode(), ReadMode::ReadFirst);
        assert!(!descriptor.sync());
        assert!(descriptor.cache_null());
        assert_eq!(descriptor.null_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_builders() {
        let descriptor = ReadThrough::new("REL:{a}:{b}")
            .expect("valid template")
            .with_args([1, 0])
            .with_ttl(Duration::from_secs(60))
            .with_mode(ReadMode::Bypass)
            .with_sync(true);
        assert_eq!(descriptor.key().arg_indices(), &[1, 0]);
        assert_eq!(descriptor.ttl(), Duration::from_secs(60));
        assert_eq!(descriptor.mode(), ReadMode::Bypass);
        assert!(descriptor.sync());

        let put = WriteThrough::new("P:{id}").expect("valid template").with_args([2]);
        assert_eq!(put.key().arg_indices(), &[2]);
        assert_eq!(put.ttl(), DEFAULT_TTL);
    }

    #[test]
    fn test_empty_template_rejected() {
        assert!(matches!(
            ReadThrough::new(""),
            Err(CacheError::InvalidDescriptor(_))
        ));
        assert!(WriteThrough::new(String::new()).is_err());
        assert!(Evict::new("").is_err());
    }

    #[test]
    fn test_composite_keeps_declaration_order() {
        let composite = Composite::new()
            .with_evict(Evict::new("B").expect("valid"))
            .with_write_through(WriteThrough::new("A1").expect("valid"))
            .with_write_through(WriteThrough::new("A2").expect("valid"))
            .with_evict(Evict::new("C").expect("valid"));

        let writes: Vec<_> = composite
            .write_through()
            .iter()
            .map(|d| d.key().template())
            .collect();
        let evicts: Vec<_> = composite
            .evict()
            .iter()
            .map(|d| d.key().template())
            .collect();
        assert_eq!(writes, ["A1", "A2"]);
        assert_eq!(evicts, ["B", "C"]);
        assert!(composite.read_through().is_empty());
    }
}
