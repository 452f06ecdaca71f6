// AHash-backed set used for read-group ids and ignored error kinds.
// Bring in `HashSetExt` alongside it for `::new()` / `::with_capacity()`.
pub type HashSet<K> = ahash::HashSet<K>;
pub use ahash::HashSetExt;
