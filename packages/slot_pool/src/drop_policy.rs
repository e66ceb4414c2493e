/// Determines what happens when a pool is dropped while some of its slots are still live.
///
/// By default, the pool simply drops all of its storage.
///
/// # Examples
///
/// ```
/// use slot_pool::{DropPolicy, IndexedPool};
///
/// // The drop policy is set at pool creation time.
/// let pool = IndexedPool::<u32>::builder()
///     .drop_policy(DropPolicy::MustNotDropLiveSlots)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The pool drops its storage, including live slots, when it is dropped. This is the default.
    #[default]
    MayDropLiveSlots,

    /// The pool will panic if it still has live slots when it is dropped.
    ///
    /// This may be valuable when every handle is expected to be released before the pool goes
    /// away, for example because handles are stored in other data structures that must be torn
    /// down first. A panic here points at a handle leak.
    MustNotDropLiveSlots,
}
