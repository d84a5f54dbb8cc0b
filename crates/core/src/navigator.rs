/// The host's page navigation surface.
///
/// Implementations are called from the session task and must not block for
/// long.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Opens `url` in a new browsing context, leaving the current page alone.
    fn open_in_new_context(&self, url: &str) -> anyhow::Result<()>;

    /// Replaces the current page location with `url`.
    fn replace_location(&self, url: &str) -> anyhow::Result<()>;
}
