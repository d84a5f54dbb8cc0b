//! Desktop stand-in for the browser's `window.open` / `location.href`.

use anyhow::Context;
use std::sync::Mutex;
use tracing::info;
use webagent_core::Navigator;

type Opener = Box<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

/// Opens URLs in the system browser and tracks the page the widget lives on.
pub struct DesktopNavigator {
    opener: Opener,
    location: Mutex<Option<String>>,
}

impl DesktopNavigator {
    pub fn new() -> Self {
        Self::with_opener(|url| webbrowser::open(url))
    }

    pub fn with_opener(opener: impl Fn(&str) -> std::io::Result<()> + Send + Sync + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            location: Mutex::new(None),
        }
    }

    /// The last location set by a `navigate_to_section` command.
    pub fn current_location(&self) -> Option<String> {
        self.location
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for DesktopNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for DesktopNavigator {
    fn open_in_new_context(&self, url: &str) -> anyhow::Result<()> {
        (self.opener)(url).with_context(|| format!("Failed to open {url}"))
    }

    fn replace_location(&self, url: &str) -> anyhow::Result<()> {
        (self.opener)(url).with_context(|| format!("Failed to navigate to {url}"))?;
        let previous = self
            .location
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(url.to_string());
        info!(from = ?previous, to = %url, "Handed off page location");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recording() -> (DesktopNavigator, Arc<Mutex<Vec<String>>>) {
        let opened = Arc::new(Mutex::new(Vec::new()));
        let sink = opened.clone();
        let navigator = DesktopNavigator::with_opener(move |url| {
            sink.lock().unwrap().push(url.to_string());
            Ok(())
        });
        (navigator, opened)
    }

    #[test]
    fn test_open_in_new_context_leaves_location_alone() {
        let (navigator, opened) = recording();
        navigator.open_in_new_context("https://example.com").unwrap();

        assert_eq!(opened.lock().unwrap().as_slice(), ["https://example.com"]);
        assert_eq!(navigator.current_location(), None);
    }

    #[test]
    fn test_replace_location_updates_current_page() {
        let (navigator, opened) = recording();
        navigator.replace_location("https://web.afterlife.org.in/about").unwrap();
        navigator.replace_location("https://web.afterlife.org.in/pricing").unwrap();

        assert_eq!(
            navigator.current_location().as_deref(),
            Some("https://web.afterlife.org.in/pricing")
        );
        assert_eq!(opened.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_opener_failure_is_reported() {
        let navigator = DesktopNavigator::with_opener(|_| {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no browser"))
        });
        let err = navigator.open_in_new_context("https://example.com").unwrap_err();
        assert!(err.to_string().contains("https://example.com"));
    }

    #[test]
    fn test_failed_navigation_keeps_previous_location() {
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = fail.clone();
        let navigator = DesktopNavigator::with_opener(move |_| {
            if flag.load(std::sync::atomic::Ordering::SeqCst) {
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no browser"))
            } else {
                Ok(())
            }
        });

        navigator.replace_location("https://web.afterlife.org.in/about").unwrap();
        fail.store(true, std::sync::atomic::Ordering::SeqCst);
        let err = navigator
            .replace_location("https://web.afterlife.org.in/pricing")
            .unwrap_err();

        assert!(err.to_string().contains("/pricing"));
        assert_eq!(
            navigator.current_location().as_deref(),
            Some("https://web.afterlife.org.in/about")
        );
    }
}
