//! Timing rules per editing surface

use std::fmt;
use std::time::Duration;

/// Where an editor lives. Each surface gets its own sync engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Surface {
    #[default]
    MainWindow,
    FloatingWindow,
    Mobile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Quiet period after the last edit before a save is sent
    pub debounce: Duration,
    /// Periodic server check while the editor is open
    pub poll_interval: Option<Duration>,
    /// Check the server when the editor regains focus
    pub sync_on_focus: bool,
}

impl SyncPolicy {
    pub const fn for_surface(surface: Surface) -> Self {
        match surface {
            Surface::MainWindow => Self {
                debounce: Duration::from_millis(1000),
                poll_interval: Some(Duration::from_secs(5)),
                sync_on_focus: false,
            },
            Surface::FloatingWindow => Self {
                debounce: Duration::from_millis(800),
                poll_interval: None,
                sync_on_focus: true,
            },
            Surface::Mobile => Self {
                debounce: Duration::from_millis(800),
                poll_interval: None,
                sync_on_focus: true,
            },
        }
    }
}

impl Surface {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MainWindow => "main",
            Self::FloatingWindow => "floating",
            Self::Mobile => "mobile",
        }
    }

    pub const fn policy(self) -> SyncPolicy {
        SyncPolicy::for_surface(self)
    }

    /// Title used when a note is saved with an empty title
    pub fn fallback_title(self) -> String {
        match self {
            Self::FloatingWindow => {
                format!("Quick Note {}", chrono::Local::now().format("%H:%M:%S"))
            }
            Self::MainWindow | Self::Mobile => "Untitled".to_string(),
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_window_polls_and_floating_syncs_on_focus() {
        let main = Surface::MainWindow.policy();
        assert_eq!(main.debounce, Duration::from_millis(1000));
        assert_eq!(main.poll_interval, Some(Duration::from_secs(5)));
        assert!(!main.sync_on_focus);

        let floating = Surface::FloatingWindow.policy();
        assert_eq!(floating.debounce, Duration::from_millis(800));
        assert_eq!(floating.poll_interval, None);
        assert!(floating.sync_on_focus);
    }

    #[test]
    fn fallback_titles() {
        assert_eq!(Surface::MainWindow.fallback_title(), "Untitled");
        assert!(Surface::FloatingWindow.fallback_title().starts_with("Quick Note "));
    }
}
