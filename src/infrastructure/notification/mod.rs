//! Notification infrastructure module

mod desktop;

pub use desktop::DesktopNotifier;

use crate::application::ports::{Notifier, SilentNotifier};

/// Create the notifier for the current run
pub fn create_notifier(enabled: bool) -> Box<dyn Notifier> {
    if enabled {
        Box::new(DesktopNotifier::new())
    } else {
        Box::new(SilentNotifier)
    }
}
