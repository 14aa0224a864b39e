//! Desktop notification adapter
//!
//! Uses notify-rust (D-Bus on Linux, native APIs elsewhere) and falls back
//! to the `notify-send` command when the notification server rejects it.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::application::ports::{NotificationError, NotificationIcon, Notifier};

/// Desktop notifier for recording start/stop messages
pub struct DesktopNotifier {
    /// Application name for notifications
    app_name: String,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            app_name: "ScreenReel".to_string(),
        }
    }

    /// Create with custom app name
    pub fn with_app_name(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    async fn show_native(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        let title = title.to_owned();
        let message = message.to_owned();
        let app_name = self.app_name.clone();
        let icon_name = icon.icon_name();

        // notify-rust blocks on the D-Bus round trip
        tokio::task::spawn_blocking(move || {
            notify_rust::Notification::new()
                .appname(&app_name)
                .summary(&title)
                .body(&message)
                .icon(icon_name)
                .show()
                .map(|_| ())
                .map_err(|e| NotificationError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| NotificationError::SendFailed(format!("Task join error: {}", e)))?
    }

    async fn show_with_command(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        let status = Command::new("notify-send")
            .args([
                "--app-name",
                &self.app_name,
                "--icon",
                icon.icon_name(),
                title,
                message,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    NotificationError::NotifySendNotFound
                } else {
                    NotificationError::SendFailed(e.to_string())
                }
            })?;

        if !status.success() {
            return Err(NotificationError::SendFailed(format!(
                "notify-send exited with status: {}",
                status
            )));
        }
        Ok(())
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        match self.show_native(title, message, icon).await {
            Ok(()) => Ok(()),
            Err(e) if cfg!(target_os = "linux") => {
                debug!(error = %e, "native notification failed, trying notify-send");
                self.show_with_command(title, message, icon).await
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_app_name() {
        let notifier = DesktopNotifier::default();
        assert_eq!(notifier.app_name, "ScreenReel");
    }

    #[test]
    fn custom_app_name() {
        let notifier = DesktopNotifier::with_app_name("TestApp");
        assert_eq!(notifier.app_name, "TestApp");
    }

    #[test]
    fn recording_icon_name() {
        assert_eq!(NotificationIcon::Recording.icon_name(), "media-record");
    }
}
