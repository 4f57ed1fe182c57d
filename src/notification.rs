//! System notifications via freedesktop D-Bus.

use std::collections::HashMap;
use zbus::{Connection, proxy};

/// D-Bus interface for freedesktop Notifications.
#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    /// Send a notification; returns its id.
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, zbus::zvariant::Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Send a system notification.
///
/// # Arguments
/// * `summary` - Notification title
/// * `body` - Notification body text
/// * `icon` - Icon name
/// * `timeout_ms` - How long the notification stays visible
pub async fn send_notification(
    summary: &str,
    body: &str,
    icon: &str,
    timeout_ms: i32,
) -> Result<(), String> {
    let connection = Connection::session()
        .await
        .map_err(|e| format!("Failed to connect to session bus: {}", e))?;

    let proxy = NotificationsProxy::new(&connection)
        .await
        .map_err(|e| format!("Failed to create notifications proxy: {}", e))?;

    proxy
        .notify(
            "Wayshare",
            0,
            icon,
            summary,
            body,
            vec![],
            HashMap::new(),
            timeout_ms,
        )
        .await
        .map_err(|e| format!("Failed to send notification: {}", e))?;

    Ok(())
}

/// Icon for a notification title: errors get a warning icon.
pub fn icon_for(summary: &str) -> &'static str {
    if summary == "Error" {
        "dialog-error"
    } else {
        "emblem-shared"
    }
}
