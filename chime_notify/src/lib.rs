mod audio;
mod display;
mod emitter;
mod permission;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use audio::{AudioCue, NoSound, TerminalBell};
#[cfg(feature = "sound")]
pub use audio::SineTone;
pub use display::{ConsoleDisplay, DisplayError, Notification, NotificationDisplay};
#[cfg(feature = "desktop")]
pub use display::DesktopDisplay;
pub use emitter::{EmitResult, NotificationEmitter};
pub use permission::{PERMISSION_KEY, PermissionProvider, StoredPermission};
