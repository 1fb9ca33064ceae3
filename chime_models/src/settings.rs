use std::path::PathBuf;

use serde::Deserialize;

use crate::reminder_time::ReminderTime;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".chime"),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct NotificationSettings {
    pub title: String,
    /// `{time}` is replaced with the reminder time.
    pub body_template: String,
    pub sound: bool,
}

impl NotificationSettings {
    pub fn body_for(&self, time: &ReminderTime) -> String {
        self.body_template.replace("{time}", &time.to_string())
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            title: "Reminder".to_string(),
            body_template: "It's time for your reminder at {time}".to_string(),
            sound: true,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ScheduleSettings {
    /// `local` or an IANA timezone name.
    pub timezone: String,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            timezone: "local".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub notification: NotificationSettings,
    pub schedule: ScheduleSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_template_substitutes_time() {
        let settings = NotificationSettings {
            body_template: "Chant at {time}!".to_string(),
            ..Default::default()
        };

        assert_eq!(
            settings.body_for(&ReminderTime::new(6, 0).unwrap()),
            "Chant at 06:00!"
        );
    }
}
