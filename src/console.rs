use std::{ops::ControlFlow, str::FromStr};

use chime_models::{
    clock::TimezonePolicy, permission::Permission, reminder_time::ReminderTime,
    settings::NotificationSettings,
};
use chime_notify::EmitResult;
use chime_scheduler::{SchedulerError, SchedulerHandle, format_next};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  add <HH:MM>     schedule a daily reminder
  remove <HH:MM>  remove a scheduled time
  list            show scheduled times
  history         show recently shown notifications
  next            show the next notification time
  test            show a test notification now
  enable          allow notifications
  disable         block notifications
  status          show permission and schedule summary
  help            show this message
  quit            stop and exit";

const BLOCKED: &str = "Notifications are blocked. Run `enable` to allow them.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    Remove(String),
    List,
    History,
    Next,
    Test,
    Enable,
    Disable,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command \"{0}\". Type `help` for the list of commands")]
    Unknown(String),

    #[error("`{0}` expects a time, e.g. `{0} 08:00`")]
    MissingTime(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default().to_lowercase();
        let argument = words.next().map(str::to_string);

        let with_time = |name: &'static str, make: fn(String) -> Command| {
            argument.clone().map(make).ok_or(CommandError::MissingTime(name))
        };

        match name.as_str() {
            "add" => with_time("add", Command::Add),
            "remove" | "rm" => with_time("remove", Command::Remove),
            "list" | "ls" => Ok(Command::List),
            "history" => Ok(Command::History),
            "next" => Ok(Command::Next),
            "test" => Ok(Command::Test),
            "enable" => Ok(Command::Enable),
            "disable" => Ok(Command::Disable),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            _ => Err(CommandError::Unknown(name)),
        }
    }
}

/// Line-oriented front end over a running scheduler.
pub struct Console {
    handle: SchedulerHandle,
    policy: TimezonePolicy,
    notification: NotificationSettings,
}

impl Console {
    pub fn new(
        handle: SchedulerHandle,
        policy: TimezonePolicy,
        notification: NotificationSettings,
    ) -> Self {
        Self {
            handle,
            policy,
            notification,
        }
    }

    /// Reads commands from stdin until `quit`, end of input or Ctrl-C.
    pub async fn run(&self) -> anyhow::Result<()> {
        if let ControlFlow::Continue(status) = self.execute(Command::Status).await? {
            println!("{status}");
        }
        println!("Type `help` for the list of commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Received Ctrl-C, shutting down");
                    break;
                }
                line = lines.next_line() => line?,
            };

            let Some(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(e) => {
                    println!("{e}");
                    continue;
                }
            };

            match self.execute(command).await? {
                ControlFlow::Continue(output) => println!("{output}"),
                ControlFlow::Break(()) => break,
            }
        }

        self.handle.shutdown().await?;
        Ok(())
    }

    pub async fn execute(&self, command: Command) -> Result<ControlFlow<(), String>, SchedulerError> {
        let output = match command {
            Command::Add(raw) => match self.handle.add(&raw).await {
                Ok(time) => format!("Added notification for {time}"),
                Err(SchedulerError::Store(e)) => e.to_string(),
                Err(e) => return Err(e),
            },
            Command::Remove(raw) => match raw.parse::<ReminderTime>() {
                Ok(time) => match self.handle.remove(&raw).await? {
                    true => format!("Removed scheduled time: {time}"),
                    false => format!("Time {time} is not scheduled"),
                },
                Err(e) => e.to_string(),
            },
            Command::List => {
                let times = self.handle.list().await?;
                if times.is_empty() {
                    "No times scheduled".to_string()
                } else {
                    times
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Command::History => {
                let entries = self.handle.history().await?;
                if entries.is_empty() {
                    "No notifications yet".to_string()
                } else {
                    entries
                        .iter()
                        .map(|entry| {
                            let fired_at = self.policy.wall_clock(entry.fired_at);
                            format!("{}  {}", fired_at.format("%Y-%m-%d %I:%M %p"), entry.message)
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Command::Next => {
                let next = self.handle.next_occurrence().await?;
                format!("Next notification: {}", format_next(next))
            }
            Command::Test => {
                let title = format!("{} Test", self.notification.title);
                match self
                    .handle
                    .emit(&title, "This is a test notification")
                    .await?
                {
                    EmitResult::Shown => "Test notification sent!".to_string(),
                    EmitResult::PermissionDenied => {
                        "Please enable notifications first".to_string()
                    }
                    EmitResult::Unsupported => {
                        "This system does not support desktop notifications".to_string()
                    }
                    EmitResult::PlatformError => {
                        "Could not show the notification, see the log for details".to_string()
                    }
                }
            }
            Command::Enable => match self.handle.request_permission().await? {
                Permission::Granted => {
                    "Notifications enabled! Add times to get started.".to_string()
                }
                _ => BLOCKED.to_string(),
            },
            Command::Disable => {
                self.handle.revoke_permission().await?;
                "Notifications disabled.".to_string()
            }
            Command::Status => {
                let permission = match self.handle.permission().await? {
                    Permission::Granted => "Notifications are enabled!",
                    Permission::Denied => BLOCKED,
                    Permission::Default => "Run `enable` to turn on notifications.",
                };
                let count = self.handle.list().await?.len();
                let next = format_next(self.handle.next_occurrence().await?);
                format!("{permission}\nScheduled times: {count}, next notification: {next}")
            }
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(ControlFlow::Break(())),
        };

        Ok(ControlFlow::Continue(output))
    }
}

#[cfg(test)]
mod tests;
