//! Administrative actions, one command request each.

use std::path::Path;

use super::compat::{self, AdminAction, ServerRelease};
use super::{CommandParam, CommandRequest, NotificationTemplates};
use crate::roster::{AccessLevel, RosterUpdate};
use crate::session::{Notification, SessionManager};
use crate::storage::presets::{self, ServerMessage};

fn base(release: ServerRelease, action: AdminAction, template: &str) -> CommandRequest {
    CommandRequest::new(template).rules(compat::rules(release, action))
}

/// `reloadoptions`, used after an options push
pub fn reload_options(release: ServerRelease) -> CommandRequest {
    base(release, AdminAction::ReloadOptions, "reloadoptions").notifications(
        NotificationTemplates::untargeted(
            "Options saved and applied successfully",
            "Failed to reload options",
        ),
    )
}

impl SessionManager {
    fn request(&self, action: AdminAction, template: &str) -> CommandRequest {
        base(self.release(), action, template)
    }

    pub async fn ban_users(&self, names: &[String], reason: Option<&str>, ban_ip: bool) -> usize {
        let request = self
            .request(AdminAction::BanUser, "banuser {name} {ip} {reason}")
            .targets(names.iter().cloned())
            .param(CommandParam::switch("ip", "-ip", ban_ip))
            .param(CommandParam::optional("reason", reason).with_flag("-r").quoted())
            .on_success(RosterUpdate::SetBanned(true))
            .notifications(NotificationTemplates::for_targets("Banned", "ban"));
        self.execute(&request).await
    }

    pub async fn unban_users(&self, names: &[String]) -> usize {
        let request = self
            .request(AdminAction::UnbanUser, "unbanuser {name}")
            .targets(names.iter().cloned())
            .on_success(RosterUpdate::SetBanned(false))
            .notifications(NotificationTemplates::for_targets("Unbanned", "unban"));
        self.execute(&request).await
    }

    pub async fn kick_users(&self, names: &[String], reason: Option<&str>) -> usize {
        let request = self
            .request(AdminAction::KickUser, "kickuser {name} {reason}")
            .targets(names.iter().cloned())
            .param(CommandParam::optional("reason", reason).with_flag("-r").quoted())
            .on_success(RosterUpdate::MarkOffline)
            .notifications(NotificationTemplates::for_targets("Kicked", "kick"));
        self.execute(&request).await
    }

    pub async fn teleport_to_player(&self, names: &[String], destination: &str) -> usize {
        let request = self
            .request(AdminAction::TeleportToPlayer, "teleport {name} {destination}")
            .targets(names.iter().cloned())
            .param(CommandParam::required("destination", destination).quoted())
            .notifications(NotificationTemplates::for_targets("Teleported", "teleport"));
        self.execute(&request).await
    }

    pub async fn teleport_to_coordinates(&self, names: &[String], x: i64, y: i64, z: i64) -> usize {
        let request = self
            .request(AdminAction::TeleportToCoordinates, "teleportto {name} {coords}")
            .targets(names.iter().cloned())
            .param(CommandParam::required("coords", format!("{},{},{}", x, y, z)))
            .notifications(NotificationTemplates::for_targets("Teleported", "teleport"));
        self.execute(&request).await
    }

    pub async fn set_access_level(&self, names: &[String], level: AccessLevel) -> usize {
        let request = self
            .request(AdminAction::SetAccessLevel, "setaccesslevel {name} {level}")
            .targets(names.iter().cloned())
            .param(CommandParam::required("level", level.as_str()))
            .on_success(RosterUpdate::SetAccessLevel(level))
            .notifications(NotificationTemplates::for_targets(
                "Changed access level of",
                "change access level of",
            ));
        self.execute(&request).await
    }

    /// One request per perk; returns successes across all of them
    pub async fn add_xp(&self, names: &[String], perks: &[(String, u32)]) -> usize {
        let mut successes = 0;
        for (perk, amount) in perks {
            let request = self
                .request(AdminAction::AddXp, "addxp {name} {perk}")
                .targets(names.iter().cloned())
                .param(CommandParam::required("perk", format!("{}={}", perk.trim(), amount)))
                .notifications(NotificationTemplates::for_targets(
                    &format!("Added {} XP to", perk.trim()),
                    &format!("add {} XP to", perk.trim()),
                ));
            successes += self.execute(&request).await;
        }
        successes
    }

    pub async fn set_god_mode(&self, names: &[String], enabled: bool) -> usize {
        let (action, flag, done, verb) = if enabled {
            (AdminAction::GodModeOn, "-true", "Enabled god mode for", "enable god mode for")
        } else {
            (AdminAction::GodModeOff, "-false", "Disabled god mode for", "disable god mode for")
        };
        let request = self
            .request(action, "godmod {name} {state}")
            .targets(names.iter().cloned())
            .param(CommandParam::switch("state", flag, true))
            .notifications(NotificationTemplates::for_targets(done, verb));
        self.execute(&request).await
    }

    /// One request per item; returns successes across all of them
    pub async fn add_items(&self, names: &[String], items: &[(String, u32)]) -> usize {
        let mut successes = 0;
        for (item, count) in items {
            let request = self
                .request(AdminAction::AddItem, "additem {name} {item} {count}")
                .targets(names.iter().cloned())
                .param(CommandParam::required("item", item.trim()).quoted())
                .param(CommandParam::required("count", count.to_string()))
                .notifications(NotificationTemplates::for_targets(
                    &format!("Gave {} x{} to", item.trim(), count),
                    &format!("give {} to", item.trim()),
                ));
            successes += self.execute(&request).await;
        }
        successes
    }

    /// Give every entry of a saved item list
    pub async fn add_items_from_file(&self, names: &[String], path: &Path) -> usize {
        match presets::load_items(path) {
            Ok(records) => {
                let items: Vec<(String, u32)> = records
                    .into_iter()
                    .map(|record| (record.item_id, record.count))
                    .collect();
                self.add_items(names, &items).await
            }
            Err(err) => {
                self.events().notify(
                    Notification::error("Failed to load item list")
                        .with_message(err.to_string())
                        .with_path(path.display().to_string()),
                );
                0
            }
        }
    }

    pub async fn add_vehicle(&self, names: &[String], vehicle: &str) -> usize {
        let request = self
            .request(AdminAction::AddVehicle, "addvehicle {vehicle} {name}")
            .targets(names.iter().cloned())
            .param(CommandParam::required("vehicle", vehicle).quoted())
            .notifications(NotificationTemplates::for_targets(
                "Spawned a vehicle for",
                "spawn a vehicle for",
            ));
        self.execute(&request).await
    }

    pub async fn create_horde(&self, names: &[String], count: u32) -> usize {
        let request = self
            .request(AdminAction::CreateHorde, "createhorde {count} {name}")
            .targets(names.iter().cloned())
            .param(CommandParam::required("count", count.to_string()))
            .notifications(NotificationTemplates::for_targets(
                "Spawned a horde near",
                "spawn a horde near",
            ));
        self.execute(&request).await
    }

    pub async fn lightning(&self, names: &[String]) -> usize {
        let request = self
            .request(AdminAction::Lightning, "lightning {name}")
            .targets(names.iter().cloned())
            .notifications(NotificationTemplates::for_targets(
                "Triggered lightning for",
                "trigger lightning for",
            ));
        self.execute(&request).await
    }

    pub async fn thunder(&self, names: &[String]) -> usize {
        let request = self
            .request(AdminAction::Thunder, "thunder {name}")
            .targets(names.iter().cloned())
            .notifications(NotificationTemplates::for_targets(
                "Triggered thunder for",
                "trigger thunder for",
            ));
        self.execute(&request).await
    }

    /// Intensity is 1 to 100
    pub async fn start_rain(&self, intensity: Option<u8>) -> usize {
        let request = self
            .request(AdminAction::StartRain, "startrain {intensity}")
            .param(CommandParam::optional(
                "intensity",
                intensity.map(|i| i.clamp(1, 100).to_string()),
            ))
            .notifications(NotificationTemplates::untargeted("Rain started", "Failed to start rain"));
        self.execute(&request).await
    }

    pub async fn start_storm(&self, duration_hours: Option<u32>) -> usize {
        let request = self
            .request(AdminAction::StartStorm, "startstorm {duration}")
            .param(CommandParam::optional(
                "duration",
                duration_hours.map(|h| h.to_string()),
            ))
            .notifications(NotificationTemplates::untargeted(
                "Storm started",
                "Failed to start storm",
            ));
        self.execute(&request).await
    }

    pub async fn stop_rain(&self) -> usize {
        self.untargeted(AdminAction::StopRain, "stoprain", "Rain stopped", "Failed to stop rain")
            .await
    }

    pub async fn stop_weather(&self) -> usize {
        self.untargeted(
            AdminAction::StopWeather,
            "stopweather",
            "Weather stopped",
            "Failed to stop weather",
        )
        .await
    }

    pub async fn chopper(&self) -> usize {
        self.untargeted(
            AdminAction::Chopper,
            "chopper",
            "Helicopter event triggered",
            "Failed to trigger helicopter event",
        )
        .await
    }

    pub async fn gunshot(&self) -> usize {
        self.untargeted(
            AdminAction::Gunshot,
            "gunshot",
            "Gunshot triggered",
            "Failed to trigger gunshot",
        )
        .await
    }

    pub async fn alarm(&self) -> usize {
        self.untargeted(AdminAction::Alarm, "alarm", "Alarm triggered", "Failed to trigger alarm")
            .await
    }

    pub async fn server_message(&self, message: &str) -> usize {
        let request = self
            .request(AdminAction::ServerMessage, "servermsg {message}")
            .param(CommandParam::required("message", message).quoted())
            .notifications(NotificationTemplates::untargeted(
                "Message sent",
                "Failed to send message",
            ));
        self.execute(&request).await
    }

    /// Broadcast a saved message with its line colors
    pub async fn server_message_from_file(&self, path: &Path) -> usize {
        let message = match ServerMessage::load(path) {
            Ok(message) => message,
            Err(err) => {
                self.events().notify(
                    Notification::error("Failed to load message")
                        .with_message(err.to_string())
                        .with_path(path.display().to_string()),
                );
                return 0;
            }
        };
        if message.is_blank() {
            self.events()
                .notify(Notification::warning("Message is empty").with_path(path.display().to_string()));
            return 0;
        }
        self.server_message(&message.render()).await
    }

    pub async fn save_world(&self) -> usize {
        self.untargeted(AdminAction::SaveWorld, "save", "World saved", "Failed to save world")
            .await
    }

    pub async fn stop_server(&self) -> usize {
        self.untargeted(
            AdminAction::StopServer,
            "quit",
            "Server is shutting down",
            "Failed to stop server",
        )
        .await
    }

    pub async fn add_to_whitelist(&self, name: &str, password: &str) -> usize {
        let request = self
            .request(AdminAction::AddToWhitelist, "adduser {name} {password}")
            .targets([name])
            .param(CommandParam::required("password", password).quoted())
            .notifications(NotificationTemplates::for_targets(
                "Added to whitelist:",
                "add to whitelist:",
            ));
        self.execute(&request).await
    }

    pub async fn remove_from_whitelist(&self, names: &[String]) -> usize {
        let request = self
            .request(AdminAction::RemoveFromWhitelist, "removeuserfromwhitelist {name}")
            .targets(names.iter().cloned())
            .notifications(NotificationTemplates::for_targets(
                "Removed from whitelist:",
                "remove from whitelist:",
            ));
        self.execute(&request).await
    }

    pub async fn reload_server_options(&self) -> usize {
        self.execute(&reload_options(self.release())).await
    }

    async fn untargeted(
        &self,
        action: AdminAction,
        template: &str,
        success: &str,
        failure: &str,
    ) -> usize {
        let request = self
            .request(action, template)
            .notifications(NotificationTemplates::untargeted(success, failure));
        self.execute(&request).await
    }
}
