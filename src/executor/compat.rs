//! Reply rules per server release.
//!
//! The server answers in plain English that shifts between builds. Every
//! action looks its rules up here so a new build only needs a new table.

use std::fmt;
use std::str::FromStr;

use super::classify::{ResponsePattern, ResponseRules};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ServerRelease {
    #[default]
    B41,
}

impl ServerRelease {
    pub const SUPPORTED: [ServerRelease; 1] = [ServerRelease::B41];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServerRelease::B41 => "b41",
        }
    }
}

impl fmt::Display for ServerRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerRelease {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "b41" | "41" | "build41" => Ok(ServerRelease::B41),
            other => Err(format!("Unsupported server release: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminAction {
    BanUser,
    UnbanUser,
    KickUser,
    TeleportToPlayer,
    TeleportToCoordinates,
    SetAccessLevel,
    AddXp,
    GodModeOn,
    GodModeOff,
    AddItem,
    AddVehicle,
    CreateHorde,
    Lightning,
    Thunder,
    StartRain,
    StartStorm,
    StopRain,
    StopWeather,
    Chopper,
    Gunshot,
    Alarm,
    ServerMessage,
    SaveWorld,
    StopServer,
    AddToWhitelist,
    RemoveFromWhitelist,
    ReloadOptions,
}

/// Rules that classify replies to `action` on `release`
pub fn rules(release: ServerRelease, action: AdminAction) -> ResponseRules {
    match release {
        ServerRelease::B41 => b41_rules(action),
    }
}

fn b41_rules(action: AdminAction) -> ResponseRules {
    use AdminAction::*;

    match action {
        BanUser => ResponseRules::containing("is now banned"),
        UnbanUser => ResponseRules::containing("is now un-banned"),
        KickUser => ResponseRules::containing("kicked"),
        TeleportToPlayer | TeleportToCoordinates => ResponseRules::containing("teleported"),
        SetAccessLevel => ResponseRules::new(vec![
            ResponsePattern::contains("is now"),
            ResponsePattern::contains("no longer"),
        ]),
        AddXp => ResponseRules::containing("Added"),
        GodModeOn => ResponseRules::containing("is now invincible"),
        GodModeOff => ResponseRules::containing("no more invincible"),
        ServerMessage => ResponseRules::containing("Message sent"),
        SaveWorld => ResponseRules::containing("saved"),
        AddToWhitelist => ResponseRules::containing("created")
            .with_error(ResponsePattern::contains("already exists")),
        RemoveFromWhitelist => ResponseRules::containing("removed"),
        ReloadOptions => ResponseRules::new(vec![ResponsePattern::exact("Options reloaded")]),
        AddItem | AddVehicle | CreateHorde | Lightning | Thunder | StartRain | StartStorm
        | StopRain | StopWeather | Chopper | Gunshot | Alarm | StopServer => {
            ResponseRules::lenient()
        }
    }
}
