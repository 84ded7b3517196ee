//! Every server option known to the supported server release.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::OptionKind;

pub const OPTION_FIELDS: &[(&str, OptionKind)] = &[
    ("AdminSafehouse", OptionKind::Bool),
    ("AllowCoop", OptionKind::Bool),
    ("AllowDestructionBySledgehammer", OptionKind::Bool),
    ("AllowNonAsciiUsername", OptionKind::Bool),
    ("AnnounceDeath", OptionKind::Bool),
    ("AntiCheatProtectionType1", OptionKind::Bool),
    ("AntiCheatProtectionType2", OptionKind::Bool),
    ("AntiCheatProtectionType3", OptionKind::Bool),
    ("AntiCheatProtectionType4", OptionKind::Bool),
    ("AntiCheatProtectionType5", OptionKind::Bool),
    ("AntiCheatProtectionType6", OptionKind::Bool),
    ("AntiCheatProtectionType7", OptionKind::Bool),
    ("AntiCheatProtectionType8", OptionKind::Bool),
    ("AntiCheatProtectionType9", OptionKind::Bool),
    ("AntiCheatProtectionType10", OptionKind::Bool),
    ("AntiCheatProtectionType11", OptionKind::Bool),
    ("AntiCheatProtectionType12", OptionKind::Bool),
    ("AntiCheatProtectionType13", OptionKind::Bool),
    ("AntiCheatProtectionType14", OptionKind::Bool),
    ("AntiCheatProtectionType15", OptionKind::Bool),
    ("AntiCheatProtectionType16", OptionKind::Bool),
    ("AntiCheatProtectionType17", OptionKind::Bool),
    ("AntiCheatProtectionType18", OptionKind::Bool),
    ("AntiCheatProtectionType19", OptionKind::Bool),
    ("AntiCheatProtectionType20", OptionKind::Bool),
    ("AntiCheatProtectionType21", OptionKind::Bool),
    ("AntiCheatProtectionType22", OptionKind::Bool),
    ("AntiCheatProtectionType23", OptionKind::Bool),
    ("AntiCheatProtectionType24", OptionKind::Bool),
    ("AntiCheatProtectionType2ThresholdMultiplier", OptionKind::Float),
    ("AntiCheatProtectionType3ThresholdMultiplier", OptionKind::Float),
    ("AntiCheatProtectionType4ThresholdMultiplier", OptionKind::Float),
    ("AntiCheatProtectionType9ThresholdMultiplier", OptionKind::Float),
    ("AntiCheatProtectionType15ThresholdMultiplier", OptionKind::Float),
    ("AntiCheatProtectionType20ThresholdMultiplier", OptionKind::Float),
    ("AntiCheatProtectionType22ThresholdMultiplier", OptionKind::Float),
    ("AntiCheatProtectionType24ThresholdMultiplier", OptionKind::Float),
    ("AutoCreateUserInWhiteList", OptionKind::Bool),
    ("BackupsCount", OptionKind::Int),
    ("BackupsOnStart", OptionKind::Bool),
    ("BackupsOnVersionChange", OptionKind::Bool),
    ("BackupsPeriod", OptionKind::Int),
    ("BanKickGlobalSound", OptionKind::Bool),
    ("BloodSplatLifespanDays", OptionKind::Int),
    ("CarEngineAttractionModifier", OptionKind::Float),
    ("ChatStreams", OptionKind::Text),
    ("ClientActionLogs", OptionKind::Text),
    ("ClientCommandFilter", OptionKind::Text),
    ("ConstructionPreventsLootRespawn", OptionKind::Bool),
    ("DefaultPort", OptionKind::Int),
    ("DenyLoginOnOverloadedServer", OptionKind::Bool),
    ("DisableRadioAdmin", OptionKind::Bool),
    ("DisableRadioGM", OptionKind::Bool),
    ("DisableRadioInvisible", OptionKind::Bool),
    ("DisableRadioModerator", OptionKind::Bool),
    ("DisableRadioOverseer", OptionKind::Bool),
    ("DisableRadioStaff", OptionKind::Bool),
    ("DisableSafehouseWhenPlayerConnected", OptionKind::Bool),
    ("DiscordEnable", OptionKind::Bool),
    ("DiscordToken", OptionKind::Text),
    ("DiscordChannel", OptionKind::Text),
    ("DiscordChannelID", OptionKind::Text),
    ("DisplayUserName", OptionKind::Bool),
    ("DoLuaChecksum", OptionKind::Bool),
    ("DropOffWhiteListAfterDeath", OptionKind::Bool),
    ("Faction", OptionKind::Bool),
    ("FactionDaySurvivedToCreate", OptionKind::Int),
    ("FactionPlayersRequiredForTag", OptionKind::Int),
    ("FastForwardMultiplier", OptionKind::Float),
    ("GlobalChat", OptionKind::Bool),
    ("HidePlayersBehindYou", OptionKind::Bool),
    ("HoursForLootRespawn", OptionKind::Int),
    ("ItemNumbersLimitPerContainer", OptionKind::Int),
    ("KickFastPlayers", OptionKind::Bool),
    ("KnockedDownAllowed", OptionKind::Bool),
    ("LoginQueueConnectTimeout", OptionKind::Int),
    ("LoginQueueEnabled", OptionKind::Bool),
    ("Map", OptionKind::Text),
    ("MapRemotePlayerVisibility", OptionKind::Int),
    ("MaxAccountsPerUser", OptionKind::Int),
    ("MaxItemsForLootRespawn", OptionKind::Int),
    ("MaxPlayers", OptionKind::Int),
    ("MinutesPerPage", OptionKind::Float),
    ("Mods", OptionKind::Text),
    ("MouseOverToSeeDisplayName", OptionKind::Bool),
    ("NoFire", OptionKind::Bool),
    ("Open", OptionKind::Bool),
    ("PVP", OptionKind::Bool),
    ("PVPFirearmDamageModifier", OptionKind::Float),
    ("PVPMeleeDamageModifier", OptionKind::Float),
    ("PVPMeleeWhileHitReaction", OptionKind::Bool),
    ("PauseEmpty", OptionKind::Bool),
    ("PerkLogs", OptionKind::Bool),
    ("PingLimit", OptionKind::Int),
    ("PlayerBumpPlayer", OptionKind::Bool),
    ("PlayerRespawnWithOther", OptionKind::Bool),
    ("PlayerRespawnWithSelf", OptionKind::Bool),
    ("PlayerSafehouse", OptionKind::Bool),
    ("Public", OptionKind::Bool),
    ("PublicDescription", OptionKind::Text),
    ("PublicName", OptionKind::Text),
    ("RemovePlayerCorpsesOnCorpseRemoval", OptionKind::Bool),
    ("ResetID", OptionKind::Int),
    ("SafeHouseRemovalTime", OptionKind::Int),
    ("SafehouseAllowFire", OptionKind::Bool),
    ("SafehouseAllowLoot", OptionKind::Bool),
    ("SafehouseAllowNonResidential", OptionKind::Bool),
    ("SafehouseAllowRespawn", OptionKind::Bool),
    ("SafehouseAllowTrepass", OptionKind::Bool),
    ("SafehouseDaySurvivedToClaim", OptionKind::Int),
    ("SafetyCooldownTimer", OptionKind::Int),
    ("SafetySystem", OptionKind::Bool),
    ("SafetyToggleTimer", OptionKind::Int),
    ("SaveWorldEveryMinutes", OptionKind::Int),
    ("ServerPlayerID", OptionKind::Int),
    ("ShowFirstAndLastName", OptionKind::Bool),
    ("ShowSafety", OptionKind::Bool),
    ("SledgehammerOnlyInSafehouse", OptionKind::Bool),
    ("SleepAllowed", OptionKind::Bool),
    ("SleepNeeded", OptionKind::Bool),
    ("SneakModeHideFromOtherPlayers", OptionKind::Bool),
    ("SpawnItems", OptionKind::Text),
    ("SpawnPoint", OptionKind::Text),
    ("SpeedLimit", OptionKind::Float),
    ("SteamScoreboard", OptionKind::Bool),
    ("SteamVAC", OptionKind::Bool),
    ("TrashDeleteAll", OptionKind::Bool),
    ("UDPPort", OptionKind::Int),
    ("UPnP", OptionKind::Bool),
    ("Voice3D", OptionKind::Bool),
    ("VoiceEnable", OptionKind::Bool),
    ("VoiceMaxDistance", OptionKind::Float),
    ("VoiceMinDistance", OptionKind::Float),
    ("WorkshopItems", OptionKind::Text),
    ("ServerWelcomeMessage", OptionKind::Text),
];

static FIELD_INDEX: LazyLock<HashMap<&'static str, usize>> = LazyLock::new(|| {
    OPTION_FIELDS
        .iter()
        .enumerate()
        .map(|(idx, (name, _))| (*name, idx))
        .collect()
});

/// Position of `name` in [`OPTION_FIELDS`]
pub fn field_index(name: &str) -> Option<usize> {
    FIELD_INDEX.get(name).copied()
}

pub fn field_kind(name: &str) -> Option<OptionKind> {
    field_index(name).map(|idx| OPTION_FIELDS[idx].1)
}
