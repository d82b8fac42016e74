//! Module origins and routing keys exchanged over the bus
//!
//! Both sets are closed. Parsing wire text returns `None` for unknown values
//! so the caller can treat the field as absent instead of failing hard.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical module that produced (or should consume) a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    AuthModule,
    DevicesModule,
    TriggersModule,
    UiModule,
    WebUiModule,
    WebsocketServerModule,
    NotSpecified,
}

impl Origin {
    /// Every known origin
    pub const ALL: [Origin; 7] = [
        Origin::AuthModule,
        Origin::DevicesModule,
        Origin::TriggersModule,
        Origin::UiModule,
        Origin::WebUiModule,
        Origin::WebsocketServerModule,
        Origin::NotSpecified,
    ];

    /// Wire value of this origin
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::AuthModule => "auth_module",
            Origin::DevicesModule => "devices_module",
            Origin::TriggersModule => "triggers_module",
            Origin::UiModule => "ui_module",
            Origin::WebUiModule => "web_ui_module",
            Origin::WebsocketServerModule => "websocket_server_module",
            Origin::NotSpecified => "not_specified",
        }
    }

    /// Parse a wire value, `None` when it is not a known origin
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|origin| origin.as_str() == value)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic type of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutingKey {
    #[serde(rename = "devices.entity.created")]
    DevicesEntityCreated,
    #[serde(rename = "devices.entity.updated")]
    DevicesEntityUpdated,
    #[serde(rename = "devices.entity.deleted")]
    DevicesEntityDeleted,
    #[serde(rename = "devices.entity.reported")]
    DevicesEntityReported,

    #[serde(rename = "devices.property.entity.created")]
    DevicesPropertyEntityCreated,
    #[serde(rename = "devices.property.entity.updated")]
    DevicesPropertyEntityUpdated,
    #[serde(rename = "devices.property.entity.deleted")]
    DevicesPropertyEntityDeleted,
    #[serde(rename = "devices.property.entity.reported")]
    DevicesPropertyEntityReported,

    #[serde(rename = "devices.configuration.entity.created")]
    DevicesConfigurationEntityCreated,
    #[serde(rename = "devices.configuration.entity.updated")]
    DevicesConfigurationEntityUpdated,
    #[serde(rename = "devices.configuration.entity.deleted")]
    DevicesConfigurationEntityDeleted,

    #[serde(rename = "channels.entity.created")]
    ChannelsEntityCreated,
    #[serde(rename = "channels.entity.updated")]
    ChannelsEntityUpdated,
    #[serde(rename = "channels.entity.deleted")]
    ChannelsEntityDeleted,

    #[serde(rename = "channels.property.entity.created")]
    ChannelsPropertyEntityCreated,
    #[serde(rename = "channels.property.entity.updated")]
    ChannelsPropertyEntityUpdated,
    #[serde(rename = "channels.property.entity.deleted")]
    ChannelsPropertyEntityDeleted,
    #[serde(rename = "channels.property.entity.reported")]
    ChannelsPropertyEntityReported,

    #[serde(rename = "channels.configuration.entity.created")]
    ChannelsConfigurationEntityCreated,
    #[serde(rename = "channels.configuration.entity.updated")]
    ChannelsConfigurationEntityUpdated,
    #[serde(rename = "channels.configuration.entity.deleted")]
    ChannelsConfigurationEntityDeleted,

    #[serde(rename = "connectors.entity.created")]
    ConnectorsEntityCreated,
    #[serde(rename = "connectors.entity.updated")]
    ConnectorsEntityUpdated,
    #[serde(rename = "connectors.entity.deleted")]
    ConnectorsEntityDeleted,

    #[serde(rename = "triggers.entity.created")]
    TriggersEntityCreated,
    #[serde(rename = "triggers.entity.updated")]
    TriggersEntityUpdated,
    #[serde(rename = "triggers.entity.deleted")]
    TriggersEntityDeleted,

    #[serde(rename = "triggers.actions.entity.created")]
    TriggersActionsEntityCreated,
    #[serde(rename = "triggers.actions.entity.updated")]
    TriggersActionsEntityUpdated,
    #[serde(rename = "triggers.actions.entity.deleted")]
    TriggersActionsEntityDeleted,

    #[serde(rename = "triggers.conditions.entity.created")]
    TriggersConditionsEntityCreated,
    #[serde(rename = "triggers.conditions.entity.updated")]
    TriggersConditionsEntityUpdated,
    #[serde(rename = "triggers.conditions.entity.deleted")]
    TriggersConditionsEntityDeleted,

    #[serde(rename = "accounts.entity.created")]
    AccountsEntityCreated,
    #[serde(rename = "accounts.entity.updated")]
    AccountsEntityUpdated,
    #[serde(rename = "accounts.entity.deleted")]
    AccountsEntityDeleted,

    #[serde(rename = "emails.entity.created")]
    EmailsEntityCreated,
    #[serde(rename = "emails.entity.updated")]
    EmailsEntityUpdated,
    #[serde(rename = "emails.entity.deleted")]
    EmailsEntityDeleted,

    #[serde(rename = "identities.entity.created")]
    IdentitiesEntityCreated,
    #[serde(rename = "identities.entity.updated")]
    IdentitiesEntityUpdated,
    #[serde(rename = "identities.entity.deleted")]
    IdentitiesEntityDeleted,

    #[serde(rename = "devices.property.data")]
    DevicesPropertyData,
    #[serde(rename = "channels.property.data")]
    ChannelsPropertyData,
    #[serde(rename = "connectors.control.data")]
    ConnectorsControlData,
    #[serde(rename = "triggers.control.data")]
    TriggersControlData,
}

impl RoutingKey {
    /// Every known routing key
    pub const ALL: [RoutingKey; 46] = [
        RoutingKey::DevicesEntityCreated,
        RoutingKey::DevicesEntityUpdated,
        RoutingKey::DevicesEntityDeleted,
        RoutingKey::DevicesEntityReported,
        RoutingKey::DevicesPropertyEntityCreated,
        RoutingKey::DevicesPropertyEntityUpdated,
        RoutingKey::DevicesPropertyEntityDeleted,
        RoutingKey::DevicesPropertyEntityReported,
        RoutingKey::DevicesConfigurationEntityCreated,
        RoutingKey::DevicesConfigurationEntityUpdated,
        RoutingKey::DevicesConfigurationEntityDeleted,
        RoutingKey::ChannelsEntityCreated,
        RoutingKey::ChannelsEntityUpdated,
        RoutingKey::ChannelsEntityDeleted,
        RoutingKey::ChannelsPropertyEntityCreated,
        RoutingKey::ChannelsPropertyEntityUpdated,
        RoutingKey::ChannelsPropertyEntityDeleted,
        RoutingKey::ChannelsPropertyEntityReported,
        RoutingKey::ChannelsConfigurationEntityCreated,
        RoutingKey::ChannelsConfigurationEntityUpdated,
        RoutingKey::ChannelsConfigurationEntityDeleted,
        RoutingKey::ConnectorsEntityCreated,
        RoutingKey::ConnectorsEntityUpdated,
        RoutingKey::ConnectorsEntityDeleted,
        RoutingKey::TriggersEntityCreated,
        RoutingKey::TriggersEntityUpdated,
        RoutingKey::TriggersEntityDeleted,
        RoutingKey::TriggersActionsEntityCreated,
        RoutingKey::TriggersActionsEntityUpdated,
        RoutingKey::TriggersActionsEntityDeleted,
        RoutingKey::TriggersConditionsEntityCreated,
        RoutingKey::TriggersConditionsEntityUpdated,
        RoutingKey::TriggersConditionsEntityDeleted,
        RoutingKey::AccountsEntityCreated,
        RoutingKey::AccountsEntityUpdated,
        RoutingKey::AccountsEntityDeleted,
        RoutingKey::EmailsEntityCreated,
        RoutingKey::EmailsEntityUpdated,
        RoutingKey::EmailsEntityDeleted,
        RoutingKey::IdentitiesEntityCreated,
        RoutingKey::IdentitiesEntityUpdated,
        RoutingKey::IdentitiesEntityDeleted,
        RoutingKey::DevicesPropertyData,
        RoutingKey::ChannelsPropertyData,
        RoutingKey::ConnectorsControlData,
        RoutingKey::TriggersControlData,
    ];

    /// Wire value of this routing key
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingKey::DevicesEntityCreated => "devices.entity.created",
            RoutingKey::DevicesEntityUpdated => "devices.entity.updated",
            RoutingKey::DevicesEntityDeleted => "devices.entity.deleted",
            RoutingKey::DevicesEntityReported => "devices.entity.reported",
            RoutingKey::DevicesPropertyEntityCreated => "devices.property.entity.created",
            RoutingKey::DevicesPropertyEntityUpdated => "devices.property.entity.updated",
            RoutingKey::DevicesPropertyEntityDeleted => "devices.property.entity.deleted",
            RoutingKey::DevicesPropertyEntityReported => "devices.property.entity.reported",
            RoutingKey::DevicesConfigurationEntityCreated => "devices.configuration.entity.created",
            RoutingKey::DevicesConfigurationEntityUpdated => "devices.configuration.entity.updated",
            RoutingKey::DevicesConfigurationEntityDeleted => "devices.configuration.entity.deleted",
            RoutingKey::ChannelsEntityCreated => "channels.entity.created",
            RoutingKey::ChannelsEntityUpdated => "channels.entity.updated",
            RoutingKey::ChannelsEntityDeleted => "channels.entity.deleted",
            RoutingKey::ChannelsPropertyEntityCreated => "channels.property.entity.created",
            RoutingKey::ChannelsPropertyEntityUpdated => "channels.property.entity.updated",
            RoutingKey::ChannelsPropertyEntityDeleted => "channels.property.entity.deleted",
            RoutingKey::ChannelsPropertyEntityReported => "channels.property.entity.reported",
            RoutingKey::ChannelsConfigurationEntityCreated => {
                "channels.configuration.entity.created"
            }
            RoutingKey::ChannelsConfigurationEntityUpdated => {
                "channels.configuration.entity.updated"
            }
            RoutingKey::ChannelsConfigurationEntityDeleted => {
                "channels.configuration.entity.deleted"
            }
            RoutingKey::ConnectorsEntityCreated => "connectors.entity.created",
            RoutingKey::ConnectorsEntityUpdated => "connectors.entity.updated",
            RoutingKey::ConnectorsEntityDeleted => "connectors.entity.deleted",
            RoutingKey::TriggersEntityCreated => "triggers.entity.created",
            RoutingKey::TriggersEntityUpdated => "triggers.entity.updated",
            RoutingKey::TriggersEntityDeleted => "triggers.entity.deleted",
            RoutingKey::TriggersActionsEntityCreated => "triggers.actions.entity.created",
            RoutingKey::TriggersActionsEntityUpdated => "triggers.actions.entity.updated",
            RoutingKey::TriggersActionsEntityDeleted => "triggers.actions.entity.deleted",
            RoutingKey::TriggersConditionsEntityCreated => "triggers.conditions.entity.created",
            RoutingKey::TriggersConditionsEntityUpdated => "triggers.conditions.entity.updated",
            RoutingKey::TriggersConditionsEntityDeleted => "triggers.conditions.entity.deleted",
            RoutingKey::AccountsEntityCreated => "accounts.entity.created",
            RoutingKey::AccountsEntityUpdated => "accounts.entity.updated",
            RoutingKey::AccountsEntityDeleted => "accounts.entity.deleted",
            RoutingKey::EmailsEntityCreated => "emails.entity.created",
            RoutingKey::EmailsEntityUpdated => "emails.entity.updated",
            RoutingKey::EmailsEntityDeleted => "emails.entity.deleted",
            RoutingKey::IdentitiesEntityCreated => "identities.entity.created",
            RoutingKey::IdentitiesEntityUpdated => "identities.entity.updated",
            RoutingKey::IdentitiesEntityDeleted => "identities.entity.deleted",
            RoutingKey::DevicesPropertyData => "devices.property.data",
            RoutingKey::ChannelsPropertyData => "channels.property.data",
            RoutingKey::ConnectorsControlData => "connectors.control.data",
            RoutingKey::TriggersControlData => "triggers.control.data",
        }
    }

    /// Parse a wire value, `None` when it is not a known routing key
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
