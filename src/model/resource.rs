use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A network endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetAddress {
    /// IP address or host name.
    #[serde(rename = "Ip")]
    pub ip: String,

    /// Port, zero when the protocol has none.
    #[serde(rename = "Port")]
    pub port: u16,

    /// Transport protocol, e.g. `tcp`.
    #[serde(rename = "Protocol", skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

/// Source IP → addresses that open together with it.
pub type SourceIpMap = HashMap<String, Vec<NetAddress>>;

/// Authorization-service providers keyed by provider id.
pub type AuthServiceMap = HashMap<String, AuthServiceProvider>;

/// Raw contents of the resource file: provider id → provider.
pub type AuthServiceFile = HashMap<String, ProviderSpec>;

/// A provider as written in the resource file. Ids live in the map keys.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderSpec {
    /// Plugin implementing the provider's authorization flow.
    #[serde(rename = "PluginPath")]
    pub plugin_path: Option<String>,

    /// Resource groups keyed by resource id.
    #[serde(rename = "ResourceGroups")]
    pub resource_groups: HashMap<String, ResourceGroupSpec>,
}

/// A resource group as written in the resource file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourceGroupSpec {
    /// Seconds the resource stays open after a successful knock.
    #[serde(rename = "OpenTime")]
    pub open_time: u32,

    /// Open without consulting the provider.
    #[serde(rename = "SkipAuth")]
    pub skip_auth: bool,

    /// Where clients are sent after authorization.
    #[serde(rename = "RedirectUrl")]
    pub redirect_url: Option<String>,

    /// Protected hosts keyed by host name.
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, NetAddress>,
}

/// A fully populated authorization-service provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthServiceProvider {
    /// Provider id (the key it was listed under).
    pub id: String,
    /// Plugin path, if the provider is plugin-backed.
    pub plugin_path: Option<String>,
    /// Resource groups keyed by resource id.
    pub resource_groups: HashMap<String, ResourceGroup>,
}

/// A fully populated resource group with its own and its parent's ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroup {
    /// Id of the owning provider.
    pub auth_service_id: String,
    /// Id of this group.
    pub resource_id: String,
    /// Seconds the resource stays open.
    pub open_time: u32,
    /// Open without consulting the provider.
    pub skip_auth: bool,
    /// Post-authorization redirect.
    pub redirect_url: Option<String>,
    /// Protected hosts keyed by host name.
    pub resources: BTreeMap<String, NetAddress>,
}

impl ProviderSpec {
    /// Build the provider listed under `id`, filling in the ids of the
    /// provider and of every resource group.
    pub fn into_provider(self, id: &str) -> AuthServiceProvider {
        let resource_groups = self
            .resource_groups
            .into_iter()
            .map(|(resource_id, group)| {
                let group = ResourceGroup {
                    auth_service_id: id.to_string(),
                    resource_id: resource_id.clone(),
                    open_time: group.open_time,
                    skip_auth: group.skip_auth,
                    redirect_url: group.redirect_url,
                    resources: group.resources,
                };
                (resource_id, group)
            })
            .collect();

        AuthServiceProvider {
            id: id.to_string(),
            plugin_path: self.plugin_path.filter(|p| !p.trim().is_empty()),
            resource_groups,
        }
    }
}
