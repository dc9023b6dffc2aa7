//! Intune and directory reads via Microsoft Graph
//!
//! Collection reads up to [`MAX_PAGE_SIZE`] items are a single `$top` request;
//! larger requests go through [`GraphClient::paginate`]. Both shapes return the
//! same items for the same `top`.

use crate::error::Result;
use crate::graph::{GraphClient, MAX_PAGE_SIZE, PaginatedResponse};
use serde_json::Value;

pub const MANAGED_DEVICES: &str = "deviceManagement/managedDevices";
pub const MOBILE_APPS: &str = "deviceAppManagement/mobileApps";
pub const DEVICE_CONFIGURATIONS: &str = "deviceManagement/deviceConfigurations";
pub const USERS: &str = "users";
pub const GROUPS: &str = "groups";
pub const ORGANIZATION: &str = "organization";

/// A collection read that also records whether Graph answered with any
/// content. An empty or non-object body reads as an empty page with
/// `has_content == false`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionRead {
    pub page: PaginatedResponse,
    pub has_content: bool,
}

impl GraphClient {
    async fn read_top(&self, endpoint: &str, top: usize) -> Result<CollectionRead> {
        let top = top.to_string();
        let data = self
            .get_object(endpoint, Some(&[("$top", top.as_str())]))
            .await?;
        Ok(CollectionRead {
            has_content: data.as_object().is_some_and(|body| !body.is_empty()),
            page: PaginatedResponse::from_response(&data),
        })
    }

    /// Up to `top` items of a collection. The paginated path always counts
    /// as having content.
    pub async fn read_collection(&self, endpoint: &str, top: usize) -> Result<CollectionRead> {
        if top <= MAX_PAGE_SIZE {
            return self.read_top(endpoint, top).await;
        }
        let page = self.paginate(endpoint, top, MAX_PAGE_SIZE).await?;
        Ok(CollectionRead {
            page,
            has_content: true,
        })
    }

    async fn get_top(&self, endpoint: &str, top: usize) -> Result<PaginatedResponse> {
        Ok(self.read_top(endpoint, top).await?.page)
    }

    async fn get_collection(&self, endpoint: &str, top: usize) -> Result<PaginatedResponse> {
        Ok(self.read_collection(endpoint, top).await?.page)
    }

    /// Intune managed devices (DeviceManagementManagedDevices.Read.All)
    pub async fn get_managed_devices(&self, top: usize) -> Result<PaginatedResponse> {
        self.get_collection(MANAGED_DEVICES, top).await
    }

    /// Intune mobile apps (DeviceManagementApps.Read.All)
    pub async fn get_mobile_apps(&self, top: usize) -> Result<PaginatedResponse> {
        self.get_collection(MOBILE_APPS, top).await
    }

    /// Intune device configuration profiles (DeviceManagementConfiguration.Read.All)
    pub async fn get_device_configurations(&self, top: usize) -> Result<PaginatedResponse> {
        self.get_collection(DEVICE_CONFIGURATIONS, top).await
    }

    /// First page of users
    pub async fn get_users(&self, top: usize) -> Result<PaginatedResponse> {
        self.get_top(USERS, top).await
    }

    /// First page of groups
    pub async fn get_groups(&self, top: usize) -> Result<PaginatedResponse> {
        self.get_top(GROUPS, top).await
    }

    /// A single managed device by Intune id
    pub async fn get_managed_device(&self, device_id: &str) -> Result<Value> {
        self.get_object(&format!("{}/{}", MANAGED_DEVICES, device_id), None)
            .await
    }

    /// Tenant organization record; used as a connectivity check
    pub async fn get_organization(&self) -> Result<Value> {
        self.get_object(ORGANIZATION, None).await
    }
}
