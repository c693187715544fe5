use async_trait::async_trait;

use super::domain::{Address, AddressId, RequestId, WarrantyRequest};
use super::submission::DecisionSubmission;

/// Request/response backend owning warranty request records.
#[async_trait]
pub trait WarrantyRequestGateway: Send + Sync {
    async fn fetch_request(&self, id: &RequestId)
        -> Result<Option<WarrantyRequest>, GatewayError>;

    async fn submit_decision(
        &self,
        id: &RequestId,
        submission: &DecisionSubmission,
    ) -> Result<(), GatewayError>;

    async fn create_shipping_order(&self, id: &RequestId) -> Result<(), GatewayError>;
}

/// Lookup for customer pickup addresses.
#[async_trait]
pub trait AddressDirectory: Send + Sync {
    async fn get_address(&self, id: &AddressId) -> Result<Address, GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("record not found")]
    NotFound,
    #[error("request rejected by backend{}", detail_suffix(.message))]
    Rejected { message: Option<String> },
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

fn detail_suffix(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(": {message}"),
        None => String::new(),
    }
}

impl GatewayError {
    /// Message suitable for a transient operator notification.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Rejected {
                message: Some(message),
            } if !message.trim().is_empty() => message.clone(),
            GatewayError::Rejected { .. } => "the backend rejected the request".to_string(),
            GatewayError::NotFound => "the warranty request no longer exists".to_string(),
            GatewayError::Unavailable(_) => {
                "the backend is unavailable, please retry".to_string()
            }
        }
    }
}
