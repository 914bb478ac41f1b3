//! Cache key builders. Every key is namespaced under `projectdesk:`.

const NAMESPACE: &str = "projectdesk";

/// OAuth access token for the invoicing service, one per organization
pub fn invoicing_token(service: &str, organization_id: &str) -> String {
    format!("{}:oauth:{}:{}", NAMESPACE, service, organization_id)
}
