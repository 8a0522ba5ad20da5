use dashmap::{DashMap, DashSet};

use super::space::MemberSpace;

/// In-process index: member id -> provisioned space.
///
/// Filled by the provisioner, read by the relay so that a member who renames
/// themselves keeps receiving announcements. Not persisted; after a restart
/// the relay falls back to name lookup until the member is provisioned again.
///
/// Also remembers members whose welcome message could not be delivered, so
/// the next provisioning attempt sends it even though `text` already exists.
#[derive(Debug, Default)]
pub struct MemberDirectory {
    spaces: DashMap<String, MemberSpace>,
    pending_welcomes: DashSet<String>,
}

impl MemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, member_id: &str, space: MemberSpace) {
        self.spaces.insert(member_id.to_string(), space);
    }

    pub fn get(&self, member_id: &str) -> Option<MemberSpace> {
        self.spaces.get(member_id).map(|s| s.clone())
    }

    pub fn forget(&self, member_id: &str) {
        self.spaces.remove(member_id);
    }

    pub fn mark_welcome_pending(&self, member_id: &str) {
        self.pending_welcomes.insert(member_id.to_string());
    }

    pub fn welcome_pending(&self, member_id: &str) -> bool {
        self.pending_welcomes.contains(member_id)
    }

    pub fn clear_welcome_pending(&self, member_id: &str) {
        self.pending_welcomes.remove(member_id);
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }
}
