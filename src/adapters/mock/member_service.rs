use crate::domain::value_objects::MemberId;
use crate::ports::member_service::{MemberService as MemberServiceTrait, Recipient, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Mock implementation of MemberService
///
/// Keeps members and administrators in memory.
pub struct MemberService {
    members: Mutex<HashMap<MemberId, Recipient>>,
    administrators: Mutex<Vec<Recipient>>,
}

impl MemberService {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
            administrators: Mutex::new(Vec::new()),
        }
    }

    /// Register a member with a display name and email
    pub fn add_member(&self, recipient: Recipient) {
        self.members
            .lock()
            .unwrap()
            .insert(recipient.member_id, recipient);
    }

    /// Register an administrator who receives new loan request notifications
    pub fn add_admin(&self, recipient: Recipient) {
        self.administrators.lock().unwrap().push(recipient.clone());
        self.add_member(recipient);
    }
}

impl Default for MemberService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemberServiceTrait for MemberService {
    async fn exists(&self, member_id: MemberId) -> Result<bool> {
        Ok(self.members.lock().unwrap().contains_key(&member_id))
    }

    async fn get_contact(&self, member_id: MemberId) -> Result<Option<Recipient>> {
        Ok(self.members.lock().unwrap().get(&member_id).cloned())
    }

    async fn list_administrators(&self) -> Result<Vec<Recipient>> {
        Ok(self.administrators.lock().unwrap().clone())
    }
}
