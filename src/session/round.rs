//! One settlement round: members, receipt confirmations, attachments.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ATTACHMENT_CAP;

/// Advisory receipt flag. Nothing is enforced off the back of this; it
/// only records whether a member says they collected their share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Pending,
    Confirmed,
}

impl ConfirmationStatus {
    pub fn toggled(self) -> Self {
        match self {
            ConfirmationStatus::Pending => ConfirmationStatus::Confirmed,
            ConfirmationStatus::Confirmed => ConfirmationStatus::Pending,
        }
    }
}

/// Which attachment list a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    /// Screenshots of the items that were sold.
    Items,
    /// Screenshots proving the split was paid out.
    Evidence,
}

/// Metadata record for an uploaded image. The service never stores the
/// image bytes themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub byte_size: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub round_id: u32,
    pub round_name: String,
    pub created: DateTime<Utc>,
    /// Member names in insertion order.
    pub members: Vec<String>,
    pub confirmations: HashMap<String, ConfirmationStatus>,
    pub items: Vec<Attachment>,
    pub evidence: Vec<Attachment>,
    pub is_active: bool,
}

impl Round {
    pub fn new(round_id: u32, round_name: impl Into<String>, members: Vec<String>) -> Self {
        let confirmations = members
            .iter()
            .map(|m| (m.clone(), ConfirmationStatus::Pending))
            .collect();

        Self {
            round_id,
            round_name: round_name.into(),
            created: Utc::now(),
            members,
            confirmations,
            items: Vec::new(),
            evidence: Vec::new(),
            is_active: true,
        }
    }

    /// Replace the member list. Confirmation states of members that stay
    /// are preserved; new members start pending; removed members drop
    /// out of the confirmation map.
    pub fn set_members(&mut self, members: Vec<String>) {
        let previous = std::mem::take(&mut self.confirmations);

        self.confirmations = members
            .iter()
            .map(|m| {
                let status = previous
                    .get(m)
                    .copied()
                    .unwrap_or(ConfirmationStatus::Pending);
                (m.clone(), status)
            })
            .collect();
        self.members = members;
    }

    pub fn add_member(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.members.contains(&name) {
            return Err(anyhow::anyhow!(
                "Member '{}' is already in round '{}'",
                name,
                self.round_name
            ));
        }
        self.confirmations
            .insert(name.clone(), ConfirmationStatus::Pending);
        self.members.push(name);
        Ok(())
    }

    pub fn remove_member(&mut self, name: &str) -> bool {
        let existed = self.confirmations.remove(name).is_some();
        self.members.retain(|m| m != name);
        existed
    }

    /// Flip one member's receipt flag, returning the new status.
    pub fn toggle_confirmation(&mut self, member: &str) -> Result<ConfirmationStatus> {
        let status = self.confirmations.get_mut(member).ok_or_else(|| {
            anyhow::anyhow!("No member '{}' in round '{}'", member, self.round_name)
        })?;
        *status = status.toggled();
        Ok(*status)
    }

    /// Put every member back to pending.
    pub fn reset_confirmations(&mut self) {
        for status in self.confirmations.values_mut() {
            *status = ConfirmationStatus::Pending;
        }
    }

    pub fn confirmed_count(&self) -> usize {
        self.confirmations
            .values()
            .filter(|s| **s == ConfirmationStatus::Confirmed)
            .count()
    }

    /// Record attachment metadata, dropping the oldest records past the
    /// per-kind cap.
    pub fn add_attachment(&mut self, kind: AttachmentKind, attachment: Attachment) {
        let list = self.attachments_mut(kind);
        list.push(attachment);
        if list.len() > ATTACHMENT_CAP {
            let excess = list.len() - ATTACHMENT_CAP;
            list.drain(..excess);
        }
    }

    /// Remove the record matching both filename and upload time, since
    /// filenames repeat across re-uploads.
    pub fn remove_attachment(
        &mut self,
        kind: AttachmentKind,
        filename: &str,
        uploaded_at: DateTime<Utc>,
    ) -> bool {
        let list = self.attachments_mut(kind);
        let before = list.len();
        list.retain(|a| !(a.filename == filename && a.uploaded_at == uploaded_at));
        list.len() < before
    }

    pub fn attachments(&self, kind: AttachmentKind) -> &[Attachment] {
        match kind {
            AttachmentKind::Items => &self.items,
            AttachmentKind::Evidence => &self.evidence,
        }
    }

    fn attachments_mut(&mut self, kind: AttachmentKind) -> &mut Vec<Attachment> {
        match kind {
            AttachmentKind::Items => &mut self.items,
            AttachmentKind::Evidence => &mut self.evidence,
        }
    }
}
