//! Group handlers

use gv_core::logging::operations;
use gv_core::msgs::{
    MsgCreateGroup, MsgResponse, MsgUpdateGroupAdmin, MsgUpdateGroupMembers,
    MsgUpdateGroupMetadata,
};
use gv_core::types::decimal::{checked_add, checked_sub, parse_non_negative, parse_positive};
use gv_core::{GovError, GovResult, GroupInfo, GroupMember, Member};
use gv_store::KvStore;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::keeper::GroupKeeper;

impl GroupKeeper {
    pub(crate) fn create_group(
        &self,
        store: &mut dyn KvStore,
        msg: &MsgCreateGroup,
    ) -> GovResult<MsgResponse> {
        let mut members = Vec::with_capacity(msg.members.len());
        let mut total_weight = Decimal::ZERO;
        for req in &msg.members {
            let weight = parse_positive(&req.weight)?;
            total_weight = checked_add(total_weight, weight)?;
            members.push(Member {
                address: req.address.clone(),
                weight,
                metadata: req.metadata.clone(),
            });
        }

        let group = self.state.groups.create(store, |group_id| GroupInfo {
            group_id,
            admin: msg.admin.clone(),
            metadata: msg.metadata.clone(),
            total_weight,
            version: 1,
        })?;
        for member in members {
            self.state.members.create(
                store,
                &GroupMember {
                    group_id: group.group_id,
                    member,
                },
            )?;
        }

        info!(
            operation = operations::CREATE_GROUP,
            group_id = group.group_id,
            admin = %group.admin,
            count = msg.members.len(),
            total_weight = %group.total_weight,
            "Group created"
        );
        Ok(MsgResponse::CreateGroup {
            group_id: group.group_id,
        })
    }

    /// Apply member additions, weight changes and removals (weight `"0"`)
    pub(crate) fn update_group_members(
        &self,
        store: &mut dyn KvStore,
        msg: &MsgUpdateGroupMembers,
    ) -> GovResult<MsgResponse> {
        let mut group = self.load_group(store, msg.group_id)?;
        Self::ensure_admin(&group.admin, &msg.admin, "group")?;

        let mut total_weight = group.total_weight;
        let (current, _) = self
            .state
            .member_by_group
            .primary_keys(store, group.group_id, &Default::default())?;
        let mut member_count = current.len();
        for req in &msg.member_updates {
            let weight = parse_non_negative(&req.weight)?;
            let existing = self.load_member(store, group.group_id, &req.address)?;

            if weight.is_zero() {
                let old = existing.ok_or_else(|| GovError::MemberNotFound {
                    group_id: group.group_id,
                    address: req.address.to_hex(),
                })?;
                total_weight = checked_sub(total_weight, old.member.weight)?;
                self.state
                    .members
                    .delete(store, &GroupMember::primary_key(group.group_id, &req.address))?;
                member_count -= 1;
                debug!(group_id = group.group_id, member = %req.address, "Member removed");
                continue;
            }

            let row = GroupMember {
                group_id: group.group_id,
                member: Member {
                    address: req.address.clone(),
                    weight,
                    metadata: req.metadata.clone(),
                },
            };
            match existing {
                Some(old) => {
                    total_weight = checked_sub(total_weight, old.member.weight)?;
                    self.state.members.update(store, &row)?;
                }
                None => {
                    self.state.members.create(store, &row)?;
                    member_count += 1;
                }
            }
            total_weight = checked_add(total_weight, weight)?;
        }

        if member_count > self.config.max_members {
            return Err(GovError::InvalidArgument(format!(
                "group {} would have {} members, limit {}",
                group.group_id, member_count, self.config.max_members
            )));
        }

        group.total_weight = total_weight;
        group.version += 1;
        self.state.groups.update(store, &group)?;

        info!(
            operation = operations::UPDATE_GROUP_MEMBERS,
            group_id = group.group_id,
            count = msg.member_updates.len(),
            total_weight = %group.total_weight,
            version = group.version,
            "Group members updated"
        );
        Ok(MsgResponse::Empty)
    }

    pub(crate) fn update_group_admin(
        &self,
        store: &mut dyn KvStore,
        msg: &MsgUpdateGroupAdmin,
    ) -> GovResult<MsgResponse> {
        let mut group = self.load_group(store, msg.group_id)?;
        Self::ensure_admin(&group.admin, &msg.admin, "group")?;

        group.admin = msg.new_admin.clone();
        group.version += 1;
        self.state.groups.update(store, &group)?;

        info!(
            operation = operations::UPDATE_GROUP_ADMIN,
            group_id = group.group_id,
            admin = %group.admin,
            version = group.version,
            "Group admin updated"
        );
        Ok(MsgResponse::Empty)
    }

    pub(crate) fn update_group_metadata(
        &self,
        store: &mut dyn KvStore,
        msg: &MsgUpdateGroupMetadata,
    ) -> GovResult<MsgResponse> {
        let mut group = self.load_group(store, msg.group_id)?;
        Self::ensure_admin(&group.admin, &msg.admin, "group")?;

        group.metadata = msg.metadata.clone();
        group.version += 1;
        self.state.groups.update(store, &group)?;

        info!(
            operation = operations::UPDATE_GROUP_METADATA,
            group_id = group.group_id,
            version = group.version,
            "Group metadata updated"
        );
        Ok(MsgResponse::Empty)
    }
}
