//! Group account handlers

use gv_core::logging::operations;
use gv_core::msgs::{
    MsgCreateGroupAccount, MsgResponse, MsgUpdateGroupAccountAdmin,
    MsgUpdateGroupAccountDecisionPolicy, MsgUpdateGroupAccountMetadata,
};
use gv_core::{Address, GovError, GovResult, GroupAccountInfo, PolicyEvaluator, GROUP_ACCOUNT_MODULE};
use gv_store::KvStore;
use tracing::{debug, info};

use crate::keeper::GroupKeeper;

impl GroupKeeper {
    /// Pick a derivation key whose address is not taken yet
    ///
    /// The key is the next sequence value; on the unlikely collision a nonce
    /// byte is appended until a free address turns up.
    fn derive_account_address(&self, store: &mut dyn KvStore) -> GovResult<(Address, Vec<u8>)> {
        let seq = self.state.account_seq.next_val(store)?;
        let base = seq.to_be_bytes().to_vec();

        let address = Address::derive(GROUP_ACCOUNT_MODULE, &base);
        if !self.state.accounts.has(store, address.as_bytes())? {
            return Ok((address, base));
        }

        for nonce in 0..=u8::MAX {
            let mut key = base.clone();
            key.push(nonce);
            let address = Address::derive(GROUP_ACCOUNT_MODULE, &key);
            if !self.state.accounts.has(store, address.as_bytes())? {
                debug!(seq, nonce, "Group account address collision resolved");
                return Ok((address, key));
            }
        }
        Err(GovError::Internal(format!(
            "no free group account address for sequence {}",
            seq
        )))
    }

    pub(crate) fn create_group_account(
        &self,
        store: &mut dyn KvStore,
        msg: &MsgCreateGroupAccount,
    ) -> GovResult<MsgResponse> {
        let group = self.load_group(store, msg.group_id)?;
        Self::ensure_admin(&group.admin, &msg.admin, "group")?;
        msg.decision_policy.validate(&group)?;

        let (address, derivation_key) = self.derive_account_address(store)?;
        let account = GroupAccountInfo {
            address: address.clone(),
            group_id: group.group_id,
            admin: msg.admin.clone(),
            metadata: msg.metadata.clone(),
            version: 1,
            decision_policy: msg.decision_policy.clone(),
            derivation_key,
        };
        self.state.accounts.create(store, &account)?;

        info!(
            operation = operations::CREATE_GROUP_ACCOUNT,
            group_id = group.group_id,
            group_account = %address,
            "Group account created"
        );
        Ok(MsgResponse::CreateGroupAccount { address })
    }

    pub(crate) fn update_group_account_admin(
        &self,
        store: &mut dyn KvStore,
        msg: &MsgUpdateGroupAccountAdmin,
    ) -> GovResult<MsgResponse> {
        let mut account = self.load_account(store, &msg.address)?;
        Self::ensure_admin(&account.admin, &msg.admin, "group account")?;

        account.admin = msg.new_admin.clone();
        account.version += 1;
        self.state.accounts.update(store, &account)?;

        info!(
            operation = operations::UPDATE_GROUP_ACCOUNT_ADMIN,
            group_account = %account.address,
            admin = %account.admin,
            version = account.version,
            "Group account admin updated"
        );
        Ok(MsgResponse::Empty)
    }

    pub(crate) fn update_group_account_decision_policy(
        &self,
        store: &mut dyn KvStore,
        msg: &MsgUpdateGroupAccountDecisionPolicy,
    ) -> GovResult<MsgResponse> {
        let mut account = self.load_account(store, &msg.address)?;
        Self::ensure_admin(&account.admin, &msg.admin, "group account")?;
        let group = self.load_group(store, account.group_id)?;
        msg.decision_policy.validate(&group)?;

        account.decision_policy = msg.decision_policy.clone();
        account.version += 1;
        self.state.accounts.update(store, &account)?;

        info!(
            operation = operations::UPDATE_GROUP_ACCOUNT_POLICY,
            group_account = %account.address,
            version = account.version,
            "Group account decision policy updated"
        );
        Ok(MsgResponse::Empty)
    }

    pub(crate) fn update_group_account_metadata(
        &self,
        store: &mut dyn KvStore,
        msg: &MsgUpdateGroupAccountMetadata,
    ) -> GovResult<MsgResponse> {
        let mut account = self.load_account(store, &msg.address)?;
        Self::ensure_admin(&account.admin, &msg.admin, "group account")?;

        account.metadata = msg.metadata.clone();
        account.version += 1;
        self.state.accounts.update(store, &account)?;

        info!(
            operation = operations::UPDATE_GROUP_ACCOUNT_METADATA,
            group_account = %account.address,
            version = account.version,
            "Group account metadata updated"
        );
        Ok(MsgResponse::Empty)
    }
}
