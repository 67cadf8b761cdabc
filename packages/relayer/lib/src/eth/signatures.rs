//! Packs valsets and their confirmations into the arguments of `updateValset`.

use alloy::primitives::{B256, U256};
use anyhow::{ensure, Result};

use super::peggy::Peggy::ValsetArgs;
use crate::types::{Valset, ValsetConfirm};

/// Length of an `r || s || v` secp256k1 signature.
const SIGNATURE_LEN: usize = 65;

/// The split signatures of a valset update, one slot per member of the signing valset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateSignatures {
    /// Recovery ids, `0` for members that did not sign.
    pub v: Vec<u8>,
    /// `r` components, zero for members that did not sign.
    pub r: Vec<B256>,
    /// `s` components, zero for members that did not sign.
    pub s: Vec<B256>,
}

/// Converts a valset into the contract's `ValsetArgs`.
#[must_use]
pub fn valset_args(valset: &Valset) -> ValsetArgs {
    ValsetArgs {
        validators: valset.validators(),
        powers: valset.powers(),
        valsetNonce: U256::from(valset.nonce),
        rewardAmount: valset.reward_amount,
        rewardToken: valset.reward_token,
    }
}

/// Orders the confirmations by the members of `signers`, the valset the contract currently trusts.
///
/// The contract checks signatures positionally against its current valset, so every member gets a
/// slot. Members without a confirmation get an empty signature, which the contract skips.
/// Confirmations from addresses outside `signers` are dropped.
///
/// # Errors
/// Returns an error if a matching confirmation does not carry a 65 byte signature.
pub fn order_signatures(signers: &Valset, confirms: &[ValsetConfirm]) -> Result<UpdateSignatures> {
    let mut sigs = UpdateSignatures::default();

    for member in &signers.members {
        let Some(confirm) = confirms
            .iter()
            .find(|confirm| confirm.eth_signer == member.eth_address)
        else {
            sigs.v.push(0);
            sigs.r.push(B256::ZERO);
            sigs.s.push(B256::ZERO);
            continue;
        };

        let sig = confirm.signature.as_ref();
        ensure!(
            sig.len() == SIGNATURE_LEN,
            "signature from {} has length {}, expected {SIGNATURE_LEN}",
            confirm.eth_signer,
            sig.len()
        );

        let v = sig[64];
        sigs.v.push(if v < 27 { v + 27 } else { v });
        sigs.r.push(B256::from_slice(&sig[..32]));
        sigs.s.push(B256::from_slice(&sig[32..64]));
    }

    Ok(sigs)
}
