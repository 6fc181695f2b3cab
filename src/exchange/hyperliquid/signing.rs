//! L1 action signing.
//!
//! An action is MessagePack-encoded, suffixed with the nonce (big-endian u64) and a
//! vault flag byte, and hashed with keccak256 into a connection id. The connection id is
//! then signed as the EIP-712 `Agent { source, connectionId }` message under the
//! `Exchange` domain (chain id 1337, zero verifying contract).

use ethers::abi::{encode, Token};
use ethers::signers::LocalWallet;
use ethers::types::{Address, Signature, H256, U256};
use ethers::utils::keccak256;

use super::types::{Action, SignatureWire};
use crate::exchange::ExchangeError;

const EIP712_DOMAIN_TYPE: &[u8] =
    b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
const AGENT_TYPE: &[u8] = b"Agent(string source,bytes32 connectionId)";
const DOMAIN_NAME: &[u8] = b"Exchange";
const DOMAIN_VERSION: &[u8] = b"1";
const DOMAIN_CHAIN_ID: u64 = 1337;

/// Hashes an action together with its nonce into the connection id that gets signed.
pub fn action_hash(action: &Action, nonce: u64) -> Result<H256, ExchangeError> {
    let mut bytes =
        rmp_serde::to_vec_named(action).map_err(|e| ExchangeError::Signing(e.to_string()))?;
    bytes.extend(nonce.to_be_bytes());
    // no vault address
    bytes.push(0);
    Ok(H256::from(keccak256(bytes)))
}

fn domain_separator() -> [u8; 32] {
    keccak256(encode(&[
        Token::FixedBytes(keccak256(EIP712_DOMAIN_TYPE).to_vec()),
        Token::FixedBytes(keccak256(DOMAIN_NAME).to_vec()),
        Token::FixedBytes(keccak256(DOMAIN_VERSION).to_vec()),
        Token::Uint(U256::from(DOMAIN_CHAIN_ID)),
        Token::Address(Address::zero()),
    ]))
}

/// EIP-712 digest of the `Agent` message for a connection id.
pub fn agent_digest(source: &str, connection_id: H256) -> H256 {
    let struct_hash = keccak256(encode(&[
        Token::FixedBytes(keccak256(AGENT_TYPE).to_vec()),
        Token::FixedBytes(keccak256(source.as_bytes()).to_vec()),
        Token::FixedBytes(connection_id.as_bytes().to_vec()),
    ]));

    let mut payload = Vec::with_capacity(66);
    payload.extend_from_slice(&[0x19, 0x01]);
    payload.extend_from_slice(&domain_separator());
    payload.extend_from_slice(&struct_hash);
    H256::from(keccak256(payload))
}

/// Signs an action for submission.
pub fn sign_l1_action(
    wallet: &LocalWallet,
    action: &Action,
    nonce: u64,
    source: &str,
) -> Result<Signature, ExchangeError> {
    let connection_id = action_hash(action, nonce)?;
    wallet
        .sign_hash(agent_digest(source, connection_id))
        .map_err(|e| ExchangeError::Signing(e.to_string()))
}

impl From<Signature> for SignatureWire {
    fn from(sig: Signature) -> Self {
        Self {
            r: format!("{:#x}", sig.r),
            s: format!("{:#x}", sig.s),
            v: sig.v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::hyperliquid::types::{BulkOrder, LimitWire, OrderTypeWire, OrderWire};
    use ethers::signers::Signer;

    const TEST_KEY: &str = "0x0123456789012345678901234567890123456789012345678901234567890123";

    fn sample_action(px: &str) -> Action {
        Action::Order(BulkOrder {
            orders: vec![OrderWire {
                asset: 1,
                is_buy: false,
                limit_px: px.to_string(),
                sz: "9.98".to_string(),
                reduce_only: false,
                order_type: OrderTypeWire::Limit(LimitWire { tif: "Ioc".to_string() }),
            }],
            grouping: "na".to_string(),
        })
    }

    #[test]
    fn test_action_hash_depends_on_payload_and_nonce() {
        let a = action_hash(&sample_action("100.1"), 1_700_000_000_000).unwrap();
        let b = action_hash(&sample_action("100.1"), 1_700_000_000_000).unwrap();
        let c = action_hash(&sample_action("100.2"), 1_700_000_000_000).unwrap();
        let d = action_hash(&sample_action("100.1"), 1_700_000_000_001).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_signature_recovers_to_wallet_address() {
        let wallet: LocalWallet = TEST_KEY.parse().unwrap();
        let action = sample_action("100.1");
        let nonce = 1_700_000_000_000;

        let sig = sign_l1_action(&wallet, &action, nonce, "a").unwrap();
        let digest = agent_digest("a", action_hash(&action, nonce).unwrap());
        assert_eq!(sig.recover(digest).unwrap(), wallet.address());
        assert!(sig.v == 27 || sig.v == 28);
    }

    #[test]
    fn test_mainnet_and_testnet_digests_differ() {
        let id = action_hash(&sample_action("1"), 1).unwrap();
        assert_ne!(agent_digest("a", id), agent_digest("b", id));
    }

    #[test]
    fn test_signature_wire_is_hex() {
        let wallet: LocalWallet = TEST_KEY.parse().unwrap();
        let sig = sign_l1_action(&wallet, &sample_action("1"), 1, "a").unwrap();
        let wire = SignatureWire::from(sig);
        assert!(wire.r.starts_with("0x"));
        assert!(wire.s.starts_with("0x"));
    }
}
