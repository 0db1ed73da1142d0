use alloy::primitives::{b256, keccak256, Address, B256};

/// `keccak256` of the canonical Uniswap V2 pair creation code.
pub const UNISWAP_V2_INIT_CODE_HASH: B256 =
    b256!("0x96e8ac4277198ff8b6f785478aa9a39f403cb768dd02cbee326c3e7da348845f");

/// CREATE2 address a V2 factory assigns to the `(token_a, token_b)` pair.
pub fn derive_pair_address_v2(
    factory: Address,
    token_a: Address,
    token_b: Address,
    init_code_hash: B256,
) -> Address {
    let (token0, token1) = sort_tokens(token_a, token_b);
    let mut packed = [0u8; 40];
    packed[..20].copy_from_slice(token0.0.as_ref());
    packed[20..].copy_from_slice(token1.0.as_ref());
    let salt = keccak256(packed);
    factory.create2(salt, init_code_hash)
}

pub fn sort_tokens(token_a: Address, token_b: Address) -> (Address, Address) {
    if token_a < token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}
