pub mod abi;
pub mod decoder;
pub mod factory;
pub mod pair;
pub mod router;

pub use decoder::{decode_router_calldata, RouterCall, SwapExactEthForTokens};
pub use factory::{deploy_factory, FactoryStorage, TestFactory};
pub use pair::{derive_pair_address_v2, sort_tokens, UNISWAP_V2_INIT_CODE_HASH};
pub use router::{deploy_router, RouterStorage, TestRouter, WETH};
