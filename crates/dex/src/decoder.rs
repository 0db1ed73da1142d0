use crate::abi::{ITestRouter, IUniswapV2Router02};
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapExactEthForTokens {
    pub amount_out_min: U256,
    pub path: Vec<Address>,
    pub to: Address,
    pub deadline: U256,
}

impl SwapExactEthForTokens {
    pub fn token_in(&self) -> Option<Address> {
        self.path.first().copied()
    }

    pub fn token_out(&self) -> Option<Address> {
        self.path.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterCall {
    Weth,
    Factory,
    Callback,
    SwapExactEthForTokens(SwapExactEthForTokens),
}

/// Decodes calldata addressed to a V2 router. `Ok(None)` means the selector
/// is not a router function.
pub fn decode_router_calldata(input: &[u8]) -> Result<Option<RouterCall>> {
    if input.len() < 4 {
        return Ok(None);
    }

    let selector = &input[..4];
    if selector == IUniswapV2Router02::swapExactETHForTokensCall::SELECTOR {
        let call = IUniswapV2Router02::swapExactETHForTokensCall::abi_decode(input)?;
        return Ok(Some(RouterCall::SwapExactEthForTokens(call.into())));
    }

    if selector == IUniswapV2Router02::WETHCall::SELECTOR {
        return Ok(Some(RouterCall::Weth));
    }

    if selector == IUniswapV2Router02::factoryCall::SELECTOR {
        return Ok(Some(RouterCall::Factory));
    }

    if selector == ITestRouter::callbackCall::SELECTOR {
        return Ok(Some(RouterCall::Callback));
    }

    Ok(None)
}

impl From<IUniswapV2Router02::swapExactETHForTokensCall> for SwapExactEthForTokens {
    fn from(call: IUniswapV2Router02::swapExactETHForTokensCall) -> Self {
        Self {
            amount_out_min: call.amountOutMin,
            path: call.path,
            to: call.to,
            deadline: call.deadline,
        }
    }
}
