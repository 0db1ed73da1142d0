use alloy::primitives::{address, Address, Bytes, U256};
use codeup_chain::{encode_return, CallResult, Contract, Msg, Revert, Vm};
use tracing::debug;

use crate::abi::{ITestRouter, IUniswapV2Factory, IUniswapV2Router02, IERC20};
use crate::decoder::{decode_router_calldata, RouterCall, SwapExactEthForTokens};

/// Wrapped ether on Base, the chain the production router lives on.
pub const WETH: Address = address!("0x4200000000000000000000000000000000000006");

#[derive(Debug, Clone)]
pub struct RouterStorage {
    pub weth: Address,
    pub factory: Address,
    pub callback: Address,
}

/// Router stand-in: a swap forwards the ETH it receives to `callback` and
/// pays out whatever tokens it holds, 1:1, instead of pricing through a pair.
pub struct TestRouter;

pub fn deploy_router(vm: &mut Vm, deployer: Address, callback: Address, factory: Address) -> Address {
    vm.deploy(
        deployer,
        TestRouter,
        RouterStorage {
            weth: WETH,
            factory,
            callback,
        },
    )
}

impl Contract for TestRouter {
    fn name(&self) -> &'static str {
        "TestRouter"
    }

    fn call(&self, vm: &mut Vm, msg: &Msg) -> CallResult {
        let call = match decode_router_calldata(&msg.data) {
            Ok(Some(call)) => call,
            Ok(None) => return Err(Revert::empty()),
            Err(err) => {
                return Err(Revert::with_reason(format!("invalid router calldata: {err:#}")))
            }
        };
        let storage = vm.storage::<RouterStorage>(msg.to)?.clone();

        match call {
            RouterCall::Weth => {
                msg.ensure_no_value()?;
                Ok(encode_return::<IUniswapV2Router02::WETHCall>(&storage.weth))
            }
            RouterCall::Factory => {
                msg.ensure_no_value()?;
                Ok(encode_return::<IUniswapV2Router02::factoryCall>(&storage.factory))
            }
            RouterCall::Callback => {
                msg.ensure_no_value()?;
                Ok(encode_return::<ITestRouter::callbackCall>(&storage.callback))
            }
            RouterCall::SwapExactEthForTokens(swap) => {
                let amounts = swap_exact_eth_for_tokens(vm, msg, &storage, &swap)?;
                Ok(encode_return::<IUniswapV2Router02::swapExactETHForTokensCall>(&amounts))
            }
        }
    }
}

fn swap_exact_eth_for_tokens(
    vm: &mut Vm,
    msg: &Msg,
    storage: &RouterStorage,
    swap: &SwapExactEthForTokens,
) -> Result<Vec<U256>, Revert> {
    let now = U256::from(vm.timestamp());
    if swap.deadline < now {
        return Err(Revert::with_error(ITestRouter::Expired {
            deadline: swap.deadline,
            timestamp: now,
        }));
    }
    let token_out = match (swap.token_in(), swap.token_out()) {
        (Some(token_in), Some(token_out)) if swap.path.len() >= 2 && token_in == storage.weth => {
            token_out
        }
        _ => return Err(Revert::with_error(ITestRouter::InvalidPath {})),
    };

    let router = msg.to;
    let lookup = IUniswapV2Factory::getPairCall {
        tokenA: storage.weth,
        tokenB: token_out,
    };
    if vm.call_sol(router, storage.factory, U256::ZERO, &lookup)?.is_zero() {
        let create = IUniswapV2Factory::createPairCall {
            tokenA: storage.weth,
            tokenB: token_out,
        };
        vm.call_sol(router, storage.factory, U256::ZERO, &create)?;
    }

    debug!(
        %router,
        callback = %storage.callback,
        value = %msg.value,
        "forwarding swap input"
    );
    vm.call(router, storage.callback, msg.value, Bytes::new())?;

    let held = vm.call_sol(
        router,
        token_out,
        U256::ZERO,
        &IERC20::balanceOfCall { account: router },
    )?;
    let amount_out = msg.value.min(held);
    if amount_out < swap.amount_out_min {
        return Err(Revert::with_error(ITestRouter::InsufficientOutputAmount {
            amountOut: amount_out,
            amountOutMin: swap.amount_out_min,
        }));
    }
    if !amount_out.is_zero() {
        vm.call_sol(
            router,
            token_out,
            U256::ZERO,
            &IERC20::transferCall {
                to: swap.to,
                value: amount_out,
            },
        )?;
    }
    Ok(vec![msg.value, amount_out])
}
