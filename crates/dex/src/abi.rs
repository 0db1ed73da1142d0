use alloy::sol;

sol! {
    interface IUniswapV2Router02 {
        function WETH() external view returns (address);
        function factory() external view returns (address);

        function swapExactETHForTokens(
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external payable returns (uint256[] memory amounts);
    }

    interface ITestRouter {
        function callback() external view returns (address);

        error Expired(uint256 deadline, uint256 timestamp);
        error InvalidPath();
        error InsufficientOutputAmount(uint256 amountOut, uint256 amountOutMin);
    }

    interface IUniswapV2Factory {
        function getPair(address tokenA, address tokenB) external view returns (address pair);
        function createPair(address tokenA, address tokenB) external returns (address pair);
        function allPairsLength() external view returns (uint256);

        event PairCreated(address indexed token0, address indexed token1, address pair, uint256 index);
    }

    interface ITestFactory {
        function setCodeup(address codeup) external;
        function codeup() external view returns (address);

        error Unauthorized(address caller);
        error CodeupNotSet();
        error IdenticalAddresses();
        error ZeroAddress();
        error PairExists(address pair);
    }

    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 value) external returns (bool);
    }
}
