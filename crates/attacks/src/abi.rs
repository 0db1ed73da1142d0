use alloy::sol;

sol! {
    interface IReentrancyAttacker {
        function attackState() external view returns (uint8);
        function reentryAttempts() external view returns (uint256);
        function lastReentryError() external view returns (bytes memory);
        function setAbsorbFailures(bool absorb) external;

        event ReentryAttempted(address indexed target, uint256 attempt, bool succeeded);
    }

    interface IWithdrawReentrance {
        function addTokens() external payable;
        function upgrade(uint256 towerId) external;
        function collect() external;
        function withdraw() external;
    }

    interface IReinvestReentrancy {
        function updateCodeUp(address codeup) external;
    }

    interface IClaimCodeupERC20Reentrancy {
        function setCodeup(address codeup) external;
        function enableTransferHook(address token) external;
    }
}
