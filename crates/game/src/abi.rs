use alloy::sol;

sol! {
    error ReentrancyGuardReentrantCall();

    interface ICodeup {
        struct Tower {
            uint256 coins;
            uint256 money;
            uint256 money2;
            uint256 yields;
            uint256 timestamp;
            uint256 hrs;
            uint256 pendingReward;
        }

        function addGameETH() external payable;
        function upgradeTower(uint256 towerId) external;
        function collect() external;
        function withdraw() external;
        function reinvest() external;
        function claimCodeupERC20(address recipient) external;

        function towerOf(address user) external view returns (Tower memory);
        function levelsOf(address user) external view returns (uint8[8] memory);
        function getUpgradePrice(uint256 towerId, uint256 level) external view returns (uint256);
        function getYield(uint256 towerId, uint256 level) external view returns (uint256);
        function pendingCodeupERC20(address user) external view returns (uint256);
        function reentrancyGuardEntered() external view returns (bool);
        function coinsPrice() external view returns (uint256);
        function tier() external view returns (uint256);
        function router() external view returns (address);
        function token() external view returns (address);

        event AddGameETH(address indexed user, uint256 value, uint256 coins);
        event UpgradeTower(address indexed user, uint256 towerId, uint256 level, uint256 price);
        event Collect(address indexed user, uint256 money);
        event Withdraw(address indexed user, uint256 money, uint256 value);
        event Reinvest(address indexed user, uint256 money, uint256 coins, uint256 buyback);
        event ClaimCodeupERC20(address indexed user, address indexed recipient, uint256 amount, bool swapped);

        error InvalidConfiguration(uint256 tier, uint256 coinsPrice);
        error ZeroValue();
        error InvalidTower(uint256 towerId);
        error InvalidLevel(uint256 level);
        error MaxLevelReached(uint256 towerId);
        error InsufficientCoins(uint256 required, uint256 available);
        error NothingToCollect();
        error NothingToWithdraw();
        error NothingToReinvest();
        error NothingToClaim();
        error InsufficientGameBalance(uint256 required, uint256 available);
        error EthTransferFailed(address to, uint256 value);
    }

    interface ICodeupERC20 {
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 value) external returns (bool);
        function transfer(address to, uint256 value) external returns (bool);
        function transferFrom(address from, address to, uint256 value) external returns (bool);
        function setTransferHook(bool enabled) external;
        function transferHookEnabled(address account) external view returns (bool);

        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);
        event TransferHookSet(address indexed account, bool enabled);

        error ERC20InsufficientBalance(address sender, uint256 balance, uint256 needed);
        error ERC20InsufficientAllowance(address spender, uint256 allowance, uint256 needed);
        error ERC20InvalidSender(address sender);
        error ERC20InvalidReceiver(address receiver);
        error ERC20InvalidApprover(address approver);
        error ERC20InvalidSpender(address spender);
    }

    interface ICodeupERC20Receiver {
        function onCodeupERC20Received(address from, uint256 amount) external;
    }
}
