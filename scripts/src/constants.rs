//! Constants used in the deploy scripts

use alloy_primitives::{address, Address, U256};

// ------------
// | Networks |
// ------------

/// Chain ids of the public networks the pools are deployed to.
///
/// Any chain id outside this list is treated as a local network, on which the
/// mock infrastructure is deployed as well.
pub const REMOTE_CHAIN_IDS: [u64; 6] = [1, 3, 4, 42, 77, 99];

/// The chain id used by the unit test node
pub const UNIT_TEST_CHAIN_ID: u64 = 31337;

/// The chain id used by the coverage node
pub const COVERAGE_CHAIN_ID: u64 = 1337;

/// The label used for chain ids missing from the network table
pub const UNKNOWN_NETWORK_NAME: &str = "Unknown";

/// Known chain ids and their human-readable names
pub const NETWORK_NAMES: [(u64, &str); 6] = [
    (1, "Mainnet"),
    (3, "Ropsten"),
    (4, "Rinkeby"),
    (5, "Goerli"),
    (42, "Kovan"),
    (31337, "HardhatEVM"),
];

// -----------------
// | Logical names |
// -----------------

/// The mock randomness oracle, local networks only
pub const RNG_SERVICE_MOCK_KEY: &str = "RNGServiceMock";

/// The mock stable-asset token, local networks only
pub const DAI_KEY: &str = "Dai";

/// The mock interest-bearing token, local networks only
pub const CDAI_KEY: &str = "cDai";

/// The mock yield vault, local networks only
pub const YDAI_KEY: &str = "yDai";

/// The drip rate attenuation strategy
pub const DRIP_STRATEGY_KEY: &str = "DripRatePerSecondAttenuationStrategy";

/// The token faucet
pub const TOKEN_FAUCET_KEY: &str = "TokenFaucet";

/// The reserve
pub const RESERVE_KEY: &str = "Reserve";

/// The registry pointing at the current reserve
pub const RESERVE_REGISTRY_KEY: &str = "ReserveRegistry";

/// The permit-and-deposit helper
pub const PERMIT_AND_DEPOSIT_DAI_KEY: &str = "PermitAndDepositDai";

/// The compound prize pool proxy factory
pub const COMPOUND_PRIZE_POOL_PROXY_FACTORY_KEY: &str = "CompoundPrizePoolProxyFactory";

/// The yearn vault prize pool proxy factory
pub const YVAULT_PRIZE_POOL_PROXY_FACTORY_KEY: &str = "yVaultPrizePoolProxyFactory";

/// The controlled token proxy factory
pub const CONTROLLED_TOKEN_PROXY_FACTORY_KEY: &str = "ControlledTokenProxyFactory";

/// The ticket proxy factory
pub const TICKET_PROXY_FACTORY_KEY: &str = "TicketProxyFactory";

/// The stake prize pool proxy factory
pub const STAKE_PRIZE_POOL_PROXY_FACTORY_KEY: &str = "StakePrizePoolProxyFactory";

/// The unsafe token listener delegator proxy factory
pub const UNSAFE_TOKEN_LISTENER_DELEGATOR_PROXY_FACTORY_KEY: &str =
    "UnsafeTokenListenerDelegatorProxyFactory";

/// The multiple winners strategy proxy factory
pub const MULTIPLE_WINNERS_PROXY_FACTORY_KEY: &str = "MultipleWinnersProxyFactory";

/// The single random winner strategy proxy factory
pub const SINGLE_RANDOM_WINNER_PROXY_FACTORY_KEY: &str = "SingleRandomWinnerProxyFactory";

/// The controlled token builder
pub const CONTROLLED_TOKEN_BUILDER_KEY: &str = "ControlledTokenBuilder";

/// The multiple winners builder
pub const MULTIPLE_WINNERS_BUILDER_KEY: &str = "MultipleWinnersBuilder";

/// The top-level pool builder
pub const POOL_WITH_MULTIPLE_WINNERS_BUILDER_KEY: &str = "PoolWithMultipleWinnersBuilder";

// -------------
// | Artifacts |
// -------------

/// The artifact backing the mock stable-asset token
pub const ERC20_MINTABLE_ARTIFACT: &str = "ERC20Mintable";

/// The artifact backing the mock interest-bearing token
pub const CTOKEN_MOCK_ARTIFACT: &str = "CTokenMock";

/// The artifact backing the mock yield vault
pub const YVAULT_MOCK_ARTIFACT: &str = "yVaultMock";

/// The artifact backing the reserve registry
pub const REGISTRY_ARTIFACT: &str = "Registry";

/// Logical names that have a harness variant, paired with that variant's artifact
pub const HARNESS_ARTIFACTS: [(&str, &str); 4] = [
    (
        COMPOUND_PRIZE_POOL_PROXY_FACTORY_KEY,
        "CompoundPrizePoolHarnessProxyFactory",
    ),
    (
        YVAULT_PRIZE_POOL_PROXY_FACTORY_KEY,
        "yVaultPrizePoolHarnessProxyFactory",
    ),
    (
        STAKE_PRIZE_POOL_PROXY_FACTORY_KEY,
        "StakePrizePoolHarnessProxyFactory",
    ),
    (
        MULTIPLE_WINNERS_PROXY_FACTORY_KEY,
        "MultipleWinnersHarnessProxyFactory",
    ),
];

// -------------------
// | Mock parameters |
// -------------------

/// The name of the mock stable-asset token
pub const DAI_NAME: &str = "DAI Test Token";

/// The symbol of the mock stable-asset token
pub const DAI_SYMBOL: &str = "DAI";

/// The per-block supply rate of the mock interest-bearing token, roughly 20% APR
pub const CDAI_SUPPLY_RATE: &str = "8888888888888";

// ------------
// | ERC-1820 |
// ------------

/// The address at which the ERC-1820 registry lives on every chain
pub const ERC1820_REGISTRY_ADDRESS: Address =
    address!("1820a4B7618BdE71Dce8cdc73aAB6C95905faD24");

/// The one-shot account that signed the ERC-1820 deployment transaction
pub const ERC1820_DEPLOYER_ADDRESS: Address =
    address!("a990077c3205cbDf861e17Fa532eeB069cE9fF96");

/// The amount of wei the ERC-1820 deployer needs to pay for its deployment, 0.08 ether
pub const ERC1820_DEPLOYER_FUNDING: U256 = U256::from_limbs([80_000_000_000_000_000, 0, 0, 0]);

// -------
// | CLI |
// -------

/// The default RPC url, a local development node
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// The default path of the deployments file
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The default directory holding the compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The extension of a compiled contract artifact
pub const ARTIFACT_EXTENSION: &str = "json";
