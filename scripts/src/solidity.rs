//! Definitions of Solidity functions called during deployment

use alloy::sol;

sol! {
    /// The pointer registry wiring the pools to the current reserve
    #[sol(rpc)]
    interface IRegistry {
        function lookup() external view returns (address);
        function register(address _pointer) external;
    }
}
