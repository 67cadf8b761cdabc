//! Solidity bindings for the parts of the Peggy contract the relayer touches.

#![allow(missing_docs, clippy::too_many_arguments)]

alloy::sol! {
    #[sol(rpc)]
    #[derive(Debug, PartialEq, Eq)]
    contract Peggy {
        struct ValsetArgs {
            address[] validators;
            uint256[] powers;
            uint256 valsetNonce;
            uint256 rewardAmount;
            address rewardToken;
        }

        event ValsetUpdatedEvent(
            uint256 indexed _newValsetNonce,
            uint256 _eventNonce,
            uint256 _rewardAmount,
            address _rewardToken,
            address[] _validators,
            uint256[] _powers
        );

        function state_lastValsetNonce() external view returns (uint256);

        function updateValset(
            ValsetArgs calldata _newValset,
            ValsetArgs calldata _currentValset,
            uint8[] calldata _v,
            bytes32[] calldata _r,
            bytes32[] calldata _s
        ) external;
    }
}
