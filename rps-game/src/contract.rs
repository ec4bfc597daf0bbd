//! Binding for the on-chain Rock-Paper-Scissors contract.
//!
//! Reads go through `eth_call`. Writes are handed to a [`WalletConnector`].
//! `create` and `join` are split into a send and a confirm step so callers can
//! tell a transaction that never left the wallet from one still being mined.

use crate::{GameError, GameRecord, Move, Result};
use alloy_primitives::{hex, Address, B256, U256};
use alloy_sol_types::{sol, SolCall, SolEvent};
use rps_core::rpc::u256_to_u64;
use rps_core::{CoreError, Log, NetworkConfig, RpcClient, TransactionReceipt, TxRequest, WalletConnector};
use std::time::Duration;

sol! {
    interface IRockPaperScissors {
        function create(bytes32 commit) external payable returns (uint256 gameId);
        function join(uint256 gameId, bytes32 commit) external payable;
        function reveal(uint256 gameId, uint8 moveRaw, bytes32 salt) external;
        function claimTimeout(uint256 gameId) external;
        function cancelIfNoOpponent(uint256 gameId) external;

        function games(uint256) external view returns (
            address p1,
            address p2,
            uint128 stake,
            uint40 createdAt,
            uint40 revealDeadline,
            bytes32 p1Commit,
            bytes32 p2Commit,
            uint8 p1Move,
            uint8 p2Move,
            bool settled
        );
        function computeCommit(uint8 moveRaw, bytes32 salt, address player) external pure returns (bytes32);
        function nextGameId() external view returns (uint256);

        event GameCreated(uint256 indexed gameId, address indexed p1, uint128 stake);
        event GameJoined(uint256 indexed gameId, address indexed p2);
        event BothCommitted(uint256 indexed gameId);
        event Revealed(uint256 indexed gameId, address indexed player, uint8 playerMove);
        event Settled(uint256 indexed gameId, address winner, uint256 p1Payout, uint256 p2Payout, uint256 fee);
    }
}

use IRockPaperScissors::{
    cancelIfNoOpponentCall, claimTimeoutCall, computeCommitCall, createCall, gamesCall,
    gamesReturn, joinCall, nextGameIdCall, revealCall, GameCreated,
};

#[derive(Debug, Clone)]
pub struct RpsContract {
    address: Address,
    rpc: RpcClient,
    poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl RpsContract {
    pub fn new(config: &NetworkConfig, rpc: RpcClient) -> Self {
        Self {
            address: config.contract_address,
            rpc,
            poll_interval: config.confirmation_poll_interval,
            confirmation_timeout: config.confirmation_timeout,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub async fn game(&self, game_id: u64) -> Result<GameRecord> {
        let ret = self
            .read(gamesCall {
                _0: U256::from(game_id),
            })
            .await?;
        record_from_return(ret)
    }

    pub async fn next_game_id(&self) -> Result<u64> {
        let ret = self.read(nextGameIdCall {}).await?;
        Ok(u256_to_u64(ret._0)?)
    }

    pub async fn compute_commit(&self, player_move: Move, salt: B256, player: Address) -> Result<B256> {
        let ret = self
            .read(computeCommitCall {
                moveRaw: player_move.raw(),
                salt,
                player,
            })
            .await?;
        Ok(ret._0)
    }

    /// Broadcast `create` with `stake` attached. Nothing is mined yet.
    pub async fn send_create(
        &self,
        connector: &dyn WalletConnector,
        commit: B256,
        stake: U256,
    ) -> Result<B256> {
        self.submit(connector, createCall { commit }, Some(stake))
            .await
    }

    /// Wait for a `create` transaction and read the id from `GameCreated`
    pub async fn confirm_create(&self, tx_hash: B256) -> Result<(u64, TransactionReceipt)> {
        let receipt = self.confirm(tx_hash).await?;

        let game_id = created_game_id(receipt.logs_from(self.address))?;
        tracing::info!("Game {} created in {}", game_id, receipt.transaction_hash);

        Ok((game_id, receipt))
    }

    pub async fn send_join(
        &self,
        connector: &dyn WalletConnector,
        game_id: u64,
        commit: B256,
        stake: U256,
    ) -> Result<B256> {
        self.submit(
            connector,
            joinCall {
                gameId: U256::from(game_id),
                commit,
            },
            Some(stake),
        )
        .await
    }

    /// Poll until `tx_hash` is mined; a reverted receipt is an error
    pub async fn confirm(&self, tx_hash: B256) -> Result<TransactionReceipt> {
        let receipt = self
            .rpc
            .wait_for_receipt(tx_hash, self.poll_interval, self.confirmation_timeout)
            .await?;
        Ok(receipt)
    }

    pub async fn reveal(
        &self,
        connector: &dyn WalletConnector,
        game_id: u64,
        player_move: Move,
        salt: B256,
    ) -> Result<TransactionReceipt> {
        if !player_move.is_revealed() {
            return Err(GameError::InvalidMove(player_move.raw()));
        }

        self.write(
            connector,
            revealCall {
                gameId: U256::from(game_id),
                moveRaw: player_move.raw(),
                salt,
            },
            None,
        )
        .await
    }

    pub async fn claim_timeout(
        &self,
        connector: &dyn WalletConnector,
        game_id: u64,
    ) -> Result<TransactionReceipt> {
        self.write(
            connector,
            claimTimeoutCall {
                gameId: U256::from(game_id),
            },
            None,
        )
        .await
    }

    pub async fn cancel_if_no_opponent(
        &self,
        connector: &dyn WalletConnector,
        game_id: u64,
    ) -> Result<TransactionReceipt> {
        self.write(
            connector,
            cancelIfNoOpponentCall {
                gameId: U256::from(game_id),
            },
            None,
        )
        .await
    }

    async fn read<C: SolCall>(&self, call: C) -> Result<C::Return> {
        let request = TxRequest::call(self.address, call.abi_encode());
        let output = self.rpc.call(&request).await.map_err(map_revert)?;
        Ok(C::abi_decode_returns(&output, true)?)
    }

    async fn submit<C: SolCall>(
        &self,
        connector: &dyn WalletConnector,
        call: C,
        value: Option<U256>,
    ) -> Result<B256> {
        let mut request = TxRequest::call(self.address, call.abi_encode());
        if let Some(value) = value {
            request = request.with_value(value);
        }

        let tx_hash = connector
            .send_transaction(&self.rpc, request)
            .await
            .map_err(map_revert)?;

        tracing::info!("{} submitted as {}", C::SIGNATURE, tx_hash);
        Ok(tx_hash)
    }

    async fn write<C: SolCall>(
        &self,
        connector: &dyn WalletConnector,
        call: C,
        value: Option<U256>,
    ) -> Result<TransactionReceipt> {
        let tx_hash = self.submit(connector, call, value).await?;
        self.confirm(tx_hash).await
    }
}

fn record_from_return(ret: gamesReturn) -> Result<GameRecord> {
    Ok(GameRecord {
        player1: ret.p1,
        player2: ret.p2,
        stake: U256::from(ret.stake),
        created_at: ret.createdAt.to::<u64>(),
        reveal_deadline: ret.revealDeadline.to::<u64>(),
        player1_commit: ret.p1Commit,
        player2_commit: ret.p2Commit,
        player1_move: Move::try_from(ret.p1Move)?,
        player2_move: Move::try_from(ret.p2Move)?,
        settled: ret.settled,
    })
}

/// Game id carried by the first `GameCreated` log
pub fn created_game_id<'a>(logs: impl IntoIterator<Item = &'a Log>) -> Result<u64> {
    for log in logs {
        if log.topics.first() != Some(&GameCreated::SIGNATURE_HASH) {
            continue;
        }

        let event = GameCreated::decode_raw_log(log.topics.iter().copied(), &log.data, true)?;
        return Ok(u256_to_u64(event.gameId)?);
    }

    Err(GameError::MissingEvent("GameCreated"))
}

/// Turn revert data attached to an RPC error into a readable contract error
fn map_revert(err: CoreError) -> GameError {
    if let Some(reason) = err
        .rpc_data()
        .and_then(|data| hex::decode(data).ok())
        .and_then(|bytes| alloy_sol_types::decode_revert_reason(&bytes))
    {
        return GameError::ContractReverted { reason };
    }

    match &err {
        CoreError::Rpc { message, .. } if message.contains("revert") => {
            GameError::ContractReverted {
                reason: message.clone(),
            }
        }
        _ => GameError::Core(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, keccak256, Bytes};
    use alloy_sol_types::SolError;

    const PLAYER1: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    fn word(value: U256) -> [u8; 32] {
        value.to_be_bytes::<32>()
    }

    fn address_word(address: Address) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[12..].copy_from_slice(address.as_slice());
        out
    }

    #[test]
    fn test_selectors() {
        assert_eq!(createCall::SELECTOR, keccak256("create(bytes32)")[..4]);
        assert_eq!(
            revealCall::SELECTOR,
            keccak256("reveal(uint256,uint8,bytes32)")[..4]
        );
        assert_eq!(gamesCall::SELECTOR, keccak256("games(uint256)")[..4]);
    }

    #[test]
    fn test_decode_games_return() {
        let mut data = Vec::new();
        data.extend_from_slice(&address_word(PLAYER1));
        data.extend_from_slice(&address_word(Address::ZERO));
        data.extend_from_slice(&word(U256::from(1_000_000_000_000_000u64)));
        data.extend_from_slice(&word(U256::from(1_700_000_000u64)));
        data.extend_from_slice(&word(U256::from(1_700_000_600u64)));
        data.extend_from_slice(&[0x11; 32]);
        data.extend_from_slice(&[0u8; 32]);
        data.extend_from_slice(&word(U256::ZERO));
        data.extend_from_slice(&word(U256::ZERO));
        data.extend_from_slice(&word(U256::ZERO));

        let ret = gamesCall::abi_decode_returns(&data, true).unwrap();
        let record = record_from_return(ret).unwrap();

        assert_eq!(record.player1, PLAYER1);
        assert!(!record.has_opponent());
        assert_eq!(record.stake, U256::from(1_000_000_000_000_000u64));
        assert_eq!(record.created_at, 1_700_000_000);
        assert_eq!(record.reveal_deadline, 1_700_000_600);
        assert_eq!(record.player1_commit, B256::repeat_byte(0x11));
        assert_eq!(record.player1_move, Move::None);
        assert!(!record.settled);
    }

    #[test]
    fn test_invalid_move_in_record() {
        let mut data = vec![0u8; 32 * 10];
        data[32 * 7 + 31] = 9;
        let ret = gamesCall::abi_decode_returns(&data, true).unwrap();
        assert!(matches!(
            record_from_return(ret),
            Err(GameError::InvalidMove(9))
        ));
    }

    #[test]
    fn test_created_game_id_from_logs() {
        let log = Log {
            address: PLAYER1,
            topics: vec![
                GameCreated::SIGNATURE_HASH,
                B256::from(U256::from(42u64)),
                B256::from(address_word(PLAYER1)),
            ],
            data: Bytes::from(word(U256::from(5u64)).to_vec()),
        };
        let unrelated = Log {
            address: PLAYER1,
            topics: vec![B256::repeat_byte(0xee)],
            data: Bytes::new(),
        };

        assert_eq!(created_game_id([&unrelated, &log]).unwrap(), 42);
        assert!(matches!(
            created_game_id([&unrelated]),
            Err(GameError::MissingEvent("GameCreated"))
        ));
    }

    #[test]
    fn test_revert_reason_decoded() {
        let revert = alloy_sol_types::Revert {
            reason: "Game full".to_string(),
        }
        .abi_encode();
        let err = CoreError::rpc(3, "execution reverted", Some(hex::encode_prefixed(revert)));

        match map_revert(err) {
            GameError::ContractReverted { reason } => assert!(reason.contains("Game full")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_plain_rpc_error_is_kept() {
        let err = CoreError::rpc(-32000, "nonce too low", None);
        assert!(matches!(map_revert(err), GameError::Core(_)));
    }
}
